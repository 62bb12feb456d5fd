pub mod affiliate;
pub mod common;
pub mod coupon;
pub mod pagination;
pub mod referral_batch;
pub mod session;
pub mod withdrawal;

pub use affiliate::*;
pub use common::*;
pub use coupon::*;
pub use pagination::*;
pub use referral_batch::*;
pub use session::*;
pub use withdrawal::*;
