pub mod coupon_service;
pub mod ledger_service;
pub mod referral_batch_service;
pub mod rewards_service;
pub mod withdrawal_service;

#[cfg(test)]
mod test_support;

pub use coupon_service::*;
pub use ledger_service::*;
pub use referral_batch_service::*;
pub use rewards_service::*;
pub use withdrawal_service::*;
