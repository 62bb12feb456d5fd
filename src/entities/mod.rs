pub mod coupons;
pub mod referral_batches;
pub mod users;
pub mod withdrawals;

pub use coupons as coupon_entity;
pub use referral_batches as referral_batch_entity;
pub use users as user_entity;
pub use withdrawals as withdrawal_entity;

pub use coupons::DiscountType;
pub use users::UserRole;
pub use withdrawals::WithdrawalStatus;
