pub mod admin;
pub mod affiliate;
pub mod coupon;
pub mod referral;

pub use admin::admin_config;
pub use affiliate::affiliate_config;
pub use coupon::coupon_config;
pub use referral::referral_config;
