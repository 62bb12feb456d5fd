pub mod code_generator;
pub mod jwt;

pub use code_generator::{generate_coupon_code, normalize_code};
pub use jwt::*;
