use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{DiscountType, coupon_entity};

use super::PaginatedResponse;

/// 发券参数（管理员建券与推荐批次发券共用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponSpec {
    pub code: String,
    pub discount_type: DiscountType,
    pub value: i64,
    pub max_amount: Option<i64>,
    pub expiration_date: Option<DateTime<Utc>>,
    /// None = 不限次数
    pub usage_limit: Option<i32>,
    pub is_active: bool,
    pub user_id: Option<i64>,
    pub batch_id: Option<i64>,
}

impl CouponSpec {
    /// 单次使用、启用状态的券
    pub fn single_use(code: impl Into<String>, discount_type: DiscountType, value: i64) -> Self {
        Self {
            code: code.into(),
            discount_type,
            value,
            max_amount: None,
            expiration_date: None,
            usage_limit: Some(1),
            is_active: true,
            user_id: None,
            batch_id: None,
        }
    }
}

fn default_usage_limit() -> Option<i32> {
    Some(1)
}

fn default_true() -> bool {
    true
}

/// 管理员建券请求
/// usage_limit 省略时默认为 1（单次使用），显式传 null 表示不限次数
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCouponRequest {
    #[schema(example = "SAVE10")]
    pub code: String,
    pub discount_type: DiscountType,
    /// 百分比券为百分点(0-100)，固定金额券为美分
    pub value: i64,
    pub max_amount: Option<i64>,
    pub expiration_date: Option<DateTime<Utc>>,
    #[serde(default = "default_usage_limit")]
    pub usage_limit: Option<i32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub user_id: Option<i64>,
}

impl From<CreateCouponRequest> for CouponSpec {
    fn from(req: CreateCouponRequest) -> Self {
        Self {
            code: req.code,
            discount_type: req.discount_type,
            value: req.value,
            max_amount: req.max_amount,
            expiration_date: req.expiration_date,
            usage_limit: req.usage_limit,
            is_active: req.is_active,
            user_id: req.user_id,
            batch_id: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RedeemCouponRequest {
    #[schema(example = "SAVE10")]
    pub code: String,
    /// 订单系统提供的订单号
    pub order_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuoteCouponRequest {
    pub code: String,
    /// 订单小计(美分)
    pub subtotal: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CouponQuoteResponse {
    pub code: String,
    pub discount_type: DiscountType,
    pub value: i64,
    /// 可抵扣金额(美分)
    pub discount: i64,
    /// 抵扣后应付金额(美分)
    pub payable: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CouponQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub user_id: Option<i64>,
    pub batch_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CouponResponse {
    pub id: i64,
    pub code: String,
    pub discount_type: DiscountType,
    pub value: i64,
    pub max_amount: Option<i64>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    /// None = 不限次数
    pub remaining_uses: Option<i32>,
    pub is_active: bool,
    pub user_id: Option<i64>,
    pub batch_id: Option<i64>,
    pub is_used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub order_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<coupon_entity::Model> for CouponResponse {
    fn from(m: coupon_entity::Model) -> Self {
        let remaining_uses = m.remaining_uses();
        Self {
            id: m.id,
            code: m.code,
            discount_type: m.discount_type,
            value: m.value,
            max_amount: m.max_amount,
            expiration_date: m.expiration_date,
            usage_limit: m.usage_limit,
            used_count: m.used_count,
            remaining_uses,
            is_active: m.is_active,
            user_id: m.user_id,
            batch_id: m.batch_id,
            is_used: m.is_used,
            used_at: m.used_at,
            order_id: m.order_id,
            created_at: m.created_at,
        }
    }
}

pub type CouponPageResponse = PaginatedResponse<CouponResponse>;
