use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{DiscountType, referral_batch_entity};

use super::{CouponResponse, PaginatedResponse};

/// 创建推荐批次；券模板字段为空时使用配置中的默认值
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateReferralBatchRequest {
    #[schema(example = "Spring referral campaign")]
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[schema(example = 100)]
    pub max_winners: i32,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<i64>,
    pub max_discount: Option<i64>,
    pub coupon_valid_days: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReferralBatchQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub active_only: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IssueReferralCouponRequest {
    /// 获得推荐券的用户
    pub user_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReferralBatchResponse {
    pub id: i64,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub max_winners: i32,
    pub current_winners: i32,
    pub remaining_slots: i32,
    pub is_active: bool,
    /// 当前是否可以发券
    pub is_open: bool,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub max_discount: Option<i64>,
    pub coupon_valid_days: i32,
    pub created_at: DateTime<Utc>,
}

impl From<referral_batch_entity::Model> for ReferralBatchResponse {
    fn from(m: referral_batch_entity::Model) -> Self {
        let is_open = m.can_issue(Utc::now());
        let remaining_slots = m.remaining_slots();
        Self {
            id: m.id,
            name: m.name,
            start_date: m.start_date,
            end_date: m.end_date,
            max_winners: m.max_winners,
            current_winners: m.current_winners,
            remaining_slots,
            is_active: m.is_active,
            is_open,
            discount_type: m.discount_type,
            discount_value: m.discount_value,
            max_discount: m.max_discount,
            coupon_valid_days: m.coupon_valid_days,
            created_at: m.created_at,
        }
    }
}

/// 推荐券发放结果
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReferralCouponResponse {
    pub batch_id: i64,
    pub coupon: CouponResponse,
}

pub type ReferralBatchPageResponse = PaginatedResponse<ReferralBatchResponse>;
