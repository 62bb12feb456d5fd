use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    #[sea_orm(string_value = "percentage")]
    Percentage,
    #[sea_orm(string_value = "fixed")]
    Fixed,
}

impl std::fmt::Display for DiscountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscountType::Percentage => write!(f, "percentage"),
            DiscountType::Fixed => write!(f, "fixed"),
        }
    }
}

/// 优惠券
/// - code: 全局唯一，入库前统一转为大写
/// - usage_limit: 可用次数 (NULL = 不限)，推荐券固定为 1
/// - used_count: 已用次数，只能通过条件更新递增，永不超过 usage_limit
/// - is_used: used_count 达到 usage_limit 时在同一事务内置为 true
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub code: String,
    pub discount_type: DiscountType,
    pub value: i64,
    pub max_amount: Option<i64>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    pub is_active: bool,
    pub user_id: Option<i64>,
    pub batch_id: Option<i64>,
    pub is_used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub order_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expiration_date, Some(exp) if exp < now)
    }

    pub fn is_single_use(&self) -> bool {
        self.usage_limit == Some(1)
    }

    /// 次数是否已用尽（不限次数的券永远不会用尽）
    pub fn is_exhausted(&self) -> bool {
        match self.usage_limit {
            Some(limit) => self.used_count >= limit,
            None => false,
        }
    }

    pub fn remaining_uses(&self) -> Option<i32> {
        self.usage_limit
            .map(|limit| (limit - self.used_count).max(0))
    }

    /// 计算订单小计(美分)可抵扣的金额
    /// - 百分比: subtotal * value / 100，受 max_amount 封顶
    /// - 固定金额: min(value, subtotal)
    pub fn discount_for(&self, subtotal: i64) -> i64 {
        if subtotal <= 0 {
            return 0;
        }
        let raw = match self.discount_type {
            DiscountType::Percentage => subtotal.saturating_mul(self.value) / 100,
            DiscountType::Fixed => self.value,
        };
        let capped = match self.max_amount {
            Some(cap) => raw.min(cap),
            None => raw,
        };
        capped.clamp(0, subtotal)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(discount_type: DiscountType, value: i64, max_amount: Option<i64>) -> Model {
        let now = Utc::now();
        Model {
            id: 1,
            code: "SAVE10".to_string(),
            discount_type,
            value,
            max_amount,
            expiration_date: None,
            usage_limit: Some(1),
            used_count: 0,
            is_active: true,
            user_id: None,
            batch_id: None,
            is_used: false,
            used_at: None,
            order_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_percentage_discount() {
        let c = coupon(DiscountType::Percentage, 10, None);
        assert_eq!(c.discount_for(2500), 250);
    }

    #[test]
    fn test_percentage_discount_is_capped() {
        let c = coupon(DiscountType::Percentage, 50, Some(1000));
        assert_eq!(c.discount_for(10_000), 1000);
    }

    #[test]
    fn test_fixed_discount_never_exceeds_subtotal() {
        let c = coupon(DiscountType::Fixed, 500, None);
        assert_eq!(c.discount_for(300), 300);
        assert_eq!(c.discount_for(800), 500);
        assert_eq!(c.discount_for(0), 0);
    }

    #[test]
    fn test_expiry_and_exhaustion() {
        let now = Utc::now();
        let mut c = coupon(DiscountType::Fixed, 500, None);
        assert!(!c.is_expired(now));
        c.expiration_date = Some(now - Duration::hours(1));
        assert!(c.is_expired(now));

        assert!(c.is_single_use());
        assert!(!c.is_exhausted());
        c.used_count = 1;
        assert!(c.is_exhausted());
        assert_eq!(c.remaining_uses(), Some(0));

        c.usage_limit = None;
        assert!(!c.is_exhausted());
        assert_eq!(c.remaining_uses(), None);
    }
}
