use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use super::DiscountType;

/// 推荐活动批次
/// 概念说明:
/// - [start_date, end_date]: 允许发券的时间窗口（闭区间）
/// - max_winners / current_winners: 名额上限与已发放名额，current_winners 只能通过条件更新递增
/// - discount_*/coupon_valid_days: 本批次发放的推荐券模板
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "referral_batches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub max_winners: i32,
    pub current_winners: i32,
    pub is_active: bool,
    pub discount_type: DiscountType,
    /// 百分比券为百分点，固定金额券为美分
    pub discount_value: i64,
    pub max_discount: Option<i64>,
    pub coupon_valid_days: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn window_open(&self, now: DateTime<Utc>) -> bool {
        self.start_date <= now && now <= self.end_date
    }

    pub fn has_capacity(&self) -> bool {
        self.current_winners < self.max_winners
    }

    pub fn remaining_slots(&self) -> i32 {
        (self.max_winners - self.current_winners).max(0)
    }

    /// 启用、在时间窗口内且仍有名额
    pub fn can_issue(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.window_open(now) && self.has_capacity()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
