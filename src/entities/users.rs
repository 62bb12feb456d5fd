use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::BankDetails;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "admin")]
    Admin,
    /// 订单处理等后台服务使用的账号
    #[sea_orm(string_value = "worker")]
    Worker,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::User => write!(f, "user"),
            UserRole::Admin => write!(f, "admin"),
            UserRole::Worker => write!(f, "worker"),
        }
    }
}

/// 用户表中与联盟返利相关的字段
/// - affiliate_balance: 待结算佣金(美分)，只会因返利增加，因提现清零
/// - bank_*: 提现收款账户，三项需同时存在才视为已绑定
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub username: String,
    pub role: UserRole,
    pub is_affiliate: bool,
    pub affiliate_balance: i64,
    pub referral_count: i64,
    pub bank_account_number: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// 已绑定的收款账户（任一字段缺失返回 None）
    pub fn bank_details(&self) -> Option<BankDetails> {
        match (
            self.bank_account_number.as_deref(),
            self.bank_name.as_deref(),
            self.bank_account_name.as_deref(),
        ) {
            (Some(number), Some(bank), Some(name))
                if !number.is_empty() && !bank.is_empty() && !name.is_empty() =>
            {
                Some(BankDetails {
                    account_number: number.to_string(),
                    bank_name: bank.to_string(),
                    account_name: name.to_string(),
                })
            }
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
