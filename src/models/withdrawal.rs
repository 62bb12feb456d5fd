use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{WithdrawalStatus, withdrawal_entity};

use super::{BankDetails, PaginatedResponse};

/// 管理员审核结论
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalDecision {
    Approve,
    Reject,
}

impl WithdrawalDecision {
    pub fn target_status(self) -> WithdrawalStatus {
        match self {
            WithdrawalDecision::Approve => WithdrawalStatus::Approved,
            WithdrawalDecision::Reject => WithdrawalStatus::Rejected,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResolveWithdrawalRequest {
    pub decision: WithdrawalDecision,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WithdrawalQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<WithdrawalStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WithdrawalResponse {
    pub id: i64,
    pub user_id: i64,
    /// 提现金额(美分)，为申请时余额快照
    pub amount: i64,
    pub status: WithdrawalStatus,
    pub bank_details: BankDetails,
    pub admin_note: Option<String>,
    pub resolved_by: Option<i64>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<withdrawal_entity::Model> for WithdrawalResponse {
    fn from(m: withdrawal_entity::Model) -> Self {
        let bank_details = BankDetails {
            account_number: m.bank_account_number,
            bank_name: m.bank_name,
            account_name: m.bank_account_name,
        };
        Self {
            id: m.id,
            user_id: m.user_id,
            amount: m.amount,
            status: m.status,
            bank_details: BankDetails {
                account_number: bank_details.masked_account_number(),
                ..bank_details
            },
            admin_note: m.admin_note,
            resolved_by: m.resolved_by,
            resolved_at: m.resolved_at,
            created_at: m.created_at,
        }
    }
}

pub type WithdrawalPageResponse = PaginatedResponse<WithdrawalResponse>;
