use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 提现收款账户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BankDetails {
    #[schema(example = "0123456789")]
    pub account_number: String,
    #[schema(example = "First Bank")]
    pub bank_name: String,
    #[schema(example = "Jane Doe")]
    pub account_name: String,
}

impl BankDetails {
    pub fn is_complete(&self) -> bool {
        !self.account_number.trim().is_empty()
            && !self.bank_name.trim().is_empty()
            && !self.account_name.trim().is_empty()
    }

    /// 仅展示账号后四位
    pub fn masked_account_number(&self) -> String {
        let chars: Vec<char> = self.account_number.chars().collect();
        if chars.len() <= 4 {
            return self.account_number.clone();
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), tail)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EnrollAffiliateRequest {
    pub bank_details: Option<BankDetails>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccrueRewardRequest {
    /// 推荐人用户ID
    pub referrer_id: i64,
    /// 返利金额(美分)
    #[schema(example = 500)]
    pub amount: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminCreditRequest {
    /// 补发金额(美分)
    pub amount: i64,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BalanceResponse {
    pub user_id: i64,
    /// 当前余额(美分)
    pub balance: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AffiliateSummaryResponse {
    pub user_id: i64,
    pub is_affiliate: bool,
    pub balance: i64,
    pub referral_count: i64,
    pub has_bank_details: bool,
    /// 审核中的提现总额(美分)
    pub pending_withdrawal_total: i64,
}
