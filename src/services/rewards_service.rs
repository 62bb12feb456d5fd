use crate::entities::{
    coupon_entity as coupons, referral_batch_entity as batches, withdrawal_entity as withdrawals,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    AffiliateSummaryResponse, BalanceResponse, BankDetails, CouponPageResponse, CouponQuery,
    CouponQuoteResponse, CouponSpec, CreateReferralBatchRequest, CurrentUser,
    ReferralBatchPageResponse, ReferralBatchQuery, WithdrawalDecision, WithdrawalPageResponse,
    WithdrawalQuery,
};
use crate::services::{CouponService, LedgerService, ReferralBatchService, WithdrawalService};

/// 返利入口：统一做权限校验后转发到各个子服务
#[derive(Clone)]
pub struct RewardsService {
    ledger: LedgerService,
    coupons: CouponService,
    batches: ReferralBatchService,
    withdrawals: WithdrawalService,
}

impl RewardsService {
    pub fn new(
        ledger: LedgerService,
        coupons: CouponService,
        batches: ReferralBatchService,
        withdrawals: WithdrawalService,
    ) -> Self {
        Self {
            ledger,
            coupons,
            batches,
            withdrawals,
        }
    }

    // ---------- 余额 ----------

    /// 推荐订单完成后由订单服务调用，为推荐人入账
    ///
    /// 入账成功后推荐人数 +1；计数失败只记日志，不影响已入账的余额
    pub async fn accrue_referral_reward(
        &self,
        caller: &CurrentUser,
        referrer_id: i64,
        amount: i64,
    ) -> AppResult<BalanceResponse> {
        caller.require_worker()?;

        let balance = self.ledger.accrue(referrer_id, amount).await?;
        log::info!(
            "Referral reward {amount} credited to user {referrer_id} by {} {}, balance {balance}",
            caller.role,
            caller.id
        );

        if let Err(e) = self.ledger.increment_referral_count(referrer_id).await {
            log::warn!("Failed to bump referral count for user {referrer_id}: {e}");
        }

        Ok(BalanceResponse {
            user_id: referrer_id,
            balance,
        })
    }

    /// 管理员补发，例如驳回提现后退回金额
    pub async fn admin_credit(
        &self,
        caller: &CurrentUser,
        user_id: i64,
        amount: i64,
        reason: Option<&str>,
    ) -> AppResult<BalanceResponse> {
        caller.require_admin()?;

        let balance = self.ledger.accrue(user_id, amount).await?;
        log::info!(
            "Admin {} credited {amount} to user {user_id} ({}), balance {balance}",
            caller.id,
            reason.unwrap_or("no reason given")
        );
        Ok(BalanceResponse { user_id, balance })
    }

    pub async fn read_balance(&self, caller: &CurrentUser, user_id: i64) -> AppResult<BalanceResponse> {
        caller.require_self_or_admin(user_id)?;
        let balance = self.ledger.read_balance(user_id).await?;
        Ok(BalanceResponse { user_id, balance })
    }

    pub async fn affiliate_summary(
        &self,
        caller: &CurrentUser,
        user_id: i64,
    ) -> AppResult<AffiliateSummaryResponse> {
        caller.require_self_or_admin(user_id)?;

        let account = self.ledger.get_account(user_id).await?;
        let pending_withdrawal_total = self.withdrawals.pending_total(user_id).await?;
        Ok(AffiliateSummaryResponse {
            user_id,
            is_affiliate: account.is_affiliate,
            balance: account.affiliate_balance,
            referral_count: account.referral_count,
            has_bank_details: account.bank_details().is_some(),
            pending_withdrawal_total,
        })
    }

    pub async fn enroll_affiliate(
        &self,
        caller: &CurrentUser,
        bank_details: Option<BankDetails>,
    ) -> AppResult<AffiliateSummaryResponse> {
        self.ledger.enroll(caller.id, bank_details).await?;
        self.affiliate_summary(caller, caller.id).await
    }

    pub async fn update_bank_details(
        &self,
        caller: &CurrentUser,
        details: BankDetails,
    ) -> AppResult<AffiliateSummaryResponse> {
        self.ledger.update_bank_details(caller.id, details).await?;
        self.affiliate_summary(caller, caller.id).await
    }

    // ---------- 提现 ----------

    pub async fn request_withdrawal(&self, caller: &CurrentUser) -> AppResult<withdrawals::Model> {
        self.withdrawals.request_withdrawal(caller.id).await
    }

    pub async fn resolve_withdrawal(
        &self,
        caller: &CurrentUser,
        withdrawal_id: i64,
        decision: WithdrawalDecision,
        note: Option<String>,
    ) -> AppResult<withdrawals::Model> {
        caller.require_admin()?;
        self.withdrawals
            .resolve(withdrawal_id, decision, note, caller.id)
            .await
    }

    pub async fn get_withdrawal(
        &self,
        caller: &CurrentUser,
        withdrawal_id: i64,
    ) -> AppResult<withdrawals::Model> {
        let withdrawal = self.withdrawals.get_withdrawal(withdrawal_id).await?;
        // 非本人查看时按不存在处理
        if caller.require_self_or_admin(withdrawal.user_id).is_err() {
            return Err(AppError::NotFound("Withdrawal not found".to_string()));
        }
        Ok(withdrawal)
    }

    pub async fn list_my_withdrawals(
        &self,
        caller: &CurrentUser,
        query: &WithdrawalQuery,
    ) -> AppResult<WithdrawalPageResponse> {
        self.withdrawals.list_withdrawals(Some(caller.id), query).await
    }

    pub async fn list_all_withdrawals(
        &self,
        caller: &CurrentUser,
        query: &WithdrawalQuery,
    ) -> AppResult<WithdrawalPageResponse> {
        caller.require_admin()?;
        self.withdrawals.list_withdrawals(None, query).await
    }

    // ---------- 优惠券 ----------

    /// 核销；绑定用户的券只能由本人或后台账号核销
    pub async fn redeem_coupon(
        &self,
        caller: &CurrentUser,
        code: &str,
        order_id: &str,
    ) -> AppResult<coupons::Model> {
        let coupon = self
            .coupons
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::NotFound("Coupon not found".to_string()))?;
        if let Some(owner_id) = coupon.user_id {
            caller.require_self_or_staff(owner_id)?;
        }
        self.coupons.redeem(code, order_id).await
    }

    pub async fn quote_coupon(
        &self,
        caller: &CurrentUser,
        code: &str,
        subtotal: i64,
    ) -> AppResult<CouponQuoteResponse> {
        if let Some(coupon) = self.coupons.find_by_code(code).await? {
            if let Some(owner_id) = coupon.user_id {
                caller.require_self_or_staff(owner_id)?;
            }
        }
        self.coupons.quote(code, subtotal).await
    }

    pub async fn list_my_coupons(
        &self,
        caller: &CurrentUser,
        query: &CouponQuery,
    ) -> AppResult<CouponPageResponse> {
        let query = CouponQuery {
            user_id: Some(caller.id),
            ..query.clone()
        };
        self.coupons.list_coupons(&query).await
    }

    pub async fn create_coupon(&self, caller: &CurrentUser, spec: CouponSpec) -> AppResult<coupons::Model> {
        caller.require_admin()?;
        if spec.batch_id.is_some() {
            return Err(AppError::ValidationError(
                "Referral coupons are issued through their batch".to_string(),
            ));
        }
        self.coupons.issue(spec).await
    }

    pub async fn set_coupon_active(
        &self,
        caller: &CurrentUser,
        coupon_id: i64,
        is_active: bool,
    ) -> AppResult<coupons::Model> {
        caller.require_admin()?;
        self.coupons.set_active(coupon_id, is_active).await
    }

    pub async fn delete_coupon(&self, caller: &CurrentUser, coupon_id: i64) -> AppResult<()> {
        caller.require_admin()?;
        self.coupons.delete(coupon_id).await
    }

    pub async fn list_coupons(
        &self,
        caller: &CurrentUser,
        query: &CouponQuery,
    ) -> AppResult<CouponPageResponse> {
        caller.require_admin()?;
        self.coupons.list_coupons(query).await
    }

    // ---------- 推荐批次 ----------

    pub async fn create_batch(
        &self,
        caller: &CurrentUser,
        req: CreateReferralBatchRequest,
    ) -> AppResult<batches::Model> {
        caller.require_admin()?;
        self.batches.create_batch(req).await
    }

    pub async fn set_batch_active(
        &self,
        caller: &CurrentUser,
        batch_id: i64,
        is_active: bool,
    ) -> AppResult<batches::Model> {
        caller.require_admin()?;
        self.batches.set_active(batch_id, is_active).await
    }

    pub async fn get_batch(&self, batch_id: i64) -> AppResult<batches::Model> {
        self.batches.get_batch(batch_id).await
    }

    pub async fn list_batches(&self, query: &ReferralBatchQuery) -> AppResult<ReferralBatchPageResponse> {
        self.batches.list_batches(query).await
    }

    pub async fn can_issue(&self, batch_id: i64) -> AppResult<bool> {
        self.batches.can_issue(batch_id).await
    }

    /// 为用户领取推荐券：本人领取，或由后台账号/管理员代发
    pub async fn issue_referral_coupon(
        &self,
        caller: &CurrentUser,
        batch_id: i64,
        user_id: i64,
    ) -> AppResult<coupons::Model> {
        caller.require_self_or_staff(user_id)?;
        self.batches.issue_for_batch(batch_id, user_id).await
    }
}
