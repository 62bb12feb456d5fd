use crate::entities::{WithdrawalStatus, user_entity as users, withdrawal_entity as withdrawals};
use crate::error::{AppError, AppResult};
use crate::models::{
    PaginatedResponse, PaginationParams, WithdrawalDecision, WithdrawalPageResponse,
    WithdrawalQuery, WithdrawalResponse,
};
use crate::services::LedgerService;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

#[derive(Clone)]
pub struct WithdrawalService {
    pool: DatabaseConnection,
    ledger: LedgerService,
}

impl WithdrawalService {
    pub fn new(pool: DatabaseConnection, ledger: LedgerService) -> Self {
        Self { pool, ledger }
    }

    /// 申请提现：整笔余额转为一条待审核的提现记录
    ///
    /// 逻辑:
    /// 1. 校验联盟身份与收款账户
    /// 2. 余额 CAS 清零，得到提现金额
    /// 3. 以清零金额和当前收款账户快照写提现记录
    ///
    /// 2、3 在同一事务内提交；写记录或提交失败时事务回滚，余额不会丢失，
    /// 但仍按对账要求记录 user_id / 金额 / 时间。
    pub async fn request_withdrawal(&self, user_id: i64) -> AppResult<withdrawals::Model> {
        let txn = self.pool.begin().await?;

        let account = users::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        if !account.is_affiliate {
            return Err(AppError::NotAffiliate);
        }
        let bank_details = account
            .bank_details()
            .ok_or(AppError::MissingBankDetails)?;

        let amount = self.ledger.debit_to_zero_with(&txn, user_id).await?;

        let now = Utc::now();
        let inserted = withdrawals::ActiveModel {
            user_id: Set(user_id),
            amount: Set(amount),
            status: Set(WithdrawalStatus::Pending),
            bank_account_number: Set(bank_details.account_number),
            bank_name: Set(bank_details.bank_name),
            bank_account_name: Set(bank_details.account_name),
            admin_note: Set(None),
            resolved_by: Set(None),
            resolved_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await;

        let withdrawal = match inserted {
            Ok(w) => w,
            Err(e) => {
                log::error!(
                    "Withdrawal record insert failed after balance debit; user_id={user_id} amount={amount} at={} error={e}",
                    now.to_rfc3339()
                );
                return Err(AppError::InternalError(
                    "Failed to record withdrawal".to_string(),
                ));
            }
        };

        if let Err(e) = txn.commit().await {
            log::error!(
                "Withdrawal commit failed, manual reconciliation required; user_id={user_id} amount={amount} at={} error={e}",
                now.to_rfc3339()
            );
            return Err(AppError::InternalError(
                "Failed to commit withdrawal".to_string(),
            ));
        }

        log::info!(
            "Withdrawal {} created for user {user_id}, amount {amount}",
            withdrawal.id
        );
        Ok(withdrawal)
    }

    /// 管理员审核：仅 pending 可转为 approved / rejected
    /// 驳回不会自动退回余额，如需退回由管理员另行补发
    pub async fn resolve(
        &self,
        withdrawal_id: i64,
        decision: WithdrawalDecision,
        note: Option<String>,
        admin_id: i64,
    ) -> AppResult<withdrawals::Model> {
        let target = decision.target_status();
        let note = note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        let now = Utc::now();

        // 条件更新保证状态只流转一次
        let result = withdrawals::Entity::update_many()
            .col_expr(withdrawals::Column::Status, Expr::value(target.to_value()))
            .col_expr(withdrawals::Column::AdminNote, Expr::value(note))
            .col_expr(withdrawals::Column::ResolvedBy, Expr::value(admin_id))
            .col_expr(withdrawals::Column::ResolvedAt, Expr::value(now))
            .col_expr(withdrawals::Column::UpdatedAt, Expr::value(now))
            .filter(withdrawals::Column::Id.eq(withdrawal_id))
            .filter(withdrawals::Column::Status.eq(WithdrawalStatus::Pending))
            .exec(&self.pool)
            .await?;

        let current = self.get_withdrawal(withdrawal_id).await?;
        if result.rows_affected == 0 {
            return Err(AppError::InvalidTransition {
                from: current.status,
            });
        }

        log::info!(
            "Withdrawal {withdrawal_id} {target} by admin {admin_id} (amount {})",
            current.amount
        );
        Ok(current)
    }

    pub async fn get_withdrawal(&self, withdrawal_id: i64) -> AppResult<withdrawals::Model> {
        withdrawals::Entity::find_by_id(withdrawal_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Withdrawal not found".to_string()))
    }

    /// 分页查询；user_id 为空时查询全部（管理员）
    pub async fn list_withdrawals(
        &self,
        user_id: Option<i64>,
        query: &WithdrawalQuery,
    ) -> AppResult<WithdrawalPageResponse> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut base_query = withdrawals::Entity::find();
        if let Some(user_id) = user_id {
            base_query = base_query.filter(withdrawals::Column::UserId.eq(user_id));
        }
        if let Some(status) = query.status {
            base_query = base_query.filter(withdrawals::Column::Status.eq(status));
        }

        let total = base_query.clone().count(&self.pool).await? as i64;
        let items = base_query
            .order_by_desc(withdrawals::Column::CreatedAt)
            .order_by_desc(withdrawals::Column::Id)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?;

        let items: Vec<WithdrawalResponse> = items.into_iter().map(Into::into).collect();
        Ok(PaginatedResponse::new(items, &params, total))
    }

    /// 用户审核中的提现总额
    pub async fn pending_total(&self, user_id: i64) -> AppResult<i64> {
        let pending = withdrawals::Entity::find()
            .filter(withdrawals::Column::UserId.eq(user_id))
            .filter(withdrawals::Column::Status.eq(WithdrawalStatus::Pending))
            .all(&self.pool)
            .await?;
        Ok(pending.iter().map(|w| w.amount).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::user_model;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_failed_record_insert_is_internal_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user_model(1, 500)], vec![user_model(1, 500)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_errors([DbErr::Custom("connection reset".to_string())])
            .into_connection();
        let service = WithdrawalService::new(db.clone(), LedgerService::new(db, 5));

        let err = service.request_withdrawal(1).await.unwrap_err();
        assert!(matches!(err, AppError::InternalError(_)));
        assert!(!err.public_message().contains("record"));
    }
}
