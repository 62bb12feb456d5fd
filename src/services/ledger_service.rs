use crate::entities::user_entity as users;
use crate::error::{AppError, AppResult};
use crate::models::BankDetails;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait,
};

/// 联盟余额账本：余额只通过条件更新修改，不在内存里做读改写
#[derive(Clone)]
pub struct LedgerService {
    pool: DatabaseConnection,
    debit_max_attempts: u32,
}

impl LedgerService {
    pub fn new(pool: DatabaseConnection, debit_max_attempts: u32) -> Self {
        Self {
            pool,
            debit_max_attempts: debit_max_attempts.max(1),
        }
    }

    /// 增加余额，返回增加后的余额
    pub async fn accrue(&self, user_id: i64, amount: i64) -> AppResult<i64> {
        let txn = self.pool.begin().await?;
        let balance = self.accrue_with(&txn, user_id, amount).await?;
        txn.commit().await?;
        Ok(balance)
    }

    /// 在调用方的连接/事务中增加余额
    pub async fn accrue_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: i64,
        amount: i64,
    ) -> AppResult<i64> {
        if amount <= 0 {
            return Err(AppError::InvalidAmount);
        }

        let result = users::Entity::update_many()
            .col_expr(
                users::Column::AffiliateBalance,
                Expr::col(users::Column::AffiliateBalance).add(amount),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(user_id))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        self.read_balance_with(conn, user_id).await
    }

    pub async fn read_balance(&self, user_id: i64) -> AppResult<i64> {
        self.read_balance_with(&self.pool, user_id).await
    }

    async fn read_balance_with<C: ConnectionTrait>(&self, conn: &C, user_id: i64) -> AppResult<i64> {
        Ok(Self::find_account(conn, user_id).await?.affiliate_balance)
    }

    /// 余额整体清零，返回清零前的金额
    ///
    /// 以读到的余额作为条件做 compare-and-swap：
    /// `UPDATE users SET affiliate_balance = 0 WHERE id = ? AND affiliate_balance = <observed>`。
    /// 并发提现时只有一个请求能命中条件，其余请求重读后得到 0 并返回 `InsufficientBalance`。
    pub async fn debit_to_zero(&self, user_id: i64) -> AppResult<i64> {
        let txn = self.pool.begin().await?;
        let debited = self.debit_to_zero_with(&txn, user_id).await?;
        txn.commit().await?;
        Ok(debited)
    }

    pub async fn debit_to_zero_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: i64,
    ) -> AppResult<i64> {
        for attempt in 1..=self.debit_max_attempts {
            let observed = Self::find_account(conn, user_id).await?.affiliate_balance;
            if observed <= 0 {
                return Err(AppError::InsufficientBalance);
            }

            if Self::zero_if_unchanged(conn, user_id, observed).await? {
                return Ok(observed);
            }

            // 余额在读取后被并发修改（返利入账或其它提现），重读后再试
            log::debug!(
                "Balance of user {user_id} changed during debit (attempt {attempt}), retrying"
            );
        }

        Err(AppError::InternalError(format!(
            "Balance of user {user_id} kept changing during debit"
        )))
    }

    /// 仅当余额仍等于 observed 时清零
    async fn zero_if_unchanged<C: ConnectionTrait>(
        conn: &C,
        user_id: i64,
        observed: i64,
    ) -> AppResult<bool> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::AffiliateBalance, Expr::value(0i64))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(user_id))
            .filter(users::Column::AffiliateBalance.eq(observed))
            .exec(conn)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// 推荐人数 +1
    pub async fn increment_referral_count(&self, user_id: i64) -> AppResult<()> {
        let result = users::Entity::update_many()
            .col_expr(
                users::Column::ReferralCount,
                Expr::col(users::Column::ReferralCount).add(1),
            )
            .filter(users::Column::Id.eq(user_id))
            .exec(&self.pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    pub async fn get_account(&self, user_id: i64) -> AppResult<users::Model> {
        Self::find_account(&self.pool, user_id).await
    }

    /// 加入联盟计划，可同时绑定收款账户
    pub async fn enroll(
        &self,
        user_id: i64,
        bank_details: Option<BankDetails>,
    ) -> AppResult<users::Model> {
        if let Some(details) = &bank_details {
            validate_bank_details(details)?;
        }

        let mut update = users::Entity::update_many()
            .col_expr(users::Column::IsAffiliate, Expr::value(true))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()));
        if let Some(details) = bank_details {
            update = update
                .col_expr(
                    users::Column::BankAccountNumber,
                    Expr::value(details.account_number.trim().to_string()),
                )
                .col_expr(
                    users::Column::BankName,
                    Expr::value(details.bank_name.trim().to_string()),
                )
                .col_expr(
                    users::Column::BankAccountName,
                    Expr::value(details.account_name.trim().to_string()),
                );
        }

        let result = update
            .filter(users::Column::Id.eq(user_id))
            .exec(&self.pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        log::info!("User {user_id} enrolled in the affiliate program");
        self.get_account(user_id).await
    }

    pub async fn update_bank_details(
        &self,
        user_id: i64,
        details: BankDetails,
    ) -> AppResult<users::Model> {
        validate_bank_details(&details)?;

        let result = users::Entity::update_many()
            .col_expr(
                users::Column::BankAccountNumber,
                Expr::value(details.account_number.trim().to_string()),
            )
            .col_expr(
                users::Column::BankName,
                Expr::value(details.bank_name.trim().to_string()),
            )
            .col_expr(
                users::Column::BankAccountName,
                Expr::value(details.account_name.trim().to_string()),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(user_id))
            .exec(&self.pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        self.get_account(user_id).await
    }

    async fn find_account<C: ConnectionTrait>(conn: &C, user_id: i64) -> AppResult<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}

fn validate_bank_details(details: &BankDetails) -> AppResult<()> {
    if !details.is_complete() {
        return Err(AppError::ValidationError(
            "Account number, bank name and account name are all required".to_string(),
        ));
    }
    Ok(())
}
