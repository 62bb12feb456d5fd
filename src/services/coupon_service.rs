use crate::entities::{DiscountType, coupon_entity as coupons};
use crate::error::{AppError, AppResult};
use crate::models::{
    CouponPageResponse, CouponQuery, CouponQuoteResponse, CouponResponse, CouponSpec,
    PaginatedResponse, PaginationParams,
};
use crate::utils::normalize_code;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait,
};

#[derive(Clone)]
pub struct CouponService {
    pool: DatabaseConnection,
}

impl CouponService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 发券
    /// - 券码大小写不敏感，统一转大写后校验唯一
    /// - value 不能为负数，百分比券不能超过 100
    pub async fn issue(&self, spec: CouponSpec) -> AppResult<coupons::Model> {
        self.issue_with(&self.pool, spec).await
    }

    pub async fn issue_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        spec: CouponSpec,
    ) -> AppResult<coupons::Model> {
        let code = normalize_code(&spec.code);
        validate_spec(&code, &spec)?;

        if Self::find_by_code_with(conn, &code).await?.is_some() {
            return Err(AppError::DuplicateCode(code));
        }

        let now = Utc::now();
        let inserted = coupons::ActiveModel {
            code: Set(code.clone()),
            discount_type: Set(spec.discount_type),
            value: Set(spec.value),
            max_amount: Set(spec.max_amount),
            expiration_date: Set(spec.expiration_date),
            usage_limit: Set(spec.usage_limit),
            used_count: Set(0),
            is_active: Set(spec.is_active),
            user_id: Set(spec.user_id),
            batch_id: Set(spec.batch_id),
            is_used: Set(false),
            used_at: Set(None),
            order_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await;

        match inserted {
            Ok(coupon) => {
                log::info!("Coupon {} issued (user {:?}, batch {:?})", coupon.code, coupon.user_id, coupon.batch_id);
                Ok(coupon)
            }
            // 并发发券时由唯一索引兜底：同批次同用户为重复领取，其余为券码冲突
            Err(e) => match unique_violation(&e) {
                Some(detail) if is_batch_claim_violation(&detail) => Err(AppError::AlreadyClaimed),
                Some(_) => Err(AppError::DuplicateCode(code)),
                None => Err(e.into()),
            },
        }
    }

    /// 核销优惠券
    ///
    /// 校验顺序: 不存在 -> 停用 -> 过期 -> 次数用尽。
    /// 次数扣减是带条件的原子更新 (`used_count < usage_limit`)，
    /// 并发核销同一张限量券时最多成功 usage_limit 次。
    pub async fn redeem(&self, code: &str, order_id: &str) -> AppResult<coupons::Model> {
        let txn = self.pool.begin().await?;
        let coupon = self.redeem_with(&txn, code, order_id).await?;
        txn.commit().await?;
        log::info!("Coupon {} redeemed for order {order_id}", coupon.code);
        Ok(coupon)
    }

    pub async fn redeem_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        code: &str,
        order_id: &str,
    ) -> AppResult<coupons::Model> {
        let order_id = order_id.trim();
        if order_id.is_empty() {
            return Err(AppError::ValidationError("Order id is required".to_string()));
        }

        let code = normalize_code(code);
        let coupon = Self::find_by_code_with(conn, &code)
            .await?
            .ok_or_else(|| AppError::NotFound("Coupon not found".to_string()))?;

        let now = Utc::now();
        check_redeemable(&coupon, now)?;

        if !Self::consume_use(conn, coupon.id, order_id, now).await? {
            // 条件更新失败：读到的是旧状态，按最新状态给出具体原因
            let latest = coupons::Entity::find_by_id(coupon.id)
                .one(conn)
                .await?
                .ok_or_else(|| AppError::NotFound("Coupon not found".to_string()))?;
            check_redeemable(&latest, now)?;
            return Err(AppError::UsageExceeded);
        }

        // 次数达到上限时标记为已使用
        coupons::Entity::update_many()
            .col_expr(coupons::Column::IsUsed, Expr::value(true))
            .filter(coupons::Column::Id.eq(coupon.id))
            .filter(coupons::Column::UsageLimit.is_not_null())
            .filter(
                Expr::col(coupons::Column::UsedCount).gte(Expr::col(coupons::Column::UsageLimit)),
            )
            .exec(conn)
            .await?;

        coupons::Entity::find_by_id(coupon.id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::InternalError("Coupon disappeared after redemption".into()))
    }

    /// 启用且次数未满时使用次数 +1，返回是否命中
    async fn consume_use<C: ConnectionTrait>(
        conn: &C,
        coupon_id: i64,
        order_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = coupons::Entity::update_many()
            .col_expr(
                coupons::Column::UsedCount,
                Expr::col(coupons::Column::UsedCount).add(1),
            )
            .col_expr(coupons::Column::UsedAt, Expr::value(now))
            .col_expr(coupons::Column::OrderId, Expr::value(order_id.to_string()))
            .col_expr(coupons::Column::UpdatedAt, Expr::value(now))
            .filter(coupons::Column::Id.eq(coupon_id))
            .filter(coupons::Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(coupons::Column::UsageLimit.is_null())
                    .add(
                        Expr::col(coupons::Column::UsedCount)
                            .lt(Expr::col(coupons::Column::UsageLimit)),
                    ),
            )
            .exec(conn)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// 试算优惠金额，不扣减次数
    pub async fn quote(&self, code: &str, subtotal: i64) -> AppResult<CouponQuoteResponse> {
        if subtotal < 0 {
            return Err(AppError::InvalidAmount);
        }
        let coupon = self
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::NotFound("Coupon not found".to_string()))?;
        check_redeemable(&coupon, Utc::now())?;

        let discount = coupon.discount_for(subtotal);
        Ok(CouponQuoteResponse {
            code: coupon.code,
            discount_type: coupon.discount_type,
            value: coupon.value,
            discount,
            payable: subtotal - discount,
        })
    }

    pub async fn find_by_code(&self, code: &str) -> AppResult<Option<coupons::Model>> {
        Self::find_by_code_with(&self.pool, &normalize_code(code)).await
    }

    pub async fn code_exists<C: ConnectionTrait>(conn: &C, code: &str) -> AppResult<bool> {
        Ok(Self::find_by_code_with(conn, &normalize_code(code))
            .await?
            .is_some())
    }

    async fn find_by_code_with<C: ConnectionTrait>(
        conn: &C,
        normalized: &str,
    ) -> AppResult<Option<coupons::Model>> {
        Ok(coupons::Entity::find()
            .filter(coupons::Column::Code.eq(normalized))
            .one(conn)
            .await?)
    }

    pub async fn get_coupon(&self, coupon_id: i64) -> AppResult<coupons::Model> {
        coupons::Entity::find_by_id(coupon_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Coupon not found".to_string()))
    }

    /// 启用/停用（管理员）
    pub async fn set_active(&self, coupon_id: i64, is_active: bool) -> AppResult<coupons::Model> {
        let result = coupons::Entity::update_many()
            .col_expr(coupons::Column::IsActive, Expr::value(is_active))
            .col_expr(coupons::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(coupons::Column::Id.eq(coupon_id))
            .exec(&self.pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Coupon not found".to_string()));
        }
        self.get_coupon(coupon_id).await
    }

    /// 删除优惠券，仅管理员操作使用
    pub async fn delete(&self, coupon_id: i64) -> AppResult<()> {
        let result = coupons::Entity::delete_by_id(coupon_id)
            .exec(&self.pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Coupon not found".to_string()));
        }
        log::info!("Coupon {coupon_id} deleted");
        Ok(())
    }

    pub async fn list_coupons(&self, query: &CouponQuery) -> AppResult<CouponPageResponse> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut base_query = coupons::Entity::find();
        if let Some(user_id) = query.user_id {
            base_query = base_query.filter(coupons::Column::UserId.eq(user_id));
        }
        if let Some(batch_id) = query.batch_id {
            base_query = base_query.filter(coupons::Column::BatchId.eq(batch_id));
        }

        let total = base_query.clone().count(&self.pool).await? as i64;
        let items = base_query
            .order_by_desc(coupons::Column::CreatedAt)
            .order_by_desc(coupons::Column::Id)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?;

        let items: Vec<CouponResponse> = items.into_iter().map(Into::into).collect();
        Ok(PaginatedResponse::new(items, &params, total))
    }
}

/// 核销前的业务校验（不含存在性）
pub fn check_redeemable(coupon: &coupons::Model, now: DateTime<Utc>) -> AppResult<()> {
    if !coupon.is_active {
        return Err(AppError::CouponInactive);
    }
    if coupon.is_expired(now) {
        return Err(AppError::CouponExpired);
    }
    if coupon.is_used || coupon.is_exhausted() {
        // 单次券用完视为"已使用"，多次券视为"次数用尽"
        return Err(if coupon.is_single_use() {
            AppError::AlreadyUsed
        } else {
            AppError::UsageExceeded
        });
    }
    Ok(())
}

fn validate_spec(code: &str, spec: &CouponSpec) -> AppResult<()> {
    if code.is_empty() {
        return Err(AppError::ValidationError("Coupon code is required".to_string()));
    }
    if code.len() > 64 {
        return Err(AppError::ValidationError("Coupon code is too long".to_string()));
    }
    if spec.value < 0 {
        return Err(AppError::InvalidValue(
            "Coupon value must not be negative".to_string(),
        ));
    }
    if spec.discount_type == DiscountType::Percentage && spec.value > 100 {
        return Err(AppError::InvalidValue(
            "Percentage coupon value must not exceed 100".to_string(),
        ));
    }
    if matches!(spec.max_amount, Some(cap) if cap < 0) {
        return Err(AppError::InvalidValue(
            "Maximum discount must not be negative".to_string(),
        ));
    }
    if matches!(spec.usage_limit, Some(limit) if limit <= 0) {
        return Err(AppError::InvalidValue(
            "Usage limit must be positive".to_string(),
        ));
    }
    Ok(())
}

fn unique_violation(e: &DbErr) -> Option<String> {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => Some(detail),
        _ => None,
    }
}

/// Postgres 报索引名，SQLite 报列名
fn is_batch_claim_violation(detail: &str) -> bool {
    detail.contains("idx_coupons_batch_user_unique") || detail.contains("coupons.batch_id")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{coupon_model, insert_coupon, sqlite_db};
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn coupon(usage_limit: Option<i32>, used_count: i32) -> coupons::Model {
        let now = Utc::now();
        coupons::Model {
            id: 1,
            code: "SAVE10".to_string(),
            discount_type: DiscountType::Percentage,
            value: 10,
            max_amount: None,
            expiration_date: None,
            usage_limit,
            used_count,
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
    fn test_expired_wins_over_remaining_uses() {
        let mut c = coupon(Some(5), 1);
        c.expiration_date = Some(Utc::now() - Duration::days(1));
        assert!(matches!(
            check_redeemable(&c, Utc::now()),
            Err(AppError::CouponExpired)
        ));
    }

    #[test]
    fn test_inactive_is_checked_first() {
        let mut c = coupon(Some(1), 1);
        c.is_active = false;
        c.expiration_date = Some(Utc::now() - Duration::days(1));
        assert!(matches!(
            check_redeemable(&c, Utc::now()),
            Err(AppError::CouponInactive)
        ));
    }

    #[test]
    fn test_exhausted_single_use_is_already_used() {
        assert!(matches!(
            check_redeemable(&coupon(Some(1), 1), Utc::now()),
            Err(AppError::AlreadyUsed)
        ));
    }

    #[test]
    fn test_exhausted_multi_use_is_usage_exceeded() {
        assert!(matches!(
            check_redeemable(&coupon(Some(3), 3), Utc::now()),
            Err(AppError::UsageExceeded)
        ));
        assert!(check_redeemable(&coupon(None, 1000), Utc::now()).is_ok());
    }

    #[test]
    fn test_batch_claim_violation_detection() {
        assert!(is_batch_claim_violation(
            "duplicate key value violates unique constraint \"idx_coupons_batch_user_unique\""
        ));
        assert!(is_batch_claim_violation(
            "UNIQUE constraint failed: coupons.batch_id, coupons.user_id"
        ));
        assert!(!is_batch_claim_violation(
            "duplicate key value violates unique constraint \"idx_coupons_code_unique\""
        ));
        assert!(!is_batch_claim_violation("UNIQUE constraint failed: coupons.code"));
    }

    #[tokio::test]
    async fn test_stale_coupon_use_is_refused() {
        let db = sqlite_db().await;
        let stale = insert_coupon(&db, "ONCE", Some(1)).await;
        let now = Utc::now();

        // 另一订单先用掉了唯一的次数
        assert!(CouponService::consume_use(&db, stale.id, "order-1", now).await.unwrap());
        assert!(check_redeemable(&stale, now).is_ok());
        assert!(!CouponService::consume_use(&db, stale.id, "order-2", now).await.unwrap());

        let latest = coupons::Entity::find_by_id(stale.id).one(&db).await.unwrap().unwrap();
        assert_eq!(latest.used_count, 1);
        assert_eq!(latest.order_id.as_deref(), Some("order-1"));
    }

    #[tokio::test]
    async fn test_stale_use_on_deactivated_coupon_is_refused() {
        let db = sqlite_db().await;
        let coupon = insert_coupon(&db, "MULTI", None).await;
        let service = CouponService::new(db.clone());
        service.set_active(coupon.id, false).await.unwrap();

        assert!(!CouponService::consume_use(&db, coupon.id, "order-1", Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_lost_redeem_race_reports_latest_state() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![coupon_model(Some(1), 0)], vec![coupon_model(Some(1), 1)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let service = CouponService::new(db);

        assert!(matches!(
            service.redeem("save10", "order-2").await,
            Err(AppError::AlreadyUsed)
        ));
    }

    #[tokio::test]
    async fn test_lost_multi_use_race_is_usage_exceeded() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![coupon_model(Some(3), 2)], vec![coupon_model(Some(3), 3)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let service = CouponService::new(db);

        assert!(matches!(
            service.redeem("SAVE10", "order-9").await,
            Err(AppError::UsageExceeded)
        ));
    }

    #[test]
    fn test_validate_spec() {
        let spec = CouponSpec::single_use("SAVE10", DiscountType::Percentage, 10);
        assert!(validate_spec("SAVE10", &spec).is_ok());
        assert!(matches!(
            validate_spec("", &spec),
            Err(AppError::ValidationError(_))
        ));

        let negative = CouponSpec::single_use("NEG", DiscountType::Fixed, -1);
        assert!(matches!(
            validate_spec("NEG", &negative),
            Err(AppError::InvalidValue(_))
        ));

        let too_much = CouponSpec::single_use("HALF", DiscountType::Percentage, 150);
        assert!(matches!(
            validate_spec("HALF", &too_much),
            Err(AppError::InvalidValue(_))
        ));

        let mut zero_limit = CouponSpec::single_use("ZERO", DiscountType::Fixed, 100);
        zero_limit.usage_limit = Some(0);
        assert!(matches!(
            validate_spec("ZERO", &zero_limit),
            Err(AppError::InvalidValue(_))
        ));
    }
}
