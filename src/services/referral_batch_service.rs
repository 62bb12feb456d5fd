use crate::config::RewardsConfig;
use crate::entities::{
    DiscountType, coupon_entity as coupons, referral_batch_entity as batches,
    user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    CouponSpec, CreateReferralBatchRequest, PaginatedResponse, PaginationParams,
    ReferralBatchPageResponse, ReferralBatchQuery, ReferralBatchResponse,
};
use crate::services::CouponService;
use crate::utils::generate_coupon_code;
use chrono::{Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

const CODE_GENERATION_ATTEMPTS: usize = 10;

#[derive(Clone)]
pub struct ReferralBatchService {
    pool: DatabaseConnection,
    coupon_service: CouponService,
    rewards: RewardsConfig,
}

impl ReferralBatchService {
    pub fn new(
        pool: DatabaseConnection,
        coupon_service: CouponService,
        rewards: RewardsConfig,
    ) -> Self {
        Self {
            pool,
            coupon_service,
            rewards,
        }
    }

    /// 创建推荐批次（管理员）
    pub async fn create_batch(&self, req: CreateReferralBatchRequest) -> AppResult<batches::Model> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::ValidationError("Batch name is required".into()));
        }
        if req.end_date <= req.start_date {
            return Err(AppError::ValidationError(
                "End date must be after start date".into(),
            ));
        }
        if req.max_winners <= 0 {
            return Err(AppError::ValidationError(
                "Max winners must be positive".into(),
            ));
        }

        let discount_type = req
            .discount_type
            .unwrap_or(self.rewards.default_discount_type);
        let discount_value = req
            .discount_value
            .unwrap_or(self.rewards.default_discount_value);
        let max_discount = req.max_discount.or(self.rewards.default_max_discount);
        let coupon_valid_days = req
            .coupon_valid_days
            .unwrap_or(self.rewards.default_coupon_valid_days);

        if discount_value < 0
            || (discount_type == DiscountType::Percentage && discount_value > 100)
        {
            return Err(AppError::InvalidValue(
                "Referral coupon value is out of range".into(),
            ));
        }
        if matches!(max_discount, Some(cap) if cap < 0) {
            return Err(AppError::InvalidValue(
                "Maximum discount must not be negative".into(),
            ));
        }
        if coupon_valid_days <= 0 {
            return Err(AppError::ValidationError(
                "Coupon validity must be at least one day".into(),
            ));
        }

        let now = Utc::now();
        let batch = batches::ActiveModel {
            name: Set(name),
            start_date: Set(req.start_date),
            end_date: Set(req.end_date),
            max_winners: Set(req.max_winners),
            current_winners: Set(0),
            is_active: Set(true),
            discount_type: Set(discount_type),
            discount_value: Set(discount_value),
            max_discount: Set(max_discount),
            coupon_valid_days: Set(coupon_valid_days),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!(
            "Referral batch {} '{}' created with {} slots",
            batch.id,
            batch.name,
            batch.max_winners
        );
        Ok(batch)
    }

    pub async fn get_batch(&self, batch_id: i64) -> AppResult<batches::Model> {
        batches::Entity::find_by_id(batch_id)
            .one(&self.pool)
            .await?
            .ok_or(AppError::BatchNotFound)
    }

    /// 启用、在时间窗口内且 current_winners < max_winners
    pub async fn can_issue(&self, batch_id: i64) -> AppResult<bool> {
        Ok(self.get_batch(batch_id).await?.can_issue(Utc::now()))
    }

    pub async fn set_active(&self, batch_id: i64, is_active: bool) -> AppResult<batches::Model> {
        let result = batches::Entity::update_many()
            .col_expr(batches::Column::IsActive, Expr::value(is_active))
            .col_expr(batches::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(batches::Column::Id.eq(batch_id))
            .exec(&self.pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::BatchNotFound);
        }
        self.get_batch(batch_id).await
    }

    pub async fn list_batches(&self, query: &ReferralBatchQuery) -> AppResult<ReferralBatchPageResponse> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut base_query = batches::Entity::find();
        if query.active_only.unwrap_or(false) {
            base_query = base_query.filter(batches::Column::IsActive.eq(true));
        }

        let total = base_query.clone().count(&self.pool).await? as i64;
        let items = base_query
            .order_by_desc(batches::Column::StartDate)
            .order_by_desc(batches::Column::Id)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?;

        let items: Vec<ReferralBatchResponse> = items.into_iter().map(Into::into).collect();
        Ok(PaginatedResponse::new(items, &params, total))
    }

    /// 为批次发放一张推荐券
    ///
    /// 逻辑:
    /// 1. 校验批次存在、用户存在、用户未在本批次领过券
    /// 2. 校验启用状态与时间窗口
    /// 3. 原子占用名额 (update where current_winners < max_winners)
    /// 4. 按批次模板发放单次券
    ///
    /// 3、4 在同一事务内，发券失败时名额随事务回滚，current_winners 只随成功发券递增。
    pub async fn issue_for_batch(&self, batch_id: i64, user_id: i64) -> AppResult<coupons::Model> {
        let txn = self.pool.begin().await?;

        let batch = batches::Entity::find_by_id(batch_id)
            .one(&txn)
            .await?
            .ok_or(AppError::BatchNotFound)?;

        if users::Entity::find_by_id(user_id).one(&txn).await?.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let already_claimed = coupons::Entity::find()
            .filter(coupons::Column::BatchId.eq(batch_id))
            .filter(coupons::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
            .is_some();
        if already_claimed {
            return Err(AppError::AlreadyClaimed);
        }

        let now = Utc::now();
        if !batch.can_issue(now) {
            log::info!(
                "Referral batch {batch_id} refused user {user_id}: active={} window_open={} winners={}/{}",
                batch.is_active,
                batch.window_open(now),
                batch.current_winners,
                batch.max_winners
            );
            return Err(AppError::BatchClosed);
        }

        if !Self::claim_slot(&txn, batch_id, now).await? {
            // 并发发券时名额已被抢完
            log::info!("Referral batch {batch_id} filled up before user {user_id} could claim");
            return Err(AppError::BatchClosed);
        }

        let code = self.unique_code(&txn).await?;
        let spec = CouponSpec {
            code,
            discount_type: batch.discount_type,
            value: batch.discount_value,
            max_amount: batch.max_discount,
            expiration_date: Some(now + Duration::days(batch.coupon_valid_days as i64)),
            usage_limit: Some(1),
            is_active: true,
            user_id: Some(user_id),
            batch_id: Some(batch_id),
        };
        let coupon = self.coupon_service.issue_with(&txn, spec).await?;

        txn.commit().await?;

        log::info!(
            "Referral coupon {} issued to user {user_id} from batch {batch_id}",
            coupon.code
        );
        Ok(coupon)
    }

    /// 批次启用且未满员时占用一个名额，返回是否占到
    async fn claim_slot<C: ConnectionTrait>(
        conn: &C,
        batch_id: i64,
        now: chrono::DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = batches::Entity::update_many()
            .col_expr(
                batches::Column::CurrentWinners,
                Expr::col(batches::Column::CurrentWinners).add(1),
            )
            .col_expr(batches::Column::UpdatedAt, Expr::value(now))
            .filter(batches::Column::Id.eq(batch_id))
            .filter(batches::Column::IsActive.eq(true))
            .filter(
                Expr::col(batches::Column::CurrentWinners)
                    .lt(Expr::col(batches::Column::MaxWinners)),
            )
            .exec(conn)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn unique_code<C: ConnectionTrait>(&self, conn: &C) -> AppResult<String> {
        for _ in 0..CODE_GENERATION_ATTEMPTS {
            let code = generate_coupon_code(&self.rewards.coupon_code_prefix);
            if !CouponService::code_exists(conn, &code).await? {
                return Ok(code);
            }
        }
        Err(AppError::InternalError(
            "Failed to generate a unique coupon code".into(),
        ))
    }
}
