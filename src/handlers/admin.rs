use crate::middlewares::current_user;
use crate::models::*;
use crate::services::RewardsService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/admin/users/{id}/credit",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "用户ID")
    ),
    request_body = AdminCreditRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "补发成功", body = BalanceResponse),
        (status = 400, description = "金额必须为正数"),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn credit_user(
    rewards: web::Data<RewardsService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<AdminCreditRequest>,
) -> Result<HttpResponse> {
    let admin = current_user(&req)?;
    let request = request.into_inner();

    match rewards
        .admin_credit(&admin, path.into_inner(), request.amount, request.reason.as_deref())
        .await
    {
        Ok(balance) => Ok(HttpResponse::Ok().json(ApiResponse::success(balance))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/users/{id}/affiliate",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "用户ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取联盟账户概览成功", body = AffiliateSummaryResponse),
        (status = 403, description = "需要管理员权限"),
        (status = 404, description = "用户不存在")
    )
)]
pub async fn get_user_affiliate(
    rewards: web::Data<RewardsService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let admin = current_user(&req)?;

    match rewards.affiliate_summary(&admin, path.into_inner()).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(ApiResponse::success(summary))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/withdrawals",
    tag = "admin",
    params(
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量"),
        ("status" = Option<String>, Query, description = "状态: pending/approved/rejected")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取提现申请成功", body = WithdrawalPageResponse),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn list_withdrawals(
    rewards: web::Data<RewardsService>,
    req: HttpRequest,
    query: web::Query<WithdrawalQuery>,
) -> Result<HttpResponse> {
    let admin = current_user(&req)?;

    match rewards.list_all_withdrawals(&admin, &query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/withdrawals/{id}/resolve",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "提现记录ID")
    ),
    request_body = ResolveWithdrawalRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "审核完成", body = WithdrawalResponse),
        (status = 403, description = "需要管理员权限"),
        (status = 404, description = "提现记录不存在"),
        (status = 409, description = "提现申请已处理")
    )
)]
pub async fn resolve_withdrawal(
    rewards: web::Data<RewardsService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<ResolveWithdrawalRequest>,
) -> Result<HttpResponse> {
    let admin = current_user(&req)?;
    let request = request.into_inner();

    match rewards
        .resolve_withdrawal(&admin, path.into_inner(), request.decision, request.note)
        .await
    {
        Ok(withdrawal) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            WithdrawalResponse::from(withdrawal),
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/coupons",
    tag = "admin",
    params(
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量"),
        ("user_id" = Option<i64>, Query, description = "所属用户ID"),
        ("batch_id" = Option<i64>, Query, description = "推荐批次ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取优惠券成功", body = CouponPageResponse),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn list_coupons(
    rewards: web::Data<RewardsService>,
    req: HttpRequest,
    query: web::Query<CouponQuery>,
) -> Result<HttpResponse> {
    let admin = current_user(&req)?;

    match rewards.list_coupons(&admin, &query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/coupons",
    tag = "admin",
    request_body = CreateCouponRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "创建优惠券成功", body = CouponResponse),
        (status = 400, description = "优惠券参数错误"),
        (status = 403, description = "需要管理员权限"),
        (status = 409, description = "优惠码已存在")
    )
)]
pub async fn create_coupon(
    rewards: web::Data<RewardsService>,
    req: HttpRequest,
    request: web::Json<CreateCouponRequest>,
) -> Result<HttpResponse> {
    let admin = current_user(&req)?;

    match rewards
        .create_coupon(&admin, CouponSpec::from(request.into_inner()))
        .await
    {
        Ok(coupon) => Ok(HttpResponse::Ok().json(ApiResponse::success(CouponResponse::from(coupon)))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/coupons/{id}/active",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "优惠券ID")
    ),
    request_body = SetActiveRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "更新成功", body = CouponResponse),
        (status = 403, description = "需要管理员权限"),
        (status = 404, description = "优惠券不存在")
    )
)]
pub async fn set_coupon_active(
    rewards: web::Data<RewardsService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<SetActiveRequest>,
) -> Result<HttpResponse> {
    let admin = current_user(&req)?;

    match rewards
        .set_coupon_active(&admin, path.into_inner(), request.is_active)
        .await
    {
        Ok(coupon) => Ok(HttpResponse::Ok().json(ApiResponse::success(CouponResponse::from(coupon)))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/coupons/{id}",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "优惠券ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "删除成功"),
        (status = 403, description = "需要管理员权限"),
        (status = 404, description = "优惠券不存在")
    )
)]
pub async fn delete_coupon(
    rewards: web::Data<RewardsService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let admin = current_user(&req)?;

    match rewards.delete_coupon(&admin, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Coupon deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/referral-batches",
    tag = "admin",
    request_body = CreateReferralBatchRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "创建推荐批次成功", body = ReferralBatchResponse),
        (status = 400, description = "批次参数错误"),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn create_batch(
    rewards: web::Data<RewardsService>,
    req: HttpRequest,
    request: web::Json<CreateReferralBatchRequest>,
) -> Result<HttpResponse> {
    let admin = current_user(&req)?;

    match rewards.create_batch(&admin, request.into_inner()).await {
        Ok(batch) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            ReferralBatchResponse::from(batch),
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/referral-batches/{id}/active",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "批次ID")
    ),
    request_body = SetActiveRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "更新成功", body = ReferralBatchResponse),
        (status = 403, description = "需要管理员权限"),
        (status = 404, description = "批次不存在")
    )
)]
pub async fn set_batch_active(
    rewards: web::Data<RewardsService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<SetActiveRequest>,
) -> Result<HttpResponse> {
    let admin = current_user(&req)?;

    match rewards
        .set_batch_active(&admin, path.into_inner(), request.is_active)
        .await
    {
        Ok(batch) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            ReferralBatchResponse::from(batch),
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/users/{id}/credit", web::post().to(credit_user))
            .route("/users/{id}/affiliate", web::get().to(get_user_affiliate))
            .route("/withdrawals", web::get().to(list_withdrawals))
            .route("/withdrawals/{id}/resolve", web::post().to(resolve_withdrawal))
            .route("/coupons", web::get().to(list_coupons))
            .route("/coupons", web::post().to(create_coupon))
            .route("/coupons/{id}/active", web::put().to(set_coupon_active))
            .route("/coupons/{id}", web::delete().to(delete_coupon))
            .route("/referral-batches", web::post().to(create_batch))
            .route("/referral-batches/{id}/active", web::put().to(set_batch_active)),
    );
}
