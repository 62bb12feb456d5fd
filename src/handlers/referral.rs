use crate::middlewares::current_user;
use crate::models::*;
use crate::services::RewardsService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/referral-batches",
    tag = "referral",
    params(
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量"),
        ("active_only" = Option<bool>, Query, description = "仅显示启用中的批次")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取推荐批次成功", body = ReferralBatchPageResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn list_batches(
    rewards: web::Data<RewardsService>,
    query: web::Query<ReferralBatchQuery>,
) -> Result<HttpResponse> {
    match rewards.list_batches(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/referral-batches/{id}",
    tag = "referral",
    params(
        ("id" = i64, Path, description = "批次ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取推荐批次成功", body = ReferralBatchResponse),
        (status = 404, description = "批次不存在")
    )
)]
pub async fn get_batch(
    rewards: web::Data<RewardsService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match rewards.get_batch(path.into_inner()).await {
        Ok(batch) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            ReferralBatchResponse::from(batch),
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/referral-batches/{id}/availability",
    tag = "referral",
    params(
        ("id" = i64, Path, description = "批次ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "批次当前是否可发券"),
        (status = 404, description = "批次不存在")
    )
)]
pub async fn get_availability(
    rewards: web::Data<RewardsService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let batch_id = path.into_inner();

    match rewards.can_issue(batch_id).await {
        Ok(can_issue) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": {
                "batch_id": batch_id,
                "can_issue": can_issue
            }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/referral-batches/{id}/coupons",
    tag = "referral",
    params(
        ("id" = i64, Path, description = "批次ID")
    ),
    request_body = IssueReferralCouponRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "推荐券发放成功", body = ReferralCouponResponse),
        (status = 404, description = "批次或用户不存在"),
        (status = 409, description = "活动已结束、名额已满或已领取")
    )
)]
pub async fn issue_coupon(
    rewards: web::Data<RewardsService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<IssueReferralCouponRequest>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    let batch_id = path.into_inner();

    match rewards
        .issue_referral_coupon(&user, batch_id, request.user_id)
        .await
    {
        Ok(coupon) => Ok(HttpResponse::Ok().json(ApiResponse::success(ReferralCouponResponse {
            batch_id,
            coupon: coupon.into(),
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn referral_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/referral-batches")
            .route("", web::get().to(list_batches))
            .route("/{id}", web::get().to(get_batch))
            .route("/{id}/availability", web::get().to(get_availability))
            .route("/{id}/coupons", web::post().to(issue_coupon)),
    );
}
