use crate::middlewares::current_user;
use crate::models::*;
use crate::services::RewardsService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/coupons",
    tag = "coupon",
    params(
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量"),
        ("batch_id" = Option<i64>, Query, description = "推荐批次ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取我的优惠券成功", body = CouponPageResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_my_coupons(
    rewards: web::Data<RewardsService>,
    req: HttpRequest,
    query: web::Query<CouponQuery>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;

    match rewards.list_my_coupons(&user, &query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/coupons/redeem",
    tag = "coupon",
    request_body = RedeemCouponRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "核销成功", body = CouponResponse),
        (status = 403, description = "不能核销他人的优惠券"),
        (status = 404, description = "优惠券不存在"),
        (status = 409, description = "优惠券已停用、已过期或已用完")
    )
)]
pub async fn redeem_coupon(
    rewards: web::Data<RewardsService>,
    req: HttpRequest,
    request: web::Json<RedeemCouponRequest>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;

    match rewards
        .redeem_coupon(&user, &request.code, &request.order_id)
        .await
    {
        Ok(coupon) => Ok(HttpResponse::Ok().json(ApiResponse::success(CouponResponse::from(coupon)))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/coupons/quote",
    tag = "coupon",
    request_body = QuoteCouponRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "试算优惠金额成功", body = CouponQuoteResponse),
        (status = 404, description = "优惠券不存在"),
        (status = 409, description = "优惠券不可用")
    )
)]
pub async fn quote_coupon(
    rewards: web::Data<RewardsService>,
    req: HttpRequest,
    request: web::Json<QuoteCouponRequest>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;

    match rewards
        .quote_coupon(&user, &request.code, request.subtotal)
        .await
    {
        Ok(quote) => Ok(HttpResponse::Ok().json(ApiResponse::success(quote))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn coupon_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/coupons")
            .route("", web::get().to(get_my_coupons))
            .route("/redeem", web::post().to(redeem_coupon))
            .route("/quote", web::post().to(quote_coupon)),
    );
}
