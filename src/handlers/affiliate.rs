use crate::middlewares::current_user;
use crate::models::*;
use crate::services::RewardsService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/affiliate/enroll",
    tag = "affiliate",
    request_body = EnrollAffiliateRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "加入联盟计划成功", body = AffiliateSummaryResponse),
        (status = 400, description = "收款账户信息不完整"),
        (status = 401, description = "未授权")
    )
)]
pub async fn enroll(
    rewards: web::Data<RewardsService>,
    req: HttpRequest,
    request: web::Json<EnrollAffiliateRequest>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;

    match rewards
        .enroll_affiliate(&user, request.into_inner().bank_details)
        .await
    {
        Ok(summary) => Ok(HttpResponse::Ok().json(ApiResponse::success(summary))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/affiliate/bank-details",
    tag = "affiliate",
    request_body = BankDetails,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "更新收款账户成功", body = AffiliateSummaryResponse),
        (status = 400, description = "收款账户信息不完整"),
        (status = 401, description = "未授权")
    )
)]
pub async fn update_bank_details(
    rewards: web::Data<RewardsService>,
    req: HttpRequest,
    request: web::Json<BankDetails>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;

    match rewards.update_bank_details(&user, request.into_inner()).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(ApiResponse::success(summary))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/affiliate/summary",
    tag = "affiliate",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取联盟账户概览成功", body = AffiliateSummaryResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_summary(
    rewards: web::Data<RewardsService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;

    match rewards.affiliate_summary(&user, user.id).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(ApiResponse::success(summary))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/affiliate/balance",
    tag = "affiliate",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取余额成功", body = BalanceResponse),
        (status = 401, description = "未授权"),
        (status = 404, description = "用户不存在")
    )
)]
pub async fn get_balance(
    rewards: web::Data<RewardsService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;

    match rewards.read_balance(&user, user.id).await {
        Ok(balance) => Ok(HttpResponse::Ok().json(ApiResponse::success(balance))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/affiliate/rewards",
    tag = "affiliate",
    request_body = AccrueRewardRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "返利入账成功", body = BalanceResponse),
        (status = 400, description = "金额必须为正数"),
        (status = 403, description = "仅后台服务账号可调用")
    )
)]
pub async fn accrue_reward(
    rewards: web::Data<RewardsService>,
    req: HttpRequest,
    request: web::Json<AccrueRewardRequest>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;
    let request = request.into_inner();

    match rewards
        .accrue_referral_reward(&user, request.referrer_id, request.amount)
        .await
    {
        Ok(balance) => Ok(HttpResponse::Ok().json(ApiResponse::success(balance))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/affiliate/withdrawals",
    tag = "affiliate",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "提现申请已提交", body = WithdrawalResponse),
        (status = 400, description = "未绑定收款账户"),
        (status = 409, description = "非联盟用户或余额不足")
    )
)]
pub async fn request_withdrawal(
    rewards: web::Data<RewardsService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;

    match rewards.request_withdrawal(&user).await {
        Ok(withdrawal) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            WithdrawalResponse::from(withdrawal),
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/affiliate/withdrawals",
    tag = "affiliate",
    params(
        ("page" = Option<u32>, Query, description = "页码"),
        ("per_page" = Option<u32>, Query, description = "每页数量"),
        ("status" = Option<String>, Query, description = "状态: pending/approved/rejected")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取提现记录成功", body = WithdrawalPageResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn list_withdrawals(
    rewards: web::Data<RewardsService>,
    req: HttpRequest,
    query: web::Query<WithdrawalQuery>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;

    match rewards.list_my_withdrawals(&user, &query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/affiliate/withdrawals/{id}",
    tag = "affiliate",
    params(
        ("id" = i64, Path, description = "提现记录ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取提现记录成功", body = WithdrawalResponse),
        (status = 404, description = "提现记录不存在")
    )
)]
pub async fn get_withdrawal(
    rewards: web::Data<RewardsService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = current_user(&req)?;

    match rewards.get_withdrawal(&user, path.into_inner()).await {
        Ok(withdrawal) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            WithdrawalResponse::from(withdrawal),
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn affiliate_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/affiliate")
            .route("/enroll", web::post().to(enroll))
            .route("/bank-details", web::put().to(update_bank_details))
            .route("/summary", web::get().to(get_summary))
            .route("/balance", web::get().to(get_balance))
            .route("/rewards", web::post().to(accrue_reward))
            .route("/withdrawals", web::post().to(request_withdrawal))
            .route("/withdrawals", web::get().to(list_withdrawals))
            .route("/withdrawals/{id}", web::get().to(get_withdrawal)),
    );
}
