use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{DiscountType, UserRole, WithdrawalStatus};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::affiliate::enroll,
        handlers::affiliate::update_bank_details,
        handlers::affiliate::get_summary,
        handlers::affiliate::get_balance,
        handlers::affiliate::accrue_reward,
        handlers::affiliate::request_withdrawal,
        handlers::affiliate::list_withdrawals,
        handlers::affiliate::get_withdrawal,
        handlers::coupon::get_my_coupons,
        handlers::coupon::redeem_coupon,
        handlers::coupon::quote_coupon,
        handlers::referral::list_batches,
        handlers::referral::get_batch,
        handlers::referral::get_availability,
        handlers::referral::issue_coupon,
        handlers::admin::credit_user,
        handlers::admin::get_user_affiliate,
        handlers::admin::list_withdrawals,
        handlers::admin::resolve_withdrawal,
        handlers::admin::list_coupons,
        handlers::admin::create_coupon,
        handlers::admin::set_coupon_active,
        handlers::admin::delete_coupon,
        handlers::admin::create_batch,
        handlers::admin::set_batch_active,
    ),
    components(
        schemas(
            UserRole,
            BankDetails,
            EnrollAffiliateRequest,
            AccrueRewardRequest,
            AdminCreditRequest,
            BalanceResponse,
            AffiliateSummaryResponse,
            WithdrawalStatus,
            WithdrawalDecision,
            ResolveWithdrawalRequest,
            WithdrawalQuery,
            WithdrawalResponse,
            DiscountType,
            CreateCouponRequest,
            RedeemCouponRequest,
            QuoteCouponRequest,
            CouponQuoteResponse,
            SetActiveRequest,
            CouponQuery,
            CouponResponse,
            CreateReferralBatchRequest,
            ReferralBatchQuery,
            IssueReferralCouponRequest,
            ReferralBatchResponse,
            ReferralCouponResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "affiliate", description = "Affiliate balance and withdrawal API"),
        (name = "coupon", description = "Coupon redemption API"),
        (name = "referral", description = "Referral campaign API"),
        (name = "admin", description = "Rewards administration API"),
    ),
    info(
        title = "Affiliate Rewards API",
        version = "1.0.0",
        description = "Affiliate balance, withdrawal, coupon and referral campaign REST API"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
