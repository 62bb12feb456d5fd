use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::entities::WithdrawalStatus;
use crate::models::ApiError;

pub type AppResult<T> = Result<T, AppError>;

/// 错误大类，决定 HTTP 状态码以及是否向用户展示原始信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Authorization,
    NotFound,
    Conflict,
    Internal,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Bank details are required before requesting a withdrawal")]
    MissingBankDetails,

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Referral batch not found")]
    BatchNotFound,

    #[error("User is not an affiliate")]
    NotAffiliate,

    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Withdrawal is already {from}")]
    InvalidTransition { from: WithdrawalStatus },

    #[error("Coupon code {0} already exists")]
    DuplicateCode(String),

    #[error("Coupon is inactive")]
    CouponInactive,

    #[error("Coupon has expired")]
    CouponExpired,

    #[error("Coupon usage limit reached")]
    UsageExceeded,

    #[error("Coupon has already been used")]
    AlreadyUsed,

    #[error("This referral campaign is closed or has no rewards left")]
    BatchClosed,

    #[error("Referral reward already claimed for this campaign")]
    AlreadyClaimed,

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidAmount
            | AppError::InvalidValue(_)
            | AppError::MissingBankDetails => ErrorCategory::Validation,
            AppError::AuthError(_) | AppError::Forbidden => ErrorCategory::Authorization,
            AppError::NotFound(_) | AppError::BatchNotFound => ErrorCategory::NotFound,
            AppError::NotAffiliate
            | AppError::InsufficientBalance
            | AppError::InvalidTransition { .. }
            | AppError::DuplicateCode(_)
            | AppError::CouponInactive
            | AppError::CouponExpired
            | AppError::UsageExceeded
            | AppError::AlreadyUsed
            | AppError::BatchClosed
            | AppError::AlreadyClaimed => ErrorCategory::Conflict,
            AppError::DatabaseError(_)
            | AppError::InternalError(_)
            | AppError::JwtError(_)
            | AppError::SerdeJsonError(_) => ErrorCategory::Internal,
        }
    }

    /// 前端使用的稳定错误码
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::InvalidAmount => "INVALID_AMOUNT",
            AppError::InvalidValue(_) => "INVALID_VALUE",
            AppError::MissingBankDetails => "MISSING_BANK_DETAILS",
            AppError::AuthError(_) | AppError::JwtError(_) => "AUTH_ERROR",
            AppError::Forbidden => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::BatchNotFound => "BATCH_NOT_FOUND",
            AppError::NotAffiliate => "NOT_AFFILIATE",
            AppError::InsufficientBalance => "INSUFFICIENT_BALANCE",
            AppError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AppError::DuplicateCode(_) => "DUPLICATE_CODE",
            AppError::CouponInactive => "COUPON_INACTIVE",
            AppError::CouponExpired => "COUPON_EXPIRED",
            AppError::UsageExceeded => "USAGE_EXCEEDED",
            AppError::AlreadyUsed => "ALREADY_USED",
            AppError::BatchClosed => "BATCH_CLOSED",
            AppError::AlreadyClaimed => "ALREADY_CLAIMED",
            AppError::InternalError(_) | AppError::SerdeJsonError(_) => "INTERNAL_ERROR",
        }
    }

    /// 可以直接展示给用户的信息；内部错误只返回通用提示
    pub fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(msg)
            | AppError::InvalidValue(msg)
            | AppError::AuthError(msg)
            | AppError::NotFound(msg) => msg.clone(),
            AppError::DatabaseError(_) => "Database error".to_string(),
            AppError::JwtError(_) => "Invalid access token".to_string(),
            AppError::InternalError(_) | AppError::SerdeJsonError(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match (self.category(), self) {
            (_, AppError::AuthError(_)) | (_, AppError::JwtError(_)) => StatusCode::UNAUTHORIZED,
            (ErrorCategory::Validation, _) => StatusCode::BAD_REQUEST,
            (ErrorCategory::Authorization, _) => StatusCode::FORBIDDEN,
            (ErrorCategory::NotFound, _) => StatusCode::NOT_FOUND,
            (ErrorCategory::Conflict, _) => StatusCode::CONFLICT,
            (ErrorCategory::Internal, _) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self.category() {
            ErrorCategory::Validation | ErrorCategory::Conflict => {
                log::warn!("Business rule rejected request: {self}");
            }
            ErrorCategory::Authorization => log::warn!("Authorization error: {self}"),
            ErrorCategory::NotFound => {}
            ErrorCategory::Internal => log::error!("Internal error: {self}"),
        }

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": ApiError::from(self)
        }))
    }
}
