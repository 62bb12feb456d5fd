use serde::{Deserialize, Serialize};

use crate::entities::UserRole;
use crate::error::{AppError, AppResult};

/// 已认证的调用方，由认证中间件写入请求扩展
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn new(id: i64, role: UserRole) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_worker(&self) -> bool {
        self.role == UserRole::Worker
    }

    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// 后台服务账号或管理员
    pub fn require_worker(&self) -> AppResult<()> {
        if self.is_worker() || self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// 本人或管理员
    pub fn require_self_or_admin(&self, user_id: i64) -> AppResult<()> {
        if self.id == user_id || self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// 本人、管理员或后台服务账号
    pub fn require_self_or_staff(&self, user_id: i64) -> AppResult<()> {
        if self.id == user_id || self.is_admin() || self.is_worker() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}
