#![allow(dead_code)]

use affiliate_rewards::config::RewardsConfig;
use affiliate_rewards::entities::{
    DiscountType, UserRole, referral_batch_entity as batches, user_entity as users,
};
use affiliate_rewards::models::{BankDetails, CurrentUser};
use affiliate_rewards::services::{
    CouponService, LedgerService, ReferralBatchService, RewardsService, WithdrawalService,
};
use chrono::{Duration, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

/// 内存 SQLite；单连接，否则每个连接各自是一份独立的库。
/// 因此这里的并发用例实际按事务串行执行，条件更新落败的分支由各 service 内的单元测试覆盖。
pub async fn setup_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:".to_string());
    opts.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(opts)
        .await
        .expect("failed to open in-memory sqlite");
    Migrator::up(&db, None)
        .await
        .expect("failed to run migrations");
    db
}

pub struct TestServices {
    pub db: DatabaseConnection,
    pub ledger: LedgerService,
    pub coupons: CouponService,
    pub batches: ReferralBatchService,
    pub withdrawals: WithdrawalService,
    pub rewards: RewardsService,
}

pub async fn setup() -> TestServices {
    let db = setup_db().await;
    let config = RewardsConfig::default();

    let ledger = LedgerService::new(db.clone(), config.debit_max_attempts);
    let coupons = CouponService::new(db.clone());
    let batches = ReferralBatchService::new(db.clone(), coupons.clone(), config);
    let withdrawals = WithdrawalService::new(db.clone(), ledger.clone());
    let rewards = RewardsService::new(
        ledger.clone(),
        coupons.clone(),
        batches.clone(),
        withdrawals.clone(),
    );

    TestServices {
        db,
        ledger,
        coupons,
        batches,
        withdrawals,
        rewards,
    }
}

pub fn bank_details() -> BankDetails {
    BankDetails {
        account_number: "0123456789".to_string(),
        bank_name: "First Bank".to_string(),
        account_name: "Jane Doe".to_string(),
    }
}

pub async fn create_user(db: &DatabaseConnection, username: &str, role: UserRole) -> users::Model {
    let now = Utc::now();
    users::ActiveModel {
        username: Set(username.to_string()),
        role: Set(role),
        is_affiliate: Set(false),
        affiliate_balance: Set(0),
        referral_count: Set(0),
        bank_account_number: Set(None),
        bank_name: Set(None),
        bank_account_name: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to insert user")
}

/// 已加入联盟、已绑定收款账户并带有余额的用户
pub async fn create_affiliate(db: &DatabaseConnection, username: &str, balance: i64) -> users::Model {
    let now = Utc::now();
    let details = bank_details();
    users::ActiveModel {
        username: Set(username.to_string()),
        role: Set(UserRole::User),
        is_affiliate: Set(true),
        affiliate_balance: Set(balance),
        referral_count: Set(0),
        bank_account_number: Set(Some(details.account_number)),
        bank_name: Set(Some(details.bank_name)),
        bank_account_name: Set(Some(details.account_name)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to insert affiliate")
}

/// 当前时间处于窗口内的批次
pub async fn create_open_batch(db: &DatabaseConnection, max_winners: i32) -> batches::Model {
    create_batch_with_window(
        db,
        max_winners,
        Utc::now() - Duration::days(1),
        Utc::now() + Duration::days(1),
    )
    .await
}

pub async fn create_batch_with_window(
    db: &DatabaseConnection,
    max_winners: i32,
    start_date: chrono::DateTime<Utc>,
    end_date: chrono::DateTime<Utc>,
) -> batches::Model {
    let now = Utc::now();
    batches::ActiveModel {
        name: Set("Test campaign".to_string()),
        start_date: Set(start_date),
        end_date: Set(end_date),
        max_winners: Set(max_winners),
        current_winners: Set(0),
        is_active: Set(true),
        discount_type: Set(DiscountType::Percentage),
        discount_value: Set(10),
        max_discount: Set(None),
        coupon_valid_days: Set(30),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("failed to insert batch")
}

pub fn as_user(user: &users::Model) -> CurrentUser {
    CurrentUser::new(user.id, user.role)
}

pub fn admin() -> CurrentUser {
    CurrentUser::new(9000, UserRole::Admin)
}

pub fn worker() -> CurrentUser {
    CurrentUser::new(9001, UserRole::Worker)
}
