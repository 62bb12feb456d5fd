use crate::entities::{
    DiscountType, UserRole, coupon_entity as coupons, referral_batch_entity as batches,
    user_entity as users,
};
use chrono::{Duration, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

pub async fn sqlite_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:".to_string());
    opts.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(opts).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn insert_user(db: &DatabaseConnection, balance: i64) -> users::Model {
    let now = Utc::now();
    users::ActiveModel {
        username: Set("alice".to_string()),
        role: Set(UserRole::User),
        is_affiliate: Set(true),
        affiliate_balance: Set(balance),
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
    .unwrap()
}

pub async fn insert_coupon(
    db: &DatabaseConnection,
    code: &str,
    usage_limit: Option<i32>,
) -> coupons::Model {
    let now = Utc::now();
    coupons::ActiveModel {
        code: Set(code.to_string()),
        discount_type: Set(DiscountType::Fixed),
        value: Set(500),
        max_amount: Set(None),
        expiration_date: Set(None),
        usage_limit: Set(usage_limit),
        used_count: Set(0),
        is_active: Set(true),
        user_id: Set(None),
        batch_id: Set(None),
        is_used: Set(false),
        used_at: Set(None),
        order_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub fn open_batch(max_winners: i32, current_winners: i32) -> batches::Model {
    let now = Utc::now();
    batches::Model {
        id: 1,
        name: "Spring referral".to_string(),
        start_date: now - Duration::days(1),
        end_date: now + Duration::days(1),
        max_winners,
        current_winners,
        is_active: true,
        discount_type: DiscountType::Percentage,
        discount_value: 10,
        max_discount: None,
        coupon_valid_days: 30,
        created_at: now,
        updated_at: now,
    }
}

pub async fn insert_batch(db: &DatabaseConnection, max_winners: i32) -> batches::Model {
    let template = open_batch(max_winners, 0);
    batches::ActiveModel {
        name: Set(template.name),
        start_date: Set(template.start_date),
        end_date: Set(template.end_date),
        max_winners: Set(template.max_winners),
        current_winners: Set(0),
        is_active: Set(true),
        discount_type: Set(template.discount_type),
        discount_value: Set(template.discount_value),
        max_discount: Set(None),
        coupon_valid_days: Set(template.coupon_valid_days),
        created_at: Set(template.created_at),
        updated_at: Set(template.updated_at),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub fn user_model(id: i64, balance: i64) -> users::Model {
    let now = Utc::now();
    users::Model {
        id,
        username: "alice".to_string(),
        role: UserRole::User,
        is_affiliate: true,
        affiliate_balance: balance,
        referral_count: 0,
        bank_account_number: Some("0123456789".to_string()),
        bank_name: Some("First Bank".to_string()),
        bank_account_name: Some("Jane Doe".to_string()),
        created_at: now,
        updated_at: now,
    }
}

pub fn coupon_model(usage_limit: Option<i32>, used_count: i32) -> coupons::Model {
    let now = Utc::now();
    coupons::Model {
        id: 1,
        code: "SAVE10".to_string(),
        discount_type: DiscountType::Fixed,
        value: 500,
        max_amount: None,
        expiration_date: None,
        usage_limit,
        used_count,
        is_active: true,
        user_id: None,
        batch_id: None,
        is_used: usage_limit.is_some_and(|limit| used_count >= limit),
        used_at: None,
        order_id: None,
        created_at: now,
        updated_at: now,
    }
}
