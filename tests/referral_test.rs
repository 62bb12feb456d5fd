mod common;

use affiliate_rewards::entities::{DiscountType, UserRole};
use affiliate_rewards::error::AppError;
use affiliate_rewards::models::{CouponSpec, CreateReferralBatchRequest, ReferralBatchQuery};
use chrono::{Duration, Utc};
use common::*;
use futures_util::future::join_all;

#[tokio::test]
async fn test_single_slot_goes_to_one_of_two_users() {
    let s = setup().await;
    let batch = create_open_batch(&s.db, 1).await;
    let alice = create_user(&s.db, "alice", UserRole::User).await;
    let bob = create_user(&s.db, "bob", UserRole::User).await;

    let (first, second) = tokio::join!(
        s.batches.issue_for_batch(batch.id, alice.id),
        s.batches.issue_for_batch(batch.id, bob.id),
    );

    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(AppError::BatchClosed)))
    );

    let batch = s.batches.get_batch(batch.id).await.unwrap();
    assert_eq!(batch.current_winners, 1);
    assert!(!s.batches.can_issue(batch.id).await.unwrap());
}

#[tokio::test]
async fn test_capacity_is_never_exceeded() {
    let s = setup().await;
    let batch = create_open_batch(&s.db, 3).await;
    let mut users = Vec::new();
    for i in 0..7 {
        users.push(create_user(&s.db, &format!("user{i}"), UserRole::User).await);
    }

    let results = join_all(
        users
            .iter()
            .map(|u| s.batches.issue_for_batch(batch.id, u.id)),
    )
    .await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 3);
    assert!(
        results
            .iter()
            .filter(|r| r.is_err())
            .all(|r| matches!(r, Err(AppError::BatchClosed)))
    );
    assert_eq!(s.batches.get_batch(batch.id).await.unwrap().current_winners, 3);
}

#[tokio::test]
async fn test_issued_coupon_follows_batch_template() {
    let s = setup().await;
    let batch = create_open_batch(&s.db, 10).await;
    let alice = create_user(&s.db, "alice", UserRole::User).await;

    let coupon = s.batches.issue_for_batch(batch.id, alice.id).await.unwrap();
    assert!(coupon.code.starts_with("REF-"));
    assert_eq!(coupon.user_id, Some(alice.id));
    assert_eq!(coupon.batch_id, Some(batch.id));
    assert_eq!(coupon.usage_limit, Some(1));
    assert_eq!(coupon.discount_type, DiscountType::Percentage);
    assert_eq!(coupon.value, 10);
    let expires = coupon.expiration_date.unwrap();
    assert!(expires > Utc::now() + Duration::days(29));

    assert!(matches!(
        s.batches.issue_for_batch(batch.id, alice.id).await,
        Err(AppError::AlreadyClaimed)
    ));
    assert_eq!(s.batches.get_batch(batch.id).await.unwrap().current_winners, 1);
}

#[tokio::test]
async fn test_second_coupon_for_same_batch_and_user_is_already_claimed() {
    let s = setup().await;
    let batch = create_open_batch(&s.db, 10).await;
    let alice = create_user(&s.db, "alice", UserRole::User).await;
    s.batches.issue_for_batch(batch.id, alice.id).await.unwrap();

    // 并发领取中落败的一方会走到这次插入：前置检查已通过，由唯一索引拦下
    let mut spec = CouponSpec::single_use("OTHERCODE", DiscountType::Percentage, 10);
    spec.user_id = Some(alice.id);
    spec.batch_id = Some(batch.id);
    assert!(matches!(
        s.coupons.issue(spec).await,
        Err(AppError::AlreadyClaimed)
    ));

    // 与批次无关的券码冲突仍然是 DuplicateCode
    let taken = CouponSpec::single_use("OTHERCODE", DiscountType::Fixed, 100);
    s.coupons.issue(taken.clone()).await.unwrap();
    assert!(matches!(
        s.coupons.issue(taken).await,
        Err(AppError::DuplicateCode(_))
    ));
}

#[tokio::test]
async fn test_closed_window_and_inactive_batch() {
    let s = setup().await;
    let alice = create_user(&s.db, "alice", UserRole::User).await;

    let ended = create_batch_with_window(
        &s.db,
        5,
        Utc::now() - Duration::days(10),
        Utc::now() - Duration::days(1),
    )
    .await;
    assert!(matches!(
        s.batches.issue_for_batch(ended.id, alice.id).await,
        Err(AppError::BatchClosed)
    ));

    let upcoming = create_batch_with_window(
        &s.db,
        5,
        Utc::now() + Duration::days(1),
        Utc::now() + Duration::days(10),
    )
    .await;
    assert!(!s.batches.can_issue(upcoming.id).await.unwrap());

    let open = create_open_batch(&s.db, 5).await;
    s.batches.set_active(open.id, false).await.unwrap();
    assert!(matches!(
        s.batches.issue_for_batch(open.id, alice.id).await,
        Err(AppError::BatchClosed)
    ));
    assert_eq!(s.batches.get_batch(open.id).await.unwrap().current_winners, 0);
}

#[tokio::test]
async fn test_missing_batch_and_user() {
    let s = setup().await;
    let alice = create_user(&s.db, "alice", UserRole::User).await;
    let batch = create_open_batch(&s.db, 5).await;

    assert!(matches!(
        s.batches.issue_for_batch(404, alice.id).await,
        Err(AppError::BatchNotFound)
    ));
    assert!(matches!(s.batches.can_issue(404).await, Err(AppError::BatchNotFound)));
    assert!(matches!(
        s.batches.issue_for_batch(batch.id, 404).await,
        Err(AppError::NotFound(_))
    ));
    assert_eq!(s.batches.get_batch(batch.id).await.unwrap().current_winners, 0);
}

#[tokio::test]
async fn test_create_batch_validation_and_defaults() {
    let s = setup().await;
    let start = Utc::now();
    let request = CreateReferralBatchRequest {
        name: "Autumn".to_string(),
        start_date: start,
        end_date: start + Duration::days(30),
        max_winners: 50,
        discount_type: None,
        discount_value: None,
        max_discount: Some(2_000),
        coupon_valid_days: None,
    };

    let batch = s.batches.create_batch(request.clone()).await.unwrap();
    assert_eq!(batch.current_winners, 0);
    assert!(batch.is_active);
    assert_eq!(batch.discount_type, DiscountType::Percentage);
    assert_eq!(batch.discount_value, 10);
    assert_eq!(batch.max_discount, Some(2_000));
    assert_eq!(batch.coupon_valid_days, 30);

    let backwards = CreateReferralBatchRequest {
        end_date: start - Duration::days(1),
        ..request.clone()
    };
    assert!(matches!(
        s.batches.create_batch(backwards).await,
        Err(AppError::ValidationError(_))
    ));

    let no_slots = CreateReferralBatchRequest {
        max_winners: 0,
        ..request.clone()
    };
    assert!(matches!(
        s.batches.create_batch(no_slots).await,
        Err(AppError::ValidationError(_))
    ));

    let too_generous = CreateReferralBatchRequest {
        discount_value: Some(120),
        ..request
    };
    assert!(matches!(
        s.batches.create_batch(too_generous).await,
        Err(AppError::InvalidValue(_))
    ));

    let page = s
        .batches
        .list_batches(&ReferralBatchQuery {
            page: None,
            per_page: None,
            active_only: Some(true),
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.data[0].remaining_slots, 50);
}
