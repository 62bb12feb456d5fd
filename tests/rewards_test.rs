mod common;

use affiliate_rewards::entities::{DiscountType, UserRole, WithdrawalStatus};
use affiliate_rewards::error::AppError;
use affiliate_rewards::models::{CouponSpec, CreateReferralBatchRequest, WithdrawalDecision};
use chrono::{Duration, Utc};
use common::*;

#[tokio::test]
async fn test_accrual_requires_worker_and_counts_referral() {
    let s = setup().await;
    let referrer = create_affiliate(&s.db, "alice", 0).await;

    assert!(matches!(
        s.rewards
            .accrue_referral_reward(&as_user(&referrer), referrer.id, 500)
            .await,
        Err(AppError::Forbidden)
    ));

    let balance = s
        .rewards
        .accrue_referral_reward(&worker(), referrer.id, 500)
        .await
        .unwrap();
    assert_eq!(balance.balance, 500);

    let summary = s
        .rewards
        .affiliate_summary(&as_user(&referrer), referrer.id)
        .await
        .unwrap();
    assert_eq!(summary.referral_count, 1);
    assert_eq!(summary.balance, 500);
    assert!(summary.has_bank_details);

    assert!(matches!(
        s.rewards
            .accrue_referral_reward(&worker(), referrer.id, 0)
            .await,
        Err(AppError::InvalidAmount)
    ));
}

#[tokio::test]
async fn test_withdrawal_flow_with_admin_resolution() {
    let s = setup().await;
    let alice = create_affiliate(&s.db, "alice", 500).await;
    let caller = as_user(&alice);

    let withdrawal = s.rewards.request_withdrawal(&caller).await.unwrap();
    assert_eq!(withdrawal.amount, 500);
    assert_eq!(s.rewards.read_balance(&caller, alice.id).await.unwrap().balance, 0);
    assert!(matches!(
        s.rewards.request_withdrawal(&caller).await,
        Err(AppError::InsufficientBalance)
    ));

    let summary = s.rewards.affiliate_summary(&caller, alice.id).await.unwrap();
    assert_eq!(summary.pending_withdrawal_total, 500);

    // 只有管理员可以审核
    assert!(matches!(
        s.rewards
            .resolve_withdrawal(&caller, withdrawal.id, WithdrawalDecision::Approve, None)
            .await,
        Err(AppError::Forbidden)
    ));
    let rejected = s
        .rewards
        .resolve_withdrawal(
            &admin(),
            withdrawal.id,
            WithdrawalDecision::Reject,
            Some("account closed".into()),
        )
        .await
        .unwrap();
    assert_eq!(rejected.status, WithdrawalStatus::Rejected);
    assert_eq!(s.ledger.read_balance(alice.id).await.unwrap(), 0);

    // 驳回后的退款由管理员补发
    let credited = s
        .rewards
        .admin_credit(&admin(), alice.id, 500, Some("rejected withdrawal"))
        .await
        .unwrap();
    assert_eq!(credited.balance, 500);
    assert!(matches!(
        s.rewards.admin_credit(&caller, alice.id, 500, None).await,
        Err(AppError::Forbidden)
    ));
}

#[tokio::test]
async fn test_users_only_see_their_own_withdrawals() {
    let s = setup().await;
    let alice = create_affiliate(&s.db, "alice", 500).await;
    let bob = create_affiliate(&s.db, "bob", 0).await;
    let withdrawal = s.rewards.request_withdrawal(&as_user(&alice)).await.unwrap();

    assert!(matches!(
        s.rewards.get_withdrawal(&as_user(&bob), withdrawal.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        s.rewards.read_balance(&as_user(&bob), alice.id).await,
        Err(AppError::Forbidden)
    ));
    assert_eq!(
        s.rewards
            .get_withdrawal(&admin(), withdrawal.id)
            .await
            .unwrap()
            .user_id,
        alice.id
    );
}

#[tokio::test]
async fn test_enroll_via_orchestrator() {
    let s = setup().await;
    let carol = create_user(&s.db, "carol", UserRole::User).await;
    let caller = as_user(&carol);

    let summary = s.rewards.enroll_affiliate(&caller, None).await.unwrap();
    assert!(summary.is_affiliate);
    assert!(!summary.has_bank_details);

    let summary = s
        .rewards
        .update_bank_details(&caller, bank_details())
        .await
        .unwrap();
    assert!(summary.has_bank_details);
}

#[tokio::test]
async fn test_referral_coupon_issue_and_redeem() {
    let s = setup().await;
    let alice = create_user(&s.db, "alice", UserRole::User).await;
    let bob = create_user(&s.db, "bob", UserRole::User).await;

    let start = Utc::now() - Duration::minutes(5);
    let batch = s
        .rewards
        .create_batch(&admin(), CreateReferralBatchRequest {
            name: "Launch".to_string(),
            start_date: start,
            end_date: start + Duration::days(7),
            max_winners: 1,
            discount_type: Some(DiscountType::Fixed),
            discount_value: Some(500),
            max_discount: None,
            coupon_valid_days: Some(14),
        })
        .await
        .unwrap();
    assert!(s.rewards.can_issue(batch.id).await.unwrap());

    // 不能替他人领取
    assert!(matches!(
        s.rewards
            .issue_referral_coupon(&as_user(&bob), batch.id, alice.id)
            .await,
        Err(AppError::Forbidden)
    ));

    let coupon = s
        .rewards
        .issue_referral_coupon(&as_user(&alice), batch.id, alice.id)
        .await
        .unwrap();
    assert_eq!(coupon.value, 500);

    let closed = s
        .rewards
        .issue_referral_coupon(&worker(), batch.id, bob.id)
        .await
        .unwrap_err();
    assert!(matches!(closed, AppError::BatchClosed));
    assert_eq!(
        closed.public_message(),
        "This referral campaign is closed or has no rewards left"
    );

    // 他人不能核销
    assert!(matches!(
        s.rewards
            .redeem_coupon(&as_user(&bob), &coupon.code, "order-1")
            .await,
        Err(AppError::Forbidden)
    ));

    let redeemed = s
        .rewards
        .redeem_coupon(&as_user(&alice), &coupon.code.to_lowercase(), "order-1")
        .await
        .unwrap();
    assert!(redeemed.is_used);
    assert!(matches!(
        s.rewards
            .redeem_coupon(&worker(), &coupon.code, "order-2")
            .await,
        Err(AppError::AlreadyUsed)
    ));
}

#[tokio::test]
async fn test_coupon_admin_requires_admin() {
    let s = setup().await;
    let alice = create_user(&s.db, "alice", UserRole::User).await;
    let spec = CouponSpec::single_use("SPRING", DiscountType::Percentage, 20);

    assert!(matches!(
        s.rewards.create_coupon(&as_user(&alice), spec.clone()).await,
        Err(AppError::Forbidden)
    ));

    let mut with_batch = spec.clone();
    with_batch.batch_id = Some(1);
    assert!(matches!(
        s.rewards.create_coupon(&admin(), with_batch).await,
        Err(AppError::ValidationError(_))
    ));

    let coupon = s.rewards.create_coupon(&admin(), spec).await.unwrap();
    let paused = s
        .rewards
        .set_coupon_active(&admin(), coupon.id, false)
        .await
        .unwrap();
    assert!(!paused.is_active);
    assert!(matches!(
        s.rewards.delete_coupon(&as_user(&alice), coupon.id).await,
        Err(AppError::Forbidden)
    ));
    s.rewards.delete_coupon(&admin(), coupon.id).await.unwrap();
}

#[tokio::test]
async fn test_create_batch_requires_admin() {
    let s = setup().await;
    let start = Utc::now();
    let request = CreateReferralBatchRequest {
        name: "Sneaky".to_string(),
        start_date: start,
        end_date: start + Duration::days(1),
        max_winners: 1,
        discount_type: None,
        discount_value: None,
        max_discount: None,
        coupon_valid_days: None,
    };

    assert!(matches!(
        s.rewards.create_batch(&worker(), request).await,
        Err(AppError::Forbidden)
    ));
}
