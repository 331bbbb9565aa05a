//! End-to-end reward flows against an in-memory database.

use rust_decimal::Decimal;
use std::str::FromStr;
use surrealdb::sql::Thing;

use crate::core::{Config, ServerState};
use crate::db::models::{
    CartSessionCreate, MilestoneCreate, MilestoneStatus, MilestoneUpdate, RewardHistory,
    RewardType, StoreCreate,
};
use crate::db::repository::{
    CartSessionRepository, MilestoneRepository, RepoError, StoreRepository,
};
use crate::rewards::RewardService;
use crate::utils::AppError;

struct TestContext {
    service: RewardService,
    milestones: MilestoneRepository,
    sessions: CartSessionRepository,
    store: Thing,
    store_id: String,
}

async fn setup() -> TestContext {
    setup_with_store(StoreCreate {
        name: "Test Store".to_string(),
        currency: None,
        delivery_fee: None,
    })
    .await
}

async fn setup_with_store(store_data: StoreCreate) -> TestContext {
    let config = Config::default();
    let state = ServerState::initialize_in_memory(&config).await;

    let stores = StoreRepository::new(state.get_db());
    let store = stores.create(store_data).await.unwrap();
    let store_thing = store.id.unwrap();

    TestContext {
        service: state.reward_service(),
        milestones: MilestoneRepository::new(state.get_db()),
        sessions: CartSessionRepository::new(state.get_db()),
        store_id: store_thing.to_string(),
        store: store_thing,
    }
}

fn value(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn payload(name: &str, threshold: &str, reward_type: RewardType, free_count: u32) -> MilestoneCreate {
    MilestoneCreate {
        name: name.to_string(),
        threshold_amount: value(threshold),
        reward_type,
        free_product_count: Some(free_count),
        discount_value: None,
        discount_type: None,
        priority: None,
        display_order: None,
        usage_limit: None,
        max_usage_per_customer: None,
    }
}

impl TestContext {
    /// Delivery at 2500, two products at 3000, four products at 5000
    async fn seed_catalog(&self) {
        for p in [
            payload("Free delivery", "2500", RewardType::FreeDelivery, 0),
            payload("Two freebies", "3000", RewardType::FreeProducts, 2),
            payload("Four freebies", "5000", RewardType::FreeProducts, 4),
        ] {
            self.milestones.create(self.store.clone(), p).await.unwrap();
        }
    }

    async fn open(&self, token: &str) {
        self.service
            .open_session(CartSessionCreate {
                store_id: self.store_id.clone(),
                cart_token: token.to_string(),
                customer_id: None,
                timer_expires_at: None,
            })
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn open_session_is_idempotent_per_token() {
    let ctx = setup().await;
    ctx.open("tok-1").await;

    let first = ctx.service.get_session("tok-1").await.unwrap();
    ctx.open("tok-1").await;
    let second = ctx.service.get_session("tok-1").await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.version, 0);
}

#[tokio::test]
async fn open_session_rejects_unknown_store() {
    let ctx = setup().await;
    let err = ctx
        .service
        .open_session(CartSessionCreate {
            store_id: "store:missing".to_string(),
            cart_token: "tok-x".to_string(),
            customer_id: None,
            timer_expires_at: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn value_update_on_unknown_session_is_not_found() {
    let ctx = setup().await;
    let err = ctx
        .service
        .apply_cart_value_update("no-such-token", value("100"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn first_crossing_unlocks_and_records_history() {
    let ctx = setup().await;
    ctx.seed_catalog().await;
    ctx.open("tok-1").await;

    let outcome = ctx
        .service
        .apply_cart_value_update("tok-1", value("2600"))
        .await
        .unwrap();

    assert!(outcome.has_new_milestones);
    assert_eq!(outcome.unlocked_milestones.len(), 1);
    assert_eq!(outcome.session.current_value, value("2600"));
    assert_eq!(outcome.session.version, 1);

    let rewards = ctx.service.list_session_rewards("tok-1").await.unwrap();
    assert_eq!(rewards.len(), 1);
    // No fee on the store record, so the configured default applies
    assert_eq!(rewards[0].reward_value, Config::default().default_delivery_fee);
    assert!(!rewards[0].is_redeemed);
}

#[tokio::test]
async fn threshold_is_inclusive_at_exact_value() {
    let ctx = setup().await;
    ctx.seed_catalog().await;
    ctx.open("tok-1").await;

    let below = ctx
        .service
        .apply_cart_value_update("tok-1", value("2999.99"))
        .await
        .unwrap();
    assert_eq!(below.unlocked_milestones.len(), 1);

    let exact = ctx
        .service
        .apply_cart_value_update("tok-1", value("3000"))
        .await
        .unwrap();
    assert_eq!(exact.unlocked_milestones.len(), 2);
    assert!(exact.has_new_milestones);
}

#[tokio::test]
async fn repeated_value_update_is_idempotent() {
    let ctx = setup().await;
    ctx.seed_catalog().await;
    ctx.open("tok-1").await;

    ctx.service
        .apply_cart_value_update("tok-1", value("3000"))
        .await
        .unwrap();
    let again = ctx
        .service
        .apply_cart_value_update("tok-1", value("3000"))
        .await
        .unwrap();

    assert!(!again.has_new_milestones);
    assert_eq!(again.unlocked_milestones.len(), 2);

    let rewards = ctx.service.list_session_rewards("tok-1").await.unwrap();
    assert_eq!(rewards.len(), 2);
}

#[tokio::test]
async fn value_drop_relocks_without_touching_history() {
    let ctx = setup().await;
    ctx.seed_catalog().await;
    ctx.open("tok-1").await;

    ctx.service
        .apply_cart_value_update("tok-1", value("3000"))
        .await
        .unwrap();
    let dropped = ctx
        .service
        .apply_cart_value_update("tok-1", value("100"))
        .await
        .unwrap();
    assert!(dropped.unlocked_milestones.is_empty());
    assert!(!dropped.has_new_milestones);

    // Regrowth reports the crossing again but history stays exactly-once
    let regrown = ctx
        .service
        .apply_cart_value_update("tok-1", value("3000"))
        .await
        .unwrap();
    assert!(regrown.has_new_milestones);
    assert_eq!(regrown.unlocked_milestones.len(), 2);

    let rewards = ctx.service.list_session_rewards("tok-1").await.unwrap();
    assert_eq!(rewards.len(), 2);
}

#[tokio::test]
async fn paused_milestone_is_skipped_by_evaluation() {
    let ctx = setup().await;
    ctx.seed_catalog().await;
    ctx.open("tok-1").await;

    ctx.service
        .apply_cart_value_update("tok-1", value("3500"))
        .await
        .unwrap();

    let catalog = ctx.milestones.find_active(&ctx.store).await.unwrap();
    let two_freebies = catalog.iter().find(|m| m.name == "Two freebies").unwrap();
    let id = two_freebies.id.clone().unwrap().to_string();
    ctx.milestones
        .set_status(&id, MilestoneStatus::Paused)
        .await
        .unwrap();

    let outcome = ctx
        .service
        .apply_cart_value_update("tok-1", value("3600"))
        .await
        .unwrap();
    assert_eq!(outcome.unlocked_milestones.len(), 1);
    assert_eq!(outcome.unlocked_milestones[0].name, "Free delivery");
}

#[tokio::test]
async fn soft_deleted_milestone_is_skipped_by_evaluation() {
    let ctx = setup().await;
    ctx.seed_catalog().await;
    ctx.open("tok-1").await;

    let catalog = ctx.milestones.find_active(&ctx.store).await.unwrap();
    let delivery = catalog.iter().find(|m| m.name == "Free delivery").unwrap();
    let id = delivery.id.clone().unwrap().to_string();
    ctx.milestones.soft_delete(&id).await.unwrap();

    let outcome = ctx
        .service
        .apply_cart_value_update("tok-1", value("2600"))
        .await
        .unwrap();
    assert!(outcome.unlocked_milestones.is_empty());
    assert!(ctx
        .service
        .list_session_rewards("tok-1")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn negative_value_is_rejected() {
    let ctx = setup().await;
    ctx.seed_catalog().await;
    ctx.open("tok-1").await;

    let err = ctx
        .service
        .apply_cart_value_update("tok-1", value("-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let session = ctx.service.get_session("tok-1").await.unwrap();
    assert_eq!(session.current_value, Decimal::ZERO);
    assert_eq!(session.version, 0);
}

#[tokio::test]
async fn free_product_selection_respects_allowance() {
    let ctx = setup().await;
    ctx.seed_catalog().await;
    ctx.open("tok-1").await;

    ctx.service
        .apply_cart_value_update("tok-1", value("3000"))
        .await
        .unwrap();

    let err = ctx
        .service
        .apply_free_product_selection(
            "tok-1",
            vec!["p1".into(), "p2".into(), "p3".into()],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Duplicates collapse before the allowance check
    let session = ctx
        .service
        .apply_free_product_selection("tok-1", vec!["p1".into(), "p2".into(), "p1".into()])
        .await
        .unwrap();
    assert_eq!(session.selected_free_products, vec!["p1", "p2"]);
}

#[tokio::test]
async fn higher_milestone_raises_the_allowance() {
    let ctx = setup().await;
    ctx.seed_catalog().await;
    ctx.open("tok-1").await;

    ctx.service
        .apply_cart_value_update("tok-1", value("5000"))
        .await
        .unwrap();

    let session = ctx
        .service
        .apply_free_product_selection(
            "tok-1",
            vec!["p1".into(), "p2".into(), "p3".into(), "p4".into()],
        )
        .await
        .unwrap();
    assert_eq!(session.selected_free_products.len(), 4);
}

#[tokio::test]
async fn selection_without_unlocked_milestone_rejects_products() {
    let ctx = setup().await;
    ctx.seed_catalog().await;
    ctx.open("tok-1").await;

    ctx.service
        .apply_cart_value_update("tok-1", value("2600"))
        .await
        .unwrap();

    // Free delivery is unlocked but grants no product picks
    let err = ctx
        .service
        .apply_free_product_selection("tok-1", vec!["p1".into()])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Clearing the selection is always allowed
    let session = ctx
        .service
        .apply_free_product_selection("tok-1", Vec::new())
        .await
        .unwrap();
    assert!(session.selected_free_products.is_empty());
}

#[tokio::test]
async fn stale_version_write_is_rejected_atomically() {
    let ctx = setup().await;
    ctx.seed_catalog().await;
    ctx.open("tok-1").await;

    ctx.service
        .apply_cart_value_update("tok-1", value("3000"))
        .await
        .unwrap();
    let before = ctx.service.get_session("tok-1").await.unwrap();
    assert_eq!(before.version, 1);

    // Write against the version a concurrent winner already consumed
    let row = RewardHistory {
        id: None,
        store: ctx.store.clone(),
        cart_session: before.id.clone().unwrap(),
        milestone: Thing::from(("milestone", "ghost")),
        reward_type: RewardType::FreeProducts,
        reward_value: Decimal::ZERO,
        is_redeemed: false,
        sequence: 0,
        created_at: 0,
    };
    let err = ctx
        .sessions
        .update_value("tok-1", 0, value("9999"), Vec::new(), vec![row])
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));

    // The whole transaction rolled back: session and history untouched
    let after = ctx.service.get_session("tok-1").await.unwrap();
    assert_eq!(after.current_value, value("3000"));
    assert_eq!(after.version, before.version);
    assert_eq!(after.unlocked_milestones.len(), 2);

    let rewards = ctx.service.list_session_rewards("tok-1").await.unwrap();
    assert_eq!(rewards.len(), 2);
    assert!(rewards.iter().all(|r| r.milestone.to_string() != "milestone:ghost"));
}

#[tokio::test]
async fn history_within_one_update_keeps_threshold_order() {
    let ctx = setup().await;
    ctx.seed_catalog().await;
    ctx.open("tok-1").await;

    // One update crossing 2500, 3000 and 5000 at once
    ctx.service
        .apply_cart_value_update("tok-1", value("5000"))
        .await
        .unwrap();

    let rewards = ctx.service.list_session_rewards("tok-1").await.unwrap();
    assert_eq!(rewards.len(), 3);
    assert_eq!(rewards[0].reward_type, RewardType::FreeDelivery);
    assert_eq!(rewards[1].reward_type, RewardType::FreeProducts);
    assert_eq!(rewards[2].reward_type, RewardType::FreeProducts);
    assert_eq!(
        rewards.iter().map(|r| r.sequence).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
}

#[tokio::test]
async fn update_keeps_discount_milestones_consistent() {
    let ctx = setup().await;
    let milestone = ctx
        .milestones
        .create(
            ctx.store.clone(),
            payload("Promo", "2000", RewardType::FreeProducts, 1),
        )
        .await
        .unwrap();
    let id = milestone.id.unwrap().to_string();

    // Switching to discount without a value is refused
    let err = ctx
        .milestones
        .update(
            &id,
            MilestoneUpdate {
                reward_type: Some(RewardType::Discount),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    // As is a negative discount value
    let err = ctx
        .milestones
        .update(
            &id,
            MilestoneUpdate {
                reward_type: Some(RewardType::Discount),
                discount_value: Some(value("-5")),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let updated = ctx
        .milestones
        .update(
            &id,
            MilestoneUpdate {
                reward_type: Some(RewardType::Discount),
                discount_value: Some(value("10")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.reward_type, RewardType::Discount);
    assert_eq!(updated.discount_value, Some(value("10")));
}

#[tokio::test]
async fn store_delivery_fee_overrides_the_default() {
    let ctx = setup_with_store(StoreCreate {
        name: "Fee Store".to_string(),
        currency: Some("USD".to_string()),
        delivery_fee: Some(value("7.50")),
    })
    .await;
    ctx.seed_catalog().await;
    ctx.open("tok-1").await;

    ctx.service
        .apply_cart_value_update("tok-1", value("2600"))
        .await
        .unwrap();

    let rewards = ctx.service.list_session_rewards("tok-1").await.unwrap();
    assert_eq!(rewards.len(), 1);
    assert_eq!(rewards[0].reward_value, value("7.50"));
}
