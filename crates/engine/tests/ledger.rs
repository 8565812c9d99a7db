use chrono::{Duration, TimeZone, Utc};
use sea_orm::Database;

use engine::{
    Engine, EngineError, MoneyCents, NewExpense, Percent, SettlementTransaction, SplitKind,
    SplitStrategy,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

struct Trip {
    group: Uuid,
    alice: Uuid,
    bob: Uuid,
    carol: Uuid,
}

async fn trip(engine: &Engine) -> Trip {
    let group = engine.new_group("Trip").await.unwrap();
    let alice = engine.add_member(group, "Alice").await.unwrap();
    let bob = engine.add_member(group, "Bob").await.unwrap();
    let carol = engine.add_member(group, "Carol").await.unwrap();
    Trip {
        group,
        alice,
        bob,
        carol,
    }
}

fn cents(value: i64) -> MoneyCents {
    MoneyCents::new(value)
}

fn expense(payer: Uuid, amount: i64, participants: &[Uuid]) -> NewExpense {
    NewExpense {
        payer_id: payer,
        amount: cents(amount),
        description: "Dinner".to_string(),
        strategy: SplitStrategy::Equal,
        participants: participants.to_vec(),
        occurred_at: Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap(),
        recorded_as: None,
    }
}

fn tx(from: Uuid, to: Uuid, amount: i64) -> SettlementTransaction {
    SettlementTransaction {
        from,
        to,
        amount: cents(amount),
    }
}

#[tokio::test]
async fn group_names_are_unique_case_insensitively() {
    let engine = engine_with_db().await;
    let id = engine.new_group("Trip").await.unwrap();

    let err = engine.new_group("  trip ").await.unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("trip".to_string()));

    let found = engine.group_by_name("TRIP").await.unwrap();
    assert_eq!(found.id, id);
    assert_eq!(found.name, "Trip");

    let err = engine.new_group("   ").await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn members_keep_insertion_order() {
    let engine = engine_with_db().await;
    let t = trip(&engine).await;

    let members = engine.members(t.group).await.unwrap();
    let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Bob", "Carol"]);
    assert_eq!(
        members.iter().map(|m| m.position).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );

    let err = engine.add_member(t.group, "alice").await.unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("alice".to_string()));

    assert_eq!(engine.member_by_name(t.group, "bob").await.unwrap().id, t.bob);
}

#[tokio::test]
async fn member_lookup_is_scoped_to_group() {
    let engine = engine_with_db().await;
    let t = trip(&engine).await;
    let other = engine.new_group("Flat").await.unwrap();

    let bob = engine.member(t.group, t.bob).await.unwrap();
    assert_eq!(bob.name, "Bob");
    assert_eq!(bob.position, 1);

    let err = engine.member(other, t.bob).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("member not exists".to_string()));
    let err = engine.member(t.group, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn equal_expense_balances_and_plan() {
    let engine = engine_with_db().await;
    let t = trip(&engine).await;

    let expense_id = engine
        .add_expense(t.group, expense(t.alice, 900, &[t.alice, t.bob, t.carol]))
        .await
        .unwrap();

    let stored = engine.expense(t.group, expense_id).await.unwrap();
    assert_eq!(stored.strategy, SplitKind::Equal);
    assert_eq!(stored.splits.len(), 3);
    assert_eq!(stored.split_total(), Some(cents(900)));

    let balances = engine.group_balances(t.group).await.unwrap();
    assert_eq!(
        balances.nets(),
        vec![(t.alice, cents(600)), (t.bob, cents(-300)), (t.carol, cents(-300))]
    );
    assert_eq!(balances.total_net(), MoneyCents::ZERO);
    assert_eq!(balances.get(&t.alice).unwrap().paid, cents(900));
    assert_eq!(balances.get(&t.alice).unwrap().owed, cents(300));

    let plan = engine.settlement_plan(t.group).await.unwrap();
    assert_eq!(plan, vec![tx(t.bob, t.alice, 300), tx(t.carol, t.alice, 300)]);
}

#[tokio::test]
async fn uneven_split_keeps_the_sum() {
    let engine = engine_with_db().await;
    let t = trip(&engine).await;

    let mut input = expense(t.bob, 999, &[t.alice, t.bob, t.carol]);
    input.strategy = SplitStrategy::Percentage(vec![
        Percent::new(3333),
        Percent::new(3333),
        Percent::new(3334),
    ]);
    let id = engine.add_expense(t.group, input).await.unwrap();

    let stored = engine.expense(t.group, id).await.unwrap();
    assert_eq!(stored.strategy, SplitKind::Percentage);
    assert_eq!(stored.split_total(), Some(cents(999)));
    let members: Vec<Uuid> = stored.splits.iter().map(|s| s.member_id).collect();
    assert_eq!(members, vec![t.alice, t.bob, t.carol]);
}

#[tokio::test]
async fn payments_move_balances() {
    let engine = engine_with_db().await;
    let t = trip(&engine).await;
    engine
        .add_expense(t.group, expense(t.alice, 900, &[t.alice, t.bob, t.carol]))
        .await
        .unwrap();

    engine
        .record_payment(t.group, t.bob, t.alice, cents(100), Utc::now(), Some(" cash "))
        .await
        .unwrap();

    let payments = engine.payments(t.group).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].note.as_deref(), Some("cash"));

    let balances = engine.group_balances(t.group).await.unwrap();
    assert_eq!(balances.net(&t.alice), cents(500));
    assert_eq!(balances.net(&t.bob), cents(-200));
    assert_eq!(balances.get(&t.bob).unwrap().repaid, cents(100));
    assert_eq!(balances.get(&t.alice).unwrap().received, cents(100));

    let err = engine
        .record_payment(t.group, t.bob, t.bob, cents(100), Utc::now(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn settle_group_records_payments_and_zeroes_balances() {
    let engine = engine_with_db().await;
    let t = trip(&engine).await;
    engine
        .add_expense(t.group, expense(t.alice, 900, &[t.alice, t.bob, t.carol]))
        .await
        .unwrap();
    engine
        .add_expense(t.group, expense(t.carol, 400, &[t.alice, t.bob]))
        .await
        .unwrap();

    let plan = engine.settle_group(t.group, Utc::now()).await.unwrap();
    assert!(!plan.is_empty());
    assert!(plan.len() <= 2);

    let payments = engine.payments(t.group).await.unwrap();
    assert_eq!(payments.len(), plan.len());
    assert!(payments.iter().all(|p| p.note.as_deref() == Some("settle up")));

    let balances = engine.group_balances(t.group).await.unwrap();
    assert!(balances.iter().all(|b| b.net().is_zero()));
    assert!(engine.settlement_plan(t.group).await.unwrap().is_empty());
    assert!(engine.settle_group(t.group, Utc::now()).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_and_delete_expense() {
    let engine = engine_with_db().await;
    let t = trip(&engine).await;
    let id = engine
        .add_expense(t.group, expense(t.alice, 900, &[t.alice, t.bob, t.carol]))
        .await
        .unwrap();

    let mut input = expense(t.bob, 600, &[t.alice, t.bob]);
    input.description = "Lunch".to_string();
    input.strategy = SplitStrategy::Exact(vec![cents(100), cents(500)]);
    engine.update_expense(t.group, id, input).await.unwrap();

    let stored = engine.expense(t.group, id).await.unwrap();
    assert_eq!(stored.id, id);
    assert_eq!(stored.description, "Lunch");
    assert_eq!(stored.payer_id, t.bob);
    assert_eq!(stored.strategy, SplitKind::Exact);
    assert_eq!(
        stored
            .splits
            .iter()
            .map(|s| (s.member_id, s.amount))
            .collect::<Vec<_>>(),
        vec![(t.alice, cents(100)), (t.bob, cents(500))]
    );

    let balances = engine.group_balances(t.group).await.unwrap();
    assert_eq!(balances.net(&t.alice), cents(-100));
    assert_eq!(balances.net(&t.bob), cents(100));
    assert_eq!(balances.net(&t.carol), MoneyCents::ZERO);

    assert_eq!(engine.delete_expense(t.group, id).await.unwrap(), 2);
    assert!(engine.expenses(t.group).await.unwrap().is_empty());
    let err = engine.expense(t.group, id).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("expense not exists".to_string()));
}

#[tokio::test]
async fn invalid_expenses_are_rejected_before_writing() {
    let engine = engine_with_db().await;
    let t = trip(&engine).await;

    let err = engine
        .add_expense(t.group, expense(t.alice, 0, &[t.alice]))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = engine
        .add_expense(t.group, expense(t.alice, 100, &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let mut input = expense(t.alice, 1000, &[t.alice, t.bob]);
    input.strategy = SplitStrategy::Exact(vec![cents(400), cents(500)]);
    let err = engine.add_expense(t.group, input).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let other = engine.new_group("Flat").await.unwrap();
    let stranger = engine.add_member(other, "Dave").await.unwrap();
    let err = engine
        .add_expense(t.group, expense(t.alice, 100, &[t.alice, stranger]))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("member not exists".to_string()));

    assert!(engine.expenses(t.group).await.unwrap().is_empty());
}

#[tokio::test]
async fn expenses_are_listed_by_date() {
    let engine = engine_with_db().await;
    let t = trip(&engine).await;

    let mut later = expense(t.alice, 300, &[t.alice, t.bob]);
    later.description = "Later".to_string();
    let mut earlier = expense(t.bob, 300, &[t.alice, t.bob]);
    earlier.description = "Earlier".to_string();
    earlier.occurred_at = later.occurred_at - Duration::days(3);

    engine.add_expense(t.group, later).await.unwrap();
    engine.add_expense(t.group, earlier).await.unwrap();

    let listed: Vec<String> = engine
        .expenses(t.group)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.description)
        .collect();
    assert_eq!(listed, vec!["Earlier", "Later"]);
}

#[tokio::test]
async fn member_in_use_needs_reassignment() {
    let engine = engine_with_db().await;
    let t = trip(&engine).await;
    let dave = engine.add_member(t.group, "Dave").await.unwrap();
    engine
        .add_expense(t.group, expense(t.alice, 900, &[t.alice, t.bob, t.carol]))
        .await
        .unwrap();
    engine
        .record_payment(t.group, t.bob, t.alice, cents(50), Utc::now(), None)
        .await
        .unwrap();
    engine
        .record_payment(t.group, t.bob, t.carol, cents(20), Utc::now(), None)
        .await
        .unwrap();

    // No history, removed right away.
    engine.delete_member(t.group, dave, None).await.unwrap();

    let err = engine.delete_member(t.group, t.bob, None).await.unwrap_err();
    assert!(matches!(err, EngineError::MemberInUse(_)));

    let err = engine
        .delete_member(t.group, t.bob, Some(t.bob))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    engine
        .delete_member(t.group, t.bob, Some(t.carol))
        .await
        .unwrap();

    let members = engine.members(t.group).await.unwrap();
    assert_eq!(
        members.iter().map(|m| m.id).collect::<Vec<_>>(),
        vec![t.alice, t.carol]
    );

    // The bob -> carol payment became a self-payment and is gone.
    let payments = engine.payments(t.group).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!((payments[0].from_id, payments[0].to_id), (t.carol, t.alice));

    let balances = engine.group_balances(t.group).await.unwrap();
    assert_eq!(balances.len(), 2);
    assert_eq!(balances.net(&t.alice), cents(550));
    assert_eq!(balances.net(&t.carol), cents(-550));
}

#[tokio::test]
async fn delete_group_removes_everything() {
    let engine = engine_with_db().await;
    let t = trip(&engine).await;
    engine
        .add_expense(t.group, expense(t.alice, 900, &[t.alice, t.bob, t.carol]))
        .await
        .unwrap();
    engine
        .record_payment(t.group, t.bob, t.alice, cents(300), Utc::now(), None)
        .await
        .unwrap();

    engine.delete_group(t.group).await.unwrap();

    assert!(engine.groups().await.unwrap().is_empty());
    let err = engine.group(t.group).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("group not exists".to_string()));
    let err = engine.members(t.group).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("group not exists".to_string()));

    // The name is free again.
    engine.new_group("Trip").await.unwrap();
}
