use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    AllocationStatus, Engine, EngineError, ExpenseCmd, ExpenseDetail, Profile, SettleCmd,
    SettlementReceipt,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn exec(db: &DatabaseConnection, sql: &str) {
    db.execute(Statement::from_string(db.get_database_backend(), sql))
        .await
        .unwrap();
}

fn amount(units: i64) -> Decimal {
    Decimal::new(units, 0)
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()
}

/// `paid_by` pays `total`, shared as `shares`.
async fn expense(
    engine: &Engine,
    group: Uuid,
    paid_by: &str,
    shares: &[(&str, i64)],
) -> ExpenseDetail {
    let total = shares.iter().map(|(_, units)| units).sum();
    let cmd = shares.iter().fold(
        ExpenseCmd::new(group, paid_by, amount(total), day()),
        |cmd, (user, units)| cmd.share(*user, amount(*units)),
    );
    engine.create_expense(cmd).await.unwrap()
}

fn split_of(detail: &ExpenseDetail, user: &str) -> Uuid {
    detail
        .splits
        .iter()
        .find(|s| s.user_id == user)
        .map(|s| s.id)
        .unwrap()
}

#[tokio::test]
async fn shared_dinner_then_settle_up() {
    let (engine, _db) = engine_with_db().await;
    let group = Uuid::new_v4();
    engine
        .upsert_profile(Profile::new("alice").full_name("Alice"))
        .await
        .unwrap();
    engine
        .upsert_profile(Profile::new("bob").email("bob@example.com"))
        .await
        .unwrap();

    let dinner = expense(&engine, group, "alice", &[("alice", 50), ("bob", 50)]).await;

    let alice = engine.balances("alice").await.unwrap();
    assert_eq!(alice.balances.len(), 1);
    assert_eq!(alice.balances[0].counterparty_user_id, "bob");
    assert_eq!(alice.balances[0].counterparty_name, "bob@example.com");
    assert_eq!(alice.balances[0].amount, amount(50));
    assert_eq!(alice.total_owed, amount(50));
    assert_eq!(alice.total_owe, Decimal::ZERO);

    let bob = engine.balances("bob").await.unwrap();
    assert_eq!(bob.with("alice").unwrap().amount, amount(-50));
    assert_eq!(bob.with("alice").unwrap().counterparty_name, "Alice");
    assert_eq!(bob.total_owe, amount(50));

    let receipt = engine
        .record_settlement(SettleCmd::new(group, "bob", "alice", amount(50)))
        .await
        .unwrap();
    assert_eq!(receipt.marked_split_ids(), vec![split_of(&dinner, "bob")]);
    assert_eq!(receipt.settlement.allocated, amount(50));

    let json = serde_json::to_value(&receipt).unwrap();
    assert_eq!(json["allocation"]["status"], "applied");
    assert_eq!(
        json["allocation"]["splits"][0][0],
        split_of(&dinner, "bob").to_string()
    );
    assert_eq!(json["settlement"]["paid_by"], "bob");
    let parsed: SettlementReceipt = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, receipt);

    assert!(receipt.balances.unwrap().balances.is_empty());

    assert!(engine.balances("alice").await.unwrap().balances.is_empty());
    assert!(engine.balances("bob").await.unwrap().balances.is_empty());

    let stored = engine.expense(dinner.expense.id).await.unwrap();
    assert!(stored.splits.iter().all(|s| s.is_settled));
}

#[tokio::test]
async fn smallest_splits_are_settled_first() {
    let (engine, _db) = engine_with_db().await;
    let group = Uuid::new_v4();
    let thirty = expense(&engine, group, "alice", &[("bob", 30)]).await;
    let ten = expense(&engine, group, "alice", &[("bob", 10)]).await;
    let fifty = expense(&engine, group, "alice", &[("bob", 50)]).await;

    let receipt = engine
        .record_settlement(SettleCmd::new(group, "bob", "alice", amount(45)))
        .await
        .unwrap();

    let AllocationStatus::Applied(allocation) = &receipt.allocation else {
        panic!("allocation failed: {:?}", receipt.allocation);
    };
    assert_eq!(
        allocation.splits,
        vec![
            (split_of(&ten, "bob"), amount(10)),
            (split_of(&thirty, "bob"), amount(30)),
        ]
    );
    assert_eq!(allocation.allocated, amount(40));
    let pending = engine.expense(fifty.expense.id).await.unwrap();
    assert!(!pending.splits[0].is_settled);

    // 90 owed, 45 paid: 40 cleared splits, 5 counts as credit.
    let bob = engine.balances("bob").await.unwrap();
    assert_eq!(bob.with("alice").unwrap().amount, amount(-45));
    let alice = engine.balances("alice").await.unwrap();
    assert_eq!(alice.with("bob").unwrap().amount, amount(45));
}

#[tokio::test]
async fn allocation_stays_in_group_and_direction() {
    let (engine, _db) = engine_with_db().await;
    let group = Uuid::new_v4();
    let other_group = Uuid::new_v4();
    let here = expense(&engine, group, "alice", &[("bob", 20)]).await;
    let elsewhere = expense(&engine, other_group, "alice", &[("bob", 5)]).await;
    let reverse = expense(&engine, group, "bob", &[("alice", 5)]).await;

    let receipt = engine
        .record_settlement(SettleCmd::new(group, "bob", "alice", amount(30)))
        .await
        .unwrap();
    assert_eq!(receipt.marked_split_ids(), vec![split_of(&here, "bob")]);

    for detail in [elsewhere, reverse] {
        let stored = engine.expense(detail.expense.id).await.unwrap();
        assert!(stored.splits.iter().all(|s| !s.is_settled));
    }
}

#[tokio::test]
async fn payment_below_every_split_is_plain_credit() {
    let (engine, _db) = engine_with_db().await;
    let group = Uuid::new_v4();
    expense(&engine, group, "alice", &[("bob", 30)]).await;

    let receipt = engine
        .record_settlement(SettleCmd::new(group, "bob", "alice", amount(5)))
        .await
        .unwrap();
    assert!(receipt.marked_split_ids().is_empty());
    assert_eq!(receipt.settlement.allocated, Decimal::ZERO);

    let bob = receipt.balances.unwrap();
    assert_eq!(bob.with("alice").unwrap().amount, amount(-25));
}

#[tokio::test]
async fn repeated_settlements_each_clear_a_split() {
    let (engine, _db) = engine_with_db().await;
    let group = Uuid::new_v4();
    let first = expense(&engine, group, "alice", &[("bob", 10)]).await;
    let second = expense(&engine, group, "alice", &[("bob", 10)]).await;

    let one = engine
        .record_settlement(SettleCmd::new(group, "bob", "alice", amount(10)))
        .await
        .unwrap();
    let two = engine
        .record_settlement(SettleCmd::new(group, "bob", "alice", amount(10)))
        .await
        .unwrap();

    let mut marked = one.marked_split_ids();
    marked.extend(two.marked_split_ids());
    marked.sort();
    let mut expected = vec![split_of(&first, "bob"), split_of(&second, "bob")];
    expected.sort();
    assert_eq!(marked, expected);
    assert!(engine.balances("bob").await.unwrap().balances.is_empty());
}

#[tokio::test]
async fn invalid_settlements_write_nothing() {
    let (engine, _db) = engine_with_db().await;
    let group = Uuid::new_v4();

    let err = engine
        .record_settlement(SettleCmd::new(group, "bob", "bob", amount(10)))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation("payer and payee must differ".to_string())
    );

    let err = engine
        .record_settlement(SettleCmd::new(group, "bob", "alice", amount(-1)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
    assert!(!err.is_retryable());

    assert!(
        engine
            .list_group_settlements(group)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn deleting_expense_releases_its_allocation() {
    let (engine, _db) = engine_with_db().await;
    let group = Uuid::new_v4();
    let taxi = expense(&engine, group, "alice", &[("bob", 30)]).await;
    engine
        .record_settlement(SettleCmd::new(group, "bob", "alice", amount(30)))
        .await
        .unwrap();
    assert!(engine.balances("alice").await.unwrap().balances.is_empty());

    engine.delete_expense(taxi.expense.id).await.unwrap();

    // With the expense gone, the whole payment is an overpayment.
    let alice = engine.balances("alice").await.unwrap();
    assert_eq!(alice.with("bob").unwrap().amount, amount(-30));
    let history = engine.list_group_settlements(group).await.unwrap();
    assert_eq!(history[0].allocated, Decimal::ZERO);

    assert!(matches!(
        engine.delete_expense(taxi.expense.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn unsettling_a_split_keeps_balances_consistent() {
    let (engine, _db) = engine_with_db().await;
    let group = Uuid::new_v4();
    let taxi = expense(&engine, group, "alice", &[("bob", 30)]).await;
    engine
        .record_settlement(SettleCmd::new(group, "bob", "alice", amount(30)))
        .await
        .unwrap();

    let split = engine
        .set_split_settled(split_of(&taxi, "bob"), false)
        .await
        .unwrap();
    assert!(!split.is_settled);

    // The split counts again and so does the payment that covered it.
    assert!(engine.balances("bob").await.unwrap().balances.is_empty());

    engine
        .set_split_settled(split_of(&taxi, "bob"), true)
        .await
        .unwrap();
    // Marked by hand, the payment is left as credit for bob.
    let bob = engine.balances("bob").await.unwrap();
    assert_eq!(bob.with("alice").unwrap().amount, amount(30));

    assert!(matches!(
        engine.set_split_settled(Uuid::new_v4(), true).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn group_history_is_newest_first() {
    let (engine, _db) = engine_with_db().await;
    let group = Uuid::new_v4();
    expense(&engine, group, "alice", &[("bob", 10)]).await;

    let older = engine
        .record_settlement(
            SettleCmd::new(group, "bob", "alice", amount(10))
                .settled_at(Utc.with_ymd_and_hms(2026, 10, 2, 9, 0, 0).unwrap()),
        )
        .await
        .unwrap();
    let newer = engine
        .record_settlement(
            SettleCmd::new(group, "carol", "alice", amount(7))
                .notes("  coffee  ")
                .settled_at(Utc.with_ymd_and_hms(2026, 10, 3, 9, 0, 0).unwrap()),
        )
        .await
        .unwrap();

    let history = engine.list_group_settlements(group).await.unwrap();
    let ids: Vec<Uuid> = history.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![newer.settlement.id, older.settlement.id]);
    assert_eq!(history[0].notes.as_deref(), Some("coffee"));
    assert_eq!(history[1].allocated, amount(10));
    assert!(
        engine
            .list_group_settlements(Uuid::new_v4())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn expenses_are_validated_and_split_equally() {
    let (engine, _db) = engine_with_db().await;
    let group = Uuid::new_v4();

    let err = engine
        .create_expense(
            ExpenseCmd::new(group, "alice", amount(100), day()).share("bob", amount(40)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let members = ["alice", "bob", "carol"].map(String::from);
    let cmd = ExpenseCmd::new(group, "alice", amount(100), day())
        .split_equally(&members)
        .unwrap();
    let detail = engine.create_expense(cmd).await.unwrap();
    let total: Decimal = detail.splits.iter().map(|s| s.amount).sum();
    assert_eq!(total, amount(100));

    let alice = engine.balances("alice").await.unwrap();
    assert_eq!(alice.total_owed, Decimal::new(6666, 2));
    assert_eq!(alice.net(), Decimal::new(6666, 2));
}

#[tokio::test]
async fn upsert_replaces_profile() {
    let (engine, _db) = engine_with_db().await;
    engine
        .upsert_profile(Profile::new("bob").full_name("Bob"))
        .await
        .unwrap();
    engine
        .upsert_profile(Profile::new("bob").full_name("Robert"))
        .await
        .unwrap();
    assert_eq!(
        engine.profile("bob").await.unwrap().display_name(),
        "Robert"
    );
    assert!(matches!(
        engine.upsert_profile(Profile::new("  ")).await,
        Err(EngineError::Validation(_))
    ));
}

#[tokio::test]
async fn failed_insert_touches_no_split() {
    let (engine, db) = engine_with_db().await;
    let group = Uuid::new_v4();
    let dinner = expense(&engine, group, "alice", &[("bob", 50)]).await;

    exec(&db, "DROP TABLE settlements").await;

    let err = engine
        .record_settlement(SettleCmd::new(group, "bob", "alice", amount(50)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StoreWrite(_)));
    assert!(err.is_retryable());

    let stored = engine.expense(dinner.expense.id).await.unwrap();
    assert!(!stored.splits[0].is_settled);
}

#[tokio::test]
async fn failed_allocation_keeps_the_settlement() {
    let (engine, db) = engine_with_db().await;
    let group = Uuid::new_v4();
    let dinner = expense(&engine, group, "alice", &[("bob", 50)]).await;

    exec(
        &db,
        "CREATE TRIGGER allocations_offline BEFORE INSERT ON settlement_allocations \
         BEGIN SELECT RAISE(ABORT, 'allocations offline'); END",
    )
    .await;

    let receipt = engine
        .record_settlement(SettleCmd::new(group, "bob", "alice", amount(50)))
        .await
        .unwrap();

    let AllocationStatus::Failed { reason } = &receipt.allocation else {
        panic!("expected a failed allocation: {:?}", receipt.allocation);
    };
    assert!(reason.contains("allocations offline"), "{reason}");
    assert!(receipt.marked_split_ids().is_empty());
    assert_eq!(receipt.settlement.allocated, Decimal::ZERO);
    assert_eq!(
        serde_json::to_value(&receipt.allocation).unwrap(),
        serde_json::json!({ "status": "failed", "reason": reason })
    );

    // The split mark was rolled back together with the allocation rows.
    let stored = engine.expense(dinner.expense.id).await.unwrap();
    assert!(!stored.splits[0].is_settled);

    let history = engine.list_group_settlements(group).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, receipt.settlement.id);
    assert_eq!(history[0].allocated, Decimal::ZERO);

    // Unallocated, the payment still offsets the open split.
    assert!(receipt.balances.unwrap().balances.is_empty());
    assert!(engine.balances("alice").await.unwrap().balances.is_empty());
}

#[tokio::test]
async fn balances_report_read_failures() {
    let (engine, db) = engine_with_db().await;
    expense(&engine, Uuid::new_v4(), "alice", &[("bob", 50)]).await;

    exec(&db, "DROP TABLE profiles").await;

    let err = engine.balances("alice").await.unwrap_err();
    assert!(matches!(err, EngineError::StoreRead(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn long_histories_are_read_in_full() {
    let (engine, db) = engine_with_db().await;
    let group = Uuid::from_u128(7);
    expense(&engine, group, "alice", &[("bob", 20)]).await;

    // More rows than SQLite accepts as bound parameters in one statement.
    exec(
        &db,
        "WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < 40000) \
         INSERT INTO expenses (id, group_id, paid_by, amount_minor, currency, date, created_by, created_at) \
         SELECT randomblob(16), randomblob(16), 'alice', 100, 'INR', '2026-10-01', 'alice', \
         '2026-10-01T00:00:00+00:00' FROM n",
    )
    .await;
    exec(
        &db,
        &format!(
            "WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < 40000) \
             INSERT INTO settlements (id, group_id, paid_by, paid_to, amount_minor, settled_at) \
             SELECT randomblob(16), X'{}', 'carol', 'alice', 1, '2026-10-01T00:00:00+00:00' FROM n",
            group.simple()
        ),
    )
    .await;

    let alice = engine.balances("alice").await.unwrap();
    assert_eq!(alice.with("bob").unwrap().amount, amount(20));
    assert_eq!(alice.with("carol").unwrap().amount, amount(-400));

    let history = engine.list_group_settlements(group).await.unwrap();
    assert_eq!(history.len(), 40_000);
    assert!(history.iter().all(|s| s.allocated.is_zero()));
}
