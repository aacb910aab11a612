use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    ActualExpensePatch, Engine, EngineError, ExpenseCategory, FixedExpensePatch,
    IncomeEntryPatch, NewActualExpense, NewFixedExpense, NewIncomeEntry, SIZEABLE_ITEM_THRESHOLD,
};

fn early_june_2026() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 2).unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::run(&db).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .clock(early_june_2026)
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn income(amount: f64, on: &str, item: &str) -> NewIncomeEntry {
    NewIncomeEntry {
        amount,
        date: date(on),
        item: item.to_string(),
        currency: None,
    }
}

fn fixed(amount: f64, item: &str, month: i32, year: i32) -> NewFixedExpense {
    NewFixedExpense {
        amount,
        item: item.to_string(),
        currency: None,
        month,
        year,
    }
}

fn actual(amount: f64, on: &str, item: &str, category: ExpenseCategory) -> NewActualExpense {
    NewActualExpense {
        amount,
        date: date(on),
        item: item.to_string(),
        category,
        currency: None,
    }
}

#[tokio::test]
async fn create_validates_and_normalizes_input() {
    let (engine, _db) = engine_with_db().await;

    let entry = engine
        .create_income_entry(NewIncomeEntry {
            amount: 12.5,
            date: date("2026-03-01"),
            item: "  Freelance ".to_string(),
            currency: Some("usd".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(entry.item, "Freelance");
    assert_eq!(entry.currency, "USD");
    assert_eq!(entry.date, "2026-03-01");

    let err = engine
        .create_income_entry(income(-1.0, "2026-03-01", "Oops"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = engine
        .create_fixed_expense_entry(fixed(10.0, "Rent", 13, 2026))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = engine
        .create_income_entry(income(1.0, "2026-03-01", "   "))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn income_merge_sums_and_keeps_the_latest_date() {
    let (engine, _db) = engine_with_db().await;

    let a = engine
        .create_income_entry(income(100.0, "2026-03-10", "Salary"))
        .await
        .unwrap();
    let b = engine
        .create_income_entry(NewIncomeEntry {
            currency: Some("CHF".to_string()),
            ..income(50.5, "2026-03-20", "Bonus")
        })
        .await
        .unwrap();
    let c = engine
        .create_income_entry(income(10.0, "2026-03-02", "Cashback"))
        .await
        .unwrap();

    let merged = engine
        .merge_income_entries(&[a.id, b.id, c.id])
        .await
        .unwrap();
    assert_eq!(merged.amount, 160.5);
    assert_eq!(merged.item, "Salary, Bonus, Cashback");
    assert_eq!(merged.date, "2026-03-20");
    assert_eq!(merged.currency, "EUR");

    let left = engine.income_entries(Some("2026-03")).await.unwrap();
    assert_eq!(left, vec![merged]);
}

#[tokio::test]
async fn merge_aborts_before_writing_when_an_id_is_missing() {
    let (engine, _db) = engine_with_db().await;

    let a = engine
        .create_income_entry(income(100.0, "2026-03-10", "Salary"))
        .await
        .unwrap();

    let err = engine
        .merge_income_entries(&[a.id, 999])
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation("Income entry with id 999 not found".to_string())
    );
    let err = engine.merge_income_entries(&[a.id, a.id]).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation("At least 2 entries are required to merge".to_string())
    );

    assert_eq!(engine.income_entries(None).await.unwrap(), vec![a]);
}

#[tokio::test]
async fn actual_merge_keeps_the_earliest_date_and_first_category() {
    let (engine, _db) = engine_with_db().await;

    let a = engine
        .create_actual_expense_entry(actual(
            20.0,
            "2026-03-15",
            "Cinema",
            ExpenseCategory::EntertainmentAndLeisure,
        ))
        .await
        .unwrap();
    let b = engine
        .create_actual_expense_entry(actual(
            5.0,
            "2026-03-03",
            "Popcorn",
            ExpenseCategory::Extras,
        ))
        .await
        .unwrap();

    let merged = engine
        .merge_actual_expense_entries(&[a.id, b.id])
        .await
        .unwrap();
    assert_eq!(merged.amount, 25.0);
    assert_eq!(merged.date, "2026-03-03");
    assert_eq!(merged.category, "entertainment and leisure");
    assert_eq!(merged.item, "Cinema, Popcorn");
}

#[tokio::test]
async fn fixed_merge_books_on_the_latest_year_then_month() {
    let (engine, _db) = engine_with_db().await;

    let a = engine
        .create_fixed_expense_entry(fixed(10.0, "Phone", 12, 2025))
        .await
        .unwrap();
    let b = engine
        .create_fixed_expense_entry(fixed(20.0, "Internet", 2, 2026))
        .await
        .unwrap();
    let c = engine
        .create_fixed_expense_entry(fixed(30.0, "TV", 11, 2025))
        .await
        .unwrap();

    let merged = engine
        .merge_fixed_expense_entries(&[a.id, b.id, c.id])
        .await
        .unwrap();
    assert_eq!((merged.year, merged.month), (2026, 2));
    assert_eq!(merged.amount, 60.0);
    assert!(engine.fixed_expense_entry(a.id).await.unwrap().is_none());
}

#[tokio::test]
async fn bulk_update_falls_back_to_the_first_row() {
    let (engine, _db) = engine_with_db().await;

    let a = engine
        .create_actual_expense_entry(actual(
            10.0,
            "2026-03-01",
            "Bread",
            ExpenseCategory::Essential,
        ))
        .await
        .unwrap();
    let b = engine
        .create_actual_expense_entry(actual(
            99.0,
            "2026-03-09",
            "Concert",
            ExpenseCategory::EntertainmentAndLeisure,
        ))
        .await
        .unwrap();

    let updated = engine
        .bulk_update_actual_expense_entries(
            &[b.id, a.id],
            ActualExpensePatch {
                amount: Some(15.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated, 2);

    let b = engine.actual_expense_entry(b.id).await.unwrap().unwrap();
    assert_eq!(b.amount, 15.0);
    assert_eq!(b.item, "Bread");
    assert_eq!(b.date, "2026-03-01");
    assert_eq!(b.category, "essential");
}

#[tokio::test]
async fn update_only_touches_given_fields() {
    let (engine, _db) = engine_with_db().await;

    let entry = engine
        .create_fixed_expense_entry(fixed(800.0, "Rent", 3, 2026))
        .await
        .unwrap();
    let updated = engine
        .update_fixed_expense_entry(
            entry.id,
            FixedExpensePatch {
                amount: Some(850.0),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.amount, 850.0);
    assert_eq!(updated.item, "Rent");
    assert_eq!((updated.month, updated.year), (3, 2026));

    let missing = engine
        .update_income_entry(42, IncomeEntryPatch::default())
        .await
        .unwrap();
    assert!(missing.is_none());
    assert!(!engine.delete_income_entry(42).await.unwrap());
}

#[tokio::test]
async fn bulk_delete_counts_only_existing_rows() {
    let (engine, _db) = engine_with_db().await;

    let a = engine
        .create_income_entry(income(1.0, "2026-03-01", "A"))
        .await
        .unwrap();
    let b = engine
        .create_income_entry(income(2.0, "2026-03-02", "B"))
        .await
        .unwrap();

    let deleted = engine
        .bulk_delete_income_entries(&[a.id, b.id, 777])
        .await
        .unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(engine.bulk_delete_income_entries(&[]).await.unwrap(), 0);
}

#[tokio::test]
async fn copying_fixed_expenses_skips_labels_already_there() {
    let (engine, _db) = engine_with_db().await;

    let rent = engine
        .create_fixed_expense_entry(fixed(800.0, "Rent", 3, 2026))
        .await
        .unwrap();
    engine
        .create_fixed_expense_entry(fixed(40.0, "Gym", 3, 2026))
        .await
        .unwrap();
    engine
        .create_fixed_expense_entry(fixed(15.0, "Streaming", 3, 2026))
        .await
        .unwrap();
    engine
        .create_fixed_expense_entry(fixed(45.0, "Gym", 4, 2026))
        .await
        .unwrap();

    let copied = engine
        .copy_fixed_expenses_to_next_month("2026-03", None)
        .await
        .unwrap();
    assert_eq!(copied, 2);
    assert_eq!(
        engine
            .copy_fixed_expenses_to_next_month("2026-03", None)
            .await
            .unwrap(),
        0
    );

    let april = engine.fixed_expense_entries(Some("2026-04")).await.unwrap();
    let mut labels: Vec<_> = april.iter().map(|e| e.item.as_str()).collect();
    labels.sort_unstable();
    assert_eq!(labels, vec!["Gym", "Rent", "Streaming"]);
    let gym = april.iter().find(|e| e.item == "Gym").unwrap();
    assert_eq!(gym.amount, 45.0);

    let selective = engine
        .copy_fixed_expenses_to_next_month("2026-04", Some(&[april[0].id][..]))
        .await
        .unwrap();
    assert_eq!(selective, 1);
    assert_eq!(engine.fixed_expense_entries(Some("2026-05")).await.unwrap().len(), 1);
    assert!(engine.fixed_expense_entry(rent.id).await.unwrap().is_some());
}

#[tokio::test]
async fn copying_into_the_previous_month_rebalances_it() {
    let (engine, _db) = engine_with_db().await;

    engine
        .create_fixed_expense_entry(fixed(25.0, "Phone", 4, 2026))
        .await
        .unwrap();
    engine
        .copy_fixed_expenses_to_next_month("2026-04", None)
        .await
        .unwrap();

    let may = engine.actual_expense_entries(Some("2026-05")).await.unwrap();
    assert_eq!(may.len(), 1);
    assert_eq!(may[0].item, "May 2026 balance");
    assert_eq!(may[0].amount, 25.0);
}

#[tokio::test]
async fn creating_entries_feeds_autocomplete() {
    let (engine, _db) = engine_with_db().await;

    for item in ["Groceries", "Fuel", "Groceries", "  "] {
        engine
            .save_autocomplete_suggestion("actual_expense_entries", "item", item)
            .await
            .unwrap();
    }
    engine
        .create_actual_expense_entry(actual(
            30.0,
            "2026-03-01",
            "Fuel",
            ExpenseCategory::Essential,
        ))
        .await
        .unwrap();
    engine
        .create_actual_expense_entry(actual(
            3.0,
            "2026-03-01",
            "Fuel",
            ExpenseCategory::Essential,
        ))
        .await
        .unwrap();
    engine
        .create_income_entry(income(10.0, "2026-03-01", "Salary"))
        .await
        .unwrap();

    let suggestions = engine
        .autocomplete_suggestions("actual_expense_entries", "item", 10)
        .await
        .unwrap();
    assert_eq!(suggestions, vec!["Fuel".to_string(), "Groceries".to_string()]);

    let income = engine
        .autocomplete_suggestions("income_entries", "item", 1)
        .await
        .unwrap();
    assert_eq!(income, vec!["Salary".to_string()]);
}

#[tokio::test]
async fn sizeable_item_threshold_is_a_typed_setting() {
    let (engine, _db) = engine_with_db().await;

    assert_eq!(engine.sizeable_item_threshold().await.unwrap(), 100.0);

    let updated = engine
        .update_setting(SIZEABLE_ITEM_THRESHOLD, "250.50")
        .await
        .unwrap();
    assert_eq!(updated.value, "250.50");
    assert!(updated.updated_at.is_some());
    assert_eq!(engine.sizeable_item_threshold().await.unwrap(), 250.5);

    for bad in ["-1", "lots"] {
        let err = engine
            .update_setting(SIZEABLE_ITEM_THRESHOLD, bad)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
    let err = engine.update_setting("theme", "dark").await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation("Setting with key 'theme' not found".to_string())
    );
    assert!(engine.setting("theme").await.unwrap().is_none());
}
