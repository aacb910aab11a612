use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    ContributionPatch, DebtPatch, Engine, EngineError, NewContribution, NewDebt,
    NewFixedExpense, NewProject, NewSavingsAccount, ProjectFilter, SavingsAccountPatch,
};

fn early_june_2026() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 2).unwrap()
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

fn account(name: &str, base_balance: f64) -> NewSavingsAccount {
    NewSavingsAccount {
        name: name.to_string(),
        base_balance,
        currency: None,
        bank_institution: Some(" Local Bank ".to_string()),
    }
}

fn contribution(savings_account_id: i32, amount: f64, on: &str) -> NewContribution {
    NewContribution {
        savings_account_id,
        amount,
        date: NaiveDate::parse_from_str(on, "%Y-%m-%d").unwrap(),
        notes: None,
    }
}

fn debt(name: &str, initial_amount: f64, current_balance: f64) -> NewDebt {
    NewDebt {
        name: name.to_string(),
        initial_amount,
        current_balance,
        currency: None,
        linked_fixed_expense_id: None,
        notes: None,
    }
}

#[tokio::test]
async fn account_balance_adds_contributions_to_the_base() {
    let (engine, _db) = engine_with_db().await;

    let holiday = engine
        .create_savings_account(account("Holiday", 200.0))
        .await
        .unwrap();
    assert_eq!(holiday.bank_institution.as_deref(), Some("Local Bank"));
    assert_eq!(holiday.currency, "EUR");

    let first = engine
        .create_contribution(contribution(holiday.id, 50.0, "2026-02-01"))
        .await
        .unwrap();
    engine
        .create_contribution(contribution(holiday.id, 25.5, "2026-03-01"))
        .await
        .unwrap();

    assert_eq!(
        engine.savings_account_balance(holiday.id).await.unwrap(),
        Some(275.5)
    );
    assert_eq!(engine.savings_account_balance(999).await.unwrap(), None);

    let listed = engine.contributions(holiday.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].date, "2026-03-01");

    let updated = engine
        .update_contribution(
            first.id,
            ContributionPatch {
                amount: Some(100.0),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.amount, 100.0);
    assert!(updated.updated_at.is_some());
    assert_eq!(
        engine.savings_account_balance(holiday.id).await.unwrap(),
        Some(325.5)
    );
}

#[tokio::test]
async fn contributions_need_an_existing_account() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .create_contribution(contribution(7, 10.0, "2026-02-01"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation("Savings account with id 7 not found".to_string())
    );

    let holiday = engine
        .create_savings_account(account("Holiday", 0.0))
        .await
        .unwrap();
    let err = engine
        .create_contribution(contribution(holiday.id, -5.0, "2026-02-01"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn deleting_an_account_cascades_and_unlinks_projects() {
    let (engine, _db) = engine_with_db().await;

    let holiday = engine
        .create_savings_account(account("Holiday", 100.0))
        .await
        .unwrap();
    let gift = engine
        .create_contribution(contribution(holiday.id, 10.0, "2026-02-01"))
        .await
        .unwrap();
    let trip = engine
        .create_project(NewProject {
            name: "Trip".to_string(),
            description: None,
            target_amount: 1000.0,
            status: Default::default(),
            savings_account_id: Some(holiday.id),
            currency: None,
        })
        .await
        .unwrap();

    assert!(engine.delete_savings_account(holiday.id).await.unwrap());
    assert!(!engine.delete_savings_account(holiday.id).await.unwrap());

    assert!(engine.contribution(gift.id).await.unwrap().is_none());
    let trip = engine.project(trip.id).await.unwrap().unwrap();
    assert_eq!(trip.savings_account_id, None);

    let linked = engine
        .projects(ProjectFilter {
            savings_account_id: Some(holiday.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(linked.is_empty());
}

#[tokio::test]
async fn account_updates_stamp_updated_at() {
    let (engine, _db) = engine_with_db().await;

    let holiday = engine
        .create_savings_account(account("Holiday", 100.0))
        .await
        .unwrap();
    assert!(holiday.updated_at.is_none());

    let renamed = engine
        .update_savings_account(
            holiday.id,
            SavingsAccountPatch {
                name: Some("Summer".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(renamed.name, "Summer");
    assert_eq!(renamed.base_balance, 100.0);
    assert!(renamed.updated_at.is_some());

    let err = engine
        .update_savings_account(
            holiday.id,
            SavingsAccountPatch {
                base_balance: Some(-1.0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn deleting_a_project_leaves_its_account_and_contributions() {
    let (engine, _db) = engine_with_db().await;

    let holiday = engine
        .create_savings_account(account("Holiday", 100.0))
        .await
        .unwrap();
    engine
        .create_contribution(contribution(holiday.id, 40.0, "2026-04-01"))
        .await
        .unwrap();
    engine
        .create_contribution(contribution(holiday.id, 60.0, "2026-05-01"))
        .await
        .unwrap();
    let trip = engine
        .create_project(NewProject {
            name: "Trip".to_string(),
            description: None,
            target_amount: 1000.0,
            status: Default::default(),
            savings_account_id: Some(holiday.id),
            currency: None,
        })
        .await
        .unwrap();

    assert!(engine.delete_project(trip.id).await.unwrap());

    assert!(engine.project(trip.id).await.unwrap().is_none());
    assert!(engine.savings_account(holiday.id).await.unwrap().is_some());
    assert_eq!(
        engine.savings_account_balance(holiday.id).await.unwrap(),
        Some(200.0)
    );
    assert_eq!(engine.contributions(holiday.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn debt_balance_never_exceeds_the_initial_amount() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .create_debt_entry(debt("Car", 100.0, 150.0))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation(
            "Debt entry current_balance cannot exceed initial_amount".to_string()
        )
    );

    let car = engine
        .create_debt_entry(debt("Car", 1000.0, 800.0))
        .await
        .unwrap();
    let err = engine
        .update_debt_entry(
            car.id,
            DebtPatch {
                initial_amount: Some(500.0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let paid = engine
        .update_debt_entry(
            car.id,
            DebtPatch {
                current_balance: Some(0.0),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(paid.current_balance, 0.0);
    assert_eq!(paid.initial_amount, 1000.0);
}

#[tokio::test]
async fn debt_links_must_point_at_a_fixed_expense() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .create_debt_entry(NewDebt {
            linked_fixed_expense_id: Some(42),
            ..debt("Car", 1000.0, 800.0)
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation("Fixed expense entry with id 42 not found".to_string())
    );

    let installment = engine
        .create_fixed_expense_entry(NewFixedExpense {
            amount: 100.0,
            item: "Car installment".to_string(),
            currency: None,
            month: 3,
            year: 2026,
        })
        .await
        .unwrap();
    let car = engine
        .create_debt_entry(NewDebt {
            linked_fixed_expense_id: Some(installment.id),
            ..debt("Car", 1000.0, 800.0)
        })
        .await
        .unwrap();

    let renamed = engine
        .update_debt_entry(
            car.id,
            DebtPatch {
                name: Some("Car loan".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(renamed.linked_fixed_expense_id, Some(installment.id));

    assert!(
        engine
            .delete_fixed_expense_entry(installment.id)
            .await
            .unwrap()
    );
    let car = engine.debt_entry(car.id).await.unwrap().unwrap();
    assert_eq!(car.linked_fixed_expense_id, None);
    assert_eq!(car.current_balance, 800.0);

    let march = engine
        .get_debt_entries_with_monthly_reduction("2026-03")
        .await
        .unwrap();
    assert_eq!(march[0].monthly_payment, None);
    assert_eq!(march[0].balance_for_month, 800.0);
}

#[tokio::test]
async fn monthly_reduction_never_goes_below_zero() {
    let (engine, _db) = engine_with_db().await;

    let installment = engine
        .create_fixed_expense_entry(NewFixedExpense {
            amount: 300.0,
            item: "Last installment".to_string(),
            currency: None,
            month: 3,
            year: 2026,
        })
        .await
        .unwrap();
    engine
        .create_debt_entry(NewDebt {
            linked_fixed_expense_id: Some(installment.id),
            ..debt("Phone", 1000.0, 120.0)
        })
        .await
        .unwrap();

    let march = engine
        .get_debt_entries_with_monthly_reduction("2026-03")
        .await
        .unwrap();
    assert_eq!(march[0].monthly_payment, Some(300.0));
    assert_eq!(march[0].balance_for_month, 0.0);

    let april = engine
        .get_debt_entries_with_monthly_reduction("2026-04")
        .await
        .unwrap();
    assert_eq!(april[0].monthly_payment, None);
    assert_eq!(april[0].balance_for_month, 120.0);
}
