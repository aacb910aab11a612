use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

async fn memory_db() -> DatabaseConnection {
    Database::connect("sqlite::memory:").await.unwrap()
}

async fn exec(db: &DatabaseConnection, sql: &str) {
    db.execute(Statement::from_string(
        db.get_database_backend(),
        sql.to_string(),
    ))
    .await
    .unwrap();
}

async fn schema_snapshot(db: &DatabaseConnection) -> Vec<(String, String, Option<String>)> {
    let rows = db
        .query_all(Statement::from_string(
            db.get_database_backend(),
            "SELECT type, name, sql FROM sqlite_master \
             WHERE name NOT LIKE 'sqlite_%' ORDER BY type, name"
                .to_string(),
        ))
        .await
        .unwrap();
    rows.iter()
        .map(|row| {
            (
                row.try_get("", "type").unwrap(),
                row.try_get("", "name").unwrap(),
                row.try_get("", "sql").unwrap(),
            )
        })
        .collect()
}

async fn count(db: &DatabaseConnection, sql: &str) -> i64 {
    let row = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            sql.to_string(),
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get_by_index(0).unwrap()
}

async fn columns(db: &DatabaseConnection, table: &str) -> Vec<String> {
    let rows = db
        .query_all(Statement::from_string(
            db.get_database_backend(),
            format!("SELECT name FROM pragma_table_info('{table}') ORDER BY cid"),
        ))
        .await
        .unwrap();
    rows.iter()
        .map(|row| row.try_get("", "name").unwrap())
        .collect()
}

async fn table_names(db: &DatabaseConnection) -> Vec<String> {
    schema_snapshot(db)
        .await
        .into_iter()
        .filter(|(kind, _, _)| kind == "table")
        .map(|(_, name, _)| name)
        .collect()
}

#[tokio::test]
async fn fresh_store_reaches_final_schema() {
    let db = memory_db().await;
    let applied = migration::Migrator::run(&db).await.unwrap();

    assert_eq!(applied.first().map(String::as_str), Some("m001_initial_tables"));
    assert_eq!(
        applied.last().map(String::as_str),
        Some("m020_rename_initial_balance_to_base_balance")
    );

    let tables = table_names(&db).await;
    for expected in [
        "actual_expense_entries",
        "autocomplete_suggestions",
        "contributions",
        "debt_entries",
        "fixed_expense_entries",
        "income_entries",
        "projects",
        "savings_accounts",
        "settings",
        "wishlist_items",
        "wishlists",
    ] {
        assert!(tables.contains(&expected.to_string()), "missing {expected}");
    }
    assert!(!tables.contains(&"project_contributions".to_string()));

    let projects = columns(&db, "projects").await;
    assert!(projects.contains(&"priority_order".to_string()));
    assert!(!projects.contains(&"savings_account_name".to_string()));
    assert!(columns(&db, "savings_accounts")
        .await
        .contains(&"base_balance".to_string()));
    assert!(!columns(&db, "wishlist_items")
        .await
        .contains(&"custom_order".to_string()));
    assert!(columns(&db, "autocomplete_suggestions")
        .await
        .contains(&"entity".to_string()));

    assert_eq!(
        count(
            &db,
            "SELECT COUNT(*) FROM settings WHERE key = 'sizeable_item_threshold' AND value = '100.00'"
        )
        .await,
        1
    );
}

#[tokio::test]
async fn running_twice_is_idempotent() {
    let db = memory_db().await;
    migration::Migrator::run(&db).await.unwrap();

    // Entries written by the engine arrive together with their suggestion,
    // so a later run has nothing left to seed.
    exec(&db, "INSERT INTO income_entries (amount, date, item) VALUES (10.0, '2026-01-03', 'Salary')").await;
    exec(&db, "INSERT INTO autocomplete_suggestions (entity, field, field_path, value, usage_count, last_used_at, created_at) VALUES ('income_entries', 'item', 'income_entries.item', 'Salary', 1, datetime('now'), datetime('now'))").await;
    exec(&db, "INSERT INTO savings_accounts (name, base_balance) VALUES ('Rainy day', 100.0)").await;
    exec(&db, "INSERT INTO projects (name, target_amount, priority_order) VALUES ('Bike', 500.0, 1)").await;

    let before = schema_snapshot(&db).await;
    let rows_before = (
        count(&db, "SELECT COUNT(*) FROM income_entries").await,
        count(&db, "SELECT COUNT(*) FROM autocomplete_suggestions").await,
        count(&db, "SELECT COUNT(*) FROM projects").await,
        count(&db, "SELECT COUNT(*) FROM settings").await,
    );

    migration::Migrator::run(&db).await.unwrap();

    assert_eq!(schema_snapshot(&db).await, before);
    let rows_after = (
        count(&db, "SELECT COUNT(*) FROM income_entries").await,
        count(&db, "SELECT COUNT(*) FROM autocomplete_suggestions").await,
        count(&db, "SELECT COUNT(*) FROM projects").await,
        count(&db, "SELECT COUNT(*) FROM settings").await,
    );
    assert_eq!(rows_before, rows_after);
}

#[tokio::test]
async fn upgrades_a_legacy_store() {
    let db = memory_db().await;

    // Shapes from before currency, month/year, base_balance and priority_order existed.
    exec(&db, "CREATE TABLE income_entries (id INTEGER PRIMARY KEY AUTOINCREMENT, amount REAL NOT NULL, date TEXT NOT NULL, item TEXT NOT NULL)").await;
    exec(&db, "CREATE TABLE fixed_expense_entries (id INTEGER PRIMARY KEY AUTOINCREMENT, amount REAL NOT NULL, item TEXT NOT NULL, currency TEXT NOT NULL DEFAULT 'EUR')").await;
    exec(&db, "CREATE TABLE actual_expense_entries (id INTEGER PRIMARY KEY AUTOINCREMENT, amount REAL NOT NULL, date TEXT NOT NULL, item TEXT NOT NULL, category TEXT NOT NULL, currency TEXT NOT NULL DEFAULT 'EUR')").await;
    exec(&db, "CREATE TABLE savings_accounts (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, initial_balance REAL NOT NULL DEFAULT 0, currency TEXT NOT NULL DEFAULT 'EUR', bank_institution TEXT, created_at TEXT NOT NULL DEFAULT (datetime('now')), updated_at TEXT)").await;
    exec(&db, "CREATE TABLE projects (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, description TEXT, target_amount REAL NOT NULL, status TEXT NOT NULL DEFAULT 'Active', savings_account_id INTEGER, currency TEXT, created_at TEXT, updated_at TEXT)").await;

    exec(&db, "INSERT INTO income_entries (amount, date, item) VALUES (1000.0, '2025-05-01', 'Salary'), (50.0, '2025-05-09', 'Salary'), (20.0, '2025-05-10', '  ')").await;
    exec(&db, "INSERT INTO fixed_expense_entries (amount, item) VALUES (700.0, 'Rent')").await;
    exec(&db, "INSERT INTO actual_expense_entries (amount, date, item, category) VALUES (3.0, '2025-05-02', 'Coffee', 'comfort'), (4.0, '2025-05-03', 'Coffee', 'comfort'), (60.0, '2025-05-04', 'Groceries', 'essential')").await;
    exec(&db, "INSERT INTO savings_accounts (name, initial_balance) VALUES ('Rainy day', 250.0)").await;
    exec(&db, "INSERT INTO projects (id, name, target_amount, currency, created_at) VALUES (4, 'Bike', 500.0, NULL, NULL), (9, 'Trip', 900.0, 'EUR', '2025-01-01 00:00:00')").await;

    migration::Migrator::run(&db).await.unwrap();

    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM income_entries WHERE currency = 'EUR'").await,
        3
    );
    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM fixed_expense_entries WHERE month IS NULL OR year IS NULL").await,
        0
    );
    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM savings_accounts WHERE base_balance = 250.0").await,
        1
    );

    // Rows predating priority_order are ranked by id and get defaults filled in.
    assert_eq!(count(&db, "SELECT priority_order FROM projects WHERE id = 4").await, 4);
    assert_eq!(count(&db, "SELECT priority_order FROM projects WHERE id = 9").await, 9);
    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM projects WHERE currency = 'EUR' AND created_at IS NOT NULL").await,
        2
    );
    assert_eq!(
        count(&db, "SELECT seq FROM sqlite_sequence WHERE name = 'projects'").await,
        9
    );

    // Suggestions seeded from stored labels, blanks skipped, counts kept.
    assert_eq!(
        count(&db, "SELECT usage_count FROM autocomplete_suggestions WHERE entity = 'actual_expense_entries' AND field = 'item' AND value = 'Coffee'").await,
        2
    );
    assert_eq!(
        count(&db, "SELECT usage_count FROM autocomplete_suggestions WHERE entity = 'income_entries' AND field = 'item' AND value = 'Salary'").await,
        2
    );
    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM autocomplete_suggestions WHERE field_path = 'income_entries.item'").await,
        1
    );
}

#[tokio::test]
async fn legacy_projects_generation_is_replaced() {
    let db = memory_db().await;
    exec(&db, "CREATE TABLE projects (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, description TEXT, target_amount REAL NOT NULL, target_date TEXT NOT NULL, priority TEXT NOT NULL, category TEXT, status TEXT NOT NULL DEFAULT 'active', savings_account_name TEXT UNIQUE NOT NULL, currency TEXT NOT NULL DEFAULT 'EUR', created_at TEXT NOT NULL DEFAULT (datetime('now')), updated_at TEXT)").await;
    exec(&db, "INSERT INTO projects (name, target_amount, target_date, priority, savings_account_name) VALUES ('Old', 10.0, '2030-01-01', 'high', 'Box')").await;

    migration::Migrator::run(&db).await.unwrap();

    let projects = columns(&db, "projects").await;
    assert!(projects.contains(&"savings_account_id".to_string()));
    assert!(projects.contains(&"priority_order".to_string()));
    assert!(!table_names(&db).await.contains(&"project_contributions".to_string()));
    assert_eq!(count(&db, "SELECT COUNT(*) FROM projects").await, 0);
}

#[tokio::test]
async fn wishlist_items_lose_custom_order_but_keep_rows() {
    let db = memory_db().await;
    exec(&db, "CREATE TABLE wishlists (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, description TEXT, created_at TEXT NOT NULL DEFAULT (datetime('now')), updated_at TEXT)").await;
    exec(&db, "CREATE TABLE wishlist_items (id INTEGER PRIMARY KEY AUTOINCREMENT, wishlist_id INTEGER NOT NULL, name TEXT NOT NULL, description TEXT, amount REAL, currency TEXT NOT NULL DEFAULT 'EUR', priority INTEGER, notes TEXT, url TEXT, url_preview_image TEXT, uploaded_image TEXT, custom_order INTEGER NOT NULL, purchased INTEGER NOT NULL DEFAULT 0, purchased_at TEXT, created_at TEXT NOT NULL DEFAULT (datetime('now')), updated_at TEXT, FOREIGN KEY (wishlist_id) REFERENCES wishlists(id) ON DELETE CASCADE)").await;
    exec(&db, "CREATE INDEX idx_wishlist_items_custom_order ON wishlist_items(custom_order)").await;
    exec(&db, "INSERT INTO wishlists (name) VALUES ('Home')").await;
    exec(&db, "INSERT INTO wishlist_items (wishlist_id, name, priority, custom_order) VALUES (1, 'Lamp', 1, 5), (1, 'Rug', 2, 6)").await;

    migration::Migrator::run(&db).await.unwrap();

    assert!(!columns(&db, "wishlist_items")
        .await
        .contains(&"custom_order".to_string()));
    assert_eq!(count(&db, "SELECT COUNT(*) FROM wishlist_items").await, 2);
    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM sqlite_master WHERE name = 'idx_wishlist_items_custom_order'").await,
        0
    );
}

#[tokio::test]
async fn failing_step_rolls_back_the_whole_run() {
    let db = memory_db().await;
    // A `projects` table this old lacks the columns later steps build on.
    exec(&db, "CREATE TABLE projects (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, target_amount REAL NOT NULL)").await;
    exec(&db, "INSERT INTO projects (name, target_amount) VALUES ('Bike', 500.0)").await;
    let before = schema_snapshot(&db).await;

    let err = migration::Migrator::run(&db).await.unwrap_err();
    assert!(matches!(err, sea_orm::DbErr::Migration(_)));

    assert_eq!(schema_snapshot(&db).await, before);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM projects").await, 1);
    let tables = table_names(&db).await;
    assert!(!tables.contains(&"income_entries".to_string()));
    assert!(!tables.contains(&"savings_accounts".to_string()));
    assert_eq!(columns(&db, "projects").await.len(), 3);
}
