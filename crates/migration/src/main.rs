use sea_orm::Database;
use sea_orm_migration::MigrationName;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut args = std::env::args().skip(1);
    let cmd = args.next().unwrap_or_else(|| "up".to_string());

    let db_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:./kakebo.db?mode=rwc".to_string());

    match cmd.as_str() {
        "up" => {
            let db = Database::connect(&db_url).await?;
            let applied = migration::Migrator::run(&db).await?;
            println!("checked {} migration steps", applied.len());
        }
        "status" => {
            for step in migration::Migrator::plan()? {
                println!("{}", step.name());
            }
        }
        _ => {
            eprintln!("Usage: cargo run -p migration -- [up|status]");
            std::process::exit(2);
        }
    }

    Ok(())
}
