use std::{collections::BTreeMap, time::Duration};

use clap::{Args, Parser, Subcommand};
use engine::{Engine, Month, PreviewFetcher, SIZEABLE_ITEM_THRESHOLD};
use migration::Migrator;
use serde::Serialize;
use settings::Database;

mod settings;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser, Debug)]
#[command(name = "kakebo")]
#[command(about = "Household ledger: schema upgrades and monthly figures")]
struct Cli {
    /// Settings file, without extension.
    #[arg(long, default_value = "settings")]
    config: String,

    /// Database connection string, overrides the `[database]` section.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bring the schema up to date and list the steps that were checked.
    Migrate,
    /// Income minus fixed and actual expenses of a month.
    AvailableCash(MonthArg),
    /// Available cash plus savings minus the debts of a month.
    NetWorth(MonthArg),
    /// Debts with the month's linked fixed expense taken off.
    Debts(MonthArg),
    /// Recompute the synthetic balance entry of a month.
    Rebalance {
        /// `YYYY-MM`, defaults to the previous calendar month.
        #[arg(long)]
        month: Option<String>,
    },
    /// Progress of a project towards its target.
    ProjectProgress {
        #[arg(long)]
        id: i32,
    },
    /// Copy a month's fixed expenses into the next month.
    CopyFixed {
        #[arg(long)]
        month: String,
        /// Only copy these entries.
        #[arg(long, value_delimiter = ',')]
        ids: Vec<i32>,
    },
    /// Show the sizeable item threshold, or set it with `--set`.
    Threshold {
        #[arg(long)]
        set: Option<String>,
    },
}

#[derive(Args, Debug)]
struct MonthArg {
    /// `YYYY-MM`
    #[arg(long)]
    month: String,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "kakebo={level},engine={level},migration={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let url = match cli.database_url {
        Some(url) => url,
        None => database_url(settings.database.as_ref()),
    };
    let db = sea_orm::Database::connect(url).await?;
    let applied = Migrator::run(&db).await?;
    tracing::debug!("schema checked, {} steps", applied.len());

    let mut builder = Engine::builder().database(db);
    if settings.preview.enabled {
        builder = builder.preview(PreviewFetcher::new(Duration::from_secs(
            settings.preview.timeout_secs,
        )));
    }
    let engine = builder.build().await?;

    match cli.command {
        Command::Migrate => print(&applied)?,
        Command::AvailableCash(MonthArg { month }) => {
            print(&engine.calculate_available_cash(&month).await?)?
        }
        Command::NetWorth(MonthArg { month }) => print(&engine.calculate_net_worth(&month).await?)?,
        Command::Debts(MonthArg { month }) => print(
            &engine
                .get_debt_entries_with_monthly_reduction(&month)
                .await?,
        )?,
        Command::Rebalance { month } => {
            let month = match month {
                Some(month) => month,
                None => Month::previous_of(engine.today()).to_string(),
            };
            print(&engine.update_balance_entry_for_month(&month).await?)?
        }
        Command::ProjectProgress { id } => print(&engine.calculate_project_progress(id).await?)?,
        Command::CopyFixed { month, ids } => {
            let ids = (!ids.is_empty()).then_some(ids.as_slice());
            let copied = engine.copy_fixed_expenses_to_next_month(&month, ids).await?;
            print(&serde_json::json!({ "copied": copied }))?
        }
        Command::Threshold { set } => {
            if let Some(value) = set {
                engine
                    .update_setting(SIZEABLE_ITEM_THRESHOLD, &value)
                    .await?;
            }
            let threshold = engine.sizeable_item_threshold().await?;
            print(&BTreeMap::from([(SIZEABLE_ITEM_THRESHOLD, threshold)]))?
        }
    }

    Ok(())
}

fn database_url(config: Option<&Database>) -> String {
    match config {
        Some(Database::Memory) => String::from("sqlite::memory:"),
        Some(Database::Sqlite(path)) => format!("sqlite:{path}?mode=rwc"),
        None => String::from("sqlite:./kakebo.db?mode=rwc"),
    }
}

fn print<T: Serialize>(value: &T) -> Result<(), BoxError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn copy_fixed_accepts_a_comma_separated_selection() {
        let cli = Cli::try_parse_from([
            "kakebo",
            "copy-fixed",
            "--month",
            "2026-03",
            "--ids",
            "4,7",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::CopyFixed { ref month, ref ids } if month == "2026-03" && ids == &[4, 7]
        ));
    }

    #[test]
    fn database_section_maps_to_sqlite_urls() {
        assert_eq!(database_url(None), "sqlite:./kakebo.db?mode=rwc");
        assert_eq!(
            database_url(Some(&Database::Sqlite("ledger.db".to_string()))),
            "sqlite:ledger.db?mode=rwc"
        );
        assert_eq!(database_url(Some(&Database::Memory)), "sqlite::memory:");
    }
}
