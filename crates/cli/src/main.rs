mod commands;
mod error;
mod util;

use std::sync::LazyLock;

use commands::{DbCommand, GreensandCli, GreensandSubcommand, SummaryCommandArgs};
use greensand_core::db::ReadingStore;
use greensand_sqlite::SqliteDb;
use tracing_subscriber::EnvFilter;

static DB: LazyLock<SqliteDb> = std::sync::LazyLock::new(|| {
    let db_path = util::db_file().expect("failed to locate the greensand data directory");
    SqliteDb::from_file(&db_path).expect("failed to open the greensand database")
});

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = GreensandCli::parse_args();
    // db subcommands manage the database file themselves; params never
    // touches it
    if !matches!(
        args.command,
        GreensandSubcommand::Db { .. } | GreensandSubcommand::Params
    ) {
        DB.create_tables()?;
    }

    match args.command {
        GreensandSubcommand::Add {
            series,
            value,
            at,
            remark,
        } => commands::add(&DB.clone(), series, value, at, remark).await?,

        GreensandSubcommand::Edit {
            id,
            value,
            remark,
            clear_remark,
        } => commands::edit(&DB.clone(), id, value, remark, clear_remark).await?,

        GreensandSubcommand::Delete { id } => commands::delete(&DB.clone(), id).await?,

        GreensandSubcommand::SetLimits {
            series,
            day,
            lower,
            upper,
            clear,
        } => commands::set_limits(&DB.clone(), series, day, lower, upper, clear).await?,

        GreensandSubcommand::Import {
            family,
            path,
            limits,
        } => commands::import(&DB.clone(), family, path, limits).await?,

        GreensandSubcommand::Summary {
            series,
            day,
            start,
            end,
            lower,
            upper,
            json,
            out,
        } => {
            commands::summary(
                &DB.clone(),
                SummaryCommandArgs {
                    series,
                    day,
                    start,
                    end,
                    lower,
                    upper,
                    json,
                    out,
                },
            )
            .await?
        }

        GreensandSubcommand::Readings {
            series,
            day,
            start,
            end,
        } => commands::readings(&DB.clone(), series, day, start, end).await?,

        GreensandSubcommand::Params => commands::params().await?,

        GreensandSubcommand::Db { command } => match command {
            DbCommand::Drop => commands::db::drop_db(&util::db_file()?).await?,
            DbCommand::Reset => commands::db::reset_db(&util::db_file()?).await?,
            DbCommand::Export { out_path } => {
                commands::db::export_db(&util::db_file()?, out_path).await?
            }
            DbCommand::Import { src_path } => {
                commands::db::import_db(src_path, &util::db_file()?).await?
            }
        },
    }
    Ok(())
}
