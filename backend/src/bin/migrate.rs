//! Apply, inspect and render the pantry schema migrations.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use mockable::DefaultEnv;
use tracing::info;

use pantry_backend::domain::schema::{render_change_sql, render_schema_sql};
use pantry_backend::domain::{Direction, MigrationChain, MigrationReport, MigrationRunner, RevisionTarget};
use pantry_backend::outbound::persistence::{DbPool, DieselMigrationStore, PoolConfig};
use pantry_backend::settings::Settings;
use pantry_backend::telemetry::init_tracing;

/// `migrate` command arguments.
#[derive(Debug, Parser)]
#[command(name = "migrate", about = "Manage the pantry database schema", version)]
struct Cli {
    /// Database connection URL. Falls back to the `DATABASE_*` settings.
    #[arg(long = "database-url", value_name = "url", global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply upgrades up to a revision (default: head).
    Upgrade {
        #[arg(long, value_name = "revision", default_value = "head")]
        to: RevisionTarget,
    },
    /// Apply downgrades down to a revision, or `base` to remove everything.
    Downgrade {
        #[arg(long, value_name = "revision")]
        to: RevisionTarget,
    },
    /// Print the current revision.
    Current,
    /// Print every ledger entry.
    History,
    /// Print the SQL a run would execute, without executing it.
    Sql {
        #[arg(long, value_name = "up|down", default_value = "up")]
        direction: Direction,
        /// Defaults to `head` for upgrades and `base` for downgrades.
        #[arg(long, value_name = "revision")]
        to: Option<RevisionTarget>,
    },
    /// Print the DDL of the fully migrated schema. Needs no database.
    Schema,
    /// Print the DDL that turns the schema at one revision into the schema
    /// at another, computed by comparing the two. Needs no database.
    Diff {
        #[arg(long, value_name = "revision", default_value = "base")]
        from: RevisionTarget,
        #[arg(long, value_name = "revision", default_value = "head")]
        to: RevisionTarget,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let env = DefaultEnv::new();
    init_tracing(&env);
    let cli = Cli::parse();
    let chain = MigrationChain::pantry().wrap_err("built-in migration chain is invalid")?;

    match &cli.command {
        Command::Schema => {
            let schema = chain.final_schema().wrap_err("replay migration chain")?;
            for statement in render_schema_sql(&schema) {
                println!("{statement};\n");
            }
            return Ok(());
        }
        Command::Diff { from, to } => {
            let changes = chain
                .diff_between(from, to)
                .wrap_err_with(|| format!("diff {from} -> {to}"))?;
            if changes.is_empty() {
                println!("-- {from} and {to} have the same schema");
            }
            for statement in changes.iter().flat_map(render_change_sql) {
                println!("{statement};");
            }
            return Ok(());
        }
        _ => {}
    }

    let database_url = cli
        .database_url
        .unwrap_or_else(|| Settings::from_env(&env).database_url());
    let pool = DbPool::new(
        PoolConfig::new(database_url)
            .with_max_size(1)
            .with_min_idle(None),
    )
    .await
    .wrap_err("connect to database")?;
    let runner = MigrationRunner::new(chain, DieselMigrationStore::new(pool));

    match cli.command {
        Command::Upgrade { to } => print_report(&runner.upgrade(&to).await?),
        Command::Downgrade { to } => print_report(&runner.downgrade(&to).await?),
        Command::Current => {
            let current = runner.current().await?;
            println!("{}", current.as_deref().unwrap_or("base"));
            if current.as_deref() == Some(runner.chain().head()) {
                println!("(head)");
            }
        }
        Command::History => {
            for entry in runner.history().await? {
                println!(
                    "{} {:<9} {} {}",
                    entry.applied_at.to_rfc3339(),
                    entry.direction.as_str(),
                    entry.revision,
                    entry.checksum
                );
            }
        }
        Command::Sql { direction, to } => {
            let target = to.unwrap_or(match direction {
                Direction::Upgrade => RevisionTarget::Head,
                Direction::Downgrade => RevisionTarget::Base,
            });
            for statement in runner.dry_run(direction, &target).await? {
                if statement.starts_with("--") {
                    println!("{statement}");
                } else {
                    println!("{statement};");
                }
            }
        }
        Command::Schema | Command::Diff { .. } => {}
    }
    Ok(())
}

fn print_report(report: &MigrationReport) {
    let from = report.from.as_deref().unwrap_or("base");
    let to = report.to.as_deref().unwrap_or("base");
    info!(from, to, steps = report.applied.len(), "migration run finished");
    if report.applied.is_empty() {
        println!("already at {to}");
    } else {
        println!("{from} -> {to} ({})", report.applied.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case(&["migrate", "upgrade"], "head")]
    #[case(&["migrate", "upgrade", "--to", "00000001"], "00000001")]
    #[case(&["migrate", "downgrade", "--to", "base"], "base")]
    fn targets_parse(#[case] args: &[&str], #[case] expected: &str) {
        let cli = Cli::try_parse_from(args).expect("valid args");
        let target = match cli.command {
            Command::Upgrade { to } | Command::Downgrade { to } => to,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(target.to_string(), expected);
    }

    #[rstest]
    fn downgrade_requires_a_target() {
        assert!(Cli::try_parse_from(["migrate", "downgrade"]).is_err());
    }

    #[rstest]
    fn diff_defaults_to_the_whole_chain() {
        let cli = Cli::try_parse_from(["migrate", "diff"]).expect("valid");
        assert!(matches!(
            cli.command,
            Command::Diff { from: RevisionTarget::Base, to: RevisionTarget::Head }
        ));
    }

    #[rstest]
    fn sql_accepts_short_directions() {
        let cli = Cli::try_parse_from(["migrate", "sql", "--direction", "down"]).expect("valid");
        assert!(matches!(
            cli.command,
            Command::Sql { direction: Direction::Downgrade, to: None }
        ));
    }
}
