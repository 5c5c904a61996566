//! todo-web management CLI
//!
//! ```text
//! manage migrate [--plan]
//! manage showmigrations
//! manage sqlmigrate <APP_LABEL> <MIGRATION_NAME>
//! manage dumpmigration <APP_LABEL> <MIGRATION_NAME> [--output PATH]
//! ```
//!
//! `--migrations-dir DIR` adds the JSON records under `DIR/<app>/` to the
//! compiled-in migrations, and is where `dumpmigration` writes by default.

use std::path::PathBuf;
use std::process;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use console::style;
use todo_web::apps::all_migrations;
use todo_web::commands;
use todo_web::conf::Settings;
use todo_web::db::backends::{DatabaseConnection, DatabaseType};
use todo_web::utils::init_logging;

#[derive(Parser)]
#[command(name = "manage")]
#[command(about = "todo-web management interface", long_about = None)]
#[command(version)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Settings file (TOML)
	#[arg(long, global = true, value_name = "PATH", env = "TODO_SETTINGS")]
	settings: Option<PathBuf>,

	/// Database URL, overriding settings and DATABASE_URL
	#[arg(long, global = true, value_name = "URL")]
	database: Option<String>,

	/// Directory of JSON migration records (`<app>/<name>.json`)
	#[arg(long, global = true, value_name = "DIR", env = "TODO_MIGRATIONS_DIR")]
	migrations_dir: Option<PathBuf>,

	/// Verbosity level (can be repeated for more output)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	verbosity: u8,
}

#[derive(Subcommand)]
enum Commands {
	/// Apply database migrations
	Migrate {
		/// Show migration plan without applying
		#[arg(long)]
		plan: bool,
	},

	/// List migrations and whether they are applied
	Showmigrations,

	/// Print the SQL of a migration
	Sqlmigrate {
		#[arg(value_name = "APP_LABEL")]
		app_label: String,

		#[arg(value_name = "MIGRATION_NAME")]
		migration_name: String,
	},

	/// Print a migration record as JSON
	Dumpmigration {
		#[arg(value_name = "APP_LABEL")]
		app_label: String,

		#[arg(value_name = "MIGRATION_NAME")]
		migration_name: String,

		/// Write to a file instead of stdout or the migrations directory
		#[arg(short, long, value_name = "PATH")]
		output: Option<PathBuf>,
	},
}

#[tokio::main]
async fn main() {
	let cli = Cli::parse();

	if let Err(e) = run(cli).await {
		eprintln!("{}", style(format!("Error: {:#}", e)).red().bold());
		process::exit(1);
	}
}

async fn run(cli: Cli) -> anyhow::Result<()> {
	let mut settings = Settings::load(cli.settings.as_deref()).context("failed to load settings")?;
	match cli.verbosity {
		0 => {}
		1 => settings.logging.level = "debug".to_string(),
		_ => settings.logging.level = "trace".to_string(),
	}
	init_logging(&settings.logging)?;

	let database_url = match cli.database {
		Some(url) => url,
		None => settings.database_url()?,
	};
	let migrations = commands::collect_migrations(all_migrations(), cli.migrations_dir.as_deref())
		.context("failed to load migrations")?;

	match cli.command {
		Commands::Migrate { plan } => {
			let connection = connect(&database_url).await?;
			if plan {
				let pending = commands::migrate_plan(connection, &migrations).await?;
				println!("{}", style("Planned operations:").cyan().bold());
				if pending.is_empty() {
					println!("  No planned migration operations.");
				}
				for migration in &pending {
					println!("  {}", style(migration.id()).yellow());
					for op in &migration.operations {
						println!("    {}", op.describe());
					}
				}
				return Ok(());
			}

			println!("{}", style("Running migrations:").cyan().bold());
			let result = commands::migrate(connection, &migrations).await?;
			if result.applied.is_empty() {
				println!("  No migrations to apply.");
			}
			for id in &result.applied {
				println!("  Applying {}... {}", id, style("OK").green());
			}
		}
		Commands::Showmigrations => {
			let connection = connect(&database_url).await?;
			let statuses = commands::show_migrations(connection, &migrations).await?;
			let mut current_app = None;
			for status in &statuses {
				if current_app != Some(&status.app_label) {
					println!("{}", style(&status.app_label).bold());
					current_app = Some(&status.app_label);
				}
				let mark = if status.applied {
					style("[X]").green()
				} else {
					style("[ ]").dim()
				};
				println!(" {} {}", mark, status.name);
			}
		}
		Commands::Sqlmigrate {
			app_label,
			migration_name,
		} => {
			let Some(database_type) = DatabaseType::from_url(&database_url) else {
				bail!("unsupported database URL: {database_url}");
			};
			let migration = commands::find_migration(&migrations, &app_label, &migration_name)?;
			println!("{}", commands::sql_migrate(migration, database_type));
		}
		Commands::Dumpmigration {
			app_label,
			migration_name,
			output,
		} => {
			let migration = commands::find_migration(&migrations, &app_label, &migration_name)?;
			let output = output.or_else(|| {
				cli.migrations_dir
					.as_deref()
					.map(|dir| commands::migration_path(dir, migration))
			});
			println!("{}", commands::dump_migration(migration, output.as_deref())?);
		}
	}

	Ok(())
}

async fn connect(database_url: &str) -> anyhow::Result<DatabaseConnection> {
	DatabaseConnection::connect(database_url)
		.await
		.with_context(|| format!("failed to connect to {database_url}"))
}
