// src/main.rs

use anyhow::Result;
use clap::{Parser, Subcommand};
use release_line::db::SqliteStore;
use release_line::{
    AddDependent, CreateRelease, DependentQuery, DependentSpec, ReleaseLine, ReleaseQuery,
    RemoveDependents, VersionSelector,
};
use serde::Serialize;
use tracing::info;

const DEFAULT_DB_PATH: &str = "/var/lib/release-line/release-line.db";

#[derive(Parser)]
#[command(name = "release-line")]
#[command(author, version, about = "Track package release lines and their dependents", long_about = None)]
struct Cli {
    /// Database path
    #[arg(short, long, global = true, env = "RELEASE_LINE_DB", default_value = DEFAULT_DB_PATH)]
    db_path: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the release-line database
    Init,
    /// Create a release, moving the package head to it
    Create {
        /// Package name
        pkg: String,
        /// Version being released
        version: String,
        /// Previous version (default: the current head)
        #[arg(short, long)]
        previous: Option<String>,
        /// Dependent built against this release, as NAME@VERSION (repeatable)
        #[arg(long = "dependent", value_name = "NAME@VERSION", value_parser = parse_dependent_spec)]
        dependents: Vec<DependentSpec>,
    },
    /// Show a release with its dependents
    Get {
        /// Package name
        pkg: String,
        /// Release version (default: latest)
        #[arg(long = "at", value_name = "VERSION")]
        at: Option<String>,
    },
    /// Show the head of a package
    Head {
        /// Package name
        pkg: String,
    },
    /// Delete a release and its dependents (the head is left untouched)
    Delete {
        /// Package name
        pkg: String,
        /// Release version (default: latest)
        #[arg(long = "at", value_name = "VERSION")]
        at: Option<String>,
    },
    /// Walk a release line backwards from a version
    History {
        /// Package name
        pkg: String,
        /// Starting version (default: latest)
        #[arg(long = "at", value_name = "VERSION")]
        at: Option<String>,
    },
    /// List every recorded version of a package
    Versions {
        /// Package name
        pkg: String,
    },
    /// List the heads of all packages
    Packages,
    /// Manage the dependents of a release
    Dependent {
        #[command(subcommand)]
        command: DependentCommands,
    },
}

#[derive(Subcommand)]
enum DependentCommands {
    /// Record a dependent against a release
    Add {
        /// Package name
        pkg: String,
        /// Dependent package name
        dependent: String,
        /// Dependent package version
        dependent_version: String,
        /// Release version (default: latest)
        #[arg(long = "at", value_name = "VERSION")]
        at: Option<String>,
    },
    /// Remove one dependent, or all dependents, of a release
    Remove {
        /// Package name
        pkg: String,
        /// Dependent package name (removes all if omitted)
        dependent: Option<String>,
        /// Release version (default: latest)
        #[arg(long = "at", value_name = "VERSION")]
        at: Option<String>,
    },
    /// List the dependents of a release
    List {
        /// Package name
        pkg: String,
        /// Release version (default: latest)
        #[arg(long = "at", value_name = "VERSION")]
        at: Option<String>,
    },
    /// Show one dependent of a release
    Get {
        /// Package name
        pkg: String,
        /// Dependent package name
        dependent: String,
        /// Release version (default: latest)
        #[arg(long = "at", value_name = "VERSION")]
        at: Option<String>,
    },
}

/// Parse a NAME@VERSION dependent argument
///
/// Splits on the last `@` so scoped names such as `@scope/pkg@1.0.0` work.
fn parse_dependent_spec(spec: &str) -> std::result::Result<DependentSpec, String> {
    match spec.rsplit_once('@') {
        Some((name, version)) if !name.is_empty() && !version.is_empty() => {
            Ok(DependentSpec::new(name, version))
        }
        _ => Err(format!("Expected NAME@VERSION, got: {}", spec)),
    }
}

fn query(pkg: String, at: Option<String>) -> ReleaseQuery {
    ReleaseQuery {
        pkg,
        version: VersionSelector::from_option(at.as_deref()),
    }
}

fn open_release_line(db_path: &str) -> Result<ReleaseLine> {
    let store = SqliteStore::open(db_path)?;
    Ok(ReleaseLine::new(store.into_models()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_dependent(release: &ReleaseLine, command: DependentCommands) -> Result<()> {
    let dependents = release.dependent();

    match command {
        DependentCommands::Add {
            pkg,
            dependent,
            dependent_version,
            at,
        } => {
            let opts = AddDependent {
                pkg,
                version: VersionSelector::from_option(at.as_deref()),
                dependent,
                dependent_version,
            };
            print_json(&dependents.add(opts).await?)
        }
        DependentCommands::Remove { pkg, dependent, at } => {
            let opts = RemoveDependents {
                pkg,
                version: VersionSelector::from_option(at.as_deref()),
                dependent,
            };
            let removed = dependents.remove(opts).await?;
            println!("Removed {} dependent(s)", removed.len());
            Ok(())
        }
        DependentCommands::List { pkg, at } => {
            print_json(&dependents.list(query(pkg, at)).await?)
        }
        DependentCommands::Get {
            pkg,
            dependent,
            at,
        } => {
            let lookup = DependentQuery {
                pkg,
                version: VersionSelector::from_option(at.as_deref()),
                dependent,
            };
            print_json(&dependents.get(lookup).await?)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging; stdout is reserved for JSON output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let db_path = cli.db_path;

    match cli.command {
        Some(Commands::Init) => {
            info!("Initializing release-line database at: {}", db_path);
            release_line::db::init(&db_path)?;
            println!("Database initialized successfully at: {}", db_path);
            Ok(())
        }
        Some(Commands::Create {
            pkg,
            version,
            previous,
            dependents,
        }) => {
            let release = open_release_line(&db_path)?;
            let created = release
                .create(CreateRelease {
                    pkg,
                    version,
                    previous_version: previous,
                    dependents,
                })
                .await?;
            print_json(&created)
        }
        Some(Commands::Get { pkg, at }) => {
            let release = open_release_line(&db_path)?;
            print_json(&release.get(query(pkg, at)).await?)
        }
        Some(Commands::Head { pkg }) => {
            let release = open_release_line(&db_path)?;
            print_json(&release.head(&pkg).await?)
        }
        Some(Commands::Delete { pkg, at }) => {
            let release = open_release_line(&db_path)?;
            release.delete(query(pkg, at)).await?;
            println!("Release deleted");
            Ok(())
        }
        Some(Commands::History { pkg, at }) => {
            let release = open_release_line(&db_path)?;
            print_json(&release.history(query(pkg, at)).await?)
        }
        Some(Commands::Versions { pkg }) => {
            let release = open_release_line(&db_path)?;
            print_json(&release.versions(&pkg).await?)
        }
        Some(Commands::Packages) => {
            let release = open_release_line(&db_path)?;
            print_json(&release.packages().await?)
        }
        Some(Commands::Dependent { command }) => {
            let release = open_release_line(&db_path)?;
            run_dependent(&release, command).await
        }
        None => {
            // No command provided, show help
            println!("release-line v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'release-line --help' for usage information");
            Ok(())
        }
    }
}
