mod config;
mod dataset;
mod helpers;
mod mcp;
mod menu;
mod repositories;
mod service;
mod tools;
mod updater;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use config::Settings;
use dataset::{FileBackend, reformat, seal, verify_local};
use mcp::RecipeTools;
use repositories::RecipeRepository;
use service::{RecipeService, UpdateTarget};
use updater::{HttpSource, RemoteUpdater};

const DEFAULT_SETTINGS_PATH: &str = "resource/settings.json";

#[derive(Parser, Debug)]
#[command(
    name = "recipe-db",
    version,
    about = "Query and refresh the OpenRewrite recipes database"
)]
struct Cli {
    /// Settings file (JSON); missing means defaults
    #[arg(
        long,
        global = true,
        env = "RECIPE_DB_CONFIG",
        default_value = DEFAULT_SETTINGS_PATH
    )]
    config: PathBuf,

    /// Dataset to query, overriding the settings
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Parse the dataset incrementally
    #[arg(long, global = true)]
    streaming: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all categories
    Categories,
    /// List categories with their subcategories
    CategoriesTree,
    /// List the subcategories of a category
    Subcategories { category: String },
    /// Recipes of a category, optionally narrowed to a subcategory
    ByCategory {
        category: String,
        #[arg(long)]
        subcategory: Option<String>,
    },
    /// Recipes carrying a tag
    ByTag { tag: String },
    /// Recipes whose name contains the query
    ByName { query: String },
    /// Recipe with this exact id
    ById { id: String },
    /// Recipes whose dependency contains the query
    ByDependency { query: String },
    /// Download, verify and install the published database
    Update,
    /// Check the local database against its .sha256 file
    Verify,
    /// Write the .sha256 file for the local database
    Seal {
        /// Rewrite the database pretty printed first
        #[arg(long)]
        pretty: bool,
    },
    /// Describe the available tools and their argument schemas
    Tools,
    /// Serve the tools over MCP on stdin/stdout
    Serve,
    /// Run a tool by name with JSON arguments
    Tool {
        name: String,
        /// JSON object with the tool arguments
        args: Option<String>,
    },
    /// Interactive menu (default)
    Menu,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::from_file(&cli.config)
        .with_context(|| format!("load settings from {}", cli.config.display()))?
        .with_env()
        .context("apply environment overrides")?;

    if let Some(db) = &cli.db {
        settings.dataset_path = db.clone();
    }
    if cli.streaming {
        settings.streaming = true;
    }
    Ok(settings)
}

fn build_service(settings: &Settings) -> Result<RecipeService<FileBackend, HttpSource>> {
    let backend = FileBackend::open(settings.dataset_path.clone(), settings.streaming);
    let repository = RecipeRepository::new(backend);
    let source = HttpSource::new(settings.timeout())
        .context("build HTTP client")?
        .with_progress(std::io::stderr().is_terminal());
    let target = UpdateTarget {
        dataset_url: settings.dataset_url.clone(),
        checksum_url: settings.checksum_url.clone(),
        dest_dir: settings.dest_dir.clone(),
    };
    Ok(RecipeService::new(repository, RemoteUpdater::new(source), target))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value).context("encode result")?);
    Ok(())
}

#[derive(Serialize)]
struct VerifyReport {
    path: String,
    expected: Option<String>,
    actual: String,
    matches: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = load_settings(&cli)?;
    let svc = build_service(&settings)?;

    match cli.command.unwrap_or(Command::Menu) {
        Command::Categories => print_json(&svc.list_categories())?,
        Command::CategoriesTree => print_json(&svc.list_categories_with_subcategories())?,
        Command::Subcategories { category } => {
            print_json(&svc.list_subcategories(Some(&category)))?
        }
        Command::ByCategory { category, subcategory } => {
            print_json(&svc.find_by_category(Some(&category), subcategory.as_deref()))?
        }
        Command::ByTag { tag } => print_json(&svc.find_by_tag(Some(&tag)))?,
        Command::ByName { query } => print_json(&svc.find_by_name(Some(&query)))?,
        Command::ById { id } => print_json(&svc.find_by_id(Some(&id)))?,
        Command::ByDependency { query } => {
            print_json(&svc.find_by_dependency(Some(&query)))?
        }
        Command::Update => {
            let outcome = svc.update_database().await;
            print_json(&outcome)?;
            if !outcome.success {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Verify => {
            let path = &settings.dataset_path;
            let digest =
                verify_local(path).with_context(|| format!("hash {}", path.display()))?;
            let matches = digest.matches();
            print_json(&VerifyReport {
                path: path.display().to_string(),
                expected: digest.expected,
                actual: digest.actual,
                matches,
            })?;
            if !matches {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Seal { pretty } => {
            let path = &settings.dataset_path;
            let sidecar = if pretty {
                reformat(path).with_context(|| format!("rewrite {}", path.display()))?
            } else {
                seal(path).with_context(|| format!("write checksum for {}", path.display()))?
            };
            println!("{}", sidecar.display());
        }
        Command::Tools => print_json(&RecipeTools::<FileBackend, HttpSource>::catalog())?,
        Command::Serve => mcp::serve_stdio(svc).await?,
        Command::Tool { name, args } => {
            let args: Value = match args {
                Some(text) => serde_json::from_str(&text).context("parse tool arguments")?,
                None => Value::Object(Default::default()),
            };
            let text = tools::call_by_name(&svc, &name, &args).await?;
            println!("{text}");
        }
        Command::Menu => menu::run(&svc).await?,
    }

    Ok(ExitCode::SUCCESS)
}
