use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use kb_migrate::config::{Overrides, Settings};
use kb_migrate::document::{DocumentStore, OutlineClient};
use kb_migrate::hierarchy::Hierarchy;
use kb_migrate::ledger::Ledger;
use kb_migrate::migrate::{MigrationOptions, Migrator, RunOutcome};
use kb_migrate::translate::OpenAiTranslator;
use kb_migrate::ui;

/// Exit status when the estimate exceeds the spending limit.
const EXIT_BUDGET_REJECTED: u8 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "kb-migrate",
    version,
    about = "Copy a knowledge base collection into another, translating every document"
)]
struct Cli {
    /// Settings file (defaults to ./kb-migrate.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Translate the next batch of new or modified documents
    Run(RunArgs),
    /// Print the cost estimate of the next batch without translating
    Estimate(EstimateArgs),
    /// Print the document hierarchy of a collection
    Tree(TreeArgs),
    /// Inspect or prune the translation ledger
    Ledger {
        #[command(subcommand)]
        command: LedgerCommand,
    },
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Source collection id
    #[arg(long)]
    source: Option<String>,
    /// Destination collection id
    #[arg(long)]
    destination: Option<String>,
    /// Maximum documents to translate in this run
    #[arg(long, value_name = "N")]
    batch_size: Option<usize>,
    /// Spending limit in USD for this run
    #[arg(long, value_name = "USD")]
    max_spending: Option<f64>,
    /// Translate one document as a sample and simulate the rest
    #[arg(long)]
    dry_run: bool,
    /// Translate text even when it already looks like the target language
    #[arg(long)]
    force: bool,
}

#[derive(Debug, Args)]
struct EstimateArgs {
    #[arg(long)]
    source: Option<String>,
    #[arg(long, value_name = "N")]
    batch_size: Option<usize>,
}

#[derive(Debug, Args)]
struct TreeArgs {
    /// Collection to print (defaults to the source collection)
    #[arg(long)]
    collection: Option<String>,
}

#[derive(Debug, Subcommand)]
enum LedgerCommand {
    /// List every recorded translation
    List,
    /// Show the entry for a source document
    Show { id: String },
    /// Forget a source document so the next run translates it again
    Remove { id: String },
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let overrides = match &cli.command {
        Commands::Run(args) => Overrides {
            source_collection: args.source.clone(),
            destination_collection: args.destination.clone(),
            batch_size: args.batch_size,
            max_spending: args.max_spending,
            dry_run: args.dry_run,
            force_translate: args.force,
        },
        Commands::Estimate(args) => Overrides {
            source_collection: args.source.clone(),
            batch_size: args.batch_size,
            ..Overrides::default()
        },
        Commands::Tree(_) | Commands::Ledger { .. } => Overrides::default(),
    };
    let settings = Settings::load(cli.config.as_deref(), &overrides)?;
    debug!(?settings.ledger_path, model = %settings.model, "Loaded settings");
    let color = ui::stdout_supports_color();

    match cli.command {
        Commands::Run(_) => run_migration(&settings, color).await,
        Commands::Estimate(_) => estimate(&settings, color).await,
        Commands::Tree(args) => tree(&settings, args.collection, color).await,
        Commands::Ledger { command } => ledger(&settings, command, color),
    }
}

fn outline(settings: &Settings) -> Result<OutlineClient> {
    Ok(OutlineClient::new(&settings.api_url, settings.api_token()?))
}

fn options(settings: &Settings) -> Result<MigrationOptions> {
    // `estimate` does not need a destination.
    let destination = settings.destination_collection.clone().unwrap_or_default();
    Ok(MigrationOptions::new(settings.source_collection()?, destination)
        .with_batch_size(settings.batch_size)
        .with_budget(settings.budget())
        .with_dry_run(settings.dry_run)
        .with_force_translate(settings.force_translate)
        .with_delay(settings.request_delay()))
}

fn open_ledger(settings: &Settings) -> Result<Ledger> {
    Ledger::load(settings.ledger_path.clone())
        .with_context(|| format!("Failed to open ledger {}", settings.ledger_path.display()))
}

async fn run_migration(settings: &Settings, color: bool) -> Result<ExitCode> {
    settings.destination_collection()?;
    let store = outline(settings)?;
    let translator = OpenAiTranslator::new(
        &settings.translation_api_url,
        settings.translation_api_key()?,
        &settings.model,
        &settings.target_language,
    );
    let mut ledger = open_ledger(settings)?;

    let migrator = Migrator::new(&store, &translator, options(settings)?)
        .with_progress(ui::batch_progress());
    let report = migrator.run(&mut ledger).await?;
    print!("{}", ui::render_report(&report, color));

    Ok(match report.outcome {
        RunOutcome::BudgetRejected { .. } => ExitCode::from(EXIT_BUDGET_REJECTED),
        RunOutcome::Aborted { reason } => {
            eprintln!("Error: {reason}");
            ExitCode::FAILURE
        }
        RunOutcome::Completed | RunOutcome::NothingToDo => ExitCode::SUCCESS,
    })
}

async fn estimate(settings: &Settings, color: bool) -> Result<ExitCode> {
    let store = outline(settings)?;
    // Never called while estimating.
    let translator = OpenAiTranslator::new(
        &settings.translation_api_url,
        settings.translation_api_key.clone().unwrap_or_default(),
        &settings.model,
        &settings.target_language,
    );
    let ledger = open_ledger(settings)?;

    let report = Migrator::new(&store, &translator, options(settings)?)
        .estimate(&ledger)
        .await?;
    print!("{}", ui::render_estimate(&report, color));
    Ok(ExitCode::SUCCESS)
}

async fn tree(settings: &Settings, collection: Option<String>, color: bool) -> Result<ExitCode> {
    let collection = match collection {
        Some(collection) => collection,
        None => settings.source_collection()?.to_string(),
    };
    let store = outline(settings)?;
    let ledger = open_ledger(settings)?;

    let documents = store
        .list_documents(&collection)
        .await
        .with_context(|| format!("Failed to fetch collection {collection}"))?;
    let hierarchy = Hierarchy::build(documents);
    print!("{}", ui::render_tree(&hierarchy, &ledger, color));
    Ok(ExitCode::SUCCESS)
}

fn ledger(settings: &Settings, command: LedgerCommand, color: bool) -> Result<ExitCode> {
    let mut ledger = open_ledger(settings)?;

    match command {
        LedgerCommand::List => print!("{}", ui::render_ledger(&ledger.list_all(), color)),
        LedgerCommand::Show { id } => match ledger.get(&id) {
            Some(entry) => print!("{}", ui::render_ledger_entry(&id, entry, color)),
            None => bail!("No ledger entry for '{id}'"),
        },
        LedgerCommand::Remove { id } => match ledger.remove(&id)? {
            Some(entry) => println!(
                "Removed '{}' ({id}); its translation {} was left in place",
                entry.source_title, entry.destination_id
            ),
            None => bail!("No ledger entry for '{id}'"),
        },
    }
    Ok(ExitCode::SUCCESS)
}
