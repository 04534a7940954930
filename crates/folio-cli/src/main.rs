use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use folio_common::config::FileStore;
use folio_common::store::DirStore;
use folio_common::telemetry::{self, TelemetryConfig};
use folio_common::{Config, DocumentStore};
use folio_editor_core::{prepare_body, slugify};
use folio_editor_sync::{
    Document, DocumentKind, DocumentStatus, EditorSession, Reference, SessionOptions,
    list_documents, read_body,
};
use miette::{IntoDiagnostic, Result};

#[derive(Parser)]
#[command(version, about = "Folio - draft, normalize and publish posts against a local document store", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a .json or .toml config file
    #[arg(long, env = "FOLIO_CONFIG")]
    config: Option<PathBuf>,

    /// Store directory (overrides the config file and FOLIO_STORE_DIR)
    #[arg(long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new draft
    New {
        /// `post` or `page` (defaults to the configured kind)
        #[arg(long)]
        kind: Option<DocumentKind>,

        #[arg(long)]
        title: Option<String>,

        /// Author document id; repeat for several authors
        #[arg(long = "author")]
        authors: Vec<String>,
    },
    /// Print the slug derived from a title
    Slug { title: String },
    /// Normalize a JSON array of blocks the way a save does
    Normalize {
        /// Input file (reads stdin when omitted)
        file: Option<PathBuf>,
    },
    /// Publish a document, preferring its draft
    Publish { id: String },
    /// List documents with their publish status
    List {
        #[arg(long)]
        kind: Option<DocumentKind>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_miette();
    telemetry::init(TelemetryConfig::from_env("folio"));

    let cli = Cli::parse();
    let config = load_config(&cli).await?;
    tracing::debug!(store = %config.store_dir.display(), dataset = %config.dataset, "loaded config");

    match cli.command {
        Commands::New {
            kind,
            title,
            authors,
        } => {
            let kind = kind.unwrap_or(default_kind(&config)?);
            new_document(&config, kind, title, authors).await?;
        }
        Commands::Slug { title } => println!("{}", slugify(&title)),
        Commands::Normalize { file } => normalize(file)?,
        Commands::Publish { id } => publish(&config, &id).await?,
        Commands::List { kind } => {
            let kind = kind.unwrap_or(default_kind(&config)?);
            list(&config, kind).await?;
        }
    }

    Ok(())
}

async fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load(&FileStore::new(path)).await?,
        None => Config::default(),
    };
    let mut config = config.with_env()?;
    if let Some(store) = &cli.store {
        config.store_dir = store.clone();
    }
    Ok(config)
}

fn default_kind(config: &Config) -> Result<DocumentKind> {
    config
        .default_kind
        .parse()
        .map_err(|message: String| miette::miette!("invalid defaultKind in config: {message}"))
}

fn store(config: &Config) -> Result<Arc<DirStore>> {
    Ok(Arc::new(DirStore::new(config.dataset_dir()?)))
}

async fn new_document(
    config: &Config,
    kind: DocumentKind,
    title: Option<String>,
    authors: Vec<String>,
) -> Result<()> {
    let store = store(config)?;
    let mut document = Document::new(kind);
    if let Some(title) = title {
        document.slug = slugify(&title);
        document.title = title;
    }
    document.authors = authors.into_iter().map(Reference::new).collect();

    store.commit(document.draft_transaction()?).await?;
    println!("✓ Created {kind} draft {}", document.id);
    Ok(())
}

fn normalize(file: Option<PathBuf>) -> Result<()> {
    let input = match &file {
        Some(path) => std::fs::read_to_string(path).into_diagnostic()?,
        None => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input).into_diagnostic()?;
            input
        }
    };
    let value: serde_json::Value = serde_json::from_str(&input).into_diagnostic()?;
    let label = file
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "stdin".to_owned());

    let blocks = read_body(&label, Some(value));
    let output = serde_json::to_string_pretty(&prepare_body(&blocks)).into_diagnostic()?;
    println!("{output}");
    Ok(())
}

async fn publish(config: &Config, id: &str) -> Result<()> {
    let session = EditorSession::open(store(config)?, id, SessionOptions::from(config)).await;
    let mut session = session?;
    let published_at = session.publish().await;
    let id = session.document().published_id();
    session.shutdown().await;

    let published_at = published_at?;
    println!("✓ Published {id} at {published_at}");
    Ok(())
}

async fn list(config: &Config, kind: DocumentKind) -> Result<()> {
    let summaries = list_documents(store(config)?.as_ref(), kind).await?;
    if summaries.is_empty() {
        println!("No {kind}s yet");
        return Ok(());
    }
    for summary in summaries {
        let status = match summary.status {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Published => "published",
            DocumentStatus::PublishedWithChanges => "changed",
        };
        let title = if summary.title.is_empty() {
            "(untitled)"
        } else {
            summary.title.as_str()
        };
        println!("{:<10} {:<38} {title} /{}", status, summary.id, summary.slug);
    }
    Ok(())
}

fn init_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .ok();
    miette::set_panic_hook();
}
