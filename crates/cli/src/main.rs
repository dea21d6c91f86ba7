use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use libmanager_app::{BookId, BookPatch, BookRecord, BookStore, NewBook};
use libmanager_kernel::settings::{LogFormat, Settings, TelemetrySettings};

const DEFAULT_CATALOG: &str = "catalog.json";

/// Manage a LibManager book catalog.
#[derive(Debug, Parser)]
#[command(name = "libmanager", version, about)]
struct Cli {
    /// Catalog snapshot to operate on; defaults to `catalog.snapshot_path`
    /// from the settings, then `catalog.json`.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    #[command(flatten)]
    Catalog(CatalogCommand),
}

/// Commands that read or edit the catalog snapshot directly
#[derive(Debug, Subcommand)]
enum CatalogCommand {
    /// Add a book to the catalog
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        isbn: Option<String>,
    },
    /// Print every book, one JSON object per line
    List,
    /// Print a single book
    Show { id: u64 },
    /// Change fields of a book
    Update(UpdateArgs),
    /// Delete a book
    Remove { id: u64 },
}

#[derive(Debug, Args)]
struct UpdateArgs {
    id: u64,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    author: Option<String>,
    /// New ISBN; pass an empty string to clear it
    #[arg(long)]
    isbn: Option<String>,
    /// Mark the book as issued (`true`) or returned (`false`)
    #[arg(long)]
    issued: Option<bool>,
}

impl UpdateArgs {
    fn into_patch(self) -> BookPatch {
        BookPatch {
            title: self.title,
            author: self.author,
            isbn: self.isbn.map(Some),
            is_issued: self.issued,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load LibManager settings")?;

    match cli.command {
        Command::Serve => {
            libmanager_telemetry::init(&settings.telemetry)?;
            let mut settings = settings;
            if let Some(path) = cli.catalog {
                settings.catalog.snapshot_path = Some(path);
            }
            tokio::runtime::Runtime::new()
                .context("failed to start tokio runtime")?
                .block_on(libmanager_app::app::run(settings))
        }
        Command::Catalog(command) => {
            // Keep stdout clean for JSON output; only warnings go to stderr.
            libmanager_telemetry::init(&TelemetrySettings {
                log_format: LogFormat::Pretty,
                level: "warn".to_string(),
            })?;
            let path = cli
                .catalog
                .or(settings.catalog.snapshot_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG));
            let store = BookStore::open(&path)
                .with_context(|| format!("failed to open catalog at {}", path.display()))?;
            run_catalog_command(&store, command)
        }
    }
}

fn run_catalog_command(store: &BookStore, command: CatalogCommand) -> anyhow::Result<()> {
    match command {
        CatalogCommand::Add {
            title,
            author,
            isbn,
        } => {
            let mut book = NewBook::new(title, author);
            book.isbn = isbn;
            print_book(&store.create(book)?)
        }
        CatalogCommand::List => store.list().iter().try_for_each(print_book),
        CatalogCommand::Show { id } => print_book(&store.get(BookId(id))?),
        CatalogCommand::Update(args) => {
            let id = BookId(args.id);
            let patch = args.into_patch();
            if patch.is_empty() {
                anyhow::bail!(
                    "nothing to update; pass at least one of --title, --author, --isbn, --issued"
                );
            }
            print_book(&store.update(id, patch)?)
        }
        CatalogCommand::Remove { id } => print_book(&store.delete(BookId(id))?),
    }
}

fn print_book(book: &BookRecord) -> anyhow::Result<()> {
    let line = serde_json::to_string(book).context("failed to encode book")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}").context("failed to write to stdout")?;
    Ok(())
}
