use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ledger_console::client::{LedgerClient, ListQuery};
use ledger_console::config::Config;
use ledger_console::form::{FormController, RenderState, SubmitError, UpdatePage};
use ledger_console::resource::{
    codec, get_resource, ActionTable, FieldKind, FormStateStore, ResourceItem, ResourceKind,
};
use ledger_console::router::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Administrative console for a ledger service
#[derive(Parser, Debug)]
#[command(name = "ledger-console", version = ledger_console::VERSION, about, long_about = None)]
struct Args {
    /// Ledger URL (overrides LEDGER_CONSOLE_URL and the config file)
    #[arg(short, long)]
    url: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List accounts or assets (every kind when omitted)
    List {
        kind: Option<ResourceKind>,
        /// Ledger filter expression, e.g. "alias='treasury'"
        #[arg(long)]
        filter: Option<String>,
        /// Cursor returned by a previous page
        #[arg(long)]
        after: Option<String>,
        #[arg(long)]
        page_size: Option<u32>,
        /// Sort key (defaults to the kind's default)
        #[arg(long)]
        sort_by: Option<String>,
        /// Follow cursors until the last page
        #[arg(long)]
        all: bool,
    },
    /// Create a new item
    Create {
        kind: ResourceKind,
        /// Field value as name=value; may be repeated
        #[arg(short = 'f', long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Show the update form of an item, pre-filled
    Edit { kind: ResourceKind, id: String },
    /// Update an existing item
    Update {
        kind: ResourceKind,
        id: String,
        #[arg(short = 'f', long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Create a receiver for an account
    CreateReceiver {
        account_id: String,
        #[arg(long)]
        expires_in_hours: Option<i64>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got '{}'", s))
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {:?}: {}", log_path, e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("ledger-console started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("ledger-console").join("ledger-console.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".ledger-console").join("ledger-console.log");
    }
    PathBuf::from("ledger-console.log")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let mut config = Config::load();
    let url = config.effective_url(args.url.as_deref());
    tracing::info!("Using ledger at {}", url);

    let client = Arc::new(LedgerClient::new(&url)?);
    let table = ActionTable::new(client, Arc::new(FormStateStore::new()));
    let router = Arc::new(Router::new());

    match args.command {
        Command::List {
            kind,
            filter,
            after,
            page_size,
            sort_by,
            all,
        } => {
            let query = ListQuery {
                filter,
                sort_by,
                page_size: page_size.or(config.page_size),
                ..ListQuery::default()
            }
            .after(after);
            list(&table, &mut config, kind, &query, all).await
        }
        Command::Create { kind, fields } => {
            let form = FormController::for_create(table.get(kind), router.clone());
            submit_form(&form, &fields, &router).await
        }
        Command::Edit { kind, id } => {
            let form = load_update_form(&table, kind, &id, router.clone()).await?;
            print_form(&form);
            Ok(())
        }
        Command::Update { kind, id, fields } => {
            let form = load_update_form(&table, kind, &id, router.clone()).await?;
            submit_form(&form, &fields, &router).await
        }
        Command::CreateReceiver {
            account_id,
            expires_in_hours,
        } => {
            let expires_at = expires_in_hours
                .map(|hours| (chrono::Utc::now() + chrono::Duration::hours(hours)).to_rfc3339());
            let receiver = table
                .receivers()
                .create(&account_id, expires_at.as_deref())
                .await
                .context("Failed to create receiver")?;
            println!("{}", codec::decode_value(&receiver));
            Ok(())
        }
    }
}

async fn list(
    table: &ActionTable,
    config: &mut Config,
    kind: Option<ResourceKind>,
    query: &ListQuery,
    all: bool,
) -> Result<()> {
    let kinds: Vec<ResourceKind> = match kind {
        Some(kind) => vec![kind],
        None => ResourceKind::ALL.to_vec(),
    };

    let pages = futures::future::try_join_all(kinds.iter().map(|kind| async move {
        let actions = &table.get(*kind).list;
        if all {
            Ok::<_, anyhow::Error>((actions.fetch_all(query).await?, None))
        } else {
            let page = actions.fetch_page(query).await?;
            let cursor = if page.last_page { None } else { page.cursor };
            Ok((page.items, cursor))
        }
    }))
    .await?;

    for (kind, (items, cursor)) in kinds.iter().zip(pages) {
        print_items(*kind, &items);
        if let Some(cursor) = cursor {
            println!("  more: --after {}", cursor);
        }
    }

    if let Some(kind) = kind {
        if let Err(e) = config.set_last_resource(kind.as_str()) {
            tracing::warn!("Failed to save config: {}", e);
        }
    }
    Ok(())
}

fn print_items(kind: ResourceKind, items: &[ResourceItem]) {
    println!("{} ({})", get_resource(kind).display_name, items.len());
    for item in items {
        println!(
            "  {:<36} {:<20} {}",
            item.id,
            item.alias.as_deref().unwrap_or("-"),
            serde_json::Value::Object(item.tags.clone())
        );
    }
}

async fn load_update_form(
    table: &ActionTable,
    kind: ResourceKind,
    id: &str,
    router: Arc<Router>,
) -> Result<FormController> {
    let mut page = UpdatePage::new(kind, id);
    page.load(table)
        .await
        .with_context(|| format!("Failed to load {} {}", kind, id))?;

    if let RenderState::NotFound = page.state() {
        anyhow::bail!("Couldn't find {} {}", kind, id);
    }
    page.form(table, router)
        .with_context(|| format!("{} {} is not loaded", kind, id))
}

fn print_form(form: &FormController) {
    println!("{}", form.title());
    for field in form.fields() {
        let value = form.value(&field.name).unwrap_or_default();
        match field.kind {
            FieldKind::Json => {
                println!("{} ({}px):", field.label(), form.editor_height(&field.name));
                println!("{}", value);
            }
            FieldKind::String | FieldKind::Integer => println!("{}: {}", field.label(), value),
        }
    }
}

async fn submit_form(
    form: &FormController,
    fields: &[(String, String)],
    router: &Router,
) -> Result<()> {
    for (name, value) in fields {
        if !form.fields().iter().any(|field| &field.name == name) {
            anyhow::bail!("{} form has no field '{}'", form.kind(), name);
        }
        form.set_value(name, value);
    }

    match form.submit().await {
        Ok(navigation) => {
            if let Some(flash) = router.current_flash() {
                println!("{}", flash);
            }
            println!("-> {}", navigation.path);
            Ok(())
        }
        Err(SubmitError::Invalid(errors)) => {
            for error in errors.iter() {
                eprintln!("  {}", error);
            }
            Err(SubmitError::Invalid(errors).into())
        }
        Err(e) => Err(e.into()),
    }
}
