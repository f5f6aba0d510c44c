use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use scanmatch_core::config_file::{self, ConfigFile};
use scanmatch_core::{
    ChannelSource, Coordinator, DetectedCode, DetectionSignal, DocumentHandle, DocumentSource,
    MatchState, PdfBackend, PresentationState, ScannerConfig, Symbology, evaluate,
};
use scanmatch_pdf_mupdf::MupdfBackend;
use scanmatch_storage::{FirebaseClient, RemoteDocumentSource};

mod output;

use output::ColorMode;

/// Barcode-to-PDF match checker: cross-reference scanned codes against the
/// text of remotely hosted PDF documents
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the remotely hosted documents available for matching
    List {
        /// Storage bucket (overrides SCANMATCH_BUCKET and config file)
        #[arg(long)]
        bucket: Option<String>,

        /// Object-key prefix to list under
        #[arg(long)]
        prefix: Option<String>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Check a single code against one document
    Check {
        /// The scanned barcode payload
        code: String,

        /// Remote document name (as shown by `list`)
        #[arg(long)]
        document: Option<String>,

        /// Local PDF path instead of a remote document
        #[arg(long)]
        file: Option<PathBuf>,

        /// Storage bucket (overrides SCANMATCH_BUCKET and config file)
        #[arg(long)]
        bucket: Option<String>,

        /// Object-key prefix to list under
        #[arg(long)]
        prefix: Option<String>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Show the resolved configuration, or update the saved one
    Config {
        /// Save this storage bucket to the config file
        #[arg(long)]
        bucket: Option<String>,

        /// Save this object-key prefix to the config file
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Read detection events from stdin and report matches live
    Watch {
        /// Remote document to preselect
        #[arg(long)]
        document: Option<String>,

        /// Storage bucket (overrides SCANMATCH_BUCKET and config file)
        #[arg(long)]
        bucket: Option<String>,

        /// Object-key prefix to list under
        #[arg(long)]
        prefix: Option<String>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::List {
            bucket,
            prefix,
            no_color,
        } => list(bucket, prefix, no_color).await,
        Command::Check {
            code,
            document,
            file,
            bucket,
            prefix,
            no_color,
        } => check(code, document, file, bucket, prefix, no_color).await,
        Command::Config { bucket, prefix } => config(bucket, prefix),
        Command::Watch {
            document,
            bucket,
            prefix,
            no_color,
        } => watch(document, bucket, prefix, no_color).await,
    }
}

/// With no flags, print the resolved configuration. With flags, update the
/// platform config file and report where it was written.
fn config(bucket: Option<String>, prefix: Option<String>) -> anyhow::Result<()> {
    if bucket.is_none() && prefix.is_none() {
        let resolved = config_file::load_config();
        print!("{}", toml::to_string_pretty(&resolved)?);
        return Ok(());
    }

    // Edit the platform file directly; the CWD overlay stays untouched.
    let mut saved = config_file::config_path()
        .and_then(|p| config_file::load_from_path(&p))
        .unwrap_or_default();
    let storage = saved.storage.get_or_insert_with(Default::default);
    if let Some(bucket) = bucket {
        storage.bucket = Some(bucket);
    }
    if let Some(prefix) = prefix {
        storage.prefix = Some(prefix);
    }
    let path = config_file::save_config(&saved).map_err(anyhow::Error::msg)?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// Build the storage client: CLI flags > env vars > config file > defaults.
fn resolve_client(
    bucket: Option<String>,
    prefix: Option<String>,
    config: &ConfigFile,
) -> anyhow::Result<FirebaseClient> {
    let storage = config.storage.clone().unwrap_or_default();

    let bucket = bucket
        .or_else(|| std::env::var("SCANMATCH_BUCKET").ok())
        .or(storage.bucket)
        .context("no storage bucket configured (use --bucket, SCANMATCH_BUCKET, or the config file)")?;

    let mut client = FirebaseClient::new(bucket);
    if let Some(prefix) = prefix
        .or_else(|| std::env::var("SCANMATCH_PREFIX").ok())
        .or(storage.prefix)
    {
        client = client.with_prefix(prefix);
    }
    if let Some(retries) = storage.list_retries {
        client = client.with_list_retries(retries);
    }
    if let Some(secs) = storage.request_timeout_secs {
        client = client.with_timeout(Duration::from_secs(secs));
    }
    Ok(client)
}

fn find_document<'a>(
    handles: &'a [DocumentHandle],
    name: &str,
) -> anyhow::Result<&'a DocumentHandle> {
    handles.iter().find(|h| h.name == name).with_context(|| {
        if handles.is_empty() {
            format!("document \"{name}\" not found: the listing is empty")
        } else {
            format!(
                "document \"{name}\" not found; available: {}",
                handles
                    .iter()
                    .map(|h| h.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        }
    })
}

/// Process exit code for a final match state.
fn exit_code(state: Option<MatchState>) -> i32 {
    match state {
        Some(MatchState::Matched) => 0,
        Some(MatchState::Unmatched) => 1,
        _ => 2,
    }
}

/// Colored output unless disabled by flag or `[display]` config.
fn resolve_color(no_color: bool, config: &ConfigFile) -> ColorMode {
    let configured = config.display.as_ref().and_then(|d| d.color).unwrap_or(true);
    ColorMode(!no_color && configured)
}

/// Symbol families from `[scanner]` config; all families when unset.
fn resolve_scanner(config: &ConfigFile) -> ScannerConfig {
    match config.scanner.as_ref().and_then(|s| s.symbologies.clone()) {
        Some(families) => families
            .into_iter()
            .fold(ScannerConfig::none(), ScannerConfig::enable),
        None => ScannerConfig::default(),
    }
}

async fn list(bucket: Option<String>, prefix: Option<String>, no_color: bool) -> anyhow::Result<()> {
    let config = config_file::load_config();
    let color = resolve_color(no_color, &config);
    let client = resolve_client(bucket, prefix, &config)?;
    let handles = client.list().await.context("listing documents")?;
    let mut stdout = std::io::stdout().lock();
    output::print_document_list(&mut stdout, &handles, None, color)?;
    Ok(())
}

async fn check(
    code: String,
    document: Option<String>,
    file: Option<PathBuf>,
    bucket: Option<String>,
    prefix: Option<String>,
    no_color: bool,
) -> anyhow::Result<()> {
    let config = config_file::load_config();
    let color = resolve_color(no_color, &config);
    let snapshot = match (document, file) {
        (_, Some(path)) => check_local(code, path).await,
        (Some(name), None) => check_remote(code, name, bucket, prefix, &config).await?,
        (None, None) => bail!("pass either --document <name> or --file <path>"),
    };

    let mut stdout = std::io::stdout().lock();
    output::print_banner(&mut stdout, &snapshot, color)?;
    stdout.flush()?;
    std::process::exit(exit_code(snapshot.state));
}

/// One-shot evaluation against a local PDF, bypassing remote storage.
async fn check_local(code: String, path: PathBuf) -> PresentationState {
    let text = tokio::task::spawn_blocking(move || MupdfBackend::new().extract_text(&path))
        .await
        .ok()
        .and_then(|result| match result {
            Ok(text) => Some(text),
            Err(error) => {
                tracing::warn!(%error, "text extraction failed; treating document as having no text");
                None
            }
        });
    let state = evaluate(Some(&code), text.as_deref());
    PresentationState {
        detected: Some(DetectedCode::new(code)),
        selected: None,
        state,
    }
}

async fn check_remote(
    code: String,
    name: String,
    bucket: Option<String>,
    prefix: Option<String>,
    config: &ConfigFile,
) -> anyhow::Result<PresentationState> {
    let client = resolve_client(bucket, prefix, config)?;
    let documents: Arc<dyn DocumentSource> =
        Arc::new(RemoteDocumentSource::new(client, MupdfBackend::new()));

    let handles = documents.list().await.context("listing documents")?;
    let handle = find_document(&handles, &name)?.clone();

    let coordinator = Coordinator::new(documents);
    coordinator
        .select_document(handle)
        .await
        .context("extraction task panicked")?;
    coordinator.on_barcode_detected(code);
    Ok(coordinator.current())
}

async fn watch(
    document: Option<String>,
    bucket: Option<String>,
    prefix: Option<String>,
    no_color: bool,
) -> anyhow::Result<()> {
    let config = config_file::load_config();
    let color = resolve_color(no_color, &config);
    let scanner = resolve_scanner(&config);
    let client = resolve_client(bucket, prefix, &config)?;
    let documents: Arc<dyn DocumentSource> =
        Arc::new(RemoteDocumentSource::new(client, MupdfBackend::new()));
    let handles = documents.list().await.context("listing documents")?;

    // Terminal bell on every detection event, match or not — the haptic
    // feedback stand-in.
    let signal: DetectionSignal = Arc::new(|_code: &str| {
        eprint!("\x07");
    });
    let coordinator = Coordinator::with_signal(documents, signal);

    if let Some(name) = document {
        let handle = find_document(&handles, &name)?.clone();
        // Extraction completes in the background; the watch loop below
        // prints the state change when it lands.
        let _ = coordinator.select_document(handle);
    }

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        ctrl_c_cancel.cancel();
    });

    let (detections, barcode_source) = ChannelSource::new();
    let driver = coordinator
        .attach_source(&barcode_source, cancel.clone())
        .context("attaching the detection stream")?;

    let mut stdout = std::io::stdout().lock();
    output::print_document_list(
        &mut stdout,
        &handles,
        coordinator.current().selected.as_ref().map(|h| h.name.as_str()),
        color,
    )?;
    let families: Vec<&str> = Symbology::ALL
        .into_iter()
        .filter(|s| scanner.is_enabled(*s))
        .map(|s| s.name())
        .collect();
    writeln!(stdout, "Decoding: {}", families.join(", "))?;
    writeln!(
        stdout,
        "Commands: /list, /select <name>, /clear, /quit. Any other line is a detection event."
    )?;
    stdout.flush()?;

    let mut state_rx = coordinator.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = state_rx.borrow_and_update().clone();
                output::print_banner(&mut stdout, &snapshot, color)?;
                stdout.flush()?;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "/quit" {
                    break;
                } else if line == "/clear" {
                    coordinator.clear_selection();
                } else if line == "/list" {
                    let selected = coordinator.current().selected.map(|h| h.name);
                    output::print_document_list(
                        &mut stdout,
                        &handles,
                        selected.as_deref(),
                        color,
                    )?;
                    stdout.flush()?;
                } else if let Some(name) = line.strip_prefix("/select ") {
                    match find_document(&handles, name.trim()) {
                        Ok(handle) => {
                            let _ = coordinator.select_document(handle.clone());
                        }
                        Err(error) => eprintln!("{error}"),
                    }
                } else if detections.send(line.to_string()).await.is_err() {
                    break;
                }
            }
        }
    }

    cancel.cancel();
    driver.abort();
    Ok(())
}
