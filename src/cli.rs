use crate::engine::ApiClient;
use crate::model::{AppEvent, ClientConfig, UploadFile, UploadRequest};
use crate::orchestrator::FileListController;
use crate::view::{render_selection, render_upload_result};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reqwest::Url;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

/// A line of subcommand output. Results go to stdout so they can be piped; progress
/// and notices go to stderr.
enum Printed {
    Result(String),
    Progress(String),
}

/// Terminal writes happen on a blocking thread fed by the printer channel.
fn spawn_printer() -> (mpsc::UnboundedSender<Printed>, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Printed>();
    let handle = tokio::task::spawn_blocking(move || {
        let mut results = std::io::LineWriter::new(std::io::stdout().lock());
        let mut progress = std::io::LineWriter::new(std::io::stderr().lock());
        while let Some(line) = rx.blocking_recv() {
            let _ = match line {
                Printed::Result(text) => writeln!(results, "{text}"),
                Printed::Progress(text) => writeln!(progress, "{text}"),
            };
        }
        let _ = results.flush();
        let _ = progress.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "transcript-upload-cli",
    version,
    about = "Upload transcripts and manage generated Excel/PPT files"
)]
pub struct Cli {
    /// Base URL of the transcript service
    #[arg(
        long,
        env = "TRANSCRIPT_BASE_URL",
        default_value = "http://127.0.0.1:5000",
        global = true
    )]
    pub base_url: String,

    /// Per-request timeout (processing large batches can take minutes)
    #[arg(long, default_value = "300s", global = true)]
    pub timeout: humantime::Duration,

    /// Extension every uploaded file must have
    #[arg(long, default_value = "json", global = true)]
    pub extension: String,

    /// Print JSON results instead of text (subcommands only)
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory downloads are written to
    #[arg(long, default_value = ".", global = true)]
    pub download_dir: PathBuf,

    /// Files to pre-stage in the TUI upload tab
    #[arg(long = "stage", value_name = "FILE")]
    pub stage: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// List generated output files
    List,
    /// Upload transcript files and generate outputs
    Upload {
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
        /// Generate an Excel workbook
        #[arg(long)]
        excel: bool,
        /// Generate PPT slide decks
        #[arg(long)]
        ppt: bool,
    },
    /// Delete an output file by name
    Delete { name: String },
    /// Download an output file by name
    Download { name: String },
}

pub async fn run(args: Cli) -> Result<()> {
    match args.command.clone() {
        None => {
            #[cfg(feature = "tui")]
            {
                crate::tui::run(args).await
            }
            #[cfg(not(feature = "tui"))]
            {
                // Fallback when built without TUI support.
                run_command(&args, Command::List).await
            }
        }
        Some(cmd) => run_command(&args, cmd).await,
    }
}

/// Build a `ClientConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> Result<ClientConfig> {
    let base_url = Url::parse(&args.base_url)
        .with_context(|| format!("invalid --base-url {:?}", args.base_url))?;
    if base_url.cannot_be_a_base() {
        anyhow::bail!("--base-url {:?} cannot be used as a base URL", args.base_url);
    }
    Ok(ClientConfig {
        base_url,
        timeout: Duration::from(args.timeout),
        required_extension: normalize_extension(&args.extension),
        user_agent: format!("transcript-upload-cli/{}", env!("CARGO_PKG_VERSION")),
        download_dir: args.download_dir.clone(),
    })
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Route controller events to the printer. Alerts are skipped: the failing
/// command returns the same error and `main` prints it once.
fn print_event(ev: AppEvent, show_list: bool, out_tx: &mpsc::UnboundedSender<Printed>) {
    match ev {
        AppEvent::ListRendered(node) if show_list => {
            for line in node.to_lines() {
                let _ = out_tx.send(Printed::Result(line));
            }
        }
        AppEvent::UploadCompleted(result) => {
            for line in render_upload_result(&result).to_lines() {
                let _ = out_tx.send(Printed::Result(line));
            }
        }
        AppEvent::Processing { visible: true } => {
            let _ = out_tx.send(Printed::Progress("Processing…".into()));
        }
        AppEvent::Info(msg) => {
            let _ = out_tx.send(Printed::Progress(msg));
        }
        _ => {}
    }
}

async fn run_command(args: &Cli, cmd: Command) -> Result<()> {
    let cfg = build_config(args)?;
    let client = ApiClient::new(&cfg).context("build HTTP client")?;
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<AppEvent>();
    let ctrl = FileListController::new(client, cfg.required_extension.clone(), evt_tx);

    let (out_tx, out_handle) = spawn_printer();
    let json = args.json;
    // Download refreshes only to resolve the name; its listing is noise.
    let show_list = !matches!(cmd, Command::Download { .. });
    let printer = {
        let out_tx = out_tx.clone();
        tokio::spawn(async move {
            while let Some(ev) = evt_rx.recv().await {
                if !json {
                    print_event(ev, show_list, &out_tx);
                }
            }
        })
    };

    let res = execute(&ctrl, &cfg, cmd, json, &out_tx).await;

    // Dropping the controller closes the event channel and ends the printer.
    drop(ctrl);
    let _ = printer.await;
    drop(out_tx);
    let _ = out_handle.await;
    res
}

async fn execute(
    ctrl: &FileListController,
    cfg: &ClientConfig,
    cmd: Command,
    json: bool,
    out_tx: &mpsc::UnboundedSender<Printed>,
) -> Result<()> {
    match cmd {
        Command::List => {
            let files = ctrl.refresh().await.context("list output files")?;
            if json {
                let _ = out_tx.send(Printed::Result(serde_json::to_string_pretty(&files)?));
            }
        }
        Command::Upload { files, excel, ppt } => {
            let mut selected = Vec::with_capacity(files.len());
            for p in &files {
                selected.push(UploadFile::from_path(p).await?);
            }
            if !json {
                let _ = out_tx.send(Printed::Progress("Selected files:".into()));
                let selection = render_selection(selected.iter().map(|f| (f.name.as_str(), f.size())));
                for line in selection.to_lines() {
                    let _ = out_tx.send(Printed::Progress(format!("  {line}")));
                }
            }
            let req = UploadRequest {
                files: selected,
                generate_excel: excel,
                generate_ppt: ppt,
            };
            let result = ctrl.submit(req).await.context("upload")?;
            if json {
                let _ = out_tx.send(Printed::Result(serde_json::to_string_pretty(&result)?));
            }
        }
        Command::Delete { name } => {
            ctrl.remove(&name)
                .await
                .with_context(|| format!("delete {name}"))?;
            if json {
                let body = serde_json::json!({ "deleted": name, "files": ctrl.files() });
                let _ = out_tx.send(Printed::Result(serde_json::to_string_pretty(&body)?));
            }
        }
        Command::Download { name } => {
            ctrl.refresh().await.context("list output files")?;
            let saved = ctrl
                .download(&name, &cfg.download_dir)
                .await
                .with_context(|| format!("download {name}"))?;
            if json {
                let body = serde_json::json!({ "name": name, "saved": saved });
                let _ = out_tx.send(Printed::Result(serde_json::to_string_pretty(&body)?));
            }
        }
    }
    Ok(())
}
