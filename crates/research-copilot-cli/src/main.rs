//! Research Copilot CLI - Upload research papers, then summarize, question and translate them.

mod render;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use research_copilot_core::view::DeleteOutcome;
use research_copilot_core::{
    AnalysisView, AppConfig, Copilot, DEFAULT_DOWNLOAD_LANG, DocId, Lang, ProcessingStage,
    ProgressSink, QaView, TranslateView, UploadFile, UploadView, View, clear_document_cache,
    download_languages, find_language, require_language, summary_languages,
};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "copilot")]
#[command(author, version, about = "Summarize, question and translate research papers", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend origin (e.g., http://localhost:8000)
    #[arg(long, env = "COPILOT_API_BASE", global = true)]
    api_base: Option<String>,

    /// Keep the document list in memory only
    #[arg(long, global = true)]
    no_cache: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List uploaded documents
    Files,

    /// Upload a PDF and wait for processing
    Upload {
        /// PDF file to upload
        file: PathBuf,
    },

    /// Delete an uploaded document
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the summary of a document
    Analyze {
        id: String,

        /// Also translate the summary (see `languages`)
        #[arg(short, long)]
        lang: Option<String>,
    },

    /// Ask questions about a document (interactive without QUESTION)
    Ask { id: String, question: Option<String> },

    /// Download a translation of a document
    Translate {
        id: String,

        /// Target language code
        #[arg(short, long, default_value = DEFAULT_DOWNLOAD_LANG)]
        lang: String,

        /// Directory the translation is written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Open a view by path (/, /analyze/<ID>, /qa/<ID>, /translate/<ID>)
    Open { path: String },

    /// List the languages offered for translation
    Languages,

    /// Forget the persisted document list
    ClearCache,
}

/// Spinner showing the stage of a backend request.
struct StageSpinner {
    bar: ProgressBar,
}

impl StageSpinner {
    fn start(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        // Template is hardcoded and valid, unwrap is safe
        #[allow(clippy::unwrap_used)]
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    fn set_message(&self, message: impl Into<String>) {
        self.bar.set_message(message.into());
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for StageSpinner {
    fn stage_changed(&self, stage: ProcessingStage) {
        self.bar.set_message(stage.label());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let config = load_config(&args)?;

    match args.command {
        Command::Languages => {
            render::languages("Summary translation", &summary_languages());
            render::languages("Document download", &download_languages());
            Ok(())
        }
        Command::ClearCache => clear_cache(&config),
        command => {
            info!("Using backend at {}", config.api_base);
            let mut copilot = Copilot::new(config).context("Failed to initialize client")?;
            run(&mut copilot, command).await
        }
    }
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };

    // Override config with CLI arguments
    if let Some(api_base) = &args.api_base {
        config.api_base.clone_from(api_base);
    }
    if args.no_cache {
        config.cache.enabled = false;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn run(copilot: &mut Copilot, command: Command) -> Result<()> {
    match command {
        Command::Files => files(copilot).await,
        Command::Upload { file } => upload(copilot, &file).await,
        Command::Delete { id, yes } => delete(copilot, &DocId::new(id), yes).await,
        Command::Analyze { id, lang } => analyze(copilot, DocId::new(id), lang.as_deref()).await,
        Command::Ask { id, question } => ask(copilot, DocId::new(id), question).await,
        Command::Translate {
            id,
            lang,
            output_dir,
        } => translate(copilot, DocId::new(id), Lang::new(lang), &output_dir).await,
        Command::Open { path } => open(copilot, &path).await,
        Command::Languages | Command::ClearCache => Ok(()),
    }
}

fn upload_view(copilot: &Copilot) -> UploadView {
    UploadView::new(copilot.cache().clone(), copilot.config())
}

async fn files(copilot: &Copilot) -> Result<()> {
    let mut view = upload_view(copilot);
    view.refresh(copilot.api()).await;

    render::upload_view(&view);
    Ok(())
}

async fn upload(copilot: &Copilot, path: &Path) -> Result<()> {
    let bytes = std::fs::read(path).context(format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .context("Upload path has no file name")?
        .to_string();

    let mut view = upload_view(copilot);
    let spinner = StageSpinner::start(ProcessingStage::Uploading.label());

    let Some(record) = view
        .upload(copilot.api(), UploadFile::new(filename, bytes), &spinner)
        .await
    else {
        spinner.finish();
        bail!("{}", view.error().unwrap_or("Upload was not started"));
    };

    spinner.set_message("Refreshing file list");
    view.settle(copilot.api()).await;
    spinner.finish();

    render::uploaded(&record);
    if let Some(message) = view.error() {
        warn!("{}", message);
    }
    Ok(())
}

async fn delete(copilot: &Copilot, id: &DocId, yes: bool) -> Result<()> {
    let mut view = upload_view(copilot);
    view.refresh(copilot.api()).await;
    if let Some(message) = view.error() {
        bail!("{message}");
    }

    let outcome = view
        .delete(copilot.api(), id, |record| {
            yes || confirm(&format!("Delete {} ({})?", record.filename, record.id))
        })
        .await;

    match outcome {
        DeleteOutcome::Deleted => {
            #[allow(clippy::print_stdout)]
            {
                println!("Deleted {id}");
            }
            Ok(())
        }
        DeleteOutcome::Cancelled => Ok(()),
        DeleteOutcome::Unavailable => bail!("No document with id {id}"),
        DeleteOutcome::Failed(message) => Err(anyhow!(message)),
    }
}

async fn analyze(copilot: &Copilot, id: DocId, lang: Option<&str>) -> Result<()> {
    let target = lang
        .map(|code| require_language(&summary_languages(), code))
        .transpose()?;

    let spinner = StageSpinner::start(ProcessingStage::Summarizing.label());
    let mut view = AnalysisView::new(id);
    view.enter(copilot.api(), Some(copilot.cache())).await;

    if let Some(option) = target {
        spinner.set_message(format!("Translating summary to {}", option.name));
        view.translate(copilot.api(), &option.lang()).await;
    }
    spinner.finish();

    render::analysis(&view);
    if view.error().is_some() {
        bail!("Summary incomplete");
    }
    Ok(())
}

async fn ask(copilot: &Copilot, id: DocId, question: Option<String>) -> Result<()> {
    let mut view = QaView::new(id);
    view.enter(copilot.api(), Some(copilot.cache())).await;
    render::metadata(view.metadata());

    if let Some(question) = question {
        ask_one(copilot, &mut view, &question).await;
        return match view.error() {
            Some(message) => Err(anyhow!(message.to_string())),
            None => Ok(()),
        };
    }

    // Interactive session; an empty line or EOF ends it
    let stdin = std::io::stdin();
    loop {
        #[allow(clippy::print_stdout)]
        {
            print!("> ");
        }
        std::io::stdout().flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            break;
        }

        ask_one(copilot, &mut view, question).await;
    }

    info!("Session ended after {} entries", view.transcript().len());
    Ok(())
}

async fn ask_one(copilot: &Copilot, view: &mut QaView, question: &str) {
    let spinner = StageSpinner::start("Thinking");
    let before = view.transcript().len();
    view.ask_text(copilot.api(), question).await;
    spinner.finish();

    // The user entry was echoed by the terminal already
    for entry in view.transcript().iter().skip(before + 1) {
        render::transcript_entry(entry);
    }
    if let Some(message) = view.error() {
        render::error(message);
    }
}

async fn translate(copilot: &Copilot, id: DocId, lang: Lang, output_dir: &Path) -> Result<()> {
    if find_language(&download_languages(), lang.as_str()).is_none() {
        warn!("'{}' is not an offered download language; sending it anyway", lang);
    }

    let mut view = TranslateView::new(id);
    view.enter(copilot.api(), Some(copilot.cache())).await;
    if let Some(message) = view.error() {
        warn!("{}", message);
    }
    view.select_language(&lang);

    let spinner = StageSpinner::start(&format!("Translating document to {lang}"));
    let download = view.download(copilot.api()).await;
    spinner.finish();

    let Some(download) = download else {
        bail!("{}", view.error().unwrap_or("Translation was not started"));
    };

    // Backend filenames may carry directories; keep only the last component
    let filename = Path::new(&download.filename)
        .file_name()
        .context("Translation has no usable file name")?;
    std::fs::create_dir_all(output_dir)
        .context(format!("Failed to create {}", output_dir.display()))?;
    let output_path = output_dir.join(filename);
    std::fs::write(&output_path, &download.bytes)
        .context(format!("Failed to write output: {}", output_path.display()))?;

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        println!("Translation saved to: {}", output_path.display());
    }
    Ok(())
}

async fn open(copilot: &mut Copilot, path: &str) -> Result<()> {
    let view = copilot
        .navigate(path)
        .await
        .context(format!("Cannot open '{path}'"))?;

    match view {
        View::Upload(view) => render::upload_view(&view),
        View::Analysis(view) => render::analysis(&view),
        View::Qa(view) => render::qa_view(&view),
        View::Translate(view) => render::translate_view(&view),
    }
    Ok(())
}

fn clear_cache(config: &AppConfig) -> Result<()> {
    let count = clear_document_cache(&config.cache).context("Failed to clear cache")?;

    #[allow(clippy::print_stdout)]
    {
        println!("Removed {count} cached documents");
    }
    Ok(())
}

fn confirm(prompt: &str) -> bool {
    #[allow(clippy::print_stdout)]
    {
        print!("{prompt} [y/N] ");
    }
    std::io::stdout().flush().ok();

    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
