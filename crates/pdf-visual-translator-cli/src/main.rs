//! PDF Visual Translator CLI - translate PDF documents while keeping their look.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use pdf_visual_translator_core::{
    AppConfig, CheckpointStore, Error, Lang, PdfDocument, ProgressEvent, Provider, VisualTranslator,
    progress,
};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProviderOption {
    Gemini,
    Openai,
    Deepseek,
}

impl From<ProviderOption> for Provider {
    fn from(opt: ProviderOption) -> Self {
        match opt {
            ProviderOption::Gemini => Self::Gemini,
            ProviderOption::Openai => Self::OpenAi,
            ProviderOption::Deepseek => Self::DeepSeek,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "pdf-visual-translate")]
#[command(author, version, about = "Translate PDF documents over their original page images", long_about = None)]
struct Args {
    /// Input PDF file
    #[arg(required_unless_present = "clear_all_checkpoints")]
    input: Option<PathBuf>,

    /// Output PDF file (default: input-<target>.pdf)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Translation backend
    #[arg(short, long, value_enum)]
    provider: Option<ProviderOption>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// DeepSeek API key (sent to the relay)
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    deepseek_api_key: Option<String>,

    /// DeepSeek relay endpoint
    #[arg(long, env = "DEEPSEEK_RELAY_URL")]
    relay_url: Option<String>,

    /// Model name (default depends on the provider)
    #[arg(long)]
    model: Option<String>,

    /// Source language code
    #[arg(short = 's', long)]
    source: Option<String>,

    /// Target language code
    #[arg(short = 't', long)]
    target: Option<String>,

    /// Pages translated concurrently per batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Checkpoint identity of the document (default: absolute input path)
    #[arg(long)]
    document_id: Option<String>,

    /// Translate the first page only and print it
    #[arg(long, group = "mode")]
    preview: bool,

    /// Write the already-translated pages of an interrupted run
    #[arg(long, group = "mode")]
    export_partial: bool,

    /// Forget the checkpoint of this document
    #[arg(long, group = "mode")]
    clear_checkpoint: bool,

    /// Forget every checkpoint
    #[arg(long, group = "mode")]
    clear_all_checkpoints: bool,

    /// Keep checkpoints in memory only
    #[arg(long)]
    no_persist: bool,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// Fold command-line overrides into the loaded configuration.
    fn apply(&self, config: &mut AppConfig) {
        let translator = &mut config.translator;

        if let Some(provider) = self.provider {
            translator.provider = provider.into();
        }
        if self.gemini_api_key.is_some() {
            translator.gemini_api_key.clone_from(&self.gemini_api_key);
        }
        if self.openai_api_key.is_some() {
            translator.openai_api_key.clone_from(&self.openai_api_key);
        }
        if self.deepseek_api_key.is_some() {
            translator.deepseek_api_key.clone_from(&self.deepseek_api_key);
        }
        if let Some(ref relay_url) = self.relay_url {
            translator.relay_url.clone_from(relay_url);
        }
        if self.model.is_some() {
            translator.model.clone_from(&self.model);
        }
        if let Some(ref source) = self.source {
            translator.source_lang = Lang::new(source);
        }
        if let Some(ref target) = self.target {
            translator.target_lang = Lang::new(target);
        }
        if let Some(batch_size) = self.batch_size {
            translator.batch_size = batch_size;
        }

        if self.no_persist {
            config.checkpoint.disk_enabled = false;
        }
    }
}

/// Default output path next to the input.
fn output_path(input: &Path, target: &Lang, partial: bool) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let suffix = if partial { "-partial" } else { "" };
    input.with_file_name(format!("{stem}-{target}{suffix}.pdf"))
}

/// Default checkpoint identity: the absolute input path.
fn default_document_id(input: &Path) -> String {
    std::fs::canonicalize(input)
        .unwrap_or_else(|_| input.to_path_buf())
        .display()
        .to_string()
}

/// Render progress events on a single bar until the sender side closes.
async fn drive_progress(mut rx: UnboundedReceiver<ProgressEvent>) {
    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] {msg:12} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let stage = |message: &'static str, current: usize, total: usize| {
        if pb.message() != message {
            pb.set_message(message);
            pb.reset_eta();
        }
        pb.set_length(total as u64);
        pb.set_position(current as u64);
    };

    while let Some(event) = rx.recv().await {
        match event {
            ProgressEvent::ExtractionProgress { current, total } => stage("Extracting", current, total),
            ProgressEvent::Resumed { pages } => {
                pb.println(format!("Resuming: {pages} pages already translated"));
            }
            ProgressEvent::PageTranslated { page_number } => {
                pb.set_message("Translating");
                pb.tick();
                tracing::debug!("Page {} translated", page_number);
            }
            ProgressEvent::BatchCommitted { completed, total } => stage("Translating", completed, total),
            ProgressEvent::TranslationFailed {
                page_number, message, ..
            } => {
                pb.abandon_with_message(format!("Failed at page {page_number}"));
                tracing::debug!("Translation failed: {}", message);
                return;
            }
            ProgressEvent::CompositionProgress { current, total } => stage("Composing", current, total),
            ProgressEvent::Finished { pages } => {
                pb.finish_with_message(format!("Done ({pages} pages)"));
            }
        }
    }

    if !pb.is_finished() {
        pb.finish_and_clear();
    }
}

/// Explain a failed run and how to salvage it.
#[allow(clippy::print_stderr)]
fn report_failure(err: &Error, input: &Path) {
    let Error::Pipeline {
        completed,
        total,
        source,
        ..
    } = err
    else {
        return;
    };

    eprintln!("{completed}/{total} pages were translated before the failure.");
    if let Error::Backend(backend) = source.as_ref() {
        eprintln!("Hint: {}", backend.hint());
    }
    if *completed > 0 {
        eprintln!(
            "Rerun the same command to resume, or export what is done with:\n  pdf-visual-translate --export-partial {}",
            input.display()
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Load or create config
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    if args.clear_all_checkpoints {
        CheckpointStore::new(&config.checkpoint)
            .context("Failed to open checkpoint store")?
            .clear_all()
            .context("Failed to clear checkpoints")?;
        #[allow(clippy::print_stdout)]
        {
            println!("All checkpoints cleared");
        }
        return Ok(());
    }

    let Some(input) = args.input.clone() else {
        anyhow::bail!("No input file given");
    };
    let document_id = args
        .document_id
        .clone()
        .unwrap_or_else(|| default_document_id(&input));
    let target = config.translator.target_lang.clone();

    let (reporter, rx) = progress::channel();
    let translator = VisualTranslator::new(config)
        .context("Failed to initialize translator")?
        .with_progress(reporter);
    info!("Using {} (checkpoint id: {})", translator.provider(), document_id);

    if args.clear_checkpoint {
        translator
            .clear_checkpoint(&document_id)
            .await
            .context("Failed to clear checkpoint")?;
        #[allow(clippy::print_stdout)]
        {
            println!("Checkpoint cleared for {document_id}");
        }
        return Ok(());
    }

    info!("Loading PDF: {}", input.display());
    let doc = PdfDocument::from_file(&input).context(format!("Failed to load PDF: {}", input.display()))?;
    info!("Document has {} pages", doc.page_count());

    let progress_task = tokio::spawn(drive_progress(rx));

    let outcome = if args.preview {
        translator.preview(&doc, &document_id).await.map(|record| {
            // CLI output is intentional
            #[allow(clippy::print_stdout)]
            {
                println!("--- Page {} (original) ---\n{}\n", record.page_number, record.original_text);
                println!("--- Page {} (translated) ---\n{}", record.page_number, record.translated_text);
            }
            None
        })
    } else if args.export_partial {
        let exported = translator.export_partial(&doc, &document_id).await;
        match exported {
            Ok(Some(bytes)) => Ok(Some((bytes, output_path(&input, &target, true)))),
            Ok(None) => {
                drop(translator);
                progress_task.await.ok();
                anyhow::bail!("No checkpoint found for {document_id}");
            }
            Err(e) => Err(e),
        }
    } else {
        translator
            .translate_document(&doc, &document_id)
            .await
            .map(|bytes| Some((bytes, output_path(&input, &target, false))))
    };

    // Closing every sender ends the progress task
    drop(translator);
    progress_task.await.ok();

    let written = match outcome {
        Ok(written) => written,
        Err(e) => {
            report_failure(&e, &input);
            return Err(e).context("Translation failed");
        }
    };

    if let Some((bytes, default_path)) = written {
        let output_path = args.output.unwrap_or(default_path);
        std::fs::write(&output_path, bytes)
            .context(format!("Failed to write output: {}", output_path.display()))?;

        // CLI output is intentional
        #[allow(clippy::print_stdout)]
        {
            println!("Translated PDF saved to: {}", output_path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_output_path_defaults() {
        let target = Lang::new("pt-BR");
        assert_eq!(
            output_path(Path::new("/tmp/report.pdf"), &target, false),
            PathBuf::from("/tmp/report-pt-BR.pdf")
        );
        assert_eq!(
            output_path(Path::new("report.pdf"), &target, true),
            PathBuf::from("report-pt-BR-partial.pdf")
        );
    }

    #[test]
    fn test_modes_are_exclusive() {
        let result = Args::try_parse_from(["pdf-visual-translate", "a.pdf", "--preview", "--export-partial"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_apply() {
        let args = Args::try_parse_from([
            "pdf-visual-translate",
            "a.pdf",
            "--provider",
            "openai",
            "--batch-size",
            "3",
            "--no-persist",
            "-t",
            "es",
        ])
        .unwrap_or_else(|e| panic!("{e}"));

        let mut config = AppConfig::default();
        args.apply(&mut config);

        assert_eq!(config.translator.provider, Provider::OpenAi);
        assert_eq!(config.translator.batch_size, 3);
        assert_eq!(config.translator.target_lang.as_str(), "es");
        assert!(!config.checkpoint.disk_enabled);
        assert!(config.checkpoint.memory_enabled);
    }

    #[test]
    fn test_clear_all_needs_no_input() {
        let args = Args::try_parse_from(["pdf-visual-translate", "--clear-all-checkpoints"]);
        assert!(args.is_ok_and(|a| a.input.is_none()));
    }
}
