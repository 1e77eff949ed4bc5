//! CLI binary for exam-oracle.
//!
//! A thin shim over the library crate: maps CLI flags to `AnalysisConfig`,
//! drives a `Session`, prints the analysis and writes the model paper.

use anyhow::{Context, Result};
use clap::Parser;
use exam_oracle::pipeline::input;
use exam_oracle::{
    AnalysisConfig, AnalysisOutput, AnalysisProgressCallback, AnalysisResult, FixtureAnalyzer,
    LlmAnalyzer, PaperTemplate, ProbabilityLevel, ProgressCallback, Session,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner shown while documents are prepared and the model is thinking.
/// There is a single request, so a spinner with a status message is all the
/// feedback there is to give.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading papers…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_analysis_start(&self, documents: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Analysing {documents} paper(s)…"))
        ));
    }

    fn on_document_prepared(&self, index: usize, total: usize, name: &str, parts: usize) {
        self.bar.println(format!(
            "  {} {:>2}/{:<2}  {}  {}",
            green("✓"),
            index,
            total,
            name,
            dim(&format!("{parts} page image(s)")),
        ));
    }

    fn on_request_sent(&self, parts: usize) {
        self.bar.set_prefix("Analysing");
        self.bar
            .set_message(format!("waiting for the model ({parts} page image(s))…"));
    }

    fn on_analysis_complete(&self, success: bool) {
        self.bar.finish_and_clear();
        if success {
            eprintln!("{} analysis received", green("✔"));
        } else {
            eprintln!("{} analysis failed", red("✘"));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyse three years of papers, write the model paper to the current directory
  exam-oracle 2021.pdf 2022.pdf 2023-winter.jpg

  # Pick the provider and model explicitly
  exam-oracle --provider gemini --model gemini-2.5-flash papers/*.pdf

  # Keep the raw analysis for later and skip the PDF
  exam-oracle --save-json os.json --no-pdf papers/*.pdf

  # Re-render a saved analysis without calling the model
  exam-oracle --from-json os.json -o out/

  # Machine-readable output
  exam-oracle --json papers/*.pdf > analysis.json

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium (only needed for PDF papers)
"#;

/// Analyse previous-year exam papers and generate a model question paper.
#[derive(Parser, Debug)]
#[command(
    name = "exam-oracle",
    version,
    about = "Analyse previous-year exam papers and generate a model question paper",
    long_about = "Send scanned or photographed previous-year question papers (PDF or images) \
to a Vision Language Model, list the repeated and predicted questions, and export a \
formatted model question paper as PDF.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Previous-year papers: local PDF/image paths or HTTP/HTTPS URLs.
    #[arg(required_unless_present = "from_json")]
    inputs: Vec<String>,

    /// Directory the model paper PDF is written to.
    #[arg(short, long, env = "EXAM_ORACLE_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// LLM model ID (e.g. gemini-2.5-flash, gpt-4.1-mini).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(
        long,
        env = "EXAM_ORACLE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: gemini, openai, anthropic, azure, ollama, or any OpenAI-compatible endpoint."
    )]
    provider: Option<String>,

    /// Rendering DPI for PDF papers (72–400).
    #[arg(long, env = "EXAM_ORACLE_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Maximum rendered page dimension in pixels.
    #[arg(long, env = "EXAM_ORACLE_MAX_PIXELS", default_value_t = 2000)]
    max_pixels: u32,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "EXAM_ORACLE_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "EXAM_ORACLE_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// PDF user password for encrypted papers.
    #[arg(long, env = "EXAM_ORACLE_PASSWORD")]
    password: Option<String>,

    /// Path to a text file replacing the built-in analysis instructions.
    #[arg(long, env = "EXAM_ORACLE_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Load a saved analysis instead of calling the model.
    #[arg(long, env = "EXAM_ORACLE_FROM_JSON")]
    from_json: Option<PathBuf>,

    /// Save the analysis (result + stats) as JSON.
    #[arg(long, env = "EXAM_ORACLE_SAVE_JSON")]
    save_json: Option<PathBuf>,

    /// Print the analysis as JSON instead of the report.
    #[arg(long, env = "EXAM_ORACLE_JSON")]
    json: bool,

    /// Do not write the model paper PDF.
    #[arg(long, env = "EXAM_ORACLE_NO_PDF")]
    no_pdf: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "EXAM_ORACLE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "EXAM_ORACLE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "EXAM_ORACLE_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "EXAM_ORACLE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides the feedback that matters; INFO logs would
    // interleave with it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && cli.from_json.is_none();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let session = Session::with_template(PaperTemplate::default());
    let mut output: Option<AnalysisOutput> = None;

    if let Some(ref path) = cli.from_json {
        // ── Replay a saved analysis ──────────────────────────────────────
        let fixture = FixtureAnalyzer::from_file(path)
            .with_context(|| format!("Failed to load analysis from {}", path.display()))?;
        session.restore(fixture.result().clone());
    } else {
        // ── Live analysis ────────────────────────────────────────────────
        let progress_cb: Option<ProgressCallback> = if show_progress {
            Some(CliProgressCallback::new() as Arc<dyn AnalysisProgressCallback>)
        } else {
            None
        };
        let config = build_config(&cli, progress_cb).await?;

        let documents =
            input::load_documents(&cli.inputs, config.download_timeout_secs, config.concurrency)
                .await
                .context("Failed to read papers")?;
        for doc in documents {
            session.add_document(doc);
        }

        let analyzer = LlmAnalyzer::from_config(config).context("Provider setup failed")?;
        let result = match session.analyze(&analyzer).await {
            Ok(result) => result,
            Err(e) => {
                if e.is_analysis_failure() && !cli.quiet {
                    eprintln!(
                        "{}",
                        dim("The papers were read correctly; only the model call failed. Re-run to try again.")
                    );
                }
                return Err(anyhow::Error::new(e).context("Analysis failed"));
            }
        };
        output = Some(AnalysisOutput {
            result,
            stats: session.stats().unwrap_or_default(),
        });
    }

    let result = session
        .result()
        .context("No analysis result available")?;

    if let Some(ref path) = cli.save_json {
        let json = match output {
            Some(ref o) => serde_json::to_string_pretty(o),
            None => serde_json::to_string_pretty(&result),
        }
        .context("Failed to serialise analysis")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !cli.quiet {
            eprintln!("{} analysis saved to {}", green("✔"), bold(&path.display().to_string()));
        }
    }

    if cli.json {
        let json = match output {
            Some(ref o) => serde_json::to_string_pretty(o),
            None => serde_json::to_string_pretty(&result),
        }
        .context("Failed to serialise analysis")?;
        println!("{json}");
    } else if !cli.quiet {
        print_report(&result);
    }

    if !cli.no_pdf {
        let path = session
            .download(&cli.output_dir)
            .context("Failed to write model paper")?;
        if !cli.quiet {
            eprintln!(
                "{} model paper  →  {}",
                green("✔"),
                bold(&path.display().to_string())
            );
        }
    }

    if let Some(ref o) = output {
        if !cli.quiet && !cli.json {
            eprintln!(
                "   {} tokens in  /  {} tokens out  —  {}ms total",
                dim(&o.stats.input_tokens.to_string()),
                dim(&o.stats.output_tokens.to_string()),
                o.stats.total_duration_ms,
            );
        }
    }

    Ok(())
}

/// Map CLI args to `AnalysisConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<AnalysisConfig> {
    let mut builder = AnalysisConfig::builder()
        .dpi(cli.dpi)
        .max_rendered_pixels(cli.max_pixels)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {}", path.display()))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn level_colour(level: ProbabilityLevel) -> String {
    match level {
        ProbabilityLevel::High => red(level.as_str()),
        ProbabilityLevel::Medium => yellow(level.as_str()),
        ProbabilityLevel::Low => green(level.as_str()),
    }
}

/// Human-readable report on stdout.
fn print_report(result: &AnalysisResult) {
    let code = result
        .subject_code()
        .map(|c| format!("  ({c})"))
        .unwrap_or_default();
    println!();
    println!("{} {}{}", cyan("◆"), bold(&result.subject_name), dim(&code));

    println!();
    println!(
        "{}",
        bold(&format!("Repeated questions ({})", result.repeated_questions.len()))
    );
    if result.repeated_questions.is_empty() {
        println!("  {}", dim("none found"));
    }
    for (i, q) in result.repeated_questions.iter().enumerate() {
        println!("  {:>2}. {} {}", i + 1, cyan(&format!("[{}]", q.context)), q.question_text);
        if !q.frequency.is_empty() {
            println!("      {}", dim(&q.frequency));
        }
    }

    println!();
    println!(
        "{}  {}",
        bold(&format!("Predicted questions ({})", result.predicted_questions.len())),
        dim(&format!(
            "high {} · medium {} · low {}",
            result.count_by_probability(ProbabilityLevel::High),
            result.count_by_probability(ProbabilityLevel::Medium),
            result.count_by_probability(ProbabilityLevel::Low),
        ))
    );
    for (i, q) in result.predicted_questions.iter().enumerate() {
        println!(
            "  {:>2}. [{} · {}] {}",
            i + 1,
            level_colour(q.probability_level),
            q.marks,
            q.question_text
        );
        if !q.reasoning.is_empty() {
            println!("      {}", dim(&q.reasoning));
        }
    }
    println!();
}
