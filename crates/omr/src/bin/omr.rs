//! omr CLI: render, read and grade answer sheets.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use omr::evaluate;
use omr::sheet::{write_json, AnswerKey, OmrConfig, ParamOverrides, RenderParams, SheetMarks};
use omr::BatchRunner;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "omr")]
#[command(about = "Read and grade photographed multiple-choice answer sheets")]
#[command(version)]
struct Cli {
    /// Log verbosity for every target. Without it `OMR_LOG` is read
    /// (e.g. `warn,omr_markers=debug`), defaulting to `info`.
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevelArg>,

    /// Emit JSON log lines (requires the `tracing` feature).
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one sheet image.
    Evaluate(EvaluateArgs),

    /// Evaluate every image listed in a CSV table and fill in the results.
    Batch(BatchArgs),

    /// Render a blank or pre-filled sheet.
    Render(RenderArgs),

    /// Write the generated bubble layout as JSON.
    Layout(LayoutArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for log::LevelFilter {
    fn from(value: LogLevelArg) -> Self {
        match value {
            LogLevelArg::Error => log::LevelFilter::Error,
            LogLevelArg::Warn => log::LevelFilter::Warn,
            LogLevelArg::Info => log::LevelFilter::Info,
            LogLevelArg::Debug => log::LevelFilter::Debug,
            LogLevelArg::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Args)]
struct ConfigArg {
    /// Form and pipeline configuration (JSON). Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl ConfigArg {
    fn load(&self) -> CliResult<OmrConfig> {
        match &self.config {
            Some(path) => Ok(OmrConfig::load_json(path)?),
            None => Ok(OmrConfig::default()),
        }
    }
}

#[derive(Debug, Clone, Args)]
struct EvaluateArgs {
    #[command(flatten)]
    config: ConfigArg,

    /// Sheet image to evaluate.
    #[arg(long)]
    image: PathBuf,

    /// Reference sheet the answer key is read from.
    #[arg(long, conflicts_with = "key")]
    reference: Option<PathBuf>,

    /// Answer key as JSON, or inline as `1:A,2:C,...`.
    #[arg(long)]
    key: Option<String>,

    /// Path to write the form result (JSON). Printed to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Override the fill threshold for this image.
    #[arg(long)]
    fill_threshold: Option<f32>,

    /// Override the bubble ROI scale for this image.
    #[arg(long)]
    roi_scale: Option<f32>,

    /// Override the center mask ratio for this image.
    #[arg(long)]
    mask_ratio: Option<f32>,

    /// Override the adaptive threshold block size for this image.
    #[arg(long)]
    block_size: Option<u32>,
}

impl EvaluateArgs {
    fn overrides(&self) -> ParamOverrides {
        ParamOverrides {
            fill_threshold: self.fill_threshold,
            roi_scale: self.roi_scale,
            mask_ratio: self.mask_ratio,
            block_size: self.block_size,
        }
    }
}

#[derive(Debug, Clone, Args)]
struct BatchArgs {
    #[command(flatten)]
    config: ConfigArg,

    /// Reference sheet the answer key is read from.
    #[arg(long)]
    reference: PathBuf,

    /// Input CSV table with an `image` column.
    #[arg(long)]
    table: PathBuf,

    /// Output CSV table. The input table is overwritten when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Worker threads (0 = one per core).
    #[arg(long, default_value = "0")]
    workers: usize,
}

#[derive(Debug, Clone, Args)]
struct RenderArgs {
    #[command(flatten)]
    config: ConfigArg,

    /// Output image path; the format follows the extension.
    #[arg(long)]
    out: PathBuf,

    /// Answers to fill in, as `1:A,2:C,...`.
    #[arg(long)]
    answers: Option<String>,

    /// Student number digits to fill in.
    #[arg(long)]
    student: Option<String>,

    /// Pixels per layout unit.
    #[arg(long, default_value = "2.0")]
    scale: f32,
}

#[derive(Debug, Clone, Args)]
struct LayoutArgs {
    #[command(flatten)]
    config: ConfigArg,

    /// Output path for the layout (JSON).
    #[arg(long)]
    out: PathBuf,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level, cli.json_logs)?;

    match cli.command {
        Commands::Evaluate(args) => run_evaluate(&args),
        Commands::Batch(args) => run_batch(&args),
        Commands::Render(args) => run_render(&args),
        Commands::Layout(args) => run_layout(&args),
    }
}

#[cfg(feature = "tracing")]
fn init_logging(_level: Option<LogLevelArg>, json: bool) -> CliResult<()> {
    omr::core::init_tracing(json);
    Ok(())
}

#[cfg(not(feature = "tracing"))]
fn init_logging(level: Option<LogLevelArg>, json: bool) -> CliResult<()> {
    let installed = match level {
        Some(level) => omr::core::init_with_level(level.into()),
        None => omr::core::init_from_env(log::LevelFilter::Info),
    };
    installed.map_err(|e| e.to_string())?;
    if json {
        log::warn!("--json-logs needs the `tracing` feature; using plain logs");
    }
    Ok(())
}

fn load_key(value: &str) -> CliResult<AnswerKey> {
    let path = Path::new(value);
    if path.is_file() {
        return Ok(omr::sheet::read_json(path)?);
    }
    Ok(value.parse::<AnswerKey>()?)
}

// ── evaluate ───────────────────────────────────────────────────────────

fn run_evaluate(args: &EvaluateArgs) -> CliResult<()> {
    let cfg = args.config.load()?;
    let mut reader = evaluate::reader_from_config(&cfg)?;

    let key = match (&args.reference, &args.key) {
        (Some(reference), _) => Some(evaluate::key_from_reference(&reader, reference)?),
        (None, Some(value)) => Some(load_key(value)?),
        (None, None) => None,
    };

    let overrides = args.overrides();
    if !overrides.is_empty() {
        reader = omr::SheetReader::new(reader.layout().clone(), overrides.apply(reader.params()));
    }

    let result = evaluate::evaluate_path(&reader, &args.image, key.as_ref())?;
    log::info!(
        "{}: correct={} wrong={} blank={} multi={} net={}",
        args.image.display(),
        result.correct,
        result.wrong,
        result.blank,
        result.multi,
        result.net
    );
    if result.suspicious() {
        log::warn!("{}: suspicious {:?}", args.image.display(), result.reasons);
    }

    match &args.out {
        Some(out) => {
            write_json(&result, out)?;
            println!("wrote {}", out.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&result)?),
    }
    Ok(())
}

// ── batch ──────────────────────────────────────────────────────────────

fn run_batch(args: &BatchArgs) -> CliResult<()> {
    let cfg = args.config.load()?;
    let runner = BatchRunner::new(evaluate::reader_from_config(&cfg)?, args.workers);
    let out = args.out.as_deref().unwrap_or(&args.table);

    let summary = runner.run_table(&args.reference, &args.table, out)?;
    println!(
        "{} rows, {} failed, {} suspicious -> {}",
        summary.rows,
        summary.failed,
        summary.suspicious,
        out.display()
    );
    Ok(())
}

// ── render ─────────────────────────────────────────────────────────────

fn run_render(args: &RenderArgs) -> CliResult<()> {
    let cfg = args.config.load()?;
    let mut marks = match &args.answers {
        Some(answers) => SheetMarks::from_key(&answers.parse::<AnswerKey>()?),
        None => SheetMarks::default(),
    };
    if let Some(student) = &args.student {
        marks = marks.with_student_no(student.as_str());
    }
    let params = RenderParams {
        scale: args.scale,
        ..RenderParams::default()
    };

    evaluate::render_to_file(&cfg, &marks, &params, &args.out)?;
    println!("wrote {}", args.out.display());
    Ok(())
}

// ── layout ─────────────────────────────────────────────────────────────

fn run_layout(args: &LayoutArgs) -> CliResult<()> {
    let cfg = args.config.load()?;
    let layout = cfg.layout()?;
    write_json(&layout, &args.out)?;
    println!(
        "{} questions, {}x{} -> {}",
        layout.questions.len(),
        layout.width,
        layout.height,
        args.out.display()
    );
    Ok(())
}
