use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "frameblend", version)]
struct Cli {
    /// Log at debug level.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Blend every frame of an image sequence.
    Blend(BlendArgs),
    /// Print the source window planned for one output frame as JSON.
    Plan(PlanArgs),
}

#[derive(Parser, Debug)]
struct BlendArgs {
    /// Directory of input images, read in file-name order.
    #[arg(long)]
    in_dir: PathBuf,

    /// Directory the blended PNG sequence is written to.
    #[arg(long)]
    out_dir: PathBuf,

    /// Comma-separated weights, odd count.
    #[arg(
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        required_unless_present = "config",
        conflicts_with = "config"
    )]
    weights: Vec<f64>,

    /// Comma-separated plane indices to blend (default: all).
    #[arg(long, value_delimiter = ',', conflicts_with = "config")]
    planes: Vec<i64>,

    /// JSON config file; cannot be combined with --weights/--planes.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable frame-level parallelism.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Frames per parallel batch.
    #[arg(long, default_value_t = 64)]
    chunk_size: usize,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Output frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Comma-separated weights, odd count.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    weights: Vec<f64>,

    /// Number of frames in the source (default: unbounded).
    #[arg(long)]
    count: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Blend(args) => cmd_blend(args, cli.verbose),
        Command::Plan(args) => cmd_plan(args),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_blend(args: BlendArgs, verbose: bool) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => frameblend::BlendConfig::from_path(path)?,
        None => frameblend::BlendConfig::new(args.weights.clone())
            .with_planes(args.planes.clone()),
    };
    config.log |= verbose;

    let clip = frameblend::load_sequence(&args.in_dir)
        .with_context(|| format!("load sequence '{}'", args.in_dir.display()))?;
    let count = clip.len() as u64;
    let engine = frameblend::BlendEngine::new(clip, &config)?;

    let range =
        frameblend::FrameRange::new(frameblend::FrameIndex(0), frameblend::FrameIndex(count))?;
    let threading = frameblend::BlendThreading {
        parallel: args.parallel,
        chunk_size: args.chunk_size,
        threads: args.threads,
    };
    let frames = engine.render_range(range, &threading)?;

    let written = frameblend::save_sequence(&frames, &args.out_dir)
        .with_context(|| format!("write sequence '{}'", args.out_dir.display()))?;

    eprintln!("wrote {} frames to {}", written.len(), args.out_dir.display());
    Ok(())
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let profile = frameblend::WeightProfile::new(&args.weights)?;
    let ceiling = args.count.unwrap_or(frameblend::DEFAULT_INDEX_CEILING);
    let plan = frameblend::WindowPlan::new(
        frameblend::FrameIndex(args.frame),
        profile.radius(),
        ceiling,
    )?;
    let json = serde_json::to_string_pretty(&plan).context("serialize plan")?;
    println!("{json}");
    Ok(())
}
