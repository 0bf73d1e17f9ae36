//! fenshot CLI: read a board photo into FEN, draw diagrams, rectify photo
//! directories, validate and transform positions.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use fenshot::{
    best_move_for, board_svg, is_valid_fen, move_squares, BoardReader, Color, DiagramStyle, Fen,
    Placement, ReaderConfig, RecordedDetections, Square, TopSide, UciEngine, UciMove,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "fenshot")]
#[command(about = "Read chess positions from board photographs")]
#[command(version)]
struct Cli {
    /// Log level (off, error, warn, info, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the position from a photo using recorded detector output.
    Read(ReadArgs),

    /// Draw a position as an SVG diagram, optionally with a move arrow.
    Render(RenderArgs),

    /// Rectify every photo in a directory using recorded corner output.
    Rectify {
        /// Directory of photos, each with a `<name>.detections.json` beside it.
        #[arg(long)]
        images: PathBuf,
        /// Directory the rectified images are written to.
        #[arg(long)]
        out: PathBuf,
        /// Reader configuration (JSON) for corner thresholds and offsets.
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check the structure of a full FEN string.
    Validate {
        /// FEN to check (quote it).
        fen: String,
    },

    /// Flip, rotate or mirror a piece placement.
    Transform {
        /// Piece placement field, e.g. `4k3/8/8/8/8/8/8/4K3`.
        placement: String,
        #[arg(long, value_enum)]
        op: TransformOp,
    },
}

#[derive(Debug, Clone, Args)]
struct ReadArgs {
    /// Path to the board photograph.
    #[arg(long)]
    image: PathBuf,

    /// Recorded detector output (JSON).
    #[arg(long)]
    detections: PathBuf,

    /// Reader configuration (JSON). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Which side's pieces are at the top of the photo.
    #[arg(long, value_enum, default_value_t = SideArg::Black)]
    top: SideArg,

    /// Side to move, used when printing a full FEN.
    #[arg(long, value_enum, default_value_t = SideArg::White)]
    to_move: SideArg,

    /// Seed for the sampling RNG (overrides the config).
    #[arg(long)]
    seed: Option<u64>,

    /// Print the full FEN instead of the placement field only.
    #[arg(long)]
    full: bool,

    /// Reject readings that are not a playable position.
    #[arg(long)]
    strict: bool,

    /// Write an SVG diagram of the reading here, with the best move drawn
    /// when an engine is configured.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write the rectified, oriented board image here.
    #[arg(long)]
    save_board: Option<PathBuf>,

    /// UCI engine executable to ask for the best move (overrides the config).
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Engine search depth.
    #[arg(long)]
    depth: Option<usize>,
}

#[derive(Debug, Clone, Args)]
struct RenderArgs {
    /// Full FEN, or a placement field alone (White to move).
    fen: String,

    /// Output SVG file.
    #[arg(long)]
    out: PathBuf,

    /// Which side's pieces are drawn at the top.
    #[arg(long, value_enum, default_value_t = SideArg::Black)]
    top: SideArg,

    /// Move to draw, in UCI notation (e.g. `e2e4`).
    #[arg(long, conflicts_with = "engine")]
    arrow: Option<String>,

    /// UCI engine executable; its best move is drawn.
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Engine search depth.
    #[arg(long, default_value_t = 15)]
    depth: usize,

    /// Image side length in pixels.
    #[arg(long, default_value_t = 350)]
    size: u32,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SideArg {
    White,
    Black,
}

impl SideArg {
    fn top_side(self) -> TopSide {
        match self {
            SideArg::White => TopSide::White,
            SideArg::Black => TopSide::Black,
        }
    }

    fn color(self) -> Color {
        match self {
            SideArg::White => Color::White,
            SideArg::Black => Color::Black,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TransformOp {
    /// Reverse the rank order.
    Flip,
    /// View from the other side (ranks and files reversed).
    Rotate,
    /// Reverse the files in every rank.
    Mirror,
}

fn init_logging(level: &str) {
    fenshot::core::init_logging(level);
}

fn run_read(args: &ReadArgs, log_level: Option<&str>) -> CliResult<()> {
    let mut config = match &args.config {
        Some(path) => ReaderConfig::load_json(path)?,
        None => ReaderConfig::default(),
    };
    init_logging(log_level.unwrap_or(&config.log_level));

    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    log::info!("loading image {}", args.image.display());
    let photo = fenshot::images::load_rgb(&args.image)?;
    let detections = RecordedDetections::load_json(&args.detections)?;

    config.strict_position |= args.strict;
    let reader = BoardReader::from_detector(&detections, &config);
    let reading = reader.read(&photo.view(), args.top.top_side(), &mut rng)?;
    if reading.orientation.needs_quarter_turn {
        log::warn!("board may be rotated by 90 degrees; squares could be misassigned");
    }

    if let Some(path) = &args.save_board {
        fenshot::images::save_rgb(&reading.board_image, path)?;
        log::info!("board image written to {}", path.display());
    }

    let fen = reader.checked_fen(&reading, args.to_move.color())?;
    if args.full {
        println!("{fen}");
    } else {
        println!("{}", reading.placement);
    }

    let engine_path = args
        .engine
        .clone()
        .or_else(|| config.engine.as_ref().map(|e| e.path.clone()));
    let mut best = None;
    if let Some(path) = engine_path {
        let depth = args
            .depth
            .or_else(|| config.engine.as_ref().map(|e| e.depth))
            .unwrap_or(15);
        best = ask_engine(&path, depth, &fen)?;
        match &best {
            Some(mv) => println!("bestmove {mv}"),
            None => println!("bestmove (none)"),
        }
    }

    if let Some(path) = &args.svg {
        let arrow = best.as_ref().and_then(move_squares);
        let svg = board_svg(&fen.placement, arrow, args.top.top_side(), &DiagramStyle::default());
        std::fs::write(path, svg)?;
        log::info!("diagram written to {}", path.display());
    }
    Ok(())
}

fn ask_engine(path: &Path, depth: usize, fen: &Fen) -> CliResult<Option<UciMove>> {
    let mut engine = UciEngine::spawn(path, depth)?;
    Ok(best_move_for(&mut engine, fen)?)
}

fn parse_position(text: &str) -> CliResult<Fen> {
    if text.contains(' ') {
        Ok(text.parse()?)
    } else {
        Ok(Fen::new(Placement::parse(text)?, Color::White))
    }
}

fn parse_arrow(text: &str) -> CliResult<(Square, Square)> {
    let mv: UciMove = text.parse()?;
    move_squares(&mv).ok_or_else(|| format!("{text:?} does not move between two squares").into())
}

fn run_render(args: &RenderArgs) -> CliResult<()> {
    let fen = parse_position(&args.fen)?;
    let arrow = match (&args.arrow, &args.engine) {
        (Some(text), _) => Some(parse_arrow(text)?),
        (None, Some(path)) => ask_engine(path, args.depth, &fen)?
            .as_ref()
            .and_then(move_squares),
        (None, None) => None,
    };
    let style = DiagramStyle {
        size: args.size,
        ..Default::default()
    };
    std::fs::write(&args.out, board_svg(&fen.placement, arrow, args.top.top_side(), &style))?;
    log::info!("diagram written to {}", args.out.display());
    Ok(())
}

fn run_rectify(images: &Path, out: &Path, config: Option<&Path>) -> CliResult<()> {
    let config = match config {
        Some(path) => ReaderConfig::load_json(path)?,
        None => ReaderConfig::default(),
    };
    let summary = fenshot::batch::rectify_directory(images, out, &config)?;
    for path in &summary.written {
        println!("{}", path.display());
    }
    for (path, reason) in &summary.skipped {
        eprintln!("skipped {}: {reason}", path.display());
    }
    Ok(())
}

fn run_validate(fen: &str) -> ExitCode {
    if is_valid_fen(fen) {
        println!("valid");
        ExitCode::SUCCESS
    } else {
        println!("invalid");
        ExitCode::FAILURE
    }
}

fn run_transform(placement: &str, op: TransformOp) -> CliResult<()> {
    let placement = Placement::parse(placement)?;
    let out = match op {
        TransformOp::Flip => placement.flipped_ranks(),
        TransformOp::Rotate => placement.rotated_180(),
        TransformOp::Mirror => placement.mirrored_files(),
    };
    println!("{out}");
    Ok(())
}

fn main() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let log_level = cli.log_level.as_deref();

    match cli.command {
        Commands::Read(args) => run_read(&args, log_level).map(|_| ExitCode::SUCCESS),
        Commands::Render(args) => {
            init_logging(log_level.unwrap_or("warn"));
            run_render(&args).map(|_| ExitCode::SUCCESS)
        }
        Commands::Rectify {
            images,
            out,
            config,
        } => {
            init_logging(log_level.unwrap_or("info"));
            run_rectify(&images, &out, config.as_deref()).map(|_| ExitCode::SUCCESS)
        }
        Commands::Validate { fen } => {
            init_logging(log_level.unwrap_or("warn"));
            Ok(run_validate(&fen))
        }
        Commands::Transform { placement, op } => {
            init_logging(log_level.unwrap_or("warn"));
            run_transform(&placement, op).map(|_| ExitCode::SUCCESS)
        }
    }
}
