use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "xfl-player", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print timelines, clips, variants, events, and variation slots.
    Info(InfoArgs),
    /// Evaluate one frame and write its batch as JSON.
    Batch(BatchArgs),
    /// Play for a number of seconds, printing events and completions.
    Play(PlayArgs),
}

#[derive(Parser, Debug)]
struct LoadArgs {
    /// Document directory (or its DOMDocument.xml).
    doc: PathBuf,

    /// Atlas down-scale steps (0 = none, 1 = x2, 2 = x4).
    #[arg(long, default_value_t = 0)]
    downscale: u32,

    /// Fail when the document has no sprite-sheet list.
    #[arg(long, default_value_t = false)]
    strict_atlas: bool,

    /// Player options as a JSON file; flags below override it.
    #[arg(long)]
    opts: Option<PathBuf>,

    /// Deepest nested-symbol level evaluated.
    #[arg(long)]
    max_depth: Option<usize>,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    #[command(flatten)]
    load: LoadArgs,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    #[command(flatten)]
    load: LoadArgs,

    /// Frame to evaluate.
    #[arg(long, default_value_t = 0.0)]
    frame: f64,

    /// Symbol token to evaluate instead of the main timeline.
    #[arg(long)]
    timeline: Option<String>,

    /// Output JSON path; stdout when absent.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    #[command(flatten)]
    load: LoadArgs,

    /// Seconds to play.
    #[arg(long, default_value_t = 1.0)]
    seconds: f64,

    /// Frame rate override.
    #[arg(long)]
    fps: Option<f64>,

    /// Named clip of the main timeline.
    #[arg(long)]
    clip: Option<String>,

    /// Loop the playback window.
    #[arg(long = "loop", default_value_t = false)]
    looping: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Info(args) => cmd_info(args),
        Command::Batch(args) => cmd_batch(args),
        Command::Play(args) => cmd_play(args),
    }
}

fn load(args: &LoadArgs) -> anyhow::Result<(xfl_player::Document, xfl_player::PlayerOpts)> {
    let load_opts = xfl_player::LoadOpts {
        downscale: args.downscale,
        strict_atlas: args.strict_atlas,
    };
    let doc = xfl_player::load(&args.doc, &load_opts)
        .with_context(|| format!("load document '{}'", args.doc.display()))?;

    let mut opts = match &args.opts {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read options '{}'", path.display()))?;
            xfl_player::PlayerOpts::from_json_str(&text)?
        }
        None => xfl_player::PlayerOpts::default(),
    };
    if let Some(depth) = args.max_depth {
        opts.max_depth = depth;
    }
    Ok((doc, opts))
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let (doc, _) = load(&args.load)?;
    println!("frame rate: {}", doc.frame_rate());
    println!("variation slots: {}", doc.variation_slot_count());
    if let Some(atlas) = doc.atlas() {
        let (w, h) = atlas.size();
        println!("atlas: {} layer(s), {w}x{h}", atlas.layers().len());
    }

    let roots = doc.roots().iter().map(|id| ("root", *id));
    let symbols = doc.symbols().map(|(_, id)| ("symbol", id));
    for (kind, id) in roots.chain(symbols) {
        let Some(tl) = doc.timeline(id) else {
            continue;
        };
        println!("{kind} '{}': {} frame(s), {} layer(s)", tl.token, tl.duration, tl.layers.len());
        if let Some(slot) = tl.variation_slot {
            println!("  slot {slot}");
        }
        for (name, span) in &tl.clips {
            println!("  clip {name} [{}, {})", span.start, span.end);
        }
        for (name, frame) in &tl.variants {
            println!("  variant {name} @{frame}");
        }
        for ev in &tl.events {
            println!("  event {} @{:?}", ev.name, ev.frames);
        }
    }
    Ok(())
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let (doc, opts) = load(&args.load)?;
    let mut player = xfl_player::Player::new(doc, &opts)?;
    if args.timeline.is_some() {
        player.set_active_timeline(args.timeline.as_deref());
    }
    let dt = args.frame / player.frame_rate();
    player.advance(dt, true)?;

    let json = serde_json::to_string_pretty(player.batch()).context("serialize batch")?;
    match &args.out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(path, json)
                .with_context(|| format!("write batch '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let (doc, mut opts) = load(&args.load)?;
    if args.fps.is_some() {
        opts.frame_rate = args.fps;
    }
    opts.looping = args.looping;
    let mut player = xfl_player::Player::new(doc, &opts)?;
    if args.clip.is_some() {
        player.set_clip(args.clip.as_deref());
    }
    player.play();

    let dt = 1.0 / player.frame_rate();
    let ticks = (args.seconds * player.frame_rate()).ceil().max(0.0) as u64;
    for tick in 0..ticks {
        let out = player.advance(dt, false)?;
        for ev in &out.events {
            println!("{tick}: event {ev}");
        }
        if out.completed > 0 {
            println!("{tick}: completed x{}", out.completed);
        }
    }
    let status = player.status();
    println!(
        "frame {:.3} (elapsed {:.3}s, remaining {:.3}s)",
        status.frame, status.time.elapsed, status.time.remaining
    );
    Ok(())
}
