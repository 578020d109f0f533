mod devices;

use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use clap::{Parser, Subcommand};
use greeting_show_core::{
    AssetStore, AudioEngine, FrameComposer, PhaseSequencer, SceneKind, ShowConfig, ShowError,
    Viewport,
};
use tracing_subscriber::EnvFilter;

use crate::devices::{ClipTracker, SimulatedClip, TerminalCues};

/// Virtual time covered by one redraw in live playback.
const FRAME_MS: u64 = 100;
/// How long the closing scene stays up before the program exits.
const CLOSING_LINGER_MS: u64 = 5_000;

fn main() -> greeting_show_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            config,
            asset_root,
            speed,
            seed,
            block_autoplay,
            bell,
            width,
            height,
        } => {
            let config = load_config(config.as_deref(), seed)?;
            let options = PlayOptions {
                asset_root,
                speed,
                block_autoplay,
                bell,
                composer: FrameComposer::new(width, height),
            };
            run_play(config, options)
        }
        Commands::Timeline { config, output } => {
            let config = load_config(config.as_deref(), None)?;
            run_timeline(config, output.as_deref())
        }
    }
}

struct PlayOptions {
    asset_root: PathBuf,
    speed: f32,
    block_autoplay: bool,
    bell: bool,
    composer: FrameComposer,
}

fn load_config(path: Option<&Path>, seed: Option<u64>) -> greeting_show_core::Result<ShowConfig> {
    let mut config = match path {
        Some(path) => {
            tracing::info!(?path, "loading configuration");
            ShowConfig::from_path(path)?
        }
        None => ShowConfig::default(),
    };
    if seed.is_some() {
        config.seed = seed;
    }
    Ok(config)
}

fn run_play(config: ShowConfig, options: PlayOptions) -> greeting_show_core::Result<()> {
    let assets = AssetStore::for_show(&options.asset_root, &config);
    for path in assets.missing() {
        tracing::warn!(path = %path.display(), "asset not found, the show will go on without it");
    }
    tracing::info!(root = %assets.root().display(), speed = options.speed, "starting show");

    let audio = AudioEngine::new(
        Box::new(TerminalCues::new(assets.root().to_path_buf(), options.bell)),
        config.cues.clone(),
    );
    let clip = SimulatedClip::new(config.assets.video.clone(), options.block_autoplay);
    let mut tracker = ClipTracker::new(config.assets.video_duration_ms);
    let mut show = PhaseSequencer::new(config, audio, Box::new(clip), Viewport::new());

    let speed = options.speed.max(0.1);
    let frame_sleep = Duration::from_millis(FRAME_MS).div_f32(speed);
    let stdout = io::stdout();
    let mut last_kind: Option<SceneKind> = None;
    let mut prompted = false;
    let mut finished_at: Option<u64> = None;

    loop {
        if let Some(scene) = show.scene() {
            if last_kind != Some(scene.kind()) {
                tracing::debug!(kind = ?scene.kind(), "scene changed");
                last_kind = Some(scene.kind());
            }
            let lines = options.composer.compose(&scene, show.phase_elapsed_ms());
            let mut out = stdout.lock();
            write!(out, "\x1b[2J\x1b[H{}", lines.join("\n"))?;
            out.flush()?;
        }

        if needs_viewer_start(&show, &tracker) && !prompted {
            prompted = true;
            eprintln!("\nPlayback was blocked. Press Enter to start the video.");
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            if let Err(err) = show.request_playback() {
                tracing::warn!(%err, "could not start playback");
            }
            tracker.observe(&show);
        }

        if show.is_finished() {
            let since = *finished_at.get_or_insert(show.now_ms());
            if show.now_ms().saturating_sub(since) >= CLOSING_LINGER_MS {
                break;
            }
        }

        std::thread::sleep(frame_sleep);
        let target = show.now_ms() + FRAME_MS;
        tracker.advance(&mut show, target);
    }

    show.unmount();
    println!();
    tracing::info!("show finished");
    Ok(())
}

fn needs_viewer_start(show: &PhaseSequencer, tracker: &ClipTracker) -> bool {
    show.theater().is_some_and(|theater| {
        theater.show_screen() && !theater.is_playing() && !theater.is_video_ended()
    }) && !tracker.is_ended()
}

fn run_timeline(config: ShowConfig, output: Option<&Path>) -> greeting_show_core::Result<()> {
    tracing::info!(?output, "computing show timeline");

    let audio = AudioEngine::silent(config.cues.clone());
    let clip = SimulatedClip::new(config.assets.video.clone(), false);
    let mut tracker = ClipTracker::new(config.assets.video_duration_ms);
    let mut show = PhaseSequencer::new(config, audio, Box::new(clip), Viewport::new());

    while !show.is_finished() {
        let next = [show.next_deadline(), tracker.end_at()]
            .into_iter()
            .flatten()
            .min();
        match next {
            Some(at) => tracker.advance(&mut show, at),
            None => {
                tracing::warn!(phase = show.phase().number(), "show stalled before the end");
                break;
            }
        }
    }

    let report = serde_json::json!({
        "phases": show.history(),
        "total_ms": show.now_ms(),
    });
    show.unmount();

    match output {
        Some(path) => {
            let encoded = serde_json::to_vec_pretty(&report)
                .map_err(|err| ShowError::msg(format!("could not encode timeline: {err}")))?;
            std::fs::write(path, encoded)?;
        }
        None => {
            for change in show.history() {
                println!("{:>8} ms  phase {} ({:?})", change.at_ms, change.phase.number(), change.phase);
            }
        }
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Animated greeting show for the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play the show in real time.
    Play {
        /// Optional JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Directory that asset paths are resolved against.
        #[arg(long, env = "GREETING_SHOW_ASSET_ROOT", default_value = ".")]
        asset_root: PathBuf,
        /// Playback speed multiplier.
        #[arg(long, default_value_t = 1.0)]
        speed: f32,
        /// Seed for the balloon and firework parameters.
        #[arg(long)]
        seed: Option<u64>,
        /// Refuse automatic video playback so the viewer has to start it.
        #[arg(long)]
        block_autoplay: bool,
        /// Ring the terminal bell for every cue.
        #[arg(long)]
        bell: bool,
        #[arg(long, default_value_t = 80)]
        width: usize,
        #[arg(long, default_value_t = 24)]
        height: usize,
    },
    /// Run the show on a virtual clock and report when each phase starts.
    Timeline {
        /// Optional JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the timeline as JSON instead of printing it.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
