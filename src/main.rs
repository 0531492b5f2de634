use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use hoverclip::{Callbacks, InlineVideoEngine, MediaConfig, MediaController, PlaybackEngine};
use serde::Serialize;

/// Drive a media component from a JSON config and print what it renders
#[derive(Parser, Debug)]
#[command(name = "hoverclip", version, about)]
struct Args {
    /// JSON media configuration
    #[arg(short, long)]
    config: PathBuf,

    /// Comma-separated interactions: enter, leave, play, pause
    #[arg(short, long, value_delimiter = ',')]
    events: Vec<Interaction>,

    /// How long to wait for engine events after each step
    #[arg(long, default_value_t = 250)]
    settle_ms: u64,

    /// Print render fingerprints instead of full render output
    #[arg(long)]
    fingerprint: bool,
}

#[derive(Debug, Clone, Copy)]
enum Interaction {
    Enter,
    Leave,
    Play,
    Pause,
}

impl FromStr for Interaction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enter" => Ok(Interaction::Enter),
            "leave" => Ok(Interaction::Leave),
            "play" => Ok(Interaction::Play),
            "pause" => Ok(Interaction::Pause),
            other => Err(format!("unknown interaction '{}'", other)),
        }
    }
}

#[derive(Serialize)]
struct StepReport {
    step: String,
    state: hoverclip::PlaybackState,
    #[serde(skip_serializing_if = "Option::is_none")]
    fault: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    render: Option<hoverclip::rendering::RenderOutput>,
}

async fn settle<E: PlaybackEngine>(player: &mut MediaController<E>, wait: Duration) {
    while let Ok(Some(_)) = tokio::time::timeout(wait, player.next_event()).await {}
}

fn report<E: PlaybackEngine>(step: &str, player: &MediaController<E>, fingerprint: bool) -> anyhow::Result<()> {
    let render = player.render();
    let line = StepReport {
        step: step.to_string(),
        state: player.state(),
        fault: player.fault().map(|f| f.to_string()),
        fingerprint: fingerprint.then(|| render.fingerprint()),
        render: (!fingerprint).then_some(render),
    };
    println!("{}", serde_json::to_string(&line)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = MediaConfig::from_path(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if args.settle_ms == 0 {
        bail!("--settle-ms must be positive");
    }
    let wait = Duration::from_millis(args.settle_ms);

    let mut engine = InlineVideoEngine::new()?;
    if let Some(dir) = args.config.parent() {
        engine = engine.with_base_dir(dir);
    }

    let mut player = MediaController::mount(config, Callbacks::default(), engine)?;
    settle(&mut player, wait).await;
    report("mount", &player, args.fingerprint)?;

    for interaction in &args.events {
        match interaction {
            Interaction::Enter => player.pointer_enter(),
            Interaction::Leave => player.pointer_leave(),
            Interaction::Play => player.play(),
            Interaction::Pause => player.pause(),
        }
        settle(&mut player, wait).await;
        report(&format!("{:?}", interaction).to_ascii_lowercase(), &player, args.fingerprint)?;
    }

    player.unmount();
    Ok(())
}
