use std::{cell::Cell, path::PathBuf, time::Duration};

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use techxpression_core::{
    run_intro, AppConfig, AudioPlayer, AudioResource, IntroEvent, IntroSequencer,
    RegistrationDesk, RegistrationForm, Settlement, TechXError,
};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> techxpression_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Intro => run_intro_command(&config).await,
        Commands::Audio(args) => run_audio(&config, args).await,
        Commands::Register(args) => run_register(&config, args).await,
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> techxpression_core::Result<AppConfig> {
    match path {
        Some(path) => {
            tracing::debug!(?path, "loading configuration");
            AppConfig::from_path(path)
        }
        None => Ok(AppConfig::default()),
    }
}

async fn run_intro_command(config: &AppConfig) -> techxpression_core::Result<()> {
    let phases = config.intro.phases.clone();
    let mut sequencer = IntroSequencer::new(&config.intro, || {
        tracing::info!("intro finished, showing landing page");
    })?;

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let status = run_intro(&mut sequencer, cancel_rx, |event| match event {
        IntroEvent::PhaseEntered { name, .. } => tracing::info!(phase = %name, "phase"),
        IntroEvent::LetterRevealed {
            index,
            reveal_count,
        } => {
            let shown: String = phases[*index].text.chars().take(*reveal_count).collect();
            tracing::info!("{shown}");
        }
        IntroEvent::Completed => {}
    })
    .await?;

    tracing::info!(?status, elapsed = ?sequencer.elapsed(), "intro stopped");
    Ok(())
}

async fn run_audio(config: &AppConfig, args: AudioArgs) -> techxpression_core::Result<()> {
    let track = SimulatedTrack {
        block_autoplay: Cell::new(args.block_autoplay),
        unreachable: args.unreachable,
        output: Cell::new(0.0),
    };
    let player = AudioPlayer::new(track, &config.audio);

    if let Some(settlement) = player.initialize().await {
        report(&settlement, "autoplay");
    }

    if let Some(index) = args.level {
        player.select_level(index)?;
    }
    if let Some(volume) = args.volume {
        player.set_volume(volume)?;
    }
    if args.mute {
        player.toggle_mute();
    }
    for _ in 0..args.toggles {
        let settlement = player.toggle_play().await;
        report(&settlement, "toggle");
    }

    tracing::debug!(output = player.resource().output.get(), "resource output volume");
    println!("{}", serde_json::to_string_pretty(&player.snapshot())?);
    Ok(())
}

fn report(settlement: &Settlement, what: &str) {
    match settlement {
        Settlement::Applied => tracing::info!(what, "playback updated"),
        Settlement::Superseded => tracing::debug!(what, "superseded by a newer request"),
        Settlement::Blocked => tracing::info!(what, "playback blocked, press play to start"),
        Settlement::Failed(err) => tracing::warn!(what, error = %err, "playback unavailable"),
    }
}

async fn run_register(config: &AppConfig, args: RegisterArgs) -> techxpression_core::Result<()> {
    let desk = RegistrationDesk::new(&config.registration);
    let mut form = RegistrationForm {
        name: args.name,
        college: args.college,
        course_year: args.course_year,
        phone: args.phone,
        email: args.email,
    };

    let receipt = desk.submit(&args.event, &mut form).await?;
    println!("{}", receipt.message);
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

/// Stand-in for the browser audio element.
struct SimulatedTrack {
    block_autoplay: Cell<bool>,
    unreachable: bool,
    output: Cell<f32>,
}

#[async_trait(?Send)]
impl AudioResource for SimulatedTrack {
    fn load(&self, source: &str, looped: bool) {
        tracing::info!(source, looped, "track loaded");
    }

    async fn play(&self) -> techxpression_core::Result<()> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        if self.unreachable {
            return Err(TechXError::ResourceUnavailable(
                "media source could not be loaded".into(),
            ));
        }
        if self.block_autoplay.replace(false) {
            return Err(TechXError::PlaybackBlocked);
        }
        Ok(())
    }

    async fn pause(&self) -> techxpression_core::Result<()> {
        Ok(())
    }

    fn set_output_volume(&self, volume: f32) {
        self.output.set(volume);
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "TechXpression festival site core", long_about = None)]
struct Cli {
    /// JSON configuration file; defaults are used when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play the intro sequence in real time. Ctrl-C cancels it.
    Intro,
    /// Drive the background player against a simulated track.
    Audio(AudioArgs),
    /// Validate and submit an event registration.
    Register(RegisterArgs),
    /// Print the effective configuration.
    Config,
}

#[derive(clap::Args, Debug)]
struct AudioArgs {
    /// Make the host refuse the autoplay attempt.
    #[arg(long)]
    block_autoplay: bool,
    /// Make the media source unreachable.
    #[arg(long)]
    unreachable: bool,
    /// Number of play/pause toggles to perform after startup.
    #[arg(long, default_value_t = 0)]
    toggles: u32,
    /// Select one of the configured discrete volume levels.
    #[arg(long)]
    level: Option<usize>,
    /// Set an explicit volume in [0, 1].
    #[arg(long)]
    volume: Option<f32>,
    /// Toggle mute once the volume is applied.
    #[arg(long)]
    mute: bool,
}

#[derive(clap::Args, Debug)]
struct RegisterArgs {
    /// Event to register for.
    #[arg(long)]
    event: String,
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    college: String,
    #[arg(long, default_value = "")]
    course_year: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long, default_value = "")]
    email: String,
}
