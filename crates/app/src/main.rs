use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use drone_alert_core::{
    AlertError, AlertLoop, AlertSettings, AppConfig, CommandPlayer, PlaybackBackend, Player,
    RandomDetector, ShutdownSignal, ThreadSleeper,
};
use tracing_subscriber::EnvFilter;

fn main() -> drone_alert_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Run(overrides) => {
            overrides.apply(&mut config);
            config.validate()?;
            run_alert_loop(&config, overrides.max_polls)
        }
        Commands::Play { file, backend } => {
            if let Some(backend) = backend {
                config.playback.backend = backend.into();
            }
            config.validate()?;
            play_once(&config, &file)
        }
        Commands::Config => {
            config.validate()?;
            println!("{}", config.to_json()?);
            Ok(())
        }
    }
}

fn run_alert_loop(config: &AppConfig, max_polls: Option<u64>) -> drone_alert_core::Result<()> {
    let shutdown = ShutdownSignal::new();
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || shutdown.trigger())
            .map_err(|err| AlertError::config(format!("cannot install Ctrl-C handler: {err}")))?;
    }

    let detector = RandomDetector::from_config(&config.detection)?;
    let player = build_player(config)?;
    let sleeper = ThreadSleeper::interruptible(shutdown.clone());
    let mut alert = AlertLoop::new(detector, player, sleeper, AlertSettings::from_config(config));

    let stats = match max_polls {
        Some(limit) => alert.run_for(limit, &shutdown),
        None => alert.run(&shutdown),
    };

    if shutdown.is_triggered() {
        tracing::info!("program stopped by user, shutting down");
    }
    tracing::debug!(stats = %serde_json::to_string(&stats)?, "run summary");
    Ok(())
}

fn play_once(config: &AppConfig, file: &Path) -> drone_alert_core::Result<()> {
    let mut player = build_player(config)?;
    player.play(file)
}

fn build_player(config: &AppConfig) -> drone_alert_core::Result<Box<dyn Player>> {
    match config.playback.backend {
        PlaybackBackend::Command => Ok(Box::new(CommandPlayer::from_config(&config.playback)?)),
        #[cfg(feature = "rodio")]
        PlaybackBackend::Rodio => Ok(Box::new(drone_alert_core::RodioPlayer::from_config(
            &config.playback,
        ))),
        #[cfg(not(feature = "rodio"))]
        PlaybackBackend::Rodio => Err(AlertError::config(
            "the rodio backend requires building with `--features rodio`",
        )),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Plays an alert clip when a person is detected", long_about = None)]
struct Cli {
    /// JSON configuration file. Missing fields use built-in defaults.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Poll the detector and play the alert clip on every detection.
    Run(RunArgs),
    /// Play a clip once to check the speaker wiring.
    Play {
        file: PathBuf,
        #[arg(long, value_enum)]
        backend: Option<BackendArg>,
    },
    /// Print the effective configuration as JSON.
    Config,
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Clip played on each detection.
    #[arg(short, long)]
    audio_file: Option<PathBuf>,
    /// Seconds to wait after an alert before polling again.
    #[arg(long)]
    cooldown_secs: Option<f64>,
    /// Seconds to wait after a poll that saw nobody.
    #[arg(long)]
    idle_secs: Option<f64>,
    /// Chance of a simulated detection per poll.
    #[arg(short, long)]
    probability: Option<f64>,
    /// Seed for reproducible simulated detections.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,
    /// Stop after this many polls instead of running until Ctrl-C.
    #[arg(long)]
    max_polls: Option<u64>,
}

impl RunArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(file) = &self.audio_file {
            config.playback.audio_file = file.clone();
        }
        if let Some(secs) = self.cooldown_secs {
            config.timing.cooldown_secs = secs;
        }
        if let Some(secs) = self.idle_secs {
            config.timing.idle_interval_secs = secs;
        }
        if let Some(probability) = self.probability {
            config.detection.probability = probability;
        }
        if self.seed.is_some() {
            config.detection.seed = self.seed;
        }
        if let Some(backend) = self.backend {
            config.playback.backend = backend.into();
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum BackendArg {
    Command,
    Rodio,
}

impl From<BackendArg> for PlaybackBackend {
    fn from(value: BackendArg) -> Self {
        match value {
            BackendArg::Command => PlaybackBackend::Command,
            BackendArg::Rodio => PlaybackBackend::Rodio,
        }
    }
}
