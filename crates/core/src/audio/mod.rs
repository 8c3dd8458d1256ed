use std::{
    io,
    path::Path,
    process::{Child, Command, Stdio},
    time::Duration,
};

use crate::{AlertError, PlaybackConfig, Result};

/// Blocking playback of a single alert clip.
///
/// Implementations return only after the clip finished (or failed). A
/// missing file must be reported as [`AlertError::MissingAudio`] and backend
/// failures as [`AlertError::Playback`] so the loop can treat both as
/// recoverable.
pub trait Player {
    fn play(&mut self, path: &Path) -> Result<()>;
}

impl<P: Player + ?Sized> Player for Box<P> {
    fn play(&mut self, path: &Path) -> Result<()> {
        (**self).play(path)
    }
}

fn ensure_clip_exists(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(AlertError::MissingAudio(path.to_path_buf()))
    }
}

/// Plays clips by running an external player program (`mpg123`, `aplay`,
/// `ffplay -nodisp -autoexit`, ...) and waiting for it to exit.
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
    poll_interval: Duration,
}

impl CommandPlayer {
    pub fn new(program: impl Into<String>, args: Vec<String>, poll_interval: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            poll_interval,
        }
    }

    pub fn from_config(config: &PlaybackConfig) -> Result<Self> {
        let (program, args) = config
            .command
            .split_first()
            .ok_or_else(|| AlertError::config("command backend needs a player program"))?;
        Ok(Self::new(program.clone(), args.to_vec(), config.poll_interval()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Player for CommandPlayer {
    fn play(&mut self, path: &Path) -> Result<()> {
        ensure_clip_exists(path)?;

        tracing::info!(file = %path.display(), program = %self.program, "loading audio file");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|err| {
                AlertError::playback(format!("failed to start `{}`: {err}", self.program))
            })?;

        tracing::info!("playing alert sound");
        let status = loop {
            let polled = child.try_wait();
            match stop_on_error(&mut child, polled)? {
                Some(status) => break status,
                None => std::thread::sleep(self.poll_interval),
            }
        };

        if status.success() {
            tracing::info!("playback finished");
            Ok(())
        } else {
            Err(AlertError::playback(format!(
                "`{}` exited with {status}",
                self.program
            )))
        }
    }
}

/// Kills and reaps `child` when `result` is an error so the player does not
/// outlive the failed playback.
fn stop_on_error<T>(child: &mut Child, result: io::Result<T>) -> Result<T> {
    result.map_err(|err| {
        let _ = child.kill();
        let _ = child.wait();
        err.into()
    })
}

/// In-process playback on the default output device.
///
/// The device is opened per clip and released once the clip drains.
#[cfg(feature = "rodio")]
#[derive(Debug, Clone)]
pub struct RodioPlayer {
    poll_interval: Duration,
}

#[cfg(feature = "rodio")]
impl RodioPlayer {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    pub fn from_config(config: &PlaybackConfig) -> Self {
        Self::new(config.poll_interval())
    }
}

#[cfg(feature = "rodio")]
impl Player for RodioPlayer {
    fn play(&mut self, path: &Path) -> Result<()> {
        use std::{fs::File, io::BufReader};

        ensure_clip_exists(path)?;

        tracing::info!(file = %path.display(), "loading audio file");
        let file = File::open(path)?;
        let source = rodio::Decoder::new(BufReader::new(file))
            .map_err(|err| AlertError::playback(format!("cannot decode clip: {err}")))?;

        let (_stream, handle) = rodio::OutputStream::try_default()
            .map_err(|err| AlertError::playback(format!("no output device: {err}")))?;
        let sink = rodio::Sink::try_new(&handle)
            .map_err(|err| AlertError::playback(format!("cannot open sink: {err}")))?;

        tracing::info!("playing alert sound");
        sink.append(source);
        while !sink.empty() {
            std::thread::sleep(self.poll_interval);
        }

        tracing::info!("playback finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn fixture(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "drone-alert-{}-{name}",
            std::process::id()
        ));
        std::fs::write(&path, b"not really audio").unwrap();
        path
    }

    #[test]
    fn missing_clip_is_reported_before_spawning() {
        let mut player = CommandPlayer::new(
            "definitely-not-a-player",
            Vec::new(),
            Duration::from_millis(10),
        );
        let err = player.play(Path::new("/nonexistent/sound.mp3")).unwrap_err();
        assert!(matches!(err, AlertError::MissingAudio(_)));
    }

    #[test]
    fn unknown_program_is_a_playback_error() {
        let clip = fixture("unknown.mp3");
        let mut player = CommandPlayer::new(
            "definitely-not-a-player",
            Vec::new(),
            Duration::from_millis(10),
        );
        let err = player.play(&clip).unwrap_err();
        assert!(matches!(err, AlertError::Playback(_)));
        assert!(err.is_recoverable());
        let _ = std::fs::remove_file(clip);
    }

    #[cfg(unix)]
    #[test]
    fn successful_exit_finishes_playback() {
        let clip = fixture("ok.mp3");
        let mut player = CommandPlayer::new("true", Vec::new(), Duration::from_millis(10));
        assert!(player.play(&clip).is_ok());
        let _ = std::fs::remove_file(clip);
    }

    #[cfg(unix)]
    #[test]
    fn failing_exit_is_a_playback_error() {
        let clip = fixture("fail.mp3");
        let mut player = CommandPlayer::new("false", Vec::new(), Duration::from_millis(10));
        let err = player.play(&clip).unwrap_err();
        assert!(matches!(err, AlertError::Playback(_)));
        let _ = std::fs::remove_file(clip);
    }

    #[cfg(unix)]
    #[test]
    fn waits_for_the_player_to_exit() {
        let clip = fixture("slow.mp3");
        let mut player = CommandPlayer::new(
            "sh",
            vec!["-c".to_string(), "sleep 0.2".to_string()],
            Duration::from_millis(20),
        );
        let start = std::time::Instant::now();
        player.play(&clip).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(200));
        let _ = std::fs::remove_file(clip);
    }

    #[cfg(unix)]
    #[test]
    fn wait_error_stops_the_player() {
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        let failed: io::Result<()> = Err(io::Error::new(io::ErrorKind::Other, "wait failed"));

        let err = stop_on_error(&mut child, failed).unwrap_err();
        assert!(matches!(err, AlertError::Io(_)));
        assert!(child.try_wait().unwrap().is_some());
    }

    #[test]
    fn builds_from_default_config() {
        let player = CommandPlayer::from_config(&PlaybackConfig::default()).unwrap();
        assert_eq!(player.program(), "mpg123");
    }
}
