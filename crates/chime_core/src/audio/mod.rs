//! Audio dispatch boundary.
//!
//! # Responsibility
//! - Define the playback contract the scheduler engine fires into.
//! - Hand sounds to a system player as a detached process.
//!
//! # Invariants
//! - `play` never blocks on playback and never panics into the engine;
//!   every failure is captured and reported as `false`.
//! - Ledger state is owned elsewhere; dispatch outcome must not feed back
//!   into claims.

use log::{error, info};
use std::path::Path;
use std::process::{Command, Stdio};

/// Playback contract consumed by the scheduler engine.
pub trait AudioDispatch {
    /// Attempts to start playback of `sound_path` on `output_device`.
    ///
    /// Returns `true` when playback was successfully handed off. Completion
    /// is never awaited.
    fn play(&self, sound_path: &Path, output_device: &str) -> bool;
}

impl<T: AudioDispatch + ?Sized> AudioDispatch for &T {
    fn play(&self, sound_path: &Path, output_device: &str) -> bool {
        (**self).play(sound_path, output_device)
    }
}

/// Dispatch via system player processes: `aplay` for WAV, `mpg123`
/// otherwise, selected by file extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerCommandDispatch;

impl AudioDispatch for PlayerCommandDispatch {
    fn play(&self, sound_path: &Path, output_device: &str) -> bool {
        if !sound_path.is_file() {
            error!(
                "event=playback_failed module=audio status=error reason=file_not_found path={}",
                sound_path.display()
            );
            return false;
        }

        let (program, device_flag) = player_for(sound_path);
        let spawned = Command::new(program)
            .arg(device_flag)
            .arg(output_device)
            .arg(sound_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(child) => {
                info!(
                    "event=playback_spawned module=audio status=ok player={} pid={} path={} device={}",
                    program,
                    child.id(),
                    sound_path.display(),
                    output_device
                );
                true
            }
            Err(err) => {
                error!(
                    "event=playback_failed module=audio status=error reason=spawn_failed player={} path={} error={}",
                    program,
                    sound_path.display(),
                    err
                );
                false
            }
        }
    }
}

/// Picks the player binary and its output-device flag for a sound file.
fn player_for(sound_path: &Path) -> (&'static str, &'static str) {
    let is_wav = sound_path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("wav"))
        .unwrap_or(false);
    if is_wav {
        ("aplay", "-D")
    } else {
        ("mpg123", "-a")
    }
}

#[cfg(test)]
mod tests {
    use super::{player_for, AudioDispatch, PlayerCommandDispatch};
    use std::path::Path;

    #[test]
    fn wav_extension_selects_aplay_case_insensitively() {
        assert_eq!(player_for(Path::new("bell1.wav")), ("aplay", "-D"));
        assert_eq!(player_for(Path::new("bell1.WAV")), ("aplay", "-D"));
    }

    #[test]
    fn non_wav_extensions_select_mpg123() {
        assert_eq!(player_for(Path::new("bell1.mp3")), ("mpg123", "-a"));
        assert_eq!(player_for(Path::new("bell1")), ("mpg123", "-a"));
    }

    #[test]
    fn missing_file_reports_failure_without_spawning() {
        let dispatch = PlayerCommandDispatch;
        assert!(!dispatch.play(Path::new("/nonexistent/bell1.wav"), "hw:1,0"));
    }
}
