//! Transcoding through external encoders
//!
//! FLAC sources are converted with the reference command-line tools:
//!
//! - MP3: `flac --decode` piped into `lame -V <quality>`
//! - OGG: `oggenc -q <quality>` reading the FLAC file directly
//!
//! A non-zero exit from any stage fails the whole conversion with the stage's
//! captured stderr.

use crate::options::TranscodeSettings;
use crate::{LibraryError, Result};
use async_trait::async_trait;
use musicman_metadata::ContainerFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::str::FromStr;
use tokio::process::Command;
use tracing::debug;

/// Lossy formats a lossless source can be transcoded to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    Mp3,
    Ogg,
}

impl TargetFormat {
    pub fn container(&self) -> ContainerFormat {
        match self {
            TargetFormat::Mp3 => ContainerFormat::Mp3,
            TargetFormat::Ogg => ContainerFormat::Ogg,
        }
    }

    pub fn extension(&self) -> &'static str {
        self.container().extension()
    }

    /// Accepted quality values.
    ///
    /// MP3 uses LAME's VBR scale (0 is best, 9 is smallest); OGG uses
    /// oggenc's scale (-1 is smallest, 10 is best).
    pub fn quality_range(&self) -> RangeInclusive<i32> {
        match self {
            TargetFormat::Mp3 => 0..=9,
            TargetFormat::Ogg => -1..=10,
        }
    }

    /// Whether tags must be written after encoding.
    ///
    /// The decoder hands lame a WAV stream, so mp3 output carries no tags;
    /// oggenc reads the FLAC file itself and copies its comments.
    pub fn needs_tagging(&self) -> bool {
        matches!(self, TargetFormat::Mp3)
    }

    /// Pick the requested quality or the configured default, and check it
    pub fn resolve_quality(&self, requested: Option<i32>, settings: &TranscodeSettings) -> Result<i32> {
        let quality = requested.unwrap_or(match self {
            TargetFormat::Mp3 => settings.mp3_quality,
            TargetFormat::Ogg => settings.ogg_quality,
        });

        let range = self.quality_range();
        if !range.contains(&quality) {
            return Err(LibraryError::Config(format!(
                "{} quality must be within {}..={}, got {}",
                self,
                range.start(),
                range.end(),
                quality
            )));
        }

        Ok(quality)
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for TargetFormat {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mp3" => Ok(TargetFormat::Mp3),
            "ogg" => Ok(TargetFormat::Ogg),
            other => Err(LibraryError::Config(format!(
                "unsupported target format {:?} (expected mp3 or ogg)",
                other
            ))),
        }
    }
}

/// Converts a lossless source file into a lossy target file
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Encode `source` into `dest`.
    ///
    /// `dest` may already exist (empty); implementations overwrite it.
    async fn transcode(
        &self,
        source: &Path,
        dest: &Path,
        target: TargetFormat,
        quality: i32,
    ) -> Result<()>;
}

/// Transcoder running the flac, lame and oggenc executables
#[derive(Debug, Clone)]
pub struct ProcessTranscoder {
    flac_path: PathBuf,
    lame_path: PathBuf,
    oggenc_path: PathBuf,
}

impl ProcessTranscoder {
    pub fn new(settings: &TranscodeSettings) -> Self {
        Self {
            flac_path: settings.flac_path.clone(),
            lame_path: settings.lame_path.clone(),
            oggenc_path: settings.oggenc_path.clone(),
        }
    }

    async fn flac_to_mp3(&self, source: &Path, dest: &Path, quality: i32) -> Result<()> {
        let mut decoder = Command::new(&self.flac_path)
            .args(["--stdout", "--decode", "--silent"])
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error(&self.flac_path))?;

        let decoded: Stdio = decoder
            .stdout
            .take()
            .ok_or_else(|| LibraryError::Transcode {
                stage: "flac",
                status: "no output".to_string(),
                stderr: String::new(),
            })?
            .try_into()
            .map_err(spawn_error(&self.flac_path))?;

        let encoder = Command::new(&self.lame_path)
            .args(["--quiet", "-V"])
            .arg(quality.to_string())
            .arg("-")
            .arg(dest)
            .stdin(decoded)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error(&self.lame_path))?;

        let (decoded, encoded) = tokio::join!(decoder.wait_with_output(), encoder.wait_with_output());

        check_stage("lame", encoded.map_err(spawn_error(&self.lame_path))?)?;
        check_stage("flac", decoded.map_err(spawn_error(&self.flac_path))?)?;

        Ok(())
    }

    async fn flac_to_ogg(&self, source: &Path, dest: &Path, quality: i32) -> Result<()> {
        let output = Command::new(&self.oggenc_path)
            .arg("-q")
            .arg(quality.to_string())
            .arg("--quiet")
            .arg(source)
            .arg("-o")
            .arg(dest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(spawn_error(&self.oggenc_path))?;

        check_stage("oggenc", output)
    }
}

#[async_trait]
impl Transcoder for ProcessTranscoder {
    async fn transcode(
        &self,
        source: &Path,
        dest: &Path,
        target: TargetFormat,
        quality: i32,
    ) -> Result<()> {
        debug!("Encoding {:?} -> {:?} ({} quality {})", source, dest, target, quality);

        match target {
            TargetFormat::Mp3 => self.flac_to_mp3(source, dest, quality).await,
            TargetFormat::Ogg => self.flac_to_ogg(source, dest, quality).await,
        }
    }
}

fn spawn_error(program: &Path) -> impl FnOnce(std::io::Error) -> LibraryError {
    let program = program.display().to_string();
    move |source| LibraryError::Spawn { program, source }
}

fn check_stage(stage: &'static str, output: Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }

    Err(LibraryError::Transcode {
        stage,
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_format_parsing() {
        assert_eq!("mp3".parse::<TargetFormat>().unwrap(), TargetFormat::Mp3);
        assert_eq!("OGG".parse::<TargetFormat>().unwrap(), TargetFormat::Ogg);
        assert!("flac".parse::<TargetFormat>().is_err());
    }

    #[test]
    fn test_quality_defaults_per_format() {
        let settings = TranscodeSettings::default();
        assert_eq!(TargetFormat::Mp3.resolve_quality(None, &settings).unwrap(), 1);
        assert_eq!(TargetFormat::Ogg.resolve_quality(None, &settings).unwrap(), 6);
        assert_eq!(TargetFormat::Ogg.resolve_quality(Some(-1), &settings).unwrap(), -1);
    }

    #[test]
    fn test_quality_out_of_range() {
        let settings = TranscodeSettings::default();
        assert!(TargetFormat::Mp3.resolve_quality(Some(10), &settings).is_err());
        assert!(TargetFormat::Mp3.resolve_quality(Some(-1), &settings).is_err());
        assert!(TargetFormat::Ogg.resolve_quality(Some(11), &settings).is_err());
    }

    #[test]
    fn test_only_mp3_needs_tagging() {
        assert!(TargetFormat::Mp3.needs_tagging());
        assert!(!TargetFormat::Ogg.needs_tagging());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_encoder_reports_stage_and_stderr() {
        let settings = TranscodeSettings {
            oggenc_path: PathBuf::from("sh"),
            ..Default::default()
        };
        let transcoder = ProcessTranscoder::new(&settings);

        // `sh -q ...` is an invalid invocation and exits non-zero
        let err = transcoder
            .transcode(Path::new("in.flac"), Path::new("out.ogg"), TargetFormat::Ogg, 6)
            .await
            .unwrap_err();

        match err {
            LibraryError::Transcode { stage, .. } => assert_eq!(stage, "oggenc"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_encoder_is_spawn_error() {
        let settings = TranscodeSettings {
            oggenc_path: PathBuf::from("/nonexistent/oggenc"),
            ..Default::default()
        };
        let transcoder = ProcessTranscoder::new(&settings);

        let err = transcoder
            .transcode(Path::new("in.flac"), Path::new("out.ogg"), TargetFormat::Ogg, 6)
            .await
            .unwrap_err();

        assert!(matches!(err, LibraryError::Spawn { .. }));
    }
}
