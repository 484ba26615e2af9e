//! Command-line interface definition
use crate::config::Settings;
use clap::{Args, Parser, Subcommand};
use musicman_library::{Command, RunOptions, TargetFormat};
use musicman_metadata::ContainerFormat;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "music-man")]
#[command(version, about = "Organize, compare and transcode tagged music libraries", long_about = None)]
pub struct Cli {
    /// Log what would be done without writing any files
    #[arg(short = 'n', long, global = true)]
    pub dry_run: bool,

    /// Only report warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report every decision, including skipped files
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Overwrite existing destination files
    #[arg(long, global = true)]
    pub force: bool,

    /// Configuration file (default: ./music-man.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Copy every tagged track into an organized output library
    Copy {
        #[command(flatten)]
        library: LibraryArgs,

        /// Input library directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output library directory
        output: PathBuf,
    },

    /// Copy the tracks of SOURCE that REFERENCE does not have
    CopyDiff {
        #[command(flatten)]
        library: LibraryArgs,

        #[command(flatten)]
        matching: MatchArgs,

        source: PathBuf,
        reference: PathBuf,
        output: PathBuf,
    },

    /// Copy the tracks of SOURCE that REFERENCE also has
    CopyIntersect {
        #[command(flatten)]
        library: LibraryArgs,

        #[command(flatten)]
        matching: MatchArgs,

        source: PathBuf,
        reference: PathBuf,
        output: PathBuf,
    },

    /// Transcode every FLAC track into MP3 or OGG
    Transcode {
        /// Target format
        #[arg(short = 't', long = "format", default_value = "mp3", value_parser = parse_target)]
        format: TargetFormat,

        /// Encoder quality (mp3: 0-9, lower is better; ogg: -1-10, higher is better)
        #[arg(long, allow_negative_numbers = true)]
        quality: Option<i32>,

        /// Copy tracks with more than two channels instead of transcoding them
        #[arg(long)]
        keep_multichannel: bool,

        /// Always copy, never use hard links
        #[arg(short = 'c', long)]
        copy_only: bool,

        /// Input library directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output library directory
        output: PathBuf,
    },

    /// Remove the output files corresponding to the input tracks
    Delete {
        /// File extensions to include (comma separated)
        #[arg(short = 'e', long = "ext", value_delimiter = ',', value_parser = parse_format)]
        extensions: Option<Vec<ContainerFormat>>,

        /// Format of the files to remove (default: the input file's own)
        #[arg(short = 't', long = "format", value_parser = parse_target)]
        format: Option<TargetFormat>,

        /// Input library directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output library directory
        output: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
pub struct LibraryArgs {
    /// File extensions to include (comma separated)
    #[arg(short = 'e', long = "ext", value_delimiter = ',', value_parser = parse_format)]
    pub extensions: Option<Vec<ContainerFormat>>,

    /// Always copy, never use hard links
    #[arg(short = 'c', long)]
    pub copy_only: bool,
}

#[derive(Debug, Clone, Args)]
pub struct MatchArgs {
    /// Extensions that count as a match in the reference library (comma separated)
    #[arg(long = "match-ext", value_delimiter = ',', value_parser = parse_format)]
    pub match_extensions: Option<Vec<ContainerFormat>>,
}

fn parse_format(s: &str) -> Result<ContainerFormat, String> {
    ContainerFormat::from_extension(s.trim().trim_start_matches('.'))
        .ok_or_else(|| format!("unsupported extension {:?} (expected flac, mp3 or ogg)", s))
}

fn parse_target(s: &str) -> Result<TargetFormat, String> {
    s.parse().map_err(|e: musicman_library::LibraryError| e.to_string())
}

impl Cli {
    /// Combine flags with loaded settings into the library's run inputs
    pub fn into_run(self, settings: Settings) -> (Command, PathBuf, RunOptions) {
        let mut options = RunOptions {
            dry_run: self.dry_run,
            force: self.force,
            copy_only: false,
            keep_multichannel: false,
            follow_links: settings.library.follow_links,
            extensions: settings.library.extensions,
            match_extensions: settings.library.match_extensions,
            transcode: settings.transcode,
        };

        let (command, output) = match self.command {
            Commands::Copy {
                library,
                inputs,
                output,
            } => {
                library.apply(&mut options);
                (Command::Copy { inputs }, output)
            }
            Commands::CopyDiff {
                library,
                matching,
                source,
                reference,
                output,
            } => {
                library.apply(&mut options);
                matching.apply(&mut options);
                (
                    Command::CopyDiff {
                        source: vec![source],
                        reference,
                    },
                    output,
                )
            }
            Commands::CopyIntersect {
                library,
                matching,
                source,
                reference,
                output,
            } => {
                library.apply(&mut options);
                matching.apply(&mut options);
                (
                    Command::CopyIntersect {
                        source: vec![source],
                        reference,
                    },
                    output,
                )
            }
            Commands::Transcode {
                format,
                quality,
                keep_multichannel,
                copy_only,
                inputs,
                output,
            } => {
                options.keep_multichannel = keep_multichannel;
                options.copy_only = copy_only;
                (
                    Command::Transcode {
                        inputs,
                        target: format,
                        quality,
                    },
                    output,
                )
            }
            Commands::Delete {
                extensions,
                format,
                inputs,
                output,
            } => {
                if let Some(extensions) = extensions {
                    options.extensions = extensions;
                }
                (
                    Command::Delete {
                        inputs,
                        target: format,
                    },
                    output,
                )
            }
        };

        (command, output, options)
    }
}

impl LibraryArgs {
    fn apply(self, options: &mut RunOptions) {
        if let Some(extensions) = self.extensions {
            options.extensions = extensions;
        }
        options.copy_only = self.copy_only;
    }
}

impl MatchArgs {
    fn apply(self, options: &mut RunOptions) {
        if let Some(match_extensions) = self.match_extensions {
            options.match_extensions = match_extensions;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> (Command, PathBuf, RunOptions) {
        Cli::try_parse_from(args)
            .unwrap()
            .into_run(Settings::default())
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_copy_with_several_inputs() {
        let (command, output, options) =
            parse(&["music-man", "-n", "copy", "-e", "flac,MP3", "-c", "in1", "in2", "out"]);

        assert_eq!(
            command,
            Command::Copy {
                inputs: vec![PathBuf::from("in1"), PathBuf::from("in2")]
            }
        );
        assert_eq!(output, PathBuf::from("out"));
        assert!(options.dry_run);
        assert!(options.copy_only);
        assert_eq!(options.extensions, vec![ContainerFormat::Flac, ContainerFormat::Mp3]);
    }

    #[test]
    fn test_copy_diff_match_extensions() {
        let (command, _, options) =
            parse(&["music-man", "copy-diff", "--match-ext", "mp3", "a", "b", "out", "--force"]);

        assert_eq!(
            command,
            Command::CopyDiff {
                source: vec![PathBuf::from("a")],
                reference: PathBuf::from("b"),
            }
        );
        assert!(options.force);
        assert_eq!(options.match_extensions, vec![ContainerFormat::Mp3]);
        assert_eq!(options.extensions.len(), 3);
    }

    #[test]
    fn test_transcode_flags() {
        let (command, _, options) = parse(&[
            "music-man",
            "transcode",
            "-t",
            "ogg",
            "--quality",
            "-1",
            "--keep-multichannel",
            "in",
            "out",
        ]);

        assert_eq!(
            command,
            Command::Transcode {
                inputs: vec![PathBuf::from("in")],
                target: TargetFormat::Ogg,
                quality: Some(-1),
            }
        );
        assert!(options.keep_multichannel);
    }

    #[test]
    fn test_transcode_defaults_to_mp3() {
        let (command, _, _) = parse(&["music-man", "transcode", "in", "out"]);
        assert!(matches!(
            command,
            Command::Transcode {
                target: TargetFormat::Mp3,
                quality: None,
                ..
            }
        ));
    }

    #[test]
    fn test_bad_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["music-man", "copy", "only-one"]).is_err());
        assert!(Cli::try_parse_from(["music-man", "copy", "-e", "wav", "in", "out"]).is_err());
        assert!(Cli::try_parse_from(["music-man", "transcode", "-t", "flac", "in", "out"]).is_err());
        assert!(Cli::try_parse_from(["music-man", "-q", "-v", "copy", "in", "out"]).is_err());
    }
}
