//! Command-line argument parsing

use crate::core::descriptor::{MediaKind, Quality};
use crate::core::history::HistoryLog;
use crate::core::session::SessionConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Requested quality ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QualityArg {
    Hd,
    #[value(name = "720p")]
    Hd720,
    Sd,
}

impl From<QualityArg> for Quality {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::Hd => Quality::Hd,
            QualityArg::Hd720 => Quality::Hd720,
            QualityArg::Sd => Quality::Sd,
        }
    }
}

/// TikTok video and audio downloader
#[derive(Parser, Debug)]
#[command(name = "ttgrab", version, about = "Download TikTok videos and audio without watermarks")]
pub struct Args {
    /// Video URL, pasted link collection, or creator handle with --channel
    pub input: Option<String>,

    /// Treat the input as a pasted collection of links
    #[arg(long)]
    pub bulk: bool,

    /// Download the audio track instead of the video
    #[arg(long)]
    pub audio: bool,

    /// Quality ceiling; lower rungs are tried when a rung is unavailable
    #[arg(long, value_enum, default_value = "hd")]
    pub quality: QualityArg,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Per-provider request timeout (e.g. "8s", "500ms")
    #[arg(long, value_parser = humantime::parse_duration, default_value = "8s")]
    pub timeout: Duration,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// List and download recent posts of a creator handle
    #[arg(long)]
    pub channel: bool,

    /// Print the download history and exit
    #[arg(long)]
    pub show_history: bool,

    /// Clear the download history and exit
    #[arg(long)]
    pub clear_history: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    pub fn media_kind(&self) -> MediaKind {
        if self.audio {
            MediaKind::Audio
        } else {
            MediaKind::Video
        }
    }

    /// Assemble the session configuration from the parsed flags
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            output_dir: self
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(".")),
            kind: self.media_kind(),
            quality: self.quality.into(),
            history_path: HistoryLog::default_path(),
        }
    }
}
