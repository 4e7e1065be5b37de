//! Command-line configuration.

use std::time::Duration;

use bevy::prelude::*;
use clap::{ArgGroup, Parser};
use pointstream::archive::DEFAULT_GROUP;

#[derive(Parser, Debug)]
#[command(name = "pointstream-viewer", version, about)]
#[command(group(ArgGroup::new("source").required(true).args(["stream", "archive"])))]
pub struct Args {
    /// WebSocket URL of a live frame stream (e.g. ws://127.0.0.1:9001).
    #[arg(long)]
    pub stream: Option<String>,

    /// HTTP URL of a JSON frame archive.
    #[arg(long)]
    pub archive: Option<String>,

    /// Archive group that holds the frames.
    #[arg(long, default_value = DEFAULT_GROUP)]
    pub group: String,

    /// Milliseconds between archive frames.
    #[arg(long, default_value_t = 100)]
    pub frame_interval_ms: u64,
}

/// Where frames come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Stream(String),
    Archive(String),
}

/// Validated viewer settings.
#[derive(Resource, Debug, Clone)]
pub struct ViewerConfig {
    pub source: Source,
    pub group: String,
    pub frame_interval: Duration,
}

impl TryFrom<Args> for ViewerConfig {
    type Error = anyhow::Error;

    fn try_from(args: Args) -> anyhow::Result<Self> {
        let source = match (args.stream, args.archive) {
            (Some(url), None) => Source::Stream(url),
            (None, Some(url)) => Source::Archive(url),
            _ => anyhow::bail!("exactly one of --stream or --archive is required"),
        };
        if args.frame_interval_ms == 0 {
            anyhow::bail!("--frame-interval-ms must be positive");
        }
        Ok(Self {
            source,
            group: args.group,
            frame_interval: Duration::from_millis(args.frame_interval_ms),
        })
    }
}

impl ViewerConfig {
    #[must_use]
    pub fn is_stream(&self) -> bool {
        matches!(self.source, Source::Stream(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<ViewerConfig> {
        let args = Args::try_parse_from(std::iter::once("pointstream-viewer").chain(args.iter().copied()))?;
        ViewerConfig::try_from(args)
    }

    #[test]
    fn stream_source() {
        let config = parse(&["--stream", "ws://localhost:9001"]).unwrap();
        assert_eq!(config.source, Source::Stream("ws://localhost:9001".into()));
        assert!(config.is_stream());
        assert_eq!(config.group, "frames");
    }

    #[test]
    fn archive_source_with_interval() {
        let config = parse(&["--archive", "http://host/a.json", "--frame-interval-ms", "40"]).unwrap();
        assert_eq!(config.source, Source::Archive("http://host/a.json".into()));
        assert_eq!(config.frame_interval, Duration::from_millis(40));
    }

    #[test]
    fn sources_are_exclusive_and_required() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--stream", "ws://a", "--archive", "http://b"]).is_err());
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(parse(&["--archive", "http://b", "--frame-interval-ms", "0"]).is_err());
    }
}
