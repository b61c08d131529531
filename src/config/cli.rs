use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::orientation::Orientation;

#[derive(Parser)]
#[command(name = "touch-gestures")]
#[command(about = "Replay raw evdev touch streams and print pointer notifications and gestures")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Built-in device profile (rm2, rmpp)
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Device profile TOML file (takes precedence over --profile)
    #[arg(long, global = true)]
    pub device_file: Option<PathBuf>,

    /// Path to config file
    #[arg(long, env = "TOUCH_GESTURES_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Display width in pixels (natural orientation)
    #[arg(long)]
    pub width: Option<i32>,

    /// Display height in pixels (natural orientation)
    #[arg(long)]
    pub height: Option<i32>,

    /// Display rotation (natural, rotated-90, rotated-180, rotated-270)
    #[arg(long, value_parser = clap::value_parser!(Orientation))]
    pub orientation: Option<Orientation>,

    /// Size of one input_event record: 16 (32-bit) or 24 (64-bit)
    #[arg(long, global = true)]
    pub event_size: Option<usize>,

    /// Device id stamped on every notification
    #[arg(long)]
    pub device_id: Option<i32>,

    /// Raw input_event stream to replay (stdin when omitted)
    pub input: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print decoded raw input events for debugging
    Dump {
        /// Raw input_event stream (stdin when omitted)
        input: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_arguments() {
        let cli = Cli::try_parse_from([
            "touch-gestures",
            "--profile",
            "rmpp",
            "--width",
            "800",
            "--height",
            "600",
            "--orientation",
            "rotated-90",
            "capture.bin",
        ])
        .unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.profile.as_deref(), Some("rmpp"));
        assert_eq!(cli.orientation, Some(Orientation::Rotated90));
        assert_eq!(cli.input, Some(PathBuf::from("capture.bin")));
    }

    #[test]
    fn test_dump_subcommand() {
        let cli = Cli::try_parse_from(["touch-gestures", "dump", "--event-size", "24", "raw.bin"]).unwrap();
        assert_eq!(cli.event_size, Some(24));
        match cli.command {
            Some(Command::Dump { input }) => assert_eq!(input, Some(PathBuf::from("raw.bin"))),
            None => panic!("expected dump"),
        }
    }
}
