mod cli;
mod file;
mod properties;
mod reader;

pub use cli::{Cli, Command};
pub use properties::PropertyMap;
pub use reader::{DisplayConfig, GestureConfig, ReaderConfig};

use crate::device::DeviceProfile;
use crate::error::{Error, Result};
use crate::input::event::{INPUT_EVENT_SIZE_32, INPUT_EVENT_SIZE_64};
use crate::orientation::Orientation;

const DEFAULT_PROFILE: &str = "rm2";

/// Merged configuration from CLI args, TOML file and device profile.
#[derive(Debug, Clone)]
pub struct Config {
    pub profile: DeviceProfile,
    pub engine: ReaderConfig,
    pub device_id: i32,
    pub event_size: usize,
}

impl Config {
    /// Load configuration by merging TOML file with CLI overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let file_config = cli
            .config
            .as_ref()
            .and_then(|p| file::load_from_path(p))
            .or_else(file::load_from_default_paths)
            .unwrap_or_default();

        let profile = match (&cli.device_file, &file_config.device_file) {
            (Some(path), _) | (None, Some(path)) => DeviceProfile::load(path)?,
            (None, None) => {
                let name = cli
                    .profile
                    .as_deref()
                    .or(file_config.profile.as_deref())
                    .unwrap_or(DEFAULT_PROFILE);
                DeviceProfile::builtin(name)?
            }
        };

        let mut engine = file_config.engine;
        engine.display = merge_display(cli, engine.display, profile.display)?;

        let event_size = cli
            .event_size
            .or(file_config.event_size)
            .unwrap_or(profile.input_event_size);
        if event_size != INPUT_EVENT_SIZE_32 && event_size != INPUT_EVENT_SIZE_64 {
            return Err(Error::InvalidEventSize(event_size));
        }

        Ok(Self {
            device_id: cli.device_id.or(file_config.device_id).unwrap_or(0),
            profile,
            engine,
            event_size,
        })
    }
}

/// CLI dimensions win over the file, which wins over the profile. A CLI
/// orientation applies to whichever display was chosen.
fn merge_display(
    cli: &Cli,
    file: Option<DisplayConfig>,
    profile: Option<(i32, i32)>,
) -> Result<Option<DisplayConfig>> {
    let mut display = match (cli.width, cli.height) {
        (Some(width), Some(height)) => Some(DisplayConfig {
            width,
            height,
            orientation: Orientation::Natural,
        }),
        (None, None) => file.or_else(|| {
            profile.map(|(width, height)| DisplayConfig {
                width,
                height,
                orientation: Orientation::Natural,
            })
        }),
        _ => {
            return Err(Error::InvalidDisplay(
                "--width and --height must be given together".into(),
            ))
        }
    };

    if let Some(d) = display.as_mut() {
        if d.width <= 0 || d.height <= 0 {
            return Err(Error::InvalidDisplay(format!("{}x{}", d.width, d.height)));
        }
        if let Some(orientation) = cli.orientation {
            d.orientation = orientation;
        }
    }
    Ok(display)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["touch-gestures"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_display_precedence() {
        let file = Some(DisplayConfig {
            width: 100,
            height: 200,
            orientation: Orientation::Rotated180,
        });

        let d = merge_display(&cli(&[]), file, Some((1, 2))).unwrap().unwrap();
        assert_eq!((d.width, d.height, d.orientation), (100, 200, Orientation::Rotated180));

        let d = merge_display(&cli(&["--width", "30", "--height", "40"]), file, None)
            .unwrap()
            .unwrap();
        assert_eq!((d.width, d.height, d.orientation), (30, 40, Orientation::Natural));

        let d = merge_display(&cli(&["--orientation", "90"]), None, Some((1404, 1872)))
            .unwrap()
            .unwrap();
        assert_eq!((d.width, d.height, d.orientation), (1404, 1872, Orientation::Rotated90));

        assert_eq!(merge_display(&cli(&[]), None, None).unwrap(), None);
    }

    #[test]
    fn test_invalid_display() {
        assert!(matches!(
            merge_display(&cli(&["--width", "30"]), None, None),
            Err(Error::InvalidDisplay(_))
        ));
        assert!(matches!(
            merge_display(&cli(&["--width", "0", "--height", "10"]), None, None),
            Err(Error::InvalidDisplay(_))
        ));
    }
}
