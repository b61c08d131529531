use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use clap::Parser;

use touch_gestures::config::{Cli, Command, Config};
use touch_gestures::{dump, replay};

fn open_input(path: Option<&Path>) -> io::Result<Box<dyn Read>> {
    match path {
        Some(p) => Ok(Box::new(BufReader::new(File::open(p)?))),
        None => Ok(Box::new(io::stdin().lock())),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let default_filter = match cli.command {
        Some(Command::Dump { .. }) => "warn",
        None => "info",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let config = Config::load(&cli)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match &cli.command {
        Some(Command::Dump { input }) => {
            let reader = open_input(input.as_deref())?;
            if input.is_none() {
                eprintln!("Dumping events from stdin (Ctrl+C to stop):\n");
            }
            dump::run_dump(reader, config.event_size, &mut out)?;
        }
        None => {
            log::info!(
                "touch-gestures starting (profile={}, event size={}, display={})",
                config.profile.name,
                config.event_size,
                config
                    .engine
                    .display
                    .map(|d| format!("{}x{} {}", d.width, d.height, d.orientation))
                    .unwrap_or_else(|| "none".into())
            );
            let reader = open_input(cli.input.as_deref())?;
            replay::run(
                reader,
                config.event_size,
                config.profile,
                &config.engine,
                config.device_id,
                &mut out,
            )?;
        }
    }
    out.flush()?;
    Ok(())
}
