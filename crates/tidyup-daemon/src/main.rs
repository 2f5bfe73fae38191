//! Headless TidyUp shell.
//!
//! Loads state, then forwards menu commands from stdin and Ctrl-C to the
//! controller as intents. State is saved after every change and on quit.

mod menu;

use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tidyup_core::{intent_channel, Controller, Intent, IntentSender, TidyConfig};

#[derive(Parser, Debug)]
#[command(name = "tidyup-daemon", version, about = "Tidy aged files out of watched directories")]
struct Args {
    /// Directory holding the watch list, file list and settings
    /// (defaults to $TIDYUP_DATA_DIR or the platform data directory)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

/// Read menu commands on a plain thread so a blocked stdin read never holds
/// up runtime shutdown. Sends block while the controller catches up.
fn spawn_menu_reader(sender: IntentSender) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    log::warn!("Stopped reading commands: {}", e);
                    return;
                }
            };
            match menu::parse_command(&line) {
                Ok(Some(intent)) => {
                    let quit = intent == Intent::Quit;
                    if !sender.blocking_send(intent) || quit {
                        return;
                    }
                }
                Ok(None) => {}
                Err(e) => log::warn!("{} ({})", e, menu::HELP),
            }
        }
        log::debug!("stdin closed, waiting for Ctrl-C");
    });
}

fn spawn_signal_handler(sender: IntentSender) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::info!("Interrupted");
                sender.send(Intent::Quit).await;
            }
            Err(e) => log::error!("Failed to listen for Ctrl-C: {}", e),
        }
    });
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match TidyConfig::resolve(args.data_dir) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let controller = match Controller::start(config) {
        Ok(controller) => controller,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let (sender, intents) = intent_channel();

    spawn_signal_handler(sender.clone());
    spawn_menu_reader(sender);
    log::info!("Ready. {}", menu::HELP);

    match controller.run(intents).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
