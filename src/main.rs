//! Binary entry point: wires the simulated door rig, the clock, and the
//! controller core together and runs the main loop until a termination
//! signal arrives.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

use coopr::args::{self, CliAction, ParsedArgs};
use coopr::clock::{Clock, SystemRtc};
use coopr::config::Config;
use coopr::door::Door;
use coopr::hardware::{DebouncedInput, sim::SimRig};
use coopr::logger::Log;
use coopr::persist::FileStore;
use coopr::{Coop, log_block_start, log_end, log_error_exit, log_version};

fn main() -> Result<()> {
    let parsed = ParsedArgs::parse(std::env::args());

    match parsed.action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            std::process::exit(1);
        }
        CliAction::Run { config_path, quiet } => run(config_path, quiet),
    }
}

fn run(config_path: Option<String>, quiet: bool) -> Result<()> {
    if quiet {
        Log::set_enabled(false);
    }
    log_version!();

    let (config_file, config_result) = match config_path {
        Some(p) => {
            let path = PathBuf::from(p);
            let result = Config::load_from_path(&path);
            (path, result)
        }
        None => (Config::get_config_path()?, Config::load()),
    };
    let config = match config_result {
        Ok(c) => c,
        Err(e) => {
            log_error_exit!("{e:#}");
            log_end!();
            std::process::exit(1);
        }
    };
    config.log_config();

    let running = Arc::new(AtomicBool::new(true));
    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("failed to register signal handlers")?;
    let flag = Arc::clone(&running);
    std::thread::spawn(move || {
        for signal in signals.forever() {
            match signal {
                SIGINT => log_block_start!("Received SIGINT (Ctrl+C), shutting down..."),
                SIGTERM => log_block_start!("Received termination request, shutting down..."),
                _ => {}
            }
            flag.store(false, Ordering::SeqCst);
        }
    });

    // The door hardware is a simulated rig; a deployment on real hardware
    // replaces this block with GPIO-backed Motor/InputPin implementations.
    let rig = SimRig::new(config.door_travel().as_millis() as u64, true);
    let open_switch = DebouncedInput::new(rig.open_switch_pin(), config.switch_debounce());
    let closed_switch = DebouncedInput::new(rig.closed_switch_pin(), config.switch_debounce());
    let override_button = DebouncedInput::new(rig.override_pin(), config.override_debounce());

    let state_file = config_file.with_file_name("state.toml");
    let store = FileStore::open(&state_file)?;

    let door = Door::new(
        rig.motor(),
        open_switch,
        closed_switch,
        Box::new(store),
        config.overrun(),
    );
    let clock = Clock::new(Box::new(SystemRtc), config.rtc_resync());

    let mut coop = Coop::new(&config, clock, door, override_button);
    coop.run(&running)
}
