//! Neon Garden CLI
//!
//! Starts a host or client session and drives it from the console.

use std::io::{self, BufReader};
use std::process;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{info, warn};

use neon_garden::cli::console::Console;
use neon_garden::cli::{prompt_host_address, prompt_role, Cli};
use neon_garden::engine::TerminalStrip;
use neon_garden::input::{ChannelMidiSource, ControlSurface, MidiListener};
use neon_garden::net::{discover_host, local_ip, resolve_host, CommandSink};
use neon_garden::{GardenError, Role, Session};

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        if let Some(suggestion) = e
            .downcast_ref::<GardenError>()
            .and_then(GardenError::recovery_suggestion)
        {
            eprintln!("{}", suggestion);
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    println!("Welcome to the Collaborative Neon Garden!");
    info!("Neon Garden v{}", env!("CARGO_PKG_VERSION"));

    let config = cli.load_config().context("loading configuration")?;
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    let role = match cli.role() {
        Some(role) => role?,
        None => prompt_role(&mut stdin.lock(), &mut stdout)?,
    };

    let mut session = match role {
        Role::Host => {
            println!("Detected local IP: {}", local_ip());
            let session = Session::host_default(config.clone())?;
            if let Err(e) = session.start_beacon() {
                warn!("Discovery beacon not started: {}", e);
            }
            session
        }
        Role::Client => {
            let host_addr = match &cli.host {
                Some(host) => resolve_host(host, config.stream_port)?,
                None => {
                    println!("Searching for host on LAN...");
                    match discover_host(
                        config.discovery_port,
                        config.discovery_timeout(),
                        config.stream_port,
                    )? {
                        Some(addr) => addr,
                        None => {
                            prompt_host_address(&mut stdin.lock(), &mut stdout, config.stream_port)?
                        }
                    }
                }
            };
            Session::client(config.clone(), host_addr)
                .with_context(|| format!("joining garden at {}", host_addr))?
        }
    };

    warn!(
        "{}",
        GardenError::DeviceUnavailable {
            device: "Audio",
            reason: "no capture driver attached, level stays at 0".to_string(),
        }
    );

    let sink: Arc<dyn CommandSink> = Arc::new(session.dispatcher().clone());
    let (keyboard, virtual_midi) = ChannelMidiSource::new();
    MidiListener::new(Box::new(virtual_midi), config.layers, config.midi_poll_interval())
        .spawn(Arc::clone(&sink))?;

    let stop = Arc::new(AtomicBool::new(false));
    let console = Console {
        surface: ControlSurface::new(sink, session.params().clone(), config.layers),
        keyboard,
        params: session.params().clone(),
    };
    let console_stop = Arc::clone(&stop);
    thread::Builder::new()
        .name("garden-console".to_string())
        .spawn(move || {
            console.run(BufReader::new(io::stdin()), &mut io::stdout(), &console_stop)
        })?;
    println!("Type 'help' for controls.");

    let mut renderer = TerminalStrip::new(io::stdout(), cli.render_every);
    let frames = session.run(&mut renderer, &stop, cli.frames);
    info!("Garden closed after {} frames", frames);
    Ok(())
}
