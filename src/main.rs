use std::io::BufRead;
use std::sync::Arc;
use std::thread;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossbeam::channel::{self, Receiver};
use crossbeam::select;
use tracing::{debug, info, info_span, warn};

use imp_engine::animation::imp::IMP_SHEET;
use imp_engine::assets::{AssetResolver, DirectoryAssets};
use imp_engine::cli::{AudioOutput, Cli};
use imp_engine::command::Command;
use imp_engine::config::{load_config, Options};
use imp_engine::logging::init_logging;
use imp_engine::prefs::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
use imp_engine::sound::{NullBackend, PlaybackBackend, SoundOptions};
use imp_engine::time::{Clock, SystemClock};
use imp_engine::{Assistant, Tip};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Config file first, CLI on top
    let options = load_config(cli.config.as_deref())?;
    let options = cli.merge_into_options(options)?;

    init_logging(options.log_level)?;
    info!("imp-engine {} starting", env!("CARGO_PKG_VERSION"));

    let assets = options
        .assets_dir
        .as_ref()
        .map(|dir| Arc::new(DirectoryAssets::new(dir)) as Arc<dyn AssetResolver>);
    if let Some(ref assets) = assets {
        match assets.sprite_sheet(IMP_SHEET) {
            Some(path) => info!("sprite sheet: {}", path.display()),
            None => warn!("sprite sheet {} not found", IMP_SHEET),
        }
    }

    let store = open_store(&options);
    let backend = open_backend(cli.audio, assets)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());

    let mut assistant = Assistant::mount(&options, store, backend, clock)?;
    let commands = spawn_stdin_reader()?;

    info!("commands: wake, tip <id> [animation], dismiss, hide, show, mischief, click, mute, state, quit");
    run(&mut assistant, commands, &options);

    assistant.unmount();
    info!("imp-engine exiting");
    Ok(())
}

/// Preferences never stop startup: an unreadable file starts empty
fn open_store(options: &Options) -> Arc<dyn PreferenceStore> {
    match options.prefs_path {
        Some(ref path) => {
            info!("preferences: {}", path.display());
            Arc::new(FilePreferenceStore::open_or_empty(path))
        }
        None => {
            info!("preferences: in memory");
            Arc::new(MemoryPreferenceStore::new())
        }
    }
}

fn open_backend(
    output: AudioOutput,
    assets: Option<Arc<dyn AssetResolver>>,
) -> Result<Box<dyn PlaybackBackend>> {
    match output {
        AudioOutput::Null => Ok(Box::new(NullBackend::new())),
        AudioOutput::Rodio => open_rodio(assets),
    }
}

#[cfg(feature = "rodio")]
fn open_rodio(assets: Option<Arc<dyn AssetResolver>>) -> Result<Box<dyn PlaybackBackend>> {
    let Some(assets) = assets else {
        bail!("--audio rodio needs --assets");
    };
    let backend = imp_engine::sound::RodioBackend::new(assets)
        .context("Failed to open audio output")?;
    Ok(Box::new(backend))
}

#[cfg(not(feature = "rodio"))]
fn open_rodio(_assets: Option<Arc<dyn AssetResolver>>) -> Result<Box<dyn PlaybackBackend>> {
    bail!("built without the `rodio` feature")
}

fn spawn_stdin_reader() -> Result<Receiver<Command>> {
    let (tx, rx) = channel::unbounded();
    thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(command) => {
                        if tx.send(command).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!("{}", err),
                }
            }
        })
        .context("Failed to spawn stdin reader")?;
    Ok(rx)
}

/// Pump the assistant every tick until `quit` or end of input
fn run(assistant: &mut Assistant, commands: Receiver<Command>, options: &Options) {
    let _span = info_span!("demo", tick_ms = options.tick.as_millis() as u64).entered();
    let ticker = channel::tick(options.tick);
    loop {
        select! {
            recv(commands) -> msg => match msg {
                Ok(Command::Quit) | Err(_) => break,
                Ok(command) => apply(assistant, command),
            },
            recv(ticker) -> _ => {}
        }

        assistant.advance();
        for change in assistant.drain_frame_changes() {
            debug!(
                at_ms = change.at.as_millis() as u64,
                animation = %change.animation,
                index = change.index,
                "frame {:?}",
                change.frame
            );
        }
    }
}

fn apply(assistant: &mut Assistant, command: Command) {
    match command {
        Command::Wake => assistant.wake_up(),
        Command::Dormant => assistant.go_to_dormant(),
        Command::Tip { id, animation } => {
            let content = format!("tip {}", id);
            let mut tip = Tip::new(&id, &content);
            if let Some(ref name) = animation {
                tip = tip.with_animation(name);
            }
            assistant.show_tip(tip);
        }
        Command::Dismiss => assistant.dismiss_tip(),
        Command::Close => assistant.close_balloon(),
        Command::Show => assistant.show_imp(),
        Command::Hide => assistant.hide_imp(),
        Command::Mischief => assistant.play_mischief(),
        Command::Click => {
            assistant.reset_inactivity_timer();
            let outcome = assistant.play_sound("ui.click", SoundOptions::default());
            info!("ui.click: {:?}", outcome);
        }
        Command::Sound(id) => {
            let outcome = assistant.play_sound(&id, SoundOptions::default());
            info!("{}: {:?}", id, outcome);
        }
        Command::Mute => assistant.disable_audio(),
        Command::Unmute => assistant.enable_audio(),
        Command::Toggle => {
            let enabled = assistant.toggle_audio();
            info!("audio {}", if enabled { "on" } else { "off" });
        }
        Command::State => println!("{:#?}", assistant.snapshot()),
        Command::Quit => {}
    }
}
