use crate::devices::HeadlessDevices;
use anyhow::{Context, Result};
use colored::*;
use dialoguer::Select;
use roomcall_core::{CallConfig, RoomId};
use roomcall_session::{
    RoomSession, SessionDeps, SessionEvent, SessionEvents, SessionHandle, SessionState,
    WsRelayChannel,
};
use roomcall_webrtc::RtcAgentFactory;
use std::path::PathBuf;
use std::sync::Arc;

pub struct JoinArgs {
    pub room: String,
    pub config: Option<PathBuf>,
    pub signaling_url: Option<String>,
}

#[derive(Clone, Copy)]
enum Action {
    ToggleAudio,
    ToggleVideo,
    ToggleShare,
    EndCall,
}

const MENU: [(&str, Action); 4] = [
    ("Toggle microphone", Action::ToggleAudio),
    ("Toggle camera", Action::ToggleVideo),
    ("Toggle screen share", Action::ToggleShare),
    ("End call", Action::EndCall),
];

fn load_config(args: &JoinArgs) -> Result<CallConfig> {
    let mut config = match &args.config {
        Some(path) => CallConfig::load(path)
            .with_context(|| format!("Failed to load call config {}", path.display()))?,
        None => CallConfig::default(),
    };
    config.apply_env();
    if let Some(url) = &args.signaling_url {
        config.signaling_url = url.clone();
    }
    config.validate().context("Invalid call config")?;
    Ok(config)
}

pub async fn run(args: JoinArgs) -> Result<()> {
    let config = load_config(&args)?;
    let room = RoomId::parse(args.room).context("Room name must not be empty")?;

    println!(
        "{} {}",
        "🔌 Connecting to".cyan(),
        config.signaling_url.as_str().bold()
    );
    let (relay, relay_events) = WsRelayChannel::connect(&config.signaling_url)
        .await
        .context("Failed to reach the relay")?;

    let (session, handle, events) = RoomSession::new(SessionDeps {
        config,
        devices: Arc::new(HeadlessDevices),
        agents: Arc::new(RtcAgentFactory::new()),
        relay: Arc::new(relay),
        relay_events,
    });
    let session_task = tokio::spawn(session.run());
    let printer = tokio::spawn(print_events(events));

    handle
        .start(room.clone())
        .await
        .with_context(|| format!("Failed to join room '{room}'"))?;
    println!(
        "{} {}",
        "🚪 Joined room".green().bold(),
        room.as_str().bold()
    );

    menu_loop(&handle).await?;

    let _ = session_task.await;
    printer.abort();
    println!("{}", "👋 Call ended".green().bold());
    Ok(())
}

async fn menu_loop(handle: &SessionHandle) -> Result<()> {
    loop {
        if handle.state() == SessionState::Ended {
            return Ok(());
        }

        let choice = tokio::task::spawn_blocking(|| {
            let labels: Vec<&str> = MENU.iter().map(|(label, _)| *label).collect();
            Select::new()
                .with_prompt("Call")
                .items(&labels)
                .default(0)
                .interact()
        })
        .await
        .context("Menu task panicked")?
        .context("Failed to read menu choice")?;

        let result = match MENU[choice].1 {
            Action::ToggleAudio => handle
                .toggle_audio()
                .await
                .map(|on| report("Microphone", on)),
            Action::ToggleVideo => handle
                .toggle_video()
                .await
                .map(|on| report("Camera", on)),
            Action::ToggleShare => handle
                .toggle_screen_share()
                .await
                .map(|on| report("Screen share", on)),
            Action::EndCall => {
                handle.end().await;
                return Ok(());
            }
        };

        if let Err(e) = result {
            println!("{} {}", "✖".red().bold(), e.to_string().red());
        }
    }
}

fn report(what: &str, on: bool) {
    let status = if on { "on".green() } else { "off".yellow() };
    println!("{} {}", what.bold(), status);
}

async fn print_events(mut events: SessionEvents) {
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::StateChanged(state) => {
                println!("{} {:?}", "● state".blue(), state);
            }
            SessionEvent::RemoteTrack(track) => {
                println!("{} {} ({})", "▶ remote".green(), track.kind, track.id);
            }
            SessionEvent::ConnectionStateChanged(state) => {
                println!("{} {:?}", "● connection".blue(), state);
            }
            SessionEvent::PeerLeft(peer) => {
                println!("{} {}", "⇠ peer left".yellow(), peer);
            }
            SessionEvent::RoomFull(room) => {
                println!("{} {}", "✖ room is full:".red().bold(), room);
            }
            SessionEvent::ShareStopped => {
                println!("{}", "Screen share stopped".yellow());
            }
            SessionEvent::Recoverable(err) => {
                println!("{} {}", "⚠".yellow().bold(), err.to_string().yellow());
            }
            SessionEvent::LocalStream(_) | SessionEvent::MediaChanged(_) => {}
        }
    }
}
