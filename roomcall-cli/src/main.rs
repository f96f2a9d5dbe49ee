mod devices;
mod join;
mod serve;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "roomcall")]
#[command(about = "Two-party room calls over a rendezvous relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the rendezvous relay.
    Serve {
        /// Relay config file (TOML).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Listen address [default: 0.0.0.0:3000]
        #[arg(long)]
        bind: Option<String>,

        /// Participants per room [default: 2]
        #[arg(long)]
        room_capacity: Option<usize>,
    },

    /// Join a room and drive the call from a menu.
    Join {
        room: String,

        /// Call config file (TOML).
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, env = "ROOMCALL_SIGNALING_URL")]
        signaling_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve {
            config,
            bind,
            room_capacity,
        } => {
            serve::run(serve::ServeArgs {
                config,
                bind,
                room_capacity,
            })
            .await
        }
        Commands::Join {
            room,
            config,
            signaling_url,
        } => {
            join::run(join::JoinArgs {
                room,
                config,
                signaling_url,
            })
            .await
        }
    }
}
