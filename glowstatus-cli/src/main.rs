mod client;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use crate::client::Client;
use crate::render::Render;

#[derive(Parser)]
#[command(name = "glowstatus")]
#[command(about = "Control the glowstatus daemon: availability status and the light it drives")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current resolved status
    Status,

    /// Pin a manual status (e.g. "focus", "lunch", "meeting_ended_early")
    Set { tag: String },

    /// Clear the manual override and return authority to the calendar
    Clear,

    /// Enable or disable calendar sync
    Sync { state: Toggle },

    /// Enable or disable light control
    Lights { state: Toggle },

    /// Re-evaluate now instead of waiting for the next tick
    Refresh,

    /// Cycle a test palette on the light
    Test,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

impl Toggle {
    fn enabled(self) -> bool {
        matches!(self, Toggle::On)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::connect().await?;

    let report = match cli.command {
        Commands::Status => client.status().await?,
        Commands::Set { tag } => client.set_override(&tag).await?,
        Commands::Clear => client.clear_override().await?,
        Commands::Sync { state } => client.set_sync(state.enabled()).await?,
        Commands::Lights { state } => client.set_lights(state.enabled()).await?,
        Commands::Refresh => client.refresh().await?,
        Commands::Test => {
            client.test_lights().await?;
            println!("Light test cycle started");
            return Ok(());
        }
    };

    println!("{}", report.render());
    Ok(())
}
