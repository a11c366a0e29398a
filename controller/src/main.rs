use clap::Parser;
use controller::network::{ControllerClient, ControllerConfig};
use rand::Rng;
use shared::TeamColor;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Party word game controller")]
struct Args {
    /// Host address to connect to
    #[clap(short, long, default_value = "127.0.0.1:8080")]
    server: String,
    /// Stable controller id; reconnecting with the same id keeps your team
    #[clap(short, long)]
    id: Option<String>,
    /// Team to ask for (blue or red)
    #[clap(short, long)]
    team: Option<TeamColor>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let controller_id = args
        .id
        .unwrap_or_else(|| format!("controller-{:06x}", rand::thread_rng().gen::<u32>() & 0xff_ffff));

    let config = ControllerConfig {
        server_addr: args.server,
        controller_id,
        requested_team: args.team,
    };

    ControllerClient::new(config).run().await?;
    Ok(())
}
