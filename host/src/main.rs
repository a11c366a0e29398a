use clap::Parser;
use host::game::GameConfig;
use host::network::{parse_host_command, HostCommand, HostConfig, HostServer};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::unbounded_channel;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Party word game host")]
struct Args {
    /// IP address to bind to
    #[clap(short = 'H', long, default_value = "0.0.0.0")]
    host: String,
    /// Port to listen on
    #[clap(short, long, default_value = "8080")]
    port: u16,
    /// Seconds per turn
    #[clap(short, long, default_value = "60")]
    turn_duration: u32,
    /// Name of the blue team
    #[clap(long, default_value = "Blue")]
    blue_team: String,
    /// Name of the red team
    #[clap(long, default_value = "Red")]
    red_team: String,
    /// Let a bad turn move a team backwards
    #[clap(long)]
    allow_negative: bool,
    /// Word bank file, one word per line (built-in list when omitted)
    #[clap(short, long)]
    words: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let words = match &args.words {
        Some(path) => std::fs::read_to_string(path)?
            .lines()
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    };

    let config = HostConfig {
        bind_addr: format!("{}:{}", args.host, args.port),
        game: GameConfig {
            blue_team_name: args.blue_team,
            red_team_name: args.red_team,
            turn_duration: args.turn_duration,
            allow_negative: args.allow_negative,
        },
        words,
    };

    let (command_tx, command_rx) = unbounded_channel();

    // Operator console: bonus yes|no, next, finish, pause, quit.
    let stdin_tx = command_tx.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            match parse_host_command(&line) {
                Some(command) => {
                    if stdin_tx.send(command).is_err() {
                        break;
                    }
                }
                None => warn!("unknown command: {}", line),
            }
        }
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("host listening on {}", listener.local_addr()?);

    let server = HostServer::new(config);
    tokio::select! {
        _ = server.run(listener, command_rx) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("received Ctrl+C, shutting down");
            let _ = command_tx.send(HostCommand::Shutdown);
        }
    }

    Ok(())
}
