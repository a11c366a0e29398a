//! TCP client for the controller: identifies itself, answers heartbeats,
//! forwards console actions, and renders each state sync it receives.

use crate::input::parse_command;
use crate::view::render_sync;
use log::{debug, info, warn};
use shared::frame::{read_packet, write_packet};
use shared::{GameAction, Packet, TeamColor};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub server_addr: String,
    pub controller_id: String,
    pub requested_team: Option<TeamColor>,
}

pub struct ControllerClient {
    config: ControllerConfig,
}

impl ControllerClient {
    pub fn new(config: ControllerConfig) -> Self {
        Self { config }
    }

    /// Connects, identifies, and runs until the server closes the
    /// connection, rejects us, or stdin ends.
    pub async fn run(self) -> std::io::Result<()> {
        let stream = TcpStream::connect(&self.config.server_addr).await?;
        stream.set_nodelay(true)?;
        info!("connected to {}", self.config.server_addr);
        let (reader, mut writer) = stream.into_split();

        write_packet(
            &mut writer,
            &Packet::Identify {
                controller_id: self.config.controller_id.clone(),
                requested_team: self.config.requested_team,
            },
        )
        .await?;

        let (packet_tx, mut packet_rx) = unbounded_channel();
        let reader_task = tokio::spawn(read_loop(reader, packet_tx));

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                packet = packet_rx.recv() => {
                    let Some(packet) = packet else {
                        info!("server closed the connection");
                        break;
                    };
                    match packet {
                        Packet::Ping => {
                            write_packet(&mut writer, &Packet::Pong).await?;
                        }
                        Packet::SyncState { payload } => {
                            println!("{}", render_sync(&payload));
                        }
                        Packet::ConnectionRejected { reason } => {
                            warn!("connection rejected: {}", reason);
                            break;
                        }
                        other => debug!("unexpected packet: {:?}", other),
                    }
                }
                line = lines.next_line() => {
                    let Ok(Some(line)) = line else {
                        info!("stdin closed, disconnecting");
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match parse_command(&line) {
                        Some(action) => {
                            send_action(&mut writer, action).await?;
                        }
                        None => warn!("unknown command: {}", line),
                    }
                }
            }
        }

        reader_task.abort();
        Ok(())
    }
}

async fn send_action<W>(writer: &mut W, action: GameAction) -> std::io::Result<()>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    write_packet(writer, &Packet::Action { payload: action }).await
}

async fn read_loop(mut reader: OwnedReadHalf, packets: UnboundedSender<Packet>) {
    loop {
        match read_packet(&mut reader).await {
            Ok(packet) => {
                if packets.send(packet).is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!("read ended: {}", e);
                break;
            }
        }
    }
}
