//! TCP front end and the host's single-threaded event loop.
//!
//! One task accepts connections; each connection gets a reader task and a
//! writer task bridged by an unbounded channel. Everything stateful (game,
//! registry) lives in the [`HostServer`] loop, so no locks are needed: the
//! loop multiplexes connection events, operator commands, the one-second
//! game timer and the heartbeat with `select!`.

use crate::deck::{build_deck, DEFAULT_WORDS};
use crate::game::{GameConfig, GameState};
use crate::registry::ControllerRegistry;
use crate::sync::project;
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::frame::{read_packet, write_packet};
use shared::{
    GameAction, Packet, Phase, TeamColor, HEARTBEAT_INTERVAL, REJECT_CLOSE_DELAY, STALE_TIMEOUT,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{
    unbounded_channel, UnboundedReceiver, UnboundedSender, WeakUnboundedSender,
};
use tokio::time::{interval, sleep};

#[derive(Debug, Clone)]
pub struct HostConfig {
    pub bind_addr: String,
    pub game: GameConfig,
    /// Word bank for the deck; the built-in list when empty.
    pub words: Vec<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            game: GameConfig::default(),
            words: Vec::new(),
        }
    }
}

/// Operator-side commands fed into the loop (bonus answer, screen
/// acknowledgments, pause, shutdown).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    AnswerOpponentBonus(bool),
    AdvanceTurn,
    FinishSpecialTurn,
    TogglePause,
    Shutdown,
}

/// Parses an operator console line. Unknown input yields `None`.
pub fn parse_host_command(line: &str) -> Option<HostCommand> {
    let mut parts = line.split_whitespace();
    match parts.next()? {
        "bonus" => match parts.next()? {
            "yes" => Some(HostCommand::AnswerOpponentBonus(true)),
            "no" => Some(HostCommand::AnswerOpponentBonus(false)),
            _ => None,
        },
        "next" => Some(HostCommand::AdvanceTurn),
        "finish" => Some(HostCommand::FinishSpecialTurn),
        "pause" | "resume" => Some(HostCommand::TogglePause),
        "quit" | "exit" => Some(HostCommand::Shutdown),
        _ => None,
    }
}

/// Events flowing from the connection tasks into the loop.
enum HostEvent {
    Identified {
        controller_id: String,
        requested_team: Option<TeamColor>,
        sender: UnboundedSender<Packet>,
    },
    Inbound {
        controller_id: String,
        packet: Packet,
    },
    Disconnected {
        controller_id: String,
        /// Weak handle of the connection that closed, so a close racing
        /// with a reconnect cannot evict the replacement entry. Weak so
        /// the event itself never holds the outbound channel open.
        sender: WeakUnboundedSender<Packet>,
    },
}

pub struct HostServer {
    config: HostConfig,
    game: GameState,
    registry: ControllerRegistry,
    rng: StdRng,
}

impl HostServer {
    pub fn new(config: HostConfig) -> Self {
        let mut rng = StdRng::from_entropy();
        let words: Vec<String> = if config.words.is_empty() {
            DEFAULT_WORDS.iter().map(|w| w.to_string()).collect()
        } else {
            config.words.clone()
        };
        let deck = build_deck(&words, &mut rng);
        let game = GameState::new(config.game.clone(), deck);
        Self {
            config,
            game,
            registry: ControllerRegistry::new(),
            rng,
        }
    }

    /// Accepts on the given listener and runs the event loop until a
    /// `Shutdown` command arrives or the command channel closes.
    pub async fn run(mut self, listener: TcpListener, mut commands: UnboundedReceiver<HostCommand>) {
        let (events_tx, mut events_rx) = unbounded_channel();
        tokio::spawn(accept_loop(listener, events_tx));

        let mut game_tick = interval(Duration::from_secs(1));
        let mut heartbeat = interval(HEARTBEAT_INTERVAL);

        loop {
            tokio::select! {
                Some(event) = events_rx.recv() => {
                    let was_ticking = self.game.phase == Phase::TurnActive;
                    self.handle_event(event);
                    // A freshly started turn gets a full first second.
                    if !was_ticking && self.game.phase == Phase::TurnActive {
                        game_tick.reset();
                    }
                }
                command = commands.recv() => match command {
                    Some(HostCommand::Shutdown) | None => {
                        info!("shutting down");
                        break;
                    }
                    Some(command) => self.handle_command(command),
                },
                _ = game_tick.tick() => {
                    if self.game.tick() {
                        self.broadcast_sync();
                    }
                }
                _ = heartbeat.tick() => self.heartbeat(),
            }
        }
    }

    fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::Identified {
                controller_id,
                requested_team,
                sender,
            } => match self.registry.admit(&controller_id, requested_team, sender.clone()) {
                Ok(_) => self.broadcast_sync(),
                Err(reason) => {
                    let _ = sender.send(Packet::ConnectionRejected {
                        reason: reason.message(),
                    });
                    // Give the rejection a moment on the wire before the
                    // channel drop closes the connection.
                    tokio::spawn(async move {
                        sleep(REJECT_CLOSE_DELAY).await;
                        drop(sender);
                    });
                }
            },
            HostEvent::Inbound {
                controller_id,
                packet,
            } => {
                self.registry.touch(&controller_id);
                match packet {
                    Packet::Action { payload } => self.handle_action(&controller_id, payload),
                    Packet::Ping => self.registry.send_to(&controller_id, Packet::Pong),
                    Packet::Pong => {}
                    Packet::Identify { .. } => {
                        debug!("ignoring repeated identify from {}", controller_id);
                    }
                    other => debug!("unexpected packet from {}: {:?}", controller_id, other),
                }
            }
            HostEvent::Disconnected {
                controller_id,
                sender,
            } => {
                // A failed upgrade means every strong handle is gone, so
                // the registry entry (if any) belongs to a newer connection.
                let removed = sender
                    .upgrade()
                    .and_then(|s| self.registry.remove_matching(&controller_id, &s));
                if removed.is_some() {
                    self.broadcast_sync();
                }
            }
        }
    }

    fn handle_action(&mut self, controller_id: &str, action: GameAction) {
        if !self.authorized(controller_id, action) {
            warn!(
                "controller {} sent {:?} out of turn, ignoring",
                controller_id, action
            );
            return;
        }
        self.game.apply_action(action, &mut self.rng);
        self.broadcast_sync();
    }

    /// Pause is open to everyone; everything else needs the active team's
    /// controller, unless a single controller is running both teams.
    fn authorized(&self, controller_id: &str, action: GameAction) -> bool {
        match action {
            GameAction::Pause | GameAction::Resume => self.registry.contains(controller_id),
            _ => {
                self.registry.len() == 1
                    && self.registry.contains(controller_id)
                    || self.registry.team_of(controller_id) == Some(self.game.active_team_color())
            }
        }
    }

    fn handle_command(&mut self, command: HostCommand) {
        match command {
            HostCommand::AnswerOpponentBonus(guessed) => self.game.answer_opponent_bonus(guessed),
            HostCommand::AdvanceTurn => self.game.advance_turn(),
            HostCommand::FinishSpecialTurn => self.game.finish_special_turn(),
            HostCommand::TogglePause => self.game.toggle_pause(),
            HostCommand::Shutdown => {}
        }
        self.broadcast_sync();
    }

    fn heartbeat(&mut self) {
        self.registry.broadcast(&Packet::Ping);
        let pruned = self.registry.prune_stale(STALE_TIMEOUT);
        if !pruned.is_empty() {
            self.broadcast_sync();
        }
    }

    /// Projects and pushes the current state to every controller. Each
    /// controller gets its own team's view.
    fn broadcast_sync(&mut self) {
        let recipients: Vec<(String, TeamColor)> = self
            .registry
            .iter()
            .map(|c| (c.controller_id.clone(), c.team))
            .collect();
        for (controller_id, team) in recipients {
            let payload = project(&self.game, &self.registry, team);
            self.registry.send_to(
                &controller_id,
                Packet::SyncState {
                    payload: Box::new(payload),
                },
            );
        }
    }
}

async fn accept_loop(listener: TcpListener, events: UnboundedSender<HostEvent>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                debug!("connection from {}", addr);
                tokio::spawn(run_connection(stream, addr, events.clone()));
            }
            Err(e) => {
                error!("accept failed: {}", e);
                break;
            }
        }
    }
}

/// Per-connection protocol: the first frame must be `Identify`; after that
/// the reader forwards inbound packets to the loop while the writer drains
/// the controller's outbound channel.
async fn run_connection(stream: TcpStream, addr: SocketAddr, events: UnboundedSender<HostEvent>) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!("set_nodelay failed for {}: {}", addr, e);
    }
    let (mut reader, mut writer) = stream.into_split();

    let first = match read_packet(&mut reader).await {
        Ok(packet) => packet,
        Err(e) => {
            debug!("connection from {} dropped before identifying: {}", addr, e);
            return;
        }
    };
    let (controller_id, requested_team) = match first {
        Packet::Identify {
            controller_id,
            requested_team,
        } => (controller_id, requested_team),
        other => {
            warn!("{} sent {:?} before identifying, closing", addr, other);
            return;
        }
    };

    let (tx, mut rx) = unbounded_channel::<Packet>();
    // Tags the eventual disconnect with this connection without keeping
    // the channel alive.
    let conn = tx.downgrade();
    if events
        .send(HostEvent::Identified {
            controller_id: controller_id.clone(),
            requested_team,
            sender: tx,
        })
        .is_err()
    {
        return;
    }

    let writer_task = tokio::spawn(async move {
        while let Some(packet) = rx.recv().await {
            if let Err(e) = write_packet(&mut writer, &packet).await {
                debug!("write failed: {}", e);
                break;
            }
        }
    });

    loop {
        match read_packet(&mut reader).await {
            Ok(packet) => {
                let event = HostEvent::Inbound {
                    controller_id: controller_id.clone(),
                    packet,
                };
                if events.send(event).is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!("controller {} read ended: {}", controller_id, e);
                break;
            }
        }
    }

    let _ = events.send(HostEvent::Disconnected {
        controller_id: controller_id.clone(),
        sender: conn,
    });
    writer_task.abort();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_command() {
        assert_eq!(
            parse_host_command("bonus yes"),
            Some(HostCommand::AnswerOpponentBonus(true))
        );
        assert_eq!(
            parse_host_command("bonus no"),
            Some(HostCommand::AnswerOpponentBonus(false))
        );
        assert_eq!(parse_host_command("next"), Some(HostCommand::AdvanceTurn));
        assert_eq!(
            parse_host_command("finish"),
            Some(HostCommand::FinishSpecialTurn)
        );
        assert_eq!(parse_host_command("pause"), Some(HostCommand::TogglePause));
        assert_eq!(parse_host_command("resume"), Some(HostCommand::TogglePause));
        assert_eq!(parse_host_command("quit"), Some(HostCommand::Shutdown));
        assert_eq!(parse_host_command("bonus maybe"), None);
        assert_eq!(parse_host_command(""), None);
        assert_eq!(parse_host_command("flip"), None);
    }

    #[test]
    fn test_default_config() {
        let config = HostConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.game.turn_duration, 60);
    }
}
