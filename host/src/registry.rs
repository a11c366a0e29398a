//! Controller connection registry and team assignment.
//!
//! At most [`shared::MAX_CONTROLLERS`] live controllers at a time. Team
//! assignment is sticky across a session: once a controller id has played
//! for a team, reconnecting with the same id gets the same team back even
//! if it asked for the other one. A requested color is otherwise honored
//! as-is; with no memory and no request, assignment balances over every
//! identity seen this session, not just the live ones. Whether both colors
//! have ever been connected is also sticky, and drives the multiplayer
//! flag in the projected state.

use log::{debug, info, warn};
use shared::{Packet, TeamColor, MAX_CONTROLLERS};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;

/// One live controller connection.
#[derive(Debug)]
pub struct Controller {
    pub controller_id: String,
    pub team: TeamColor,
    pub sender: UnboundedSender<Packet>,
    pub last_seen: Instant,
}

/// Why an `Identify` was refused. Capacity is the only ground: identity
/// and team memory never cause a rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    Full,
}

impl RejectReason {
    pub fn message(&self) -> String {
        match self {
            RejectReason::Full => "game is full".to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, Controller>,
    /// Sticky controller-id -> team memory, survives disconnects.
    team_by_id: HashMap<String, TeamColor>,
    /// Colors that have had a controller at some point this session.
    seen_teams: HashSet<TeamColor>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub fn is_multiplayer(&self) -> bool {
        self.seen_teams.len() == MAX_CONTROLLERS
    }

    pub fn contains(&self, controller_id: &str) -> bool {
        self.controllers.contains_key(controller_id)
    }

    pub fn team_of(&self, controller_id: &str) -> Option<TeamColor> {
        self.controllers.get(controller_id).map(|c| c.team)
    }

    /// Least-loaded color over the whole identity map (ties go to Blue).
    fn balanced_team(&self) -> TeamColor {
        let blue = self
            .team_by_id
            .values()
            .filter(|&&t| t == TeamColor::Blue)
            .count();
        let red = self
            .team_by_id
            .values()
            .filter(|&&t| t == TeamColor::Red)
            .count();
        if red < blue {
            TeamColor::Red
        } else {
            TeamColor::Blue
        }
    }

    /// Admits a controller, resolving its team.
    ///
    /// Resolution order: a remembered team for this id always wins; then a
    /// requested color is honored as-is; then the balanced pick. A
    /// reconnect under an id that is already live replaces the old entry,
    /// and only brand-new ids count against capacity.
    pub fn admit(
        &mut self,
        controller_id: &str,
        requested: Option<TeamColor>,
        sender: UnboundedSender<Packet>,
    ) -> Result<TeamColor, RejectReason> {
        let replacing = self.controllers.remove(controller_id).is_some();
        if replacing {
            debug!("controller {} reconnected, replacing old entry", controller_id);
        } else if self.controllers.len() >= MAX_CONTROLLERS {
            warn!("rejecting controller {}: game is full", controller_id);
            return Err(RejectReason::Full);
        }

        let team = self
            .team_by_id
            .get(controller_id)
            .copied()
            .or(requested)
            .unwrap_or_else(|| self.balanced_team());

        self.team_by_id.insert(controller_id.to_string(), team);
        self.controllers.insert(
            controller_id.to_string(),
            Controller {
                controller_id: controller_id.to_string(),
                team,
                sender,
                last_seen: Instant::now(),
            },
        );

        if self.seen_teams.insert(team) && self.is_multiplayer() {
            info!("both teams have connected, session is now multiplayer");
        }

        info!(
            "controller {} admitted on {} team ({}/{} connected)",
            controller_id,
            team,
            self.controllers.len(),
            MAX_CONTROLLERS
        );
        Ok(team)
    }

    pub fn remove(&mut self, controller_id: &str) -> Option<Controller> {
        let removed = self.controllers.remove(controller_id);
        if removed.is_some() {
            info!(
                "controller {} disconnected ({}/{} connected)",
                controller_id,
                self.controllers.len(),
                MAX_CONTROLLERS
            );
        }
        removed
    }

    /// Removes the entry for `controller_id` only when it still belongs to
    /// the given connection. A close event from a socket that has already
    /// been replaced by a reconnect must not evict the fresh entry.
    pub fn remove_matching(
        &mut self,
        controller_id: &str,
        sender: &UnboundedSender<Packet>,
    ) -> Option<Controller> {
        let current = self.controllers.get(controller_id)?;
        if !current.sender.same_channel(sender) {
            debug!(
                "ignoring close from a superseded connection of {}",
                controller_id
            );
            return None;
        }
        self.remove(controller_id)
    }

    /// Marks inbound traffic from a controller.
    pub fn touch(&mut self, controller_id: &str) {
        if let Some(controller) = self.controllers.get_mut(controller_id) {
            controller.last_seen = Instant::now();
        }
    }

    /// Drops controllers that have been silent longer than `timeout`.
    /// Returns the ids that were pruned.
    pub fn prune_stale(&mut self, timeout: Duration) -> Vec<String> {
        let now = Instant::now();
        let stale: Vec<String> = self
            .controllers
            .values()
            .filter(|c| now.duration_since(c.last_seen) > timeout)
            .map(|c| c.controller_id.clone())
            .collect();
        for id in &stale {
            warn!("pruning stale controller {}", id);
            self.controllers.remove(id);
        }
        stale
    }

    /// Sends a packet to every live controller, dropping entries whose
    /// channel has closed.
    pub fn broadcast(&mut self, packet: &Packet) {
        let dead: Vec<String> = self
            .controllers
            .values()
            .filter(|c| c.sender.send(packet.clone()).is_err())
            .map(|c| c.controller_id.clone())
            .collect();
        for id in dead {
            debug!("dropping controller {} with a closed channel", id);
            self.controllers.remove(&id);
        }
    }

    pub fn send_to(&self, controller_id: &str, packet: Packet) {
        if let Some(controller) = self.controllers.get(controller_id) {
            let _ = controller.sender.send(packet);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Controller> {
        self.controllers.values()
    }
}
