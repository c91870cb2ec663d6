//! Round-progress notifications for effects collaborators (sound boards, LED signs).

use serde::Serialize;
use tokio::sync::broadcast;

use crate::state::board::PlayerId;

/// Kind of round-progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundEventKind {
    /// A clue was picked from the board.
    Select,
    /// A contestant buzzed in and is answering.
    Respond,
    /// The answer was accepted.
    Correct,
    /// The answer was rejected.
    Wrong,
}

/// Payload published for every round-progress step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundEvent {
    /// What happened.
    pub name: RoundEventKind,
    /// Zero-based index of the player involved.
    pub player: usize,
    /// Value of the clue in play.
    pub value: i32,
}

impl RoundEvent {
    /// Build an event for `player` on a clue worth `value`.
    pub fn new(name: RoundEventKind, player: PlayerId, value: i32) -> Self {
        Self {
            name,
            player: player.index(),
            value,
        }
    }

    /// JSON encoding used on the wire.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Broadcast hub fanning round events out to any number of listeners.
///
/// Publishing never blocks and never fails; events are simply lost when nobody listens or a
/// listener lags behind the channel capacity.
#[derive(Debug, Clone)]
pub struct EventHub {
    sender: broadcast::Sender<RoundEvent>,
}

impl EventHub {
    /// Construct a hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a listener for subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<RoundEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current listeners, ignoring delivery errors.
    pub fn publish(&self, event: RoundEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_like_the_effects_relays_expect() {
        let event = RoundEvent::new(RoundEventKind::Select, PlayerId::new(1).unwrap(), 400);
        assert_eq!(
            event.to_json().unwrap(),
            r#"{"name":"select","player":1,"value":400}"#
        );
    }

    #[test]
    fn subscribers_receive_published_events() {
        let hub = EventHub::new(4);
        let mut rx = hub.subscribe();
        let event = RoundEvent::new(RoundEventKind::Wrong, PlayerId::new(3).unwrap(), 200);

        hub.publish(event.clone());
        assert_eq!(rx.try_recv().unwrap(), event);
    }

    #[test]
    fn publishing_without_listeners_is_fine() {
        let hub = EventHub::default();
        hub.publish(RoundEvent::new(
            RoundEventKind::Correct,
            PlayerId::default(),
            100,
        ));
    }
}
