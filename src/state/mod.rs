/// Board geometry, cells and player identifiers.
pub mod board;
/// Round-progress events and their broadcast hub.
pub mod events;
/// Authoritative session state and its mutators.
pub mod game;
/// Bounded undo history.
pub mod history;
/// Round-robin cursor over category sets.
pub mod rotation;
/// Presentation phase state machine.
pub mod state_machine;

pub use self::game::{GameSession, SessionRules, SessionSetup};
pub use self::state_machine::{Phase, PhaseEvent, PhaseMachine, Snapshot};
