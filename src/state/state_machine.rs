use thiserror::Error;

use crate::state::board::PlayerId;

/// Presentation phases of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Board is shown; the choosing player picks a clue.
    Choosing,
    /// Clue is shown and buzzers are live.
    DisplayClue,
    /// A contestant buzzed in and the moderator is judging the answer.
    Responding(PlayerId),
    /// Expected answer is shown.
    DisplayQuestion,
    /// Board is exhausted; final scores are shown.
    Scoreboard,
}

/// Events that move the presentation between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// A clue was picked and goes through the buzz phase.
    ClueSelected,
    /// A clue was picked in viewer mode; its answer is shown right away.
    ClueViewed,
    /// The round was cleared and a new category set loaded.
    RoundReset,
    /// The last committed change was undone.
    Undone,
    /// A player's name was changed.
    Renamed,
    /// A contestant buzzed in.
    Buzz(PlayerId),
    /// The clue was abandoned without revealing it.
    Skipped,
    /// The clue was revealed without a winner.
    RevealIgnored,
    /// The answer was accepted.
    Correct,
    /// The answer was rejected; others may still buzz.
    Incorrect,
    /// The answer was rejected and nobody is left to try.
    Exhausted,
    /// Back to the board after showing the answer.
    NextClue,
    /// Board is finished; show the scoreboard.
    Finish,
}

/// Error returned when an event cannot be applied from the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the machine was in.
    pub from: Phase,
    /// The rejected event.
    pub event: PhaseEvent,
}

/// Snapshot of the machine for readers such as renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase.
    pub phase: Phase,
    /// Number of transitions applied so far.
    pub version: usize,
}

/// Finite-state machine for the presentation flow.
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    phase: Phase,
    version: usize,
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self {
            phase: Phase::Choosing,
            version: 0,
        }
    }
}

impl PhaseMachine {
    /// Create a machine in the choosing phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current phase and version.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
        }
    }

    /// Apply `event`, returning the new phase.
    pub fn apply(&mut self, event: PhaseEvent) -> Result<Phase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        self.version += 1;
        Ok(next)
    }

    fn compute_transition(&self, event: PhaseEvent) -> Result<Phase, InvalidTransition> {
        let next = match (self.phase, event) {
            (Phase::Choosing, PhaseEvent::ClueSelected) => Phase::DisplayClue,
            (Phase::Choosing, PhaseEvent::ClueViewed) => Phase::DisplayQuestion,
            (Phase::Choosing, PhaseEvent::RoundReset)
            | (Phase::Choosing, PhaseEvent::Undone)
            | (Phase::Choosing, PhaseEvent::Renamed) => Phase::Choosing,
            (Phase::DisplayClue, PhaseEvent::Buzz(player)) => Phase::Responding(player),
            (Phase::DisplayClue, PhaseEvent::Skipped) => Phase::Choosing,
            (Phase::DisplayClue, PhaseEvent::RevealIgnored) => Phase::DisplayQuestion,
            (Phase::Responding(_), PhaseEvent::Correct)
            | (Phase::Responding(_), PhaseEvent::Exhausted) => Phase::DisplayQuestion,
            (Phase::Responding(_), PhaseEvent::Incorrect) => Phase::DisplayClue,
            (Phase::DisplayQuestion, PhaseEvent::NextClue) => Phase::Choosing,
            (Phase::DisplayQuestion, PhaseEvent::Finish) => Phase::Scoreboard,
            (Phase::Scoreboard, PhaseEvent::RoundReset) => Phase::Choosing,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut PhaseMachine, event: PhaseEvent) -> Phase {
        sm.apply(event).unwrap()
    }

    fn player(index: usize) -> PlayerId {
        PlayerId::new(index).unwrap()
    }

    #[test]
    fn initial_state_is_choosing() {
        let sm = PhaseMachine::new();
        assert_eq!(sm.phase(), Phase::Choosing);
        assert_eq!(sm.snapshot().version, 0);
    }

    #[test]
    fn full_round_trip_through_a_clue() {
        let mut sm = PhaseMachine::new();

        assert_eq!(apply(&mut sm, PhaseEvent::ClueSelected), Phase::DisplayClue);
        assert_eq!(
            apply(&mut sm, PhaseEvent::Buzz(player(2))),
            Phase::Responding(player(2))
        );
        assert_eq!(apply(&mut sm, PhaseEvent::Incorrect), Phase::DisplayClue);
        assert_eq!(
            apply(&mut sm, PhaseEvent::Buzz(player(0))),
            Phase::Responding(player(0))
        );
        assert_eq!(apply(&mut sm, PhaseEvent::Correct), Phase::DisplayQuestion);
        assert_eq!(apply(&mut sm, PhaseEvent::NextClue), Phase::Choosing);
        assert_eq!(sm.snapshot().version, 6);
    }

    #[test]
    fn finishing_goes_through_the_scoreboard() {
        let mut sm = PhaseMachine::new();
        apply(&mut sm, PhaseEvent::ClueSelected);
        apply(&mut sm, PhaseEvent::RevealIgnored);

        assert_eq!(apply(&mut sm, PhaseEvent::Finish), Phase::Scoreboard);
        assert_eq!(apply(&mut sm, PhaseEvent::RoundReset), Phase::Choosing);
    }

    #[test]
    fn viewer_selection_skips_the_buzz_phase() {
        let mut sm = PhaseMachine::new();
        assert_eq!(apply(&mut sm, PhaseEvent::ClueViewed), Phase::DisplayQuestion);
    }

    #[test]
    fn buzzes_outside_display_clue_are_invalid() {
        let mut sm = PhaseMachine::new();
        let err = sm.apply(PhaseEvent::Buzz(player(1))).unwrap_err();
        assert_eq!(err.from, Phase::Choosing);
        assert_eq!(err.event, PhaseEvent::Buzz(player(1)));
        assert_eq!(sm.snapshot().version, 0);
    }

    #[test]
    fn undo_is_only_valid_while_choosing() {
        let mut sm = PhaseMachine::new();
        assert_eq!(apply(&mut sm, PhaseEvent::Undone), Phase::Choosing);

        apply(&mut sm, PhaseEvent::ClueSelected);
        assert!(sm.apply(PhaseEvent::Undone).is_err());
        assert_eq!(sm.phase(), Phase::DisplayClue);
    }
}
