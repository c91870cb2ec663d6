//! Moderator-driven presentation flow on top of [`GameSession`].

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    dao::clue_set::{CategorySet, Clue},
    error::SessionError,
    input::InputMerger,
    state::{
        GameSession, Phase, PhaseEvent, PhaseMachine, Snapshot,
        board::{CellPos, PlayerId},
    },
};

/// Semantic moderator keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeratorKey {
    /// Accept the answer being judged.
    Accept,
    /// Reject the answer being judged.
    Reject,
    /// Leave the clue without revealing it.
    Back,
    /// Reveal the clue without a winner, or reset the round from the board.
    Delete,
    /// Undo the last committed change.
    Undo,
    /// Any other key; only used to advance past the answer or scoreboard.
    Other,
}

/// Input delivered to the controller by the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerInput {
    /// Pointer click resolved to board coordinates.
    Pointer {
        /// Category index.
        column: usize,
        /// Value tier index.
        row: usize,
    },
    /// Moderator key press.
    Key(ModeratorKey),
    /// A player's name was typed in.
    NameEntered {
        /// Player being renamed.
        player: PlayerId,
        /// New display name.
        name: String,
    },
}

/// Owns the session and the buzzer merger and moves the presentation through its phases.
pub struct PresentationController {
    machine: PhaseMachine,
    session: GameSession,
    merger: InputMerger,
    viewer: bool,
    category_set: Arc<CategorySet>,
    current: Option<CellPos>,
}

impl PresentationController {
    /// Start on the board with the first category set of the rotation.
    pub fn new(mut session: GameSession, merger: InputMerger, viewer: bool) -> Self {
        let category_set = session.next_category_set();
        Self {
            machine: PhaseMachine::new(),
            session,
            merger,
            viewer,
            category_set,
            current: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    /// Phase and transition count.
    pub fn snapshot(&self) -> Snapshot {
        self.machine.snapshot()
    }

    /// Session being presented.
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Category set on the board.
    pub fn category_set(&self) -> &CategorySet {
        &self.category_set
    }

    /// Clue on display, kept after adjudication so its answer can be shown.
    pub fn current_clue(&self) -> Option<&Clue> {
        self.current.map(|pos| self.category_set.clue(pos))
    }

    /// Whether answers are shown without a buzz phase.
    pub fn is_viewer(&self) -> bool {
        self.viewer
    }

    /// Per-frame work: keep inputs alive and, while a clue is live, take at most one buzz.
    pub fn tick(&mut self) {
        self.merger.keep_alive();

        if self.phase() != Phase::DisplayClue {
            return;
        }
        let Some(player) = self.merger.read() else {
            return;
        };
        if self.session.set_responder(player) {
            self.transition(PhaseEvent::Buzz(player));
        }
    }

    /// React to a moderator input. Inputs that mean nothing in the current phase are ignored.
    pub fn handle(&mut self, input: ControllerInput) -> Phase {
        match (self.phase(), input) {
            (Phase::Choosing, ControllerInput::Pointer { column, row }) => {
                self.choose(column, row)
            }
            (Phase::Choosing, ControllerInput::Key(ModeratorKey::Delete))
            | (Phase::Scoreboard, ControllerInput::Key(_)) => self.new_round(),
            (Phase::Choosing, ControllerInput::Key(ModeratorKey::Undo)) => {
                self.session.rollback(1);
                self.transition(PhaseEvent::Undone);
            }
            (Phase::Choosing, ControllerInput::NameEntered { player, name }) => {
                self.session.set_name(player, name);
                self.transition(PhaseEvent::Renamed);
            }
            (phase, ControllerInput::Key(ModeratorKey::Undo)) => {
                warn!(?phase, "undo is only possible on the board");
            }
            (Phase::DisplayClue, ControllerInput::Key(ModeratorKey::Back)) => {
                self.session.clear_responded();
                self.session.abandon_selection();
                self.current = None;
                self.transition(PhaseEvent::Skipped);
            }
            (Phase::DisplayClue, ControllerInput::Key(ModeratorKey::Delete)) => {
                if accepted(self.session.ignore_cell()) {
                    self.session.clear_responded();
                    self.transition(PhaseEvent::RevealIgnored);
                }
            }
            (Phase::Responding(_), ControllerInput::Key(ModeratorKey::Accept)) => {
                if accepted(self.session.mark_correct()) {
                    self.session.clear_responded();
                    self.transition(PhaseEvent::Correct);
                }
            }
            (Phase::Responding(_), ControllerInput::Key(ModeratorKey::Reject)) => self.reject(),
            (Phase::DisplayQuestion, ControllerInput::Key(_)) => {
                self.session.abandon_selection();
                self.current = None;
                if self.session.is_finished() {
                    self.transition(PhaseEvent::Finish);
                } else {
                    self.transition(PhaseEvent::NextClue);
                }
            }
            (phase, input) => debug!(?phase, ?input, "input ignored"),
        }

        self.phase()
    }

    fn choose(&mut self, column: usize, row: usize) {
        let Some(pos) = CellPos::new(column, row) else {
            debug!(column, row, "click outside the board");
            return;
        };
        if !accepted(self.session.select_cell(pos)) {
            return;
        }

        self.current = Some(pos);
        self.merger.flush();
        if self.viewer {
            self.transition(PhaseEvent::ClueViewed);
        } else {
            self.transition(PhaseEvent::ClueSelected);
        }
    }

    fn reject(&mut self) {
        if !accepted(self.session.mark_wrong()) {
            return;
        }

        if self.session.all_responded() {
            if accepted(self.session.ignore_cell()) {
                self.session.clear_responded();
                self.transition(PhaseEvent::Exhausted);
            }
        } else {
            self.merger.flush();
            self.transition(PhaseEvent::Incorrect);
        }
    }

    fn new_round(&mut self) {
        self.session.reset_round();
        self.category_set = self.session.next_category_set();
        self.current = None;
        self.transition(PhaseEvent::RoundReset);
    }

    fn transition(&mut self, event: PhaseEvent) {
        let from = self.phase();
        match self.machine.apply(event) {
            Ok(to) => info!(?from, ?to, ?event, "phase changed"),
            Err(err) => warn!(error = %err, "phase change rejected"),
        }
    }
}

fn accepted(result: Result<(), SessionError>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            info!(error = %err, "operation refused");
            false
        }
    }
}
