use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    dao::{clue_set::CategorySet, save::PersistedSave, save::SaveStore},
    error::SessionError,
    state::{
        board::{Board, Cell, CellPos, PLAYER_COUNT, PlayerId},
        events::{EventHub, RoundEvent, RoundEventKind},
        history::{HistoryEntry, HistoryLog},
        rotation::Rotation,
    },
};

/// Tunables for the answering rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionRules {
    /// Allow a player to answer the same clue more than once.
    pub ignore_responded: bool,
}

/// Everything a session needs at construction time.
pub struct SessionSetup {
    /// Answering rules.
    pub rules: SessionRules,
    /// Category sets in play order.
    pub clue_sets: Rotation<Arc<CategorySet>>,
    /// Autosave destination.
    pub store: Box<dyn SaveStore>,
    /// Round-event hub.
    pub events: EventHub,
    /// Previously saved state to resume from.
    pub restore: Option<PersistedSave>,
}

/// Authoritative game state: board, scores, turn ownership and response bookkeeping.
pub struct GameSession {
    board: Board,
    scores: [i32; PLAYER_COUNT],
    names: [String; PLAYER_COUNT],
    choosing: PlayerId,
    responding: Option<PlayerId>,
    responded: [bool; PLAYER_COUNT],
    selected: Option<CellPos>,
    rules: SessionRules,
    clue_sets: Rotation<Arc<CategorySet>>,
    history: HistoryLog,
    store: Box<dyn SaveStore>,
    events: EventHub,
    save_failures: usize,
}

/// Default display name for a seat.
pub fn default_name(player: PlayerId) -> String {
    format!("Nameless #{}", player.index() + 1)
}

impl GameSession {
    /// Build a session, either fresh or restored from a save.
    pub fn new(setup: SessionSetup) -> Self {
        let SessionSetup {
            rules,
            clue_sets,
            store,
            events,
            restore,
        } = setup;

        let (board, scores, names, choosing) = match restore {
            Some(save) => (save.board, save.scores, save.names, save.choosing),
            None => (
                Board::new(),
                [0; PLAYER_COUNT],
                std::array::from_fn(|index| {
                    PlayerId::new(index).map(default_name).unwrap_or_default()
                }),
                PlayerId::default(),
            ),
        };

        let responded = [false; PLAYER_COUNT];
        let history = HistoryLog::new(HistoryEntry {
            board: board.clone(),
            scores,
            choosing,
            responded,
        });

        Self {
            board,
            scores,
            names,
            choosing,
            responding: None,
            responded,
            selected: None,
            rules,
            clue_sets,
            history,
            store,
            events,
            save_failures: 0,
        }
    }

    /// Board cells.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// State of a single cell.
    pub fn cell(&self, pos: CellPos) -> Cell {
        self.board.get(pos)
    }

    /// True once every clue has been claimed or ignored.
    pub fn is_finished(&self) -> bool {
        self.board.is_finished()
    }

    /// Score of one player.
    pub fn score(&self, player: PlayerId) -> i32 {
        self.scores[player.index()]
    }

    /// All scores in seat order.
    pub fn scores(&self) -> [i32; PLAYER_COUNT] {
        self.scores
    }

    /// Display name of one player.
    pub fn name(&self, player: PlayerId) -> &str {
        &self.names[player.index()]
    }

    /// Player picking the next clue.
    pub fn choosing(&self) -> PlayerId {
        self.choosing
    }

    /// Player currently being judged.
    pub fn responding(&self) -> Option<PlayerId> {
        self.responding
    }

    /// Whether `player` already attempted the clue in play.
    pub fn has_responded(&self, player: PlayerId) -> bool {
        self.responded[player.index()]
    }

    /// Clue in play.
    pub fn selected(&self) -> Option<CellPos> {
        self.selected
    }

    /// Answering rules in effect.
    pub fn rules(&self) -> SessionRules {
        self.rules
    }

    /// Number of snapshots available to undo.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Autosaves that could not be written so far.
    pub fn save_failures(&self) -> usize {
        self.save_failures
    }

    /// Put a clue in play with a fresh set of attempted flags.
    pub fn select_cell(&mut self, pos: CellPos) -> Result<(), SessionError> {
        if let Some(pending) = self.selected {
            return Err(SessionError::SelectionPending(pending));
        }
        if !self.board.get(pos).is_unrevealed() {
            return Err(SessionError::AlreadyRevealed(pos));
        }

        self.selected = Some(pos);
        // a rollback may have restored flags from the middle of an earlier clue
        self.responded = [false; PLAYER_COUNT];
        info!(cell = %pos, value = pos.value(), chooser = %self.choosing, "clue selected");
        self.events.publish(RoundEvent::new(
            RoundEventKind::Select,
            self.choosing,
            pos.value(),
        ));
        Ok(())
    }

    /// Drop the clue in play without resolving it.
    pub fn abandon_selection(&mut self) {
        if let Some(pos) = self.selected.take() {
            debug!(cell = %pos, "selection abandoned");
        }
        self.responding = None;
    }

    /// Let `player` answer the clue in play.
    ///
    /// Returns false when the player already tried this clue, unless the rules allow repeats.
    pub fn set_responder(&mut self, player: PlayerId) -> bool {
        if self.responded[player.index()] && !self.rules.ignore_responded {
            debug!(%player, "player already responded to this clue");
            return false;
        }

        self.responding = Some(player);
        self.responded[player.index()] = true;
        let value = self.selected.map(CellPos::value).unwrap_or_default();
        info!(%player, value, "player responding");
        self.events
            .publish(RoundEvent::new(RoundEventKind::Respond, player, value));
        true
    }

    /// True once every player attempted the clue; always false when repeats are allowed.
    pub fn all_responded(&self) -> bool {
        !self.rules.ignore_responded && self.responded.iter().all(|responded| *responded)
    }

    /// Reset the attempted flags for a fresh response round.
    pub fn clear_responded(&mut self) {
        self.responded = [false; PLAYER_COUNT];
    }

    /// Accept the responder's answer: claim the cell, credit its value and hand over the choice.
    pub fn mark_correct(&mut self) -> Result<(), SessionError> {
        let (pos, player) = self.adjudication()?;

        self.board.set(pos, Cell::Claimed(player));
        self.scores[player.index()] += pos.value();
        self.choosing = player;
        self.selected = None;
        self.responding = None;

        info!(%player, cell = %pos, score = self.scores[player.index()], "answer accepted");
        self.events
            .publish(RoundEvent::new(RoundEventKind::Correct, player, pos.value()));
        self.commit();
        Ok(())
    }

    /// Reject the responder's answer and debit the clue's value. The clue stays in play.
    pub fn mark_wrong(&mut self) -> Result<(), SessionError> {
        let (pos, player) = self.adjudication()?;

        self.scores[player.index()] -= pos.value();
        self.responding = None;

        info!(%player, cell = %pos, score = self.scores[player.index()], "answer rejected");
        self.events
            .publish(RoundEvent::new(RoundEventKind::Wrong, player, pos.value()));
        self.commit();
        Ok(())
    }

    /// Reveal the clue in play without a winner; it can never be claimed afterwards.
    pub fn ignore_cell(&mut self) -> Result<(), SessionError> {
        let pos = self.selected.take().ok_or(SessionError::NoSelection)?;
        self.board.set(pos, Cell::Ignored);
        self.responding = None;

        info!(cell = %pos, "clue ignored");
        self.commit();
        Ok(())
    }

    /// Category set for the next round.
    pub fn next_category_set(&mut self) -> Arc<CategorySet> {
        let set = self.clue_sets.next().clone();
        info!(source = %set.source().display(), "next clue set");
        set
    }

    /// Start a new round: fresh board and scores, first player chooses. Names are kept and the
    /// undo history restarts from here.
    ///
    /// The reset is an undo barrier: the finished round can no longer be rolled back into,
    /// which keeps a stray undo on a fresh board from resurrecting the previous scores.
    pub fn reset_round(&mut self) {
        self.board = Board::new();
        self.scores = [0; PLAYER_COUNT];
        self.choosing = PlayerId::default();
        self.responding = None;
        self.responded = [false; PLAYER_COUNT];
        self.selected = None;

        info!("round reset");
        self.history.reset(self.snapshot());
        self.persist();
    }

    /// Undo the last `steps` commits.
    ///
    /// Does nothing, apart from a warning, when the history is not that deep.
    pub fn rollback(&mut self, steps: usize) {
        let Some(entry) = self.history.rollback(steps).cloned() else {
            warn!(steps, depth = self.history.len(), "can not rollback that far");
            return;
        };

        warn!(steps, scores = ?entry.scores, choosing = %entry.choosing, "rolling back");
        self.board = entry.board;
        self.scores = entry.scores;
        self.choosing = entry.choosing;
        self.responded = entry.responded;
        self.selected = None;
        self.responding = None;
        self.persist();
    }

    /// Rename a player. Names are saved but not part of the undo history.
    pub fn set_name(&mut self, player: PlayerId, name: impl Into<String>) {
        let name = name.into();
        info!(%player, %name, "player renamed");
        self.names[player.index()] = name;
        self.persist();
    }

    /// Current committed data in save form.
    pub fn to_save(&self) -> PersistedSave {
        PersistedSave {
            board: self.board.clone(),
            scores: self.scores,
            names: self.names.clone(),
            choosing: self.choosing,
        }
    }

    fn adjudication(&self) -> Result<(CellPos, PlayerId), SessionError> {
        let pos = self.selected.ok_or(SessionError::NoSelection)?;
        let player = self.responding.ok_or(SessionError::NoResponder)?;
        Ok((pos, player))
    }

    fn snapshot(&self) -> HistoryEntry {
        HistoryEntry {
            board: self.board.clone(),
            scores: self.scores,
            choosing: self.choosing,
            responded: self.responded,
        }
    }

    fn commit(&mut self) {
        self.history.push(self.snapshot());
        self.persist();
    }

    fn persist(&mut self) {
        if let Err(err) = self.store.save(&self.to_save()) {
            self.save_failures += 1;
            warn!(error = %err, failures = self.save_failures, "autosave failed");
        }
    }
}
