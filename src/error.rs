use thiserror::Error;

use crate::{
    config::ConfigError,
    dao::{clue_set::AssetError, save::SaveError},
    input::InputError,
    state::{board::CellPos, rotation::EmptyRotation},
};

/// Guarded session operations that were refused. None of them mutate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The cell was already claimed or ignored.
    #[error("cell {0} was already revealed")]
    AlreadyRevealed(CellPos),
    /// Another clue is still in play.
    #[error("cell {0} is still selected")]
    SelectionPending(CellPos),
    /// The operation needs a clue in play.
    #[error("no cell is selected")]
    NoSelection,
    /// The operation needs a contestant being judged.
    #[error("no player is responding")]
    NoResponder,
}

/// Problems that abort the program before the first frame.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The save to restore is unreadable or malformed.
    #[error(transparent)]
    Save(#[from] SaveError),
    /// A category set is unreadable or malformed.
    #[error(transparent)]
    Asset(#[from] AssetError),
    /// No category set to play.
    #[error(transparent)]
    NoClueSets(#[from] EmptyRotation),
    /// An input source could not be set up.
    #[error(transparent)]
    Input(#[from] InputError),
}
