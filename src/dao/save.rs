//! Autosave format, its on-disk store and the startup loader.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    dao::storage::{StorageError, StorageResult},
    state::board::{Board, BoardShapeError, Cell, InvalidPlayer, PLAYER_COUNT, PlayerId},
};

/// Committed session data written after every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSave {
    /// Board cells.
    pub board: Board,
    /// Scores per player.
    pub scores: [i32; PLAYER_COUNT],
    /// Display names per player.
    pub names: [String; PLAYER_COUNT],
    /// Player picking the next clue.
    pub choosing: PlayerId,
}

/// Wire representation of [`PersistedSave`], before shape validation.
#[derive(Debug, Serialize, Deserialize)]
struct RawSave {
    board: Vec<Vec<Cell>>,
    scores: Vec<i32>,
    names: Vec<String>,
    choosing: i64,
}

/// Reasons a save file is rejected at startup.
#[derive(Debug, Error)]
pub enum SaveError {
    /// File could not be read.
    #[error("failed to read save `{path}`")]
    Read {
        /// Path of the save file.
        path: PathBuf,
        #[source]
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// File is not valid YAML or has wrongly typed fields.
    #[error("failed to parse save `{path}`")]
    Parse {
        /// Path of the save file.
        path: PathBuf,
        #[source]
        /// Underlying parser failure.
        source: serde_yaml::Error,
    },
    /// Board does not have the 6×5 shape.
    #[error("invalid board in save")]
    Board(#[from] BoardShapeError),
    /// Wrong number of scores.
    #[error("there have to be exactly {PLAYER_COUNT} score values, found {0}")]
    Scores(usize),
    /// Wrong number of names.
    #[error("there have to be exactly {PLAYER_COUNT} player names, found {0}")]
    Names(usize),
    /// `choosing` does not reference a player.
    #[error("invalid choosing player")]
    Choosing(#[from] InvalidPlayer),
}

impl TryFrom<RawSave> for PersistedSave {
    type Error = SaveError;

    fn try_from(raw: RawSave) -> Result<Self, Self::Error> {
        let board = Board::try_from(raw.board)?;
        let scores = <[i32; PLAYER_COUNT]>::try_from(raw.scores)
            .map_err(|scores| SaveError::Scores(scores.len()))?;
        let names = <[String; PLAYER_COUNT]>::try_from(raw.names)
            .map_err(|names| SaveError::Names(names.len()))?;
        let choosing = PlayerId::try_from(raw.choosing)?;

        Ok(Self {
            board,
            scores,
            names,
            choosing,
        })
    }
}

impl From<&PersistedSave> for RawSave {
    fn from(save: &PersistedSave) -> Self {
        Self {
            board: (&save.board).into(),
            scores: save.scores.to_vec(),
            names: save.names.to_vec(),
            choosing: save.choosing.index() as i64,
        }
    }
}

impl PersistedSave {
    /// Parse and validate a save from YAML text.
    pub fn from_yaml_str(path: &Path, contents: &str) -> Result<Self, SaveError> {
        let raw: RawSave = serde_yaml::from_str(contents).map_err(|source| SaveError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        raw.try_into()
    }

    /// Encode the save as YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&RawSave::from(self))
    }
}

/// Load and validate the save at `path`.
pub fn load_save(path: &Path) -> Result<PersistedSave, SaveError> {
    let contents = fs::read_to_string(path).map_err(|source| SaveError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let save = PersistedSave::from_yaml_str(path, &contents)?;
    info!(path = %path.display(), "restored session from save");
    Ok(save)
}

/// Destination for autosaves.
pub trait SaveStore: Send {
    /// Persist a committed save.
    fn save(&self, save: &PersistedSave) -> StorageResult<()>;
}

/// Autosave written as a YAML file, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct YamlSaveFile {
    path: PathBuf,
}

impl YamlSaveFile {
    /// Store writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SaveStore for YamlSaveFile {
    fn save(&self, save: &PersistedSave) -> StorageResult<()> {
        let yaml = save
            .to_yaml()
            .map_err(|err| StorageError::encode("serializing autosave", err))?;

        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        fs::write(&staging, yaml)
            .and_then(|()| fs::rename(&staging, &self.path))
            .map_err(|source| StorageError::Write {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = %self.path.display(), "autosave written");
        Ok(())
    }
}

/// In-memory store keeping every save, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saves: Arc<Mutex<Vec<PersistedSave>>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent save, if any.
    pub fn latest(&self) -> Option<PersistedSave> {
        self.lock().last().cloned()
    }

    /// Number of saves received.
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<PersistedSave>> {
        // A poisoned lock only means another holder panicked mid-push; the data is still valid.
        self.saves.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SaveStore for MemoryStore {
    fn save(&self, save: &PersistedSave) -> StorageResult<()> {
        self.lock().push(save.clone());
        Ok(())
    }
}
