//! Startup wiring from [`AppConfig`] to a ready session and input merger.

use std::{path::PathBuf, sync::Arc};

use tracing::info;

use crate::{
    config::AppConfig,
    dao::{
        clue_set::CategorySet,
        save::{PersistedSave, YamlSaveFile},
    },
    error::StartupError,
    input::{
        InputMerger,
        keyboard::{KeyState, KeyboardSource},
    },
    state::{GameSession, SessionRules, SessionSetup, events::EventHub, rotation::Rotation},
};

/// Load and validate every configured category set, in play order.
pub fn load_clue_sets(paths: &[PathBuf]) -> Result<Rotation<Arc<CategorySet>>, StartupError> {
    let sets = paths
        .iter()
        .map(|path| CategorySet::load(path).map(Arc::new))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Rotation::new(sets)?)
}

/// Build the session, resuming from `restore` when given.
pub fn build_session(
    config: &AppConfig,
    restore: Option<PersistedSave>,
    events: EventHub,
) -> Result<GameSession, StartupError> {
    let clue_sets = load_clue_sets(&config.clue_sets)?;
    let store = YamlSaveFile::new(&config.autosave);
    info!(
        clue_sets = clue_sets.len(),
        restored = restore.is_some(),
        autosave = %store.path().display(),
        "session ready"
    );

    Ok(GameSession::new(SessionSetup {
        rules: SessionRules {
            ignore_responded: config.ignore_responded,
        },
        clue_sets,
        store: Box::new(store),
        events,
        restore,
    }))
}

/// Build the merger with the keyboard fallback plus every enabled buzzer backend.
///
/// The remote feed spawns a tokio task, so this must run inside the runtime.
pub fn build_merger<K>(config: &AppConfig, keys: K) -> Result<InputMerger, StartupError>
where
    K: KeyState + 'static,
{
    let mut merger = InputMerger::new();
    merger.push(Box::new(KeyboardSource::new(keys)));

    #[cfg(feature = "serial-input")]
    merger.push(Box::new(crate::input::serial::SerialSource::new(
        &config.serial,
    )));

    #[cfg(feature = "mqtt")]
    if let Some(remote) = &config.mqtt_input {
        merger.push(Box::new(crate::input::mqtt::RemoteSource::connect(remote)?));
    }

    info!(sources = ?merger.kinds(), "inputs ready");
    Ok(merger)
}
