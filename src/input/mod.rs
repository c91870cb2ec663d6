//! Buzzer input: the source abstraction, its implementations and the priority merger.

/// Keyboard fallback polling the four player keys.
pub mod keyboard;
/// Remote buzzer feed over MQTT.
#[cfg(feature = "mqtt")]
pub mod mqtt;
/// Serial buzzer device.
#[cfg(feature = "serial-input")]
pub mod serial;

use std::{
    collections::VecDeque,
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
};

use thiserror::Error;
use tracing::debug;

use crate::state::board::PlayerId;

/// Upper bound on events discarded by a single [`InputSource::flush`].
pub const DRAIN_LIMIT: usize = 256;

/// Setup failures of input sources. Runtime failures never surface; sources degrade to "no
/// event" instead.
#[derive(Debug, Error)]
pub enum InputError {
    /// TLS material for the remote feed could not be read.
    #[error("failed to read certificate `{path}`")]
    Certificate {
        /// File that failed.
        path: PathBuf,
        #[source]
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// A PEM file holds nothing usable.
    #[error("`{path}` does not contain {expected}")]
    Pem {
        /// File that failed.
        path: PathBuf,
        /// What was looked for.
        expected: &'static str,
    },
    /// The system trust store could not be loaded.
    #[error("failed to load the system trust store")]
    TrustStore(#[source] std::io::Error),
    /// The client certificate and key were rejected.
    #[cfg(feature = "mqtt")]
    #[error("invalid client certificate")]
    Tls(#[from] rustls::Error),
}

/// Kind of a source; also its read priority, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceKind {
    /// Remote buzzer feed.
    Remote,
    /// Locally attached buzzer device.
    Device,
    /// Keyboard fallback.
    Keyboard,
}

/// A non-blocking producer of buzzes.
pub trait InputSource: Send {
    /// Next pending buzz, if any. Must never block.
    fn read(&mut self) -> Option<PlayerId>;

    /// Per-tick maintenance such as reconnecting.
    fn keep_alive(&mut self) {}

    /// Discard everything pending.
    fn flush(&mut self) {
        let mut dropped = 0;
        while dropped < DRAIN_LIMIT && self.read().is_some() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!(kind = ?self.kind(), dropped, "flushed stale buzzes");
        }
    }

    /// What kind of source this is.
    fn kind(&self) -> SourceKind;
}

/// Combines sources and reads them in priority order.
#[derive(Default)]
pub struct InputMerger {
    sources: Vec<Box<dyn InputSource>>,
}

impl InputMerger {
    /// Empty merger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source, keeping the list ordered by kind.
    pub fn push(&mut self, source: Box<dyn InputSource>) {
        self.sources.push(source);
        // stable: equal kinds keep insertion order
        self.sources.sort_by_key(|source| source.kind());
    }

    /// Builder form of [`InputMerger::push`].
    pub fn with(mut self, source: Box<dyn InputSource>) -> Self {
        self.push(source);
        self
    }

    /// Kinds of the registered sources in read order.
    pub fn kinds(&self) -> Vec<SourceKind> {
        self.sources.iter().map(|source| source.kind()).collect()
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether no source is registered.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// First buzz found, trying sources in priority order.
    pub fn read(&mut self) -> Option<PlayerId> {
        self.sources.iter_mut().find_map(|source| source.read())
    }

    /// Discard pending buzzes on every source.
    pub fn flush(&mut self) {
        for source in &mut self.sources {
            source.flush();
        }
    }

    /// Forward per-tick maintenance to every source.
    pub fn keep_alive(&mut self) {
        for source in &mut self.sources {
            source.keep_alive();
        }
    }
}

/// Queue-backed source fed by hand. Used by the console driver and in tests.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    kind: SourceKind,
    queue: Arc<Mutex<VecDeque<PlayerId>>>,
}

impl ScriptedSource {
    /// Empty source reporting `kind`.
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            queue: Default::default(),
        }
    }

    /// Queue a buzz; visible to every clone.
    pub fn press(&self, player: PlayerId) {
        self.lock().push_back(player);
    }

    /// Buzzes still queued.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<PlayerId>> {
        self.queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl InputSource for ScriptedSource {
    fn read(&mut self) -> Option<PlayerId> {
        self.lock().pop_front()
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }
}
