use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    input::{InputSource, SourceKind},
    state::board::{PLAYER_COUNT, PlayerId},
};

/// Something that can tell whether a player's key is currently held down.
pub trait KeyState: Send {
    /// Whether the key mapped to `player` is pressed right now.
    fn is_pressed(&self, player: PlayerId) -> bool;
}

/// Fallback source that samples the player keys.
///
/// Level-based: a held key is reported on every read, so there is nothing to flush.
pub struct KeyboardSource<K> {
    keys: K,
}

impl<K: KeyState> KeyboardSource<K> {
    /// Poll `keys` for buzzes.
    pub fn new(keys: K) -> Self {
        Self { keys }
    }
}

impl<K: KeyState> InputSource for KeyboardSource<K> {
    fn read(&mut self) -> Option<PlayerId> {
        PlayerId::all().find(|player| self.keys.is_pressed(*player))
    }

    fn flush(&mut self) {}

    fn kind(&self) -> SourceKind {
        SourceKind::Keyboard
    }
}

/// Shared key state updated by a driver thread and sampled by [`KeyboardSource`].
#[derive(Debug, Clone, Default)]
pub struct HeldButtons {
    held: Arc<[AtomicBool; PLAYER_COUNT]>,
}

impl HeldButtons {
    /// All keys released.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the key of `player` as held.
    pub fn press(&self, player: PlayerId) {
        self.held[player.index()].store(true, Ordering::Relaxed);
    }

    /// Mark the key of `player` as released.
    pub fn release(&self, player: PlayerId) {
        self.held[player.index()].store(false, Ordering::Relaxed);
    }

    /// Release every key.
    pub fn release_all(&self) {
        for key in self.held.iter() {
            key.store(false, Ordering::Relaxed);
        }
    }
}

impl KeyState for HeldButtons {
    fn is_pressed(&self, player: PlayerId) -> bool {
        self.held[player.index()].load(Ordering::Relaxed)
    }
}
