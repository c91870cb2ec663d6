use thiserror::Error;

/// Raised when a rotation is built without any item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("at least one complete clue set is needed")]
pub struct EmptyRotation;

/// Round-robin cursor over a fixed, non-empty list.
#[derive(Debug, Clone)]
pub struct Rotation<T> {
    items: Vec<T>,
    cursor: usize,
}

impl<T> Rotation<T> {
    /// Build a rotation starting at the first item.
    pub fn new(items: Vec<T>) -> Result<Self, EmptyRotation> {
        if items.is_empty() {
            return Err(EmptyRotation);
        }
        Ok(Self { items, cursor: 0 })
    }

    /// Return the item under the cursor and advance, wrapping after the last one.
    pub fn next(&mut self) -> &T {
        let index = self.cursor;
        self.cursor = (self.cursor + 1) % self.items.len();
        &self.items[index]
    }

    /// Index the next call to [`Rotation::next`] will return.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of items in the rotation.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false: empty rotations cannot be built.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
