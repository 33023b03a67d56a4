//! Position within the ordered list of visible steps

/// Index into a step list of fixed length
///
/// Always within `[0, len)` for a non-empty list. Moves are clamped and
/// never wrap around.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepCursor {
    index: usize,
    len: usize,
}

impl StepCursor {
    /// Cursor on the first of `len` steps
    #[must_use]
    pub const fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    /// Current position
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Number of steps
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether there are no steps at all
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the cursor is on the first step
    #[must_use]
    pub const fn is_first(&self) -> bool {
        self.index == 0
    }

    /// Whether the cursor is on the last step
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.index + 1 >= self.len
    }

    /// Move forward one step; returns whether the cursor moved
    pub const fn next(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Move back one step; returns whether the cursor moved
    pub const fn prev(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Jump to `index`; out-of-range targets are ignored
    pub const fn goto(&mut self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        self.index = index;
        true
    }
}
