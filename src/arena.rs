//! Bounded text arena backing the currently open channel or item record.
//!
//! All field text for one record is appended to a single fixed-capacity
//! buffer; field values are lightweight `(offset, length)` views into it,
//! never copies. The arena is reset, not reallocated, between records, and
//! every view carries the generation it was issued under. Resolving a view
//! from a stale generation is an error rather than a silent read of
//! unrelated data.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArenaError {
    /// The record's field text does not fit in the configured capacity.
    ///
    /// Overflow is fatal by design: silently truncating a short field such
    /// as an author name would be indistinguishable from a valid value and
    /// corrupt the output without any diagnostic.
    #[error("malformed feed: too much data (arena capacity is {capacity} bytes)")]
    Overflow { capacity: usize },

    /// A view (or open field) from a previous record generation was used
    /// after the arena had been reset.
    #[error("stale arena view: issued in generation {view}, arena is at {current}")]
    StaleView { view: u64, current: u64 },
}

/// Marks a field that has been opened but not yet closed. The field's text
/// runs from `start` to the arena's current write offset.
#[derive(Debug, Clone, Copy)]
pub struct FieldRef {
    start: usize,
    generation: u64,
}

/// An immutable `(offset, length)` reference to one string value in the
/// arena. Valid only for the generation it was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringView {
    start: usize,
    len: usize,
    generation: u64,
}

impl StringView {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Fixed-capacity text buffer shared by the fields of the currently open
/// record.
///
/// At most one record is open at a time, so all live views point into the
/// same generation; `reset` bumps the generation exactly when a new channel
/// or item begins, after the previous record has been rendered.
pub struct Arena {
    buf: String,
    capacity: usize,
    generation: u64,
}

impl Arena {
    pub fn with_capacity(capacity: usize) -> Self {
        Arena {
            buf: String::with_capacity(capacity),
            capacity,
            generation: 0,
        }
    }

    /// Appends text at the tail of the arena.
    ///
    /// Character data may arrive in several chunks for one logical string;
    /// successive appends accumulate at the running offset.
    pub fn append(&mut self, text: &str) -> Result<(), ArenaError> {
        if self.buf.len() + text.len() > self.capacity {
            return Err(ArenaError::Overflow {
                capacity: self.capacity,
            });
        }
        self.buf.push_str(text);
        Ok(())
    }

    /// Begins a new field at the current write offset.
    pub fn open_field(&self) -> FieldRef {
        FieldRef {
            start: self.buf.len(),
            generation: self.generation,
        }
    }

    /// Ends the field, returning a view covering everything appended since
    /// it was opened.
    pub fn close_field(&self, field: FieldRef) -> Result<StringView, ArenaError> {
        if field.generation != self.generation {
            return Err(ArenaError::StaleView {
                view: field.generation,
                current: self.generation,
            });
        }
        Ok(StringView {
            start: field.start,
            len: self.buf.len() - field.start,
            generation: field.generation,
        })
    }

    /// Resolves a view to its text.
    pub fn resolve(&self, view: StringView) -> Result<&str, ArenaError> {
        if view.generation != self.generation {
            return Err(ArenaError::StaleView {
                view: view.generation,
                current: self.generation,
            });
        }
        Ok(&self.buf[view.start..view.start + view.len])
    }

    /// Discards all text and invalidates every view issued so far.
    ///
    /// Called exactly when a new channel or item opens; by then the previous
    /// record has been rendered and its views discarded.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.generation += 1;
    }
}
