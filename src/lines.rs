//! Line splitter — turns a stage's output buffer into display lines.
//!
//! Splits on `\n` only and skips empty segments, so `"a\n\nb\n"` is two
//! lines. Capacity starts small and doubles; every reservation is fallible
//! and a failure is surfaced instead of handing back a partial set.

use std::collections::TryReserveError;

use crate::buffer::Buffer;

/// First capacity guess for a fresh line set.
const INITIAL_CAPACITY: usize = 10;

/// Could not grow the line set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("out of memory while splitting output into lines ({lines} lines so far)")]
pub struct AllocationError {
    pub lines: usize,
    #[source]
    pub source: TryReserveError,
}

/// Ordered, owned display lines. No entry is empty or contains `\n`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineSet {
    lines: Vec<String>,
}

impl LineSet {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.lines
    }

    /// Re-join with `\n`. Inverse of [`split`] for buffers with no blank
    /// lines and no leading or trailing newline.
    pub fn join(&self) -> String {
        self.lines.join("\n")
    }
}

impl<'a> IntoIterator for &'a LineSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

/// Split `buffer` into its non-empty lines.
pub fn split(buffer: &Buffer) -> Result<LineSet, AllocationError> {
    let text = buffer.text();
    let mut lines: Vec<String> = Vec::new();
    grow(&mut lines)?;

    for segment in text.split('\n').filter(|s| !s.is_empty()) {
        if lines.len() == lines.capacity() {
            grow(&mut lines)?;
        }
        lines.push(segment.to_string());
    }

    Ok(LineSet { lines })
}

/// Double the capacity (or allocate the initial guess).
fn grow(lines: &mut Vec<String>) -> Result<(), AllocationError> {
    let additional = lines.capacity().max(INITIAL_CAPACITY);
    lines
        .try_reserve_exact(additional)
        .map_err(|source| AllocationError {
            lines: lines.len(),
            source,
        })
}
