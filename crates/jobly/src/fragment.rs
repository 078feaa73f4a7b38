//! Parameterized SQL fragments.

use crate::value::Value;
use std::fmt::Write;

/// A clause of a query plus the values its placeholders refer to.
///
/// The SQL text never contains bound values, only `$n` placeholders. The
/// placeholders are numbered contiguously from [`Fragment::first_index`] and
/// their count equals `values().len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    sql: String,
    values: Vec<Value>,
    first_index: usize,
}

impl Fragment {
    pub(crate) fn new(sql: String, values: Vec<Value>, first_index: usize) -> Self {
        Self {
            sql,
            values,
            first_index,
        }
    }

    /// The SQL text with `$n` placeholders.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bound values, in placeholder order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.values)
    }

    /// Whether the fragment is empty (no clause was emitted).
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Index of the first placeholder this fragment was numbered from.
    pub fn first_index(&self) -> usize {
        self.first_index
    }

    /// The next unused placeholder index after this fragment.
    ///
    /// Callers appending their own predicate (e.g. `WHERE handle = $n`) use
    /// this as `n`.
    pub fn next_index(&self) -> usize {
        self.first_index + self.values.len()
    }
}

/// Hands out consecutive placeholder indices.
#[derive(Debug)]
pub(crate) struct Placeholders {
    next: usize,
}

impl Placeholders {
    pub(crate) fn starting_at(first: usize) -> Self {
        Self { next: first }
    }

    /// Append `$n` for the next index.
    pub(crate) fn push_next(&mut self, out: &mut String) {
        // Writing to a String cannot fail.
        let _ = write!(out, "${}", self.next);
        self.next += 1;
    }
}

#[cfg(test)]
pub(crate) fn placeholder_indices(sql: &str) -> Vec<usize> {
    let bytes = sql.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' {
            let start = i + 1;
            let mut end = start;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            if end > start {
                out.push(sql[start..end].parse().unwrap());
            }
            i = end;
        } else {
            i += 1;
        }
    }
    out
}
