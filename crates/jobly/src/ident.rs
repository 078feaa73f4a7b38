//! SQL identifier handling.
//!
//! Column and table names are never bound as parameters (Postgres does not
//! allow it), so they are validated or quoted before being written into SQL
//! text:
//!
//! - [`Ident::parse`] accepts plain, optionally dotted names matching
//!   `[A-Za-z_][A-Za-z0-9_$]*` per segment and renders them unquoted.
//! - [`Ident::quoted`] accepts any name without NUL and renders it as a
//!   quoted identifier with `"` doubled, so it can never be read as a keyword.

use crate::error::{JoblyError, JoblyResult};

/// A part of a SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    Unquoted(String),
    Quoted(String),
}

/// A SQL identifier (column, table, or `table.column`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    parts: Vec<IdentPart>,
}

impl Ident {
    /// Create a single quoted identifier.
    pub fn quoted(name: &str) -> JoblyResult<Self> {
        if name.is_empty() {
            return Err(JoblyError::validation("Empty quoted identifier"));
        }
        if name.contains('\0') {
            return Err(JoblyError::validation(
                "Identifier cannot contain NUL character",
            ));
        }
        Ok(Self {
            parts: vec![IdentPart::Quoted(name.to_string())],
        })
    }

    /// Parse a plain identifier, e.g. `num_employees` or `j.company_handle`.
    pub fn parse(s: &str) -> JoblyResult<Self> {
        if s.is_empty() {
            return Err(JoblyError::validation("Identifier cannot be empty"));
        }
        let parts = s
            .split('.')
            .map(|segment| {
                validate_segment(segment)?;
                Ok(IdentPart::Unquoted(segment.to_string()))
            })
            .collect::<JoblyResult<Vec<_>>>()?;
        Ok(Self { parts })
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match part {
                IdentPart::Unquoted(s) => out.push_str(s),
                IdentPart::Quoted(s) => {
                    out.push('"');
                    for ch in s.chars() {
                        if ch == '"' {
                            out.push('"');
                        }
                        out.push(ch);
                    }
                    out.push('"');
                }
            }
        }
    }
}

fn validate_segment(segment: &str) -> JoblyResult<()> {
    let mut chars = segment.chars();
    match chars.next() {
        None => return Err(JoblyError::validation("Empty identifier segment")),
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        Some(c) => {
            return Err(JoblyError::validation(format!(
                "Invalid identifier start character: '{c}'"
            )));
        }
    }
    if let Some(c) = chars.find(|&c| !(c == '_' || c == '$' || c.is_ascii_alphanumeric())) {
        return Err(JoblyError::validation(format!(
            "Invalid character in identifier: '{c}'"
        )));
    }
    Ok(())
}
