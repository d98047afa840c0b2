// Copyright (c) ZeroC, Inc.

use crate::diagnostics::{Error, ErrorKind};
use crate::parsers::script::tokens::SIGNIFICANT_CHARACTERS;
use serde::Serialize;

/// The statement terminator used by script sources that don't specify their own.
pub const DEFAULT_STATEMENT_TERMINATOR: &str = ";";

/// Stores the row and column numbers of a location in a script file.
/// These values are indexed starting at 1 instead of 0 for human readability.
/// Ex: (1,1) is the start of a file: the first column in the first row.
#[derive(Serialize, Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct Location {
    pub row: usize,
    pub col: usize,
}

impl From<(usize, usize)> for Location {
    /// Creates a [Location] from a pair of indices, where the first element represents the line number,
    /// and the second element represents the column number.
    fn from(x: (usize, usize)) -> Self {
        Location { row: x.0, col: x.1 }
    }
}

impl Default for Location {
    /// Returns a [Location] representing the start of a file: (1,1).
    fn default() -> Self {
        Location { row: 1, col: 1 }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: Location,
    pub end: Location,
    pub file: String,
}

impl Span {
    pub fn new(start: Location, end: Location, file: &str) -> Self {
        let file = file.to_owned();
        Span { start, end, file }
    }
}

/// A resolved SQL script: its raw text, the name it's displayed under in diagnostics, and the
/// statement terminator its statements are separated by.
#[derive(Clone, Debug)]
pub struct ScriptSource {
    pub text: String,
    pub name: String,
    pub terminator: String,
}

impl ScriptSource {
    /// Creates a script source that uses the [default terminator](DEFAULT_STATEMENT_TERMINATOR).
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        ScriptSource {
            text: text.into(),
            name: name.into(),
            terminator: DEFAULT_STATEMENT_TERMINATOR.to_owned(),
        }
    }

    /// Creates a script source with a custom statement terminator.
    /// The terminator is validated eagerly so misconfiguration surfaces at construction, not mid-parse.
    pub fn with_terminator(name: impl Into<String>, text: impl Into<String>, terminator: &str) -> Result<Self, Error> {
        validate_terminator(terminator)?;
        Ok(ScriptSource {
            text: text.into(),
            name: name.into(),
            terminator: terminator.to_owned(),
        })
    }
}

/// Checks that a statement terminator is usable: non-empty, and free of whitespace and of the
/// characters the lexer reserves for its own token alphabet.
pub fn validate_terminator(terminator: &str) -> Result<(), Error> {
    if terminator.is_empty() {
        return Err(Error::new(ErrorKind::Configuration {
            message: "statement terminator must not be empty".to_owned(),
        }));
    }

    for character in terminator.chars() {
        if character.is_whitespace() {
            return Err(Error::new(ErrorKind::Configuration {
                message: format!("statement terminator '{terminator}' must not contain whitespace"),
            }));
        }
        if SIGNIFICANT_CHARACTERS.contains(&character) {
            return Err(Error::new(ErrorKind::Configuration {
                message: format!(
                    "statement terminator '{terminator}' must not contain the reserved character '{character}'"
                ),
            }));
        }
    }
    Ok(())
}
