// Copyright (c) ZeroC, Inc.

//! This module defines all the tokens and errors that the script [Lexer](super::lexer::Lexer) can return.

use crate::script_file::Location;
use std::fmt;

pub type Token<'a> = (Location, TokenKind<'a>, Location);
pub type Error = (Location, ErrorKind, Location);

/// The characters the lexer reserves as token alphabet of their own.
/// Everything else (whitespace and the statement terminator aside) accretes into [Word] tokens.
/// Statement terminators must not contain any of these (see [crate::script_file::validate_terminator]).
pub const SIGNIFICANT_CHARACTERS: [char; 8] = [',', '#', '/', '*', '\'', '"', '-', ':'];

/// This enum specifies all the kinds of tokens that the script [Lexer](super::lexer::Lexer) can return.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind<'input> {
    /// A maximal run of characters that are not significant, not whitespace, and not the start of
    /// the statement terminator. Also produced when a significant character fails to combine into
    /// a multi-character lexeme (a lone '-', '/', or '*'), and for partial terminator matches.
    Word(&'input str),

    /// A single-line string enclosed in single quotes. `raw` is the source slice including the
    /// quotation marks; `value` is the content with escape sequences resolved.
    SingleQuoted { raw: &'input str, value: String },

    /// A single-line string enclosed in double quotes.
    DoubleQuoted { raw: &'input str, value: String },

    /// A string enclosed in a tripled quote character (`'''` or `\"\"\"`), which may span lines.
    /// Inside it, a doubled quote escapes to a single quote character.
    MultilineQuoted { raw: &'input str, value: String },

    /// A maximal run of non-newline whitespace characters. Also produced for an entire comment
    /// that carries no directive; the parser treats both identically.
    Whitespace(&'input str),

    /// A full, contiguous match of the configured statement terminator.
    StatementTerminator(&'input str),

    /// Only emitted when a directive header (optional dashes and whitespace, then '#') follows;
    /// a '--' comment without one is swallowed whole and surfaces as a [Whitespace] token.
    LineCommentStart, // "--"

    /// Only emitted when a block directive header ('**' then '#', with optional whitespace)
    /// follows; a '/*' comment without one is swallowed whole and surfaces as a [Whitespace] token.
    BlockStart, // "/*"

    BlockStop, // "*/"
    DoubleStar,       // "**"
    Comma,            // ","
    Colon,            // ":"
    Hash,             // "#"

    /// Emitted once for each of "\n", "\r", and "\r\n".
    EndOfLine,

    /// Emitted indefinitely once the end of the input buffer is reached.
    EndOfFile,
}

impl TokenKind<'_> {
    /// The token's text exactly as written in the source (quotation marks included).
    pub fn lexeme(&self) -> &str {
        match self {
            Self::Word(text) => text,
            Self::SingleQuoted { raw, .. } => raw,
            Self::DoubleQuoted { raw, .. } => raw,
            Self::MultilineQuoted { raw, .. } => raw,
            Self::Whitespace(text) => text,
            Self::StatementTerminator(text) => text,
            Self::LineCommentStart => "--",
            Self::BlockStart => "/*",
            Self::BlockStop => "*/",
            Self::DoubleStar => "**",
            Self::Comma => ",",
            Self::Colon => ":",
            Self::Hash => "#",
            Self::EndOfLine => "\n",
            Self::EndOfFile => "",
        }
    }

    /// The post-escape content of a quoted token, without its quotation marks.
    pub fn string_value(&self) -> Option<&str> {
        match self {
            Self::SingleQuoted { value, .. } => Some(value),
            Self::DoubleQuoted { value, .. } => Some(value),
            Self::MultilineQuoted { value, .. } => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Whitespace(_) => f.write_str("whitespace"),
            Self::EndOfLine => f.write_str("end of line"),
            Self::EndOfFile => f.write_str("end of file"),
            other => write!(f, "'{}'", other.lexeme()),
        }
    }
}

/// This enum specifies all the kinds of errors that the script [Lexer](super::lexer::Lexer) can return.
#[derive(Clone, Debug)]
pub enum ErrorKind {
    /// Returned when a string is missing its closing quotation mark: at end of input, or at a
    /// bare newline inside a string that isn't triple-quoted.
    /// Ex: `SELECT 'abc`, there's no closing `'` before EOL.
    UnterminatedString,

    /// Returned when a block comment is missing its closing "*/".
    /// Ex: `/* this is a bad comment`, there's no closing "*/" before EOF.
    UnterminatedBlockComment,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedString => f.write_str("unterminated string"),
            Self::UnterminatedBlockComment => f.write_str("unterminated block comment"),
        }
    }
}
