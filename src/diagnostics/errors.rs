// Copyright (c) ZeroC, Inc.

use crate::implement_error_functions;

#[derive(Debug)]
pub enum ErrorKind {
    // ----------------  Generic Errors ---------------- //
    Io {
        action: &'static str,
        path: String,
        error: std::io::Error,
    },

    /// The lexer or parser rejected the script source.
    Syntax {
        message: String,
    },

    /// A component was constructed with an unusable setting.
    /// Ex: a statement terminator containing a reserved character.
    Configuration {
        message: String,
    },

    // ----------------  Compile-Time Errors ---------------- //
    /// No handler produced an initialization for a directive.
    UnrecognizedDirective {
        /// The display form of the directive that went unclaimed.
        directive: String,
    },

    /// A directive was recognized but its contents were unusable.
    /// Ex: a 'LoadTable' column specification naming an unknown column type.
    InvalidDirective {
        /// The display form of the offending directive.
        directive: String,
        message: String,
    },

    /// No resolver produced source text for a script name.
    ScriptNotFound {
        /// The name the script was requested under.
        name: String,
    },

    /// A lifecycle contract was violated.
    /// Ex: a deferred directive whose setup pass produced no initialization.
    InvalidOperation {
        message: String,
    },

    // ----------------  Run-Time Errors ---------------- //
    /// The processor failed while executing a statement. Carries the fully resolved statement
    /// text; the statement's origin travels on the surrounding [Error](super::Error) as its span.
    StatementExecution {
        text: String,
        cause: Box<dyn std::error::Error>,
    },
}

implement_error_functions!(
    ErrorKind,
    (
        "E001",
        Io,
        format!("unable to {action} '{path}': {error}"),
        action,
        path,
        error
    ),
    (
        "E002",
        Syntax,
        format!("invalid syntax: {message}"),
        message
    ),
    (
        "E003",
        Configuration,
        format!("invalid configuration: {message}"),
        message
    ),
    (
        "E004",
        UnrecognizedDirective,
        format!("unrecognized directive '{directive}'"),
        directive
    ),
    (
        "E005",
        InvalidDirective,
        format!("invalid directive '{directive}': {message}"),
        directive,
        message
    ),
    (
        "E006",
        ScriptNotFound,
        format!("script '{name}' was not found"),
        name
    ),
    (
        "E007",
        InvalidOperation,
        format!("invalid operation: {message}"),
        message
    ),
    (
        "E008",
        StatementExecution,
        format!("statement execution failed: {cause}"),
        cause
    ),
);
