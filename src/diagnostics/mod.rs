// Copyright (c) ZeroC, Inc.

use crate::script_file::Span;

mod errors;

pub use errors::ErrorKind;

/// An error surfaced by the script engine: the kind of failure plus the span of script source it
/// originated from, when one is known.
///
/// Unlike a batch compiler, the engine is fail-fast: the first error aborts the current
/// `execute_script` call and is returned to the caller instead of being collected for later
/// emission.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    span: Option<Span>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Error { kind, span: None }
    }

    pub fn set_span(mut self, span: &Span) -> Self {
        self.span = Some(span.to_owned());
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the [Span] of this error if it has one.
    pub fn span(&self) -> Option<&Span> {
        self.span.as_ref()
    }

    /// Returns this error's code, of the form `E###`.
    pub fn code(&self) -> &str {
        self.kind.code()
    }

    /// Returns the message of this error.
    pub fn message(&self) -> String {
        self.kind.message()
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io { error, .. } => Some(error),
            ErrorKind::StatementExecution { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

/// A macro that implements the `code` and `message` functions for the [ErrorKind] enum.
#[macro_export]
macro_rules! implement_error_functions {
    ($type:ident, $(($code:literal, $kind:ident, $message:expr $(, $variant:ident)* )),* $(,)?) => {
        impl $type {
            pub fn code(&self) -> &str {
                match self {
                    $(
                        implement_error_functions!(@pattern $type::$kind, $($variant),*) => $code,
                    )*
                }
            }

            pub fn message(&self) -> String {
                match self {
                    $(
                        implement_error_functions!(@fields $type::$kind, $($variant),*) => $message.into(),
                    )*
                }
            }
        }
    };

    (@pattern $kind:path,) => {
        $kind
    };

    (@pattern $kind:path, $($variant:ident),+) => {
        $kind {..}
    };

    (@fields $kind:path,) => {
        $kind
    };

    (@fields $kind:path, $($variant:ident),+) => {
        $kind { $($variant),+ , .. }
    };
}
