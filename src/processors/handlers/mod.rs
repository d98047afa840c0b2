// Copyright (c) ZeroC, Inc.

mod callback;
mod conditional;
mod load_table;

pub use callback::*;
pub use conditional::*;
pub use load_table::*;

use crate::diagnostics::{Error, ErrorKind};
use crate::grammar::Directive;

/// Builds the error a handler reports when it recognizes a directive's name but not its contents.
pub(crate) fn invalid_directive(directive: &Directive, message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidDirective {
        directive: directive.to_string(),
        message: message.into(),
    })
    .set_span(&directive.span)
}
