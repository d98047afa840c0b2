// Copyright (c) ZeroC, Inc.

use crate::script_file::Span;
use std::fmt;

/// A named annotation embedded in a SQL comment, with an ordered argument list.
///
/// Directives come in two surface forms:
/// ```sql
/// -- #Name: arg1, arg2
/// /* ** #Name: arg1, arg2 */
/// ```
/// Directives are immutable once parsed; processors interpret them during compilation.
#[derive(Clone, Debug)]
pub struct Directive {
    pub name: String,
    pub arguments: Vec<String>,
    pub span: Span,
}

impl Directive {
    pub fn new(name: String, arguments: Vec<String>, span: Span) -> Self {
        Directive { name, arguments, span }
    }

    /// The line of the script the directive was written on.
    pub fn line(&self) -> usize {
        self.span.start.row
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.name)?;
        if !self.arguments.is_empty() {
            write!(f, ": {}", self.arguments.join(", "))?;
        }
        Ok(())
    }
}
