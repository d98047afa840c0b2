// Copyright (c) ZeroC, Inc.

pub mod client;
pub mod diagnostic_emitter;
pub mod diagnostics;
pub mod file_resolver;
pub mod grammar;
pub mod parsers;
pub mod processor;
pub mod processors;
pub mod runner;
pub mod script_file;
pub mod script_options;
pub mod substitutor;
pub mod test_helpers;

// Re-export the `clap` dependency.
pub extern crate clap;

use crate::diagnostics::Error;
use crate::grammar::Statement;
use crate::parsers::script::parser::Parser;
use crate::script_file::ScriptSource;

/// Parses a string of SQL into statements using the default statement terminator.
pub fn parse_from_string(text: &str) -> Result<Vec<Statement>, Error> {
    let source = ScriptSource::new("string-0", text);
    Parser::parse(&source)
}
