// Copyright (c) ZeroC, Inc.

use crate::script_file::DEFAULT_STATEMENT_TERMINATOR;
use clap::ArgAction::Append;
use clap::{Parser, ValueEnum};
use serde::Serialize;

// Note: clap uses the doc-comments of fields to populate the '--help' output of sqlscriptc.
//       boolean flags automatically default to false, and strings automatically default to empty.

/// This struct is responsible for parsing the command line options of the script compiler.
/// The option parsing capabilities are generated on the struct by the `clap` macro.
#[derive(Default, Parser)]
#[command(rename_all = "kebab-case")]
pub struct ScriptOptions {
    /// List of SQL script files to compile.
    #[arg(required = true)]
    pub scripts: Vec<String>,

    /// Define a property for conditional directive evaluation, as 'name=value'.
    #[arg(short = 'D', value_name = "PROPERTY", num_args = 1, action = Append)]
    pub properties: Vec<String>,

    /// Set the statement terminator scripts are split on.
    #[arg(short = 't', long, default_value = DEFAULT_STATEMENT_TERMINATOR)]
    pub terminator: String,

    /// Re-evaluate conditional directives on every execution instead of once at compilation.
    #[arg(long)]
    pub defer_conditionals: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Set the output format for emitted errors.
    #[arg(value_enum, default_value_t = DiagnosticFormat::Human, long, ignore_case = true)]
    pub diagnostic_format: DiagnosticFormat,

    /// Disable ANSI color codes in diagnostic output.
    #[arg(long)]
    pub disable_color: bool,
}

/// This enum is used to specify the format for emitted diagnostics.
///
/// # Variants
/// * Human - Any emitted diagnostics will be printed to the console with an easily readable format.
/// * Json - Any emitted diagnostics will be serialized as JSON objects and printed to the console.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, ValueEnum)]
pub enum DiagnosticFormat {
    #[default]
    Human,
    Json,
}
