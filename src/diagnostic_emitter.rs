// Copyright (c) ZeroC, Inc.

use crate::diagnostics::Error;
use crate::script_file::{ScriptSource, Span};
use crate::script_options::{DiagnosticFormat, ScriptOptions};
use serde::ser::SerializeStruct;
use serde::Serializer;
use std::collections::HashMap;
use std::io::{Result, Write};
use std::path::Path;

pub struct DiagnosticEmitter<'a, T: Write> {
    /// Reference to the output that errors should be emitted to.
    output: &'a mut T,
    /// Can specify `json` to serialize errors as JSON or `human` to pretty-print them.
    diagnostic_format: DiagnosticFormat,
    /// If true, error output will not be styled with colors (only used in `human` format).
    disable_color: bool,
    /// Provides the emitter access to the compiled script sources so it can extract snippets from them.
    sources: &'a HashMap<String, ScriptSource>,
}

impl<'a, T: Write> DiagnosticEmitter<'a, T> {
    pub fn new(output: &'a mut T, options: &ScriptOptions, sources: &'a HashMap<String, ScriptSource>) -> Self {
        DiagnosticEmitter {
            output,
            diagnostic_format: options.diagnostic_format,
            disable_color: options.disable_color,
            sources,
        }
    }

    pub fn emit_error(&mut self, error: &Error) -> Result<()> {
        // Disable colors if the user requested no colors.
        if self.disable_color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }

        // Emit the error in whatever form the user requested.
        match self.diagnostic_format {
            DiagnosticFormat::Human => self.emit_error_in_human(error),
            DiagnosticFormat::Json => self.emit_error_in_json(error),
        }
    }

    fn emit_error_in_human(&mut self, error: &Error) -> Result<()> {
        let code = error.code();
        let prefix = console::style(format!("error [{code}]")).red().bold();
        writeln!(self.output, "{prefix}: {}", console::style(error.message()).bold())?;

        // If the error contains a span, show a snippet containing the offending script text.
        if let Some(span) = error.span() {
            self.emit_snippet(span)?;
        }
        Ok(())
    }

    fn emit_error_in_json(&mut self, error: &Error) -> Result<()> {
        // Write the error as a single line of JSON.
        let mut serializer = serde_json::Serializer::new(&mut *self.output);
        let mut state = serializer.serialize_struct("Error", 4)?;
        state.serialize_field("message", &error.message())?;
        state.serialize_field("severity", "error")?;
        state.serialize_field("span", &error.span())?;
        state.serialize_field("error_code", error.code())?;
        state.end()?;
        writeln!(self.output)?;
        Ok(())
    }

    fn emit_snippet(&mut self, span: &Span) -> Result<()> {
        // Display the script name and the row and column where the error began.
        writeln!(
            self.output,
            " {} {}:{}:{}",
            console::style("-->").blue().bold(),
            Path::new(&span.file).display(),
            span.start.row,
            span.start.col,
        )?;

        // Display the offending line, when the script source is available.
        let Some(line) = self
            .sources
            .get(&span.file)
            .and_then(|source| source.text.lines().nth(span.start.row - 1))
        else {
            return Ok(());
        };

        let line_number = console::style(format!("{: >4} |", span.start.row)).blue().bold();
        let padding = console::style("     |").blue().bold();
        writeln!(self.output, "{padding}")?;
        writeln!(self.output, "{line_number} {line}")?;

        // Underline the offending columns; spans ending on a later row underline to end of line.
        let underline_end = match span.end.row == span.start.row {
            true => span.end.col,
            false => line.chars().count() + 1,
        }
        .max(span.start.col + 1);
        let underline = format!(
            "{}{}",
            " ".repeat(span.start.col - 1),
            "^".repeat(underline_end - span.start.col),
        );
        writeln!(self.output, "{padding} {}", console::style(underline).red().bold())?;
        Ok(())
    }
}

pub fn emit_totals(total_errors: usize) -> Result<()> {
    if total_errors > 0 {
        let failed = console::style("Failed").red().bold();
        writeln!(
            &mut console::Term::stdout(),
            "{failed}: Compilation failed with {total_errors} error(s)"
        )?;
    }
    Ok(())
}
