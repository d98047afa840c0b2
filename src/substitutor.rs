// Copyright (c) ZeroC, Inc.

//! Placeholder substitution over statement text.
//!
//! Directives parsed out of a statement leave `{#N}` markers behind in its text. This module owns
//! the marker syntax: the parser formats markers through [placeholder_marker], and both the
//! compilation and setup passes resolve them through [substitute]. The marker shape was chosen so
//! that it cannot occur in natural SQL and is matched by a single unambiguous pattern.

use crate::diagnostics::Error;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PLACEHOLDER_PATTERN: Regex = Regex::new(r"\{(#\d+)\}").unwrap();
}

/// Formats a placeholder id as the marker embedded in statement text: `#3` becomes `{#3}`.
pub fn placeholder_marker(id: &str) -> String {
    format!("{{{id}}}")
}

/// Returns the placeholder ids embedded in the given text, in order of appearance.
pub fn placeholder_ids(text: &str) -> Vec<&str> {
    PLACEHOLDER_PATTERN
        .captures_iter(text)
        .map(|captures| captures.get(1).unwrap().as_str())
        .collect()
}

/// Walks the text once, copying it into a fresh buffer. At every placeholder marker the callback
/// is invoked with the marker's id and the output buffer, and decides what (if anything) to
/// append in the marker's place. Content appended by the callback is not rescanned, so
/// substitutions never nest.
pub fn substitute<F>(text: &str, mut append: F) -> Result<String, Error>
where
    F: FnMut(&str, &mut String) -> Result<(), Error>,
{
    let mut output = String::with_capacity(text.len());
    let mut tail = 0;

    for captures in PLACEHOLDER_PATTERN.captures_iter(text) {
        let marker = captures.get(0).unwrap();
        output.push_str(&text[tail..marker.start()]);
        append(captures.get(1).unwrap().as_str(), &mut output)?;
        tail = marker.end();
    }

    output.push_str(&text[tail..]);
    Ok(output)
}
