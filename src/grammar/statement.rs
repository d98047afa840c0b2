// Copyright (c) ZeroC, Inc.

use super::Directive;
use crate::script_file::Span;
use std::collections::HashMap;

/// One statement of a parsed script, before any directive has been initialized.
///
/// Where a directive occurred in the source, the text holds an opaque `{#N}` placeholder marker
/// instead; the placeholder map associates each marker id with the directive parsed out of it.
/// Every id in the map appears exactly once in the text and vice versa.
#[derive(Clone, Debug)]
pub struct Statement {
    pub text: String,
    pub span: Span,
    pub directives: HashMap<String, Directive>,
}
