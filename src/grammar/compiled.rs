// Copyright (c) ZeroC, Inc.

use super::{Directive, DirectiveState};
use crate::script_file::Span;
use std::collections::HashMap;
use std::fmt;

/// A directive that survived initialization: the parsed directive, the placeholder id it occupied
/// in the statement text, and the state its processor chose to carry.
#[derive(Clone)]
pub struct InitializedDirective {
    pub directive: Directive,
    pub id: String,
    pub state: Option<DirectiveState>,
}

impl fmt::Debug for InitializedDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitializedDirective")
            .field("directive", &self.directive)
            .field("id", &self.id)
            .field("state", &self.state.as_ref().map(|_| "<opaque>"))
            .finish()
    }
}

/// A statement after every one of its directives has been initialized.
///
/// The text has static replacements already substituted; the only placeholder markers left in it
/// belong to deferred directives, which are resolved again on every execution. The deferred map
/// records each such marker's index into the stored directive list. Indices refer to the list as
/// stored here; execution-time deletions are applied to a working copy after the setup pass so
/// the recorded indices stay valid throughout it.
#[derive(Clone, Debug)]
pub struct InitializedStatement {
    pub text: String,
    pub directives: Vec<InitializedDirective>,
    pub deferred: HashMap<String, usize>,
    pub span: Span,
}

impl InitializedStatement {
    pub fn has_deferred_directives(&self) -> bool {
        !self.deferred.is_empty()
    }
}

/// The cached, compiled form of a script: its statements in source order.
#[derive(Clone, Debug, Default)]
pub struct CompiledScript {
    pub statements: Vec<InitializedStatement>,
}
