// Copyright (c) ZeroC, Inc.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Opaque state chosen by a processor when it initializes a directive. It is carried inside the
/// compiled script and handed back to the processor on every setup and execution pass.
///
/// The engine never inspects it; handlers downcast it back to their own state type.
pub type DirectiveState = Rc<dyn Any>;

/// What becomes of a directive after initialization.
///
/// A directive cannot be simultaneously discarded and deferred, so that illegal combination is
/// unrepresentable here rather than checked at runtime.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Disposition {
    /// The directive is dropped from the compiled statement entirely.
    Discard,

    /// The directive is stored in the compiled statement and presented at execution.
    Store,

    /// The directive is stored, and additionally re-presented to the processor for a setup pass
    /// on every execution before the statement runs.
    StoreDeferred,
}

/// A processor's answer to "what should this directive become?".
///
/// The replacement text, when present, is substituted into the statement where the directive's
/// placeholder stood. Deferred directives keep their placeholder until the setup pass resolves it.
#[derive(Clone)]
pub struct DirectiveInitialization {
    pub disposition: Disposition,
    pub replacement: Option<String>,
    pub state: Option<DirectiveState>,
}

impl DirectiveInitialization {
    /// The directive is kept and presented at execution; its placeholder is removed from the text.
    pub fn store() -> Self {
        DirectiveInitialization {
            disposition: Disposition::Store,
            replacement: None,
            state: None,
        }
    }

    /// The directive is dropped after initialization; its placeholder is removed from the text.
    pub fn discard() -> Self {
        DirectiveInitialization {
            disposition: Disposition::Discard,
            replacement: None,
            state: None,
        }
    }

    /// The directive's placeholder survives compilation, and every execution runs a setup pass
    /// over it to produce the final text.
    pub fn deferred() -> Self {
        DirectiveInitialization {
            disposition: Disposition::StoreDeferred,
            replacement: None,
            state: None,
        }
    }

    pub fn set_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = Some(replacement.into());
        self
    }

    pub fn set_state<T: Any>(mut self, state: T) -> Self {
        self.state = Some(Rc::new(state));
        self
    }
}

impl fmt::Debug for DirectiveInitialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectiveInitialization")
            .field("disposition", &self.disposition)
            .field("replacement", &self.replacement)
            .field("state", &self.state.as_ref().map(|_| "<opaque>"))
            .finish()
    }
}
