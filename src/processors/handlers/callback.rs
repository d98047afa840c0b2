// Copyright (c) ZeroC, Inc.

use super::invalid_directive;
use crate::diagnostics::Error;
use crate::grammar::{Directive, DirectiveInitialization, DirectiveState};
use crate::processors::composite::{DirectiveHandler, HandlerContext};

use log::trace;
use std::any::Any;
use std::collections::HashMap;

const CALLBACK_DIRECTIVE: &str = "Callback";

/// The hook a caller registers under a name: invoked with the directive's remaining arguments and
/// the fully resolved statement text.
pub type ScriptCallback = Box<dyn FnMut(&[String], &str) -> Result<(), Box<dyn std::error::Error>>>;

/// Handles `#Callback` directives: `-- #Callback: name[, args...]` routes the statement to the
/// callback registered under `name` instead of executing it as a command. The callback name must
/// be registered before compilation; directives naming unknown callbacks fail initialization.
#[derive(Default)]
pub struct CallbackHandler {
    callbacks: HashMap<String, ScriptCallback>,
}

#[derive(Clone, Debug)]
struct CallbackState {
    name: String,
    arguments: Vec<String>,
}

impl CallbackHandler {
    pub fn new() -> Self {
        CallbackHandler::default()
    }

    pub fn with_callback(
        mut self,
        name: impl Into<String>,
        callback: impl FnMut(&[String], &str) -> Result<(), Box<dyn std::error::Error>> + 'static,
    ) -> Self {
        self.callbacks.insert(name.into(), Box::new(callback));
        self
    }
}

impl DirectiveHandler for CallbackHandler {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn init_directive(
        &mut self,
        directive: &Directive,
        _context: &HandlerContext,
    ) -> Result<Option<DirectiveInitialization>, Error> {
        if directive.name != CALLBACK_DIRECTIVE {
            return Ok(None);
        }

        let Some((name, arguments)) = directive.arguments.split_first() else {
            return Err(invalid_directive(directive, "expected a callback name"));
        };
        if !self.callbacks.contains_key(name) {
            return Err(invalid_directive(
                directive,
                format!("no callback registered under '{name}'"),
            ));
        }

        let state = CallbackState {
            name: name.clone(),
            arguments: arguments.to_vec(),
        };
        Ok(Some(DirectiveInitialization::store().set_state(state)))
    }

    fn try_execute(
        &mut self,
        text: &str,
        directive: &Directive,
        state: Option<&DirectiveState>,
        _context: &HandlerContext,
    ) -> Result<bool, Box<dyn std::error::Error>> {
        if directive.name != CALLBACK_DIRECTIVE {
            return Ok(false);
        }

        let state = state
            .and_then(|state| state.downcast_ref::<CallbackState>())
            .ok_or("callback directive is missing its state")?;
        let callback = self
            .callbacks
            .get_mut(&state.name)
            .ok_or_else(|| format!("no callback registered under '{}'", state.name))?;

        trace!("routing statement to callback '{}'", state.name);
        callback(&state.arguments, text)?;
        Ok(true)
    }
}
