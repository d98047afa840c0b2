// Copyright (c) ZeroC, Inc.

use super::invalid_directive;
use crate::diagnostics::{Error, ErrorKind};
use crate::grammar::{Directive, DirectiveInitialization, DirectiveState};
use crate::processor::PropertiesAccessor;
use crate::processors::composite::{DirectiveHandler, HandlerContext};

use std::any::Any;
use std::rc::Rc;

const IF_DIRECTIVE: &str = "If";
const IF_NOT_DIRECTIVE: &str = "IfNot";

/// Handles `#If` and `#IfNot` directives: `-- #If: property, "sql text"` substitutes the given
/// text when the named property evaluates truthy (falsy for `#IfNot`), and nothing otherwise.
///
/// By default the property is evaluated once, at compilation, and the directive is discarded.
/// With deferred evaluation enabled the directive defers instead, and every execution of the
/// statement re-evaluates the property during the setup pass.
///
/// A property is truthy when it is present, non-empty, and neither `false` nor `0`.
pub struct ConditionalHandler {
    properties: Rc<dyn PropertiesAccessor>,
    defer_evaluation: bool,
}

/// Configuration entry for a [ConditionalHandler], keyed by the handler's identity inside the
/// composite configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConditionalConfig {
    pub defer_evaluation: bool,
}

/// Carried state of a deferred conditional, re-evaluated on every execution.
#[derive(Clone, Debug)]
struct ConditionState {
    property: String,
    replacement: String,
    negate: bool,
}

impl ConditionalHandler {
    pub fn new(properties: Rc<dyn PropertiesAccessor>) -> Self {
        ConditionalHandler {
            properties,
            defer_evaluation: false,
        }
    }

    pub fn with_deferred_evaluation(mut self, defer: bool) -> Self {
        self.defer_evaluation = defer;
        self
    }

    fn is_truthy(&self, property: &str) -> bool {
        match self.properties.get_property(property) {
            Some(value) => !value.is_empty() && !value.eq_ignore_ascii_case("false") && value != "0",
            None => false,
        }
    }
}

impl DirectiveHandler for ConditionalHandler {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn init_handler(&mut self, config: Option<&Rc<dyn Any>>, _context: &HandlerContext) -> Result<(), Error> {
        if let Some(config) = config {
            let config = config.downcast_ref::<ConditionalConfig>().ok_or_else(|| {
                Error::new(ErrorKind::InvalidOperation {
                    message: "conditional handler configuration has the wrong type".to_owned(),
                })
            })?;
            self.defer_evaluation = config.defer_evaluation;
        }
        Ok(())
    }

    fn init_directive(
        &mut self,
        directive: &Directive,
        _context: &HandlerContext,
    ) -> Result<Option<DirectiveInitialization>, Error> {
        let negate = match directive.name.as_str() {
            IF_DIRECTIVE => false,
            IF_NOT_DIRECTIVE => true,
            _ => return Ok(None),
        };

        let [property, replacement] = directive.arguments.as_slice() else {
            return Err(invalid_directive(directive, "expected a property name and a replacement text"));
        };

        if self.defer_evaluation {
            let state = ConditionState {
                property: property.clone(),
                replacement: replacement.clone(),
                negate,
            };
            return Ok(Some(DirectiveInitialization::deferred().set_state(state)));
        }

        let initialization = match self.is_truthy(property) != negate {
            true => DirectiveInitialization::discard().set_replacement(replacement.clone()),
            false => DirectiveInitialization::discard(),
        };
        Ok(Some(initialization))
    }

    fn setup_directive(
        &mut self,
        directive: &Directive,
        state: Option<&DirectiveState>,
        _context: &HandlerContext,
    ) -> Result<Option<DirectiveInitialization>, Error> {
        if !matches!(directive.name.as_str(), IF_DIRECTIVE | IF_NOT_DIRECTIVE) {
            return Ok(None);
        }

        let condition = state
            .and_then(|state| state.downcast_ref::<ConditionState>())
            .ok_or_else(|| invalid_directive(directive, "missing condition state"))?
            .clone();

        let initialization = match self.is_truthy(&condition.property) != condition.negate {
            true => {
                let replacement = condition.replacement.clone();
                DirectiveInitialization::store().set_state(condition).set_replacement(replacement)
            }
            false => DirectiveInitialization::store().set_state(condition),
        };
        Ok(Some(initialization))
    }
}
