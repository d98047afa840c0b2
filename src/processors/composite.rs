// Copyright (c) ZeroC, Inc.

use crate::client::ClientProvider;
use crate::diagnostics::{Error, ErrorKind};
use crate::grammar::{Directive, DirectiveInitialization, DirectiveState, InitializedDirective};
use crate::processor::{ProcessorIdentity, ScriptProcessor};

use log::{debug, trace};
use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

/// Shared state the composite processor exposes to each of its handlers: the database-access
/// provider and the default command timeout.
#[derive(Clone, Default)]
pub struct HandlerContext {
    pub provider: Option<Rc<dyn ClientProvider>>,
    pub command_timeout: Option<Duration>,
}

/// Global configuration for a [CompositeProcessor], registered on the runner under the
/// composite's identity. The directive-config map carries one entry per handler, keyed by the
/// handler's identity.
#[derive(Default)]
pub struct CompositeConfig {
    pub directive_configs: HashMap<ProcessorIdentity, Rc<dyn Any>>,
    pub provider: Option<Rc<dyn ClientProvider>>,
    pub command_timeout: Option<Duration>,
}

/// One member of a [CompositeProcessor]: recognizes some subset of directive names.
///
/// Handlers signal "not mine" from `init_directive` and `setup_directive` by returning `Ok(None)`
/// or an [UnrecognizedDirective](ErrorKind::UnrecognizedDirective) error; the composite then
/// moves on to the next handler. `try_execute` signals it by returning `Ok(false)`.
pub trait DirectiveHandler {
    /// The handler's explicit identity, if it carries one; used to key its configuration entry.
    fn identity(&self) -> Option<&str> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    /// Called once before compilation with this handler's configuration entry, if one exists.
    fn init_handler(&mut self, _config: Option<&Rc<dyn Any>>, _context: &HandlerContext) -> Result<(), Error> {
        Ok(())
    }

    fn init_directive(
        &mut self,
        directive: &Directive,
        context: &HandlerContext,
    ) -> Result<Option<DirectiveInitialization>, Error>;

    fn setup_directive(
        &mut self,
        _directive: &Directive,
        _state: Option<&DirectiveState>,
        _context: &HandlerContext,
    ) -> Result<Option<DirectiveInitialization>, Error> {
        Ok(None)
    }

    /// Executes the statement on behalf of one of its directives. Returning `Ok(true)` claims the
    /// statement: the composite will not run it as a generic command.
    fn try_execute(
        &mut self,
        _text: &str,
        _directive: &Directive,
        _state: Option<&DirectiveState>,
        _context: &HandlerContext,
    ) -> Result<bool, Box<dyn std::error::Error>> {
        Ok(false)
    }
}

/// Computes the identity a handler's configuration entry is keyed by: its explicit identity when
/// it has one, otherwise a token for its concrete type.
pub fn handler_identity(handler: &dyn DirectiveHandler) -> ProcessorIdentity {
    match handler.identity() {
        Some(name) => ProcessorIdentity::Named(name.to_owned()),
        None => ProcessorIdentity::Typed(handler.as_any().type_id()),
    }
}

/// A [ScriptProcessor] implemented as an ordered sequence of [DirectiveHandlers](DirectiveHandler)
/// sharing one [HandlerContext].
///
/// Directive initialization and setup route to the first handler that recognizes the directive.
/// At execution, every directive is offered to the handlers in order; if none claims the
/// statement, its text runs as a generic non-query command through the context's provider.
pub struct CompositeProcessor {
    identity: Option<String>,
    handlers: Vec<Box<dyn DirectiveHandler>>,
    context: HandlerContext,
}

impl CompositeProcessor {
    pub fn new() -> Self {
        CompositeProcessor {
            identity: None,
            handlers: Vec::new(),
            context: HandlerContext::default(),
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// Appends a handler. Order matters: earlier handlers win ties for a directive name.
    pub fn with_handler(mut self, handler: impl DirectiveHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn with_provider(mut self, provider: Rc<dyn ClientProvider>) -> Self {
        self.context.provider = Some(provider);
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.context.command_timeout = Some(timeout);
        self
    }
}

impl Default for CompositeProcessor {
    fn default() -> Self {
        CompositeProcessor::new()
    }
}

impl ScriptProcessor for CompositeProcessor {
    fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn init_processor(&mut self, config: Option<&Rc<dyn Any>>) -> Result<(), Error> {
        if let Some(config) = config {
            let config = config.downcast_ref::<CompositeConfig>().ok_or_else(|| {
                Error::new(ErrorKind::InvalidOperation {
                    message: "composite processor configuration has the wrong type".to_owned(),
                })
            })?;

            if let Some(timeout) = config.command_timeout {
                self.context.command_timeout = Some(timeout);
            }
            if self.context.provider.is_none() {
                self.context.provider = config.provider.clone();
            }

            for handler in &mut self.handlers {
                let identity = handler_identity(handler.as_ref());
                handler.init_handler(config.directive_configs.get(&identity), &self.context)?;
            }
        } else {
            for handler in &mut self.handlers {
                handler.init_handler(None, &self.context)?;
            }
        }
        Ok(())
    }

    fn init_directive(&mut self, directive: &Directive) -> Result<Option<DirectiveInitialization>, Error> {
        for handler in &mut self.handlers {
            match handler.init_directive(directive, &self.context) {
                Ok(Some(initialization)) => {
                    trace!("directive '{}' claimed at initialization", directive.name);
                    return Ok(Some(initialization));
                }
                Ok(None) => continue,
                Err(error) if matches!(error.kind(), ErrorKind::UnrecognizedDirective { .. }) => continue,
                Err(error) => return Err(error),
            }
        }

        Err(Error::new(ErrorKind::UnrecognizedDirective {
            directive: directive.to_string(),
        })
        .set_span(&directive.span))
    }

    fn setup_directive(
        &mut self,
        directive: &Directive,
        state: Option<&DirectiveState>,
    ) -> Result<Option<DirectiveInitialization>, Error> {
        for handler in &mut self.handlers {
            match handler.setup_directive(directive, state, &self.context) {
                Ok(Some(initialization)) => return Ok(Some(initialization)),
                Ok(None) => continue,
                Err(error) if matches!(error.kind(), ErrorKind::UnrecognizedDirective { .. }) => continue,
                Err(error) => return Err(error),
            }
        }

        Err(Error::new(ErrorKind::InvalidDirective {
            directive: directive.to_string(),
            message: "no setup handler".to_owned(),
        })
        .set_span(&directive.span))
    }

    fn execute_statement(
        &mut self,
        text: &str,
        directives: &[InitializedDirective],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut claimed = false;
        for entry in directives {
            for handler in &mut self.handlers {
                if handler.try_execute(text, &entry.directive, entry.state.as_ref(), &self.context)? {
                    claimed = true;
                    break;
                }
            }
        }

        if !claimed {
            let provider = self
                .context
                .provider
                .as_ref()
                .ok_or("no client provider configured for statement execution")?;
            let mut command = provider.create_command(text)?;
            if let Some(timeout) = self.context.command_timeout {
                command.set_timeout(timeout);
            }
            let affected = command.execute()?;
            debug!("statement affected {affected} row(s)");
        }
        Ok(())
    }
}
