// Copyright (c) ZeroC, Inc.

//! The collaborator interfaces of the script engine: script resolution, directive processing, and
//! property access. Implementations are supplied by callers; the engine only drives them.

use crate::diagnostics::Error;
use crate::grammar::{Directive, DirectiveInitialization, DirectiveState, InitializedDirective};
use crate::script_file::ScriptSource;

use std::any::{Any, TypeId};

/// Resolves script names to script sources.
///
/// Returning `Ok(None)` means the resolver doesn't know the name; the engine reports that as a
/// "script not found" error rather than falling through to another resolver.
pub trait ScriptResolver {
    fn resolve(&self, name: &str) -> Result<Option<ScriptSource>, Error>;
}

/// The pluggable component that interprets directives and executes statements.
///
/// A processor goes through three lifecycle stages per directive: `init_directive` once per
/// (script, processor identity) during compilation, `setup_directive` on every execution for
/// directives whose initialization deferred, and `execute_statement` once per statement per
/// execution.
pub trait ScriptProcessor {
    /// The processor's explicit identity, if it carries one. Processors without one are keyed by
    /// their concrete type instead; see [processor_identity].
    fn identity(&self) -> Option<&str> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    /// Processors that can resolve script sources themselves return `Some` here, and take
    /// precedence over the engine's configured resolver.
    fn as_resolver(&self) -> Option<&dyn ScriptResolver> {
        None
    }

    /// Called once before a script is compiled for this processor, with the engine's global
    /// configuration entry for this processor's identity (if one was registered).
    fn init_processor(&mut self, _config: Option<&std::rc::Rc<dyn Any>>) -> Result<(), Error> {
        Ok(())
    }

    /// Interprets one directive during compilation. Returning `Ok(None)` signals the directive
    /// isn't recognized by this processor.
    fn init_directive(&mut self, directive: &Directive) -> Result<Option<DirectiveInitialization>, Error>;

    /// Re-interprets a deferred directive at execution time, with the state carried from its
    /// initialization. Returning `Ok(None)` for a deferred directive is a contract violation and
    /// is reported as an invalid operation by the engine.
    fn setup_directive(
        &mut self,
        _directive: &Directive,
        _state: Option<&DirectiveState>,
    ) -> Result<Option<DirectiveInitialization>, Error> {
        Ok(None)
    }

    /// Executes one fully resolved statement. `directives` holds the statement's surviving
    /// directives in source order, with the state produced by their latest lifecycle stage.
    fn execute_statement(
        &mut self,
        text: &str,
        directives: &[InitializedDirective],
    ) -> Result<(), Box<dyn std::error::Error>>;
}

/// Accesses named properties for conditional directive evaluation.
pub trait PropertiesAccessor {
    fn get_property(&self, name: &str) -> Option<String>;
}

impl PropertiesAccessor for std::collections::HashMap<String, String> {
    fn get_property(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// The key a processor's compiled scripts and configuration are stored under: its explicit
/// identity when it has one, otherwise a token for its concrete type.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum ProcessorIdentity {
    Named(String),
    Typed(TypeId),
}

impl ProcessorIdentity {
    pub fn named(name: impl Into<String>) -> Self {
        ProcessorIdentity::Named(name.into())
    }

    /// The identity of any processor or handler of type `T` that carries no explicit identity.
    pub fn of<T: 'static>() -> Self {
        ProcessorIdentity::Typed(TypeId::of::<T>())
    }
}

/// Computes the identity of a processor; see [ProcessorIdentity].
pub fn processor_identity(processor: &dyn ScriptProcessor) -> ProcessorIdentity {
    match processor.identity() {
        Some(name) => ProcessorIdentity::Named(name.to_owned()),
        None => ProcessorIdentity::Typed(processor.as_any().type_id()),
    }
}
