// Copyright (c) ZeroC, Inc.

use crate::diagnostics::{Error, ErrorKind};
use crate::grammar::{
    CompiledScript, Directive, Disposition, InitializedDirective, InitializedStatement, Statement,
};
use crate::parsers::script::parser::Parser;
use crate::processor::{processor_identity, ProcessorIdentity, ScriptProcessor, ScriptResolver};
use crate::script_file::ScriptSource;
use crate::substitutor::{placeholder_marker, substitute};

use log::{debug, trace};
use std::any::Any;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::rc::Rc;

/// Compiles scripts on first use and drives their execution against a [ScriptProcessor].
///
/// Compilation resolves the script source, parses it, and runs every directive through the
/// processor's `init_directive`, producing a [CompiledScript] that is cached under
/// `(script name, processor identity)` for the lifetime of the runner. Cached entries are
/// immutable: later executions with a different configuration or processor instance of the same
/// identity reuse the entry without re-initializing it.
///
/// A runner is single-threaded: callers serialize executions on it. Distinct runners are
/// independent (each owns its cache) and may run scripts in parallel with one another.
pub struct ScriptRunner {
    resolver: Option<Box<dyn ScriptResolver>>,
    configs: HashMap<ProcessorIdentity, Rc<dyn Any>>,
    cache: HashMap<(String, ProcessorIdentity), Rc<CompiledScript>>,
}

impl ScriptRunner {
    pub fn new() -> Self {
        ScriptRunner {
            resolver: None,
            configs: HashMap::new(),
            cache: HashMap::new(),
        }
    }

    /// Sets the resolver used to turn script names into sources. Without one, names are treated
    /// as filesystem paths and read directly.
    pub fn with_resolver(mut self, resolver: impl ScriptResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// Registers a global configuration value handed to processors of the given identity when
    /// they are initialized.
    pub fn with_config(mut self, identity: ProcessorIdentity, config: Rc<dyn Any>) -> Self {
        self.configs.insert(identity, config);
        self
    }

    /// Returns true if a compiled form of the script is cached for the given processor.
    pub fn is_compiled(&self, name: &str, processor: &dyn ScriptProcessor) -> bool {
        let key = (name.to_owned(), processor_identity(processor));
        self.cache.contains_key(&key)
    }

    /// Executes the named script through the given processor, compiling it first if no compiled
    /// form is cached for the processor's identity.
    ///
    /// Statements execute in source order; within a statement, directives are presented to every
    /// lifecycle stage in source order.
    pub fn execute_script(&mut self, name: &str, processor: &mut dyn ScriptProcessor) -> Result<(), Error> {
        let identity = processor_identity(processor);
        let key = (name.to_owned(), identity);

        let compiled = match self.cache.get(&key) {
            Some(compiled) => {
                debug!("using cached compilation of script '{name}'");
                Rc::clone(compiled)
            }
            None => {
                let compiled = Rc::new(self.compile(name, &key.1, processor)?);
                self.cache.insert(key, Rc::clone(&compiled));
                compiled
            }
        };

        self.run(&compiled, processor)
    }

    fn compile(
        &self,
        name: &str,
        identity: &ProcessorIdentity,
        processor: &mut dyn ScriptProcessor,
    ) -> Result<CompiledScript, Error> {
        processor.init_processor(self.configs.get(identity))?;

        let source = self.resolve_source(name, processor)?;
        let statements = Parser::parse(&source)?;
        debug!("compiling script '{}': {} statement(s)", source.name, statements.len());

        let mut compiled = Vec::with_capacity(statements.len());
        for statement in statements {
            compiled.push(initialize_statement(statement, processor)?);
        }
        Ok(CompiledScript { statements: compiled })
    }

    /// Resolves a script name to its source: through the processor if it can resolve scripts
    /// itself, else through the configured resolver, else by reading the name as a file path.
    fn resolve_source(&self, name: &str, processor: &dyn ScriptProcessor) -> Result<ScriptSource, Error> {
        let resolved = if let Some(resolver) = processor.as_resolver() {
            resolver.resolve(name)?
        } else if let Some(resolver) = &self.resolver {
            resolver.resolve(name)?
        } else {
            return match fs::read_to_string(name) {
                Ok(text) => Ok(ScriptSource::new(name, text)),
                Err(error) if error.kind() == io::ErrorKind::NotFound => {
                    Err(Error::new(ErrorKind::ScriptNotFound { name: name.to_owned() }))
                }
                Err(error) => Err(Error::new(ErrorKind::Io {
                    action: "read",
                    path: name.to_owned(),
                    error,
                })),
            };
        };

        resolved.ok_or_else(|| Error::new(ErrorKind::ScriptNotFound { name: name.to_owned() }))
    }

    fn run(&self, script: &CompiledScript, processor: &mut dyn ScriptProcessor) -> Result<(), Error> {
        for statement in &script.statements {
            let (text, directives) = setup_statement(statement, processor)?;
            processor.execute_statement(&text, &directives).map_err(|cause| {
                Error::new(ErrorKind::StatementExecution { text: text.clone(), cause }).set_span(&statement.span)
            })?;
        }
        Ok(())
    }
}

impl Default for ScriptRunner {
    fn default() -> Self {
        ScriptRunner::new()
    }
}

/// Rewrites one parsed statement by initializing each of its directives in order of appearance.
fn initialize_statement(
    statement: Statement,
    processor: &mut dyn ScriptProcessor,
) -> Result<InitializedStatement, Error> {
    let Statement { text, span, directives } = statement;

    let mut stored: Vec<InitializedDirective> = Vec::new();
    let mut deferred: HashMap<String, usize> = HashMap::new();

    let rewritten = substitute(&text, |id, output| {
        let directive = directives.get(id).ok_or_else(|| {
            Error::new(ErrorKind::InvalidOperation {
                message: format!("statement text references unknown placeholder '{id}'"),
            })
        })?;

        let initialization = processor
            .init_directive(directive)?
            .ok_or_else(|| unrecognized_directive(directive))?;
        trace!(
            "initialized directive '{}' with disposition {:?}",
            directive.name,
            initialization.disposition
        );

        match initialization.disposition {
            Disposition::StoreDeferred => {
                // The marker survives compilation; the setup pass resolves it on every
                // execution. An init-time replacement has no marker left to land on.
                output.push_str(&placeholder_marker(id));
                deferred.insert(id.to_owned(), stored.len());
                stored.push(InitializedDirective {
                    directive: directive.clone(),
                    id: id.to_owned(),
                    state: initialization.state,
                });
            }
            disposition => {
                if let Some(replacement) = &initialization.replacement {
                    output.push_str(replacement);
                }
                // Replacement and storage are independent: a directive may rewrite the text and
                // still be presented at execution.
                if disposition == Disposition::Store {
                    stored.push(InitializedDirective {
                        directive: directive.clone(),
                        id: id.to_owned(),
                        state: initialization.state,
                    });
                }
            }
        }
        Ok(())
    })?;

    Ok(InitializedStatement {
        text: rewritten,
        directives: stored,
        deferred,
        span,
    })
}

/// Produces the final text and directive list for one execution of a statement.
///
/// Statements without deferred directives use their compiled form as-is. Otherwise the deferred
/// markers are resolved through `setup_directive` against a working copy of the stored list;
/// deletions requested by the setup pass are applied last so the recorded indices stay valid.
fn setup_statement(
    statement: &InitializedStatement,
    processor: &mut dyn ScriptProcessor,
) -> Result<(String, Vec<InitializedDirective>), Error> {
    let mut working = statement.directives.clone();
    if !statement.has_deferred_directives() {
        return Ok((statement.text.clone(), working));
    }

    let mut removals: Vec<usize> = Vec::new();
    let text = substitute(&statement.text, |id, output| {
        let index = *statement.deferred.get(id).ok_or_else(|| {
            Error::new(ErrorKind::InvalidOperation {
                message: format!("compiled text references unknown placeholder '{id}'"),
            })
        })?;

        let setup = {
            let entry = &working[index];
            processor.setup_directive(&entry.directive, entry.state.as_ref())?
        };
        let setup = setup.ok_or_else(|| {
            let directive = &working[index].directive;
            Error::new(ErrorKind::InvalidOperation {
                message: format!("setup of deferred directive '{}' produced no result", directive.name),
            })
            .set_span(&directive.span)
        })?;

        if let Some(replacement) = &setup.replacement {
            output.push_str(replacement);
        }
        match setup.disposition {
            Disposition::Discard => removals.push(index),
            _ => working[index].state = setup.state,
        }
        Ok(())
    })?;

    removals.sort_unstable();
    for index in removals.into_iter().rev() {
        working.remove(index);
    }

    Ok((text, working))
}

fn unrecognized_directive(directive: &Directive) -> Error {
    Error::new(ErrorKind::UnrecognizedDirective {
        directive: directive.to_string(),
    })
    .set_span(&directive.span)
}
