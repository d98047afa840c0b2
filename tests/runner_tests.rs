// Copyright (c) ZeroC, Inc.

mod helpers;

use helpers::RecordingProvider;
use sqlscriptc::diagnostics::{Error, ErrorKind};
use sqlscriptc::grammar::{Directive, DirectiveInitialization, DirectiveState, InitializedDirective};
use sqlscriptc::processor::{ProcessorIdentity, ScriptProcessor, ScriptResolver};
use sqlscriptc::processors::composite::CompositeProcessor;
use sqlscriptc::processors::handlers::ConditionalHandler;
use sqlscriptc::runner::ScriptRunner;
use sqlscriptc::script_file::ScriptSource;
use sqlscriptc::test_helpers::{MapProperties, MapScriptResolver};

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::error::Error as _;
use std::rc::Rc;

/// A processor with scripted per-directive-name behavior that records every lifecycle call.
#[derive(Default)]
struct ProbeProcessor {
    identity: Option<&'static str>,
    /// Directive names that defer at initialization.
    deferred_names: Vec<&'static str>,
    /// Directive names that are discarded during the setup pass.
    setup_discards: Vec<&'static str>,
    /// Replacement text applied at initialization (non-deferred names) or setup (deferred names).
    replacements: HashMap<&'static str, &'static str>,
    setup_returns_none: bool,
    fail_execution: bool,
    events: Rc<RefCell<Vec<String>>>,
}

impl ProbeProcessor {
    fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    fn replacement_for(&self, name: &str) -> Option<&'static str> {
        self.replacements.get(name).copied()
    }
}

impl ScriptProcessor for ProbeProcessor {
    fn identity(&self) -> Option<&str> {
        self.identity
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn init_processor(&mut self, config: Option<&Rc<dyn Any>>) -> Result<(), Error> {
        let config = config.and_then(|config| config.downcast_ref::<usize>());
        self.events.borrow_mut().push(format!("init_processor:{config:?}"));
        Ok(())
    }

    fn init_directive(&mut self, directive: &Directive) -> Result<Option<DirectiveInitialization>, Error> {
        self.events.borrow_mut().push(format!("init:{}", directive.name));

        if self.deferred_names.contains(&directive.name.as_str()) {
            return Ok(Some(DirectiveInitialization::deferred().set_state(directive.name.clone())));
        }
        let mut initialization = DirectiveInitialization::store();
        if let Some(replacement) = self.replacement_for(&directive.name) {
            initialization = initialization.set_replacement(replacement);
        }
        Ok(Some(initialization))
    }

    fn setup_directive(
        &mut self,
        directive: &Directive,
        _state: Option<&DirectiveState>,
    ) -> Result<Option<DirectiveInitialization>, Error> {
        self.events.borrow_mut().push(format!("setup:{}", directive.name));

        if self.setup_returns_none {
            return Ok(None);
        }
        let mut setup = match self.setup_discards.contains(&directive.name.as_str()) {
            true => DirectiveInitialization::discard(),
            false => DirectiveInitialization::store(),
        };
        if let Some(replacement) = self.replacement_for(&directive.name) {
            setup = setup.set_replacement(replacement);
        }
        Ok(Some(setup))
    }

    fn execute_statement(
        &mut self,
        text: &str,
        directives: &[InitializedDirective],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let names: Vec<&str> = directives.iter().map(|entry| entry.directive.name.as_str()).collect();
        self.events.borrow_mut().push(format!("execute:{text}|{}", names.join(",")));

        match self.fail_execution {
            true => Err("database exploded".into()),
            false => Ok(()),
        }
    }
}

fn runner_for(script: &str) -> ScriptRunner {
    ScriptRunner::new().with_resolver(MapScriptResolver::new().with_script("s", script))
}

#[test]
fn conditional_match_substitutes_statically() {
    // Arrange
    let properties = Rc::new(MapProperties::new().with_property("flag", "true"));
    let provider = RecordingProvider::new();
    let mut processor = CompositeProcessor::new()
        .with_provider(Rc::new(provider.clone()))
        .with_handler(ConditionalHandler::new(properties));
    let mut runner = runner_for("SELECT * FROM T -- #If: flag, \"WHERE a=1\"");

    // Act
    runner.execute_script("s", &mut processor).unwrap();

    // Assert
    assert_eq!(provider.texts(), ["SELECT * FROM T WHERE a=1"]);
}

#[test]
fn conditional_mismatch_substitutes_nothing() {
    // Arrange
    let properties = Rc::new(MapProperties::new());
    let provider = RecordingProvider::new();
    let mut processor = CompositeProcessor::new()
        .with_provider(Rc::new(provider.clone()))
        .with_handler(ConditionalHandler::new(properties));
    let mut runner = runner_for("SELECT * FROM T -- #If: flag, \"WHERE a=1\"");

    // Act
    runner.execute_script("s", &mut processor).unwrap();

    // Assert
    assert_eq!(provider.texts(), ["SELECT * FROM T "]);
}

#[test]
fn deferred_conditional_reevaluates_on_every_execution() {
    // Arrange
    let properties = Rc::new(MapProperties::new().with_property("flag", "true"));
    let provider = RecordingProvider::new();
    let handler = ConditionalHandler::new(Rc::clone(&properties) as _).with_deferred_evaluation(true);
    let mut processor = CompositeProcessor::new()
        .with_provider(Rc::new(provider.clone()))
        .with_handler(handler);
    let mut runner = runner_for("SELECT * FROM T -- #If: flag, \"WHERE a=1\"");

    // Act
    runner.execute_script("s", &mut processor).unwrap();
    properties.set_property("flag", "");
    runner.execute_script("s", &mut processor).unwrap();

    // Assert
    assert_eq!(provider.texts(), ["SELECT * FROM T WHERE a=1", "SELECT * FROM T "]);
}

#[test]
fn unrecognized_directives_fail_compilation_and_leave_the_cache_empty() {
    // Arrange: a composite with no handlers recognizes nothing.
    let provider = RecordingProvider::new();
    let mut processor = CompositeProcessor::new().with_provider(Rc::new(provider.clone()));
    let mut runner = runner_for("-- #NoSuch: x\nSELECT 1;");

    // Act
    let error = runner.execute_script("s", &mut processor).unwrap_err();

    // Assert
    assert!(matches!(
        error.kind(),
        ErrorKind::UnrecognizedDirective { directive } if directive.contains("NoSuch"),
    ));
    assert!(!runner.is_compiled("s", &processor));
    assert!(provider.texts().is_empty());
}

#[test]
fn replacement_without_discard_keeps_the_directive_stored() {
    // A directive may rewrite the statement text and still be presented at execution;
    // the two effects are independent.
    let mut processor = ProbeProcessor {
        replacements: HashMap::from([("Inline", "X")]),
        ..Default::default()
    };
    let mut runner = runner_for("SELECT a -- #Inline: x\nFROM t;");

    runner.execute_script("s", &mut processor).unwrap();

    let events = processor.events();
    assert!(events.contains(&"execute:SELECT a X FROM t|Inline".to_owned()), "events: {events:?}");
}

#[test]
fn scripts_compile_once_per_processor_identity() {
    // Arrange
    let mut processor = ProbeProcessor::default();
    let mut runner = runner_for("-- #Keep\nSELECT 1;");

    // Act
    runner.execute_script("s", &mut processor).unwrap();
    assert!(runner.is_compiled("s", &processor));
    runner.execute_script("s", &mut processor).unwrap();

    // Assert: one initialization, two identical executions.
    assert_eq!(
        processor.events(),
        [
            "init_processor:None",
            "init:Keep",
            "execute: SELECT 1|Keep",
            "execute: SELECT 1|Keep",
        ],
    );
}

#[test]
fn processors_sharing_an_explicit_identity_share_compilations() {
    // Arrange
    let events = Rc::new(RefCell::new(Vec::new()));
    let mut first = ProbeProcessor {
        identity: Some("shared"),
        events: Rc::clone(&events),
        ..Default::default()
    };
    let mut second = ProbeProcessor {
        identity: Some("shared"),
        events: Rc::clone(&events),
        ..Default::default()
    };
    let mut runner = runner_for("-- #Keep\nSELECT 1;");

    // Act
    runner.execute_script("s", &mut first).unwrap();
    assert!(runner.is_compiled("s", &second));
    runner.execute_script("s", &mut second).unwrap();

    // Assert: the second processor executed the cached compilation without re-initializing.
    let initializations = events.borrow().iter().filter(|e| e.starts_with("init")).count();
    assert_eq!(initializations, 2); // "init_processor" + "init:Keep", from the first processor only.
}

#[test]
fn directives_are_presented_in_source_order_across_lifecycle_stages() {
    // Arrange: two statements; all directives defer so every stage runs on every execution.
    let script = "SELECT a -- #A: x\n-- #B: y\n;\nSELECT b -- #C: z\n;";
    let mut processor = ProbeProcessor {
        deferred_names: vec!["A", "B", "C"],
        ..Default::default()
    };
    let mut runner = runner_for(script);

    // Act
    runner.execute_script("s", &mut processor).unwrap();

    // Assert
    assert_eq!(
        processor.events(),
        [
            "init_processor:None",
            "init:A",
            "init:B",
            "init:C",
            "setup:A",
            "setup:B",
            "execute:SELECT a  |A,B",
            "setup:C",
            "execute:SELECT b |C",
        ],
    );
}

#[test]
fn setup_discards_remove_the_recorded_entry_after_the_pass() {
    // Arrange: two deferred directives; the first is discarded during setup. Its removal must
    // not disturb the second directive's recorded index.
    let mut processor = ProbeProcessor {
        deferred_names: vec!["A", "B"],
        setup_discards: vec!["A"],
        replacements: HashMap::from([("B", "RB")]),
        ..Default::default()
    };
    let mut runner = runner_for("SELECT x -- #A: p\n-- #B: q\n;");

    // Act
    runner.execute_script("s", &mut processor).unwrap();

    // Assert: A's marker resolved to nothing, B's to its replacement, and only B survived.
    let events = processor.events();
    assert!(events.contains(&"execute:SELECT x  RB|B".to_owned()), "events: {events:?}");
}

#[test]
fn setup_returning_none_is_an_invalid_operation() {
    let mut processor = ProbeProcessor {
        deferred_names: vec!["A"],
        setup_returns_none: true,
        ..Default::default()
    };
    let mut runner = runner_for("SELECT x -- #A: p\n;");

    let error = runner.execute_script("s", &mut processor).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::InvalidOperation { .. }));
}

#[test]
fn execution_failures_are_wrapped_with_text_and_origin() {
    // Arrange
    let mut processor = ProbeProcessor {
        fail_execution: true,
        ..Default::default()
    };
    let mut runner = runner_for("\nSELECT 1;");

    // Act
    let error = runner.execute_script("s", &mut processor).unwrap_err();

    // Assert
    assert!(matches!(
        error.kind(),
        ErrorKind::StatementExecution { text, .. } if text == "SELECT 1",
    ));
    assert_eq!(error.span().unwrap().start.row, 2);
    assert_eq!(error.source().unwrap().to_string(), "database exploded");
}

#[test]
fn global_configuration_is_routed_by_processor_identity() {
    // Arrange
    let mut processor = ProbeProcessor::default();
    let mut runner = ScriptRunner::new()
        .with_resolver(MapScriptResolver::new().with_script("s", "SELECT 1;"))
        .with_config(ProcessorIdentity::of::<ProbeProcessor>(), Rc::new(42usize));

    // Act
    runner.execute_script("s", &mut processor).unwrap();

    // Assert
    assert_eq!(processor.events()[0], "init_processor:Some(42)");
}

#[test]
fn missing_scripts_are_reported_as_not_found() {
    let mut processor = ProbeProcessor::default();

    // Through a resolver that doesn't know the name...
    let mut runner = ScriptRunner::new().with_resolver(MapScriptResolver::new());
    let error = runner.execute_script("missing", &mut processor).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::ScriptNotFound { name } if name == "missing"));

    // ...and through the direct filesystem fallback.
    let mut runner = ScriptRunner::new();
    let error = runner.execute_script("no/such/script.sql", &mut processor).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::ScriptNotFound { .. }));
}

/// A processor that resolves its own scripts; the runner must prefer it over everything else.
#[derive(Default)]
struct SelfResolvingProcessor {
    executed: Vec<String>,
}

impl ScriptResolver for SelfResolvingProcessor {
    fn resolve(&self, name: &str) -> Result<Option<ScriptSource>, Error> {
        Ok((name == "embedded").then(|| ScriptSource::new(name, "SELECT 7;")))
    }
}

impl ScriptProcessor for SelfResolvingProcessor {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_resolver(&self) -> Option<&dyn ScriptResolver> {
        Some(self)
    }

    fn init_directive(&mut self, _directive: &Directive) -> Result<Option<DirectiveInitialization>, Error> {
        Ok(Some(DirectiveInitialization::store()))
    }

    fn execute_statement(
        &mut self,
        text: &str,
        _directives: &[InitializedDirective],
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.executed.push(text.to_owned());
        Ok(())
    }
}

#[test]
fn processors_that_resolve_scripts_take_precedence() {
    let mut processor = SelfResolvingProcessor::default();
    let mut runner = ScriptRunner::new(); // No resolver configured, and no such file exists.

    runner.execute_script("embedded", &mut processor).unwrap();

    assert_eq!(processor.executed, ["SELECT 7"]);
}

#[test]
fn parse_errors_fail_compilation_and_leave_the_cache_empty() {
    let mut processor = ProbeProcessor::default();
    let mut runner = runner_for("SELECT 'abc");

    let error = runner.execute_script("s", &mut processor).unwrap_err();

    assert!(matches!(error.kind(), ErrorKind::Syntax { .. }));
    assert!(!runner.is_compiled("s", &processor));
    // The processor was initialized, but no directive or statement ever reached it.
    assert_eq!(processor.events(), ["init_processor:None"]);
}
