// Copyright (c) ZeroC, Inc.

mod helpers;

use helpers::RecordingProvider;
use sqlscriptc::client::Value;
use sqlscriptc::diagnostics::ErrorKind;
use sqlscriptc::grammar::{Directive, Disposition};
use sqlscriptc::processors::composite::{CompositeProcessor, DirectiveHandler, HandlerContext};
use sqlscriptc::processors::handlers::{
    CallbackHandler, ColumnSpec, ColumnType, ConditionalConfig, ConditionalHandler, LoadTableHandler,
    TableDataSource,
};
use sqlscriptc::runner::ScriptRunner;
use sqlscriptc::script_file::{Location, Span};
use sqlscriptc::test_helpers::{MapProperties, MapScriptResolver};

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

fn directive(name: &str, arguments: &[&str]) -> Directive {
    let span = Span::new(Location::default(), Location::default(), "test.sql");
    let arguments = arguments.iter().map(|s| (*s).to_owned()).collect();
    Directive::new(name.to_owned(), arguments, span)
}

fn context() -> HandlerContext {
    HandlerContext::default()
}

mod conditional {
    use super::*;
    use test_case::test_case;

    #[test_case("true", true; "true is truthy")]
    #[test_case("TRUE", true; "truthiness is case insensitive")]
    #[test_case("1", true; "one is truthy")]
    #[test_case("enabled", true; "arbitrary text is truthy")]
    #[test_case("false", false; "false is falsy")]
    #[test_case("FALSE", false; "falsiness is case insensitive")]
    #[test_case("0", false; "zero is falsy")]
    #[test_case("", false; "empty is falsy")]
    fn property_truthiness(value: &str, expected: bool) {
        // Arrange
        let properties = Rc::new(MapProperties::new().with_property("flag", value));
        let mut handler = ConditionalHandler::new(properties);

        // Act
        let initialization = handler
            .init_directive(&directive("If", &["flag", "X"]), &context())
            .unwrap()
            .unwrap();

        // Assert: on a match the text is substituted; either way the directive is dropped.
        assert_eq!(initialization.disposition, Disposition::Discard);
        assert_eq!(initialization.replacement.as_deref(), expected.then_some("X"));
    }

    #[test]
    fn missing_properties_are_falsy() {
        let mut handler = ConditionalHandler::new(Rc::new(MapProperties::new()));

        let initialization = handler
            .init_directive(&directive("If", &["absent", "X"]), &context())
            .unwrap()
            .unwrap();

        assert!(initialization.replacement.is_none());
    }

    #[test]
    fn if_not_inverts_the_condition() {
        let properties = Rc::new(MapProperties::new().with_property("flag", "true"));
        let mut handler = ConditionalHandler::new(properties);

        let matched = handler
            .init_directive(&directive("IfNot", &["flag", "X"]), &context())
            .unwrap()
            .unwrap();
        let unmatched = handler
            .init_directive(&directive("IfNot", &["absent", "X"]), &context())
            .unwrap()
            .unwrap();

        assert!(matched.replacement.is_none());
        assert_eq!(unmatched.replacement.as_deref(), Some("X"));
    }

    #[test]
    fn unrelated_directives_are_declined() {
        let mut handler = ConditionalHandler::new(Rc::new(MapProperties::new()));
        let result = handler.init_directive(&directive("LoadTable", &[]), &context()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn wrong_argument_count_is_an_invalid_directive() {
        let mut handler = ConditionalHandler::new(Rc::new(MapProperties::new()));

        let error = handler
            .init_directive(&directive("If", &["only-one"]), &context())
            .unwrap_err();

        assert!(matches!(error.kind(), ErrorKind::InvalidDirective { .. }));
    }

    #[test]
    fn deferred_mode_reevaluates_during_setup() {
        // Arrange
        let properties = Rc::new(MapProperties::new().with_property("flag", "true"));
        let mut handler =
            ConditionalHandler::new(Rc::clone(&properties) as _).with_deferred_evaluation(true);
        let condition = directive("If", &["flag", "X"]);

        // Act
        let initialization = handler.init_directive(&condition, &context()).unwrap().unwrap();

        // Assert: evaluation was deferred, nothing substituted yet.
        assert_eq!(initialization.disposition, Disposition::StoreDeferred);
        assert!(initialization.replacement.is_none());

        // A truthy property substitutes during setup...
        let setup = handler
            .setup_directive(&condition, initialization.state.as_ref(), &context())
            .unwrap()
            .unwrap();
        assert_eq!(setup.replacement.as_deref(), Some("X"));

        // ...and a falsy one substitutes nothing on the next execution.
        properties.set_property("flag", "");
        let setup = handler
            .setup_directive(&condition, initialization.state.as_ref(), &context())
            .unwrap()
            .unwrap();
        assert!(setup.replacement.is_none());
    }

    #[test]
    fn deferral_can_be_enabled_through_configuration() {
        let mut handler = ConditionalHandler::new(Rc::new(MapProperties::new()));
        let config: Rc<dyn Any> = Rc::new(ConditionalConfig { defer_evaluation: true });

        handler.init_handler(Some(&config), &context()).unwrap();
        let initialization = handler
            .init_directive(&directive("If", &["flag", "X"]), &context())
            .unwrap()
            .unwrap();

        assert_eq!(initialization.disposition, Disposition::StoreDeferred);
    }
}

mod callback {
    use super::*;

    #[test]
    fn callback_directives_route_statements_to_the_registered_callback() {
        // Arrange
        let invocations: Rc<RefCell<Vec<(Vec<String>, String)>>> = Rc::new(RefCell::new(Vec::new()));
        let recorded = Rc::clone(&invocations);
        let handler = CallbackHandler::new().with_callback("audit", move |arguments, text| {
            recorded.borrow_mut().push((arguments.to_vec(), text.to_owned()));
            Ok(())
        });

        let provider = RecordingProvider::new();
        let mut processor = CompositeProcessor::new()
            .with_provider(Rc::new(provider.clone()))
            .with_handler(handler);
        let mut runner = ScriptRunner::new()
            .with_resolver(MapScriptResolver::new().with_script("s", "-- #Callback: audit, extra\nSELECT 1;"));

        // Act
        runner.execute_script("s", &mut processor).unwrap();

        // Assert: the callback saw the directive arguments and the resolved text, and claimed
        // the statement away from generic execution.
        let invocations = invocations.borrow();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].0, ["extra"]);
        assert_eq!(invocations[0].1, " SELECT 1");
        assert!(provider.texts().is_empty());
    }

    #[test]
    fn unknown_callback_names_fail_initialization() {
        let mut handler = CallbackHandler::new();

        let error = handler
            .init_directive(&directive("Callback", &["nobody"]), &context())
            .unwrap_err();

        assert!(matches!(
            error.kind(),
            ErrorKind::InvalidDirective { message, .. } if message.contains("nobody"),
        ));
    }

    #[test]
    fn callback_directives_need_a_name() {
        let mut handler = CallbackHandler::new();

        let error = handler.init_directive(&directive("Callback", &[]), &context()).unwrap_err();

        assert!(matches!(error.kind(), ErrorKind::InvalidDirective { .. }));
    }

    #[test]
    fn callback_failures_surface_as_statement_execution_errors() {
        let handler = CallbackHandler::new().with_callback("boom", |_, _| Err("callback failed".into()));
        let mut processor = CompositeProcessor::new().with_handler(handler);
        let mut runner = ScriptRunner::new()
            .with_resolver(MapScriptResolver::new().with_script("s", "-- #Callback: boom\nSELECT 1;"));

        let error = runner.execute_script("s", &mut processor).unwrap_err();

        assert!(matches!(error.kind(), ErrorKind::StatementExecution { .. }));
    }
}

mod load_table {
    use super::*;
    use test_case::test_case;

    /// Serves in-memory rows per table name.
    #[derive(Default)]
    struct MapDataSource {
        tables: HashMap<String, Vec<Vec<Value>>>,
    }

    impl MapDataSource {
        fn with_table(mut self, name: &str, rows: Vec<Vec<Value>>) -> Self {
            self.tables.insert(name.to_owned(), rows);
            self
        }
    }

    impl TableDataSource for MapDataSource {
        fn rows(&self, table: &str) -> Option<Box<dyn Iterator<Item = Vec<Value>> + '_>> {
            self.tables
                .get(table)
                .map(|rows| Box::new(rows.clone().into_iter()) as Box<dyn Iterator<Item = Vec<Value>>>)
        }
    }

    fn people_rows() -> Vec<Vec<Value>> {
        vec![
            vec![Value::Integer(1), Value::Text("ada".to_owned())],
            vec![Value::Integer(2), Value::Text("grace".to_owned())],
            vec![Value::Integer(3), Value::Text("edsger".to_owned())],
        ]
    }

    #[test]
    fn load_table_clears_then_batch_inserts() {
        // Arrange
        let source = MapDataSource::default().with_table("People", people_rows());
        let provider = RecordingProvider::new();
        let mut processor = CompositeProcessor::new()
            .with_provider(Rc::new(provider.clone()))
            .with_handler(LoadTableHandler::new(source).with_batch_size(2));
        let script = r#"/* ** #LoadTable: People, true, "Id, Int32", "Name, String, 64" */"#;
        let mut runner = ScriptRunner::new().with_resolver(MapScriptResolver::new().with_script("s", script));

        // Act
        runner.execute_script("s", &mut processor).unwrap();

        // Assert: one delete, then two batches of the generated insert.
        assert_eq!(
            provider.texts(),
            [
                "DELETE FROM People",
                "INSERT INTO People (Id, Name) VALUES (?, ?)",
                "INSERT INTO People (Id, Name) VALUES (?, ?)",
            ],
        );
        let log = provider.log.borrow();
        assert_eq!(log[1].rows.len(), 2);
        assert_eq!(log[2].rows.len(), 1);
        assert_eq!(log[1].rows[0], [Value::Integer(1), Value::Text("ada".to_owned())]);
    }

    #[test]
    fn load_table_without_clearing_skips_the_delete() {
        let source = MapDataSource::default().with_table("People", people_rows());
        let provider = RecordingProvider::new();
        let mut processor = CompositeProcessor::new()
            .with_provider(Rc::new(provider.clone()))
            .with_handler(LoadTableHandler::new(source));
        let script = r#"/* ** #LoadTable: People, false, "Id, Int32", "Name, String" */"#;
        let mut runner = ScriptRunner::new().with_resolver(MapScriptResolver::new().with_script("s", script));

        runner.execute_script("s", &mut processor).unwrap();

        assert_eq!(provider.texts(), ["INSERT INTO People (Id, Name) VALUES (?, ?)"]);
    }

    #[test]
    fn unknown_column_types_fail_compilation() {
        let provider = RecordingProvider::new();
        let mut processor = CompositeProcessor::new()
            .with_provider(Rc::new(provider.clone()))
            .with_handler(LoadTableHandler::new(MapDataSource::default()));
        let script = r#"/* ** #LoadTable: People, true, "Id, Nonsense" */"#;
        let mut runner = ScriptRunner::new().with_resolver(MapScriptResolver::new().with_script("s", script));

        let error = runner.execute_script("s", &mut processor).unwrap_err();

        assert!(matches!(
            error.kind(),
            ErrorKind::InvalidDirective { message, .. } if message.contains("Nonsense"),
        ));
        assert!(provider.texts().is_empty());
    }

    #[test]
    fn row_width_mismatches_fail_execution() {
        let source = MapDataSource::default().with_table("People", vec![vec![Value::Integer(1)]]);
        let provider = RecordingProvider::new();
        let mut processor = CompositeProcessor::new()
            .with_provider(Rc::new(provider.clone()))
            .with_handler(LoadTableHandler::new(source));
        let script = r#"/* ** #LoadTable: People, false, "Id, Int32", "Name, String" */"#;
        let mut runner = ScriptRunner::new().with_resolver(MapScriptResolver::new().with_script("s", script));

        let error = runner.execute_script("s", &mut processor).unwrap_err();

        assert!(matches!(error.kind(), ErrorKind::StatementExecution { .. }));
    }

    #[test]
    fn unbindable_values_fail_execution() {
        let source = MapDataSource::default().with_table("People", vec![vec![Value::Text("x".to_owned())]]);
        let provider = RecordingProvider::new();
        let mut processor = CompositeProcessor::new()
            .with_provider(Rc::new(provider.clone()))
            .with_handler(LoadTableHandler::new(source));
        let script = r#"/* ** #LoadTable: People, false, "Id, Int32" */"#;
        let mut runner = ScriptRunner::new().with_resolver(MapScriptResolver::new().with_script("s", script));

        let error = runner.execute_script("s", &mut processor).unwrap_err();

        assert!(matches!(error.kind(), ErrorKind::StatementExecution { .. }));
    }

    #[test_case("Id, Int32", "Id", ColumnType::Int32, None; "name and type")]
    #[test_case("Name, String, 64", "Name", ColumnType::String, Some(64); "name type and length")]
    #[test_case(" padded , Long ", "padded", ColumnType::Int64, None; "whitespace is trimmed")]
    fn column_specifications_parse(spec: &str, name: &str, column_type: ColumnType, length: Option<usize>) {
        let parsed = ColumnSpec::parse(spec).unwrap();
        assert_eq!(parsed.name, name);
        assert_eq!(parsed.column_type, column_type);
        assert_eq!(parsed.length, length);
    }

    #[test_case("Id"; "missing type")]
    #[test_case("Id, Nope"; "unknown type")]
    #[test_case("Id, Int32, tall"; "unparsable length")]
    #[test_case(", Int32"; "missing name")]
    #[test_case("a, Int32, 1, 2"; "too many parts")]
    fn malformed_column_specifications_are_rejected(spec: &str) {
        assert!(ColumnSpec::parse(spec).is_err());
    }
}
