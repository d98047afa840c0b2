// Copyright (c) ZeroC, Inc.

//! This module contains helper functions and collaborator stand-ins that are useful for testing
//! both the engine and the processors that plug into it.

use crate::diagnostics::Error;
use crate::grammar::Statement;
use crate::parse_from_string;
use crate::processor::{PropertiesAccessor, ScriptResolver};
use crate::script_file::ScriptSource;

use std::cell::RefCell;
use std::collections::HashMap;

/// Parses a script and panics (with the error) if parsing fails.
#[must_use]
pub fn parse_script(text: &str) -> Vec<Statement> {
    match parse_from_string(text) {
        Ok(statements) => statements,
        Err(error) => panic!("parse failed: {error}"),
    }
}

/// Parses a script that is expected to be rejected and returns the error.
#[must_use]
pub fn parse_for_error(text: &str) -> Error {
    match parse_from_string(text) {
        Ok(statements) => panic!("expected a parse failure, got {} statement(s)", statements.len()),
        Err(error) => error,
    }
}

/// A [ScriptResolver] serving scripts from an in-memory map; scripts use the default terminator.
#[derive(Default)]
pub struct MapScriptResolver {
    scripts: HashMap<String, String>,
}

impl MapScriptResolver {
    pub fn new() -> Self {
        MapScriptResolver::default()
    }

    pub fn with_script(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.scripts.insert(name.into(), text.into());
        self
    }
}

impl ScriptResolver for MapScriptResolver {
    fn resolve(&self, name: &str) -> Result<Option<ScriptSource>, Error> {
        Ok(self.scripts.get(name).map(|text| ScriptSource::new(name, text)))
    }
}

/// A [PropertiesAccessor] over an in-memory map that can be mutated between executions.
#[derive(Default)]
pub struct MapProperties {
    values: RefCell<HashMap<String, String>>,
}

impl MapProperties {
    pub fn new() -> Self {
        MapProperties::default()
    }

    pub fn with_property(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_property(name, value);
        self
    }

    pub fn set_property(&self, name: impl Into<String>, value: impl Into<String>) {
        self.values.borrow_mut().insert(name.into(), value.into());
    }
}

impl PropertiesAccessor for MapProperties {
    fn get_property(&self, name: &str) -> Option<String> {
        self.values.borrow().get(name).cloned()
    }
}
