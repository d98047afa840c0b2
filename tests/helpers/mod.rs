// Copyright (c) ZeroC, Inc.

//! Test doubles shared by the integration test suites.

use sqlscriptc::client::{ClientProvider, ScriptCommand, Value};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// One command execution observed by a [RecordingProvider]: the statement text and the parameter
/// rows that were queued on the command when it ran.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutedCommand {
    pub text: String,
    pub rows: Vec<Vec<Value>>,
}

/// A [ClientProvider] whose commands record their executions instead of touching a database.
#[derive(Clone, Default)]
pub struct RecordingProvider {
    pub log: Rc<RefCell<Vec<ExecutedCommand>>>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        RecordingProvider::default()
    }

    /// The executed statement texts, in execution order.
    pub fn texts(&self) -> Vec<String> {
        self.log.borrow().iter().map(|command| command.text.clone()).collect()
    }
}

impl ClientProvider for RecordingProvider {
    fn create_command(&self, text: &str) -> Result<Box<dyn ScriptCommand>, Box<dyn std::error::Error>> {
        Ok(Box::new(RecordingCommand {
            text: text.to_owned(),
            rows: Vec::new(),
            log: Rc::clone(&self.log),
        }))
    }
}

struct RecordingCommand {
    text: String,
    rows: Vec<Vec<Value>>,
    log: Rc<RefCell<Vec<ExecutedCommand>>>,
}

impl ScriptCommand for RecordingCommand {
    fn set_timeout(&mut self, _timeout: Duration) {}

    fn add_batch(&mut self, row: &[Value]) -> Result<(), Box<dyn std::error::Error>> {
        self.rows.push(row.to_vec());
        Ok(())
    }

    fn execute(&mut self) -> Result<u64, Box<dyn std::error::Error>> {
        let rows = std::mem::take(&mut self.rows);
        let affected = rows.len() as u64;
        self.log.borrow_mut().push(ExecutedCommand {
            text: self.text.clone(),
            rows,
        });
        Ok(affected)
    }
}
