// Copyright (c) ZeroC, Inc.

//! Database-access abstractions. The engine never speaks a database protocol itself; callers
//! implement these traits over whatever driver they use, and the engine drives statements and
//! batches through them.

use std::time::Duration;

type ClientError = Box<dyn std::error::Error>;

/// A parameter value bound into a command.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

/// Creates executable commands from statement text. The composite processor holds one of these
/// in its shared handler context and uses it for generic statement execution and batch loads.
pub trait ClientProvider {
    fn create_command(&self, text: &str) -> Result<Box<dyn ScriptCommand>, ClientError>;
}

/// One executable command. Parameter rows queued with [add_batch](Self::add_batch) are applied
/// on the next [execute](Self::execute); a command with no queued rows executes its text once.
pub trait ScriptCommand {
    fn set_timeout(&mut self, timeout: Duration);

    /// Queues one parameter row for batched execution.
    fn add_batch(&mut self, row: &[Value]) -> Result<(), ClientError>;

    /// Runs the command and returns the number of affected rows.
    fn execute(&mut self) -> Result<u64, ClientError>;
}

/// Accumulates parameter rows for an `INSERT` and flushes them in fixed-size batches.
///
/// Rows pushed into the helper are queued on a command created from the generated insert text;
/// every `batch_size` rows the command is executed and replaced. [finish](Self::finish) flushes
/// the remainder and returns the total number of affected rows.
pub struct BatchInsert<'a> {
    provider: &'a dyn ClientProvider,
    text: String,
    timeout: Option<Duration>,
    batch_size: usize,
    command: Option<Box<dyn ScriptCommand>>,
    queued: usize,
    affected: u64,
}

impl<'a> BatchInsert<'a> {
    pub fn new(
        provider: &'a dyn ClientProvider,
        table: &str,
        columns: &[&str],
        batch_size: usize,
        timeout: Option<Duration>,
    ) -> Self {
        let parameters = vec!["?"; columns.len()].join(", ");
        let text = format!("INSERT INTO {} ({}) VALUES ({})", table, columns.join(", "), parameters);

        BatchInsert {
            provider,
            text,
            timeout,
            batch_size: batch_size.max(1),
            command: None,
            queued: 0,
            affected: 0,
        }
    }

    /// The insert text the helper executes. Visible for logging and tests.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn push(&mut self, row: &[Value]) -> Result<(), ClientError> {
        if self.command.is_none() {
            let mut command = self.provider.create_command(&self.text)?;
            if let Some(timeout) = self.timeout {
                command.set_timeout(timeout);
            }
            self.command = Some(command);
        }

        self.command.as_mut().unwrap().add_batch(row)?;
        self.queued += 1;

        if self.queued >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ClientError> {
        if let Some(mut command) = self.command.take() {
            self.affected += command.execute()?;
            self.queued = 0;
        }
        Ok(())
    }

    /// Flushes any queued rows and returns the total number of affected rows.
    pub fn finish(mut self) -> Result<u64, ClientError> {
        self.flush()?;
        Ok(self.affected)
    }
}
