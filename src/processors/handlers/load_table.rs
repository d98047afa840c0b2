// Copyright (c) ZeroC, Inc.

use super::invalid_directive;
use crate::client::{BatchInsert, Value};
use crate::diagnostics::Error;
use crate::grammar::{Directive, DirectiveInitialization, DirectiveState};
use crate::processors::composite::{DirectiveHandler, HandlerContext};

use log::debug;
use std::any::Any;

const LOAD_TABLE_DIRECTIVE: &str = "LoadTable";
const DEFAULT_BATCH_SIZE: usize = 100;

/// Supplies the rows a `#LoadTable` directive loads. Implemented by callers; returning `None`
/// means no data is registered for the table.
pub trait TableDataSource {
    fn rows(&self, table: &str) -> Option<Box<dyn Iterator<Item = Vec<Value>> + '_>>;
}

/// Handles `#LoadTable` directives:
/// ```sql
/// /* ** #LoadTable: MyTbl, true, "a, Int32", "b, String, 64" */
/// ```
/// The arguments are the table name, whether to clear the table first, and one specification per
/// column: `name, type[, length]`. Rows stream from a caller-supplied [TableDataSource] through
/// the batch-insert helper; the directive claims its statement, so nothing else executes for it.
pub struct LoadTableHandler {
    source: Box<dyn TableDataSource>,
    batch_size: usize,
}

/// Configuration entry for a [LoadTableHandler].
#[derive(Clone, Copy, Debug)]
pub struct LoadTableConfig {
    pub batch_size: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Bool,
    Int32,
    Int64,
    Float,
    String,
}

impl ColumnType {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "Bool" | "Boolean" => Some(ColumnType::Bool),
            "Int32" | "Int" => Some(ColumnType::Int32),
            "Int64" | "Long" => Some(ColumnType::Int64),
            "Float" | "Double" => Some(ColumnType::Float),
            "String" => Some(ColumnType::String),
            _ => None,
        }
    }

    /// Whether a row value is bindable to a column of this type. Nulls always are.
    fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (ColumnType::Bool, Value::Bool(_)) => true,
            (ColumnType::Int32, Value::Integer(i)) => i32::try_from(*i).is_ok(),
            (ColumnType::Int64, Value::Integer(_)) => true,
            (ColumnType::Float, Value::Float(_) | Value::Integer(_)) => true,
            (ColumnType::String, Value::Text(_)) => true,
            _ => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub column_type: ColumnType,
    pub length: Option<usize>,
}

impl ColumnSpec {
    /// Parses a `name, type[, length]` column specification.
    pub fn parse(specification: &str) -> Result<Self, String> {
        let parts: Vec<&str> = specification.split(',').map(str::trim).collect();
        let (name, type_name, length) = match parts.as_slice() {
            [name, type_name] => (*name, *type_name, None),
            [name, type_name, length] => {
                let length = length
                    .parse::<usize>()
                    .map_err(|_| format!("'{length}' is not a valid column length"))?;
                (*name, *type_name, Some(length))
            }
            _ => return Err(format!("malformed column specification '{specification}'")),
        };

        if name.is_empty() {
            return Err(format!("missing column name in '{specification}'"));
        }
        let column_type =
            ColumnType::parse(type_name).ok_or_else(|| format!("'{type_name}' is not a valid column type"))?;

        Ok(ColumnSpec {
            name: name.to_owned(),
            column_type,
            length,
        })
    }
}

#[derive(Clone, Debug)]
struct LoadTablePlan {
    table: String,
    clear_first: bool,
    columns: Vec<ColumnSpec>,
}

impl LoadTableHandler {
    pub fn new(source: impl TableDataSource + 'static) -> Self {
        LoadTableHandler {
            source: Box::new(source),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

impl DirectiveHandler for LoadTableHandler {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn init_handler(
        &mut self,
        config: Option<&std::rc::Rc<dyn Any>>,
        _context: &HandlerContext,
    ) -> Result<(), Error> {
        if let Some(config) = config {
            let config = config.downcast_ref::<LoadTableConfig>().ok_or_else(|| {
                Error::new(crate::diagnostics::ErrorKind::InvalidOperation {
                    message: "load-table handler configuration has the wrong type".to_owned(),
                })
            })?;
            self.batch_size = config.batch_size;
        }
        Ok(())
    }

    fn init_directive(
        &mut self,
        directive: &Directive,
        _context: &HandlerContext,
    ) -> Result<Option<DirectiveInitialization>, Error> {
        if directive.name != LOAD_TABLE_DIRECTIVE {
            return Ok(None);
        }

        let [table, clear_first, specifications @ ..] = directive.arguments.as_slice() else {
            return Err(invalid_directive(
                directive,
                "expected a table name, a clear flag, and column specifications",
            ));
        };
        let clear_first = match clear_first.to_ascii_lowercase().as_str() {
            "true" => true,
            "false" => false,
            other => return Err(invalid_directive(directive, format!("'{other}' is not a valid clear flag"))),
        };
        if specifications.is_empty() {
            return Err(invalid_directive(directive, "expected at least one column specification"));
        }

        let mut columns = Vec::with_capacity(specifications.len());
        for specification in specifications {
            columns.push(ColumnSpec::parse(specification).map_err(|message| invalid_directive(directive, message))?);
        }

        let plan = LoadTablePlan {
            table: table.clone(),
            clear_first,
            columns,
        };
        Ok(Some(DirectiveInitialization::store().set_state(plan)))
    }

    fn try_execute(
        &mut self,
        _text: &str,
        directive: &Directive,
        state: Option<&DirectiveState>,
        context: &HandlerContext,
    ) -> Result<bool, Box<dyn std::error::Error>> {
        if directive.name != LOAD_TABLE_DIRECTIVE {
            return Ok(false);
        }

        let plan = state
            .and_then(|state| state.downcast_ref::<LoadTablePlan>())
            .ok_or("load-table directive is missing its state")?;
        let provider = context
            .provider
            .as_ref()
            .ok_or("no client provider configured for table loading")?;

        if plan.clear_first {
            let mut command = provider.create_command(&format!("DELETE FROM {}", plan.table))?;
            if let Some(timeout) = context.command_timeout {
                command.set_timeout(timeout);
            }
            command.execute()?;
        }

        let rows = self
            .source
            .rows(&plan.table)
            .ok_or_else(|| format!("no table data registered for '{}'", plan.table))?;

        let columns: Vec<&str> = plan.columns.iter().map(|column| column.name.as_str()).collect();
        let mut batch = BatchInsert::new(
            provider.as_ref(),
            &plan.table,
            &columns,
            self.batch_size,
            context.command_timeout,
        );

        for row in rows {
            if row.len() != plan.columns.len() {
                return Err(format!(
                    "row width {} does not match the {} declared column(s) of '{}'",
                    row.len(),
                    plan.columns.len(),
                    plan.table
                )
                .into());
            }
            for (column, value) in plan.columns.iter().zip(&row) {
                if !column.column_type.matches(value) {
                    return Err(format!(
                        "value {value:?} is not bindable to column '{}' of '{}'",
                        column.name, plan.table
                    )
                    .into());
                }
            }
            batch.push(&row)?;
        }

        let affected = batch.finish()?;
        debug!("loaded {affected} row(s) into '{}'", plan.table);
        Ok(true)
    }
}
