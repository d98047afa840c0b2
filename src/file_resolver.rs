// Copyright (c) ZeroC, Inc.

use crate::diagnostics::{Error, ErrorKind};
use crate::processor::ScriptResolver;
use crate::script_file::{validate_terminator, ScriptSource, DEFAULT_STATEMENT_TERMINATOR};

use log::debug;
use std::fs;
use std::path::PathBuf;

/// Resolves script names against a base directory on the filesystem.
///
/// Names without an extension get `.sql` appended. A name that doesn't resolve to a file yields
/// `None` (which the runner reports as "script not found"); a file that exists but can't be read
/// is an I/O error.
#[derive(Debug)]
pub struct FileScriptResolver {
    base_directory: PathBuf,
    terminator: String,
}

impl FileScriptResolver {
    pub fn new(base_directory: impl Into<PathBuf>) -> Self {
        FileScriptResolver {
            base_directory: base_directory.into(),
            terminator: DEFAULT_STATEMENT_TERMINATOR.to_owned(),
        }
    }

    /// Sets the statement terminator handed to every resolved script.
    /// The terminator is validated here so misconfiguration surfaces at construction.
    pub fn with_terminator(mut self, terminator: &str) -> Result<Self, Error> {
        validate_terminator(terminator)?;
        self.terminator = terminator.to_owned();
        Ok(self)
    }
}

impl ScriptResolver for FileScriptResolver {
    fn resolve(&self, name: &str) -> Result<Option<ScriptSource>, Error> {
        let mut path = self.base_directory.join(name);
        if path.extension().is_none() {
            path.set_extension("sql");
        }

        if !path.is_file() {
            return Ok(None);
        }

        match fs::read_to_string(&path) {
            Ok(text) => {
                debug!("resolved script '{}' to '{}'", name, path.display());
                let source = ScriptSource::with_terminator(path.display().to_string(), text, &self.terminator)?;
                Ok(Some(source))
            }
            Err(error) => Err(Error::new(ErrorKind::Io {
                action: "read",
                path: path.display().to_string(),
                error,
            })),
        }
    }
}
