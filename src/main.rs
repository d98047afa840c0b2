// Copyright (c) ZeroC, Inc.

use sqlscriptc::clap::Parser;
use sqlscriptc::client::{ClientProvider, ScriptCommand, Value};
use sqlscriptc::diagnostic_emitter::{emit_totals, DiagnosticEmitter};
use sqlscriptc::diagnostics::{Error, ErrorKind};
use sqlscriptc::grammar::{Directive, DirectiveInitialization};
use sqlscriptc::processor::ScriptResolver;
use sqlscriptc::processors::composite::{CompositeProcessor, DirectiveHandler, HandlerContext};
use sqlscriptc::processors::handlers::ConditionalHandler;
use sqlscriptc::runner::ScriptRunner;
use sqlscriptc::script_file::ScriptSource;
use sqlscriptc::script_options::ScriptOptions;

use std::any::Any;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;
use std::time::Duration;
use std::{fs, io, process};

pub fn main() {
    let exit_code = try_main();
    process::exit(exit_code);
}

fn try_main() -> i32 {
    let options = ScriptOptions::parse();
    init_logger(&options);

    let properties: HashMap<String, String> = options
        .properties
        .iter()
        .map(|definition| match definition.split_once('=') {
            Some((name, value)) => (name.to_owned(), value.to_owned()),
            None => (definition.clone(), "true".to_owned()),
        })
        .collect();

    let mut sources = HashMap::new();
    let mut total_errors = 0;
    for script in &options.scripts {
        if let Err(error) = run_script(script, &options, &properties, &mut sources) {
            let stderr = &mut io::stderr();
            let mut emitter = DiagnosticEmitter::new(stderr, &options, &sources);
            emitter.emit_error(&error).expect("failed to emit error");
            total_errors += 1;
        }
    }

    emit_totals(total_errors).expect("failed to emit totals");
    i32::from(total_errors != 0)
}

fn init_logger(options: &ScriptOptions) {
    let level = match options.verbose {
        true => simplelog::LevelFilter::Debug,
        false => simplelog::LevelFilter::Warn,
    };
    let _ = simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
}

/// Compiles one script and "executes" it against a processor that prints the resolved statements
/// instead of running them against a database.
fn run_script(
    script: &str,
    options: &ScriptOptions,
    properties: &HashMap<String, String>,
    sources: &mut HashMap<String, ScriptSource>,
) -> Result<(), Error> {
    let text = fs::read_to_string(script).map_err(|error| {
        Error::new(ErrorKind::Io {
            action: "read",
            path: script.to_owned(),
            error,
        })
    })?;
    let source = ScriptSource::with_terminator(script, text, &options.terminator)?;
    sources.insert(script.to_owned(), source.clone());

    let conditionals = ConditionalHandler::new(Rc::new(properties.clone()))
        .with_deferred_evaluation(options.defer_conditionals);
    let mut processor = CompositeProcessor::new()
        .with_provider(Rc::new(PrintProvider))
        .with_handler(conditionals)
        .with_handler(PassthroughHandler);

    let mut runner = ScriptRunner::new().with_resolver(SingleScriptResolver { source });
    runner.execute_script(script, &mut processor)
}

/// Serves the one script the command line named; the runner asks for it right back.
struct SingleScriptResolver {
    source: ScriptSource,
}

impl ScriptResolver for SingleScriptResolver {
    fn resolve(&self, name: &str) -> Result<Option<ScriptSource>, Error> {
        Ok((name == self.source.name).then(|| self.source.clone()))
    }
}

/// Accepts every directive so unknown names don't abort compilation; claims nothing at execution.
struct PassthroughHandler;

impl DirectiveHandler for PassthroughHandler {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn init_directive(
        &mut self,
        _directive: &Directive,
        _context: &HandlerContext,
    ) -> Result<Option<DirectiveInitialization>, Error> {
        Ok(Some(DirectiveInitialization::store()))
    }
}

/// A command factory whose commands print their statement text to stdout instead of executing it.
struct PrintProvider;

struct PrintCommand {
    text: String,
}

impl ClientProvider for PrintProvider {
    fn create_command(&self, text: &str) -> Result<Box<dyn ScriptCommand>, Box<dyn std::error::Error>> {
        Ok(Box::new(PrintCommand { text: text.to_owned() }))
    }
}

impl ScriptCommand for PrintCommand {
    fn set_timeout(&mut self, _timeout: Duration) {}

    fn add_batch(&mut self, _row: &[Value]) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }

    fn execute(&mut self) -> Result<u64, Box<dyn std::error::Error>> {
        writeln!(io::stdout(), "{};", self.text.trim_end())?;
        Ok(0)
    }
}
