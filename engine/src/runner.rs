use std::io::{self, Read, Write};
use std::process::{Command, Stdio};
use std::thread;

use serde_yml::{Mapping, Value};
use weave::block::config::scalar_text;

/// Program used when settings do not name one.
pub const DEFAULT_SNIPPET_COMPILER: &str = "snippet-compiler";

/// What the snippet compiler printed, stdout and stderr interleaved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetOutput {
    pub text: String,
    /// Exit code, `None` if the process was killed by a signal.
    pub status: Option<i32>,
}

impl SnippetOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("cannot start '{program}': {source}")]
    Spawn { program: String, source: io::Error },
    #[error("I/O error talking to '{program}': {source}")]
    Io { program: String, source: io::Error },
}

/// Compiles (and possibly runs) a snippet, capturing what it prints.
///
/// A non-zero exit is not an error: compiler diagnostics are often exactly
/// the output a document wants to show.
pub trait SnippetRunner {
    fn run(&self, source: &str, config: &Mapping) -> Result<SnippetOutput, RunnerError>;
}

impl<F> SnippetRunner for F
where
    F: Fn(&str, &Mapping) -> Result<SnippetOutput, RunnerError>,
{
    fn run(&self, source: &str, config: &Mapping) -> Result<SnippetOutput, RunnerError> {
        self(source, config)
    }
}

/// Runs an external snippet compiler, feeding the snippet on stdin.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: String,
}

impl ProcessRunner {
    pub fn new(program: impl Into<String>) -> Self {
        ProcessRunner {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn io_error(&self, source: io::Error) -> RunnerError {
        RunnerError::Io {
            program: self.program.clone(),
            source,
        }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        ProcessRunner::new(DEFAULT_SNIPPET_COMPILER)
    }
}

impl SnippetRunner for ProcessRunner {
    fn run(&self, source: &str, config: &Mapping) -> Result<SnippetOutput, RunnerError> {
        let args = compiler_arguments(config);
        log::info!("running {} {}", self.program, args.join(" "));

        // One pipe for both streams keeps their relative order.
        let (mut reader, writer) = io::pipe().map_err(|e| self.io_error(e))?;
        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(writer.try_clone().map_err(|e| self.io_error(e))?)
            .stderr(writer);
        let mut child = command.spawn().map_err(|source| RunnerError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        // The command still owns copies of the write end; reading would never see EOF.
        drop(command);

        let feeder = child.stdin.take().map(|mut stdin| {
            let input = source.to_owned();
            // The compiler may exit without reading everything.
            thread::spawn(move || {
                let _ = stdin.write_all(input.as_bytes());
            })
        });

        let mut captured = Vec::new();
        reader
            .read_to_end(&mut captured)
            .map_err(|e| self.io_error(e))?;
        let status = child.wait().map_err(|e| self.io_error(e))?;
        if let Some(feeder) = feeder {
            let _ = feeder.join();
        }

        Ok(SnippetOutput {
            text: String::from_utf8_lossy(&captured).into_owned(),
            status: status.code(),
        })
    }
}

/// Command-line arguments for the snippet compiler: `--name value` for every
/// `snippet-compiler.options` entry, then `--flag` for every
/// `snippet-compiler.flags` entry.
pub fn compiler_arguments(config: &Mapping) -> Vec<String> {
    let mut args = Vec::new();
    let Some(section) = config.get("snippet-compiler").and_then(Value::as_mapping) else {
        return args;
    };

    if let Some(options) = section.get("options").and_then(Value::as_mapping) {
        for (name, value) in options {
            match (scalar_text(name), scalar_text(value)) {
                (Some(name), Some(value)) => {
                    args.push(format!("--{}", name));
                    args.push(value);
                }
                _ => log::warn!("ignoring non-scalar snippet-compiler option {:?}", name),
            }
        }
    }

    if let Some(flags) = section.get("flags").and_then(Value::as_sequence) {
        for flag in flags {
            match scalar_text(flag) {
                Some(flag) => args.push(format!("--{}", flag)),
                None => log::warn!("ignoring non-scalar snippet-compiler flag {:?}", flag),
            }
        }
    }

    args
}
