use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

use weave::block::Block;

use crate::error::RenderError;
use crate::runner::SnippetRunner;
use crate::settings::Settings;

/// What resolution needs besides the blocks themselves.
pub struct ResolveContext<'a> {
    pub runner: &'a dyn SnippetRunner,
    pub settings: &'a Settings,
    /// Directory of the host document.
    pub base_dir: &'a Path,
}

/// A fence body split at its first and last line breaks.
///
/// The first line holds the opening token and language hint, the last line
/// the closing token. Both survive substitution untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceParts<'a> {
    pub head: &'a str,
    pub interior: &'a str,
    pub tail: &'a str,
}

impl<'a> FenceParts<'a> {
    pub fn split(body: &'a str) -> Self {
        match (body.find('\n'), body.rfind('\n')) {
            (Some(first), Some(last)) => FenceParts {
                head: &body[..first],
                interior: if last > first { &body[first + 1..last] } else { "" },
                tail: &body[last + 1..],
            },
            _ => FenceParts {
                head: body,
                interior: "",
                tail: "",
            },
        }
    }

    /// Head line, a newline, then `content` exactly as given, then the tail.
    pub fn rebuild(&self, content: &str) -> String {
        let mut body = String::with_capacity(self.head.len() + content.len() + self.tail.len() + 1);
        body.push_str(self.head);
        body.push('\n');
        body.push_str(content);
        body.push_str(self.tail);
        body
    }
}

/// Replace the interior of `block`'s fence with `content`.
pub fn substitute(block: &mut Block, content: &str) {
    let body = FenceParts::split(&block.body).rebuild(content);
    block.body = body;
}

/// Output strategy: compile the input block's snippet and return what it printed.
pub fn run_snippet(input: &Block, ctx: &ResolveContext<'_>) -> Result<String, RenderError> {
    let source = FenceParts::split(&input.body).interior;
    let config = ctx.settings.merged_config(&input.config.settings);
    log::debug!("compiling snippet '{}' from line {}", input.tag(), input.location.line);

    let output = ctx
        .runner
        .run(source, &config)
        .map_err(|source| RenderError::Snippet {
            tag: input.tag().to_string(),
            line: input.location.line,
            span: input.span.clone(),
            source,
        })?;
    if !output.success() {
        log::warn!(
            "snippet '{}' exited with status {:?}; keeping its output",
            input.tag(),
            output.status
        );
    }
    Ok(output.text)
}

/// File strategy: the contents of the named file.
pub fn read_file(block: &Block, ctx: &ResolveContext<'_>) -> Result<String, RenderError> {
    let file = block
        .config
        .file
        .as_deref()
        .unwrap_or_else(|| Path::new(block.tag()));
    let path = ctx.base_dir.join(file);
    log::info!("including {}", path.display());

    fs::read_to_string(&path).map_err(|source| RenderError::FileRead {
        path,
        line: block.location.line,
        span: block.span.clone(),
        source,
    })
}

/// Command strategy: the standard output of the block's command.
///
/// The working directory is handed to the child process rather than set on
/// this one, so resolutions never observe each other's directory.
pub fn run_command(block: &Block, ctx: &ResolveContext<'_>) -> Result<String, RenderError> {
    let command = block.config.command.as_deref().unwrap_or(block.tag());
    let wd = block
        .config
        .working_dir
        .as_deref()
        .unwrap_or(ctx.base_dir);

    let argv = shlex::split(command)
        .filter(|argv| !argv.is_empty())
        .ok_or_else(|| RenderError::InvalidCommand {
            command: command.to_string(),
            line: block.location.line,
            span: block.span.clone(),
        })?;

    fs::create_dir_all(wd).map_err(|source| RenderError::WorkingDirectory {
        path: wd.to_path_buf(),
        line: block.location.line,
        span: block.span.clone(),
        source,
    })?;

    log::info!("running '{}' in {}", command, wd.display());
    let output = Command::new(&argv[0])
        .args(&argv[1..])
        .current_dir(wd)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| RenderError::CommandSpawn {
            command: command.to_string(),
            line: block.location.line,
            span: block.span.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(RenderError::CommandFailed {
            command: command.to_string(),
            line: block.location.line,
            span: block.span.clone(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
