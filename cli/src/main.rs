use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use engine::{BlockCollection, ProcessRunner, RenderError, Settings};
use weave::Document;

#[derive(Parser)]
#[command(
    name = "snippet-weave",
    version,
    about = "Weave compiler output, files and command output into annotated Markdown code blocks",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Print verbose messages
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Render a document (the default)
    Render(RenderArgs),

    /// Exit non-zero if rendering would change the document
    Check(SourceArgs),
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Markdown document ("-" reads standard input)
    #[arg(default_value = "-")]
    file: String,

    /// Settings file (defaults to snippet-weave.toml next to the document)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Snippet compiler program used for output blocks
    #[arg(long)]
    snippet_compiler: Option<String>,
}

#[derive(clap::Args)]
struct RenderArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Write the rendered document here instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// List collected blocks instead of rendering
    #[arg(long)]
    list_blocks: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let exit_code = match cli.command {
        Some(Command::Render(args)) => do_render(args, color_choice),
        Some(Command::Check(args)) => do_check(args, color_choice),
        None => do_render(cli.render, color_choice),
    };
    process::exit(exit_code);
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    // RUST_LOG, when set, wins over --verbose.
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// A loaded document together with its settings and diagnostic file database.
struct Session {
    name: String,
    document: Document,
    settings: Settings,
    files: SimpleFiles<String, String>,
}

impl Session {
    fn open(args: &SourceArgs) -> Result<Self, String> {
        let (name, text, base_dir) = read_document(&args.file)
            .map_err(|e| format!("cannot read '{}': {}", args.file, e))?;

        let mut settings = match &args.config {
            Some(path) => Settings::load(path),
            None => Settings::discover(&base_dir),
        }
        .map_err(|e| e.to_string())?;
        if let Some(program) = &args.snippet_compiler {
            settings.snippet_compiler = program.clone();
        }

        let mut files = SimpleFiles::new();
        let file_id = files.add(name.clone(), text.clone());
        log::debug!("weaving {} from {}", name, base_dir.display());

        Ok(Session {
            name,
            document: Document::new(text, file_id, base_dir),
            settings,
            files,
        })
    }

    fn render(&self) -> Result<String, RenderError> {
        let runner = ProcessRunner::new(self.settings.snippet_compiler.clone());
        engine::render(&self.document, &self.settings, &runner)
    }

    fn report(&self, error: &RenderError, color_choice: ColorChoice) {
        let diagnostic = match (error, error.span()) {
            (RenderError::Parse(parse_error), _) => parse_error.to_diagnostic(),
            (_, Some(span)) => Diagnostic::error()
                .with_message(error.to_string())
                .with_labels(vec![Label::primary(self.document.source_id, span)])
                .with_notes(error.notes()),
            (_, None) => {
                eprintln!("error: {}", error);
                return;
            }
        };
        let writer = StandardStream::stderr(color_choice);
        let config = term::Config::default();
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, &self.files, &diagnostic);
    }
}

/// Document name, text and the directory relative paths resolve against.
fn read_document(file: &str) -> io::Result<(String, String, PathBuf)> {
    if file == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        return Ok(("<stdin>".to_string(), text, std::env::current_dir()?));
    }

    let path = fs::canonicalize(file)?;
    let text = fs::read_to_string(&path)?;
    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((file.to_string(), text, base_dir))
}

fn do_render(args: RenderArgs, color_choice: ColorChoice) -> i32 {
    let session = match Session::open(&args.source) {
        Ok(s) => s,
        Err(message) => {
            eprintln!("error: {}", message);
            return 1;
        }
    };

    // --list-blocks: classify only, never run anything
    if args.list_blocks {
        return match engine::collect(&session.document, &session.settings.syntax) {
            Ok(blocks) => {
                print_blocks(&blocks);
                0
            }
            Err(error) => {
                session.report(&error, color_choice);
                1
            }
        };
    }

    let rendered = match session.render() {
        Ok(text) => text,
        Err(error) => {
            session.report(&error, color_choice);
            return 1;
        }
    };

    let written = match &args.output {
        Some(path) => fs::write(path, &rendered),
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(rendered.as_bytes())
                .and_then(|()| stdout.flush())
        }
    };
    if let Err(e) = written {
        eprintln!("error: cannot write output: {}", e);
        return 1;
    }
    0
}

fn do_check(args: SourceArgs, color_choice: ColorChoice) -> i32 {
    let session = match Session::open(&args) {
        Ok(s) => s,
        Err(message) => {
            eprintln!("error: {}", message);
            return 1;
        }
    };

    match session.render() {
        Ok(rendered) if rendered == session.document.text => {
            eprintln!("ok: {} is up to date", session.name);
            0
        }
        Ok(_) => {
            eprintln!("{} would change when rendered", session.name);
            1
        }
        Err(error) => {
            session.report(&error, color_choice);
            1
        }
    }
}

fn print_blocks(blocks: &BlockCollection) {
    for block in blocks.iter() {
        let kind = block.kind.map_or("?", |k| k.as_str());
        println!("{:>5}  {:<4}  {}", block.location.line, kind, block.tag());
    }
}
