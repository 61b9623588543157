pub mod collection;
pub mod error;
pub mod rewriter;
pub mod runner;
pub mod settings;
pub mod strategy;

pub use collection::BlockCollection;
pub use error::RenderError;
pub use runner::{ProcessRunner, RunnerError, SnippetOutput, SnippetRunner};
pub use settings::{Settings, SettingsError};
pub use strategy::ResolveContext;

use weave::Document;
use weave::parser::Parser;
use weave::syntax::Syntax;

/// Collection pass: scan the whole document and classify every block.
pub fn collect(document: &Document, syntax: &Syntax) -> Result<BlockCollection, RenderError> {
    let mut blocks = BlockCollection::new();
    for block in Parser::new(document, syntax).blocks() {
        blocks.add(block?);
    }
    log::debug!(
        "collected {} blocks under {} tags",
        blocks.len(),
        blocks.tags().count()
    );
    Ok(blocks)
}

/// Weave a document: collect, resolve, then rewrite.
///
/// Each pass completes before the next begins. Nothing is returned unless
/// every block resolved.
pub fn render(
    document: &Document,
    settings: &Settings,
    runner: &dyn SnippetRunner,
) -> Result<String, RenderError> {
    let mut blocks = collect(document, &settings.syntax)?;
    blocks.resolve(&ResolveContext {
        runner,
        settings,
        base_dir: &document.base_dir,
    })?;
    rewriter::rewrite(document, &settings.syntax, &blocks)
}
