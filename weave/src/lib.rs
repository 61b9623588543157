pub mod block;
pub mod location;
pub mod parser;
pub mod syntax;

use std::path::PathBuf;

/// A Markdown document whose annotated code fences are to be woven.
#[derive(Debug, Clone)]
pub struct Document {
    /// The full document text, untouched.
    pub text: String,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
    /// Directory containing the document. Relative `file` and `wd` values
    /// resolve against it.
    pub base_dir: PathBuf,
}

impl Document {
    pub fn new(text: impl Into<String>, source_id: usize, base_dir: impl Into<PathBuf>) -> Self {
        Document {
            text: text.into(),
            source_id,
            base_dir: base_dir.into(),
        }
    }
}
