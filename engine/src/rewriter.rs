use weave::Document;
use weave::parser::scan;
use weave::syntax::Syntax;

use crate::collection::BlockCollection;
use crate::error::RenderError;

/// Rewrite pass: scan the document again and put each block's current body
/// in place of its original fence.
///
/// Every replacement is cut from the original text by the match's own span,
/// so bodies that grew or shrank during resolution cannot shift later
/// matches. Annotations, the whitespace after them and all other text are
/// copied unchanged.
pub fn rewrite(
    document: &Document,
    syntax: &Syntax,
    blocks: &BlockCollection,
) -> Result<String, RenderError> {
    let source = document.text.as_str();
    let mut rendered = String::with_capacity(source.len());
    let mut cursor = 0;

    for pair in scan(source, document.source_id, syntax) {
        let pair = pair?;
        let block = blocks.lookup_by_location(&pair.location)?;
        rendered.push_str(&source[cursor..pair.fence_span.start]);
        rendered.push_str(&block.body);
        cursor = pair.fence_span.end;
    }
    rendered.push_str(&source[cursor..]);

    Ok(rendered)
}
