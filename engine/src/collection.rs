use std::collections::HashMap;

use indexmap::IndexMap;
use weave::block::{Block, BlockKind};
use weave::location::SourceLocation;

use crate::error::RenderError;
use crate::strategy::{self, ResolveContext};

/// Every block of a document, grouped by tag in first-seen order.
///
/// The collection owns its blocks; groups and the location index refer to
/// them by position.
#[derive(Debug, Default)]
pub struct BlockCollection {
    blocks: Vec<Block>,
    groups: IndexMap<String, Vec<usize>>,
    locations: HashMap<SourceLocation, usize>,
}

impl BlockCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a block, classifying it if its annotation left the type unset.
    ///
    /// Classification depends on insertion order: an untyped block is the
    /// input if no input or output block with its tag has been added yet,
    /// otherwise an output. Blocks must therefore be added in document order,
    /// and every block must be added before [`resolve`](Self::resolve) runs.
    /// File and command blocks sharing the tag do not count.
    pub fn add(&mut self, mut block: Block) {
        let group = self.groups.entry(block.tag().to_string()).or_default();
        if block.kind.is_none() {
            let paired = group
                .iter()
                .any(|&i| self.blocks[i].kind.is_some_and(BlockKind::is_snippet));
            let kind = if paired {
                BlockKind::Output
            } else {
                BlockKind::Input
            };
            log::debug!(
                "block '{}' on line {} classified as '{}'",
                block.tag(),
                block.location.line,
                kind
            );
            block.kind = Some(kind);
        }

        let index = self.blocks.len();
        group.push(index);
        self.locations.insert(block.location, index);
        self.blocks.push(block);
    }

    /// Compute the final body of every output, file and command block.
    ///
    /// Tag groups are resolved in first-seen order. The first failure aborts.
    pub fn resolve(&mut self, ctx: &ResolveContext<'_>) -> Result<(), RenderError> {
        for (tag, members) in &self.groups {
            let input = self.single_input(tag, members)?;
            for &index in members {
                let block = &self.blocks[index];
                let content = match block.kind {
                    Some(BlockKind::Output) => {
                        let Some(input) = input else {
                            return Err(RenderError::MissingInput {
                                tag: tag.clone(),
                                line: block.location.line,
                                span: block.span.clone(),
                            });
                        };
                        strategy::run_snippet(&self.blocks[input], ctx)?
                    }
                    Some(BlockKind::File) => strategy::read_file(block, ctx)?,
                    Some(BlockKind::Command) => strategy::run_command(block, ctx)?,
                    Some(BlockKind::Input) | None => continue,
                };
                strategy::substitute(&mut self.blocks[index], &content);
            }
        }
        Ok(())
    }

    fn single_input(&self, tag: &str, members: &[usize]) -> Result<Option<usize>, RenderError> {
        let mut inputs = members
            .iter()
            .copied()
            .filter(|&i| self.blocks[i].kind == Some(BlockKind::Input));
        let first = inputs.next();
        if let Some(extra) = inputs.next() {
            let block = &self.blocks[extra];
            return Err(RenderError::MultipleInputs {
                tag: tag.to_string(),
                line: block.location.line,
                span: block.span.clone(),
            });
        }
        Ok(first)
    }

    /// All blocks carrying `tag`, of any kind, in document order.
    pub fn lookup_by_tag(&self, tag: &str) -> Result<Vec<&Block>, RenderError> {
        self.groups
            .get(tag)
            .map(|members| members.iter().map(|&i| &self.blocks[i]).collect())
            .ok_or_else(|| RenderError::TagNotFound(tag.to_string()))
    }

    /// The block whose annotation starts at `location`.
    pub fn lookup_by_location(&self, location: &SourceLocation) -> Result<&Block, RenderError> {
        self.locations
            .get(location)
            .map(|&i| &self.blocks[i])
            .ok_or(RenderError::LocationNotFound(*location))
    }

    /// Blocks in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
