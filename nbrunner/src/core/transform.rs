//! Cell transformer seam and the substitution implementation.
//!
//! The [`Transformer`] trait decouples run orchestration from how template
//! cells are rewritten. Tests use recording transformers to observe
//! (non-)invocation without touching cell content.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::notebook::Notebook;

/// One substitution directive: regex pattern plus replacement text.
///
/// Replacements may reference capture groups (`$1`, `$name`) with the usual
/// regex-crate expansion rules.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Substitution {
    pub pattern: String,
    pub replacement: String,
}

/// Ordered substitution directives, applied to every cell's source in turn.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransformSet {
    #[serde(default)]
    pub substitutions: Vec<Substitution>,
}

impl TransformSet {
    pub fn is_empty(&self) -> bool {
        self.substitutions.is_empty()
    }
}

/// Abstraction over cell transformers.
pub trait Transformer {
    /// Rewrite matching cells in place, returning the number of substitutions
    /// applied across the document.
    fn transform(&self, notebook: &mut Notebook, directives: &TransformSet) -> Result<usize>;
}

/// Transformer that applies each directive as a regex substitution over every
/// cell source.
pub struct SubstitutionTransformer;

impl Transformer for SubstitutionTransformer {
    fn transform(&self, notebook: &mut Notebook, directives: &TransformSet) -> Result<usize> {
        let mut total = 0usize;
        for directive in &directives.substitutions {
            let pattern = Regex::new(&directive.pattern).with_context(|| {
                format!("compile substitution pattern {:?}", directive.pattern)
            })?;
            for cell in &mut notebook.cells {
                let count = pattern.find_iter(cell.source()).count();
                if count == 0 {
                    continue;
                }
                let rewritten = pattern
                    .replace_all(cell.source(), directive.replacement.as_str())
                    .into_owned();
                cell.set_source(rewritten);
                total += count;
            }
        }
        debug!(substitutions = total, "transform directives applied");
        Ok(total)
    }
}
