//! Markdown workflow documents.
//!
//! A workflow document is a markdown file whose first line is `---`, followed
//! by YAML frontmatter, a closing `---` line, and the prompt body.

use crate::config::WorkflowConfig;
use crate::{Error, Result};
use std::path::Path;

const FENCE: &str = "---";

/// A parsed markdown workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowDocument {
    /// Validated frontmatter
    pub frontmatter: WorkflowConfig,
    /// Markdown prompt body (everything after the closing fence)
    pub body: String,
}

impl WorkflowDocument {
    /// Parse a workflow document from its source text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Frontmatter`] when the fences are missing and
    /// [`Error::Yaml`]/[`Error::Config`] when the frontmatter is invalid.
    pub fn parse(source: &str) -> Result<Self> {
        let (yaml, body) = split_frontmatter(source)?;
        let frontmatter = WorkflowConfig::from_yaml(yaml)?;
        Ok(Self {
            frontmatter,
            body: body.trim().to_string(),
        })
    }

    /// Read and parse a workflow document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read, otherwise the
    /// errors of [`WorkflowDocument::parse`].
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        tracing::debug!(path = %path.display(), bytes = source.len(), "Loaded workflow document");
        Self::parse(&source)
    }
}

/// Split source text into frontmatter YAML and body.
fn split_frontmatter(source: &str) -> Result<(&str, &str)> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let mut lines = source.split_inclusive('\n');

    let first = lines.next().unwrap_or_default();
    if first.trim_end() != FENCE {
        return Err(Error::frontmatter(
            "document must start with a '---' line",
        ));
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if line.trim_end() == FENCE {
            let yaml = &source[yaml_start..offset];
            let body = &source[offset + line.len()..];
            return Ok((yaml, body));
        }
        offset += line.len();
    }

    Err(Error::frontmatter("frontmatter is not closed by a '---' line"))
}
