pub mod config;
pub mod instances;
pub mod pattern;

#[cfg(test)]
mod tests;

use crate::config::Config;
use crate::instances::Grammar;
use merge_traits::{ClassifiedDocument, DocumentType, ExtractError, TextSource};
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum ClassifierError {
    #[error("No grammars were provided!")]
    NoGrammarsProvided,

    #[error("No fallback grammar was provided!")]
    NoFallbackProvided,

    #[error("Grammar {0} has no marker, only the fallback may omit one")]
    MissingMarker(DocumentType),

    #[error("Marker {0:?} is claimed by more than one grammar")]
    DuplicateMarker(&'static str),

    #[error("Invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: &'static str,
        #[source]
        source: regex::Error,
    },
}

/// Classifier turns the first page of a report into a [ClassifiedDocument].
///
/// Grammars are tried strictly in the order of the [Config]; the first one
/// whose marker is present in the text is the only one whose field patterns
/// run. When no marker matches, the fallback grammar is applied and the
/// result is [DocumentType::Unknown].
pub struct Classifier {
    config: Config,
}

impl Classifier {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn radiotherapy() -> Result<Self, ClassifierError> {
        Ok(Self::new(Config::radiotherapy()?))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The grammar that claims `text`.
    pub fn grammar_for(&self, text: &str) -> &Grammar {
        self.config
            .grammars
            .iter()
            .find(|g| g.matches(text))
            .unwrap_or(&self.config.fallback)
    }

    pub fn classify(&self, text: &str) -> ClassifiedDocument {
        self.grammar_for(text).extract(text)
    }

    /// Reads the first page of `path` through `source` and classifies it.
    ///
    /// Fails only when the text cannot be obtained at all; unmatched fields
    /// are never an error.
    pub fn classify_file(
        &self,
        path: &Path,
        source: &dyn TextSource,
    ) -> Result<ClassifiedDocument, ExtractError> {
        let page = source.first_page(path)?;
        Ok(self.classify(&page.text).with_source(path, page.page_count))
    }
}
