use crate::ClassifierError;
use crate::instances::*;

/// Represents the ordered set of grammars a [crate::Classifier] dispatches over.
pub struct Config {
    pub(crate) grammars: Vec<Grammar>,
    pub(crate) fallback: Grammar,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            grammars: vec![],
            fallback: None,
        }
    }

    /// Every radiotherapy report grammar in [GRAMMAR_ORDER], plus the generic fallback.
    pub fn radiotherapy() -> Result<Self, ClassifierError> {
        GRAMMARS
            .iter()
            .fold(Self::builder(), |builder, spec| builder.with_grammar(*spec))
            .with_fallback(FALLBACK)
            .build()
    }

    /// Document types in the order they will be tried.
    pub fn order(&self) -> impl Iterator<Item = merge_traits::DocumentType> + '_ {
        self.grammars.iter().map(|g| g.document_type)
    }
}

/// Constructs a new Config
pub struct ConfigBuilder {
    grammars: Vec<GrammarSpec>,
    fallback: Option<GrammarSpec>,
}

impl ConfigBuilder {
    /// Appends a grammar. Grammars added earlier take priority.
    pub fn with_grammar(mut self, spec: GrammarSpec) -> Self {
        self.grammars.push(spec);
        self
    }

    /// Defines the grammar used when no marker matches.
    pub fn with_fallback(mut self, spec: GrammarSpec) -> Self {
        self.fallback = Some(spec);
        self
    }

    /// Compiles every pattern and consumes the builder into a Config.
    pub fn build(self) -> Result<Config, ClassifierError> {
        if self.grammars.is_empty() {
            return Err(ClassifierError::NoGrammarsProvided);
        }

        let mut grammars = Vec::with_capacity(self.grammars.len());
        for spec in &self.grammars {
            let Some(marker) = spec.marker else {
                return Err(ClassifierError::MissingMarker(spec.document_type));
            };
            if grammars.iter().any(|g: &Grammar| g.marker == Some(marker)) {
                return Err(ClassifierError::DuplicateMarker(marker));
            }
            grammars.push(Grammar::compile(spec)?);
        }

        let fallback = self.fallback.ok_or(ClassifierError::NoFallbackProvided)?;

        Ok(Config {
            grammars,
            fallback: Grammar::compile(&fallback)?,
        })
    }
}
