//! Glossary support for consistent medical term translation

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const BUNDLED_GLOSSARY: &str = include_str!("../../data/glossary.json");

#[derive(Debug, thiserror::Error)]
pub enum GlossaryError {
    #[error("failed to read glossary file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed glossary data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One glossary entry: a source phrase, its rendering and an optional clinical note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Term {
    #[allow(dead_code)]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            note: None,
        }
    }

    #[allow(dead_code)]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Directional term lists keyed by `"{from}->{to}"`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Glossary {
    pairs: HashMap<String, Vec<Term>>,
}

pub fn pair_key(from_lang: &str, to_lang: &str) -> String {
    format!("{}->{}", from_lang, to_lang)
}

impl Glossary {
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self::default()
    }

    /// The glossary shipped inside the binary.
    pub fn bundled() -> Result<Self, GlossaryError> {
        Self::from_json(BUNDLED_GLOSSARY)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GlossaryError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| GlossaryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, GlossaryError> {
        Ok(serde_json::from_str(content)?)
    }

    #[allow(dead_code)]
    pub fn insert(&mut self, from_lang: &str, to_lang: &str, terms: Vec<Term>) {
        self.pairs.insert(pair_key(from_lang, to_lang), terms);
    }

    /// Terms registered for the directed pair, or an empty slice when the pair is unknown.
    pub fn lookup(&self, from_lang: &str, to_lang: &str) -> &[Term] {
        self.pairs
            .get(&pair_key(from_lang, to_lang))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Pair keys with their term counts, sorted by key.
    pub fn pairs(&self) -> Vec<(&str, usize)> {
        let mut pairs: Vec<_> = self
            .pairs
            .iter()
            .map(|(key, terms)| (key.as_str(), terms.len()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Candidates whose source phrase occurs anywhere in `text`, ignoring case.
///
/// Plain substring containment: no tokenization and no word boundaries, so
/// "stroke" also hits "heatstroke". Missing a clinical term is worse than a
/// spurious hint. Candidate order is preserved and nothing is deduplicated.
pub fn match_terms(text: &str, candidates: &[Term]) -> Vec<Term> {
    let lower = text.to_lowercase();
    candidates
        .iter()
        .filter(|t| lower.contains(&t.source.to_lowercase()))
        .cloned()
        .collect()
}
