//! Normalization of raw model output into a `TranslationResult`

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::glossary::Term;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationResult {
    pub translated: String,
    pub terms: Vec<Term>,
    pub flags: Vec<String>,
}

impl TranslationResult {
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }
}

/// What the model actually sent back.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    /// A JSON object, possibly missing fields or holding the wrong types.
    Structured(Map<String, Value>),
    /// Anything else; treated as the translation itself.
    Unstructured(String),
}

impl ModelOutput {
    pub fn parse(raw: &str) -> Self {
        let body = strip_code_fence(raw).unwrap_or(raw);
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => Self::Structured(map),
            _ => Self::Unstructured(raw.to_string()),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }
}

/// Model-supplied terms are looser than glossary entries.
#[derive(Debug, Deserialize)]
struct ModelTerm {
    source: String,
    #[serde(default)]
    target: String,
    #[serde(default)]
    note: Option<String>,
}

impl From<ModelTerm> for Term {
    fn from(t: ModelTerm) -> Self {
        Self {
            source: t.source,
            target: t.target,
            note: t.note,
        }
    }
}

/// Turn raw model text into a result that always satisfies the response
/// contract, then append every glossary hit the model left out.
pub fn normalize(raw: &str, hits: &[Term]) -> TranslationResult {
    normalize_output(ModelOutput::parse(raw), hits)
}

pub fn normalize_output(output: ModelOutput, hits: &[Term]) -> TranslationResult {
    let mut result = match output {
        ModelOutput::Structured(mut map) => TranslationResult {
            translated: coerce_translated(map.remove("translated")),
            terms: coerce_terms(map.remove("terms")),
            flags: coerce_flags(map.remove("flags")),
        },
        ModelOutput::Unstructured(raw) => TranslationResult {
            translated: raw.trim().to_string(),
            terms: Vec::new(),
            flags: Vec::new(),
        },
    };

    merge_terms(&mut result.terms, hits);
    result
}

/// Appends each hit whose source is not already present, compared case-insensitively.
pub fn merge_terms(terms: &mut Vec<Term>, hits: &[Term]) {
    for hit in hits {
        let source = hit.source.to_lowercase();
        if !terms.iter().any(|t| t.source.to_lowercase() == source) {
            terms.push(hit.clone());
        }
    }
}

fn coerce_translated(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        // Falsy scalars keep their JSON text: `0` -> "0", `false` -> "false".
        Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
        _ => String::new(),
    }
}

fn coerce_terms(value: Option<Value>) -> Vec<Term> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<ModelTerm>(item) {
            Ok(term) => Some(term.into()),
            Err(e) => {
                tracing::debug!("Dropping malformed model term: {}", e);
                None
            }
        })
        .collect()
}

fn coerce_flags(value: Option<Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    let mut flags: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if let Value::String(flag) = item {
            if !flags.contains(&flag) {
                flags.push(flag);
            }
        }
    }
    flags
}

/// Body of a Markdown code fence wrapping the whole text, if there is one.
fn strip_code_fence(raw: &str) -> Option<&str> {
    let s = raw.trim();
    let inner = s.strip_prefix("```")?.strip_suffix("```")?;
    // Drop the info string (```json) on the opening line.
    let body = match inner.find('\n') {
        Some(pos) => &inner[pos + 1..],
        None => inner,
    };
    Some(body.trim())
}
