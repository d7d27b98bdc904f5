//! Prompt construction for the translation request

use serde::{Deserialize, Serialize};

use super::glossary::Term;

/// Phrases that should make the model raise the `EMERGENCY` flag.
pub const EMERGENCY_TRIGGERS: &[&str] = &[
    "chest pain",
    "shortness of breath",
    "stroke",
    "severe bleeding",
    "dolor torácico",
    "dificultad respiratoria",
];

pub const EMERGENCY_FLAG: &str = "EMERGENCY";

const SYSTEM_PROMPT: &str = "You are MediTongue, an offline medical translator. Output STRICT JSON only:\n\
{\"translated\": string, \"terms\":[{\"source\": string,\"target\": string,\"note\": string}], \"flags\": string[]}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    /// Single-string form for generate-style backends.
    pub fn to_single_string(&self) -> String {
        format!("{}\n\n{}", self.system, self.user)
    }

    /// Role-tagged form for chat backends.
    pub fn messages(&self) -> Vec<Message> {
        vec![
            Message {
                role: "system".to_string(),
                content: self.system.clone(),
            },
            Message {
                role: "user".to_string(),
                content: self.user.clone(),
            },
        ]
    }
}

pub fn build_prompt(from_lang: &str, to_lang: &str, text: &str, hits: &[Term]) -> Prompt {
    Prompt {
        system: SYSTEM_PROMPT.to_string(),
        user: format!(
            "Translate from {from_lang} to {to_lang}.\n\
             Text: \"\"\"{text}\"\"\"\n\
             Glossary: {}\n\
             If emergency detected ({}), include \"{EMERGENCY_FLAG}\" in flags.\n\
             Return ONLY JSON.",
            glossary_hints(hits),
            EMERGENCY_TRIGGERS.join(", "),
        ),
    }
}

fn glossary_hints(hits: &[Term]) -> String {
    if hits.is_empty() {
        return "none".to_string();
    }
    hits.iter()
        .map(|t| format!("{} -> {}", t.source, t.target))
        .collect::<Vec<_>>()
        .join(" | ")
}
