//! Coercing free-form generated text into a [`StructuredReply`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ContractViolation;
use crate::types::{
    StructuredReply, DECISIONS_KEY, END_TURN_KEY, MEMORY_KEY, OPERATOR_REQUEST_KEY,
    PUBLIC_INFO_KEY, TO_MEMORIZE_KEY,
};

/// The set of keys a reply must (and may) carry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyContract {
    pub required: Vec<String>,
    #[serde(default)]
    pub optional: Vec<String>,
}

impl Default for ReplyContract {
    fn default() -> Self {
        Self {
            required: [MEMORY_KEY, DECISIONS_KEY, END_TURN_KEY, PUBLIC_INFO_KEY]
                .map(String::from)
                .to_vec(),
            optional: [TO_MEMORIZE_KEY, OPERATOR_REQUEST_KEY]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl ReplyContract {
    /// Keys the engine cannot run without, whatever the configured contract.
    pub const MANDATORY: [&'static str; 3] = [MEMORY_KEY, DECISIONS_KEY, END_TURN_KEY];

    pub fn new<S: Into<String>>(
        required: impl IntoIterator<Item = S>,
        optional: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            required: required.into_iter().map(Into::into).collect(),
            optional: optional.into_iter().map(Into::into).collect(),
        }
    }

    /// Engine keys this contract does not require.
    pub fn missing_mandatory(&self) -> Vec<&'static str> {
        Self::MANDATORY
            .into_iter()
            .filter(|key| !self.required.iter().any(|r| r == key))
            .collect()
    }

    /// Parses a raw generated reply and checks every required key is there.
    pub fn parse(&self, raw: &str) -> Result<StructuredReply, ContractViolation> {
        let cleaned = strip_fences(raw);
        let value: Value = serde_json::from_str(cleaned)
            .map_err(|e| ContractViolation::Malformed(e.to_string()))?;
        let Value::Object(fields) = value else {
            return Err(ContractViolation::NotAnObject);
        };

        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|key| !fields.contains_key(key.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ContractViolation::MissingFields(missing));
        }

        Ok(StructuredReply::new(fields))
    }

    /// The sentence appended to a prompt after an invalid reply.
    pub fn corrective_instruction(&self) -> String {
        let mut text = format!(
            "Your previous response was invalid. Please reply with exactly one JSON object containing keys {}",
            quoted_list(&self.required)
        );
        if !self.optional.is_empty() {
            text.push_str(&format!(", and optionally {}", quoted_list(&self.optional)));
        }
        text.push('.');
        text
    }

    /// Bullet list of keys used inside the framing templates.
    pub fn describe(&self) -> String {
        let mut out = String::from("Required keys:\n");
        for key in &self.required {
            out.push_str(&format!("  - \"{}\": {}\n", key, key_hint(key)));
        }
        if !self.optional.is_empty() {
            out.push_str("Optional keys:\n");
            for key in &self.optional {
                out.push_str(&format!("  - \"{}\": {}\n", key, key_hint(key)));
            }
        }
        out.trim_end().to_string()
    }
}

/// Removes one leading and one trailing fence line when both are present.
pub fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let Some(first_newline) = trimmed.find('\n') else {
        return trimmed;
    };
    let Some(last_newline) = trimmed.rfind('\n') else {
        return trimmed;
    };
    if last_newline <= first_newline || !trimmed[last_newline + 1..].starts_with("```") {
        return trimmed;
    }
    &trimmed[first_newline + 1..last_newline]
}

fn quoted_list(keys: &[String]) -> String {
    let quoted: Vec<String> = keys.iter().map(|k| format!("\"{k}\"")).collect();
    match quoted.as_slice() {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

fn key_hint(key: &str) -> &'static str {
    match key {
        MEMORY_KEY => "the updated private memory",
        DECISIONS_KEY => "what you will do now",
        END_TURN_KEY => "true if you are ending your turn, false to take another action",
        PUBLIC_INFO_KEY => "the public game state visible to both players",
        TO_MEMORIZE_KEY => "any extra details you think are important to remember",
        OPERATOR_REQUEST_KEY => "exactly what you need the operator to do",
        _ => "see instructions",
    }
}
