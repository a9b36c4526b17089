//! # Field Extractor
//!
//! Sends one page image and a field list to the vision model, then validates
//! the model's JSON reply into `ExtractedField` records.
//!
//! Reply policy:
//! - The reply must be a JSON object (optionally wrapped in a ```` ```json ```` fence).
//! - Every requested field must be present as a key. `null`, `{"value": null}`
//!   or a blank value means the field was not found on the page and it is left
//!   out of the result.
//! - A found value must be a string or a number and carry a numeric
//!   `confidence` within `[0, 1]`. Anything else is rejected, never clamped.
//! - Keys that were not requested are dropped.

use crate::{
    errors::DocfieldError,
    prompts::tasks::{
        FIELD_EXTRACTION_SYSTEM_PROMPT, FIELD_EXTRACTION_USER_PROMPT,
        LANGUAGE_DETECTION_SYSTEM_PROMPT, LANGUAGE_DETECTION_USER_PROMPT,
    },
    providers::ai::{VisionProvider, VisionRequest},
    types::{ExtractedField, PageImage},
};
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

/// Single-character values are rarely a confident match.
const SHORT_VALUE_CONFIDENCE_CAP: f64 = 0.5;

/// A system and user prompt pair for one task.
#[derive(Debug, Clone)]
pub struct TaskPrompts {
    pub system_prompt: String,
    pub user_prompt: String,
}

impl TaskPrompts {
    pub fn field_extraction() -> Self {
        Self {
            system_prompt: FIELD_EXTRACTION_SYSTEM_PROMPT.to_string(),
            user_prompt: FIELD_EXTRACTION_USER_PROMPT.to_string(),
        }
    }

    pub fn language_detection() -> Self {
        Self {
            system_prompt: LANGUAGE_DETECTION_SYSTEM_PROMPT.to_string(),
            user_prompt: LANGUAGE_DETECTION_USER_PROMPT.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldExtractor {
    extraction_provider: Box<dyn VisionProvider>,
    language_provider: Box<dyn VisionProvider>,
    extraction_prompts: TaskPrompts,
    language_prompts: TaskPrompts,
}

impl FieldExtractor {
    /// Creates an extractor that uses `provider` and the default prompts for every task.
    pub fn new(provider: Box<dyn VisionProvider>) -> Self {
        Self {
            language_provider: provider.clone(),
            extraction_provider: provider,
            extraction_prompts: TaskPrompts::field_extraction(),
            language_prompts: TaskPrompts::language_detection(),
        }
    }

    pub fn with_extraction_prompts(mut self, prompts: TaskPrompts) -> Self {
        self.extraction_prompts = prompts;
        self
    }

    pub fn with_language_detection(
        mut self,
        provider: Box<dyn VisionProvider>,
        prompts: TaskPrompts,
    ) -> Self {
        self.language_provider = provider;
        self.language_prompts = prompts;
        self
    }

    pub fn model_name(&self) -> &str {
        self.extraction_provider.model_name()
    }

    /// Extracts `field_names` from a page image.
    ///
    /// The result holds at most one record per requested name, in request order.
    #[instrument(skip(self, image), fields(model = %self.model_name()))]
    pub async fn extract_fields(
        &self,
        image: &PageImage,
        field_names: &[String],
    ) -> Result<Vec<ExtractedField>, DocfieldError> {
        let user_prompt = build_user_prompt(&self.extraction_prompts.user_prompt, field_names);
        debug!(user_prompt = %user_prompt, "--> Sending field extraction prompt");

        let reply = self
            .extraction_provider
            .generate(VisionRequest {
                system_prompt: &self.extraction_prompts.system_prompt,
                user_prompt: &user_prompt,
                image,
                json_output: true,
            })
            .await?;
        debug!("<-- Field extraction reply: {}", reply);

        parse_extraction_reply(&reply, field_names)
    }

    /// Asks the model for the dominant language of a page and returns its ISO 639-1 code.
    #[instrument(skip(self, image))]
    pub async fn detect_language(&self, image: &PageImage) -> Result<String, DocfieldError> {
        let reply = self
            .language_provider
            .generate(VisionRequest {
                system_prompt: &self.language_prompts.system_prompt,
                user_prompt: &self.language_prompts.user_prompt,
                image,
                json_output: false,
            })
            .await?;
        let language = normalize_language(&reply);
        if language.is_empty() {
            return Err(DocfieldError::ModelResponseInvalid(
                "language detection returned no code".to_string(),
            ));
        }
        Ok(language)
    }
}

/// Substitutes the quoted field list into the `{fields}` placeholder.
pub fn build_user_prompt(template: &str, field_names: &[String]) -> String {
    let fields = field_names
        .iter()
        .map(|name| format!("\"{name}\""))
        .collect::<Vec<_>>()
        .join(", ");
    template.replace("{fields}", &fields)
}

/// Validates a model reply against the requested field names.
pub fn parse_extraction_reply(
    reply: &str,
    requested: &[String],
) -> Result<Vec<ExtractedField>, DocfieldError> {
    let body = strip_code_fence(reply)?;
    let parsed: Value = serde_json::from_str(body)
        .map_err(|e| invalid(format!("reply is not valid JSON: {e}")))?;
    let Value::Object(entries) = parsed else {
        return Err(invalid("reply is not a JSON object".to_string()));
    };

    for key in entries.keys() {
        if !requested.iter().any(|name| name == key) {
            warn!(field = %key, "Dropping field the model returned but was not requested.");
        }
    }

    let mut fields = Vec::with_capacity(requested.len());
    for name in requested {
        let entry = entries
            .get(name)
            .ok_or_else(|| invalid(format!("reply is missing requested field '{name}'")))?;
        if let Some(field) = parse_entry(name, entry)? {
            fields.push(field);
        }
    }
    Ok(fields)
}

fn parse_entry(name: &str, entry: &Value) -> Result<Option<ExtractedField>, DocfieldError> {
    let object: &Map<String, Value> = match entry {
        Value::Null => return Ok(None),
        Value::Object(object) => object,
        other => {
            return Err(invalid(format!(
                "field '{name}' must be an object or null, got {other}"
            )))
        }
    };

    let value = match object.get("value") {
        None => return Err(invalid(format!("field '{name}' is missing 'value'"))),
        Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => {
            return Err(invalid(format!(
                "field '{name}' has a non-text value: {other}"
            )))
        }
    };
    if value.is_empty() {
        return Ok(None);
    }

    let confidence = match object.get("confidence") {
        None | Some(Value::Null) => {
            return Err(invalid(format!("field '{name}' is missing 'confidence'")))
        }
        Some(raw) => raw.as_f64().ok_or_else(|| {
            invalid(format!("field '{name}' has a non-numeric confidence: {raw}"))
        })?,
    };
    if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
        return Err(invalid(format!(
            "field '{name}' has confidence {confidence} outside [0, 1]"
        )));
    }

    let confidence = if value.chars().count() < 2 {
        confidence.min(SHORT_VALUE_CONFIDENCE_CAP)
    } else {
        confidence
    };

    Ok(Some(ExtractedField {
        field_name: name.to_string(),
        value,
        confidence,
    }))
}

fn strip_code_fence(reply: &str) -> Result<&str, DocfieldError> {
    let re = Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$")
        .map_err(|e| DocfieldError::Internal(e.into()))?;
    Ok(match re.captures(reply).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str(),
        None => reply.trim(),
    })
}

/// Maps a free-form language answer to an ISO 639-1 code.
fn normalize_language(reply: &str) -> String {
    let answer = reply
        .trim()
        .trim_matches(|c: char| c == '\'' || c == '"' || c == '.' || c == '`')
        .to_lowercase();
    let code = match answer.as_str() {
        "english" => "en",
        "thai" => "th",
        "mandarin" | "chinese" => "zh",
        "indonesian" | "bahasa" => "id",
        "vietnamese" => "vi",
        "japanese" => "ja",
        "korean" => "ko",
        "spanish" => "es",
        "french" => "fr",
        "german" => "de",
        "italian" => "it",
        "portuguese" => "pt",
        "russian" => "ru",
        "arabic" => "ar",
        other => other,
    };
    code.to_string()
}

fn invalid(message: String) -> DocfieldError {
    DocfieldError::ModelResponseInvalid(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_found_and_missing_fields_in_request_order() {
        let reply = json!({
            "date": { "value": " 2024-01-15 ", "confidence": 0.95 },
            "invoice_number": { "value": "INV-2024-001", "confidence": 0.98 },
            "amount": null
        })
        .to_string();

        let fields =
            parse_extraction_reply(&reply, &names(&["invoice_number", "date", "amount"])).unwrap();

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field_name, "invoice_number");
        assert_eq!(fields[1].field_name, "date");
        assert_eq!(fields[1].value, "2024-01-15");
    }

    #[test]
    fn strips_markdown_fences() {
        let reply = "```json\n{\"date\": {\"value\": \"2024-01-15\", \"confidence\": 0.9}}\n```";
        let fields = parse_extraction_reply(reply, &names(&["date"])).unwrap();
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn drops_fields_that_were_not_requested() {
        let reply = json!({
            "date": { "value": "2024-01-15", "confidence": 0.9 },
            "vendor": { "value": "ACME", "confidence": 0.9 }
        })
        .to_string();
        let fields = parse_extraction_reply(&reply, &names(&["date"])).unwrap();
        assert_eq!(fields.len(), 1);
        assert!(fields.iter().all(|f| f.field_name == "date"));
    }

    #[test]
    fn missing_requested_key_is_invalid() {
        let reply = json!({ "date": { "value": "2024-01-15", "confidence": 0.9 } }).to_string();
        let err = parse_extraction_reply(&reply, &names(&["date", "amount"])).unwrap_err();
        assert!(matches!(err, DocfieldError::ModelResponseInvalid(_)));
    }

    #[test]
    fn out_of_range_or_non_numeric_confidence_is_invalid() {
        for confidence in [json!(1.3), json!(-0.1), json!("high")] {
            let reply =
                json!({ "date": { "value": "2024-01-15", "confidence": confidence } }).to_string();
            let err = parse_extraction_reply(&reply, &names(&["date"])).unwrap_err();
            assert!(matches!(err, DocfieldError::ModelResponseInvalid(_)));
        }
    }

    #[test]
    fn bare_values_and_non_objects_are_invalid() {
        let err = parse_extraction_reply(r#"{"date": "2024-01-15"}"#, &names(&["date"])).unwrap_err();
        assert!(matches!(err, DocfieldError::ModelResponseInvalid(_)));
        let err = parse_extraction_reply("[1, 2]", &names(&["date"])).unwrap_err();
        assert!(matches!(err, DocfieldError::ModelResponseInvalid(_)));
        let err = parse_extraction_reply("not json", &names(&["date"])).unwrap_err();
        assert!(matches!(err, DocfieldError::ModelResponseInvalid(_)));
    }

    #[test]
    fn blank_values_count_as_not_found_and_numbers_are_accepted() {
        let reply = json!({
            "date": { "value": "   ", "confidence": 0.0 },
            "amount": { "value": 1250.5, "confidence": 0.92 }
        })
        .to_string();
        let fields = parse_extraction_reply(&reply, &names(&["date", "amount"])).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].value, "1250.5");
    }

    #[test]
    fn single_character_values_have_capped_confidence() {
        let reply = json!({ "grade": { "value": "A", "confidence": 0.99 } }).to_string();
        let fields = parse_extraction_reply(&reply, &names(&["grade"])).unwrap();
        assert_eq!(fields[0].confidence, 0.5);
    }

    #[test]
    fn user_prompt_lists_quoted_fields() {
        let prompt = build_user_prompt("extract: {fields}", &names(&["invoice_number", "date"]));
        assert_eq!(prompt, r#"extract: "invoice_number", "date""#);
    }

    #[test]
    fn language_names_map_to_codes() {
        assert_eq!(normalize_language("Thai"), "th");
        assert_eq!(normalize_language(" 'zh'\n"), "zh");
        assert_eq!(normalize_language("Chinese."), "zh");
    }
}
