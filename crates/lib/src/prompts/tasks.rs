//! # Default Task Prompts
//!
//! Hardcoded defaults for the `field_extraction` and `language_detection`
//! tasks. They are loaded programmatically and can be overridden by `config.yml`.

// --- Field Extraction ---

pub const FIELD_EXTRACTION_SYSTEM_PROMPT: &str = r#"You are an expert OCR system that extracts specific fields from document images. Return only valid JSON with the requested fields."#;

/// Placeholders: `{fields}` (the quoted, comma-separated field names).
pub const FIELD_EXTRACTION_USER_PROMPT: &str = r#"Analyze this document image and extract the following fields: {fields}

Instructions:
1. Look for each of the specified fields in the document.
2. For every field, provide the extracted value and a confidence level between 0.0 and 1.0.
3. If a field is not present on this page, set it to null. Never omit a requested field.
4. Do not return any field that was not requested.
5. Handle multiple languages (English, Thai, Mandarin, Bahasa, Vietnamese, etc.).
6. For dates, use ISO format (YYYY-MM-DD) when possible.
7. For amounts and numbers, extract the numerical value.
8. For names, extract the full name as it appears.

Return the results as a single JSON object keyed by field name, in this exact shape:
{
  "invoice_number": { "value": "INV-2024-001", "confidence": 0.98 },
  "date": { "value": "2024-01-15", "confidence": 0.95 },
  "amount": null
}

Be precise. If you are unsure about a value, lower its confidence."#;

// --- Language Detection ---

pub const LANGUAGE_DETECTION_SYSTEM_PROMPT: &str =
    r#"You are a language detection expert. Return only the language code."#;

pub const LANGUAGE_DETECTION_USER_PROMPT: &str = r#"Analyze this document image and identify the primary language used.
Return only the language code (e.g., 'en', 'th', 'zh', 'id', 'vi').
If multiple languages are present, return the most dominant one."#;
