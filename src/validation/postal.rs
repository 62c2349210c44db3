// src/validation/postal.rs - Postal code extraction and address plausibility checks
use once_cell::sync::Lazy;
use regex::Regex;

static POSTAL_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{5,10}\b").expect("valid postal run regex"));
static POSTAL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{5,10}$").expect("valid postal shape regex"));
static STREET_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d").expect("valid digit regex"));
static STREET_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(road|rd|street|st|lane|nagar|colony|sector|marg|block|house|flat|plot|village|near|opp|po|ps|dist|district|tehsil|tahsil)\b")
        .expect("valid street word regex")
});

static EDUCATION_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(b\.?tech|m\.?tech|mba|mca|bca|b\.?sc|m\.?sc|b\.?com|degree|graduate|diploma)\b")
        .expect("valid education word regex")
});

pub fn is_valid_postal_code(value: &str) -> bool {
    POSTAL_SHAPE.is_match(value.trim())
}

/// First run of 5-10 digits in free text.
pub fn extract_postal_code(text: &str) -> Option<String> {
    POSTAL_RUN
        .find(text)
        .map(|m| m.as_str().to_string())
        .filter(|code| is_valid_postal_code(code))
}

/// Plausibility check for an address line: long enough, free of degree
/// wording, and carrying a number, a street-like word, or a separator.
pub fn is_address_like(value: &str) -> Result<(), String> {
    let value = value.trim();
    if value.chars().count() < 5 {
        return Err("address too short".to_string());
    }
    if !value.chars().any(char::is_alphabetic) {
        return Err("address has no letters".to_string());
    }
    if let Some(m) = EDUCATION_WORD.find(value) {
        return Err(format!("address mentions '{}'", m.as_str()));
    }
    if STREET_NUMBER.is_match(value) || STREET_WORD.is_match(value) || value.contains(',') {
        Ok(())
    } else {
        Err("address lacks a number, street word or separator".to_string())
    }
}
