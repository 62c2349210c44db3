// src/validation/field_validator.rs - Declarative per-field constraints and sanitization
use log::{debug, warn};
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::models::profile::CanonicalProfile;
use crate::utils::logging::{Component, NormalizationLogger};
use crate::validation::phone::PhoneNormalizer;
use crate::validation::postal::extract_postal_code;

pub const MARITAL_STATUS_VALUES: &[&str] = &[
    "Single",
    "Married",
    "Un-Married",
    "Divorced",
    "Awaiting Divorce",
    "Separated",
    "Widowed",
    "Widow",
    "Widower",
    "Committed",
];

pub const MANGLIK_VALUES: &[&str] = &["Yes", "No", "Don't Know"];

pub const GENDER_VALUES: &[&str] = &["Male", "Female"];

const LOCATION_PATTERN: &str = r"^[a-zA-Z\s\-'&.]{2,50}$";
const CASTE_PATTERN: &str = r"^[a-zA-Z\s\-'&.]{2,30}$";

const STREET_WORDS: &str = r"(?i)\b(road|rd|street|st|lane|marg|gali|colony|sector|plot|house|flat|apartment|bldg|building|mohalla|nagar|chowk|near|opp)\b";
const INSTITUTION_WORDS: &str = r"(?i)\b(university|college|school|institute|department|faculty|academy|hospital|office)\b";
const MUNICIPAL_WORDS: &str = r"(?i)\b(town|city|municipal|corporation|ward|tehsil|tahsil|taluka)\b";
const SEPARATORS: &str = r"[,;]";

/// Rules for one canonical field. Enum checks are case-insensitive; pattern
/// and suspicious checks run against the trimmed text.
#[derive(Debug, Clone)]
pub struct FieldConstraint {
    pub field: &'static str,
    pub pattern: Option<Regex>,
    pub allowed_values: Option<&'static [&'static str]>,
    pub suspicious: Vec<Regex>,
    pub description: &'static str,
}

impl FieldConstraint {
    fn new(field: &'static str, description: &'static str) -> Self {
        Self {
            field,
            pattern: None,
            allowed_values: None,
            suspicious: Vec::new(),
            description,
        }
    }

    fn pattern(mut self, pattern: &str) -> Self {
        self.pattern = compile(self.field, pattern);
        self
    }

    fn allowed(mut self, values: &'static [&'static str]) -> Self {
        self.allowed_values = Some(values);
        self
    }

    fn suspicious(mut self, patterns: &[&str]) -> Self {
        self.suspicious
            .extend(patterns.iter().filter_map(|p| compile(self.field, p)));
        self
    }

    /// Canonical spelling of an enum value, when the constraint has an enum.
    pub fn canonical_value(&self, value: &str) -> Option<&'static str> {
        let wanted = value.trim().to_lowercase();
        self.allowed_values?
            .iter()
            .copied()
            .find(|allowed| allowed.to_lowercase() == wanted)
    }

    pub fn check(&self, value: &str) -> Result<(), String> {
        let value = value.trim();
        if self.allowed_values.is_some() && self.canonical_value(value).is_none() {
            return Err(format!("'{}' is not an accepted {}", value, self.description));
        }
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(value) {
                return Err(format!("'{}' does not look like a {}", value, self.description));
            }
        }
        if let Some(hit) = self.suspicious.iter().find_map(|re| re.find(value)) {
            return Err(format!(
                "'{}' contains '{}', unexpected in a {}",
                value,
                hit.as_str(),
                self.description
            ));
        }
        Ok(())
    }
}

fn compile(field: &str, pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("Invalid regex pattern for field '{}': {}", field, e);
            None
        }
    }
}

/// Outcome of sanitizing a profile. Every rejected field is nulled in
/// `profile` and gets one entry in `warnings`.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizeReport {
    pub profile: CanonicalProfile,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FieldConstraintValidator {
    constraints: HashMap<&'static str, FieldConstraint>,
    phone: PhoneNormalizer,
}

impl Default for FieldConstraintValidator {
    fn default() -> Self {
        Self::new(PhoneNormalizer::default())
    }
}

impl FieldConstraintValidator {
    pub fn new(phone: PhoneNormalizer) -> Self {
        let mobile_pattern = format!(r"^\+{}\s?\d{{10}}$", regex::escape(phone.country_code()));
        let constraints = vec![
            FieldConstraint::new("full_name", "full name").pattern(r"^[a-zA-Z\s\-'.]{4,60}$"),
            FieldConstraint::new("first_name", "first name").pattern(r"^[a-zA-Z\s\-'.]{2,30}$"),
            FieldConstraint::new("last_name", "last name").pattern(r"^[a-zA-Z\s\-'.]{2,30}$"),
            FieldConstraint::new("gender", "gender").allowed(GENDER_VALUES),
            FieldConstraint::new("marital_status", "marital status").allowed(MARITAL_STATUS_VALUES),
            FieldConstraint::new("manglik", "manglik status").allowed(MANGLIK_VALUES),
            FieldConstraint::new("religion", "religion").pattern(CASTE_PATTERN),
            FieldConstraint::new("caste", "caste").pattern(CASTE_PATTERN),
            FieldConstraint::new("jaati", "jaati").pattern(CASTE_PATTERN),
            FieldConstraint::new("gotra", "gotra").pattern(CASTE_PATTERN),
            FieldConstraint::new("sakha", "sakha").pattern(CASTE_PATTERN),
            FieldConstraint::new("education", "degree")
                .pattern(r"^[A-Z.]+[\w\s\-().,]*$")
                .suspicious(&[INSTITUTION_WORDS]),
            FieldConstraint::new("specialization", "specialization")
                .pattern(r"^[a-zA-Z\s\-'&.()]{2,50}$"),
            FieldConstraint::new("occupation", "occupation").pattern(r"^[a-zA-Z\s\-'&.()/]{2,50}$"),
            FieldConstraint::new("city", "city")
                .pattern(LOCATION_PATTERN)
                .suspicious(&[
                    r"(?i)\b(degree|diploma|certified|mba|b\.tech|m\.tech|b\.com|m\.sc|b\.sc)",
                    INSTITUTION_WORDS,
                ]),
            FieldConstraint::new("state", "state")
                .pattern(LOCATION_PATTERN)
                .suspicious(&[STREET_WORDS, INSTITUTION_WORDS, MUNICIPAL_WORDS, SEPARATORS]),
            FieldConstraint::new("native_state", "native state")
                .pattern(LOCATION_PATTERN)
                .suspicious(&[STREET_WORDS, INSTITUTION_WORDS, MUNICIPAL_WORDS, SEPARATORS]),
            FieldConstraint::new("country", "country").pattern(LOCATION_PATTERN),
            FieldConstraint::new("district", "district").pattern(LOCATION_PATTERN),
            FieldConstraint::new("village", "village").pattern(LOCATION_PATTERN),
            FieldConstraint::new("tahsil", "tahsil").pattern(LOCATION_PATTERN),
            FieldConstraint::new("birth_place", "birth place").pattern(LOCATION_PATTERN),
            FieldConstraint::new("zip_code", "postal code")
                .pattern(r"^\d{5,10}$")
                .suspicious(&[r"[^0-9]"]),
            FieldConstraint::new("mobile_no", "mobile number").pattern(&mobile_pattern),
            FieldConstraint::new("phone_no", "phone number").pattern(r"^\+?[\d\s\-()]{6,20}$"),
            FieldConstraint::new("email_id", "email address")
                .pattern(r"^[^@\s]+@[^@\s]+\.[^@\s]+$"),
        ];

        Self {
            constraints: constraints.into_iter().map(|c| (c.field, c)).collect(),
            phone,
        }
    }

    pub fn constraint(&self, field: &str) -> Option<&FieldConstraint> {
        self.constraints.get(field)
    }

    /// Null, empty, and unconstrained values always pass.
    pub fn validate(&self, field: &str, value: &Value) -> Result<(), String> {
        let text = match value {
            Value::Null => return Ok(()),
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(format!("{} must be a scalar", field));
            }
        };
        if text.is_empty() {
            return Ok(());
        }
        match self.constraints.get(field) {
            Some(constraint) => constraint.check(&text),
            None => Ok(()),
        }
    }

    /// Rejection reasons per field; fields that pass are omitted.
    pub fn validate_profile(&self, profile: &CanonicalProfile) -> BTreeMap<String, String> {
        profile
            .iter()
            .filter_map(|(field, value)| {
                self.validate(field, value)
                    .err()
                    .map(|reason| (field.to_string(), reason))
            })
            .collect()
    }

    /// Canonicalizes postal code and mobile number, nulls every field that
    /// fails its constraint, and rewrites enum values to canonical casing.
    pub fn sanitize(&self, mut profile: CanonicalProfile) -> SanitizeReport {
        let logger = NormalizationLogger::new(Component::Validator);
        let mut warnings = Vec::new();

        if let Some(zip) = profile.get_str("zip_code").map(str::to_string) {
            match extract_postal_code(&zip) {
                Some(code) => {
                    profile.set("zip_code", code);
                }
                None => {
                    profile.clear("zip_code");
                    warnings.push(format!("zip_code: no postal code in '{}'", zip));
                }
            }
        }

        if let Some(mobile) = profile.get_str("mobile_no").map(str::to_string) {
            match self.phone.normalize(&mobile) {
                Some(canonical) => {
                    profile.set("mobile_no", canonical);
                }
                None => {
                    profile.clear("mobile_no");
                    warnings.push(format!("mobile_no: '{}' is not a valid mobile number", mobile));
                }
            }
        }

        let fields: Vec<String> = profile.keys().map(str::to_string).collect();
        for field in fields {
            let Some(value) = profile.get(&field).cloned() else {
                continue;
            };
            match self.validate(&field, &value) {
                Ok(()) => {
                    let canonical = self
                        .constraints
                        .get(field.as_str())
                        .zip(value.as_str())
                        .and_then(|(c, v)| c.canonical_value(v));
                    if let Some(canonical) = canonical {
                        profile.set(&field, canonical);
                    }
                }
                Err(reason) => {
                    logger.log_rejection(&field, &reason);
                    profile.clear(&field);
                    warnings.push(format!("{}: {}", field, reason));
                }
            }
        }

        debug!("Sanitization finished with {} warnings", warnings.len());
        SanitizeReport { profile, warnings }
    }
}
