// src/normalization/enrichment.rs - Fills gaps from free-text notes using master-confirmed markers
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::matching::caste::{CasteField, CasteResolver};
use crate::matching::education::EducationParser;
use crate::models::profile::CanonicalProfile;
use crate::utils::logging::{Component, NormalizationLogger};

pub const NOTES_CASTE_THRESHOLD: f64 = 75.0;

/// Degree mentions and the table spelling used to confirm them. Short
/// abbreviations are matched case-sensitively so ordinary words ("be", "ma")
/// do not trigger.
const DEGREE_MARKERS: &[(&str, &str)] = &[
    (r"\b(?:B\.?\s?Tech|BTECH|(?i:bachelor of technology))\b", "B.Tech"),
    (r"\b(?:M\.?\s?Tech|MTECH|(?i:master of technology))\b", "M.Tech"),
    (r"\b(?:B\.E\.?|BE|(?i:bachelor of engineering))\b", "B.E"),
    (r"\b(?:M\.E\.?|(?i:master of engineering))\b", "M.E"),
    (r"\b(?:MBA|(?i:master of business administration))\b", "MBA"),
    (r"\b(?:BBA|(?i:bachelor of business administration))\b", "BBA"),
    (r"\b(?:MCA|(?i:master of computer applications?))\b", "MCA"),
    (r"\b(?:BCA|(?i:bachelor of computer applications?))\b", "BCA"),
    (r"\b(?:B\.?\s?Com|BCOM|(?i:bachelor of commerce))\b", "B.Com"),
    (r"\b(?:M\.?\s?Com|MCOM|(?i:master of commerce))\b", "M.Com"),
    (r"\b(?:B\.?\s?Sc|BSC|(?i:bachelor of science))\b", "B.Sc"),
    (r"\b(?:M\.?\s?Sc|MSC|(?i:master of science))\b", "M.Sc"),
    (r"\b(?:B\.A\.?|(?i:bachelor of arts))\b", "B.A"),
    (r"\b(?:M\.A\.?|(?i:master of arts))\b", "M.A"),
    (r"\b(?:MBBS)\b", "MBBS"),
    (r"\b(?:CA|(?i:chartered accountant))\b", "CA"),
    (r"\b(?:Ph\.?\s?D|PHD|(?i:doctorate))\b", "PhD"),
    (r"\b(?:LLB|LL\.B\.?)\b", "LLB"),
    (r"\b(?:LLM|LL\.M\.?)\b", "LLM"),
    (r"\b(?:MD|M\.D\.?)\b", "MD"),
    (r"\b(?:BDS|B\.D\.S\.?)\b", "BDS"),
    (r"\b(?i:diploma)\b", "Diploma"),
];

const JAATI_MARKERS: &[&str] = &[
    r"(?i)\b(brahmin|rajput|vaishya|kshatriya|jat|gurjar|yadav|kayastha|maheshwari|agarwal|jain|khandelwal|pareek|gaur|dadhich|sikh)\b",
];

const GOTRA_MARKERS: &[&str] = &[
    r"(?i)\bgotra\s*[:\-]?\s*([a-z]+)",
    r"(?i)\b([a-z]+)\s+gotra\b",
    r"(?i)\b(bharadwaj|kashyap|vashishtha|vasishtha|gautam|atri|vishwamitra|jamadagni|agastya|garg|goyal|bansal|mittal|singhal)\b",
];

const SAKHA_MARKERS: &[&str] = &[
    r"(?i)\b(?:sakha|shakha)\s*[:\-]?\s*([a-z]+)",
    r"(?i)\b([a-z]+)\s+(?:sakha|shakha)\b",
    r"(?i)\b(madhyandini|kauthumi|shakala|taittiriya|kanva|shaunaka|jaiminiya)\b",
];

fn compile_markers(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
}

static DEGREE_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    DEGREE_MARKERS
        .iter()
        .filter_map(|(pattern, hint)| Regex::new(pattern).ok().map(|re| (re, *hint)))
        .collect()
});
static JAATI_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| compile_markers(JAATI_MARKERS));
static GOTRA_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| compile_markers(GOTRA_MARKERS));
static SAKHA_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| compile_markers(SAKHA_MARKERS));

/// Degree hint of the earliest degree mention in `text`.
pub fn first_degree_mention(text: &str) -> Option<&'static str> {
    DEGREE_PATTERNS
        .iter()
        .filter_map(|(re, hint)| re.find(text).map(|m| (m.start(), *hint)))
        .min_by_key(|(start, _)| *start)
        .map(|(_, hint)| hint)
}

/// Captured marker words for one field, in order of appearance.
fn marker_mentions(text: &str, patterns: &[Regex]) -> Vec<String> {
    let mut hits: Vec<(usize, String)> = patterns
        .iter()
        .flat_map(|re| {
            re.captures_iter(text).filter_map(|caps| {
                caps.get(1)
                    .or_else(|| caps.get(0))
                    .map(|m| (m.start(), m.as_str().to_string()))
            })
        })
        .collect();
    hits.sort_by_key(|(start, _)| *start);
    let mut seen: Vec<String> = Vec::new();
    for (_, word) in hits {
        if !seen.iter().any(|s| s.eq_ignore_ascii_case(&word)) {
            seen.push(word);
        }
    }
    seen
}

/// Writes master-confirmed values for absent fields only. Returns the names of
/// the fields it filled.
pub struct NotesEnricher<'a> {
    education: &'a EducationParser,
    caste: &'a CasteResolver,
    logger: NormalizationLogger,
}

impl<'a> NotesEnricher<'a> {
    pub fn new(education: &'a EducationParser, caste: &'a CasteResolver) -> Self {
        Self {
            education,
            caste,
            logger: NormalizationLogger::new(Component::Enrichment),
        }
    }

    pub fn enrich(&self, profile: &mut CanonicalProfile, notes: &str) -> Vec<&'static str> {
        let mut filled = Vec::new();
        if notes.trim().is_empty() {
            return filled;
        }

        if profile.is_absent("education") {
            if let Some(hint) = first_degree_mention(notes) {
                let result = self.education.lookup_degree(hint);
                if let Some(degree) = result.value {
                    self.logger.log_fill("education", &degree, "notes");
                    profile.set("education", degree);
                    filled.push("education");
                } else {
                    debug!("Degree hint '{}' from notes not in qualification table", hint);
                }
            }
        }

        let caste_fields: [(CasteField, &'static str, &Lazy<Vec<Regex>>); 3] = [
            (CasteField::Jaati, "jaati", &JAATI_PATTERNS),
            (CasteField::Gotra, "gotra", &GOTRA_PATTERNS),
            (CasteField::Sakha, "sakha", &SAKHA_PATTERNS),
        ];
        for (field, name, patterns) in caste_fields {
            if !profile.contains_field(name) || !profile.is_absent(name) {
                continue;
            }
            let confirmed = marker_mentions(notes, patterns)
                .into_iter()
                .find_map(|word| self.caste.match_field(field, &word, NOTES_CASTE_THRESHOLD));
            if let Some(value) = confirmed {
                self.logger.log_fill(name, &value, "notes");
                profile.set(name, value);
                filled.push(name);
            }
        }

        filled
    }
}
