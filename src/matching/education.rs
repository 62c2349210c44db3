// src/matching/education.rs - Degree/specialization split and degree confirmation
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use crate::masters::{DatasetKey, MasterDataset, MasterDatasetCache};
use crate::matching::matcher::{ApproximateMatcher, MatchMethod, MatchResult};
use crate::utils::logging::{Component, NormalizationLogger};

/// `B.Tech (Computer Science)` style input.
static PARENTHESIZED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z.]+)\s*\(([^)]+)\)$").expect("valid education regex"));

const SPECIALIZATION_ABBREVIATIONS: [(&str, &str); 10] = [
    ("IT", "Information Technology"),
    ("CS", "Computer Science"),
    ("CSE", "Computer Science"),
    ("ECE", "Electronics and Communication"),
    ("ME", "Mechanical Engineering"),
    ("CE", "Civil Engineering"),
    ("EEE", "Electrical and Electronics"),
    ("HR", "Human Resources"),
    ("BM", "Business Management"),
    ("FM", "Financial Management"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEducation {
    /// Degree as stored in the qualification table; absent unless confirmed.
    pub degree: Option<String>,
    pub specialization: Option<String>,
    pub degree_match: MatchResult,
}

/// Expands a known abbreviation (case-insensitive); anything else is returned
/// trimmed and unchanged.
pub fn expand_specialization(raw: &str) -> String {
    let trimmed = raw.trim();
    SPECIALIZATION_ABBREVIATIONS
        .iter()
        .find(|(abbr, _)| abbr.eq_ignore_ascii_case(trimmed))
        .map(|(_, full)| full.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

fn alphanumeric_len(s: &str) -> usize {
    s.chars().filter(|c| c.is_alphanumeric()).count()
}

/// Shape-only split into (degree text, specialization text). A leading
/// fragment such as `B.` or `M` is joined with the next word, so `B. Com`
/// and `B Com` both yield a two-part degree.
pub fn split_education(raw: &str) -> Option<(String, Option<String>)> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    if let Some(caps) = PARENTHESIZED.captures(text) {
        return Some((caps[1].to_string(), Some(caps[2].trim().to_string())));
    }
    let mut words = text.split_whitespace();
    let mut degree = words.next()?.to_string();
    if degree.ends_with('.') || alphanumeric_len(&degree) < 2 {
        if let Some(next) = words.next() {
            if !degree.ends_with('.') {
                degree.push(' ');
            }
            degree.push_str(next);
        }
    }
    let rest = words.collect::<Vec<_>>().join(" ");
    Some((degree, (!rest.is_empty()).then_some(rest)))
}

#[derive(Debug, Clone)]
pub struct EducationParser {
    qualifications: Option<Arc<MasterDataset>>,
    matcher: ApproximateMatcher,
}

impl EducationParser {
    pub fn new(qualifications: Option<Arc<MasterDataset>>, matcher: ApproximateMatcher) -> Self {
        Self {
            qualifications,
            matcher,
        }
    }

    pub fn from_cache(cache: &MasterDatasetCache, matcher: ApproximateMatcher) -> Self {
        Self::new(cache.try_load(DatasetKey::Qualification), matcher)
    }

    /// Confirms a degree against the qualification table: exact first, then
    /// approximate at the matcher threshold.
    pub fn lookup_degree(&self, degree: &str) -> MatchResult {
        let candidates = self
            .qualifications
            .as_deref()
            .map(|table| table.preferred_values("qualification"))
            .unwrap_or_default();
        if candidates.is_empty() {
            return MatchResult {
                value: None,
                score: 0.0,
                method: MatchMethod::NoCandidates,
            };
        }
        self.matcher
            .lookup(degree, &candidates, self.matcher.threshold())
    }

    pub fn parse(&self, raw: &str) -> ParsedEducation {
        let Some((degree_text, specialization)) = split_education(raw) else {
            return ParsedEducation {
                degree: None,
                specialization: None,
                degree_match: MatchResult {
                    value: None,
                    score: 0.0,
                    method: MatchMethod::EmptyQuery,
                },
            };
        };

        // one letter is a prefix of too many degrees to confirm any of them
        let degree_match = if alphanumeric_len(&degree_text) < 2 {
            MatchResult {
                value: None,
                score: 0.0,
                method: MatchMethod::EmptyQuery,
            }
        } else {
            self.lookup_degree(&degree_text)
        };
        if !degree_match.is_match() {
            NormalizationLogger::new(Component::Education).log_no_match(
                "education",
                &degree_text,
                degree_match.score,
            );
        }
        ParsedEducation {
            degree: degree_match.value.clone(),
            specialization: specialization.as_deref().map(expand_specialization),
            degree_match,
        }
    }
}
