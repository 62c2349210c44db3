// src/matching/matcher.rs - Threshold-gated best-candidate selection
use log::debug;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use strsim::{jaro_winkler, normalized_levenshtein};

pub const DEFAULT_MATCH_THRESHOLD: f64 = 80.0;

/// Scores two strings on a 0-100 scale.
pub trait SimilarityScorer: Send + Sync {
    fn name(&self) -> &'static str;

    fn score(&self, query: &str, candidate: &str) -> f64;
}

/// Word-order and duplication insensitive similarity: the token sets of both
/// strings are split into their intersection and the two differences, and the
/// best pairwise character ratio among the recombined strings wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSetScorer;

#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinklerScorer;

#[derive(Debug, Clone, Copy, Default)]
pub struct LevenshteinRatioScorer;

fn tokenize(s: &str) -> BTreeSet<String> {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn char_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    normalized_levenshtein(a, b) * 100.0
}

fn join_tokens<'a>(tokens: impl Iterator<Item = &'a String>) -> String {
    tokens.map(String::as_str).collect::<Vec<_>>().join(" ")
}

impl SimilarityScorer for TokenSetScorer {
    fn name(&self) -> &'static str {
        "token_set"
    }

    fn score(&self, query: &str, candidate: &str) -> f64 {
        let left = tokenize(query);
        let right = tokenize(candidate);
        if left.is_empty() || right.is_empty() {
            return 0.0;
        }

        let shared = join_tokens(left.intersection(&right));
        let only_left = join_tokens(left.difference(&right));
        let only_right = join_tokens(right.difference(&left));

        let combine = |rest: &str| -> String {
            match (shared.is_empty(), rest.is_empty()) {
                (true, _) => rest.to_string(),
                (false, true) => shared.clone(),
                (false, false) => format!("{} {}", shared, rest),
            }
        };
        let with_left = combine(&only_left);
        let with_right = combine(&only_right);

        let mut best = char_ratio(&with_left, &with_right);
        if !shared.is_empty() {
            best = best
                .max(char_ratio(&shared, &with_left))
                .max(char_ratio(&shared, &with_right));
        }
        best
    }
}

impl SimilarityScorer for JaroWinklerScorer {
    fn name(&self) -> &'static str {
        "jaro_winkler"
    }

    fn score(&self, query: &str, candidate: &str) -> f64 {
        jaro_winkler(&query.trim().to_lowercase(), &candidate.trim().to_lowercase()) * 100.0
    }
}

impl SimilarityScorer for LevenshteinRatioScorer {
    fn name(&self) -> &'static str {
        "levenshtein"
    }

    fn score(&self, query: &str, candidate: &str) -> f64 {
        char_ratio(&query.trim().to_lowercase(), &candidate.trim().to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScorerKind {
    #[default]
    TokenSet,
    JaroWinkler,
    Levenshtein,
}

impl ScorerKind {
    pub fn build(&self) -> Arc<dyn SimilarityScorer> {
        match self {
            ScorerKind::TokenSet => Arc::new(TokenSetScorer),
            ScorerKind::JaroWinkler => Arc::new(JaroWinklerScorer),
            ScorerKind::Levenshtein => Arc::new(LevenshteinRatioScorer),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScorerKind::TokenSet => "token_set",
            ScorerKind::JaroWinkler => "jaro_winkler",
            ScorerKind::Levenshtein => "levenshtein",
        }
    }
}

impl FromStr for ScorerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "token_set" | "tokenset" => Ok(ScorerKind::TokenSet),
            "jaro_winkler" | "jarowinkler" => Ok(ScorerKind::JaroWinkler),
            "levenshtein" | "ratio" => Ok(ScorerKind::Levenshtein),
            other => Err(format!("unknown scorer '{}'", other)),
        }
    }
}

impl fmt::Display for ScorerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a [`MatchResult`] was reached.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchMethod {
    /// Case-insensitive equality with a candidate.
    Exact,
    /// Best candidate at or above threshold under the named scorer.
    Approximate(&'static str),
    /// Best candidate scored below threshold under the named scorer.
    BelowThreshold(&'static str),
    EmptyQuery,
    NoCandidates,
}

impl MatchMethod {
    pub fn tag(&self) -> &'static str {
        match self {
            MatchMethod::Exact => "exact",
            MatchMethod::Approximate(_) => "approximate",
            MatchMethod::BelowThreshold(_) => "below_threshold",
            MatchMethod::EmptyQuery => "empty_query",
            MatchMethod::NoCandidates => "no_candidates",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// Accepted candidate, verbatim as it appears in the candidate list.
    pub value: Option<String>,
    /// Score of the best candidate seen, accepted or not.
    pub score: f64,
    pub method: MatchMethod,
}

impl MatchResult {
    fn rejected(method: MatchMethod, score: f64) -> Self {
        Self {
            value: None,
            score,
            method,
        }
    }

    pub fn is_match(&self) -> bool {
        self.value.is_some()
    }

    pub fn into_value(self) -> Option<String> {
        self.value
    }
}

/// Case-insensitive, whitespace-trimmed equality.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Picks the best candidate for a query under a pluggable scorer and accepts it
/// only at or above a threshold. Cloning is cheap; the scorer is shared.
#[derive(Clone)]
pub struct ApproximateMatcher {
    scorer: Arc<dyn SimilarityScorer>,
    threshold: f64,
}

impl Default for ApproximateMatcher {
    fn default() -> Self {
        Self::new(ScorerKind::TokenSet, DEFAULT_MATCH_THRESHOLD)
    }
}

impl fmt::Debug for ApproximateMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApproximateMatcher")
            .field("scorer", &self.scorer.name())
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl ApproximateMatcher {
    pub fn new(kind: ScorerKind, threshold: f64) -> Self {
        Self::with_scorer(kind.build(), threshold)
    }

    pub fn with_scorer(scorer: Arc<dyn SimilarityScorer>, threshold: f64) -> Self {
        Self { scorer, threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn scorer_name(&self) -> &'static str {
        self.scorer.name()
    }

    /// Case-insensitive equality short-circuits to 100 for every scorer.
    pub fn score(&self, query: &str, candidate: &str) -> f64 {
        if eq_ignore_case(query, candidate) {
            return 100.0;
        }
        self.scorer.score(query, candidate)
    }

    /// Best candidate under the scorer, accepted when `score >= threshold`.
    /// Ties keep the earliest candidate. Blank candidates are ignored.
    pub fn match_one<I, S>(&self, query: &str, candidates: I, threshold: f64) -> MatchResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let query = query.trim();
        if query.is_empty() {
            return MatchResult::rejected(MatchMethod::EmptyQuery, 0.0);
        }

        let mut best: Option<(String, f64)> = None;
        for candidate in candidates {
            let candidate = candidate.as_ref();
            if candidate.trim().is_empty() {
                continue;
            }
            let score = self.score(query, candidate);
            let improves = match &best {
                Some((_, best_score)) => score > *best_score,
                None => true,
            };
            if improves {
                best = Some((candidate.to_string(), score));
            }
        }

        let Some((value, score)) = best else {
            return MatchResult::rejected(MatchMethod::NoCandidates, 0.0);
        };

        if score >= threshold {
            let method = if eq_ignore_case(query, &value) {
                MatchMethod::Exact
            } else {
                MatchMethod::Approximate(self.scorer.name())
            };
            MatchResult {
                value: Some(value),
                score,
                method,
            }
        } else {
            debug!(
                "Near miss: '{}' best candidate '{}' scored {:.1} < {:.1}",
                query, value, score, threshold
            );
            MatchResult::rejected(MatchMethod::BelowThreshold(self.scorer.name()), score)
        }
    }

    /// [`Self::match_one`] at the configured threshold.
    pub fn best_match<I, S>(&self, query: &str, candidates: I) -> MatchResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.match_one(query, candidates, self.threshold)
    }

    /// Exact case-insensitive hit first, approximate match second.
    pub fn lookup(&self, query: &str, candidates: &[String], threshold: f64) -> MatchResult {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return MatchResult::rejected(MatchMethod::EmptyQuery, 0.0);
        }
        if let Some(hit) = candidates.iter().find(|c| eq_ignore_case(c, trimmed)) {
            return MatchResult {
                value: Some(hit.clone()),
                score: 100.0,
                method: MatchMethod::Exact,
            };
        }
        self.match_one(trimmed, candidates, threshold)
    }
}
