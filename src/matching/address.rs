// src/matching/address.rs - Multi-step location resolution against the country/state table
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::masters::{DatasetKey, MasterDataset, MasterDatasetCache};
use crate::matching::matcher::{eq_ignore_case, ApproximateMatcher};
use crate::utils::logging::{Component, NormalizationLogger};

pub const DEFAULT_ADDRESS_THRESHOLD: f64 = 60.0;
pub const DEFAULT_PARTIAL_THRESHOLD: f64 = 65.0;
pub const MAX_PARTIAL_CANDIDATES: usize = 10;

static INLINE_POSTAL_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{5,6}\b").expect("valid postal code regex"));

/// Address fragments supplied by the caller. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressInput {
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub birth_place: Option<String>,
    pub zip_code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStep {
    PostalCode,
    AddressText,
    StructuralParse,
    PartialMatch,
}

impl ResolutionStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStep::PostalCode => "postal_code",
            ResolutionStep::AddressText => "address_text",
            ResolutionStep::StructuralParse => "structural_parse",
            ResolutionStep::PartialMatch => "partial_match",
        }
    }
}

/// Location fields drawn from a single table row (or, for the structural
/// step, from the address text itself).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationFields {
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub zip_code: Option<String>,
}

impl LocationFields {
    fn absorb(&mut self, other: LocationFields) {
        fn fill(slot: &mut Option<String>, value: Option<String>) {
            if slot.is_none() {
                *slot = value;
            }
        }
        fill(&mut self.country, other.country);
        fill(&mut self.state, other.state);
        fill(&mut self.city, other.city);
        fill(&mut self.district, other.district);
        fill(&mut self.zip_code, other.zip_code);
    }
}

/// Output of the structural parse of free-text addresses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressComponents {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub row: usize,
    pub score: f64,
    pub fields: HashMap<String, String>,
}

/// What the resolution chain produced, plus how it got there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedAddress {
    pub fields: LocationFields,
    pub steps: Vec<ResolutionStep>,
    pub candidates: Vec<RankedCandidate>,
}

type Strategy = fn(&AddressResolver, &AddressInput, &ResolvedAddress) -> Option<StepOutcome>;

struct StepOutcome {
    fields: LocationFields,
    candidates: Vec<RankedCandidate>,
}

impl From<LocationFields> for StepOutcome {
    fn from(fields: LocationFields) -> Self {
        Self {
            fields,
            candidates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct LocationColumns {
    postal: Vec<usize>,
    country: Option<usize>,
    state: Option<usize>,
    city: Option<usize>,
    district: Option<usize>,
    address_text: Vec<usize>,
    partial_text: Vec<usize>,
}

impl LocationColumns {
    fn detect(dataset: &MasterDataset) -> Self {
        let is_address_text = |c: &str| {
            ["address", "street", "area", "locality", "place"]
                .iter()
                .any(|w| c.contains(w))
        };
        Self {
            postal: dataset.find_columns(|c| ["pin", "zip", "postal"].iter().any(|w| c.contains(w))),
            country: dataset.find_column(|c| c.contains("country")),
            state: dataset.find_column(|c| c.contains("state") && !c.contains("country")),
            city: dataset.find_column(|c| c.contains("city")),
            district: dataset.find_column(|c| c.contains("district")),
            address_text: dataset.find_columns(is_address_text),
            partial_text: dataset.find_columns(|c| is_address_text(c) || c.contains("city")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AddressResolver {
    dataset: Option<Arc<MasterDataset>>,
    columns: Option<LocationColumns>,
    matcher: ApproximateMatcher,
    address_threshold: f64,
    partial_threshold: f64,
}

impl AddressResolver {
    const STRATEGIES: [(ResolutionStep, Strategy); 4] = [
        (ResolutionStep::PostalCode, Self::step_postal_code),
        (ResolutionStep::AddressText, Self::step_address_text),
        (ResolutionStep::StructuralParse, Self::step_structural_parse),
        (ResolutionStep::PartialMatch, Self::step_partial_match),
    ];

    pub fn new(
        dataset: Option<Arc<MasterDataset>>,
        matcher: ApproximateMatcher,
        address_threshold: f64,
        partial_threshold: f64,
    ) -> Self {
        let columns = dataset.as_deref().map(LocationColumns::detect);
        Self {
            dataset,
            columns,
            matcher,
            address_threshold,
            partial_threshold,
        }
    }

    pub fn from_cache(
        cache: &MasterDatasetCache,
        matcher: ApproximateMatcher,
        address_threshold: f64,
        partial_threshold: f64,
    ) -> Self {
        Self::new(
            cache.try_load(DatasetKey::CountryState),
            matcher,
            address_threshold,
            partial_threshold,
        )
    }

    fn table(&self) -> Option<(&MasterDataset, &LocationColumns)> {
        Some((self.dataset.as_deref()?, self.columns.as_ref()?))
    }

    fn row_fields(dataset: &MasterDataset, cols: &LocationColumns, row: usize) -> LocationFields {
        let cell = |col: Option<usize>| col.and_then(|c| dataset.cell(row, c)).map(str::to_string);
        LocationFields {
            country: cell(cols.country),
            state: cell(cols.state),
            city: cell(cols.city),
            district: cell(cols.district),
            zip_code: cols
                .postal
                .iter()
                .find_map(|c| dataset.cell(row, *c))
                .map(str::to_string),
        }
    }

    /// Step 1: exact postal-code equality against any pin/zip/postal column.
    pub fn lookup_by_postal_code(&self, code: &str) -> Option<LocationFields> {
        let code = code.trim();
        if code.is_empty() {
            return None;
        }
        let (dataset, cols) = self.table()?;
        for col in &cols.postal {
            if let Some(row) = (0..dataset.len()).find(|&r| dataset.cell(r, *col) == Some(code)) {
                let mut fields = Self::row_fields(dataset, cols, row);
                fields.zip_code.get_or_insert_with(|| code.to_string());
                return Some(fields);
            }
        }
        None
    }

    /// Step 2: approximate match of the address text against address-like
    /// columns, restricted to rows agreeing with any supplied city or state.
    /// A restriction that leaves no rows falls back to the whole table. The
    /// best score across all address columns wins. Tables without address
    /// columns are searched by city and state equality instead.
    pub fn lookup_by_address_text(
        &self,
        address: &str,
        city: Option<&str>,
        state: Option<&str>,
    ) -> Option<LocationFields> {
        let address = address.trim();
        if address.is_empty() {
            return None;
        }
        let (dataset, cols) = self.table()?;
        if cols.address_text.is_empty() {
            return self.lookup_by_city_state(city, state);
        }
        let mut rows = Self::agreeing_rows(dataset, cols, city, state);
        if rows.is_empty() {
            debug!("No rows agree with the supplied city/state, searching the whole table");
            rows = (0..dataset.len()).collect();
        }

        let mut best: Option<(f64, usize)> = None;
        for col in &cols.address_text {
            let values: Vec<&str> = rows.iter().filter_map(|&r| dataset.cell(r, *col)).collect();
            let result = self.matcher.match_one(address, &values, self.address_threshold);
            let Some(matched) = result.value else {
                continue;
            };
            if best.map_or(true, |(score, _)| result.score > score) {
                if let Some(&row) = rows.iter().find(|&&r| dataset.cell(r, *col) == Some(matched.as_str())) {
                    best = Some((result.score, row));
                }
            }
        }
        let (score, row) = best?;
        debug!("Address text matched row {} ({:.1})", row, score);
        Some(Self::row_fields(dataset, cols, row))
    }

    /// First row whose city and state equal the supplied values, ignoring
    /// case. Needs at least one of the two.
    pub fn lookup_by_city_state(&self, city: Option<&str>, state: Option<&str>) -> Option<LocationFields> {
        let city = city.map(str::trim).filter(|c| !c.is_empty());
        let state = state.map(str::trim).filter(|s| !s.is_empty());
        if city.is_none() && state.is_none() {
            return None;
        }
        let (dataset, cols) = self.table()?;
        let row = *Self::agreeing_rows(dataset, cols, city, state).first()?;
        Some(Self::row_fields(dataset, cols, row))
    }

    fn agreeing_rows(
        dataset: &MasterDataset,
        cols: &LocationColumns,
        city: Option<&str>,
        state: Option<&str>,
    ) -> Vec<usize> {
        let agrees = |row: usize, col: Option<usize>, wanted: Option<&str>| match (col, wanted) {
            (Some(c), Some(w)) => dataset.cell(row, c).map_or(false, |v| eq_ignore_case(v, w)),
            _ => true,
        };
        (0..dataset.len())
            .filter(|&r| agrees(r, cols.city, city) && agrees(r, cols.state, state))
            .collect()
    }

    /// Step 3: pulls a 5-6 digit postal code out of the text, then splits the
    /// text before it on commas. Three or more parts give street, city and
    /// state from the first and last two; two parts give street and city.
    pub fn extract_components(address: &str) -> AddressComponents {
        let mut components = AddressComponents::default();
        let mut remaining = address.trim();
        if let Some(m) = INLINE_POSTAL_CODE.find(remaining) {
            components.zip_code = Some(m.as_str().to_string());
            remaining = &remaining[..m.start()];
        }
        let parts: Vec<&str> = remaining
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        match parts.len() {
            0 => {}
            1 => components.street = Some(parts[0].to_string()),
            2 => {
                components.street = Some(parts[0].to_string());
                components.city = Some(parts[1].to_string());
            }
            n => {
                components.street = Some(parts[0].to_string());
                components.city = Some(parts[n - 2].to_string());
                components.state = Some(parts[n - 1].to_string());
            }
        }
        components
    }

    /// Step 4: scores every row by its best address-like or city column and
    /// returns up to ten rows at or above the partial threshold, best first.
    pub fn rank_partial_matches(&self, partial: &str) -> Vec<RankedCandidate> {
        let partial = partial.trim();
        let Some((dataset, cols)) = self.table() else {
            return Vec::new();
        };
        if partial.is_empty() || cols.partial_text.is_empty() {
            return Vec::new();
        }
        let mut ranked: Vec<RankedCandidate> = (0..dataset.len())
            .filter_map(|row| {
                let best = cols
                    .partial_text
                    .iter()
                    .filter_map(|c| dataset.cell(row, *c))
                    .map(|value| self.matcher.score(partial, value))
                    .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))))?;
                (best >= self.partial_threshold).then(|| RankedCandidate {
                    row,
                    score: best,
                    fields: dataset.row_map(row),
                })
            })
            .collect();
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(MAX_PARTIAL_CANDIDATES);
        ranked
    }

    fn step_postal_code(&self, input: &AddressInput, _: &ResolvedAddress) -> Option<StepOutcome> {
        self.lookup_by_postal_code(input.zip_code.as_deref()?).map(StepOutcome::from)
    }

    fn step_address_text(&self, input: &AddressInput, _: &ResolvedAddress) -> Option<StepOutcome> {
        self.lookup_by_address_text(
            input.address.as_deref()?,
            input.city.as_deref(),
            input.state.as_deref(),
        )
        .map(StepOutcome::from)
    }

    fn step_structural_parse(&self, input: &AddressInput, _: &ResolvedAddress) -> Option<StepOutcome> {
        let zip_code = Self::extract_components(input.address.as_deref()?).zip_code?;
        Some(
            LocationFields {
                zip_code: Some(zip_code),
                ..Default::default()
            }
            .into(),
        )
    }

    fn step_partial_match(&self, input: &AddressInput, resolved: &ResolvedAddress) -> Option<StepOutcome> {
        let current = &resolved.fields;
        let partial = [
            input.address.as_deref(),
            current.city.as_deref().or(input.city.as_deref()),
            current.district.as_deref().or(input.district.as_deref()),
            current.state.as_deref().or(input.state.as_deref()),
            input.birth_place.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        // A weak match only supplies the postal code; the other fields of its
        // row stay with the candidates.
        let candidates = self.rank_partial_matches(&partial);
        let (dataset, cols) = self.table()?;
        let zip_code = Self::row_fields(dataset, cols, candidates.first()?.row).zip_code?;
        Some(StepOutcome {
            fields: LocationFields {
                zip_code: Some(zip_code),
                ..Default::default()
            },
            candidates,
        })
    }

    /// Runs the steps in order until a postal code is known. Each step only
    /// fills fields that earlier steps left empty.
    pub fn resolve(&self, input: &AddressInput) -> ResolvedAddress {
        let logger = NormalizationLogger::new(Component::Address);
        let mut resolved = ResolvedAddress::default();
        for (step, strategy) in Self::STRATEGIES {
            if resolved.fields.zip_code.is_some() {
                break;
            }
            if let Some(outcome) = strategy(self, input, &resolved) {
                logger.log_phase(step.as_str(), Some("produced a result"));
                resolved.fields.absorb(outcome.fields);
                if resolved.candidates.is_empty() {
                    resolved.candidates = outcome.candidates;
                }
                resolved.steps.push(step);
            }
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> AddressResolver {
        let table = MasterDataset::from_rows(
            DatasetKey::CountryState,
            &["Country", "State", "District", "City", "Area", "Pincode"],
            &[
                &["India", "Rajasthan", "Jaipur", "Jaipur", "Malviya Nagar", "302017"],
                &["India", "Rajasthan", "Ajmer", "Kishangarh", "Madanganj", "305801"],
                &["India", "Karnataka", "Bangalore Urban", "Bangalore", "Koramangala", "560034"],
            ],
        );
        AddressResolver::new(
            Some(Arc::new(table)),
            ApproximateMatcher::default(),
            DEFAULT_ADDRESS_THRESHOLD,
            DEFAULT_PARTIAL_THRESHOLD,
        )
    }

    #[test]
    fn test_postal_code_lookup_returns_row() {
        let fields = resolver().lookup_by_postal_code("560034").unwrap();
        assert_eq!(fields.state.as_deref(), Some("Karnataka"));
        assert_eq!(fields.city.as_deref(), Some("Bangalore"));
        assert_eq!(fields.district.as_deref(), Some("Bangalore Urban"));
        assert!(resolver().lookup_by_postal_code("999999").is_none());
    }

    #[test]
    fn test_address_text_respects_supplied_state() {
        let r = resolver();
        let fields = r
            .lookup_by_address_text("Koramangala 4th block", None, Some("karnataka"))
            .unwrap();
        assert_eq!(fields.zip_code.as_deref(), Some("560034"));
        assert!(r
            .lookup_by_address_text("Koramangala 4th block", None, Some("Rajasthan"))
            .is_none());
    }

    #[test]
    fn test_address_text_unknown_state_searches_whole_table() {
        let fields = resolver()
            .lookup_by_address_text("Koramangala 4th block", None, Some("Goa"))
            .unwrap();
        assert_eq!(fields.zip_code.as_deref(), Some("560034"));
        assert_eq!(fields.state.as_deref(), Some("Karnataka"));
    }

    #[test]
    fn test_address_text_keeps_best_score_across_columns() {
        let table = MasterDataset::from_rows(
            DatasetKey::CountryState,
            &["State", "City", "Area", "Locality", "Pincode"],
            &[
                &["Rajasthan", "Jaipur", "Civil Line", "Bani Park", "302016"],
                &["Rajasthan", "Jaipur", "Station Road", "Civil Lines", "302006"],
            ],
        );
        let r = AddressResolver::new(Some(Arc::new(table)), ApproximateMatcher::default(), 60.0, 65.0);
        let fields = r.lookup_by_address_text("Civil Lines", None, None).unwrap();
        assert_eq!(fields.zip_code.as_deref(), Some("302006"));
    }

    #[test]
    fn test_table_without_address_columns_uses_city_and_state() {
        let table = MasterDataset::from_rows(
            DatasetKey::CountryState,
            &["Country", "State", "City", "Pincode"],
            &[
                &["India", "Rajasthan", "Jaipur", "302001"],
                &["India", "Rajasthan", "Kota", "324001"],
            ],
        );
        let r = AddressResolver::new(Some(Arc::new(table)), ApproximateMatcher::default(), 60.0, 65.0);
        let fields = r
            .lookup_by_address_text("12 Station Road", Some("kota"), None)
            .unwrap();
        assert_eq!(fields.zip_code.as_deref(), Some("324001"));
        assert_eq!(fields.state.as_deref(), Some("Rajasthan"));
        assert!(r.lookup_by_address_text("12 Station Road", None, None).is_none());
        assert!(r.lookup_by_city_state(Some("Udaipur"), None).is_none());
    }

    #[test]
    fn test_partial_match_only_supplies_postal_code() {
        let input = AddressInput {
            state: Some("Karnataka".into()),
            birth_place: Some("Kishangarh".into()),
            ..Default::default()
        };
        let resolved = resolver().resolve(&input);
        assert_eq!(resolved.steps, vec![ResolutionStep::PartialMatch]);
        assert_eq!(resolved.fields.zip_code.as_deref(), Some("305801"));
        assert_eq!(resolved.fields.state, None);
        assert_eq!(resolved.fields.city, None);
        assert_eq!(
            resolved.candidates[0].fields.get("state").map(String::as_str),
            Some("Rajasthan")
        );
    }

    #[test]
    fn test_extract_components_three_parts() {
        let c = AddressResolver::extract_components("12 MG Road, Indiranagar, Bangalore, Karnataka 560038");
        assert_eq!(c.zip_code.as_deref(), Some("560038"));
        assert_eq!(c.street.as_deref(), Some("12 MG Road"));
        assert_eq!(c.city.as_deref(), Some("Bangalore"));
        assert_eq!(c.state.as_deref(), Some("Karnataka"));
    }

    #[test]
    fn test_extract_components_two_parts_and_no_zip() {
        let c = AddressResolver::extract_components("Near Bus Stand, Kota");
        assert_eq!(c.zip_code, None);
        assert_eq!(c.street.as_deref(), Some("Near Bus Stand"));
        assert_eq!(c.city.as_deref(), Some("Kota"));
        assert_eq!(c.state, None);
    }

    #[test]
    fn test_partial_ranking_is_capped_and_sorted() {
        let ranked = resolver().rank_partial_matches("Kishangarh");
        assert!(!ranked.is_empty());
        assert!(ranked.len() <= MAX_PARTIAL_CANDIDATES);
        assert_eq!(ranked[0].fields.get("pincode").map(String::as_str), Some("305801"));
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_chain_stops_once_postal_code_known() {
        let input = AddressInput {
            address: Some("Koramangala".into()),
            zip_code: Some("302017".into()),
            ..Default::default()
        };
        let resolved = resolver().resolve(&input);
        assert_eq!(resolved.steps, vec![ResolutionStep::PostalCode]);
        assert_eq!(resolved.fields.city.as_deref(), Some("Jaipur"));
    }

    #[test]
    fn test_chain_falls_through_to_structural_parse() {
        let input = AddressInput {
            address: Some("Flat 4, Sunrise Apartments, Pune 411001".into()),
            ..Default::default()
        };
        let resolved = resolver().resolve(&input);
        assert_eq!(resolved.fields.zip_code.as_deref(), Some("411001"));
        assert!(resolved.steps.contains(&ResolutionStep::StructuralParse));
        assert_eq!(resolved.fields.state, None);
    }

    #[test]
    fn test_without_dataset_only_structural_step_runs() {
        let r = AddressResolver::new(None, ApproximateMatcher::default(), 60.0, 65.0);
        let input = AddressInput {
            address: Some("Civil Lines, Jaipur 302006".into()),
            zip_code: Some("302006".into()),
            ..Default::default()
        };
        let resolved = r.resolve(&input);
        assert_eq!(resolved.steps, vec![ResolutionStep::StructuralParse]);
        assert!(r.rank_partial_matches("Jaipur").is_empty());
    }
}
