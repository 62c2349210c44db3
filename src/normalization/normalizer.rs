// src/normalization/normalizer.rs - Raw extractor output to canonical profile
use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use log::debug;
use once_cell::sync::OnceCell;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

use crate::masters::{DatasetKey, MasterDatasetCache};
use crate::matching::address::{AddressInput, AddressResolver};
use crate::matching::caste::{CasteField, CasteResolver};
use crate::matching::education::EducationParser;
use crate::matching::gender::GenderInferencer;
use crate::matching::matcher::{eq_ignore_case, ApproximateMatcher};
use crate::models::profile::{CanonicalProfile, RawProfile};
use crate::normalization::enrichment::NotesEnricher;
use crate::normalization::helpers::{
    age_from_dob, clean_str, format_date, height_keys_agree, is_institution_like,
    normalize_age, normalize_birth_time, normalize_date, normalize_height_format, parse_name,
    summarize_about_yourself,
};
use crate::normalization::schema::load_schema;
use crate::utils::config::NormalizerConfig;
use crate::utils::env::load_env;
use crate::utils::logging::{Component, NormalizationLogger};
use crate::validation::field_validator::{
    FieldConstraintValidator, MANGLIK_VALUES, MARITAL_STATUS_VALUES,
};
use crate::validation::phone::PhoneNormalizer;
use crate::validation::postal::{extract_postal_code, is_address_like};

/// Common spellings mapped to the canonical candidate that is then confirmed
/// against the reference table. Keys are in [`variant_key`] form.
const MARITAL_VARIANTS: &[(&str, &str)] = &[
    ("single", "Single"),
    ("unmarried", "Un-Married"),
    ("un married", "Un-Married"),
    ("not married", "Un-Married"),
    ("never married", "Un-Married"),
    ("married", "Married"),
    ("divorced", "Divorced"),
    ("divorcee", "Divorced"),
    ("awaiting divorce", "Awaiting Divorce"),
    ("divorce awaited", "Awaiting Divorce"),
    ("divorce pending", "Awaiting Divorce"),
    ("separated", "Separated"),
    ("widowed", "Widowed"),
    ("widow", "Widow"),
    ("widower", "Widower"),
    ("committed", "Committed"),
];

const MANGLIK_VARIANTS: &[(&str, &str)] = &[
    ("yes", "Yes"),
    ("y", "Yes"),
    ("true", "Yes"),
    ("manglik", "Yes"),
    ("mangalik", "Yes"),
    ("no", "No"),
    ("n", "No"),
    ("false", "No"),
    ("non manglik", "No"),
    ("nonmanglik", "No"),
    ("not manglik", "No"),
    ("dont know", "Don't Know"),
    ("do not know", "Don't Know"),
    ("not sure", "Don't Know"),
    ("unknown", "Don't Know"),
];

/// Lowercase, apostrophes dropped, other punctuation folded to single spaces.
fn variant_key(raw: &str) -> String {
    let folded: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| *c != '\'' && *c != '\u{2019}')
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn canonical_variant(raw: &str, variants: &[(&str, &'static str)]) -> Option<&'static str> {
    let key = variant_key(raw);
    variants
        .iter()
        .find(|(variant, _)| *variant == key)
        .map(|(_, canonical)| *canonical)
}

/// A normalized profile plus one line per field that was rejected or
/// flagged along the way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizationReport {
    pub profile: CanonicalProfile,
    pub warnings: Vec<String>,
}

/// Working state of one normalization call.
struct Pass<'a> {
    raw: &'a RawProfile,
    out: CanonicalProfile,
    warnings: Vec<String>,
    logger: NormalizationLogger,
}

impl<'a> Pass<'a> {
    fn wants(&self, field: &str) -> bool {
        self.out.contains_field(field)
    }
}

/// Per-call resolvers built from the shared cache.
struct Resolvers {
    caste: CasteResolver,
    education: EducationParser,
    address: AddressResolver,
}

/// Turns loosely keyed extractor output into a fixed-schema profile, using
/// the shared reference tables. Safe to share across threads; every call is
/// independent and only reads the cache.
pub struct ProfileNormalizer {
    cache: Arc<MasterDatasetCache>,
    config: NormalizerConfig,
    matcher: ApproximateMatcher,
    phone: PhoneNormalizer,
    validator: FieldConstraintValidator,
    gender: GenderInferencer,
    schema: OnceCell<Vec<String>>,
}

impl ProfileNormalizer {
    pub fn new(cache: Arc<MasterDatasetCache>, config: NormalizerConfig) -> Self {
        let matcher = ApproximateMatcher::new(config.scorer, config.match_threshold);
        let phone = PhoneNormalizer::new(&config.phone_country_code);
        let validator = FieldConstraintValidator::new(phone.clone());
        Self {
            cache,
            config,
            matcher,
            phone,
            validator,
            gender: GenderInferencer::new(),
            schema: OnceCell::new(),
        }
    }

    /// Reads reference tables from `config.master_dir`.
    pub fn from_config(config: NormalizerConfig) -> Self {
        let cache = Arc::new(MasterDatasetCache::from_dir(config.master_dir.clone()));
        Self::new(cache, config)
    }

    /// Loads `.env`, reads the configuration from the environment and logs it.
    pub fn from_env() -> Self {
        load_env();
        let config = NormalizerConfig::from_env();
        config.log_config();
        Self::from_config(config)
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<MasterDatasetCache> {
        &self.cache
    }

    pub fn matcher(&self) -> &ApproximateMatcher {
        &self.matcher
    }

    /// Output field list, resolved once per normalizer.
    pub fn schema(&self) -> &[String] {
        self.schema.get_or_init(|| load_schema(&self.cache))
    }

    pub fn normalize(&self, raw: &RawProfile) -> CanonicalProfile {
        self.normalize_with_report(raw).profile
    }

    pub fn normalize_json(&self, value: &Value) -> CanonicalProfile {
        self.normalize(&RawProfile::from_json(value))
    }

    /// Parses a JSON object and normalizes it.
    pub fn normalize_json_str(&self, text: &str) -> Result<NormalizationReport> {
        let value: Value = serde_json::from_str(text).context("raw profile is not valid JSON")?;
        if !value.is_object() {
            bail!("raw profile must be a JSON object");
        }
        Ok(self.normalize_with_report(&RawProfile::from_json(&value)))
    }

    pub fn normalize_with_report(&self, raw: &RawProfile) -> NormalizationReport {
        self.normalize_on(raw, Local::now().date_naive())
    }

    fn resolvers(&self) -> Resolvers {
        Resolvers {
            caste: CasteResolver::from_cache(&self.cache, self.matcher.clone()),
            education: EducationParser::from_cache(&self.cache, self.matcher.clone()),
            address: AddressResolver::from_cache(
                &self.cache,
                self.matcher.clone(),
                self.config.address_threshold,
                self.config.partial_address_threshold,
            ),
        }
    }

    /// Normalization with an explicit "today" for age computation.
    pub fn normalize_on(&self, raw: &RawProfile, today: NaiveDate) -> NormalizationReport {
        let mut pass = Pass {
            raw,
            out: CanonicalProfile::empty(self.schema()),
            warnings: Vec::new(),
            logger: NormalizationLogger::new(Component::Normalizer),
        };
        pass.logger.log_start(raw.len(), pass.out.schema().len());
        let resolvers = self.resolvers();

        self.normalize_identity(&mut pass, today);
        self.normalize_enums(&mut pass);
        self.normalize_community(&mut pass, &resolvers.caste);
        self.normalize_career(&mut pass, &resolvers.education);
        self.normalize_height(&mut pass);
        self.normalize_location(&mut pass, &resolvers.address);
        self.normalize_contacts(&mut pass);
        self.normalize_notes(&mut pass, &resolvers);

        pass.logger.log_phase("validation", None);
        let report = self.validator.sanitize(pass.out);
        let mut warnings = pass.warnings;
        warnings.extend(report.warnings);

        pass.logger.log_completion(
            report.profile.populated_count(),
            report.profile.schema().len(),
            warnings.len(),
        );
        NormalizationReport {
            profile: report.profile,
            warnings,
        }
    }

    fn normalize_identity(&self, pass: &mut Pass, today: NaiveDate) {
        pass.logger.log_phase("identity", None);
        let raw = pass.raw;

        let full_name = raw.lookup("full_name").or_else(|| {
            let parts: Vec<String> = [raw.lookup("first_name"), raw.lookup("last_name")]
                .into_iter()
                .flatten()
                .collect();
            clean_str(&parts.join(" "))
        });
        let (first, last) = full_name
            .as_deref()
            .map(parse_name)
            .unwrap_or((None, None));
        pass.out.set_opt("full_name", full_name);
        pass.out.set_opt("first_name", raw.lookup("first_name").or(first));
        pass.out.set_opt("last_name", raw.lookup("last_name").or(last));

        let dob = raw.lookup("date_of_birth").and_then(|d| normalize_date(&d));
        pass.out.set_opt("date_of_birth", dob.map(format_date));
        let age = raw
            .lookup("age")
            .and_then(|a| normalize_age(&a))
            .or_else(|| dob.and_then(|d| age_from_dob(d, today)));
        if let Some(age) = age {
            pass.out.set("age", age);
        }

        if let Some(time) = raw.lookup("birth_time") {
            pass.out.set_opt("birth_time", normalize_birth_time(&time).or(Some(time)));
        }
        pass.out.set_opt("birth_place", raw.lookup("birth_place"));
        pass.out.set_opt("religion", raw.lookup("religion"));

        if let Some(gender) = self.gender.infer(raw) {
            pass.out.set("gender", gender.as_str());
        }
    }

    /// Strict enum: variant table, then table confirmation, then the
    /// canonical allow-list. Any miss leaves the field absent.
    fn resolve_enum(
        &self,
        pass: &mut Pass,
        field: &str,
        key: DatasetKey,
        variants: &[(&str, &'static str)],
        allowed: &'static [&'static str],
    ) -> Option<&'static str> {
        let raw_value = pass.raw.lookup(field)?;
        let Some(dataset) = self.cache.try_load(key) else {
            pass.logger.log_degraded(field, key.as_str());
            return None;
        };
        let candidate = canonical_variant(&raw_value, variants).unwrap_or(raw_value.as_str());
        let values = dataset.preferred_values(field.split('_').next().unwrap_or(field));
        let result = self
            .matcher
            .lookup(candidate, &values, self.config.match_threshold);
        let Some(matched) = result.value.as_deref() else {
            pass.logger.log_no_match(field, &raw_value, result.score);
            return None;
        };

        let canonical = allowed
            .iter()
            .copied()
            .find(|value| eq_ignore_case(value, matched))
            .or_else(|| canonical_variant(matched, variants).filter(|v| allowed.contains(v)));
        match canonical {
            Some(value) => {
                pass.logger
                    .log_match(field, &raw_value, value, result.score, result.method.tag());
                Some(value)
            }
            None => {
                let reason = format!("'{}' is not an accepted value", matched);
                pass.logger.log_rejection(field, &reason);
                pass.warnings.push(format!("{}: {}", field, reason));
                None
            }
        }
    }

    fn normalize_enums(&self, pass: &mut Pass) {
        pass.logger.log_phase("enumerations", None);
        if pass.wants("marital_status") {
            let value = self.resolve_enum(
                pass,
                "marital_status",
                DatasetKey::MaritalStatus,
                MARITAL_VARIANTS,
                MARITAL_STATUS_VALUES,
            );
            pass.out.set_opt("marital_status", value.map(str::to_string));
        }
        if pass.wants("manglik") {
            let value = self.resolve_enum(
                pass,
                "manglik",
                DatasetKey::Manglik,
                MANGLIK_VARIANTS,
                MANGLIK_VALUES,
            );
            pass.out.set_opt("manglik", value.map(str::to_string));
        }
    }

    fn normalize_community(&self, pass: &mut Pass, caste: &CasteResolver) {
        pass.logger.log_phase("community", None);
        let raw = pass.raw;
        if !caste.is_available() {
            if raw.lookup_any(&["gotra", "sakha", "jaati", "caste", "community"]).is_some() {
                pass.logger.log_degraded("caste", DatasetKey::Caste.as_str());
            }
            return;
        }

        if let Some(value) = raw.lookup_any(&["gotra", "sakha", "jaati", "caste", "community"]) {
            if let Some(record) = caste.resolve(&value) {
                pass.logger.log_match(
                    "caste",
                    &value,
                    record.caste.as_deref().unwrap_or("-"),
                    record.score,
                    record.method.tag(),
                );
                for field in [CasteField::Jaati, CasteField::Caste, CasteField::Gotra, CasteField::Sakha] {
                    pass.out
                        .set_opt(field.as_str(), record.get(field).map(str::to_string));
                }
                return;
            }
        }

        // no single row matched: confirm each level on its own column
        let threshold = caste.threshold();
        let per_field: [(CasteField, &[&str]); 4] = [
            (CasteField::Jaati, &["jaati", "caste", "community"]),
            (CasteField::Caste, &["caste", "community"]),
            (CasteField::Gotra, &["gotra"]),
            (CasteField::Sakha, &["sakha"]),
        ];
        for (field, keys) in per_field {
            if let Some(value) = raw.lookup_any(keys) {
                let matched = caste.match_field(field, &value, threshold);
                if matched.is_none() {
                    pass.logger.log_no_match(field.as_str(), &value, 0.0);
                }
                pass.out.set_opt(field.as_str(), matched);
            }
        }
    }

    fn normalize_career(&self, pass: &mut Pass, education: &EducationParser) {
        pass.logger.log_phase("career", None);
        let raw = pass.raw;

        if let Some(text) = raw.lookup("education") {
            let parsed = education.parse(&text);
            match parsed.degree.as_deref() {
                Some(degree) => pass.logger.log_match(
                    "education",
                    &text,
                    degree,
                    parsed.degree_match.score,
                    parsed.degree_match.method.tag(),
                ),
                None => pass
                    .logger
                    .log_no_match("education", &text, parsed.degree_match.score),
            }
            pass.out.set_opt("education", parsed.degree);
            pass.out.set_opt("specialization", parsed.specialization);
        }
        pass.out.fill("specialization", raw.lookup("specialization"));

        if let Some(occupation) = raw.lookup("occupation") {
            let value = match self.cache.try_load(DatasetKey::Occupation) {
                Some(dataset) => {
                    let candidates = dataset.preferred_values("occupation");
                    let result = self
                        .matcher
                        .lookup(&occupation, &candidates, self.config.match_threshold);
                    result.value.unwrap_or_else(|| occupation.clone())
                }
                None => occupation,
            };
            pass.out.set("occupation", value);
        }
        pass.out.set_opt("annual_income", raw.lookup("annual_income"));
    }

    fn normalize_height(&self, pass: &mut Pass) {
        let Some(raw_height) = pass.raw.lookup("height") else {
            return;
        };
        let from_table = self.cache.try_load(DatasetKey::Height).and_then(|dataset| {
            dataset
                .preferred_values("height")
                .into_iter()
                .find(|value| height_keys_agree(value, &raw_height))
        });
        let value = from_table.or_else(|| normalize_height_format(&raw_height));
        if value.is_none() {
            pass.warnings
                .push(format!("height: could not interpret '{}'", raw_height));
        }
        pass.out.set_opt("height", value);
    }

    /// Country and state straight from the raw profile: country against the
    /// distinct country values, state only among that country's states.
    fn match_country_state(
        &self,
        country: Option<&str>,
        state: Option<&str>,
    ) -> (Option<String>, Option<String>) {
        let Some(dataset) = self.cache.try_load(DatasetKey::CountryState) else {
            return (None, None);
        };
        let country_col = dataset.find_column(|c| c.contains("country"));
        let state_col = dataset.find_column(|c| c.contains("state") && !c.contains("country"));

        let matched_country = match (country, country_col) {
            (Some(country), Some(col)) => {
                let mut values = dataset.column_values(col);
                let mut seen = HashSet::new();
                values.retain(|v| seen.insert(v.to_lowercase()));
                self.matcher
                    .lookup(country, &values, self.config.match_threshold)
                    .into_value()
            }
            _ => None,
        };

        let matched_state = match (state, state_col) {
            (Some(state), Some(col)) => {
                let mut values: Vec<String> = (0..dataset.len())
                    .filter(|&row| match (&matched_country, country_col) {
                        (Some(c), Some(cc)) => dataset
                            .cell(row, cc)
                            .map_or(false, |v| eq_ignore_case(v, c)),
                        _ => true,
                    })
                    .filter_map(|row| dataset.cell(row, col).map(str::to_string))
                    .collect();
                let mut seen = HashSet::new();
                values.retain(|v| seen.insert(v.to_lowercase()));
                self.matcher
                    .lookup(state, &values, self.config.match_threshold)
                    .into_value()
            }
            _ => None,
        };
        (matched_country, matched_state)
    }

    fn normalize_location(&self, pass: &mut Pass, address: &AddressResolver) {
        pass.logger.log_phase("location", None);
        let raw = pass.raw;

        let address_text = raw.lookup("address");
        if let Some(text) = address_text.as_deref() {
            if let Err(reason) = is_address_like(text) {
                pass.warnings.push(format!("address: {}", reason));
            }
        }
        pass.out.set_opt("address", address_text.clone());
        pass.out.set_opt("village", raw.lookup("village"));
        pass.out.set_opt("tahsil", raw.lookup("tahsil"));

        let raw_country = raw.lookup("country");
        let raw_city = raw.lookup("city");
        let raw_district = raw.lookup("district");
        let raw_state = raw.lookup("state").filter(|state| {
            let institutional = is_institution_like(state);
            if institutional {
                let reason = format!("'{}' looks like an institution or address", state);
                pass.logger.log_rejection("state", &reason);
                pass.warnings.push(format!("state: {}", reason));
            }
            !institutional
        });
        let raw_zip = raw
            .lookup("zip_code")
            .map(|zip| extract_postal_code(&zip).unwrap_or(zip));

        let resolved = address.resolve(&AddressInput {
            address: address_text,
            city: raw_city.clone(),
            state: raw_state.clone(),
            district: raw_district.clone(),
            birth_place: pass.out.get_str("birth_place").map(str::to_string),
            zip_code: raw_zip.clone(),
        });
        let fields = resolved.fields;
        for (field, value) in [
            ("country", fields.country),
            ("state", fields.state),
            ("city", fields.city),
            ("district", fields.district),
            ("zip_code", fields.zip_code),
        ] {
            if let Some(value) = value {
                if pass.out.fill(field, Some(value.clone())) {
                    pass.logger.log_fill(field, &value, "address resolution");
                }
            }
        }

        let (country, state) = self.match_country_state(raw_country.as_deref(), raw_state.as_deref());
        pass.out.fill("country", country);
        pass.out.fill("state", state);
        pass.out.fill("city", raw_city);
        pass.out.fill("district", raw_district);
        pass.out.fill("zip_code", raw_zip);

        if raw_country.is_none() {
            pass.out.fill("country", self.config.default_country.clone());
        }
        let native_state = raw
            .lookup("native_state")
            .or_else(|| self.config.default_native_state.clone());
        pass.out.fill("native_state", native_state);
    }

    fn normalize_contacts(&self, pass: &mut Pass) {
        pass.logger.log_phase("contacts", None);
        let raw = pass.raw;
        pass.out.set_opt("email_id", raw.lookup("email_id"));

        if let Some(mobile) = raw.lookup("mobile_no") {
            let canonical = self.phone.normalize(&mobile);
            if canonical.is_none() {
                pass.warnings
                    .push(format!("mobile_no: '{}' is not a valid mobile number", mobile));
            }
            pass.out.set_opt("mobile_no", canonical);
        }
        if let Some(phone) = raw.lookup("phone_no") {
            let value = self.phone.normalize(&phone).unwrap_or(phone);
            pass.out.set("phone_no", value);
        }
    }

    fn normalize_notes(&self, pass: &mut Pass, resolvers: &Resolvers) {
        let Some(notes) = pass.raw.lookup("notes") else {
            return;
        };
        pass.logger.log_phase("notes", None);
        let filled = NotesEnricher::new(&resolvers.education, &resolvers.caste)
            .enrich(&mut pass.out, &notes);
        if !filled.is_empty() {
            debug!("Notes filled {:?}", filled);
        }
        pass.out
            .set_opt("about_yourself_summary", summarize_about_yourself(&notes));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::masters::{InMemorySource, MasterDataset};
    use crate::normalization::schema::DEFAULT_SCHEMA;
    use serde_json::json;
    use std::thread;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn full_source() -> InMemorySource {
        InMemorySource::new()
            .with(MasterDataset::from_rows(
                DatasetKey::MaritalStatus,
                &["MaritalStatus"],
                &[&["Single"], &["Married"], &["Un-Married"], &["Divorced"], &["Widow"], &["Engaged"]],
            ))
            .with(MasterDataset::from_rows(
                DatasetKey::Manglik,
                &["Manglik"],
                &[&["Yes"], &["No"], &["Don't Know"]],
            ))
            .with(MasterDataset::from_rows(
                DatasetKey::Caste,
                &["Jaati", "Caste", "Gotra", "Sakha"],
                &[
                    &["Brahmin", "Pareek", "Bharadwaj", "Madhyandini"],
                    &["Brahmin", "Gaur", "Kashyap", "Kauthumi"],
                ],
            ))
            .with(MasterDataset::from_rows(
                DatasetKey::Qualification,
                &["Qualification"],
                &[&["B.Tech"], &["MBA"], &["B.Com"], &["MBBS"]],
            ))
            .with(MasterDataset::from_rows(
                DatasetKey::Occupation,
                &["Occupation"],
                &[&["Software Engineer"], &["Teacher"], &["Doctor"]],
            ))
            .with(MasterDataset::from_rows(
                DatasetKey::Height,
                &["Height"],
                &[&["5ft 2in (157 cms)"], &["5ft 4in (163 cms)"], &["5ft 11in (180 cms)"]],
            ))
            .with(MasterDataset::from_rows(
                DatasetKey::CountryState,
                &["Country", "State", "District", "City", "Area", "Pincode"],
                &[
                    &["India", "Rajasthan", "Jaipur", "Jaipur", "Malviya Nagar", "302017"],
                    &["India", "Karnataka", "Bangalore Urban", "Bangalore", "Koramangala", "560034"],
                    &["Nepal", "Bagmati", "Kathmandu", "Kathmandu", "Thamel", "44600"],
                ],
            ))
    }

    fn normalizer_with(source: InMemorySource, config: NormalizerConfig) -> ProfileNormalizer {
        init_logger();
        ProfileNormalizer::new(Arc::new(MasterDatasetCache::new(source)), config)
    }

    fn normalizer() -> ProfileNormalizer {
        normalizer_with(full_source(), NormalizerConfig::default())
    }

    fn normalize(n: &ProfileNormalizer, raw: Value) -> NormalizationReport {
        n.normalize_on(&RawProfile::from_json(&raw), today())
    }

    fn key_set(profile: &CanonicalProfile) -> HashSet<String> {
        profile.keys().map(str::to_string).collect()
    }

    #[test]
    fn test_minimal_profile_end_to_end() {
        let report = normalize(
            &normalizer(),
            json!({
                "full_name": "Priya Sharma",
                "gender": "f",
                "marital_status": "single",
                "mobile_no": "9876543210",
                "manglik": "y"
            }),
        );
        let p = &report.profile;
        assert_eq!(p.get_str("full_name"), Some("Priya Sharma"));
        assert_eq!(p.get_str("first_name"), Some("Priya"));
        assert_eq!(p.get_str("last_name"), Some("Sharma"));
        assert_eq!(p.get_str("gender"), Some("Female"));
        assert_eq!(p.get_str("marital_status"), Some("Single"));
        assert_eq!(p.get_str("manglik"), Some("Yes"));
        assert_eq!(p.get_str("mobile_no"), Some("+91 9876543210"));
        assert_eq!(p.populated_count(), 7);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn test_gender_inferred_from_name_end_to_end() {
        let report = normalize(
            &normalizer(),
            json!({"full_name": "Priya Sharma", "marital_status": "single", "manglik": "y"}),
        );
        let p = &report.profile;
        assert_eq!(p.get_str("first_name"), Some("Priya"));
        assert_eq!(p.get_str("last_name"), Some("Sharma"));
        assert_eq!(p.get_str("marital_status"), Some("Single"));
        assert_eq!(p.get_str("manglik"), Some("Yes"));
        assert_eq!(p.get_str("gender"), Some("Female"));
        assert_eq!(p.populated_count(), 6);
    }

    #[test]
    fn test_output_keys_always_match_schema() {
        let n = normalizer();
        let expected: HashSet<String> = DEFAULT_SCHEMA.iter().map(|s| s.to_string()).collect();
        for raw in [
            json!({}),
            json!({"full_name": "Rahul Verma", "city": "Jaipur"}),
            json!({"unexpected": "value", "another": 12}),
        ] {
            let report = normalize(&n, raw);
            assert_eq!(key_set(&report.profile), expected);
        }
        assert!(normalize(&n, json!({})).profile.iter().all(|(_, v)| v.is_null()));
    }

    #[test]
    fn test_institution_state_is_rejected() {
        let report = normalize(
            &normalizer(),
            json!({"state": "Central University of Rajasthan", "city": "Ajmer"}),
        );
        assert_eq!(report.profile.get_str("state"), None);
        assert_eq!(report.profile.get_str("city"), Some("Ajmer"));
    }

    #[test]
    fn test_strict_enums_outside_allow_list_are_absent() {
        let report = normalize(
            &normalizer(),
            json!({"marital_status": "Engaged", "manglik": "maybe later"}),
        );
        assert!(report.profile.is_absent("marital_status"));
        assert!(report.profile.is_absent("manglik"));
        assert!(report.warnings.iter().any(|w| w.starts_with("marital_status:")));
    }

    #[test]
    fn test_variant_spellings_resolve() {
        let report = normalize(
            &normalizer(),
            json!({"MaritialStatus": "unmarried", "Manglik": "Don't know"}),
        );
        assert_eq!(report.profile.get_str("marital_status"), Some("Un-Married"));
        assert_eq!(report.profile.get_str("manglik"), Some("Don't Know"));
    }

    #[test]
    fn test_caste_fields_come_from_one_row() {
        let report = normalize(&normalizer(), json!({"gotra": "kashyap", "caste": "Pareek"}));
        let p = &report.profile;
        assert_eq!(p.get_str("gotra"), Some("Kashyap"));
        assert_eq!(p.get_str("caste"), Some("Gaur"));
        assert_eq!(p.get_str("jaati"), Some("Brahmin"));
        assert_eq!(p.get_str("sakha"), Some("Kauthumi"));
    }

    #[test]
    fn test_caste_levels_confirmed_individually_without_row_match() {
        let report = normalize(
            &normalizer(),
            json!({"gotra": "Unknown Lineage", "jaati": "brahmin"}),
        );
        let p = &report.profile;
        assert_eq!(p.get_str("jaati"), Some("Brahmin"));
        assert!(p.is_absent("gotra"));
        assert!(p.is_absent("caste"));
        assert!(p.is_absent("sakha"));
    }

    #[test]
    fn test_education_and_occupation() {
        let report = normalize(
            &normalizer(),
            json!({
                "qualification": "B.Tech (CSE)",
                "occupation": "software engineer",
                "height": "5 feet 4 inches"
            }),
        );
        let p = &report.profile;
        assert_eq!(p.get_str("education"), Some("B.Tech"));
        assert_eq!(p.get_str("specialization"), Some("Computer Science"));
        assert_eq!(p.get_str("occupation"), Some("Software Engineer"));
        assert_eq!(p.get_str("height"), Some("5ft 4in (163 cms)"));
    }

    #[test]
    fn test_lenient_occupation_passes_through() {
        let report = normalize(&normalizer(), json!({"occupation": "Astronaut"}));
        assert_eq!(report.profile.get_str("occupation"), Some("Astronaut"));
    }

    #[test]
    fn test_dates_and_age() {
        let report = normalize(
            &normalizer(),
            json!({"dob": "12/03/1995", "birth_time": "14:35"}),
        );
        let p = &report.profile;
        assert_eq!(p.get_str("date_of_birth"), Some("1995-03-12"));
        assert_eq!(p.get("age"), Some(&json!(29)));
        assert_eq!(p.get_str("birth_time"), Some("2:35 PM"));
    }

    #[test]
    fn test_postal_code_fills_location() {
        let report = normalize(
            &normalizer(),
            json!({"address": "12, Koramangala 4th Block", "pincode": "560034"}),
        );
        let p = &report.profile;
        assert_eq!(p.get_str("country"), Some("India"));
        assert_eq!(p.get_str("state"), Some("Karnataka"));
        assert_eq!(p.get_str("city"), Some("Bangalore"));
        assert_eq!(p.get_str("zip_code"), Some("560034"));
    }

    #[test]
    fn test_partial_address_match_keeps_explicit_state() {
        let source = full_source().with(MasterDataset::from_rows(
            DatasetKey::CountryState,
            &["Country", "State", "District", "City", "Area", "Pincode"],
            &[
                &["India", "Rajasthan", "Ajmer", "Kishangarh", "Madanganj", "305801"],
                &["India", "Karnataka", "Bangalore Urban", "Bangalore", "Koramangala", "560034"],
            ],
        ));
        let n = normalizer_with(source, NormalizerConfig::default());
        let report = normalize(&n, json!({"state": "Karnataka", "birth_place": "Kishangarh"}));
        let p = &report.profile;
        assert_eq!(p.get_str("state"), Some("Karnataka"));
        assert_eq!(p.get_str("zip_code"), Some("305801"));
        assert!(p.is_absent("city"));
    }

    #[test]
    fn test_state_restricted_to_matched_country() {
        let report = normalize(
            &normalizer(),
            json!({"country": "india", "state": "Bagmati"}),
        );
        assert_eq!(report.profile.get_str("country"), Some("India"));
        assert_eq!(report.profile.get_str("state"), None);

        let report = normalize(&normalizer(), json!({"country": "India", "state": "rajastan"}));
        assert_eq!(report.profile.get_str("state"), Some("Rajasthan"));
    }

    #[test]
    fn test_country_default_only_when_raw_country_missing() {
        let config = NormalizerConfig {
            default_country: Some("India".to_string()),
            ..NormalizerConfig::default()
        };
        let n = normalizer_with(full_source(), config);
        assert_eq!(normalize(&n, json!({})).profile.get_str("country"), Some("India"));
        let report = normalize(&n, json!({"country": "Atlantis"}));
        assert_eq!(report.profile.get_str("country"), None);
    }

    #[test]
    fn test_missing_reference_data_degrades() {
        let n = normalizer_with(InMemorySource::new(), NormalizerConfig::default());
        let report = normalize(
            &n,
            json!({
                "full_name": "Aditya Joshi",
                "marital_status": "Married",
                "gotra": "Kashyap",
                "education": "MBA Finance",
                "occupation": "Teacher",
                "height": "170 cm",
                "mobile": "+91 98290 12345"
            }),
        );
        let p = &report.profile;
        assert_eq!(p.get_str("gender"), Some("Male"));
        assert!(p.is_absent("marital_status"));
        assert!(p.is_absent("gotra"));
        assert!(p.is_absent("education"));
        assert_eq!(p.get_str("specialization"), Some("Finance"));
        assert_eq!(p.get_str("occupation"), Some("Teacher"));
        assert_eq!(p.get_str("height"), Some("5ft 7in (170 cms)"));
        assert_eq!(p.get_str("mobile_no"), Some("+91 9829012345"));
    }

    #[test]
    fn test_invalid_mobile_is_absent() {
        let report = normalize(&normalizer(), json!({"mobile_no": "98765"}));
        assert!(report.profile.is_absent("mobile_no"));
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_phone_forms() {
        let n = normalizer();
        for (raw, expected) in [
            ("9876543210", "+91 9876543210"),
            ("09876543210", "+91 9876543210"),
            ("+91-98765-43210", "+91 9876543210"),
            ("091 9876543210", "+91 9876543210"),
        ] {
            let report = normalize(&n, json!({ "mobile_no": raw }));
            assert_eq!(report.profile.get_str("mobile_no"), Some(expected), "{}", raw);
        }
        let report = normalize(&n, json!({"phone_no": "274 5566", "mobile": "9829012345"}));
        assert_eq!(report.profile.get_str("phone_no"), Some("274 5566"));
        assert_eq!(report.profile.get_str("mobile_no"), Some("+91 9829012345"));
    }

    #[test]
    fn test_notes_enrichment_and_summary() {
        let report = normalize(
            &normalizer(),
            json!({
                "full_name": "Neha Pareek",
                "about_yourself": "Completed MBA from Jaipur. Bharadwaj gotra. ***** Loves travel."
            }),
        );
        let p = &report.profile;
        assert_eq!(p.get_str("education"), Some("MBA"));
        assert_eq!(p.get_str("gotra"), Some("Bharadwaj"));
        assert_eq!(
            p.get_str("about_yourself_summary"),
            Some("Completed MBA from Jaipur. Bharadwaj gotra.\nLoves travel.")
        );
    }

    #[test]
    fn test_normalize_json_str() {
        let n = normalizer();
        let report = n.normalize_json_str(r#"{"full_name": "Rahul Verma"}"#).unwrap();
        assert_eq!(report.profile.get_str("gender"), Some("Male"));
        let encoded = serde_json::to_value(&report).unwrap();
        assert_eq!(encoded["profile"]["first_name"], json!("Rahul"));
        assert_eq!(encoded["warnings"], json!([]));
        assert!(n.normalize_json_str("not json").is_err());
        assert!(n.normalize_json_str("[1, 2]").is_err());
    }

    #[test]
    fn test_concurrent_normalization_is_consistent() {
        let n = Arc::new(normalizer());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let n = Arc::clone(&n);
                thread::spawn(move || {
                    n.normalize_on(
                        &RawProfile::new()
                            .with("full_name", "Priya Sharma")
                            .with("marital_status", "Married")
                            .with("gotra", "Bharadwaj"),
                        today(),
                    )
                    .profile
                })
            })
            .collect();
        let results: Vec<CanonicalProfile> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(results[0].get_str("caste"), Some("Pareek"));
    }

    #[test]
    fn test_from_config_reads_csv_directory() {
        init_logger();
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("MaritalStatusMst.csv"),
            "Id,Marital Status\n1,Single\n2,Married\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("Biodata_Output.csv"),
            "full_name,gender,marital_status,mobile_no\n",
        )
        .unwrap();

        let n = ProfileNormalizer::from_config(
            NormalizerConfig::default().with_master_dir(dir.path()),
        );
        let report = normalize(
            &n,
            json!({"FullName": "Rahul Verma", "MaritalStatus": "married", "city": "Jaipur"}),
        );
        assert_eq!(n.schema().len(), 4);
        assert_eq!(report.profile.get_str("marital_status"), Some("Married"));
        assert_eq!(report.profile.get_str("gender"), Some("Male"));
        assert!(!report.profile.contains_field("city"));
    }

    #[test]
    fn test_variant_key_folding() {
        assert_eq!(variant_key("Don't  Know"), "dont know");
        assert_eq!(variant_key("Non-Manglik"), "non manglik");
        assert_eq!(canonical_variant("UN-MARRIED", MARITAL_VARIANTS), Some("Un-Married"));
        assert_eq!(canonical_variant("engaged", MARITAL_VARIANTS), None);
    }
}
