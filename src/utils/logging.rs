// src/utils/logging.rs - Structured log lines for normalization runs
use log::{debug, info, warn};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Normalizer,
    Caste,
    Address,
    Education,
    Gender,
    Validator,
    Enrichment,
}

#[derive(Clone)]
pub struct NormalizationLogger {
    component_name: &'static str,
    component_emoji: &'static str,
    start_time: Instant,
}

impl NormalizationLogger {
    pub fn new(component: Component) -> Self {
        let (component_name, component_emoji) = match component {
            Component::Normalizer => ("NORMALIZE", "🧾"),
            Component::Caste => ("CASTE", "🧬"),
            Component::Address => ("ADDRESS", "📍"),
            Component::Education => ("EDUCATION", "🎓"),
            Component::Gender => ("GENDER", "👤"),
            Component::Validator => ("VALIDATE", "🛡️"),
            Component::Enrichment => ("ENRICH", "📝"),
        };
        Self {
            component_name,
            component_emoji,
            start_time: Instant::now(),
        }
    }

    pub fn log_start(&self, raw_fields: usize, schema_fields: usize) {
        info!(
            "[{}] {} 🚀 Normalizing profile: {} raw fields into {} output fields",
            self.component_name, self.component_emoji, raw_fields, schema_fields
        );
    }

    pub fn log_phase(&self, phase: &str, details: Option<&str>) {
        let elapsed = self.start_time.elapsed();
        match details {
            Some(details) => debug!(
                "[{}] {} 🔄 Phase: {} - {} [+{:.3}s]",
                self.component_name, self.component_emoji, phase, details, elapsed.as_secs_f32()
            ),
            None => debug!(
                "[{}] {} 🔄 Phase: {} [+{:.3}s]",
                self.component_name, self.component_emoji, phase, elapsed.as_secs_f32()
            ),
        }
    }

    pub fn log_match(&self, field: &str, raw: &str, matched: &str, score: f64, method: &str) {
        info!(
            "[{}] {} ✅ {}: '{}' → '{}' ({}, {:.1})",
            self.component_name, self.component_emoji, field, raw, matched, method, score
        );
    }

    pub fn log_no_match(&self, field: &str, raw: &str, best_score: f64) {
        info!(
            "[{}] {} ❔ {}: no reference value for '{}' (best {:.1})",
            self.component_name, self.component_emoji, field, raw, best_score
        );
    }

    pub fn log_degraded(&self, field: &str, reason: &str) {
        warn!(
            "[{}] {} ⚠️  {}: reference data unavailable ({})",
            self.component_name, self.component_emoji, field, reason
        );
    }

    pub fn log_rejection(&self, field: &str, reason: &str) {
        warn!(
            "[{}] {} 🚫 {} rejected: {}",
            self.component_name, self.component_emoji, field, reason
        );
    }

    pub fn log_fill(&self, field: &str, value: &str, source: &str) {
        info!(
            "[{}] {} ➕ {} filled from {}: '{}'",
            self.component_name, self.component_emoji, field, source, value
        );
    }

    pub fn log_completion(&self, populated: usize, total: usize, warnings: usize) {
        let elapsed = self.start_time.elapsed();
        info!(
            "[{}] {} ✅ Profile normalized: {}/{} fields populated, {} warnings in {:.3}s",
            self.component_name,
            self.component_emoji,
            populated,
            total,
            warnings,
            elapsed.as_secs_f32()
        );
    }
}
