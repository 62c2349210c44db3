// src/validation/phone.rs - Mobile number canonicalization
//
// Canonical form is "+<country code> <10 national digits>".

pub const DEFAULT_COUNTRY_CODE: &str = "91";
const NATIONAL_DIGITS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNormalizer {
    country_code: String,
}

impl Default for PhoneNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTRY_CODE)
    }
}

type DigitRule = fn(&str, &str) -> Option<usize>;

fn bare_national(digits: &str, _: &str) -> Option<usize> {
    (digits.len() == NATIONAL_DIGITS).then_some(0)
}

fn trunk_prefixed(digits: &str, _: &str) -> Option<usize> {
    (digits.len() == NATIONAL_DIGITS + 1 && digits.starts_with('0')).then_some(1)
}

fn country_prefixed(digits: &str, cc: &str) -> Option<usize> {
    (digits.len() == NATIONAL_DIGITS + cc.len() && digits.starts_with(cc)).then_some(cc.len())
}

fn trunk_and_country_prefixed(digits: &str, cc: &str) -> Option<usize> {
    (digits.len() == NATIONAL_DIGITS + cc.len() + 1
        && digits.starts_with('0')
        && digits[1..].starts_with(cc))
    .then_some(cc.len() + 1)
}

impl PhoneNormalizer {
    /// Each rule inspects the digit string and returns the offset where the
    /// national number starts. First rule to accept wins.
    const RULES: [DigitRule; 4] = [
        bare_national,
        trunk_prefixed,
        country_prefixed,
        trunk_and_country_prefixed,
    ];

    pub fn new(country_code: &str) -> Self {
        let digits: String = country_code.chars().filter(|c| c.is_ascii_digit()).collect();
        Self {
            country_code: if digits.is_empty() {
                DEFAULT_COUNTRY_CODE.to_string()
            } else {
                digits
            },
        }
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// Strips everything but digits and applies the length rules. Inputs that
    /// fit no rule yield `None`.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return None;
        }
        Self::RULES.iter().find_map(|rule| {
            rule(&digits, &self.country_code)
                .map(|offset| format!("+{} {}", self.country_code, &digits[offset..]))
        })
    }
}
