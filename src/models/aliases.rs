// src/models/aliases.rs - Declared key aliases for logical profile fields
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Raw keys accepted for each logical field, in lookup priority order.
/// PascalCase variants (`full_name` -> `FullName`) are derived once when the
/// table is first used.
const FIELD_ALIASES: &[(&str, &[&str])] = &[
    ("full_name", &["full_name", "name", "fullname"]),
    ("first_name", &["first_name", "firstname"]),
    ("last_name", &["last_name", "lastname", "surname"]),
    ("date_of_birth", &["date_of_birth", "dob", "DOB"]),
    ("age", &["age"]),
    ("birth_time", &["birth_time", "birthtime"]),
    ("birth_place", &["birth_place", "birthplace"]),
    ("gender", &["gender", "sex"]),
    ("marital_status", &["marital_status", "maritalstatus", "maritial_status"]),
    ("manglik", &["manglik", "maanglik"]),
    ("religion", &["religion"]),
    ("caste", &["caste"]),
    ("jaati", &["jaati", "jati"]),
    ("gotra", &["gotra"]),
    ("sakha", &["sakha", "shakha"]),
    ("community", &["community"]),
    ("education", &["education", "qualification", "degree"]),
    ("specialization", &["specialization", "field_of_study"]),
    ("occupation", &["occupation", "job", "profession"]),
    ("annual_income", &["annual_income", "income"]),
    ("address", &["address"]),
    ("village", &["village"]),
    ("tahsil", &["tahsil", "tehsil"]),
    ("district", &["district"]),
    ("city", &["city"]),
    ("state", &["state", "region"]),
    ("native_state", &["native_state", "nativestate"]),
    ("country", &["country", "nationality"]),
    ("zip_code", &["zip_code", "zipcode", "postal_code", "pincode", "pin"]),
    ("height", &["height", "height_cm"]),
    ("email_id", &["email_id", "email"]),
    ("mobile_no", &["mobile_no", "mobile", "phone", "contact"]),
    ("phone_no", &["phone_no", "phone"]),
    (
        "notes",
        &[
            "notes",
            "description",
            "text",
            "raw_text",
            "comments",
            "about_yourself",
            "ABOUT YOURSELF",
        ],
    ),
];

static EXPANDED_ALIASES: Lazy<HashMap<&'static str, Vec<String>>> = Lazy::new(|| {
    FIELD_ALIASES
        .iter()
        .map(|(field, keys)| {
            let mut expanded: Vec<String> = Vec::with_capacity(keys.len() * 2);
            for key in keys.iter() {
                push_unique(&mut expanded, key.to_string());
                if let Some(pascal) = pascal_case(key) {
                    push_unique(&mut expanded, pascal);
                }
            }
            (*field, expanded)
        })
        .collect()
});

fn push_unique(keys: &mut Vec<String>, key: String) {
    if !keys.contains(&key) {
        keys.push(key);
    }
}

/// `date_of_birth` -> `DateOfBirth`. Keys that already carry uppercase letters
/// or spaces are used verbatim and produce no variant.
pub fn pascal_case(key: &str) -> Option<String> {
    if key.contains(' ') || key.chars().any(|c| c.is_uppercase()) {
        return None;
    }
    let pascal: String = key
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();
    if pascal.is_empty() || pascal == key {
        None
    } else {
        Some(pascal)
    }
}

/// Every raw key that may carry `field`. Unknown fields resolve to the field
/// name itself plus its PascalCase form.
pub fn keys_for(field: &str) -> Vec<String> {
    match EXPANDED_ALIASES.get(field) {
        Some(keys) => keys.clone(),
        None => {
            let mut keys = vec![field.to_string()];
            if let Some(pascal) = pascal_case(field) {
                keys.push(pascal);
            }
            keys
        }
    }
}

pub fn is_declared(field: &str) -> bool {
    EXPANDED_ALIASES.contains_key(field)
}
