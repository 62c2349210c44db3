// src/matching/gender.rs - Gender from explicit value, given name, or free-text context
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;

use crate::models::profile::RawProfile;
use crate::utils::logging::{Component, NormalizationLogger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenderSource {
    Explicit,
    GivenName,
    Context,
}

impl GenderSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenderSource::Explicit => "explicit value",
            GenderSource::GivenName => "given name",
            GenderSource::Context => "notes context",
        }
    }
}

const MALE_TOKENS: [&str; 3] = ["m", "male", "boy"];
const FEMALE_TOKENS: [&str; 4] = ["f", "female", "girl", "woman"];

const FEMALE_NAMES: &[&str] = &[
    "aarti", "aishwarya", "akanksha", "alka", "amrita", "anamika", "anita", "anjali", "ankita",
    "anushka", "aparna", "archana", "asha", "bhavna", "deepa", "deepika", "divya", "ekta",
    "garima", "gayatri", "geeta", "hema", "isha", "jaya", "jyoti", "kajal", "kavita", "kavya",
    "komal", "kriti", "lakshmi", "lata", "madhuri", "mamta", "manisha", "meena", "meera",
    "megha", "monika", "nandini", "neelam", "neha", "nidhi", "nikita", "nisha", "pallavi",
    "pooja", "poonam", "prachi", "pragya", "preeti", "priya", "priyanka", "radha", "rashmi",
    "rekha", "renu", "richa", "ritu", "riya", "ruchi", "sakshi", "sangeeta", "sapna", "sarita",
    "shalini", "shikha", "shilpa", "shivani", "shruti", "shweta", "simran", "sneha", "sonal",
    "sonam", "sonia", "sunita", "swati", "tanvi", "tanya", "usha", "vandana", "varsha", "vidya",
    "anna", "emma", "grace", "jennifer", "linda", "maria", "mary", "sarah", "susan", "zoey",
];

const MALE_NAMES: &[&str] = &[
    "aakash", "abhishek", "aditya", "ajay", "akash", "akhil", "alok", "amit", "amitabh", "anand",
    "anil", "ankit", "anuj", "arjun", "arun", "ashish", "ashok", "deepak", "dev", "dinesh",
    "gaurav", "gopal", "harish", "hemant", "jatin", "karan", "kishore", "krishna", "kunal",
    "lokesh", "mahesh", "manish", "manoj", "mohit", "mukesh", "naveen", "nikhil", "nitin",
    "pankaj", "pawan", "pradeep", "prakash", "pranav", "rahul", "raj", "rajat", "rajesh",
    "rakesh", "ramesh", "ravi", "rohit", "sachin", "sahil", "sandeep", "sanjay", "saurabh",
    "shyam", "siddharth", "sumit", "sunil", "suresh", "tarun", "uday", "varun", "vijay",
    "vikas", "vikram", "vinay", "vishal", "vivek", "yash", "david", "james", "john", "michael",
    "robert", "william",
];

/// Ending-based hints, checked in order. Single letters other than the
/// accepted exceptions are too noisy to count.
const FEMALE_SUFFIXES: &[&str] = &[
    "amma", "ette", "elle", "ee", "ya", "ta", "na", "da", "ka", "ha", "ina", "ita", "iya", "ini",
    "ara", "ela", "ine", "a", "i", "e",
];

const MALE_SUFFIXES: &[&str] = &[
    "singh", "kumar", "nath", "esh", "ash", "ank", "pal", "dev", "an", "ar", "or", "er", "en",
    "on", "it", "et", "at", "ut", "u", "o",
];

const SINGLE_LETTER_SUFFIXES: [&str; 3] = ["a", "i", "u"];

static FEMALE_NAME_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| FEMALE_NAMES.iter().copied().collect());
static MALE_NAME_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| MALE_NAMES.iter().copied().collect());

static FEMALE_CONTEXT: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"(?i)\b(?:pregnant|pregnancy)\b",
        r"(?i)\b(?:daughter|sister|wife|girl|lady|woman)\b",
        r"(?i)\b(?:she|her|herself)\b",
        r"(?i)\bbride\b",
        r"(?i)\b(?:maiden|spinster)\b",
    ])
});

static MALE_CONTEXT: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"(?i)\b(?:son|brother|husband|boy|gentleman)\b",
        r"(?i)\b(?:he|him|his|himself)\b",
        r"(?i)\bgroom\b",
        r"(?i)\bbachelor\b",
        r"(?i)\bbusinessman\b",
    ])
});

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
}

fn has_usable_suffix(name: &str, suffixes: &[&str]) -> bool {
    suffixes.iter().any(|suffix| {
        (suffix.len() >= 2 || SINGLE_LETTER_SUFFIXES.contains(suffix)) && name.ends_with(suffix)
    })
}

/// Resolves gender by explicit value first, then given name, then context
/// words in free text. Every strategy may abstain.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenderInferencer;

impl GenderInferencer {
    const STRATEGIES: [(GenderSource, fn(&RawProfile) -> Option<Gender>); 3] = [
        (GenderSource::Explicit, Self::explicit_strategy),
        (GenderSource::GivenName, Self::name_strategy),
        (GenderSource::Context, Self::context_strategy),
    ];

    fn explicit_strategy(raw: &RawProfile) -> Option<Gender> {
        Self::from_explicit(&raw.lookup("gender")?)
    }

    fn name_strategy(raw: &RawProfile) -> Option<Gender> {
        Self::from_name(&raw.lookup_any(&["full_name", "first_name"])?)
    }

    fn context_strategy(raw: &RawProfile) -> Option<Gender> {
        Self::from_context(&raw.lookup("notes")?)
    }

    pub fn new() -> Self {
        Self
    }

    pub fn infer(&self, raw: &RawProfile) -> Option<Gender> {
        self.infer_with_source(raw).map(|(gender, _)| gender)
    }

    pub fn infer_with_source(&self, raw: &RawProfile) -> Option<(Gender, GenderSource)> {
        Self::STRATEGIES.iter().find_map(|(source, strategy)| {
            let gender = strategy(raw)?;
            NormalizationLogger::new(Component::Gender).log_fill(
                "gender",
                gender.as_str(),
                source.as_str(),
            );
            Some((gender, *source))
        })
    }

    /// Recognized tokens only; anything else abstains so later strategies run.
    pub fn from_explicit(value: &str) -> Option<Gender> {
        let token = value.trim().to_lowercase();
        if MALE_TOKENS.contains(&token.as_str()) {
            Some(Gender::Male)
        } else if FEMALE_TOKENS.contains(&token.as_str()) {
            Some(Gender::Female)
        } else {
            None
        }
    }

    /// Dictionary lookup of the first name token, then suffix rules.
    pub fn from_name(name: &str) -> Option<Gender> {
        let first = name
            .split_whitespace()
            .next()?
            .trim_matches(|c: char| !c.is_alphabetic())
            .to_lowercase();
        if first.len() < 2 {
            return None;
        }
        if FEMALE_NAME_SET.contains(first.as_str()) {
            return Some(Gender::Female);
        }
        if MALE_NAME_SET.contains(first.as_str()) {
            return Some(Gender::Male);
        }
        if has_usable_suffix(&first, FEMALE_SUFFIXES) {
            return Some(Gender::Female);
        }
        if has_usable_suffix(&first, MALE_SUFFIXES) {
            return Some(Gender::Male);
        }
        None
    }

    /// Counts gendered words; a side wins with strictly more hits and at
    /// least two of them.
    pub fn from_context(text: &str) -> Option<Gender> {
        let count = |patterns: &[Regex]| -> usize {
            patterns.iter().map(|re| re.find_iter(text).count()).sum()
        };
        let female = count(&FEMALE_CONTEXT);
        let male = count(&MALE_CONTEXT);
        if female > male && female >= 2 {
            Some(Gender::Female)
        } else if male > female && male >= 2 {
            Some(Gender::Male)
        } else {
            None
        }
    }
}
