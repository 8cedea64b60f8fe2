//! Name normalization shared by reconciliation and site grouping.
//!
//! The registry and the daily status feed spell the same unit differently
//! ("Donald C. Cook Nuclear Plant, Unit 1" vs "D.C. Cook 1"). These helpers
//! reduce both spellings to comparable forms.

use std::sync::LazyLock;

use regex::Regex;

/// Facility-type suffix plus everything after it.
static FACILITY_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(nuclear\s*)?(power\s*)?(plant|station|generating station).*$")
        .expect("facility suffix pattern is valid")
});

/// A `Unit` token (with optional leading comma) in front of a unit number.
static UNIT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i),?\s*unit\s*").expect("unit token pattern is valid"));

static NUMBER_WORDS: LazyLock<[(Regex, &'static str); 3]> = LazyLock::new(|| {
    [
        (Regex::new(r"(?i)\bone\b").expect("valid"), "1"),
        (Regex::new(r"(?i)\btwo\b").expect("valid"), "2"),
        (Regex::new(r"(?i)\bthree\b").expect("valid"), "3"),
    ]
});

/// Trailing `[,] [Unit ]<digits>` suffix.
static UNIT_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i),?\s*(unit\s*)?\d+$").expect("unit suffix pattern is valid")
});

/// Reduces a unit name to a canonical, lowercase matching key.
///
/// Strips the facility suffix ("Nuclear Plant", "Station", "Generating
/// Station" and anything after it), drops the `Unit` token, spells
/// `One`/`Two`/`Three` as digits, collapses whitespace and case-folds.
///
/// # Examples
///
/// ```
/// use reactor_perf::names::normalize;
///
/// assert_eq!(normalize("Vogtle Electric Generating Plant, Unit 3"), "vogtle electric generating");
/// assert_eq!(normalize("Nine Mile Point Unit Two"), "nine mile point 2");
/// ```
pub fn normalize(name: &str) -> String {
    let name = FACILITY_SUFFIX.replace(name, "");
    let mut name = UNIT_TOKEN.replace_all(&name, " ").into_owned();
    for (pattern, digit) in NUMBER_WORDS.iter() {
        name = pattern.replace_all(&name, *digit).into_owned();
    }
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Strips a trailing unit designation, leaving the plant/site name.
///
/// `"Hatch 2"`, `"Edwin I. Hatch Nuclear Plant, Unit 2"` and
/// `"Browns Ferry Unit 3"` lose their trailing unit numbers; the case of
/// the remaining text is preserved.
pub fn plant_base_name(name: &str) -> String {
    UNIT_SUFFIX.replace(name, "").trim().to_string()
}

/// Returns the trailing run of ASCII digits, if the name ends in one.
pub fn trailing_unit_number(name: &str) -> Option<&str> {
    let digits = name
        .bytes()
        .rev()
        .take_while(u8::is_ascii_digit)
        .count();
    (digits > 0).then(|| &name[name.len() - digits..])
}
