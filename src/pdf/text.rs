use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use time::{Date, Month};

/// Extract text from all pages of a PDF
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read PDF: {}", path.display()))?;

    pdf_extract::extract_text_from_mem(&bytes)
        .with_context(|| format!("Failed to extract text from PDF: {}", path.display()))
}

/// Calendar dates mentioned in `text`, normalised to `YYYY-MM-DD`, in order of
/// first appearance. Strings that only look like dates (31.02.2024) are skipped.
pub fn find_dates(text: &str) -> Result<Vec<String>> {
    let pattern = Regex::new(
        r"\b(?:(?P<iy>\d{4})-(?P<im>\d{1,2})-(?P<id>\d{1,2})|(?P<gd>\d{1,2})\.(?P<gm>\d{1,2})\.(?P<gy>\d{4}|\d{2}))\b",
    )?;

    let mut dates = Vec::new();
    for caps in pattern.captures_iter(text) {
        let (year, month, day) = if let Some(y) = caps.name("iy") {
            (y.as_str(), &caps["im"], &caps["id"])
        } else {
            (&caps["gy"], &caps["gm"], &caps["gd"])
        };
        if let Some(date) = calendar_date(year, month, day) {
            let formatted = iso_date(date);
            if !dates.contains(&formatted) {
                dates.push(formatted);
            }
        }
    }
    Ok(dates)
}

/// `YYYY-MM-DD`, the form dates take in filenames.
pub fn iso_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Parse a strict `YYYY-MM-DD` date. Impossible days are rejected.
pub fn parse_iso_date(raw: &str) -> Option<Date> {
    if !raw.bytes().all(|b| b.is_ascii_digit() || b == b'-') {
        return None;
    }
    match raw.split('-').collect::<Vec<_>>().as_slice() {
        [year, month, day] if year.len() == 4 => calendar_date(year, month, day),
        _ => None,
    }
}

fn calendar_date(year: &str, month: &str, day: &str) -> Option<Date> {
    let mut year: i32 = year.parse().ok()?;
    // two-digit years pivot like strptime's %y
    if year < 100 {
        year += if year < 69 { 2000 } else { 1900 };
    }
    let month = Month::try_from(month.parse::<u8>().ok()?).ok()?;
    Date::from_calendar_date(year, month, day.parse().ok()?).ok()
}

/// The `limit` most frequent words of three or more characters.
pub fn common_words(text: &str, limit: usize) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in text.split(|c: char| !c.is_alphanumeric()) {
        if word.chars().count() >= 3 {
            *counts.entry(word).or_default() += 1;
        }
    }
    let mut words: Vec<_> = counts.into_iter().collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    words
        .into_iter()
        .take(limit)
        .map(|(word, _)| word.to_string())
        .collect()
}
