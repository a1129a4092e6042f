//! Multi-locale month and season tables.
//!
//! Month names are matched case-insensitively and accent-insensitively, so
//! "MÄRZ", "marz" and "März" all resolve to month 3.

use std::sync::OnceLock;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Month names, full and abbreviated, for the supported locales.
/// Row 0 identifies the locale of each column; rows 1-12 are the months.
const MONTH_TABLE: [[&str; 6]; 13] = [
    ["en_GB.UTF-8", "en_GB.UTF-8", "es_ES.UTF8", "es_ES.UTF8", "de_DE.UTF8", "de_DE.UTF8"],
    ["January", "Jan", "enero", "ene", "Januar", "Jan"],
    ["February", "Feb", "febrero", "feb", "Februar", "Feb"],
    ["March", "Mar", "marzo", "mar", "März", "Mär"],
    ["April", "Apr", "abril", "abr", "April", "Apr"],
    ["May", "May", "mayo", "may", "Mai", "Mai"],
    ["June", "Jun", "junio", "jun", "Juni", "Jun"],
    ["July", "Jul", "julio", "jul", "Juli", "Jul"],
    ["August", "Aug", "agosto", "ago", "August", "Aug"],
    ["September", "Sep", "septiembre", "sep", "September", "Sep"],
    ["October", "Oct", "octubre", "oct", "Oktober", "Okt"],
    ["November", "Nov", "noviembre", "nov", "November", "Nov"],
    ["December", "Dec", "diciembre", "dic", "Dezember", "Dez"],
];

/// Strip diacritics via NFD decomposition.
pub(crate) fn unaccented(text: &str) -> String {
    text.nfd().filter(|ch| !is_combining_mark(*ch)).collect()
}

/// Lowercased, unaccented copy of [`MONTH_TABLE`] with trailing dots removed,
/// built once on first use.
fn clean_table() -> &'static Vec<[String; 6]> {
    static CLEAN: OnceLock<Vec<[String; 6]>> = OnceLock::new();
    CLEAN.get_or_init(|| {
        MONTH_TABLE
            .iter()
            .map(|row| {
                let mut clean_row: [String; 6] = Default::default();
                for (slot, name) in clean_row.iter_mut().zip(row.iter()) {
                    *slot = unaccented(name).to_lowercase().trim_matches('.').to_string();
                }
                clean_row
            })
            .collect()
    })
}

fn season(clean: &str) -> u32 {
    match clean {
        "spring" => 3,
        "summer" => 6,
        "autumn" | "fall" => 9,
        "winter" => 12,
        _ => 0,
    }
}

/// Resolve a token to a month number (1-12), accepting any locale's full or
/// abbreviated name plus season names. Returns 0 when the token is not a month.
pub(crate) fn month2num(word: &str) -> u32 {
    let lower = word.to_lowercase();
    let clean = unaccented(word).to_lowercase();
    for idx in 1..MONTH_TABLE.len() {
        if MONTH_TABLE[idx].iter().any(|name| lower == name.to_lowercase()) {
            return idx as u32;
        }
        if clean_table()[idx].iter().any(|name| clean == *name) {
            return idx as u32;
        }
    }
    season(&clean)
}

/// Detect fused double-month tokens like "JanFeb" or "OktNov": the token must
/// start with one month name and end with a different one. Returns (0, 0)
/// when no such pair is found.
pub(crate) fn two_months(word: &str) -> (u32, u32) {
    let cleanword = unaccented(word).to_lowercase();
    let mut a = 0u32;
    for f in 1..=12 {
        if MONTH_TABLE[f].iter().any(|name| word.starts_with(name))
            || clean_table()[f].iter().any(|name| cleanword.starts_with(name.as_str()))
        {
            a = f as u32;
            break;
        }
    }
    let mut b = 0u32;
    if a != 0 {
        for f in 1..=12 {
            if MONTH_TABLE[f].iter().any(|name| word.ends_with(name))
                || clean_table()[f].iter().any(|name| cleanword.ends_with(name.as_str()))
            {
                b = f as u32;
                break;
            }
        }
    }
    if a == b {
        (0, 0)
    } else {
        (a, b)
    }
}

/// Localised display name for a month, chosen by language prefix against the
/// table's locale row ("de" picks "März"). Falls back to English.
pub(crate) fn month_name(month: u32, language: &str) -> String {
    let m = month as usize;
    if m == 0 || m >= MONTH_TABLE.len() {
        return format!("Month {month}");
    }
    let lang = language
        .split('_')
        .next()
        .unwrap_or(language)
        .to_lowercase();
    let idx = MONTH_TABLE[0]
        .iter()
        .position(|locale| locale.to_lowercase().starts_with(&lang))
        .unwrap_or(0);
    MONTH_TABLE[m][idx].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month2num_locales() {
        assert_eq!(month2num("January"), 1);
        assert_eq!(month2num("jan"), 1);
        assert_eq!(month2num("enero"), 1);
        assert_eq!(month2num("März"), 3);
        assert_eq!(month2num("Marz"), 3, "accent-folded match");
        assert_eq!(month2num("MÄRZ"), 3);
        assert_eq!(month2num("dic"), 12);
        assert_eq!(month2num("Okt"), 10);
        assert_eq!(month2num("notamonth"), 0);
    }

    #[test]
    fn test_month2num_seasons() {
        assert_eq!(month2num("Spring"), 3);
        assert_eq!(month2num("summer"), 6);
        assert_eq!(month2num("Autumn"), 9);
        assert_eq!(month2num("fall"), 9);
        assert_eq!(month2num("Winter"), 12);
    }

    #[test]
    fn test_two_months() {
        assert_eq!(two_months("JanFeb"), (1, 2));
        assert_eq!(two_months("OktNov"), (10, 11));
        assert_eq!(two_months("January"), (0, 0), "single month is not a pair");
        assert_eq!(two_months("2024"), (0, 0));
    }

    #[test]
    fn test_month_name_localised() {
        assert_eq!(month_name(3, "en"), "March");
        assert_eq!(month_name(3, "de"), "März");
        assert_eq!(month_name(3, "es"), "marzo");
        assert_eq!(month_name(3, "de_DE"), "März");
        assert_eq!(month_name(3, "fr"), "March", "unknown language falls back to English");
        assert_eq!(month_name(0, "en"), "Month 0");
    }
}
