//! Magazine issue identity parser.
//!
//! Turns a release title like "Fernsehwoche März 2024" or "PC Gamer Issue 345"
//! into a canonical issue code, a display label, and whatever date/issue/volume
//! parts could be recovered. The recognised layouts cover month+year dates
//! (single and bi-monthly), day-level dates in several orders, issue/volume
//! nouns ("Issue 345", "Vol 2 No 7"), and fused numeric runs
//! (YYYYII, YYYYIIII, VVVVIIII, YYYYVVVVIIII).
//!
//! Parsing is pure and deterministic: no I/O, no configuration.

use chrono::{Datelike, NaiveDate, Utc};

mod months;

const ISSUE_NOUNS: [&str; 6] = ["issue", "iss", "no", "nr", "number", "#"];
const VOLUME_NOUNS: [&str; 2] = ["vol", "volume"];

/// Everything the parser could recover from one release title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueMetadata {
    /// Canonical sortable code: `2024-03-01`, `20240345`, `0345`, `2024`, ...
    pub issue_code: String,
    /// Human-readable label: "März 2024", "Issue 345", "Vol 2 Issue 7 2024".
    pub label: String,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub issue_number: Option<i64>,
    pub volume: Option<i64>,
}

/// Parse a release title into issue metadata.
///
/// When `magazine_title` is given and the title starts with it (compared on
/// alphanumeric characters only, case-insensitively), the magazine name and
/// any following separators are stripped before parsing, so punctuation
/// differences between the feed and the library never leak into the result.
///
/// `language` selects the month names used in the label ("de" gives "März");
/// unknown languages fall back to English.
///
/// Returns `None` when no recognised layout matches.
pub fn parse_issue(
    title: &str,
    magazine_title: Option<&str>,
    language: &str,
) -> Option<IssueMetadata> {
    let stripped = strip_magazine_prefix(title, magazine_title);
    let parts = scan_date_parts(stripped);
    if parts.style == 0 {
        return None;
    }
    Some(IssueMetadata {
        issue_code: format_code(&parts),
        label: format_label(&parts, language),
        year: (parts.year != 0).then_some(parts.year),
        month: (parts.month != 0).then_some(parts.month),
        day: u32::try_from(parts.day).ok().filter(|d| *d != 0),
        issue_number: (parts.issue != 0).then_some(parts.issue),
        volume: (parts.volume != 0).then_some(parts.volume),
    })
}

/// Skip a literal magazine-name prefix, comparing alphanumerics only so
/// "PC-Gamer" matches the magazine "PC Gamer". If the title does not begin
/// with the full magazine name it is returned unchanged.
fn strip_magazine_prefix<'a>(title: &'a str, magazine_title: Option<&str>) -> &'a str {
    let Some(magazine) = magazine_title else {
        return title;
    };
    let target: Vec<char> = magazine
        .chars()
        .filter(|ch| ch.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();
    if target.is_empty() {
        return title;
    }

    let mut remaining = target.iter();
    let mut expected = remaining.next();
    let mut rest_start = title.len();
    for (idx, ch) in title.char_indices() {
        if expected.is_none() {
            rest_start = idx;
            break;
        }
        if ch.is_alphanumeric() {
            for lower in ch.to_lowercase() {
                match expected {
                    Some(&want) if want == lower => expected = remaining.next(),
                    _ => return title,
                }
            }
        }
    }
    if expected.is_some() {
        return title;
    }
    title[rest_start..].trim_start_matches(|ch: char| " .-_:/\\|–—".contains(ch))
}

/// Intermediate scan state. `style` identifies the matched layout (0 = none):
/// 1 bi-monthly, 2-7 date orders, 8/9 volume+issue nouns, 10-12 issue-number
/// layouts, 13 YYYYII, 14 bare issue, 15 bare year, 16 YYYYIIII,
/// 17 VVVVIIII, 18 YYYYVVVVIIII.
#[derive(Debug, Default)]
struct DateParts {
    year: i32,
    months: Vec<u32>,
    month: u32,
    day: i64,
    issue: i64,
    volume: i64,
    style: u8,
    has_issue_noun: bool,
}

fn scan_date_parts(text: &str) -> DateParts {
    let words = tokenize(text);
    let mut parts = DateParts::default();

    // First pass: year, month names (single and fused pairs), issue/volume
    // nouns followed by a number.
    let mut pos = 0;
    while pos < words.len() {
        if parts.year == 0 {
            parts.year = check_year(&words[pos]);
        }
        let month = months::month2num(&words[pos]);
        if month != 0 {
            parts.months.push(month);
        } else {
            let (first, second) = months::two_months(&words[pos]);
            if first != 0 {
                parts.months.push(first);
                parts.months.push(second);
            }
        }
        if is_issue_noun(&words[pos]) {
            if pos + 1 < words.len() {
                parts.has_issue_noun = true;
                pos += 1;
                parts.issue = check_int(&words[pos]);
            }
        } else if is_volume_noun(&words[pos]) {
            if pos + 1 < words.len() {
                pos += 1;
                parts.volume = check_int(&words[pos]);
            }
        }
        pos += 1;
    }

    let mut deduped: Vec<u32> = Vec::new();
    for month in &parts.months {
        if !deduped.contains(month) {
            deduped.push(*month);
        }
    }
    parts.months = deduped;
    if parts.months.len() > 1 {
        parts.style = 1;
    }

    if parts.volume != 0 && parts.issue != 0 {
        parts.style = if parts.year != 0 { 8 } else { 9 };
    }

    // Second pass: decode pure-digit runs by length.
    for word in &words {
        if !is_all_digits(word) {
            continue;
        }
        match word.len() {
            4 => {
                if check_year(word) != 0 {
                    parts.year = parse_i32(word);
                }
            }
            6 => {
                if check_year(&word[..4]) != 0 {
                    parts.year = parse_i32(&word[..4]);
                    parts.issue = check_int(&word[4..]);
                    parts.style = 13;
                } else if check_year(&word[2..]) != 0 {
                    parts.year = parse_i32(&word[2..]);
                    parts.issue = check_int(&word[..2]);
                    parts.style = 13;
                }
            }
            8 => {
                if check_year(&word[..4]) != 0 {
                    parts.year = parse_i32(&word[..4]);
                    parts.issue = check_int(&word[4..]);
                    parts.style = 16;
                } else {
                    parts.volume = check_int(&word[..4]);
                    parts.issue = check_int(&word[4..]);
                    parts.style = 17;
                }
            }
            12 => {
                parts.year = parse_i32(&word[..4]);
                parts.volume = check_int(&word[4..8]);
                parts.issue = check_int(&word[8..]);
                parts.style = 18;
            }
            len if len > 2 => {
                parts.issue = check_int(word);
            }
            _ => {}
        }
    }

    // <day?> <month> <year>, possibly with an issue/volume noun further back.
    if parts.style == 0 {
        let mut pos = 0;
        while pos < words.len() {
            let year = check_year(&words[pos]);
            if year != 0 && pos > 0 {
                let month = months::month2num(&words[pos - 1]);
                if month != 0 {
                    if pos > 1 {
                        let day = check_int(&digits_of(&words[pos - 2]));
                        if pos > 2 && is_issue_noun(&words[pos - 3]) {
                            parts.issue = day;
                            parts.has_issue_noun = true;
                            parts.style = 10;
                        } else if pos > 2 && is_volume_noun(&words[pos - 3]) {
                            parts.volume = day;
                            parts.style = 10;
                        } else if day > 31 {
                            parts.issue = day;
                            parts.style = 2;
                        } else if day != 0 {
                            parts.day = day;
                            parts.style = 3;
                        } else {
                            parts.day = 1;
                            parts.style = 4;
                        }
                    } else {
                        parts.day = 1;
                        parts.style = 4;
                    }
                    break;
                }
            }
            pos += 1;
        }
    }

    // <month> <day> <year>, validated against the calendar.
    if parts.style == 0 {
        let mut pos = 0;
        while pos < words.len() {
            let year = check_year(&words[pos]);
            if year != 0 && pos > 1 {
                let month = months::month2num(&words[pos - 2]);
                if month != 0 {
                    let day = check_int(&digits_of(&words[pos - 1]));
                    if is_real_date(year, month, day) {
                        parts.year = year;
                        if parts.months.is_empty() {
                            parts.months.push(month);
                        }
                        parts.day = day;
                        parts.style = 5;
                        break;
                    }
                }
            }
            pos += 1;
        }
    }

    // <year> <month> <day?>, the month either named or numeric 1-12.
    if parts.style == 0 {
        let mut pos = 0;
        while pos < words.len() {
            let year = check_year(&words[pos]);
            if year != 0 && pos + 1 < words.len() {
                let mut month = months::month2num(&words[pos + 1]);
                if month == 0 {
                    let numeric = check_int(&words[pos + 1]);
                    if (1..=12).contains(&numeric) {
                        month = numeric as u32;
                    }
                }
                if month != 0 {
                    let (day, style) = if pos + 2 < words.len() {
                        let day = check_int(&digits_of(&words[pos + 2]));
                        if day != 0 {
                            (day, 6)
                        } else {
                            (1, 7)
                        }
                    } else {
                        (1, 7)
                    };
                    if is_real_date(year, month, day) {
                        parts.year = year;
                        if parts.months.is_empty() {
                            parts.months.push(month);
                        }
                        parts.day = day;
                        parts.style = style;
                    } else {
                        parts.style = 0;
                    }
                }
            }
            pos += 1;
        }
    }

    // Issue/volume noun directly against a number: "Issue345", "No 12",
    // including a dotted "YY.N" token after the noun.
    if parts.style == 0 {
        let mut pos = 0;
        while pos < words.len() {
            let lower = words[pos].to_lowercase();
            let digit_start = lower.find(|ch: char| ch.is_ascii_digit());
            let head = &lower[..digit_start.unwrap_or(lower.len())];
            if is_noun(head) {
                if let Some(start) = digit_start {
                    let run: String = lower[start..]
                        .chars()
                        .take_while(|ch| ch.is_ascii_digit())
                        .collect();
                    let issue = check_int(&run);
                    if issue != 0 {
                        parts.issue = issue;
                        parts.style = if parts.year != 0 { 10 } else { 11 };
                        break;
                    }
                }
                if pos + 1 < words.len() {
                    let issue = check_int(&words[pos + 1]);
                    if issue != 0 {
                        parts.issue = issue;
                        parts.style = if parts.year != 0 { 10 } else { 11 };
                        break;
                    }
                    if let Some((year, issue)) = split_dotted_code(&words[pos + 1]) {
                        parts.year = year;
                        parts.issue = issue;
                        parts.style = 10;
                        break;
                    }
                }
            }
            pos += 1;
        }
    }

    // Bare <number> <year> / <year> <number> adjacency; a pair of small
    // numbers before the year is read as day+month instead.
    if parts.style == 0 && parts.year != 0 {
        let mut pos = 1;
        while pos < words.len() {
            if check_year(&words[pos]) != 0 {
                if is_all_digits(&words[pos - 1]) {
                    if pos > 1 && is_all_digits(&words[pos - 2]) {
                        let mut month = check_int(&words[pos - 1]);
                        let mut day = check_int(&words[pos - 2]);
                        if month == 1 && day < 13 {
                            month = day;
                            day = 1;
                        }
                        if month < 13 {
                            parts.months = vec![month as u32];
                            parts.day = day;
                            parts.style = 3;
                        } else if day < 13 {
                            parts.months = vec![day as u32];
                            parts.day = month;
                            parts.style = 3;
                        }
                    }
                    if parts.style == 0 {
                        parts.issue = check_int(&words[pos - 1]);
                        parts.style = 12;
                    }
                    break;
                } else if pos + 1 < words.len() && is_all_digits(&words[pos + 1]) {
                    parts.issue = check_int(&words[pos + 1]);
                    parts.style = 12;
                    break;
                }
            }
            pos += 1;
        }
    }

    parts.month = parts.months.first().copied().unwrap_or(0);
    if parts.year != 0 && parts.style == 0 {
        parts.style = 15;
    }
    if parts.issue != 0 && parts.style == 0 {
        parts.style = 14;
    }
    parts
}

/// Canonical sortable issue code for the matched layout.
fn format_code(parts: &DateParts) -> String {
    // YYYYII tokens keep their two-digit issue width.
    if parts.style == 13 {
        return format!("{}{:02}", parts.year, parts.issue);
    }
    if parts.issue != 0 && parts.has_issue_noun {
        return if parts.year != 0 {
            format!("{}{:04}", parts.year, parts.issue)
        } else {
            format!("{:04}", parts.issue)
        };
    }
    let day = if parts.day == 0 { 1 } else { parts.day };
    match parts.style {
        14 => format!("{:04}", parts.issue),
        15 => parts.year.to_string(),
        16 => format!("{}{:04}", parts.year, parts.issue),
        17 => format!("{:04}{:04}", parts.volume, parts.issue),
        18 => format!("{}{:04}{:04}", parts.year, parts.volume, parts.issue),
        2 | 8 | 9 | 10 | 11 | 12 if parts.issue != 0 => {
            if parts.year != 0 {
                format!("{}{:04}", parts.year, parts.issue)
            } else {
                format!("{:04}", parts.issue)
            }
        }
        _ => format!("{}-{:02}-{:02}", parts.year, parts.month, day),
    }
}

fn format_label(parts: &DateParts, language: &str) -> String {
    if parts.month != 0 && parts.year != 0 {
        if parts.months.len() > 1 {
            let names: Vec<String> = parts
                .months
                .iter()
                .map(|m| months::month_name(*m, language))
                .collect();
            return format!("{} {}", names.join("/"), parts.year);
        }
        return format!("{} {}", months::month_name(parts.month, language), parts.year);
    }
    let mut components: Vec<String> = Vec::new();
    if parts.volume != 0 {
        components.push(format!("Vol {}", parts.volume));
    }
    if parts.issue != 0 {
        components.push(format!("Issue {}", parts.issue));
    }
    if parts.year != 0 {
        components.push(parts.year.to_string());
    }
    if components.is_empty() {
        "Issue".to_string()
    } else {
        components.join(" ")
    }
}

/// Replace separators with spaces (`#` keeps itself as a token, parentheses
/// vanish) and split on whitespace.
fn tokenize(text: &str) -> Vec<String> {
    let mut replaced = String::with_capacity(text.len() + 4);
    for ch in text.chars() {
        match ch {
            '.' | '-' | '/' | '+' | '_' | '[' | ']' => replaced.push(' '),
            '(' | ')' => {}
            '#' => replaced.push_str("# "),
            _ => replaced.push(ch),
        }
    }
    replaced.split_whitespace().map(str::to_string).collect()
}

fn is_issue_noun(word: &str) -> bool {
    let lower = word.to_lowercase();
    ISSUE_NOUNS.contains(&lower.trim_matches('.'))
}

fn is_volume_noun(word: &str) -> bool {
    let lower = word.to_lowercase();
    VOLUME_NOUNS.contains(&lower.trim_matches('.'))
}

fn is_noun(word: &str) -> bool {
    let trimmed = word.trim_matches('.');
    ISSUE_NOUNS.contains(&trimmed) || VOLUME_NOUNS.contains(&trimmed)
}

fn is_all_digits(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|ch| ch.is_ascii_digit())
}

fn digits_of(word: &str) -> String {
    word.chars().filter(|ch| ch.is_ascii_digit()).collect()
}

fn check_int(value: &str) -> i64 {
    value.parse().unwrap_or(0)
}

fn parse_i32(value: &str) -> i32 {
    value.parse().unwrap_or(0)
}

/// A plausible publication year: 1900 up to next year. Returns 0 otherwise.
fn check_year(value: &str) -> i32 {
    if is_all_digits(value) {
        if let Ok(year) = value.parse::<i32>() {
            if (1900..=Utc::now().year() + 1).contains(&year) {
                return year;
            }
        }
    }
    0
}

fn is_real_date(year: i32, month: u32, day: i64) -> bool {
    u32::try_from(day)
        .ok()
        .and_then(|d| NaiveDate::from_ymd_opt(year, month, d))
        .is_some()
}

/// "YY.N" / "YYYY.NN" dotted issue tokens following an issue noun.
fn split_dotted_code(token: &str) -> Option<(i32, i64)> {
    if token.matches('.').count() != 1
        || !token.chars().all(|ch| ch.is_ascii_digit() || ch == '.')
    {
        return None;
    }
    let (year_part, issue_part) = token.split_once('.')?;
    let year_part = if year_part.len() == 2 {
        format!("20{year_part}")
    } else {
        year_part.to_string()
    };
    let issue_part = if issue_part.len() == 1 {
        format!("0{issue_part}")
    } else {
        issue_part.to_string()
    };
    if year_part.len() == 4 && issue_part.len() == 2 {
        Some((parse_i32(&year_part), check_int(&issue_part)))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(title: &str) -> IssueMetadata {
        parse_issue(title, None, "en").expect("title should parse")
    }

    #[test]
    fn test_german_month_year() {
        let meta = parse_issue("Fernsehwoche März 2024", Some("Fernsehwoche"), "de")
            .expect("should parse");
        assert_eq!(meta.year, Some(2024));
        assert_eq!(meta.month, Some(3));
        assert_eq!(meta.label, "März 2024");
        assert_eq!(meta.issue_code, "2024-03-01");
    }

    #[test]
    fn test_six_digit_year_issue() {
        let meta = parse("Classic Cars 202406");
        assert_eq!(meta.issue_code, "202406");
        assert_eq!(meta.year, Some(2024));
        assert_eq!(meta.issue_number, Some(6));
    }

    #[test]
    fn test_six_digit_issue_year() {
        // Leading two digits are the issue when the last four form the year.
        let meta = parse("Classic Cars 032024");
        assert_eq!(meta.issue_code, "202403");
        assert_eq!(meta.year, Some(2024));
        assert_eq!(meta.issue_number, Some(3));
    }

    #[test]
    fn test_double_month() {
        let meta = parse_issue(
            "Car Mechanics January-February 2025",
            Some("Car Mechanics"),
            "en",
        )
        .expect("should parse");
        assert_eq!(meta.label, "January/February 2025");
        assert_eq!(meta.month, Some(1));
        assert_eq!(meta.issue_code, "2025-01-01");
    }

    #[test]
    fn test_fused_double_month() {
        let meta = parse("Garden Answers JanFeb 2025");
        assert_eq!(meta.label, "January/February 2025");
        assert_eq!(meta.issue_code, "2025-01-01");
    }

    #[test]
    fn test_season_maps_to_month() {
        let meta = parse_issue("Knitting Spring 2024", Some("Knitting"), "en")
            .expect("should parse");
        assert_eq!(meta.month, Some(3));
        assert_eq!(meta.label, "March 2024");
        assert_eq!(meta.issue_code, "2024-03-01");
    }

    #[test]
    fn test_issue_noun_without_year() {
        let meta = parse_issue("PC Gamer Issue 345", Some("PC Gamer"), "en")
            .expect("should parse");
        assert_eq!(meta.issue_number, Some(345));
        assert_eq!(meta.issue_code, "0345");
        assert_eq!(meta.label, "Issue 345");
    }

    #[test]
    fn test_issue_noun_with_year() {
        let meta = parse_issue("PC Gamer Issue 345 2025", Some("PC Gamer"), "en")
            .expect("should parse");
        assert_eq!(meta.issue_code, "20250345");
        assert_eq!(meta.issue_number, Some(345));
        assert_eq!(meta.year, Some(2025));
    }

    #[test]
    fn test_hash_noun() {
        let meta = parse("MacWorld #123");
        assert_eq!(meta.issue_number, Some(123));
        assert_eq!(meta.issue_code, "0123");
    }

    #[test]
    fn test_volume_and_issue_nouns() {
        let meta = parse("Linux Format Vol 2 No 7 2024");
        assert_eq!(meta.volume, Some(2));
        assert_eq!(meta.issue_number, Some(7));
        assert_eq!(meta.issue_code, "20240007");
        assert_eq!(meta.label, "Vol 2 Issue 7 2024");
    }

    #[test]
    fn test_eight_digit_year_issue() {
        let meta = parse("Retro Gamer 20250012");
        assert_eq!(meta.issue_code, "20250012");
        assert_eq!(meta.year, Some(2025));
        assert_eq!(meta.issue_number, Some(12));
    }

    #[test]
    fn test_eight_digit_volume_issue() {
        let meta = parse("Retro Gamer 00550012");
        assert_eq!(meta.issue_code, "00550012");
        assert_eq!(meta.volume, Some(55));
        assert_eq!(meta.issue_number, Some(12));
        assert_eq!(meta.label, "Vol 55 Issue 12");
    }

    #[test]
    fn test_twelve_digit_year_volume_issue() {
        let meta = parse("Archive 202400010003");
        assert_eq!(meta.issue_code, "202400010003");
        assert_eq!(meta.year, Some(2024));
        assert_eq!(meta.volume, Some(1));
        assert_eq!(meta.issue_number, Some(3));
    }

    #[test]
    fn test_day_month_year() {
        let meta = parse_issue("Auto Express 14 May 2025", Some("Auto Express"), "en")
            .expect("should parse");
        assert_eq!(meta.issue_code, "2025-05-14");
        assert_eq!(meta.day, Some(14));
    }

    #[test]
    fn test_month_day_year() {
        let meta = parse("December 25 2024");
        assert_eq!(meta.issue_code, "2024-12-25");
    }

    #[test]
    fn test_year_month_day() {
        let meta = parse("Weekly 2024 12 25");
        assert_eq!(meta.issue_code, "2024-12-25");
    }

    #[test]
    fn test_year_number_adjacency() {
        let meta = parse_issue("Vogue 08 2025", Some("Vogue"), "en").expect("should parse");
        assert_eq!(meta.issue_number, Some(8));
        assert_eq!(meta.issue_code, "20250008");
        assert_eq!(meta.label, "Issue 8 2025");
    }

    #[test]
    fn test_bare_year() {
        let meta = parse_issue("National Geographic 2024", Some("National Geographic"), "en")
            .expect("should parse");
        assert_eq!(meta.issue_code, "2024");
        assert_eq!(meta.label, "2024");
        assert_eq!(meta.issue_number, None);
    }

    #[test]
    fn test_bare_issue_number() {
        let meta = parse_issue("Viz 345", Some("Viz"), "en").expect("should parse");
        assert_eq!(meta.issue_code, "0345");
        assert_eq!(meta.label, "Issue 345");
    }

    #[test]
    fn test_no_match() {
        assert_eq!(parse_issue("Random Words", None, "en"), None);
        assert_eq!(parse_issue("", None, "en"), None);
    }

    #[test]
    fn test_year_bounds() {
        assert_eq!(parse_issue("Something 1899", None, "en"), None);
        assert_eq!(
            parse_issue("Something 1900", None, "en")
                .expect("should parse")
                .issue_code,
            "1900"
        );
        let future = Utc::now().year() + 2;
        assert_eq!(parse_issue(&format!("Something {future}"), None, "en"), None);
    }

    #[test]
    fn test_prefix_stripping_ignores_punctuation() {
        let meta = parse_issue("PC-Gamer Issue 10", Some("PC Gamer"), "en")
            .expect("should parse");
        assert_eq!(meta.issue_number, Some(10));
        assert_eq!(meta.issue_code, "0010");
    }

    #[test]
    fn test_prefix_mismatch_keeps_title() {
        // Title does not start with the magazine name, so nothing is stripped
        // and the date is still found.
        let meta = parse_issue("Other Mag March 2024", Some("PC Gamer"), "en")
            .expect("should parse");
        assert_eq!(meta.issue_code, "2024-03-01");
        assert_eq!(meta.month, Some(3));
    }

    #[test]
    fn test_title_equal_to_magazine_has_no_identity() {
        assert_eq!(parse_issue("PC Gamer", Some("PC Gamer"), "en"), None);
    }
}
