use chrono::{DateTime, NaiveDate, Utc};

pub const LOCATION_FALLBACK: &str = "Location not specified";
pub const DESCRIPTION_FALLBACK: &str = "No description available";

// --- Salary ---

pub fn salary_range(
    min: Option<f64>,
    max: Option<f64>,
    currency: Option<&str>,
    period: Option<&str>,
) -> Option<String> {
    let symbol = currency_symbol(currency);
    let suffix = period_suffix(period);

    let label = match (min, max) {
        (Some(min), Some(max)) if format_amount(min) == format_amount(max) => {
            format!("{}{}", symbol, format_amount(min))
        }
        (Some(min), Some(max)) => format!(
            "{}{} - {}{}",
            symbol,
            format_amount(min),
            symbol,
            format_amount(max)
        ),
        (Some(min), None) => format!("From {}{}", symbol, format_amount(min)),
        (None, Some(max)) => format!("Up to {}{}", symbol, format_amount(max)),
        (None, None) => return None,
    };

    Some(format!("{}{}", label, suffix))
}

fn format_amount(amount: f64) -> String {
    if amount >= 1000.0 {
        let thousands = amount / 1000.0;
        if (thousands - thousands.round()).abs() < 0.05 {
            format!("{}K", thousands.round() as i64)
        } else {
            format!("{:.1}K", thousands)
        }
    } else if amount.fract() == 0.0 {
        format!("{}", amount as i64)
    } else {
        format!("{:.2}", amount)
    }
}

fn currency_symbol(currency: Option<&str>) -> String {
    match currency.map(|c| c.trim().to_uppercase()).as_deref() {
        None | Some("") | Some("USD") => "$".to_string(),
        Some("EUR") => "€".to_string(),
        Some("GBP") => "£".to_string(),
        Some("INR") => "₹".to_string(),
        Some("JPY") => "¥".to_string(),
        Some("CAD") => "CA$".to_string(),
        Some("AUD") => "A$".to_string(),
        Some(code) => format!("{} ", code),
    }
}

fn period_suffix(period: Option<&str>) -> &'static str {
    match period.map(|p| p.trim().to_uppercase()).as_deref() {
        Some("YEAR") => "/yr",
        Some("MONTH") => "/mo",
        Some("WEEK") => "/wk",
        Some("DAY") => "/day",
        Some("HOUR") => "/hr",
        _ => "",
    }
}

// --- Dates ---

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Some providers drop the offset or the time entirely
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn posted_date(posted_at: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(posted) = posted_at.and_then(parse_timestamp) else {
        return "Recently posted".to_string();
    };

    let days = now
        .date_naive()
        .signed_duration_since(posted.date_naive())
        .num_days();

    match days {
        d if d <= 0 => "Posted today".to_string(),
        1 => "Posted yesterday".to_string(),
        d if d < 7 => format!("Posted {} days ago", d),
        d if d < 30 => {
            let weeks = d / 7;
            if weeks == 1 {
                "Posted 1 week ago".to_string()
            } else {
                format!("Posted {} weeks ago", weeks)
            }
        }
        _ => format!("Posted {}", posted.format("%b %-d, %Y")),
    }
}

pub fn saved_at(saved_at: DateTime<Utc>) -> String {
    let local = saved_at.with_timezone(&chrono::Local);
    format!(
        "Saved {} at {}",
        local.format("%-m/%-d/%Y"),
        local.format("%-I:%M:%S %p")
    )
}

// --- Location ---

pub fn location(city: Option<&str>, state: Option<&str>, country: Option<&str>) -> String {
    let city = city.map(str::trim).filter(|s| !s.is_empty());
    let state = state.map(str::trim).filter(|s| !s.is_empty());
    let country = country.map(str::trim).filter(|s| !s.is_empty());

    match (city, state, country) {
        (Some(city), Some(state), _) => capitalize_location(&format!("{}, {}", city, state)),
        (Some(city), None, _) => capitalize_location(city),
        (None, _, Some(country)) => country.to_string(),
        _ => LOCATION_FALLBACK.to_string(),
    }
}

/// Title-cases each word; two-letter alphabetic words are treated as state
/// codes and upper-cased ("san jose, ca" -> "San Jose, CA").
pub fn capitalize_location(raw: &str) -> String {
    raw.split(' ')
        .filter(|w| !w.is_empty())
        .map(capitalize_location_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_location_word(word: &str) -> String {
    let core = word.trim_end_matches(',');
    let trailing = &word[core.len()..];

    if core.len() == 2 && core.chars().all(|c| c.is_ascii_alphabetic()) {
        return format!("{}{}", core.to_ascii_uppercase(), trailing);
    }

    // Hyphenated names ("wilkes-barre") get each part capitalized
    let capitalized = core
        .split('-')
        .map(title_case)
        .collect::<Vec<_>>()
        .join("-");
    format!("{}{}", capitalized, trailing)
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

// --- Employment type ---

pub fn employment_type(raw: &str) -> String {
    match raw.trim().to_uppercase().replace(['-', '_', ' '], "").as_str() {
        "FULLTIME" => "Full-time".to_string(),
        "PARTTIME" => "Part-time".to_string(),
        "CONTRACTOR" | "CONTRACT" => "Contract".to_string(),
        "INTERN" | "INTERNSHIP" => "Internship".to_string(),
        "TEMPORARY" => "Temporary".to_string(),
        _ => raw
            .split(|c: char| c == '_' || c.is_whitespace())
            .filter(|w| !w.is_empty())
            .map(title_case)
            .collect::<Vec<_>>()
            .join(" "),
    }
}

// --- Text ---

pub fn truncate_description(description: Option<&str>, max_chars: usize) -> String {
    let collapsed = description
        .unwrap_or("")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if collapsed.is_empty() {
        return DESCRIPTION_FALLBACK.to_string();
    }
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }

    let cut: String = collapsed.chars().take(max_chars).collect();
    let at_word = match cut.rfind(' ') {
        Some(idx) if idx > max_chars / 2 => &cut[..idx],
        _ => cut.as_str(),
    };
    let trimmed = at_word.trim_end_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace());
    format!("{}...", trimmed)
}

/// Char-safe truncation for table columns.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
