//! Pure text normalization for extracted cells: player-name casing, role codes
//! and locale-tolerant number parsing. Nothing here fails; unparsable input
//! falls back to a documented default.

use crate::core::types::LeagueVariant;

/// Surname particles kept lower-case after title-casing ("Mario de Rossi").
const NAME_PARTICLES: &[&str] = &[
    "de", "da", "di", "del", "della", "dello", "dei", "degli", "delle", "dal", "dalla", "dallo",
    "van", "von", "der", "den", "la", "lo", "le", "el", "do", "dos", "das", "du",
];

/// Collapse runs of whitespace (including NBSP) into single spaces.
pub fn clean_text(raw: &str) -> String {
    raw.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Names ────────────────────────────────────────────────────────────────────

fn is_fully_lowercase(s: &str) -> bool {
    s.chars().any(char::is_alphabetic) && !s.chars().any(char::is_uppercase)
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_boundary = true;
    for ch in s.chars() {
        if at_boundary && ch.is_alphabetic() {
            out.extend(ch.to_uppercase());
            at_boundary = false;
        } else {
            out.push(ch);
            at_boundary = matches!(ch, ' ' | '-' | '\'' | '’');
        }
    }
    out
}

/// Name casing. Only fully lower-case names are touched: each word is
/// title-cased, then surname particles after the first word go back to lower
/// case. Names that already carry capitals are returned unchanged (apart from
/// whitespace cleanup), which makes the function idempotent.
pub fn normalize_name(raw: &str) -> String {
    let cleaned = clean_text(raw);
    if !is_fully_lowercase(&cleaned) {
        return cleaned;
    }
    title_case(&cleaned)
        .split(' ')
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_lowercase();
            if i > 0 && NAME_PARTICLES.contains(&lower.as_str()) {
                lower
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Roles ────────────────────────────────────────────────────────────────────

/// Role normalization. Classic leagues collapse verbose role words to
/// P/D/C/A by substring containment; Mantra leagues keep their richer role
/// vocabulary and only get upper-cased.
pub fn normalize_role(raw: &str, variant: LeagueVariant) -> String {
    let trimmed = clean_text(raw);
    match variant {
        LeagueVariant::Mantra => trimmed.to_uppercase(),
        LeagueVariant::Classic => classic_role(&trimmed),
    }
}

fn classic_role(trimmed: &str) -> String {
    let lower = trimmed.to_lowercase();
    if matches!(lower.as_str(), "p" | "d" | "c" | "a") {
        return lower.to_uppercase();
    }
    const TABLE: &[(&[&str], &str)] = &[
        (&["portier", "por", "goalkeeper", "keeper"], "P"),
        (&["difens", "dif", "defender"], "D"),
        (&["centrocamp", "cen", "midfield"], "C"),
        (&["attacc", "att", "punta", "forward", "striker"], "A"),
    ];
    for (needles, code) in TABLE {
        if needles.iter().any(|n| lower.contains(n)) {
            return (*code).to_string();
        }
    }
    trimmed.to_uppercase()
}

/// Sort rank of a role code: goalkeeper 0, defender 1, midfielder 2,
/// attacker 3, unknown 4. For multi-role strings (`DC;DS`) the first token
/// decides.
pub fn role_rank(role: &str) -> u8 {
    let first = role
        .split(|c: char| matches!(c, ';' | ',' | '/' | ' '))
        .find(|t| !t.is_empty())
        .unwrap_or("")
        .to_uppercase();
    match first.as_str() {
        "P" | "POR" => 0,
        "D" | "DC" | "DD" | "DS" | "B" => 1,
        "C" | "E" | "M" => 2,
        "A" | "T" | "W" | "PC" => 3,
        _ => 4,
    }
}

// ── Numbers ──────────────────────────────────────────────────────────────────

/// Parse a decimal written either way round ("6,5", "6.5", "1.234,5").
/// Trailing markers such as `*` are ignored.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let s = clean_text(raw);
    let s = s.trim_end_matches(['*', '%']).trim();
    if s.is_empty() {
        return None;
    }
    let normalized = if s.contains(',') {
        s.replace('.', "").replace(',', ".")
    } else {
        s.to_string()
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn decimal_or(raw: &str, default: f64) -> f64 {
    parse_decimal(raw).unwrap_or(default)
}

/// Integer cell; accepts a leading `+` and decimals with a zero fraction ("12,0").
pub fn parse_int(raw: &str) -> Option<i64> {
    let s = clean_text(raw);
    let s = s.trim_end_matches(['.', '°', 'º']).trim_start_matches('+');
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    parse_decimal(s)
        .filter(|v| v.fract() == 0.0)
        .map(|v| v as i64)
}

pub fn int_or(raw: &str, default: i64) -> i64 {
    parse_int(raw).unwrap_or(default)
}

/// Decimal kept as text with a dot separator; `default` when unparsable.
pub fn decimal_text_or(raw: &str, default: &str) -> String {
    match parse_decimal(raw) {
        Some(v) => format_decimal(v),
        None => default.to_string(),
    }
}

/// Render with at least one fractional digit ("8.0", "6.5", "6.25").
pub fn format_decimal(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        v.to_string()
    }
}

pub fn is_numeric(raw: &str) -> bool {
    parse_decimal(raw).is_some()
}
