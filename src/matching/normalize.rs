// src/matching/normalize.rs - Place-name folding shared by the index and the candidate generator
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use strsim::normalized_levenshtein;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Letters that NFKD leaves intact but that readers treat as plain ASCII.
const CHAR_SUBSTITUTIONS: [(char, &str); 12] = [
    ('ß', "ss"),
    ('æ', "ae"),
    ('Æ', "ae"),
    ('œ', "oe"),
    ('Œ', "oe"),
    ('ø', "o"),
    ('Ø', "o"),
    ('ł', "l"),
    ('Ł', "l"),
    ('đ', "d"),
    ('Đ', "d"),
    ('ı', "i"),
];

const LEADING_ARTICLES: [&str; 1] = ["the "];

/// Demonyms that may stand in for a country mention ("the French delegation").
pub const DEMONYMS: [(&str, &str); 40] = [
    ("afghan", "AF"),
    ("american", "US"),
    ("argentine", "AR"),
    ("australian", "AU"),
    ("austrian", "AT"),
    ("belgian", "BE"),
    ("brazilian", "BR"),
    ("british", "GB"),
    ("canadian", "CA"),
    ("chilean", "CL"),
    ("chinese", "CN"),
    ("colombian", "CO"),
    ("cuban", "CU"),
    ("danish", "DK"),
    ("dutch", "NL"),
    ("egyptian", "EG"),
    ("english", "GB"),
    ("french", "FR"),
    ("german", "DE"),
    ("greek", "GR"),
    ("indian", "IN"),
    ("iranian", "IR"),
    ("iraqi", "IQ"),
    ("irish", "IE"),
    ("israeli", "IL"),
    ("italian", "IT"),
    ("japanese", "JP"),
    ("kenyan", "KE"),
    ("korean", "KR"),
    ("mexican", "MX"),
    ("nigerian", "NG"),
    ("norwegian", "NO"),
    ("pakistani", "PK"),
    ("polish", "PL"),
    ("portuguese", "PT"),
    ("russian", "RU"),
    ("spanish", "ES"),
    ("swedish", "SE"),
    ("turkish", "TR"),
    ("ukrainian", "UA"),
];

static DEMONYM_LOOKUP: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| DEMONYMS.iter().copied().collect());

/// Case- and diacritic-folded form of a place name, with punctuation
/// collapsed to single spaces. "  Saint-Étienne " and "saint etienne" fold to
/// the same key.
pub fn fold_name(name: &str) -> String {
    let mut folded = String::with_capacity(name.len());
    for c in name.trim().nfkd() {
        if is_combining_mark(c) {
            continue;
        }
        if let Some((_, replacement)) = CHAR_SUBSTITUTIONS.iter().find(|(from, _)| *from == c) {
            folded.push_str(replacement);
            continue;
        }
        if c == '\'' || c == '’' || c == '.' {
            // "St. John's" -> "st johns"
            continue;
        }
        if c.is_alphanumeric() {
            folded.extend(c.to_lowercase());
        } else {
            folded.push(' ');
        }
    }
    WHITESPACE.replace_all(folded.trim(), " ").into_owned()
}

/// Lookup keys for a mention, most literal first: the folded mention, then
/// the folded mention without a leading article ("The Hague" -> "hague").
pub fn mention_variants(mention: &str) -> Vec<String> {
    let folded = fold_name(mention);
    let mut variants = vec![folded.clone()];
    for article in LEADING_ARTICLES {
        if let Some(stripped) = folded.strip_prefix(article) {
            if !stripped.is_empty() {
                variants.push(stripped.to_string());
            }
        }
    }
    variants
}

pub fn demonym_country(folded_mention: &str) -> Option<&'static str> {
    DEMONYM_LOOKUP.get(folded_mention).copied()
}

/// Padded character trigrams of a folded key.
pub fn trigrams(folded: &str) -> BTreeSet<String> {
    let padded: Vec<char> = format!("  {} ", folded).chars().collect();
    padded
        .windows(3)
        .map(|window| window.iter().collect::<String>())
        .collect()
}

/// Similarity in [0, 1] between two folded keys: the better of plain
/// edit-distance similarity and edit-distance over sorted tokens, so
/// "york new" still scores against "new york".
pub fn name_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let direct = normalized_levenshtein(a, b);
    let sorted_a = sorted_tokens(a);
    let sorted_b = sorted_tokens(b);
    let token_sorted = normalized_levenshtein(&sorted_a, &sorted_b);
    direct.max(token_sorted)
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}
