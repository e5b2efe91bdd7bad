//! Cheap "is this already in the target language" heuristic.
//!
//! Scores a text by the share of its words that are common function words of
//! each supported language. Short texts are never judged, so titles are always
//! sent for translation unless they carry enough words to be conclusive.

/// Texts with fewer words than this are never considered already translated.
pub const MIN_WORDS: usize = 8;

/// Minimum share of function words for the target language to win.
pub const MIN_SCORE: f64 = 0.12;

const ENGLISH: &[&str] = &[
    "the", "and", "of", "to", "is", "in", "that", "it", "for", "with", "as", "was", "on", "are",
    "this", "be", "by", "or", "from", "which", "have", "not", "they", "their", "an", "at",
];
const FRENCH: &[&str] = &[
    "le", "la", "les", "de", "des", "du", "et", "est", "un", "une", "que", "qui", "dans", "pour",
    "pas", "sur", "au", "aux", "ce", "cette", "il", "elle", "sont", "avec", "par", "ne",
];
const GERMAN: &[&str] = &[
    "der", "die", "das", "und", "ist", "nicht", "ein", "eine", "zu", "den", "mit", "von", "sich",
    "des", "auf", "für", "im", "dem", "auch", "es", "sie", "wird", "werden", "oder", "aus", "bei",
];
const SPANISH: &[&str] = &[
    "el", "la", "los", "las", "de", "del", "y", "que", "en", "un", "una", "es", "por", "con",
    "para", "se", "su", "al", "lo", "como", "más", "pero", "sus", "le", "ya", "muy",
];
const ITALIAN: &[&str] = &[
    "il", "lo", "la", "gli", "le", "di", "del", "della", "e", "che", "è", "un", "una", "per",
    "non", "con", "sono", "nel", "nella", "si", "anche", "come", "ma", "questo", "ha", "dei",
];
const PORTUGUESE: &[&str] = &[
    "o", "os", "as", "de", "do", "da", "dos", "das", "e", "que", "em", "um", "uma", "para", "com",
    "não", "por", "mais", "se", "no", "na", "ao", "seu", "sua", "como", "foi",
];
const DUTCH: &[&str] = &[
    "de", "het", "een", "en", "van", "is", "dat", "niet", "op", "te", "zijn", "voor", "met", "die",
    "ook", "als", "er", "maar", "om", "aan", "bij", "nog", "worden", "wordt", "door", "naar",
];

const LANGUAGES: &[(&str, &[&str])] = &[
    ("en", ENGLISH),
    ("fr", FRENCH),
    ("de", GERMAN),
    ("es", SPANISH),
    ("it", ITALIAN),
    ("pt", PORTUGUESE),
    ("nl", DUTCH),
];

/// Normalize a language setting (`"en-US"`, `"English"`, `"fr_FR"`) to a code.
pub fn normalize(language: &str) -> String {
    let lowered = language.trim().to_lowercase();
    let code = lowered
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_string();
    match code.as_str() {
        "english" => "en".to_string(),
        "french" | "français" | "francais" => "fr".to_string(),
        "german" | "deutsch" => "de".to_string(),
        "spanish" | "español" | "espanol" => "es".to_string(),
        "italian" | "italiano" => "it".to_string(),
        "portuguese" | "português" | "portugues" => "pt".to_string(),
        "dutch" | "nederlands" => "nl".to_string(),
        _ => code,
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn score(words: &[String], stopwords: &[&str]) -> f64 {
    if words.is_empty() {
        return 0.0;
    }
    let hits = words
        .iter()
        .filter(|w| stopwords.contains(&w.as_str()))
        .count();
    hits as f64 / words.len() as f64
}

/// Whether `text` looks like it is already written in `language`.
///
/// Unsupported languages always answer `false`.
pub fn is_probably_in(text: &str, language: &str) -> bool {
    let code = normalize(language);
    let Some((_, target_words)) = LANGUAGES.iter().find(|(c, _)| *c == code) else {
        return false;
    };

    let words = words(text);
    if words.len() < MIN_WORDS {
        return false;
    }

    let target = score(&words, target_words);
    if target < MIN_SCORE {
        return false;
    }

    LANGUAGES
        .iter()
        .filter(|(c, _)| *c != code)
        .all(|(_, other)| score(&words, other) < target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_codes_and_names() {
        assert_eq!(normalize("en-US"), "en");
        assert_eq!(normalize(" French "), "fr");
        assert_eq!(normalize("pt_BR"), "pt");
        assert_eq!(normalize("ja"), "ja");
    }

    #[test]
    fn test_english_text_detected() {
        let text = "The history of the kingdom is told in the chronicles, and it is said that the king was loved by his people.";
        assert!(is_probably_in(text, "en"));
        assert!(!is_probably_in(text, "fr"));
    }

    #[test]
    fn test_french_text_detected() {
        let text = "Le royaume est né dans les montagnes, et la reine a construit une ville pour les habitants de la vallée.";
        assert!(is_probably_in(text, "fr"));
        assert!(!is_probably_in(text, "en"));
    }

    #[test]
    fn test_short_text_never_judged() {
        assert!(!is_probably_in("The Lore", "en"));
        assert!(!is_probably_in("", "en"));
    }

    #[test]
    fn test_unsupported_language_never_judged() {
        let text = "The history of the kingdom is told in the chronicles and in the songs of the people.";
        assert!(!is_probably_in(text, "ja"));
    }
}
