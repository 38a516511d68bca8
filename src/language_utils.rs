/*!
 * Language and script utilities.
 *
 * Helpers for mapping language codes to writing systems and detecting
 * residual source-script characters in translated text. A completed task
 * whose text still carries source-script characters is only partially
 * translated and must be picked up again by the processor.
 */

/// Writing system associated with a language code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    /// CJK unified ideographs
    Han,
    /// Cyrillic alphabet
    Cyrillic,
    /// Arabic alphabet
    Arabic,
    /// Latin alphabet
    Latin,
}

/// Map an ISO 639-1 language code to its dominant script
///
/// Returns `None` for codes the engine has no script table for; callers
/// must treat that as "cannot detect" rather than "no residue".
pub fn script_for_language(code: &str) -> Option<Script> {
    match code.to_lowercase().as_str() {
        "zh" | "ja" => Some(Script::Han),
        "ru" | "uk" | "bg" | "sr" => Some(Script::Cyrillic),
        "ar" | "fa" | "ur" => Some(Script::Arabic),
        "en" | "fr" | "de" | "es" | "it" | "pt" | "nl" | "pl" | "tr" | "vi" | "id" => {
            Some(Script::Latin)
        }
        _ => None,
    }
}

/// Check whether a character belongs to the given script
fn char_in_script(c: char, script: Script) -> bool {
    match script {
        Script::Han => {
            matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '\u{F900}'..='\u{FAFF}')
        }
        Script::Cyrillic => matches!(c, '\u{0400}'..='\u{04FF}' | '\u{0500}'..='\u{052F}'),
        Script::Arabic => matches!(c, '\u{0600}'..='\u{06FF}' | '\u{0750}'..='\u{077F}'),
        Script::Latin => c.is_ascii_alphabetic(),
    }
}

/// Check whether text contains at least one character of the given script
pub fn contains_script(text: &str, script: Script) -> bool {
    text.chars().any(|c| char_in_script(c, script))
}

/// Check whether text still carries characters of the source language's script
///
/// Used as the reprocessing trigger for completed rows and as the confidence
/// check of the dictionary translation strategy. Unknown source languages
/// report `false` so they never cause spurious reprocessing.
pub fn contains_source_script(text: &str, source_language: &str) -> bool {
    match script_for_language(source_language) {
        Some(script) => contains_script(text, script),
        None => false,
    }
}

/// Normalize text for use as a cache key
///
/// Trims and collapses internal whitespace runs so that cosmetic variations
/// of the same source string share one cache entry.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
