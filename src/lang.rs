//! Script classification and per-provider language code tables.
//!
//! Word counting for mixed CJK/Latin text is used all over the pipeline
//! (reconciler minimums, the gate's word cap, provider accounting), so it
//! lives here as a leaf module with no dependencies.

// ---------------------------------------------------------------------------
// Script classification
// ---------------------------------------------------------------------------

/// Returns `true` for CJK unified ideographs.
pub fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// Returns `true` for Japanese hiragana or katakana.
pub fn is_kana(c: char) -> bool {
    ('\u{3040}'..='\u{30ff}').contains(&c)
}

/// Returns `true` for Korean Hangul syllables.
pub fn is_hangul(c: char) -> bool {
    ('\u{ac00}'..='\u{d7af}').contains(&c)
}

/// Any character of the CJK family: ideographs, kana, or Hangul.
pub fn is_cjk_family(c: char) -> bool {
    is_cjk(c) || is_kana(c) || is_hangul(c)
}

/// Returns `true` when `text` contains at least one CJK ideograph.
pub fn has_cjk(text: &str) -> bool {
    text.chars().any(is_cjk)
}

/// Returns `true` when `text` contains any CJK-family character.
pub fn has_cjk_family(text: &str) -> bool {
    text.chars().any(is_cjk_family)
}

/// Count words in mixed text: each CJK-family character counts as one word,
/// each run of Latin letters counts as one word.
///
/// ```
/// use live_translate::lang::count_words;
///
/// assert_eq!(count_words("你好世界"), 4);
/// assert_eq!(count_words("hello world"), 2);
/// assert_eq!(count_words("你好 world"), 3);
/// assert_eq!(count_words(""), 0);
/// ```
pub fn count_words(text: &str) -> usize {
    let mut count = 0;
    let mut in_latin = false;
    for c in text.chars() {
        if is_cjk_family(c) {
            count += 1;
            in_latin = false;
        } else if c.is_ascii_alphabetic() {
            if !in_latin {
                count += 1;
                in_latin = true;
            }
        } else {
            in_latin = false;
        }
    }
    count
}

/// Count alphanumeric + CJK-family characters, the length measure used by
/// the language-mismatch detector.
pub fn significant_chars(text: &str) -> usize {
    text.chars()
        .filter(|&c| c.is_alphanumeric() || is_cjk_family(c))
        .count()
}

/// Fraction of significant characters that are CJK-family, and the fraction
/// that are Latin letters. Returns `(cjk_ratio, latin_ratio)`; both are 0.0
/// when the text has no significant characters.
pub fn script_ratios(text: &str) -> (f64, f64) {
    let mut cjk = 0usize;
    let mut latin = 0usize;
    let mut total = 0usize;
    for c in text.chars() {
        if is_cjk_family(c) {
            cjk += 1;
            total += 1;
        } else if c.is_ascii_alphabetic() {
            latin += 1;
            total += 1;
        } else if c.is_alphanumeric() {
            total += 1;
        }
    }
    if total == 0 {
        return (0.0, 0.0);
    }
    (cjk as f64 / total as f64, latin as f64 / total as f64)
}

/// Returns `true` when `lang` is a CJK-family language code.
pub fn lang_is_cjk(lang: &str) -> bool {
    matches!(lang, "zh" | "ja" | "ko")
}

// ---------------------------------------------------------------------------
// Provider language codes
// ---------------------------------------------------------------------------

/// Per-provider language code row: `(deepl, baidu, youdao, google)`.
///
/// `None` in the DeepL or Google slot means "let the service detect".
pub struct LangRow {
    pub deepl: Option<&'static str>,
    pub baidu: &'static str,
    pub youdao: &'static str,
    pub google: Option<&'static str>,
    pub name: &'static str,
}

/// Source-language row for `code`, defaulting to auto-detect.
pub fn source_row(code: &str) -> LangRow {
    lang_row(code).unwrap_or(LangRow {
        deepl: None,
        baidu: "auto",
        youdao: "auto",
        google: None,
        name: "the detected language",
    })
}

/// Target-language row for `code`, defaulting to English.
pub fn target_row(code: &str) -> LangRow {
    lang_row(code).unwrap_or(LangRow {
        deepl: Some("EN"),
        baidu: "en",
        youdao: "en",
        google: Some("en"),
        name: "English",
    })
}

fn lang_row(code: &str) -> Option<LangRow> {
    let (deepl, baidu, youdao, google, name) = match code {
        "zh" => (Some("ZH"), "zh", "zh-CHS", Some("zh"), "Chinese"),
        "ja" => (Some("JA"), "jp", "ja", Some("ja"), "Japanese"),
        "en" => (Some("EN"), "en", "en", Some("en"), "English"),
        "ko" => (Some("KO"), "kor", "ko", Some("ko"), "Korean"),
        "es" => (Some("ES"), "spa", "es", Some("es"), "Spanish"),
        "fr" => (Some("FR"), "fra", "fr", Some("fr"), "French"),
        "de" => (Some("DE"), "de", "de", Some("de"), "German"),
        "it" => (Some("IT"), "it", "it", Some("it"), "Italian"),
        "pt" => (Some("PT"), "pt", "pt", Some("pt"), "Portuguese"),
        "ru" => (Some("RU"), "ru", "ru", Some("ru"), "Russian"),
        "th" => (Some("TH"), "th", "th", Some("th"), "Thai"),
        "vi" => (Some("VI"), "vie", "vi", Some("vi"), "Vietnamese"),
        "id" => (Some("ID"), "id", "id", Some("id"), "Indonesian"),
        "tr" => (Some("TR"), "tr", "tr", Some("tr"), "Turkish"),
        "pl" => (Some("PL"), "pl", "pl", Some("pl"), "Polish"),
        "nl" => (Some("NL"), "nl", "nl", Some("nl"), "Dutch"),
        "uk" => (Some("UK"), "ukr", "uk", Some("uk"), "Ukrainian"),
        "ar" => (Some("AR"), "ara", "ar", Some("ar"), "Arabic"),
        "hi" => (Some("HI"), "hi", "hi", Some("hi"), "Hindi"),
        _ => return None,
    };
    Some(LangRow {
        deepl,
        baidu,
        youdao,
        google,
        name,
    })
}

/// Human-readable language name used in LLM prompts.
pub fn lang_name(code: &str) -> &'static str {
    match code {
        "auto" => "the detected language",
        other => lang_row(other).map(|r| r.name).unwrap_or("English"),
    }
}

/// Whether `lang` renders in Latin script (drives mixed-output repair).
pub fn lang_is_latin_script(lang: &str) -> bool {
    !matches!(lang, "zh" | "ja" | "ko" | "ar" | "he" | "th" | "hi" | "ru" | "uk" | "el" | "bn")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cjk_classification() {
        assert!(is_cjk('你'));
        assert!(!is_cjk('a'));
        assert!(is_kana('か'));
        assert!(is_kana('カ'));
        assert!(is_hangul('한'));
        assert!(is_cjk_family('好'));
        assert!(!is_cjk_family('!'));
    }

    #[test]
    fn count_words_mixed() {
        assert_eq!(count_words("你好世界"), 4);
        assert_eq!(count_words("hello world foo"), 3);
        assert_eq!(count_words("我们 are here"), 4);
        assert_eq!(count_words("123 456"), 0);
        assert_eq!(count_words(""), 0);
    }

    #[test]
    fn count_words_latin_runs_with_punctuation() {
        // Apostrophes split a token; hyphens too — matches token-run counting.
        assert_eq!(count_words("don't stop"), 3);
        assert_eq!(count_words("well-known"), 2);
    }

    #[test]
    fn script_ratios_pure_cjk() {
        let (cjk, latin) = script_ratios("你好世界");
        assert!((cjk - 1.0).abs() < 1e-9);
        assert!(latin.abs() < 1e-9);
    }

    #[test]
    fn script_ratios_pure_latin() {
        let (cjk, latin) = script_ratios("hello");
        assert!(cjk.abs() < 1e-9);
        assert!((latin - 1.0).abs() < 1e-9);
    }

    #[test]
    fn script_ratios_empty() {
        assert_eq!(script_ratios("…!?"), (0.0, 0.0));
    }

    #[test]
    fn significant_chars_skips_punctuation() {
        assert_eq!(significant_chars("a,b。你"), 3);
    }

    #[test]
    fn provider_rows() {
        let zh = source_row("zh");
        assert_eq!(zh.deepl, Some("ZH"));
        assert_eq!(zh.youdao, "zh-CHS");

        let auto = source_row("auto");
        assert!(auto.deepl.is_none());
        assert_eq!(auto.baidu, "auto");

        let fallback_target = target_row("xx");
        assert_eq!(fallback_target.deepl, Some("EN"));
    }

    #[test]
    fn lang_names() {
        assert_eq!(lang_name("zh"), "Chinese");
        assert_eq!(lang_name("auto"), "the detected language");
    }

    #[test]
    fn latin_script_targets() {
        assert!(lang_is_latin_script("en"));
        assert!(lang_is_latin_script("fr"));
        assert!(!lang_is_latin_script("zh"));
        assert!(!lang_is_latin_script("ja"));
    }
}
