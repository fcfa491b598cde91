use std::collections::BTreeMap;

/// Sentinel used as the source language when the model should detect it.
pub const AUTO_DETECT: &str = "auto";

/// Label used when a detected code is not in the registry.
pub const UNKNOWN_LANGUAGE: &str = "Unknown language";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
}

pub const LANGUAGES: &[Language] = &[
    Language {
        code: "ko",
        name: "한국어",
    },
    Language {
        code: "en",
        name: "English",
    },
    Language {
        code: "ja",
        name: "日本語",
    },
    Language {
        code: "zh",
        name: "中文",
    },
    Language {
        code: "es",
        name: "Español",
    },
    Language {
        code: "fr",
        name: "Français",
    },
    Language {
        code: "de",
        name: "Deutsch",
    },
    Language {
        code: "ru",
        name: "Русский",
    },
    Language {
        code: "pt",
        name: "Português",
    },
    Language {
        code: "it",
        name: "Italiano",
    },
];

/// Find a registry entry by ISO 639-1 code, ignoring case and surrounding whitespace.
pub fn lookup(code: &str) -> Option<&'static Language> {
    let code = code.trim();
    LANGUAGES.iter().find(|l| l.code.eq_ignore_ascii_case(code))
}

/// Display name for a code, or the unknown-language label.
pub fn display_name(code: &str) -> &'static str {
    lookup(code).map(|l| l.name).unwrap_or(UNKNOWN_LANGUAGE)
}

/// The whole registry as a `code -> name` map, echoed back in every success payload.
pub fn supported_languages() -> BTreeMap<&'static str, &'static str> {
    LANGUAGES.iter().map(|l| (l.code, l.name)).collect()
}

/// Comma separated list of supported codes, sorted, for error messages.
pub fn supported_codes() -> String {
    let mut codes: Vec<&str> = LANGUAGES.iter().map(|l| l.code).collect();
    codes.sort_unstable();
    codes.join(", ")
}
