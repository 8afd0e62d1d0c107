//! Locale registry: plural rules and WordPress locale codes per GlotPress locale slug.
//!
//! Translation sets only carry a locale slug (`fr`, `pt-br`). Every export
//! format needs the number of plural forms and the plural expression, and
//! WordPress-style file names need the `wp_locale` code. This registry is
//! the single source of truth for that metadata.

use std::sync::OnceLock;

/// Metadata for a GlotPress locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    /// GlotPress locale slug (e.g., "fr", "pt-br")
    pub slug: String,

    /// English name (e.g., "Portuguese (Brazil)")
    pub english_name: String,

    /// WordPress locale code (e.g., "pt_BR")
    pub wp_locale: String,

    /// Number of plural forms
    pub nplurals: u32,

    /// C expression selecting the plural form for `n`
    pub plural_expression: String,
}

impl Locale {
    /// Value of the `Plural-Forms` header
    pub fn plural_forms(&self) -> String {
        format!("nplurals={}; plural={};", self.nplurals, self.plural_expression)
    }

    /// Locale used when the slug is not in the registry
    fn fallback(slug: &str) -> Self {
        Self {
            slug: slug.to_string(),
            english_name: slug.to_string(),
            wp_locale: slug.to_string(),
            nplurals: 2,
            plural_expression: "n != 1".to_string(),
        }
    }
}

struct LocaleDef {
    slug: &'static str,
    english_name: &'static str,
    wp_locale: &'static str,
    nplurals: u32,
    plural_expression: &'static str,
}

const GERMANIC: &str = "n != 1";
const ROMANCE_FR: &str = "n > 1";
const NO_PLURALS: &str = "0";
const SLAVIC_EAST: &str =
    "(n % 10 == 1 && n % 100 != 11) ? 0 : ((n % 10 >= 2 && n % 10 <= 4 && (n % 100 < 12 || n % 100 > 14)) ? 1 : 2)";

const LOCALES: &[LocaleDef] = &[
    LocaleDef { slug: "ar", english_name: "Arabic", wp_locale: "ar", nplurals: 6, plural_expression: "(n == 0) ? 0 : ((n == 1) ? 1 : ((n == 2) ? 2 : ((n % 100 >= 3 && n % 100 <= 10) ? 3 : ((n % 100 >= 11 && n % 100 <= 99) ? 4 : 5))))" },
    LocaleDef { slug: "cs", english_name: "Czech", wp_locale: "cs_CZ", nplurals: 3, plural_expression: "(n == 1) ? 0 : ((n >= 2 && n <= 4) ? 1 : 2)" },
    LocaleDef { slug: "da", english_name: "Danish", wp_locale: "da_DK", nplurals: 2, plural_expression: GERMANIC },
    LocaleDef { slug: "de", english_name: "German", wp_locale: "de_DE", nplurals: 2, plural_expression: GERMANIC },
    LocaleDef { slug: "de-ch", english_name: "German (Switzerland)", wp_locale: "de_CH", nplurals: 2, plural_expression: GERMANIC },
    LocaleDef { slug: "el", english_name: "Greek", wp_locale: "el", nplurals: 2, plural_expression: GERMANIC },
    LocaleDef { slug: "en-gb", english_name: "English (UK)", wp_locale: "en_GB", nplurals: 2, plural_expression: GERMANIC },
    LocaleDef { slug: "es", english_name: "Spanish (Spain)", wp_locale: "es_ES", nplurals: 2, plural_expression: GERMANIC },
    LocaleDef { slug: "es-mx", english_name: "Spanish (Mexico)", wp_locale: "es_MX", nplurals: 2, plural_expression: GERMANIC },
    LocaleDef { slug: "fa", english_name: "Persian", wp_locale: "fa_IR", nplurals: 1, plural_expression: NO_PLURALS },
    LocaleDef { slug: "fi", english_name: "Finnish", wp_locale: "fi", nplurals: 2, plural_expression: GERMANIC },
    LocaleDef { slug: "fr", english_name: "French (France)", wp_locale: "fr_FR", nplurals: 2, plural_expression: ROMANCE_FR },
    LocaleDef { slug: "he", english_name: "Hebrew", wp_locale: "he_IL", nplurals: 2, plural_expression: GERMANIC },
    LocaleDef { slug: "hu", english_name: "Hungarian", wp_locale: "hu_HU", nplurals: 2, plural_expression: GERMANIC },
    LocaleDef { slug: "id", english_name: "Indonesian", wp_locale: "id_ID", nplurals: 2, plural_expression: GERMANIC },
    LocaleDef { slug: "it", english_name: "Italian", wp_locale: "it_IT", nplurals: 2, plural_expression: GERMANIC },
    LocaleDef { slug: "ja", english_name: "Japanese", wp_locale: "ja", nplurals: 1, plural_expression: NO_PLURALS },
    LocaleDef { slug: "ko", english_name: "Korean", wp_locale: "ko_KR", nplurals: 1, plural_expression: NO_PLURALS },
    LocaleDef { slug: "nb", english_name: "Norwegian (Bokmål)", wp_locale: "nb_NO", nplurals: 2, plural_expression: GERMANIC },
    LocaleDef { slug: "nl", english_name: "Dutch", wp_locale: "nl_NL", nplurals: 2, plural_expression: GERMANIC },
    LocaleDef { slug: "pl", english_name: "Polish", wp_locale: "pl_PL", nplurals: 3, plural_expression: "(n == 1) ? 0 : ((n % 10 >= 2 && n % 10 <= 4 && (n % 100 < 12 || n % 100 > 14)) ? 1 : 2)" },
    LocaleDef { slug: "pt", english_name: "Portuguese (Portugal)", wp_locale: "pt_PT", nplurals: 2, plural_expression: GERMANIC },
    LocaleDef { slug: "pt-br", english_name: "Portuguese (Brazil)", wp_locale: "pt_BR", nplurals: 2, plural_expression: ROMANCE_FR },
    LocaleDef { slug: "ro", english_name: "Romanian", wp_locale: "ro_RO", nplurals: 3, plural_expression: "(n == 1) ? 0 : ((n == 0 || n % 100 >= 2 && n % 100 <= 19) ? 1 : 2)" },
    LocaleDef { slug: "ru", english_name: "Russian", wp_locale: "ru_RU", nplurals: 3, plural_expression: SLAVIC_EAST },
    LocaleDef { slug: "sk", english_name: "Slovak", wp_locale: "sk_SK", nplurals: 3, plural_expression: "(n == 1) ? 0 : ((n >= 2 && n <= 4) ? 1 : 2)" },
    LocaleDef { slug: "sv", english_name: "Swedish", wp_locale: "sv_SE", nplurals: 2, plural_expression: GERMANIC },
    LocaleDef { slug: "th", english_name: "Thai", wp_locale: "th", nplurals: 1, plural_expression: NO_PLURALS },
    LocaleDef { slug: "tr", english_name: "Turkish", wp_locale: "tr_TR", nplurals: 2, plural_expression: ROMANCE_FR },
    LocaleDef { slug: "uk", english_name: "Ukrainian", wp_locale: "uk", nplurals: 3, plural_expression: SLAVIC_EAST },
    LocaleDef { slug: "vi", english_name: "Vietnamese", wp_locale: "vi", nplurals: 1, plural_expression: NO_PLURALS },
    LocaleDef { slug: "zh-cn", english_name: "Chinese (China)", wp_locale: "zh_CN", nplurals: 1, plural_expression: NO_PLURALS },
    LocaleDef { slug: "zh-tw", english_name: "Chinese (Taiwan)", wp_locale: "zh_TW", nplurals: 1, plural_expression: NO_PLURALS },
];

/// Global locale registry.
pub struct LocaleRegistry {
    locales: Vec<Locale>,
}

static REGISTRY: OnceLock<LocaleRegistry> = OnceLock::new();

impl LocaleRegistry {
    /// Get the global registry instance, built on first access
    pub fn get() -> &'static LocaleRegistry {
        REGISTRY.get_or_init(|| LocaleRegistry {
            locales: LOCALES
                .iter()
                .map(|d| Locale {
                    slug: d.slug.to_string(),
                    english_name: d.english_name.to_string(),
                    wp_locale: d.wp_locale.to_string(),
                    nplurals: d.nplurals,
                    plural_expression: d.plural_expression.to_string(),
                })
                .collect(),
        })
    }

    pub fn by_slug(&self, slug: &str) -> Option<&Locale> {
        self.locales.iter().find(|l| l.slug.eq_ignore_ascii_case(slug))
    }

    /// Resolve a slug, falling back to two-form English-style plurals
    pub fn resolve(&self, slug: &str) -> Locale {
        self.by_slug(slug)
            .cloned()
            .unwrap_or_else(|| Locale::fallback(slug))
    }
}
