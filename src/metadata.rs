//! Filename-derived display metadata.
//!
//! Studio photos carry no embedded captions, so everything the gallery shows
//! beyond the artist and category is guessed from the file name:
//!
//! - **Style**: first rule in the category's ordered vocabulary with a keyword
//!   matching whole words of the stem (`sleeve-blackwork.jpg` → "Blackwork").
//! - **Date**: first date rule that finds a valid date, reduced to a `YYYY-MM`
//!   bucket (`PHOTO-2023-05-14.jpg` → `2023-05`).
//! - **Title**: the remaining words, title-cased; when nothing is left the
//!   title becomes `"<style> by <artist>"`.
//! - **Alt text**: composed from title, style, category and artist.
//!
//! Every guess reports a [`Confidence`], so a fallback label is never
//! indistinguishable from a real match.
//!
//! Rules are plain data. Additional style rules (from `[[metadata.styles]]`)
//! are consulted before the built-in ones; date rules can be appended with
//! [`MetadataRules::with_date_rule`].
//!
//! Everything here is pure: no I/O, deterministic for equal inputs.

use crate::config::MetadataConfig;
use crate::naming;
use crate::types::{Category, Confidence};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A style label and the keywords that select it.
///
/// Keywords are compared word-by-word: `"fine-line"` matches the consecutive
/// words `fine line`, `"ear"` matches the word `ear` but not `year`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    pub label: String,
    keywords: Vec<Vec<String>>,
}

impl StyleRule {
    pub fn new<S: AsRef<str>>(label: &str, keywords: &[S]) -> Self {
        let keywords = keywords
            .iter()
            .map(|k| {
                naming::words(k.as_ref())
                    .into_iter()
                    .map(str::to_lowercase)
                    .collect::<Vec<_>>()
            })
            .filter(|k| !k.is_empty())
            .collect();
        Self {
            label: label.to_string(),
            keywords,
        }
    }

    /// Does any keyword occur as a run of consecutive `words`?
    pub fn matches(&self, words: &[String]) -> bool {
        self.keywords.iter().any(|keyword| {
            words
                .windows(keyword.len())
                .any(|window| window == keyword.as_slice())
        })
    }
}

/// Ordered style rules for one category, with the label used when none match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    pub rules: Vec<StyleRule>,
    pub fallback: String,
}

impl Vocabulary {
    fn from_table(table: &[(&str, &[&str])], fallback: &str) -> Self {
        Self {
            rules: table
                .iter()
                .map(|&(label, keywords)| StyleRule::new(label, keywords))
                .collect(),
            fallback: fallback.to_string(),
        }
    }

    /// First matching label (dictionary order wins ties), or `None`.
    pub fn detect(&self, words: &[String]) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.matches(words))
            .map(|rule| rule.label.as_str())
    }
}

const TATTOO_STYLES: &[(&str, &[&str])] = &[
    (
        "Neo-Traditional",
        &["neo-traditional", "neotraditional", "neo-trad", "neotrad"],
    ),
    ("Traditional", &["traditional", "old-school", "oldschool"]),
    ("Blackwork", &["blackwork", "black-work"]),
    ("Fine Line", &["fineline", "fine-line", "single-needle"]),
    ("Realism", &["realism", "realistic", "black-and-grey", "black-grey"]),
    ("Watercolor", &["watercolor", "watercolour"]),
    ("Japanese", &["japanese", "irezumi"]),
    ("Geometric", &["geometric", "geometry"]),
    ("Dotwork", &["dotwork", "stipple", "pointillism"]),
    ("Tribal", &["tribal", "polynesian"]),
    ("Lettering", &["lettering", "script", "calligraphy"]),
    ("Minimalist", &["minimal", "minimalist"]),
    ("Illustrative", &["illustrative", "sketch"]),
    ("Cover-Up", &["coverup", "cover-up"]),
];

const PIERCING_STYLES: &[(&str, &[&str])] = &[
    ("Industrial", &["industrial"]),
    ("Helix", &["helix"]),
    ("Tragus", &["tragus"]),
    ("Conch", &["conch"]),
    ("Daith", &["daith"]),
    ("Rook", &["rook"]),
    ("Septum", &["septum"]),
    ("Nostril", &["nostril", "nose"]),
    ("Lip", &["lip", "labret", "monroe", "medusa"]),
    ("Eyebrow", &["eyebrow", "brow"]),
    ("Navel", &["navel", "belly"]),
    ("Tongue", &["tongue"]),
    ("Dermal", &["dermal", "microdermal"]),
    ("Lobe", &["lobe", "earlobe", "ear"]),
];

const PORTRAIT_STYLES: &[(&str, &[&str])] = &[
    ("Studio Portrait", &["studio"]),
    ("Artist Portrait", &["artist", "team"]),
];

const OTHER_STYLES: &[(&str, &[&str])] = &[
    ("Flash Sheet", &["flash"]),
    ("Studio Interior", &["studio", "interior", "shop"]),
];

/// Camera and export prefixes that never belong in a title.
const NOISE_WORDS: &[&str] = &["photo", "img", "dsc", "pxl"];

/// An ordered date pattern. The regex must capture year, month and day as
/// groups 1, 2 and 3.
#[derive(Debug, Clone)]
pub struct DateRule {
    pub name: &'static str,
    pattern: Regex,
}

impl DateRule {
    pub fn new(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
        })
    }

    /// First valid date in `text`: `(bucket, span of the whole match)`.
    fn find(&self, text: &str) -> Option<(String, Range<usize>)> {
        self.pattern.captures_iter(text).find_map(|caps| {
            let year: u32 = caps.get(1)?.as_str().parse().ok()?;
            let month: u32 = caps.get(2)?.as_str().parse().ok()?;
            let day: u32 = caps.get(3)?.as_str().parse().ok()?;
            if !(1900..=2099).contains(&year)
                || !(1..=12).contains(&month)
                || !(1..=31).contains(&day)
            {
                return None;
            }
            let whole = caps.get(0)?;
            Some((format!("{:04}-{:02}", year, month), whole.range()))
        })
    }
}

fn builtin_date_rules() -> Vec<DateRule> {
    // No lookaround in `regex`: the non-digit guards are part of the match.
    // `photo` goes first so its match takes the prefix along with the date.
    [
        ("photo", r"(?i)photo-([0-9]{4})-([0-9]{2})-([0-9]{2})(?:[^0-9]|$)"),
        ("iso", r"(?:^|[^0-9])([0-9]{4})-([0-9]{2})-([0-9]{2})(?:[^0-9]|$)"),
        ("compact", r"(?:^|[^0-9])([0-9]{4})([0-9]{2})([0-9]{2})(?:[^0-9]|$)"),
    ]
    .iter()
    .map(|&(name, pattern)| DateRule::new(name, pattern).expect("built-in date pattern"))
    .collect()
}

/// Output of the synthesizer for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedMetadata {
    pub title: String,
    pub alt: String,
    pub style: String,
    pub date: String,
    pub confidence: MetadataConfidence,
}

/// Per-field confidence, serialized into each manifest record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataConfidence {
    pub title: Confidence,
    pub style: Confidence,
    pub date: Confidence,
}

/// All filename heuristics, as data.
#[derive(Debug, Clone)]
pub struct MetadataRules {
    tattoo: Vocabulary,
    piercing: Vocabulary,
    portrait: Vocabulary,
    other: Vocabulary,
    date_rules: Vec<DateRule>,
    default_date: String,
}

impl MetadataRules {
    /// Built-in vocabularies and date patterns.
    pub fn builtin(default_date: &str) -> Self {
        Self {
            tattoo: Vocabulary::from_table(TATTOO_STYLES, "Custom Design"),
            piercing: Vocabulary::from_table(PIERCING_STYLES, "Professional Piercing"),
            portrait: Vocabulary::from_table(PORTRAIT_STYLES, "Portrait"),
            other: Vocabulary::from_table(OTHER_STYLES, "Studio Work"),
            date_rules: builtin_date_rules(),
            default_date: default_date.to_string(),
        }
    }

    /// Built-ins plus user style rules, which take precedence.
    pub fn from_config(config: &MetadataConfig, default_date: &str) -> Self {
        let mut rules = Self::builtin(default_date);
        // Reverse so that, after each is put in front, config order is kept.
        for style in config.styles.iter().rev() {
            rules = rules.with_style_rule(
                style.category,
                StyleRule::new(&style.label, style.keywords.as_slice()),
            );
        }
        rules
    }

    /// Put a style rule in front of the category's existing rules.
    pub fn with_style_rule(mut self, category: Category, rule: StyleRule) -> Self {
        self.vocabulary_mut(category).rules.insert(0, rule);
        self
    }

    /// Append a date rule after the existing ones.
    pub fn with_date_rule(mut self, rule: DateRule) -> Self {
        self.date_rules.push(rule);
        self
    }

    pub fn vocabulary(&self, category: Category) -> &Vocabulary {
        match category {
            Category::Tattoo => &self.tattoo,
            Category::Piercing => &self.piercing,
            Category::Portrait => &self.portrait,
            Category::Other => &self.other,
        }
    }

    fn vocabulary_mut(&mut self, category: Category) -> &mut Vocabulary {
        match category {
            Category::Tattoo => &mut self.tattoo,
            Category::Piercing => &mut self.piercing,
            Category::Portrait => &mut self.portrait,
            Category::Other => &mut self.other,
        }
    }

    /// Style label for a stem, and whether it came from a real match.
    pub fn detect_style(&self, stem: &str, category: Category) -> (String, Confidence) {
        let words = lowercase_words(stem);
        let vocabulary = self.vocabulary(category);
        match vocabulary.detect(&words) {
            Some(label) => (label.to_string(), Confidence::Heuristic),
            None => (vocabulary.fallback.clone(), Confidence::None),
        }
    }

    /// First valid date in the stem as a `YYYY-MM` bucket, with its span.
    pub fn extract_date(&self, stem: &str) -> Option<(String, Range<usize>)> {
        self.date_rules.iter().find_map(|rule| rule.find(stem))
    }

    /// Derive title, alt text, style and date bucket from a file name.
    pub fn synthesize(
        &self,
        filename: &str,
        artist: &str,
        category: Category,
    ) -> SynthesizedMetadata {
        let (stem, _) = naming::split_extension(filename);
        let (style, style_confidence) = self.detect_style(stem, category);

        let (date, date_confidence, title_source) = match self.extract_date(stem) {
            Some((bucket, span)) => {
                let mut without_date = String::with_capacity(stem.len());
                without_date.push_str(&stem[..span.start]);
                without_date.push(' ');
                without_date.push_str(&stem[span.end..]);
                (bucket, Confidence::Heuristic, without_date)
            }
            None => (self.default_date.clone(), Confidence::None, stem.to_string()),
        };

        let title_words: Vec<&str> = naming::words(&title_source)
            .into_iter()
            .filter(|w| !is_noise_word(w))
            .collect();
        let cleaned = naming::title_case(&title_words);

        let (title, title_confidence) = if cleaned.is_empty() {
            (format!("{} by {}", style, artist), Confidence::None)
        } else {
            (cleaned, Confidence::Heuristic)
        };

        let alt = compose_alt(&title, title_confidence, &style, artist, category);

        SynthesizedMetadata {
            title,
            alt,
            style,
            date,
            confidence: MetadataConfidence {
                title: title_confidence,
                style: style_confidence,
                date: date_confidence,
            },
        }
    }
}

fn lowercase_words(stem: &str) -> Vec<String> {
    naming::words(stem)
        .into_iter()
        .map(str::to_lowercase)
        .collect()
}

/// Camera prefixes and long bare sequence numbers (`IMG_4821`).
fn is_noise_word(word: &str) -> bool {
    let lower = word.to_lowercase();
    NOISE_WORDS.contains(&lower.as_str())
        || (word.len() >= 3 && word.bytes().all(|b| b.is_ascii_digit()))
}

fn compose_alt(
    title: &str,
    title_confidence: Confidence,
    style: &str,
    artist: &str,
    category: Category,
) -> String {
    let subject = match category {
        Category::Other => format!("{} by {}", style, artist),
        _ => format!("{} {} by {}", style, category.as_str(), artist),
    };
    match title_confidence {
        Confidence::Heuristic => format!("{} – {}", title, subject),
        Confidence::None => subject,
    }
}
