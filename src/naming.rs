//! Filename conventions shared by the scanner and the metadata synthesizer.
//!
//! ## Generated variants
//!
//! Variants are written as `<id>@<width>w.<ext>` (e.g. `debi-rose@800w.webp`).
//! A file whose stem ends in `@<digits>w` is therefore never treated as an
//! original, even if it sits inside the input tree.
//!
//! ## Display words
//!
//! Stems are split into words on `-`, `_`, `.`, `@` and whitespace. Size tokens
//! (`800w`) are dropped so `sleeve-blackwork@800w` reads as "Sleeve Blackwork".

/// Split a file name into `(stem, extension)`. The extension excludes the dot.
pub fn split_extension(filename: &str) -> (&str, Option<&str>) {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (filename, None),
    }
}

/// Does this stem end in a generated-variant suffix (`@<digits>w`)?
pub fn has_variant_suffix(stem: &str) -> bool {
    match stem.rsplit_once('@') {
        Some((_, suffix)) => is_size_token(suffix),
        None => false,
    }
}

/// Is this file name a generated variant (`name@800w.webp`)?
pub fn is_variant_filename(filename: &str) -> bool {
    let (stem, _) = split_extension(filename);
    has_variant_suffix(stem)
}

/// A width token like `800w` (digits followed by `w`).
pub fn is_size_token(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    match lower.strip_suffix('w') {
        Some(digits) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Split a stem into words, dropping empty pieces and size tokens.
pub fn words(stem: &str) -> Vec<&str> {
    stem.split(|c: char| matches!(c, '-' | '_' | '.' | '@') || c.is_whitespace())
        .filter(|w| !w.is_empty() && !is_size_token(w))
        .collect()
}

/// Capitalize the first letter of each word, lowercase the rest.
///
/// `"sleeve BLACKWORK"` → `"Sleeve Blackwork"`.
pub fn title_case(words: &[&str]) -> String {
    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

const MAX_SLUG_LEN: usize = 80;

/// Sanitize text for use in ids, file names and URLs.
///
/// - Lowercases ASCII letters
/// - Replaces anything that is not `[a-z0-9-]` with a dash
/// - Collapses consecutive dashes and strips leading/trailing ones
/// - Truncates to `MAX_SLUG_LEN` characters (at the last dash before the limit)
pub fn sanitize_slug(text: &str) -> String {
    let mut collapsed = String::with_capacity(text.len());
    let mut prev_dash = true;
    for c in text.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            collapsed.push(c);
            prev_dash = false;
        } else if !prev_dash {
            collapsed.push('-');
            prev_dash = true;
        }
    }
    let trimmed = collapsed.trim_end_matches('-');

    if trimmed.len() <= MAX_SLUG_LEN {
        return trimmed.to_string();
    }
    let cut = &trimmed[..MAX_SLUG_LEN];
    match cut.rfind('-') {
        Some(pos) if pos > 0 => cut[..pos].to_string(),
        _ => cut.to_string(),
    }
}
