use deunicode::deunicode;
use regex::Regex;

const MAX_FILENAME_LENGTH: usize = 200;

/// Turn an arbitrary string into a filesystem-safe base name.
///
/// Total and idempotent: never fails, never returns an empty string, output
/// is at most 200 characters with no leading or trailing dots, spaces, or
/// underscores.
pub fn sanitize_filename(name: &str) -> String {
    // Fold diacritics to ASCII first so the punctuation pass only has to
    // deal with plain quote characters (ä -> a, é -> e, curly -> straight).
    let folded = deunicode(name);

    let punctuation = Regex::new(r#"['‘’“”"`,;:!?]"#).unwrap();
    let stripped = punctuation.replace_all(&folded, "");

    // OS-reserved names, path separators, control characters.
    let replaced = sanitize_filename::sanitize_with_options(
        stripped.as_ref(),
        sanitize_filename::Options {
            windows: true,
            truncate: true,
            replacement: "_",
        },
    );

    let spaces = Regex::new(r"\s+").unwrap();
    let underscores = Regex::new(r"_+").unwrap();
    let trailing = Regex::new(r"[.\s_]+$").unwrap();
    let leading = Regex::new(r"^[.\s_]+").unwrap();

    let mut cleaned = spaces.replace_all(&replaced, " ").to_string();
    cleaned = underscores.replace_all(&cleaned, "_").to_string();
    cleaned = trailing.replace_all(&cleaned, "").to_string();
    cleaned = leading.replace_all(&cleaned, "").to_string();

    if cleaned.is_empty() {
        cleaned = "untitled".to_string();
    }

    if cleaned.chars().count() > MAX_FILENAME_LENGTH {
        cleaned = cleaned.chars().take(MAX_FILENAME_LENGTH).collect();
        // The cut can land on a dot or underscore; re-strip so the
        // no-trailing-junk contract survives truncation.
        cleaned = trailing.replace_all(&cleaned, "").to_string();
    }

    cleaned.trim().to_string()
}
