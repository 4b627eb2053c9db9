/// Trim entry text. Returns `None` when nothing is left.
pub fn normalize_entry_text(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

/// Word and character count shown next to each entry.
///
/// Computed once when the entry is created and stored with it.
pub fn summarize(text: &str) -> String {
    let words = text.split_whitespace().count();
    let characters = text.chars().filter(|c| !c.is_whitespace()).count();
    format!("{} palabras • {} caracteres", words, characters)
}

pub fn build_full_name(first: &str, last: &str) -> String {
    match (first.is_empty(), last.is_empty()) {
        (true, true) => String::new(),
        (true, false) => last.to_string(),
        (false, true) => first.to_string(),
        (false, false) => format!("{} {}", first, last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_counts_words_and_non_space_chars() {
        assert_eq!(summarize("hola  mundo\ncruel"), "3 palabras • 14 caracteres");
        assert_eq!(summarize("análisis"), "1 palabras • 8 caracteres");
    }

    #[test]
    fn test_normalize_rejects_blank() {
        assert_eq!(normalize_entry_text("   \n\t"), None);
        assert_eq!(normalize_entry_text("  texto "), Some("texto"));
    }

    #[test]
    fn test_full_name() {
        assert_eq!(build_full_name("", ""), "");
        assert_eq!(build_full_name("Ana", ""), "Ana");
        assert_eq!(build_full_name("", "Ruiz"), "Ruiz");
        assert_eq!(build_full_name("Ana", "Ruiz"), "Ana Ruiz");
    }
}
