const SUMMARY_PREFIX: &str = "[TÓM TẮT TỰ ĐỘNG (GIẢ LẬP)]";
const SUMMARY_WORDS: usize = 50;
pub const EMPTY_CONTENT_SUMMARY: &str = "Nội dung trống hoặc file lỗi, không thể tóm tắt.";

/// Placeholder summary used when staff leave the content summary blank.
/// There is no summarization backend, the first words of the text stand in.
pub fn auto_summary(text: Option<&str>) -> String {
    let words = text
        .map(|text| text.split_whitespace().take(SUMMARY_WORDS).collect::<Vec<_>>())
        .unwrap_or_default();

    if words.is_empty() {
        return EMPTY_CONTENT_SUMMARY.to_string();
    }
    format!("{SUMMARY_PREFIX} {}...", words.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_fixed_message() {
        assert_eq!(auto_summary(None), EMPTY_CONTENT_SUMMARY);
        assert_eq!(auto_summary(Some("  \n ")), EMPTY_CONTENT_SUMMARY);
    }

    #[test]
    fn summary_keeps_first_fifty_words() {
        let text = (1..=80).map(|n| n.to_string()).collect::<Vec<_>>().join(" ");
        let summary = auto_summary(Some(&text));

        assert!(summary.starts_with("[TÓM TẮT TỰ ĐỘNG (GIẢ LẬP)] 1 2 3"));
        assert!(summary.ends_with(" 50..."));
        assert!(!summary.contains(" 51"));
    }
}
