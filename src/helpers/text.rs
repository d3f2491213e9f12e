//! Word counting and read-time estimation

use crate::content::{richtext, ContentBlock};

/// Reading speed used for the article read-time estimate
const WORDS_PER_MINUTE: usize = 200;

/// Count whitespace-delimited words in a piece of plain text
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Total word count of a document: every heading plus the text of every
/// body node across all content blocks
pub fn total_words(content: &[ContentBlock]) -> usize {
    content
        .iter()
        .map(|block| count_words(&block.heading) + count_words(&richtext::as_text(&block.body)))
        .sum()
}

/// Estimated read time in whole minutes, rounded up.
/// Any non-empty content sequence reads as at least one minute.
pub fn read_time_minutes(content: &[ContentBlock]) -> usize {
    if content.is_empty() {
        return 0;
    }
    total_words(content).div_ceil(WORDS_PER_MINUTE).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::richtext::RichTextNode;

    fn block(heading: &str, body_texts: &[&str]) -> ContentBlock {
        ContentBlock {
            heading: heading.to_string(),
            body: body_texts.iter().map(|t| RichTextNode::paragraph(t)).collect(),
        }
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words("hello world foo"), 3);
        assert_eq!(count_words("  spaced   out\twords\n"), 3);
        assert_eq!(count_words(""), 0);
    }

    #[test]
    fn test_read_time_example() {
        // 2-word heading + 3-word body = 5 words -> 1 minute
        let content = vec![block("Intro section", &["hello world foo"])];
        assert_eq!(total_words(&content), 5);
        assert_eq!(read_time_minutes(&content), 1);
    }

    #[test]
    fn test_read_time_rounds_up() {
        let long = vec!["word"; 201].join(" ");
        let content = vec![block("", &[long.as_str()])];
        assert_eq!(total_words(&content), 201);
        assert_eq!(read_time_minutes(&content), 2);
    }

    #[test]
    fn test_read_time_is_monotonic() {
        let mut previous = 0;
        for words in [1, 100, 200, 201, 399, 400, 1000] {
            let text = vec!["w"; words].join(" ");
            let content = vec![block("", &[text.as_str()])];
            let minutes = read_time_minutes(&content);
            assert!(minutes >= previous, "read time decreased at {} words", words);
            previous = minutes;
        }
    }

    #[test]
    fn test_non_empty_content_is_at_least_one_minute() {
        let content = vec![block("", &[""])];
        assert_eq!(read_time_minutes(&content), 1);
    }

    #[test]
    fn test_empty_content_is_zero() {
        assert_eq!(read_time_minutes(&[]), 0);
    }
}
