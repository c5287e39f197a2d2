//! Tolerant extraction of `story_text` from partial JSON.
//!
//! While a response streams in, the accumulated text is not yet valid JSON.
//! This scanner finds the `story_text` value and returns as much of it as
//! has arrived, unescaping as it goes, so the player can read the narrative
//! while the model is still writing the state deltas.

/// Extract the (possibly still-growing) `story_text` value from a JSON
/// prefix. Returns None until the opening quote of the value has arrived.
pub fn extract_story_text(partial: &str) -> Option<String> {
    let key_pos = partial.find("\"story_text\"")?;
    let after_key = &partial[key_pos + "\"story_text\"".len()..];
    let colon = after_key.find(':')?;
    let after_colon = &after_key[colon + 1..];
    let quote = after_colon.find('"')?;
    let value = &after_colon[quote + 1..];

    let mut out = String::new();
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        match c {
            // Closing quote: the value is complete.
            '"' => return Some(out),
            '\\' => match chars.next() {
                // Escape split across a chunk boundary; stop before it.
                None => break,
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some('/') => out.push('/'),
                Some('u') => {
                    let hex: String = chars.by_ref().take(4).collect();
                    if hex.len() < 4 {
                        break;
                    }
                    if let Some(ch) = u32::from_str_radix(&hex, 16)
                        .ok()
                        .and_then(char::from_u32)
                    {
                        out.push(ch);
                    }
                }
                Some(other) => out.push(other),
            },
            _ => out.push(c),
        }
    }

    // Unterminated value: return what has arrived so far.
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_key_yet() {
        assert_eq!(extract_story_text(r#"{"story_"#), None);
        assert_eq!(extract_story_text(r#"{"story_text""#), None);
        assert_eq!(extract_story_text(r#"{"story_text": "#), None);
    }

    #[test]
    fn test_growing_value() {
        assert_eq!(
            extract_story_text(r#"{"story_text": "The wol"#),
            Some("The wol".to_string())
        );
        assert_eq!(
            extract_story_text(r#"{"story_text": "The wolf lunges"#),
            Some("The wolf lunges".to_string())
        );
    }

    #[test]
    fn test_complete_value_stops_at_quote() {
        let partial = r#"{"story_text": "The wolf lunges.", "choices": [{"id"#;
        assert_eq!(
            extract_story_text(partial),
            Some("The wolf lunges.".to_string())
        );
    }

    #[test]
    fn test_escapes_are_unescaped() {
        let partial = r#"{"story_text": "He says \"run\".\nYou run"#;
        assert_eq!(
            extract_story_text(partial),
            Some("He says \"run\".\nYou run".to_string())
        );
    }

    #[test]
    fn test_dangling_escape_at_boundary() {
        let partial = r#"{"story_text": "A shadow moves\"#;
        assert_eq!(extract_story_text(partial), Some("A shadow moves".to_string()));
    }

    #[test]
    fn test_unicode_escape() {
        let partial = r#"{"story_text": "500\u00a0men"#;
        assert_eq!(
            extract_story_text(partial),
            Some("500\u{a0}men".to_string())
        );
    }

    #[test]
    fn test_partial_unicode_escape_is_dropped() {
        let partial = r#"{"story_text": "swords\u00"#;
        assert_eq!(extract_story_text(partial), Some("swords".to_string()));
    }
}
