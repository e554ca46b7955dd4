//! Text normalization, content hashing and provider-safe chunking.
//!
//! The content hash is the cache key for synthesized audio: it is computed
//! over the *normalized* text only, so formatting-only edits (extra spaces,
//! newlines, zero-width characters) never invalidate a cached track, while a
//! one-character content change always does. Voice and variant are never part
//! of the hash; they are disambiguated by the composite track key.

use sha2::{Digest, Sha256};

/// Default maximum chunk size sent to the synthesis provider, in characters.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 3000;

/// Zero-width characters stripped during normalization.
const ZERO_WIDTH: [char; 4] = ['\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}'];

/// Collapse whitespace runs to single spaces, strip zero-width characters
/// and trim the result.
pub fn normalize_text(text: &str) -> String {
    let stripped: String = text.chars().filter(|c| !ZERO_WIDTH.contains(c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Hex-encoded SHA-256 digest of the normalized text.
pub fn content_hash(text: &str) -> String {
    let normalized = normalize_text(text);
    let digest = Sha256::digest(normalized.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Split text into provider-safe chunks of at most `max_chars` characters.
///
/// The input is normalized first. Chunks partition the normalized text
/// exactly: concatenating them reproduces it, so the character total billed
/// across chunks always equals the normalized length. Splits prefer sentence
/// boundaries; a single sentence longer than `max_chars` is hard-split on a
/// character boundary.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let normalized = normalize_text(text);
    if normalized.is_empty() {
        return Vec::new();
    }
    if normalized.chars().count() <= max_chars {
        return vec![normalized];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for sentence in sentence_segments(&normalized) {
        let sentence_len = sentence.chars().count();

        if current_len + sentence_len > max_chars && current_len > 0 {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if sentence_len > max_chars {
            // Oversized sentence: hard-split at the character limit.
            for piece in hard_split(sentence, max_chars) {
                chunks.push(piece.to_string());
            }
        } else {
            current.push_str(sentence);
            current_len += sentence_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Partition text into sentence segments. Each segment ends just after the
/// space following terminal punctuation, so segments concatenate back to the
/// original text without loss.
fn sentence_segments(text: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut prev_was_terminal = false;

    for (idx, ch) in text.char_indices() {
        if prev_was_terminal && ch == ' ' {
            let end = idx + ch.len_utf8();
            segments.push(&text[start..end]);
            start = end;
        }
        prev_was_terminal = matches!(ch, '.' | '!' | '?');
    }

    if start < text.len() {
        segments.push(&text[start..]);
    }

    segments
}

/// Split a segment into pieces of at most `max_chars` characters, respecting
/// UTF-8 boundaries.
fn hard_split(segment: &str, max_chars: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in segment.char_indices() {
        if count == max_chars {
            pieces.push(&segment[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }

    if start < segment.len() {
        pieces.push(&segment[start..]);
    }

    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_text("hello   world\n\ttest"), "hello world test");
    }

    #[test]
    fn test_normalize_strips_zero_width() {
        assert_eq!(normalize_text("he\u{200B}llo \u{FEFF}world"), "hello world");
    }

    #[test]
    fn test_normalize_trims() {
        assert_eq!(normalize_text("  padded  "), "padded");
    }

    #[test]
    fn test_hash_insensitive_to_formatting() {
        let a = content_hash("The quick brown fox.");
        let b = content_hash("  The   quick \n brown\tfox.  ");
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_sensitive_to_content() {
        let a = content_hash("The quick brown fox.");
        let b = content_hash("The quick brown fix.");
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let h = content_hash("hello");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_chunk_short_text_single_chunk() {
        let chunks = chunk_text("Just one short sentence.", 3000);
        assert_eq!(chunks, vec!["Just one short sentence.".to_string()]);
    }

    #[test]
    fn test_chunk_splits_at_sentence_boundaries() {
        let text = "First sentence here. Second sentence here. Third one.";
        let chunks = chunk_text(text, 25);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 25, "chunk too long: {chunk:?}");
        }
    }

    #[test]
    fn test_chunk_round_trip_preserves_every_character() {
        let text = "One sentence. Another sentence! A question? Final words here.";
        let normalized = normalize_text(text);
        for max in [10, 20, 25, 40, 3000] {
            let chunks = chunk_text(text, max);
            assert_eq!(chunks.concat(), normalized, "max={max}");
            let total: usize = chunks.iter().map(|c| c.chars().count()).sum();
            assert_eq!(total, normalized.chars().count(), "max={max}");
        }
    }

    #[test]
    fn test_chunk_hard_splits_oversized_sentence() {
        let long = "a".repeat(95);
        let chunks = chunk_text(&long, 30);
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.chars().count() <= 30));
        assert_eq!(chunks.concat(), long);
    }

    #[test]
    fn test_chunk_hard_split_respects_utf8() {
        let long = "é".repeat(10);
        let chunks = chunk_text(&long, 3);
        assert_eq!(chunks.concat(), long);
    }

    #[test]
    fn test_chunk_empty_text() {
        assert!(chunk_text("   ", 3000).is_empty());
    }
}
