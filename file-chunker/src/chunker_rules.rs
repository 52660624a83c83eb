//! Sentence boundary detection shared by every chunking strategy.
//!
//! Boundaries are language-independent Unicode sentence terminators (`.`,
//! `!`, `?`, and their full-width/ideographic equivalents) plus a small set
//! of CJK-specific closing punctuation, so a sentence ending in a closing
//! quote or bracket is not split mid-punctuation. The ASCII terminators only
//! end a sentence when followed by whitespace and a capital letter (or the
//! end of the text); this keeps abbreviations and decimals ("Mr.", "3.14",
//! "U.S.A.") from being split mid-token. The full-width/ideographic
//! terminators have no such lookahead and always end a sentence.

const ASCII_TERMINATORS: &[char] = &['.', '!', '?'];
const WIDE_TERMINATORS: &[char] = &['。', '！', '？', '．'];
const TERMINATORS: &[char] = &['.', '!', '?', '。', '！', '？', '．'];
const TRAILING_CLOSERS: &[char] = &['”', '’', '）', ')', '」', '』', '"', '\''];

/// Whether the terminator ending at `chars[..j]` is followed by whitespace
/// and then an uppercase letter, or by nothing at all (end of text).
fn followed_by_whitespace_and_capital(chars: &[(usize, char)], j: usize) -> bool {
    if j >= chars.len() {
        return true;
    }
    let mut k = j;
    let mut saw_whitespace = false;
    while k < chars.len() && chars[k].1.is_whitespace() {
        saw_whitespace = true;
        k += 1;
    }
    if !saw_whitespace {
        return false;
    }
    k >= chars.len() || chars[k].1.is_uppercase()
}

/// Byte-offset `[start, end)` spans of each sentence in `text`. Spans are
/// contiguous and cover the whole string; a trailing fragment with no
/// terminator becomes its own final span.
pub fn sentence_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0usize;
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut i = 0usize;
    while i < chars.len() {
        let (idx, ch) = chars[i];
        if TERMINATORS.contains(&ch) {
            let mut end = idx + ch.len_utf8();
            let mut j = i + 1;
            while j < chars.len() && TRAILING_CLOSERS.contains(&chars[j].1) {
                end = chars[j].0 + chars[j].1.len_utf8();
                j += 1;
            }

            let should_split = if ASCII_TERMINATORS.contains(&ch) {
                followed_by_whitespace_and_capital(&chars, j)
            } else {
                debug_assert!(WIDE_TERMINATORS.contains(&ch));
                true
            };

            if should_split {
                if end > start {
                    spans.push((start, end));
                }
                start = end;
                i = j;
                continue;
            }
        }
        i += 1;
    }
    if start < text.len() {
        spans.push((start, text.len()));
    }
    if spans.is_empty() && !text.is_empty() {
        spans.push((0, text.len()));
    }
    spans
}

/// Word-boundary byte offsets: `[start, end)` of every maximal run of
/// non-whitespace. Used by the word-count chunking strategy.
pub fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if let Some(s) = start.take() {
                spans.push((s, idx));
            }
        } else if start.is_none() {
            start = Some(idx);
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_ascii_sentences() {
        let spans = sentence_spans("Hello world. How are you? Fine!");
        assert_eq!(spans.len(), 3);
    }

    #[test]
    fn splits_japanese_sentences() {
        let spans = sentence_spans("これは文です。元気ですか?");
        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn keeps_trailing_closing_quote_with_sentence() {
        let text = "She said \u{201c}hi.\u{201d} Then left.";
        let spans = sentence_spans(text);
        assert_eq!(&text[spans[0].0..spans[0].1], "She said \u{201c}hi.\u{201d}");
    }

    #[test]
    fn counts_words() {
        let spans = word_spans("one two  three");
        assert_eq!(spans.len(), 3);
    }

    #[test]
    fn does_not_split_decimals_or_acronyms() {
        assert_eq!(sentence_spans("Pi is about 3.14 here.").len(), 1);
        assert_eq!(sentence_spans("She lives in the U.S.A. now.").len(), 1);
    }

    #[test]
    fn splits_only_when_terminator_is_followed_by_whitespace_and_a_capital() {
        let text = "one.two. Three";
        let spans = sentence_spans(text);
        // The first period has no whitespace-then-capital after it, so it
        // stays joined with "two."; the second period is followed by
        // " Three" and does end the sentence there.
        assert_eq!(spans.len(), 2);
        assert_eq!(&text[spans[0].0..spans[0].1], "one.two.");
    }
}
