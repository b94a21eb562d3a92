//! Sentence-level chunking under a character-based token estimate.
//!
//! Sizes are estimated as `chars / 3` everywhere (sentences, words, and
//! system prompt plus chunk alike). This is a deliberately cheap proxy, not a
//! tokenizer.

/// Characters per estimated token.
pub const CHARS_PER_TOKEN: usize = 3;

/// Marker appended to word-split pieces that continue in the next chunk.
pub const CONTINUATION: &str = "...";

/// Estimated token count of `text`.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / CHARS_PER_TOKEN
}

/// Estimated token count of `parts` joined by a single separator character.
pub fn estimate_joined(parts: &[&str]) -> usize {
    let chars: usize = parts.iter().map(|p| p.chars().count()).sum();
    (chars + parts.len().saturating_sub(1)) / CHARS_PER_TOKEN
}

/// Largest chunk estimate that still passes `estimate_joined(&[system, chunk])
/// <= max_tokens` for every chunk of that estimate. Computed in characters so
/// the rounding of the two parts cannot add up past the limit. Never below 1.
pub fn chunk_budget(system: &str, max_tokens: usize) -> usize {
    let reserved = system.chars().count() + 1;
    let budget = (max_tokens * CHARS_PER_TOKEN).saturating_sub(reserved) / CHARS_PER_TOKEN;
    budget.max(1)
}

/// Split on `.`, trim, drop empty segments, and restore the trailing period.
pub fn split_sentences(text: &str) -> Vec<String> {
    text.split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("{s}."))
        .collect()
}

/// Split `text` into ordered chunks whose estimate stays within `max_tokens`.
///
/// Sentences are packed greedily, joined by one space. A sentence that alone
/// exceeds the budget is split on words instead; those pieces end in
/// [`CONTINUATION`] except the last. A single word larger than the budget is
/// emitted on its own. A budget of 0 is treated as 1.
pub fn chunk_text(text: &str, max_tokens: usize) -> Vec<String> {
    let max_tokens = max_tokens.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for sentence in split_sentences(text) {
        let sentence_chars = sentence.chars().count();

        if sentence_chars / CHARS_PER_TOKEN > max_tokens {
            flush(&mut chunks, &mut current, &mut current_chars);
            chunks.extend(split_words(&sentence, max_tokens));
            continue;
        }

        if current.is_empty() {
            current = sentence;
            current_chars = sentence_chars;
        } else if (current_chars + 1 + sentence_chars) / CHARS_PER_TOKEN <= max_tokens {
            current.push(' ');
            current.push_str(&sentence);
            current_chars += 1 + sentence_chars;
        } else {
            flush(&mut chunks, &mut current, &mut current_chars);
            current = sentence;
            current_chars = sentence_chars;
        }
    }

    flush(&mut chunks, &mut current, &mut current_chars);
    chunks
}

fn flush(chunks: &mut Vec<String>, current: &mut String, current_chars: &mut usize) {
    if !current.is_empty() {
        chunks.push(std::mem::take(current));
    }
    *current_chars = 0;
}

/// Word-level fallback for one oversized sentence.
fn split_words(sentence: &str, max_tokens: usize) -> Vec<String> {
    let marker_chars = CONTINUATION.chars().count();
    let mut pieces = Vec::new();
    let mut group = String::new();
    let mut group_chars = 0usize;

    for word in sentence.split_whitespace() {
        let word_chars = word.chars().count();
        if group.is_empty() {
            group.push_str(word);
            group_chars = word_chars;
            continue;
        }

        let candidate = group_chars + 1 + word_chars;
        if (candidate + marker_chars) / CHARS_PER_TOKEN <= max_tokens {
            group.push(' ');
            group.push_str(word);
            group_chars = candidate;
        } else {
            group.push_str(CONTINUATION);
            pieces.push(std::mem::take(&mut group));
            group.push_str(word);
            group_chars = word_chars;
        }
    }

    if !group.is_empty() {
        pieces.push(group);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(text: &str) -> String {
        text.replace(CONTINUATION, "")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn sample_text() -> String {
        (0..40)
            .map(|i| format!("Sentence number {i} talks about topic {} in some detail.", i % 7))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn estimate_is_chars_over_three() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("ab"), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcdefg"), 2);
        // Counts characters, not bytes.
        assert_eq!(estimate_tokens("ééé"), 1);
    }

    #[test]
    fn estimate_joined_counts_separators() {
        assert_eq!(estimate_joined(&["ab", "cd"]), 1); // "ab cd" = 5 chars
        assert_eq!(estimate_joined(&["abcd", "ef"]), 2); // "abcd ef" = 7 chars
        assert_eq!(estimate_joined(&[]), 0);
    }

    #[test]
    fn chunk_budget_leaves_room_for_rounding() {
        // 32 + 1 reserved chars out of 60 → 27 chars → 9 tokens, not 20 - 10.
        assert_eq!(chunk_budget(&"s".repeat(32), 20), 9);
        assert_eq!(chunk_budget(&"s".repeat(30), 20), 9);
        assert_eq!(chunk_budget("", 20), 19);
        assert_eq!(chunk_budget(&"s".repeat(100), 20), 1);

        // Any chunk within the budget fits beside the system prompt.
        for system_len in 0..=45 {
            let system = "s".repeat(system_len);
            let budget = chunk_budget(&system, 20);
            for chunk_len in 0..=(budget * CHARS_PER_TOKEN + 2) {
                let chunk = "a".repeat(chunk_len);
                assert!(estimate_tokens(&chunk) <= budget);
                assert!(
                    estimate_joined(&[system.as_str(), chunk.as_str()]) <= 20,
                    "system {system_len} chars, chunk {chunk_len} chars"
                );
            }
        }
    }

    #[test]
    fn sentences_get_their_period_back() {
        assert_eq!(
            split_sentences("First one. Second one.  Third"),
            vec!["First one.", "Second one.", "Third."]
        );
        assert!(split_sentences(" . .. ").is_empty());
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_text("", 100).is_empty());
        assert!(chunk_text("   \n\n\n", 100).is_empty());
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = chunk_text("One. Two. Three.", 100);
        assert_eq!(chunks, vec!["One. Two. Three."]);
    }

    #[test]
    fn chunks_respect_budget_and_order() {
        let text = sample_text();
        for max in [10, 25, 60, 200] {
            let chunks = chunk_text(&text, max);
            assert!(chunks.len() > 1 || max == 200);
            for chunk in &chunks {
                assert!(
                    estimate_tokens(chunk) <= max,
                    "chunk over budget {max}: {chunk:?}"
                );
            }
            assert_eq!(normalize(&chunks.join(" ")), normalize(&text));
        }
    }

    #[test]
    fn boundaries_fall_on_sentences_when_possible() {
        let chunks = chunk_text(&sample_text(), 40);
        for chunk in &chunks {
            assert!(chunk.ends_with('.'), "chunk should end a sentence: {chunk:?}");
            assert!(!chunk.ends_with(CONTINUATION));
        }
    }

    #[test]
    fn oversized_sentence_falls_back_to_words() {
        let long = (0..60).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");
        let text = format!("Short intro. {long}. Short outro.");
        let chunks = chunk_text(&text, 20);

        assert_eq!(chunks.first().map(String::as_str), Some("Short intro."));
        assert_eq!(chunks.last().map(String::as_str), Some("Short outro."));

        let middle = &chunks[1..chunks.len() - 1];
        assert!(middle.len() > 1);
        for piece in &middle[..middle.len() - 1] {
            assert!(piece.ends_with(CONTINUATION), "{piece:?}");
        }
        assert!(middle.last().unwrap().ends_with("word59."));
        for chunk in &chunks {
            assert!(estimate_tokens(chunk) <= 20, "{chunk:?}");
        }
        assert_eq!(normalize(&chunks.join(" ")), normalize(&text));
    }

    #[test]
    fn words_larger_than_budget_are_emitted_alone() {
        let text = "Supercalifragilistic expialidocious antidisestablishmentarianism.";
        let chunks = chunk_text(text, 1);
        assert_eq!(
            chunks,
            vec![
                "Supercalifragilistic...",
                "expialidocious...",
                "antidisestablishmentarianism.",
            ]
        );
    }

    #[test]
    fn zero_budget_behaves_like_one() {
        assert_eq!(chunk_text("Aa bb. Cc dd.", 0), chunk_text("Aa bb. Cc dd.", 1));
    }
}
