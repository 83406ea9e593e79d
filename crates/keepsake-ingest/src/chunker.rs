// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic chunking of normalized text.
//!
//! Splits on paragraph and sentence boundaries, never mid-sentence, with
//! chunk sizes bounded to a configurable token range. A single sentence
//! exceeding the maximum is the one exception: it is hard-split at token
//! boundaries and every resulting piece is flagged `truncated`. Output
//! order matches source order; downstream consumers rely on the sequence
//! for conversational-thread reconstruction.

use keepsake_config::ChunkerConfig;
use keepsake_core::ChunkCandidate;
use keepsake_core::tokens::{split_at_token_limit, token_count};

/// Splits text into semantically bounded chunk candidates.
pub struct Chunker {
    min_tokens: usize,
    max_tokens: usize,
}

impl Chunker {
    pub fn new(config: &ChunkerConfig) -> Self {
        Self {
            min_tokens: config.min_tokens,
            max_tokens: config.max_tokens.max(1),
        }
    }

    /// Chunk `text` into an ordered sequence of candidates.
    ///
    /// Empty or whitespace-only input yields an empty sequence, not an
    /// error.
    pub fn chunk(&self, text: &str) -> Vec<ChunkCandidate> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut builder = ChunkBuilder::new(self.max_tokens);
        for paragraph in text.split("\n\n").filter(|p| !p.trim().is_empty()) {
            for sentence in split_sentences(paragraph) {
                builder.push_sentence(&sentence);
            }
            // Paragraph ends are preferred boundaries: flush once the
            // minimum is reached rather than spanning paragraphs.
            if builder.current_tokens >= self.min_tokens {
                builder.flush();
            }
        }
        builder.flush();
        builder.chunks
    }
}

struct ChunkBuilder {
    max_tokens: usize,
    chunks: Vec<ChunkCandidate>,
    current: String,
    current_tokens: usize,
}

impl ChunkBuilder {
    fn new(max_tokens: usize) -> Self {
        Self {
            max_tokens,
            chunks: Vec::new(),
            current: String::new(),
            current_tokens: 0,
        }
    }

    fn push_sentence(&mut self, sentence: &str) {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            return;
        }
        let sentence_tokens = token_count(sentence);

        if sentence_tokens > self.max_tokens {
            // The one case where splitting mid-sentence is allowed.
            self.flush();
            let mut rest = sentence.to_string();
            while !rest.is_empty() {
                let (head, tail) = split_at_token_limit(&rest, self.max_tokens);
                self.chunks.push(ChunkCandidate {
                    content: head.trim().to_string(),
                    index: self.chunks.len(),
                    truncated: true,
                });
                rest = tail;
            }
            return;
        }

        if self.current_tokens + sentence_tokens > self.max_tokens && !self.current.is_empty() {
            self.flush();
        }

        if !self.current.is_empty() {
            self.current.push(' ');
        }
        self.current.push_str(sentence);
        self.current_tokens += sentence_tokens;
    }

    fn flush(&mut self) {
        if self.current.trim().is_empty() {
            self.current.clear();
            self.current_tokens = 0;
            return;
        }
        self.chunks.push(ChunkCandidate {
            content: std::mem::take(&mut self.current),
            index: self.chunks.len(),
            truncated: false,
        });
        self.current_tokens = 0;
    }
}

/// Split a paragraph into sentences, keeping terminators attached.
///
/// A sentence ends at `.`, `!`, or `?` (optionally followed by closing
/// quotes) when trailing whitespace or end of input follows.
fn split_sentences(paragraph: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = paragraph.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            while let Some(&q) = chars.peek() {
                if matches!(q, '"' | '\'' | ')' | '\u{201D}' | '\u{2019}') {
                    current.push(q);
                    chars.next();
                } else {
                    break;
                }
            }
            match chars.peek() {
                Some(&next) if next.is_whitespace() => {
                    let trimmed = current.trim();
                    if !trimmed.is_empty() {
                        sentences.push(trimmed.to_string());
                    }
                    current.clear();
                }
                None => {}
                _ => {}
            }
        }
    }
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    sentences
}
