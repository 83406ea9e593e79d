// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token-equivalent counting for chunk bounds and context budgets.
//!
//! Uses the cl100k_base BPE from tiktoken. The vocabulary is embedded in
//! the binary, so initialization cannot fail at runtime.

use std::sync::LazyLock;

use tiktoken_rs::CoreBPE;

static BPE: LazyLock<CoreBPE> =
    LazyLock::new(|| tiktoken_rs::cl100k_base().expect("embedded cl100k_base vocabulary"));

/// Count token-equivalent units in `text`.
pub fn token_count(text: &str) -> usize {
    BPE.encode_ordinary(text).len()
}

/// Split `text` after at most `max_tokens` tokens, returning `(head, tail)`.
///
/// The head is always a valid UTF-8 prefix of the input: BPE tokens
/// concatenate back to the original bytes, so the cut point is backed off
/// until the prefix decodes cleanly. Returns the whole text and an empty
/// tail when the input fits.
pub fn split_at_token_limit(text: &str, max_tokens: usize) -> (String, String) {
    let tokens = BPE.encode_ordinary(text);
    if tokens.len() <= max_tokens {
        return (text.to_string(), String::new());
    }
    let mut cut = max_tokens.max(1);
    while cut > 0 {
        if let Ok(head) = BPE.decode(tokens[..cut].to_vec()) {
            let tail = text[head.len()..].to_string();
            return (head, tail);
        }
        cut -= 1;
    }
    // Unreachable in practice: a single token always decodes. Fall back
    // to a character boundary so callers never lose content.
    let idx = text
        .char_indices()
        .nth(max_tokens)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    (text[..idx].to_string(), text[idx..].to_string())
}
