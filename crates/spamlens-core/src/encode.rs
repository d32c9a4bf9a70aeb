//! Text → fixed-length id sequence, compatible with the training tokenizer.
//!
//! # Steps
//!
//! 1. Lowercase, then strip every character that is neither a Unicode word
//!    character (`\w`: letters, marks, digits, connector punctuation) nor
//!    whitespace.
//! 2. Blank results are a no-op for the caller (see [`Encoder::encode`]).
//! 3. Split on single spaces. Consecutive spaces yield empty tokens, and
//!    tabs/newlines stay inside tokens, exactly as the training-side
//!    preprocessing did.
//! 4. Map each token through the vocabulary; unknown tokens become `0`.
//! 5. Keep the first `max_len` ids.
//! 6. Left-pad with `0` up to `max_len`.
//!
//! The padding side is a contract with the trained model. Padding on the
//! right produces wrong scores without any error.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::debug;

use crate::vocab::{UNKNOWN_ID, Vocabulary};

/// Sequence length the reference model was trained with.
pub const MAX_LEN: usize = 150;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("static pattern is valid"));

/// Exactly `max_len` ids, left-padded with zeros.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedInput {
    ids: Vec<u32>,
    token_count: usize,
}

impl EncodedInput {
    pub fn as_slice(&self) -> &[u32] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Tokens produced by the split, before truncation.
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    /// Ids that matched a vocabulary entry.
    pub fn known_tokens(&self) -> usize {
        self.ids.iter().filter(|&&id| id != UNKNOWN_ID).count()
    }

    pub fn truncated(&self) -> bool {
        self.token_count > self.ids.len()
    }

    /// The ids as the float row fed to the model.
    pub fn to_f32_row(&self) -> Vec<f32> {
        self.ids.iter().map(|&id| id as f32).collect()
    }

    pub fn into_vec(self) -> Vec<u32> {
        self.ids
    }
}

/// Lowercase and strip everything except word characters and whitespace.
pub fn normalize(text: &str) -> String {
    NON_WORD.replace_all(&text.to_lowercase(), "").into_owned()
}

/// True when normalization left nothing to classify.
pub fn is_blank(normalized: &str) -> bool {
    normalized.trim().is_empty()
}

/// Split normalized text on single spaces, keeping empty tokens.
pub fn tokenize(normalized: &str) -> Vec<&str> {
    normalized.split(' ').collect()
}

/// Encode `text` into exactly `max_len` ids.
///
/// Always encodes: blank text yields all zeros. Request handling goes through
/// [`Encoder::encode`], which skips blank input instead.
pub fn encode(text: &str, vocab: &Vocabulary, max_len: usize) -> EncodedInput {
    encode_normalized(&normalize(text), vocab, max_len)
}

fn encode_normalized(normalized: &str, vocab: &Vocabulary, max_len: usize) -> EncodedInput {
    let tokens = tokenize(normalized);
    let token_count = tokens.len();

    let kept = token_count.min(max_len);
    let mut ids = Vec::with_capacity(max_len);
    ids.resize(max_len - kept, UNKNOWN_ID);
    ids.extend(tokens.iter().take(kept).map(|t| vocab.id_of(t)));

    EncodedInput { ids, token_count }
}

/// Encoder bound to the shared vocabulary and the model's sequence length.
#[derive(Debug, Clone)]
pub struct Encoder {
    vocabulary: Arc<Vocabulary>,
    max_len: usize,
}

impl Encoder {
    pub fn new(vocabulary: Arc<Vocabulary>, max_len: usize) -> Self {
        Self {
            vocabulary,
            max_len,
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Encode a request's text, or `None` when it normalizes to blank.
    pub fn encode(&self, text: &str) -> Option<EncodedInput> {
        let normalized = normalize(text);
        if is_blank(&normalized) {
            debug!("blank input skipped");
            return None;
        }

        let encoded = encode_normalized(&normalized, &self.vocabulary, self.max_len);
        debug!(
            tokens = encoded.token_count(),
            known = encoded.known_tokens(),
            truncated = encoded.truncated(),
            "encoded input"
        );
        Some(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(pairs: &[(&str, u32)]) -> Vocabulary {
        pairs.iter().map(|&(w, id)| (w, id)).collect()
    }

    #[test]
    fn left_pads_short_input() {
        let v = vocab(&[("hello", 5)]);
        let encoded = encode("hello", &v, MAX_LEN);
        assert_eq!(encoded.len(), MAX_LEN);
        assert!(encoded.as_slice()[..149].iter().all(|&id| id == 0));
        assert_eq!(encoded.as_slice()[149], 5);
    }

    #[test]
    fn truncation_keeps_leading_words() {
        let words: Vec<String> = (0..151).map(|i| format!("w{i}")).collect();
        let v: Vocabulary = words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i as u32 + 1))
            .collect();

        let encoded = encode(&words.join(" "), &v, MAX_LEN);
        let expected: Vec<u32> = (1..=150).collect();
        assert_eq!(encoded.as_slice(), expected.as_slice());
        assert_eq!(encoded.token_count(), 151);
        assert!(encoded.truncated());
    }

    #[test]
    fn exact_length_input_is_untouched() {
        let words: Vec<String> = (0..MAX_LEN).map(|_| "spam".to_string()).collect();
        let v = vocab(&[("spam", 9)]);
        let encoded = encode(&words.join(" "), &v, MAX_LEN);
        assert!(encoded.as_slice().iter().all(|&id| id == 9));
        assert!(!encoded.truncated());
    }

    #[test]
    fn unknown_tokens_encode_as_zero() {
        let encoded = encode("xyzzy", &Vocabulary::default(), MAX_LEN);
        assert_eq!(encoded.as_slice(), vec![0u32; MAX_LEN].as_slice());
        assert_eq!(encoded.known_tokens(), 0);
    }

    #[test]
    fn strips_punctuation_and_folds_case() {
        let v = vocab(&[("hello", 1), ("world", 2)]);
        let encoded = encode("Hello, World!!", &v, MAX_LEN);
        assert_eq!(&encoded.as_slice()[MAX_LEN - 2..], &[1, 2]);
        assert!(encoded.as_slice()[..MAX_LEN - 2].iter().all(|&id| id == 0));
    }

    #[test]
    fn normalize_keeps_unicode_word_chars() {
        assert_eq!(normalize("Ünïcödé café!"), "ünïcödé café");
        assert_eq!(normalize("WIN_1000$ now?!"), "win_1000 now");
        assert_eq!(normalize("¡Hola! ¿Qué tal?"), "hola qué tal");
    }

    #[test]
    fn consecutive_spaces_yield_empty_tokens() {
        assert_eq!(tokenize("hello  world"), vec!["hello", "", "world"]);

        let v = vocab(&[("hello", 5), ("world", 6)]);
        let encoded = encode("hello  world", &v, MAX_LEN);
        assert_eq!(&encoded.as_slice()[MAX_LEN - 3..], &[5, 0, 6]);
    }

    #[test]
    fn punctuation_between_spaces_leaves_empty_token() {
        let v = vocab(&[("buy", 3), ("now", 4)]);
        let encoded = encode("buy - now", &v, MAX_LEN);
        assert_eq!(&encoded.as_slice()[MAX_LEN - 3..], &[3, 0, 4]);
    }

    #[test]
    fn newlines_stay_inside_tokens() {
        assert_eq!(tokenize("free\nmoney now"), vec!["free\nmoney", "now"]);

        let v = vocab(&[("free", 1), ("money", 2), ("now", 3)]);
        let encoded = encode("free\nmoney now", &v, MAX_LEN);
        assert_eq!(&encoded.as_slice()[MAX_LEN - 2..], &[0, 3]);
    }

    #[test]
    fn only_lowercase_entries_match() {
        let v = vocab(&[("Free", 1), ("free", 2)]);
        let encoded = encode("FREE", &v, MAX_LEN);
        assert_eq!(encoded.as_slice()[MAX_LEN - 1], 2);
    }

    #[test]
    fn encoding_is_deterministic() {
        let v = vocab(&[("win", 1), ("cash", 2), ("prize", 3)]);
        let text = "WIN cash!!! Claim your prize now";
        assert_eq!(encode(text, &v, MAX_LEN), encode(text, &v, MAX_LEN));
    }

    #[test]
    fn length_is_fixed_for_any_input() {
        let v = vocab(&[("a", 1)]);
        let long = "a ".repeat(500);
        for text in ["", "   ", "a", "!!!", long.as_str(), "a\tb\nc  d"] {
            assert_eq!(encode(text, &v, MAX_LEN).len(), MAX_LEN, "text {text:?}");
        }
        assert_eq!(encode("a a a", &v, 2).as_slice(), &[1, 1]);
    }

    #[test]
    fn blank_detection_after_normalization() {
        assert!(is_blank(&normalize("")));
        assert!(is_blank(&normalize("   ")));
        assert!(is_blank(&normalize("?!... ,,")));
        assert!(!is_blank(&normalize(" ok ")));
    }

    #[test]
    fn encoder_skips_blank_input() {
        let encoder = Encoder::new(Arc::new(vocab(&[("hi", 1)])), MAX_LEN);
        assert!(encoder.encode("").is_none());
        assert!(encoder.encode("   ").is_none());
        assert!(encoder.encode("!!!").is_none());
    }

    #[test]
    fn encoder_uses_configured_length() {
        let encoder = Encoder::new(Arc::new(vocab(&[("hi", 1)])), 8);
        let encoded = encoder.encode("Hi!").unwrap();
        assert_eq!(encoded.as_slice(), &[0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(encoded.to_f32_row()[7], 1.0);
    }
}
