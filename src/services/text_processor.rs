// Text Processing Service
// Normalization, word tokens and sentence spans shared by both analyzers

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static WORD_RE: OnceLock<Regex> = OnceLock::new();
static SPACE_RE: OnceLock<Regex> = OnceLock::new();
static HWS_RE: OnceLock<Regex> = OnceLock::new();

fn word_re() -> &'static Regex {
    WORD_RE.get_or_init(|| {
        Regex::new(r"[A-Za-z]+(?:'[A-Za-z]+)*|[0-9]+(?:[.,][0-9]+)*").expect("valid word regex")
    })
}

/// Normalize typographic punctuation and whitespace.
pub fn normalize_punctuation(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut s = text
        .replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{2014}', '\u{2013}'], "-");

    let space_re = SPACE_RE.get_or_init(|| Regex::new(r"[\u{3000}\u{00A0}]").expect("valid space regex"));
    s = space_re.replace_all(&s, " ").to_string();

    s = s.replace("\r\n", "\n").replace('\r', "\n");

    // Collapse horizontal whitespace
    let hws_re = HWS_RE.get_or_init(|| Regex::new(r"[ \t\x0C\x0B]+").expect("valid whitespace regex"));
    s = hws_re.replace_all(&s, " ").to_string();

    s = s.lines()
         .map(|ln| ln.trim())
         .collect::<Vec<_>>()
         .join("\n");

    s.trim().to_string()
}

/// Number of word tokens, at least 1 for non-empty text.
pub fn word_count(text: &str) -> usize {
    if text.trim().is_empty() {
        return 0;
    }
    std::cmp::max(1, word_re().find_iter(text).count())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Word and number tokens with byte offsets.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    word_re()
        .find_iter(text)
        .map(|m| Token {
            text: m.as_str(),
            start: m.start(),
            end: m.end(),
        })
        .collect()
}

/// Lowercased word stream with contractions split, e.g. "don't" -> "do", "n't".
pub fn sentiment_words(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for tok in tokenize(text) {
        let lower = tok.text.to_lowercase();
        if let Some(stem) = lower.strip_suffix("n't") {
            if !stem.is_empty() {
                out.push(stem.to_string());
            }
            out.push("n't".to_string());
        } else if let Some((head, _)) = lower.split_once('\'') {
            // possessives and 're/'ll/'ve carry no sentiment of their own
            out.push(head.to_string());
        } else {
            out.push(lower);
        }
    }
    out
}

/// True when the byte position begins a sentence: start of text, after
/// terminal punctuation, or at the start of a line.
pub fn is_sentence_start(text: &str, pos: usize) -> bool {
    let before = match text.get(..pos) {
        Some(b) => b,
        None => return false,
    };
    for ch in before.chars().rev() {
        if ch == '\n' {
            return true;
        }
        if ch.is_whitespace() || matches!(ch, '"' | '\'' | '(' | '[' | '\u{201c}' | '\u{2018}') {
            continue;
        }
        return matches!(ch, '.' | '!' | '?' | ':' | ';' | '…');
    }
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentenceOffset {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Sentence splitting with byte offset tracking.
pub fn split_sentences(text: &str) -> Vec<SentenceOffset> {
    if text.is_empty() {
        return vec![];
    }

    let mut sentences = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let quote_chars = ['"', '\u{201c}', '\u{201d}'];

    let mut current_start: usize = 0;
    let mut buffer = String::new();
    let mut in_quote = false;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        buffer.push(ch);

        if quote_chars.contains(&ch) {
            in_quote = !in_quote;
        }

        if ['.', '!', '?'].contains(&ch) && !in_quote {
            // Decimal numbers ("3.5") do not end a sentence
            let is_decimal = ch == '.'
                && i > 0
                && i + 1 < chars.len()
                && chars[i - 1].is_ascii_digit()
                && chars[i + 1].is_ascii_digit();

            if !is_decimal {
                // Keep runs like "?!" and "..." together
                while i + 1 < chars.len() && ['.', '!', '?'].contains(&chars[i + 1]) {
                    i += 1;
                    buffer.push(chars[i]);
                }
                while i + 1 < chars.len() && [' ', '\t', '\n'].contains(&chars[i + 1]) {
                    i += 1;
                    buffer.push(chars[i]);
                }

                push_sentence(&mut sentences, &buffer, current_start);
                current_start += buffer.len();
                buffer.clear();
            }
        }

        i += 1;
    }

    push_sentence(&mut sentences, &buffer, current_start);
    sentences
}

fn push_sentence(out: &mut Vec<SentenceOffset>, buffer: &str, buffer_start: usize) {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return;
    }
    let lead = buffer.len() - buffer.trim_start().len();
    let start = buffer_start + lead;
    out.push(SentenceOffset {
        text: trimmed.to_string(),
        start,
        end: start + trimmed.len(),
    });
}
