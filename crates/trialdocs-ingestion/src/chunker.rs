//! Fixed-width character window chunker.
//!
//! Text is whitespace-normalised first (trailing spaces before a newline are
//! dropped and runs of blank lines collapse to a single blank line), then cut
//! into windows of `window_chars` characters that advance by
//! `max(1, window_chars - overlap_chars)`. Windows that are blank after
//! trimming are discarded.

use regex::Regex;

/// Configuration for the chunker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    /// Window width in characters.
    pub window_chars: usize,
    /// Characters shared by consecutive windows.
    pub overlap_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            window_chars: 700,
            overlap_chars: 120,
        }
    }
}

impl ChunkerConfig {
    /// Distance between consecutive window starts, never zero.
    pub fn step(&self) -> usize {
        self.window_chars.saturating_sub(self.overlap_chars).max(1)
    }
}

/// Split `text` into overlapping, trimmed, non-empty windows.
pub fn chunk_text(text: &str, config: &ChunkerConfig) -> Vec<String> {
    let text = normalise_whitespace(text);
    if text.is_empty() || config.window_chars == 0 {
        return Vec::new();
    }

    // Byte offset of every char, plus the end, so windows never split a code point.
    let mut bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let n_chars = bounds.len();
    bounds.push(text.len());

    let step = config.step();
    (0..n_chars)
        .step_by(step)
        .filter_map(|start| {
            let end = (start + config.window_chars).min(n_chars);
            let window = text[bounds[start]..bounds[end]].trim();
            (!window.is_empty()).then(|| window.to_string())
        })
        .collect()
}

/// Drop horizontal whitespace before newlines and collapse blank-line runs.
pub fn normalise_whitespace(text: &str) -> String {
    let stripped = lazy_trailing_space_regex().replace_all(text, "\n");
    lazy_blank_lines_regex()
        .replace_all(&stripped, "\n\n")
        .into_owned()
}

fn lazy_trailing_space_regex() -> &'static Regex {
    use std::sync::OnceLock;
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\S\n]+\n").unwrap())
}

fn lazy_blank_lines_regex() -> &'static Regex {
    use std::sync::OnceLock;
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{2,}").unwrap())
}
