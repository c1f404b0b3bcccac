//! Token filters.
//!
//! Each filter is an iterator adaptor consuming the previous stage. Splitting
//! filters replace one token with its parts: the first part keeps the parent's
//! position increment, later parts get zero so all parts share one slot, and
//! every part's span lies inside the parent's span. Tokens that are dropped
//! hand their position increment on to the next emitted token.

use std::{collections::VecDeque, ops::Range};

use crate::token::Token;

/// Splits a term into ordered, non-overlapping byte ranges.
pub trait TermSplitter {
    /// Returns the parts of `term`. An empty result drops the term.
    fn split(&self, term: &str) -> Vec<Range<usize>>;
}

/// Returns the maximal runs of characters accepted by `keep`.
fn runs(term: &str, keep: impl Fn(char) -> bool) -> Vec<Range<usize>> {
    let mut parts = Vec::new();
    let mut start = None;
    for (idx, ch) in term.char_indices() {
        match (keep(ch), start) {
            (true, None) => start = Some(idx),
            (false, Some(from)) => {
                parts.push(from..idx);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(from) = start {
        parts.push(from..term.len());
    }
    parts
}

/// Splits at every character that is neither alphanumeric nor `.` or `-`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordSplitter;

impl TermSplitter for WordSplitter {
    fn split(&self, term: &str) -> Vec<Range<usize>> {
        runs(term, |ch| ch.is_alphanumeric() || ch == '.' || ch == '-')
    }
}

/// Splits package names and hyphenated words: `a.b.c`, `a-b-c`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotSplitter;

impl TermSplitter for DotSplitter {
    fn split(&self, term: &str) -> Vec<Range<usize>> {
        runs(term, |ch| ch != '.' && ch != '-')
    }
}

/// Splits camel-case identifiers: `FooBarBaz` into `Foo`, `Bar`, `Baz`.
///
/// An uppercase run followed by a lowercase letter gives up its last letter to
/// the next part (`XMLParser` into `XML`, `Parser`). Digits stay with the part
/// they follow.
#[derive(Debug, Clone, Copy, Default)]
pub struct CamelCaseSplitter;

impl CamelCaseSplitter {
    /// Returns true if a new part starts at `cur`.
    fn is_boundary(prev: char, cur: char, next: Option<char>) -> bool {
        if !cur.is_uppercase() {
            return false;
        }
        if prev.is_lowercase() || prev.is_numeric() {
            return true;
        }
        prev.is_uppercase() && next.is_some_and(char::is_lowercase)
    }
}

impl TermSplitter for CamelCaseSplitter {
    fn split(&self, term: &str) -> Vec<Range<usize>> {
        let chars: Vec<(usize, char)> = term.char_indices().collect();
        let mut parts = Vec::new();
        let mut start = 0;
        for window in 1..chars.len() {
            let (idx, cur) = chars[window];
            let prev = chars[window - 1].1;
            let next = chars.get(window + 1).map(|&(_, ch)| ch);
            if Self::is_boundary(prev, cur, next) {
                parts.push(start..idx);
                start = idx;
            }
        }
        if start < term.len() {
            parts.push(start..term.len());
        }
        parts
    }
}

/// Replaces each token with the parts produced by a [`TermSplitter`].
#[derive(Debug, Clone)]
pub struct SplitFilter<I, S> {
    /// Upstream stage.
    input: I,
    /// Splitting rule.
    splitter: S,
    /// Parts of the current token not yet emitted.
    pending: VecDeque<Token>,
    /// Position increment owed by dropped tokens.
    carry: u32,
}

impl<I, S> SplitFilter<I, S> {
    /// Wraps `input` with the given splitter.
    pub fn new(input: I, splitter: S) -> Self {
        Self {
            input,
            splitter,
            pending: VecDeque::new(),
            carry: 0,
        }
    }
}

impl<I, S> Iterator for SplitFilter<I, S>
where
    I: Iterator<Item = Token>,
    S: TermSplitter,
{
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if let Some(part) = self.pending.pop_front() {
            return Some(part);
        }

        loop {
            let token = self.input.next()?;
            let increment = token.position_increment.saturating_add(self.carry);
            let parts = self.splitter.split(&token.text);

            if parts.is_empty() {
                self.carry = increment;
                continue;
            }
            self.carry = 0;

            if parts.len() == 1 && parts[0] == (0..token.text.len()) {
                return Some(token.with_increment(increment));
            }

            for (idx, range) in parts.into_iter().enumerate() {
                let start = (token.start_offset + range.start).min(token.end_offset);
                let end = (token.start_offset + range.end).min(token.end_offset);
                self.pending.push_back(Token {
                    text: token.text[range].to_string(),
                    start_offset: start,
                    end_offset: end,
                    position_increment: if idx == 0 { increment } else { 0 },
                });
            }
            return self.pending.pop_front();
        }
    }
}

/// Drops tokens whose character length falls outside `min..=max`.
#[derive(Debug, Clone)]
pub struct LengthFilter<I> {
    /// Upstream stage.
    input: I,
    /// Shortest accepted length.
    min: usize,
    /// Longest accepted length.
    max: usize,
    /// Position increment owed by dropped tokens.
    carry: u32,
}

impl<I> LengthFilter<I> {
    /// Wraps `input`, keeping tokens of `min..=max` characters.
    pub fn new(input: I, min: usize, max: usize) -> Self {
        Self {
            input,
            min,
            max,
            carry: 0,
        }
    }
}

impl<I: Iterator<Item = Token>> Iterator for LengthFilter<I> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            let token = self.input.next()?;
            let increment = token.position_increment.saturating_add(self.carry);
            let len = token.char_len();
            if len < self.min || len > self.max {
                self.carry = increment;
                continue;
            }
            self.carry = 0;
            return Some(token.with_increment(increment));
        }
    }
}

/// Lowercases token text.
#[derive(Debug, Clone)]
pub struct LowerCaseFilter<I> {
    /// Upstream stage.
    input: I,
}

impl<I> LowerCaseFilter<I> {
    /// Wraps `input`.
    pub fn new(input: I) -> Self {
        Self { input }
    }
}

impl<I: Iterator<Item = Token>> Iterator for LowerCaseFilter<I> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let mut token = self.input.next()?;
        token.text = token.text.to_lowercase();
        Some(token)
    }
}

/// Chaining helpers for building analysis pipelines.
pub trait TokenFilterExt: Iterator<Item = Token> + Sized {
    /// Splits at non-alphanumeric characters other than `.` and `-`.
    fn split_words(self) -> SplitFilter<Self, WordSplitter> {
        SplitFilter::new(self, WordSplitter)
    }

    /// Splits at `.` and `-`.
    fn split_dots(self) -> SplitFilter<Self, DotSplitter> {
        SplitFilter::new(self, DotSplitter)
    }

    /// Splits camel-case words.
    fn split_camel_case(self) -> SplitFilter<Self, CamelCaseSplitter> {
        SplitFilter::new(self, CamelCaseSplitter)
    }

    /// Keeps tokens of `min..=max` characters.
    fn length_bounds(self, min: usize, max: usize) -> LengthFilter<Self> {
        LengthFilter::new(self, min, max)
    }

    /// Lowercases every token.
    fn lowercase(self) -> LowerCaseFilter<Self> {
        LowerCaseFilter::new(self)
    }
}

impl<I: Iterator<Item = Token>> TokenFilterExt for I {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::StandardTokenizer;

    fn parts<S: TermSplitter>(splitter: S, term: &str) -> Vec<&str> {
        splitter
            .split(term)
            .into_iter()
            .map(|range| &term[range])
            .collect()
    }

    fn assert_monotonic(tokens: &[Token]) {
        for pair in tokens.windows(2) {
            assert!(
                pair[1].start_offset >= pair[0].start_offset,
                "offsets went backwards: {pair:?}"
            );
        }
        for token in tokens {
            assert!(token.end_offset >= token.start_offset, "{token:?}");
        }
    }

    #[test]
    fn camel_case_parts() {
        assert_eq!(parts(CamelCaseSplitter, "FooBarBaz"), vec!["Foo", "Bar", "Baz"]);
        assert_eq!(parts(CamelCaseSplitter, "XMLParser"), vec!["XML", "Parser"]);
        assert_eq!(parts(CamelCaseSplitter, "parseURL"), vec!["parse", "URL"]);
        assert_eq!(parts(CamelCaseSplitter, "utf8Decoder"), vec!["utf8", "Decoder"]);
        assert_eq!(parts(CamelCaseSplitter, "lower"), vec!["lower"]);
        assert_eq!(parts(CamelCaseSplitter, "ALLCAPS"), vec!["ALLCAPS"]);
    }

    #[test]
    fn dot_and_hyphen_parts() {
        assert_eq!(
            parts(DotSplitter, "com.example.Foo"),
            vec!["com", "example", "Foo"]
        );
        assert_eq!(parts(DotSplitter, "a-b-c"), vec!["a", "b", "c"]);
        assert!(parts(DotSplitter, "..").is_empty());
    }

    #[test]
    fn word_parts() {
        assert_eq!(parts(WordSplitter, "snake_case_name"), vec!["snake", "case", "name"]);
        assert_eq!(parts(WordSplitter, "a.b-c"), vec!["a.b-c"]);
    }

    #[test]
    fn dot_split_siblings_share_a_slot() {
        let tokens: Vec<Token> = StandardTokenizer::new("com.example.Foo").split_dots().collect();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["com", "example", "Foo"]);
        let increments: Vec<u32> = tokens.iter().map(|t| t.position_increment).collect();
        assert_eq!(increments, vec![1, 0, 0]);
        assert_eq!((tokens[2].start_offset, tokens[2].end_offset), (12, 15));
    }

    #[test]
    fn repeated_parts_keep_offsets_ordered() {
        let text = "foo.foo.foo";
        let tokens: Vec<Token> = StandardTokenizer::new(text).split_dots().collect();
        assert_eq!(
            tokens.iter().map(|t| t.start_offset).collect::<Vec<_>>(),
            vec![0, 4, 8]
        );
        assert_monotonic(&tokens);
    }

    #[test]
    fn full_chain_offsets_are_monotonic() {
        let text = "pub fn parseXMLDocument(input: &str) -> Result<Doc, io::Error> { a.b_c-dEf }";
        let tokens: Vec<Token> = StandardTokenizer::new(text)
            .split_words()
            .split_dots()
            .split_camel_case()
            .length_bounds(1, 128)
            .lowercase()
            .collect();
        assert!(!tokens.is_empty());
        assert_monotonic(&tokens);
    }

    #[test]
    fn length_filter_bounds() {
        let long = "x".repeat(129);
        let exact = "y".repeat(128);
        let text = format!("ab abc {exact} {long}");
        let tokens: Vec<String> = StandardTokenizer::new(&text)
            .length_bounds(3, 128)
            .map(|t| t.text)
            .collect();
        assert_eq!(tokens, vec!["abc".to_string(), exact]);
    }

    #[test]
    fn dropped_tokens_carry_their_increment() {
        let tokens: Vec<Token> = StandardTokenizer::new("a bb ccc")
            .length_bounds(3, 128)
            .collect();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "ccc");
        assert_eq!(tokens[0].position_increment, 3);
    }

    #[test]
    fn lowercase_after_camel_split() {
        let texts: Vec<String> = StandardTokenizer::new("FooBarBaz")
            .split_camel_case()
            .lowercase()
            .map(|t| t.text)
            .collect();
        assert_eq!(texts, vec!["foo", "bar", "baz"]);
    }
}
