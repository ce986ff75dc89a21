//! Tokenizer Primitives for the minibasic Language
//!
//! There is no separate lexing phase here: the expression evaluator and
//! statement executor pull tokens out of the current line on demand, one
//! matcher call at a time. Every matcher in this module is a *try-match*:
//! it looks at `Cursor::pos` in the current line, and either
//!
//! - consumes the lexeme, advances `pos` past it, and returns `true`
//!   (recording the match in `Cursor::last` where the caller needs the
//!   matched text), or
//! - leaves `pos` exactly where it was and returns `false`.
//!
//! This contract is what lets the fused parser backtrack cheaply: a
//! statement handler can try `match_fixed("step")`, see it fail, and fall
//! straight through to the next alternative without having to undo
//! anything.
//!
//! `match_string` is the one matcher that can fail with an error instead of
//! just returning `false` — an opening `"` with no closing quote before the
//! end of the line is always a mistake, never a legitimate "try something
//! else" case.

use crate::error::{BasicError, Result};

/// A line of source text together with a scan position.
///
/// `Cursor` is reused for both program lines (fetched from the program
/// store during `run`/`continue`) and REPL input lines (typed directly or
/// read from a loaded file). Every parse of a line starts by resetting
/// `pos` to zero; see `Interpreter::parse_line`.
pub struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    pub fn new(line: &str) -> Self {
        Self {
            chars: line.chars().collect(),
            pos: 0,
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// The remainder of the line from the current position, for error
    /// messages ("expected X, found: ...").
    pub fn remainder(&self) -> String {
        self.chars[self.pos.min(self.chars.len())..]
            .iter()
            .collect()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// `match-keyword`: requires a letter at the current position and does
    /// *not* skip leading whitespace (the caller has already skipped to a
    /// statement boundary). Extends while letters follow. Lower-cases the
    /// match.
    pub fn match_keyword(&mut self) -> Option<String> {
        let start = self.pos;
        if !matches!(self.peek(), Some(c) if c.is_alphabetic()) {
            return None;
        }
        while matches!(self.peek(), Some(c) if c.is_alphabetic()) {
            self.pos += 1;
        }
        Some(self.chars[start..self.pos].iter().collect::<String>().to_lowercase())
    }

    /// `match-identifier`: whitespace-skipping version of `match-keyword`
    /// that also allows digits after the first letter.
    pub fn match_identifier(&mut self) -> Option<String> {
        let mark = self.pos;
        self.skip_whitespace();
        let start = self.pos;
        if !matches!(self.peek(), Some(c) if c.is_alphabetic()) {
            self.pos = mark;
            return None;
        }
        while matches!(self.peek(), Some(c) if c.is_alphanumeric()) {
            self.pos += 1;
        }
        Some(self.chars[start..self.pos].iter().collect::<String>().to_lowercase())
    }

    /// `match-number`: at least one digit, optionally `.` followed by zero
    /// or more digits. No sign, no exponent — those are handled one level
    /// up, in the factor/unary-minus production.
    pub fn match_number(&mut self) -> Option<String> {
        let mark = self.pos;
        self.skip_whitespace();
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos == start {
            self.pos = mark;
            return None;
        }
        if self.peek() == Some('.') {
            self.pos += 1;
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        Some(self.chars[start..self.pos].iter().collect())
    }

    /// `match-string`: on a `"`, consumes up to and including the closing
    /// `"`. Errors (does not just fail the match) if end-of-line arrives
    /// first. Returns the interior text with quotes stripped.
    pub fn match_string(&mut self) -> Result<Option<String>> {
        let mark = self.pos;
        self.skip_whitespace();
        if self.peek() != Some('"') {
            self.pos = mark;
            return Ok(None);
        }
        self.pos += 1; // opening quote
        let start = self.pos;
        loop {
            match self.peek() {
                None => return Err(BasicError::LexError("Unclosed string".to_string())),
                Some('"') => break,
                Some(_) => self.pos += 1,
            }
        }
        let content: String = self.chars[start..self.pos].iter().collect();
        self.pos += 1; // closing quote
        Ok(Some(content))
    }

    const RELATIONS: [&'static str; 6] = ["<=", "<>", ">=", "<", "=", ">"];

    /// `match-relation`: tries two-character operators before their
    /// single-character prefixes so `<=` isn't shadowed by `<`.
    pub fn match_relation(&mut self) -> Option<&'static str> {
        let mark = self.pos;
        self.skip_whitespace();
        for op in Self::RELATIONS {
            if self.has_prefix(op) {
                self.pos += op.chars().count();
                return Some(op);
            }
        }
        self.pos = mark;
        None
    }

    pub fn match_addsub(&mut self) -> Option<char> {
        if self.match_fixed("+") {
            Some('+')
        } else if self.match_fixed("-") {
            Some('-')
        } else {
            None
        }
    }

    pub fn match_muldiv(&mut self) -> Option<char> {
        if self.match_fixed("*") {
            Some('*')
        } else if self.match_fixed("/") {
            Some('/')
        } else if self.match_fixed("\\") {
            Some('\\')
        } else {
            None
        }
    }

    /// Whitespace-skipping prefix test; consumes `text` on success.
    pub fn match_fixed(&mut self, text: &str) -> bool {
        let mark = self.pos;
        self.skip_whitespace();
        if self.has_prefix(text) {
            self.pos += text.chars().count();
            true
        } else {
            self.pos = mark;
            false
        }
    }

    /// Whitespace-skipping keyword match, case-insensitive against `word`.
    /// Restores the cursor on mismatch so callers can try the next
    /// alternative.
    pub fn match_nocase(&mut self, word: &str) -> bool {
        let mark = self.pos;
        self.skip_whitespace();
        match self.match_keyword() {
            Some(kw) if kw == word.to_lowercase() => true,
            _ => {
                self.pos = mark;
                false
            }
        }
    }

    /// Whitespace-skipping end-of-line test. Does not consume anything.
    pub fn match_eol(&mut self) -> bool {
        self.skip_whitespace();
        self.at_end()
    }

    fn has_prefix(&self, text: &str) -> bool {
        let text_chars: Vec<char> = text.chars().collect();
        if self.pos + text_chars.len() > self.chars.len() {
            return false;
        }
        self.chars[self.pos..self.pos + text_chars.len()] == text_chars[..]
    }
}
