//! Escape-aware walking over mention text.
//!
//! Both the caret-relative detector and the whole-text extractor are built on
//! [`walk`]: the backward direction looks for the trigger that owns the caret,
//! the forward direction finds where a token ends.

pub(crate) const TRIGGER: char = '@';
pub(crate) const ESCAPE: char = '\\';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Forward,
    Backward,
}

/// One character visited by [`walk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Step {
    pub index: usize,
    pub ch: char,
    /// The character is a `\` acting as an escape marker.
    pub marker: bool,
    /// The character is escaped by a marker and has no special meaning.
    pub escaped: bool,
}

impl Step {
    /// Unescaped whitespace ends a token in either direction.
    pub fn is_boundary(&self) -> bool {
        !self.marker && !self.escaped && self.ch.is_whitespace()
    }

    pub fn is_trigger(&self) -> bool {
        !self.marker && !self.escaped && self.ch == TRIGGER
    }
}

/// Walks `text` starting at byte offset `from`.
///
/// Forward walks begin with the character at `from` and treat a `\` as
/// escaping exactly the next character. Backward walks begin with the
/// character just before `from`; there a character counts as escaped when the
/// character in front of it is a `\`, and every `\` is reported as a marker.
pub(crate) fn walk(text: &str, from: usize, direction: Direction) -> Walk<'_> {
    let from = floor_char_boundary(text, from);
    Walk {
        text,
        pos: from,
        direction,
        pending_escape: false,
    }
}

pub(crate) struct Walk<'a> {
    text: &'a str,
    pos: usize,
    direction: Direction,
    pending_escape: bool,
}

impl Iterator for Walk<'_> {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        match self.direction {
            Direction::Forward => {
                let ch = self.text[self.pos..].chars().next()?;
                let index = self.pos;
                self.pos += ch.len_utf8();

                let escaped = self.pending_escape;
                let marker = !escaped && ch == ESCAPE;
                self.pending_escape = marker;
                Some(Step {
                    index,
                    ch,
                    marker,
                    escaped,
                })
            }
            Direction::Backward => {
                let ch = self.text[..self.pos].chars().next_back()?;
                self.pos -= ch.len_utf8();
                let index = self.pos;

                Some(Step {
                    index,
                    ch,
                    marker: ch == ESCAPE,
                    escaped: preceded_by_escape(self.text, index),
                })
            }
        }
    }
}

/// True when the character right before `index` is a `\`.
pub(crate) fn preceded_by_escape(text: &str, index: usize) -> bool {
    text[..index].ends_with(ESCAPE)
}

/// Byte offset one past the token whose body starts at `body_start`.
///
/// The token runs until the first unescaped whitespace or the end of `text`.
/// A trailing lone `\` consumes nothing and simply ends with the text.
pub(crate) fn token_end(text: &str, body_start: usize) -> usize {
    walk(text, body_start, Direction::Forward)
        .find(Step::is_boundary)
        .map(|step| step.index)
        .unwrap_or(text.len())
}

/// Index of the `@` owning the caret, if the caret sits inside a token.
pub(crate) fn trigger_start(text: &str, caret: usize) -> Option<usize> {
    for step in walk(text, caret, Direction::Backward) {
        if step.is_trigger() {
            return Some(step.index);
        }
        if step.is_boundary() {
            return None;
        }
    }
    None
}

/// Clamps `offset` into `text` and moves it back onto a char boundary.
pub(crate) fn floor_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
