//! Error type for note parsing.

use std::fmt;

/// A note string could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub input: String,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Text does not match `<letter><accidentals><octave?>`.
    Malformed,
    /// The operation needs an absolute pitch but the note has no octave.
    MissingOctave,
}

impl ParseError {
    pub fn malformed(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            kind: ParseErrorKind::Malformed,
        }
    }

    pub fn missing_octave(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            kind: ParseErrorKind::MissingOctave,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParseErrorKind::Malformed => write!(f, "malformed note '{}'", self.input),
            ParseErrorKind::MissingOctave => {
                write!(f, "note '{}' has no octave", self.input)
            }
        }
    }
}

impl std::error::Error for ParseError {}
