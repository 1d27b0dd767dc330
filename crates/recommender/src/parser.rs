//! Parsing of the recommender's stdout.

use core::iter::Peekable;
use core::str::CharIndices;

use index_structs::{Direction, IndexSpec, IndexSpecError};
use tracing::{debug, warn};

/// Line prefix that starts the recommendation section.
pub const RECOMMENDATION_MARKER: &str = ">> recommending";

/// Errors raised while parsing a single index literal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: &'static str },
    #[error("unexpected character {found:?} at {position}, expected {expected}")]
    UnexpectedChar {
        position: usize,
        found: char,
        expected: &'static str,
    },
    #[error("invalid number: {0}")]
    InvalidNumber(String),
    #[error(transparent)]
    Index(#[from] IndexSpecError),
}

/// Extracts the recommended indexes from the recommender's stdout.
///
/// Lines before the marker are ignored. After it, blank lines and lines that
/// are not wrapped in braces are skipped, and literals that fail to parse are
/// logged and skipped.
#[must_use]
pub fn parse_recommendations(output: &str) -> Vec<IndexSpec> {
    let mut lines = output.lines();

    if !lines
        .by_ref()
        .any(|line| line.trim().starts_with(RECOMMENDATION_MARKER))
    {
        warn!("No recommendation section found in mindexer output");
        return Vec::new();
    }

    let mut indexes = Vec::new();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if !(line.starts_with('{') && line.ends_with('}')) {
            debug!(line, "Skipping non-index line");
            continue;
        }

        match parse_index_literal(line) {
            Ok(index) => indexes.push(index),
            Err(e) => warn!(line, error = %e, "Failed to parse index line"),
        }
    }

    indexes
}

/// Parses one dict literal such as `{'a': 1, "b.c": -1}` into an index spec.
///
/// Only the subset of Python dict syntax the recommender prints is accepted:
/// quoted string keys and numeric values, with an optional trailing comma.
///
/// # Errors
///
/// Returns an error on malformed syntax, directions other than 1/-1, or an
/// invalid index (empty, empty field, duplicate field).
pub fn parse_index_literal(literal: &str) -> Result<IndexSpec, ParseError> {
    let mut cursor = Cursor::new(literal);
    let mut keys: Vec<(String, Direction)> = Vec::new();

    cursor.skip_whitespace();
    cursor.expect('{', "'{'")?;

    loop {
        cursor.skip_whitespace();
        if cursor.eat('}') {
            break;
        }

        let field = cursor.string()?;
        cursor.skip_whitespace();
        cursor.expect(':', "':'")?;
        cursor.skip_whitespace();
        let direction = cursor.direction()?;
        keys.push((field, direction));

        cursor.skip_whitespace();
        if cursor.eat(',') {
            continue;
        }
        cursor.expect('}', "',' or '}'")?;
        break;
    }

    cursor.skip_whitespace();
    if let Some((position, found)) = cursor.next_char() {
        return Err(ParseError::UnexpectedChar {
            position,
            found,
            expected: "end of input",
        });
    }

    Ok(IndexSpec::new(keys)?)
}

struct Cursor<'a> {
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
        }
    }

    fn next_char(&mut self) -> Option<(usize, char)> {
        self.chars.next()
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn eat(&mut self, expected: char) -> bool {
        self.chars.next_if(|(_, c)| *c == expected).is_some()
    }

    fn expect(&mut self, expected: char, description: &'static str) -> Result<(), ParseError> {
        match self.chars.next() {
            Some((_, c)) if c == expected => Ok(()),
            Some((position, found)) => Err(ParseError::UnexpectedChar {
                position,
                found,
                expected: description,
            }),
            None => Err(ParseError::UnexpectedEnd {
                expected: description,
            }),
        }
    }

    /// Quoted string with either quote style and backslash escapes.
    fn string(&mut self) -> Result<String, ParseError> {
        let quote = match self.chars.next() {
            Some((_, c @ ('\'' | '"'))) => c,
            Some((position, found)) => {
                return Err(ParseError::UnexpectedChar {
                    position,
                    found,
                    expected: "quoted field name",
                });
            }
            None => {
                return Err(ParseError::UnexpectedEnd {
                    expected: "quoted field name",
                });
            }
        };

        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some((_, c)) if c == quote => return Ok(value),
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, escaped)) => value.push(escaped),
                    None => {
                        return Err(ParseError::UnexpectedEnd {
                            expected: "escaped character",
                        });
                    }
                },
                Some((_, c)) => value.push(c),
                None => {
                    return Err(ParseError::UnexpectedEnd {
                        expected: "closing quote",
                    });
                }
            }
        }
    }

    /// Numeric literal that must equal 1 or -1.
    ///
    /// Accepts an optional sign (whitespace may follow it), decimal integers
    /// without leading zeros, and integral floats including exponent form.
    #[expect(clippy::cast_possible_truncation, reason = "float is checked to be integral")]
    fn direction(&mut self) -> Result<Direction, ParseError> {
        let mut text = String::new();
        if let Some((_, sign)) = self.chars.next_if(|(_, c)| matches!(*c, '+' | '-')) {
            text.push(sign);
            self.skip_whitespace();
        }

        let digits_start = text.len();
        let mut previous = ' ';
        while let Some((_, c)) = self.chars.next_if(|(_, c)| {
            c.is_ascii_digit()
                || matches!(*c, '.' | 'e' | 'E')
                || (matches!(*c, '+' | '-') && matches!(previous, 'e' | 'E'))
        }) {
            text.push(c);
            previous = c;
        }

        let digits = &text[digits_start..];
        if digits.is_empty() {
            return match self.chars.peek().copied() {
                Some((position, found)) => Err(ParseError::UnexpectedChar {
                    position,
                    found,
                    expected: "direction",
                }),
                None => Err(ParseError::UnexpectedEnd {
                    expected: "direction",
                }),
            };
        }

        // Decimal integers like `01` are a syntax error; `00` is allowed.
        if digits.bytes().all(|b| b.is_ascii_digit())
            && digits.starts_with('0')
            && digits.bytes().any(|b| b != b'0')
        {
            return Err(ParseError::InvalidNumber(text));
        }

        let value = if let Ok(value) = text.parse::<i64>() {
            value
        } else {
            let float: f64 = text
                .parse()
                .map_err(|_| ParseError::InvalidNumber(text.clone()))?;
            if float.fract() != 0.0 || !float.is_finite() {
                return Err(ParseError::InvalidNumber(text));
            }
            float as i64
        };

        Ok(Direction::try_from(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_OUTPUT: &str = "\
>> connecting to mongodb://localhost:27017
>> sampling 1% of ember2018.ember_test
>> found 2 queries in system.profile

>> recommending 3 index(es)
    {'section.sections.entropy': -1}

    {'general.has_signature': 1, 'general.size': 1, 'appeared': 1}
    estimated benefit: 42.1
    {'broken': }
    {\"header.coff.timestamp\": -1.0}
";

    #[test]
    fn test_parse_recommendations() {
        let indexes = parse_recommendations(SAMPLE_OUTPUT);
        let rendered: Vec<String> = indexes.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            [
                "{'section.sections.entropy': -1}",
                "{'general.has_signature': 1, 'general.size': 1, 'appeared': 1}",
                "{'header.coff.timestamp': -1}",
            ]
        );
    }

    #[test]
    fn test_no_marker_yields_nothing() {
        let output = "{'a': 1}\nsomething went wrong\n";
        assert!(parse_recommendations(output).is_empty());
        assert!(parse_recommendations("").is_empty());
    }

    #[test]
    fn test_lines_before_marker_are_ignored() {
        let output = "{'early': 1}\n>> recommending 1 index(es)\n{'late': 1}\n";
        let indexes = parse_recommendations(output);
        assert_eq!(indexes.len(), 1);
        assert_eq!(indexes[0].fields().collect::<Vec<_>>(), ["late"]);
    }

    #[test]
    fn test_windows_line_endings() {
        let output = ">> recommending 1 index(es)\r\n{'a': 1, 'b': -1}\r\n";
        let indexes = parse_recommendations(output);
        assert_eq!(
            indexes[0].to_pairs(),
            vec![("a".to_string(), 1), ("b".to_string(), -1)]
        );
    }

    #[test]
    fn test_literal_accepts_trailing_comma_and_escapes() {
        let spec = parse_index_literal(r"{ 'it\'s' : +1 , }").unwrap();
        assert_eq!(spec.to_pairs(), vec![("it's".to_string(), 1)]);
    }

    #[test]
    fn test_literal_number_forms() {
        let spec = parse_index_literal("{'a': - 1, 'b': 1e0, 'c': -10e-1, 'd': 1.}").unwrap();
        assert_eq!(
            spec.to_pairs(),
            vec![
                ("a".to_string(), -1),
                ("b".to_string(), 1),
                ("c".to_string(), -1),
                ("d".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_literal_rejects_malformed_input() {
        assert_eq!(
            parse_index_literal("{}"),
            Err(ParseError::Index(IndexSpecError::Empty))
        );
        assert_eq!(
            parse_index_literal("{'a': 2}"),
            Err(ParseError::Index(IndexSpecError::InvalidDirection(2)))
        );
        assert_eq!(
            parse_index_literal("{'a': 1, 'a': -1}"),
            Err(ParseError::Index(IndexSpecError::DuplicateField(
                "a".to_string()
            )))
        );
        assert!(matches!(
            parse_index_literal("{'a': 01}"),
            Err(ParseError::InvalidNumber(_))
        ));
        assert!(matches!(
            parse_index_literal("{'a': 1e}"),
            Err(ParseError::InvalidNumber(_))
        ));
        assert!(matches!(
            parse_index_literal("{'a': 1.5}"),
            Err(ParseError::InvalidNumber(_))
        ));
        assert!(matches!(
            parse_index_literal("{a: 1}"),
            Err(ParseError::UnexpectedChar { found: 'a', .. })
        ));
        assert!(matches!(
            parse_index_literal("{'a': 1} {'b': 1}"),
            Err(ParseError::UnexpectedChar { found: '{', .. })
        ));
        assert!(matches!(
            parse_index_literal("{'a': 1"),
            Err(ParseError::UnexpectedEnd { .. })
        ));
    }
}
