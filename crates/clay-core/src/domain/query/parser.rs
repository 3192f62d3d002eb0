use serde_json::Value;

use super::{CompareOp, FilterExpr, FilterPath, FilterStep, Operand, Segment, Selector};
use crate::domain::error::DomainError;

pub(super) fn parse(expression: &str) -> Result<Vec<Segment>, DomainError> {
    let mut parser = Parser {
        source: expression,
        chars: expression.chars().collect(),
        pos: 0,
    };
    parser.query()
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

type ParseResult<T> = Result<T, DomainError>;

impl Parser<'_> {
    fn query(&mut self) -> ParseResult<Vec<Segment>> {
        self.skip_ws();
        self.expect('$')?;

        let mut segments = Vec::new();
        loop {
            match self.peek() {
                None => break,
                Some(c) if c.is_whitespace() => {
                    self.skip_ws();
                    if let Some(c) = self.peek() {
                        return Err(self.error(format!("unexpected '{c}' after whitespace")));
                    }
                }
                Some('.') if self.peek_at(1) == Some('.') => {
                    self.pos += 2;
                    let selectors = match self.peek() {
                        Some('[') => self.bracket()?,
                        Some('*') => {
                            self.pos += 1;
                            vec![Selector::Wildcard]
                        }
                        _ => vec![Selector::Name(self.identifier()?)],
                    };
                    segments.push(Segment::Descendant(selectors));
                }
                Some('.') => {
                    self.pos += 1;
                    let selector = match self.peek() {
                        Some('*') => {
                            self.pos += 1;
                            Selector::Wildcard
                        }
                        _ => Selector::Name(self.identifier()?),
                    };
                    segments.push(Segment::Child(vec![selector]));
                }
                Some('[') => segments.push(Segment::Child(self.bracket()?)),
                Some(c) => return Err(self.error(format!("unexpected '{c}'"))),
            }
        }
        Ok(segments)
    }

    /// `[ selector (, selector)* ]` or `[?filter]`.
    fn bracket(&mut self) -> ParseResult<Vec<Selector>> {
        self.expect('[')?;
        self.skip_ws();

        if self.eat('?') {
            self.skip_ws();
            let filter = self.or_expr()?;
            self.skip_ws();
            self.expect(']')?;
            return Ok(vec![Selector::Filter(filter)]);
        }

        let mut selectors = Vec::new();
        loop {
            self.skip_ws();
            let selector = match self.peek() {
                Some('*') => {
                    self.pos += 1;
                    Selector::Wildcard
                }
                Some('\'' | '"') => Selector::Name(self.string_literal()?),
                Some(c) if c == '-' || c == ':' || c.is_ascii_digit() => self.index_or_slice()?,
                Some(c) => return Err(self.error(format!("unexpected '{c}' in brackets"))),
                None => return Err(self.error("unterminated '['")),
            };
            selectors.push(selector);
            self.skip_ws();
            if self.eat(',') {
                continue;
            }
            self.expect(']')?;
            return Ok(selectors);
        }
    }

    fn index_or_slice(&mut self) -> ParseResult<Selector> {
        let start = self.optional_int()?;
        self.skip_ws();
        if !self.eat(':') {
            return start
                .map(Selector::Index)
                .ok_or_else(|| self.error("expected an index"));
        }
        self.skip_ws();
        let end = self.optional_int()?;
        self.skip_ws();
        let step = if self.eat(':') {
            self.skip_ws();
            self.optional_int()?
        } else {
            None
        };
        Ok(Selector::Slice { start, end, step })
    }

    fn optional_int(&mut self) -> ParseResult<Option<i64>> {
        let begin = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let text: String = self.chars[begin..self.pos].iter().collect();
        match text.as_str() {
            "" => Ok(None),
            "-" => Err(self.error("expected digits after '-'")),
            _ => text
                .parse()
                .map(Some)
                .map_err(|_| self.error(format!("integer '{text}' out of range"))),
        }
    }

    fn identifier(&mut self) -> ParseResult<String> {
        let begin = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '$')
        {
            self.pos += 1;
        }
        if begin == self.pos {
            return Err(self.error("expected a member name"));
        }
        Ok(self.chars[begin..self.pos].iter().collect())
    }

    fn string_literal(&mut self) -> ParseResult<String> {
        let Some(quote) = self.bump() else {
            return Err(self.error("expected a string"));
        };
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                    None => return Err(self.error("unterminated escape")),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    // ── filters ──────────────────────────────────────────────────────────

    fn or_expr(&mut self) -> ParseResult<FilterExpr> {
        let mut left = self.and_expr()?;
        loop {
            self.skip_ws();
            if !self.eat_str("||") {
                return Ok(left);
            }
            let right = self.and_expr()?;
            left = FilterExpr::Or(Box::new(left), Box::new(right));
        }
    }

    fn and_expr(&mut self) -> ParseResult<FilterExpr> {
        let mut left = self.unary()?;
        loop {
            self.skip_ws();
            if !self.eat_str("&&") {
                return Ok(left);
            }
            let right = self.unary()?;
            left = FilterExpr::And(Box::new(left), Box::new(right));
        }
    }

    fn unary(&mut self) -> ParseResult<FilterExpr> {
        self.skip_ws();
        if self.peek() == Some('!') && self.peek_at(1) != Some('=') {
            self.pos += 1;
            return Ok(FilterExpr::Not(Box::new(self.unary()?)));
        }
        if self.eat('(') {
            let inner = self.or_expr()?;
            self.skip_ws();
            self.expect(')')?;
            return Ok(inner);
        }
        self.comparison()
    }

    fn comparison(&mut self) -> ParseResult<FilterExpr> {
        let left = self.operand()?;
        self.skip_ws();
        let Some(op) = self.compare_op() else {
            return match left {
                Operand::Path(path) => Ok(FilterExpr::Truthy(path)),
                Operand::Literal(_) => Err(self.error("a literal alone is not a filter")),
            };
        };
        self.skip_ws();
        let right = self.operand()?;
        Ok(FilterExpr::Compare { left, op, right })
    }

    fn compare_op(&mut self) -> Option<CompareOp> {
        let ops = [
            ("==", CompareOp::Eq),
            ("!=", CompareOp::Ne),
            ("<=", CompareOp::Le),
            (">=", CompareOp::Ge),
            ("<", CompareOp::Lt),
            (">", CompareOp::Gt),
        ];
        ops.into_iter()
            .find(|(text, _)| self.eat_str(text))
            .map(|(_, op)| op)
    }

    fn operand(&mut self) -> ParseResult<Operand> {
        self.skip_ws();
        match self.peek() {
            Some('@') | Some('$') => Ok(Operand::Path(self.filter_path()?)),
            Some('\'' | '"') => Ok(Operand::Literal(Value::String(self.string_literal()?))),
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            Some(_) if self.eat_word("true") => Ok(Operand::Literal(Value::Bool(true))),
            Some(_) if self.eat_word("false") => Ok(Operand::Literal(Value::Bool(false))),
            Some(_) if self.eat_word("null") => Ok(Operand::Literal(Value::Null)),
            Some(c) => Err(self.error(format!("unexpected '{c}' in filter"))),
            None => Err(self.error("unterminated filter")),
        }
    }

    fn filter_path(&mut self) -> ParseResult<FilterPath> {
        let absolute = self.bump() == Some('$');
        let mut steps = Vec::new();
        loop {
            match self.peek() {
                Some('.') if self.peek_at(1) != Some('.') => {
                    self.pos += 1;
                    steps.push(FilterStep::Name(self.identifier()?));
                }
                Some('[') => {
                    self.pos += 1;
                    self.skip_ws();
                    let step = match self.peek() {
                        Some('\'' | '"') => FilterStep::Name(self.string_literal()?),
                        _ => FilterStep::Index(
                            self.optional_int()?
                                .ok_or_else(|| self.error("expected an index or name"))?,
                        ),
                    };
                    self.skip_ws();
                    self.expect(']')?;
                    steps.push(step);
                }
                _ => return Ok(FilterPath { absolute, steps }),
            }
        }
    }

    fn number(&mut self) -> ParseResult<Operand> {
        let begin = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+'))
        {
            self.pos += 1;
        }
        let text: String = self.chars[begin..self.pos].iter().collect();
        serde_json::from_str::<serde_json::Number>(&text)
            .map(|n| Operand::Literal(Value::Number(n)))
            .map_err(|_| self.error(format!("invalid number '{text}'")))
    }

    // ── scanning ─────────────────────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, expected: &str) -> bool {
        let len = expected.chars().count();
        let matches = self
            .chars
            .get(self.pos..self.pos + len)
            .is_some_and(|window| window.iter().copied().eq(expected.chars()));
        if matches {
            self.pos += len;
        }
        matches
    }

    /// Like [`Self::eat_str`] but refuses to split an identifier (`nullable`).
    fn eat_word(&mut self, word: &str) -> bool {
        let len = word.chars().count();
        let boundary = self
            .peek_at(len)
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_'));
        boundary && self.eat_str(word)
    }

    fn expect(&mut self, expected: char) -> ParseResult<()> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn error(&self, reason: impl Into<String>) -> DomainError {
        DomainError::InvalidQuery {
            expression: self.source.to_string(),
            offset: self.pos,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_dotted_children_and_wildcards() {
        let segments = parse("$.model.types[*]").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Child(vec![Selector::Name("model".into())]),
                Segment::Child(vec![Selector::Name("types".into())]),
                Segment::Child(vec![Selector::Wildcard]),
            ]
        );
    }

    #[test]
    fn parses_unions_and_slices() {
        let segments = parse("$['a','b'][1:-1:2]").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Child(vec![Selector::Name("a".into()), Selector::Name("b".into())]),
                Segment::Child(vec![Selector::Slice {
                    start: Some(1),
                    end: Some(-1),
                    step: Some(2)
                }]),
            ]
        );
    }

    #[test]
    fn parses_recursive_descent() {
        let segments = parse("$..fields[0]").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Descendant(vec![Selector::Name("fields".into())]),
                Segment::Child(vec![Selector::Index(0)]),
            ]
        );
    }

    #[test]
    fn parses_filter_with_precedence() {
        let segments = parse("$.t[?(@.a == 'x' || @.b && !@.c)]").unwrap();
        let Segment::Child(selectors) = &segments[1] else {
            panic!("expected child segment");
        };
        let Selector::Filter(FilterExpr::Or(left, right)) = &selectors[0] else {
            panic!("expected an or-filter, got {selectors:?}");
        };
        assert_eq!(
            **left,
            FilterExpr::Compare {
                left: Operand::Path(FilterPath {
                    absolute: false,
                    steps: vec![FilterStep::Name("a".into())]
                }),
                op: CompareOp::Eq,
                right: Operand::Literal(json!("x")),
            }
        );
        assert!(matches!(**right, FilterExpr::And(_, _)));
    }

    #[test]
    fn keywords_do_not_swallow_identifiers() {
        assert!(parse("$[?(@.x == nullable)]").is_err());
        assert!(parse("$[?(@.x == null)]").is_ok());
    }

    #[test]
    fn reports_offset_of_bad_syntax() {
        let err = parse("$.a[").unwrap_err();
        let DomainError::InvalidQuery { offset, .. } = err else {
            panic!("expected InvalidQuery");
        };
        assert_eq!(offset, 4);
    }

    #[test]
    fn rejects_missing_root() {
        assert!(parse("a.b").is_err());
        assert!(parse("").is_err());
        assert!(parse("$.").is_err());
        assert!(parse("$.a b").is_err());
    }
}
