use std::fmt;
use thiserror::Error;

/// Default number of neighbouring IDs pulled in on each side by a `#` suffix.
pub const DEFAULT_CONTEXT_WINDOW: u32 = 10;

/// Default limit on the number of IDs one expression may select.
pub const DEFAULT_MAX_IDS: u32 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front, // odd IDs
    Back,  // even IDs
}

impl Side {
    pub fn of(id: u32) -> Self {
        if id % 2 == 1 {
            Side::Front
        } else {
            Side::Back
        }
    }
}

/// The front ID of the sheet that holds `id`. IDs start at 1; 0 maps to 0.
pub fn sheet_front(id: u32) -> u32 {
    match Side::of(id) {
        Side::Front => id,
        Side::Back => id.saturating_sub(1),
    }
}

/// The other ID of the sheet that holds `id`, saturating at both ends.
pub fn counterpart(id: u32) -> u32 {
    match Side::of(id) {
        Side::Front => id.saturating_add(1),
        Side::Back => id.saturating_sub(1),
    }
}

/// An inclusive span of IDs, `first <= last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdSpan {
    pub first: u32,
    pub last: u32,
}

impl IdSpan {
    pub fn single(id: u32) -> Self {
        IdSpan {
            first: id,
            last: id,
        }
    }

    pub fn new(first: u32, last: u32) -> Option<Self> {
        (first <= last).then_some(IdSpan { first, last })
    }

    pub fn contains(&self, id: u32) -> bool {
        self.first <= id && id <= self.last
    }

    pub fn id_count(&self) -> u32 {
        self.last - self.first + 1
    }

    pub fn ids(&self) -> std::ops::RangeInclusive<u32> {
        self.first..=self.last
    }

    /// Widen the span to whole sheets: starts on a front, ends on a back.
    pub fn align(&self) -> Self {
        IdSpan {
            first: sheet_front(self.first),
            last: if self.last % 2 == 1 {
                self.last.saturating_add(1)
            } else {
                self.last
            },
        }
    }

    /// Render the span the way it appears in filenames, zero-padded to `width`.
    pub fn label(&self, width: usize) -> String {
        if self.first == self.last {
            format!("{:0width$}", self.first)
        } else if self.last == self.first + 1 && Side::of(self.first) == Side::Front {
            format!("{:0width$}+", self.first)
        } else {
            format!("{:0width$}-{:0width$}", self.first, self.last)
        }
    }
}

impl fmt::Display for IdSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.label(0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdShape {
    Single(u32),
    Sheet(u32),     // N+
    TwoSheets(u32), // N++
    Range(u32, u32),
}

/// One comma-separated element of a range expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdToken {
    pub shape: IdShape,
    pub context: bool,
}

impl IdToken {
    /// Span covered by the token without its context window.
    pub fn base_span(&self) -> Result<IdSpan, ParseErrorKind> {
        let span = match self.shape {
            IdShape::Single(id) => IdSpan::single(id),
            IdShape::Sheet(id) => {
                let front = sheet_front(id);
                IdSpan {
                    first: front,
                    last: front.checked_add(1).ok_or(ParseErrorKind::Overflow)?,
                }
            }
            IdShape::TwoSheets(id) => {
                let front = sheet_front(id);
                IdSpan {
                    first: front,
                    last: front.checked_add(3).ok_or(ParseErrorKind::Overflow)?,
                }
            }
            IdShape::Range(start, end) => {
                IdSpan::new(start, end).ok_or(ParseErrorKind::Reversed { start, end })?
            }
        };
        Ok(span)
    }

    /// Span of the IDs this token selects, in ascending order.
    ///
    /// Pairs are therefore emitted front first. With a context window the
    /// token becomes the contiguous span `[min - window, max + window]`,
    /// clipped at 1.
    pub fn span(&self, window: u32) -> Result<IdSpan, ParseErrorKind> {
        let span = self.base_span()?;
        if !self.context {
            return Ok(span);
        }
        Ok(IdSpan {
            first: span.first.saturating_sub(window).max(1),
            last: span
                .last
                .checked_add(window)
                .ok_or(ParseErrorKind::Overflow)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("empty token")]
    Empty,
    #[error("not an id")]
    NotANumber,
    #[error("unknown suffix `{0}`")]
    UnknownSuffix(String),
    #[error("ids start at 1")]
    Zero,
    #[error("range end {end} is below its start {start}")]
    Reversed { start: u32, end: u32 },
    #[error("id out of range")]
    Overflow,
    #[error("expression selects more than {max} ids")]
    TooManyIds { max: u32 },
}

/// A malformed range expression. `position` is the byte offset of `token`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid id expression `{token}` at offset {position}: {kind}")]
pub struct ParseError {
    pub token: String,
    pub position: usize,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeParser {
    context_window: u32,
    abbreviated_end: bool,
    max_ids: u32,
}

impl Default for RangeParser {
    fn default() -> Self {
        RangeParser::new(DEFAULT_CONTEXT_WINDOW)
    }
}

impl RangeParser {
    pub fn new(context_window: u32) -> Self {
        RangeParser {
            context_window,
            abbreviated_end: false,
            max_ids: DEFAULT_MAX_IDS,
        }
    }

    /// Reject expressions selecting more than `max` IDs in total.
    pub fn with_max_ids(mut self, max: u32) -> Self {
        self.max_ids = max;
        self
    }

    /// Accept shortened range ends such as `453-57` for `453-457`.
    pub fn with_abbreviated_end(mut self, enabled: bool) -> Self {
        self.abbreviated_end = enabled;
        self
    }

    /// Parse a single token like "5", "5+", "5++", "3-9" or "5#".
    pub fn parse_token(&self, s: &str) -> Result<IdToken, ParseErrorKind> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseErrorKind::Empty);
        }

        let (body, context) = match s.strip_suffix('#') {
            Some(body) => (body, true),
            None => (s, false),
        };

        let shape = if let Some(id) = body.strip_suffix("++") {
            IdShape::TwoSheets(parse_id(id)?)
        } else if let Some(id) = body.strip_suffix('+') {
            IdShape::Sheet(parse_id(id)?)
        } else if let Some((start_str, end_str)) = body.split_once('-') {
            let (start_str, end_str) = (start_str.trim(), end_str.trim());
            let start = parse_id(start_str)?;
            let end = if self.abbreviated_end && end_str.len() < start_str.len() {
                expand_abbreviated_end(start_str, end_str, start)?
            } else {
                parse_id(end_str)?
            };
            if end < start {
                return Err(ParseErrorKind::Reversed { start, end });
            }
            IdShape::Range(start, end)
        } else {
            IdShape::Single(parse_id(body)?)
        };

        let token = IdToken { shape, context };
        token.base_span()?;
        Ok(token)
    }

    /// Resolve an expression into the ordered ID sequence it selects.
    ///
    /// Duplicates are kept: the caller controls page order through the input.
    /// The size limit is checked before any token is expanded.
    pub fn parse(&self, expr: &str) -> Result<Vec<u32>, ParseError> {
        let mut ids = Vec::new();
        let mut offset = 0;
        for raw in expr.split(',') {
            let lead = raw.len() - raw.trim_start().len();
            let token = raw.trim();
            let selected = ids.len() as u64;
            let span = self
                .parse_token(token)
                .and_then(|t| t.span(self.context_window))
                .and_then(|span| {
                    if selected + u64::from(span.id_count()) > u64::from(self.max_ids) {
                        Err(ParseErrorKind::TooManyIds { max: self.max_ids })
                    } else {
                        Ok(span)
                    }
                })
                .map_err(|kind| ParseError {
                    token: token.to_string(),
                    position: offset + lead,
                    kind,
                })?;
            ids.extend(span.ids());
            offset += raw.len() + 1;
        }
        Ok(ids)
    }
}

/// Parse an expression with the default context window.
pub fn parse_ids(expr: &str) -> Result<Vec<u32>, ParseError> {
    RangeParser::default().parse(expr)
}

fn parse_id(s: &str) -> Result<u32, ParseErrorKind> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ParseErrorKind::NotANumber);
    }
    let digits = s.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return Err(ParseErrorKind::NotANumber);
    }
    if digits < s.len() {
        return Err(ParseErrorKind::UnknownSuffix(s[digits..].to_string()));
    }
    match s.parse::<u32>() {
        Ok(0) => Err(ParseErrorKind::Zero),
        Ok(id) => Ok(id),
        Err(_) => Err(ParseErrorKind::Overflow),
    }
}

// "453-57" keeps the leading digits of the start: 457.
// "458-2" would land below the start, so it carries over: 462.
fn expand_abbreviated_end(start_str: &str, end_str: &str, start: u32) -> Result<u32, ParseErrorKind> {
    let digits = end_str.bytes().take_while(u8::is_ascii_digit).count();
    if end_str.is_empty() || digits < end_str.len() {
        return parse_id(end_str);
    }
    let prefix_len = start_str.len() - end_str.len();
    let full = format!("{}{}", &start_str[..prefix_len], end_str);
    let mut end: u32 = full.parse().map_err(|_| ParseErrorKind::Overflow)?;
    if end < start {
        let step = 10u32
            .checked_pow(end_str.len() as u32)
            .ok_or(ParseErrorKind::Overflow)?;
        end = end.checked_add(step).ok_or(ParseErrorKind::Overflow)?;
    }
    Ok(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_id() {
        assert_eq!(parse_ids("5").unwrap(), vec![5]);
        assert_eq!(parse_ids("  42 ").unwrap(), vec![42]);
    }

    #[test]
    fn test_sheet_pairs_are_ascending() {
        assert_eq!(parse_ids("453+").unwrap(), vec![453, 454]);
        assert_eq!(parse_ids("88+").unwrap(), vec![87, 88]);
        assert_eq!(parse_ids("1+").unwrap(), vec![1, 2]);
        assert_eq!(parse_ids("2+").unwrap(), vec![1, 2]);
        assert_eq!(
            parse_ids("453+,88+").unwrap(),
            parse_ids("453,454,87,88").unwrap()
        );
    }

    #[test]
    fn test_two_sheets() {
        let expected = vec![869, 870, 871, 872];
        assert_eq!(parse_ids("869++").unwrap(), expected);
        assert_eq!(parse_ids("869+,871+").unwrap(), expected);
        assert_eq!(parse_ids("870++").unwrap(), expected);
    }

    #[test]
    fn test_range() {
        assert_eq!(parse_ids("3-7").unwrap(), vec![3, 4, 5, 6, 7]);
        assert_eq!(parse_ids("4-4").unwrap(), vec![4]);
    }

    #[test]
    fn test_reversed_range_is_an_error() {
        let err = parse_ids("5-3").unwrap_err();
        assert_eq!(err.token, "5-3");
        assert_eq!(err.position, 0);
        assert_eq!(err.kind, ParseErrorKind::Reversed { start: 5, end: 3 });
    }

    #[test]
    fn test_context_window() {
        assert_eq!(parse_ids("100#").unwrap(), parse_ids("90-110").unwrap());
        assert_eq!(parse_ids("20+#").unwrap(), parse_ids("9-30").unwrap());
        assert_eq!(
            RangeParser::new(2).parse("10-12#").unwrap(),
            vec![8, 9, 10, 11, 12, 13, 14]
        );
    }

    #[test]
    fn test_context_window_clips_at_one() {
        assert_eq!(parse_ids("3#").unwrap(), parse_ids("1-13").unwrap());
        assert!(parse_ids("1#").unwrap().iter().all(|&id| id >= 1));
    }

    #[test]
    fn test_each_token_has_its_own_window() {
        let ids = RangeParser::new(1).parse("5#,6#").unwrap();
        assert_eq!(ids, vec![4, 5, 6, 5, 6, 7]);
    }

    #[test]
    fn test_order_and_duplicates_preserved() {
        assert_eq!(parse_ids("7,3,7").unwrap(), vec![7, 3, 7]);
        assert_eq!(parse_ids("10-11,1").unwrap(), vec![10, 11, 1]);
    }

    #[test]
    fn test_error_reports_token_and_offset() {
        let err = parse_ids("1, 2x,3").unwrap_err();
        assert_eq!(err.token, "2x");
        assert_eq!(err.position, 3);
        assert_eq!(err.kind, ParseErrorKind::UnknownSuffix("x".into()));

        let err = parse_ids("1,,3").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Empty);
        assert_eq!(err.position, 2);

        assert_eq!(parse_ids("abc").unwrap_err().kind, ParseErrorKind::NotANumber);
        assert_eq!(parse_ids("-5").unwrap_err().kind, ParseErrorKind::NotANumber);
        assert_eq!(parse_ids("0").unwrap_err().kind, ParseErrorKind::Zero);
        assert_eq!(parse_ids("5##").unwrap_err().kind, ParseErrorKind::UnknownSuffix("#".into()));
        assert!(parse_ids("").is_err());
    }

    #[test]
    fn test_overflow() {
        assert_eq!(
            parse_ids("99999999999").unwrap_err().kind,
            ParseErrorKind::Overflow
        );
        let max = u32::MAX.to_string();
        assert_eq!(
            parse_ids(&format!("{max}#")).unwrap_err().kind,
            ParseErrorKind::Overflow
        );
    }

    #[test]
    fn test_abbreviated_end() {
        let parser = RangeParser::default().with_abbreviated_end(true);
        assert_eq!(parser.parse("453-57").unwrap(), (453..=457).collect::<Vec<_>>());
        assert_eq!(parser.parse("458-2").unwrap(), (458..=462).collect::<Vec<_>>());
        assert!(parser.parse("5-3").is_err());
        // strict by default
        assert!(parse_ids("453-57").is_err());
    }

    #[test]
    fn test_span_align() {
        let cases = [
            ((1, 2), (1, 2)),
            ((1, 3), (1, 4)),
            ((4, 4), (3, 4)),
            ((4, 8), (3, 8)),
            ((4, 7), (3, 8)),
        ];
        for ((first, last), (af, al)) in cases {
            let span = IdSpan::new(first, last).unwrap();
            assert_eq!(span.align(), IdSpan::new(af, al).unwrap());
        }
    }

    #[test]
    fn test_span_label() {
        assert_eq!(IdSpan::single(7).label(5), "00007");
        assert_eq!(IdSpan::new(453, 454).unwrap().label(0), "453+");
        assert_eq!(IdSpan::new(454, 455).unwrap().label(0), "454-455");
        assert_eq!(IdSpan::new(1, 4).unwrap().label(3), "001-004");
        assert_eq!(format!("{:>6}", IdSpan::single(12)), "    12");
    }

    #[test]
    fn test_side_arithmetic() {
        assert_eq!(Side::of(1), Side::Front);
        assert_eq!(Side::of(2), Side::Back);
        assert_eq!(counterpart(1), 2);
        assert_eq!(counterpart(2), 1);
        assert_eq!(sheet_front(10), 9);
        assert_eq!(sheet_front(0), 0);
        assert_eq!(counterpart(0), 0);
        assert_eq!(counterpart(u32::MAX), u32::MAX);
    }

    #[test]
    fn test_huge_selections_are_rejected() {
        let err = parse_ids("1-4000000000").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TooManyIds { max: DEFAULT_MAX_IDS });
        assert_eq!(err.position, 0);

        let wide = RangeParser::new(3_000_000_000);
        assert!(matches!(
            wide.parse("1#").unwrap_err().kind,
            ParseErrorKind::TooManyIds { .. }
        ));

        // the limit counts the whole expression
        let small = RangeParser::default().with_max_ids(4);
        assert_eq!(small.parse("1+,3+").unwrap(), vec![1, 2, 3, 4]);
        let err = small.parse("1+,3+,5").unwrap_err();
        assert_eq!((err.token.as_str(), err.position), ("5", 6));
    }
}
