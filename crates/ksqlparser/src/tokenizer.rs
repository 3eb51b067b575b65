use crate::error::ParseError;

/// What sits at the cursor, classified against a set of candidate keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// One of the candidates; carries the canonical (upper case) spelling.
    Keyword(&'static str),
    /// A single quoted literal, quotes included.
    Quoted(&'a str),
    /// An identifier run: letters, digits, `_`, `.`, `*` and `->`.
    Word(&'a str),
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peeked<'a> {
    pub token: Token<'a>,
    /// Source text the token covers.
    pub raw: &'a str,
}

impl Peeked<'_> {
    pub fn keyword(&self) -> Option<&'static str> {
        match self.token {
            Token::Keyword(k) => Some(k),
            _ => None,
        }
    }
}

/// Cursor over statement text.
///
/// Whitespace and comments are skipped eagerly after every advance so the
/// cursor always rests on meaningful input.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    col: usize,
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b'*'
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        let mut t = Self {
            src,
            pos: 0,
            line: 1,
            col: 1,
        };
        t.skip_trivia();
        t
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    pub fn position(&self) -> (usize, usize) {
        (self.line, self.col)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    /// Classifies the input at the cursor without consuming it.
    ///
    /// The longest matching candidate wins; ties go to the earlier candidate.
    /// Without a candidate match the input is read as a quoted literal or an
    /// identifier run, which may be empty when neither applies.
    pub fn peek(&self, candidates: &[&'static str]) -> Peeked<'a> {
        let rest = self.rest();
        if rest.is_empty() {
            return Peeked {
                token: Token::Eof,
                raw: "",
            };
        }

        let best = candidates
            .iter()
            .filter_map(|c| match_keyword(rest, c).map(|len| (*c, len)))
            .fold(None::<(&'static str, usize)>, |best, (c, len)| match best {
                Some((_, best_len)) if best_len >= len => best,
                _ => Some((c, len)),
            });
        if let Some((keyword, len)) = best {
            return Peeked {
                token: Token::Keyword(keyword),
                raw: &rest[..len],
            };
        }

        if rest.starts_with('\'') {
            if let Some(len) = quoted_len(rest) {
                return Peeked {
                    token: Token::Quoted(&rest[..len]),
                    raw: &rest[..len],
                };
            }
        }

        let len = word_len(rest);
        Peeked {
            token: Token::Word(&rest[..len]),
            raw: &rest[..len],
        }
    }

    /// Consumes and returns whatever [`Tokenizer::peek`] would report.
    pub fn pop(&mut self, candidates: &[&'static str]) -> Peeked<'a> {
        let peeked = self.peek(candidates);
        self.advance(peeked.raw.len());
        peeked
    }

    /// Consumes one of `candidates` or fails naming all of them.
    pub fn pop_keyword(&mut self, candidates: &[&'static str]) -> Result<&'static str, ParseError> {
        match self.peek(candidates).token {
            Token::Keyword(k) => {
                self.pop(candidates);
                Ok(k)
            }
            _ => Err(self.expected_one_of(candidates)),
        }
    }

    /// Consumes a keyword only if it is next.
    pub fn pop_if(&mut self, candidates: &[&'static str]) -> Option<&'static str> {
        let keyword = self.peek(candidates).keyword()?;
        self.pop(candidates);
        Some(keyword)
    }

    pub fn advance(&mut self, len: usize) {
        let end = (self.pos + len).min(self.src.len());
        for ch in self.src[self.pos..end].chars() {
            self.bump_position(ch);
        }
        self.pos = end;
        self.skip_trivia();
    }

    fn bump_position(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest();
            let ws = rest.len() - rest.trim_start().len();
            if ws > 0 {
                self.consume_raw(ws);
                continue;
            }
            if rest.starts_with("--") {
                let len = rest.find('\n').map(|i| i + 1).unwrap_or(rest.len());
                self.consume_raw(len);
                continue;
            }
            if rest.starts_with("/*") {
                let len = rest[2..].find("*/").map(|i| i + 4).unwrap_or(rest.len());
                self.consume_raw(len);
                continue;
            }
            break;
        }
    }

    fn consume_raw(&mut self, len: usize) {
        let end = self.pos + len;
        for ch in self.src[self.pos..end].chars() {
            self.bump_position(ch);
        }
        self.pos = end;
    }

    pub fn error(&self, expected: impl Into<String>) -> ParseError {
        let consumed = &self.src[..self.pos];
        let context: String = {
            let tail: Vec<char> = consumed.chars().rev().take(40).collect();
            tail.into_iter().rev().collect()
        };
        ParseError {
            expected: expected.into(),
            line: self.line,
            col: self.col,
            context: format!("{}^", context.trim_start()),
        }
    }

    pub fn expected_one_of(&self, candidates: &[&'static str]) -> ParseError {
        self.error(format!("[{}]", candidates.join(", ")))
    }
}

/// Length of the source prefix matching `keyword`, case-insensitively.
///
/// Spaces inside `keyword` match any run of whitespace. A keyword ending in a
/// word character must not be followed by another one.
fn match_keyword(input: &str, keyword: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut i = 0;
    for (n, part) in keyword.split(' ').enumerate() {
        if n > 0 {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i == start {
                return None;
            }
        }
        let end = i + part.len();
        if end > bytes.len() || !bytes[i..end].eq_ignore_ascii_case(part.as_bytes()) {
            return None;
        }
        i = end;
    }
    let ends_in_word = keyword.as_bytes().last().is_some_and(|b| is_word_byte(*b) && *b != b'*');
    if ends_in_word && bytes.get(i).is_some_and(|b| is_word_byte(*b)) {
        return None;
    }
    Some(i)
}

/// Length of a single quoted literal including both quotes.
///
/// `\'` and `''` do not terminate the literal.
fn quoted_len(input: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\'' if bytes.get(i + 1) == Some(&b'\'') => i += 2,
            b'\'' => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

fn word_len(input: &str) -> usize {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'-' && bytes.get(i + 1) == Some(&b'>') && i > 0 {
            i += 2;
            continue;
        }
        if !is_word_byte(bytes[i]) {
            break;
        }
        i += 1;
    }
    i
}
