//! PostScript tokenizer.

use std::iter::Peekable;
use std::str::Chars;

/// A PostScript token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Integer, real or radix number.
    Number(f64),
    /// Executable name, including `[`, `]`, `<<` and `>>`.
    Name(String),
    /// `/name`.
    Literal(String),
    /// `(string)` or `<hex>`, escapes decoded.
    String(String),
    /// `{ ... }`, kept as a unit.
    Proc(Vec<Token>),
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '<' | '>' | '[' | ']' | '{' | '}' | '/' | '%')
}

fn parse_number(word: &str) -> Option<f64> {
    if let Some((radix, digits)) = word.split_once('#') {
        let radix: u32 = radix.parse().ok()?;
        if !(2..=36).contains(&radix) {
            return None;
        }
        return i64::from_str_radix(digits, radix).ok().map(|v| v as f64);
    }
    let first = word.chars().next()?;
    if !(first.is_ascii_digit() || matches!(first, '+' | '-' | '.')) {
        return None;
    }
    word.parse::<f64>().ok().filter(|v| v.is_finite())
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl Lexer<'_> {
    fn skip_space_and_comments(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
            } else if c == '%' {
                for c in self.chars.by_ref() {
                    if c == '\n' || c == '\r' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn word(&mut self) -> String {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if is_delimiter(c) {
                break;
            }
            out.push(c);
            self.chars.next();
        }
        out
    }

    fn string(&mut self) -> String {
        let mut out = String::new();
        let mut depth = 1usize;
        while let Some(c) = self.chars.next() {
            match c {
                '(' => {
                    depth += 1;
                    out.push(c);
                }
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    out.push(c);
                }
                '\\' => self.escape(&mut out),
                c => out.push(c),
            }
        }
        out
    }

    fn escape(&mut self, out: &mut String) {
        let Some(c) = self.chars.next() else {
            return;
        };
        match c {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            '\r' => {
                // Line continuation.
                if self.chars.peek() == Some(&'\n') {
                    self.chars.next();
                }
            }
            '\n' => {}
            '0'..='7' => {
                let mut code = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            self.chars.next();
                        }
                        None => break,
                    }
                }
                if let Some(ch) = char::from_u32(code & 0xff) {
                    out.push(ch);
                }
            }
            other => out.push(other),
        }
    }

    fn hex_string(&mut self) -> String {
        let mut digits = Vec::new();
        for c in self.chars.by_ref() {
            if c == '>' {
                break;
            }
            if let Some(d) = c.to_digit(16) {
                digits.push(d as u8);
            }
        }
        if digits.len() % 2 == 1 {
            digits.push(0);
        }
        digits
            .chunks_exact(2)
            .map(|pair| char::from(pair[0] * 16 + pair[1]))
            .collect()
    }

    /// Tokens up to the matching `}` (or end of input when `nested`).
    fn tokens(&mut self, nested: bool) -> Vec<Token> {
        let mut out = Vec::new();
        loop {
            self.skip_space_and_comments();
            let Some(c) = self.chars.next() else {
                return out;
            };
            let token = match c {
                '{' => Token::Proc(self.tokens(true)),
                '}' if nested => return out,
                '}' | ')' => continue,
                '(' => Token::String(self.string()),
                '<' if self.chars.peek() == Some(&'<') => {
                    self.chars.next();
                    Token::Name("<<".into())
                }
                '<' => Token::String(self.hex_string()),
                '>' if self.chars.peek() == Some(&'>') => {
                    self.chars.next();
                    Token::Name(">>".into())
                }
                '>' => continue,
                '[' | ']' => Token::Name(c.to_string()),
                '/' => {
                    // `//name` is an immediately evaluated name; treat it as a literal.
                    if self.chars.peek() == Some(&'/') {
                        self.chars.next();
                    }
                    Token::Literal(self.word())
                }
                c => {
                    let mut word = c.to_string();
                    word.push_str(&self.word());
                    match parse_number(&word) {
                        Some(v) => Token::Number(v),
                        None => Token::Name(word),
                    }
                }
            };
            out.push(token);
        }
    }
}

/// Split PostScript source into tokens.
///
/// Comments are dropped, strings have their escapes decoded and procedure
/// bodies come back nested as [`Token::Proc`]. Stray closing delimiters are
/// ignored and an unterminated procedure or string ends at end of input.
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer {
        chars: source.chars().peekable(),
    }
    .tokens(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Token {
        Token::Name(s.into())
    }

    #[test]
    fn test_numbers_and_names() {
        let tokens = tokenize("10 -2.5 .5 1e2 16#ff moveto % comment\nlineto");
        assert_eq!(
            tokens,
            vec![
                Token::Number(10.0),
                Token::Number(-2.5),
                Token::Number(0.5),
                Token::Number(100.0),
                Token::Number(255.0),
                name("moveto"),
                name("lineto"),
            ]
        );
    }

    #[test]
    fn test_strings() {
        let tokens = tokenize(r"(a \(b\) (nested)) (\101\n) <48 69>");
        assert_eq!(
            tokens,
            vec![
                Token::String("a (b) (nested)".into()),
                Token::String("A\n".into()),
                Token::String("Hi".into()),
            ]
        );
    }

    #[test]
    fn test_procs_and_literals() {
        let tokens = tokenize("/m {moveto} bind def [1 2] <<>>");
        assert_eq!(
            tokens,
            vec![
                Token::Literal("m".into()),
                Token::Proc(vec![name("moveto")]),
                name("bind"),
                name("def"),
                name("["),
                Token::Number(1.0),
                Token::Number(2.0),
                name("]"),
                name("<<"),
                name(">>"),
            ]
        );
    }

    #[test]
    fn test_unterminated_input() {
        assert_eq!(
            tokenize("{ 1 2"),
            vec![Token::Proc(vec![Token::Number(1.0), Token::Number(2.0)])]
        );
        assert_eq!(tokenize("(abc"), vec![Token::String("abc".into())]);
        assert_eq!(tokenize("} ) >"), vec![]);
    }
}
