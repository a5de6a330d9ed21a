use std::{iter::Peekable, rc::Rc, str::Chars};

use crate::{
    common::{
        source::Source,
        span::{Span, Spanned},
    },
    compiler::syntax::{Note, Syntax},
    construct::token::{Token, Tokens},
};

/// The characters that may appear in a symbol besides ascii letters
/// (and, after the first character, digits).
const SYM_CHARS: &str = "_+-*/<>=!?";

fn is_sym_start(c: char) -> bool {
    c.is_ascii_alphabetic() || SYM_CHARS.contains(c)
}

fn is_sym_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || SYM_CHARS.contains(c)
}

#[derive(Debug)]
pub struct Lexer {
    source: Rc<Source>,
    index: usize,
    tokens: Tokens,
}

impl Lexer {
    /// Lexes a source file into a stream of tokens.
    /// Whitespace and `;` comments are discarded, not emitted.
    pub fn lex(source: Rc<Source>) -> Result<Tokens, Syntax> {
        let mut lexer = Lexer {
            source,
            index: 0,
            tokens: vec![],
        };

        // prime the lexer
        lexer.strip();

        // consume all!
        while lexer.index < lexer.source.contents.len() {
            let token = lexer.next_token()?;
            lexer.tokens.push(token);
            lexer.strip();
        }

        Ok(lexer.tokens)
    }

    /// Selects a range of a string of length `len` from the
    /// current index position.
    fn grab_from_index(&self, len: usize) -> &str {
        &self.source.contents[self.index..self.index + len]
    }

    /// Returns all characters after the current index position.
    fn remaining(&self) -> Chars {
        self.source.contents[self.index..].chars()
    }

    /// Whether the byte right after the current one is an ascii digit.
    /// Decides `-3` (one integer token) versus `-` (a symbol).
    fn digit_follows(&self) -> bool {
        self.source.contents[self.index..]
            .as_bytes()
            .get(1)
            .map_or(false, u8::is_ascii_digit)
    }

    /// Eats whitespace and `;` comments until neither makes progress.
    fn strip(&mut self) {
        loop {
            let old_index = self.index;
            let mut new_index = self.index;
            let mut remaining = self.remaining().peekable();

            while let Some(c) = remaining.peek() {
                if !c.is_whitespace() {
                    break;
                }
                new_index += c.len_utf8();
                remaining.next();
            }

            // a comment runs to the end of the line, or to the end of
            // the source if the final newline is missing
            if let Some(';') = remaining.peek() {
                new_index += 1;
                remaining.next();
                for c in remaining {
                    new_index += c.len_utf8();
                    if c == '\n' {
                        break;
                    }
                }
            }

            self.index = new_index;
            if old_index == new_index {
                break;
            }
        }
    }

    /// Consumes characters while `pred` holds,
    /// returning the number of bytes consumed.
    fn take_while(
        &self,
        remaining: &mut Peekable<impl Iterator<Item = char>>,
        pred: impl Fn(char) -> bool,
    ) -> usize {
        let mut len = 0;
        while let Some(c) = remaining.peek() {
            if !pred(*c) {
                break;
            }
            len += c.len_utf8();
            remaining.next();
        }
        len
    }

    fn unterminated(&self, len: usize) -> Syntax {
        Syntax::error(
            "Unexpected end of source while lexing string literal",
            &Span::point(&self.source, self.index + len),
        )
    }

    /// Reads `digits` hex digits of an `\xNN` or `\uNNNN` escape,
    /// advancing `len` past them.
    fn hex_escape(
        &self,
        remaining: &mut impl Iterator<Item = char>,
        digits: usize,
        len: &mut usize,
    ) -> Result<char, Syntax> {
        let start = *len;
        let mut code = 0;

        for _ in 0..digits {
            let c = remaining.next().ok_or_else(|| self.unterminated(*len))?;
            *len += c.len_utf8();
            let digit = c.to_digit(16).ok_or_else(|| {
                Syntax::error(
                    &format!("Expected {} hex digits in escape code", digits),
                    &Span::point(&self.source, self.index + *len - c.len_utf8()),
                )
            })?;
            code = code * 16 + digit;
        }

        char::from_u32(code).ok_or_else(|| {
            Syntax::error(
                "Escape code does not name a valid character",
                &Span::new(&self.source, self.index + start, *len - start),
            )
        })
    }

    /// Lexes a string literal; expects the opening quote
    /// to have been consumed already.
    fn string(
        &self,
        remaining: &mut impl Iterator<Item = char>,
    ) -> Result<(Token, usize), Syntax> {
        let mut len = 1;
        let mut string = String::new();

        while let Some(c) = remaining.next() {
            len += c.len_utf8();
            match c {
                '"' => return Ok((Token::Str(string), len)),
                '\\' => {
                    let esc =
                        remaining.next().ok_or_else(|| self.unterminated(len))?;
                    len += esc.len_utf8();
                    match esc {
                        '"' => string.push('"'),
                        '\\' => string.push('\\'),
                        'n' => string.push('\n'),
                        'r' => string.push('\r'),
                        't' => string.push('\t'),
                        '0' => string.push('\0'),
                        'x' => {
                            string.push(self.hex_escape(remaining, 2, &mut len)?)
                        }
                        'u' => {
                            string.push(self.hex_escape(remaining, 4, &mut len)?)
                        }
                        other => {
                            return Err(Syntax::error_with_note(
                                &format!(
                                    "Unknown escape code `\\{}` in string literal",
                                    other,
                                ),
                                Note::new_with_hint(
                                    "To include a single backslash `\\`, escape it first: `\\\\`",
                                    &Span::new(
                                        &self.source,
                                        self.index + len - other.len_utf8(),
                                        other.len_utf8(),
                                    ),
                                ),
                            ))
                        }
                    }
                }
                c => string.push(c),
            }
        }

        Err(self.unterminated(len))
    }

    /// Lexes an integer literal, sign included.
    fn integer(
        &self,
        remaining: &mut Peekable<impl Iterator<Item = char>>,
    ) -> Result<(Token, usize), Syntax> {
        let mut len = 0;
        if remaining.peek() == Some(&'-') {
            remaining.next();
            len += 1;
        }
        len += self.take_while(remaining, |c| c.is_ascii_digit());

        let integer = self.grab_from_index(len).parse::<i64>().map_err(|_| {
            Syntax::error(
                "Integer literal too large to fit in a signed 64-bit integer",
                &Span::new(&self.source, self.index, len),
            )
        })?;

        Ok((Token::Int(integer), len))
    }

    /// Lexes the next token.
    /// Expects all whitespace and comments to be stripped.
    fn next_token(&mut self) -> Result<Spanned<Token>, Syntax> {
        let mut remaining = self.remaining().peekable();

        let (token, len) = match *remaining.peek().unwrap() {
            '(' => (Token::Open, 1),
            ')' => (Token::Close, 1),
            '"' => {
                remaining.next();
                self.string(&mut remaining)?
            }
            c if c.is_ascii_digit() => self.integer(&mut remaining)?,
            '-' if self.digit_follows() => self.integer(&mut remaining)?,
            c if is_sym_start(c) => {
                let len = self.take_while(&mut remaining, is_sym_continue);
                (Token::Sym(self.grab_from_index(len).to_string()), len)
            }
            unknown => {
                return Err(Syntax::error(
                    &format!(
                        "Unexpected character at {}: '{}'",
                        self.index, unknown,
                    ),
                    &Span::point(&self.source, self.index),
                ))
            }
        };

        let spanned =
            Spanned::new(token, Span::new(&self.source, self.index, len));

        self.index += len;
        Ok(spanned)
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        Lexer::lex(Source::source(source))
            .unwrap()
            .into_iter()
            .map(|spanned| spanned.item)
            .collect()
    }

    proptest! {
        #[test]
        fn doesnt_crash(s in "\\PC*") {
            let result = Lexer::lex(Source::source(&s));
            format!("{:?}", result);
        }

        #[test]
        fn integers(s in "-?[0-9]{1,18}") {
            let tokens = kinds(&s);
            prop_assert_eq!(tokens.len(), 1);
            prop_assert_eq!(&tokens[0], &Token::Int(s.parse::<i64>().unwrap()));
        }

        #[test]
        fn symbols(s in "[a-z_+*/<>=!?][a-z0-9_+*/<>=!?-]{0,8}") {
            let tokens = kinds(&s);
            prop_assert_eq!(tokens.len(), 1);
            prop_assert_eq!(&tokens[0], &Token::Sym(s.clone()));
        }
    }

    #[test]
    fn empty() {
        assert_eq!(kinds(""), vec![]);
    }

    #[test]
    fn form() {
        assert_eq!(
            kinds("(+ 1 -2)"),
            vec![
                Token::Open,
                Token::Sym("+".to_string()),
                Token::Int(1),
                Token::Int(-2),
                Token::Close,
            ],
        );
    }

    #[test]
    fn minus_is_a_symbol_unless_digits_follow() {
        assert_eq!(
            kinds("(- a -3)"),
            vec![
                Token::Open,
                Token::Sym("-".to_string()),
                Token::Sym("a".to_string()),
                Token::Int(-3),
                Token::Close,
            ],
        );
    }

    #[test]
    fn comments_are_discarded() {
        assert_eq!(
            kinds("1 ; the rest of this line vanishes\n2"),
            vec![Token::Int(1), Token::Int(2)],
        );
    }

    #[test]
    fn comment_at_eof_without_newline() {
        assert_eq!(kinds("42 ; trailing"), vec![Token::Int(42)]);
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            kinds(r#""a\n\t\\\" \x41B""#),
            vec![Token::Str("a\n\t\\\" AB".to_string())],
        );
    }

    #[test]
    fn unterminated_string() {
        assert!(Lexer::lex(Source::source("\"oops")).is_err());
    }

    #[test]
    fn unknown_escape() {
        assert!(Lexer::lex(Source::source(r#""\q""#)).is_err());
    }

    #[test]
    fn unexpected_character() {
        let result = Lexer::lex(Source::source("(a [b])"));
        let error = result.unwrap_err();
        assert!(error.reason.starts_with("Unexpected character at 3"));
    }

    #[test]
    fn huge_integer_overflows() {
        assert!(Lexer::lex(Source::source("99999999999999999999")).is_err());
    }
}
