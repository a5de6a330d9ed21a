use crate::{
    common::{
        span::{Span, Spanned},
        value::Value,
    },
    compiler::syntax::Syntax,
    construct::token::{Token, Tokens},
};

/// The reader builds forms out of a token stream by recursive descent.
/// Since TinyLisp is homoiconic, there is no separate AST type:
/// the reader's output is `Value`s, the same data the VM runs on
/// and the same data the `parse-sexprs` primitive hands to
/// self-hosted code.
pub struct Reader {
    tokens: Tokens,
    index: usize,
}

impl Reader {
    /// Reads a token stream into the list of top-level forms.
    pub fn read(tokens: Tokens) -> Result<Vec<Value>, Syntax> {
        let mut reader = Reader { tokens, index: 0 };

        let mut forms = vec![];
        while let Some(token) = reader.next_token() {
            forms.push(reader.form(token)?);
        }

        Ok(forms)
    }

    /// Returns the next token, advancing the reader by 1.
    fn next_token(&mut self) -> Option<Spanned<Token>> {
        if self.index < self.tokens.len() {
            let token = &self.tokens[self.index];
            self.index += 1;
            // cloning here is cheap enough not to matter
            Some(token.clone())
        } else {
            None
        }
    }

    /// Builds one form, starting from its already-consumed first token.
    fn form(&mut self, token: Spanned<Token>) -> Result<Value, Syntax> {
        match token.item {
            Token::Int(n) => Ok(Value::Integer(n)),
            Token::Str(s) => Ok(Value::String(s)),
            Token::Sym(name) => Ok(Value::Symbol(name)),
            Token::Open => self.list(token.span),
            Token::Close => {
                Err(Syntax::error("Unexpected closing ')'", &token.span))
            }
        }
    }

    /// Consumes forms until the `(` opened at `open` is matched.
    fn list(&mut self, open: Span) -> Result<Value, Syntax> {
        let mut items = vec![];
        let mut last = open.clone();

        loop {
            let token = match self.next_token() {
                Some(token) => token,
                None => {
                    // underline the whole unterminated list,
                    // not just its opening paren
                    return Err(Syntax::error(
                        "Unclosed '('",
                        &Span::combine(&open, &last),
                    ));
                }
            };

            last = token.span.clone();
            if token.item == Token::Close {
                return Ok(Value::List(items));
            }
            items.push(self.form(token)?);
            // a nested form may have consumed further tokens
            last = self.tokens[self.index - 1].span.clone();
        }
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;
    use crate::{common::source::Source, compiler::lex::Lexer};

    fn read_source(source: &str) -> Result<Vec<Value>, Syntax> {
        Reader::read(Lexer::lex(Source::source(source))?)
    }

    /// Generates a source file from some tokens, replacing each token
    /// with a minimal representative one.
    fn generate_minimal_source(tokens: &[Token]) -> String {
        let mut buffer = String::new();
        for token in tokens {
            buffer.push_str(match token {
                Token::Open => "(",
                Token::Close => ")",
                Token::Int(_) => " 2 ",
                Token::Str(_) => " \"s\" ",
                Token::Sym(_) => " x ",
            });
        }
        buffer
    }

    /// Checks if there are a matching number of opening and closing
    /// parens, with no closer before its opener.
    fn check_if_balanced(tokens: &[Token]) -> bool {
        let mut depth = 0;

        for token in tokens {
            match token {
                Token::Open => depth += 1,
                Token::Close => depth -= 1,
                _ => continue,
            };

            if depth < 0 {
                return false;
            }
        }

        depth == 0
    }

    fn value_strategy() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            any::<i64>().prop_map(Value::Integer),
            "[ -~]{0,12}".prop_map(Value::String),
            "[a-z_][a-z0-9_?!-]{0,8}".prop_map(Value::Symbol),
        ];
        leaf.prop_recursive(4, 24, 6, |inner| {
            prop::collection::vec(inner, 0..6).prop_map(Value::List)
        })
    }

    proptest! {
        #[test]
        fn check_balance(tokens: Vec<Token>) {
            let balanced = check_if_balanced(&tokens);
            let source = generate_minimal_source(&tokens);
            let result = read_source(&source);

            if balanced {
                prop_assert!(result.is_ok())
            } else {
                prop_assert!(result.is_err())
            }
        }

        #[test]
        fn reader_round_trip(
            forms in prop::collection::vec(value_strategy(), 0..4),
        ) {
            let text = forms
                .iter()
                .map(Value::repr)
                .collect::<Vec<String>>()
                .join(" ");
            prop_assert_eq!(read_source(&text).unwrap(), forms);
        }
    }

    #[test]
    fn empty_source_reads_no_forms() {
        assert_eq!(read_source("").unwrap(), vec![]);
    }

    #[test]
    fn atoms_and_nesting() {
        let forms = read_source(r#"(print (+ 1 "two")) done"#).unwrap();

        assert_eq!(
            forms,
            vec![
                Value::List(vec![
                    Value::Symbol("print".to_string()),
                    Value::List(vec![
                        Value::Symbol("+".to_string()),
                        Value::Integer(1),
                        Value::String("two".to_string()),
                    ]),
                ]),
                Value::Symbol("done".to_string()),
            ],
        );
    }

    #[test]
    fn empty_list_reads_as_nil() {
        assert_eq!(read_source("()").unwrap(), vec![Value::List(vec![])]);
    }

    #[test]
    fn unclosed_paren() {
        let error = read_source("(print 1").unwrap_err();
        assert_eq!(error.reason, "Unclosed '('");
        // the note spans the whole unterminated list
        assert_eq!(error.notes[0].span.contents(), "(print 1");
    }

    #[test]
    fn stray_closing_paren() {
        assert!(read_source("1)").is_err());
    }

    #[test]
    fn deeply_nested_lists() {
        let depth = 1000;
        let source =
            format!("{}42{}", "(".repeat(depth), ")".repeat(depth));

        let mut form = &read_source(&source).unwrap()[0];
        for _ in 0..depth {
            match form {
                Value::List(items) => form = &items[0],
                other => panic!("expected a list, found {:?}", other),
            }
        }
        assert_eq!(form, &Value::Integer(42));
    }
}
