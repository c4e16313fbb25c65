use std::io;

use tokio::io::AsyncRead;

use crate::reader::RewindReader;

/// Lexical classes of the JavaScript subset reachable inside an object or
/// array literal. Multi-character operators are kept as single `Punctuator`
/// tokens so the normaliser can reject them in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Whitespace,
    LineTerminator,
    Comment,
    Identifier,
    Punctuator,
    Str,
    Template,
    Regex,
    Number,
    BigInt,
    /// `/` or `/=`. In value position this is really the start of a regex;
    /// the normaliser re-reads it via [`JsLexer::read_regex`].
    Div,
}

#[derive(Debug)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum LexError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated template literal")]
    UnterminatedTemplate,
    #[error("template substitutions are not supported")]
    TemplateSubstitution,
    #[error("unterminated comment")]
    UnterminatedComment,
    #[error("unterminated regular expression")]
    UnterminatedRegex,
}

/// Streaming tokenizer over a [`RewindReader`].
///
/// The lexer never looks ahead more than one rune, and pushes that rune back
/// before returning, so the reader's capture buffer is always byte-exact:
/// [`consumed`](Self::consumed) is the authoritative number of source bytes
/// covered by the tokens returned so far.
pub(crate) struct JsLexer<'a, R> {
    source: &'a mut RewindReader<R>,
}

impl<'a, R: AsyncRead + Unpin> JsLexer<'a, R> {
    pub fn new(source: &'a mut RewindReader<R>) -> Self {
        Self { source }
    }

    /// Source bytes consumed by all tokens so far. Only meaningful while the
    /// reader is capturing, which is the only context the lexer runs in.
    pub fn consumed(&self) -> usize {
        self.source.captured_len()
    }

    async fn getc(&mut self) -> io::Result<Option<char>> {
        self.source.read_rune().await
    }

    fn ungetc(&mut self) {
        self.source.unread();
    }

    /// Next token, or `None` at end of stream.
    pub async fn next(&mut self) -> Result<Option<Token>, LexError> {
        let Some(c) = self.getc().await? else {
            return Ok(None);
        };

        match c {
            c if is_line_terminator(c) => {
                self.run(c, is_line_terminator, TokenKind::LineTerminator).await
            }
            c if is_js_whitespace(c) => self.run(c, is_js_whitespace, TokenKind::Whitespace).await,
            '/' => self.slash().await,
            '"' | '\'' => self.string(c).await,
            '`' => self.template().await,
            '0'..='9' => self.number(c).await,
            '.' => match self.getc().await? {
                Some(d) if d.is_ascii_digit() => {
                    self.ungetc();
                    self.number('.').await
                }
                Some(_) => {
                    self.ungetc();
                    Ok(Some(Token::new(TokenKind::Punctuator, ".")))
                }
                None => Ok(Some(Token::new(TokenKind::Punctuator, "."))),
            },
            c if is_ident_start(c) => self.run(c, is_ident_continue, TokenKind::Identifier).await,
            '{' | '}' | '[' | ']' | ':' | ',' | ';' | '(' | ')' => {
                Ok(Some(Token::new(TokenKind::Punctuator, c)))
            }
            '+' | '-' => match self.getc().await? {
                Some(d) if d == c => {
                    let mut text = String::new();
                    text.push(c);
                    text.push(d);
                    Ok(Some(Token::new(TokenKind::Punctuator, text)))
                }
                Some(_) => {
                    self.ungetc();
                    Ok(Some(Token::new(TokenKind::Punctuator, c)))
                }
                None => Ok(Some(Token::new(TokenKind::Punctuator, c))),
            },
            c if is_operator_char(c) => self.run(c, is_operator_char, TokenKind::Punctuator).await,
            other => Err(LexError::UnexpectedChar(other)),
        }
    }

    /// Consumes a run of characters matching `pred`, starting with `first`.
    async fn run(
        &mut self,
        first: char,
        pred: fn(char) -> bool,
        kind: TokenKind,
    ) -> Result<Option<Token>, LexError> {
        let mut text = String::new();
        text.push(first);
        loop {
            match self.getc().await? {
                Some(c) if pred(c) => text.push(c),
                Some(_) => {
                    self.ungetc();
                    break;
                }
                None => break,
            }
        }
        Ok(Some(Token::new(kind, text)))
    }

    async fn slash(&mut self) -> Result<Option<Token>, LexError> {
        match self.getc().await? {
            Some('/') => {
                // Line comment up to, but not including, the terminator.
                let mut text = String::from("//");
                loop {
                    match self.getc().await? {
                        Some(c) if is_line_terminator(c) => {
                            self.ungetc();
                            break;
                        }
                        Some(c) => text.push(c),
                        None => break,
                    }
                }
                Ok(Some(Token::new(TokenKind::Comment, text)))
            }
            Some('*') => {
                let mut text = String::from("/*");
                let mut star = false;
                loop {
                    match self.getc().await? {
                        Some(c) => {
                            text.push(c);
                            if star && c == '/' {
                                break;
                            }
                            star = c == '*';
                        }
                        None => return Err(LexError::UnterminatedComment),
                    }
                }
                Ok(Some(Token::new(TokenKind::Comment, text)))
            }
            Some('=') => Ok(Some(Token::new(TokenKind::Div, "/="))),
            Some(_) => {
                self.ungetc();
                Ok(Some(Token::new(TokenKind::Div, "/")))
            }
            None => Ok(Some(Token::new(TokenKind::Div, "/"))),
        }
    }

    async fn string(&mut self, quote: char) -> Result<Option<Token>, LexError> {
        let mut text = String::new();
        text.push(quote);
        loop {
            match self.getc().await? {
                None => return Err(LexError::UnterminatedString),
                Some(c) if c == quote => {
                    text.push(c);
                    break;
                }
                Some('\\') => {
                    text.push('\\');
                    match self.getc().await? {
                        Some(escaped) => text.push(escaped),
                        None => return Err(LexError::UnterminatedString),
                    }
                }
                Some(c) if c == '\n' || c == '\r' => return Err(LexError::UnterminatedString),
                Some(c) => text.push(c),
            }
        }
        Ok(Some(Token::new(TokenKind::Str, text)))
    }

    async fn template(&mut self) -> Result<Option<Token>, LexError> {
        let mut text = String::from("`");
        loop {
            match self.getc().await? {
                None => return Err(LexError::UnterminatedTemplate),
                Some('`') => {
                    text.push('`');
                    break;
                }
                Some('\\') => {
                    text.push('\\');
                    match self.getc().await? {
                        Some(escaped) => text.push(escaped),
                        None => return Err(LexError::UnterminatedTemplate),
                    }
                }
                Some('$') => {
                    // A substitution would make this an expression, which is
                    // out of scope.
                    match self.getc().await? {
                        Some('{') => return Err(LexError::TemplateSubstitution),
                        Some(_) => {
                            self.ungetc();
                            text.push('$');
                        }
                        None => text.push('$'),
                    }
                }
                Some(c) => text.push(c),
            }
        }
        Ok(Some(Token::new(TokenKind::Template, text)))
    }

    async fn number(&mut self, first: char) -> Result<Option<Token>, LexError> {
        let mut text = String::new();
        text.push(first);
        let mut integral = true;

        if first == '0' {
            match self.getc().await? {
                Some(c @ ('x' | 'X')) => {
                    text.push(c);
                    self.digits(&mut text, |c| c.is_ascii_hexdigit()).await?;
                }
                Some(c @ ('o' | 'O')) => {
                    text.push(c);
                    self.digits(&mut text, |c| ('0'..='7').contains(&c)).await?;
                }
                Some(c @ ('b' | 'B')) => {
                    text.push(c);
                    self.digits(&mut text, |c| c == '0' || c == '1').await?;
                }
                Some(_) => {
                    self.ungetc();
                    integral = self.decimal_tail(&mut text, false).await?;
                }
                None => {}
            }
        } else {
            integral = self.decimal_tail(&mut text, first == '.').await?;
        }

        // BigInt suffix. Only integers can carry it; `1.5n` lexes as a
        // number followed by an identifier and poisons the candidate.
        if integral {
            match self.getc().await? {
                Some('n') => {
                    text.push('n');
                    return Ok(Some(Token::new(TokenKind::BigInt, text)));
                }
                Some(_) => self.ungetc(),
                None => {}
            }
        }
        Ok(Some(Token::new(TokenKind::Number, text)))
    }

    /// Continues a decimal literal past its first character: integer digits,
    /// optional fraction, optional exponent. Returns whether the literal
    /// stayed integral (no fraction or exponent).
    async fn decimal_tail(&mut self, text: &mut String, from_dot: bool) -> Result<bool, LexError> {
        let mut integral = !from_dot;
        self.digits(text, |c| c.is_ascii_digit()).await?;

        if !from_dot {
            match self.getc().await? {
                Some('.') => {
                    text.push('.');
                    integral = false;
                    self.digits(text, |c| c.is_ascii_digit()).await?;
                }
                Some(_) => self.ungetc(),
                None => return Ok(integral),
            }
        }

        match self.getc().await? {
            Some(e @ ('e' | 'E')) => {
                text.push(e);
                integral = false;
                match self.getc().await? {
                    Some(sign @ ('+' | '-')) => text.push(sign),
                    Some(_) => self.ungetc(),
                    None => return Ok(integral),
                }
                self.digits(text, |c| c.is_ascii_digit()).await?;
            }
            Some(_) => self.ungetc(),
            None => {}
        }
        Ok(integral)
    }

    async fn digits(&mut self, text: &mut String, pred: fn(char) -> bool) -> Result<(), LexError> {
        loop {
            match self.getc().await? {
                Some(c) if pred(c) => text.push(c),
                Some(_) => {
                    self.ungetc();
                    return Ok(());
                }
                None => return Ok(()),
            }
        }
    }

    /// Re-reads the region following a [`TokenKind::Div`] token as a regular
    /// expression literal, including its flags. `div_text` is the already
    /// consumed `/` or `/=` prefix.
    pub async fn read_regex(&mut self, div_text: &str) -> Result<Token, LexError> {
        let mut text = String::from("/");
        if div_text == "/=" {
            text.push('=');
        }

        let mut in_class = false;
        loop {
            match self.getc().await? {
                None => return Err(LexError::UnterminatedRegex),
                Some(c) if is_line_terminator(c) => return Err(LexError::UnterminatedRegex),
                Some('\\') => {
                    text.push('\\');
                    match self.getc().await? {
                        Some(c) if !is_line_terminator(c) => text.push(c),
                        _ => return Err(LexError::UnterminatedRegex),
                    }
                }
                Some('[') => {
                    in_class = true;
                    text.push('[');
                }
                Some(']') => {
                    in_class = false;
                    text.push(']');
                }
                Some('/') if !in_class => {
                    text.push('/');
                    break;
                }
                Some(c) => text.push(c),
            }
        }

        // Flags.
        loop {
            match self.getc().await? {
                Some(c) if is_ident_continue(c) => text.push(c),
                Some(_) => {
                    self.ungetc();
                    break;
                }
                None => break,
            }
        }
        Ok(Token::new(TokenKind::Regex, text))
    }
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn is_js_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{0B}' | '\u{0C}' | '\u{FEFF}') || c.is_whitespace() && !is_line_terminator(c)
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '=' | '<' | '>' | '!' | '&' | '|' | '*' | '%' | '^' | '~' | '?')
}
