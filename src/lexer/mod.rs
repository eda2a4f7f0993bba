//! The Lexer splits markup into literal text runs and engine tags.
//!
//! Only tags in the three engine namespaces (`c:`, `p:`, `t:`) are recognised;
//! anything else that looks like a tag, including ordinary HTML, is passed
//! through as text. The lexer is position based so the parser can report
//! errors against the exact byte span of a token.
//!
//! Binding spans (`{expr}`) are not tokens of their own: they are located
//! inside text and attribute values with [`match_binding`].

use alloc::sync::Arc;
use core::str::FromStr;

use crate::namespace::KeySet;
use crate::types::{
    Attribute, ErrorKind, SourceLocation, Tag, TagForm, TagNamespace, TemplateError, Token,
    TokenKind,
};

const fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

const fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

const fn is_attr_name_char(c: char) -> bool {
    is_name_char(c) || c == ':'
}

fn match_space(s: &str) -> usize {
    s.bytes()
        .take_while(|b| matches!(b, b' ' | b'\r' | b'\n' | b'\t'))
        .count()
}

/// Length of the name at the start of `s`, if any.
fn match_name(s: &str, rest: fn(char) -> bool) -> Option<usize> {
    let mut chars = s.chars();
    if !is_name_start(chars.next()?) {
        return None;
    }
    let len = 1 + chars.take_while(|c| rest(*c)).map(char::len_utf8).sum::<usize>();
    Some(len)
}

/// Recognise the head of an engine tag: `<`, optional `/`, namespace, `:`
/// and a name start character. Returns the namespace, the close flag and the
/// length of the prefix up to (not including) the name.
fn match_tag_head(s: &str) -> Option<(TagNamespace, bool, usize)> {
    let rest = s.strip_prefix('<')?;
    let (close, rest) = rest
        .strip_prefix('/')
        .map_or((false, rest), |r| (true, r));
    let mut chars = rest.chars();
    let ns = TagNamespace::from_str(&chars.next()?.to_string()).ok()?;
    if chars.next()? != ':' || !is_name_start(chars.next()?) {
        return None;
    }
    Some((ns, close, 1 + usize::from(close) + 2))
}

/// Match a binding span starting at the beginning of `s`.
///
/// A binding opens with `{` directly followed by a non-whitespace character
/// and runs to the brace that balances it. Quoted strings inside the span may
/// contain braces. Returns `Ok(None)` when `s` does not open a binding and an
/// error when the span is never closed.
pub fn match_binding(s: &str) -> Result<Option<usize>, ErrorKind> {
    let mut chars = s.char_indices();
    if !matches!(chars.next(), Some((_, '{'))) {
        return Ok(None);
    }
    match chars.clone().next() {
        Some((_, c)) if !c.is_whitespace() && c != '}' => {}
        _ => return Ok(None),
    }

    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    for (idx, c) in chars {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(Some(idx + 1));
                }
            }
            _ => {}
        }
    }
    Err(ErrorKind::UnbalancedBinding)
}

/// Tokenizer over a single markup document.
pub struct Lexer {
    input: Arc<str>,
    last_index: usize,
}

impl Lexer {
    /// Creates a lexer positioned at the start of `input`.
    #[must_use]
    pub const fn new(input: Arc<str>) -> Self {
        Self {
            input,
            last_index: 0,
        }
    }

    fn loc(&self, start: usize, end: usize) -> SourceLocation {
        SourceLocation::new(Arc::clone(&self.input), start, end)
    }

    /// Tokenizes and returns the next token.
    ///
    /// Once the input is exhausted every further call yields an `Eof` token.
    pub fn lex(&mut self) -> Result<Token, TemplateError> {
        let start = self.last_index;
        if start >= self.input.len() {
            return Ok(Token::new(TokenKind::Eof, self.loc(start, start)));
        }

        let slice = &self.input[start..];
        if let Some((namespace, close, head)) = match_tag_head(slice) {
            return self.lex_tag(namespace, close, head);
        }

        // Text runs to the next engine tag.
        let mut end = self.input.len();
        for (idx, _) in slice.match_indices('<').skip_while(|(i, _)| *i == 0) {
            if match_tag_head(&slice[idx..]).is_some() {
                end = start + idx;
                break;
            }
        }
        self.last_index = end;
        let text = self.input[start..end].to_owned();
        Ok(Token::new(TokenKind::Text(text), self.loc(start, end)))
    }

    fn lex_tag(
        &mut self,
        namespace: TagNamespace,
        close: bool,
        head: usize,
    ) -> Result<Token, TemplateError> {
        let start = self.last_index;
        let input = Arc::clone(&self.input);
        let slice = &input[start..];
        let malformed = |end: usize| {
            TemplateError::with_token(ErrorKind::MalformedTag, &self.loc(start, start + end))
        };

        let name_len = match_name(&slice[head..], is_name_char).ok_or_else(|| malformed(head))?;
        let name = slice[head..head + name_len].to_owned();
        let qualified = format!("{namespace}:{name}");
        let mut pos = head + name_len;

        let mut attributes = Vec::new();
        let mut seen = KeySet::default();
        let form = loop {
            let space = match_space(&slice[pos..]);
            pos += space;
            let rest = &slice[pos..];
            if rest.starts_with("/>") {
                pos += 2;
                break if close { None } else { Some(TagForm::SelfClosing) };
            }
            if rest.starts_with('>') {
                pos += 1;
                break Some(if close { TagForm::Close } else { TagForm::Open });
            }
            if rest.is_empty() {
                return Err(malformed(pos));
            }
            if space == 0 {
                return Err(malformed(pos + 1));
            }

            let attr_start = pos;
            let Some(attr_len) = match_name(rest, is_attr_name_char) else {
                return Err(TemplateError::with_token(
                    ErrorKind::MalformedAttribute {
                        tag: qualified.clone(),
                    },
                    &self.loc(start + pos, start + pos + 1),
                ));
            };
            let attr_name = rest[..attr_len].to_owned();
            pos += attr_len;

            let value = if slice[pos..].starts_with('=') {
                pos += 1;
                let rest = &slice[pos..];
                let quote = rest
                    .chars()
                    .next()
                    .filter(|c| matches!(c, '"' | '\''))
                    .ok_or_else(|| {
                        TemplateError::with_token(
                            ErrorKind::MalformedAttribute {
                                tag: qualified.clone(),
                            },
                            &self.loc(start + attr_start, start + pos),
                        )
                    })?;
                let Some(close_idx) = rest[1..].find(quote) else {
                    return Err(TemplateError::with_token(
                        ErrorKind::MalformedAttribute {
                            tag: qualified.clone(),
                        },
                        &self.loc(start + attr_start, start + pos),
                    ));
                };
                let value = rest[1..=close_idx].to_owned();
                pos += close_idx + 2;
                value
            } else {
                "true".to_owned()
            };

            let loc = self.loc(start + attr_start, start + pos);
            if !seen.insert(attr_name.clone()) {
                return Err(TemplateError::with_token(
                    ErrorKind::DuplicateAttribute {
                        tag: qualified.clone(),
                        attr: attr_name,
                    },
                    &loc,
                ));
            }
            attributes.push(Attribute {
                name: attr_name,
                value,
                loc,
            });
        };

        let loc = self.loc(start, start + pos);
        let Some(form) = form else {
            return Err(TemplateError::with_token(ErrorKind::MalformedTag, &loc));
        };
        if form == TagForm::Close && !attributes.is_empty() {
            return Err(TemplateError::with_token(
                ErrorKind::AttributesOnCloseTag { tag: qualified },
                &loc,
            ));
        }

        self.last_index = start + pos;
        Ok(Token::new(
            TokenKind::Tag(Tag {
                namespace,
                name,
                form,
                attributes,
            }),
            loc,
        ))
    }

    /// Returns the current byte position in the input string where the lexer
    /// will next read.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.last_index
    }

    /// The full input being tokenized.
    #[must_use]
    pub fn input(&self) -> &Arc<str> {
        &self.input
    }
}
