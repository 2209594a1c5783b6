use crate::template::error::TemplateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub(crate) start: usize,
    #[allow(dead_code)]
    pub(crate) end: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    /// The reserved data-row variable `$$`.
    RowVar,
    Number(f64),
    Str(String),

    Dot,
    LBracket,
    RBracket,

    Eof,
}

/// Tokenize the inside of one `{{ ... }}` placeholder.
///
/// Offsets are relative to `input`; callers rebase them onto the enclosing
/// template before surfacing errors.
pub(crate) fn lex(input: &str) -> Result<Vec<Token>, TemplateError> {
    let mut out = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let start = i;

        // Number: [0-9]+(.[0-9]+)?
        if c.is_ascii_digit() {
            while i < bytes.len() && (bytes[i] as char).is_ascii_digit() {
                i += 1;
            }
            if i < bytes.len()
                && (bytes[i] as char) == '.'
                && i + 1 < bytes.len()
                && (bytes[i + 1] as char).is_ascii_digit()
            {
                i += 1;
                while i < bytes.len() && (bytes[i] as char).is_ascii_digit() {
                    i += 1;
                }
            }

            let s = &input[start..i];
            let v: f64 = s
                .parse()
                .map_err(|_| TemplateError::new(start, "invalid number"))?;
            out.push(Token {
                kind: TokenKind::Number(v),
                span: Span { start, end: i },
            });
            continue;
        }

        // Ident
        if c.is_ascii_alphabetic() || c == '_' {
            i += 1;
            while i < bytes.len() {
                let ch = bytes[i] as char;
                if ch.is_ascii_alphanumeric() || ch == '_' {
                    i += 1;
                } else {
                    break;
                }
            }
            out.push(Token {
                kind: TokenKind::Ident(input[start..i].to_owned()),
                span: Span { start, end: i },
            });
            continue;
        }

        // String literal: double-quoted, backslash escapes the next char.
        if c == '"' {
            let mut s = String::new();
            let mut chars = input[i + 1..].char_indices();
            let mut end = None;
            while let Some((off, ch)) = chars.next() {
                match ch {
                    '\\' => {
                        if let Some((_, esc)) = chars.next() {
                            s.push(esc);
                        }
                    }
                    '"' => {
                        end = Some(i + 1 + off + 1);
                        break;
                    }
                    _ => s.push(ch),
                }
            }
            let Some(end) = end else {
                return Err(TemplateError::new(start, "unterminated string literal"));
            };
            i = end;
            out.push(Token {
                kind: TokenKind::Str(s),
                span: Span { start, end: i },
            });
            continue;
        }

        // The reserved row variable.
        if c == '$' {
            if i + 1 < bytes.len() && bytes[i + 1] as char == '$' {
                i += 2;
                out.push(Token {
                    kind: TokenKind::RowVar,
                    span: Span { start, end: i },
                });
                continue;
            }
            return Err(TemplateError::new(start, "expected '$$'"));
        }

        let kind = match c {
            '.' => TokenKind::Dot,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            _ => {
                return Err(TemplateError::new(
                    start,
                    format!("unexpected character '{c}'"),
                ));
            }
        };
        i += 1;
        out.push(Token {
            kind,
            span: Span { start, end: i },
        });
    }

    out.push(Token {
        kind: TokenKind::Eof,
        span: Span {
            start: input.len(),
            end: input.len(),
        },
    });

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_row_path() {
        assert_eq!(
            kinds("$$.[0]"),
            vec![
                TokenKind::RowVar,
                TokenKind::Dot,
                TokenKind::LBracket,
                TokenKind::Number(0.0),
                TokenKind::RBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_helper_call_shape() {
        assert_eq!(
            kinds(r#"eq name "ace" "hit" "miss""#),
            vec![
                TokenKind::Ident("eq".to_owned()),
                TokenKind::Ident("name".to_owned()),
                TokenKind::Str("ace".to_owned()),
                TokenKind::Str("hit".to_owned()),
                TokenKind::Str("miss".to_owned()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn rejects_lone_dollar() {
        assert!(lex("$x").is_err());
    }

    #[test]
    fn rejects_unterminated_string() {
        let err = lex("\"abc").unwrap_err();
        assert!(err.message.contains("unterminated"));
    }
}
