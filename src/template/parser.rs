use crate::template::error::TemplateError;
use crate::template::lexer::{Token, TokenKind, lex};

/// One piece of a parsed template: literal text, or a placeholder expression.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment {
    Text(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Path(PathExpr),
    Call {
        name: String,
        /// Absolute byte offset of the helper name in the template source.
        offset: usize,
        args: Vec<Expr>,
    },
    Str(String),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PathExpr {
    pub(crate) root: PathRoot,
    pub(crate) segs: Vec<PathSeg>,
    /// Absolute byte offset of the path root in the template source.
    pub(crate) offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PathRoot {
    /// The reserved `$$` data-row binding.
    Row,
    Name(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PathSeg {
    Field(String),
    Index(usize),
}

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Split a template into literal text and `{{ ... }}` placeholder expressions.
pub(crate) fn parse_template(src: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut out = Vec::new();
    let mut rest = src;
    let mut base = 0usize;

    while let Some(open) = rest.find(OPEN) {
        if open > 0 {
            out.push(Segment::Text(rest[..open].to_owned()));
        }
        let inner_start = open + OPEN.len();
        let Some(close) = rest[inner_start..].find(CLOSE) else {
            return Err(TemplateError::new(
                base + open,
                "unterminated '{{' placeholder",
            ));
        };
        let inner = &rest[inner_start..inner_start + close];
        out.push(Segment::Expr(parse_placeholder(inner, base + inner_start)?));

        let consumed = inner_start + close + CLOSE.len();
        rest = &rest[consumed..];
        base += consumed;
    }

    if !rest.is_empty() {
        out.push(Segment::Text(rest.to_owned()));
    }
    Ok(out)
}

/// Parse the inside of one placeholder: a path, a literal, or a helper call.
///
/// `base` is the placeholder's absolute byte offset in the template, used to
/// rebase token offsets so errors point into the original source.
fn parse_placeholder(src: &str, base: usize) -> Result<Expr, TemplateError> {
    let tokens = lex(src).map_err(|e| TemplateError::new(base + e.offset, e.message))?;
    let mut p = Parser {
        tokens,
        pos: 0,
        base,
    };

    let first = p.parse_operand()?;
    if p.peek_kind() == &TokenKind::Eof {
        return Ok(first);
    }

    // More tokens follow, so the first operand must name a helper.
    let Expr::Path(PathExpr {
        root: PathRoot::Name(name),
        segs,
        offset,
    }) = first
    else {
        return Err(TemplateError::new(
            p.offset(),
            "expected end of placeholder",
        ));
    };
    if !segs.is_empty() {
        return Err(TemplateError::new(
            p.offset(),
            "helper name cannot carry a path",
        ));
    }

    let mut args = Vec::new();
    while p.peek_kind() != &TokenKind::Eof {
        args.push(p.parse_operand()?);
    }
    Ok(Expr::Call { name, offset, args })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    base: usize,
}

impl Parser {
    fn peek_kind(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn bump(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        self.pos += 1;
        t
    }

    fn offset(&self) -> usize {
        self.base + self.tokens[self.pos].span.start
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn parse_operand(&mut self) -> Result<Expr, TemplateError> {
        let offset = self.offset();
        let t = self.bump();
        match t.kind {
            TokenKind::Str(s) => Ok(Expr::Str(s)),
            TokenKind::Number(n) => Ok(Expr::Number(n)),
            TokenKind::RowVar => Ok(Expr::Path(PathExpr {
                root: PathRoot::Row,
                segs: self.parse_path_tail()?,
                offset,
            })),
            TokenKind::Ident(name) => Ok(Expr::Path(PathExpr {
                root: PathRoot::Name(name),
                segs: self.parse_path_tail()?,
                offset,
            })),
            other => Err(TemplateError::new(
                offset,
                format!("expected a path, string, or number, found {other:?}"),
            )),
        }
    }

    fn parse_path_tail(&mut self) -> Result<Vec<PathSeg>, TemplateError> {
        let mut segs = Vec::new();
        while self.consume(&TokenKind::Dot) {
            if self.consume(&TokenKind::LBracket) {
                let offset = self.offset();
                let t = self.bump();
                let TokenKind::Number(n) = t.kind else {
                    return Err(TemplateError::new(offset, "expected an index after '.['"));
                };
                if n.fract() != 0.0 || n < 0.0 {
                    return Err(TemplateError::new(
                        offset,
                        "index must be a non-negative integer",
                    ));
                }
                if !self.consume(&TokenKind::RBracket) {
                    return Err(TemplateError::new(self.offset(), "expected ']'"));
                }
                segs.push(PathSeg::Index(n as usize));
            } else {
                let offset = self.offset();
                let t = self.bump();
                let TokenKind::Ident(name) = t.kind else {
                    return Err(TemplateError::new(
                        offset,
                        "expected a field name or '[index]' after '.'",
                    ));
                };
                segs.push(PathSeg::Field(name));
            }
        }
        Ok(segs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_text_and_placeholders() {
        let segs = parse_template("a {{name}} b").unwrap();
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[0], Segment::Text("a ".to_owned()));
        assert_eq!(segs[2], Segment::Text(" b".to_owned()));
        assert!(matches!(&segs[1], Segment::Expr(Expr::Path(_))));
    }

    #[test]
    fn parses_row_index_path() {
        let segs = parse_template("{{$$.[2]}}").unwrap();
        let Segment::Expr(Expr::Path(p)) = &segs[0] else {
            panic!("expected a path expression");
        };
        assert_eq!(p.root, PathRoot::Row);
        assert_eq!(p.segs, vec![PathSeg::Index(2)]);
    }

    #[test]
    fn parses_helper_call_with_mixed_args() {
        let segs = parse_template(r#"{{eq $$.[0] "ace" "yes" "no"}}"#).unwrap();
        let Segment::Expr(Expr::Call { name, args, .. }) = &segs[0] else {
            panic!("expected a helper call");
        };
        assert_eq!(name, "eq");
        assert_eq!(args.len(), 4);
    }

    #[test]
    fn rejects_unterminated_placeholder() {
        let err = parse_template("x {{name").unwrap_err();
        assert!(err.message.contains("unterminated"));
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn rejects_trailing_tokens_after_row_path() {
        // `$$` cannot name a helper, so nothing may follow it.
        assert!(parse_template("{{$$.[0] extra}}").is_err());
    }

    #[test]
    fn error_offsets_are_absolute() {
        let err = parse_template("abcdef{{$x}}").unwrap_err();
        assert_eq!(err.offset, 8);
    }
}
