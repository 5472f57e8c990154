// src/manifest/syntax.rs
//
// The written forms inside manifest strings: type references, value
// references and compile-time expressions.
//
//   type  := '*' type | '[' type ';' expr ']' | path
//   path  := ident ('::' ident)* ('<' arg (',' arg)* '>')?
//   arg   := type | additive expression
//   expr  := '||' over '&&' over comparisons over '+ -' over '* / %'
//            over unary '- !' over literals, names and parentheses

use kiln_identity::{Identifier, Interner, PrimitiveType, Span};
use kiln_sema::const_eval::{BinaryOp, ConstExpr, ConstExprKind, UnaryOp};
use kiln_sema::decl::{GenericArgRef, TypeRef, ValueRef};
use kiln_sema::types::Ty;

use crate::errors::ManifestError;

type Result<T> = std::result::Result<T, ManifestError>;

const PUNCTUATION: &[&str] = &[
    "::", "<=", ">=", "==", "!=", "&&", "||", "<", ">", ",", ";", "[", "]", "*", "(", ")", "+",
    "-", "/", "%", "!",
];

/// Binary operators by precedence, loosest first.
const LEVELS: &[&[(&str, BinaryOp)]] = &[
    &[("||", BinaryOp::Or)],
    &[("&&", BinaryOp::And)],
    &[
        ("==", BinaryOp::Eq),
        ("!=", BinaryOp::Ne),
        ("<=", BinaryOp::Le),
        (">=", BinaryOp::Ge),
        ("<", BinaryOp::Lt),
        (">", BinaryOp::Gt),
    ],
    &[("+", BinaryOp::Add), ("-", BinaryOp::Sub)],
    &[("*", BinaryOp::Mul), ("/", BinaryOp::Div), ("%", BinaryOp::Rem)],
];

/// Generic arguments stop below comparisons so `>` closes the list.
const ADDITIVE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Ident(&'a str),
    Int(i64),
    Punct(&'static str),
}

#[derive(Debug, Clone, Copy)]
struct Lexed<'a> {
    token: Token<'a>,
    span: Span,
}

fn syntax_error(message: impl Into<String>, span: Span) -> ManifestError {
    ManifestError::Syntax {
        message: message.into(),
        span: span.into(),
    }
}

fn tokenize(text: &str, base: usize) -> Result<Vec<Lexed<'_>>> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    while let Some(c) = text[pos..].chars().next() {
        let rest = &text[pos..];
        let start = pos;
        if c.is_whitespace() {
            pos += c.len_utf8();
            continue;
        }
        let token = if c.is_ascii_alphabetic() || c == '_' {
            let len = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(rest.len());
            pos += len;
            Token::Ident(&rest[..len])
        } else if c.is_ascii_digit() {
            let len = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            pos += len;
            let value = rest[..len].parse::<i64>().map_err(|_| {
                syntax_error("integer literal out of range", Span::new(base + start, base + pos))
            })?;
            Token::Int(value)
        } else if let Some(punct) = PUNCTUATION.iter().find(|p| rest.starts_with(**p)) {
            pos += punct.len();
            Token::Punct(*punct)
        } else {
            let span = Span::new(base + start, base + start + c.len_utf8());
            return Err(syntax_error(format!("unexpected character '{c}'"), span));
        };
        tokens.push(Lexed {
            token,
            span: Span::new(base + start, base + pos),
        });
    }
    Ok(tokens)
}

struct Parser<'a, 'i> {
    tokens: Vec<Lexed<'a>>,
    pos: usize,
    /// Empty span just past the text, for errors at the end.
    end: Span,
    interner: &'i mut Interner,
}

impl<'a, 'i> Parser<'a, 'i> {
    fn new(text: &'a str, base: usize, interner: &'i mut Interner) -> Result<Self> {
        let end = base + text.len();
        Ok(Self {
            tokens: tokenize(text, base)?,
            pos: 0,
            end: Span::new(end, end),
            interner,
        })
    }

    fn peek(&self) -> Option<Lexed<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_span(&self) -> Span {
        self.peek().map_or(self.end, |lexed| lexed.span)
    }

    fn at(&self, punct: &str) -> bool {
        matches!(self.peek(), Some(Lexed { token: Token::Punct(p), .. }) if p == punct)
    }

    fn eat(&mut self, punct: &str) -> Option<Span> {
        let span = self.peek_span();
        if self.at(punct) {
            self.pos += 1;
            Some(span)
        } else {
            None
        }
    }

    fn expect(&mut self, punct: &str) -> Result<Span> {
        self.eat(punct)
            .ok_or_else(|| syntax_error(format!("expected `{punct}`"), self.peek_span()))
    }

    fn finish(&self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(lexed) => Err(syntax_error("unexpected trailing input", lexed.span)),
        }
    }

    fn ident(&mut self) -> Result<Identifier> {
        match self.peek() {
            Some(Lexed {
                token: Token::Ident(name),
                span,
            }) => {
                self.pos += 1;
                Ok(Identifier::intern(self.interner, name, span))
            }
            _ => Err(syntax_error("expected a name", self.peek_span())),
        }
    }

    fn ty(&mut self) -> Result<TypeRef> {
        let start = self.peek_span();
        if self.eat("*").is_some() {
            let inner = self.ty()?;
            let span = start.merge(inner.span);
            return Ok(TypeRef::pointer(inner, span));
        }
        if self.eat("[").is_some() {
            let elem = self.ty()?;
            self.expect(";")?;
            let len = self.expr()?;
            let close = self.expect("]")?;
            return Ok(TypeRef::array(elem, len, start.merge(close)));
        }
        let (segments, args, span) = self.path()?;
        if let [single] = segments.as_slice()
            && args.is_empty()
            && let Some(prim) = PrimitiveType::from_name(single.as_str(self.interner))
        {
            return Ok(TypeRef::primitive(prim, span));
        }
        Ok(TypeRef::path(segments, args, span))
    }

    fn path(&mut self) -> Result<(Vec<Identifier>, Vec<GenericArgRef>, Span)> {
        let first = self.ident()?;
        let mut span = first.span;
        let mut segments = vec![first];
        while self.eat("::").is_some() {
            let segment = self.ident()?;
            span = span.merge(segment.span);
            segments.push(segment);
        }
        let mut args = Vec::new();
        if self.eat("<").is_some() {
            loop {
                args.push(self.generic_arg()?);
                if self.eat(",").is_none() {
                    break;
                }
            }
            span = span.merge(self.expect(">")?);
        }
        Ok((segments, args, span))
    }

    fn starts_type(&self) -> bool {
        match self.peek().map(|lexed| lexed.token) {
            Some(Token::Ident(name)) => name != "true" && name != "false",
            Some(Token::Punct(p)) => p == "*" || p == "[",
            _ => false,
        }
    }

    /// A type when one parses up to the next `,` or `>`, an expression
    /// otherwise.
    fn generic_arg(&mut self) -> Result<GenericArgRef> {
        let checkpoint = self.pos;
        if self.starts_type()
            && let Ok(ty) = self.ty()
            && (self.at(",") || self.at(">"))
        {
            return Ok(GenericArgRef::Type(ty));
        }
        self.pos = checkpoint;
        Ok(GenericArgRef::Value(self.binary(ADDITIVE)?))
    }

    fn expr(&mut self) -> Result<ConstExpr> {
        self.binary(0)
    }

    fn binary(&mut self, level: usize) -> Result<ConstExpr> {
        let Some(ops) = LEVELS.get(level) else {
            return self.unary();
        };
        let mut lhs = self.binary(level + 1)?;
        while let Some(op) = ops
            .iter()
            .find(|(punct, _)| self.at(punct))
            .map(|(_, op)| *op)
        {
            self.pos += 1;
            let rhs = self.binary(level + 1)?;
            let span = lhs.span.merge(rhs.span);
            lhs = ConstExpr::new(ConstExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), span);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<ConstExpr> {
        let op = if let Some(span) = self.eat("-") {
            Some((UnaryOp::Neg, span))
        } else {
            self.eat("!").map(|span| (UnaryOp::Not, span))
        };
        if let Some((op, start)) = op {
            let operand = self.unary()?;
            let span = start.merge(operand.span);
            return Ok(ConstExpr::new(ConstExprKind::Unary(op, Box::new(operand)), span));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<ConstExpr> {
        let Some(Lexed { token, span }) = self.peek() else {
            return Err(syntax_error("expected an expression", self.end));
        };
        let kind = match token {
            Token::Int(value) => ConstExprKind::Int(value),
            Token::Ident("true") => ConstExprKind::Bool(true),
            Token::Ident("false") => ConstExprKind::Bool(false),
            Token::Ident(name) => match PrimitiveType::from_name(name) {
                Some(prim) => ConstExprKind::Type(Ty::Primitive(prim)),
                None => ConstExprKind::Param(Identifier::intern(self.interner, name, span)),
            },
            Token::Punct("(") => {
                self.pos += 1;
                let inner = self.expr()?;
                let close = self.expect(")")?;
                return Ok(ConstExpr::new(inner.kind, span.merge(close)));
            }
            Token::Punct(_) => return Err(syntax_error("expected an expression", span)),
        };
        self.pos += 1;
        Ok(ConstExpr::new(kind, span))
    }
}

/// Parse a type reference written at byte `base` of the manifest.
pub fn parse_type(text: &str, base: usize, interner: &mut Interner) -> Result<TypeRef> {
    let mut parser = Parser::new(text, base, interner)?;
    let ty = parser.ty()?;
    parser.finish()?;
    Ok(ty)
}

/// Parse a called function or read global, like `geo::area` or
/// `identity<i32>`.
pub fn parse_value_ref(text: &str, base: usize, interner: &mut Interner) -> Result<ValueRef> {
    let mut parser = Parser::new(text, base, interner)?;
    let (segments, args, span) = parser.path()?;
    parser.finish()?;
    Ok(ValueRef {
        segments,
        args,
        span,
    })
}

pub fn parse_const_expr(text: &str, base: usize, interner: &mut Interner) -> Result<ConstExpr> {
    let mut parser = Parser::new(text, base, interner)?;
    let expr = parser.expr()?;
    parser.finish()?;
    Ok(expr)
}
