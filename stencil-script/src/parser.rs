//! Indentation-aware recursive-descent parser for the stencil script.
//!
//! Parsing happens in two phases: comment-stripped logical lines with
//! measured indentation, then statement parsing with an indent stack. Block
//! headers (`for`/`if`/`elif`/`else`/`while`, ending in `:`) take the
//! following deeper-indented run of lines as their suite; a dedent closes
//! the suite.

use logos::Logos;

use crate::ast::{BinOp, Expr, FsPart, Stmt, Target, UnaryOp};
use crate::error::ScriptError;
use crate::token::Tok;

/// Parse a whole program.
pub fn parse_program(source: &str) -> Result<Vec<Stmt>, ScriptError> {
    let lines = logical_lines(source)?;
    let mut parser = Parser { lines, pos: 0 };
    parser.parse_block(0)
}

fn parse_err(line: usize, message: impl Into<String>) -> ScriptError {
    ScriptError::Parse {
        line,
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Logical lines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Line {
    indent: usize,
    content: String,
    number: usize,
}

fn logical_lines(source: &str) -> Result<Vec<Line>, ScriptError> {
    let mut lines = Vec::new();
    for (idx, raw) in source.lines().enumerate() {
        let number = idx + 1;
        let stripped = strip_comment(raw).trim_end();
        if stripped.trim_start().is_empty() {
            continue;
        }
        let mut indent = 0usize;
        for ch in stripped.chars() {
            match ch {
                ' ' => indent += 1,
                '\t' => {
                    return Err(parse_err(
                        number,
                        "tab characters are not allowed in indentation",
                    ))
                }
                _ => break,
            }
        }
        lines.push(Line {
            indent,
            content: stripped[indent..].to_owned(),
            number,
        });
    }
    Ok(lines)
}

/// Cut the line at the first `#` outside a string literal.
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match quote {
            Some(q) => match ch {
                '\\' => escaped = true,
                c if c == q => quote = None,
                _ => {}
            },
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                '#' => return &line[..i],
                _ => {}
            },
        }
    }
    line
}

// ---------------------------------------------------------------------------
// Statement parsing
// ---------------------------------------------------------------------------

struct Parser {
    lines: Vec<Line>,
    pos: usize,
}

impl Parser {
    fn parse_block(&mut self, indent: usize) -> Result<Vec<Stmt>, ScriptError> {
        let mut stmts = Vec::new();
        while let Some(line) = self.lines.get(self.pos) {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                return Err(parse_err(line.number, "unexpected indent"));
            }
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ScriptError> {
        let line = self.lines[self.pos].clone();
        self.pos += 1;
        let mut cur = Cursor::tokenize(&line.content, line.number)?;
        match cur.peek() {
            Some(Tok::For) => {
                cur.advance();
                let var = cur.expect_ident("loop variable")?;
                cur.expect(&Tok::In)?;
                let iter = cur.parse_expr()?;
                cur.expect(&Tok::Colon)?;
                cur.finish()?;
                let body = self.parse_suite(line.indent, line.number)?;
                Ok(Stmt::For {
                    var,
                    iter,
                    body,
                    line: line.number,
                })
            }
            Some(Tok::While) => {
                cur.advance();
                let cond = cur.parse_expr()?;
                cur.expect(&Tok::Colon)?;
                cur.finish()?;
                let body = self.parse_suite(line.indent, line.number)?;
                Ok(Stmt::While {
                    cond,
                    body,
                    line: line.number,
                })
            }
            Some(Tok::If) => {
                cur.advance();
                let cond = cur.parse_expr()?;
                cur.expect(&Tok::Colon)?;
                cur.finish()?;
                let body = self.parse_suite(line.indent, line.number)?;
                let mut arms = vec![(cond, body)];
                let mut else_body = None;
                loop {
                    match self.peek_chain_keyword(line.indent) {
                        Some("elif") => {
                            let chain = self.lines[self.pos].clone();
                            self.pos += 1;
                            let mut cur = Cursor::tokenize(&chain.content, chain.number)?;
                            cur.expect(&Tok::Elif)?;
                            let cond = cur.parse_expr()?;
                            cur.expect(&Tok::Colon)?;
                            cur.finish()?;
                            let body = self.parse_suite(chain.indent, chain.number)?;
                            arms.push((cond, body));
                        }
                        Some("else") => {
                            let chain = self.lines[self.pos].clone();
                            self.pos += 1;
                            let mut cur = Cursor::tokenize(&chain.content, chain.number)?;
                            cur.expect(&Tok::Else)?;
                            cur.expect(&Tok::Colon)?;
                            cur.finish()?;
                            else_body = Some(self.parse_suite(chain.indent, chain.number)?);
                            break;
                        }
                        _ => break,
                    }
                }
                Ok(Stmt::If {
                    arms,
                    else_body,
                    line: line.number,
                })
            }
            Some(Tok::Elif) => Err(parse_err(line.number, "'elif' without a matching 'if'")),
            Some(Tok::Else) => Err(parse_err(line.number, "'else' without a matching 'if'")),
            _ => {
                let expr = cur.parse_expr()?;
                if cur.eat(&Tok::Assign) {
                    let target = expr_to_target(expr, line.number)?;
                    let value = cur.parse_expr()?;
                    cur.finish()?;
                    Ok(Stmt::Assign {
                        target,
                        value,
                        line: line.number,
                    })
                } else {
                    cur.finish()?;
                    Ok(Stmt::Expr {
                        expr,
                        line: line.number,
                    })
                }
            }
        }
    }

    fn parse_suite(&mut self, header_indent: usize, header_line: usize) -> Result<Vec<Stmt>, ScriptError> {
        match self.lines.get(self.pos) {
            Some(line) if line.indent > header_indent => {
                let indent = line.indent;
                self.parse_block(indent)
            }
            _ => Err(parse_err(header_line, "expected an indented block")),
        }
    }

    /// Does the next line continue an `if` chain at this indentation?
    fn peek_chain_keyword(&self, indent: usize) -> Option<&'static str> {
        let line = self.lines.get(self.pos)?;
        if line.indent != indent {
            return None;
        }
        for kw in ["elif", "else"] {
            if let Some(rest) = line.content.strip_prefix(kw) {
                let next = rest.chars().next();
                if !next.is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Some(kw);
                }
            }
        }
        None
    }
}

fn expr_to_target(expr: Expr, line: usize) -> Result<Target, ScriptError> {
    match expr {
        Expr::Name(name) => Ok(Target::Name(name)),
        Expr::Attr { base, attr } => Ok(Target::Attr {
            base: Box::new(expr_to_target(*base, line)?),
            attr,
        }),
        Expr::Index { base, index } => Ok(Target::Index {
            base: Box::new(expr_to_target(*base, line)?),
            index: *index,
        }),
        _ => Err(parse_err(line, "cannot assign to this expression")),
    }
}

// ---------------------------------------------------------------------------
// Expression parsing
// ---------------------------------------------------------------------------

struct Cursor {
    toks: Vec<Tok>,
    pos: usize,
    line: usize,
}

impl Cursor {
    fn tokenize(content: &str, line: usize) -> Result<Self, ScriptError> {
        let mut toks = Vec::new();
        for (result, span) in Tok::lexer(content).spanned() {
            match result {
                Ok(t) => toks.push(t),
                Err(()) => {
                    return Err(parse_err(
                        line,
                        format!("unrecognized token near '{}'", &content[span]),
                    ))
                }
            }
        }
        Ok(Cursor { toks, pos: 0, line })
    }

    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn advance(&mut self) -> Option<Tok> {
        let tok = self.toks.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: &Tok) -> Result<(), ScriptError> {
        if self.eat(tok) {
            Ok(())
        } else {
            Err(parse_err(
                self.line,
                match self.peek() {
                    Some(found) => format!("expected {}, found {}", tok.describe(), found.describe()),
                    None => format!("expected {} at end of line", tok.describe()),
                },
            ))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, ScriptError> {
        match self.advance() {
            Some(Tok::Ident(name)) => Ok(name),
            Some(found) => Err(parse_err(
                self.line,
                format!("expected {what}, found {}", found.describe()),
            )),
            None => Err(parse_err(self.line, format!("expected {what} at end of line"))),
        }
    }

    fn finish(&mut self) -> Result<(), ScriptError> {
        match self.peek() {
            None => Ok(()),
            Some(tok) => Err(parse_err(
                self.line,
                format!("unexpected {} after statement", tok.describe()),
            )),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ScriptError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Tok::Or) {
            let rhs = self.parse_and()?;
            lhs = binary(BinOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.parse_not()?;
        while self.eat(&Tok::And) {
            let rhs = self.parse_not()?;
            lhs = binary(BinOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr, ScriptError> {
        if self.eat(&Tok::Not) {
            let operand = self.parse_not()?;
            Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            })
        } else {
            self.parse_cmp()
        }
    }

    fn parse_cmp(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.parse_add()?;
        loop {
            let op = match self.peek() {
                Some(Tok::EqEq) => BinOp::Eq,
                Some(Tok::Ne) => BinOp::Ne,
                Some(Tok::Lt) => BinOp::Lt,
                Some(Tok::Le) => BinOp::Le,
                Some(Tok::Gt) => BinOp::Gt,
                Some(Tok::Ge) => BinOp::Ge,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_add()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_add(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Plus) => BinOp::Add,
                Some(Tok::Minus) => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_mul()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Star) => BinOp::Mul,
                Some(Tok::Slash) => BinOp::Div,
                Some(Tok::SlashSlash) => BinOp::FloorDiv,
                Some(Tok::Percent) => BinOp::Rem,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ScriptError> {
        if self.eat(&Tok::Minus) {
            let operand = self.parse_unary()?;
            Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            })
        } else {
            self.parse_postfix()
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, ScriptError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat(&Tok::Dot) {
                let attr = self.expect_ident("attribute name")?;
                expr = Expr::Attr {
                    base: Box::new(expr),
                    attr,
                };
            } else if self.eat(&Tok::LBracket) {
                let index = self.parse_expr()?;
                self.expect(&Tok::RBracket)?;
                expr = Expr::Index {
                    base: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.peek() == Some(&Tok::LParen) {
                let Expr::Name(func) = expr else {
                    return Err(parse_err(self.line, "only named functions can be called"));
                };
                self.advance();
                let args = self.parse_args()?;
                expr = Expr::Call { func, args };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ScriptError> {
        let mut args = Vec::new();
        if self.eat(&Tok::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if self.eat(&Tok::Comma) {
                continue;
            }
            self.expect(&Tok::RParen)?;
            return Ok(args);
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ScriptError> {
        match self.advance() {
            Some(Tok::None) => Ok(Expr::None),
            Some(Tok::True) => Ok(Expr::Bool(true)),
            Some(Tok::False) => Ok(Expr::Bool(false)),
            Some(Tok::Int(i)) => Ok(Expr::Int(i)),
            Some(Tok::Float(f)) => Ok(Expr::Float(f)),
            Some(Tok::Str(s)) => Ok(Expr::Str(s)),
            Some(Tok::FStr(raw)) => parse_fstring(&raw, self.line),
            Some(Tok::Ident(name)) => Ok(Expr::Name(name)),
            Some(Tok::LParen) => {
                let expr = self.parse_expr()?;
                self.expect(&Tok::RParen)?;
                Ok(expr)
            }
            Some(Tok::LBracket) => {
                let mut items = Vec::new();
                if self.eat(&Tok::RBracket) {
                    return Ok(Expr::List(items));
                }
                loop {
                    items.push(self.parse_expr()?);
                    if self.eat(&Tok::Comma) {
                        continue;
                    }
                    self.expect(&Tok::RBracket)?;
                    return Ok(Expr::List(items));
                }
            }
            Some(Tok::LBrace) => {
                let mut entries = Vec::new();
                if self.eat(&Tok::RBrace) {
                    return Ok(Expr::Map(entries));
                }
                loop {
                    let key = self.parse_expr()?;
                    self.expect(&Tok::Colon)?;
                    let value = self.parse_expr()?;
                    entries.push((key, value));
                    if self.eat(&Tok::Comma) {
                        continue;
                    }
                    self.expect(&Tok::RBrace)?;
                    return Ok(Expr::Map(entries));
                }
            }
            Some(found) => Err(parse_err(
                self.line,
                format!("expected an expression, found {}", found.describe()),
            )),
            None => Err(parse_err(self.line, "expected an expression at end of line")),
        }
    }
}

fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

// ---------------------------------------------------------------------------
// Formatted strings
// ---------------------------------------------------------------------------

/// Split the raw inner text of an `f'…'` literal into parts. `{{`/`}}` are
/// literal braces; `{expr}` slots are sub-parsed; backslash escapes apply
/// to literal text only.
fn parse_fstring(raw: &str, line: usize) -> Result<Expr, ScriptError> {
    let mut parts = Vec::new();
    let mut lit = String::new();
    let mut rest = raw;
    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix("{{") {
            lit.push('{');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("}}") {
            lit.push('}');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix('{') {
            let close = tail
                .find('}')
                .ok_or_else(|| parse_err(line, "unterminated '{' in formatted string"))?;
            if !lit.is_empty() {
                parts.push(FsPart::Lit(std::mem::take(&mut lit)));
            }
            parts.push(FsPart::Expr(parse_slot(&tail[..close], line)?));
            rest = &tail[close + 1..];
        } else if rest.starts_with('}') {
            return Err(parse_err(line, "single '}' in formatted string"));
        } else if rest.starts_with('\\') {
            let mut chars = rest[1..].chars();
            match chars.next() {
                Some(esc @ ('n' | 't' | '\'' | '"' | '\\')) => {
                    lit.push(match esc {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                    rest = &rest[1 + esc.len_utf8()..];
                }
                // Unknown escape: keep the backslash, reconsider the rest.
                _ => {
                    lit.push('\\');
                    rest = &rest[1..];
                }
            }
        } else {
            let ch = rest.chars().next().expect("non-empty");
            lit.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
    }
    if !lit.is_empty() {
        parts.push(FsPart::Lit(lit));
    }
    Ok(Expr::FStr(parts))
}

/// Parse one `{…}` slot as a standalone expression.
fn parse_slot(src: &str, line: usize) -> Result<Expr, ScriptError> {
    let mut cur = Cursor::tokenize(src, line)?;
    let expr = cur.parse_expr()?;
    match cur.peek() {
        None => Ok(expr),
        Some(tok) => Err(parse_err(
            line,
            format!("unexpected {} in expression slot", tok.describe()),
        )),
    }
}
