//! `mini`: a small brace-delimited statement language used as the crate's
//! default [`Parser`]/[`Unparser`] implementation.
//!
//! Grammar (informal):
//!
//! ```text
//! stmt   := assign | if | while | return | expr_stmt
//! assign := IDENT '=' expr
//! if     := 'if' expr '{' stmt* '}'
//! while  := 'while' expr '{' stmt* '}'
//! return := 'return' expr
//! expr_stmt := expr
//! expr   := bool_expr
//! bool_expr := cmp_expr (('and'|'or') cmp_expr)*
//! cmp_expr  := add_expr (('=='|'!='|'<'|'>'|'<='|'>=') add_expr)?
//! add_expr  := mul_expr (('+'|'-') mul_expr)*
//! mul_expr  := unary (('*'|'/') unary)*
//! unary     := ('-'|'not') unary | primary
//! primary   := NUMBER | IDENT ('(' args ')')? | '(' expr ')'
//! ```
//!
//! Statements are newline-terminated; blank lines are ignored.

use std::path::Path;

use super::{AstNode, NodeKind, Parser, Unparser};

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Number(String),
    Op(&'static str),
    Newline,
}

struct Lexer<'a> {
    chars: std::str::CharIndices<'a>,
    src: &'a str,
    line: u32,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Lexer { chars: src.char_indices(), src, line: 1 }
    }

    fn tokenize(mut self) -> Result<Vec<(Tok, u32)>, String> {
        let mut toks = Vec::new();
        let bytes = self.src.as_bytes();
        let mut i = 0usize;
        while i < bytes.len() {
            let c = bytes[i] as char;
            match c {
                ' ' | '\t' | '\r' => i += 1,
                '\n' => {
                    toks.push((Tok::Newline, self.line));
                    self.line += 1;
                    i += 1;
                }
                '#' => {
                    while i < bytes.len() && bytes[i] != b'\n' {
                        i += 1;
                    }
                }
                '0'..='9' => {
                    let start = i;
                    while i < bytes.len() && (bytes[i] as char).is_ascii_digit() {
                        i += 1;
                    }
                    toks.push((Tok::Number(self.src[start..i].to_string()), self.line));
                }
                c if c.is_alphabetic() || c == '_' => {
                    let start = i;
                    while i < bytes.len() && {
                        let ch = bytes[i] as char;
                        ch.is_alphanumeric() || ch == '_'
                    } {
                        i += 1;
                    }
                    toks.push((Tok::Ident(self.src[start..i].to_string()), self.line));
                }
                '=' if bytes.get(i + 1) == Some(&b'=') => {
                    toks.push((Tok::Op("=="), self.line));
                    i += 2;
                }
                '!' if bytes.get(i + 1) == Some(&b'=') => {
                    toks.push((Tok::Op("!="), self.line));
                    i += 2;
                }
                '<' if bytes.get(i + 1) == Some(&b'=') => {
                    toks.push((Tok::Op("<="), self.line));
                    i += 2;
                }
                '>' if bytes.get(i + 1) == Some(&b'=') => {
                    toks.push((Tok::Op(">="), self.line));
                    i += 2;
                }
                '=' | '<' | '>' | '+' | '-' | '*' | '/' | '(' | ')' | '{' | '}' | ',' => {
                    let op: &'static str = match c {
                        '=' => "=",
                        '<' => "<",
                        '>' => ">",
                        '+' => "+",
                        '-' => "-",
                        '*' => "*",
                        '/' => "/",
                        '(' => "(",
                        ')' => ")",
                        '{' => "{",
                        '}' => "}",
                        ',' => ",",
                        _ => unreachable!(),
                    };
                    toks.push((Tok::Op(op), self.line));
                    i += 1;
                }
                other => return Err(format!("unexpected character {other:?} on line {}", self.line)),
            }
        }
        toks.push((Tok::Newline, self.line));
        Ok(toks)
    }
}

struct ParserState {
    toks: Vec<(Tok, u32)>,
    pos: usize,
}

impl ParserState {
    fn peek(&self) -> &Tok {
        &self.toks[self.pos].0
    }

    fn line(&self) -> u32 {
        self.toks[self.pos].1
    }

    fn advance(&mut self) -> Tok {
        let t = self.toks[self.pos].0.clone();
        if self.pos + 1 < self.toks.len() {
            self.pos += 1;
        }
        t
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), Tok::Newline) {
            self.advance();
        }
    }

    fn expect_op(&mut self, op: &str) -> Result<(), String> {
        match self.peek() {
            Tok::Op(o) if *o == op => {
                self.advance();
                Ok(())
            }
            other => Err(format!("expected {op:?}, found {other:?} on line {}", self.line())),
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.toks.len() - 1 && matches!(self.peek(), Tok::Newline)
    }

    fn parse_block_stmts(&mut self, terminator: Option<&str>) -> Result<Vec<AstNode>, String> {
        let mut stmts = Vec::new();
        loop {
            self.skip_newlines();
            if let Some(term) = terminator {
                if matches!(self.peek(), Tok::Op(o) if *o == term) {
                    self.advance();
                    break;
                }
            }
            if terminator.is_none() && self.at_end() {
                break;
            }
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<AstNode, String> {
        let line = self.line();
        if let Tok::Ident(kw) = self.peek().clone() {
            match kw.as_str() {
                "if" => {
                    self.advance();
                    let cond = self.parse_expr()?;
                    self.expect_op("{")?;
                    let body = self.parse_block_stmts(Some("}"))?;
                    let mut children = vec![cond];
                    children.extend(body);
                    return Ok(AstNode::new(NodeKind::If, line, children));
                }
                "while" => {
                    self.advance();
                    let cond = self.parse_expr()?;
                    self.expect_op("{")?;
                    let body = self.parse_block_stmts(Some("}"))?;
                    let mut children = vec![cond];
                    children.extend(body);
                    return Ok(AstNode::new(NodeKind::While, line, children));
                }
                "return" => {
                    self.advance();
                    let value = self.parse_expr()?;
                    self.consume_stmt_end();
                    return Ok(AstNode::new(NodeKind::Return, line, vec![value]));
                }
                _ => {}
            }
        }
        // assignment lookahead: IDENT '=' (but not '==')
        if let Tok::Ident(name) = self.peek().clone() {
            if matches!(self.toks.get(self.pos + 1), Some((Tok::Op("="), _))) {
                self.advance();
                self.advance();
                let value = self.parse_expr()?;
                self.consume_stmt_end();
                return Ok(AstNode::new(NodeKind::Assign { target: name }, line, vec![value]));
            }
        }
        let expr = self.parse_expr()?;
        self.consume_stmt_end();
        Ok(AstNode::new(NodeKind::ExprStmt, line, vec![expr]))
    }

    fn consume_stmt_end(&mut self) {
        while matches!(self.peek(), Tok::Newline) {
            self.advance();
        }
    }

    fn parse_expr(&mut self) -> Result<AstNode, String> {
        self.parse_bool()
    }

    fn parse_bool(&mut self) -> Result<AstNode, String> {
        let mut lhs = self.parse_cmp()?;
        loop {
            let op = match self.peek() {
                Tok::Ident(i) if i == "and" || i == "or" => i.clone(),
                _ => break,
            };
            let line = self.line();
            self.advance();
            let rhs = self.parse_cmp()?;
            lhs = AstNode::new(NodeKind::BoolExpr { op }, line, vec![lhs, rhs]);
        }
        Ok(lhs)
    }

    fn parse_cmp(&mut self) -> Result<AstNode, String> {
        let lhs = self.parse_add()?;
        let op = match self.peek() {
            Tok::Op(o @ ("==" | "!=" | "<" | ">" | "<=" | ">=")) => o.to_string(),
            _ => return Ok(lhs),
        };
        let line = self.line();
        self.advance();
        let rhs = self.parse_add()?;
        Ok(AstNode::new(NodeKind::CompareExpr { op }, line, vec![lhs, rhs]))
    }

    fn parse_add(&mut self) -> Result<AstNode, String> {
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Tok::Op(o @ ("+" | "-")) => o.to_string(),
                _ => break,
            };
            let line = self.line();
            self.advance();
            let rhs = self.parse_mul()?;
            lhs = AstNode::new(NodeKind::BinaryExpr { op }, line, vec![lhs, rhs]);
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> Result<AstNode, String> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Tok::Op(o @ ("*" | "/")) => o.to_string(),
                _ => break,
            };
            let line = self.line();
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = AstNode::new(NodeKind::BinaryExpr { op }, line, vec![lhs, rhs]);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<AstNode, String> {
        let line = self.line();
        match self.peek() {
            Tok::Op("-") => {
                self.advance();
                let inner = self.parse_unary()?;
                Ok(AstNode::new(NodeKind::UnaryExpr { op: "-".into() }, line, vec![inner]))
            }
            Tok::Ident(i) if i == "not" => {
                self.advance();
                let inner = self.parse_unary()?;
                Ok(AstNode::new(NodeKind::UnaryExpr { op: "not".into() }, line, vec![inner]))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<AstNode, String> {
        let line = self.line();
        match self.peek().clone() {
            Tok::Number(n) => {
                self.advance();
                Ok(AstNode::new(NodeKind::Literal(n), line, vec![]))
            }
            Tok::Ident(name) => {
                self.advance();
                if matches!(self.peek(), Tok::Op("(")) {
                    self.advance();
                    let mut args = Vec::new();
                    if !matches!(self.peek(), Tok::Op(")")) {
                        args.push(self.parse_expr()?);
                        while matches!(self.peek(), Tok::Op(",")) {
                            self.advance();
                            args.push(self.parse_expr()?);
                        }
                    }
                    self.expect_op(")")?;
                    Ok(AstNode::new(NodeKind::Call { callee: name }, line, args))
                } else {
                    Ok(AstNode::new(NodeKind::Name(name), line, vec![]))
                }
            }
            Tok::Op("(") => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect_op(")")?;
                Ok(inner)
            }
            other => Err(format!("unexpected token {other:?} on line {line}")),
        }
    }
}

/// Parser/unparser for the `mini` language. Files are recognized by the
/// `.mini` extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct MiniParser;

impl Parser for MiniParser {
    fn recognizes(&self, path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some("mini")
    }

    fn parse(&self, source: &str) -> Result<AstNode, String> {
        let toks = Lexer::new(source).tokenize()?;
        let mut state = ParserState { toks, pos: 0 };
        let stmts = state.parse_block_stmts(None)?;
        Ok(AstNode::new(NodeKind::Block, 1, stmts))
    }
}

impl Unparser for MiniParser {
    fn unparse(&self, node: &AstNode) -> String {
        render(node)
    }
}

fn render(node: &AstNode) -> String {
    match node.kind() {
        NodeKind::Block => node
            .children()
            .iter()
            .map(render)
            .collect::<Vec<_>>()
            .join("\n"),
        NodeKind::Assign { target } => format!("{} = {}", target, render(&node.children()[0])),
        NodeKind::If => {
            let cond = render(&node.children()[0]);
            let body = node.children()[1..]
                .iter()
                .map(render)
                .collect::<Vec<_>>()
                .join("\n    ");
            format!("if {cond} {{\n    {body}\n}}")
        }
        NodeKind::While => {
            let cond = render(&node.children()[0]);
            let body = node.children()[1..]
                .iter()
                .map(render)
                .collect::<Vec<_>>()
                .join("\n    ");
            format!("while {cond} {{\n    {body}\n}}")
        }
        NodeKind::Return => format!("return {}", render(&node.children()[0])),
        NodeKind::ExprStmt => render(&node.children()[0]),
        NodeKind::Call { callee } => {
            let args = node.children().iter().map(render).collect::<Vec<_>>().join(", ");
            format!("{callee}({args})")
        }
        NodeKind::BinaryExpr { op } => {
            format!("({} {} {})", render(&node.children()[0]), op, render(&node.children()[1]))
        }
        NodeKind::UnaryExpr { op } => {
            if op == "not" {
                format!("(not {})", render(&node.children()[0]))
            } else {
                format!("(-{})", render(&node.children()[0]))
            }
        }
        NodeKind::CompareExpr { op } => {
            format!("({} {} {})", render(&node.children()[0]), op, render(&node.children()[1]))
        }
        NodeKind::BoolExpr { op } => {
            format!("({} {} {})", render(&node.children()[0]), op, render(&node.children()[1]))
        }
        NodeKind::Name(n) => n.clone(),
        NodeKind::Literal(n) => n.clone(),
        NodeKind::Seq => node.children().iter().map(render).collect::<Vec<_>>().join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_assignment_if_and_return() {
        let src = "x = 1\nif x > 0 {\n    y = 2\n}\nreturn x\n";
        let parser = MiniParser;
        let tree = parser.parse(src).unwrap();
        assert_eq!(tree.children().len(), 3);
        assert!(matches!(tree.children()[0].kind(), NodeKind::Assign { .. }));
        assert!(matches!(tree.children()[1].kind(), NodeKind::If));
        assert!(matches!(tree.children()[2].kind(), NodeKind::Return));
    }

    #[test]
    fn unparse_round_trips_structurally() {
        let src = "x = 1\nreturn x\n";
        let parser = MiniParser;
        let tree = parser.parse(src).unwrap();
        let rendered = parser.unparse(&tree);
        let reparsed = parser.parse(&rendered).unwrap();
        assert_eq!(format!("{:?}", tree.children()), format!("{:?}", reparsed.children()));
    }
}
