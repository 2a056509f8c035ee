use crate::ast::{BlockStmt, Expr, InfixOp, PrefixOp, Program, Stmt};
use crate::lexer::Lexer;
use crate::token::Token;

/// Binding power of infix positions, ascending.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

fn precedence_of(token: &Token) -> Precedence {
    match token {
        Token::Eq | Token::NotEq => Precedence::Equals,
        Token::Lt | Token::Gt | Token::Le | Token::Ge => Precedence::LessGreater,
        Token::Plus | Token::Minus => Precedence::Sum,
        Token::Slash | Token::Asterisk => Precedence::Product,
        Token::Lparen => Precedence::Call,
        Token::Lbracket => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

/// Pratt parser over a two-token window.
///
/// Parsing is best-effort: a failed expectation records a message on the
/// error list and abandons the statement at hand, but the top-level loop
/// keeps going, so a `Program` with errors may contain fewer statements
/// than the input implied.  Callers must check [`Parser::errors`] before
/// trusting the tree.
#[derive(Debug)]
pub struct Parser {
    lexer: Lexer,
    cur_token: Token,
    peek_token: Token,
    errors: Vec<String>,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Parser {
        let mut parser = Parser {
            lexer,
            cur_token: Token::Eof,
            peek_token: Token::Eof,
            errors: vec![],
        };
        // Prime both tokens in hand.
        parser.next_token();
        parser.next_token();
        parser
    }

    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::default();
        while self.cur_token != Token::Eof {
            if let Some(stmt) = self.parse_statement() {
                program.statements.push(stmt);
            }
            self.next_token();
        }
        program
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    fn next_token(&mut self) {
        self.cur_token = std::mem::replace(&mut self.peek_token, self.lexer.next_token());
    }

    fn peek_token_is(&self, token: &Token) -> bool {
        self.peek_token == *token
    }

    fn expect_peek(&mut self, token: Token) -> bool {
        if self.peek_token_is(&token) {
            self.next_token();
            true
        } else {
            self.peek_error(token.kind());
            false
        }
    }

    fn peek_error(&mut self, expected: &str) {
        self.errors.push(format!(
            "expected next token to be {}, got {} instead",
            expected,
            self.peek_token.kind()
        ));
    }

    fn peek_precedence(&self) -> Precedence {
        precedence_of(&self.peek_token)
    }

    fn cur_precedence(&self) -> Precedence {
        precedence_of(&self.cur_token)
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.cur_token {
            Token::Let => self.parse_let_statement(),
            Token::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Option<Stmt> {
        let name = match &self.peek_token {
            Token::Ident(name) => name.clone(),
            _ => {
                self.peek_error("IDENT");
                return None;
            }
        };
        self.next_token();

        if !self.expect_peek(Token::Assign) {
            return None;
        }
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_to_semicolon();
        Some(Stmt::Let { name, value })
    }

    fn parse_return_statement(&mut self) -> Option<Stmt> {
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_to_semicolon();
        Some(Stmt::Return(value))
    }

    /// Advance until the statement-terminating `;`.  Guarded by end of
    /// input so an unterminated final statement cannot loop forever.
    fn skip_to_semicolon(&mut self) {
        while self.cur_token != Token::Semicolon && self.cur_token != Token::Eof {
            self.next_token();
        }
    }

    fn parse_expression_statement(&mut self) -> Option<Stmt> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        if self.peek_token_is(&Token::Semicolon) {
            self.next_token();
        }
        Some(Stmt::Expression(expr))
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expr> {
        let mut left = self.parse_prefix()?;

        while !self.peek_token_is(&Token::Semicolon) && precedence < self.peek_precedence() {
            left = match self.peek_token {
                Token::Plus
                | Token::Minus
                | Token::Slash
                | Token::Asterisk
                | Token::Eq
                | Token::NotEq
                | Token::Lt
                | Token::Gt
                | Token::Le
                | Token::Ge => {
                    self.next_token();
                    self.parse_infix_expression(left)?
                }
                Token::Lparen => {
                    self.next_token();
                    self.parse_call_expression(left)?
                }
                Token::Lbracket => {
                    self.next_token();
                    self.parse_index_expression(left)?
                }
                _ => return Some(left),
            };
        }
        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expr> {
        // TODO: can we avoid cloning tokens?
        match self.cur_token.clone() {
            Token::Ident(name) => Some(Expr::Ident(name)),
            Token::Int(literal) => self.parse_integer_literal(&literal),
            Token::Str(text) => Some(Expr::Str(text)),
            Token::True => Some(Expr::Bool(true)),
            Token::False => Some(Expr::Bool(false)),
            Token::Bang => self.parse_prefix_expression(PrefixOp::Bang),
            Token::Minus => self.parse_prefix_expression(PrefixOp::Minus),
            Token::Lparen => self.parse_grouped_expression(),
            Token::If => self.parse_if_expression(),
            Token::Function => self.parse_function_literal(),
            Token::Lbracket => self.parse_array_literal(),
            Token::Lbrace => self.parse_hash_literal(),
            token => {
                self.errors.push(format!(
                    "no prefix parse function for {} found",
                    token.kind()
                ));
                None
            }
        }
    }

    fn parse_integer_literal(&mut self, literal: &str) -> Option<Expr> {
        match literal.parse::<i64>() {
            Ok(value) => Some(Expr::Int(value)),
            Err(_) => {
                self.errors
                    .push(format!("could not parse {:?} as integer", literal));
                None
            }
        }
    }

    fn parse_prefix_expression(&mut self, op: PrefixOp) -> Option<Expr> {
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expr::Prefix {
            op,
            right: Box::new(right),
        })
    }

    fn parse_infix_expression(&mut self, left: Expr) -> Option<Expr> {
        let op = match self.cur_token {
            Token::Plus => InfixOp::Plus,
            Token::Minus => InfixOp::Minus,
            Token::Asterisk => InfixOp::Asterisk,
            Token::Slash => InfixOp::Slash,
            Token::Lt => InfixOp::Lt,
            Token::Gt => InfixOp::Gt,
            Token::Le => InfixOp::Le,
            Token::Ge => InfixOp::Ge,
            Token::Eq => InfixOp::Eq,
            Token::NotEq => InfixOp::NotEq,
            _ => unreachable!("caller dispatched on an infix operator"),
        };
        let precedence = self.cur_precedence();
        self.next_token();
        let right = self.parse_expression(precedence)?;
        Some(Expr::Infix {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expr> {
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(Token::Rparen) {
            return None;
        }
        Some(expr)
    }

    fn parse_if_expression(&mut self) -> Option<Expr> {
        if !self.expect_peek(Token::Lparen) {
            return None;
        }
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(Token::Rparen) {
            return None;
        }
        if !self.expect_peek(Token::Lbrace) {
            return None;
        }
        let consequence = self.parse_block_statement();

        let alternative = if self.peek_token_is(&Token::Else) {
            self.next_token();
            if !self.expect_peek(Token::Lbrace) {
                return None;
            }
            Some(self.parse_block_statement())
        } else {
            None
        };

        Some(Expr::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_block_statement(&mut self) -> BlockStmt {
        let mut statements = vec![];
        self.next_token();
        while self.cur_token != Token::Rbrace && self.cur_token != Token::Eof {
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            self.next_token();
        }
        BlockStmt { statements }
    }

    fn parse_function_literal(&mut self) -> Option<Expr> {
        if !self.expect_peek(Token::Lparen) {
            return None;
        }
        let params = self.parse_function_parameters()?;
        if !self.expect_peek(Token::Lbrace) {
            return None;
        }
        let body = self.parse_block_statement();
        Some(Expr::Function { params, body })
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<String>> {
        let mut params = vec![];
        if self.peek_token_is(&Token::Rparen) {
            self.next_token();
            return Some(params);
        }
        self.next_token();
        params.push(self.parse_identifier_name()?);
        while self.peek_token_is(&Token::Comma) {
            self.next_token();
            self.next_token();
            params.push(self.parse_identifier_name()?);
        }
        if !self.expect_peek(Token::Rparen) {
            return None;
        }
        Some(params)
    }

    fn parse_identifier_name(&mut self) -> Option<String> {
        match &self.cur_token {
            Token::Ident(name) => Some(name.clone()),
            token => {
                self.errors.push(format!(
                    "expected next token to be IDENT, got {} instead",
                    token.kind()
                ));
                None
            }
        }
    }

    fn parse_call_expression(&mut self, function: Expr) -> Option<Expr> {
        let args = self.parse_expression_list(Token::Rparen)?;
        Some(Expr::Call {
            function: Box::new(function),
            args,
        })
    }

    fn parse_array_literal(&mut self) -> Option<Expr> {
        let elements = self.parse_expression_list(Token::Rbracket)?;
        Some(Expr::Array(elements))
    }

    fn parse_expression_list(&mut self, end: Token) -> Option<Vec<Expr>> {
        let mut list = vec![];
        if self.peek_token_is(&end) {
            self.next_token();
            return Some(list);
        }
        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek_token_is(&Token::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }
        if !self.expect_peek(end) {
            return None;
        }
        Some(list)
    }

    fn parse_index_expression(&mut self, left: Expr) -> Option<Expr> {
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(Token::Rbracket) {
            return None;
        }
        Some(Expr::Index {
            left: Box::new(left),
            index: Box::new(index),
        })
    }

    fn parse_hash_literal(&mut self) -> Option<Expr> {
        let mut pairs = vec![];
        while !self.peek_token_is(&Token::Rbrace) {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;
            if !self.expect_peek(Token::Colon) {
                return None;
            }
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));
            if !self.peek_token_is(&Token::Rbrace) && !self.expect_peek(Token::Comma) {
                return None;
            }
        }
        if !self.expect_peek(Token::Rbrace) {
            return None;
        }
        Some(Expr::Hash(pairs))
    }
}
