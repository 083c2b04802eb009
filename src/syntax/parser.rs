// Expression parser - converts tokens to a source expression tree

use super::ast::*;
use super::lexer::Lexer;
use super::token::Token;
use crate::access::Value;
use anyhow::{bail, Result};

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(text: &str) -> Self {
        let mut lexer = Lexer::new(text);
        let tokens = lexer.tokenize();
        Parser {
            tokens,
            position: 0,
        }
    }

    /// Parse the whole input as exactly one expression
    pub fn parse(&mut self) -> Result<SourceExpr> {
        if self.match_token(&Token::Eof) {
            bail!("Empty expression");
        }
        let expr = self.parse_expression()?;
        if !self.match_token(&Token::Eof) {
            bail!("Unexpected trailing token: {:?}", self.current_token());
        }
        Ok(expr)
    }

    /// Parse expression
    fn parse_expression(&mut self) -> Result<SourceExpr> {
        self.parse_or()
    }

    /// Parse `or` chain
    fn parse_or(&mut self) -> Result<SourceExpr> {
        let first = self.parse_and()?;
        if !self.match_token(&Token::Or) {
            return Ok(first);
        }

        let mut values = vec![first];
        while self.match_token(&Token::Or) {
            self.advance();
            values.push(self.parse_and()?);
        }
        Ok(SourceExpr::BoolOp {
            op: BoolOperator::Or,
            values,
        })
    }

    /// Parse `and` chain
    fn parse_and(&mut self) -> Result<SourceExpr> {
        let first = self.parse_not()?;
        if !self.match_token(&Token::And) {
            return Ok(first);
        }

        let mut values = vec![first];
        while self.match_token(&Token::And) {
            self.advance();
            values.push(self.parse_not()?);
        }
        Ok(SourceExpr::BoolOp {
            op: BoolOperator::And,
            values,
        })
    }

    /// Parse `not` prefix
    fn parse_not(&mut self) -> Result<SourceExpr> {
        if self.match_token(&Token::Not) {
            self.advance();
            let operand = self.parse_not()?;
            Ok(SourceExpr::unary_op(UnaryOperator::Not, operand))
        } else {
            self.parse_comparison()
        }
    }

    /// Parse a (possibly chained) comparison
    fn parse_comparison(&mut self) -> Result<SourceExpr> {
        let left = self.parse_bit_or()?;
        let mut comparisons = vec![];

        while let Some(op) = self.comparison_operator()? {
            let right = self.parse_bit_or()?;
            comparisons.push((op, right));
        }

        if comparisons.is_empty() {
            Ok(left)
        } else {
            Ok(SourceExpr::Compare {
                left: Box::new(left),
                comparisons,
            })
        }
    }

    /// Consume a comparison operator if one is next
    fn comparison_operator(&mut self) -> Result<Option<CompareOperator>> {
        let op = match self.current_token() {
            Token::EqualEqual => CompareOperator::Eq,
            Token::NotEqual => CompareOperator::NotEq,
            Token::Less => CompareOperator::Lt,
            Token::LessEqual => CompareOperator::LtE,
            Token::Greater => CompareOperator::Gt,
            Token::GreaterEqual => CompareOperator::GtE,
            Token::In => CompareOperator::In,
            Token::Not => {
                if self.peek_token() != Token::In {
                    bail!("Expected 'in' after 'not' in comparison");
                }
                self.advance();
                CompareOperator::NotIn
            }
            Token::Is => {
                if self.peek_token() == Token::Not {
                    self.advance();
                    CompareOperator::IsNot
                } else {
                    CompareOperator::Is
                }
            }
            _ => return Ok(None),
        };
        self.advance();
        Ok(Some(op))
    }

    /// Parse `|`
    fn parse_bit_or(&mut self) -> Result<SourceExpr> {
        let mut left = self.parse_bit_xor()?;
        while self.match_token(&Token::Pipe) {
            self.advance();
            let right = self.parse_bit_xor()?;
            left = SourceExpr::binary_op(left, BinaryOperator::BitOr, right);
        }
        Ok(left)
    }

    /// Parse `^`
    fn parse_bit_xor(&mut self) -> Result<SourceExpr> {
        let mut left = self.parse_bit_and()?;
        while self.match_token(&Token::Caret) {
            self.advance();
            let right = self.parse_bit_and()?;
            left = SourceExpr::binary_op(left, BinaryOperator::BitXor, right);
        }
        Ok(left)
    }

    /// Parse `&`
    fn parse_bit_and(&mut self) -> Result<SourceExpr> {
        let mut left = self.parse_shift()?;
        while self.match_token(&Token::Ampersand) {
            self.advance();
            let right = self.parse_shift()?;
            left = SourceExpr::binary_op(left, BinaryOperator::BitAnd, right);
        }
        Ok(left)
    }

    /// Parse `<<` / `>>`
    fn parse_shift(&mut self) -> Result<SourceExpr> {
        let mut left = self.parse_addition()?;

        loop {
            let op = match self.current_token() {
                Token::ShiftLeft => BinaryOperator::LShift,
                Token::ShiftRight => BinaryOperator::RShift,
                _ => break,
            };
            self.advance();

            let right = self.parse_addition()?;
            left = SourceExpr::binary_op(left, op, right);
        }

        Ok(left)
    }

    /// Parse addition/subtraction expression
    fn parse_addition(&mut self) -> Result<SourceExpr> {
        let mut left = self.parse_multiplication()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Sub,
                _ => break,
            };
            self.advance();

            let right = self.parse_multiplication()?;
            left = SourceExpr::binary_op(left, op, right);
        }

        Ok(left)
    }

    /// Parse multiplication/division expression
    fn parse_multiplication(&mut self) -> Result<SourceExpr> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Mul,
                Token::Slash => BinaryOperator::Div,
                Token::DoubleSlash => BinaryOperator::FloorDiv,
                Token::Percent => BinaryOperator::Mod,
                _ => break,
            };
            self.advance();

            let right = self.parse_unary()?;
            left = SourceExpr::binary_op(left, op, right);
        }

        Ok(left)
    }

    /// Parse unary expression
    fn parse_unary(&mut self) -> Result<SourceExpr> {
        let op = match self.current_token() {
            Token::Plus => UnaryOperator::Pos,
            Token::Minus => UnaryOperator::Neg,
            Token::Tilde => UnaryOperator::Invert,
            _ => return self.parse_power(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(SourceExpr::unary_op(op, operand))
    }

    /// Parse `**`, which binds tighter than a unary on its left
    fn parse_power(&mut self) -> Result<SourceExpr> {
        let base = self.parse_postfix()?;
        if self.match_token(&Token::DoubleStar) {
            self.advance();
            let exponent = self.parse_unary()?;
            return Ok(SourceExpr::binary_op(base, BinaryOperator::Pow, exponent));
        }
        Ok(base)
    }

    /// Parse calls, attribute access and subscripts
    fn parse_postfix(&mut self) -> Result<SourceExpr> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.current_token() {
                Token::LeftParen => {
                    self.advance();
                    let (args, keywords) = self.parse_call_arguments()?;
                    expr = SourceExpr::Call {
                        func: Box::new(expr),
                        args,
                        keywords,
                    };
                }
                Token::Dot => {
                    self.advance();
                    let attr = self.expect_identifier()?;
                    expr = SourceExpr::Attribute {
                        value: Box::new(expr),
                        attr,
                    };
                }
                Token::LeftBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect_token(Token::RightBracket)?;
                    expr = SourceExpr::Subscript {
                        value: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Parse call arguments after the opening parenthesis
    fn parse_call_arguments(&mut self) -> Result<(Vec<SourceExpr>, Vec<Keyword>)> {
        let mut args = vec![];
        let mut keywords = vec![];

        while !self.match_token(&Token::RightParen) {
            if let (Token::Identifier(name), Token::Assign) =
                (self.current_token(), self.peek_token())
            {
                self.advance();
                self.advance();
                let value = self.parse_expression()?;
                keywords.push(Keyword { name, value });
            } else {
                if !keywords.is_empty() {
                    bail!("Positional argument follows keyword argument");
                }
                args.push(self.parse_expression()?);
            }

            if !self.match_token(&Token::Comma) {
                break;
            }
            self.advance();
        }

        self.expect_token(Token::RightParen)?;
        Ok((args, keywords))
    }

    /// Parse primary expression
    fn parse_primary(&mut self) -> Result<SourceExpr> {
        match self.current_token() {
            Token::Integer(n) => {
                self.advance();
                match n.parse::<i64>() {
                    Ok(i) => Ok(SourceExpr::Literal(Value::Int64(i))),
                    Err(_) => bail!("Integer literal out of range: {}", n),
                }
            }
            Token::Float(n) => {
                self.advance();
                match n.parse::<f64>() {
                    Ok(f) => Ok(SourceExpr::Literal(Value::Float64(f))),
                    Err(_) => bail!("Invalid float literal: {}", n),
                }
            }
            Token::String(s) => {
                self.advance();
                Ok(SourceExpr::Literal(Value::String(s)))
            }
            Token::True => {
                self.advance();
                Ok(SourceExpr::Literal(Value::Boolean(true)))
            }
            Token::False => {
                self.advance();
                Ok(SourceExpr::Literal(Value::Boolean(false)))
            }
            Token::None => {
                self.advance();
                Ok(SourceExpr::Literal(Value::Null))
            }
            Token::Identifier(name) => {
                self.advance();
                Ok(SourceExpr::Name(name))
            }
            Token::LeftParen => {
                self.advance();
                self.parse_parenthesized()
            }
            Token::LeftBracket => {
                self.advance();
                let items = self.parse_sequence_items(&Token::RightBracket)?;
                self.expect_token(Token::RightBracket)?;
                Ok(SourceExpr::List(items))
            }
            Token::UnterminatedString => bail!("Unterminated string literal"),
            token => bail!("Unexpected token: {:?}", token),
        }
    }

    /// Parse what follows `(`: a grouped expression or a tuple
    fn parse_parenthesized(&mut self) -> Result<SourceExpr> {
        if self.match_token(&Token::RightParen) {
            self.advance();
            return Ok(SourceExpr::Tuple(vec![]));
        }

        let first = self.parse_expression()?;
        if self.match_token(&Token::RightParen) {
            self.advance();
            return Ok(first);
        }

        self.expect_token(Token::Comma)?;
        let mut items = vec![first];
        items.extend(self.parse_sequence_items(&Token::RightParen)?);
        self.expect_token(Token::RightParen)?;
        Ok(SourceExpr::Tuple(items))
    }

    /// Parse comma separated items up to (not including) `close`
    fn parse_sequence_items(&mut self, close: &Token) -> Result<Vec<SourceExpr>> {
        let mut items = vec![];

        while !self.match_token(close) {
            items.push(self.parse_expression()?);
            if !self.match_token(&Token::Comma) {
                break;
            }
            self.advance();
        }

        Ok(items)
    }

    // Helper methods

    /// Get current token
    fn current_token(&self) -> Token {
        self.tokens
            .get(self.position)
            .cloned()
            .unwrap_or(Token::Eof)
    }

    /// Get the token after the current one
    fn peek_token(&self) -> Token {
        self.tokens
            .get(self.position + 1)
            .cloned()
            .unwrap_or(Token::Eof)
    }

    /// Advance to next token
    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    /// Check if current token matches
    fn match_token(&self, token: &Token) -> bool {
        self.current_token() == *token
    }

    /// Expect a specific token
    fn expect_token(&mut self, token: Token) -> Result<()> {
        if self.current_token() == token {
            self.advance();
            Ok(())
        } else {
            bail!("Expected {:?}, found {:?}", token, self.current_token())
        }
    }

    /// Expect an identifier
    fn expect_identifier(&mut self) -> Result<String> {
        match self.current_token() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            token => bail!("Expected identifier, found {:?}", token),
        }
    }
}

/// Parse `text` as a single expression
pub fn parse_expression(text: &str) -> Result<SourceExpr> {
    Parser::new(text).parse()
}
