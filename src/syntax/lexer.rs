// Expression lexer - tokenizes normalized expression text

use super::token::Token;

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    current_char: Option<char>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let input: Vec<char> = input.chars().collect();
        let current_char = input.first().copied();
        Lexer {
            input,
            position: 0,
            current_char,
        }
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let Some(ch) = self.current_char else {
            return Token::Eof;
        };

        match ch {
            '+' => self.single(Token::Plus),
            '-' => self.single(Token::Minus),
            '*' => {
                self.advance();
                if self.current_char == Some('*') {
                    self.advance();
                    Token::DoubleStar
                } else {
                    Token::Star
                }
            }
            '/' => {
                self.advance();
                if self.current_char == Some('/') {
                    self.advance();
                    Token::DoubleSlash
                } else {
                    Token::Slash
                }
            }
            '%' => self.single(Token::Percent),
            '~' => self.single(Token::Tilde),
            '&' => self.single(Token::Ampersand),
            '|' => self.single(Token::Pipe),
            '^' => self.single(Token::Caret),
            '=' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::EqualEqual
                } else {
                    Token::Assign
                }
            }
            '!' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::NotEqual
                } else {
                    Token::Unknown('!')
                }
            }
            '<' => {
                self.advance();
                match self.current_char {
                    Some('=') => self.single(Token::LessEqual),
                    Some('<') => self.single(Token::ShiftLeft),
                    _ => Token::Less,
                }
            }
            '>' => {
                self.advance();
                match self.current_char {
                    Some('=') => self.single(Token::GreaterEqual),
                    Some('>') => self.single(Token::ShiftRight),
                    _ => Token::Greater,
                }
            }
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            '[' => self.single(Token::LeftBracket),
            ']' => self.single(Token::RightBracket),
            ',' => self.single(Token::Comma),
            ':' => self.single(Token::Colon),
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.read_number(),
            '.' => self.single(Token::Dot),
            '\'' | '"' => self.read_string(ch),
            c if c.is_alphabetic() || c == '_' => self.read_identifier(),
            c if c.is_ascii_digit() => self.read_number(),
            c => self.single(Token::Unknown(c)),
        }
    }

    /// Consume the current character and return `token`
    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    /// Advance to the next character
    fn advance(&mut self) {
        self.position += 1;
        self.current_char = self.input.get(self.position).copied();
    }

    /// Peek at the next character without advancing
    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    /// Skip whitespace characters
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        let mut identifier = String::new();

        while let Some(ch) = self.current_char {
            if ch.is_alphanumeric() || ch == '_' {
                identifier.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::keyword_from_str(&identifier).unwrap_or(Token::Identifier(identifier))
    }

    /// Read a quoted string literal with backslash escapes
    fn read_string(&mut self, quote: char) -> Token {
        self.advance(); // Skip opening quote
        let mut string = String::new();

        while let Some(ch) = self.current_char {
            if ch == quote {
                self.advance();
                return Token::String(string);
            }
            if ch == '\\' {
                self.advance();
                match self.current_char {
                    Some('n') => string.push('\n'),
                    Some('t') => string.push('\t'),
                    Some('r') => string.push('\r'),
                    Some('0') => string.push('\0'),
                    Some(c @ ('\\' | '\'' | '"')) => string.push(c),
                    Some(c) => {
                        string.push('\\');
                        string.push(c);
                    }
                    None => break,
                }
                self.advance();
            } else {
                string.push(ch);
                self.advance();
            }
        }

        Token::UnterminatedString
    }

    /// Read an integer or float, including an optional exponent
    fn read_number(&mut self) -> Token {
        let mut number = String::new();
        let mut is_float = false;

        while let Some(ch) = self.current_char {
            if ch.is_ascii_digit() || ch == '_' {
                if ch != '_' {
                    number.push(ch);
                }
                self.advance();
            } else if ch == '.' && !is_float {
                is_float = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if matches!(self.current_char, Some('e' | 'E')) {
            let sign = self.peek();
            let digit_follows = match sign {
                Some('+' | '-') => self
                    .input
                    .get(self.position + 2)
                    .is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if digit_follows {
                is_float = true;
                number.push('e');
                self.advance();
                if let Some(c @ ('+' | '-')) = self.current_char {
                    number.push(c);
                    self.advance();
                }
                while let Some(ch) = self.current_char {
                    if !ch.is_ascii_digit() {
                        break;
                    }
                    number.push(ch);
                    self.advance();
                }
            }
        }

        if is_float {
            Token::Float(number)
        } else {
            Token::Integer(number)
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            if token == Token::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }

        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_tokens() {
        let mut lexer = Lexer::new("col(\"a\") > 4");
        assert_eq!(lexer.next_token(), Token::Identifier("col".to_string()));
        assert_eq!(lexer.next_token(), Token::LeftParen);
        assert_eq!(lexer.next_token(), Token::String("a".to_string()));
        assert_eq!(lexer.next_token(), Token::RightParen);
        assert_eq!(lexer.next_token(), Token::Greater);
        assert_eq!(lexer.next_token(), Token::Integer("4".to_string()));
        assert_eq!(lexer.next_token(), Token::Eof);
    }

    #[test]
    fn test_operators() {
        let tokens = Lexer::new("+ - * ** / // % ~ & | ^ << >> == != < > <= >= =").tokenize();
        assert_eq!(
            tokens,
            vec![
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::DoubleStar,
                Token::Slash,
                Token::DoubleSlash,
                Token::Percent,
                Token::Tilde,
                Token::Ampersand,
                Token::Pipe,
                Token::Caret,
                Token::ShiftLeft,
                Token::ShiftRight,
                Token::EqualEqual,
                Token::NotEqual,
                Token::Less,
                Token::Greater,
                Token::LessEqual,
                Token::GreaterEqual,
                Token::Assign,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_string_literals() {
        let mut lexer = Lexer::new(r#"'it\'s' "say \"hi\"" 'a\nb'"#);
        assert_eq!(lexer.next_token(), Token::String("it's".to_string()));
        assert_eq!(lexer.next_token(), Token::String("say \"hi\"".to_string()));
        assert_eq!(lexer.next_token(), Token::String("a\nb".to_string()));
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("'open");
        assert_eq!(lexer.next_token(), Token::UnterminatedString);
    }

    #[test]
    fn test_numbers() {
        let tokens = Lexer::new("123 456.789 .5 1e3 2.5e-3 1_000").tokenize();
        assert_eq!(tokens[0], Token::Integer("123".to_string()));
        assert_eq!(tokens[1], Token::Float("456.789".to_string()));
        assert_eq!(tokens[2], Token::Float(".5".to_string()));
        assert_eq!(tokens[3], Token::Float("1e3".to_string()));
        assert_eq!(tokens[4], Token::Float("2.5e-3".to_string()));
        assert_eq!(tokens[5], Token::Integer("1000".to_string()));
    }

    #[test]
    fn test_attribute_after_number_is_not_exponent() {
        let tokens = Lexer::new("1.abs").tokenize();
        assert_eq!(tokens[0], Token::Float("1.".to_string()));
        assert_eq!(tokens[1], Token::Identifier("abs".to_string()));
    }

    #[test]
    fn test_keywords_and_unknown() {
        let tokens = Lexer::new("not in True None $").tokenize();
        assert_eq!(
            tokens,
            vec![
                Token::Not,
                Token::In,
                Token::True,
                Token::None,
                Token::Unknown('$'),
                Token::Eof
            ]
        );
    }
}
