// Expression tokens for lexical analysis

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Identifier(String),
    Integer(String),
    Float(String),
    String(String),

    // Keywords
    True,
    False,
    None,
    And,
    Or,
    Not,
    In,
    Is,

    // Operators
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    Tilde,
    Ampersand,
    Pipe,
    Caret,
    ShiftLeft,
    ShiftRight,
    EqualEqual,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Assign,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,
    Dot,
    Colon,

    // Special
    Unknown(char),
    UnterminatedString,
    Eof,
}

impl Token {
    /// Check if the token is a keyword
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Token::True
                | Token::False
                | Token::None
                | Token::And
                | Token::Or
                | Token::Not
                | Token::In
                | Token::Is
        )
    }

    /// Convert a word to a keyword token if it matches.
    ///
    /// Keywords are case sensitive, so `true` stays an identifier.
    pub fn keyword_from_str(s: &str) -> Option<Token> {
        match s {
            "True" => Some(Token::True),
            "False" => Some(Token::False),
            "None" => Some(Token::None),
            "and" => Some(Token::And),
            "or" => Some(Token::Or),
            "not" => Some(Token::Not),
            "in" => Some(Token::In),
            "is" => Some(Token::Is),
            _ => None,
        }
    }
}
