// Syntax module - surface normalization, tokens, parsing and the source tree

pub mod ast;
pub mod lexer;
pub mod normalize;
pub mod parser;
pub mod token;

pub use ast::*;
pub use lexer::Lexer;
pub use normalize::{DebugFormatNormalizer, SurfaceNormalizer, Verbatim};
pub use parser::{parse_expression, Parser};
pub use token::Token;
