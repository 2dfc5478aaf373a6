pub mod error;
pub mod lexer;
pub mod token;
pub mod version;

pub use error::{LexError, LexErrorKind};
pub use lexer::{tokenize, Lexer, Token, TokenStream};
pub use token::TokenKind;
pub use version::PhpVersion;
