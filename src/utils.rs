use regex::Regex;
use std::io;
use thiserror::Error;

/// Custom error types for grammar construction and normalization
#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid rule name: {0}")]
    InvalidRuleName(String),

    #[error("Invalid grammar: {0}")]
    InvalidGrammar(String),

    #[error("Unknown start variable: {0}")]
    UnknownStartVariable(String),
}

/// Result type for grammar operations
pub type Result<T> = std::result::Result<T, GrammarError>;

/// Check whether a token is a well-formed variable name: an uppercase
/// letter followed by optional decimal digits (`S`, `A`, `U12`, ...).
pub fn is_variable_name(token: &str) -> bool {
    let name_regex = Regex::new(r"^[A-Z][0-9]*$").unwrap();
    name_regex.is_match(token)
}
