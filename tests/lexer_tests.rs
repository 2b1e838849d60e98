// tests/lexer_tests.rs

use virgule::ast::Token;
use virgule::lexer::{LexError, Lexer};

fn tokens(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input);
    let mut out = Vec::new();
    loop {
        let token = lexer.next_token().expect("lex");
        let done = token == Token::Eof;
        out.push(token);
        if done {
            return out;
        }
    }
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_numbers() {
    assert_eq!(tokens("42"), vec![Token::Number(42.0), Token::Eof]);
    assert_eq!(tokens("3.14"), vec![Token::Number(3.14), Token::Eof]);
    assert_eq!(tokens("0.5 7"), vec![
        Token::Number(0.5),
        Token::Number(7.0),
        Token::Eof,
    ]);
}

#[test]
fn test_double_dot_is_malformed() {
    let mut lexer = Lexer::new("1.2.3");
    assert!(matches!(lexer.next_token(), Err(LexError::MalformedNumber(_))));
}

#[test]
fn test_text() {
    assert_eq!(
        tokens("\"hello world\""),
        vec![Token::Text("hello world".to_string()), Token::Eof]
    );
    assert_eq!(tokens("\"\""), vec![Token::Text(String::new()), Token::Eof]);
}

#[test]
fn test_unterminated_text() {
    let mut lexer = Lexer::new("\"oops");
    assert!(matches!(lexer.next_token(), Err(LexError::UnterminatedText(_))));
}

#[test]
fn test_variables() {
    assert_eq!(
        tokens("true false contains"),
        vec![
            Token::Variable("true".to_string()),
            Token::Variable("false".to_string()),
            Token::Variable("contains".to_string()),
            Token::Eof,
        ]
    );
}

// ============================================================================
// Row and environment references
// ============================================================================

#[test]
fn test_indexes() {
    assert_eq!(tokens("$1"), vec![Token::Index(1), Token::Eof]);
    assert_eq!(tokens("$-5"), vec![Token::Index(-5), Token::Eof]);
}

#[test]
fn test_minus_detaches_with_space() {
    // `$-5` binds the sign into the index; `-$5` and `$ -5` do not.
    assert_eq!(tokens("-$5"), vec![Token::Minus, Token::Index(5), Token::Eof]);
    let mut lexer = Lexer::new("$ -5");
    assert!(matches!(lexer.next_token(), Err(LexError::MalformedIndex(_))));
}

#[test]
fn test_bare_dollar_is_an_error() {
    let mut lexer = Lexer::new("$");
    assert!(matches!(lexer.next_token(), Err(LexError::MalformedIndex(_))));
}

#[test]
fn test_env_references() {
    assert_eq!(tokens("{NOW}"), vec![Token::Env("NOW".to_string()), Token::Eof]);
    assert_eq!(
        tokens("{MY_VAR2}"),
        vec![Token::Env("MY_VAR2".to_string()), Token::Eof]
    );
    let mut lexer = Lexer::new("{now}");
    assert!(matches!(lexer.next_token(), Err(LexError::UnterminatedEnv(_))));
    let mut lexer = Lexer::new("{OOPS");
    assert!(matches!(lexer.next_token(), Err(LexError::UnterminatedEnv(_))));
}

// ============================================================================
// Operators and casts
// ============================================================================

#[test]
fn test_single_char_operators() {
    assert_eq!(
        tokens("+ - * / % ^ ( ) , ? : !"),
        vec![
            Token::Plus,
            Token::Minus,
            Token::Star,
            Token::Slash,
            Token::Percent,
            Token::Caret,
            Token::LParen,
            Token::RParen,
            Token::Comma,
            Token::Question,
            Token::Colon,
            Token::Bang,
            Token::Eof,
        ]
    );
}

#[test]
fn test_multi_char_operators() {
    assert_eq!(
        tokens("== != <= >= && || ="),
        vec![
            Token::Eq,
            Token::NotEq,
            Token::LtEq,
            Token::GtEq,
            Token::And,
            Token::Or,
            Token::Assign,
            Token::Eof,
        ]
    );
}

#[test]
fn test_cast_suffix() {
    assert_eq!(
        tokens("$2::bool"),
        vec![Token::Index(2), Token::Cast("bool".to_string()), Token::Eof]
    );
    assert_eq!(
        tokens("\"5\"::number"),
        vec![
            Token::Text("5".to_string()),
            Token::Cast("number".to_string()),
            Token::Eof,
        ]
    );
}

#[test]
fn test_lone_colon_is_a_colon() {
    assert_eq!(
        tokens("? 1 : 2"),
        vec![
            Token::Question,
            Token::Number(1.0),
            Token::Colon,
            Token::Number(2.0),
            Token::Eof,
        ]
    );
}

#[test]
fn test_half_logical_operators_fail() {
    let mut lexer = Lexer::new("&");
    assert!(matches!(lexer.next_token(), Err(LexError::UnexpectedChar('&', _))));
    let mut lexer = Lexer::new("|");
    assert!(matches!(lexer.next_token(), Err(LexError::UnexpectedChar('|', _))));
}

#[test]
fn test_unknown_bytes_fail() {
    let mut lexer = Lexer::new("#");
    assert!(matches!(lexer.next_token(), Err(LexError::UnexpectedChar('#', _))));
}

#[test]
fn test_whole_expression() {
    assert_eq!(
        tokens("$1 > 2 && contains($3, \"west\")"),
        vec![
            Token::Index(1),
            Token::Gt,
            Token::Number(2.0),
            Token::And,
            Token::Variable("contains".to_string()),
            Token::LParen,
            Token::Index(3),
            Token::Comma,
            Token::Text("west".to_string()),
            Token::RParen,
            Token::Eof,
        ]
    );
}
