// tests/parser_tests.rs

use virgule::ast::{BinOp, Expr, Tag, UnOp};
use virgule::parser::{parse_evaluator, parse_expression, ParseError};

// ============================================================================
// Precedence
// ============================================================================

#[test]
fn test_product_binds_tighter_than_sum() {
    let expr = parse_expression("1 + 2 * 3").unwrap();
    match expr {
        Expr::Infix {
            op: BinOp::Add,
            left,
            right,
        } => {
            assert!(matches!(*left, Expr::Literal(n) if n == 1.0));
            assert!(matches!(
                *right,
                Expr::Infix {
                    op: BinOp::Multiply,
                    ..
                }
            ));
        }
        other => panic!("expected addition at the root, got {:?}", other),
    }
}

#[test]
fn test_parentheses_group() {
    let expr = parse_expression("(1 + 2) * 3").unwrap();
    match expr {
        Expr::Infix {
            op: BinOp::Multiply,
            left,
            right,
        } => {
            assert!(matches!(*left, Expr::Infix { op: BinOp::Add, .. }));
            assert!(matches!(*right, Expr::Literal(n) if n == 3.0));
        }
        other => panic!("expected multiplication at the root, got {:?}", other),
    }
}

#[test]
fn test_relation_binds_tighter_than_logical() {
    let expr = parse_expression("$1 > 2 && $2 < 5").unwrap();
    match expr {
        Expr::Infix {
            op: BinOp::And,
            left,
            right,
        } => {
            assert!(matches!(
                *left,
                Expr::Infix {
                    op: BinOp::GreaterThan,
                    ..
                }
            ));
            assert!(matches!(
                *right,
                Expr::Infix {
                    op: BinOp::LessThan,
                    ..
                }
            ));
        }
        other => panic!("expected && at the root, got {:?}", other),
    }
}

#[test]
fn test_power_binds_tighter_than_product() {
    let expr = parse_expression("2 * 3 ^ 4").unwrap();
    match expr {
        Expr::Infix {
            op: BinOp::Multiply,
            right,
            ..
        } => {
            assert!(matches!(*right, Expr::Infix { op: BinOp::Power, .. }));
        }
        other => panic!("expected * at the root, got {:?}", other),
    }
}

#[test]
fn test_prefix_operators() {
    let expr = parse_expression("-$1 + 1").unwrap();
    match expr {
        Expr::Infix {
            op: BinOp::Add,
            left,
            ..
        } => {
            assert!(matches!(
                *left,
                Expr::Prefix {
                    op: UnOp::Negate,
                    ..
                }
            ));
        }
        other => panic!("expected + at the root, got {:?}", other),
    }
    assert!(matches!(
        parse_expression("!true").unwrap(),
        Expr::Prefix { op: UnOp::Not, .. }
    ));
}

// ============================================================================
// Ternary
// ============================================================================

#[test]
fn test_ternary() {
    let expr = parse_expression("$1 > 0 ? \"yes\" : \"no\"").unwrap();
    match expr {
        Expr::Ternary {
            cond,
            then,
            otherwise,
        } => {
            assert!(matches!(
                *cond,
                Expr::Infix {
                    op: BinOp::GreaterThan,
                    ..
                }
            ));
            assert!(matches!(*then, Expr::Text(ref s) if s == "yes"));
            assert!(matches!(*otherwise, Expr::Text(ref s) if s == "no"));
        }
        other => panic!("expected ternary, got {:?}", other),
    }
}

#[test]
fn test_ternary_missing_colon() {
    assert!(matches!(
        parse_expression("1 ? 2"),
        Err(ParseError::UnexpectedToken { .. })
    ));
}

// ============================================================================
// References and casts
// ============================================================================

#[test]
fn test_identifier_with_cast() {
    assert_eq!(
        parse_expression("$2::text").unwrap(),
        Expr::Identifier {
            index: 2,
            cast: Some(Tag::Text),
        }
    );
    assert_eq!(
        parse_expression("$-1").unwrap(),
        Expr::Identifier {
            index: -1,
            cast: None,
        }
    );
}

#[test]
fn test_cast_folds_into_values() {
    assert_eq!(
        parse_expression("\"5\"::number").unwrap(),
        Expr::Cast {
            inner: Box::new(Expr::Text("5".to_string())),
            target: Tag::Number,
        }
    );
    assert_eq!(
        parse_expression("1::bool").unwrap(),
        Expr::Cast {
            inner: Box::new(Expr::Literal(1.0)),
            target: Tag::Bool,
        }
    );
}

#[test]
fn test_cast_spellings() {
    for (spelling, tag) in [
        ("float", Tag::Number),
        ("int", Tag::Number),
        ("string", Tag::Text),
        ("boolean", Tag::Bool),
    ] {
        match parse_expression(&format!("$1::{}", spelling)).unwrap() {
            Expr::Identifier { cast, .. } => assert_eq!(cast, Some(tag)),
            other => panic!("expected identifier, got {:?}", other),
        }
    }
}

#[test]
fn test_unknown_cast_is_rejected() {
    assert!(matches!(
        parse_expression("$1::datetime"),
        Err(ParseError::UnknownCast(_))
    ));
}

#[test]
fn test_internal_references() {
    assert_eq!(parse_expression("{NOW}").unwrap(), Expr::Internal("NOW".to_string()));
}

// ============================================================================
// Calls
// ============================================================================

#[test]
fn test_call_with_arguments() {
    let expr = parse_expression("contains($1::text, \"a\", \"b\")").unwrap();
    match expr {
        Expr::Call { name, args } => {
            assert_eq!(name, "contains");
            assert_eq!(args.len(), 3);
        }
        other => panic!("expected call, got {:?}", other),
    }
}

#[test]
fn test_bare_name_is_a_zero_argument_call() {
    assert_eq!(
        parse_expression("min").unwrap(),
        Expr::Call {
            name: "min".to_string(),
            args: vec![],
        }
    );
    assert_eq!(
        parse_expression("min()").unwrap(),
        Expr::Call {
            name: "min".to_string(),
            args: vec![],
        }
    );
}

#[test]
fn test_nested_calls() {
    let expr = parse_expression("max(len($1::text), 3)").unwrap();
    match expr {
        Expr::Call { name, args } => {
            assert_eq!(name, "max");
            assert!(matches!(&args[0], Expr::Call { name, .. } if name == "len"));
        }
        other => panic!("expected call, got {:?}", other),
    }
}

// ============================================================================
// Assignment
// ============================================================================

#[test]
fn test_append_assignment() {
    let expr = parse_evaluator("= $1 + $2").unwrap();
    match expr {
        Expr::Assign { target, value } => {
            assert!(target.is_none());
            assert!(matches!(*value, Expr::Infix { op: BinOp::Add, .. }));
        }
        other => panic!("expected assignment, got {:?}", other),
    }
}

#[test]
fn test_insert_assignment() {
    let expr = parse_evaluator("2 = $1 * 10").unwrap();
    match expr {
        Expr::Assign { target, .. } => {
            assert!(matches!(target.as_deref(), Some(Expr::Literal(n)) if *n == 2.0));
        }
        other => panic!("expected assignment, got {:?}", other),
    }
}

#[test]
fn test_overwrite_assignment() {
    let expr = parse_evaluator("$3 = tolower($3::text)").unwrap();
    match expr {
        Expr::Assign { target, .. } => {
            assert!(matches!(
                target.as_deref(),
                Some(Expr::Identifier { index: 3, .. })
            ));
        }
        other => panic!("expected assignment, got {:?}", other),
    }
}

#[test]
fn test_invalid_assignment_targets() {
    assert!(matches!(
        parse_expression("\"x\" = 1"),
        Err(ParseError::InvalidAssignTarget)
    ));
    assert!(matches!(
        parse_expression("(1 + 2) = 1"),
        Err(ParseError::InvalidAssignTarget)
    ));
}

#[test]
fn test_evaluator_requires_assignment() {
    assert!(matches!(
        parse_evaluator("$1 + $2"),
        Err(ParseError::NotAnAssignment)
    ));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_trailing_tokens_are_rejected() {
    assert!(matches!(
        parse_expression("1 2"),
        Err(ParseError::UnexpectedToken { .. })
    ));
}

#[test]
fn test_lex_errors_propagate() {
    assert!(matches!(parse_expression("1 @ 2"), Err(ParseError::Lex(_))));
}

// ============================================================================
// Round trip: printing a tree re-parses to the same tree
// ============================================================================

#[test]
fn test_print_parse_round_trip() {
    let cases = [
        "1 + 2 * 3",
        "(1 + 2) * 3",
        "$1 > 2 && $2 < 5 || $3 == \"x\"",
        "-$1 + 1",
        "!($1::bool)",
        "$1 > 0 ? \"yes\" : \"no\"",
        "contains($3::text, \"west\", \"east\")",
        "= $1 + \"-\" + $3",
        "2 = $1 * 10",
        "$2 = $2::number ^ 2",
        "\"5\"::number % 3",
        "{HOME}",
        "min(1, 2, $-1)",
    ];
    for case in cases {
        let first = parse_expression(case).unwrap();
        let printed = first.to_string();
        let second = parse_expression(&printed)
            .unwrap_or_else(|e| panic!("'{}' printed as '{}' which fails: {}", case, printed, e));
        assert_eq!(first, second, "'{}' printed as '{}'", case, printed);
    }
}
