#[cfg(test)]
mod parser_tests {
    use rox::ast::*;
    use rox::parser::Parser;
    use rox::scanner::scan;
    use rox::token::TokenType;

    fn parse(source: &str) -> (Vec<Stmt>, Vec<String>) {
        let (tokens, lex_errors) = scan(source);
        assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);

        let (statements, errors) = Parser::new(&tokens).parse();
        (
            statements,
            errors.iter().map(ToString::to_string).collect(),
        )
    }

    fn parse_ok(source: &str) -> Vec<Stmt> {
        let (statements, errors) = parse(source);
        assert!(errors.is_empty(), "parse errors: {:?}", errors);
        statements
    }

    #[test]
    fn test_two_independent_errors_are_both_reported() {
        let (statements, errors) = parse("var = 1;\nprint (;\nprint 3;");

        assert_eq!(
            errors,
            vec![
                "[line 1] Error at '=': Expect variable name.",
                "[line 2] Error at ';': Expect expression.",
            ]
        );
        assert_eq!(statements.len(), 1);
        assert!(matches!(statements[0], Stmt::Print(Some(_))));
    }

    #[test]
    fn test_error_inside_block_recovers_at_brace() {
        let (statements, errors) = parse("fn f() { print ); }\nprint 1;");

        assert_eq!(errors, vec!["[line 1] Error at ')': Expect expression."]);
        assert_eq!(statements.len(), 2);
        assert!(matches!(statements[0], Stmt::Function { .. }));
    }

    #[test]
    fn test_unclosed_block_reports_at_end() {
        let (_, errors) = parse("{ print 1;");
        assert_eq!(errors, vec!["[line 1] Error at end: Expect '}' after block."]);
    }

    #[test]
    fn test_for_desugars_to_while() {
        let statements = parse_ok("for (var i = 0; i < 3; i = i + 1) print i;");

        assert_eq!(statements.len(), 1);

        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected Block, got {:?}", statements[0]);
        };
        assert_eq!(outer.len(), 2);
        assert!(matches!(outer[0], Stmt::Var { .. }));

        let Stmt::While { condition, body } = &outer[1] else {
            panic!("expected While, got {:?}", outer[1]);
        };
        assert!(matches!(condition, Expr::Binary { .. }));

        let Stmt::Block(inner) = body.as_ref() else {
            panic!("expected Block body, got {:?}", body);
        };
        assert!(matches!(inner[0], Stmt::Print(_)));
        assert!(matches!(inner[1], Stmt::Expression(Expr::Assign { .. })));
    }

    #[test]
    fn test_for_without_clauses_loops_on_true() {
        let statements = parse_ok("for (;;) break;");

        let Stmt::While { condition, body } = &statements[0] else {
            panic!("expected bare While, got {:?}", statements[0]);
        };
        assert_eq!(*condition, Expr::Literal(LiteralValue::Bool(true)));
        assert!(matches!(body.as_ref(), Stmt::Break(_)));
    }

    #[test]
    fn test_compound_assignment_desugars() {
        let statements = parse_ok("x += 2;");

        let Stmt::Expression(Expr::Assign { name, value, .. }) = &statements[0] else {
            panic!("expected Assign, got {:?}", statements[0]);
        };
        assert_eq!(name.lexeme, "x");

        let Expr::Binary {
            left,
            operator,
            right,
        } = value.as_ref()
        else {
            panic!("expected Binary, got {:?}", value);
        };
        assert!(matches!(left.as_ref(), Expr::Variable { name, .. } if name.lexeme == "x"));
        assert_eq!(operator.token_type, TokenType::PLUS);
        assert_eq!(**right, Expr::Literal(LiteralValue::Number(2.0)));
    }

    #[test]
    fn test_decrement_on_index_becomes_set_index() {
        let statements = parse_ok("a[1]--;");

        let Stmt::Expression(Expr::SetIndex {
            arguments, value, ..
        }) = &statements[0]
        else {
            panic!("expected SetIndex, got {:?}", statements[0]);
        };
        assert_eq!(arguments.len(), 1);

        let Expr::Binary {
            operator, right, ..
        } = value.as_ref()
        else {
            panic!("expected Binary, got {:?}", value);
        };
        assert_eq!(operator.token_type, TokenType::MINUS);
        assert_eq!(**right, Expr::Literal(LiteralValue::Number(1.0)));
    }

    #[test]
    fn test_invalid_assignment_target_does_not_panic_parser() {
        let (statements, errors) = parse("1 = 2;\nprint 3;");

        assert_eq!(errors, vec!["[line 1] Error at '=': Invalid assignment target."]);
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_if_requires_colon() {
        let statements = parse_ok("if x > 1: print 1; else print 2;");
        assert!(matches!(
            statements[0],
            Stmt::If {
                else_branch: Some(_),
                ..
            }
        ));

        let (_, errors) = parse("if x print 1;");
        assert_eq!(
            errors,
            vec!["[line 1] Error at 'print': Expect ':' after if condition."]
        );
    }

    #[test]
    fn test_else_binds_to_nearest_if() {
        let statements = parse_ok("if a: if b: print 1; else print 2;");

        let Stmt::If {
            then_branch,
            else_branch,
            ..
        } = &statements[0]
        else {
            panic!("expected If, got {:?}", statements[0]);
        };
        assert!(else_branch.is_none());
        assert!(matches!(
            then_branch.as_ref(),
            Stmt::If {
                else_branch: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_declaration_rejected_as_if_branch() {
        let (_, errors) = parse("if true: var x = 1;");
        assert_eq!(
            errors,
            vec!["[line 1] Error at 'var': Declaration not allowed as 'if' branch."]
        );
    }

    #[test]
    fn test_exponent_is_right_associative() {
        let statements = parse_ok("2 ^ 3 ^ 2;");

        let Stmt::Expression(Expr::Binary { left, right, .. }) = &statements[0] else {
            panic!("expected Binary, got {:?}", statements[0]);
        };
        assert_eq!(**left, Expr::Literal(LiteralValue::Number(2.0)));
        assert!(matches!(right.as_ref(), Expr::Binary { .. }));
    }

    #[test]
    fn test_array_declaration_and_property() {
        let statements = parse_ok("arr a[3] = {1, 2, 3}; print a.length;");

        let Stmt::Array {
            name, initializer, ..
        } = &statements[0]
        else {
            panic!("expected Array, got {:?}", statements[0]);
        };
        assert_eq!(name.lexeme, "a");
        assert_eq!(initializer.as_ref().map(Vec::len), Some(3));

        assert!(matches!(
            &statements[1],
            Stmt::Print(Some(Expr::Get { name, .. })) if name.lexeme == "length"
        ));
    }

    #[test]
    fn test_class_is_reported_and_skipped() {
        let (statements, errors) = parse("class A { fn m() { print 1; } }\nprint 2;");

        assert_eq!(
            errors,
            vec!["[line 1] Error at 'class': Classes are not supported."]
        );
        assert_eq!(statements.len(), 1);
        assert!(matches!(statements[0], Stmt::Print(Some(_))));
    }

    #[test]
    fn test_expression_ids_are_unique_and_offset() {
        let (tokens, _) = scan("a = b;");
        let mut parser = Parser::with_first_id(&tokens, 10);
        let (statements, errors) = parser.parse();

        assert!(errors.is_empty());
        // a (parsed as a Variable first), b, then the Assign
        assert_eq!(parser.next_id(), 13);

        let Stmt::Expression(Expr::Assign { id, value, .. }) = &statements[0] else {
            panic!("expected Assign, got {:?}", statements[0]);
        };
        assert_eq!(*id, ExprId(12));
        assert!(matches!(value.as_ref(), Expr::Variable { id, .. } if *id == ExprId(11)));
    }

    #[test]
    fn test_too_many_arguments_is_reported_without_panic_mode() {
        let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        let source = format!("f({});\nprint 1;", args.join(", "));

        let (statements, errors) = parse(&source);

        assert_eq!(
            errors,
            vec!["[line 1] Error at '255': Can't have more than 255 arguments."]
        );
        assert_eq!(statements.len(), 2);
    }
}
