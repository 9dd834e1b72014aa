#[cfg(test)]
mod interpreter_tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use rox::{ErrorKind, Lox, LoxError};

    type Output = Rc<RefCell<Vec<String>>>;

    fn session() -> (Lox, Output) {
        let out: Output = Rc::new(RefCell::new(Vec::new()));
        (Lox::with_output(Box::new(out.clone())), out)
    }

    /// Runs `source` and returns everything printed; panics on any diagnostic.
    fn run(source: &str) -> Vec<String> {
        let (mut lox, out) = session();

        if let Err(errors) = lox.run(source) {
            panic!("unexpected errors: {:?}", errors);
        }

        let lines = out.borrow().clone();
        lines
    }

    /// Runs `source` expecting it to fail; returns the printed lines and errors.
    fn run_err(source: &str) -> (Vec<String>, Vec<LoxError>) {
        let (mut lox, out) = session();

        let errors = match lox.run(source) {
            Ok(()) => panic!("expected errors, got output {:?}", out.borrow()),
            Err(errors) => errors,
        };

        let lines = out.borrow().clone();
        (lines, errors)
    }

    fn runtime_message(source: &str) -> String {
        let (_, errors) = run_err(source);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::Runtime);
        errors[0].to_string()
    }

    #[test]
    fn test_numbers_print_canonically() {
        assert_eq!(
            run("print 1; print 1.5; print 10 / 4; print -0.25; print 3.0; print 100;"),
            vec!["1", "1.5", "2.5", "-0.25", "3", "100"]
        );
    }

    #[test]
    fn test_addition_and_concatenation() {
        assert_eq!(
            run("print 1 + 2; print \"a\" + 1; print 1 + \"a\"; print \"a\" + \"b\"; print \"n\" + 2.5;"),
            vec!["3", "a1", "1a", "ab", "n2.5"]
        );
    }

    #[test]
    fn test_arithmetic_operators_and_precedence() {
        assert_eq!(
            run("print 2 + 3 * 4; print (2 + 3) * 4; print 7 % 3; print 2 ^ 3 ^ 2; print -2 ^ 2; print 1 - 2 - 3;"),
            vec!["14", "20", "1", "512", "4", "-4"]
        );
    }

    #[test]
    fn test_division_by_zero_follows_ieee() {
        assert_eq!(
            run("print 1 / 0; print -1 / 0; print 0 / 0; print 1 % 0;"),
            vec!["inf", "-inf", "NaN", "NaN"]
        );
    }

    #[test]
    fn test_truthiness_and_logic() {
        assert_eq!(
            run("print !nil; print !0; print !\"\"; print nil or \"x\"; print false and 1; print 1 && 2; print nil || false;"),
            vec!["true", "false", "false", "x", "false", "2", "false"]
        );
    }

    #[test]
    fn test_logical_operators_short_circuit() {
        assert_eq!(
            run("var hit = false; fn f() { hit = true; return true; } false and f(); true or f(); print hit;"),
            vec!["false"]
        );
    }

    #[test]
    fn test_equality_is_type_strict() {
        assert_eq!(
            run("print 1 == 1; print \"1\" == 1; print nil == false; print nil == nil; print \"a\" != \"b\";"),
            vec!["true", "false", "false", "true", "true"]
        );
    }

    #[test]
    fn test_functions_and_arrays_compare_by_identity() {
        assert_eq!(
            run("fn f() {} var g = f; print f == g; arr a[1]; arr b[1]; print a == b; print a == a;"),
            vec!["true", "false", "true"]
        );
    }

    #[test]
    fn test_block_scoping_and_shadowing() {
        assert_eq!(
            run("var a = 1; { var a = 2; print a; } print a;"),
            vec!["2", "1"]
        );
    }

    #[test]
    fn test_counter_closure() {
        let source = "
            fn makeCounter() {
                var i = 0;
                fn count() {
                    i = i + 1;
                    print i;
                }
                return count;
            }
            var counter = makeCounter();
            counter();
            counter();
        ";

        assert_eq!(run(source), vec!["1", "2"]);
    }

    #[test]
    fn test_closure_binds_lexically() {
        let source = "
            var a = \"global\";
            {
                fn show() { print a; }
                show();
                var a = \"block\";
                show();
            }
        ";

        assert_eq!(run(source), vec!["global", "global"]);
    }

    #[test]
    fn test_recursion() {
        let source = "
            fn fib(n) {
                if n < 2: return n;
                return fib(n - 1) + fib(n - 2);
            }
            print fib(15);
        ";

        assert_eq!(run(source), vec!["610"]);
    }

    #[test]
    fn test_while_for_and_break() {
        let source = "
            var i = 0;
            while (true) {
                i++;
                if i >= 3: break;
            }
            print i;
            for (var j = 0; j < 10; j += 1) {
                if j == 2: break;
                print j;
            }
        ";

        assert_eq!(run(source), vec!["3", "0", "1"]);
    }

    #[test]
    fn test_break_exits_only_innermost_loop() {
        let source = "
            for (var i = 0; i < 2; i++) {
                while (true) break;
                print i;
            }
        ";

        assert_eq!(run(source), vec!["0", "1"]);
    }

    #[test]
    fn test_return_inside_loop_leaves_function() {
        let source = "
            fn first() {
                for (var i = 0; i < 10; i++) {
                    if i == 4: return i;
                }
                return -1;
            }
            print first();
        ";

        assert_eq!(run(source), vec!["4"]);
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        assert_eq!(run("fn f() {} print f();"), vec!["nil"]);
    }

    #[test]
    fn test_compound_assignment() {
        assert_eq!(
            run("var x = 5; x += 3; print x; x -= 1; print x; x++; print x; x--; x--; print x;"),
            vec!["8", "7", "8", "6"]
        );
    }

    #[test]
    fn test_print_without_value_prints_blank_line() {
        assert_eq!(run("print; print 1;"), vec!["", "1"]);
    }

    #[test]
    fn test_stringify_callables() {
        assert_eq!(
            run("fn f() {} arr xs[1]; print f; print clock; print xs;"),
            vec!["<fn f>", "<native fn clock>", "<array xs>"]
        );
    }

    #[test]
    fn test_clock_returns_a_number() {
        assert_eq!(run("print clock() > 0;"), vec!["true"]);
    }

    #[test]
    fn test_arrays_read_write_and_length() {
        let source = "
            arr a[3] = {1, 2, 3};
            a[0] = 10;
            a[1] += 5;
            a[2]++;
            print a[0]; print a[1]; print a(2); print a.length;
            arr b[2];
            print b[1];
            print a[1.9];
        ";

        assert_eq!(run(source), vec!["10", "7", "4", "3", "nil", "7"]);
    }

    #[test]
    fn test_arrays_are_shared_by_reference() {
        assert_eq!(
            run("arr a[1]; fn set(xs) { xs[0] = \"s\"; } set(a); print a[0];"),
            vec!["s"]
        );
    }

    #[test]
    fn test_initialized_array_type_is_locked() {
        assert_eq!(
            runtime_message("arr a[2] = {1, 2}; a[0] = \"x\";"),
            "Array 'a' holds number values, cannot store string.\n[line 1]"
        );
    }

    #[test]
    fn test_first_write_locks_array_type() {
        let (lines, errors) = run_err("arr b[2];\nb[0] = 1;\nprint b[0];\nb[1] = \"x\";\nprint 2;");

        assert_eq!(lines, vec!["1"]);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "Array 'b' holds number values, cannot store string.\n[line 4]"
        );
    }

    #[test]
    fn test_nil_marks_an_empty_slot() {
        let source = "
            arr a[2];
            a[0] = nil;
            a[1] = 1;
            print a[1];
            a[1] = nil;
            print a[1];
            a[0] = 5;
            print a[0];
        ";

        assert_eq!(run(source), vec!["1", "nil", "5"]);
        assert_eq!(
            runtime_message("arr a[2] = {nil, 1}; a[0] = \"x\";"),
            "Array 'a' holds number values, cannot store string.\n[line 1]"
        );
    }

    #[test]
    fn test_session_survives_oversized_array() {
        let (mut lox, out) = session();

        assert!(lox.run("arr a[10 ^ 300];").is_err());
        lox.run("print 1;").expect("session still usable");

        assert_eq!(*out.borrow(), vec!["1"]);
    }

    #[test]
    fn test_array_declaration_errors() {
        assert_eq!(
            runtime_message("arr a[2] = {1, \"x\"};"),
            "Array elements must all be of the same type.\n[line 1]"
        );
        assert_eq!(
            runtime_message("arr a[3] = {1, 2};"),
            "Expected 3 elements but got 2.\n[line 1]"
        );
        assert_eq!(
            runtime_message("arr a[1.5];"),
            "Array size must be an integer.\n[line 1]"
        );
        assert_eq!(
            runtime_message("arr a[0];"),
            "Array size must be positive.\n[line 1]"
        );
        assert_eq!(
            runtime_message("arr a[\"2\"];"),
            "Array size must be a number.\n[line 1]"
        );
        assert_eq!(
            runtime_message("arr a[10 ^ 300];"),
            "Array size too large.\n[line 1]"
        );
        assert_eq!(
            runtime_message("arr a[10 ^ 12];"),
            "Array size too large.\n[line 1]"
        );
    }

    #[test]
    fn test_array_index_errors() {
        assert_eq!(
            runtime_message("arr a[2]; print a[2];"),
            "Array index 2 out of bounds for length 2.\n[line 1]"
        );
        assert_eq!(
            runtime_message("arr a[2]; a[-1] = 1;"),
            "Array index -1 out of bounds for length 2.\n[line 1]"
        );
        assert_eq!(
            runtime_message("arr a[2]; print a[\"0\"];"),
            "Array index must be a number, got string.\n[line 1]"
        );
    }

    #[test]
    fn test_property_errors() {
        assert_eq!(
            runtime_message("arr a[1]; print a.size;"),
            "Undefined property 'size'.\n[line 1]"
        );
        assert_eq!(
            runtime_message("var s = \"abc\"; print s.length;"),
            "Only arrays have properties.\n[line 1]"
        );
        assert_eq!(
            runtime_message("var n = 1; n[0] = 2;"),
            "Only array elements can be assigned to.\n[line 1]"
        );
    }

    #[test]
    fn test_calling_non_callable() {
        assert_eq!(
            runtime_message("var x = 1; x();"),
            "Can only call functions and arrays.\n[line 1]"
        );
        assert_eq!(
            runtime_message("\"str\"(1);"),
            "Can only call functions and arrays.\n[line 1]"
        );
    }

    #[test]
    fn test_arity_mismatch_names_expected_and_actual() {
        assert_eq!(
            runtime_message("fn f(a, b) {}\nf(1);"),
            "Expected 2 arguments but got 1.\n[line 2]"
        );
        assert_eq!(
            runtime_message("clock(1);"),
            "Expected 0 arguments but got 1.\n[line 1]"
        );
    }

    #[test]
    fn test_operand_type_errors() {
        assert_eq!(
            runtime_message("print -\"a\";"),
            "Operand must be a number.\n[line 1]"
        );
        assert_eq!(
            runtime_message("print 1 < \"a\";"),
            "Operands must be numbers.\n[line 1]"
        );
        assert_eq!(
            runtime_message("print nil + 1;"),
            "Operands must be two numbers or two strings.\n[line 1]"
        );
    }

    #[test]
    fn test_undefined_variable() {
        assert_eq!(
            runtime_message("print missing;"),
            "Undefined variable 'missing'.\n[line 1]"
        );
        assert_eq!(
            runtime_message("missing = 1;"),
            "Undefined variable 'missing'.\n[line 1]"
        );
    }

    #[test]
    fn test_runtime_error_stops_execution() {
        let (lines, errors) = run_err("print 1;\nprint -nil;\nprint 2;");

        assert_eq!(lines, vec!["1"]);
        assert_eq!(errors[0].line(), Some(2));
        assert_eq!(errors[0].exit_code(), 70);
    }

    #[test]
    fn test_resolve_errors_prevent_execution() {
        let (lines, errors) = run_err("print 1;\n{ var a = a; }");

        assert!(lines.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::Compile);
        assert_eq!(errors[0].exit_code(), 65);
    }

    #[test]
    fn test_break_and_return_outside_context_are_compile_errors() {
        let (_, errors) = run_err("break;\nreturn;");

        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            vec![
                "[line 1] Error at 'break': Can't break outside of a loop.",
                "[line 2] Error at 'return': Can't return from top-level code.",
            ]
        );
    }

    #[test]
    fn test_lex_and_parse_errors_are_reported_together() {
        let (lines, errors) = run_err("print 1;\nvar $ = 2;\nprint (;");

        assert!(lines.is_empty());
        assert!(errors.iter().all(|e| e.kind() == ErrorKind::Compile));
        assert_eq!(errors[0].to_string(), "[line 2] Error: Unexpected character: $");
        assert!(errors.len() >= 2);
    }

    #[test]
    fn test_session_keeps_state_between_runs() {
        let (mut lox, out) = session();

        lox.run("var total = 0; fn add(n) { total = total + n; }")
            .expect("first run");
        lox.run("add(2); add(3);").expect("second run");
        lox.run("fn counter() { var c = 0; fn inc() { c++; return c; } return inc; } var inc = counter();")
            .expect("third run");
        lox.run("inc(); print inc(); print total;").expect("fourth run");

        assert_eq!(*out.borrow(), vec!["2", "5"]);
    }

    #[test]
    fn test_session_survives_runtime_error() {
        let (mut lox, out) = session();

        lox.run("var a = 1;").expect("first run");
        assert!(lox.run("{ var b = 2; print nil + b; }").is_err());
        lox.run("print a; var b = 3; print b;").expect("third run");

        assert_eq!(*out.borrow(), vec!["1", "3"]);
    }

    #[test]
    fn test_global_redeclaration_is_allowed() {
        assert_eq!(run("var a = 1; var a = 2; print a;"), vec!["2"]);
        assert_eq!(run("var a = 1; var a = a + 1; print a;"), vec!["2"]);
        assert_eq!(
            runtime_message("var a = a;"),
            "Undefined variable 'a'.\n[line 1]"
        );
    }
}
