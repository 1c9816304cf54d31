use super::*;
use crate::desugar;
use crate::lexer::lex;
use crate::parser;
use crate::source::SourceText;

fn run_source(source: &str) -> Result<String, LumenError> {
    let text = SourceText::new(source);
    let tokens = lex(&text)?;
    let program = desugar::desugar(parser::parse(tokens)?);
    let mut out = Vec::new();
    Interpreter::new(&mut out).run(&program)?;
    Ok(String::from_utf8(out).expect("output is utf-8"))
}

fn run_ok(source: &str) -> String {
    match run_source(source) {
        Ok(output) => output,
        Err(error) => panic!("program failed: {error}"),
    }
}

fn run_err(source: &str) -> LumenError {
    match run_source(source) {
        Ok(output) => panic!("program unexpectedly succeeded with output {output:?}"),
        Err(error) => error,
    }
}

#[test]
fn compound_assignment_chain() {
    assert_eq!(run_ok("var x = 1; x += 2; x *= 3; println(x);"), "9\n");
}

#[test]
fn function_call_with_branching() {
    let source = "function max(a, b) { if a > b { return a; } else { return b; } } \
                  println(max(3, 7));";
    assert_eq!(run_ok(source), "7\n");
}

#[test]
fn while_loop_counts() {
    assert_eq!(
        run_ok("var i = 0; while i < 3 { print(i); i += 1; } println();"),
        "012\n"
    );
}

#[test]
fn for_loop_ascending() {
    assert_eq!(run_ok("for i 0, 3 print(i); println();"), "012\n");
}

#[test]
fn for_loop_descending() {
    assert_eq!(run_ok("for i 3, 0 print(i); println();"), "321\n");
}

#[test]
fn for_loop_empty_range() {
    assert_eq!(run_ok("for i 2, 2 print(i); println();"), "\n");
}

#[test]
fn for_loop_counter_stays_inside_the_expansion() {
    let error = run_err("for i 0, 3 { } println(i);");
    assert!(matches!(error, LumenError::SymbolNotFound { ref name, .. } if name == "i"));
}

#[test]
fn nested_for_loops() {
    assert_eq!(
        run_ok("for i 0, 2 for j 0, 2 print(i, j); println();"),
        "00011011\n"
    );
}

#[test]
fn factorial() {
    let source = "function fact(n) { var p = 1; var i = 2; while i <= n { p = p * i; i += 1; } return p; } \
                  println(fact(5));";
    assert_eq!(run_ok(source), "120\n");
}

#[test]
fn factorial_is_arbitrary_precision() {
    let source = "function fact(n) { var p = 1; var i = 2; while i <= n { p = p * i; i += 1; } return p; } \
                  println(fact(30));";
    assert_eq!(run_ok(source), "265252859812191058636308480000000\n");
}

#[test]
fn string_concatenation_and_repetition() {
    assert_eq!(run_ok("println('a' + 'b' * 3);"), "abbb\n");
}

#[test]
fn print_formats_by_kind() {
    assert_eq!(run_ok("println(true, false, 1, 'x');"), "truefalse1x\n");
    assert_eq!(run_ok("function f() { } println(f);"), "<function>\n");
    assert_eq!(run_ok("println(print);"), "<native function>\n");
}

#[test]
fn precedence_end_to_end() {
    assert_eq!(run_ok("println(1 + 2 * 3);"), "7\n");
    assert_eq!(run_ok("println(1 < 2 && 3 < 4);"), "true\n");
}

#[test]
fn assignment_is_an_expression() {
    assert_eq!(
        run_ok("var x = 0; var y = 0; x = y = 5; println(x, y);"),
        "55\n"
    );
}

#[test]
fn inner_block_variables_expire() {
    let error = run_err("{ var x = 1; } println(x);");
    assert!(matches!(error, LumenError::SymbolNotFound { ref name, .. } if name == "x"));
}

#[test]
fn inner_blocks_shadow_outer_variables() {
    assert_eq!(
        run_ok("var x = 1; { var x = 2; print(x); } print(x); println();"),
        "21\n"
    );
}

#[test]
fn functions_see_globals() {
    assert_eq!(
        run_ok("var base = 5; function f() { return base; } println(f());"),
        "5\n"
    );
}

#[test]
fn functions_do_not_see_caller_locals() {
    let source = "function f() { return hidden; } \
                  function g() { var hidden = 1; return f(); } \
                  g();";
    let error = run_err(source);
    assert!(matches!(error, LumenError::SymbolNotFound { ref name, .. } if name == "hidden"));
}

#[test]
fn functions_can_rebind_globals() {
    assert_eq!(
        run_ok("var count = 0; function bump() { count = count + 1; } bump(); bump(); println(count);"),
        "2\n"
    );
}

#[test]
fn parameters_shadow_globals() {
    assert_eq!(
        run_ok("var x = 1; function f(x) { return x; } println(f(9));"),
        "9\n"
    );
}

#[test]
fn return_unwinds_nested_control_flow() {
    let source = "function f() { var i = 0; while i < 10 { if i == 3 { return i; } i += 1; } return 0; } \
                  println(f());";
    assert_eq!(run_ok(source), "3\n");
}

#[test]
fn return_without_value_yields_void() {
    assert_eq!(run_ok("function f() { return; } println(f());"), "<void>\n");
}

#[test]
fn falling_off_a_function_yields_void() {
    assert_eq!(run_ok("function f() { } println(f());"), "<void>\n");
}

#[test]
fn recursion() {
    let source = "function fib(n) { if n < 2 { return n; } return fib(n - 1) + fib(n - 2); } \
                  println(fib(10));";
    assert_eq!(run_ok(source), "55\n");
}

#[test]
fn top_level_return_is_an_error() {
    let error = run_err("return;");
    assert_eq!(
        error.to_string(),
        "return outside of a function at line 1, character 1"
    );
}

#[test]
fn compound_assignment_matches_spelled_out_form() {
    let compound = run_ok("var x = 4; x += 3; println(x);");
    let spelled = run_ok("var x = 4; x = x + 3; println(x);");
    assert_eq!(compound, spelled);

    let compound = run_ok("var s = 'a'; s *= 3; println(s);");
    let spelled = run_ok("var s = 'a'; s = s * 3; println(s);");
    assert_eq!(compound, spelled);
}

#[test]
fn short_circuit_skips_the_right_operand() {
    // `missing` is never looked up when the left side decides the result.
    assert_eq!(run_ok("println(false && missing);"), "false\n");
    assert_eq!(run_ok("println(true || missing);"), "true\n");
}

#[test]
fn logical_operators_evaluate_both_sides_when_needed() {
    assert_eq!(run_ok("println(true && false, false || true);"), "falsetrue\n");
}

#[test]
fn logical_operators_require_bools() {
    let error = run_err("var x = 1 && true;");
    assert!(matches!(
        error,
        LumenError::TypeError {
            expected: "bool",
            got: "integer",
            ..
        }
    ));
}

#[test]
fn conditions_must_be_bools() {
    let error = run_err("if 1 { }");
    assert!(matches!(
        error,
        LumenError::TypeError {
            expected: "bool",
            got: "integer",
            ..
        }
    ));
}

#[test]
fn undefined_symbol_reports_its_position() {
    let error = run_err("println(missing);");
    assert_eq!(
        error.to_string(),
        "no such symbol 'missing' referenced at line 1, character 9"
    );
}

#[test]
fn assignment_to_undefined_symbol_fails() {
    let error = run_err("ghost = 1;");
    assert!(matches!(error, LumenError::SymbolNotFound { ref name, .. } if name == "ghost"));
}

#[test]
fn assignment_to_constant_fails() {
    let error = run_err("function f() { } f = 1;");
    assert_eq!(
        error.to_string(),
        "can't assign to constant 'f' at line 1, character 18"
    );
}

#[test]
fn natives_are_constants() {
    let error = run_err("print = 1;");
    assert!(error.to_string().starts_with("can't assign to constant 'print'"));
}

#[test]
fn bad_assignment_target() {
    let error = run_err("1 = 2;");
    assert!(error.to_string().starts_with("bad assignment target"));
}

#[test]
fn divide_by_zero_carries_the_operator_position() {
    let error = run_err("println(1 / 0);");
    assert_eq!(error.to_string(), "divide by zero at line 1, character 11");
}

#[test]
fn wrong_arity_is_an_error() {
    let error = run_err("function f(a) { } f(1, 2);");
    assert!(error.to_string().contains("'f' expects 1 arguments, got 2"));
}

#[test]
fn calling_a_non_callable_value() {
    let error = run_err("var x = 1; x();");
    assert!(error.to_string().starts_with("integer is not callable"));
}

#[test]
fn duplicate_definition_in_one_scope() {
    let error = run_err("var x = 1; var x = 2;");
    assert!(error
        .to_string()
        .starts_with("'x' is already defined in this scope"));
}

#[test]
fn string_escapes_in_output() {
    assert_eq!(run_ok(r"println('a\'b');"), "a'b\n");
    assert_eq!(run_ok(r"print('col\tumn\n');"), "col\tumn\n");
}

#[test]
fn plotting_natives() {
    assert_eq!(
        run_ok("plot_x(true); space(); plot_x(false); println();"),
        "x  \n"
    );
}

#[test]
fn plot_x_requires_a_bool() {
    let error = run_err("plot_x(1);");
    assert!(matches!(error, LumenError::TypeError { .. }));
}

#[test]
fn negative_string_repeat_fails_at_runtime() {
    let error = run_err("println('x' * -1);");
    assert!(error
        .to_string()
        .starts_with("can't repeat a string a negative number of times"));
}

#[test]
fn unary_operators_end_to_end() {
    assert_eq!(run_ok("println(-3 + +5, !false);"), "2true\n");
}
