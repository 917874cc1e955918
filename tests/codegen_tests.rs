use jackc::{compile, CompileError};

fn lines(output: &str) -> Vec<&str> {
    output.lines().collect()
}

fn compile_function(body: &str) -> String {
    compile(&format!("class Main {{ function int f() {{ {} }} }}", body)).unwrap()
}

/// Net number of values an instruction sequence leaves on the stack.
fn stack_effect(code: &[&str]) -> i64 {
    code.iter()
        .map(|line| {
            let parts: Vec<_> = line.split_whitespace().collect();
            match parts[0] {
                "push" => 1,
                "pop" => -1,
                "add" | "sub" | "eq" | "gt" | "lt" | "and" | "or" => -1,
                "neg" | "not" => 0,
                "call" => 1 - parts[2].parse::<i64>().unwrap(),
                other => panic!("unexpected instruction {other}"),
            }
        })
        .sum()
}

#[test]
fn array_assignment_order() {
    let source = "
class Main {
    field int a, b;
    field Array arr;

    method void set() {
        var int i;
        let arr[i] = 5;
        return;
    }
}";
    let output = compile(source).unwrap();
    assert_eq!(
        lines(&output),
        vec![
            "function Main.set 1",
            "push argument 0",
            "pop pointer 0",
            "push local 0",
            "push constant 5",
            "push this 2",
            "add",
            "pop pointer 1",
            "pop that 0",
            "return",
        ]
    );
}

#[test]
fn array_read() {
    let output = compile_function("var Array a; return a[2];");
    assert_eq!(
        lines(&output),
        vec![
            "function Main.f 1",
            "push local 0",
            "push constant 2",
            "add",
            "pop pointer 1",
            "push that 0",
            "return",
        ]
    );
}

#[test]
fn constructor_without_fields_allocates_one_word() {
    let output = compile("class Empty { constructor Empty new() { return this; } }").unwrap();
    assert_eq!(
        lines(&output),
        vec![
            "function Empty.new 0",
            "push constant 1",
            "call Memory.alloc 1",
            "pop pointer 0",
            "push pointer 0",
            "return",
        ]
    );
}

#[test]
fn constructor_allocates_fields() {
    let source = "
class Point {
    field int x, y;
    static int count;
    constructor Point new(int ax, int ay) {
        let x = ax;
        let y = ay;
        return this;
    }
}";
    let output = compile(source).unwrap();
    assert_eq!(
        lines(&output),
        vec![
            "function Point.new 0",
            "push constant 2",
            "call Memory.alloc 1",
            "pop pointer 0",
            "push argument 0",
            "pop this 0",
            "push argument 1",
            "pop this 1",
            "push pointer 0",
            "return",
        ]
    );
}

#[test]
fn method_arguments_start_at_one() {
    let source = "class Point { field int x; method int plus(int d) { return x + d; } }";
    let output = compile(source).unwrap();
    assert_eq!(
        lines(&output),
        vec![
            "function Point.plus 0",
            "push argument 0",
            "pop pointer 0",
            "push this 0",
            "push argument 1",
            "add",
            "return",
        ]
    );
}

#[test]
fn sibling_ifs_never_reuse_labels() {
    let source = "
class Main {
    function void f() {
        if (true) { return; } else { return; }
        if (false) { return; } else { return; }
    }
}";
    let output = compile(source).unwrap();
    assert_eq!(
        lines(&output),
        vec![
            "function Main.f 0",
            "push constant 0",
            "not",
            "not",
            "if-goto f$0",
            "return",
            "goto f$1",
            "label f$0",
            "return",
            "label f$1",
            "push constant 0",
            "not",
            "if-goto f$2",
            "return",
            "goto f$3",
            "label f$2",
            "return",
            "label f$3",
        ]
    );
}

#[test]
fn labels_restart_per_subroutine_and_nest_in_order() {
    let source = "
class Main {
    function void a() {
        var int i;
        while (i < 3) {
            if (i = 1) { let i = 2; }
            let i = i + 1;
        }
        return;
    }
    function void b() {
        while (false) { }
        return;
    }
}";
    let output = compile(source).unwrap();
    let labels: Vec<_> = output
        .lines()
        .filter(|l| l.starts_with("label "))
        .collect();
    assert_eq!(
        labels,
        vec!["label a$0", "label a$2", "label a$1", "label b$0", "label b$1"]
    );
    assert!(output.contains("if-goto a$2\npush constant 2\npop local 0\nlabel a$2\n"));
    assert!(output.contains("goto a$0\nlabel a$1\n"));
}

#[test]
fn if_without_else_uses_one_label() {
    let output = compile_function("var int x; if (x) { let x = 1; } return x;");
    assert_eq!(
        lines(&output),
        vec![
            "function Main.f 1",
            "push local 0",
            "not",
            "if-goto f$0",
            "push constant 1",
            "pop local 0",
            "label f$0",
            "push local 0",
            "return",
        ]
    );
}

#[test]
fn expressions_evaluate_left_to_right() {
    let output = compile_function("return 1 + 2 * 3;");
    assert_eq!(
        lines(&output),
        vec![
            "function Main.f 0",
            "push constant 1",
            "push constant 2",
            "add",
            "push constant 3",
            "call Math.multiply 2",
            "return",
        ]
    );
}

#[test]
fn operators_and_constants() {
    let output = compile_function(
        "var int a, b; return (-a / b) | ~(a > b) & (a = null) - false;",
    );
    let code = lines(&output);
    assert_eq!(
        &code[1..code.len() - 1],
        &[
            "push local 0",
            "neg",
            "push local 1",
            "call Math.divide 2",
            "push local 0",
            "push local 1",
            "gt",
            "not",
            "or",
            "push local 0",
            "push constant 0",
            "eq",
            "and",
            "push constant 0",
            "sub",
        ]
    );
}

#[test]
fn every_expression_leaves_one_value() {
    let cases = [
        "1",
        "x + 2 * y",
        "a[x] - Math.max(x, y)",
        "-(x < y) & ~true",
        "\"text\"",
        "Keyboard.readInt(\"n?\") + a[a[1]]",
        "this = null",
    ];
    for expr in cases {
        let source = format!(
            "class Main {{ field Array a; method int f(int x, int y) {{ return {}; }} }}",
            expr
        );
        let output = compile(&source).unwrap();
        let code = lines(&output);
        // Skip the header and the receiver setup, drop the final `return`.
        let body = &code[3..code.len() - 1];
        assert_eq!(stack_effect(body), 1, "expression {expr}");
    }
}

#[test]
fn string_literal_builds_string() {
    let output = compile_function("return \"Hi\";");
    assert_eq!(
        lines(&output),
        vec![
            "function Main.f 0",
            "push constant 2",
            "call String.new 1",
            "push constant 72",
            "call String.appendChar 2",
            "push constant 105",
            "call String.appendChar 2",
            "return",
        ]
    );
}

#[test]
fn call_resolution() {
    let source = "
class Main {
    field Point p;
    method void run() {
        var Ball b;
        do b.bounce(1);
        do p.move();
        do Output.println();
        do draw(2);
        let b = helper();
        return;
    }
}";
    let output = compile(source).unwrap();
    assert_eq!(
        lines(&output),
        vec![
            "function Main.run 1",
            "push argument 0",
            "pop pointer 0",
            "push local 0",
            "push constant 1",
            "call Ball.bounce 2",
            "push this 0",
            "call Point.move 1",
            "call Output.println 0",
            "push pointer 0",
            "push constant 2",
            "call Main.draw 2",
            "push pointer 0",
            "call Main.helper 1",
            "pop local 0",
            "return",
        ]
    );
}

#[test]
fn static_variables() {
    let source = "class Counter { static int n; function void bump() { let n = n + 1; return; } }";
    let output = compile(source).unwrap();
    assert_eq!(
        lines(&output),
        vec![
            "function Counter.bump 0",
            "push static 0",
            "push constant 1",
            "add",
            "pop static 0",
            "return",
        ]
    );
}

#[test]
fn unknown_variable_fails() {
    let err = compile("class Main { function void f() { let y = 1; return; } }").unwrap_err();
    assert!(matches!(
        err,
        CompileError::UnknownSymbol { ref name, ref subroutine } if name == "y" && subroutine == "Main.f"
    ));
}

#[test]
fn duplicate_local_fails() {
    let err = compile("class Main { function void f() { var int a; var char a; return; } }")
        .unwrap_err();
    assert!(matches!(err, CompileError::DuplicateSymbol { .. }));
}

#[test]
fn locals_are_scoped_to_their_subroutine() {
    let source = "
class Main {
    function void f() { var int t; let t = 1; return; }
    function void g() { let t = 2; return; }
}";
    let err = compile(source).unwrap_err();
    assert!(matches!(err, CompileError::UnknownSymbol { ref subroutine, .. } if subroutine == "Main.g"));
}

#[test]
fn unrepresentable_strings_fail() {
    let err = compile("class Main { function void f() { do Output.printString(\"\u{1F600}\"); return; } }")
        .unwrap_err();
    assert!(matches!(err, CompileError::InvalidStringCharacter { .. }));

    let source = format!(
        "class Main {{ function void f() {{ do Output.printString(\"{}\"); return; }} }}",
        "x".repeat(40000)
    );
    assert!(matches!(
        compile(&source).unwrap_err(),
        CompileError::StringTooLong { .. }
    ));
}

#[test]
fn unclosed_comment_after_class_fails() {
    let err = compile("class Main { function void f() { return; } }\n/* never closed\n").unwrap_err();
    assert!(matches!(err, CompileError::UnterminatedComment { line: 2 }));
}
