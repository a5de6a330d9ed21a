//! The self-hosting checks: the TinyLisp-in-TinyLisp compiler under
//! `demos/` must agree with the host compiler, byte for byte.

use tinylisp::{compiler, Program, Source, VM};

const COMPILER_TL: &str = include_str!("../demos/compiler.tl");

/// Host-compiles a source and renders the bytecode lines.
fn host_lines(source: &str) -> Vec<String> {
    compiler::gen(Source::source(source))
        .expect("host compilation failed")
        .insts()
        .iter()
        .map(|inst| format!("{}", inst))
        .collect()
}

/// Runs the host-compiled self-hosted compiler over `input`,
/// returning the bytecode lines it emits.
fn selfhost_lines(input: &str) -> Vec<String> {
    let program = compiler::gen(Source::source(COMPILER_TL))
        .expect("compiler.tl does not compile");

    let mut vm = VM::with_output(program, Vec::new()).with_input(input);
    vm.run().expect("compiler.tl crashed");
    vm.emitted().to_vec()
}

/// Compile the self-hosted compiler with the host compiler to get
/// bytecode B; run B over the self-hosted compiler's own source; the
/// result must be B again.
#[test]
fn fixpoint_on_its_own_source() {
    let b = host_lines(COMPILER_TL);
    assert_eq!(selfhost_lines(COMPILER_TL), b);
}

/// The generations agree further out, too: the bytecode emitted by the
/// first self-hosted run compiles the compiler to the same bytecode.
#[test]
fn second_generation_is_stable() {
    let b = selfhost_lines(COMPILER_TL);

    let program = Program::parse(&b.join("\n"))
        .expect("self-hosted bytecode does not load");
    let mut vm =
        VM::with_output(program, Vec::new()).with_input(COMPILER_TL);
    vm.run().expect("second-generation compiler crashed");

    assert_eq!(vm.emitted(), b.as_slice());
}

/// On ordinary programs the two compilers are indistinguishable.
#[test]
fn matches_the_host_on_other_programs() {
    let sources = [
        "(print (+ 1 2))",
        r#"(let x 10) (let y 0) (while (< y x) (begin (print y) (let y (+ y 1))))"#,
        "(define (fact n) (if (== n 0) 1 (* n (fact (- n 1))))) (print (fact 5))",
        r#"(print (str-cat "a \"quote\"" (to-str 3)))"#,
        "(begin) ()",
    ];

    for source in sources {
        assert_eq!(
            selfhost_lines(source),
            host_lines(source),
            "compilers disagree on: {}",
            source,
        );
    }
}

/// And its output actually runs: factorial through the self-hosted
/// compiler still prints 120.
#[test]
fn self_hosted_output_executes() {
    let source =
        "(define (fact n) (if (== n 0) 1 (* n (fact (- n 1))))) (print (fact 5))";
    let bytecode = selfhost_lines(source).join("\n");

    let program =
        Program::parse(&bytecode).expect("emitted bytecode does not load");
    let mut vm = VM::with_output(program, Vec::new());
    vm.run().expect("emitted bytecode crashed");

    assert_eq!(
        String::from_utf8(vm.into_output()).expect("PRINT writes UTF-8"),
        "120\n",
    );
}
