use std::{path::PathBuf, process};

use structopt::StructOpt;

use tinylisp::{
    common::{Program, Source},
    compiler,
    vm::VM,
};

/// The TinyLisp toolchain: compile s-expressions to stack-machine
/// bytecode, or run a compiled bytecode file.
#[derive(StructOpt, Debug)]
#[structopt(name = "tinylisp", bin_name = "tinylisp", about)]
enum TinyLisp {
    /// Compiles TinyLisp source to bytecode text on stdout
    Compile {
        /// Source file; stdin when omitted
        input: Option<PathBuf>,
    },
    /// Loads and runs a compiled bytecode file
    Run {
        /// The bytecode file to execute
        bytecode: PathBuf,
        /// Optional TinyLisp source file returned by the read-all primitive
        source: Option<PathBuf>,
    },
}

fn main() {
    let result = match TinyLisp::from_args() {
        TinyLisp::Compile { input } => compile(input),
        TinyLisp::Run { bytecode, source } => run(bytecode, source),
    };

    // report any errors
    if let Err(error) = result {
        eprintln!("{}", error);
        process::exit(1);
    }
}

fn compile(input: Option<PathBuf>) -> Result<(), String> {
    let source = match input {
        Some(path) => Source::path(&path),
        None => Source::stdin(),
    }
    .map_err(|_| "Error: source could not be read".to_string())?;

    let program = compiler::gen(source).map_err(|e| e.to_string())?;
    print!("{}", program);
    Ok(())
}

fn run(bytecode: PathBuf, source: Option<PathBuf>) -> Result<(), String> {
    let text = Source::path(&bytecode)
        .map_err(|_| "Error: bytecode file could not be read".to_string())?;
    let program =
        Program::parse(&text.contents).map_err(|e| e.to_string())?;

    let input = match source {
        Some(path) => Source::path(&path)
            .map_err(|_| "Error: source file could not be read".to_string())?
            .contents
            .clone(),
        None => String::new(),
    };

    let mut vm = VM::init(program).with_input(&input);
    vm.run().map_err(|e| e.to_string())?;

    // a self-hosted compiler run leaves its bytecode in the emit
    // channel; flush it only once the program finished cleanly
    let emitted = vm.emitted();
    if !emitted.is_empty() {
        println!("{}", emitted.join("\n"));
    }
    Ok(())
}
