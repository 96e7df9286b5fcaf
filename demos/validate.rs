//! Minimal smoke-test CLI: loads every script file named on the command
//! line into one `Compiler` instance, compiles them as one translation
//! unit, and prints a summary. Not part of the library's public contract —
//! grounded in the teacher pack's `validator-cpp.cpp`/`main.cpp` reference
//! tools, kept just as bare.

use std::process::ExitCode;

use scriptc::{CompileTarget, Compiler};

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        println!("Usage: {} <script1.hsc> [script2.hsc ...]", args[0]);
        return ExitCode::FAILURE;
    }

    let mut compiler = Compiler::new(CompileTarget::Any);
    compiler.set_warn_callback(|message, file, line, column| {
        eprintln!("{file}:{line}:{column}: warning: {message}");
    });

    for path in &args[1..] {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                println!("can't open {path}: {e}");
                return ExitCode::FAILURE;
            }
        };
        if let Err(e) = compiler.load_source(&bytes, path) {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    }

    if let Err(e) = compiler.compile() {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    println!("Scripts: {}", compiler.scripts().len());
    println!("Globals: {}", compiler.globals().len());
    println!("Nodes: {}", compiler.nodes().len());

    ExitCode::SUCCESS
}
