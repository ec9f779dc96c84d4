//! `run <object> [<limit>]` — load a pocovm object file and execute it.
//! A thin front-end over [`pocovm::vm`]: parse `argv`, load the file,
//! drive the interpreter, map its `Result` to a process exit code.

use std::env;
use std::fs;
use std::io;
use std::process::ExitCode;

use pocovm::logging;
use pocovm::vm::{self, LoadError};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("usage: {} <object.pob> [limit]", args[0]);
        return ExitCode::from(1);
    }

    let object_path = &args[1];

    // A negative limit means unbounded, matching the CLI contract; it has
    // nothing to do with the interpreter's own `Option<u64>` budget type.
    let limit = match args.get(2) {
        None => None,
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) if n < 0 => None,
            Ok(n) => Some(n as u64),
            Err(_) => {
                logging::report(object_path, None, format!("invalid instruction limit '{raw}'"));
                return ExitCode::from(1);
            }
        },
    };

    let metadata = match fs::metadata(object_path) {
        Ok(m) => m,
        Err(e) => {
            logging::report(object_path, None, format!("cannot open object file: {e}"));
            return ExitCode::from(1);
        }
    };
    if !metadata.is_file() {
        logging::report(object_path, None, "not a regular file");
        return exit_code(LoadError::NotARegularFile.exit_code());
    }

    let bytes = match fs::read(object_path) {
        Ok(b) => b,
        Err(e) => {
            logging::report(object_path, None, format!("cannot read object file: {e}"));
            return ExitCode::from(1);
        }
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match vm::load_and_run(&bytes, limit, &mut handle) {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            logging::report(object_path, None, &e);
            exit_code(e.exit_code())
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(code.clamp(0, 255) as u8)
}
