//! `assemble <input> [<output>]` — translate assembly source into a pocovm
//! object file. A thin front-end: parse `argv`, call into the library,
//! map `Result`s to process exit codes and stderr diagnostics.

use std::env;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use pocovm::assembler;
use pocovm::logging;

const DEFAULT_OUTPUT: &str = "out.pob";

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("usage: {} <input.asm> [output.pob]", args[0]);
        return ExitCode::from(1);
    }

    let input_path = Path::new(&args[1]);
    let output_path = args
        .get(2)
        .map(Path::new)
        .unwrap_or_else(|| Path::new(DEFAULT_OUTPUT));

    let src = match fs::read_to_string(input_path) {
        Ok(src) => src,
        Err(e) => {
            logging::report(&args[1], None, format!("cannot read input file: {e}"));
            return ExitCode::from(1);
        }
    };

    match assembler::assemble(&src) {
        Ok(bytes) => match assembler::write_object_file(input_path, output_path, &bytes) {
            Ok(()) => ExitCode::from(0),
            Err(e) => {
                logging::report(&args[1], None, format!("cannot write output file: {e}"));
                ExitCode::from(1)
            }
        },
        Err(errors) => {
            for err in &errors {
                logging::report(&args[1], err.position(), err);
            }
            logging::report_summary(errors.len());
            ExitCode::from(1)
        }
    }
}
