//! Rendering error values to the console as positioned, ANSI-colored
//! diagnostics. This is the only place in the crate that knows about
//! color or the `path:line:col:` prefix — the library itself only ever
//! returns `Result`s.

use std::fmt;

use colored::Colorize;

use crate::lexer::Position;

/// Print `path:line:col: error: message`, or `path: error: message` when
/// `position` is `None` (link errors, I/O errors, load errors).
pub fn report(path: &str, position: Option<Position>, message: impl fmt::Display) {
    let label = "error:".red().bold();
    match position {
        Some(pos) => eprintln!("{path}:{pos}: {label} {message}"),
        None => eprintln!("{path}: {label} {message}"),
    }
}

/// One-line summary printed after an assembler run that accumulated one
/// or more diagnostics.
pub fn report_summary(count: usize) {
    let label = "error:".red().bold();
    let plural = if count == 1 { "" } else { "s" };
    eprintln!("{label} {count} error{plural} generated");
}
