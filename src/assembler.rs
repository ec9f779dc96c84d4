//! Two-pass assembler: pass 1 resolves label addresses against a virtual
//! program counter, pass 2 re-walks the same source and emits real bytes.
//!
//! Unlike the interpreter, the assembler never aborts on the first error —
//! it accumulates diagnostics across the whole source and only refuses to
//! produce output once the walk is done, so a single run surfaces as many
//! mistakes as possible.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use crate::emitter::Emitter;
use crate::instruction::{self, OperandType};
use crate::lexer::{LexError, Lexer, Position, TokenKind};
use crate::object::{Header, HEADER_SIZE};
use crate::symbol::{LabelPayload, Symbol, SymbolKind, SymbolTable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Lex(LexError),
    UnknownMnemonic { text: String, pos: Position },
    DuplicateLabel { name: String, pos: Position },
    UndefinedIdentifier { name: String, pos: Position },
    MissingStart,
}

impl Error {
    pub fn position(&self) -> Option<Position> {
        match self {
            Error::Lex(e) => Some(e.pos),
            Error::UnknownMnemonic { pos, .. } => Some(*pos),
            Error::DuplicateLabel { pos, .. } => Some(*pos),
            Error::UndefinedIdentifier { pos, .. } => Some(*pos),
            Error::MissingStart => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Lex(e) => write!(f, "{}", e.message),
            Error::UnknownMnemonic { text, .. } => write!(f, "unknown mnemonic '{text}'"),
            Error::DuplicateLabel { name, .. } => write!(f, "label '{name}' defined more than once"),
            Error::UndefinedIdentifier { name, .. } => write!(f, "identifier '{name}' is not defined"),
            Error::MissingStart => write!(f, "no '_start' label defined"),
        }
    }
}

impl std::error::Error for Error {}

fn operand_width(kind: &TokenKind) -> Option<(OperandType, u64)> {
    match kind {
        TokenKind::Register(_) => Some((OperandType::Register, 1)),
        TokenKind::Integer(_) | TokenKind::Identifier(_) => Some((OperandType::Immediate, 8)),
        _ => None,
    }
}

/// Pass 1: walk the source once, recording every label's address and
/// validating that every instruction's operand shapes make sense. Produces
/// nothing but the filled-in symbol table, the final code size, and errors.
fn first_pass(src: &str) -> (SymbolTable, u64, Vec<Error>) {
    let mut symbols = SymbolTable::new();
    let mut errors = Vec::new();
    let mut lex_errors = Vec::new();
    let mut lexer = Lexer::new(src);
    let mut pc: u64 = HEADER_SIZE as u64;

    loop {
        let tok = lexer.next(&mut lex_errors);
        match tok.kind {
            TokenKind::EndOfInput => break,
            TokenKind::Illegal => {}
            TokenKind::Label(name) => {
                let symbol = Symbol {
                    name: name.to_string(),
                    kind: SymbolKind::Label,
                    payload: LabelPayload { program_counter: pc, is_defined: true },
                };
                if symbols.push(symbol).is_err() {
                    errors.push(Error::DuplicateLabel { name: name.to_string(), pos: tok.pos });
                }
            }
            TokenKind::Identifier(name) => {
                if let Some(def) = instruction::lookup(name) {
                    pc += 2;
                    for _ in 0..def.arity {
                        let operand = lexer.next(&mut lex_errors);
                        match operand_width(&operand.kind) {
                            Some((_, width)) => pc += width,
                            None => {
                                errors.push(Error::UnknownMnemonic {
                                    text: format!("invalid operand for '{name}'"),
                                    pos: operand.pos,
                                });
                                lexer.consume_until_newline();
                                break;
                            }
                        }
                    }
                } else {
                    // Forward label reference used bare at statement position:
                    // emitted as a raw 8-byte immediate by pass 2.
                    pc += 8;
                }
            }
            TokenKind::Integer(_) | TokenKind::Register(_) => {
                errors.push(Error::UnknownMnemonic {
                    text: "unexpected literal in statement position".to_string(),
                    pos: tok.pos,
                });
                lexer.consume_until_newline();
            }
        }
    }

    errors.extend(lex_errors.into_iter().map(Error::Lex));
    (symbols, pc, errors)
}

/// Pass 2: re-walk the source with a fresh lexer, this time actually
/// emitting bytes. Lexical errors are necessarily identical to pass 1's
/// and so are discarded here to avoid reporting them twice.
fn second_pass(src: &str, symbols: &SymbolTable) -> (Emitter, Vec<Error>) {
    let mut emitter = Emitter::new();
    let mut errors = Vec::new();
    let mut lex_errors = Vec::new();
    let mut lexer = Lexer::new(src);

    loop {
        let tok = lexer.next(&mut lex_errors);
        match tok.kind {
            TokenKind::EndOfInput => break,
            TokenKind::Illegal => {}
            TokenKind::Label(_) => {}
            TokenKind::Identifier(name) => {
                if let Some(def) = instruction::lookup(name) {
                    let mut operands = Vec::with_capacity(def.arity);
                    for _ in 0..def.arity {
                        operands.push(lexer.next(&mut lex_errors));
                    }

                    let descriptor = operands.iter().enumerate().fold(0u8, |acc, (i, op)| {
                        let ty = operand_width(&op.kind).map(|(t, _)| t).unwrap_or(OperandType::None);
                        acc | (ty.as_nibble() << (i * 4))
                    });

                    emitter.write_u8(def.opcode);
                    emitter.write_u8(descriptor);
                    for op in &operands {
                        emit_operand(&mut emitter, op.kind, op.pos, symbols, &mut errors);
                    }
                } else {
                    emit_label_reference(&mut emitter, name, tok.pos, symbols, &mut errors);
                }
            }
            TokenKind::Integer(_) | TokenKind::Register(_) => {
                lexer.consume_until_newline();
            }
        }
    }

    (emitter, errors)
}

fn emit_operand(
    emitter: &mut Emitter,
    kind: TokenKind,
    pos: Position,
    symbols: &SymbolTable,
    errors: &mut Vec<Error>,
) {
    match kind {
        TokenKind::Register(idx) => emitter.write_u8(idx),
        TokenKind::Integer(value) => emitter.write_u64(value as u64),
        TokenKind::Identifier(name) => emit_label_reference(emitter, name, pos, symbols, errors),
        _ => {}
    }
}

fn emit_label_reference(
    emitter: &mut Emitter,
    name: &str,
    pos: Position,
    symbols: &SymbolTable,
    errors: &mut Vec<Error>,
) {
    match symbols.find(SymbolKind::Label, name) {
        Some(symbol) if symbol.payload.is_defined => {
            emitter.write_u64(symbol.payload.program_counter);
        }
        _ => {
            errors.push(Error::UndefinedIdentifier { name: name.to_string(), pos });
            emitter.write_u64(0);
        }
    }
}

/// Assemble `src` into a complete object file (header and code region).
/// Returns every accumulated diagnostic on failure; a source with no
/// `_start` label fails with `MissingStart` even if everything else parsed.
pub fn assemble(src: &str) -> Result<Vec<u8>, Vec<Error>> {
    let (symbols, _pc_at_end, mut errors) = first_pass(src);
    let (emitter, pass2_errors) = second_pass(src, &symbols);
    errors.extend(pass2_errors);

    let entry_point = symbols.find(SymbolKind::Label, "_start").map(|s| s.payload.program_counter);

    match entry_point {
        Some(entry_point) if errors.is_empty() => {
            let code = emitter.into_bytes();
            let header = Header::new(entry_point, code.len() as u64);
            let mut object = Vec::with_capacity(HEADER_SIZE + code.len());
            object.extend_from_slice(&header.encode());
            object.extend_from_slice(&code);
            Ok(object)
        }
        Some(_) => Err(errors),
        None => {
            errors.push(Error::MissingStart);
            Err(errors)
        }
    }
}

pub fn assemble_from_file(path: impl AsRef<Path>) -> Result<Vec<u8>, AssembleFileError> {
    let src = fs::read_to_string(path).map_err(AssembleFileError::Io)?;
    assemble(&src).map_err(AssembleFileError::Assembly)
}

#[derive(Debug)]
pub enum AssembleFileError {
    Io(io::Error),
    Assembly(Vec<Error>),
}

impl fmt::Display for AssembleFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssembleFileError::Io(e) => write!(f, "{e}"),
            AssembleFileError::Assembly(errors) => write!(f, "{} error(s) while assembling", errors.len()),
        }
    }
}

impl std::error::Error for AssembleFileError {}

/// Return a stable identifier for `input_path`, used only to key the
/// temporary file so two concurrent assemblies of different inputs never
/// collide. On Unix this is the input's inode number; elsewhere (no portable
/// equivalent to `ino()`) it falls back to the current process id.
#[cfg(unix)]
fn temp_file_key(input_path: &Path) -> u64 {
    use std::os::unix::fs::MetadataExt;
    fs::metadata(input_path).map(|m| m.ino()).unwrap_or(0)
}

#[cfg(not(unix))]
fn temp_file_key(_input_path: &Path) -> u64 {
    std::process::id() as u64
}

/// Mark `path` executable. On Unix this sets the `0o755` permission bits;
/// non-Unix targets have no portable executable bit, so this is a no-op
/// there (the file is still valid and readable by `vm::load`).
#[cfg(unix)]
fn mark_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Write an assembled object to `output_path`, going through a temporary
/// file keyed by [`temp_file_key`] so a reader never observes a partially
/// written object, then mark the result executable.
pub fn write_object_file(input_path: &Path, output_path: &Path, bytes: &[u8]) -> io::Result<()> {
    let key = temp_file_key(input_path);
    let tmp_path = output_path.with_extension(format!("tmp{key}"));

    let result = (|| {
        fs::write(&tmp_path, bytes)?;
        mark_executable(&tmp_path)?;
        fs::rename(&tmp_path, output_path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}
