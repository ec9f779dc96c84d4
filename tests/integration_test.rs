//! End-to-end scenarios: assemble a source string with the public
//! `pocovm::assembler::assemble` entry point, then execute the resulting
//! object with `pocovm::vm`, asserting on stdout bytes and exit behavior.

use pocovm::assembler;
use pocovm::vm::{self, ExecutionError, RuntimeError};

fn assemble_and_run(src: &str) -> (String, Result<(), ExecutionError>) {
    let object = assembler::assemble(src).expect("expected successful assembly");
    let mut out = Vec::new();
    let result = vm::load_and_run(&object, None, &mut out);
    (String::from_utf8(out).unwrap(), result)
}

#[test]
fn scenario_a_adds_two_values_popped_into_registers() {
    let (stdout, result) = assemble_and_run(
        "_start:\n  push 10\n  push 20\n  pop r0\n  pop r1\n  add r0, r1\n  print r0\n  halt\n",
    );
    assert!(result.is_ok());
    assert_eq!(stdout, "30");
}

#[test]
fn scenario_b_adds_an_immediate_to_a_register() {
    let (stdout, result) =
        assemble_and_run("_start:\n  push 5\n  pop r0\n  add r0, 37\n  print r0\n  halt\n");
    assert!(result.is_ok());
    assert_eq!(stdout, "42");
}

#[test]
fn scenario_c_jumps_to_a_forward_label() {
    let (stdout, result) =
        assemble_and_run("_start:\n  jmp tail\ntail:\n  push 7\n  pop r0\n  print r0\n  halt\n");
    assert!(result.is_ok());
    assert_eq!(stdout, "7");
}

#[test]
fn scenario_d_pop_on_empty_stack_is_a_runtime_error_with_no_output() {
    let (stdout, result) = assemble_and_run("_start:\n  pop r0\n  halt\n");
    assert_eq!(stdout, "");
    assert!(matches!(result, Err(ExecutionError::Runtime(RuntimeError::StackUnderflow { .. }))));
}

#[test]
fn scenario_e_missing_start_label_fails_to_assemble() {
    let src = "oops:\n  push 1\n  halt\n";
    let errors = assembler::assemble(src).unwrap_err();
    assert!(errors.iter().any(|e| matches!(e, assembler::Error::MissingStart)));
}

#[test]
fn scenario_f_undefined_identifier_fails_to_assemble() {
    let src = "_start:\n  push undef\n  halt\n";
    let errors = assembler::assemble(src).unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, assembler::Error::UndefinedIdentifier { name, .. } if name == "undef")));
}

#[test]
fn label_round_trip_jmp_and_push_both_see_the_pass_one_address() {
    let src = "_start:\n  jmp dest\n  push dest\ndest:\n  halt\n";
    let object = assembler::assemble(src).unwrap();

    // dest is the third statement; the first two (`jmp dest`, `push dest`)
    // are 10 bytes each (opcode + descriptor + 8-byte immediate).
    let header_size = 24;
    let dest_pc = (header_size + 10 + 10) as u64;

    let jmp_immediate = u64::from_le_bytes(object[header_size + 2..header_size + 10].try_into().unwrap());
    let push_immediate =
        u64::from_le_bytes(object[header_size + 12..header_size + 20].try_into().unwrap());
    assert_eq!(jmp_immediate, dest_pc);
    assert_eq!(push_immediate, dest_pc);
}

#[test]
fn write_object_file_round_trips_through_a_temp_file_and_rename() {
    use std::fs;

    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("prog.asm");
    let output_path = dir.path().join("prog.pob");
    fs::write(&input_path, "_start:\n  push 1\n  pop r0\n  print r0\n  halt\n").unwrap();

    let object = assembler::assemble_from_file(&input_path).unwrap();
    assembler::write_object_file(&input_path, &output_path, &object).unwrap();

    let written = fs::read(&output_path).unwrap();
    assert_eq!(written, object);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::metadata(&output_path).unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o755);
    }
}
