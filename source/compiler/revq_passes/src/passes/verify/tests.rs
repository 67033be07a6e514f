// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use expect_test::expect;
use revq_cir::cir::{BinOp, Ty};
use revq_dialect::dialect::{Instruction, Program, Register, RegisterId};

use super::{verify, verify_all};
use crate::Error;

fn int(id: u32, version: u32) -> Register {
    Register {
        version,
        ..Register::new(RegisterId(id), Ty::Integer)
    }
}

fn malformed() -> Program {
    Program::new(
        "main".into(),
        vec![
            Instruction::Init(1, int(0, 0)),
            Instruction::Init(2, int(1, 0)),
            Instruction::Binary(BinOp::Add, int(0, 0), int(1, 0), int(1, 1)),
            Instruction::BinaryImm(BinOp::Mul, int(0, 0), 3, int(0, 2)),
            Instruction::Return(int(0, 2)),
        ],
    )
}

#[test]
fn well_formed_program_verifies() {
    let program = Program::new(
        "main".into(),
        vec![
            Instruction::Init(1, int(0, 0)),
            Instruction::Init(2, int(1, 0)),
            Instruction::Binary(BinOp::Add, int(0, 0), int(1, 0), int(0, 1)),
            Instruction::BinaryImm(BinOp::Mul, int(0, 1), 3, int(0, 2).with_path(1)),
            Instruction::Return(int(0, 2).with_path(1)),
        ],
    );
    assert_eq!(verify(&program), Ok(()));
    assert!(verify_all(&program).is_empty());
}

#[test]
fn result_in_wrong_register_is_reported_at_its_instruction() {
    let error = verify(&malformed()).expect_err("verification should fail");
    let Error::Verification {
        index,
        expected,
        actual,
        ..
    } = &error
    else {
        panic!("expected a verification error, got {error:?}");
    };
    assert_eq!(*index, 2);
    assert_eq!(*expected, int(0, 1));
    assert_eq!(*actual, int(1, 1));
    expect!["instruction 2 `%r1.v1 = add %r0.v0, %r1.v0` writes %r1.v1 but must write %r0.v1"]
        .assert_eq(&error.to_string());
}

#[test]
fn verify_all_reports_every_violation() {
    let indices = verify_all(&malformed())
        .iter()
        .map(|error| match error {
            Error::Verification { index, .. } => *index,
            _ => panic!("expected a verification error, got {error:?}"),
        })
        .collect::<Vec<_>>();
    assert_eq!(indices, vec![2, 3]);
}
