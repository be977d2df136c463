// SWR - swr-runtime
// Module: Constant Expressions
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Evaluation of constant expressions: global initialisers and data segment
//! offsets.

use swr_decoder::{instructions::NumericOp, Expression, Instruction};
use swr_error::{kinds, Error, Result};

use crate::values::Value;

/// Evaluate `expr` with `globals` as the values of the globals defined so far.
///
/// Accepts `*.const`, `global.get`, `ref.null`, `ref.func` and the extended
/// constant integer `add`/`sub`/`mul`. The expression must leave exactly one
/// value.
pub fn evaluate(expr: &Expression, globals: &[Value]) -> Result<Value> {
    let mut stack: Vec<Value> = Vec::with_capacity(2);

    for instruction in expr.iter() {
        let value = match instruction {
            Instruction::I32Const(v) => Value::I32(*v),
            Instruction::I64Const(v) => Value::I64(*v),
            Instruction::F32Const(v) => Value::F32(v.value()),
            Instruction::F64Const(v) => Value::F64(v.value()),
            Instruction::GlobalGet(index) => *globals
                .get(*index as usize)
                .ok_or_else(|| kinds::invalid_index("global", *index))?,
            Instruction::RefNull(ty) => Value::default_for(*ty)
                .filter(|v| matches!(v, Value::FuncRef(_) | Value::ExternRef(_)))
                .ok_or_else(|| kinds::type_mismatch("reference type", ty.name()))?,
            Instruction::RefFunc(index) => Value::FuncRef(Some(*index)),
            Instruction::Numeric(op) => {
                let rhs = pop(&mut stack)?;
                let lhs = pop(&mut stack)?;
                binary(*op, lhs, rhs)?
            }
            other => return Err(kinds::non_constant_expression(&format!("{other:?}"))),
        };
        stack.push(value);
    }

    match stack.as_slice() {
        [value] => Ok(*value),
        _ => Err(Error::type_error(format!(
            "constant expression leaves {} values, expected 1",
            stack.len()
        ))),
    }
}

fn pop(stack: &mut Vec<Value>) -> Result<Value> {
    stack
        .pop()
        .ok_or_else(|| Error::type_error("constant expression operand stack underflow"))
}

fn binary(op: NumericOp, lhs: Value, rhs: Value) -> Result<Value> {
    let value = match (op, lhs, rhs) {
        (NumericOp::I32Add, Value::I32(a), Value::I32(b)) => Value::I32(a.wrapping_add(b)),
        (NumericOp::I32Sub, Value::I32(a), Value::I32(b)) => Value::I32(a.wrapping_sub(b)),
        (NumericOp::I32Mul, Value::I32(a), Value::I32(b)) => Value::I32(a.wrapping_mul(b)),
        (NumericOp::I64Add, Value::I64(a), Value::I64(b)) => Value::I64(a.wrapping_add(b)),
        (NumericOp::I64Sub, Value::I64(a), Value::I64(b)) => Value::I64(a.wrapping_sub(b)),
        (NumericOp::I64Mul, Value::I64(a), Value::I64(b)) => Value::I64(a.wrapping_mul(b)),
        (
            NumericOp::I32Add
            | NumericOp::I32Sub
            | NumericOp::I32Mul
            | NumericOp::I64Add
            | NumericOp::I64Sub
            | NumericOp::I64Mul,
            _,
            _,
        ) => {
            return Err(kinds::type_mismatch(
                op.mnemonic(),
                &format!("({}, {})", lhs.value_type(), rhs.value_type()),
            ))
        }
        _ => return Err(kinds::non_constant_expression(op.mnemonic())),
    };
    Ok(value)
}
