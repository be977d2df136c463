// SWR - swr-runtime
// Module: WebAssembly Values
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Runtime values and their mapping onto host types.
//!
//! Each numeric WebAssembly type maps onto exactly one host type with the
//! same width and bit pattern. There is no widening between 32 and 64 bits.

use std::fmt;

use swr_error::{kinds, Result};
use swr_format::types::ValueType;

/// A WebAssembly runtime value
#[derive(Debug, Clone, Copy)]
pub enum Value {
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
    /// Function reference, `None` for null
    FuncRef(Option<u32>),
    /// External reference, `None` for null
    ExternRef(Option<u32>),
}

// Floats compare by bit pattern so that NaN payloads survive round trips
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            (Value::FuncRef(a), Value::FuncRef(b)) => a == b,
            (Value::ExternRef(a), Value::ExternRef(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Value {
    /// Zero value of `value_type`, or `None` for types without a host value.
    #[must_use]
    pub fn default_for(value_type: ValueType) -> Option<Self> {
        match value_type {
            ValueType::I32 => Some(Value::I32(0)),
            ValueType::I64 => Some(Value::I64(0)),
            ValueType::F32 => Some(Value::F32(0.0)),
            ValueType::F64 => Some(Value::F64(0.0)),
            ValueType::FuncRef => Some(Value::FuncRef(None)),
            ValueType::ExternRef => Some(Value::ExternRef(None)),
            ValueType::V128 => None,
        }
    }

    /// Type of this value.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
            Value::FuncRef(_) => ValueType::FuncRef,
            Value::ExternRef(_) => ValueType::ExternRef,
        }
    }

    /// The value as `i32`, if it is one.
    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as `i64`, if it is one.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as `f32`, if it is one.
    #[must_use]
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::F32(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as `f64`, if it is one.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I32(v) => write!(f, "i32:{v}"),
            Value::I64(v) => write!(f, "i64:{v}"),
            Value::F32(v) => write!(f, "f32:{v}"),
            Value::F64(v) => write!(f, "f64:{v}"),
            Value::FuncRef(Some(index)) => write!(f, "funcref:{index}"),
            Value::ExternRef(Some(index)) => write!(f, "externref:{index}"),
            Value::FuncRef(None) | Value::ExternRef(None) => f.write_str("null"),
        }
    }
}

/// Host type with a one-to-one WebAssembly counterpart.
pub trait WasmType: Copy {
    /// The WebAssembly type this host type maps to
    const VALUE_TYPE: ValueType;

    /// Wrap as a runtime value.
    fn into_value(self) -> Value;

    /// Unwrap a runtime value, failing if its type differs.
    fn from_value(value: Value) -> Result<Self>;
}

macro_rules! wasm_type {
    ($($ty:ty => $variant:ident,)*) => {
        $(
            impl WasmType for $ty {
                const VALUE_TYPE: ValueType = ValueType::$variant;

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }

                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(kinds::type_mismatch(
                            ValueType::$variant.name(),
                            other.value_type().name(),
                        )),
                    }
                }
            }
        )*
    };
}

wasm_type! {
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
}

/// Host parameter list for a function call.
pub trait WasmParams {
    /// Parameter types in order.
    fn value_types() -> Vec<ValueType>;

    /// Parameters as runtime values.
    fn into_values(self) -> Vec<Value>;
}

impl<T: WasmType> WasmParams for T {
    fn value_types() -> Vec<ValueType> {
        vec![T::VALUE_TYPE]
    }

    fn into_values(self) -> Vec<Value> {
        vec![self.into_value()]
    }
}

macro_rules! wasm_params_tuple {
    ($(($($name:ident),*))*) => {
        $(
            impl<$($name: WasmType),*> WasmParams for ($($name,)*) {
                fn value_types() -> Vec<ValueType> {
                    vec![$($name::VALUE_TYPE),*]
                }

                #[allow(non_snake_case)]
                fn into_values(self) -> Vec<Value> {
                    let ($($name,)*) = self;
                    vec![$($name.into_value()),*]
                }
            }
        )*
    };
}

wasm_params_tuple! {
    ()
    (A)
    (A, B)
    (A, B, C)
    (A, B, C, D)
}

/// Host result of a function call: nothing or a single value.
pub trait WasmResults: Sized {
    /// Result types in order.
    fn value_types() -> Vec<ValueType>;

    /// Convert the values a call produced.
    fn from_values(values: &[Value]) -> Result<Self>;
}

impl WasmResults for () {
    fn value_types() -> Vec<ValueType> {
        Vec::new()
    }

    fn from_values(values: &[Value]) -> Result<Self> {
        match values {
            [] => Ok(()),
            _ => Err(kinds::type_mismatch("no results", &describe(values))),
        }
    }
}

impl<T: WasmType> WasmResults for T {
    fn value_types() -> Vec<ValueType> {
        vec![T::VALUE_TYPE]
    }

    fn from_values(values: &[Value]) -> Result<Self> {
        match values {
            [value] => T::from_value(*value),
            _ => Err(kinds::type_mismatch(T::VALUE_TYPE.name(), &describe(values))),
        }
    }
}

fn describe(values: &[Value]) -> String {
    let names: Vec<&str> = values.iter().map(|v| v.value_type().name()).collect();
    format!("({})", names.join(", "))
}
