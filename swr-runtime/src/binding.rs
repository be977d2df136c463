// SWR - swr-runtime
// Module: Export Bindings
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Typed handles to a module's exported functions.
//!
//! [`ExportBindings`] is built once from a decoded module. It maps export
//! names to function indices and signatures, and hands out handles whose
//! host parameter and result types have been checked against the declared
//! signature. Calls run through an [`Executor`], the layer that actually
//! executes instructions.

use std::{collections::BTreeMap, marker::PhantomData};

use swr_decoder::{ExternalKind, FuncType, Module};
use swr_error::{kinds, Error, Result};
use tracing::trace;

use crate::{
    memory::MemoryArea,
    strings::{StringEncoding, StringSpan},
    values::{Value, WasmParams, WasmResults},
};

/// Execution layer that runs module functions.
pub trait Executor {
    /// Call the function at `function_index` in the combined index space.
    fn call(&mut self, function_index: u32, args: &[Value]) -> Result<Vec<Value>>;

    /// Linear memory of the instance the functions run in.
    fn memory(&self) -> Option<&MemoryArea>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ExportedFunction {
    index:     u32,
    signature: FuncType,
}

/// Name to function lookup table for one module.
#[derive(Debug, Clone, Default)]
pub struct ExportBindings {
    functions: BTreeMap<Box<str>, ExportedFunction>,
}

impl ExportBindings {
    /// Collect every function export of `module`.
    pub fn new(module: &Module) -> Result<Self> {
        let mut functions = BTreeMap::new();
        for export in module.exports.iter().filter(|e| e.kind == ExternalKind::Function) {
            let signature = module
                .combined_function_type(export.index)
                .ok_or_else(|| kinds::invalid_index("function", export.index))?;
            functions.insert(
                Box::from(export.name.as_str()),
                ExportedFunction {
                    index:     export.index,
                    signature: signature.clone(),
                },
            );
        }
        Ok(Self { functions })
    }

    /// Exported function names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(AsRef::as_ref)
    }

    /// Declared signature of export `name`.
    #[must_use]
    pub fn signature(&self, name: &str) -> Option<&FuncType> {
        self.functions.get(name).map(|f| &f.signature)
    }

    fn lookup(&self, name: &str) -> Result<&ExportedFunction> {
        let function = self.functions.get(name).ok_or_else(|| kinds::export_not_found(name))?;
        if function.signature.results.len() > 1 {
            return Err(kinds::unsupported_arity(name, function.signature.results.len()));
        }
        Ok(function)
    }

    /// Handle to export `name` called with `P` and returning `R`.
    ///
    /// Fails if the export is missing, returns more than one value, or its
    /// declared signature differs from the host types.
    pub fn typed<P: WasmParams, R: WasmResults>(&self, name: &str) -> Result<TypedFunc<P, R>> {
        let function = self.lookup(name)?;
        let expected = FuncType::new(P::value_types(), R::value_types());
        if function.signature != expected {
            return Err(kinds::type_mismatch(
                &expected.to_string(),
                &function.signature.to_string(),
            ));
        }
        Ok(TypedFunc {
            name:    Box::from(name),
            index:   function.index,
            _marker: PhantomData,
        })
    }

    /// Handle to export `name` that takes `P` and returns a packed string span
    /// (`i64`, see [`StringSpan::from_packed`]) decoded as `encoding`.
    pub fn string<P: WasmParams>(
        &self,
        name: &str,
        encoding: StringEncoding,
    ) -> Result<StringFunc<P>> {
        Ok(StringFunc {
            inner: self.typed::<P, i64>(name)?,
            encoding,
        })
    }
}

/// Signature-checked handle to an exported function.
#[derive(Debug)]
pub struct TypedFunc<P, R> {
    name:    Box<str>,
    index:   u32,
    _marker: PhantomData<fn(P) -> R>,
}

impl<P: WasmParams, R: WasmResults> TypedFunc<P, R> {
    /// Export name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Function index in the combined index space.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Call the function with `params`.
    pub fn call(&self, executor: &mut dyn Executor, params: P) -> Result<R> {
        let args = params.into_values();
        trace!(name = %self.name, index = self.index, args = args.len(), "call");
        let results = executor.call(self.index, &args)?;
        R::from_values(&results).map_err(|e| e.context(&self.name))
    }
}

/// Handle to an export returning a string span in linear memory.
#[derive(Debug)]
pub struct StringFunc<P> {
    inner:    TypedFunc<P, i64>,
    encoding: StringEncoding,
}

impl<P: WasmParams> StringFunc<P> {
    /// Encoding used to decode the returned span.
    #[must_use]
    pub fn encoding(&self) -> StringEncoding {
        self.encoding
    }

    /// Call the function and decode the string it points at.
    pub fn call(&self, executor: &mut dyn Executor, params: P) -> Result<String> {
        let span = StringSpan::from_packed(self.inner.call(executor, params)?);
        let memory = executor
            .memory()
            .ok_or_else(|| Error::invalid_state("string result without linear memory"))?;
        span.read(memory, self.encoding)
    }
}
