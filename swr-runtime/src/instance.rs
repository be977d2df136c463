// SWR - swr-runtime
// Module: Module Instance
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Instantiation of decoded modules.

use swr_decoder::{ExternalKind, ImportDesc, Module};
use swr_error::{kinds, Error, Result};
use tracing::{debug, debug_span, trace};

use crate::{config::RuntimeConfig, const_eval, memory::MemoryArea, values::Value};

/// Runtime state of one module: its linear memory and global values.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    memory:  Option<MemoryArea>,
    globals: Vec<Value>,
}

impl Instance {
    /// Create the memory, evaluate globals and copy active data segments.
    ///
    /// `imported_globals` supplies the values of the module's global imports,
    /// in import order. Any failure aborts instantiation; no partial instance
    /// is returned.
    pub fn instantiate(
        module: &Module,
        imported_globals: &[Value],
        config: &RuntimeConfig,
    ) -> Result<Self> {
        let _span = debug_span!("instantiate").entered();

        let mut memory = module
            .memory_limits()
            .map(|limits| MemoryArea::from_limits(limits, config))
            .transpose()?;
        if let Some(memory) = &memory {
            debug!(
                pages = memory.get_current_pages(),
                maximum = memory.get_maximum_pages(),
                "memory created"
            );
        }

        let globals = Self::evaluate_globals(module, imported_globals)?;

        for (index, segment) in module.data.iter().enumerate() {
            if segment.passive {
                continue;
            }
            let memory = memory
                .as_mut()
                .filter(|_| segment.memory_index == 0)
                .ok_or_else(|| kinds::memory_not_found(segment.memory_index))?;
            let offset = match const_eval::evaluate(&segment.offset, &globals)? {
                Value::I32(offset) => offset as u32,
                other => return Err(kinds::type_mismatch("i32", other.value_type().name())),
            };
            memory
                .write_bytes(offset, &segment.bytes)
                .map_err(|e| e.context(&format!("data segment {index}")))?;
            trace!(index, offset, len = segment.bytes.len(), "data segment copied");
        }

        Ok(Self { memory, globals })
    }

    fn evaluate_globals(module: &Module, imported_globals: &[Value]) -> Result<Vec<Value>> {
        let imported_types: Vec<_> = module
            .imports
            .iter()
            .filter_map(|import| match &import.desc {
                ImportDesc::Global(global_type) => Some(global_type.value_type),
                _ => None,
            })
            .collect();
        if imported_types.len() != imported_globals.len() {
            return Err(Error::invalid_state(format!(
                "module imports {} globals, {} provided",
                imported_types.len(),
                imported_globals.len()
            )));
        }
        for (expected, value) in imported_types.iter().zip(imported_globals) {
            if value.value_type() != *expected {
                return Err(kinds::type_mismatch(expected.name(), value.value_type().name()));
            }
        }

        let mut globals = imported_globals.to_vec();
        globals.reserve(module.globals.len());
        for global in module.globals.iter() {
            let value = const_eval::evaluate(&global.init, &globals)?;
            if value.value_type() != global.global_type.value_type {
                return Err(kinds::type_mismatch(
                    global.global_type.value_type.name(),
                    value.value_type().name(),
                ));
            }
            globals.push(value);
        }
        debug_assert_eq!(
            globals.len() as u32,
            module.imported_count(ExternalKind::Global) + module.globals.len() as u32
        );
        Ok(globals)
    }

    /// Linear memory, if the module has one.
    #[must_use]
    pub fn memory(&self) -> Option<&MemoryArea> {
        self.memory.as_ref()
    }

    /// Mutable linear memory, if the module has one.
    pub fn memory_mut(&mut self) -> Option<&mut MemoryArea> {
        self.memory.as_mut()
    }

    /// All globals in the combined index space, imports first.
    #[must_use]
    pub fn globals(&self) -> &[Value] {
        &self.globals
    }

    /// Global at `index` in the combined index space.
    pub fn global(&self, index: u32) -> Result<Value> {
        self.globals
            .get(index as usize)
            .copied()
            .ok_or_else(|| kinds::invalid_index("global", index))
    }
}
