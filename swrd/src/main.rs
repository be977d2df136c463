// SWR - swrd
// Module: Command Line Front End
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! # swrd
//!
//! Command line front end for the swr decoder and runtime.
//!
//! ## Usage
//!
//! ```bash
//! swrd inspect <wasm-file> [--chunk-size <bytes>]
//! swrd read-string <wasm-file> --offset <addr> --length <bytes> [--encoding utf8|utf16|utf32]
//! ```
//!
//! `inspect` decodes a module, optionally feeding it to the streaming decoder
//! in fixed-size chunks, and prints a summary of its contents. `read-string`
//! instantiates the module, which copies its data segments into linear
//! memory, and prints the string stored at the given span.
//!
//! Settings are read from `--config <file>`, or from `swrd.toml` in the
//! working directory when present. Flags override file settings.
//!
//! ## Exit status
//!
//! `0` on success, `2` for a malformed module, `3` when instantiation or
//! memory access fails, `4` for invalid configuration and `1` otherwise.

mod config;

use std::{
    fs,
    io::{self, Write},
    num::NonZeroUsize,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use swr_decoder::{
    decode_module_with_limits, DecoderLimits, ImportDesc, Module, Status, StreamingDecoder,
};
use swr_error::{ErrorCategory, ToErrorCategory};
use swr_runtime::{read_string, Instance, RuntimeConfig, StringEncoding, Value};
use tracing::{debug, info, trace};
use tracing_subscriber::EnvFilter;

use crate::config::load_config;

/// swrd command line arguments
#[derive(Parser, Debug)]
#[command(name = "swrd", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (default: ./swrd.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `swr_decoder=trace` (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Cap on linear memory pages (overrides `[runtime] max_memory_pages`)
    #[arg(long, global = true)]
    max_memory_pages: Option<u32>,

    /// Deepest block nesting accepted (overrides `[decoder] max_block_depth`)
    #[arg(long, global = true)]
    max_block_depth: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a module and print a summary of its contents
    Inspect {
        /// Path to the WebAssembly module
        wasm_file: PathBuf,

        /// Feed the module to the streaming decoder in chunks of this size
        #[arg(long)]
        chunk_size: Option<NonZeroUsize>,
    },
    /// Instantiate a module and print a string from its linear memory
    ReadString {
        /// Path to the WebAssembly module
        wasm_file: PathBuf,

        /// Address of the first byte
        #[arg(long)]
        offset: u32,

        /// Length of the string in bytes
        #[arg(long)]
        length: u32,

        /// Text encoding of the string
        #[arg(long, default_value = "utf8")]
        encoding: StringEncoding,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::from(exit_status(&error))
        }
    }
}

/// Exit status for `error`, chosen by the category of the first SWR error in
/// its chain.
fn exit_status(error: &anyhow::Error) -> u8 {
    let category = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<swr_error::Error>())
        .map(ToErrorCategory::to_category);
    match category {
        Some(ErrorCategory::Parse | ErrorCategory::Validation) => 2,
        Some(
            ErrorCategory::Memory
            | ErrorCategory::Type
            | ErrorCategory::Runtime
            | ErrorCategory::Resource,
        ) => 3,
        Some(ErrorCategory::Configuration) => 4,
        Some(ErrorCategory::Io) | None => 1,
    }
}

fn run(cli: Cli) -> Result<()> {
    let working_dir = std::env::current_dir().context("Failed to determine working directory")?;
    let file_config = load_config(cli.config.as_deref(), &working_dir)?;
    initialize_tracing(cli.log_level.as_deref().or(file_config.log_level.as_deref()))?;

    let mut limits = file_config.decoder;
    if let Some(depth) = cli.max_block_depth {
        limits.max_block_depth = depth;
    }
    let mut runtime = file_config.runtime;
    if let Some(pages) = cli.max_memory_pages {
        runtime.max_memory_pages = Some(pages);
    }
    runtime.validate()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Command::Inspect {
            wasm_file,
            chunk_size,
        } => {
            let bytes = load_wasm_file(&wasm_file)?;
            let module = decode(&bytes, limits, chunk_size)
                .with_context(|| format!("Failed to decode {}", wasm_file.display()))?;
            print_summary(&module, &mut out)?;
        }
        Command::ReadString {
            wasm_file,
            offset,
            length,
            encoding,
        } => {
            let bytes = load_wasm_file(&wasm_file)?;
            let module = decode(&bytes, limits, None)
                .with_context(|| format!("Failed to decode {}", wasm_file.display()))?;
            let text = extract_string(&module, &runtime, offset, length, encoding)?;
            writeln!(out, "{text}")?;
        }
    }
    Ok(())
}

/// Install the fmt subscriber, filtered by `level` or else `RUST_LOG`.
fn initialize_tracing(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).context("Invalid log level")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

fn load_wasm_file(path: &Path) -> Result<Vec<u8>> {
    debug!("Loading WebAssembly file: {}", path.display());
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read WebAssembly file: {}", path.display()))?;
    info!("Loaded {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

/// Decode `bytes` whole, or through the streaming decoder in `chunk_size` pieces.
fn decode(bytes: &[u8], limits: DecoderLimits, chunk_size: Option<NonZeroUsize>) -> Result<Module> {
    let Some(chunk_size) = chunk_size else {
        return Ok(decode_module_with_limits(bytes, limits)?);
    };

    let mut decoder = StreamingDecoder::new(limits);
    for chunk in bytes.chunks(chunk_size.get()) {
        let status = decoder.feed(chunk)?;
        trace!(received = decoder.bytes_received(), ?status, "chunk fed");
        if status == Status::SectionBoundary {
            debug!(received = decoder.bytes_received(), "at section boundary");
        }
    }
    Ok(decoder.finish()?)
}

/// Instantiate `module` with zeroed global imports and decode a memory span.
fn extract_string(
    module: &Module,
    runtime: &RuntimeConfig,
    offset: u32,
    length: u32,
    encoding: StringEncoding,
) -> Result<String> {
    let imported_globals = module
        .imports
        .iter()
        .filter_map(|import| match &import.desc {
            ImportDesc::Global(global_type) => Some((import, global_type.value_type)),
            _ => None,
        })
        .map(|(import, value_type)| {
            Value::default_for(value_type).ok_or_else(|| {
                anyhow!(
                    "Cannot provide a value for global import {}.{} of type {}",
                    import.module,
                    import.name,
                    value_type
                )
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let instance = Instance::instantiate(module, &imported_globals, runtime)
        .context("Failed to instantiate module")?;
    let memory = instance
        .memory()
        .ok_or_else(|| anyhow!("Module has no linear memory"))?;
    Ok(read_string(memory, offset, length, encoding)?)
}

fn describe_import(desc: &ImportDesc) -> String {
    match desc {
        ImportDesc::Function { type_index } => format!("function type {type_index}"),
        ImportDesc::Table(table) => format!(
            "table {} {}",
            table.element,
            describe_limits(table.limits.min, table.limits.max)
        ),
        ImportDesc::Memory {
            min_pages,
            max_pages,
        } => format!("memory {}", describe_limits(*min_pages, *max_pages)),
        ImportDesc::Global(global) => {
            format!("global {}{}", if global.mutable { "mut " } else { "" }, global.value_type)
        }
        ImportDesc::Unknown { kind, type_index } => {
            format!("unknown kind 0x{kind:02x} type {type_index}")
        }
    }
}

fn describe_limits(min: u32, max: Option<u32>) -> String {
    match max {
        Some(max) => format!("{min}..{max}"),
        None => format!("{min}.."),
    }
}

/// Write a human readable summary of `module`.
fn print_summary(module: &Module, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "types: {}", module.types.len())?;
    for (i, ty) in module.types.iter().enumerate() {
        writeln!(out, "  [{i}] {ty}")?;
    }

    writeln!(out, "imports: {}", module.imports.len())?;
    for import in module.imports.iter() {
        writeln!(out, "  {}.{}: {}", import.module, import.name, describe_import(&import.desc))?;
    }

    writeln!(out, "functions: {}", module.functions.len())?;
    for (i, body) in module.code.iter().enumerate() {
        let signature = module
            .function_type(i as u32)
            .map_or_else(|| "?".to_string(), ToString::to_string);
        writeln!(
            out,
            "  [{i}] {signature}: {} bytes, {} locals, {} instructions",
            body.size,
            body.locals.len(),
            body.body.instruction_count()
        )?;
    }

    for (i, table) in module.tables.iter().enumerate() {
        writeln!(
            out,
            "table [{i}] {} {}",
            table.element,
            describe_limits(table.limits.min, table.limits.max)
        )?;
    }
    for (i, memory) in module.memories.iter().enumerate() {
        writeln!(out, "memory [{i}] {}", describe_limits(memory.min, memory.max))?;
    }

    writeln!(out, "globals: {}", module.globals.len())?;
    for (i, global) in module.globals.iter().enumerate() {
        let mutability = if global.global_type.mutable { "mut " } else { "" };
        writeln!(out, "  [{i}] {mutability}{}", global.global_type.value_type)?;
    }

    writeln!(out, "exports: {}", module.exports.len())?;
    for export in module.exports.iter() {
        writeln!(out, "  {}: {} {}", export.name, export.kind, export.index)?;
    }

    if let Some(start) = module.start {
        writeln!(out, "start: {start}")?;
    }

    writeln!(out, "data: {}", module.data.len())?;
    for (i, segment) in module.data.iter().enumerate() {
        if segment.passive {
            writeln!(out, "  [{i}] passive, {} bytes", segment.bytes.len())?;
        } else {
            writeln!(
                out,
                "  [{i}] memory {}, {} bytes",
                segment.memory_index,
                segment.bytes.len()
            )?;
        }
    }

    for section in module.custom_sections.iter() {
        writeln!(out, "custom \"{}\": {} bytes", section.name, section.payload.len())?;
    }
    Ok(())
}
