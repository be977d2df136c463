// SWR - swr-decoder
// Module: Instructions
//
// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! WebAssembly instruction handling
//!
//! Instructions decode one opcode at a time. `block`, `loop` and `if` own
//! their nested body, which is decoded by the same routine recursing until
//! the matching `end`. Bodies are frozen into an [`Expression`] as soon as
//! their `end` is read.

use core::ops::Deref;

use swr_error::{kinds, Result};
use swr_format::{
    binary, ready,
    types::{BlockType, ValueType},
    ByteSource,
};

use crate::limits::DecoderLimits;

macro_rules! opcode_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident: $repr:ty {
            $($variant:ident = $code:literal => $text:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                #[doc = $text]
                $variant,
            )*
        }

        impl $name {
            /// Operator encoded by `opcode`, if it belongs to this group.
            #[must_use]
            pub const fn from_opcode(opcode: $repr) -> Option<Self> {
                match opcode {
                    $($code => Some(Self::$variant),)*
                    _ => None,
                }
            }

            /// Encoding of this operator.
            #[must_use]
            pub const fn opcode(self) -> $repr {
                match self {
                    $(Self::$variant => $code,)*
                }
            }

            /// Text format mnemonic.
            #[must_use]
            pub const fn mnemonic(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)*
                }
            }
        }
    };
}

opcode_enum! {
    /// Loads from linear memory
    pub enum LoadOp: u8 {
        I32Load = 0x28 => "i32.load",
        I64Load = 0x29 => "i64.load",
        F32Load = 0x2A => "f32.load",
        F64Load = 0x2B => "f64.load",
        I32Load8S = 0x2C => "i32.load8_s",
        I32Load8U = 0x2D => "i32.load8_u",
        I32Load16S = 0x2E => "i32.load16_s",
        I32Load16U = 0x2F => "i32.load16_u",
        I64Load8S = 0x30 => "i64.load8_s",
        I64Load8U = 0x31 => "i64.load8_u",
        I64Load16S = 0x32 => "i64.load16_s",
        I64Load16U = 0x33 => "i64.load16_u",
        I64Load32S = 0x34 => "i64.load32_s",
        I64Load32U = 0x35 => "i64.load32_u",
    }
}

opcode_enum! {
    /// Stores to linear memory
    pub enum StoreOp: u8 {
        I32Store = 0x36 => "i32.store",
        I64Store = 0x37 => "i64.store",
        F32Store = 0x38 => "f32.store",
        F64Store = 0x39 => "f64.store",
        I32Store8 = 0x3A => "i32.store8",
        I32Store16 = 0x3B => "i32.store16",
        I64Store8 = 0x3C => "i64.store8",
        I64Store16 = 0x3D => "i64.store16",
        I64Store32 = 0x3E => "i64.store32",
    }
}

opcode_enum! {
    /// Numeric operators without immediates
    pub enum NumericOp: u8 {
        I32Eqz = 0x45 => "i32.eqz",
        I32Eq = 0x46 => "i32.eq",
        I32Ne = 0x47 => "i32.ne",
        I32LtS = 0x48 => "i32.lt_s",
        I32LtU = 0x49 => "i32.lt_u",
        I32GtS = 0x4A => "i32.gt_s",
        I32GtU = 0x4B => "i32.gt_u",
        I32LeS = 0x4C => "i32.le_s",
        I32LeU = 0x4D => "i32.le_u",
        I32GeS = 0x4E => "i32.ge_s",
        I32GeU = 0x4F => "i32.ge_u",
        I64Eqz = 0x50 => "i64.eqz",
        I64Eq = 0x51 => "i64.eq",
        I64Ne = 0x52 => "i64.ne",
        I64LtS = 0x53 => "i64.lt_s",
        I64LtU = 0x54 => "i64.lt_u",
        I64GtS = 0x55 => "i64.gt_s",
        I64GtU = 0x56 => "i64.gt_u",
        I64LeS = 0x57 => "i64.le_s",
        I64LeU = 0x58 => "i64.le_u",
        I64GeS = 0x59 => "i64.ge_s",
        I64GeU = 0x5A => "i64.ge_u",
        F32Eq = 0x5B => "f32.eq",
        F32Ne = 0x5C => "f32.ne",
        F32Lt = 0x5D => "f32.lt",
        F32Gt = 0x5E => "f32.gt",
        F32Le = 0x5F => "f32.le",
        F32Ge = 0x60 => "f32.ge",
        F64Eq = 0x61 => "f64.eq",
        F64Ne = 0x62 => "f64.ne",
        F64Lt = 0x63 => "f64.lt",
        F64Gt = 0x64 => "f64.gt",
        F64Le = 0x65 => "f64.le",
        F64Ge = 0x66 => "f64.ge",
        I32Clz = 0x67 => "i32.clz",
        I32Ctz = 0x68 => "i32.ctz",
        I32Popcnt = 0x69 => "i32.popcnt",
        I32Add = 0x6A => "i32.add",
        I32Sub = 0x6B => "i32.sub",
        I32Mul = 0x6C => "i32.mul",
        I32DivS = 0x6D => "i32.div_s",
        I32DivU = 0x6E => "i32.div_u",
        I32RemS = 0x6F => "i32.rem_s",
        I32RemU = 0x70 => "i32.rem_u",
        I32And = 0x71 => "i32.and",
        I32Or = 0x72 => "i32.or",
        I32Xor = 0x73 => "i32.xor",
        I32Shl = 0x74 => "i32.shl",
        I32ShrS = 0x75 => "i32.shr_s",
        I32ShrU = 0x76 => "i32.shr_u",
        I32Rotl = 0x77 => "i32.rotl",
        I32Rotr = 0x78 => "i32.rotr",
        I64Clz = 0x79 => "i64.clz",
        I64Ctz = 0x7A => "i64.ctz",
        I64Popcnt = 0x7B => "i64.popcnt",
        I64Add = 0x7C => "i64.add",
        I64Sub = 0x7D => "i64.sub",
        I64Mul = 0x7E => "i64.mul",
        I64DivS = 0x7F => "i64.div_s",
        I64DivU = 0x80 => "i64.div_u",
        I64RemS = 0x81 => "i64.rem_s",
        I64RemU = 0x82 => "i64.rem_u",
        I64And = 0x83 => "i64.and",
        I64Or = 0x84 => "i64.or",
        I64Xor = 0x85 => "i64.xor",
        I64Shl = 0x86 => "i64.shl",
        I64ShrS = 0x87 => "i64.shr_s",
        I64ShrU = 0x88 => "i64.shr_u",
        I64Rotl = 0x89 => "i64.rotl",
        I64Rotr = 0x8A => "i64.rotr",
        F32Abs = 0x8B => "f32.abs",
        F32Neg = 0x8C => "f32.neg",
        F32Ceil = 0x8D => "f32.ceil",
        F32Floor = 0x8E => "f32.floor",
        F32Trunc = 0x8F => "f32.trunc",
        F32Nearest = 0x90 => "f32.nearest",
        F32Sqrt = 0x91 => "f32.sqrt",
        F32Add = 0x92 => "f32.add",
        F32Sub = 0x93 => "f32.sub",
        F32Mul = 0x94 => "f32.mul",
        F32Div = 0x95 => "f32.div",
        F32Min = 0x96 => "f32.min",
        F32Max = 0x97 => "f32.max",
        F32Copysign = 0x98 => "f32.copysign",
        F64Abs = 0x99 => "f64.abs",
        F64Neg = 0x9A => "f64.neg",
        F64Ceil = 0x9B => "f64.ceil",
        F64Floor = 0x9C => "f64.floor",
        F64Trunc = 0x9D => "f64.trunc",
        F64Nearest = 0x9E => "f64.nearest",
        F64Sqrt = 0x9F => "f64.sqrt",
        F64Add = 0xA0 => "f64.add",
        F64Sub = 0xA1 => "f64.sub",
        F64Mul = 0xA2 => "f64.mul",
        F64Div = 0xA3 => "f64.div",
        F64Min = 0xA4 => "f64.min",
        F64Max = 0xA5 => "f64.max",
        F64Copysign = 0xA6 => "f64.copysign",
        I32WrapI64 = 0xA7 => "i32.wrap_i64",
        I32TruncF32S = 0xA8 => "i32.trunc_f32_s",
        I32TruncF32U = 0xA9 => "i32.trunc_f32_u",
        I32TruncF64S = 0xAA => "i32.trunc_f64_s",
        I32TruncF64U = 0xAB => "i32.trunc_f64_u",
        I64ExtendI32S = 0xAC => "i64.extend_i32_s",
        I64ExtendI32U = 0xAD => "i64.extend_i32_u",
        I64TruncF32S = 0xAE => "i64.trunc_f32_s",
        I64TruncF32U = 0xAF => "i64.trunc_f32_u",
        I64TruncF64S = 0xB0 => "i64.trunc_f64_s",
        I64TruncF64U = 0xB1 => "i64.trunc_f64_u",
        F32ConvertI32S = 0xB2 => "f32.convert_i32_s",
        F32ConvertI32U = 0xB3 => "f32.convert_i32_u",
        F32ConvertI64S = 0xB4 => "f32.convert_i64_s",
        F32ConvertI64U = 0xB5 => "f32.convert_i64_u",
        F32DemoteF64 = 0xB6 => "f32.demote_f64",
        F64ConvertI32S = 0xB7 => "f64.convert_i32_s",
        F64ConvertI32U = 0xB8 => "f64.convert_i32_u",
        F64ConvertI64S = 0xB9 => "f64.convert_i64_s",
        F64ConvertI64U = 0xBA => "f64.convert_i64_u",
        F64PromoteF32 = 0xBB => "f64.promote_f32",
        I32ReinterpretF32 = 0xBC => "i32.reinterpret_f32",
        I64ReinterpretF64 = 0xBD => "i64.reinterpret_f64",
        F32ReinterpretI32 = 0xBE => "f32.reinterpret_i32",
        F64ReinterpretI64 = 0xBF => "f64.reinterpret_i64",
        I32Extend8S = 0xC0 => "i32.extend8_s",
        I32Extend16S = 0xC1 => "i32.extend16_s",
        I64Extend8S = 0xC2 => "i64.extend8_s",
        I64Extend16S = 0xC3 => "i64.extend16_s",
        I64Extend32S = 0xC4 => "i64.extend32_s",
    }
}

opcode_enum! {
    /// Saturating float-to-int truncations behind the 0xFC prefix
    pub enum TruncSatOp: u32 {
        I32TruncSatF32S = 0 => "i32.trunc_sat_f32_s",
        I32TruncSatF32U = 1 => "i32.trunc_sat_f32_u",
        I32TruncSatF64S = 2 => "i32.trunc_sat_f64_s",
        I32TruncSatF64U = 3 => "i32.trunc_sat_f64_u",
        I64TruncSatF32S = 4 => "i64.trunc_sat_f32_s",
        I64TruncSatF32U = 5 => "i64.trunc_sat_f32_u",
        I64TruncSatF64S = 6 => "i64.trunc_sat_f64_s",
        I64TruncSatF64U = 7 => "i64.trunc_sat_f64_u",
    }
}

// Sub-opcodes behind the 0xFC prefix that carry index immediates
const MEMORY_INIT: u32 = 8;
const DATA_DROP: u32 = 9;
const MEMORY_COPY: u32 = 10;
const MEMORY_FILL: u32 = 11;
const TABLE_INIT: u32 = 12;
const ELEM_DROP: u32 = 13;
const TABLE_COPY: u32 = 14;
const TABLE_GROW: u32 = 15;
const TABLE_SIZE: u32 = 16;
const TABLE_FILL: u32 = 17;

/// Bit pattern of an `f32.const` immediate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ieee32(pub u32);

impl Ieee32 {
    /// The encoded float.
    #[must_use]
    pub fn value(self) -> f32 {
        f32::from_bits(self.0)
    }
}

/// Bit pattern of an `f64.const` immediate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ieee64(pub u64);

impl Ieee64 {
    /// The encoded float.
    #[must_use]
    pub fn value(self) -> f64 {
        f64::from_bits(self.0)
    }
}

/// Alignment hint and static offset of a memory access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemArg {
    /// log2 of the expected alignment
    pub align:  u32,
    /// Added to the dynamic address
    pub offset: u32,
}

impl MemArg {
    fn decode<S: ByteSource>(source: &mut S) -> Result<Option<Self>> {
        let align = ready!(source.read_var_u32()?);
        let offset = ready!(source.read_var_u32()?);
        Ok(Some(Self { align, offset }))
    }
}

/// Which structured control instruction opened a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// `block`
    Block,
    /// `loop`
    Loop,
    /// `if`, optionally with an `else` marker in its body
    If,
}

/// Structured control instruction with its nested body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Opening instruction
    pub kind:       BlockKind,
    /// Signature of the block
    pub block_type: BlockType,
    /// Nested instructions up to the matching `end`
    pub body:       Expression,
}

impl Block {
    /// Then and else arms of an `if` body, split at the `else` marker.
    ///
    /// For `block` and `loop`, or an `if` without `else`, the second arm is
    /// empty.
    #[must_use]
    pub fn branches(&self) -> (&[Instruction], &[Instruction]) {
        match self.body.iter().position(|i| matches!(i, Instruction::Else)) {
            Some(at) => (&self.body[..at], &self.body[at + 1..]),
            None => (&self.body[..], &[]),
        }
    }
}

/// WebAssembly instruction enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    // Control instructions
    /// `unreachable`
    Unreachable,
    /// `nop`
    Nop,
    /// `block`, `loop` or `if` with its nested body
    Block(Block),
    /// Boundary between the arms of an `if` body
    Else,
    /// `br`
    Br(u32),
    /// `br_if`
    BrIf(u32),
    /// `br_table`
    BrTable {
        /// Label per index
        targets: Box<[u32]>,
        /// Label for out-of-range indices
        default: u32,
    },
    /// `return`
    Return,
    /// `call`
    Call(u32),
    /// `call_indirect`
    CallIndirect {
        /// Expected signature
        type_index:  u32,
        /// Table holding the callee
        table_index: u32,
    },

    // Parametric instructions
    /// `drop`
    Drop,
    /// `select`
    Select,
    /// `select` with explicit result types
    SelectTyped(Box<[ValueType]>),

    // Variable instructions
    /// `local.get`
    LocalGet(u32),
    /// `local.set`
    LocalSet(u32),
    /// `local.tee`
    LocalTee(u32),
    /// `global.get`
    GlobalGet(u32),
    /// `global.set`
    GlobalSet(u32),
    /// `table.get`
    TableGet(u32),
    /// `table.set`
    TableSet(u32),

    // Memory instructions
    /// Typed load
    Load(LoadOp, MemArg),
    /// Typed store
    Store(StoreOp, MemArg),
    /// `memory.size`
    MemorySize(u32),
    /// `memory.grow`
    MemoryGrow(u32),
    /// `memory.init`
    MemoryInit {
        /// Source data segment
        data_index: u32,
        /// Target memory
        memory:     u32,
    },
    /// `data.drop`
    DataDrop(u32),
    /// `memory.copy`
    MemoryCopy {
        /// Destination memory
        dst: u32,
        /// Source memory
        src: u32,
    },
    /// `memory.fill`
    MemoryFill(u32),

    // Table instructions
    /// `table.init`
    TableInit {
        /// Source element segment
        elem_index: u32,
        /// Target table
        table:      u32,
    },
    /// `elem.drop`
    ElemDrop(u32),
    /// `table.copy`
    TableCopy {
        /// Destination table
        dst: u32,
        /// Source table
        src: u32,
    },
    /// `table.grow`
    TableGrow(u32),
    /// `table.size`
    TableSize(u32),
    /// `table.fill`
    TableFill(u32),

    // Numeric instructions
    /// `i32.const`
    I32Const(i32),
    /// `i64.const`
    I64Const(i64),
    /// `f32.const`
    F32Const(Ieee32),
    /// `f64.const`
    F64Const(Ieee64),
    /// Comparison, arithmetic, conversion or sign extension
    Numeric(NumericOp),
    /// Saturating truncation
    TruncSat(TruncSatOp),

    // Reference instructions
    /// `ref.null`
    RefNull(ValueType),
    /// `ref.is_null`
    RefIsNull,
    /// `ref.func`
    RefFunc(u32),
}

/// Frozen instruction sequence
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Expression(Box<[Instruction]>);

impl Expression {
    /// Expression with no instructions.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of instructions including those nested in blocks.
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        self.0
            .iter()
            .map(|instruction| match instruction {
                Instruction::Block(block) => 1 + block.body.instruction_count(),
                _ => 1,
            })
            .sum()
    }
}

impl Deref for Expression {
    type Target = [Instruction];

    fn deref(&self) -> &[Instruction] {
        &self.0
    }
}

impl From<Vec<Instruction>> for Expression {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self(instructions.into_boxed_slice())
    }
}

/// Decode instructions up to and including the closing `end`.
///
/// Runs atomically: on `Ok(None)` nothing was consumed and the call can be
/// repeated once more bytes are available.
pub fn decode_expression<S: ByteSource>(
    source: &mut S,
    limits: &DecoderLimits,
) -> Result<Option<Expression>> {
    source.attempt(|reader| decode_sequence(reader, None, 0, limits))
}

fn decode_sequence<S: ByteSource>(
    source: &mut S,
    enclosing: Option<BlockKind>,
    depth: u32,
    limits: &DecoderLimits,
) -> Result<Option<Expression>> {
    let mut body = Vec::new();
    let mut seen_else = false;

    loop {
        let offset = source.offset();
        let opcode = ready!(source.read_byte());
        match opcode {
            binary::END => return Ok(Some(Expression::from(body))),
            binary::ELSE => {
                if enclosing != Some(BlockKind::If) || seen_else {
                    return Err(kinds::unexpected_element("else", offset));
                }
                seen_else = true;
                body.push(Instruction::Else);
            },
            binary::BLOCK | binary::LOOP | binary::IF => {
                if depth >= limits.max_block_depth {
                    return Err(kinds::limit_exceeded(
                        "block nesting",
                        u64::from(limits.max_block_depth),
                        offset,
                    ));
                }
                let kind = match opcode {
                    binary::BLOCK => BlockKind::Block,
                    binary::LOOP => BlockKind::Loop,
                    _ => BlockKind::If,
                };
                let block_type = ready!(BlockType::decode(source)?);
                let nested = ready!(decode_sequence(source, Some(kind), depth + 1, limits)?);
                body.push(Instruction::Block(Block {
                    kind,
                    block_type,
                    body: nested,
                }));
            },
            _ => body.push(ready!(decode_operator(opcode, offset, source)?)),
        }
    }
}

fn decode_operator<S: ByteSource>(
    opcode: u8,
    offset: u64,
    source: &mut S,
) -> Result<Option<Instruction>> {
    use Instruction as I;

    let instruction = match opcode {
        binary::UNREACHABLE => I::Unreachable,
        binary::NOP => I::Nop,
        binary::BR => I::Br(ready!(source.read_var_u32()?)),
        binary::BR_IF => I::BrIf(ready!(source.read_var_u32()?)),
        binary::BR_TABLE => {
            let count = ready!(source.read_var_u32()?) as usize;
            let mut targets = Vec::with_capacity(count.min(source.available()));
            for _ in 0..count {
                targets.push(ready!(source.read_var_u32()?));
            }
            let default = ready!(source.read_var_u32()?);
            I::BrTable {
                targets: targets.into_boxed_slice(),
                default,
            }
        },
        binary::RETURN => I::Return,
        binary::CALL => I::Call(ready!(source.read_var_u32()?)),
        binary::CALL_INDIRECT => {
            let type_index = ready!(source.read_var_u32()?);
            let table_index = ready!(source.read_var_u32()?);
            I::CallIndirect {
                type_index,
                table_index,
            }
        },
        binary::DROP => I::Drop,
        binary::SELECT => I::Select,
        binary::SELECT_TYPED => {
            let count = ready!(source.read_var_u32()?) as usize;
            let mut types = Vec::with_capacity(count.min(source.available()));
            for _ in 0..count {
                types.push(ready!(ValueType::decode(source)?));
            }
            I::SelectTyped(types.into_boxed_slice())
        },
        binary::LOCAL_GET => I::LocalGet(ready!(source.read_var_u32()?)),
        binary::LOCAL_SET => I::LocalSet(ready!(source.read_var_u32()?)),
        binary::LOCAL_TEE => I::LocalTee(ready!(source.read_var_u32()?)),
        binary::GLOBAL_GET => I::GlobalGet(ready!(source.read_var_u32()?)),
        binary::GLOBAL_SET => I::GlobalSet(ready!(source.read_var_u32()?)),
        binary::TABLE_GET => I::TableGet(ready!(source.read_var_u32()?)),
        binary::TABLE_SET => I::TableSet(ready!(source.read_var_u32()?)),
        binary::MEMORY_SIZE => I::MemorySize(ready!(source.read_var_u32()?)),
        binary::MEMORY_GROW => I::MemoryGrow(ready!(source.read_var_u32()?)),
        binary::I32_CONST => I::I32Const(ready!(source.read_var_i32()?)),
        binary::I64_CONST => I::I64Const(ready!(source.read_var_i64()?)),
        binary::F32_CONST => I::F32Const(Ieee32(ready!(source.read_f32_bits()))),
        binary::F64_CONST => I::F64Const(Ieee64(ready!(source.read_f64_bits()))),
        binary::REF_NULL => {
            let type_offset = source.offset();
            let ty = ready!(ValueType::decode(source)?);
            if !ty.is_reference() {
                return Err(kinds::invalid_value_type(ty.to_byte(), type_offset));
            }
            I::RefNull(ty)
        },
        binary::REF_IS_NULL => I::RefIsNull,
        binary::REF_FUNC => I::RefFunc(ready!(source.read_var_u32()?)),
        binary::MISC_PREFIX => {
            let sub_opcode = ready!(source.read_var_u32()?);
            ready!(decode_misc(sub_opcode, offset, source)?)
        },
        _ => {
            if let Some(op) = LoadOp::from_opcode(opcode) {
                I::Load(op, ready!(MemArg::decode(source)?))
            } else if let Some(op) = StoreOp::from_opcode(opcode) {
                I::Store(op, ready!(MemArg::decode(source)?))
            } else if let Some(op) = NumericOp::from_opcode(opcode) {
                I::Numeric(op)
            } else {
                return Err(kinds::unknown_opcode(opcode, offset));
            }
        },
    };

    Ok(Some(instruction))
}

fn decode_misc<S: ByteSource>(
    sub_opcode: u32,
    offset: u64,
    source: &mut S,
) -> Result<Option<Instruction>> {
    use Instruction as I;

    if let Some(op) = TruncSatOp::from_opcode(sub_opcode) {
        return Ok(Some(I::TruncSat(op)));
    }

    let instruction = match sub_opcode {
        MEMORY_INIT => {
            let data_index = ready!(source.read_var_u32()?);
            let memory = ready!(source.read_var_u32()?);
            I::MemoryInit { data_index, memory }
        },
        DATA_DROP => I::DataDrop(ready!(source.read_var_u32()?)),
        MEMORY_COPY => {
            let dst = ready!(source.read_var_u32()?);
            let src = ready!(source.read_var_u32()?);
            I::MemoryCopy { dst, src }
        },
        MEMORY_FILL => I::MemoryFill(ready!(source.read_var_u32()?)),
        TABLE_INIT => {
            let elem_index = ready!(source.read_var_u32()?);
            let table = ready!(source.read_var_u32()?);
            I::TableInit { elem_index, table }
        },
        ELEM_DROP => I::ElemDrop(ready!(source.read_var_u32()?)),
        TABLE_COPY => {
            let dst = ready!(source.read_var_u32()?);
            let src = ready!(source.read_var_u32()?);
            I::TableCopy { dst, src }
        },
        TABLE_GROW => I::TableGrow(ready!(source.read_var_u32()?)),
        TABLE_SIZE => I::TableSize(ready!(source.read_var_u32()?)),
        TABLE_FILL => I::TableFill(ready!(source.read_var_u32()?)),
        _ => {
            return Err(kinds::unknown_prefixed_opcode(
                binary::MISC_PREFIX,
                sub_opcode,
                offset,
            ))
        },
    };

    Ok(Some(instruction))
}

#[cfg(test)]
mod tests {
    use swr_format::{ChunkedStream, SliceReader};

    use super::*;

    fn decode(bytes: &[u8]) -> Result<Option<Expression>> {
        decode_expression(&mut SliceReader::new(bytes), &DecoderLimits::default())
    }

    #[test]
    fn test_nested_blocks_own_their_bodies() {
        // block, loop (result i32), i32.const 1, end, end, end
        let expr = decode(&[0x02, 0x40, 0x03, 0x7F, 0x41, 0x01, 0x0B, 0x0B, 0x0B])
            .unwrap()
            .unwrap();
        assert_eq!(expr.len(), 1);
        let Instruction::Block(outer) = &expr[0] else {
            panic!("expected block, got {:?}", expr[0]);
        };
        assert_eq!(outer.kind, BlockKind::Block);
        assert_eq!(outer.block_type, BlockType::Empty);

        let Instruction::Block(inner) = &outer.body[0] else {
            panic!("expected loop, got {:?}", outer.body[0]);
        };
        assert_eq!(inner.kind, BlockKind::Loop);
        assert_eq!(inner.block_type, BlockType::Value(ValueType::I32));
        assert_eq!(&*inner.body, &[Instruction::I32Const(1)]);
        assert_eq!(expr.instruction_count(), 3);
    }

    #[test]
    fn test_if_else_branches() {
        // i32.const 0, if, nop, else, unreachable, end, end
        let expr = decode(&[0x41, 0x00, 0x04, 0x40, 0x01, 0x05, 0x00, 0x0B, 0x0B])
            .unwrap()
            .unwrap();
        let Instruction::Block(block) = &expr[1] else {
            panic!("expected if, got {:?}", expr[1]);
        };
        assert_eq!(block.kind, BlockKind::If);
        let (then_arm, else_arm) = block.branches();
        assert_eq!(then_arm, &[Instruction::Nop]);
        assert_eq!(else_arm, &[Instruction::Unreachable]);
    }

    #[test]
    fn test_else_outside_if_is_malformed() {
        let error = decode(&[0x02, 0x40, 0x05, 0x0B, 0x0B]).unwrap_err();
        assert_eq!(error.code, swr_error::codes::UNEXPECTED_ELEMENT);

        let error = decode(&[0x05, 0x0B]).unwrap_err();
        assert_eq!(error.code, swr_error::codes::UNEXPECTED_ELEMENT);
    }

    #[test]
    fn test_unknown_opcodes() {
        let error = decode(&[0x01, 0xFF, 0x0B]).unwrap_err();
        assert_eq!(error.code, swr_error::codes::UNKNOWN_OPCODE);
        assert!(error.message.contains("0xff"));
        assert!(error.message.contains("offset 0x1"));

        let error = decode(&[0xFC, 0x20, 0x0B]).unwrap_err();
        assert_eq!(error.code, swr_error::codes::UNKNOWN_OPCODE);
    }

    #[test]
    fn test_invalid_block_type() {
        let error = decode(&[0x02, 0x7A, 0x0B, 0x0B]).unwrap_err();
        assert_eq!(error.code, swr_error::codes::INVALID_BLOCK_TYPE);
    }

    #[test]
    fn test_depth_limit() {
        let limits = DecoderLimits {
            max_block_depth: 2,
            ..DecoderLimits::default()
        };
        let two = [0x02, 0x40, 0x02, 0x40, 0x0B, 0x0B, 0x0B];
        assert!(decode_expression(&mut SliceReader::new(&two), &limits).unwrap().is_some());

        let three = [0x02, 0x40, 0x02, 0x40, 0x02, 0x40, 0x0B, 0x0B, 0x0B, 0x0B];
        let error = decode_expression(&mut SliceReader::new(&three), &limits).unwrap_err();
        assert_eq!(error.code, swr_error::codes::LIMIT_EXCEEDED);
    }

    #[test]
    fn test_immediates() {
        let bytes = [
            0x28, 0x02, 0x10, // i32.load align=2 offset=16
            0x0E, 0x02, 0x00, 0x01, 0x02, // br_table 0 1 2
            0x43, 0x00, 0x00, 0x80, 0x3F, // f32.const 1.0
            0xFC, 0x0B, 0x00, // memory.fill 0
            0xFC, 0x05, // i64.trunc_sat_f32_u
            0xC4, // i64.extend32_s
            0xD0, 0x70, // ref.null func
            0x0B,
        ];
        let expr = decode(&bytes).unwrap().unwrap();
        assert_eq!(
            &*expr,
            &[
                Instruction::Load(LoadOp::I32Load, MemArg { align: 2, offset: 16 }),
                Instruction::BrTable {
                    targets: vec![0, 1].into_boxed_slice(),
                    default: 2,
                },
                Instruction::F32Const(Ieee32(1.0f32.to_bits())),
                Instruction::MemoryFill(0),
                Instruction::TruncSat(TruncSatOp::I64TruncSatF32U),
                Instruction::Numeric(NumericOp::I64Extend32S),
                Instruction::RefNull(ValueType::FuncRef),
            ]
        );
    }

    #[test]
    fn test_incomplete_expression_consumes_nothing() {
        let mut stream = ChunkedStream::new();
        let limits = DecoderLimits::default();
        stream.push(&[0x41, 0xE5, 0x8E]);
        assert_eq!(decode_expression(&mut stream, &limits).unwrap(), None);
        assert_eq!(stream.offset(), 0);

        stream.push(&[0x26, 0x0B]);
        let expr = decode_expression(&mut stream, &limits).unwrap().unwrap();
        assert_eq!(&*expr, &[Instruction::I32Const(624_485)]);
        assert_eq!(stream.offset(), 5);
    }

    #[test]
    fn test_opcode_tables_round_trip() {
        for opcode in 0..=u8::MAX {
            if let Some(op) = NumericOp::from_opcode(opcode) {
                assert_eq!(op.opcode(), opcode);
            }
        }
        assert_eq!(NumericOp::I32Add.mnemonic(), "i32.add");
        assert_eq!(LoadOp::from_opcode(0x36), None);
    }
}
