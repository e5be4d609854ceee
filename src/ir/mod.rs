//! Typed intermediate representation of a decompilation unit.
//!
//! The IR is the read-only input side of the pipeline: package/class/method/
//! field nodes and decoded instructions, built once during ingestion. All
//! per-run analysis products (basic blocks, regions, variables, attributes)
//! live outside this module and reference the IR by index.
//!
//! # Key Types
//!
//! - [`Unit`] - A class with members and an attribute set
//! - [`Method`] - One routine's instructions, registers and handler table
//! - [`Instruction`] / [`Opcode`] - The register-machine instruction model
//! - [`JavaType`] / [`UnitName`] - The source-level type lattice
//! - [`AccessFlags`] - Class/member modifiers

mod instruction;
mod method;
mod types;
mod unit;

pub use instruction::{
    BinOp, CmpKind, ConstValue, ExceptionHandler, FieldRef, Instruction, InvokeKind, MethodRef,
    Opcode, Reg, UnOp,
};
pub use method::{Method, MethodSig};
pub use types::{JavaType, TypeMerge, UnitName};
pub use unit::{AccessFlags, Field, Unit};
