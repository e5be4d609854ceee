//! Register-machine instruction model.
//!
//! Instructions are the read-only input to the decompilation pipeline: the
//! ingestion collaborator decodes them from the container format and hands the
//! core an ordered list per method. Instruction positions in that list serve as
//! addresses, so branch targets are plain indices.
//!
//! Instructions are immutable once built. Analyses that need to associate data
//! with operands (inferred types, variable bindings) do so through side tables
//! keyed by instruction index, which keeps the IR reusable across passes.
//!
//! # Key Types
//!
//! - [`Instruction`] - One decoded instruction with its [`Opcode`]
//! - [`Reg`] - A register operand
//! - [`ExceptionHandler`] - A covered range plus catch type and handler entry
//! - [`MethodRef`] / [`FieldRef`] - Resolved member references from the symbol table

use std::fmt;

use crate::ir::{JavaType, UnitName};

/// A virtual register operand.
///
/// Dalvik methods address a flat register file; arguments occupy the highest
/// registers. The newtype prevents mixing register numbers with instruction
/// indices in analysis tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reg(pub u16);

impl Reg {
    /// Returns the raw register number.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A literal constant loaded by a `Const` instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    /// 32-bit integer family literal (also used for boolean/char/byte/short).
    Int(i32),
    /// 64-bit integer literal.
    Long(i64),
    /// 32-bit float literal.
    Float(f32),
    /// 64-bit float literal.
    Double(f64),
    /// String literal.
    String(String),
    /// Class literal (`Foo.class`).
    Class(UnitName),
    /// The `null` literal.
    Null,
}

impl ConstValue {
    /// The natural type of this literal before use-site narrowing.
    #[must_use]
    pub fn natural_type(&self) -> JavaType {
        match self {
            ConstValue::Int(_) => JavaType::Int,
            ConstValue::Long(_) => JavaType::Long,
            ConstValue::Float(_) => JavaType::Float,
            ConstValue::Double(_) => JavaType::Double,
            ConstValue::String(_) => JavaType::object("java.lang.String"),
            ConstValue::Class(_) => JavaType::object("java.lang.Class"),
            ConstValue::Null => JavaType::Null,
        }
    }
}

/// Binary arithmetic, logic and shift operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::IntoStaticStr)]
pub enum BinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `&`
    And,
    /// `|`
    Or,
    /// `^`
    Xor,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `>>>`
    Ushr,
}

impl BinOp {
    /// Java source spelling of the operator.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::And => "&",
            BinOp::Or => "|",
            BinOp::Xor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Ushr => ">>>",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::IntoStaticStr)]
pub enum UnOp {
    /// Arithmetic negation, `-x`.
    Neg,
    /// Bitwise complement, `~x`.
    Not,
}

impl UnOp {
    /// Java source spelling of the operator.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::Not => "~",
        }
    }
}

/// Comparison kinds used by conditional branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::IntoStaticStr)]
pub enum CmpKind {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `>`
    Gt,
    /// `<=`
    Le,
}

impl CmpKind {
    /// Java source spelling of the comparison.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            CmpKind::Eq => "==",
            CmpKind::Ne => "!=",
            CmpKind::Lt => "<",
            CmpKind::Ge => ">=",
            CmpKind::Gt => ">",
            CmpKind::Le => "<=",
        }
    }

    /// Returns the comparison with inverted truth value.
    #[must_use]
    pub const fn negate(self) -> CmpKind {
        match self {
            CmpKind::Eq => CmpKind::Ne,
            CmpKind::Ne => CmpKind::Eq,
            CmpKind::Lt => CmpKind::Ge,
            CmpKind::Ge => CmpKind::Lt,
            CmpKind::Gt => CmpKind::Le,
            CmpKind::Le => CmpKind::Gt,
        }
    }
}

/// Invocation dispatch kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::IntoStaticStr)]
pub enum InvokeKind {
    /// Virtual dispatch through the receiver.
    Virtual,
    /// Static call, no receiver.
    Static,
    /// Direct call (constructors and private methods).
    Direct,
}

/// A resolved method reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    /// Declaring class.
    pub owner: UnitName,
    /// Method name (`<init>` for constructors).
    pub name: String,
    /// Declared parameter types, excluding any receiver.
    pub params: Vec<JavaType>,
    /// Declared return type, `None` for `void`.
    pub ret: Option<JavaType>,
}

impl MethodRef {
    /// Returns `true` if this references a constructor.
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }
}

/// A resolved field reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    /// Declaring class.
    pub owner: UnitName,
    /// Field name.
    pub name: String,
    /// Declared field type.
    pub ty: JavaType,
}

/// Decoded instruction payload.
///
/// Branch and switch targets are indices into the owning method's instruction
/// list. Operand registers are split into defs and uses through
/// [`Instruction::def`] and [`Instruction::uses`] rather than stored
/// separately, so the payload stays the single source of truth.
#[derive(Debug, Clone, PartialEq)]
pub enum Opcode {
    /// No operation.
    Nop,
    /// Load a literal into `dest`.
    Const {
        /// Destination register.
        dest: Reg,
        /// Literal value.
        value: ConstValue,
    },
    /// Register copy.
    Move {
        /// Destination register.
        dest: Reg,
        /// Source register.
        src: Reg,
    },
    /// Unary operation.
    Unary {
        /// Operator.
        op: UnOp,
        /// Destination register.
        dest: Reg,
        /// Operand register.
        src: Reg,
    },
    /// Binary operation.
    Binary {
        /// Operator.
        op: BinOp,
        /// Destination register.
        dest: Reg,
        /// Left operand.
        lhs: Reg,
        /// Right operand.
        rhs: Reg,
    },
    /// Wide/floating compare producing -1/0/1 in `dest` (`cmp-long` family).
    Cmp {
        /// Destination register.
        dest: Reg,
        /// Left operand.
        lhs: Reg,
        /// Right operand.
        rhs: Reg,
    },
    /// Conditional branch comparing two registers.
    IfCmp {
        /// Comparison kind.
        kind: CmpKind,
        /// Left operand.
        lhs: Reg,
        /// Right operand.
        rhs: Reg,
        /// Branch target when the comparison holds.
        target: usize,
    },
    /// Conditional branch comparing a register against zero/null.
    IfZero {
        /// Comparison kind.
        kind: CmpKind,
        /// Tested register.
        reg: Reg,
        /// Branch target when the comparison holds.
        target: usize,
    },
    /// Unconditional branch.
    Goto {
        /// Branch target.
        target: usize,
    },
    /// Multi-way branch on an integer selector; fall-through is the default.
    Switch {
        /// Selector register.
        selector: Reg,
        /// `(case value, target)` pairs in declaration order.
        cases: Vec<(i32, usize)>,
    },
    /// Method invocation.
    Invoke {
        /// Dispatch kind.
        kind: InvokeKind,
        /// Callee reference.
        method: MethodRef,
        /// Argument registers; for non-static calls `args[0]` is the receiver.
        args: Vec<Reg>,
        /// Destination of the fused `move-result`, if the value is consumed.
        dest: Option<Reg>,
    },
    /// Field load. `object` is `None` for static fields.
    FieldGet {
        /// Destination register.
        dest: Reg,
        /// Receiver register, `None` for static access.
        object: Option<Reg>,
        /// Field reference.
        field: FieldRef,
    },
    /// Field store. `object` is `None` for static fields.
    FieldPut {
        /// Source register.
        src: Reg,
        /// Receiver register, `None` for static access.
        object: Option<Reg>,
        /// Field reference.
        field: FieldRef,
    },
    /// Array element load.
    ArrayGet {
        /// Destination register.
        dest: Reg,
        /// Array register.
        array: Reg,
        /// Index register.
        index: Reg,
    },
    /// Array element store.
    ArrayPut {
        /// Source register.
        src: Reg,
        /// Array register.
        array: Reg,
        /// Index register.
        index: Reg,
    },
    /// `array.length`.
    ArrayLength {
        /// Destination register.
        dest: Reg,
        /// Array register.
        array: Reg,
    },
    /// Allocate an instance (constructor call follows as `Invoke`/`Direct`).
    NewInstance {
        /// Destination register.
        dest: Reg,
        /// Instantiated class.
        class: UnitName,
    },
    /// Allocate an array.
    NewArray {
        /// Destination register.
        dest: Reg,
        /// Length register.
        size: Reg,
        /// Element type.
        elem: JavaType,
    },
    /// Checked cast; throws on failure, otherwise `reg` keeps its value.
    CheckCast {
        /// Register holding the reference.
        reg: Reg,
        /// Target class.
        class: UnitName,
    },
    /// `instanceof` test.
    InstanceOf {
        /// Destination register (boolean result).
        dest: Reg,
        /// Tested register.
        reg: Reg,
        /// Tested class.
        class: UnitName,
    },
    /// Store the in-flight exception at a handler entry.
    MoveException {
        /// Destination register for the caught exception.
        dest: Reg,
    },
    /// Enter a monitor.
    MonitorEnter {
        /// Monitored reference.
        reg: Reg,
    },
    /// Exit a monitor.
    MonitorExit {
        /// Monitored reference.
        reg: Reg,
    },
    /// Throw the referenced exception.
    Throw {
        /// Thrown reference.
        reg: Reg,
    },
    /// Return a value.
    Return {
        /// Returned register.
        reg: Reg,
    },
    /// Return from a `void` method.
    ReturnVoid,
}

/// One decoded instruction.
///
/// Immutable once constructed; see the module docs for the side-table
/// convention used by analyses.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    opcode: Opcode,
}

impl Instruction {
    /// Wraps an opcode payload.
    #[must_use]
    pub fn new(opcode: Opcode) -> Self {
        Self { opcode }
    }

    /// Returns the opcode payload.
    #[must_use]
    pub fn opcode(&self) -> &Opcode {
        &self.opcode
    }

    /// Returns the register defined by this instruction, if any.
    #[must_use]
    pub fn def(&self) -> Option<Reg> {
        match &self.opcode {
            Opcode::Const { dest, .. }
            | Opcode::Move { dest, .. }
            | Opcode::Unary { dest, .. }
            | Opcode::Binary { dest, .. }
            | Opcode::Cmp { dest, .. }
            | Opcode::FieldGet { dest, .. }
            | Opcode::ArrayGet { dest, .. }
            | Opcode::ArrayLength { dest, .. }
            | Opcode::NewInstance { dest, .. }
            | Opcode::NewArray { dest, .. }
            | Opcode::InstanceOf { dest, .. }
            | Opcode::MoveException { dest } => Some(*dest),
            Opcode::Invoke { dest, .. } => *dest,
            _ => None,
        }
    }

    /// Returns the registers read by this instruction, in operand order.
    #[must_use]
    pub fn uses(&self) -> Vec<Reg> {
        match &self.opcode {
            Opcode::Move { src, .. } | Opcode::Unary { src, .. } => vec![*src],
            Opcode::Binary { lhs, rhs, .. } | Opcode::Cmp { lhs, rhs, .. } => vec![*lhs, *rhs],
            Opcode::IfCmp { lhs, rhs, .. } => vec![*lhs, *rhs],
            Opcode::IfZero { reg, .. }
            | Opcode::CheckCast { reg, .. }
            | Opcode::MonitorEnter { reg }
            | Opcode::MonitorExit { reg }
            | Opcode::Throw { reg }
            | Opcode::Return { reg } => vec![*reg],
            Opcode::InstanceOf { reg, .. } => vec![*reg],
            Opcode::Switch { selector, .. } => vec![*selector],
            Opcode::Invoke { args, .. } => args.clone(),
            Opcode::FieldGet { object, .. } => object.iter().copied().collect(),
            Opcode::FieldPut { src, object, .. } => {
                let mut regs = vec![*src];
                regs.extend(object.iter().copied());
                regs
            }
            Opcode::ArrayGet { array, index, .. } => vec![*array, *index],
            Opcode::ArrayPut { src, array, index } => vec![*src, *array, *index],
            Opcode::ArrayLength { array, .. } => vec![*array],
            Opcode::NewArray { size, .. } => vec![*size],
            _ => Vec::new(),
        }
    }

    /// Returns explicit branch/switch targets (instruction indices).
    #[must_use]
    pub fn branch_targets(&self) -> Vec<usize> {
        match &self.opcode {
            Opcode::IfCmp { target, .. } | Opcode::IfZero { target, .. } | Opcode::Goto { target } => {
                vec![*target]
            }
            Opcode::Switch { cases, .. } => cases.iter().map(|(_, t)| *t).collect(),
            _ => Vec::new(),
        }
    }

    /// Returns `true` if this instruction ends a basic block.
    #[must_use]
    pub fn is_terminator(&self) -> bool {
        matches!(
            self.opcode,
            Opcode::IfCmp { .. }
                | Opcode::IfZero { .. }
                | Opcode::Goto { .. }
                | Opcode::Switch { .. }
                | Opcode::Throw { .. }
                | Opcode::Return { .. }
                | Opcode::ReturnVoid
        )
    }

    /// Returns `true` if control may continue to the next instruction.
    #[must_use]
    pub fn falls_through(&self) -> bool {
        !matches!(
            self.opcode,
            Opcode::Goto { .. } | Opcode::Throw { .. } | Opcode::Return { .. } | Opcode::ReturnVoid
        )
    }

    /// Returns `true` if this is a conditional branch.
    #[must_use]
    pub fn is_conditional_branch(&self) -> bool {
        matches!(self.opcode, Opcode::IfCmp { .. } | Opcode::IfZero { .. })
    }
}

/// An exception handler entry from the method's handler table.
///
/// The covered range is half-open over instruction indices. The handler is
/// integrated into the CFG as an extra edge from every covered block, so
/// structuring treats exceptional flow uniformly with normal flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionHandler {
    /// First covered instruction index.
    pub start: usize,
    /// One past the last covered instruction index.
    pub end: usize,
    /// Caught exception type; `None` is a catch-all.
    pub catch_type: Option<UnitName>,
    /// Handler entry instruction index.
    pub handler: usize,
}

impl ExceptionHandler {
    /// Returns `true` if the handler covers the given instruction index.
    #[must_use]
    pub fn covers(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }

    /// Number of instructions in the covered range.
    #[must_use]
    pub fn span(&self) -> usize {
        self.end.saturating_sub(self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ins(op: Opcode) -> Instruction {
        Instruction::new(op)
    }

    #[test]
    fn test_reg_display() {
        assert_eq!(Reg(3).to_string(), "v3");
        assert_eq!(Reg(3).index(), 3);
    }

    #[test]
    fn test_def_use_binary() {
        let i = ins(Opcode::Binary {
            op: BinOp::Add,
            dest: Reg(0),
            lhs: Reg(1),
            rhs: Reg(2),
        });
        assert_eq!(i.def(), Some(Reg(0)));
        assert_eq!(i.uses(), vec![Reg(1), Reg(2)]);
        assert!(!i.is_terminator());
    }

    #[test]
    fn test_def_use_invoke() {
        let i = ins(Opcode::Invoke {
            kind: InvokeKind::Virtual,
            method: MethodRef {
                owner: UnitName::new("a.B"),
                name: "f".to_string(),
                params: vec![JavaType::Int],
                ret: Some(JavaType::Int),
            },
            args: vec![Reg(4), Reg(5)],
            dest: Some(Reg(0)),
        });
        assert_eq!(i.def(), Some(Reg(0)));
        assert_eq!(i.uses(), vec![Reg(4), Reg(5)]);
    }

    #[test]
    fn test_terminators() {
        let goto = ins(Opcode::Goto { target: 7 });
        assert!(goto.is_terminator());
        assert!(!goto.falls_through());
        assert_eq!(goto.branch_targets(), vec![7]);

        let branch = ins(Opcode::IfZero {
            kind: CmpKind::Eq,
            reg: Reg(0),
            target: 3,
        });
        assert!(branch.is_terminator());
        assert!(branch.falls_through());
        assert!(branch.is_conditional_branch());

        let ret = ins(Opcode::ReturnVoid);
        assert!(ret.is_terminator());
        assert!(!ret.falls_through());
        assert!(ret.branch_targets().is_empty());
    }

    #[test]
    fn test_switch_targets() {
        let sw = ins(Opcode::Switch {
            selector: Reg(1),
            cases: vec![(0, 4), (1, 8), (5, 12)],
        });
        assert_eq!(sw.branch_targets(), vec![4, 8, 12]);
        assert_eq!(sw.uses(), vec![Reg(1)]);
        assert!(sw.falls_through());
    }

    #[test]
    fn test_cmp_kind_negate() {
        assert_eq!(CmpKind::Eq.negate(), CmpKind::Ne);
        assert_eq!(CmpKind::Lt.negate(), CmpKind::Ge);
        assert_eq!(CmpKind::Le.negate(), CmpKind::Gt);
        assert_eq!(CmpKind::Lt.symbol(), "<");
    }

    #[test]
    fn test_handler_covers() {
        let h = ExceptionHandler {
            start: 2,
            end: 5,
            catch_type: None,
            handler: 9,
        };
        assert!(!h.covers(1));
        assert!(h.covers(2));
        assert!(h.covers(4));
        assert!(!h.covers(5));
        assert_eq!(h.span(), 3);
    }
}
