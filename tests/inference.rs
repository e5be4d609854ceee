//! Type and variable inference integration tests.
//!
//! Covers the inference contract through the public API: register splitting
//! across disjoint live ranges, deterministic results across repeated runs,
//! and conflict degradation that surfaces as visible diagnostics instead of
//! failures.

use dexlift::{
    ir::{
        AccessFlags, CmpKind, ConstValue, FieldRef, Instruction, InvokeKind, JavaType, Method,
        MethodRef, MethodSig, Opcode, Reg, Unit, UnitName,
    },
    prelude::*,
};

fn unit_with(m: Method) -> Unit {
    let mut unit = Unit::new(
        UnitName::new("test.Subject"),
        Some(UnitName::object()),
        AccessFlags::PUBLIC,
    );
    unit.add_method(m);
    unit
}

fn decompile(m: Method) -> MethodResult {
    let unit = unit_with(m);
    let decompiler = Decompiler::new(SymbolTable::new(), DecompileOptions::default());
    decompiler.decompile_method(&unit, &unit.methods()[0])
}

fn sink_ref() -> MethodRef {
    MethodRef {
        owner: UnitName::new("test.Sink"),
        name: "use".to_string(),
        params: vec![JavaType::Int],
        ret: None,
    }
}

#[test]
fn register_split_renders_two_declarations() {
    // Two sequential if blocks, each assigning a different literal to the
    // same register and consuming it inside the block: live ranges are
    // disjoint, so the register must split into two declared variables.
    let m = Method::new(
        "split",
        MethodSig::new(vec![JavaType::Int], None),
        AccessFlags::PUBLIC | AccessFlags::STATIC,
        2,
        vec![
            Instruction::new(Opcode::IfZero {
                kind: CmpKind::Eq,
                reg: Reg(1),
                target: 3,
            }),
            Instruction::new(Opcode::Const {
                dest: Reg(0),
                value: ConstValue::Int(1),
            }),
            Instruction::new(Opcode::Invoke {
                kind: InvokeKind::Static,
                method: sink_ref(),
                args: vec![Reg(0)],
                dest: None,
            }),
            Instruction::new(Opcode::IfZero {
                kind: CmpKind::Ne,
                reg: Reg(1),
                target: 6,
            }),
            Instruction::new(Opcode::Const {
                dest: Reg(0),
                value: ConstValue::Int(2),
            }),
            Instruction::new(Opcode::Invoke {
                kind: InvokeKind::Static,
                method: sink_ref(),
                args: vec![Reg(0)],
                dest: None,
            }),
            Instruction::new(Opcode::ReturnVoid),
        ],
        Vec::new(),
    );
    let result = decompile(m);

    assert!(result.is_success(), "{:?}", result.attributes());
    let code = result.code();
    assert!(
        code.contains("int v0 = 1;"),
        "first range must declare its own variable:\n{code}"
    );
    assert!(
        code.contains("int v1 = 2;"),
        "second range must declare a distinct variable:\n{code}"
    );
}

#[test]
fn merged_branches_share_one_declaration() {
    // if/else assigning the same register, used after the merge: one variable
    // declared once at method top.
    let m = Method::new(
        "merge",
        MethodSig::new(vec![JavaType::Int], Some(JavaType::Int)),
        AccessFlags::PUBLIC | AccessFlags::STATIC,
        2,
        vec![
            Instruction::new(Opcode::IfZero {
                kind: CmpKind::Eq,
                reg: Reg(1),
                target: 3,
            }),
            Instruction::new(Opcode::Const {
                dest: Reg(0),
                value: ConstValue::Int(1),
            }),
            Instruction::new(Opcode::Goto { target: 4 }),
            Instruction::new(Opcode::Const {
                dest: Reg(0),
                value: ConstValue::Int(2),
            }),
            Instruction::new(Opcode::Return { reg: Reg(0) }),
        ],
        Vec::new(),
    );
    let result = decompile(m);

    assert!(result.is_success());
    let code = result.code();
    assert!(code.contains("int v0;"), "merged variable declares at top:\n{code}");
    assert!(code.contains("v0 = 1;"));
    assert!(code.contains("v0 = 2;"));
    assert!(code.contains("return v0;"));
    assert_eq!(
        code.matches("int v0").count(),
        1,
        "exactly one declaration for the merged variable:\n{code}"
    );
}

#[test]
fn inference_is_deterministic_across_runs() {
    let build = || {
        Method::new(
            "det",
            MethodSig::new(vec![JavaType::Int, JavaType::Int], Some(JavaType::Int)),
            AccessFlags::PUBLIC | AccessFlags::STATIC,
            4,
            vec![
                Instruction::new(Opcode::Binary {
                    op: dexlift::ir::BinOp::Add,
                    dest: Reg(0),
                    lhs: Reg(2),
                    rhs: Reg(3),
                }),
                Instruction::new(Opcode::Binary {
                    op: dexlift::ir::BinOp::Mul,
                    dest: Reg(1),
                    lhs: Reg(0),
                    rhs: Reg(2),
                }),
                Instruction::new(Opcode::Return { reg: Reg(1) }),
            ],
            Vec::new(),
        )
    };

    let first = decompile(build());
    let second = decompile(build());
    assert_eq!(
        first.code(),
        second.code(),
        "identical inputs must render identically"
    );
}

#[test]
fn field_types_flow_into_variables() {
    let field = FieldRef {
        owner: UnitName::new("test.Holder"),
        name: "label".to_string(),
        ty: JavaType::object("java.lang.String"),
    };
    let m = Method::new(
        "load",
        MethodSig::new(vec![], Some(JavaType::object("java.lang.String"))),
        AccessFlags::PUBLIC | AccessFlags::STATIC,
        1,
        vec![
            Instruction::new(Opcode::FieldGet {
                dest: Reg(0),
                object: None,
                field,
            }),
            Instruction::new(Opcode::Return { reg: Reg(0) }),
        ],
        Vec::new(),
    );
    let result = decompile(m);

    assert!(result.is_success());
    let code = result.code();
    assert!(
        code.contains("String v0 = test.Holder.label;"),
        "field type must flow into the declaration:\n{code}"
    );
}

#[test]
fn null_literal_adopts_reference_type() {
    let field = FieldRef {
        owner: UnitName::new("test.Holder"),
        name: "label".to_string(),
        ty: JavaType::object("java.lang.String"),
    };
    let m = Method::new(
        "clear",
        MethodSig::void(),
        AccessFlags::PUBLIC | AccessFlags::STATIC,
        1,
        vec![
            Instruction::new(Opcode::Const {
                dest: Reg(0),
                value: ConstValue::Null,
            }),
            Instruction::new(Opcode::FieldPut {
                src: Reg(0),
                object: None,
                field,
            }),
            Instruction::new(Opcode::ReturnVoid),
        ],
        Vec::new(),
    );
    let result = decompile(m);

    assert!(result.is_success());
    let code = result.code();
    assert!(code.contains("String v0 = null;"), "{code}");
    assert!(code.contains("test.Holder.label = v0;"));
}

#[test]
fn undefined_register_read_warns_but_renders() {
    let m = Method::new(
        "broken",
        MethodSig::new(vec![], Some(JavaType::Int)),
        AccessFlags::PUBLIC | AccessFlags::STATIC,
        2,
        vec![Instruction::new(Opcode::Return { reg: Reg(0) })],
        Vec::new(),
    );
    let result = decompile(m);

    // Warned, not failed; the raw register name survives in the output
    assert!(result.is_success());
    assert!(result
        .attributes()
        .warnings()
        .iter()
        .any(|w| w.contains("undefined register")));
    assert!(result.code().contains("// warning:"));
    assert!(result.code().contains("return v0;"));
}

#[test]
fn constructor_invocation_fuses_with_allocation() {
    let ctor = MethodRef {
        owner: UnitName::new("java.lang.StringBuilder"),
        name: "<init>".to_string(),
        params: vec![],
        ret: None,
    };
    let m = Method::new(
        "make",
        MethodSig::new(
            vec![],
            Some(JavaType::object("java.lang.StringBuilder")),
        ),
        AccessFlags::PUBLIC | AccessFlags::STATIC,
        1,
        vec![
            Instruction::new(Opcode::NewInstance {
                dest: Reg(0),
                class: UnitName::new("java.lang.StringBuilder"),
            }),
            Instruction::new(Opcode::Invoke {
                kind: InvokeKind::Direct,
                method: ctor,
                args: vec![Reg(0)],
                dest: None,
            }),
            Instruction::new(Opcode::Return { reg: Reg(0) }),
        ],
        Vec::new(),
    );
    let result = decompile(m);

    assert!(result.is_success());
    let code = result.code();
    assert!(
        code.contains("v0 = new StringBuilder();"),
        "allocation and constructor must fuse into one expression:\n{code}"
    );
    assert_eq!(
        code.matches("new StringBuilder").count(),
        1,
        "no duplicate allocation:\n{code}"
    );
}
