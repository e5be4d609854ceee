//! End-to-end decompilation pipeline benchmark.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use dexlift::prelude::*;
use dexlift::ir::{CmpKind, ConstValue, Field, Instruction, Opcode};

/// A unit with branch-, loop- and switch-shaped methods, sized like a small
/// real-world class.
fn build_unit() -> Unit {
    let mut unit = Unit::new(
        UnitName::new("bench.Subject"),
        Some(UnitName::object()),
        AccessFlags::PUBLIC,
    );
    unit.add_field(Field {
        name: "state".to_string(),
        ty: JavaType::Int,
        flags: AccessFlags::PRIVATE,
    });

    // if/else ladder
    unit.add_method(Method::new(
        "branchy",
        MethodSig::new(vec![JavaType::Int], Some(JavaType::Int)),
        AccessFlags::PUBLIC | AccessFlags::STATIC,
        2,
        [
            Opcode::IfZero {
                kind: CmpKind::Eq,
                reg: Reg(1),
                target: 3,
            },
            Opcode::Const {
                dest: Reg(0),
                value: ConstValue::Int(1),
            },
            Opcode::Goto { target: 4 },
            Opcode::Const {
                dest: Reg(0),
                value: ConstValue::Int(2),
            },
            Opcode::Return { reg: Reg(0) },
        ]
        .into_iter()
        .map(Instruction::new)
        .collect(),
        Vec::new(),
    ));

    // counting loop
    unit.add_method(Method::new(
        "loopy",
        MethodSig::new(vec![JavaType::Int], None),
        AccessFlags::PUBLIC | AccessFlags::STATIC,
        2,
        [
            Opcode::IfZero {
                kind: CmpKind::Eq,
                reg: Reg(1),
                target: 4,
            },
            Opcode::Const {
                dest: Reg(0),
                value: ConstValue::Int(1),
            },
            Opcode::Const {
                dest: Reg(0),
                value: ConstValue::Int(2),
            },
            Opcode::Goto { target: 0 },
            Opcode::ReturnVoid,
        ]
        .into_iter()
        .map(Instruction::new)
        .collect(),
        Vec::new(),
    ));

    // dispatch switch
    unit.add_method(Method::new(
        "switchy",
        MethodSig::new(vec![JavaType::Int], None),
        AccessFlags::PUBLIC | AccessFlags::STATIC,
        3,
        [
            Opcode::Switch {
                selector: Reg(2),
                cases: vec![(1, 3), (2, 5)],
            },
            Opcode::Const {
                dest: Reg(1),
                value: ConstValue::Int(0),
            },
            Opcode::Goto { target: 7 },
            Opcode::Const {
                dest: Reg(1),
                value: ConstValue::Int(1),
            },
            Opcode::Goto { target: 5 },
            Opcode::Const {
                dest: Reg(1),
                value: ConstValue::Int(2),
            },
            Opcode::Goto { target: 7 },
            Opcode::ReturnVoid,
        ]
        .into_iter()
        .map(Instruction::new)
        .collect(),
        Vec::new(),
    ));

    unit
}

fn bench_pipeline(c: &mut Criterion) {
    let unit = build_unit();
    let mut symbols = SymbolTable::new();
    symbols.add_units(std::slice::from_ref(&unit));
    let decompiler = Decompiler::new(symbols, DecompileOptions::default());

    c.bench_function("decompile_unit", |b| {
        b.iter(|| black_box(decompiler.decompile_unit(black_box(&unit)).unwrap()));
    });

    c.bench_function("decompile_method_loop", |b| {
        let method = &unit.methods()[1];
        b.iter(|| black_box(decompiler.decompile_method(black_box(&unit), black_box(method))));
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
