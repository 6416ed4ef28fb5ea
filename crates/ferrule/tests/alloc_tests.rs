//! Allocation tests for the scalar fast path
//!
//! Lives in its own test binary because it installs a counting global
//! allocator. Counts are per thread so parallel tests do not interfere.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

use ferrule::*;
use pretty_assertions::assert_eq;

struct Counting;

thread_local! {
    static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
}

unsafe impl GlobalAlloc for Counting {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let _ = ALLOCATIONS.try_with(|n| n.set(n.get() + 1));
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let _ = ALLOCATIONS.try_with(|n| n.set(n.get() + 1));
        System.realloc(ptr, layout, new_size)
    }
}

#[global_allocator]
static GLOBAL: Counting = Counting;

fn allocations_during<T>(f: impl FnOnce() -> T) -> (T, usize) {
    let before = ALLOCATIONS.with(Cell::get);
    let result = f();
    let after = ALLOCATIONS.with(Cell::get);
    (result, after - before)
}

#[test]
fn test_integer_compound_assignment_does_not_allocate() {
    let mut ctx = Runtime::new().thread();
    ctx.env_mut().define("n", Value::Int(1));
    let mut slot = ctx.resolve_write(&LvaluePath::var("n")).unwrap();

    let ops = [
        CompoundOp::Add,
        CompoundOp::Sub,
        CompoundOp::Mul,
        CompoundOp::Div,
        CompoundOp::Rem,
        CompoundOp::BitAnd,
        CompoundOp::BitOr,
        CompoundOp::BitXor,
        CompoundOp::Shl,
        CompoundOp::Shr,
    ];
    let operand = Value::Int(3);
    for op in ops {
        let (result, allocations) = allocations_during(|| slot.apply(op, &operand));
        assert!(result.is_ok());
        assert_eq!(allocations, 0, "{} allocated", op);
    }
    ctx.release(slot).unwrap();
}

#[test]
fn test_float_compound_assignment_does_not_allocate() {
    let mut ctx = Runtime::new().thread();
    ctx.env_mut().define("f", Value::Float(2.0));
    let mut slot = ctx.resolve_write(&LvaluePath::var("f")).unwrap();

    let operand = Value::Float(0.5);
    for op in [CompoundOp::Add, CompoundOp::Sub, CompoundOp::Mul, CompoundOp::Div] {
        let (result, allocations) = allocations_during(|| slot.apply(op, &operand));
        assert!(result.is_ok());
        assert_eq!(allocations, 0, "{} allocated", op);
    }
    ctx.release(slot).unwrap();
}

#[test]
fn test_increment_does_not_allocate() {
    let mut ctx = Runtime::new().thread();
    ctx.env_mut().define("i", Value::Int(0));
    let mut slot = ctx.resolve_write(&LvaluePath::var("i")).unwrap();

    for kind in [
        IncDec::PreIncrement,
        IncDec::PostIncrement,
        IncDec::PreDecrement,
        IncDec::PostDecrement,
    ] {
        let (result, allocations) = allocations_during(|| slot.step(kind));
        assert!(result.is_ok());
        assert_eq!(allocations, 0, "{:?} allocated", kind);
    }
    ctx.release(slot).unwrap();
}

#[test]
fn test_boxed_integer_write_does_allocate() {
    let mut ctx = Runtime::new().thread();
    let shared = Value::boxed_int(1);
    ctx.env_mut().define("b", shared.clone());
    let mut slot = ctx.resolve_write(&LvaluePath::var("b")).unwrap();

    let (result, allocations) = allocations_during(|| slot.apply(CompoundOp::Add, &Value::Int(1)));
    assert!(result.is_ok());
    assert!(allocations > 0);
    ctx.release(slot).unwrap();
    assert_eq!(shared, Value::Int(1));
}
