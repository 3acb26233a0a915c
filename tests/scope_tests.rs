//! Lexical scoping: block visibility, outward assignment, and closures
//! sharing captured frames.

mod common;

use common::*;
use luawalk::ast::{BinaryOp, Statement};
use luawalk::{Interpreter, LuaValue};

#[test]
fn test_do_block_local_invisible_outside() {
    // do local hidden = 1 end; return hidden
    let chunk = block(vec![
        Statement::Do(block(vec![local(&["hidden"], vec![num(1.0)])])),
        ret(vec![name("hidden")]),
    ]);
    assert_eq!(run_ok(chunk).first(), LuaValue::Nil);
}

#[test]
fn test_inner_local_shadows_then_unwinds() {
    // local x = 1; do local x = 2; inner = x end; return inner, x
    let chunk = block(vec![
        local(&["x"], vec![num(1.0)]),
        Statement::Do(block(vec![
            local(&["x"], vec![num(2.0)]),
            assign("inner", name("x")),
        ])),
        ret(vec![name("inner"), name("x")]),
    ]);
    let result = run_ok(chunk);
    assert_eq!(result.into_values(), vec![n(2.0), n(1.0)]);
}

#[test]
fn test_swap_is_atomic() {
    // a, b = b, a
    let chunk = block(vec![
        local(&["a", "b"], vec![num(1.0), num(2.0)]),
        assign_many(&["a", "b"], vec![name("b"), name("a")]),
        ret(vec![name("a"), name("b")]),
    ]);
    let result = run_ok(chunk);
    assert_eq!(result.into_values(), vec![n(2.0), n(1.0)]);
}

#[test]
fn test_bare_assignment_targets_nearest_declaration() {
    // local x = 1; local function bump() x = x + 1 end; bump(); return x
    let chunk = block(vec![
        local(&["x"], vec![num(1.0)]),
        local(
            &["bump"],
            vec![function(
                &[],
                block(vec![assign("x", add(name("x"), num(1.0)))]),
            )],
        ),
        call_stmt(call_name("bump", vec![])),
        call_stmt(call_name("bump", vec![])),
        ret(vec![name("x")]),
    ]);
    assert_eq!(run_ok(chunk).first(), n(3.0));
}

#[test]
fn test_assignment_to_unbound_name_creates_global() {
    // A bare write deep inside nested scopes lands in the root frame
    let mut interp = Interpreter::new();
    let chunk = block(vec![Statement::Do(block(vec![Statement::Do(block(
        vec![assign("created", num(11.0))],
    ))]))]);
    interp.execute(&chunk).unwrap();
    assert_eq!(
        interp.root_scope().borrow().get("created"),
        LuaValue::Number(11.0)
    );
}

#[test]
fn test_globals_persist_across_chunks_locals_do_not() {
    let mut interp = Interpreter::new();
    interp
        .execute(&block(vec![
            local(&["secret"], vec![num(1.0)]),
            assign("shared", num(2.0)),
        ]))
        .unwrap();

    let result = interp
        .execute(&block(vec![ret(vec![name("secret"), name("shared")])]))
        .unwrap();
    assert_eq!(result.into_values(), vec![LuaValue::Nil, n(2.0)]);
}

#[test]
fn test_two_closures_share_captured_variable() {
    // local count = 0
    // local function inc() count = count + 1 end
    // local function get() return count end
    let chunk = block(vec![
        local(&["count"], vec![num(0.0)]),
        local(
            &["inc"],
            vec![function(
                &[],
                block(vec![assign("count", add(name("count"), num(1.0)))]),
            )],
        ),
        local(
            &["get"],
            vec![function(&[], block(vec![ret(vec![name("count")])]))],
        ),
        call_stmt(call_name("inc", vec![])),
        call_stmt(call_name("inc", vec![])),
        call_stmt(call_name("inc", vec![])),
        ret(vec![call_name("get", vec![]), name("count")]),
    ]);
    let result = run_ok(chunk);
    assert_eq!(result.into_values(), vec![n(3.0), n(3.0)]);
}

#[test]
fn test_closure_keeps_frame_alive_after_block_exits() {
    // do local hidden = 7; getter = function() return hidden end end
    // return getter()
    let chunk = block(vec![
        Statement::Do(block(vec![
            local(&["hidden"], vec![num(7.0)]),
            assign(
                "getter",
                function(&[], block(vec![ret(vec![name("hidden")])])),
            ),
        ])),
        ret(vec![call_name("getter", vec![])]),
    ]);
    assert_eq!(run_ok(chunk).first(), n(7.0));
}

#[test]
fn test_loop_closures_capture_per_iteration_variable() {
    // for i = 1, 3 do t[i] = function() return i end end
    // Each closure sees its own i, not the final one
    let chunk = block(vec![
        local(&["t"], vec![table(vec![])]),
        Statement::NumericFor {
            var: "i".to_string(),
            start: num(1.0),
            limit: num(3.0),
            step: None,
            block: block(vec![assign_index(
                name("t"),
                name("i"),
                function(&[], block(vec![ret(vec![name("i")])])),
            )]),
        },
        ret(vec![
            call(idx(name("t"), num(1.0)), vec![]),
            call(idx(name("t"), num(2.0)), vec![]),
            call(idx(name("t"), num(3.0)), vec![]),
        ]),
    ]);
    let result = run_ok(chunk);
    assert_eq!(result.into_values(), vec![n(1.0), n(2.0), n(3.0)]);
}

#[test]
fn test_counter_factory_instances_are_independent() {
    // local function make() local c = 0; return function() c = c + 1;
    //   return c end end
    let chunk = block(vec![
        local(
            &["make"],
            vec![function(
                &[],
                block(vec![
                    local(&["c"], vec![num(0.0)]),
                    ret(vec![function(
                        &[],
                        block(vec![
                            assign("c", add(name("c"), num(1.0))),
                            ret(vec![name("c")]),
                        ]),
                    )]),
                ]),
            )],
        ),
        local(&["a"], vec![call_name("make", vec![])]),
        local(&["b"], vec![call_name("make", vec![])]),
        call_stmt(call_name("a", vec![])),
        call_stmt(call_name("a", vec![])),
        ret(vec![call_name("a", vec![]), call_name("b", vec![])]),
    ]);
    let result = run_ok(chunk);
    assert_eq!(result.into_values(), vec![n(3.0), n(1.0)]);
}

#[test]
fn test_parameter_shadows_outer_local() {
    let chunk = block(vec![
        local(&["x"], vec![num(1.0)]),
        local(
            &["f"],
            vec![function(
                &["x"],
                block(vec![ret(vec![binary(
                    BinaryOp::Multiplication,
                    name("x"),
                    num(10.0),
                )])]),
            )],
        ),
        ret(vec![call_name("f", vec![num(5.0)]), name("x")]),
    ]);
    let result = run_ok(chunk);
    assert_eq!(result.into_values(), vec![n(50.0), n(1.0)]);
}

#[test]
fn test_local_rhs_sees_outer_binding() {
    // local x = 10; do local x = x + 1; shadowed = x end
    let chunk = block(vec![
        local(&["x"], vec![num(10.0)]),
        Statement::Do(block(vec![
            local(&["x"], vec![add(name("x"), num(1.0))]),
            assign("shadowed", name("x")),
        ])),
        ret(vec![name("shadowed"), name("x")]),
    ]);
    let result = run_ok(chunk);
    assert_eq!(result.into_values(), vec![n(11.0), n(10.0)]);
}
