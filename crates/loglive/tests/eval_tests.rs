//! Evaluation and rendering of whole documents

use std::path::Path;

use loglive::*;
use pretty_assertions::assert_eq;

fn run_with(text: &str, settings: Settings) -> RunReport {
    let mut env = Environment::new();
    pipeline::run(
        text,
        Path::new("/project/doc.ts"),
        &settings,
        MemorySourceProvider::new(),
        &mut env,
    )
}

fn shown(text: &str) -> Vec<String> {
    run_with(text, Settings::default())
        .annotations
        .into_iter()
        .map(|a| a.text)
        .collect()
}

fn failure_kinds(text: &str, settings: Settings) -> Vec<FailureKind> {
    run_with(text, settings)
        .evaluation_failures
        .into_iter()
        .map(|f| f.failure.kind)
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════
// Language Features
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_closure_state_lives_in_the_bound_value() {
    let text = "\
function makeCounter() {
  let count = 0;
  return () => ++count;
}
const next = makeCounter();
console.log(next() + next());";
    assert_eq!(shown(text), vec!["3"]);
}

#[test]
fn test_class_methods_and_instances() {
    let text = "\
class Point {
  constructor(x, y) { this.x = x; this.y = y; }
  norm() { return Math.sqrt(this.x * this.x + this.y * this.y); }
}
console.log(new Point(3, 4).norm());
console.log(new Point(1, 2));
console.log(Point);";
    assert_eq!(shown(text), vec!["5", "Point { x: 1, y: 2 }", "[class Point]"]);
}

#[test]
fn test_try_catch_inside_functions() {
    let text = "\
function safe() {
  try { throw new Error('caught'); } catch (e) { return e.message; }
}
console.log(safe());";
    assert_eq!(shown(text), vec!["caught"]);
}

#[test]
fn test_typescript_annotations_are_ignored() {
    let text = "\
interface Shape { area(): number }
type Id = string;
function area(r: number): number { return r * r; }
const size = area(3) as number;
console.log(size);";
    assert_eq!(shown(text), vec!["9"]);
}

#[test]
fn test_uninitialised_let_binds_undefined() {
    assert_eq!(shown("let x;\nconsole.log(x === undefined);"), vec!["true"]);
}

#[test]
fn test_destructuring_declarations_are_not_bound() {
    assert_eq!(
        shown("const { a } = { a: 1 };\nconsole.log(typeof a);"),
        vec!["undefined"]
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Failures
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_failure_categories() {
    let text = "\
console.log(nope);
console.log(null.x);
console.log((() => { throw 'boom'; })());";
    assert_eq!(
        failure_kinds(text, Settings::default()),
        vec![FailureKind::Reference, FailureKind::Type, FailureKind::Thrown]
    );
}

#[test]
fn test_runaway_recursion_is_a_range_failure() {
    let settings = Settings {
        max_call_depth: 64,
        ..Settings::default()
    };
    let text = "function down(n) { return down(n + 1); }\nconsole.log(down(0));";
    assert_eq!(failure_kinds(text, settings), vec![FailureKind::Range]);
}

#[test]
fn test_infinite_loop_times_out_and_later_targets_run() {
    let settings = Settings {
        eval_timeout_ms: 20,
        ..Settings::default()
    };
    let text = "console.log((() => { while (true) {} })());\nconsole.log('after');";
    let report = run_with(text, settings);
    assert_eq!(report.evaluation_failures[0].failure.kind, FailureKind::Timeout);
    assert_eq!(report.annotations.len(), 1);
    assert_eq!(report.annotations[0].text, "after");
}

#[test]
fn test_failing_target_line_is_reported() {
    let report = run_with("const a = 1;\n\nconsole.log(a.b.c);", Settings::default());
    assert_eq!(report.evaluation_failures.len(), 1);
    assert_eq!(report.evaluation_failures[0].line, 2);
    assert_eq!(report.evaluation_failures[0].kind, TargetKind::DebugPrintCall);
}

#[test]
fn test_spread_print_fails_without_annotation() {
    let text = "const xs = [1, 2];\nconsole.log(...xs);";
    let report = run_with(text, Settings::default());
    assert!(report.annotations.is_empty());
    assert_eq!(report.evaluation_failures[0].failure.kind, FailureKind::Syntax);
}

// ═══════════════════════════════════════════════════════════════════════
// Rendering
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_top_level_strings_are_bare_nested_are_quoted() {
    assert_eq!(
        shown("console.log('hi');\nconsole.log(['hi']);"),
        vec!["hi", "[ 'hi' ]"]
    );
}

#[test]
fn test_cycles_render_as_circular() {
    let text = "\
const loop = (() => { const o = { name: 'o' }; o.self = o; return o; })();
console.log(loop);";
    assert_eq!(shown(text), vec!["{ name: 'o', self: [Circular] }"]);
}

#[test]
fn test_depth_is_configurable() {
    let text = "console.log({ a: { b: { c: { d: 1 } } } });";
    assert_eq!(shown(text), vec!["{ a: { b: { c: [Object] } } }"]);

    let deep = Settings {
        inspect_depth: 5,
        ..Settings::default()
    };
    let report = run_with(text, deep);
    assert_eq!(report.annotations[0].text, "{ a: { b: { c: { d: 1 } } } }");
}

#[test]
fn test_functions_render_by_name() {
    let text = "\
function named() {}
console.log(named);
console.log(() => 1);
console.log(Math.max);";
    assert_eq!(
        shown(text),
        vec!["[Function: named]", "[Function (anonymous)]", "[Function: max]"]
    );
}

#[test]
fn test_errors_render_with_their_name() {
    assert_eq!(
        shown("console.log(new TypeError('bad input'));"),
        vec!["TypeError: bad input"]
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Resource Limits
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_oversized_strings_are_range_failures() {
    let text = "\
console.log('ab'.repeat(1e10));
console.log('abc'.padStart(1e12));
console.log('abc'.padEnd(1e12, 'xy'));
console.log((() => { let s = 'x'.repeat(2 ** 28); return s + s + s; })());
console.log((() => { let s = 'x'.repeat(2 ** 28); s += s; s += s; return s.length; })());
console.log((() => { const s = 'x'.repeat(2 ** 28); return `${s}${s}${s}`; })());";
    assert_eq!(
        failure_kinds(text, Settings::default()),
        vec![FailureKind::Range; 6]
    );
}

#[test]
fn test_oversized_arrays_are_range_failures() {
    let text = "\
console.log(Array.from({ length: 1e12 }));
console.log(Array(2 ** 32 - 1));
console.log(new Array(1e9).length);
console.log((() => { const a = []; a[1e9] = 1; return a.length; })());
console.log((() => { const a = [1]; a.length = 1e9; return a.length; })());";
    assert_eq!(
        failure_kinds(text, Settings::default()),
        vec![FailureKind::Range; 5]
    );
}

#[test]
fn test_cyclic_flat_stops_at_the_length_cap() {
    let text = "console.log((() => { const a = []; a.push(a); return a.flat(Infinity); })());";
    let settings = Settings {
        eval_timeout_ms: 0,
        ..Settings::default()
    };
    assert_eq!(failure_kinds(text, settings), vec![FailureKind::Range]);
}

#[test]
fn test_reasonable_sizes_still_work() {
    let text = "\
console.log('ab'.repeat(3));
console.log(Array.from({ length: 3 }).length);
console.log((() => { const a = []; a[9] = 1; return a.length; })());";
    assert_eq!(shown(text), vec!["ababab", "3", "10"]);
}

#[test]
fn test_deeply_nested_document_is_a_syntax_error() {
    let text = format!("const x = {}1{};\nconsole.log(1);", "[".repeat(10_000), "]".repeat(10_000));
    let report = run_with(&text, Settings::default());
    let error = report.syntax_error.expect("nesting limit");
    assert_eq!(error.message, "nesting is too deep");
    assert!(report.annotations.is_empty());
}

#[test]
fn test_deeply_nested_snippet_fails_cleanly() {
    let snippet = format!("{}1{}", "[".repeat(10_000), "]".repeat(10_000));
    let outcome = evaluate(&snippet, &Environment::new(), &EvalContext::new());
    assert_eq!(outcome.failure().unwrap().kind, FailureKind::Syntax);
}

#[test]
fn test_deeply_nested_runtime_values_are_released() {
    let text = "\
console.log((() => { let a = []; for (let i = 0; i < 200000; i++) { a = [a]; } return 1; })());
console.log((() => { let a = []; for (let i = 0; i < 20000; i++) { a = [a]; } return String(a).length; })());";
    let settings = Settings {
        eval_timeout_ms: 0,
        ..Settings::default()
    };
    let shown: Vec<_> = run_with(text, settings)
        .annotations
        .into_iter()
        .map(|a| a.text)
        .collect();
    assert_eq!(shown, vec!["1", "0"]);
}
