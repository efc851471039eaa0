//! End-to-end properties of a single pipeline run

use std::path::Path;

use loglive::*;
use pretty_assertions::assert_eq;

fn settings(show_all: bool) -> Settings {
    Settings {
        show_all_expressions: show_all,
        ..Settings::default()
    }
}

fn run_doc(text: &str, show_all: bool) -> (RunReport, Environment) {
    let mut env = Environment::new();
    let report = pipeline::run(
        text,
        Path::new("/project/main.ts"),
        &settings(show_all),
        MemorySourceProvider::new(),
        &mut env,
    );
    (report, env)
}

fn annotations(report: &RunReport) -> Vec<(usize, &str)> {
    report
        .annotations
        .iter()
        .map(|a| (a.line, a.text.as_str()))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════
// Debug-print and mode gating
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_debug_print_annotates_regardless_of_flag() {
    for show_all in [false, true] {
        let (report, _) = run_doc("console.log(2 + 2);", show_all);
        let prints: Vec<_> = report
            .annotations
            .iter()
            .filter(|a| a.text == "4")
            .collect();
        assert!(!prints.is_empty());
        assert!(prints.iter().all(|a| a.line == 0));
    }
    let (report, _) = run_doc("console.log(2 + 2);", false);
    assert_eq!(annotations(&report), vec![(0, "4")]);
}

#[test]
fn test_bare_expression_needs_flag() {
    let (off, _) = run_doc("2 + 2;", false);
    assert!(off.annotations.is_empty());

    let (on, _) = run_doc("2 + 2;", true);
    assert_eq!(annotations(&on), vec![(0, "4")]);
}

#[test]
fn test_variable_initializers_need_flag() {
    let text = "const greeting = 'hi ' + 'there';";
    assert!(run_doc(text, false).0.annotations.is_empty());
    assert_eq!(annotations(&run_doc(text, true).0), vec![(0, "hi there")]);
}

#[test]
fn test_multiple_arguments_collapse_to_last() {
    let (report, _) = run_doc("console.log(1, 2, 3);", false);
    assert_eq!(annotations(&report), vec![(0, "3")]);
}

#[test]
fn test_earlier_arguments_still_run() {
    let (report, _) = run_doc("console.log(missing, 3);", false);
    assert!(report.annotations.is_empty());
    assert_eq!(report.evaluation_failures.len(), 1);
}

#[test]
fn test_debug_print_statement_with_flag_stacks_two_annotations() {
    let (report, _) = run_doc("console.log(5);", true);
    // The statement itself evaluates to undefined; only the call shows
    assert_eq!(annotations(&report), vec![(0, "5")]);

    let (report, _) = run_doc("[console.log(5)];", true);
    assert_eq!(annotations(&report), vec![(0, "[ undefined ]"), (0, "5")]);
}

// ═══════════════════════════════════════════════════════════════════════
// Isolation
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_fault_isolation() {
    let text = "\
const broken = (() => { throw new Error('nope'); })();
const fine = 10;
fine * 2;";
    let (report, env) = run_doc(text, true);
    assert!(!env.contains("broken"));
    assert!(env.contains("fine"));
    assert_eq!(report.binding_failures.len(), 1);
    assert!(report.annotations.iter().any(|a| a.line == 2 && a.text == "20"));
}

#[test]
fn test_syntax_error_containment() {
    let (report, env) = run_doc("function f() {\n  console.log(1);\n", true);
    assert!(report.annotations.is_empty());
    assert!(env.is_empty());
    let err = report.syntax_error.expect("unbalanced braces should not parse");
    assert!(err.line >= 2);
}

#[test]
fn test_undefined_results_are_suppressed() {
    let text = "\
function noop() {}
noop();
console.log(undefined);
console.log(null);";
    let (report, _) = run_doc(text, true);
    assert_eq!(annotations(&report), vec![(3, "null")]);
}

// ═══════════════════════════════════════════════════════════════════════
// Scope building
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_scope_building_is_idempotent() {
    let text = "\
import { helper } from './helper';
function double(n: number): number { return n * 2; }
const base = 21;
const answer = double(base);
class Box { constructor(v) { this.v = v; } }";
    let provider =
        MemorySourceProvider::new().with("/project/helper.ts", "export const helper = 'h';");
    let program = parse(text, ParseOptions::default()).unwrap();

    let build = || {
        let mut env = Environment::new();
        build_environment(
            &program,
            text,
            Path::new("/project/main.ts"),
            &provider,
            &Settings::default(),
            &mut env,
        );
        env
    };
    let first = build();
    let second = build();

    let names = |env: &Environment| env.names().map(str::to_string).collect::<Vec<_>>();
    assert_eq!(names(&first), names(&second));
    assert_eq!(names(&first), vec!["helper", "double", "base", "answer", "Box"]);
    for name in ["helper", "base", "answer"] {
        assert_eq!(first.get(name), second.get(name));
    }
    assert_eq!(
        first.get("double").map(Value::to_display_string),
        second.get("double").map(Value::to_display_string)
    );
}

#[test]
fn test_import_binding_wins_over_local() {
    let provider = MemorySourceProvider::new()
        .with("/project/lib.ts", "export function f() { return 'from import'; }");
    let text = "\
import { f } from './lib';
function f() { return 'local'; }
console.log(f());";
    let mut env = Environment::new();
    let report = pipeline::run(
        text,
        Path::new("/project/main.ts"),
        &Settings::default(),
        &provider,
        &mut env,
    );
    assert_eq!(annotations(&report), vec![(2, "from import")]);
    assert_eq!(
        env.entry("f").map(|e| e.origin.clone()),
        Some(Origin::Import("/project/lib.ts".into()))
    );
}

#[test]
fn test_environment_is_not_mutated_by_targets() {
    let text = "\
let counter = 0;
console.log(counter = 5);
console.log(counter);";
    let (report, env) = run_doc(text, false);
    assert_eq!(annotations(&report), vec![(2, "0")]);
    assert_eq!(report.evaluation_failures[0].failure.kind, FailureKind::Type);
    assert_eq!(env.get("counter"), Some(&Value::Number(0.0)));
}
