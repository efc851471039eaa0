//! Session protocol: scope policies, active-document filtering, run-lock

use std::sync::Arc;
use std::thread;

use loglive::*;
use pretty_assertions::assert_eq;

const DOC: &str = "/work/main.ts";

fn active_session(settings: Settings) -> (Session<MemorySourceProvider>, DocumentId) {
    let session = Session::with_settings(MemorySourceProvider::new(), settings);
    let doc = DocumentId::from(DOC);
    session.set_active(Some(doc.clone()));
    (session, doc)
}

fn change(
    session: &Session<MemorySourceProvider>,
    doc: &DocumentId,
    text: &str,
    sink: &mut RecordingSink,
) -> RunReport {
    let document = TextDocument::new(DOC, text);
    session
        .handle_change(doc, &document, session, sink)
        .expect("document is active")
}

fn shown(sink: &RecordingSink) -> Vec<String> {
    sink.annotations.iter().map(|a| a.text.clone()).collect()
}

// ═══════════════════════════════════════════════════════════════════════
// Scope Policies
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_fresh_per_run_forgets_deleted_declarations() {
    let (session, doc) = active_session(Settings::default());
    let mut sink = RecordingSink::default();

    change(&session, &doc, "const old = 1;\nconsole.log(old);", &mut sink);
    assert_eq!(shown(&sink), vec!["1"]);

    change(&session, &doc, "console.log(old);", &mut sink);
    assert!(sink.annotations.is_empty());
    assert_eq!(sink.failures.len(), 1);
    assert_eq!(sink.failures[0].1.kind, FailureKind::Reference);
}

#[test]
fn test_fresh_per_run_picks_up_edits() {
    let (session, doc) = active_session(Settings::default());
    let mut sink = RecordingSink::default();

    change(&session, &doc, "const n = 1;\nconsole.log(n);", &mut sink);
    change(&session, &doc, "const n = 2;\nconsole.log(n);", &mut sink);
    assert_eq!(shown(&sink), vec!["2"]);
}

#[test]
fn test_retain_keeps_stale_bindings() {
    let (session, doc) = active_session(Settings {
        scope_policy: ScopePolicy::Retain,
        ..Settings::default()
    });
    let mut sink = RecordingSink::default();

    change(&session, &doc, "const old = 1;", &mut sink);
    change(&session, &doc, "console.log(old);", &mut sink);
    assert_eq!(shown(&sink), vec!["1"]);
}

#[test]
fn test_retain_does_not_overwrite_edited_values() {
    let (session, doc) = active_session(Settings {
        scope_policy: ScopePolicy::Retain,
        ..Settings::default()
    });
    let mut sink = RecordingSink::default();

    change(&session, &doc, "const n = 1;", &mut sink);
    let report = change(&session, &doc, "const n = 2;\nconsole.log(n);", &mut sink);
    assert_eq!(shown(&sink), vec!["1"]);
    assert!(report.binding_failures.is_empty());
}

#[test]
fn test_policy_switch_takes_effect_on_next_run() {
    let (session, doc) = active_session(Settings {
        scope_policy: ScopePolicy::Retain,
        ..Settings::default()
    });
    let mut sink = RecordingSink::default();
    change(&session, &doc, "const old = 1;", &mut sink);

    session.configuration_changed(Settings::default());
    change(&session, &doc, "console.log(typeof old);", &mut sink);
    assert_eq!(shown(&sink), vec!["undefined"]);
}

// ═══════════════════════════════════════════════════════════════════════
// Change Protocol
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_every_run_clears_first() {
    let (session, doc) = active_session(Settings::default());
    let mut sink = RecordingSink::default();

    change(&session, &doc, "console.log(1);", &mut sink);
    change(&session, &doc, "console.log(1", &mut sink);
    assert_eq!(sink.clears, 2);
    assert!(sink.annotations.is_empty());
}

#[test]
fn test_other_documents_are_ignored() {
    let (session, _) = active_session(Settings::default());
    let mut sink = RecordingSink::default();
    let other = DocumentId::from("/work/other.ts");
    let text = TextDocument::new("/work/other.ts", "console.log(1);");

    assert!(session
        .handle_change(&other, &text, &Settings::default(), &mut sink)
        .is_none());
    assert_eq!(sink.clears, 0);
    assert_eq!(session.document_count(), 0);
}

#[test]
fn test_switching_active_document() {
    let (session, first) = active_session(Settings::default());
    let second = DocumentId::from("/work/second.ts");
    let mut sink = RecordingSink::default();

    session.set_active(Some(second.clone()));
    let text = TextDocument::new("/work/second.ts", "console.log('second');");
    session.handle_change(&second, &text, &Settings::default(), &mut sink);
    assert_eq!(shown(&sink), vec!["second"]);

    let text = TextDocument::new(DOC, "console.log('first');");
    assert!(session
        .handle_change(&first, &text, &Settings::default(), &mut sink)
        .is_none());
}

#[test]
fn test_configuration_source_is_read_per_run() {
    let (session, doc) = active_session(Settings::default());
    let mut sink = RecordingSink::default();
    let text = TextDocument::new(DOC, "6 * 7;");

    session.handle_change(&doc, &text, &Settings::default(), &mut sink);
    assert!(sink.annotations.is_empty());

    let all = Settings {
        show_all_expressions: true,
        ..Settings::default()
    };
    session.handle_change(&doc, &text, &all, &mut sink);
    assert_eq!(shown(&sink), vec!["42"]);
}

#[test]
fn test_imports_resolve_relative_to_document() {
    let provider = MemorySourceProvider::new()
        .with("/work/lib/math.ts", "export const tau = 2 * Math.PI;");
    let session = Session::new(provider);
    let doc = DocumentId::from(DOC);
    session.set_active(Some(doc.clone()));
    let mut sink = RecordingSink::default();

    let text = TextDocument::new(DOC, "import { tau } from './lib/math';\nconsole.log(tau > 6);");
    session.handle_change(&doc, &text, &session, &mut sink);
    assert_eq!(shown(&sink), vec!["true"]);
}

// ═══════════════════════════════════════════════════════════════════════
// Run-lock
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_overlapping_changes_are_serialised() {
    let session = Arc::new(Session::with_settings(
        MemorySourceProvider::new(),
        Settings {
            scope_policy: ScopePolicy::Retain,
            ..Settings::default()
        },
    ));
    let doc = DocumentId::from(DOC);
    session.set_active(Some(doc.clone()));

    thread::scope(|scope| {
        for i in 0..8 {
            let session = Arc::clone(&session);
            let doc = doc.clone();
            scope.spawn(move || {
                let text = TextDocument::new(DOC, &format!("const v{} = {};", i, i));
                let mut sink = RecordingSink::default();
                session.handle_change(&doc, &text, &Settings::default(), &mut sink);
            });
        }
    });

    // Default settings passed per run mean fresh-per-run: exactly one
    // run's bindings survive, never a mix
    let names = session.binding_names(&doc).unwrap();
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with('v'));
}

#[test]
fn test_interrupt_stops_a_running_evaluation() {
    let (session, doc) = active_session(Settings {
        eval_timeout_ms: 0,
        ..Settings::default()
    });
    let done = std::sync::atomic::AtomicBool::new(false);

    let report = thread::scope(|scope| {
        scope.spawn(|| {
            while !done.load(std::sync::atomic::Ordering::Relaxed) {
                session.interrupt();
                thread::sleep(std::time::Duration::from_millis(5));
            }
        });
        let mut sink = RecordingSink::default();
        let report = change(&session, &doc, "console.log((() => { for (;;) {} })());", &mut sink);
        done.store(true, std::sync::atomic::Ordering::Relaxed);
        report
    });

    assert_eq!(
        report.evaluation_failures[0].failure.kind,
        FailureKind::Interrupted
    );
}
