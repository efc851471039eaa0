//! `loglive watch`: poll a file and re-annotate it on every change

use std::future::Future;
use std::io::IsTerminal;
use std::pin::Pin;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use loglive::{DocumentId, FsSourceProvider, RunReport, Session, TextDocument};
use tracing::{info, warn};

use crate::render::{print_failures, render_annotated, Palette, TerminalSink};
use crate::SettingsArgs;

/// Shortest polling interval accepted.
const MIN_INTERVAL_MS: u64 = 10;

/// How often an interrupt is re-sent until the run stops.
const INTERRUPT_REPEAT_MS: u64 = 20;

async fn modified(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path).await.ok()?.modified().ok()
}

/// Watch `file` until interrupted with Ctrl-C.
pub async fn watch(file: PathBuf, args: SettingsArgs, interval_ms: u64) -> Result<()> {
    let path = tokio::fs::canonicalize(&file)
        .await
        .with_context(|| format!("watching {}", file.display()))?;
    let session = Arc::new(Session::with_settings(FsSourceProvider, args.load()?));
    let doc = DocumentId::new(path.clone());
    session.set_active(Some(doc.clone()));

    let mut sink = TerminalSink::default();
    let mut document = TextDocument::new(&path, "");
    let mut file_seen = None;
    let mut config_seen = None;
    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms.max(MIN_INTERVAL_MS)));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    info!(path = %path.display(), "watching");

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = ticker.tick() => {}
        }

        if let Some(config) = &args.config {
            let stamp = modified(config).await;
            if stamp.is_some() && stamp != config_seen {
                config_seen = stamp;
                match args.load() {
                    Ok(settings) => session.configuration_changed(settings),
                    Err(err) => warn!(%err, "settings not reloaded"),
                }
            }
        }

        let stamp = modified(&path).await;
        if stamp.is_none() || stamp == file_seen {
            continue;
        }
        file_seen = stamp;
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(err) => {
                warn!(%err, "read failed");
                continue;
            }
        };
        document.set_text(&text);

        let (report, returned, interrupted) =
            run_interruptible(&session, &doc, &document, std::mem::take(&mut sink), ctrl_c.as_mut())
                .await?;
        sink = returned;
        if let Some(report) = report {
            redraw(&path, &text, &report, &sink, args.failures);
        }
        if interrupted {
            break;
        }
    }

    session.deactivate(&mut sink);
    Ok(())
}

/// Run one change on the blocking pool. If `cancel` resolves first the run
/// is interrupted and the last flag comes back `true`.
async fn run_interruptible<F>(
    session: &Arc<Session<FsSourceProvider>>,
    doc: &DocumentId,
    document: &TextDocument,
    mut sink: TerminalSink,
    mut cancel: Pin<&mut F>,
) -> Result<(Option<RunReport>, TerminalSink, bool)>
where
    F: Future,
{
    let run = {
        let session = Arc::clone(session);
        let doc = doc.clone();
        let document = document.clone();
        tokio::task::spawn_blocking(move || {
            let report = session.handle_change(&doc, &document, &*session, &mut sink);
            (report, sink)
        })
    };
    tokio::pin!(run);
    let mut interrupted = false;
    loop {
        tokio::select! {
            joined = &mut run => {
                let (report, sink) = joined.context("evaluation task failed")?;
                return Ok((report, sink, interrupted));
            }
            _ = cancel.as_mut(), if !interrupted => {
                info!("interrupting run");
                session.interrupt();
                interrupted = true;
            }
            // A run resets the flag on entry
            _ = tokio::time::sleep(Duration::from_millis(INTERRUPT_REPEAT_MS)), if interrupted => {
                session.interrupt();
            }
        }
    }
}

fn redraw(path: &Path, text: &str, report: &RunReport, sink: &TerminalSink, failures: bool) {
    let palette = Palette::detect();
    if std::io::stdout().is_terminal() {
        print!("\x1b[2J\x1b[H");
    }
    println!("── {} ──", path.display());
    if let Some(err) = &report.syntax_error {
        println!("{}", text);
        eprintln!("{}", err);
        return;
    }
    print!("{}", render_annotated(text, &sink.annotations, palette));
    if failures {
        print_failures(report);
    } else if !sink.failures.is_empty() {
        eprintln!(
            "{} target(s) failed; rerun with --failures for details",
            sink.failures.len()
        );
    }
}
