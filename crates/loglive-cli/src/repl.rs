//! `loglive repl`: grow a document one line at a time
//!
//! Each accepted line is appended to an in-memory document and the whole
//! pipeline re-runs, so later lines see earlier declarations exactly as
//! they would in an editor. A line that breaks the parse is rejected.

use anyhow::Result;
use loglive::{DocumentId, FsSourceProvider, Session, TextDocument};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::render::{render_annotated, Palette, TerminalSink};
use crate::SettingsArgs;

const HELP: &str = "\
.show    print the document with its annotations
.env     list bound names
.clear   start a new document
.exit    quit";

pub fn repl(args: &SettingsArgs) -> Result<()> {
    let path = std::env::current_dir()?.join("repl.ts");
    let session = Session::with_settings(FsSourceProvider, args.load()?);
    let doc = DocumentId::new(path.clone());
    session.set_active(Some(doc.clone()));

    let palette = Palette::detect();
    let mut editor = DefaultEditor::new()?;
    let mut sink = TerminalSink::default();
    let mut lines: Vec<String> = Vec::new();
    println!("LogLive {} (.help for commands)", loglive::VERSION);

    loop {
        let line = match editor.readline("» ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        editor.add_history_entry(line.as_str())?;

        match trimmed {
            ".exit" | ".quit" => break,
            ".help" => println!("{}", HELP),
            ".show" => print!("{}", render_annotated(&lines.join("\n"), &sink.annotations, palette)),
            ".env" => {
                let names = session.binding_names(&doc).unwrap_or_default();
                println!("{}", names.join(", "));
            }
            ".clear" => {
                lines.clear();
                session.close_document(&doc);
                session.set_active(Some(doc.clone()));
                sink.annotations.clear();
            }
            _ => {
                lines.push(line.clone());
                let document = TextDocument::new(&path, &lines.join("\n"));
                let Some(report) = session.handle_change(&doc, &document, &session, &mut sink) else {
                    continue;
                };
                if let Some(err) = report.syntax_error {
                    lines.pop();
                    eprintln!("{}", err);
                    // Restore the previous document's annotations
                    let document = TextDocument::new(&path, &lines.join("\n"));
                    session.handle_change(&doc, &document, &session, &mut sink);
                    continue;
                }

                let current = lines.len() - 1;
                for annotation in sink.annotations.iter().filter(|a| a.line == current) {
                    println!("{}", palette.paint(&annotation.text));
                }
                for (_, failure) in sink.failures.iter().filter(|(l, _)| *l == current) {
                    eprintln!("{}", failure);
                }
                if args.failures {
                    for err in report.binding_failures.iter().chain(&report.import_failures) {
                        eprintln!("{}", err);
                    }
                }
            }
        }
    }

    session.deactivate(&mut sink);
    Ok(())
}
