//! Source providers: turning import specifiers into source text
//!
//! The Scope Builder never touches the filesystem directly. It asks a
//! [`SourceProvider`] to resolve `'./util'` relative to the importing file
//! and to read the result. [`FsSourceProvider`] does this against the real
//! filesystem; [`MemorySourceProvider`] serves a fixed set of documents,
//! which is what tests and the REPL use.
//!
//! # Resolution
//!
//! ```text
//! import { f } from './util'      (in /src/main.ts)
//!
//!   /src/util            as written, if it has an extension
//!   /src/util.ts
//!   /src/util.js
//!   /src/util.tsx
//!   /src/util.jsx
//!   /src/util/index.ts   ... and the other index candidates
//! ```
//!
//! Bare specifiers (`'lodash'`) name packages and never resolve.

use std::io;
use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;

/// Extensions tried, in order, for a specifier without one.
pub const CANDIDATE_EXTENSIONS: &[&str] = &["ts", "js", "tsx", "jsx"];

/// Resolves import specifiers and reads the files they name.
pub trait SourceProvider {
    /// The file `specifier` names when imported from `from`, if any.
    fn resolve(&self, specifier: &str, from: &Path) -> Option<PathBuf>;

    /// Full text of a resolved file.
    fn read_text(&self, path: &Path) -> io::Result<String>;
}

/// Candidate paths for `specifier` imported from `from`, in the order they
/// should be tried. Empty for bare specifiers.
pub fn candidates(specifier: &str, from: &Path) -> Vec<PathBuf> {
    let base = if specifier.starts_with("./") || specifier.starts_with("../") {
        let dir = from.parent().unwrap_or_else(|| Path::new(""));
        normalize(&dir.join(specifier))
    } else if Path::new(specifier).is_absolute() {
        normalize(Path::new(specifier))
    } else {
        return Vec::new();
    };

    let mut out = Vec::new();
    if base.extension().is_some() {
        out.push(base.clone());
    }
    for ext in CANDIDATE_EXTENSIONS {
        let mut name = base.clone().into_os_string();
        name.push(".");
        name.push(ext);
        out.push(PathBuf::from(name));
    }
    for ext in CANDIDATE_EXTENSIONS {
        out.push(base.join(format!("index.{}", ext)));
    }
    out
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

// ═══════════════════════════════════════════════════════════════════════
// FILESYSTEM
// ═══════════════════════════════════════════════════════════════════════

/// Resolves against the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSourceProvider;

impl SourceProvider for FsSourceProvider {
    fn resolve(&self, specifier: &str, from: &Path) -> Option<PathBuf> {
        candidates(specifier, from).into_iter().find(|p| p.is_file())
    }

    fn read_text(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// IN-MEMORY
// ═══════════════════════════════════════════════════════════════════════

/// Serves documents registered up front.
#[derive(Debug, Clone, Default)]
pub struct MemorySourceProvider {
    files: IndexMap<PathBuf, String>,
}

impl MemorySourceProvider {
    /// An empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `text` under `path`, replacing any previous text.
    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.insert(normalize(&path.into()), text.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }
}

impl SourceProvider for MemorySourceProvider {
    fn resolve(&self, specifier: &str, from: &Path) -> Option<PathBuf> {
        candidates(specifier, from)
            .into_iter()
            .find(|p| self.files.contains_key(p))
    }

    fn read_text(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not registered", path.display()),
            )
        })
    }
}

impl<P: SourceProvider + ?Sized> SourceProvider for &P {
    fn resolve(&self, specifier: &str, from: &Path) -> Option<PathBuf> {
        (**self).resolve(specifier, from)
    }

    fn read_text(&self, path: &Path) -> io::Result<String> {
        (**self).read_text(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_candidates_order() {
        let found = candidates("./util", Path::new("/src/main.ts"));
        assert_eq!(found[0], PathBuf::from("/src/util.ts"));
        assert_eq!(found[3], PathBuf::from("/src/util.jsx"));
        assert_eq!(found[4], PathBuf::from("/src/util/index.ts"));
    }

    #[test]
    fn test_candidates_with_extension_try_it_first() {
        let found = candidates("../lib/a.js", Path::new("/src/app/main.ts"));
        assert_eq!(found[0], PathBuf::from("/src/lib/a.js"));
    }

    #[test]
    fn test_bare_specifiers_do_not_resolve() {
        assert!(candidates("lodash", Path::new("/src/main.ts")).is_empty());
    }

    #[test]
    fn test_memory_provider_resolves_by_extension() {
        let provider = MemorySourceProvider::new()
            .with("/src/util.js", "export const a = 1;")
            .with("/src/lib/index.ts", "export const b = 2;");
        let from = Path::new("/src/main.ts");
        assert_eq!(
            provider.resolve("./util", from),
            Some(PathBuf::from("/src/util.js"))
        );
        assert_eq!(
            provider.resolve("./lib", from),
            Some(PathBuf::from("/src/lib/index.ts"))
        );
        assert_eq!(provider.resolve("./missing", from), None);
        assert_eq!(
            provider.read_text(Path::new("/src/util.js")).unwrap(),
            "export const a = 1;"
        );
    }

    #[test]
    fn test_memory_provider_read_missing_is_not_found() {
        let err = MemorySourceProvider::new()
            .read_text(Path::new("/nope.ts"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_fs_provider_reads_real_files() {
        let dir = std::env::temp_dir().join(format!("loglive-source-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("m.ts"), "export const x = 1;").unwrap();
        let from = dir.join("main.ts");
        let resolved = FsSourceProvider.resolve("./m", &from).unwrap();
        assert_eq!(resolved, dir.join("m.ts"));
        assert_eq!(FsSourceProvider.read_text(&resolved).unwrap(), "export const x = 1;");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
