//! Owns source buffers and maps file ids to paths and line text.
use std::collections::HashMap;

/// A location within a registered source file.
///
/// Opaque outside of this crate's rendering code; never compared across
/// files for ordering. `file_id == u32::MAX` marks the invalid location,
/// produced by dialects that synthesize nodes with no concrete source
/// position (e.g. built-in symbols).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceLoc {
    pub file_id: u32,
    pub line: u32,
    pub column: u32,
}

impl SourceLoc {
    pub const INVALID: SourceLoc = SourceLoc {
        file_id: u32::MAX,
        line: 0,
        column: 0,
    };

    pub fn new(file_id: u32, line: u32, column: u32) -> Self {
        Self {
            file_id,
            line,
            column,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.file_id != u32::MAX
    }
}

impl Default for SourceLoc {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Assigns stable file ids and stores source buffers byte-for-byte.
///
/// Lines are 1-based. Bytes outside ASCII pass through unchanged; the
/// manager never normalizes encodings. A missing file or out-of-range line
/// yields an empty string rather than a fatal error.
#[derive(Debug, Default)]
pub struct SourceManager {
    paths: Vec<String>,
    buffers: Vec<String>,
    path_to_id: HashMap<String, u32>,
}

impl SourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `source` under `path`, returning its stable file id.
    ///
    /// Registering the same path twice returns the same id without
    /// re-storing the buffer (`normalize_path` is not applied here; callers
    /// that want deduplication across differently-spelled paths should
    /// normalize before calling).
    pub fn add_file(&mut self, path: impl Into<String>, source: impl Into<String>) -> u32 {
        let path = path.into();
        if let Some(&id) = self.path_to_id.get(&path) {
            return id;
        }
        let id = self.paths.len() as u32;
        self.paths.push(path.clone());
        self.buffers.push(source.into());
        self.path_to_id.insert(path, id);
        id
    }

    pub fn path(&self, file_id: u32) -> Option<&str> {
        self.paths.get(file_id as usize).map(|s| s.as_str())
    }

    pub fn source(&self, file_id: u32) -> Option<&str> {
        self.buffers.get(file_id as usize).map(|s| s.as_str())
    }

    /// Fetch the 1-based `line` of `file_id`, without trailing newline.
    /// Returns an empty string for an unknown file or out-of-range line.
    pub fn line_text(&self, file_id: u32, line: u32) -> String {
        let Some(buffer) = self.buffers.get(file_id as usize) else {
            return String::new();
        };
        if line == 0 {
            return String::new();
        }
        buffer
            .lines()
            .nth((line - 1) as usize)
            .unwrap_or("")
            .to_string()
    }

    pub fn file_count(&self) -> usize {
        self.paths.len()
    }
}

/// Normalize a filesystem-ish import path to a canonical form, collapsing
/// `.`/`..` segments and repeated separators so that different spellings of
/// the same file compare equal.
pub fn normalize_path(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for part in path.split(['/', '\\']) {
        match part {
            "" | "." => continue,
            ".." => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_path_same_id() {
        let mut sm = SourceManager::new();
        let a = sm.add_file("foo.bas", "PRINT 1");
        let b = sm.add_file("foo.bas", "ignored");
        assert_eq!(a, b);
        assert_eq!(sm.source(a), Some("PRINT 1"));
    }

    #[test]
    fn line_text_out_of_range_is_empty() {
        let mut sm = SourceManager::new();
        let id = sm.add_file("a.bas", "one\ntwo");
        assert_eq!(sm.line_text(id, 1), "one");
        assert_eq!(sm.line_text(id, 2), "two");
        assert_eq!(sm.line_text(id, 3), "");
        assert_eq!(sm.line_text(id + 1, 1), "");
    }

    #[test]
    fn normalize_path_is_idempotent() {
        for p in ["a/./b/../c", "a//b/", "../a/b", "a/b/c"] {
            let once = normalize_path(p);
            let twice = normalize_path(&once);
            assert_eq!(once, twice);
        }
    }
}
