//! Parser for `git diff` unified output.
//!
//! Only the per-file headers matter here: the parser records which files a diff
//! touches and how (added, modified, deleted, renamed, copied). Hunk bodies are
//! skipped. Parsing never fails; input without any `diff --git` header yields
//! an empty [`DiffRecord`].

use std::sync::LazyLock;

use regex::Regex;

/// How a file changed in a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
}

/// One file section of a diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub kind: ChangeKind,
    /// Path before the change (`None` for additions).
    pub old_name: Option<String>,
    /// Path after the change (`None` for deletions).
    pub new_name: Option<String>,
}

impl FileChange {
    pub fn is_deletion(&self) -> bool {
        self.kind == ChangeKind::Deleted
    }

    pub fn is_rename(&self) -> bool {
        self.kind == ChangeKind::Renamed
    }

    /// The path that exists after the change: the new name for renames and
    /// copies, the only name otherwise.
    pub fn current_name(&self) -> Option<&str> {
        self.new_name.as_deref().or(self.old_name.as_deref())
    }
}

/// Parsed diff: file changes in diff order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffRecord {
    pub files: Vec<FileChange>,
}

impl DiffRecord {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[derive(Debug, Default)]
struct Section {
    old_name: Option<String>,
    new_name: Option<String>,
    added: bool,
    deleted: bool,
    renamed: bool,
    copied: bool,
}

impl Section {
    fn finish(self) -> Option<FileChange> {
        let kind = if self.deleted {
            ChangeKind::Deleted
        } else if self.added {
            ChangeKind::Added
        } else if self.renamed {
            ChangeKind::Renamed
        } else if self.copied {
            ChangeKind::Copied
        } else {
            ChangeKind::Modified
        };
        let (old_name, new_name) = match kind {
            ChangeKind::Added => (None, self.new_name.or(self.old_name)),
            ChangeKind::Deleted => (self.old_name.or(self.new_name), None),
            _ => (self.old_name, self.new_name),
        };
        if old_name.is_none() && new_name.is_none() {
            return None;
        }
        Some(FileChange {
            kind,
            old_name,
            new_name,
        })
    }
}

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^diff --git (?:"a/((?:[^"\\]|\\.)*)"|a/(\S+)) (?:"b/((?:[^"\\]|\\.)*)"|b/(\S+))$"#)
        .expect("valid diff header regex")
});

/// Parse unified diff text produced by `git diff`.
pub fn parse_unified_diff(text: &str) -> DiffRecord {
    let mut record = DiffRecord::default();
    let mut current: Option<Section> = None;
    let mut in_hunk = false;

    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("diff --git ") {
            if let Some(section) = current.take().and_then(Section::finish) {
                record.files.push(section);
            }
            in_hunk = false;
            current = Some(parse_git_header(line, rest));
            continue;
        }
        let Some(section) = current.as_mut() else {
            continue;
        };
        if line.starts_with("@@") {
            in_hunk = true;
            continue;
        }
        if in_hunk {
            continue;
        }
        if line.starts_with("new file mode") {
            section.added = true;
        } else if line.starts_with("deleted file mode") {
            section.deleted = true;
        } else if let Some(name) = line.strip_prefix("rename from ") {
            section.renamed = true;
            section.old_name = Some(unquote(name));
        } else if let Some(name) = line.strip_prefix("rename to ") {
            section.renamed = true;
            section.new_name = Some(unquote(name));
        } else if let Some(name) = line.strip_prefix("copy from ") {
            section.copied = true;
            section.old_name = Some(unquote(name));
        } else if let Some(name) = line.strip_prefix("copy to ") {
            section.copied = true;
            section.new_name = Some(unquote(name));
        } else if let Some(name) = line.strip_prefix("--- ") {
            match strip_side(name, "a/") {
                Some(path) => section.old_name = Some(path),
                None => section.added = true,
            }
        } else if let Some(name) = line.strip_prefix("+++ ") {
            match strip_side(name, "b/") {
                Some(path) => section.new_name = Some(path),
                None => section.deleted = true,
            }
        }
    }

    if let Some(section) = current.and_then(Section::finish) {
        record.files.push(section);
    }
    record
}

fn parse_git_header(line: &str, rest: &str) -> Section {
    if let Some(caps) = HEADER_RE.captures(line) {
        let old = caps
            .get(1)
            .map(|m| unescape(m.as_str()))
            .or_else(|| caps.get(2).map(|m| m.as_str().to_string()));
        let new = caps
            .get(3)
            .map(|m| unescape(m.as_str()))
            .or_else(|| caps.get(4).map(|m| m.as_str().to_string()));
        return Section {
            old_name: old,
            new_name: new,
            ..Section::default()
        };
    }
    // Paths with spaces: `a/x y b/x y`. Split on the midpoint when both halves agree.
    let mut section = Section::default();
    if let Some(body) = rest.strip_prefix("a/") {
        let bytes = body.len();
        if bytes >= 3 && bytes % 2 == 1 {
            let half = (bytes - 3) / 2;
            if body.is_char_boundary(half) && body[half..].starts_with(" b/") {
                let old = &body[..half];
                let new = &body[half + 3..];
                if old == new {
                    section.old_name = Some(old.to_string());
                    section.new_name = Some(new.to_string());
                }
            }
        }
    }
    section
}

/// Strip the `a/` or `b/` prefix from a `---`/`+++` line, returning `None` for `/dev/null`.
fn strip_side(raw: &str, prefix: &str) -> Option<String> {
    let raw = raw.split('\t').next().unwrap_or(raw);
    let name = unquote(raw);
    if name == "/dev/null" {
        return None;
    }
    if let Some(stripped) = name.strip_prefix(prefix) {
        return Some(stripped.to_string());
    }
    Some(name)
}

/// Strip the quotes git puts around paths with special characters and undo
/// their escapes; unquoted names are returned as-is.
pub(crate) fn unquote(raw: &str) -> String {
    let raw = raw.trim_end();
    match raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) => unescape(inner),
        None => raw.to_string(),
    }
}

/// Undo git's C-style quoting for the escapes it emits for paths.
fn unescape(raw: &str) -> String {
    let mut bytes = Vec::with_capacity(raw.len());
    let mut iter = raw.bytes().peekable();
    while let Some(b) = iter.next() {
        if b != b'\\' {
            bytes.push(b);
            continue;
        }
        match iter.next() {
            Some(b'n') => bytes.push(b'\n'),
            Some(b't') => bytes.push(b'\t'),
            Some(b'"') => bytes.push(b'"'),
            Some(b'\\') => bytes.push(b'\\'),
            Some(d @ b'0'..=b'7') => {
                let mut value = u32::from(d - b'0');
                for _ in 0..2 {
                    match iter.peek() {
                        Some(&o @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(o - b'0');
                            iter.next();
                        }
                        _ => break,
                    }
                }
                bytes.push((value & 0xff) as u8);
            }
            Some(other) => {
                bytes.push(b'\\');
                bytes.push(other);
            }
            None => bytes.push(b'\\'),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}
