//! Statement indexing: walks a source tree, assigns a dense `Sid` to every
//! eligible statement in pre-order, and builds the lookup tables the rest
//! of the engine is built on top of.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::{RepairError, Result};
use crate::lang::{AstNode, Parser};

/// Dense, non-recycled statement identifier assigned in pre-order traversal
/// order across the whole source tree.
pub type Sid = u32;

/// Read-only, shared table mapping every indexed statement to its AST node.
/// Backed by an `Arc` so candidates can cheaply share one copy (spec's
/// "immutable statement table" read side of the overlay model).
#[derive(Debug, Default)]
pub struct StatementTable {
    nodes: Vec<AstNode>,
}

impl StatementTable {
    pub fn get(&self, sid: Sid) -> Option<&AstNode> {
        self.nodes.get(sid as usize)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Sid, &AstNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (i as Sid, n))
    }

    /// Every variable name referenced anywhere in the indexed program, in
    /// sorted (deterministic) order. This is the universe `Rename` draws
    /// its replacement from (spec §4.3) and the Cardumen template engine
    /// substitutes into placeholders.
    pub fn all_names(&self) -> Vec<String> {
        let mut names = std::collections::BTreeSet::new();
        for node in &self.nodes {
            node.collect_names(&mut names);
        }
        names.into_iter().collect()
    }
}

/// The full statement index: the statement table plus the file and line
/// lookups needed by localization (C4) and the repair driver.
#[derive(Debug)]
pub struct StatementIndex {
    pub statements: Arc<StatementTable>,
    pub files: Vec<PathBuf>,
    /// sid -> index into `files`
    file_of: Vec<usize>,
    /// file index -> (line number -> sids on that line, in traversal order)
    lines: Vec<BTreeMap<u32, Vec<Sid>>>,
    pub source_root: Arc<PathBuf>,
    pub line_mode: bool,
}

/// Globs excluded from indexing by default, mirroring a conservative set of
/// test/build/vendor directories a repair run should never touch.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "test/*", "tests/*", "test.py", "tests.py", "setup.py", "env", "build", "bin", "docs",
    "examples", ".git", ".github", "extras", "profiling", "plugin", "gallery", "docker",
    "contrib", "changelogs", "licenses", "packaging",
];

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            RepairError::ConfigurationInvalid(format!("invalid exclude glob {pattern:?}: {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| RepairError::ConfigurationInvalid(format!("could not build exclude set: {e}")))
}

impl StatementIndex {
    /// Walks `src` (a file or a directory), parsing every file the given
    /// `parser` recognises and that does not match one of `excludes`.
    /// Statement identifiers are assigned in pre-order as files are
    /// visited in sorted order, and within a file as the parser's AST is
    /// walked depth-first.
    pub fn index(
        src: &Path,
        parser: &dyn Parser,
        excludes: &[String],
        line_mode: bool,
    ) -> Result<StatementIndex> {
        let exclude_set = build_globset(excludes)?;
        let mut files: Vec<PathBuf> = Vec::new();
        if src.is_file() {
            files.push(src.to_path_buf());
        } else if src.is_dir() {
            collect_files(src, &exclude_set, parser, &mut files)?;
            files.sort();
        } else {
            return Err(RepairError::SourceUnavailable {
                path: src.to_path_buf(),
                reason: "path does not exist".into(),
            });
        }

        let mut nodes: Vec<AstNode> = Vec::new();
        let mut file_of: Vec<usize> = Vec::new();
        let mut lines: Vec<BTreeMap<u32, Vec<Sid>>> = Vec::with_capacity(files.len());

        for (file_idx, file) in files.iter().enumerate() {
            let text = std::fs::read_to_string(file).map_err(|e| RepairError::SourceUnavailable {
                path: file.clone(),
                reason: e.to_string(),
            })?;
            let tree = parser.parse(&text).map_err(|e| RepairError::SourceUnavailable {
                path: file.clone(),
                reason: e,
            })?;
            let mut file_lines: BTreeMap<u32, Vec<Sid>> = BTreeMap::new();
            walk_statements(&tree, line_mode, &mut |node: &AstNode| {
                let sid = nodes.len() as Sid;
                nodes.push(node.clone());
                file_of.push(file_idx);
                file_lines.entry(node.line()).or_default().push(sid);
            });
            lines.push(file_lines);
        }

        Ok(StatementIndex {
            statements: Arc::new(StatementTable { nodes }),
            files,
            file_of,
            lines,
            source_root: Arc::new(src.to_path_buf()),
            line_mode,
        })
    }

    pub fn file_of(&self, sid: Sid) -> &Path {
        &self.files[self.file_of[sid as usize]]
    }

    /// Statement ids on a given (file, 1-based line) pair, in traversal
    /// order. Empty if the line has no eligible statement.
    pub fn sids_at(&self, file: &Path, line: u32) -> &[Sid] {
        for (idx, f) in self.files.iter().enumerate() {
            if f == file {
                if let Some(sids) = self.lines[idx].get(&line) {
                    return sids;
                }
                return &[];
            }
        }
        &[]
    }

    pub fn all_sids(&self) -> impl Iterator<Item = Sid> + '_ {
        0..self.statements.len() as Sid
    }
}

fn collect_files(
    dir: &Path,
    excludes: &GlobSet,
    parser: &dyn Parser,
    out: &mut Vec<PathBuf>,
) -> Result<()> {
    for entry in std::fs::read_dir(dir).map_err(|e| RepairError::SourceUnavailable {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })? {
        let entry = entry.map_err(|e| RepairError::SourceUnavailable {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        let path = entry.path();
        let relative = path.strip_prefix(dir).unwrap_or(&path);
        if excludes.is_match(relative) {
            continue;
        }
        if path.is_dir() {
            collect_files(&path, excludes, parser, out)?;
        } else if parser.recognizes(&path) {
            out.push(path);
        }
    }
    Ok(())
}

/// Depth-first, pre-order walk recording every node [`check`] accepts.
/// `check` excludes compound statements with nested bodies when
/// `line_mode` is set (spec §4.1).
fn walk_statements(root: &AstNode, line_mode: bool, visit: &mut dyn FnMut(&AstNode)) {
    if check(root, line_mode) {
        visit(root);
    }
    for child in root.children() {
        walk_statements(child, line_mode, visit);
    }
}

fn check(node: &AstNode, line_mode: bool) -> bool {
    if !node.is_statement() {
        return false;
    }
    if line_mode && node.has_body() {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::mini::MiniParser;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(".mini").tempfile().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn assigns_dense_preorder_sids() {
        let file = write_temp("x = 1\nif x {\n    y = 2\n}\nreturn y\n");
        let parser = MiniParser;
        let index = StatementIndex::index(file.path(), &parser, &[], false).unwrap();
        let sids: Vec<Sid> = index.all_sids().collect();
        assert_eq!(sids, (0..index.statements.len() as Sid).collect::<Vec<_>>());
        assert!(index.statements.len() >= 3);
    }

    #[test]
    fn line_mode_excludes_compound_statements() {
        let file = write_temp("if x {\n    y = 2\n}\n");
        let parser = MiniParser;
        let full = StatementIndex::index(file.path(), &parser, &[], false).unwrap();
        let line_mode = StatementIndex::index(file.path(), &parser, &[], true).unwrap();
        assert!(line_mode.statements.len() < full.statements.len());
    }
}
