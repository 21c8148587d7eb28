//! Git adapter: repository discovery, merge-commit detection, per-line blame.
//!
//! Repository access and the HEAD revision walk go through libgit2; blame is
//! delegated to the `git` binary because its copy/move following (`-CC`) has
//! no libgit2 equivalent, and its porcelain output is parsed line by line.

mod process;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{Error, Result};
use crate::logging::MsgCode;
use crate::warn_code;

/// Preallocation hint for the merge-commit scan.
const POSSIBLE_BROKEN_COMMITS: usize = 1000;

/// Commits with more parents than this are never treated as broken merges.
const MAX_MERGE_PARENTS: usize = 2;

/// Subjects of merge-like commits whose blame contributions are skipped.
static MERGE_SUBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)^(Revert "|)?Merge.+(branch|->).+$"#).unwrap());

/// One line of blame output: the commit that last touched the line and the
/// author recorded on that commit, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlameLine {
    pub hash: String,
    pub author: String,
}

/// Handle to the working tree enclosing one target path.
pub struct GitRepository {
    repo: git2::Repository,
    working_tree: PathBuf,
}

impl GitRepository {
    /// Resolve the working tree enclosing `path`. Fails when `path` is not
    /// inside any working tree (bare repositories included).
    pub fn open(path: &Path) -> Result<Self> {
        // Discovery walks up from a directory, so start at a file's parent.
        let start = if path.is_file() {
            path.parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .unwrap_or(Path::new("."))
        } else {
            path
        };
        let repo = git2::Repository::discover(start).map_err(|err| {
            Error::Git(format!(
                "Error opening repository for {}: {}",
                path.display(),
                err.message()
            ))
        })?;
        let workdir = repo.workdir().ok_or_else(|| {
            Error::Git(format!("{} is not inside a working tree", path.display()))
        })?;
        let working_tree = workdir.canonicalize().map_err(|err| {
            Error::Git(format!(
                "Error resolving working tree {}: {}",
                workdir.display(),
                err
            ))
        })?;
        Ok(Self { repo, working_tree })
    }

    /// Absolute canonical path of the working tree root.
    pub fn working_tree_dir(&self) -> &Path {
        &self.working_tree
    }

    /// Hashes of every commit reachable from HEAD with at most
    /// [`MAX_MERGE_PARENTS`] parents and a merge-like subject line.
    pub fn broken_commits(&self) -> Result<HashSet<String>> {
        let mut walk = self
            .repo
            .revwalk()
            .map_err(|err| git_error("could not create revision walker", &err))?;
        walk.push_head()
            .map_err(|err| git_error("could not find repository HEAD", &err))?;

        let mut found = Vec::with_capacity(POSSIBLE_BROKEN_COMMITS);
        for oid in walk {
            let oid = oid.map_err(|err| git_error("revision walk failed", &err))?;
            let commit = self
                .repo
                .find_commit(oid)
                .map_err(|err| git_error("failed to look up commit", &err))?;

            if commit.parent_count() > MAX_MERGE_PARENTS {
                continue;
            }
            let subject = commit.summary().unwrap_or_default();
            if MERGE_SUBJECT.is_match(subject) {
                found.push(oid.to_string());
            }
        }
        Ok(found.into_iter().collect())
    }

    /// Per-line blame of `path` at HEAD, following copies and moves and
    /// ignoring whitespace changes.
    pub fn blame_file(&self, path: &Path) -> Result<Vec<BlameLine>> {
        let path = path.to_string_lossy();
        let path: &str = path.as_ref();
        let args = [
            "blame", "HEAD", "-CC", "-w", "-l", "-f", "-t", "--date=iso", "--", path,
        ];
        log::debug!("Running git {args:?}");
        let output = process::run_git(&args, &self.working_tree)?;
        Ok(parse_blame(&output))
    }
}

fn git_error(action: &str, err: &git2::Error) -> Error {
    Error::Git(format!("Error: {action}: {}", err.message()))
}

/// Parse raw `git blame` output. Empty lines are ignored; any other line
/// that does not match the expected shape is warned about and dropped.
fn parse_blame(output: &[u8]) -> Vec<BlameLine> {
    static BLAME_LINE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^(?P<data>(?P<hash>[0-9a-f]{5,40}) .+ \((?P<author>[/\\\w]+[. ]+[/\\\w]+) .+)?$")
            .unwrap()
    });

    let text = String::from_utf8_lossy(output);
    let mut lines = Vec::new();
    for raw in text.lines() {
        match BLAME_LINE.captures(raw) {
            Some(captures) => {
                if captures.name("data").is_none() {
                    continue;
                }
                lines.push(BlameLine {
                    hash: captures["hash"].to_string(),
                    author: captures["author"].to_string(),
                });
            }
            None => warn_code!(
                MsgCode::RunningExternalToolError,
                "Git blame returned unexpected line {raw}."
            ),
        }
    }
    lines
}

/// One-shot process-wide cache of the broken-commit set.
///
/// The set is computed from the first repository that asks for it and shared
/// read-only afterwards.
#[derive(Default)]
pub struct BrokenCommitsCell {
    cell: OnceLock<std::result::Result<HashSet<String>, String>>,
}

impl BrokenCommitsCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, repo: &GitRepository) -> Result<&HashSet<String>> {
        self.cell
            .get_or_init(|| repo.broken_commits().map_err(|err| err.to_string()))
            .as_ref()
            .map_err(|reason| Error::Git(reason.clone()))
    }
}
