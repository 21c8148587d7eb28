//! Walks target paths and drives the per-file pipeline over a worker pool.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};

use once_cell::sync::Lazy;
use rayon::prelude::*;
use signal_hook::consts::{SIGABRT, SIGINT, SIGTERM};
use walkdir::WalkDir;

use crate::config::{RunConfig, StaticConfig, StaticConfigCell};
use crate::errors::{Error, Result};
use crate::git::{BrokenCommitsCell, GitRepository};
use crate::header::{delimiters, Header};
use crate::logging::MsgCode;
use crate::{err_code, info_code, warn_code};

/// Set by the termination handlers; checked before each queued file starts,
/// which drains the remaining work while running files finish.
static CANCEL_REQUESTED: Lazy<Arc<AtomicBool>> = Lazy::new(|| Arc::new(AtomicBool::new(false)));

fn install_termination_handlers() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        for signal in [SIGINT, SIGTERM, SIGABRT] {
            if let Err(err) = signal_hook::flag::register(signal, Arc::clone(&CANCEL_REQUESTED)) {
                log::warn!("Failed to install handler for signal {signal}: {err}");
            }
        }
    });
}

/// Drives the whole run: target validation, exclusion filtering, and the
/// parallel fan-out of per-file pipelines.
pub struct FileProcessor<'a> {
    config: &'a RunConfig,
    statics: StaticConfigCell,
    broken_commits: BrokenCommitsCell,
}

impl<'a> FileProcessor<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self {
            config,
            statics: StaticConfigCell::new(config.static_config_path.clone()),
            broken_commits: BrokenCommitsCell::new(),
        }
    }

    /// Process every target path. Returns whether any file was modified.
    ///
    /// Only configuration-level failures (the static config) are fatal;
    /// everything per-file or per-target is logged and skipped.
    pub fn process(&self) -> Result<bool> {
        let statics = self.statics.get()?;
        let any_updated = AtomicBool::new(false);

        for target in &self.config.target_paths {
            if !target.exists() {
                warn_code!(
                    MsgCode::FileOrDirDoesNotExist,
                    "Skip not existed target {}",
                    target.display()
                );
                continue;
            }
            self.process_target(target, statics, &any_updated);
        }

        Ok(any_updated.load(Ordering::Relaxed))
    }

    fn process_target(&self, target: &Path, statics: &StaticConfig, any_updated: &AtomicBool) {
        match GitRepository::open(target) {
            Ok(repo) => log::debug!("Using repository {}", repo.working_tree_dir().display()),
            Err(err) => {
                err_code!(
                    err.msg_code(),
                    "Cannot process target {}: {err}",
                    target.display()
                );
                return;
            }
        }

        if target.is_file() {
            if is_path_excluded(target, &statics.excluded_path_sections) {
                log::debug!("Skip excluded file {}", target.display());
                return;
            }
            self.run_pipeline(target, any_updated);
            return;
        }

        install_termination_handlers();

        let files: Vec<PathBuf> = WalkDir::new(target)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn_code!(MsgCode::FileReadWriteError, "Skipping unreadable entry: {err}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                if is_path_excluded(path, &statics.excluded_path_sections) {
                    log::debug!("Skip excluded file or dir {}", path.display());
                    false
                } else {
                    true
                }
            })
            .collect();

        files.par_iter().for_each(|path| {
            if CANCEL_REQUESTED.load(Ordering::Relaxed) {
                return;
            }
            self.run_pipeline(path, any_updated);
        });
    }

    fn run_pipeline(&self, path: &Path, any_updated: &AtomicBool) {
        match self.process_file(path) {
            Ok(true) => {
                any_updated.fetch_or(true, Ordering::Relaxed);
            }
            Ok(false) => {}
            Err(err) => {
                err_code!(
                    err.msg_code(),
                    "Cannot process file {}: {err}",
                    path.display()
                );
            }
        }
    }

    /// The per-file pipeline: read, locate, parse, fix, serialize, write.
    fn process_file(&self, path: &Path) -> Result<bool> {
        let repo = GitRepository::open(path)?;
        ensure_inside_working_tree(path, &repo)?;

        info_code!(MsgCode::ProcessingFile, "Processing file {}.", path.display());

        let content = read_file(path)?;
        let style = delimiters::for_path(path).ok_or_else(|| {
            anyhow::anyhow!("unsupported extension reached the pipeline: {}", path.display())
        })?;
        let statics = self.statics.get()?;

        let mut header = Header::new(self.config, statics, path, &content, style);
        header.load();
        if !header.is_empty() {
            match header.parse() {
                Ok(()) => log::debug!("Header found in {}.", path.display()),
                Err(err) => err_code!(
                    MsgCode::BadHeaderFormat,
                    "{err} Continuing as if no header is present."
                ),
            }
        } else {
            log::debug!("Header not found in {}.", path.display());
        }

        if !header.fix(&repo, &self.broken_commits)? {
            log::debug!("Header in file {} will not be updated.", path.display());
            return Ok(false);
        }
        log::debug!("Header in file {} needs to be updated.", path.display());

        let header_bytes = header.serialize();

        if self.config.options.read_only {
            info_code!(
                MsgCode::WouldUpdateCopyrightNotice,
                "Would update Copyright Notice in file {} with the following:\n{}",
                path.display(),
                String::from_utf8_lossy(&header_bytes)
            );
            return Ok(false);
        }

        let mut output = header_bytes;
        output.extend_from_slice(header.content_without_header());
        write_file(path, &output)?;

        info_code!(
            MsgCode::UpdatedCopyrightNotice,
            "Updated Copyright Notice in file: {}.",
            path.display()
        );
        Ok(true)
    }
}

fn ensure_inside_working_tree(path: &Path, repo: &GitRepository) -> Result<()> {
    let canonical = path
        .canonicalize()
        .map_err(|source| Error::file_read_write(path, source))?;
    if !canonical.starts_with(repo.working_tree_dir()) {
        return Err(Error::Git(format!(
            "{} is outside the working tree {}",
            path.display(),
            repo.working_tree_dir().display()
        )));
    }
    Ok(())
}

/// A path is excluded when its extension has no delimiters or when it
/// contains any excluded substring.
fn is_path_excluded(path: &Path, excluded_sections: &[String]) -> bool {
    if delimiters::for_path(path).is_none() {
        return true;
    }
    let text = path.to_string_lossy();
    excluded_sections
        .iter()
        .any(|section| !section.is_empty() && text.contains(section.as_str()))
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    let content =
        std::fs::read(path).map_err(|source| Error::file_read_write(path, source))?;
    if content.is_empty() {
        return Err(Error::file_read_write(
            path,
            std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "file is empty",
            ),
        ));
    }
    Ok(content)
}

fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    std::fs::write(path, content).map_err(|source| Error::file_read_write(path, source))
}
