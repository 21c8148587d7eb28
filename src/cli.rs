use clap::Parser;
use std::path::PathBuf;

/// Command-line surface.
///
/// The author-cap value is taken as a string on purpose: a non-integer has to
/// exit with the tool's own argument-error code, not clap's.
#[derive(Parser, Debug)]
#[command(name = "copylint")]
#[command(about = "Ensures that files in a project under Git have a consistent copyright notice.")]
#[command(version)]
pub struct Cli {
    /// Add or replace software component mention.
    #[arg(long = "component", value_name = "name")]
    pub component: Option<String>,

    /// Add or update copyright field (Year, Company, etc...).
    #[arg(long = "update-copyright")]
    pub update_copyright: bool,

    /// Add or fix 'File' field.
    #[arg(long = "update-filename")]
    pub update_filename: bool,

    /// Add or update author list.
    #[arg(long = "update-authors")]
    pub update_authors: bool,

    /// Update author list only if this list is empty in author field (edited by someone else).
    #[arg(long = "update-authors-only-if-empty")]
    pub update_authors_only_if_empty: bool,

    /// Update author list only if blame authors <= some limit.
    #[arg(
        long = "max-blame-authors-to-start-update",
        value_name = "number",
        allow_hyphen_values = true
    )]
    pub max_blame_authors: Option<String>,

    /// Do not skip broken merge commits.
    #[arg(long = "dont-skip-broken-merges")]
    pub dont_skip_broken_merges: bool,

    /// Json configuration file with static configuration.
    #[arg(long = "static-config", value_name = "path")]
    pub static_config: Option<PathBuf>,

    /// Do not modify files, print to stdout instead.
    #[arg(long = "dry")]
    pub dry: bool,

    /// Print verbose output.
    #[arg(long = "verbose")]
    pub verbose: bool,

    /// File or directory to process.
    #[arg(value_name = "paths")]
    pub paths: Vec<PathBuf>,
}
