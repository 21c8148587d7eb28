//! The header engine.
//!
//! One [`Header`] drives the per-file pipeline: locate the delimited block,
//! parse its fields, compute the desired field set from the run options, and
//! re-serialize with stable order and alignment.

pub mod authors;
pub mod delimiters;
pub mod fields;
pub mod locator;

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;
use std::path::Path;

use bstr::ByteSlice;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{RunConfig, StaticConfig};
use crate::errors::{Error, Result};
use crate::git::{BrokenCommitsCell, GitRepository};
use crate::info_code;
use crate::logging::MsgCode;

use delimiters::CommentStyle;
use fields::{FieldType, FieldValue};
use locator::HeaderSpan;

static STAR_FIELD_LINE: Lazy<Regex> = Lazy::new(|| field_line_regex("**"));
static HASH_FIELD_LINE: Lazy<Regex> = Lazy::new(|| field_line_regex("#"));

fn field_line_regex(line_start: &str) -> Regex {
    Regex::new(&format!(
        r"^{}( (?P<name>{}) +(?P<value>.*))?$",
        regex::escape(line_start),
        fields::LABEL_ALTERNATION
    ))
    .expect("field grammar compiles")
}

fn field_line_for(style: &CommentStyle) -> &'static Regex {
    if style.line_start == "**" {
        &STAR_FIELD_LINE
    } else {
        &HASH_FIELD_LINE
    }
}

/// Leading structured comment block of one source file.
///
/// Owned by a single pipeline invocation; `fields` is populated by `parse`
/// and rewritten by `fix`.
pub struct Header<'a> {
    config: &'a RunConfig,
    statics: &'a StaticConfig,
    path: &'a Path,
    content: &'a [u8],
    style: &'static CommentStyle,
    span: Option<HeaderSpan>,
    fields: BTreeMap<FieldType, FieldValue>,
}

impl<'a> Header<'a> {
    pub fn new(
        config: &'a RunConfig,
        statics: &'a StaticConfig,
        path: &'a Path,
        content: &'a [u8],
        style: &'static CommentStyle,
    ) -> Self {
        Self {
            config,
            statics,
            path,
            content,
            style,
            span: None,
            fields: BTreeMap::new(),
        }
    }

    /// Locate the header span, if any.
    pub fn load(&mut self) {
        self.span = locator::locate(self.content, self.style);
        if self.span.is_none()
            && !self.style.prefix.is_empty()
            && self.content.find(self.style.prefix.as_bytes()).is_some()
        {
            log::debug!(
                "Header prefix without suffix in {}.",
                self.path.display()
            );
        }
    }

    pub fn is_empty(&self) -> bool {
        self.span.is_none()
    }

    /// Parse the located body into typed fields.
    ///
    /// Any line that fails the field grammar aborts the parse: the located
    /// span and all fields are cleared so the file reads as header-less.
    pub fn parse(&mut self) -> Result<()> {
        let Some(span) = self.span else {
            return Ok(());
        };
        let body = locator::body_of(self.content, &span, self.style);
        if body.is_empty() {
            return Ok(());
        }
        let Ok(body) = std::str::from_utf8(body) else {
            return self.fail_parse();
        };
        // split keeps empty segments, so blank framing lines pass through
        // parse_field and are ignored there.
        for line in body.split('\n') {
            if self.parse_field(line).is_err() {
                return self.fail_parse();
            }
        }
        Ok(())
    }

    fn fail_parse(&mut self) -> Result<()> {
        self.span = None;
        self.fields.clear();
        Err(Error::BadHeaderFormat(self.path.to_path_buf()))
    }

    fn parse_field(&mut self, raw: &str) -> Result<()> {
        if raw.is_empty() || raw == self.style.line_start {
            return Ok(());
        }
        let captures = field_line_for(self.style)
            .captures(raw)
            .ok_or_else(|| Error::BadHeaderFormat(self.path.to_path_buf()))?;
        let Some(name) = captures.name("name") else {
            return Ok(());
        };
        let Some(field_type) = FieldType::from_label(name.as_str()) else {
            return Ok(());
        };

        let mut value = captures["value"].to_string();
        if field_type.requires_fullstop() && value.ends_with('.') {
            value.pop();
        }

        if field_type.is_list() {
            match self.fields.get_mut(&field_type) {
                Some(FieldValue::List(values)) => values.push(value),
                _ => {
                    self.fields.insert(field_type, FieldValue::List(vec![value]));
                }
            }
        } else {
            if self.fields.contains_key(&field_type) {
                log::debug!(
                    "{} field was met again in the same header in {}",
                    field_type.label(),
                    self.path.display()
                );
            }
            self.fields.insert(field_type, FieldValue::Scalar(value));
        }
        Ok(())
    }

    /// Apply the enabled update policies and report whether the desired
    /// field set differs from the parsed one.
    pub fn fix(
        &mut self,
        repo: &GitRepository,
        broken_commits: &BrokenCommitsCell,
    ) -> Result<bool> {
        let options = self.config.options;
        let mut has_changes = false;

        if options.update_filename {
            let file_name = self
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            has_changes |= self.fix_field(FieldType::File, FieldValue::Scalar(file_name));
        }

        if options.update_copyright {
            let copyright = fields::render_copyright(&self.statics.copyright_field_template);
            has_changes |= self.fix_field(FieldType::Copyright, FieldValue::Scalar(copyright));
        }

        if options.update_component {
            if self.config.component_name.is_empty() {
                has_changes |= self.fields.remove(&FieldType::Component).is_some();
            } else {
                has_changes |= self.fix_field(
                    FieldType::Component,
                    FieldValue::Scalar(self.config.component_name.clone()),
                );
            }
        }

        let mut authors_updated = false;
        if options.update_authors && self.may_update_authors() {
            authors_updated = self.fix_authors(repo, broken_commits)?;
            has_changes |= authors_updated;
        }
        if !authors_updated {
            log::debug!("Skip author field updates.");
        }

        Ok(has_changes)
    }

    fn fix_field(&mut self, field_type: FieldType, desired: FieldValue) -> bool {
        if self.fields.get(&field_type) == Some(&desired) {
            return false;
        }
        self.fields.insert(field_type, desired);
        true
    }

    fn may_update_authors(&self) -> bool {
        let has_authors = self
            .fields
            .get(&FieldType::Author)
            .and_then(FieldValue::as_list)
            .map(|authors| !authors.is_empty())
            .unwrap_or(false);
        !(self.config.options.update_authors_only_if_empty && has_authors)
    }

    fn fix_authors(
        &mut self,
        repo: &GitRepository,
        broken_commits: &BrokenCommitsCell,
    ) -> Result<bool> {
        let no_skips = HashSet::new();
        let skip_commits = if self.config.options.dont_skip_broken_merges {
            &no_skips
        } else {
            broken_commits.get(repo)?
        };

        let header_end_line = self.span.map(|span| span.end_line).unwrap_or(0);
        let blame = repo.blame_file(self.path)?;
        let shares = authors::blame_shares(
            &blame,
            skip_commits,
            header_end_line,
            &self.statics.author_aliases,
        );

        if shares.len() > self.config.max_blame_authors as usize {
            self.print_possible_authors(&shares);
            return Ok(false);
        }

        let selected = authors::select_authors(&shares);
        Ok(self.fix_field(FieldType::Author, FieldValue::List(selected)))
    }

    fn print_possible_authors(&self, shares: &authors::AuthorShares) {
        let mut ranked: Vec<(&String, &f64)> = shares.iter().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
        let names = ranked
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        info_code!(
            MsgCode::PossibleAuthors,
            "Detected more than {} authors in the file {}. Script did NOT update the authors fields! The authors might be: {}",
            self.config.max_blame_authors,
            self.path.display(),
            names
        );
    }

    /// Render the desired field set with stable order and alignment.
    pub fn serialize(&self) -> Vec<u8> {
        let label_width = self
            .fields
            .keys()
            .filter(|ty| !matches!(ty, FieldType::Component))
            .map(|ty| ty.label().len())
            .max()
            .unwrap_or(0);

        let mut out = String::from(self.style.prefix);
        for (ty, value) in &self.fields {
            match value {
                FieldValue::Scalar(value) => self.serialize_line(&mut out, *ty, value, label_width),
                FieldValue::List(values) => {
                    for value in values {
                        self.serialize_line(&mut out, *ty, value, label_width);
                    }
                }
            }
        }

        // The last line's newline becomes the suffix.
        if out.ends_with('\n') {
            out.pop();
        }
        out.push_str(self.style.suffix);
        out.into_bytes()
    }

    fn serialize_line(&self, out: &mut String, ty: FieldType, value: &str, width: usize) {
        if ty == FieldType::Component {
            out.push_str(self.style.line_start);
            out.push('\n');
        }
        out.push_str(self.style.line_start);
        out.push(' ');
        let _ = write!(out, "{:<width$}", ty.label());
        out.push(' ');
        out.push_str(value);
        if ty.requires_fullstop() {
            out.push('.');
        }
        out.push('\n');
    }

    /// Everything after the located header, or the whole content when no
    /// header was found.
    pub fn content_without_header(&self) -> &[u8] {
        match self.span {
            Some(span) => &self.content[span.end..],
            None => self.content,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::delimiters::{HASH, STAR};
    use super::*;
    use crate::config::RunOptions;

    fn run_config(options: RunOptions) -> RunConfig {
        RunConfig {
            options,
            component_name: String::new(),
            max_blame_authors: i32::MAX,
            static_config_path: PathBuf::from("static_config.json"),
            target_paths: vec![PathBuf::from(".")],
        }
    }

    fn statics() -> StaticConfig {
        StaticConfig {
            author_aliases: HashMap::new(),
            copyright_field_template: "(c) %CURRENT_YEAR%, Inc.".to_string(),
            excluded_path_sections: Vec::new(),
        }
    }

    fn temp_repo() -> (tempfile::TempDir, GitRepository) {
        let dir = tempfile::tempdir().unwrap();
        git2::Repository::init(dir.path()).unwrap();
        let repo = GitRepository::open(dir.path()).unwrap();
        (dir, repo)
    }

    fn star_content(body: &str, rest: &str) -> Vec<u8> {
        format!("{}{}{}{}", STAR.prefix, body, STAR.suffix, rest).into_bytes()
    }

    fn parsed<'a>(
        config: &'a RunConfig,
        statics: &'a StaticConfig,
        path: &'a Path,
        content: &'a [u8],
        style: &'static CommentStyle,
    ) -> Header<'a> {
        let mut header = Header::new(config, statics, path, content, style);
        header.load();
        if !header.is_empty() {
            header.parse().unwrap();
        }
        header
    }

    #[test]
    fn parses_fields_including_repeated_authors_and_the_component_dot() {
        let config = run_config(RunOptions::default());
        let statics = statics();
        let path = PathBuf::from("src/a.cpp");
        let content = star_content(
            indoc! {"
                ** File      a.cpp
                ** Author    Jane Roe
                ** Author    John Doe
                ** Copyright (c) 2024, Inc.
                **
                ** This file is part of Engine."},
            "int a;\n",
        );
        let header = parsed(&config, &statics, &path, &content, &STAR);

        assert_eq!(
            header.fields[&FieldType::File],
            FieldValue::Scalar("a.cpp".to_string())
        );
        assert_eq!(
            header.fields[&FieldType::Author],
            FieldValue::List(vec!["Jane Roe".to_string(), "John Doe".to_string()])
        );
        assert_eq!(
            header.fields[&FieldType::Copyright],
            FieldValue::Scalar("(c) 2024, Inc.".to_string())
        );
        // The trailing full stop is stripped on parse.
        assert_eq!(
            header.fields[&FieldType::Component],
            FieldValue::Scalar("Engine".to_string())
        );
        assert_eq!(header.content_without_header(), b"int a;\n");
    }

    #[test]
    fn a_repeated_scalar_field_keeps_the_last_value() {
        let config = run_config(RunOptions::default());
        let statics = statics();
        let path = PathBuf::from("a.cpp");
        let content = star_content("** File a.cpp\n** File b.cpp", "");
        let header = parsed(&config, &statics, &path, &content, &STAR);
        assert_eq!(
            header.fields[&FieldType::File],
            FieldValue::Scalar("b.cpp".to_string())
        );
    }

    #[test]
    fn a_malformed_line_clears_the_header() {
        let config = run_config(RunOptions::default());
        let statics = statics();
        let path = PathBuf::from("a.cpp");
        let content = star_content("** File a.cpp\n** License MIT", "int a;\n");

        let mut header = Header::new(&config, &statics, &path, &content, &STAR);
        header.load();
        assert!(!header.is_empty());
        let err = header.parse().unwrap_err();
        assert!(matches!(err, Error::BadHeaderFormat(_)));

        // The file now reads as header-less.
        assert!(header.is_empty());
        assert!(header.fields.is_empty());
        assert_eq!(header.content_without_header(), content.as_slice());
    }

    #[test]
    fn fresh_file_gets_filename_and_copyright() {
        let options = RunOptions {
            update_filename: true,
            update_copyright: true,
            ..RunOptions::default()
        };
        let config = run_config(options);
        let statics = statics();
        let (_dir, repo) = temp_repo();
        let broken = BrokenCommitsCell::new();
        let path = PathBuf::from("x.cpp");
        let content = b"int main() {}\n".to_vec();

        let mut header = parsed(&config, &statics, &path, &content, &STAR);
        assert!(header.fix(&repo, &broken).unwrap());

        let year = fields::current_year();
        let expected = format!(
            "{}** File      x.cpp\n** Copyright (c) {year}, Inc.{}",
            STAR.prefix, STAR.suffix
        );
        assert_eq!(String::from_utf8(header.serialize()).unwrap(), expected);
        assert_eq!(header.content_without_header(), b"int main() {}\n");
    }

    #[test]
    fn component_serializes_last_with_a_framing_line_and_fullstop() {
        let mut config = run_config(RunOptions {
            update_component: true,
            update_filename: true,
            ..RunOptions::default()
        });
        config.component_name = "Engine".to_string();
        let statics = statics();
        let (_dir, repo) = temp_repo();
        let broken = BrokenCommitsCell::new();
        let path = PathBuf::from("x.cmake");
        let content = b"add_library(x)\n".to_vec();

        let mut header = parsed(&config, &statics, &path, &content, &HASH);
        assert!(header.fix(&repo, &broken).unwrap());

        let expected = "# File x.cmake\n#\n# This file is part of Engine.\n\n";
        assert_eq!(String::from_utf8(header.serialize()).unwrap(), expected);
    }

    #[test]
    fn unchanged_fields_report_no_changes() {
        let options = RunOptions {
            update_filename: true,
            ..RunOptions::default()
        };
        let config = run_config(options);
        let statics = statics();
        let (_dir, repo) = temp_repo();
        let broken = BrokenCommitsCell::new();
        let path = PathBuf::from("src/a.cpp");
        let content = star_content("** File a.cpp", "int a;\n");

        let mut header = parsed(&config, &statics, &path, &content, &STAR);
        assert!(!header.fix(&repo, &broken).unwrap());
    }

    #[test]
    fn fixing_twice_is_idempotent() {
        let options = RunOptions {
            update_filename: true,
            update_copyright: true,
            ..RunOptions::default()
        };
        let config = run_config(options);
        let statics = statics();
        let (_dir, repo) = temp_repo();
        let broken = BrokenCommitsCell::new();
        let path = PathBuf::from("x.cpp");
        let original = b"int main() {}\n".to_vec();

        let mut header = parsed(&config, &statics, &path, &original, &STAR);
        assert!(header.fix(&repo, &broken).unwrap());
        let mut first_pass = header.serialize();
        first_pass.extend_from_slice(header.content_without_header());

        let mut header = parsed(&config, &statics, &path, &first_pass, &STAR);
        assert!(!header.fix(&repo, &broken).unwrap());
    }

    #[test]
    fn empty_component_name_removes_the_field() {
        let config = run_config(RunOptions {
            update_component: true,
            ..RunOptions::default()
        });
        let statics = statics();
        let (_dir, repo) = temp_repo();
        let broken = BrokenCommitsCell::new();
        let path = PathBuf::from("a.cpp");

        let with_component = star_content("** This file is part of Engine.", "int a;\n");
        let mut header = parsed(&config, &statics, &path, &with_component, &STAR);
        assert!(header.fix(&repo, &broken).unwrap());
        assert!(!header.fields.contains_key(&FieldType::Component));

        // Removing an absent field is not a change; a second run stays quiet.
        let without_component = star_content("** File a.cpp", "int a;\n");
        let mut header = parsed(&config, &statics, &path, &without_component, &STAR);
        assert!(!header.fix(&repo, &broken).unwrap());
    }

    #[test]
    fn only_if_empty_guard_leaves_existing_authors_alone() {
        let options = RunOptions {
            update_authors: true,
            update_authors_only_if_empty: true,
            ..RunOptions::default()
        };
        let config = run_config(options);
        let statics = statics();
        // The guard must short-circuit before any blame runs; the empty
        // repository would fail loudly otherwise.
        let (_dir, repo) = temp_repo();
        let broken = BrokenCommitsCell::new();
        let path = PathBuf::from("a.cpp");
        let content = star_content("** Author John Doe", "int a;\n");

        let mut header = parsed(&config, &statics, &path, &content, &STAR);
        assert!(!header.fix(&repo, &broken).unwrap());
        assert_eq!(
            header.fields[&FieldType::Author],
            FieldValue::List(vec!["John Doe".to_string()])
        );
    }

    #[test]
    fn labels_align_on_one_column() {
        let options = RunOptions {
            update_filename: true,
            update_copyright: true,
            ..RunOptions::default()
        };
        let config = run_config(options);
        let statics = statics();
        let (_dir, repo) = temp_repo();
        let broken = BrokenCommitsCell::new();
        let path = PathBuf::from("x.cpp");
        let content = b"int main() {}\n".to_vec();

        let mut header = parsed(&config, &statics, &path, &content, &STAR);
        header.fix(&repo, &broken).unwrap();
        let rendered = String::from_utf8(header.serialize()).unwrap();

        let file_line = rendered
            .lines()
            .find(|line| line.starts_with("** File"))
            .unwrap();
        let copyright_line = rendered
            .lines()
            .find(|line| line.starts_with("** Copyright"))
            .unwrap();
        // Values start in the same column for every non-Component label.
        assert_eq!(file_line.find("x.cpp"), copyright_line.find("(c)"));
    }
}
