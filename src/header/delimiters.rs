//! Extension-keyed comment delimiters.
//!
//! Two families exist: the star family shared by all C-like languages and the
//! hash family used by cmake. Files whose extension is not listed here are
//! rejected by the dispatcher before they are ever opened.

use std::path::Path;

/// Delimiter triple for one comment family.
#[derive(Debug, PartialEq, Eq)]
pub struct CommentStyle {
    /// Bytes that open the header block.
    pub prefix: &'static str,
    /// Token that starts every line inside the block.
    pub line_start: &'static str,
    /// Bytes that close the header block.
    pub suffix: &'static str,
}

pub static STAR: CommentStyle = CommentStyle {
    prefix: "/******************************************************************************\n**\n",
    line_start: "**",
    suffix: "\n**\n******************************************************************************/\n\n",
};

pub static HASH: CommentStyle = CommentStyle {
    prefix: "",
    line_start: "#",
    suffix: "\n\n",
};

static EXTENSION_MAP: &[(&[&str], &CommentStyle)] = &[
    (
        &["c", "cpp", "cxx", "h", "hpp", "hxx", "js", "m", "mm", "qml", "swift"],
        &STAR,
    ),
    (&["cmake"], &HASH),
];

/// Delimiters for a file extension, or `None` when the extension is
/// unsupported.
pub fn for_extension(ext: &str) -> Option<&'static CommentStyle> {
    EXTENSION_MAP
        .iter()
        .find(|(exts, _)| exts.contains(&ext))
        .map(|(_, style)| *style)
}

pub fn for_path(path: &Path) -> Option<&'static CommentStyle> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(for_extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_family_extensions_share_one_triple() {
        for ext in ["c", "cpp", "cxx", "h", "hpp", "hxx", "js", "m", "mm", "qml", "swift"] {
            let style = for_extension(ext).unwrap();
            assert_eq!(style.line_start, "**", "extension {ext}");
            assert!(style.prefix.starts_with("/*"));
            assert!(style.suffix.ends_with("*/\n\n"));
        }
    }

    #[test]
    fn cmake_uses_the_hash_triple() {
        let style = for_extension("cmake").unwrap();
        assert_eq!(style.prefix, "");
        assert_eq!(style.line_start, "#");
        assert_eq!(style.suffix, "\n\n");
    }

    #[test]
    fn unknown_extensions_are_rejected() {
        assert!(for_extension("py").is_none());
        assert!(for_extension("rs").is_none());
        assert!(for_extension("").is_none());
        assert!(for_path(Path::new("README")).is_none());
        assert!(for_path(Path::new("src/a.cpp")).is_some());
    }

    #[test]
    fn star_banner_shape_is_stable() {
        // Opening banner, a framing line, and the mirrored closer.
        assert!(STAR.prefix.ends_with("\n**\n"));
        assert!(STAR.suffix.starts_with("\n**\n"));
        let banner_stars = STAR.prefix.chars().filter(|&c| c == '*').count();
        let closer_stars = STAR.suffix.chars().filter(|&c| c == '*').count();
        assert_eq!(banner_stars, closer_stars);
    }
}
