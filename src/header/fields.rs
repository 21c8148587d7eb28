//! Typed header fields.

use chrono::{Datelike, Local};

/// Token in the copyright template replaced with the current year.
pub const CURRENT_YEAR_TOKEN: &str = "%CURRENT_YEAR%";

/// Sentinel appended to a truncated or low-coverage author list.
pub const ET_AL: &str = "et al.";

/// Alternation of every recognized field label, for the line grammar.
pub const LABEL_ALTERNATION: &str = "File|Author|Copyright|This file is part of";

/// Header field kinds. Declaration order here is serialization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldType {
    File,
    Author,
    Copyright,
    Component,
}

impl FieldType {
    /// Human label as it appears in the header line.
    pub fn label(self) -> &'static str {
        match self {
            FieldType::File => "File",
            FieldType::Author => "Author",
            FieldType::Copyright => "Copyright",
            FieldType::Component => "This file is part of",
        }
    }

    pub fn from_label(label: &str) -> Option<FieldType> {
        match label {
            "File" => Some(FieldType::File),
            "Author" => Some(FieldType::Author),
            "Copyright" => Some(FieldType::Copyright),
            "This file is part of" => Some(FieldType::Component),
            _ => None,
        }
    }

    /// Author is the only field that may repeat within a header.
    pub fn is_list(self) -> bool {
        matches!(self, FieldType::Author)
    }

    /// Component is the only field serialized with a trailing `.`.
    pub fn requires_fullstop(self) -> bool {
        matches!(self, FieldType::Component)
    }
}

/// Payload of one header field: scalar or ordered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(values) => Some(values),
            FieldValue::Scalar(_) => None,
        }
    }
}

/// Substitute `%CURRENT_YEAR%` in a copyright template.
pub fn substitute_year(template: &str, year: i32) -> String {
    template.replace(CURRENT_YEAR_TOKEN, &year.to_string())
}

pub fn current_year() -> i32 {
    Local::now().year()
}

/// Copyright value for this run, from the static-config template.
pub fn render_copyright(template: &str) -> String {
    substitute_year(template, current_year())
}
