//! # List of header fields read by the bounce detector.

use strum_macros::{Display, EnumString};

use crate::mimeparser::HeaderList;

/// Message headers and delivery-status fields the detector looks at.
///
/// Names are matched case-insensitively, as field names in mail
/// headers and in `message/delivery-status` bodies are.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum HeaderDef {
    MessageId,
    InReplyTo,
    Subject,
    To,

    /// Per-message DSN field, RFC 3464 section 2.2.2.
    ReportingMta,

    FinalRecipient,
    Action,
    Status,
    RemoteMta,
    DiagnosticCode,
}

impl HeaderDef {
    /// Returns the lowercased header name.
    pub fn get_headername(&self) -> String {
        self.to_string()
    }
}

pub trait HeaderDefMap {
    /// Returns the value of the first header with the given name.
    fn get_header_value(&self, headerdef: HeaderDef) -> Option<&str>;
}

impl HeaderDefMap for HeaderList {
    fn get_header_value(&self, headerdef: HeaderDef) -> Option<&str> {
        self.get(&headerdef.get_headername())
    }
}
