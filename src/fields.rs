//! # Delivery status field grammar.
//!
//! Each recognized field of a status group has one pattern which splits its
//! raw value into captures, see
//! [RFC 3464 section 2.3](https://tools.ietf.org/html/rfc3464#section-2.3).
//! A value that does not match its pattern is treated as if the field was
//! missing.

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use strum_macros::{Display, EnumString};

use crate::headerdef::HeaderDef;

/// The `Action` of a per-recipient group.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, EnumString, Serialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Failed,
    Delayed,
    Delivered,
    Relayed,
    Expanded,
}

fn field_regex(re: &str) -> Regex {
    Regex::new(&format!("(?is){re}")).unwrap()
}

/// `<type>;<value>`, e.g. `rfc822; bob@example.org` or `dns; mx.example.org`.
static TYPED_VALUE: Lazy<Regex> = Lazy::new(|| field_regex(r"(.+);\s*(.*)"));

static ACTION: Lazy<Regex> =
    Lazy::new(|| field_regex(r"(failed|delayed|delivered|relayed|expanded)"));

static STATUS: Lazy<Regex> = Lazy::new(|| field_regex(r"([0-9]+)\.([0-9]+)\.([0-9]+)"));

/// `<type>;<code><message>`, e.g. `smtp; 550 5.1.1 user unknown`.
/// The code is optional.
static DIAGNOSTIC_CODE: Lazy<Regex> =
    Lazy::new(|| field_regex(r"(.+);\s*([0-9\-\.]+)?\s*(.*)"));

impl HeaderDef {
    /// Returns the pattern for a delivery status field, if this is one.
    fn field_grammar(&self) -> Option<&'static Regex> {
        match self {
            HeaderDef::FinalRecipient | HeaderDef::ReportingMta | HeaderDef::RemoteMta => {
                Some(&*TYPED_VALUE)
            }
            HeaderDef::Action => Some(&*ACTION),
            HeaderDef::Status => Some(&*STATUS),
            HeaderDef::DiagnosticCode => Some(&*DIAGNOSTIC_CODE),
            _ => None,
        }
    }
}

/// Splits the raw value of a status field into its captures.
///
/// Returns `None` if `name` is not a recognized status field or if the value
/// does not match the field's pattern. An optional capture that did not
/// participate in the match is returned as an empty string.
pub fn parse_field(name: &str, value: &str) -> Option<(HeaderDef, Vec<String>)> {
    let headerdef = HeaderDef::from_str(name).ok()?;
    let captures = headerdef.field_grammar()?.captures(value)?;
    let groups = captures
        .iter()
        .skip(1)
        .map(|group| group.map_or("", |m| m.as_str()).to_string())
        .collect();
    Some((headerdef, groups))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn captures(name: &str, value: &str) -> Option<Vec<String>> {
        parse_field(name, value).map(|(_, groups)| groups)
    }

    #[test]
    fn test_typed_value() {
        assert_eq!(
            parse_field("Final-Recipient", "rfc822; bob@example.org"),
            Some((
                HeaderDef::FinalRecipient,
                vec!["rfc822".to_string(), "bob@example.org".to_string()]
            ))
        );
        assert_eq!(
            captures("remote-mta", "dns;mx.google.com").unwrap(),
            vec!["dns", "mx.google.com"]
        );
        assert_eq!(
            captures("Reporting-MTA", "dns; ").unwrap(),
            vec!["dns", ""]
        );
        assert_eq!(captures("Reporting-MTA", "mx.example.org"), None);
    }

    #[test]
    fn test_folded_value() {
        assert_eq!(
            captures("Final-recipient", "RFC822;\r\n someone@gmail.com").unwrap(),
            vec!["RFC822", "someone@gmail.com"]
        );
    }

    #[test]
    fn test_action() {
        assert_eq!(captures("Action", "failed").unwrap(), vec!["failed"]);
        assert_eq!(captures("ACTION", "Delayed").unwrap(), vec!["Delayed"]);
        assert_eq!(captures("Action", "failed (bad mailbox)").unwrap(), vec!["failed"]);
        assert_eq!(captures("Action", "bounced"), None);

        assert_eq!(Action::from_str("Delayed").unwrap(), Action::Delayed);
        assert_eq!(Action::from_str("EXPANDED").unwrap(), Action::Expanded);
        assert_eq!(Action::Relayed.to_string(), "relayed");
    }

    #[test]
    fn test_status() {
        assert_eq!(captures("Status", "5.1.1").unwrap(), vec!["5", "1", "1"]);
        assert_eq!(
            captures("Status", "4.4.10 (delivery attempts will continue)").unwrap(),
            vec!["4", "4", "10"]
        );
        assert_eq!(captures("Status", "5.1"), None);
    }

    #[test]
    fn test_diagnostic_code() {
        assert_eq!(
            captures("Diagnostic-Code", "smtp; 550 5.1.1 user unknown").unwrap(),
            vec!["smtp", "550", "5.1.1 user unknown"]
        );
        assert_eq!(
            captures(
                "Diagnostic-Code",
                "X-Postfix; unknown user:    \"nobody@test.local\""
            )
            .unwrap(),
            vec!["X-Postfix", "", "unknown user:    \"nobody@test.local\""]
        );
        assert_eq!(
            captures("Diagnostic-Code", "X-QMail;4.3.2.1 does not like recipient.").unwrap(),
            vec!["X-QMail", "4.3.2.1", "does not like recipient."]
        );
        assert_eq!(captures("Diagnostic-Code", "no type here"), None);
    }

    #[test]
    fn test_unknown_fields() {
        assert_eq!(parse_field("X-Supplementary-Info", "dns; whatever"), None);
        assert_eq!(parse_field("Message-Id", "<foo@example.org>"), None);
    }
}
