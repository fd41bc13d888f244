//! # Delivery status codes.
//!
//! Enhanced mail system status codes have the form `class.subject.detail`,
//! see [RFC 3463](https://tools.ietf.org/html/rfc3463). This module maps each
//! numeric component to its human readable category.

use std::fmt;

use serde::Serialize;
use strum_macros::Display;
use thiserror::Error;

/// One classified component of a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BounceStatus {
    pub code: u32,
    pub message: &'static str,
}

impl fmt::Display for BounceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.message)
    }
}

/// The three ways a status code is classified.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum StatusAxis {
    /// The class digit alone.
    Primary,

    /// The subject digit alone.
    Secondary,

    /// Subject and detail digits concatenated, e.g. `11` for `5.1.1`.
    Combined,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
    #[error("invalid {axis} status code {code:?}")]
    Invalid { axis: StatusAxis, code: String },

    #[error("unknown {axis} status code {code}")]
    Unknown { axis: StatusAxis, code: u32 },
}

const PRIMARY_STATUS_CODES: &[(u32, &str)] = &[
    (1, "Unknown Status Code 1"),
    (2, "Success"),
    (3, "Temporary Failure"),
    (4, "Persistent Transient Failure"),
    (5, "Permanent Failure"),
];

const SECONDARY_STATUS_CODES: &[(u32, &str)] = &[
    (0, "Other or Undefined Status"),
    (1, "Addressing Status"),
    (2, "Mailbox Status"),
    (3, "Mail System Status"),
    (4, "Network and Routing Status"),
    (5, "Mail Delivery Protocol Status"),
    (6, "Message Content or Media Status"),
    (7, "Security or Policy Status"),
];

const COMBINED_STATUS_CODES: &[(u32, &str)] = &[
    (0, "Not Applicable"),
    (10, "Other address status"),
    (11, "Bad destination mailbox address"),
    (12, "Bad destination system address"),
    (13, "Bad destination mailbox address syntax"),
    (14, "Destination mailbox address ambiguous"),
    (15, "Destination mailbox address valid"),
    (16, "Mailbox has moved"),
    (17, "Bad sender's mailbox address syntax"),
    (18, "Bad sender's system address"),
    (20, "Other or undefined mailbox status"),
    (21, "Mailbox disabled, not accepting messages"),
    (22, "Mailbox full"),
    (23, "Message length exceeds administrative limit."),
    (24, "Mailing list expansion problem"),
    (30, "Other or undefined mail system status"),
    (31, "Mail system full"),
    (32, "System not accepting network messages"),
    (33, "System not capable of selected features"),
    (34, "Message too big for system"),
    (40, "Other or undefined network or routing status"),
    (41, "No answer from host"),
    (42, "Bad connection"),
    (43, "Routing server failure"),
    (44, "Unable to route"),
    (45, "Network congestion"),
    (46, "Routing loop detected"),
    (47, "Delivery time expired"),
    (50, "Other or undefined protocol status"),
    (51, "Invalid command"),
    (52, "Syntax error"),
    (53, "Too many recipients"),
    (54, "Invalid command arguments"),
    (55, "Wrong protocol version"),
    (60, "Other or undefined media error"),
    (61, "Media not supported"),
    (62, "Conversion required and prohibited"),
    (63, "Conversion required but not supported"),
    (64, "Conversion with loss performed"),
    (65, "Conversion failed"),
    (70, "Other or undefined security status"),
    (71, "Delivery not authorized, message refused"),
    (72, "Mailing list expansion prohibited"),
    (73, "Security conversion required but not possible"),
    (74, "Security features not supported"),
    (75, "Cryptographic failure"),
    (76, "Cryptographic algorithm not supported"),
    (77, "Message integrity failure"),
];

impl StatusAxis {
    fn table(self) -> &'static [(u32, &'static str)] {
        match self {
            StatusAxis::Primary => PRIMARY_STATUS_CODES,
            StatusAxis::Secondary => SECONDARY_STATUS_CODES,
            StatusAxis::Combined => COMBINED_STATUS_CODES,
        }
    }

    /// Looks up a numeric code given as decimal digits.
    ///
    /// Codes missing from the table are an error, they never fall back to
    /// a default category.
    pub fn lookup(self, code: &str) -> Result<BounceStatus, StatusError> {
        let code: u32 = code.parse().map_err(|_| StatusError::Invalid {
            axis: self,
            code: code.to_string(),
        })?;
        self.table()
            .iter()
            .find(|(c, _)| *c == code)
            .map(|&(code, message)| BounceStatus { code, message })
            .ok_or(StatusError::Unknown { axis: self, code })
    }
}

/// Classifies the components of a `class.subject.detail` status code.
///
/// Returns the primary, secondary and combined statuses. A component missing
/// from its table makes the whole code unclassifiable.
pub fn classify(
    class: &str,
    subject: &str,
    detail: &str,
) -> Result<[BounceStatus; 3], StatusError> {
    Ok([
        StatusAxis::Primary.lookup(class)?,
        StatusAxis::Secondary.lookup(subject)?,
        StatusAxis::Combined.lookup(&format!("{subject}{detail}"))?,
    ])
}
