//! # Bounce detection result.
//!
//! The status fields are described in
//! [RFC 3464](https://tools.ietf.org/html/rfc3464), the status codes in
//! [RFC 3463](https://tools.ietf.org/html/rfc3463).

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::fields::{parse_field, Action};
use crate::headerdef::HeaderDef;
use crate::log::LogExt;
use crate::mimeparser::{DeliveryStatus, Entity, Message};
use crate::status::{classify, BounceStatus};

/// The three parts of a delivery report found by a detector.
///
/// Parts found in the input message are borrowed, parts a detector had to
/// build itself are owned.
#[derive(Debug, Clone, Default)]
pub(crate) struct DeliveryReport<'a> {
    /// Human readable notice, normally a text part.
    pub notice: Option<Cow<'a, Entity>>,
    pub status: Option<Cow<'a, DeliveryStatus>>,
    /// The returned message, normally a message part.
    pub undelivered: Option<Cow<'a, Entity>>,
}

/// Outcome of [`detect`](crate::detect).
///
/// Serializes to the extracted fields only; the message parts are skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BounceDetectResult<'a> {
    pub primary_status: Option<BounceStatus>,
    pub secondary_status: Option<BounceStatus>,
    pub combined_status: Option<BounceStatus>,
    pub reporting_mta: Option<String>,
    pub remote_mta: Option<String>,

    /// Recipient of the last per-recipient group.
    pub final_recipient: Option<String>,

    /// Code and message of the last `Diagnostic-Code` field.
    /// The code is empty if the field carried none.
    pub diagnostic_codes: Option<[String; 2]>,
    pub action: Option<Action>,

    /// Normally a text part.
    #[serde(skip)]
    pub delivery_notification_part: Option<Cow<'a, Entity>>,

    /// All status groups; the first one holds per-message fields.
    #[serde(skip)]
    pub delivery_status: Option<Cow<'a, DeliveryStatus>>,

    /// Normally a message part.
    #[serde(skip)]
    pub undelivered_message_part: Option<Cow<'a, Entity>>,

    pub undelivered_message_id: Option<String>,
}

impl<'a> BounceDetectResult<'a> {
    /// The result for a message that is not a bounce.
    pub fn not_a_bounce() -> Self {
        Self::default()
    }

    /// Builds the result out of the parts a detector found in `message`.
    pub(crate) fn assemble(message: &Message, report: DeliveryReport<'a>) -> Self {
        let mut result = Self::default();

        // Later occurrences of a field replace earlier ones, so the
        // per-recipient fields of the last group win.
        let mut fields: HashMap<HeaderDef, Vec<String>> = HashMap::new();
        if let Some(status) = &report.status {
            for (name, value) in status.groups.iter().flat_map(|group| group.iter()) {
                if let Some((headerdef, captures)) = parse_field(name, value) {
                    fields.insert(headerdef, captures);
                }
            }
        }

        if let Some([class, subject, detail]) = fields.get(&HeaderDef::Status).map(Vec::as_slice)
        {
            // An unknown component leaves all three statuses unset.
            if let Some([primary, secondary, combined]) = classify(class, subject, detail).log_err()
            {
                result.primary_status = Some(primary);
                result.secondary_status = Some(secondary);
                result.combined_status = Some(combined);
            }
        }

        let mut take = |headerdef: HeaderDef, index: usize| {
            fields
                .get_mut(&headerdef)
                .and_then(|captures| captures.get_mut(index))
                .map(std::mem::take)
        };
        result.remote_mta = take(HeaderDef::RemoteMta, 1);
        result.reporting_mta = take(HeaderDef::ReportingMta, 1);
        result.final_recipient = take(HeaderDef::FinalRecipient, 1);
        if let (Some(code), Some(text)) = (
            take(HeaderDef::DiagnosticCode, 1),
            take(HeaderDef::DiagnosticCode, 2),
        ) {
            result.diagnostic_codes = Some([code, text]);
        }
        result.action = take(HeaderDef::Action, 0).and_then(|a| Action::from_str(&a).ok());

        result.undelivered_message_id = report
            .undelivered
            .as_deref()
            .and_then(Entity::as_message)
            .and_then(Message::message_id)
            // Exchange puts the id of the undelivered message into
            // In-Reply-To of the report itself.
            .or_else(|| message.in_reply_to());

        result.delivery_notification_part = report.notice;
        result.delivery_status = report.status;
        result.undelivered_message_part = report.undelivered;
        result
    }

    /// True if a delivery status report was found.
    pub fn is_bounce(&self) -> bool {
        self.delivery_status.is_some()
    }

    fn primary_code(&self) -> Option<u32> {
        self.primary_status.map(|status| status.code)
    }

    /// True for a bounce with primary status 4, "Persistent Transient Failure".
    pub fn is_success(&self) -> bool {
        self.is_bounce() && self.primary_code() == Some(4)
    }

    /// True for a permanent failure.
    pub fn is_hard(&self) -> bool {
        self.is_bounce() && !self.is_success() && self.primary_code().is_some_and(|c| c > 4)
    }

    /// True for a temporary failure.
    pub fn is_soft(&self) -> bool {
        self.is_bounce() && !self.is_success() && self.primary_code().is_some_and(|c| c <= 4)
    }
}

impl fmt::Display for BounceDetectResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.primary_status {
            Some(primary) => {
                let message = |status: Option<BounceStatus>| status.map_or("", |s| s.message);
                write!(
                    f,
                    "{}, {}, {}",
                    primary.message,
                    message(self.secondary_status),
                    message(self.combined_status)
                )
            }
            None => write!(f, "Not a bounce message."),
        }
    }
}
