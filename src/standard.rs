//! # Standard bounce detection.
//!
//! A standard bounce is a `multipart/report; report-type=delivery-status`
//! container, see [RFC 6522](https://tools.ietf.org/html/rfc6522). Its first
//! part is for humans, its second part, `message/delivery-status`, for
//! machines:
//!
//! ```text
//! Content-Type: message/delivery-status
//!
//! Reporting-MTA: dns; PTPEDGE02.test.local
//!
//! Final-recipient: RFC822;
//!  email_that_does_not_exists_this_is_just_a_test@gmail.com
//! Action: failed
//! Status: 5.1.1
//! Remote-MTA: dns; mx.google.com
//! ```
//!
//! The optional third part is the returned message.

use std::borrow::Cow;

use crate::bounce::DeliveryReport;
use crate::mimeparser::{Entity, Message, Multipart};

impl Multipart {
    /// Returns true for a `multipart/report` carrying delivery status.
    ///
    /// Some providers, e.g. Tiscali, forget to set the report-type.
    /// With `assume_delivery_status` such a report is taken as a
    /// delivery status report as well.
    fn is_delivery_report(&self, assume_delivery_status: bool) -> bool {
        if self.content_type.mimetype.subtype().as_str() != "report" {
            return false;
        }
        match self.content_type.param("report-type") {
            Some(report_type) => report_type.eq_ignore_ascii_case("delivery-status"),
            None => assume_delivery_status,
        }
    }
}

/// Returns the first delivery report container in document order.
///
/// Embedded messages are searched as well.
fn find_report(root: &Entity, assume_delivery_status: bool) -> Option<&Multipart> {
    let mut stack = vec![root];
    while let Some(entity) = stack.pop() {
        match entity {
            Entity::Multipart(multipart) => {
                if multipart.is_delivery_report(assume_delivery_status) {
                    return Some(multipart);
                }
                stack.extend(multipart.children.iter().rev());
            }
            Entity::Message(part) => stack.push(&part.message.body),
            Entity::Text(_) | Entity::DeliveryStatus(_) | Entity::Other(_) => {}
        }
    }
    None
}

/// Detects a standard delivery report anywhere in `message`.
///
/// Returns `None` if there is no report container or if its second part is
/// not a delivery status.
pub(crate) fn detect(message: &Message, assume_delivery_status: bool) -> Option<DeliveryReport<'_>> {
    let report = find_report(&message.body, assume_delivery_status)?;

    let status = match report.children.get(1) {
        Some(Entity::DeliveryStatus(status)) => status,
        other => {
            log::debug!("delivery report without delivery status part: {:?}", other);
            return None;
        }
    };
    log::info!(
        "standard delivery report with {} status groups",
        status.groups.len()
    );

    Some(DeliveryReport {
        notice: report.children.first().map(Cow::Borrowed),
        status: Some(Cow::Borrowed(status)),
        undelivered: report.children.get(2).map(Cow::Borrowed),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const NESTED_REPORT: &[u8] = b"From: postmaster@example.org\n\
Subject: Fwd: delivery failure\n\
Content-Type: multipart/mixed; boundary=\"outer\"\n\
\n\
--outer\n\
Content-Type: text/plain\n\
\n\
See below.\n\
--outer\n\
Content-Type: multipart/report; report-type=delivery-status; boundary=\"inner\"\n\
\n\
--inner\n\
Content-Type: text/plain\n\
\n\
Your message could not be delivered.\n\
--inner\n\
Content-Type: message/delivery-status\n\
\n\
Reporting-MTA: dns; mx.example.org\n\
\n\
Final-Recipient: rfc822; nobody@example.net\n\
Action: failed\n\
Status: 5.1.1\n\
--inner--\n\
--outer\n\
Content-Type: multipart/report; report-type=delivery-status; boundary=\"second\"\n\
\n\
--second\n\
Content-Type: text/plain\n\
\n\
Second report.\n\
--second\n\
Content-Type: message/delivery-status\n\
\n\
Reporting-MTA: dns; second.example.org\n\
--second--\n\
--outer--\n";

    #[test]
    fn test_detect_nested_first_report_wins() {
        let message = Message::from_bytes(NESTED_REPORT).unwrap();
        let report = detect(&message, false).unwrap();

        let status = report.status.unwrap();
        assert_eq!(status.groups.len(), 2);
        assert_eq!(status.groups[0].get("Reporting-MTA"), Some("dns; mx.example.org"));
        assert!(matches!(status, Cow::Borrowed(_)));
        let Some(Entity::Text(notice)) = report.notice.as_deref() else {
            panic!("notice is not a text part");
        };
        assert_eq!(notice.text.trim(), "Your message could not be delivered.");
        assert!(report.undelivered.is_none());
    }

    #[test]
    fn test_detect_missing_report_type() {
        let raw = b"Content-Type: multipart/report; boundary=\"b\"\n\
\n\
--b\n\
Content-Type: text/plain\n\
\n\
failed\n\
--b\n\
Content-Type: message/delivery-status\n\
\n\
Reporting-MTA: dns; mx.example.org\n\
--b--\n";
        let message = Message::from_bytes(raw).unwrap();
        assert!(detect(&message, false).is_none());
        assert!(detect(&message, true).is_some());
    }

    #[test]
    fn test_detect_other_report_type() {
        let raw = b"Content-Type: multipart/report; report-type=disposition-notification;\n\t\
boundary=\"b\"\n\
\n\
--b\n\
Content-Type: text/plain\n\
\n\
displayed\n\
--b\n\
Content-Type: message/disposition-notification\n\
\n\
Final-Recipient: rfc822;bob@example.org\n\
Disposition: manual-action/MDN-sent-automatically; displayed\n\
--b--\n";
        let message = Message::from_bytes(raw).unwrap();
        assert!(detect(&message, false).is_none());
        assert!(detect(&message, true).is_none());
    }

    #[test]
    fn test_detect_without_status_part() {
        let raw = b"Content-Type: multipart/report; report-type=delivery-status; boundary=\"b\"\n\
\n\
--b\n\
Content-Type: text/plain\n\
\n\
failed\n\
--b--\n";
        let message = Message::from_bytes(raw).unwrap();
        assert!(detect(&message, false).is_none());
    }

    #[test]
    fn test_detect_plain_message() {
        let message = Message::from_bytes(b"Subject: hi\n\nhello\n").unwrap();
        assert!(detect(&message, false).is_none());
    }
}
