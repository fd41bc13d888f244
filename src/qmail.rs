//! # qmail bounce detection.
//!
//! qmail does not send RFC 3464 reports but plain text bounces in the
//! [qmail-send Bounce Message Format (QSBMF)](http://cr.yp.to/proto/qsbmf.txt):
//!
//! ```text
//! Hi. This is the qmail-send program at silverton.berkeley.edu.
//! I'm afraid I wasn't able to deliver your message to the following addresses.
//! This is a permanent error; I've given up. Sorry it didn't work out.
//!
//! <god@heaven.af.mil>:
//! Sorry, I couldn't find any host by that name.
//!
//! --- Below this line is a copy of the message.
//!
//! Return-Path: <djb@silverton.berkeley.edu>
//! ...
//! ```
//!
//! The detector turns such a text into the same three parts a standard
//! report has, synthesizing the delivery status groups.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::bounce::DeliveryReport;
use crate::log::LogExt;
use crate::mimeparser::{
    DeliveryStatus, Entity, HeaderList, Message, MessagePart, StatusGroup, TextPart,
};

const GREETING: &str = "Hi. This is the ";

/// Status used when a failure paragraph does not mention one.
const DEFAULT_STATUS: &str = "5.3.0";

// e.g. Hi. This is the qmail-send program at mgm-smtp.example.com.
static GREETING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Hi\. This is the .+ (.+)\.\r?\n").unwrap());
static LINES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n").unwrap());
static PARAGRAPH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:\r?\n){2,}").unwrap());
static BREAK_PARAGRAPH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r?\n-.+?\r?\n\r?\n").unwrap());
static FAILURE_PARAGRAPH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^<(.+?)>:\r?\n(.+)").unwrap());
// e.g. Remote host said: 554 5.7.1 <notFound@example.com>: Relay access denied
static STATUS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" (\d\.\d+\.\d+) (.+)").unwrap());

#[derive(Debug, PartialEq)]
struct FailureParagraph<'a> {
    recipient: &'a str,
    message: &'a str,
    status: &'a str,
}

impl<'a> FailureParagraph<'a> {
    fn parse(text: &'a str) -> Option<Self> {
        let captures = FAILURE_PARAGRAPH_RE.captures(text)?;
        let recipient = captures.get(1)?.as_str();
        let message = captures.get(2)?.as_str();

        let status = LINES_RE
            .split(message)
            .find_map(|line| STATUS_RE.captures(line))
            .and_then(|captures| captures.get(1))
            .map_or(DEFAULT_STATUS, |status| status.as_str());

        Some(Self {
            recipient,
            message,
            status,
        })
    }

    fn status_group(&self) -> StatusGroup {
        let diagnostic = LINES_RE.replace_all(self.message, " ");
        [
            ("Action", "failed".to_string()),
            ("Status", self.status.to_string()),
            ("Final-Recipient", format!("rfc822;{}", self.recipient)),
            ("Diagnostic-Code", format!("X-QMail;{}", diagnostic.trim())),
        ]
        .into_iter()
        .collect()
    }
}

/// Detects a qmail bounce in the body of `message`.
///
/// The body has to be a `text/plain` part or a `multipart/alternative`
/// container; in the latter case the first plain text alternative which
/// is a qmail bounce is used.
pub(crate) fn detect(message: &Message) -> Option<DeliveryReport<'static>> {
    match &message.body {
        Entity::Text(part) => detect_text(part),
        Entity::Multipart(multipart)
            if multipart.content_type.mimetype.subtype().as_str() == "alternative" =>
        {
            multipart.children.iter().find_map(|child| match child {
                Entity::Text(part) => detect_text(part),
                _ => None,
            })
        }
        _ => None,
    }
}

fn detect_text(part: &TextPart) -> Option<DeliveryReport<'static>> {
    if !part.content_type.is_text_plain() {
        return None;
    }

    let text = part.text.as_str();
    if !text.starts_with(GREETING) {
        return None;
    }
    let host = GREETING_RE.captures(text)?.get(1)?.as_str();

    let parts: Vec<&str> = BREAK_PARAGRAPH_RE.splitn(text, 2).collect();
    let [notice, original] = parts[..] else {
        log::debug!("qmail bounce from {host} has no copy of the message");
        return None;
    };

    let undelivered = Message::from_bytes(original.as_bytes()).log_err()?;

    let mut groups: Vec<StatusGroup> = vec![[("Reporting-MTA", format!("dns;{host}"))]
        .into_iter()
        .collect()];

    // The first paragraph is the greeting.
    groups.extend(
        PARAGRAPH_RE
            .split(notice)
            .skip(1)
            .filter_map(FailureParagraph::parse)
            .map(|paragraph| paragraph.status_group()),
    );

    if groups.len() == 1 {
        log::warn!("qmail bounce from {host} has no failure paragraphs");
        let mut group = HeaderList::new();
        group.push("Action", "failed");
        group.push("Status", DEFAULT_STATUS);
        group.push("Diagnostic-Code", "X-QMail; No failure paragraphs found");
        groups.push(group);
    }

    log::info!(
        "qmail bounce from {host} with {} failed recipient groups",
        groups.len() - 1
    );

    Some(DeliveryReport {
        notice: Some(Cow::Owned(Entity::Text(TextPart::plain(notice)))),
        status: Some(Cow::Owned(DeliveryStatus { groups })),
        undelivered: Some(Cow::Owned(Entity::Message(Box::new(MessagePart::rfc822(
            undelivered,
        ))))),
    })
}
