//! # MIME message parsing module.
//!
//! Turns the [`mailparse`] representation of a message into an owned tree
//! of [`Entity`] values. The tree only keeps what the bounce detectors look
//! at: headers, content types, decoded text, embedded messages and the
//! field groups of `message/delivery-status` parts.

use std::collections::BTreeMap;

use anyhow::Result;
use mailparse::{MailAddr, MailHeader, ParsedMail};
use mime::Mime;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::headerdef::{HeaderDef, HeaderDefMap};
use crate::log::LogExt;

/// Ordered, case-insensitive multi-map of header fields.
///
/// Used both for message headers and for the field groups of a
/// delivery status report.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HeaderList {
    fields: Vec<(String, String)>,
}

/// One block of delivery status fields, either per-message or per-recipient.
pub type StatusGroup = HeaderList;

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Returns the value of the first field called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the values of all fields called `name`, in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn from_mail_headers(headers: &[MailHeader<'_>]) -> Self {
        headers
            .iter()
            .map(|header| (header.get_key(), header.get_value()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderList {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut list = HeaderList::new();
        for (name, value) in iter {
            list.push(name, value);
        }
        list
    }
}

/// Content type of an entity with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentType {
    pub mimetype: Mime,

    /// Parameters other than the ones folded into `mimetype`; names are lowercase.
    pub params: BTreeMap<String, String>,
}

impl ContentType {
    pub fn new(mimetype: Mime) -> Self {
        Self {
            mimetype,
            params: BTreeMap::new(),
        }
    }

    pub fn is_text_plain(&self) -> bool {
        self.mimetype.essence_str() == "text/plain"
    }

    /// Returns the parameter called `name`, compared case-insensitively.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn from_parsed(mail: &ParsedMail<'_>) -> Self {
        // An unparseable Content-Type is treated as text/plain, RFC 2045 section 5.2.
        let mimetype = mail
            .ctype
            .mimetype
            .parse::<Mime>()
            .unwrap_or(mime::TEXT_PLAIN);
        Self {
            mimetype,
            params: mail
                .ctype
                .params
                .iter()
                .map(|(key, value)| (key.to_lowercase(), value.clone()))
                .collect(),
        }
    }
}

/// A leaf entity holding decoded text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPart {
    pub content_type: ContentType,
    pub text: String,
}

impl TextPart {
    /// Creates a `text/plain` part.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::new(mime::TEXT_PLAIN),
            text: text.into(),
        }
    }
}

/// An entity wrapping a complete message, e.g. `message/rfc822`.
#[derive(Debug, Clone, PartialEq)]
pub struct MessagePart {
    pub content_type: ContentType,
    pub message: Message,
}

impl MessagePart {
    /// Wraps `message` as a `message/rfc822` part.
    pub fn rfc822(message: Message) -> Self {
        static MESSAGE_RFC822: Lazy<Mime> = Lazy::new(|| "message/rfc822".parse().unwrap());
        Self {
            content_type: ContentType::new(MESSAGE_RFC822.clone()),
            message,
        }
    }
}

/// The machine readable body of a delivery report,
/// see [RFC 3464](https://tools.ietf.org/html/rfc3464).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeliveryStatus {
    /// The first group holds per-message fields, the others per-recipient fields.
    pub groups: Vec<StatusGroup>,
}

impl DeliveryStatus {
    /// Splits a `message/delivery-status` body into its field groups.
    ///
    /// Groups are separated by blank lines. A group which can not be parsed
    /// is skipped.
    pub fn parse(body: &str) -> Self {
        static GROUP_SEPARATOR: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"\r?\n(?:[ \t]*\r?\n)+").unwrap());

        let groups = GROUP_SEPARATOR
            .split(body.trim())
            .filter(|group| !group.trim().is_empty())
            .filter_map(|group| {
                mailparse::parse_headers(group.as_bytes())
                    .log_err()
                    .map(|(headers, _)| HeaderList::from_mail_headers(&headers))
            })
            .filter(|group| !group.is_empty())
            .collect();
        Self { groups }
    }
}

/// A multipart container with its children in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Multipart {
    pub content_type: ContentType,
    pub children: Vec<Entity>,
}

/// A node of the MIME tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Text(TextPart),
    Message(Box<MessagePart>),
    DeliveryStatus(DeliveryStatus),
    Multipart(Multipart),

    /// Any other leaf, its content is not kept.
    Other(ContentType),
}

impl Entity {
    fn from_parsed(mail: &ParsedMail<'_>) -> Result<Self> {
        let content_type = ContentType::from_parsed(mail);
        let mimetype = content_type.mimetype.clone();

        let entity = match (mimetype.type_().as_str(), mimetype.subtype().as_str()) {
            ("multipart", _) => {
                let children = mail
                    .subparts
                    .iter()
                    .map(Entity::from_parsed)
                    .collect::<Result<_>>()?;
                Entity::Multipart(Multipart {
                    content_type,
                    children,
                })
            }
            ("message", "rfc822" | "global") | ("text", "rfc822-headers") => {
                let raw = mail.get_body_raw()?;
                match Message::from_bytes(&raw).log_err() {
                    Some(message) => Entity::Message(Box::new(MessagePart {
                        content_type,
                        message,
                    })),
                    None => Entity::Other(content_type),
                }
            }
            ("message", "delivery-status" | "global-delivery-status") => {
                Entity::DeliveryStatus(DeliveryStatus::parse(&mail.get_body()?))
            }
            ("text", _) => Entity::Text(TextPart {
                content_type,
                text: mail.get_body()?,
            }),
            _ => Entity::Other(content_type),
        };
        Ok(entity)
    }

    /// Returns the wrapped message if this is a message entity.
    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Entity::Message(part) => Some(&part.message),
            _ => None,
        }
    }
}

/// A parsed message: its top-level headers and its body entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub headers: HeaderList,
    pub body: Entity,
}

impl Message {
    /// Parses a raw RFC 5322 message.
    pub fn from_bytes(body: &[u8]) -> Result<Self> {
        let mail = mailparse::parse_mail(body)?;
        Self::from_parsed(&mail)
    }

    fn from_parsed(mail: &ParsedMail<'_>) -> Result<Self> {
        Ok(Self {
            headers: HeaderList::from_mail_headers(&mail.headers),
            body: Entity::from_parsed(mail)?,
        })
    }

    pub fn get_header(&self, headerdef: HeaderDef) -> Option<&str> {
        self.headers.get_header_value(headerdef)
    }

    pub fn subject(&self) -> Option<&str> {
        self.get_header(HeaderDef::Subject)
    }

    /// Returns the `Message-Id` without angle brackets.
    pub fn message_id(&self) -> Option<String> {
        self.get_header(HeaderDef::MessageId)
            .and_then(first_message_id)
    }

    /// Returns the first message id of `In-Reply-To` without angle brackets.
    pub fn in_reply_to(&self) -> Option<String> {
        self.get_header(HeaderDef::InReplyTo)
            .and_then(first_message_id)
    }

    /// Returns the addresses of the `To` header, group members included.
    pub fn to(&self) -> Vec<String> {
        let Some(to) = self.get_header(HeaderDef::To) else {
            return Vec::new();
        };
        let Some(addrs) = mailparse::addrparse(to).log_err() else {
            return Vec::new();
        };
        addrs
            .iter()
            .flat_map(|addr| match addr {
                MailAddr::Single(info) => vec![info.addr.clone()],
                MailAddr::Group(group) => group.addrs.iter().map(|i| i.addr.clone()).collect(),
            })
            .collect()
    }

    /// Returns the first `text/plain` part in document order.
    pub fn text_body(&self) -> Option<&str> {
        let mut stack = vec![&self.body];
        while let Some(entity) = stack.pop() {
            match entity {
                Entity::Text(part) if part.content_type.is_text_plain() => {
                    return Some(&part.text);
                }
                Entity::Multipart(multipart) => stack.extend(multipart.children.iter().rev()),
                _ => {}
            }
        }
        None
    }
}

/// Returns the first id of a `Message-Id` or `In-Reply-To` value without
/// angle brackets. Ids are separated by whitespace.
fn first_message_id(value: &str) -> Option<String> {
    value
        .split_whitespace()
        .map(|id| id.trim_start_matches('<').trim_end_matches('>'))
        .find(|id| !id.is_empty())
        .map(str::to_string)
}
