//! # Mail bounce detection.
//!
//! Classifies a parsed message as a delivery failure notification and
//! extracts the delivery status: RFC 3463 status codes, the failed
//! recipient, the diagnostic text and the id of the returned message.
//!
//! Two formats are recognized, RFC 3464 delivery reports and the plain text
//! bounces sent by qmail.
//!
//! ```no_run
//! use mail_bounce_detector::{detect, Message};
//!
//! # fn main() -> anyhow::Result<()> {
//! let raw = std::fs::read("bounce.eml")?;
//! let message = Message::from_bytes(&raw)?;
//! let result = detect(&message);
//! if result.is_hard() {
//!     println!("{:?} bounced: {}", result.final_recipient, result);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::correctness,
    missing_debug_implementations,
    clippy::all,
    clippy::wildcard_imports,
    clippy::needless_borrow,
    clippy::cast_lossless,
    clippy::explicit_iter_loop,
    clippy::explicit_into_iter_loop,
    clippy::cloned_instead_of_copied
)]

mod log;

pub mod bounce;
pub mod config;
pub mod detector;
pub mod fields;
pub mod headerdef;
pub mod mimeparser;
mod qmail;
mod standard;
pub mod status;

pub use bounce::BounceDetectResult;
pub use config::Config;
pub use detector::{detect, BounceDetector};
pub use fields::Action;
pub use mimeparser::{Entity, Message};
pub use status::BounceStatus;
