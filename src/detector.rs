//! # Bounce detection entry point.

use crate::bounce::BounceDetectResult;
use crate::config::Config;
use crate::mimeparser::Message;
use crate::{qmail, standard};

/// Classifies messages as bounces.
///
/// The qmail detector runs first since a qmail bounce is a plain text
/// message which the standard detector would never match. If neither
/// finds a delivery status, the message is not a bounce.
#[derive(Debug, Clone, Default)]
pub struct BounceDetector {
    config: Config,
}

impl BounceDetector {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn detect<'a>(&self, message: &'a Message) -> BounceDetectResult<'a> {
        let report = self
            .config
            .qmail
            .then(|| qmail::detect(message))
            .flatten()
            .or_else(|| {
                self.config
                    .standard
                    .then(|| standard::detect(message, self.config.assume_delivery_status))
                    .flatten()
            });

        match report {
            Some(report) => {
                let result = BounceDetectResult::assemble(message, report);
                log::debug!(
                    "bounce for {:?}: {} (action {:?})",
                    result.final_recipient,
                    result,
                    result.action
                );
                result
            }
            None => {
                log::debug!("{:?} is not a bounce", message.message_id());
                BounceDetectResult::not_a_bounce()
            }
        }
    }
}

/// Detects a bounce with the default [`Config`].
pub fn detect(message: &Message) -> BounceDetectResult<'_> {
    BounceDetector::default().detect(message)
}
