//! # Logging
//!
//! The crate only logs through the [`log`] facade; installing a logger
//! is up to the application.

use std::fmt::Display;

pub(crate) trait LogExt<T> {
    /// Logs an `Err` as a warning and drops it.
    ///
    /// Used where detection degrades instead of failing, e.g. a status group
    /// that does not parse. The warning carries the caller's location.
    #[track_caller]
    fn log_err(self) -> Option<T>;
}

impl<T, E: Display> LogExt<T> for Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(err) => {
                let location = std::panic::Location::caller();
                // {:#} prints the anyhow context chain.
                log::warn!("{}:{}: {:#}", location.file(), location.line(), err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::format_err;

    use super::*;
    use crate::status::StatusAxis;

    #[test]
    fn test_log_err() {
        let res: anyhow::Result<()> = Err(format_err!("bad group").context("delivery status"));
        assert_eq!(res.log_err(), None);

        let res: anyhow::Result<u32> = Ok(7);
        assert_eq!(res.log_err(), Some(7));

        assert_eq!(StatusAxis::Combined.lookup("99").log_err(), None);
    }
}
