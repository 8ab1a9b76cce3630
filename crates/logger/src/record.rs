//! Log record type optimized for performance

use crate::{Level, Location};
use std::borrow::Cow;

/// A log record - borrowed where it can be, owned where it must be
#[derive(Debug, Clone)]
pub struct Record<'a> {
    /// Log level
    pub level: Level,
    /// The log message
    pub message: Cow<'a, str>,
    /// Target module
    pub target: &'a str,
    /// Call site
    pub location: Location,
}

impl<'a> Record<'a> {
    /// Create a new record located at the caller.
    #[inline]
    #[track_caller]
    pub fn new(level: Level, message: impl Into<Cow<'a, str>>) -> Self {
        Self {
            level,
            message: message.into(),
            target: "",
            location: Location::caller(),
        }
    }

    /// Builder-style method for setting target
    #[inline]
    #[must_use]
    pub fn with_target(mut self, target: &'a str) -> Self {
        self.target = target;
        self
    }

    /// Builder-style method for setting location
    #[inline]
    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }
}
