//! Queue domain types

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("queue name cannot be empty")]
pub struct QueueNameEmptyError;

/// Name of a queue, trimmed of surrounding whitespace
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueueName(String);

impl QueueName {
    pub fn new(raw: &str) -> Result<Self, QueueNameEmptyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(QueueNameEmptyError);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Longest reservation or expiry accepted, in seconds (100 years)
pub const MAX_DURATION_SECS: u64 = 100 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reservation {
    Unreserved,
    Until(Instant),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expiry {
    Permanent,
    At(Instant),
}

/// A message held in a queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    mid: Uuid,
    cid: Option<Uuid>,
    cursor: u64,
    content: String,
    sent_at: DateTime<Utc>,
    reservation: Reservation,
    expiry: Expiry,
}

impl Message {
    pub(crate) fn new(cursor: u64, new: NewMessage, now: Instant) -> Self {
        Self {
            mid: Uuid::new_v4(),
            cid: new.cid,
            cursor,
            content: new.content,
            sent_at: Utc::now(),
            reservation: Reservation::Unreserved,
            expiry: match new.expires_in {
                Some(ttl) => now.checked_add(ttl).map_or(Expiry::Permanent, Expiry::At),
                None => Expiry::Permanent,
            },
        }
    }

    pub fn mid(&self) -> Uuid {
        self.mid
    }

    pub fn cid(&self) -> Option<Uuid> {
        self.cid
    }

    /// Position in the queue; strictly increasing in append order
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }

    pub fn is_reserved_at(&self, now: Instant) -> bool {
        match self.reservation {
            Reservation::Unreserved => false,
            Reservation::Until(until) => now < until,
        }
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expiry {
            Expiry::Permanent => false,
            Expiry::At(at) => now >= at,
        }
    }

    pub(crate) fn reserve_until(&mut self, until: Instant) {
        self.reservation = Reservation::Until(until);
    }

    pub(crate) fn release(&mut self) {
        self.reservation = Reservation::Unreserved;
    }
}

/// Content and options for a message about to be appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    content: String,
    cid: Option<Uuid>,
    expires_in: Option<Duration>,
}

impl NewMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            cid: None,
            expires_in: None,
        }
    }

    #[must_use]
    pub fn with_cid(mut self, cid: Uuid) -> Self {
        self.cid = Some(cid);
        self
    }

    #[must_use]
    pub fn with_expiry(mut self, ttl: Duration) -> Self {
        self.expires_in = Some(ttl);
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// What a GET request on a queue does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Browse,
    Get,
    Reserve,
    Confirm,
    Return,
    Query,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Browse => "browse",
            Self::Get => "get",
            Self::Reserve => "reserve",
            Self::Confirm => "confirm",
            Self::Return => "return",
            Self::Query => "query",
        }
    }
}

impl FromStr for Action {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "browse" => Ok(Self::Browse),
            "get" => Ok(Self::Get),
            "reserve" => Ok(Self::Reserve),
            "confirm" => Ok(Self::Confirm),
            "return" => Ok(Self::Return),
            "query" => Ok(Self::Query),
            _ => Err(OptionsError::InvalidParameter("action")),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("missing parameter {0}")]
    MissingParameter(&'static str),
    #[error("invalid value for parameter {0}")]
    InvalidParameter(&'static str),
    #[error(transparent)]
    QueueName(#[from] QueueNameEmptyError),
}

/// A validated GET request against one queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetOptions {
    queue_name: QueueName,
    action: Action,
    mid: Option<Uuid>,
    cid: Option<Uuid>,
    after: Option<u64>,
    reserve_for: Option<Duration>,
}

impl GetOptions {
    pub fn new(queue_name: QueueName, action: Action) -> Self {
        Self {
            queue_name,
            action,
            mid: None,
            cid: None,
            after: None,
            reserve_for: None,
        }
    }

    /// Parse the query string of `GET /api/{queue_name}`
    pub fn from_query(
        queue_name: &str,
        params: &HashMap<String, String>,
    ) -> Result<Self, OptionsError> {
        let queue_name = QueueName::new(queue_name)?;
        let action = params
            .get("action")
            .ok_or(OptionsError::MissingParameter("action"))?
            .parse::<Action>()?;

        let options = Self {
            queue_name,
            action,
            mid: parse_param(params, "mid", |s| Uuid::try_parse(s).ok())?,
            cid: parse_param(params, "cid", |s| Uuid::try_parse(s).ok())?,
            after: parse_param(params, "after", |s| s.parse().ok())?,
            reserve_for: parse_param(params, "reservation_seconds", |s| {
                s.parse::<u64>()
                    .ok()
                    .filter(|secs| *secs <= MAX_DURATION_SECS)
                    .map(Duration::from_secs)
            })?,
        };
        options.validate()?;
        Ok(options)
    }

    #[must_use]
    pub fn with_mid(mut self, mid: Uuid) -> Self {
        self.mid = Some(mid);
        self
    }

    #[must_use]
    pub fn with_cid(mut self, cid: Uuid) -> Self {
        self.cid = Some(cid);
        self
    }

    #[must_use]
    pub fn after(mut self, cursor: u64) -> Self {
        self.after = Some(cursor);
        self
    }

    #[must_use]
    pub fn reserve_for(mut self, duration: Duration) -> Self {
        self.reserve_for = Some(duration);
        self
    }

    /// Check that the parameters present fit the action
    pub fn validate(&self) -> Result<(), OptionsError> {
        match self.action {
            _ if self
                .reserve_for
                .is_some_and(|d| d.as_secs() > MAX_DURATION_SECS) =>
            {
                Err(OptionsError::InvalidParameter("reservation_seconds"))
            }
            Action::Reserve if self.reserve_for.is_none() => {
                Err(OptionsError::MissingParameter("reservation_seconds"))
            }
            Action::Confirm | Action::Return if self.mid.is_none() => {
                Err(OptionsError::MissingParameter("mid"))
            }
            Action::Browse | Action::Query if self.reserve_for.is_some() => {
                Err(OptionsError::InvalidParameter("reservation_seconds"))
            }
            _ => Ok(()),
        }
    }

    pub fn queue_name(&self) -> &QueueName {
        &self.queue_name
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn mid(&self) -> Option<Uuid> {
        self.mid
    }

    pub fn reservation(&self) -> Option<Duration> {
        self.reserve_for
    }

    /// Whether `msg` is visible to browse, get and reserve under these filters
    pub fn matches_visible(&self, msg: &Message, now: Instant) -> bool {
        !msg.is_reserved_at(now)
            && !msg.is_expired_at(now)
            && self.mid.map_or(true, |mid| msg.mid == mid)
            && self.cid.map_or(true, |cid| msg.cid == Some(cid))
            && self.after.map_or(true, |after| msg.cursor > after)
    }

    /// Whether `msg` is the reserved message confirm and return act on
    pub fn matches_reserved(&self, msg: &Message, now: Instant) -> bool {
        msg.is_reserved_at(now) && self.mid == Some(msg.mid)
    }
}

fn parse_param<T>(
    params: &HashMap<String, String>,
    name: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, OptionsError> {
    params
        .get(name)
        .map(|raw| parse(raw.trim()).ok_or(OptionsError::InvalidParameter(name)))
        .transpose()
}

/// Depth report for one queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueSummary {
    pub queue_name: String,
    /// Live messages, reserved ones included
    pub depth: usize,
    pub reserved: usize,
}
