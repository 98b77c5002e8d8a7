//! Header parsing into normalized message records.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use log::debug;
use mail_parser::{Address, MessageParser};

use super::error::{EmailError, Result};

/// Timezone dates are normalized into for display and logging.
pub const REFERENCE_TIMEZONE: Tz = chrono_tz::America::Los_Angeles;

/// Normalized, immutable view of one message's envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRecord {
    id: u32,
    from: Vec<String>,
    to: Vec<String>,
    cc: Vec<String>,
    subject: String,
    date: DateTime<Tz>,
}

impl MessageRecord {
    /// Parses a raw message (or just its header block).
    ///
    /// Fails when the message has no parsable `Date` header; such a message
    /// cannot be reported on reliably and is left out of the candidate pool.
    pub fn from_raw(id: u32, raw: &[u8]) -> Result<Self> {
        let message = MessageParser::default()
            .parse(raw)
            .ok_or_else(|| EmailError::ParseError {
                uid: id,
                reason: "not an RFC 5322 message".to_string(),
            })?;

        let date = message
            .date()
            .and_then(to_reference_time)
            .ok_or_else(|| EmailError::ParseError {
                uid: id,
                reason: "missing or unparsable Date header".to_string(),
            })?;

        let record = Self {
            id,
            from: extract_addresses(message.from()),
            to: extract_addresses(message.to()),
            cc: extract_addresses(message.cc()),
            subject: normalize_subject(message.subject().unwrap_or_default()),
            date,
        };

        debug!(
            "Parsed UID={} from={:?} subject={:?}",
            record.id, record.from, record.subject
        );
        Ok(record)
    }

    /// The mailbox UID this record was fetched under.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn from(&self) -> &[String] {
        &self.from
    }

    pub fn to(&self) -> &[String] {
        &self.to
    }

    pub fn cc(&self) -> &[String] {
        &self.cc
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Send date in [`REFERENCE_TIMEZONE`].
    pub fn date(&self) -> &DateTime<Tz> {
        &self.date
    }
}

impl std::fmt::Display for MessageRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Message(uid={}, date={}, from={:?}, to={:?}, cc={:?}, subject={:?})",
            self.id,
            self.date.format("%Y-%m-%d %H:%M:%S %Z"),
            self.from,
            self.to,
            self.cc,
            self.subject
        )
    }
}

/// Validates the header's calendar fields and converts to [`REFERENCE_TIMEZONE`].
///
/// mail-parser does not check the day against the month, so `31 Feb` would
/// otherwise roll over into March.
fn to_reference_time(date: &mail_parser::DateTime) -> Option<DateTime<Tz>> {
    let day = NaiveDate::from_ymd_opt(date.year.into(), date.month.into(), date.day.into())?;
    let time = NaiveTime::from_hms_opt(date.hour.into(), date.minute.into(), date.second.into())?;
    let offset_secs = i32::from(date.tz_hour) * 3600 + i32::from(date.tz_minute) * 60;
    let offset = if date.tz_before_gmt {
        FixedOffset::west_opt(offset_secs)
    } else {
        FixedOffset::east_opt(offset_secs)
    }?;

    day.and_time(time)
        .and_local_timezone(offset)
        .single()
        .map(|dt| dt.with_timezone(&REFERENCE_TIMEZONE))
}

/// Collects the bare addresses of a From/To/Cc header, group members included.
fn extract_addresses(addr: Option<&Address>) -> Vec<String> {
    let Some(addr) = addr else {
        return Vec::new();
    };
    let bare = |a: &mail_parser::Addr| {
        a.address
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };
    match addr {
        Address::List(addrs) => addrs.iter().filter_map(bare).collect(),
        Address::Group(groups) => groups
            .iter()
            .flat_map(|g| g.addresses.iter().filter_map(bare))
            .collect(),
    }
}

fn normalize_subject(subject: &str) -> String {
    subject
        .trim()
        .chars()
        .filter(|c| !matches!(c, '\n' | '\r' | '\t'))
        .collect()
}
