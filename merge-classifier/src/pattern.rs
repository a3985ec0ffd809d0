use crate::ClassifierError;
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

/// Defines how a single field is located within the text of a page.
///
/// Every pattern is searched (not anchored) and the field value is
/// capture group 1. A pattern that does not match, or matches an empty
/// capture, leaves the field absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Capture group 1 taken verbatim.
    Capture(&'static str),
    /// Capture group 1 with surrounding whitespace removed.
    Trimmed(&'static str),
}

impl Pattern {
    pub const fn source(&self) -> &'static str {
        match self {
            Self::Capture(s) | Self::Trimmed(s) => s,
        }
    }

    pub(crate) fn compile(&self) -> Result<CompiledPattern, ClassifierError> {
        let regex = Regex::new(self.source()).map_err(|source| ClassifierError::InvalidPattern {
            pattern: self.source(),
            source,
        })?;

        Ok(CompiledPattern {
            regex,
            trim: matches!(self, Self::Trimmed(_)),
        })
    }
}

/// A [Pattern] ready to run against text.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    regex: Regex,
    trim: bool,
}

impl CompiledPattern {
    pub fn extract(&self, text: &str) -> Option<String> {
        let raw = self.regex.captures(text)?.get(1)?.as_str();
        let value = if self.trim { raw.trim() } else { raw };

        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }
}

/// The strftime layout a grammar prints its timestamp with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    /// Date and time of day.
    DateTime(&'static str),
    /// Date only, interpreted as midnight.
    Date(&'static str),
}

impl TimestampFormat {
    pub fn parse(&self, raw: &str) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(fmt) => NaiveDateTime::parse_from_str(raw, fmt).ok(),
            Self::Date(fmt) => NaiveDate::parse_from_str(raw, fmt)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
        }
    }
}

/// e.g. `Wednesday, June 12, 2019 02:30:00 PM`
pub const ECLIPSE_PRINTED: TimestampFormat = TimestampFormat::DateTime("%A, %B %d, %Y %I:%M:%S %p");
/// Beam's eye view printouts drop the seconds: `Wednesday, June 12, 2019 02:30 PM`
pub const ECLIPSE_PRINTED_SHORT: TimestampFormat = TimestampFormat::DateTime("%A, %B %d, %Y %I:%M %p");
/// e.g. `1 Oct 2020 09:00:00`
pub const ONCENTRA_PLAN_PRINTED: TimestampFormat = TimestampFormat::DateTime("%d %b %Y %H:%M:%S");
/// e.g. `01-Oct-2020 12:00:00`
pub const ONCENTRA_DVH_PRINTED: TimestampFormat = TimestampFormat::DateTime("%d-%b-%Y %H:%M:%S");
/// Date and time run together: `10/01/20209:30:00AM`
pub const CLEARCHECK_PRINTED: TimestampFormat = TimestampFormat::DateTime("%m/%d/%Y%I:%M:%S%p");
/// e.g. `10/01/2020`
pub const SECOND_CHECK_CALCULATED: TimestampFormat = TimestampFormat::Date("%m/%d/%Y");

/// Pairs a [Pattern] locating the timestamp with the format it is printed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampPattern {
    pub pattern: Pattern,
    pub format: TimestampFormat,
}

impl TimestampPattern {
    pub const fn new(pattern: Pattern, format: TimestampFormat) -> Self {
        Self { pattern, format }
    }
}
