//! Source of "today" for every date window.
//!
//! Window arithmetic never reads the system time directly; callers inject a
//! [`Clock`] so results are deterministic under test.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

use crate::EngineError;

pub trait Clock: Send + Sync {
    /// The current calendar date in the household's timezone.
    fn today(&self) -> NaiveDate;

    /// Timezone used to map remote timestamps to calendar dates.
    fn timezone(&self) -> Tz;
}

/// Wall clock evaluated in a fixed IANA timezone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Builds a clock from an IANA name such as `Asia/Bangkok`.
    pub fn from_name(name: &str) -> Result<Self, EngineError> {
        let tz = name
            .parse::<Tz>()
            .map_err(|_| EngineError::Validation(format!("unknown timezone: {name}")))?;
        Ok(Self { tz })
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    fn timezone(&self) -> Tz {
        self.tz
    }
}

/// A clock stuck on one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub today: NaiveDate,
    pub tz: Tz,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            tz: chrono_tz::Asia::Bangkok,
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.today
    }

    fn timezone(&self) -> Tz {
        self.tz
    }
}
