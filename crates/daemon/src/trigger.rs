use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::Instant;
use crate::error::ConfigError;

/// Longest interval accepted from an expression
pub const MAX_INTERVAL: Duration = Duration::from_secs(366 * 86_400);

/// Fires at a fixed interval, measured from the start of the previous run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalTrigger {
    every: Duration,
}

impl IntervalTrigger {
    /// `every` must be non-zero; parsed triggers always are
    pub fn new(every: Duration) -> Self {
        debug_assert!(!every.is_zero(), "interval must be positive");
        Self { every }
    }

    pub fn period(&self) -> Duration {
        self.every
    }

    /// A trigger that has never fired is due immediately
    pub fn due(&self, now: Instant, last_run: Option<Instant>) -> bool {
        match last_run {
            None => true,
            // An interval past the clock's range never comes due
            Some(last) => last.checked_add(self.every).is_some_and(|due| now >= due),
        }
    }

    /// Earliest instant, not before `now`, at which the trigger is due
    ///
    /// Missed periods are not replayed: an overdue trigger is due once, now.
    pub fn next_due(&self, now: Instant, last_run: Option<Instant>) -> Instant {
        match last_run {
            None => now,
            Some(last) => last
                .checked_add(self.every)
                .unwrap_or(now + MAX_INTERVAL)
                .max(now),
        }
    }
}

impl fmt::Display for IntervalTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.every.as_secs();
        let (n, unit) = if secs % 86_400 == 0 {
            (secs / 86_400, "day")
        } else if secs % 3_600 == 0 {
            (secs / 3_600, "hour")
        } else if secs % 60 == 0 {
            (secs / 60, "minute")
        } else {
            (secs, "second")
        };
        let plural = if n == 1 { "" } else { "s" };
        write!(f, "every {} {}{}", n, unit, plural)
    }
}

fn unit_seconds(unit: &str) -> Option<u64> {
    match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => Some(1),
        "m" | "min" | "mins" | "minute" | "minutes" => Some(60),
        "h" | "hour" | "hours" => Some(3_600),
        "d" | "day" | "days" => Some(86_400),
        _ => None,
    }
}

impl FromStr for IntervalTrigger {
    type Err = ConfigError;

    /// Parse `every <n> <unit>` or `every <unit>`, e.g. "every 10 minutes"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidInterval(s.to_string());

        let lowered = s.to_lowercase();
        let words: Vec<&str> = lowered.split_whitespace().collect();

        let (count, unit) = match words.as_slice() {
            ["every", unit] => (1, *unit),
            ["every", n, unit] => (n.parse::<u64>().map_err(|_| invalid())?, *unit),
            _ => return Err(invalid()),
        };

        let secs = unit_seconds(unit)
            .and_then(|u| u.checked_mul(count))
            .filter(|secs| *secs > 0 && *secs <= MAX_INTERVAL.as_secs())
            .ok_or_else(invalid)?;

        Ok(IntervalTrigger::new(Duration::from_secs(secs)))
    }
}
