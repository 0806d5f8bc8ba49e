use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ModelError;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Elapsed time since a component started, with whole-second resolution.
///
/// Rendered as `<d>d:<h>h:<m>m:<s>s` on the wire (e.g. `"1d:2h:3m:4s"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uptime(u64);

impl Uptime {
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub const fn as_secs(&self) -> u64 {
        self.0
    }
}

impl From<Duration> for Uptime {
    fn from(elapsed: Duration) -> Self {
        Self(elapsed.as_secs())
    }
}

impl From<Uptime> for Duration {
    fn from(uptime: Uptime) -> Self {
        Duration::from_secs(uptime.0)
    }
}

impl fmt::Display for Uptime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.0;
        let days = rest / DAY;
        rest -= days * DAY;
        let hours = rest / HOUR;
        rest -= hours * HOUR;
        let minutes = rest / MINUTE;
        rest -= minutes * MINUTE;
        write!(f, "{days}d:{hours}h:{minutes}m:{rest}s")
    }
}

impl FromStr for Uptime {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidUptime(s.to_string());

        let mut parts = s.trim().split(':');
        let mut total = 0u64;
        for (suffix, scale) in [('d', DAY), ('h', HOUR), ('m', MINUTE), ('s', 1)] {
            let part = parts.next().ok_or_else(invalid)?;
            let value: u64 = part
                .strip_suffix(suffix)
                .and_then(|n| n.parse().ok())
                .ok_or_else(invalid)?;
            total = value
                .checked_mul(scale)
                .and_then(|v| total.checked_add(v))
                .ok_or_else(invalid)?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self(total))
    }
}

impl Serialize for Uptime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Uptime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
