/*
 * Copyright (c) 2024 Yunshan Networks
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

// Capture timestamps are nanoseconds since the unix epoch in trace time.
// std::time::Duration is 16B, flow nodes keep two of these.

use std::fmt;
use std::ops::Sub;
use std::time::Duration;

#[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl From<Duration> for Timestamp {
    fn from(d: Duration) -> Self {
        Self(d.as_nanos() as u64)
    }
}

impl From<Timestamp> for Duration {
    fn from(t: Timestamp) -> Self {
        Self::from_nanos(t.as_nanos())
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Duration::from(*self).fmt(f)
    }
}

impl Timestamp {
    const NANOS_IN_SECOND: u64 = Duration::from_secs(1).as_nanos() as u64;
    const NANOS_IN_MILLIS: u64 = Duration::from_millis(1).as_nanos() as u64;
    const NANOS_IN_MICROS: u64 = Duration::from_micros(1).as_nanos() as u64;

    pub const ZERO: Self = Self(0);

    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    pub const fn as_nanos(&self) -> u64 {
        self.0
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self(millis * Self::NANOS_IN_MILLIS)
    }

    pub const fn as_millis(&self) -> u64 {
        self.0 / Self::NANOS_IN_MILLIS
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * Self::NANOS_IN_SECOND)
    }

    pub const fn as_secs(&self) -> u64 {
        self.0 / Self::NANOS_IN_SECOND
    }

    // pcap record headers carry a struct timeval
    // saturates instead of wrapping on out of range values
    pub const fn from_timeval(secs: u64, micros: u64) -> Self {
        Self(
            secs.saturating_mul(Self::NANOS_IN_SECOND)
                .saturating_add(micros.saturating_mul(Self::NANOS_IN_MICROS)),
        )
    }

    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Milliseconds elapsed since `base`, in the 32 bit width of NetFlow v5 uptime fields.
    pub fn millis_since(&self, base: Self) -> u32 {
        self.saturating_sub(base).as_millis() as u32
    }
}

impl PartialEq<Duration> for Timestamp {
    fn eq(&self, other: &Duration) -> bool {
        self.0.eq(&(other.as_nanos() as u64))
    }
}

impl PartialOrd<Duration> for Timestamp {
    fn partial_cmp(&self, other: &Duration) -> Option<std::cmp::Ordering> {
        Some(self.0.cmp(&(other.as_nanos() as u64)))
    }
}

impl Sub for Timestamp {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        if self.0 < rhs.0 {
            panic!("overflow when subtracting timestamp")
        }
        Self(self.0 - rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeval_conversion() {
        let ts = Timestamp::from_timeval(1571105646, 245884);
        assert_eq!(ts, Duration::new(1571105646, 245884000));
        assert_eq!(ts.as_secs(), 1571105646);
        assert_eq!(ts.as_millis(), 1571105646245);
    }

    #[test]
    fn timeval_out_of_range_saturates() {
        assert_eq!(Timestamp::from_timeval(u64::MAX, 0).as_nanos(), u64::MAX);
        assert_eq!(Timestamp::from_timeval(0, u64::MAX).as_nanos(), u64::MAX);
    }

    #[test]
    fn comparison() {
        assert!(Timestamp::from_millis(999) < Timestamp::from_secs(1));
        assert!(Timestamp::from_secs(60) >= Duration::from_secs(60));
    }

    #[test]
    fn saturating_arithmetics() {
        let base = Timestamp::from_secs(100);
        assert_eq!(Timestamp::from_secs(40).saturating_sub(base), Timestamp::ZERO);
        assert_eq!(Timestamp::from_millis(101_500).millis_since(base), 1500);
        assert_eq!(Timestamp::from_secs(90).millis_since(base), 0);
        assert_eq!(Timestamp::from_secs(130) - base, Duration::from_secs(30));
    }

    #[test]
    #[should_panic]
    fn subtract_overflow() {
        let _ = Timestamp::from_secs(1) - Timestamp::from_secs(2);
    }
}
