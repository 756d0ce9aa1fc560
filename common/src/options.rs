// Enumerated domain values accepted by the remote tournament service
//
// Each closed set is declared once as a const lookup table: canonical text and
// numeric projection are looked up by discriminant, never re-parsed per call.

use crate::errors::ScheduleError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Returned when text does not name a member of a closed set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct UnknownOption {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

/// Canonical text as stored on disk; numbers are accepted for numeric sets.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawOption {
    Text(String),
    Number(f64),
}

impl RawOption {
    fn into_text(self) -> String {
        match self {
            RawOption::Text(text) => text,
            RawOption::Number(number) => number.to_string(),
        }
    }
}

macro_rules! domain_values {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) -> $value_ty:ty {
            $( $variant:ident => ($text:literal, $value:expr) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            const TABLE: &'static [($name, &'static str, $value_ty)] =
                &[$(($name::$variant, $text, $value)),+];

            /// Canonical text form
            pub fn as_str(self) -> &'static str {
                Self::TABLE[self as usize].1
            }

            /// Numeric (or display) projection
            pub fn value(self) -> $value_ty {
                Self::TABLE[self as usize].2
            }

            fn expected() -> String {
                Self::TABLE
                    .iter()
                    .map(|(_, text, _)| *text)
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }

        impl FromStr for $name {
            type Err = UnknownOption;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::TABLE
                    .iter()
                    .find(|(_, text, _)| text.eq_ignore_ascii_case(wanted))
                    .map(|(member, _, _)| *member)
                    .ok_or_else(|| UnknownOption {
                        kind: $kind,
                        value: s.to_string(),
                        expected: Self::expected(),
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = RawOption::deserialize(deserializer)?.into_text();
                text.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

domain_values! {
    /// Initial clock time, projected in minutes
    ClockTime ("clock time") -> f64 {
        Seconds0 => ("0", 0.0),
        Seconds15 => ("0.25", 0.25),
        Seconds30 => ("0.5", 0.5),
        Seconds45 => ("0.75", 0.75),
        Minutes1 => ("1", 1.0),
        Minutes1Half => ("1.5", 1.5),
        Minutes2 => ("2", 2.0),
        Minutes3 => ("3", 3.0),
        Minutes4 => ("4", 4.0),
        Minutes5 => ("5", 5.0),
        Minutes6 => ("6", 6.0),
        Minutes7 => ("7", 7.0),
        Minutes8 => ("8", 8.0),
        Minutes10 => ("10", 10.0),
        Minutes15 => ("15", 15.0),
        Minutes20 => ("20", 20.0),
        Minutes25 => ("25", 25.0),
        Minutes30 => ("30", 30.0),
        Minutes40 => ("40", 40.0),
        Minutes50 => ("50", 50.0),
        Minutes60 => ("60", 60.0),
    }
}

impl ClockTime {
    pub fn minutes(self) -> f64 {
        self.value()
    }

    pub fn seconds(self) -> u32 {
        (self.value() * 60.0) as u32
    }
}

domain_values! {
    /// Clock increment in seconds
    ClockIncrement ("clock increment") -> u32 {
        Seconds0 => ("0", 0),
        Seconds1 => ("1", 1),
        Seconds2 => ("2", 2),
        Seconds3 => ("3", 3),
        Seconds4 => ("4", 4),
        Seconds5 => ("5", 5),
        Seconds6 => ("6", 6),
        Seconds7 => ("7", 7),
        Seconds10 => ("10", 10),
        Seconds15 => ("15", 15),
        Seconds20 => ("20", 20),
        Seconds25 => ("25", 25),
        Seconds30 => ("30", 30),
        Seconds40 => ("40", 40),
        Seconds50 => ("50", 50),
        Seconds60 => ("60", 60),
    }
}

domain_values! {
    /// Tournament duration in minutes
    TournamentLength ("tournament length") -> u32 {
        Minutes20 => ("20", 20),
        Minutes25 => ("25", 25),
        Minutes30 => ("30", 30),
        Minutes35 => ("35", 35),
        Minutes40 => ("40", 40),
        Minutes45 => ("45", 45),
        Minutes50 => ("50", 50),
        Minutes55 => ("55", 55),
        Minutes60 => ("60", 60),
        Minutes70 => ("70", 70),
        Minutes80 => ("80", 80),
        Minutes90 => ("90", 90),
        Minutes100 => ("100", 100),
        Minutes110 => ("110", 110),
        Minutes120 => ("120", 120),
        Minutes150 => ("150", 150),
        Minutes180 => ("180", 180),
        Minutes210 => ("210", 210),
        Minutes240 => ("240", 240),
        Minutes270 => ("270", 270),
        Minutes300 => ("300", 300),
        Minutes330 => ("330", 330),
        Minutes360 => ("360", 360),
        Minutes420 => ("420", 420),
        Minutes480 => ("480", 480),
        Minutes540 => ("540", 540),
        Minutes600 => ("600", 600),
        Minutes720 => ("720", 720),
    }
}

domain_values! {
    /// Rating gate (minimum or maximum)
    RatingRestriction ("rating restriction") -> u32 {
        Rating1000 => ("1000", 1000),
        Rating1100 => ("1100", 1100),
        Rating1200 => ("1200", 1200),
        Rating1300 => ("1300", 1300),
        Rating1400 => ("1400", 1400),
        Rating1500 => ("1500", 1500),
        Rating1600 => ("1600", 1600),
        Rating1700 => ("1700", 1700),
        Rating1800 => ("1800", 1800),
        Rating1900 => ("1900", 1900),
        Rating2000 => ("2000", 2000),
        Rating2100 => ("2100", 2100),
        Rating2200 => ("2200", 2200),
        Rating2300 => ("2300", 2300),
        Rating2400 => ("2400", 2400),
        Rating2500 => ("2500", 2500),
        Rating2600 => ("2600", 2600),
    }
}

domain_values! {
    /// Minimum number of rated games played
    GamesRestriction ("games restriction") -> u32 {
        Games0 => ("0", 0),
        Games5 => ("5", 5),
        Games10 => ("10", 10),
        Games15 => ("15", 15),
        Games20 => ("20", 20),
        Games30 => ("30", 30),
        Games40 => ("40", 40),
        Games50 => ("50", 50),
        Games75 => ("75", 75),
        Games100 => ("100", 100),
        Games150 => ("150", 150),
        Games200 => ("200", 200),
    }
}

domain_values! {
    /// Chess variant; the projection is the human display name
    Variant ("variant") -> &'static str {
        Standard => ("standard", "Standard"),
        Chess960 => ("chess960", "Chess960"),
        Crazyhouse => ("crazyhouse", "Crazyhouse"),
        Antichess => ("antichess", "Antichess"),
        Atomic => ("atomic", "Atomic"),
        Horde => ("horde", "Horde"),
        KingOfTheHill => ("kingOfTheHill", "King of the Hill"),
        RacingKings => ("racingKings", "Racing Kings"),
        ThreeCheck => ("threeCheck", "Three-check"),
        FromPosition => ("fromPosition", "From Position"),
    }
}

impl Variant {
    pub fn display_name(self) -> &'static str {
        self.value()
    }
}

/// How often a definition repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Cadence {
    Daily,
    Weekly,
    Fortnightly,
    Monthly,
}

impl Cadence {
    pub const ALL: &'static [Cadence] = &[
        Cadence::Daily,
        Cadence::Weekly,
        Cadence::Fortnightly,
        Cadence::Monthly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Cadence::Daily => "daily",
            Cadence::Weekly => "weekly",
            Cadence::Fortnightly => "fortnightly",
            Cadence::Monthly => "monthly",
        }
    }
}

impl FromStr for Cadence {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cadence::ALL
            .iter()
            .copied()
            .find(|cadence| cadence.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ScheduleError::UnsupportedCadence(s.to_string()))
    }
}

impl TryFrom<String> for Cadence {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
