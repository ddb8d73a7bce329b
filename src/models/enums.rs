use std::fmt;

use serde::{Deserialize, Serialize};

use crate::db::DatabaseError;
use crate::models::validation::ValidationError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Sex {
    Female => "F",
    Male => "M",
});

impl Sex {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Female => "Female",
            Self::Male => "Male",
        }
    }
}

// ═══════════════════════════════════════════
// Follow-up kinds
// ═══════════════════════════════════════════

/// The four fixed post-initial-visit check-ins of the register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FollowUpKind {
    #[serde(rename = "2weeks")]
    TwoWeeks,
    #[serde(rename = "1month")]
    OneMonth,
    #[serde(rename = "3months")]
    ThreeMonths,
    #[serde(rename = "6months")]
    SixMonths,
}

impl FollowUpKind {
    pub const ALL: [FollowUpKind; 4] = [
        Self::TwoWeeks,
        Self::OneMonth,
        Self::ThreeMonths,
        Self::SixMonths,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TwoWeeks => "2weeks",
            Self::OneMonth => "1month",
            Self::ThreeMonths => "3months",
            Self::SixMonths => "6months",
        }
    }

    /// Storage column suffix, e.g. `actual_return_2w`.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::TwoWeeks => "2w",
            Self::OneMonth => "1m",
            Self::ThreeMonths => "3m",
            Self::SixMonths => "6m",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::TwoWeeks => "2 Weeks",
            Self::OneMonth => "1 Month",
            Self::ThreeMonths => "3 Months",
            Self::SixMonths => "6 Months",
        }
    }

    /// Nominal days after the initial visit at which the check-in is due.
    pub fn due_after_days(&self) -> u64 {
        match self {
            Self::TwoWeeks => 14,
            Self::OneMonth => 30,
            Self::ThreeMonths => 91,
            Self::SixMonths => 182,
        }
    }
}

impl fmt::Display for FollowUpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FollowUpKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "2weeks" | "2w" => Ok(Self::TwoWeeks),
            "1month" | "1m" => Ok(Self::OneMonth),
            "3months" | "3m" => Ok(Self::ThreeMonths),
            "6months" | "6m" => Ok(Self::SixMonths),
            _ => Err(ValidationError::UnknownFollowUpKind(s.to_string())),
        }
    }
}
