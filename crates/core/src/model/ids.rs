use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error type for parsing an ID from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the underlying i64 value
            #[must_use]
            pub const fn value(&self) -> i64 {
                self.0
            }

            /// Server ids are strictly positive.
            #[must_use]
            pub const fn is_valid(&self) -> bool {
                self.0 > 0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<i64>()
                    .map(Self::new)
                    .map_err(|_| ParseIdError {
                        kind: stringify!($name),
                    })
            }
        }
    };
}

define_id!(
    /// Identifier of a dictionary language.
    LanguageId
);
define_id!(
    /// Identifier of a vocabulary topic.
    TopicId
);
define_id!(
    /// Identifier of a proficiency level.
    LevelId
);
define_id!(
    /// Identifier of a game session (one play-through).
    SessionId
);
define_id!(QuestionId);
define_id!(OptionId);
define_id!(AnswerId);
define_id!(UserId);
define_id!(
    /// Identifier of a dictionary word.
    WordId
);
define_id!(SenseId);

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_debug() {
        let id = SessionId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(format!("{id:?}"), "SessionId(42)");
    }

    #[test]
    fn from_str_trims_input() {
        let id: QuestionId = " 5 ".parse().unwrap();
        assert_eq!(id, QuestionId::new(5));
    }

    #[test]
    fn from_str_invalid_names_the_kind() {
        let err = "abc".parse::<LanguageId>().unwrap_err();
        assert_eq!(err.to_string(), "failed to parse LanguageId from string");
    }

    #[test]
    fn serde_is_transparent() {
        let json = serde_json::to_string(&OptionId::new(10)).unwrap();
        assert_eq!(json, "10");
        let back: OptionId = serde_json::from_str("10").unwrap();
        assert_eq!(back, OptionId::new(10));
    }

    #[test]
    fn validity_requires_positive_value() {
        assert!(LevelId::new(3).is_valid());
        assert!(!LevelId::new(0).is_valid());
        assert!(!LevelId::new(-1).is_valid());
    }
}
