use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::IndexSpecError;

/// Sort direction of a single index key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    /// Returns the numeric form used in index key documents (`1` or `-1`).
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }
}

impl TryFrom<i64> for Direction {
    type Error = IndexSpecError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Ascending),
            -1 => Ok(Self::Descending),
            other => Err(IndexSpecError::InvalidDirection(other)),
        }
    }
}

impl From<Direction> for i32 {
    fn from(direction: Direction) -> Self {
        direction.as_i32()
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i32())
    }
}

impl Serialize for Direction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.as_i32())
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = i64::deserialize(deserializer)?;
        Self::try_from(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_from_integer() {
        assert_eq!(Direction::try_from(1), Ok(Direction::Ascending));
        assert_eq!(Direction::try_from(-1), Ok(Direction::Descending));
        assert_eq!(
            Direction::try_from(0),
            Err(IndexSpecError::InvalidDirection(0))
        );
        assert_eq!(
            Direction::try_from(2),
            Err(IndexSpecError::InvalidDirection(2))
        );
    }

    #[test]
    fn test_direction_serde() {
        assert_eq!(serde_json::to_string(&Direction::Descending).unwrap(), "-1");
        let parsed: Direction = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, Direction::Ascending);
        assert!(serde_json::from_str::<Direction>("5").is_err());
    }
}
