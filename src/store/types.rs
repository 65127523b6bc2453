use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The electrical role of a stage. Closed set: the calculator matches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageType {
    Source,
    Ldo,
    Dcdc,
    Load,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown stage type '{0}' (expected SOURCE, LDO, DCDC or LOAD)")]
pub struct UnknownStageType(pub String);

impl StageType {
    pub const ALL: [StageType; 4] = [StageType::Source, StageType::Ldo, StageType::Dcdc, StageType::Load];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageType::Source => "SOURCE",
            StageType::Ldo => "LDO",
            StageType::Dcdc => "DCDC",
            StageType::Load => "LOAD",
        }
    }

    /// Fill colour used by diagram front-ends for freshly created stages.
    pub fn default_color(&self) -> &'static str {
        match self {
            StageType::Source => "#cfefff",
            StageType::Ldo => "#d4f7d4",
            StageType::Dcdc => "#fff2c2",
            StageType::Load => "#e8e8e8",
        }
    }
}

impl fmt::Display for StageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageType {
    type Err = UnknownStageType;

    /// Case-insensitive. `INPUT` is the legacy spelling of `SOURCE` found in older project files.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SOURCE" | "INPUT" => Ok(StageType::Source),
            "LDO" => Ok(StageType::Ldo),
            "DCDC" => Ok(StageType::Dcdc),
            "LOAD" => Ok(StageType::Load),
            _ => Err(UnknownStageType(s.to_string())),
        }
    }
}

impl Serialize for StageType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StageType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// 2-D layout position of a node. Stored as `[x, y]` in documents.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self { Self { x, y } }
}

impl From<[f64; 2]> for Position {
    fn from([x, y]: [f64; 2]) -> Self { Self { x, y } }
}

impl From<Position> for [f64; 2] {
    fn from(p: Position) -> Self { [p.x, p.y] }
}
