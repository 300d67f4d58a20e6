use std::{fs, path::Path, path::PathBuf};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::GpioError;
use crate::layout::DEFAULT_SYSFS_ROOT;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Edge {
    None,
    Rising,
    Falling,
    Both,
}

impl Default for Edge {
    fn default() -> Self {
        Edge::None
    }
}

impl Edge {
    pub fn token(self) -> &'static str {
        match self {
            Edge::None => "none",
            Edge::Rising => "rising",
            Edge::Falling => "falling",
            Edge::Both => "both",
        }
    }
}

impl TryFrom<u8> for Edge {
    type Error = GpioError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Edge::None),
            1 => Ok(Edge::Rising),
            2 => Ok(Edge::Falling),
            3 => Ok(Edge::Both),
            _ => Err(GpioError::InvalidArgument(format!("invalid edge {code}"))),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LogicLevel {
    #[default]
    ActiveHigh,
    ActiveLow,
}

impl LogicLevel {
    /// Contents of the `active_low` attribute.
    pub fn token(self) -> &'static str {
        match self {
            LogicLevel::ActiveHigh => "0",
            LogicLevel::ActiveLow => "1",
        }
    }
}

impl TryFrom<u8> for LogicLevel {
    type Error = GpioError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(LogicLevel::ActiveHigh),
            1 => Ok(LogicLevel::ActiveLow),
            _ => Err(GpioError::InvalidArgument(format!(
                "invalid logic level {code}"
            ))),
        }
    }
}

/// Logical pin value. The value file always holds the literal byte `'0'` or `'1'`.
#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "u8", into = "u8")]
pub enum Value {
    #[default]
    Inactive,
    Active,
}

impl Value {
    pub fn as_byte(self) -> u8 {
        match self {
            Value::Inactive => b'0',
            Value::Active => b'1',
        }
    }

    pub fn is_active(self) -> bool {
        self == Value::Active
    }
}

impl TryFrom<u8> for Value {
    type Error = GpioError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Value::Inactive),
            1 => Ok(Value::Active),
            _ => Err(GpioError::InvalidArgument(format!(
                "invalid value {raw}, must be 0 or 1"
            ))),
        }
    }
}

impl From<Value> for u8 {
    fn from(value: Value) -> Self {
        match value {
            Value::Inactive => 0,
            Value::Active => 1,
        }
    }
}

impl From<bool> for Value {
    fn from(active: bool) -> Self {
        if active { Value::Active } else { Value::Inactive }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct PinConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub direction: Direction,
    #[serde(default)]
    pub initial_value: Value,
    #[serde(default)]
    pub edge: Edge,
    #[serde(default)]
    pub logic_level: LogicLevel,
}

impl PinConfig {
    pub fn output(initial_value: Value) -> Self {
        Self {
            name: None,
            direction: Direction::Output,
            initial_value,
            edge: Edge::None,
            logic_level: LogicLevel::ActiveHigh,
        }
    }

    pub fn input(edge: Edge) -> Self {
        Self {
            name: None,
            direction: Direction::Input,
            initial_value: Value::Inactive,
            edge,
            logic_level: LogicLevel::ActiveHigh,
        }
    }
}

fn default_sysfs_root() -> PathBuf {
    PathBuf::from(DEFAULT_SYSFS_ROOT)
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GpioConfig {
    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: PathBuf,
    #[serde(default)]
    pub pins: FxHashMap<u32, PinConfig>,
}

impl GpioConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, GpioError> {
        let contents = fs::read_to_string(&path)
            .map_err(|e| GpioError::Config(format!("Failed to read config: {e}")))?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, GpioError> {
        serde_json::from_str(contents)
            .map_err(|e| GpioError::Config(format!("Invalid config json: {e}")))
    }
}
