//! Units of digital information used for report output.

use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;

/// Unit in which report sizes are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    /// Plain bytes.
    Byte,
    /// Kibibytes (1024 bytes).
    KiB,
    /// Mebibytes (1024² bytes).
    MiB,
    /// Gibibytes (1024³ bytes).
    #[default]
    GiB,
}

impl Unit {
    /// All supported units, smallest first.
    pub const ALL: [Unit; 4] = [Unit::Byte, Unit::KiB, Unit::MiB, Unit::GiB];

    /// Number of bytes in one unit.
    pub fn bytes(self) -> f64 {
        match self {
            Unit::Byte => 1.0,
            Unit::KiB => 1024.0,
            Unit::MiB => 1024.0 * 1024.0,
            Unit::GiB => 1024.0 * 1024.0 * 1024.0,
        }
    }

    /// Converts a byte count into this unit.
    pub fn convert(self, bytes: f64) -> f64 {
        bytes / self.bytes()
    }

    /// Short symbol accepted on the command line.
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Byte => "b",
            Unit::KiB => "K",
            Unit::MiB => "M",
            Unit::GiB => "G",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "b" | "B" | "byte" | "bytes" => Ok(Unit::Byte),
            "K" | "KiB" => Ok(Unit::KiB),
            "M" | "MiB" => Ok(Unit::MiB),
            "G" | "GiB" => Ok(Unit::GiB),
            other => Err(AppError::Configuration(format!(
                "unknown unit '{}', expected one of b, K, M, G",
                other
            ))),
        }
    }
}
