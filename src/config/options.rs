use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Columns written to the result table.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputOption {
    /// OWT, AVW, Area, NDI, Utot
    #[serde(rename(deserialize = "standard"))]
    #[default]
    Standard,
    /// Standard columns plus one membership column per type
    #[serde(rename(deserialize = "extensive"))]
    Extensive,
}

#[derive(Debug)]
pub struct OutputOptionParseError(String);

impl fmt::Display for OutputOptionParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "invalid output option `{}` (expected standard or extensive)",
            self.0
        )
    }
}

impl std::error::Error for OutputOptionParseError {}

impl FromStr for OutputOption {
    type Err = OutputOptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" | "1" => Ok(OutputOption::Standard),
            "extensive" | "2" => Ok(OutputOption::Extensive),
            other => Err(OutputOptionParseError(other.to_string())),
        }
    }
}

impl fmt::Display for OutputOption {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OutputOption::Standard => write!(f, "standard"),
            OutputOption::Extensive => write!(f, "extensive"),
        }
    }
}
