// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Configuration for pipe evaluation

use dotpipe_common::{PipeError, PipeResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which random number generator a pipe uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RngMode {
    /// The process-wide shared generator
    #[default]
    Shared,
    /// A fresh entropy-seeded pseudo-random generator
    Pseudo,
    /// The operating system generator
    Crypto,
    /// A deterministic generator with the given seed
    Seeded(u64),
}

impl FromStr for RngMode {
    type Err = PipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shared" => Ok(RngMode::Shared),
            "pseudo" => Ok(RngMode::Pseudo),
            "crypto" => Ok(RngMode::Crypto),
            other => other
                .strip_prefix("seeded:")
                .and_then(|seed| seed.trim().parse::<u64>().ok())
                .map(RngMode::Seeded)
                .ok_or_else(|| {
                    PipeError::argument(
                        "set_rng",
                        format!("expected 'shared', 'pseudo', 'crypto' or 'seeded:<n>'; got '{other}'"),
                    )
                }),
        }
    }
}

impl TryFrom<String> for RngMode {
    type Error = PipeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RngMode> for String {
    fn from(mode: RngMode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for RngMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RngMode::Shared => write!(f, "shared"),
            RngMode::Pseudo => write!(f, "pseudo"),
            RngMode::Crypto => write!(f, "crypto"),
            RngMode::Seeded(seed) => write!(f, "seeded:{seed}"),
        }
    }
}

/// Configuration applied to a pipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipeConfig {
    /// Random number generator selection
    pub rng: RngMode,

    /// Maximum number of items a materializing stage may collect (None for
    /// unlimited)
    pub max_materialize: Option<usize>,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            rng: RngMode::Shared,
            max_materialize: None,
        }
    }
}

impl PipeConfig {
    /// Create a reproducible configuration with a seeded generator
    pub fn deterministic(seed: u64) -> Self {
        Self {
            rng: RngMode::Seeded(seed),
            ..Default::default()
        }
    }

    /// Create a configuration that refuses to materialize more than `limit`
    /// items
    pub fn bounded(limit: usize) -> Self {
        Self {
            max_materialize: Some(limit),
            ..Default::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> PipeResult<()> {
        if let Some(0) = self.max_materialize {
            return Err(PipeError::argument(
                "config",
                "max_materialize must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_mode_parsing() {
        assert_eq!("shared".parse::<RngMode>().unwrap(), RngMode::Shared);
        assert_eq!("crypto".parse::<RngMode>().unwrap(), RngMode::Crypto);
        assert_eq!("seeded:42".parse::<RngMode>().unwrap(), RngMode::Seeded(42));
        assert!("seeded:x".parse::<RngMode>().is_err());
        assert!("mersenne".parse::<RngMode>().is_err());
    }

    #[test]
    fn test_rng_mode_display_round_trips() {
        for mode in [RngMode::Shared, RngMode::Pseudo, RngMode::Crypto, RngMode::Seeded(9)] {
            assert_eq!(mode.to_string().parse::<RngMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(PipeConfig::default().validate().is_ok());
        assert!(PipeConfig::bounded(10).validate().is_ok());
        assert!(PipeConfig::bounded(0).validate().is_err());
        assert_eq!(PipeConfig::deterministic(3).rng, RngMode::Seeded(3));
    }
}
