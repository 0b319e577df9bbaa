//! Host settings for a chip, loadable from RON.

use std::{error::Error, fmt::Display};

use nanoserde::{DeRon, SerRon};

use crate::NATIVE_RATE;

pub const MIN_OUTPUT_RATE: u32 = 1000;
pub const MAX_OUTPUT_RATE: u32 = 384_000;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The RON text couldn't be parsed
    Parse(String),
    /// Output rate outside `MIN_OUTPUT_RATE..=MAX_OUTPUT_RATE`
    OutputRate(u32),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Parse(e) => write!(f, "Invalid OPL config: {}", e),
            ConfigError::OutputRate(rate) => write!(
                f,
                "Output rate {} Hz is outside {}..={} Hz",
                rate, MIN_OUTPUT_RATE, MAX_OUTPUT_RATE
            ),
        }
    }
}

impl Error for ConfigError {}

pub(crate) fn validate_output_rate(rate: u32) -> Result<(), ConfigError> {
    if (MIN_OUTPUT_RATE..=MAX_OUTPUT_RATE).contains(&rate) {
        Ok(())
    } else {
        Err(ConfigError::OutputRate(rate))
    }
}

#[derive(Debug, Clone, PartialEq, DeRon, SerRon)]
pub struct OplConfig {
    /// Continuous per-channel panning instead of the left/right enable bits
    pub full_pan: bool,
    /// Rate used by `Chip::generate_resampled`
    pub output_rate: u32,
}

impl Default for OplConfig {
    fn default() -> Self {
        OplConfig {
            full_pan: false,
            output_rate: NATIVE_RATE,
        }
    }
}

impl OplConfig {
    /// Parses and validates a RON config
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config =
            OplConfig::deserialize_ron(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron(&self) -> String {
        self.serialize_ron()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_output_rate(self.output_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Chip;

    #[test]
    fn test_default_is_native() {
        let config = OplConfig::default();
        assert!(!config.full_pan);
        assert_eq!(config.output_rate, NATIVE_RATE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ron_round_trip() {
        let config = OplConfig {
            full_pan: true,
            output_rate: 44100,
        };
        let text = config.to_ron();
        assert_eq!(OplConfig::from_ron(&text), Ok(config));
    }

    #[test]
    fn test_parse_ron() {
        let config = OplConfig::from_ron("(full_pan: true, output_rate: 48000)");
        assert_eq!(
            config,
            Ok(OplConfig {
                full_pan: true,
                output_rate: 48000
            })
        );
    }

    #[test]
    fn test_parse_error() {
        let err = OplConfig::from_ron("(full_pan: maybe)");
        assert!(matches!(err, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_rate_limits() {
        for rate in [0, 999, 384_001] {
            let err = OplConfig::from_ron(&format!("(full_pan: false, output_rate: {})", rate));
            assert_eq!(err, Err(ConfigError::OutputRate(rate)));
        }
        assert!(validate_output_rate(MIN_OUTPUT_RATE).is_ok());
        assert!(validate_output_rate(MAX_OUTPUT_RATE).is_ok());
    }

    #[test]
    fn test_error_display() {
        let text = ConfigError::OutputRate(0).to_string();
        assert!(text.contains("0 Hz"));
    }

    #[test]
    fn test_chip_from_config() {
        let chip = Chip::with_config(&OplConfig {
            full_pan: true,
            output_rate: 22050,
        });
        let chip = chip.expect("valid config");
        assert!(chip.full_pan());
        assert_eq!(chip.output_rate(), 22050);

        let err = Chip::with_config(&OplConfig {
            full_pan: false,
            output_rate: 0,
        });
        assert!(err.is_err());
    }
}
