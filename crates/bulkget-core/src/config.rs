//! Run configuration and size parsing
//!
//! A run is shaped by three knobs: how many workers fetch concurrently,
//! the global bandwidth ceiling they share, and where destination files
//! land. Sizes on the command line accept the usual decimal and binary
//! suffixes.

use crate::error::ConfigError;
use std::path::PathBuf;

/// Default number of concurrent workers
pub const DEFAULT_WORKERS: usize = 2;

/// Default bandwidth ceiling in bytes per second (10 KiB/s)
pub const DEFAULT_RATE_LIMIT: u64 = 10 * 1024;

/// Configuration for one fetch run
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of concurrent workers
    pub workers: usize,
    /// Bandwidth ceiling in bytes per second, shared by all workers
    pub rate_limit: u64,
    /// Directory destination files are written into
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            rate_limit: DEFAULT_RATE_LIMIT,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Check the configuration before any work starts.
    ///
    /// Writability of the output directory is not checked here; a write
    /// failure surfaces as a per-task error instead.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.rate_limit == 0 {
            return Err(ConfigError::ZeroRateLimit);
        }
        if !self.output_dir.is_dir() {
            return Err(ConfigError::OutputDir(self.output_dir.clone()));
        }
        Ok(())
    }
}

/// Parse a byte size with an optional unit suffix.
///
/// Plain digits are bytes. `KB` and `MB` are decimal multiples (1000 and
/// 1000000); `KiB` and `MiB` are binary multiples (1024 and 1048576).
/// Exactly one suffix is accepted and case matters, so `10XB` or `10kb`
/// are rejected rather than silently treated as bytes.
pub fn parse_size(input: &str) -> Result<u64, ConfigError> {
    let input = input.trim();
    let digits_end = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (digits, suffix) = input.split_at(digits_end);

    let multiplier: u64 = match suffix {
        "" => 1,
        "KB" => 1000,
        "KiB" => 1024,
        "MB" => 1_000_000,
        "MiB" => 1_048_576,
        _ => return Err(ConfigError::InvalidSize(input.to_string())),
    };

    let value: u64 = digits
        .parse()
        .map_err(|_| ConfigError::InvalidSize(input.to_string()))?;

    value
        .checked_mul(multiplier)
        .ok_or_else(|| ConfigError::InvalidSize(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_bytes() {
        assert_eq!(parse_size("0").unwrap(), 0);
        assert_eq!(parse_size("10240").unwrap(), 10240);
    }

    #[test]
    fn parses_suffixes() {
        assert_eq!(parse_size("10KB").unwrap(), 10_000);
        assert_eq!(parse_size("10KiB").unwrap(), 10_240);
        assert_eq!(parse_size("3MB").unwrap(), 3_000_000);
        assert_eq!(parse_size("2MiB").unwrap(), 2_097_152);
    }

    #[test]
    fn rejects_unknown_suffixes() {
        assert!(parse_size("10XB").is_err());
        assert!(parse_size("10kb").is_err());
        assert!(parse_size("10KiBKiB").is_err());
        assert!(parse_size("10 KiB").is_err());
    }

    #[test]
    fn rejects_missing_digits() {
        assert!(parse_size("").is_err());
        assert!(parse_size("KiB").is_err());
        assert!(parse_size("-5").is_err());
    }

    #[test]
    fn rejects_overflow() {
        assert!(parse_size("99999999999999999999").is_err());
        assert!(parse_size("18446744073709551615KiB").is_err());
    }

    #[test]
    fn validate_accepts_defaults_in_a_real_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            output_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let good = Config {
            output_dir: dir.path().to_path_buf(),
            ..Config::default()
        };

        let zero_workers = Config {
            workers: 0,
            ..good.clone()
        };
        assert!(matches!(
            zero_workers.validate(),
            Err(ConfigError::ZeroWorkers)
        ));

        let zero_limit = Config {
            rate_limit: 0,
            ..good.clone()
        };
        assert!(matches!(
            zero_limit.validate(),
            Err(ConfigError::ZeroRateLimit)
        ));

        let missing_dir = Config {
            output_dir: dir.path().join("nope"),
            ..good
        };
        assert!(matches!(
            missing_dir.validate(),
            Err(ConfigError::OutputDir(_))
        ));
    }
}
