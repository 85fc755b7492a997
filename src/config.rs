//! Router configuration.
//!
//! This module provides the serde-backed `Config` and re-exports the shared
//! key-space types from the `zroute-types` crate for convenience.

use serde::de::Error;

pub use zroute_types::host::HostId;
pub use zroute_types::rect::KeyRect;
pub use zroute_types::space::SpaceConfig;

/// Routing configuration
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Number of key dimensions
    #[serde(default = "Config::default_dims")]
    pub dims: usize,

    /// Bits kept per dimension, sign bit included
    #[serde(default = "Config::default_bits_per_dim")]
    pub bits_per_dim: u32,

    /// Merge complete sibling boxes of a range cover before resolving hosts
    #[serde(default = "Config::default_coalesce_ranges")]
    pub coalesce_ranges: bool,
}

impl Config {
    const fn default_dims() -> usize {
        2
    }

    const fn default_bits_per_dim() -> u32 {
        32
    }

    const fn default_coalesce_ranges() -> bool {
        true
    }

    pub fn space(&self) -> SpaceConfig {
        SpaceConfig::new(self.dims, self.bits_per_dim)
    }

    pub fn with_dims(mut self, dims: usize) -> Self {
        assert!(dims > 0, "Dimension count must be greater than zero");
        self.dims = dims;
        self
    }

    pub fn with_bits_per_dim(mut self, bits_per_dim: u32) -> Self {
        assert!(
            (1..=zroute_types::space::MAX_BITS_PER_DIM).contains(&bits_per_dim),
            "Bits per dimension must be in [1, 64]"
        );
        self.bits_per_dim = bits_per_dim;
        self
    }

    pub fn with_coalesce_ranges(mut self, coalesce: bool) -> Self {
        self.coalesce_ranges = coalesce;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        self.space().validate()?;

        if self.space().width() > 1024 {
            log::warn!(
                "Address width of {} bits is very large; every range query walks it twice",
                self.space().width()
            );
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dims: Self::default_dims(),
            bits_per_dim: Self::default_bits_per_dim(),
            coalesce_ranges: Self::default_coalesce_ranges(),
        }
    }
}

impl From<SpaceConfig> for Config {
    fn from(space: SpaceConfig) -> Self {
        Self {
            dims: space.dims,
            bits_per_dim: space.bits_per_dim,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.dims, 2);
        assert_eq!(config.bits_per_dim, 32);
        assert!(config.coalesce_ranges);
        assert_eq!(config.space().width(), 64);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default().with_dims(3).with_bits_per_dim(21);
        let json = config.to_json().unwrap();
        let back = Config::from_json(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_config_partial_json_uses_defaults() {
        let config = Config::from_json(r#"{ "dims": 4 }"#).unwrap();
        assert_eq!(config.dims, 4);
        assert_eq!(config.bits_per_dim, 32);
    }

    #[test]
    fn test_config_validation() {
        assert!(Config::from_json(r#"{ "dims": 0 }"#).is_err());
        assert!(Config::from_json(r#"{ "bits_per_dim": 65 }"#).is_err());
        assert!(Config::from_json(r#"{ "unknown": true }"#).is_err());
        assert!(Config::from_json(r#"{ "dims": 129 }"#).is_err());
        assert!(Config::from_json(r#"{ "dims": 128 }"#).is_ok());
    }

    #[test]
    #[should_panic(expected = "Dimension count must be greater than zero")]
    fn test_with_dims_rejects_zero() {
        let _ = Config::default().with_dims(0);
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_config_toml() {
        let config = Config::from_toml("dims = 3\nbits_per_dim = 8\n").unwrap();
        assert_eq!(config.space(), SpaceConfig::new(3, 8));
        let rendered = config.to_toml().unwrap();
        assert_eq!(Config::from_toml(&rendered).unwrap(), config);
    }
}
