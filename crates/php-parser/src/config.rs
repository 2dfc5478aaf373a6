use php_lexer::PhpVersion;
use serde::{Deserialize, Serialize};

/// Default ceiling on statement and expression recursion.
pub const DEFAULT_MAX_NESTING_DEPTH: u32 = 128;

/// Files above this size are not parsed at all.
pub const DEFAULT_MAX_FILE_SIZE: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub version: PhpVersion,
    pub max_nesting_depth: u32,
    pub max_file_size: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            version: PhpVersion::default(),
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl ParserConfig {
    pub fn for_version(version: PhpVersion) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: ParserConfig = serde_json::from_str(r#"{"version": "7.4"}"#).unwrap();
        assert_eq!(config.version, PhpVersion::Php74);
        assert_eq!(config.max_nesting_depth, DEFAULT_MAX_NESTING_DEPTH);
        assert_eq!(config.max_file_size, DEFAULT_MAX_FILE_SIZE);
    }
}
