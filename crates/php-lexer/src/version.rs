use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// PHP language level used to toggle version-dependent grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum PhpVersion {
    #[serde(rename = "5.6")]
    Php56,
    #[serde(rename = "7.0")]
    Php70,
    #[serde(rename = "7.1")]
    Php71,
    #[serde(rename = "7.2")]
    Php72,
    #[serde(rename = "7.3")]
    Php73,
    #[serde(rename = "7.4")]
    Php74,
    #[serde(rename = "8.0")]
    Php80,
    #[serde(rename = "8.1")]
    Php81,
    #[serde(rename = "8.2")]
    Php82,
    #[serde(rename = "8.3")]
    Php83,
    #[default]
    #[serde(rename = "8.4")]
    Php84,
}

impl PhpVersion {
    pub const LATEST: PhpVersion = PhpVersion::Php84;

    pub const ALL: [PhpVersion; 11] = [
        PhpVersion::Php56,
        PhpVersion::Php70,
        PhpVersion::Php71,
        PhpVersion::Php72,
        PhpVersion::Php73,
        PhpVersion::Php74,
        PhpVersion::Php80,
        PhpVersion::Php81,
        PhpVersion::Php82,
        PhpVersion::Php83,
        PhpVersion::Php84,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PhpVersion::Php56 => "5.6",
            PhpVersion::Php70 => "7.0",
            PhpVersion::Php71 => "7.1",
            PhpVersion::Php72 => "7.2",
            PhpVersion::Php73 => "7.3",
            PhpVersion::Php74 => "7.4",
            PhpVersion::Php80 => "8.0",
            PhpVersion::Php81 => "8.1",
            PhpVersion::Php82 => "8.2",
            PhpVersion::Php83 => "8.3",
            PhpVersion::Php84 => "8.4",
        }
    }

    /// `fn ($x) => ...`
    pub fn has_arrow_functions(self) -> bool {
        self >= PhpVersion::Php74
    }

    /// `#[...]`; before 8.0 a `#` always starts a comment.
    pub fn has_attributes(self) -> bool {
        self >= PhpVersion::Php80
    }

    pub fn has_match(self) -> bool {
        self >= PhpVersion::Php80
    }

    pub fn has_enums(self) -> bool {
        self >= PhpVersion::Php81
    }

    pub fn has_property_hooks(self) -> bool {
        self >= PhpVersion::Php84
    }
}

impl fmt::Display for PhpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown PHP version `{0}`")]
pub struct UnknownVersion(pub String);

impl FromStr for PhpVersion {
    type Err = UnknownVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed
            .strip_prefix("php")
            .or_else(|| trimmed.strip_prefix("PHP"))
            .unwrap_or(trimmed);
        PhpVersion::ALL
            .into_iter()
            .find(|v| v.as_str() == trimmed)
            .ok_or_else(|| UnknownVersion(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        assert_eq!("8.1".parse::<PhpVersion>(), Ok(PhpVersion::Php81));
        assert_eq!("php7.4".parse::<PhpVersion>(), Ok(PhpVersion::Php74));
        assert!("9.0".parse::<PhpVersion>().is_err());
    }

    #[test]
    fn test_feature_gates() {
        assert!(!PhpVersion::Php73.has_arrow_functions());
        assert!(PhpVersion::Php74.has_arrow_functions());
        assert!(!PhpVersion::Php74.has_match());
        assert!(PhpVersion::Php80.has_attributes());
        assert!(!PhpVersion::Php80.has_enums());
        assert!(PhpVersion::default().has_property_hooks());
    }

    #[test]
    fn test_serde_uses_dotted_names() {
        let json = serde_json::to_string(&PhpVersion::Php82).unwrap();
        assert_eq!(json, "\"8.2\"");
        let back: PhpVersion = serde_json::from_str("\"5.6\"").unwrap();
        assert_eq!(back, PhpVersion::Php56);
    }
}
