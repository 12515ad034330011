//! Channel identifier

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a remote channel (e.g. `UC_x5XG1OV2P6uZZ5FSM9Ttw`)
///
/// Opaque: equality is exact string match, no normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ChannelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_exact() {
        assert_eq!(ChannelId::new("UCabc"), ChannelId::from("UCabc"));
        assert_ne!(ChannelId::new("UCabc"), ChannelId::new("ucabc"));
        assert_ne!(ChannelId::new("UCabc"), ChannelId::new("UCabc "));
    }

    #[test]
    fn test_display() {
        assert_eq!(ChannelId::new("UCabc").to_string(), "UCabc");
    }
}
