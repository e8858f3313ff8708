use std::fmt;
use std::str::FromStr;

use super::MessageError;

/// HTTP protocol version carried by a message.
///
/// `2.0` and `2` are distinct spellings and round-trip as given.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ProtocolVersion {
    V1_0,
    #[default]
    V1_1,
    V2_0,
    V2,
}

impl ProtocolVersion {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V1_0 => "1.0",
            Self::V1_1 => "1.1",
            Self::V2_0 => "2.0",
            Self::V2 => "2",
        }
    }
}

impl FromStr for ProtocolVersion {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.0" => Ok(Self::V1_0),
            "1.1" => Ok(Self::V1_1),
            "2.0" => Ok(Self::V2_0),
            "2" => Ok(Self::V2),
            other => Err(MessageError::unsupported_version(other)),
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_versions_round_trip() {
        for version in ["1.0", "1.1", "2.0", "2"] {
            assert_eq!(version.parse::<ProtocolVersion>().unwrap().as_str(), version);
        }
    }

    #[test]
    fn unknown_versions_are_rejected() {
        assert_eq!(
            "1.2".parse::<ProtocolVersion>(),
            Err(MessageError::unsupported_version("1.2"))
        );
        assert_eq!(
            "HTTP/1.1".parse::<ProtocolVersion>(),
            Err(MessageError::unsupported_version("HTTP/1.1"))
        );
    }

    #[test]
    fn default_is_1_1() {
        assert_eq!(ProtocolVersion::default(), ProtocolVersion::V1_1);
    }
}
