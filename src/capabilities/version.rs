use std::fmt;

/// Numeric view of a version string, for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppVersion {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
}

impl AppVersion {
    /// Parse `major.minor.build`; missing, negative or non-numeric parts read as 0
    ///
    /// A pre-release suffix such as `-dev` is ignored.
    pub fn parse(version: &str) -> Self {
        let core = version.split(['-', '+']).next().unwrap_or_default();
        let mut parts = core.split('.').map(|p| p.trim().parse::<u32>().unwrap_or(0));
        Self {
            major: parts.next().unwrap_or(0),
            minor: parts.next().unwrap_or(0),
            build: parts.next().unwrap_or(0),
        }
    }
}

impl fmt::Display for AppVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_version() {
        let version = AppVersion::parse("1.4.12");
        assert_eq!(version, AppVersion { major: 1, minor: 4, build: 12 });
        assert_eq!(version.to_string(), "1.4.12");
    }

    #[test]
    fn test_parse_tolerates_garbage() {
        assert_eq!(AppVersion::parse("0.0.0-dev"), AppVersion::default());
        assert_eq!(AppVersion::parse("2.x"), AppVersion { major: 2, minor: 0, build: 0 });
        assert_eq!(AppVersion::parse("3.1"), AppVersion { major: 3, minor: 1, build: 0 });
        assert_eq!(AppVersion::parse(""), AppVersion::default());
    }
}
