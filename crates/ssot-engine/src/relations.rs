//! Regex relations: `"<regex> = <value>"` routing rules.
//!
//! Sources use relations to attach objects to records the upstream does not
//! know about, e.g. `"^nyc-.* = NYC"` places every host whose name starts
//! with `nyc-` in site `NYC`.

use regex::Regex;

use crate::error::ConfigError;

/// Ordered list of `regex → value` rules. The first matching rule wins.
#[derive(Debug, Clone, Default)]
pub struct Relations {
    rules: Vec<(Regex, String)>,
}

impl Relations {
    /// Parse relation lines of the form `<regex> = <value>`.
    ///
    /// The split happens on the last `=` so regexes may contain `=`.
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Result<Self, ConfigError> {
        let mut rules = Vec::with_capacity(lines.len());
        for line in lines {
            let line = line.as_ref();
            let Some((pattern, value)) = line.rsplit_once('=') else {
                return Err(ConfigError::Relation {
                    line: line.to_string(),
                    message: "expected `<regex> = <value>`".to_string(),
                });
            };
            let (pattern, value) = (pattern.trim(), value.trim());
            if pattern.is_empty() || value.is_empty() {
                return Err(ConfigError::Relation {
                    line: line.to_string(),
                    message: "regex and value must both be non-empty".to_string(),
                });
            }
            let regex = Regex::new(pattern).map_err(|e| ConfigError::Relation {
                line: line.to_string(),
                message: e.to_string(),
            })?;
            rules.push((regex, value.to_string()));
        }
        Ok(Self { rules })
    }

    /// Value of the first rule whose regex matches `input`.
    #[must_use]
    pub fn matching(&self, input: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|(regex, _)| regex.is_match(input))
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_wins() {
        let relations = Relations::parse(&["^nyc-.* = NYC", "^ny.* = Other", ".* = Default"]).unwrap();
        assert_eq!(relations.len(), 3);
        assert_eq!(relations.matching("nyc-web01"), Some("NYC"));
        assert_eq!(relations.matching("nyx"), Some("Other"));
        assert_eq!(relations.matching("ams-db"), Some("Default"));
    }

    #[test]
    fn test_no_match() {
        let relations = Relations::parse(&["^nyc-.* = NYC"]).unwrap();
        assert_eq!(relations.matching("ams-db"), None);
        assert_eq!(Relations::default().matching("anything"), None);
    }

    #[test]
    fn test_value_with_spaces_is_trimmed() {
        let relations = Relations::parse(&["^vlan1[0-9]$   =   Office LAN  "]).unwrap();
        assert_eq!(relations.matching("vlan12"), Some("Office LAN"));
    }

    #[test]
    fn test_regex_may_contain_equals() {
        let relations = Relations::parse(&["^a=b$ = eq"]).unwrap();
        assert_eq!(relations.matching("a=b"), Some("eq"));
    }

    #[test]
    fn test_missing_separator_is_rejected() {
        let err = Relations::parse(&["^nyc-.*"]).unwrap_err();
        assert!(matches!(err, ConfigError::Relation { .. }));
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        let err = Relations::parse(&["^nyc-(.* = NYC"]).unwrap_err();
        assert!(err.to_string().contains("^nyc-(.* = NYC"));
    }

    #[test]
    fn test_empty_value_is_rejected() {
        assert!(Relations::parse(&["^nyc = "]).is_err());
    }
}
