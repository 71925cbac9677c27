use serde::{Deserialize, Serialize};

/// Cumulative record of what happened across all resolutions of one
/// resolver. Flags only ever go from `false` to `true`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverTelemetry {
    /// Some remote fetch delivered a body
    pub fetched_any: bool,
    /// The latest fallback delivered a body
    pub fetched_latest: bool,
    /// Some request was served from the persistent cache
    pub cached: bool,
    /// Some request carried a concrete build number
    pub has_build: bool,
    /// Some remote fetch failed
    pub failed_any: bool,
    /// The latest fallback failed
    pub failed_totally: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_field_names() {
        let json = serde_json::to_value(ResolverTelemetry::default()).unwrap();
        assert_eq!(json["fetched_any"], false);
        assert_eq!(json["failed_totally"], false);
    }
}
