//! The header specification (config store).
//!
//! A [`HeaderSpec`] is built once at startup from a flat parameter mapping
//! and never mutated afterwards. It is shared by every request through an
//! `Arc`, so reads need no locking.
//!
//! # Parameter Format
//!
//! | Key                      | Meaning                                  |
//! |--------------------------|------------------------------------------|
//! | `setHeadersAfterServlet` | apply headers after the downstream chain |
//! | `appendValues`           | merge into an existing header            |
//! | anything else            | header name; value split on `\n`         |
//!
//! # Example
//!
//! ```
//! use heron_core::HeaderSpec;
//!
//! let spec = HeaderSpec::from_params([
//!     ("appendValues", "true"),
//!     ("x-header-1", "value1\nvalue2"),
//!     ("x-header-3", ""),
//! ]);
//!
//! assert!(spec.append_on_conflict());
//! assert!(!spec.apply_after_downstream());
//! assert_eq!(spec.values("x-header-1"), Some(&["value1".to_string(), "value2".to_string()][..]));
//! assert_eq!(spec.values("x-header-3"), None);
//! ```

use indexmap::IndexMap;

/// Control parameter selecting post-downstream application.
pub const APPLY_AFTER_DOWNSTREAM_PARAM: &str = "setHeadersAfterServlet";

/// Control parameter selecting merge-on-conflict.
pub const APPEND_ON_CONFLICT_PARAM: &str = "appendValues";

/// Delimiter separating multiple values in a single parameter.
pub const VALUE_DELIMITER: char = '\n';

/// Immutable description of the headers to apply and how.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderSpec {
    /// Header name to ordered values, in declaration order.
    entries: IndexMap<String, Vec<String>>,

    /// Apply after the downstream chain instead of before it.
    apply_after_downstream: bool,

    /// Merge into an existing header instead of adding instances.
    append_on_conflict: bool,
}

impl HeaderSpec {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> HeaderSpecBuilder {
        HeaderSpecBuilder::default()
    }

    /// Builds a spec from a name/value parameter mapping.
    ///
    /// Never fails: unrecognised flag text reads as `false` and blank
    /// header values are dropped.
    pub fn from_params<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self::from_nullable_params(params.into_iter().map(|(name, value)| (name, Some(value))))
    }

    /// Builds a spec from a mapping whose values may be absent.
    pub fn from_nullable_params<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut spec = Self::default();

        for (name, value) in params {
            let name = name.as_ref();
            let value: Option<&str> = value.as_ref().map(|v| v.as_ref());

            match name {
                APPLY_AFTER_DOWNSTREAM_PARAM => spec.apply_after_downstream = parse_flag(value),
                APPEND_ON_CONFLICT_PARAM => spec.append_on_conflict = parse_flag(value),
                _ => {
                    let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
                        continue;
                    };
                    spec.entries.insert(name.to_owned(), split_values(value));
                }
            }
        }

        spec
    }

    /// Returns `true` if headers are applied after the downstream chain.
    #[must_use]
    pub fn apply_after_downstream(&self) -> bool {
        self.apply_after_downstream
    }

    /// Returns `true` if values merge into an existing header.
    #[must_use]
    pub fn append_on_conflict(&self) -> bool {
        self.append_on_conflict
    }

    /// Returns the configured values for `name`, matched exactly.
    #[must_use]
    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// Iterates over `(name, values)` in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Returns the header names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the number of configured headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no headers are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder for [`HeaderSpec`].
///
/// # Example
///
/// ```
/// use heron_core::HeaderSpec;
///
/// let spec = HeaderSpec::builder()
///     .header("x-frame-options", ["DENY"])
///     .header("x-empty", Vec::<String>::new())
///     .apply_after_downstream(true)
///     .build();
///
/// assert_eq!(spec.len(), 1);
/// assert!(spec.apply_after_downstream());
/// ```
#[derive(Debug, Clone, Default)]
pub struct HeaderSpecBuilder {
    spec: HeaderSpec,
}

impl HeaderSpecBuilder {
    /// Adds a header with its values. An empty value list is ignored.
    #[must_use]
    pub fn header<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if !values.is_empty() {
            self.spec.entries.insert(name.into(), values);
        }
        self
    }

    /// Sets whether headers are applied after the downstream chain.
    #[must_use]
    pub fn apply_after_downstream(mut self, enabled: bool) -> Self {
        self.spec.apply_after_downstream = enabled;
        self
    }

    /// Sets whether values merge into an existing header.
    #[must_use]
    pub fn append_on_conflict(mut self, enabled: bool) -> Self {
        self.spec.append_on_conflict = enabled;
        self
    }

    /// Builds the spec.
    #[must_use]
    pub fn build(self) -> HeaderSpec {
        self.spec
    }
}

/// Reads a flag permissively: only a case-insensitive `true` is `true`.
pub fn parse_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

// Values are kept verbatim; only trailing empty segments are dropped.
fn split_values(value: &str) -> Vec<String> {
    let mut values: Vec<String> = value.split(VALUE_DELIMITER).map(str::to_owned).collect();
    while values.last().is_some_and(String::is_empty) {
        values.pop();
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn test_from_params_splits_and_drops_blank() {
        let spec = HeaderSpec::from_params([
            ("x-header-1", "value1\nvalue2"),
            ("x-header-2", "value3"),
            ("x-header-3", ""),
            ("x-header-4", "value4\nvalue5"),
            ("x-header-5", "extra-value"),
        ]);

        assert_eq!(spec.len(), 4);
        assert_eq!(spec.values("x-header-1").unwrap(), strings(&["value1", "value2"]));
        assert_eq!(spec.values("x-header-2").unwrap(), strings(&["value3"]));
        assert_eq!(spec.values("x-header-3"), None);
        assert_eq!(spec.values("x-header-4").unwrap(), strings(&["value4", "value5"]));
        assert_eq!(spec.values("x-header-5").unwrap(), strings(&["extra-value"]));
        assert!(!spec.apply_after_downstream());
        assert!(!spec.append_on_conflict());
    }

    #[test]
    fn test_whitespace_only_value_is_dropped() {
        let spec = HeaderSpec::from_params([("x-blank", "  \t \n ")]);
        assert!(spec.is_empty());
    }

    #[test]
    fn test_null_value_is_dropped() {
        let spec = HeaderSpec::from_nullable_params([("x-null", None::<&str>), ("x-set", Some("v"))]);
        assert_eq!(spec.names().collect::<Vec<_>>(), ["x-set"]);
    }

    #[test]
    fn test_control_params_are_not_headers() {
        let spec = HeaderSpec::from_params([
            (APPLY_AFTER_DOWNSTREAM_PARAM, "true"),
            (APPEND_ON_CONFLICT_PARAM, "TRUE"),
            ("x-h", "v"),
        ]);

        assert!(spec.apply_after_downstream());
        assert!(spec.append_on_conflict());
        assert_eq!(spec.names().collect::<Vec<_>>(), ["x-h"]);
    }

    #[test]
    fn test_flags_are_permissive() {
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some("True")));
        assert!(!parse_flag(Some("yes")));
        assert!(!parse_flag(Some("1")));
        assert!(!parse_flag(Some(" true")));
        assert!(!parse_flag(Some("")));
        assert!(!parse_flag(None));
    }

    #[test]
    fn test_null_flag_reads_false() {
        let spec = HeaderSpec::from_nullable_params([(APPEND_ON_CONFLICT_PARAM, None::<String>)]);
        assert!(!spec.append_on_conflict());
    }

    #[test]
    fn test_values_are_not_trimmed() {
        let spec = HeaderSpec::from_params([("x-h", " a \n b")]);
        assert_eq!(spec.values("x-h").unwrap(), strings(&[" a ", " b"]));
    }

    #[test]
    fn test_trailing_empty_segments_dropped() {
        let spec = HeaderSpec::from_params([("x-h", "a\n\nb\n\n")]);
        assert_eq!(spec.values("x-h").unwrap(), strings(&["a", "", "b"]));
    }

    #[test]
    fn test_duplicates_are_kept() {
        let spec = HeaderSpec::from_params([("x-h", "a\na")]);
        assert_eq!(spec.values("x-h").unwrap(), strings(&["a", "a"]));
    }

    #[test]
    fn test_declaration_order_preserved() {
        let spec = HeaderSpec::from_params([("x-c", "1"), ("x-a", "2"), ("x-b", "3")]);
        assert_eq!(spec.names().collect::<Vec<_>>(), ["x-c", "x-a", "x-b"]);
    }

    #[test]
    fn test_builder_matches_params() {
        let built = HeaderSpec::builder()
            .header("x-header-1", ["value1", "value2"])
            .append_on_conflict(true)
            .build();
        let parsed =
            HeaderSpec::from_params([("x-header-1", "value1\nvalue2"), ("appendValues", "true")]);
        assert_eq!(built, parsed);
    }

    mod properties {
        use super::super::*;
        use proptest::prelude::*;

        fn param() -> impl Strategy<Value = (String, String)> {
            ("x-[a-z]{1,8}", "[ a-z\n]{0,16}")
        }

        proptest! {
            #[test]
            fn parsing_is_idempotent(params in prop::collection::vec(param(), 0..8)) {
                let first = HeaderSpec::from_params(params.clone());
                let second = HeaderSpec::from_params(params);
                prop_assert_eq!(first, second);
            }

            #[test]
            fn stored_values_never_blank(params in prop::collection::vec(param(), 0..8)) {
                let spec = HeaderSpec::from_params(params);
                for (_, values) in spec.entries() {
                    prop_assert!(!values.is_empty());
                    prop_assert!(values.iter().any(|v| !v.trim().is_empty()));
                }
            }

            #[test]
            fn joined_values_round_trip(value in "[a-z]{1,4}(\n[a-z]{1,4}){0,4}") {
                let spec = HeaderSpec::from_params([("x-h", value.as_str())]);
                prop_assert_eq!(spec.values("x-h").unwrap().join("\n"), value);
            }
        }
    }
}
