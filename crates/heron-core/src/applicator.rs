//! The header applicator.
//!
//! Applies a [`HeaderSpec`] to a response either before or after the
//! downstream continuation runs.
//!
//! ## Merge Rules
//!
//! For every configured header, in declaration order:
//!
//! 1. If `append_on_conflict` is set and the response already carries the
//!    header, its first value `E` is replaced by `E, v1, v2, ...` as a single
//!    header value.
//! 2. Otherwise each configured value is appended as its own header
//!    instance, after any instances already present.
//!
//! ## Example
//!
//! ```
//! use heron_core::{HeaderApplicator, HeaderError, HeaderSpec, ResponseHeaders};
//! use http::HeaderMap;
//!
//! let spec = HeaderSpec::from_params([
//!     ("setHeadersAfterServlet", "true"),
//!     ("appendValues", "true"),
//!     ("x-header-to-append-or-replace", "set-by-filter"),
//! ]);
//! let applicator = HeaderApplicator::new(spec);
//!
//! let mut headers = HeaderMap::new();
//! applicator
//!     .apply(&mut headers, |headers| {
//!         headers.set_header("x-header-to-append-or-replace", "set-by-servlet")
//!     })
//!     .unwrap();
//!
//! assert_eq!(
//!     headers.header("x-header-to-append-or-replace").as_deref(),
//!     Some("set-by-servlet, set-by-filter"),
//! );
//! ```

use std::sync::Arc;

use crate::error::HeaderError;
use crate::header_spec::HeaderSpec;
use crate::observer::{ApplyEvent, ApplyObserver, Phase, TracingObserver};
use crate::response::ResponseHeaders;

/// Separator used when merging into an existing header.
pub const MERGE_SEPARATOR: &str = ", ";

/// Applies a shared [`HeaderSpec`] to responses.
///
/// Cheap to clone; the spec and observer are reference counted.
#[derive(Clone)]
pub struct HeaderApplicator {
    spec: Arc<HeaderSpec>,
    observer: Arc<dyn ApplyObserver>,
}

impl HeaderApplicator {
    /// Creates an applicator reporting to a [`TracingObserver`].
    pub fn new(spec: impl Into<Arc<HeaderSpec>>) -> Self {
        Self {
            spec: spec.into(),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replaces the diagnostic observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ApplyObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Returns the spec being applied.
    #[must_use]
    pub fn spec(&self) -> &HeaderSpec {
        &self.spec
    }

    /// Runs `downstream` with headers applied around it.
    ///
    /// Headers go on before `downstream` unless the spec asks for
    /// post-downstream application. A `downstream` error is returned as is
    /// and the post phase is skipped.
    pub fn apply<R, F, T, E>(&self, response: &mut R, downstream: F) -> Result<T, E>
    where
        R: ResponseHeaders + ?Sized,
        F: FnOnce(&mut R) -> Result<T, E>,
        E: From<HeaderError>,
    {
        self.before_downstream(response)?;
        let output = downstream(response)?;
        self.after_downstream(response)?;
        Ok(output)
    }

    /// Pre phase: merges now unless the spec defers to after downstream.
    pub fn before_downstream<R>(&self, response: &mut R) -> Result<(), HeaderError>
    where
        R: ResponseHeaders + ?Sized,
    {
        if self.spec.apply_after_downstream() {
            return Ok(());
        }
        self.merge(response, Phase::BeforeDownstream)
    }

    /// Post phase: merges now if the spec defers to after downstream.
    pub fn after_downstream<R>(&self, response: &mut R) -> Result<(), HeaderError>
    where
        R: ResponseHeaders + ?Sized,
    {
        if !self.spec.apply_after_downstream() {
            return Ok(());
        }
        self.merge(response, Phase::AfterDownstream)
    }

    /// Writes every configured header into `response`.
    pub fn merge<R>(&self, response: &mut R, phase: Phase) -> Result<(), HeaderError>
    where
        R: ResponseHeaders + ?Sized,
    {
        self.observer.on_event(&ApplyEvent::PhaseStarted {
            phase,
            headers: self.spec.len(),
        });

        for (name, values) in self.spec.entries() {
            if self.spec.append_on_conflict() && response.has_header(name) {
                // Merged as bytes so obs-text in the existing value survives.
                let existing = response.header_bytes(name).unwrap_or_default();
                let mut merged = existing.clone();
                merged.extend_from_slice(MERGE_SEPARATOR.as_bytes());
                merged.extend_from_slice(values.join(MERGE_SEPARATOR).as_bytes());
                response.set_header_bytes(name, &merged)?;
                self.observer.on_event(&ApplyEvent::HeaderMerged {
                    name: name.to_owned(),
                    existing: String::from_utf8_lossy(&existing).into_owned(),
                    merged: String::from_utf8_lossy(&merged).into_owned(),
                });
                continue;
            }

            for value in values {
                response.add_header(name, value)?;
                self.observer.on_event(&ApplyEvent::HeaderAdded {
                    name: name.to_owned(),
                    value: value.clone(),
                });
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for HeaderApplicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeaderApplicator")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::RecordingObserver;
    use http::HeaderMap;

    fn values(headers: &HeaderMap, name: &str) -> Vec<String> {
        headers
            .get_all(name)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    fn spec(after: bool, append: bool, headers: &[(&str, &str)]) -> HeaderSpec {
        let mut params = vec![
            ("setHeadersAfterServlet", if after { "true" } else { "false" }),
            ("appendValues", if append { "true" } else { "false" }),
        ];
        params.extend_from_slice(headers);
        HeaderSpec::from_params(params)
    }

    #[test]
    fn test_before_downstream_headers_visible_to_downstream() {
        let applicator = HeaderApplicator::new(spec(false, false, &[("x-h", "B")]));
        let mut headers = HeaderMap::new();

        let seen = applicator
            .apply(&mut headers, |headers| Ok::<_, HeaderError>(headers.header("x-h")))
            .unwrap();

        assert_eq!(seen.as_deref(), Some("B"));
    }

    #[test]
    fn test_downstream_can_overwrite_pre_applied_header() {
        let applicator = HeaderApplicator::new(spec(false, false, &[("x-h", "B")]));
        let mut headers = HeaderMap::new();

        applicator
            .apply(&mut headers, |headers| headers.set_header("x-h", "A"))
            .unwrap();

        assert_eq!(values(&headers, "x-h"), ["A"]);
    }

    #[test]
    fn test_after_downstream_adds_separate_instance() {
        let applicator = HeaderApplicator::new(spec(true, false, &[("x-h", "B")]));
        let mut headers = HeaderMap::new();

        applicator
            .apply(&mut headers, |headers| headers.set_header("x-h", "A"))
            .unwrap();

        assert_eq!(values(&headers, "x-h"), ["A", "B"]);
    }

    #[test]
    fn test_after_downstream_appends_into_single_value() {
        let applicator = HeaderApplicator::new(spec(true, true, &[("x-h", "B")]));
        let mut headers = HeaderMap::new();

        applicator
            .apply(&mut headers, |headers| headers.set_header("x-h", "A"))
            .unwrap();

        assert_eq!(values(&headers, "x-h"), ["A, B"]);
    }

    #[test]
    fn test_append_joins_all_configured_values() {
        let applicator = HeaderApplicator::new(spec(false, true, &[("x-h", "B\nC")]));
        let mut headers = HeaderMap::new();
        headers.add_header("x-h", "A").unwrap();
        headers.add_header("x-h", "Z").unwrap();

        applicator.merge(&mut headers, Phase::BeforeDownstream).unwrap();

        assert_eq!(values(&headers, "x-h"), ["A, B, C"]);
    }

    #[test]
    fn test_append_without_existing_header_adds_each_value() {
        let applicator = HeaderApplicator::new(spec(false, true, &[("x-h", "B\nC")]));
        let mut headers = HeaderMap::new();

        applicator.merge(&mut headers, Phase::BeforeDownstream).unwrap();

        assert_eq!(values(&headers, "x-h"), ["B", "C"]);
    }

    #[test]
    fn test_append_matches_existing_case_insensitively() {
        let applicator = HeaderApplicator::new(spec(false, true, &[("X-Trace", "filter")]));
        let mut headers = HeaderMap::new();
        headers.add_header("x-trace", "handler").unwrap();

        applicator.merge(&mut headers, Phase::BeforeDownstream).unwrap();

        assert_eq!(values(&headers, "x-trace"), ["handler, filter"]);
    }

    #[test]
    fn test_append_keeps_non_utf8_existing_value() {
        let applicator = HeaderApplicator::new(spec(false, true, &[("x-h", "B")]));
        let mut headers = HeaderMap::new();
        headers.insert("x-h", http::HeaderValue::from_bytes(b"caf\xe9").unwrap());

        applicator.merge(&mut headers, Phase::BeforeDownstream).unwrap();

        let merged: Vec<_> = headers.get_all("x-h").iter().collect();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].as_bytes(), b"caf\xe9, B");
    }

    #[test]
    fn test_downstream_error_skips_post_phase() {
        let applicator = HeaderApplicator::new(spec(true, false, &[("x-h", "B")]));
        let mut headers = HeaderMap::new();

        let result: Result<(), HeaderError> =
            applicator.apply(&mut headers, |_| Err(HeaderError::committed("x-other")));

        assert_eq!(result, Err(HeaderError::committed("x-other")));
        assert!(!headers.has_header("x-h"));
    }

    #[test]
    fn test_header_error_propagates() {
        let applicator = HeaderApplicator::new(spec(false, false, &[("bad name", "v")]));
        let mut headers = HeaderMap::new();

        let result: Result<(), HeaderError> = applicator.apply(&mut headers, |_| Ok(()));

        assert_eq!(result, Err(HeaderError::invalid_name("bad name")));
    }

    #[test]
    fn test_headers_applied_in_declaration_order() {
        let applicator = HeaderApplicator::new(spec(false, false, &[("x-c", "1"), ("x-a", "2")]));
        let observer = Arc::new(RecordingObserver::new());
        let applicator = applicator.with_observer(observer.clone());
        let mut headers = HeaderMap::new();

        applicator.merge(&mut headers, Phase::BeforeDownstream).unwrap();

        let names: Vec<String> = observer
            .events()
            .into_iter()
            .filter_map(|event| match event {
                ApplyEvent::HeaderAdded { name, .. } => Some(name),
                _ => None,
            })
            .collect();
        assert_eq!(names, ["x-c", "x-a"]);
    }

    #[test]
    fn test_observer_sees_merge() {
        let observer = Arc::new(RecordingObserver::new());
        let applicator = HeaderApplicator::new(spec(true, true, &[("x-h", "B")]))
            .with_observer(observer.clone());
        let mut headers = HeaderMap::new();

        applicator
            .apply(&mut headers, |headers| headers.set_header("x-h", "A"))
            .unwrap();

        assert_eq!(
            observer.events(),
            vec![
                ApplyEvent::PhaseStarted {
                    phase: Phase::AfterDownstream,
                    headers: 1,
                },
                ApplyEvent::HeaderMerged {
                    name: "x-h".to_string(),
                    existing: "A".to_string(),
                    merged: "A, B".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_only_one_phase_runs() {
        let observer = Arc::new(RecordingObserver::new());
        let applicator = HeaderApplicator::new(spec(false, false, &[("x-h", "B")]))
            .with_observer(observer.clone());
        let mut headers = HeaderMap::new();

        applicator.apply(&mut headers, |_| Ok::<_, HeaderError>(())).unwrap();

        let phases = observer
            .events()
            .into_iter()
            .filter(|event| matches!(event, ApplyEvent::PhaseStarted { .. }))
            .count();
        assert_eq!(phases, 1);
        assert_eq!(values(&headers, "x-h"), ["B"]);
    }
}
