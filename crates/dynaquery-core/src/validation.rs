//! Query request resolution and validation.
//!
//! Raw query-string parameters are normalized (trimmed, blanks dropped, limit
//! clamped, sort direction canonicalized), resolved against a caller-supplied
//! default request, and the result is checked against a declarative table of
//! field constraints. Every violation is reported, each with its field path.

use std::collections::HashMap;
use std::hash::BuildHasher;
use std::num::IntErrorKind;

use dynaquery_model::{FieldViolation, TypeTag};
use tracing::debug;

use crate::config::QueryLimits;
use crate::error::ValidationError;
use crate::request::{QueryRequest, SortDirection, params};

/// A constraint on one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Constraint {
    /// Must be present and non-blank.
    Required,
    /// Must be present whenever the named field is.
    RequiredWith(&'static str),
    /// When present, must be a known type tag.
    TypeTag,
    /// When present, must lie within the configured limit bounds.
    WithinLimits,
}

/// A constraint bound to a field path.
#[derive(Debug, Clone, Copy)]
struct FieldRule {
    path: &'static str,
    constraint: Constraint,
}

const fn rule(path: &'static str, constraint: Constraint) -> FieldRule {
    FieldRule { path, constraint }
}

/// The query request schema, evaluated in order.
const RULES: [FieldRule; 12] = [
    rule(params::PK_VALUE, Constraint::Required),
    rule(params::PK_TYPE, Constraint::Required),
    rule(params::PK_TYPE, Constraint::TypeTag),
    rule(params::PK_PROPERTY, Constraint::Required),
    rule(params::SK_VALUE, Constraint::RequiredWith(params::SK_COMPARATOR)),
    rule(params::SK_PROPERTY, Constraint::RequiredWith(params::SK_COMPARATOR)),
    rule(params::SK_TYPE, Constraint::RequiredWith(params::SK_COMPARATOR)),
    rule(params::SK_PROPERTY, Constraint::RequiredWith(params::SK_VALUE)),
    rule(params::SK_TYPE, Constraint::RequiredWith(params::SK_VALUE)),
    rule(params::SK_TYPE, Constraint::TypeTag),
    rule(params::SK_VALUE2_TYPE, Constraint::TypeTag),
    rule(params::LIMIT, Constraint::WithinLimits),
];

/// Which resolution policy applied to a set of raw parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// No parameters: the default request as-is.
    Default,
    /// Only limit/sorting: applied on top of the default.
    Paging,
    /// Same index as the default, no partition key: default keys with raw
    /// sort-key, pagination and sorting overrides.
    SameIndex,
    /// Everything from the raw parameters.
    Raw,
}

/// Resolves and validates query requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestValidator {
    limits: QueryLimits,
}

impl RequestValidator {
    /// Create a validator enforcing `limits`.
    #[must_use]
    pub fn new(limits: QueryLimits) -> Self {
        Self { limits }
    }

    /// Resolve raw parameters against `default` and validate the result.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] listing every violated field, including
    /// a `limit` that is not an integer.
    pub fn resolve<S: BuildHasher>(
        &self,
        raw: &HashMap<String, String, S>,
        default: &QueryRequest,
    ) -> Result<QueryRequest, ValidationError> {
        let given = normalize(raw);
        let resolution = classify(&given, default);
        debug!(?resolution, params = given.len(), "resolving query request");

        let mut violations = Vec::new();
        let limit = match given.get(params::LIMIT) {
            Some(raw_limit) => match raw_limit.parse::<i64>() {
                Ok(n) => Some(self.limits.clamp(n)),
                // Out-of-range integers saturate like any other bound.
                Err(e) if *e.kind() == IntErrorKind::PosOverflow => {
                    Some(self.limits.clamp(i64::MAX))
                }
                Err(e) if *e.kind() == IntErrorKind::NegOverflow => {
                    Some(self.limits.clamp(i64::MIN))
                }
                Err(_) => {
                    violations.push(FieldViolation::new(params::LIMIT, "must be an integer"));
                    None
                }
            },
            None => None,
        };
        let sorting = given
            .get(params::SORTING)
            .and_then(|s| SortDirection::parse(s));
        let text = |path: &str| given.get(path).cloned();

        let request = match resolution {
            Resolution::Default => default.clone(),
            Resolution::Paging => QueryRequest {
                limit: limit.or(default.limit),
                sorting: sorting.or(default.sorting),
                ..default.clone()
            },
            Resolution::SameIndex => QueryRequest {
                sk_value: text(params::SK_VALUE).or_else(|| default.sk_value.clone()),
                sk_type: text(params::SK_TYPE).or_else(|| default.sk_type.clone()),
                sk_property: text(params::SK_PROPERTY).or_else(|| default.sk_property.clone()),
                sk_value2: text(params::SK_VALUE2).or_else(|| default.sk_value2.clone()),
                sk_value2_type: text(params::SK_VALUE2_TYPE)
                    .or_else(|| default.sk_value2_type.clone()),
                sk_comparator: text(params::SK_COMPARATOR)
                    .or_else(|| default.sk_comparator.clone()),
                limit: limit.or(default.limit),
                last_evaluated_key: text(params::CURSOR)
                    .or_else(|| default.last_evaluated_key.clone()),
                sorting: sorting.or(default.sorting),
                ..default.clone()
            },
            Resolution::Raw => QueryRequest {
                pk_value: text(params::PK_VALUE),
                pk_type: text(params::PK_TYPE),
                pk_property: text(params::PK_PROPERTY),
                sk_value: text(params::SK_VALUE),
                sk_type: text(params::SK_TYPE),
                sk_property: text(params::SK_PROPERTY),
                sk_value2: text(params::SK_VALUE2),
                sk_value2_type: text(params::SK_VALUE2_TYPE),
                sk_comparator: text(params::SK_COMPARATOR),
                index_name: text(params::INDEX_NAME).or_else(|| default.index_name.clone()),
                limit: Some(limit.unwrap_or(self.limits.default_limit)),
                last_evaluated_key: text(params::CURSOR),
                sorting,
            },
        };

        violations.extend(self.violations(&request));
        if violations.is_empty() {
            Ok(request)
        } else {
            Err(ValidationError::new(dedup_by_path(violations)))
        }
    }

    /// Check a request against the schema.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] listing every violated field.
    pub fn validate(&self, request: &QueryRequest) -> Result<(), ValidationError> {
        let violations = self.violations(request);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(dedup_by_path(violations)))
        }
    }

    fn violations(&self, request: &QueryRequest) -> Vec<FieldViolation> {
        RULES
            .iter()
            .filter_map(|r| self.check(request, r))
            .collect()
    }

    fn check(&self, request: &QueryRequest, rule: &FieldRule) -> Option<FieldViolation> {
        let value = lookup(request, rule.path);
        match rule.constraint {
            Constraint::Required => value
                .is_none()
                .then(|| FieldViolation::new(rule.path, "is required")),
            Constraint::RequiredWith(other) => (value.is_none()
                && lookup(request, other).is_some())
            .then(|| FieldViolation::new(rule.path, format!("is required when {other} is set"))),
            Constraint::TypeTag => value.filter(|v| TypeTag::parse(v).is_none()).map(|v| {
                FieldViolation::new(rule.path, format!("'{v}' is not a supported type"))
            }),
            Constraint::WithinLimits => request
                .limit
                .filter(|l| !(1..=self.limits.max_limit).contains(l))
                .map(|l| {
                    FieldViolation::new(
                        rule.path,
                        format!("{l} is outside 1..={}", self.limits.max_limit),
                    )
                }),
        }
    }
}

/// Non-blank text value of a field, by parameter name.
fn lookup<'a>(request: &'a QueryRequest, path: &str) -> Option<&'a str> {
    let value = match path {
        params::PK_VALUE => request.pk_value.as_deref(),
        params::PK_TYPE => request.pk_type.as_deref(),
        params::PK_PROPERTY => request.pk_property.as_deref(),
        params::SK_VALUE => request.sk_value.as_deref(),
        params::SK_TYPE => request.sk_type.as_deref(),
        params::SK_PROPERTY => request.sk_property.as_deref(),
        params::SK_VALUE2 => request.sk_value2.as_deref(),
        params::SK_VALUE2_TYPE => request.sk_value2_type.as_deref(),
        params::SK_COMPARATOR => request.sk_comparator.as_deref(),
        params::INDEX_NAME => request.index_name.as_deref(),
        params::CURSOR => request.last_evaluated_key.as_deref(),
        _ => None,
    };
    value.filter(|v| !v.trim().is_empty())
}

/// Keep recognized, non-blank parameters, trimmed.
fn normalize<S: BuildHasher>(raw: &HashMap<String, String, S>) -> HashMap<&'static str, String> {
    let mut given = HashMap::new();
    for (key, value) in raw {
        let Some(name) = params::ALL.iter().copied().find(|p| *p == key.as_str()) else {
            debug!(%key, "ignoring unrecognized query parameter");
            continue;
        };
        let value = value.trim();
        if !value.is_empty() {
            given.insert(name, value.to_owned());
        }
    }
    given
}

fn classify(given: &HashMap<&'static str, String>, default: &QueryRequest) -> Resolution {
    if given.is_empty() {
        return Resolution::Default;
    }
    if given
        .keys()
        .all(|k| matches!(*k, params::LIMIT | params::SORTING))
    {
        return Resolution::Paging;
    }
    let same_index = given
        .get(params::INDEX_NAME)
        .is_some_and(|index| default.index_name.as_deref() == Some(index.as_str()));
    if same_index && !given.contains_key(params::PK_VALUE) {
        return Resolution::SameIndex;
    }
    Resolution::Raw
}

fn dedup_by_path(violations: Vec<FieldViolation>) -> Vec<FieldViolation> {
    let mut seen = Vec::with_capacity(violations.len());
    let mut unique = Vec::with_capacity(violations.len());
    for v in violations {
        if !seen.contains(&v.path) {
            seen.push(v.path.clone());
            unique.push(v);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_request() -> QueryRequest {
        QueryRequest {
            pk_value: Some("tenant-1".to_owned()),
            pk_type: Some("S".to_owned()),
            pk_property: Some("tenantId".to_owned()),
            index_name: Some("byStatus".to_owned()),
            limit: Some(10),
            ..QueryRequest::default()
        }
    }

    fn raw(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn paths(err: &ValidationError) -> Vec<&str> {
        err.paths().collect()
    }

    #[test]
    fn test_should_return_default_without_parameters() {
        let validator = RequestValidator::default();
        let resolved = validator.resolve(&raw(&[]), &default_request()).unwrap();
        assert_eq!(resolved, default_request());
    }

    #[test]
    fn test_should_treat_blank_parameters_as_absent() {
        let validator = RequestValidator::default();
        let resolved = validator
            .resolve(&raw(&[("pkValue", "   "), ("skValue", "")]), &default_request())
            .unwrap();
        assert_eq!(resolved, default_request());
    }

    #[test]
    fn test_should_merge_paging_onto_default() {
        let validator = RequestValidator::default();
        let resolved = validator
            .resolve(
                &raw(&[("limit", "500"), ("sorting", "descending")]),
                &default_request(),
            )
            .unwrap();
        assert_eq!(resolved.limit, Some(100));
        assert_eq!(resolved.sorting, Some(SortDirection::Desc));
        assert_eq!(resolved.pk_value.as_deref(), Some("tenant-1"));
        assert_eq!(resolved.index_name.as_deref(), Some("byStatus"));
    }

    #[test]
    fn test_should_clamp_limit_below_one() {
        let validator = RequestValidator::default();
        let resolved = validator
            .resolve(&raw(&[("limit", "0")]), &default_request())
            .unwrap();
        assert_eq!(resolved.limit, Some(1));
    }

    #[test]
    fn test_should_inherit_partition_key_for_same_index() {
        let validator = RequestValidator::default();
        let resolved = validator
            .resolve(
                &raw(&[
                    ("indexName", "byStatus"),
                    ("skValue", "OPEN"),
                    ("skType", "S"),
                    ("skProperty", "status"),
                    ("skComparator", "equals"),
                    ("lastEvaluatedKey", r#"{"tenantId":{"S":"tenant-1"}}"#),
                ]),
                &default_request(),
            )
            .unwrap();

        assert_eq!(resolved.pk_value.as_deref(), Some("tenant-1"));
        assert_eq!(resolved.pk_type.as_deref(), Some("S"));
        assert_eq!(resolved.pk_property.as_deref(), Some("tenantId"));
        assert_eq!(resolved.sk_value.as_deref(), Some("OPEN"));
        assert_eq!(resolved.limit, Some(10));
        assert!(resolved.last_evaluated_key.is_some());
    }

    #[test]
    fn test_should_build_from_raw_when_partition_key_given() {
        let validator = RequestValidator::default();
        let resolved = validator
            .resolve(
                &raw(&[
                    ("indexName", "byStatus"),
                    ("pkValue", "tenant-2"),
                    ("pkType", "S"),
                    ("pkProperty", "tenantId"),
                ]),
                &default_request(),
            )
            .unwrap();

        assert_eq!(resolved.pk_value.as_deref(), Some("tenant-2"));
        assert_eq!(resolved.limit, Some(20));
        assert_eq!(resolved.sorting, None);
    }

    #[test]
    fn test_should_fall_back_to_default_index_when_building_from_raw() {
        let validator = RequestValidator::default();
        let resolved = validator
            .resolve(
                &raw(&[("pkValue", "7"), ("pkType", "N"), ("pkProperty", "shard")]),
                &default_request(),
            )
            .unwrap();
        assert_eq!(resolved.index_name.as_deref(), Some("byStatus"));
    }

    #[test]
    fn test_should_not_inherit_keys_for_a_different_index() {
        let validator = RequestValidator::default();
        let err = validator
            .resolve(&raw(&[("indexName", "byDate")]), &default_request())
            .unwrap_err();
        assert_eq!(paths(&err), ["pkValue", "pkType", "pkProperty"]);
    }

    #[test]
    fn test_should_require_sort_key_fields_with_comparator() {
        let validator = RequestValidator::default();
        let request = QueryRequest {
            sk_comparator: Some("begins_with".to_owned()),
            ..default_request()
        };
        let err = validator.validate(&request).unwrap_err();
        assert_eq!(paths(&err), ["skValue", "skProperty", "skType"]);
    }

    #[test]
    fn test_should_report_each_path_once() {
        let validator = RequestValidator::default();
        let request = QueryRequest {
            sk_comparator: Some("lt".to_owned()),
            sk_value: Some("5".to_owned()),
            ..default_request()
        };
        let err = validator.validate(&request).unwrap_err();
        assert_eq!(paths(&err), ["skProperty", "skType"]);
    }

    #[test]
    fn test_should_reject_unknown_type_tags() {
        let validator = RequestValidator::default();
        let request = QueryRequest {
            pk_type: Some("DATE".to_owned()),
            ..default_request()
        };
        let err = validator.validate(&request).unwrap_err();
        assert_eq!(paths(&err), ["pkType"]);
    }

    #[test]
    fn test_should_reject_out_of_range_default_limit() {
        let validator = RequestValidator::default();
        let request = QueryRequest {
            limit: Some(0),
            ..default_request()
        };
        assert_eq!(paths(&validator.validate(&request).unwrap_err()), ["limit"]);
    }

    #[test]
    fn test_should_reject_non_integer_limit() {
        let validator = RequestValidator::default();
        let err = validator
            .resolve(&raw(&[("limit", "ten")]), &default_request())
            .unwrap_err();
        assert_eq!(paths(&err), ["limit"]);
    }

    #[test]
    fn test_should_saturate_overflowing_limit() {
        let validator = RequestValidator::default();
        let huge = validator
            .resolve(&raw(&[("limit", "99999999999999999999")]), &default_request())
            .unwrap();
        assert_eq!(huge.limit, Some(100));

        let tiny = validator
            .resolve(&raw(&[("limit", "-99999999999999999999")]), &default_request())
            .unwrap();
        assert_eq!(tiny.limit, Some(1));
    }

    #[test]
    fn test_should_drop_unrecognized_sort_direction() {
        let validator = RequestValidator::default();
        let resolved = validator
            .resolve(&raw(&[("sorting", "sideways")]), &default_request())
            .unwrap();
        assert_eq!(resolved.sorting, None);
    }

    #[test]
    fn test_should_ignore_unrecognized_parameters() {
        let validator = RequestValidator::default();
        let resolved = validator
            .resolve(&raw(&[("utm_source", "mail")]), &default_request())
            .unwrap();
        assert_eq!(resolved, default_request());
    }
}
