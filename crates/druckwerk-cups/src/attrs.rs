// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Typed projection of IPP attribute values into domain scalars.
//
// CUPS responses are heterogeneous tag/value soups: the same attribute can
// carry several values of differing tags, and optional attributes are
// routinely absent. Decoding therefore degrades gracefully — callers request
// an explicit scalar type plus an expected tag (or a wildcard) and get back
// either the first matching value or an error that aggregates every
// per-candidate mismatch for a precise diagnostic.

use ipp::prelude::*;
use thiserror::Error;

/// Custom per-job attribute carrying the long-running operation id that
/// correlates a backend job with the operation tracking it.
pub const ATTR_OPERATION_ID: &str = "long-running-operation-id";

/// CUPS keyword attribute selecting auto/color/grayscale output.
pub const ATTR_PRINT_COLOR_MODE: &str = "print-color-mode";

pub const ATTR_ORIENTATION_REQUESTED: &str = "orientation-requested";
pub const ATTR_REQUESTED_ATTRIBUTES: &str = "requested-attributes";
pub const ATTR_WHICH_JOBS: &str = "which-jobs";

pub const ATTR_PRINTER_NAME: &str = "printer-name";
pub const ATTR_PRINTER_URI_SUPPORTED: &str = "printer-uri-supported";
pub const ATTR_PRINTER_STATE: &str = "printer-state";
pub const ATTR_PRINTER_STATE_REASONS: &str = "printer-state-reasons";
pub const ATTR_PRINTER_STATE_MESSAGE: &str = "printer-state-message";
pub const ATTR_PRINTER_LOCATION: &str = "printer-location";
pub const ATTR_PRINTER_INFO: &str = "printer-info";
pub const ATTR_PRINTER_MAKE_AND_MODEL: &str = "printer-make-and-model";

pub const ATTR_JOB_ID: &str = "job-id";
pub const ATTR_JOB_NAME: &str = "job-name";
pub const ATTR_DOCUMENT_NAME: &str = "document-name";
pub const ATTR_JOB_STATE: &str = "job-state";
pub const ATTR_JOB_PRINTER_URI: &str = "job-printer-uri";
pub const ATTR_PRINTER_URI: &str = "printer-uri";
pub const ATTR_JOB_MEDIA_PROGRESS: &str = "job-media-progress";

/// Protocol tag class of an attribute value.
///
/// Mirrors the IPP value tags (RFC 8010 §3.5.2) at the granularity the
/// decoders need; everything exotic collapses into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrTag {
    Integer,
    Boolean,
    Enum,
    OctetString,
    Keyword,
    Uri,
    Name,
    Text,
    MimeMediaType,
    Charset,
    NaturalLanguage,
    Other,
}

/// Tag class of a concrete IPP value.
pub fn tag_of(value: &IppValue) -> AttrTag {
    match value {
        IppValue::Integer(_) => AttrTag::Integer,
        IppValue::Boolean(_) => AttrTag::Boolean,
        IppValue::Enum(_) => AttrTag::Enum,
        IppValue::OctetString(_) => AttrTag::OctetString,
        IppValue::Keyword(_) => AttrTag::Keyword,
        IppValue::Uri(_) => AttrTag::Uri,
        IppValue::NameWithoutLanguage(_) => AttrTag::Name,
        IppValue::TextWithoutLanguage(_) => AttrTag::Text,
        IppValue::MimeMediaType(_) => AttrTag::MimeMediaType,
        IppValue::Charset(_) => AttrTag::Charset,
        IppValue::NaturalLanguage(_) => AttrTag::NaturalLanguage,
        _ => AttrTag::Other,
    }
}

/// A scalar that can be projected out of an [`IppValue`].
///
/// Callers name the expected type explicitly at each decode site; there is
/// no runtime type registry.
pub trait ProjectedValue: Sized {
    /// Human-readable type name used in mismatch diagnostics.
    const TYPE_NAME: &'static str;

    fn project(value: &IppValue) -> Option<Self>;
}

impl ProjectedValue for i32 {
    const TYPE_NAME: &'static str = "integer";

    fn project(value: &IppValue) -> Option<Self> {
        match value {
            IppValue::Integer(v) | IppValue::Enum(v) => Some(*v),
            _ => None,
        }
    }
}

impl ProjectedValue for String {
    const TYPE_NAME: &'static str = "string";

    fn project(value: &IppValue) -> Option<Self> {
        match value {
            IppValue::Keyword(v)
            | IppValue::Uri(v)
            | IppValue::NameWithoutLanguage(v)
            | IppValue::TextWithoutLanguage(v)
            | IppValue::MimeMediaType(v)
            | IppValue::OctetString(v)
            | IppValue::Charset(v)
            | IppValue::NaturalLanguage(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl ProjectedValue for bool {
    const TYPE_NAME: &'static str = "boolean";

    fn project(value: &IppValue) -> Option<Self> {
        match value {
            IppValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

/// No value matched the requested type and tag.
///
/// Carries every per-candidate type mismatch encountered along the way so
/// call sites can log one precise diagnostic without aborting the whole
/// decode.
#[derive(Debug, Error)]
pub struct ProjectionError {
    mismatches: Vec<String>,
}

impl ProjectionError {
    fn no_values() -> Self {
        Self {
            mismatches: vec!["no attribute values available".into()],
        }
    }
}

impl std::fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mismatches.join("; "))
    }
}

/// Return the first value of `attr` whose tag matches `tag` (any tag when
/// `None`) and whose runtime shape projects into `T`.
///
/// Multi-valued attributes are flattened in declaration order. Candidates
/// with a non-matching tag are skipped silently; candidates with a matching
/// tag but the wrong shape are recorded as mismatches in the returned error.
pub fn first_value<T: ProjectedValue>(
    attr: Option<&IppAttribute>,
    tag: Option<AttrTag>,
) -> Result<T, ProjectionError> {
    let Some(attr) = attr else {
        return Err(ProjectionError::no_values());
    };

    let candidates: Vec<&IppValue> = match attr.value() {
        IppValue::Array(values) => values.iter().collect(),
        single => vec![single],
    };

    if candidates.is_empty() {
        return Err(ProjectionError::no_values());
    }

    let mut mismatches = Vec::new();
    for value in candidates {
        let actual = tag_of(value);
        if let Some(expected) = tag {
            if actual != expected {
                continue;
            }
        }

        match T::project(value) {
            Some(projected) => return Ok(projected),
            None => {
                let expected_tag =
                    tag.map_or_else(|| "any".to_string(), |t| format!("{t:?}"));
                mismatches.push(format!(
                    "{}: expected {} for tag {expected_tag} but got {actual:?}",
                    attr.name(),
                    T::TYPE_NAME,
                ));
            }
        }
    }

    mismatches.push("failed to find value".into());
    Err(ProjectionError { mismatches })
}

/// Build the correlation attribute injected into every submitted job.
pub fn operation_id_attribute(operation_id: &str) -> IppAttribute {
    IppAttribute::new(
        ATTR_OPERATION_ID,
        IppValue::OctetString(operation_id.to_string()),
    )
}

pub fn keyword_attribute(name: &str, keyword: &str) -> IppAttribute {
    IppAttribute::new(name, IppValue::Keyword(keyword.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(name: &str, value: IppValue) -> IppAttribute {
        IppAttribute::new(name, value)
    }

    #[test]
    fn missing_attribute_fails_with_no_values() {
        let err = first_value::<String>(None, None).expect_err("should fail");
        assert!(err.to_string().contains("no attribute values available"));
    }

    #[test]
    fn wildcard_returns_first_type_match() {
        let a = attr(
            "job-media-progress",
            IppValue::Array(vec![
                IppValue::Keyword("ignored".into()),
                IppValue::Integer(42),
            ]),
        );

        // A string projection matching any tag picks the keyword; an integer
        // projection skips past it.
        let s: String = first_value(Some(&a), None).expect("string");
        assert_eq!(s, "ignored");
        let n: i32 = first_value(Some(&a), None).expect("integer");
        assert_eq!(n, 42);
    }

    #[test]
    fn tag_filter_skips_non_matching_tags() {
        let a = attr(
            "printer-state-reasons",
            IppValue::Array(vec![
                IppValue::TextWithoutLanguage("text first".into()),
                IppValue::Keyword("none".into()),
            ]),
        );

        let reason: String =
            first_value(Some(&a), Some(AttrTag::Keyword)).expect("keyword value");
        assert_eq!(reason, "none");
    }

    #[test]
    fn type_mismatch_is_aggregated_in_error() {
        let a = attr(
            "job-state",
            IppValue::Array(vec![IppValue::Enum(5), IppValue::Enum(9)]),
        );

        let err = first_value::<bool>(Some(&a), Some(AttrTag::Enum)).expect_err("no bool");
        let message = err.to_string();
        assert!(message.contains("expected boolean for tag Enum"));
        assert!(!message.contains("Some("));
        assert!(message.contains("failed to find value"));
        // Both candidates had a matching tag, so both mismatches are listed.
        assert_eq!(message.matches("expected boolean").count(), 2);
    }

    #[test]
    fn wildcard_mismatch_reports_any_tag() {
        let a = attr("job-name", IppValue::NameWithoutLanguage("x".into()));

        let err = first_value::<bool>(Some(&a), None).expect_err("no bool");
        assert!(err.to_string().contains("expected boolean for tag any"));
    }

    #[test]
    fn enum_projects_as_integer() {
        let a = attr("printer-state", IppValue::Enum(4));
        let code: i32 = first_value(Some(&a), Some(AttrTag::Enum)).expect("enum");
        assert_eq!(code, 4);
    }

    #[test]
    fn octet_string_projects_as_string() {
        let a = attr(ATTR_OPERATION_ID, IppValue::OctetString("op-77".into()));
        let id: String = first_value(Some(&a), Some(AttrTag::OctetString)).expect("octet");
        assert_eq!(id, "op-77");
    }
}
