//! Type inference over sample values.
//!
//! Variants are tried in fixed priority {Scalar, Date, DateTime,
//! NumericVector, Text}: restrictive numeric/date variants before
//! permissive catch-alls. The first variant whose `can_describe` accepts
//! every sample wins; otherwise the column is `Unspecified`.

use reltab_core::config::{DEFAULT_DATETIME_FORMAT, DEFAULT_DATE_FORMAT};
use reltab_core::value::Value;

use crate::descriptor::FieldDescriptor;

/// Infer with the default date/datetime formats.
pub fn infer_descriptor(values: &[Value]) -> FieldDescriptor {
    infer_descriptor_with_formats(values, DEFAULT_DATE_FORMAT, DEFAULT_DATETIME_FORMAT)
}

/// Infer with explicit formats (typically from `EngineConfig`).
pub fn infer_descriptor_with_formats(
    values: &[Value],
    date_format: &str,
    datetime_format: &str,
) -> FieldDescriptor {
    if values.is_empty() {
        return FieldDescriptor::Unspecified;
    }
    let candidates = [
        FieldDescriptor::Scalar,
        FieldDescriptor::date(date_format),
        FieldDescriptor::datetime(datetime_format),
        FieldDescriptor::NumericVector,
        FieldDescriptor::Text,
    ];
    for candidate in candidates {
        if candidate.can_describe(values) {
            return candidate;
        }
    }
    FieldDescriptor::Unspecified
}
