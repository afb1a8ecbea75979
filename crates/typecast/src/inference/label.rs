//! Human-readable labels for reconciled types.

use crate::schema::{FinalSchema, ReadableSchema, TypeTag};

/// Label shown for an unrecognized type name.
pub const FALLBACK_LABEL: &str = "Object";

/// Coarse label for a type tag.
pub fn readable_label(tag: TypeTag) -> &'static str {
    match tag {
        TypeTag::Text => "Text",
        TypeTag::DateTime => "Date",
        TypeTag::Integer | TypeTag::Float => "Number",
        TypeTag::Categorical => "Category",
        TypeTag::Duration => "Time Difference",
        TypeTag::Boolean => "Boolean",
        TypeTag::Complex => "Complex Number",
    }
}

/// Label for a type given by name; unknown names map to `"Object"`.
///
/// Tag names (`date_time`, `Integer`, ...) are matched first. Storage
/// dtype names such as `int64`, `datetime64[ns]` or `object` are then
/// matched by substring.
pub fn label_for_name(name: &str) -> &'static str {
    if let Ok(tag) = name.parse::<TypeTag>() {
        return readable_label(tag);
    }

    let name = name.to_lowercase();
    const DTYPE_LABELS: [(&[&str], &str); 7] = [
        (&["object"], "Text"),
        (&["datetime"], "Date"),
        (&["float", "int"], "Number"),
        (&["category"], "Category"),
        (&["timedelta"], "Time Difference"),
        (&["bool"], "Boolean"),
        (&["complex"], "Complex Number"),
    ];
    DTYPE_LABELS
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| name.contains(n)))
        .map_or(FALLBACK_LABEL, |(_, label)| *label)
}

/// Label every column of a reconciled schema, keeping column order.
pub fn readable_schema(schema: &FinalSchema) -> ReadableSchema {
    schema
        .iter()
        .map(|(name, tag)| (name.to_string(), readable_label(tag).to_string()))
        .collect()
}
