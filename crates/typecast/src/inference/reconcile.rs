//! Merging per-chunk decisions into one schema.

use std::collections::HashSet;

use crate::error::{Result, TypecastError};
use crate::schema::{ChunkSchema, FinalSchema, TypeTag};

/// Position of a tag in the widening order.
///
/// Categorical is handled separately and never reaches this.
fn rank(tag: TypeTag) -> u8 {
    match tag {
        TypeTag::Boolean => 0,
        TypeTag::Integer => 1,
        TypeTag::Float => 2,
        TypeTag::Complex => 3,
        TypeTag::DateTime => 4,
        TypeTag::Duration => 5,
        TypeTag::Text | TypeTag::Categorical => 6,
    }
}

/// Combine two chunk tags for the same column.
///
/// Categorical wins over everything. Otherwise the wider tag in
/// `Boolean < Integer < Float < Complex < DateTime < Duration < Text` is
/// kept, so Text absorbs any disagreement.
pub fn widen(a: TypeTag, b: TypeTag) -> TypeTag {
    if a == TypeTag::Categorical || b == TypeTag::Categorical {
        return TypeTag::Categorical;
    }
    if rank(b) > rank(a) { b } else { a }
}

/// Reduce chunk schemas to a single tag per column.
///
/// Every chunk must cover the same set of columns. Column order follows
/// the first chunk.
pub fn reconcile(chunks: &[ChunkSchema]) -> Result<FinalSchema> {
    let Some((first, rest)) = chunks.split_first() else {
        return Err(TypecastError::SchemaMismatch(
            "no chunk schemas to reconcile".to_string(),
        ));
    };

    let expected: HashSet<&str> = first.column_names().collect();
    for chunk in rest {
        let names: HashSet<&str> = chunk.column_names().collect();
        if names != expected {
            return Err(TypecastError::SchemaMismatch(format!(
                "chunk {} covers columns {:?}, chunk {} covers {:?}",
                first.index(),
                sorted(&expected),
                chunk.index(),
                sorted(&names)
            )));
        }
    }

    Ok(first
        .decisions()
        .map(|(name, decision)| {
            let tag = rest
                .iter()
                .filter_map(|chunk| chunk.get(name))
                .fold(decision.tag(), |acc, d| widen(acc, d.tag()));
            (name.to_string(), tag)
        })
        .collect())
}

fn sorted<'a>(names: &HashSet<&'a str>) -> Vec<&'a str> {
    let mut names: Vec<&str> = names.iter().copied().collect();
    names.sort_unstable();
    names
}
