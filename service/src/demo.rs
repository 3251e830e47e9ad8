//! Demo records seeded into an empty store.

use catalog_core::record::{EntityKind, Record};

/// Two example records for `kind`, with ids `"1"` and `"2"`.
#[must_use]
pub fn demo_records(kind: EntityKind) -> Vec<Record> {
    let noun = match kind {
        EntityKind::Movie => "movie",
        EntityKind::TvShow => "TV show",
    };
    vec![
        Record::new(
            "1",
            format!("Example {noun} 1"),
            format!("This is the first example {noun}."),
        ),
        Record::new(
            "2",
            format!("Example {noun} 2"),
            format!("This is the second example {noun}."),
        ),
    ]
}
