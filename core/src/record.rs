//! Catalog records and entity kinds.
//!
//! Movies and TV shows are structurally identical. The [`EntityKind`] tag is
//! what tells them apart, and it drives every per-kind naming decision: wire
//! prefixes of command events, topics, consumer groups, default ports and the
//! wording of the not-found sentinel.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The entity types served by the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Feature films.
    Movie,
    /// Television series.
    #[serde(rename = "tvshow")]
    TvShow,
}

impl EntityKind {
    /// Every kind, in a stable order.
    pub const ALL: [Self; 2] = [Self::Movie, Self::TvShow];

    /// Prefix used for command event types on the wire (`MOVIE_CREATED`).
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Movie => "MOVIE",
            Self::TvShow => "TVSHOW",
        }
    }

    /// Default bus topic carrying this kind's command events.
    #[must_use]
    pub const fn topic(self) -> &'static str {
        match self {
            Self::Movie => "movies_topic",
            Self::TvShow => "tvshows_topic",
        }
    }

    /// Default consumer group of this kind's catalog service.
    #[must_use]
    pub const fn consumer_group(self) -> &'static str {
        match self {
            Self::Movie => "movie-service-group",
            Self::TvShow => "tvshow-service-group",
        }
    }

    /// REST collection segment (`/movies`, `/tvshows`).
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Movie => "movies",
            Self::TvShow => "tvshows",
        }
    }

    /// Default RPC port of this kind's catalog service.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Movie => 50051,
            Self::TvShow => 50052,
        }
    }

    /// Human readable singular name ("Movie", "TV show").
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Movie => "Movie",
            Self::TvShow => "TV show",
        }
    }

    /// The placeholder returned by a lookup that finds nothing.
    ///
    /// The requested id is echoed back so the caller can correlate the reply.
    #[must_use]
    pub fn sentinel(self, id: impl Into<String>) -> Record {
        let (title, description) = match self {
            Self::Movie => ("Movie not found", "No movie with this ID was found."),
            Self::TvShow => ("TV show not found", "No TV show with this ID was found."),
        };
        Record::new(id, title, description)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::TvShow => write!(f, "tvshow"),
        }
    }
}

/// A catalog entity.
///
/// `id` is caller supplied and is the primary key within one store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    /// Primary key, immutable once created.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Free text description.
    pub description: String,
}

impl Record {
    /// Create a record.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
        }
    }

    /// Check that every field is present and non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] naming the first blank field.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for (field, value) in [
            ("id", &self.id),
            ("title", &self.title),
            ("description", &self.description),
        ] {
            if value.trim().is_empty() {
                return Err(CatalogError::missing_field(field));
            }
        }
        Ok(())
    }

    /// Case-insensitive substring match against title or description.
    ///
    /// `needle` must already be lowercased.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }

    /// Shallow-merge `fields` over this record. The id is never touched.
    #[must_use]
    pub fn merged(mut self, fields: RecordFields) -> Self {
        if let Some(title) = fields.title {
            self.title = title;
        }
        if let Some(description) = fields.description {
            self.description = description;
        }
        self
    }
}

/// A partial record, as carried by update and delete commands.
///
/// Absent fields are skipped on the wire and left untouched by a merge.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    /// Target id. Never applied over a stored record's id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Replacement title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Replacement description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RecordFields {
    /// Fields that only name a target id.
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Set the replacement title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the replacement description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Reject fields that would blank out a required value.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] if `title` or `description` is
    /// present but empty.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for (field, value) in [("title", &self.title), ("description", &self.description)] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(CatalogError::missing_field(field));
            }
        }
        Ok(())
    }
}

impl From<Record> for RecordFields {
    fn from(record: Record) -> Self {
        Self {
            id: Some(record.id),
            title: Some(record.title),
            description: Some(record.description),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn kind_names() {
        assert_eq!(EntityKind::Movie.topic(), "movies_topic");
        assert_eq!(EntityKind::TvShow.topic(), "tvshows_topic");
        assert_eq!(EntityKind::TvShow.tag(), "TVSHOW");
        assert_eq!(EntityKind::Movie.consumer_group(), "movie-service-group");
    }

    #[test]
    fn sentinel_echoes_id() {
        let sentinel = EntityKind::Movie.sentinel("404");
        assert_eq!(sentinel.id, "404");
        assert_eq!(sentinel.title, "Movie not found");
        assert!(sentinel.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_fields() {
        let err = Record::new("1", " ", "desc").validate().unwrap_err();
        assert_eq!(err, CatalogError::missing_field("title"));
        assert!(Record::new("", "t", "d").validate().is_err());
    }

    #[test]
    fn merge_preserves_id_and_untouched_fields() {
        let record = Record::new("7", "Alien", "Space horror");
        let merged = record.merged(RecordFields {
            id: Some("other".to_string()),
            title: Some("Aliens".to_string()),
            description: None,
        });
        assert_eq!(merged, Record::new("7", "Aliens", "Space horror"));
    }

    #[test]
    fn matches_is_case_insensitive_on_both_fields() {
        let record = Record::new("1", "Dune", "Sci-fi EPIC");
        assert!(record.matches("dune"));
        assert!(record.matches("epic"));
        assert!(!record.matches("western"));
    }

    #[test]
    fn fields_skip_absent_values_on_the_wire() {
        let json = serde_json::to_value(RecordFields::id("42")).unwrap();
        assert_eq!(json, serde_json::json!({ "id": "42" }));
    }
}
