use rusqlite::types::{ToSql, ToSqlOutput, Value};
use rusqlite::{params, Connection, OptionalExtension};
use std::fmt;
use tracing::debug;

use crate::database::ids::*;
use crate::database::schema::Table;
use crate::error::{Error, Result};

/// How a discovered image matched the subject image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    Full,
    Partial,
}

impl MatchType {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchType::Full => "full",
            MatchType::Partial => "partial",
        }
    }
}

impl ToSql for MatchType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

const INSERT_DOCUMENT_IMAGE: &str = "INSERT OR IGNORE INTO image (url, is_document) VALUES (?1, 1)";
const SELECT_DOCUMENT_IMAGE: &str = "SELECT id FROM image WHERE url = ?1 AND is_document = 1";

const INSERT_IMAGE: &str = "INSERT INTO image (url, is_document)
     SELECT ?1, 0 WHERE NOT EXISTS (SELECT 1 FROM image WHERE url = ?1)";
const SELECT_IMAGE: &str = "SELECT id FROM image WHERE url = ?1 ORDER BY id LIMIT 1";

const INSERT_LABEL: &str = "INSERT OR IGNORE INTO label (mid, description) VALUES (?1, ?2)";
const SELECT_LABEL: &str = "SELECT id FROM label WHERE mid = ?1 AND description = ?2";

const INSERT_PAGE: &str = "INSERT OR IGNORE INTO page (url) VALUES (?1)";
const SELECT_PAGE: &str = "SELECT id FROM page WHERE url = ?1";

const INSERT_LANDMARK: &str = "INSERT OR IGNORE INTO landmark (mid, description) VALUES (?1, ?2)";
const SELECT_LANDMARK: &str = "SELECT id FROM landmark WHERE mid = ?1 AND description = ?2";

const INSERT_LOCATION: &str =
    "INSERT OR IGNORE INTO location (latitude, longitude) VALUES (?1, ?2)";
const SELECT_LOCATION: &str = "SELECT id FROM location WHERE latitude = ?1 AND longitude = ?2";

const INSERT_WEB_ENTITY: &str =
    "INSERT OR IGNORE INTO web_entity (entity_id, description) VALUES (?1, ?2)";
const SELECT_WEB_ENTITY: &str =
    "SELECT id FROM web_entity WHERE entity_id = ?1 AND description = ?2";

const INSERT_IMAGE_LABEL: &str =
    "INSERT OR IGNORE INTO image_tagged_label (image_id, label_id, score) VALUES (?1, ?2, ?3)";
const SELECT_IMAGE_LABEL: &str = "SELECT id FROM image_tagged_label
     WHERE image_id = ?1 AND label_id = ?2 AND score = ?3";

const INSERT_IMAGE_PAGE: &str =
    "INSERT OR IGNORE INTO image_in_page (image_id, page_id) VALUES (?1, ?2)";
const SELECT_IMAGE_PAGE: &str = "SELECT id FROM image_in_page WHERE image_id = ?1 AND page_id = ?2";

const INSERT_IMAGE_MATCH: &str =
    "INSERT OR IGNORE INTO image_matches_image (image_id1, image_id2, type) VALUES (?1, ?2, ?3)";
const SELECT_IMAGE_MATCH: &str = "SELECT id FROM image_matches_image
     WHERE image_id1 = ?1 AND image_id2 = ?2 AND type = ?3";

const INSERT_IMAGE_LANDMARK: &str = "INSERT OR IGNORE INTO image_contains_landmark
     (image_id, landmark_id, score) VALUES (?1, ?2, ?3)";
const SELECT_IMAGE_LANDMARK: &str = "SELECT id FROM image_contains_landmark
     WHERE image_id = ?1 AND landmark_id = ?2 AND score = ?3";

const INSERT_IMAGE_WEB_ENTITY: &str = "INSERT OR IGNORE INTO image_tagged_web_entity
     (image_id, web_entity_id, score) VALUES (?1, ?2, ?3)";
const SELECT_IMAGE_WEB_ENTITY: &str = "SELECT id FROM image_tagged_web_entity
     WHERE image_id = ?1 AND web_entity_id = ?2 AND score = ?3";

const INSERT_LANDMARK_LOCATION: &str = "INSERT OR IGNORE INTO landmark_located_at_location
     (landmark_id, location_id) VALUES (?1, ?2)";
const SELECT_LANDMARK_LOCATION: &str = "SELECT id FROM landmark_located_at_location
     WHERE landmark_id = ?1 AND location_id = ?2";

/// Find-or-create per table: `INSERT OR IGNORE` on the unique dedup key, then
/// re-query the same key. Must run inside the batch transaction.
pub struct Resolver<'c> {
    conn: &'c Connection,
}

impl<'c> Resolver<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// The image a document was fetched for, keyed by `(url, is_document = 1)`.
    pub fn document_image(&self, url: &str) -> Result<ImageId> {
        self.find_or_create(
            Table::Image,
            INSERT_DOCUMENT_IMAGE,
            SELECT_DOCUMENT_IMAGE,
            params![url],
        )
    }

    /// An image discovered through another image's annotations, keyed by url
    /// alone. Any existing row with that url is reused, the oldest first.
    pub fn image(&self, url: &str) -> Result<ImageId> {
        self.find_or_create(Table::Image, INSERT_IMAGE, SELECT_IMAGE, params![url])
    }

    pub fn label(&self, mid: &str, description: &str) -> Result<LabelId> {
        self.find_or_create(Table::Label, INSERT_LABEL, SELECT_LABEL, params![mid, description])
    }

    pub fn page(&self, url: &str) -> Result<PageId> {
        self.find_or_create(Table::Page, INSERT_PAGE, SELECT_PAGE, params![url])
    }

    pub fn landmark(&self, mid: &str, description: &str) -> Result<LandmarkId> {
        self.find_or_create(
            Table::Landmark,
            INSERT_LANDMARK,
            SELECT_LANDMARK,
            params![mid, description],
        )
    }

    /// Coordinates are compared exactly, without tolerance.
    pub fn location(&self, latitude: f64, longitude: f64) -> Result<LocationId> {
        self.find_or_create(
            Table::Location,
            INSERT_LOCATION,
            SELECT_LOCATION,
            params![latitude, longitude],
        )
    }

    pub fn web_entity(&self, entity_id: &str, description: &str) -> Result<WebEntityId> {
        self.find_or_create(
            Table::WebEntity,
            INSERT_WEB_ENTITY,
            SELECT_WEB_ENTITY,
            params![entity_id, description],
        )
    }

    pub fn image_label(&self, image: ImageId, label: LabelId, score: f64) -> Result<ImageLabelId> {
        self.find_or_create(
            Table::ImageTaggedLabel,
            INSERT_IMAGE_LABEL,
            SELECT_IMAGE_LABEL,
            params![image, label, score],
        )
    }

    pub fn image_page(&self, image: ImageId, page: PageId) -> Result<ImagePageId> {
        self.find_or_create(
            Table::ImageInPage,
            INSERT_IMAGE_PAGE,
            SELECT_IMAGE_PAGE,
            params![image, page],
        )
    }

    /// Stored as given: `image` is always the subject, `matched` the discovered image.
    pub fn image_match(
        &self,
        image: ImageId,
        matched: ImageId,
        kind: MatchType,
    ) -> Result<ImageMatchId> {
        self.find_or_create(
            Table::ImageMatchesImage,
            INSERT_IMAGE_MATCH,
            SELECT_IMAGE_MATCH,
            params![image, matched, kind],
        )
    }

    pub fn image_landmark(
        &self,
        image: ImageId,
        landmark: LandmarkId,
        score: f64,
    ) -> Result<ImageLandmarkId> {
        self.find_or_create(
            Table::ImageContainsLandmark,
            INSERT_IMAGE_LANDMARK,
            SELECT_IMAGE_LANDMARK,
            params![image, landmark, score],
        )
    }

    pub fn image_web_entity(
        &self,
        image: ImageId,
        entity: WebEntityId,
        score: f64,
    ) -> Result<ImageWebEntityId> {
        self.find_or_create(
            Table::ImageTaggedWebEntity,
            INSERT_IMAGE_WEB_ENTITY,
            SELECT_IMAGE_WEB_ENTITY,
            params![image, entity, score],
        )
    }

    pub fn landmark_location(
        &self,
        landmark: LandmarkId,
        location: LocationId,
    ) -> Result<LandmarkLocationId> {
        self.find_or_create(
            Table::LandmarkLocatedAtLocation,
            INSERT_LANDMARK_LOCATION,
            SELECT_LANDMARK_LOCATION,
            params![landmark, location],
        )
    }

    fn find_or_create<I>(
        &self,
        table: Table,
        insert: &str,
        select: &str,
        key: &[&dyn ToSql],
    ) -> Result<I>
    where
        I: rusqlite::types::FromSql + fmt::Display,
    {
        let inserted = self.conn.prepare_cached(insert)?.execute(key)?;

        let id: Option<I> = self
            .conn
            .prepare_cached(select)?
            .query_row(key, |row| row.get(0))
            .optional()?;

        match id {
            Some(id) => {
                let action = if inserted > 0 { "created" } else { "found" };
                debug!("{} row {} {}", table.name(), id, action);
                Ok(id)
            }
            None => Err(Error::Integrity {
                table: table.name(),
                key: describe_key(table, key),
            }),
        }
    }
}

fn describe_key(table: Table, key: &[&dyn ToSql]) -> String {
    table
        .dedup_columns()
        .iter()
        .zip(key)
        .map(|(column, value)| {
            let value = match value.to_sql() {
                Ok(ToSqlOutput::Borrowed(v)) => format!("{:?}", Value::from(v)),
                Ok(ToSqlOutput::Owned(v)) => format!("{:?}", v),
                _ => "?".to_string(),
            };
            format!("{}={}", column, value)
        })
        .collect::<Vec<_>>()
        .join(", ")
}
