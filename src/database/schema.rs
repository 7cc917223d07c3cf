use rusqlite::Connection;
use tracing::info;

use crate::error::Result;

/// The twelve tables, in creation order. Every association comes after the
/// entities it references, so dropping walks this list backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Image,
    Label,
    ImageTaggedLabel,
    Page,
    Landmark,
    Location,
    WebEntity,
    ImageInPage,
    ImageMatchesImage,
    ImageContainsLandmark,
    ImageTaggedWebEntity,
    LandmarkLocatedAtLocation,
}

impl Table {
    pub const ALL: [Table; 12] = [
        Table::Image,
        Table::Label,
        Table::ImageTaggedLabel,
        Table::Page,
        Table::Landmark,
        Table::Location,
        Table::WebEntity,
        Table::ImageInPage,
        Table::ImageMatchesImage,
        Table::ImageContainsLandmark,
        Table::ImageTaggedWebEntity,
        Table::LandmarkLocatedAtLocation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::Image => "image",
            Table::Label => "label",
            Table::ImageTaggedLabel => "image_tagged_label",
            Table::Page => "page",
            Table::Landmark => "landmark",
            Table::Location => "location",
            Table::WebEntity => "web_entity",
            Table::ImageInPage => "image_in_page",
            Table::ImageMatchesImage => "image_matches_image",
            Table::ImageContainsLandmark => "image_contains_landmark",
            Table::ImageTaggedWebEntity => "image_tagged_web_entity",
            Table::LandmarkLocatedAtLocation => "landmark_located_at_location",
        }
    }

    /// Columns forming the table's dedup attribute set.
    pub fn dedup_columns(self) -> &'static [&'static str] {
        match self {
            Table::Image => &["url", "is_document"],
            Table::Label | Table::Landmark => &["mid", "description"],
            Table::ImageTaggedLabel => &["image_id", "label_id", "score"],
            Table::Page => &["url"],
            Table::Location => &["latitude", "longitude"],
            Table::WebEntity => &["entity_id", "description"],
            Table::ImageInPage => &["image_id", "page_id"],
            Table::ImageMatchesImage => &["image_id1", "image_id2", "type"],
            Table::ImageContainsLandmark => &["image_id", "landmark_id", "score"],
            Table::ImageTaggedWebEntity => &["image_id", "web_entity_id", "score"],
            Table::LandmarkLocatedAtLocation => &["landmark_id", "location_id"],
        }
    }

    pub fn ddl(self) -> &'static str {
        match self {
            Table::Image => CREATE_IMAGE,
            Table::Label => CREATE_LABEL,
            Table::ImageTaggedLabel => CREATE_IMAGE_TAGGED_LABEL,
            Table::Page => CREATE_PAGE,
            Table::Landmark => CREATE_LANDMARK,
            Table::Location => CREATE_LOCATION,
            Table::WebEntity => CREATE_WEB_ENTITY,
            Table::ImageInPage => CREATE_IMAGE_IN_PAGE,
            Table::ImageMatchesImage => CREATE_IMAGE_MATCHES_IMAGE,
            Table::ImageContainsLandmark => CREATE_IMAGE_CONTAINS_LANDMARK,
            Table::ImageTaggedWebEntity => CREATE_IMAGE_TAGGED_WEB_ENTITY,
            Table::LandmarkLocatedAtLocation => CREATE_LANDMARK_LOCATED_AT_LOCATION,
        }
    }
}

/// Create the schema, dropping every table first when `reset_existing` is set.
///
/// Without a reset, tables that already exist are kept as they are.
pub fn create_schema(conn: &Connection, reset_existing: bool) -> Result<()> {
    if reset_existing {
        for table in Table::ALL.iter().rev() {
            conn.execute_batch(&format!("DROP TABLE IF EXISTS {};", table.name()))?;
        }
        info!("Dropped {} tables", Table::ALL.len());
    }

    for table in Table::ALL {
        conn.execute_batch(table.ddl())?;
    }
    conn.execute_batch(CREATE_INDEXES)?;

    info!("Schema ready ({} tables)", Table::ALL.len());
    Ok(())
}

const CREATE_IMAGE: &str = "
    CREATE TABLE IF NOT EXISTS image (
        id          INTEGER PRIMARY KEY,
        url         TEXT NOT NULL,
        is_document INTEGER NOT NULL DEFAULT 0,
        UNIQUE(url, is_document)
    );
";

const CREATE_LABEL: &str = "
    CREATE TABLE IF NOT EXISTS label (
        id          INTEGER PRIMARY KEY,
        mid         TEXT NOT NULL,
        description TEXT NOT NULL,
        UNIQUE(mid, description)
    );
";

const CREATE_IMAGE_TAGGED_LABEL: &str = "
    CREATE TABLE IF NOT EXISTS image_tagged_label (
        id       INTEGER PRIMARY KEY,
        image_id INTEGER NOT NULL,
        label_id INTEGER NOT NULL,
        score    REAL NOT NULL,
        FOREIGN KEY(image_id) REFERENCES image(id),
        FOREIGN KEY(label_id) REFERENCES label(id),
        UNIQUE(image_id, label_id, score)
    );
";

const CREATE_PAGE: &str = "
    CREATE TABLE IF NOT EXISTS page (
        id  INTEGER PRIMARY KEY,
        url TEXT NOT NULL UNIQUE
    );
";

const CREATE_LANDMARK: &str = "
    CREATE TABLE IF NOT EXISTS landmark (
        id          INTEGER PRIMARY KEY,
        mid         TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        UNIQUE(mid, description)
    );
";

const CREATE_LOCATION: &str = "
    CREATE TABLE IF NOT EXISTS location (
        id        INTEGER PRIMARY KEY,
        latitude  REAL NOT NULL,
        longitude REAL NOT NULL,
        UNIQUE(latitude, longitude)
    );
";

const CREATE_WEB_ENTITY: &str = "
    CREATE TABLE IF NOT EXISTS web_entity (
        id          INTEGER PRIMARY KEY,
        entity_id   TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        UNIQUE(entity_id, description)
    );
";

const CREATE_IMAGE_IN_PAGE: &str = "
    CREATE TABLE IF NOT EXISTS image_in_page (
        id       INTEGER PRIMARY KEY,
        image_id INTEGER NOT NULL,
        page_id  INTEGER NOT NULL,
        FOREIGN KEY(image_id) REFERENCES image(id),
        FOREIGN KEY(page_id) REFERENCES page(id),
        UNIQUE(image_id, page_id)
    );
";

const CREATE_IMAGE_MATCHES_IMAGE: &str = "
    CREATE TABLE IF NOT EXISTS image_matches_image (
        id        INTEGER PRIMARY KEY,
        image_id1 INTEGER NOT NULL,
        image_id2 INTEGER NOT NULL,
        type      TEXT NOT NULL CHECK(type IN ('full', 'partial')),
        FOREIGN KEY(image_id1) REFERENCES image(id),
        FOREIGN KEY(image_id2) REFERENCES image(id),
        UNIQUE(image_id1, image_id2, type)
    );
";

const CREATE_IMAGE_CONTAINS_LANDMARK: &str = "
    CREATE TABLE IF NOT EXISTS image_contains_landmark (
        id          INTEGER PRIMARY KEY,
        image_id    INTEGER NOT NULL,
        landmark_id INTEGER NOT NULL,
        score       REAL NOT NULL,
        FOREIGN KEY(image_id) REFERENCES image(id),
        FOREIGN KEY(landmark_id) REFERENCES landmark(id),
        UNIQUE(image_id, landmark_id, score)
    );
";

const CREATE_IMAGE_TAGGED_WEB_ENTITY: &str = "
    CREATE TABLE IF NOT EXISTS image_tagged_web_entity (
        id            INTEGER PRIMARY KEY,
        image_id      INTEGER NOT NULL,
        web_entity_id INTEGER NOT NULL,
        score         REAL NOT NULL,
        FOREIGN KEY(image_id) REFERENCES image(id),
        FOREIGN KEY(web_entity_id) REFERENCES web_entity(id),
        UNIQUE(image_id, web_entity_id, score)
    );
";

const CREATE_LANDMARK_LOCATED_AT_LOCATION: &str = "
    CREATE TABLE IF NOT EXISTS landmark_located_at_location (
        id          INTEGER PRIMARY KEY,
        landmark_id INTEGER NOT NULL,
        location_id INTEGER NOT NULL,
        FOREIGN KEY(landmark_id) REFERENCES landmark(id),
        FOREIGN KEY(location_id) REFERENCES location(id),
        UNIQUE(landmark_id, location_id)
    );
";

// Join columns used by the query catalogue.
const CREATE_INDEXES: &str = "
    CREATE INDEX IF NOT EXISTS idx_image_url ON image(url);
    CREATE INDEX IF NOT EXISTS idx_itl_label ON image_tagged_label(label_id);
    CREATE INDEX IF NOT EXISTS idx_itl_image ON image_tagged_label(image_id);
    CREATE INDEX IF NOT EXISTS idx_iip_page ON image_in_page(page_id);
    CREATE INDEX IF NOT EXISTS idx_iip_image ON image_in_page(image_id);
    CREATE INDEX IF NOT EXISTS idx_imi_image2 ON image_matches_image(image_id2);
    CREATE INDEX IF NOT EXISTS idx_icl_landmark ON image_contains_landmark(landmark_id);
    CREATE INDEX IF NOT EXISTS idx_itw_image ON image_tagged_web_entity(image_id);
";
