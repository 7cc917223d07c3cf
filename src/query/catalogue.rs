use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Params};

use crate::error::Result;

// Every ranked query sorts its count descending and breaks ties on a text
// key ascending.

/// Parameters shared by the catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    /// Label `mid` for the label-filtered queries.
    pub label_mid: String,
    /// Landmark descriptions excluded by exact match.
    pub excluded_landmarks: Vec<String>,
    /// Row limit for the top-K queries.
    pub limit: u32,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            label_mid: "/m/015kr".to_string(),
            excluded_landmarks: vec!["New York".to_string(), "New York City".to_string()],
            limit: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub title: String,
    pub rows: Vec<Vec<Value>>,
}

/// Run every catalogue query in order.
pub fn run_catalogue(conn: &Connection, params: &QueryParams) -> Result<Vec<QueryResult>> {
    Ok(vec![
        image_count(conn)?,
        document_count(conn)?,
        entity_counts(conn)?,
        images_with_label(conn, &params.label_mid)?,
        web_entities_with_label(conn, &params.label_mid, params.limit)?,
        images_outside_landmarks(conn, &params.excluded_landmarks)?,
        top_labels(conn, params.limit)?,
        top_pages(conn, params.limit)?,
        top_image_pairs(conn, params.limit)?,
        most_connected_images(conn, params.limit)?,
    ])
}

pub fn image_count(conn: &Connection) -> Result<QueryResult> {
    collect(
        conn,
        "Query 0: images".to_string(),
        "SELECT COUNT(*) FROM image",
        [],
    )
}

pub fn document_count(conn: &Connection) -> Result<QueryResult> {
    collect(
        conn,
        "Query 1: JSON documents".to_string(),
        "SELECT COUNT(*) FROM image WHERE is_document = 1",
        [],
    )
}

pub fn entity_counts(conn: &Connection) -> Result<QueryResult> {
    collect(
        conn,
        "Query 2: entity counts".to_string(),
        "SELECT 'image' entity, COUNT(*) count FROM image
         UNION ALL
         SELECT 'label', COUNT(*) FROM label
         UNION ALL
         SELECT 'landmark', COUNT(*) FROM landmark
         UNION ALL
         SELECT 'location', COUNT(*) FROM location
         UNION ALL
         SELECT 'page', COUNT(*) FROM page
         UNION ALL
         SELECT 'webEntity', COUNT(*) FROM web_entity
         ORDER BY entity",
        [],
    )
}

/// Images tagged with a label, strongest association first.
pub fn images_with_label(conn: &Connection, label_mid: &str) -> Result<QueryResult> {
    collect(
        conn,
        format!("Query 3: images tagged with label {}", label_mid),
        "SELECT img.url, itl.score
         FROM   image img
         JOIN   image_tagged_label itl ON img.id = itl.image_id
         JOIN   label lbl ON itl.label_id = lbl.id
         WHERE  lbl.mid = ?1
         ORDER BY itl.score DESC, img.url",
        params![label_mid],
    )
}

/// Web entities tagged on the same images as a label.
pub fn web_entities_with_label(
    conn: &Connection,
    label_mid: &str,
    limit: u32,
) -> Result<QueryResult> {
    collect(
        conn,
        format!("Query 4: top {} web entities sharing images with label {}", limit, label_mid),
        "SELECT ent.entity_id, ent.description, COUNT(*) cnt
         FROM   image_tagged_label itl
         JOIN   label lbl ON itl.label_id = lbl.id
         JOIN   image_tagged_web_entity itw ON itl.image_id = itw.image_id
         JOIN   web_entity ent ON itw.web_entity_id = ent.id
         WHERE  lbl.mid = ?1
         GROUP BY ent.id
         ORDER BY cnt DESC, ent.entity_id
         LIMIT ?2",
        params![label_mid, i64::from(limit)],
    )
}

/// Images containing a landmark whose description is not in `excluded`.
pub fn images_outside_landmarks(conn: &Connection, excluded: &[String]) -> Result<QueryResult> {
    let filter = if excluded.is_empty() {
        String::new()
    } else {
        let placeholders = vec!["?"; excluded.len()].join(", ");
        format!("WHERE lmk.description NOT IN ({})", placeholders)
    };
    let sql = format!(
        "SELECT lmk.description, img.url
         FROM   image img
         JOIN   image_contains_landmark icl ON img.id = icl.image_id
         JOIN   landmark lmk ON icl.landmark_id = lmk.id
         {}
         ORDER BY lmk.description, img.url",
        filter
    );
    collect(
        conn,
        format!("Query 5: images with landmarks other than {:?}", excluded),
        &sql,
        params_from_iter(excluded.iter()),
    )
}

/// Labels applied to the most distinct images.
pub fn top_labels(conn: &Connection, limit: u32) -> Result<QueryResult> {
    collect(
        conn,
        format!("Query 6: top {} labels by image count", limit),
        "SELECT lbl.description, COUNT(DISTINCT itl.image_id) img_cnt
         FROM   label lbl
         JOIN   image_tagged_label itl ON lbl.id = itl.label_id
         GROUP BY lbl.description
         ORDER BY img_cnt DESC, lbl.description
         LIMIT ?1",
        params![i64::from(limit)],
    )
}

/// Pages linked to the most distinct images.
pub fn top_pages(conn: &Connection, limit: u32) -> Result<QueryResult> {
    collect(
        conn,
        format!("Query 7: top {} pages by image count", limit),
        "SELECT pag.url, COUNT(DISTINCT iip.image_id) img_cnt
         FROM   page pag
         JOIN   image_in_page iip ON pag.id = iip.page_id
         GROUP BY pag.id
         ORDER BY img_cnt DESC, pag.url
         LIMIT ?1",
        params![i64::from(limit)],
    )
}

/// Unordered image pairs appearing together on the most pages.
///
/// Each pair is emitted once, with the lower image id first.
pub fn top_image_pairs(conn: &Connection, limit: u32) -> Result<QueryResult> {
    collect(
        conn,
        format!("Query 8: top {} image pairs by shared pages", limit),
        "SELECT img1.url, img2.url, COUNT(DISTINCT iip1.page_id) pag_cnt
         FROM   image_in_page iip1
         JOIN   image_in_page iip2
         ON     iip1.page_id = iip2.page_id AND iip1.image_id < iip2.image_id
         JOIN   image img1 ON img1.id = iip1.image_id
         JOIN   image img2 ON img2.id = iip2.image_id
         GROUP BY img1.id, img2.id
         ORDER BY pag_cnt DESC, img1.url, img2.url
         LIMIT ?1",
        params![i64::from(limit)],
    )
}

/// Images with the most association rows of any kind. Match edges count
/// for both endpoints.
pub fn most_connected_images(conn: &Connection, limit: u32) -> Result<QueryResult> {
    collect(
        conn,
        format!("Query 9: top {} images by association count", limit),
        "SELECT img.url, COUNT(*) edge_cnt
         FROM (
             SELECT image_id FROM image_tagged_label
             UNION ALL SELECT image_id FROM image_in_page
             UNION ALL SELECT image_id1 FROM image_matches_image
             UNION ALL SELECT image_id2 FROM image_matches_image
             UNION ALL SELECT image_id FROM image_contains_landmark
             UNION ALL SELECT image_id FROM image_tagged_web_entity
         ) edges
         JOIN image img ON img.id = edges.image_id
         GROUP BY img.id
         ORDER BY edge_cnt DESC, img.url
         LIMIT ?1",
        params![i64::from(limit)],
    )
}

fn collect<P: Params>(
    conn: &Connection,
    title: String,
    sql: &str,
    params: P,
) -> Result<QueryResult> {
    let mut stmt = conn.prepare(sql)?;
    let width = stmt.column_count();
    let rows = stmt
        .query_map(params, |row| {
            (0..width)
                .map(|i| row.get::<_, Value>(i))
                .collect::<rusqlite::Result<Vec<_>>>()
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(QueryResult { title, rows })
}
