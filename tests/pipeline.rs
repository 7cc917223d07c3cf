use annotation_graph::query::{run_catalogue, write_results, QueryParams};
use annotation_graph::{DocumentStream, Error, Store};
use indicatif::ProgressBar;
use rusqlite::types::Value;
use serde_json::json;
use std::fs;
use std::path::Path;

fn write_documents(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let docs = [
        json!({
            "url": "http://img.com/bridge1.jpg",
            "response": {
                "labelAnnotations": [
                    {"mid": "/m/015kr", "description": "bridge", "score": 0.97},
                    {"mid": "/m/0838f", "description": "water", "score": 0.8}
                ],
                "webDetection": {
                    "fullMatchingImages": [{"url": "http://mirror.com/shared.jpg"}],
                    "pagesWithMatchingImages": [
                        {"url": "http://travel.com/nyc"},
                        {"url": "http://blog.com/walk"}
                    ],
                    "webEntities": [
                        {"entityId": "/m/0hnkn", "description": "Brooklyn Bridge", "score": 1.4},
                        {"entityId": "/g/1tdgv", "score": 0.2}
                    ]
                },
                "landmarkAnnotations": [{
                    "mid": "/m/0hnkn",
                    "description": "Brooklyn Bridge",
                    "score": 0.91,
                    "locations": [{"latLng": {"latitude": 40.7057, "longitude": -73.9964}}]
                }]
            }
        }),
        json!({
            "url": "http://img.com/bridge2.jpg",
            "response": {
                "labelAnnotations": [
                    {"mid": "/m/015kr", "description": "bridge", "score": 0.88}
                ],
                "webDetection": {
                    "fullMatchingImages": [{"url": "http://mirror.com/shared.jpg"}],
                    "partialMatchingImages": [{"url": "http://img.com/bridge1.jpg"}],
                    "pagesWithMatchingImages": [
                        {"url": "http://travel.com/nyc"},
                        {"url": "http://blog.com/walk"}
                    ],
                    "webEntities": [
                        {"entityId": "/m/0hnkn", "description": "Brooklyn Bridge", "score": 1.1}
                    ]
                },
                "landmarkAnnotations": [
                    {
                        "mid": "/m/0hnkn",
                        "description": "Brooklyn Bridge",
                        "score": 0.7,
                        "locations": [{"latLng": {"latitude": 40.7057, "longitude": -73.9964}}]
                    },
                    {
                        "mid": "/m/02_286",
                        "description": "New York City",
                        "score": 0.4,
                        "locations": [{"latLng": {"latitude": 40.7128, "longitude": -74.006}}]
                    }
                ]
            }
        }),
        json!({
            "url": "http://img.com/park.jpg",
            "response": {
                "labelAnnotations": [
                    {"mid": "/m/05s2s", "description": "plant", "score": 0.9}
                ],
                "webDetection": {"webEntities": []}
            }
        }),
    ];

    for (i, doc) in docs.iter().enumerate() {
        fs::write(dir.join(format!("doc{}.json", i)), serde_json::to_string_pretty(doc)?)?;
    }
    Ok(())
}

fn count(store: &Store, table: &str) -> rusqlite::Result<i64> {
    store
        .conn()
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
}

#[test]
fn test_full_pipeline() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempfile::tempdir()?;
    let json_dir = temp_dir.path().join("json");
    fs::create_dir(&json_dir)?;
    write_documents(&json_dir)?;
    let db_path = temp_dir.path().join("sqlite.db");

    let mut store = Store::open(&db_path)?;
    store.create_schema(true)?;
    let loaded = store.load(DocumentStream::open(&json_dir), &ProgressBar::hidden())?;
    assert_eq!(loaded, 3);

    // Three documents plus the shared mirror image; bridge1 is reused as a match.
    assert_eq!(count(&store, "image")?, 4);
    assert_eq!(count(&store, "label")?, 3);
    assert_eq!(count(&store, "landmark")?, 2);
    assert_eq!(count(&store, "location")?, 2);
    assert_eq!(count(&store, "page")?, 2);
    assert_eq!(count(&store, "web_entity")?, 2);
    assert_eq!(count(&store, "landmark_located_at_location")?, 2);

    let results = run_catalogue(store.conn(), &QueryParams::default())?;

    assert_eq!(results[1].rows, vec![vec![Value::Integer(3)]]);

    let tagged: Vec<Value> = results[3].rows.iter().map(|row| row[0].clone()).collect();
    assert_eq!(
        tagged,
        vec![
            Value::Text("http://img.com/bridge1.jpg".to_string()),
            Value::Text("http://img.com/bridge2.jpg".to_string()),
        ]
    );

    assert_eq!(results[4].rows[0][0], Value::Text("/m/0hnkn".to_string()));
    assert_eq!(results[4].rows[0][2], Value::Integer(2));

    let landmarks: Vec<Value> = results[5].rows.iter().map(|row| row[0].clone()).collect();
    assert_eq!(landmarks.len(), 2);
    assert!(landmarks
        .iter()
        .all(|d| *d == Value::Text("Brooklyn Bridge".to_string())));

    assert_eq!(results[6].rows[0][0], Value::Text("bridge".to_string()));
    assert_eq!(results[6].rows[0][1], Value::Integer(2));

    assert_eq!(results[8].rows.len(), 1);
    assert_eq!(
        results[8].rows[0],
        vec![
            Value::Text("http://img.com/bridge1.jpg".to_string()),
            Value::Text("http://img.com/bridge2.jpg".to_string()),
            Value::Integer(2),
        ]
    );

    let mut out = Vec::new();
    write_results(&mut out, &results)?;
    let report = String::from_utf8(out)?;
    assert!(report.contains("Query 8: top 10 image pairs by shared pages\n    http://img.com/bridge1.jpg\thttp://img.com/bridge2.jpg\t2\n"));
    Ok(())
}

#[test]
fn test_reload_without_reset_adds_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempfile::tempdir()?;
    write_documents(temp_dir.path())?;
    let db_path = temp_dir.path().join("graph.db");

    let tables = [
        "image",
        "label",
        "image_tagged_label",
        "image_matches_image",
        "image_in_page",
        "image_tagged_web_entity",
        "image_contains_landmark",
        "landmark_located_at_location",
    ];

    let before = {
        let mut store = Store::open(&db_path)?;
        store.create_schema(true)?;
        store.load(DocumentStream::open(temp_dir.path()), &ProgressBar::hidden())?;
        tables
            .iter()
            .map(|t| count(&store, t))
            .collect::<rusqlite::Result<Vec<_>>>()?
    };

    let mut store = Store::open(&db_path)?;
    store.create_schema(false)?;
    let loaded = store.load(DocumentStream::open(temp_dir.path()), &ProgressBar::hidden())?;
    assert_eq!(loaded, 3);

    let after = tables
        .iter()
        .map(|t| count(&store, t))
        .collect::<rusqlite::Result<Vec<_>>>()?;
    assert_eq!(before, after);
    Ok(())
}

#[test]
fn test_malformed_document_aborts_batch() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempfile::tempdir()?;
    write_documents(temp_dir.path())?;
    // Sorts after the valid documents; its web detection lacks webEntities.
    fs::write(
        temp_dir.path().join("zz_broken.json"),
        r#"{"url": "x", "response": {"labelAnnotations": [], "webDetection": {}}}"#,
    )?;

    let mut store = Store::open_in_memory()?;
    store.create_schema(true)?;
    let result = store.load(DocumentStream::open(temp_dir.path()), &ProgressBar::hidden());

    match result {
        Err(Error::MalformedDocument { path, .. }) => assert!(path.ends_with("zz_broken.json")),
        other => panic!("Expected MalformedDocument, got {:?}", other),
    }
    assert_eq!(count(&store, "image")?, 0);
    Ok(())
}
