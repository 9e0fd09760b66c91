#![cfg(feature = "sqlite")]

use sql_adapter::prelude::*;

#[tokio::test]
async fn blob_parameter_round_trips_through_the_engine() -> Result<(), Box<dyn std::error::Error>>
{
    let db = Connection::open("sqlite::memory:")?;
    db.query("CREATE TABLE files (id INTEGER PRIMARY KEY, body TEXT)", &[])
        .await?;

    let payload: Vec<u8> = (0u8..=255).collect();
    db.query(
        "INSERT INTO files (body) VALUES (?)",
        &[SqlValue::Blob(payload.clone())],
    )
    .await?;

    let result = db.query("SELECT body FROM files", &[]).await?;
    assert_eq!(result.len(), 1);
    assert_eq!(result.rows[0].get("body"), Some(&SqlValue::Blob(payload)));
    Ok(())
}

#[tokio::test]
async fn blob_is_stored_as_tagged_text() -> Result<(), Box<dyn std::error::Error>> {
    let db = Connection::open("sqlite::memory:")?;
    db.query("CREATE TABLE files (body TEXT)", &[]).await?;
    db.query(
        "INSERT INTO files (body) VALUES (?)",
        &[SqlValue::Blob(vec![0xde, 0xad])],
    )
    .await?;

    // The engine only ever sees text; the tag is visible when the column is
    // inspected without decoding.
    let result = db
        .query("SELECT substr(body, 1, 4) AS tag FROM files", &[])
        .await?;
    assert_eq!(
        result.rows[0].get("tag"),
        Some(&SqlValue::Text("bin!".to_string()))
    );
    Ok(())
}

#[tokio::test]
async fn file_backed_database_persists_across_connections()
-> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("roundtrip.db");
    let url = format!("sqlite:{}", path.display());

    let payload = vec![0x00, 0xff, 0x10, 0xab];
    {
        let db = Connection::open(&url)?;
        db.query("CREATE TABLE blobs (body TEXT)", &[]).await?;
        db.query(
            "INSERT INTO blobs (body) VALUES (?)",
            &[SqlValue::Blob(payload.clone())],
        )
        .await?;
        db.close().await;
    }

    let db = Connection::open(&url)?;
    let result = db.query("SELECT body FROM blobs", &[]).await?;
    assert_eq!(result.rows[0].get("body"), Some(&SqlValue::Blob(payload)));
    Ok(())
}
