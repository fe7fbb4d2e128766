use std::sync::Arc;

use quarry_orm::{ConnectionConfig, Database, ModelError, Row, StaticRequest};
use serde_json::{json, Value};

async fn seeded() -> Database {
    let db = Database::sqlite_memory();
    db.execute(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL,
            age INTEGER,
            created_at TEXT DEFAULT CURRENT_TIMESTAMP
        )",
        &[],
    )
    .await
    .unwrap();

    for (email, age) in [
        ("a@b.com", 17),
        ("x@y.com", 18),
        ("c@d.com", 25),
        ("e@f.com", 30),
        ("g@h.com", 41),
    ] {
        db.execute(
            "INSERT INTO users (email, age) VALUES (?, ?)",
            &[json!(email), json!(age)],
        )
        .await
        .unwrap();
    }
    db
}

fn ids(rows: &[Row]) -> Vec<i64> {
    rows.iter()
        .filter_map(|row| row.get("id").and_then(Value::as_i64))
        .collect()
}

#[tokio::test]
async fn test_or_where_returns_both_matches() {
    let db = Database::sqlite_memory();
    db.execute("CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT)", &[])
        .await
        .unwrap();
    for (id, email) in [(1, "a@b.com"), (2, "x@y.com"), (3, "c@d.com")] {
        db.execute("INSERT INTO users (id, email) VALUES (?, ?)", &[json!(id), json!(email)])
            .await
            .unwrap();
    }

    let rows = db
        .table("users")
        .where_("email", "=", "a@b.com")
        .or_where("email", "=", "c@d.com")
        .get()
        .await
        .unwrap();
    assert_eq!(ids(&rows), vec![1, 3]);
}

#[tokio::test]
async fn test_insert_returns_id_and_row_is_readable() {
    let db = seeded().await;
    let id = db
        .table("users")
        .insert(json!({"email": "new@x.com", "age": 50}))
        .await
        .unwrap()
        .expect("insert should succeed");
    assert!(id > 0);

    let row = db
        .table("users")
        .where_("id", "=", id)
        .first()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.get("email"), Some(&json!("new@x.com")));
    assert!(row.get("created_at").is_some_and(|v| !v.is_null()));
}

#[tokio::test]
async fn test_mixed_conditions_match_in_memory_filter() {
    let db = seeded().await;

    let rows = db
        .table("users")
        .where_("age", ">=", 18)
        .where_nested(|q| {
            q.where_in("email", ["x@y.com", "e@f.com"])
                .or_where_between("age", 40, 50)
        })
        .or_where_raw("email = ? AND age < ?", vec![json!("a@b.com"), json!(20)])
        .order_by("id", "asc")
        .get()
        .await
        .unwrap();

    let all = db.select("SELECT * FROM users ORDER BY id", &[]).await.unwrap();
    let expected: Vec<Row> = all
        .into_iter()
        .filter(|row| {
            let age = row["age"].as_i64().unwrap();
            let email = row["email"].as_str().unwrap();
            (age >= 18 && (["x@y.com", "e@f.com"].contains(&email) || (40..=50).contains(&age)))
                || (email == "a@b.com" && age < 20)
        })
        .collect();

    assert_eq!(ids(&rows), ids(&expected));
    assert_eq!(ids(&rows), vec![1, 2, 4, 5]);
}

#[tokio::test]
async fn test_empty_where_in_returns_nothing() {
    let db = seeded().await;
    let rows = db
        .table("users")
        .where_in("id", Vec::<i64>::new())
        .get()
        .await
        .unwrap();
    assert!(rows.is_empty());

    let rows = db
        .table("users")
        .where_in("id", Vec::<i64>::new())
        .or_where_eq("id", 2)
        .get()
        .await
        .unwrap();
    assert_eq!(ids(&rows), vec![2]);
}

#[tokio::test]
async fn test_count_leaves_state_for_next_get() {
    let db = seeded().await;
    let mut query = db
        .table("users")
        .select(["id"])
        .where_("age", ">", 17)
        .order_by("id", "desc")
        .limit(2);

    assert_eq!(query.count().await.unwrap(), 4);
    let rows = query.get().await.unwrap();
    assert_eq!(ids(&rows), vec![5, 4]);
    assert_eq!(rows[0].len(), 1);
}

#[tokio::test]
async fn test_terminal_operation_resets_state() {
    let db = seeded().await;
    let mut query = db.table("users").where_eq("id", 1).limit(1);
    assert_eq!(query.get().await.unwrap().len(), 1);

    // conditions and limit are gone, the table is kept
    assert_eq!(query.state().table.as_deref(), Some("users"));
    assert!(query.state().conditions.is_empty());
    assert_eq!(query.get().await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_between_count() {
    let db = seeded().await;
    let count = db
        .table("users")
        .where_between("age", 18, 30)
        .count()
        .await
        .unwrap();
    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_paginate_second_page() {
    let db = seeded()
        .await
        .with_request(Arc::new(StaticRequest::new("https://example.com/users?sort=id&page=7")));
    let page = db
        .table("users")
        .order_by("id", "asc")
        .paginate(2, 2)
        .await
        .unwrap();

    assert_eq!(page.len(), 2);
    assert_eq!(page.total(), 5);
    assert_eq!(page.current_page(), 2);
    assert_eq!(page.last_page(), 3);
    assert_eq!(
        page.next_page_url().as_deref(),
        Some("https://example.com/users?sort=id&page=3")
    );
    assert_eq!(
        page.previous_page_url().as_deref(),
        Some("https://example.com/users?sort=id&page=1")
    );
    assert_eq!(ids(page.items()), vec![3, 4]);

    let json = serde_json::to_value(&page).unwrap();
    assert_eq!(json["from"], 3);
    assert_eq!(json["to"], 4);
    assert_eq!(json["path"], "https://example.com/users");
}

#[tokio::test]
async fn test_paginate_clamps_page() {
    let db = seeded().await;
    let page = db.table("users").paginate(10, 0).await.unwrap();
    assert_eq!(page.current_page(), 1);
    assert_eq!(page.len(), 5);
    assert!(!page.has_more_pages());
    assert_eq!(page.first_page_url(), "/?page=1");
}

#[tokio::test]
async fn test_cursor_pagination_walks_all_rows() {
    let db = seeded().await;
    let mut query = db.table("users");

    let first = query.cursor_paginate(2, None).await.unwrap();
    assert_eq!(ids(first.items()), vec![1, 2]);
    assert_eq!(first.next_cursor(), Some(&json!(2)));
    assert_eq!(first.next_page_url().as_deref(), Some("/?cursor=2"));

    let second = query
        .cursor_paginate(2, first.next_cursor().cloned())
        .await
        .unwrap();
    assert_eq!(ids(second.items()), vec![3, 4]);

    let last = query
        .cursor_paginate(2, second.next_cursor().cloned())
        .await
        .unwrap();
    assert_eq!(ids(last.items()), vec![5]);
    assert!(!last.has_more_pages());
    assert_eq!(last.next_page_url(), None);
}

#[tokio::test]
async fn test_oversized_page_sizes_are_clamped() {
    let db = seeded().await;

    let page = db.table("users").paginate(u64::MAX, 1).await.unwrap();
    assert_eq!(page.len(), 5);
    assert_eq!(page.per_page(), i64::MAX as u64);
    assert_eq!(page.last_page(), 1);

    let beyond = db.table("users").paginate(u64::MAX, u64::MAX).await.unwrap();
    assert!(beyond.is_empty());
    assert_eq!(beyond.total(), 5);

    let cursor = db.table("users").cursor_paginate(u64::MAX, None).await.unwrap();
    assert_eq!(ids(cursor.items()), vec![1, 2, 3, 4, 5]);
    assert!(!cursor.has_more_pages());
}

#[tokio::test]
async fn test_find_pluck_exists() {
    let db = seeded().await;
    let row = db.table("users").find(3).await.unwrap().unwrap();
    assert_eq!(row["email"], "c@d.com");
    assert!(db.table("users").find(99).await.unwrap().is_none());

    let err = db
        .table("users")
        .where_eq("id", 99)
        .first_or_fail()
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::NotFound(_)));

    let emails = db
        .table("users")
        .where_("age", "<", 20)
        .order_by("id", "asc")
        .pluck("email")
        .await
        .unwrap();
    assert_eq!(emails, vec![json!("a@b.com"), json!("x@y.com")]);

    assert!(db.table("users").where_eq("age", 41).exists().await.unwrap());
    assert!(!db.table("users").where_eq("age", 99).exists().await.unwrap());
}

#[tokio::test]
async fn test_update_and_delete_counts() {
    let db = seeded().await;
    let updated = db
        .table("users")
        .where_("age", "<", 20)
        .update(json!({"age": 21}))
        .await
        .unwrap();
    assert_eq!(updated, 2);

    assert_eq!(db.table("users").update(Row::new()).await.unwrap(), 0);
    assert_eq!(
        db.table("users").where_eq("id", 999).update(json!({"age": 1})).await.unwrap(),
        0
    );

    let deleted = db.table("users").where_eq("age", 21).delete().await.unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(db.table("users").count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_write_failures_return_sentinels() {
    let db = seeded().await;
    let id = db
        .table("users")
        .insert(json!({"no_such_column": 1}))
        .await
        .unwrap();
    assert_eq!(id, None);

    // NOT NULL violation
    let rows = db
        .table("users")
        .where_eq("id", 1)
        .update(json!({"email": Value::Null}))
        .await
        .unwrap();
    assert_eq!(rows, 0);

    let rows = db.table("missing").delete().await.unwrap();
    assert_eq!(rows, 0);
}

#[tokio::test]
async fn test_read_failures_are_errors() {
    let db = seeded().await;
    let err = db.table("missing").get().await.unwrap_err();
    assert!(matches!(err, ModelError::Database(_)));

    let err = db.table("missing").count().await.unwrap_err();
    assert!(err.is_execution());
}

#[tokio::test]
async fn test_invalid_input_is_never_executed() {
    let db = seeded().await;
    let err = db
        .table("users")
        .where_("email", "= 'x' OR 1 =", 1)
        .get()
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::Query(_)));

    let err = db
        .table("users")
        .order_by("id; DROP TABLE users", "asc")
        .delete()
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::Query(_)));
    assert_eq!(db.table("users").count().await.unwrap(), 5);
}

#[tokio::test]
async fn test_unbound_builder_requires_table() {
    let db = seeded().await;
    let err = db.query().get().await.unwrap_err();
    assert!(matches!(err, ModelError::Query(_)));

    let mut query = db.query().table("users").where_eq("id", 1);
    assert_eq!(query.get().await.unwrap().len(), 1);
    assert_eq!(query.state().table, None);
}

#[tokio::test]
async fn test_insert_default_values() {
    let db = seeded().await;
    db.execute("CREATE TABLE hits (id INTEGER PRIMARY KEY, at TEXT DEFAULT 'now')", &[])
        .await
        .unwrap();
    let id = db.table("hits").insert(Row::new()).await.unwrap();
    assert_eq!(id, Some(1));
}

#[tokio::test]
async fn test_file_database_uses_wal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.db");
    let db = Database::new(ConnectionConfig::sqlite(path.to_str().unwrap()));

    let rows = db.select("PRAGMA journal_mode", &[]).await.unwrap();
    assert_eq!(rows[0].get("journal_mode"), Some(&json!("wal")));
    assert!(path.exists());
    db.close().await;
}
