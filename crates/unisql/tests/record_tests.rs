//! Integration tests for record CRUD helpers on a migrated SQLite file

use std::fs;

use tempfile::{NamedTempFile, TempDir};
use unisql::{Engine, Error, Queryable, Record};

#[derive(Debug, Default, Clone, PartialEq, Record)]
#[record(table = "products")]
struct Product {
    id: i64,
    title: String,
    price: f64,
    #[record(column = "in_stock")]
    available: bool,
    note: Option<String>,
    created_at: i64,
    updated_at: i64,
    #[record(skip)]
    display_name: String,
}

#[derive(Debug, Default, Record)]
#[record(table = "settings")]
struct Setting {
    key: String,
    value: String,
}

const PRODUCTS: &str = "-- migrate:up
CREATE TABLE products (
    id integer PRIMARY KEY AUTOINCREMENT,
    title varchar(255) NOT NULL,
    price real NOT NULL DEFAULT 0,
    in_stock boolean NOT NULL DEFAULT 1,
    note text,
    created_at integer NOT NULL DEFAULT 0,
    updated_at integer NOT NULL DEFAULT 0
);
CREATE TABLE settings (
    key varchar(64) PRIMARY KEY,
    value text NOT NULL
);

-- migrate:down
DROP TABLE settings;
DROP TABLE products;
";

/// Owns the temp file and directory; they are deleted when it drops
struct Fixture {
    db: Engine,
    _file: NamedTempFile,
    _dir: TempDir,
}

async fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("20240101000000_products.sql"), PRODUCTS).unwrap();

    let file = NamedTempFile::new().unwrap();
    let url = format!("sqlite://{}", file.path().display());
    let db = unisql::open(&url, dir.path().to_str().unwrap()).await.unwrap();

    Fixture {
        db,
        _file: file,
        _dir: dir,
    }
}

fn lamp() -> Product {
    Product {
        title: "Lamp".to_string(),
        price: 19.5,
        available: true,
        note: None,
        display_name: "ignored".to_string(),
        ..Product::default()
    }
}

#[tokio::test]
async fn test_insert_and_load() {
    let fixture = fixture().await;
    let db = &fixture.db;
    let before = db.current_unix_timestamp();

    let result = db.insert_row(&lamp()).await.unwrap();
    assert_eq!(result.rows_affected(), 1);
    let id = result.last_insert_id().unwrap();

    let product: Product = db.query_row_by_id(id).await.unwrap();
    assert_eq!(product.id, id);
    assert_eq!(product.title, "Lamp");
    assert_eq!(product.price, 19.5);
    assert!(product.available);
    assert_eq!(product.note, None);
    assert!(product.created_at >= before);
    assert_eq!(product.created_at, product.updated_at);
    assert_eq!(product.display_name, "");
}

#[tokio::test]
async fn test_update_row() {
    let fixture = fixture().await;
    let db = &fixture.db;
    let id = db.insert_row(&lamp()).await.unwrap().last_insert_id().unwrap();

    let mut product: Product = db.query_row_by_id(id).await.unwrap();
    db.exec("UPDATE products SET created_at = 1, updated_at = 1 WHERE id = $1", &unisql::args![id])
        .await
        .unwrap();

    product.title = "Desk lamp".to_string();
    product.note = Some("LED".to_string());
    product.created_at = 42;
    let result = db.update_row(&product).await.unwrap();
    assert_eq!(result.rows_affected(), 1);

    let stored: Product = db.query_row_by_id(id).await.unwrap();
    assert_eq!(stored.title, "Desk lamp");
    assert_eq!(stored.note.as_deref(), Some("LED"));
    assert_eq!(stored.created_at, 1);
    assert!(stored.updated_at > 1);
}

#[tokio::test]
async fn test_update_row_only() {
    let fixture = fixture().await;
    let db = &fixture.db;
    let id = db.insert_row(&lamp()).await.unwrap().last_insert_id().unwrap();

    let mut product: Product = db.query_row_by_id(id).await.unwrap();
    product.title = "Changed".to_string();
    product.price = 5.0;

    db.update_row_only(&product, &["price"]).await.unwrap();

    let stored: Product = db.query_row_by_id(id).await.unwrap();
    assert_eq!(stored.title, "Lamp");
    assert_eq!(stored.price, 5.0);

    let err = db.update_row_only(&product, &["unknown"]).await.unwrap_err();
    assert!(matches!(err, Error::Statement(_)));
}

#[tokio::test]
async fn test_exists_and_delete() {
    let fixture = fixture().await;
    let db = &fixture.db;
    let id = db.insert_row(&lamp()).await.unwrap().last_insert_id().unwrap();

    assert!(db.row_exists::<Product>(id).await.unwrap());
    assert!(!db.row_exists::<Product>(id + 100).await.unwrap());

    let result = db.delete_row_by_id::<Product>(id).await.unwrap();
    assert_eq!(result.rows_affected(), 1);
    assert!(!db.row_exists::<Product>(id).await.unwrap());

    let err = db.query_row_by_id::<Product>(id).await.unwrap_err();
    assert!(err.is_no_rows());
}

#[tokio::test]
async fn test_records_without_id() {
    let fixture = fixture().await;
    let db = &fixture.db;

    let setting = Setting {
        key: "theme".to_string(),
        value: "dark".to_string(),
    };
    db.insert_row(&setting).await.unwrap();

    let (value,): (String,) = db
        .query_row("SELECT value FROM settings WHERE key = $1", &unisql::args!["theme"])
        .await
        .unwrap()
        .scans()
        .unwrap();
    assert_eq!(value, "dark");

    let err = db.update_row(&setting).await.unwrap_err();
    assert!(matches!(err, Error::Statement(_)));
}

#[tokio::test]
async fn test_row_exists_reports_driver_errors() {
    let fixture = fixture().await;
    let db = &fixture.db;
    db.exec("DROP TABLE products", &[]).await.unwrap();

    let err = db.row_exists::<Product>(1).await.unwrap_err();
    assert!(matches!(err, Error::Database(_)));
}

#[test]
fn test_record_metadata() {
    assert_eq!(Product::table(), "products");
    assert_eq!(
        Product::fields(),
        &["id", "title", "price", "in_stock", "note", "created_at", "updated_at"]
    );
    assert_eq!(lamp().values().len(), 7);
    assert!(!Setting::has_id());
}

#[tokio::test]
async fn test_insert_returns_autoincrement_ids() {
    let fixture = fixture().await;
    let db = &fixture.db;

    let first = db.insert_row(&lamp()).await.unwrap().last_insert_id().unwrap();
    let second = db.insert_row(&lamp()).await.unwrap().last_insert_id().unwrap();
    assert_eq!(second, first + 1);

    let third = db
        .transaction(|tx| {
            Box::pin(async move {
                let result = tx.insert_row(&lamp()).await?;
                Ok::<_, Error>(result.last_insert_id())
            })
        })
        .await
        .unwrap();
    assert_eq!(third, Some(second + 1));

    let insert = db.prepare("INSERT INTO products (title) VALUES ($1)").await.unwrap();
    let fourth = insert.exec(&unisql::args!["Chair"]).await.unwrap().last_insert_id();
    assert_eq!(fourth, Some(second + 2));

    let product: Product = db.query_row_by_id(second + 2).await.unwrap();
    assert_eq!(product.title, "Chair");
}
