//! Open a SQLite database, apply the bundled migration and run a few queries
//!
//! Run with `cargo run -p unisql --example basic_usage`. Switch the URL to
//! `mysql://..` or `postgres://..` to use another server.

use std::time::Duration;

use unisql::{DatabaseConfig, Engine, LoggingConfig, PoolConfig, Queryable, Scan};

#[derive(Debug, Scan)]
struct User {
    id: i64,
    name: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    unisql::init_logging(LoggingConfig::default()).map_err(|e| anyhow::anyhow!(e))?;

    let file = tempfile::Builder::new().prefix("unisql-sqlite-").tempfile()?;
    let url = format!("sqlite://{}", file.path().display());

    let config = DatabaseConfig::new(url)
        .with_migrations_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/db/migrations"))
        .with_debug(true)
        .with_pool(PoolConfig {
            max_connections: 8,
            max_lifetime: Some(Duration::from_secs(60 * 60)),
            ..PoolConfig::default()
        });
    let db = Engine::connect(config).await?;

    println!("Inserting some data to users table");
    db.exec("INSERT INTO users (id, name) VALUES ($1, $2)", &unisql::args![5, "John"])
        .await?;

    println!("Selecting all rows from users table");
    let rows = db.query("SELECT id, name FROM users ORDER BY id ASC", &[]).await?;
    for user in rows.scans::<User>()? {
        println!("ID: {}, Name: {}", user.id, user.name);
    }

    println!("Updating inside transaction");
    db.transaction(|tx| {
        Box::pin(async move {
            tx.exec("UPDATE users SET name=$1 WHERE id=$2", &unisql::args!["John", 1]).await?;
            tx.exec("UPDATE users SET name=$1 WHERE id=$2", &unisql::args!["Alice", 5]).await?;
            Ok::<_, unisql::Error>(())
        })
    })
    .await?;

    println!("Selecting all rows from users again");
    db.each("SELECT id, name FROM users ORDER BY id ASC", &[], |row| {
        let user: User = row.scans()?;
        println!("ID: {}, Name: {}", user.id, user.name);
        Ok(())
    })
    .await?;

    println!("Selecting specific user with ID: 5");
    match db.query_row("SELECT id, name FROM users WHERE id=$1", &unisql::args![5]).await {
        Ok(row) => {
            let user: User = row.scans()?;
            println!("ID: {}, Name: {}", user.id, user.name);
        }
        Err(e) if e.is_no_rows() => println!("Record not found"),
        Err(e) => return Err(e.into()),
    }

    db.close().await?;
    Ok(())
}
