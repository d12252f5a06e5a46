//! Query a dataset and export it to CSV.
//!
//! Credentials are read from the environment: set `DEVAPI_SECRET_KEY` for
//! version 3, or `DEVAPI_CLIENT_ID` and `DEVAPI_CLIENT_SECRET` for version 2.
//!
//! Run with: cargo run --example query_dataset -- rigs

use futures_util::StreamExt;
use devapi_rs::export::{to_csv, CsvOptions};
use devapi_rs::{ClientConfig, Credentials, Database, DevApiClient, QueryOptions};

#[tokio::main]
async fn main() -> devapi_rs::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let dataset = std::env::args().nth(1).unwrap_or_else(|| "rigs".to_string());

    let credentials = Credentials::from_env()?;
    let client = DevApiClient::connect(credentials, ClientConfig::default()).await?;
    println!("Connected using the {} API", client.protocol_name());

    let count = client
        .count(&*dataset, QueryOptions::new().filter("deleteddate", "null"))
        .await?;
    println!("{dataset}: {count} records");

    let ddl = client.ddl(&*dataset, Database::Pg).await?;
    println!("\nDDL:\n{ddl}");

    // Peek at the first few records
    let mut stream = client.query(
        &*dataset,
        QueryOptions::new().filter("deleteddate", "null").page_size(5).paging(false),
    )?;
    while let Some(record) = stream.next().await {
        println!("{:?}", record?);
    }

    let records = client.query(
        &*dataset,
        QueryOptions::new().filter("deleteddate", "null").page_size(1000),
    )?;
    let summary = to_csv(records, format!("{dataset}.csv"), CsvOptions::new()).await?;
    println!(
        "\nWrote {} records to {}",
        summary.records,
        summary.path.display()
    );

    client.close();
    Ok(())
}
