//! Paged users table against a datatable backend.
//!
//! Run with: cargo run --example users_table
//!
//! Reads DATATABLE_BASE_URL from .env (defaults to http://localhost:3000)
//! and logs to datatable-demo.log.

use std::env;
use std::fs::File;
use std::sync::Arc;
use std::time::Duration;

use datatable_lib::ReqwestTransport;
use datatable_lib::model::ViewState;
use datatable_lib::table::TableConfig;
use datatable_lib::table::TableController;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::WriteLogger;

const CONFIG: &str = r#"{
    "endpoint": "/api/datatable/v1",
    "method": "GET",
    "fieldNames": {
        "limit": "limit",
        "skip": "skip",
        "total": "pagination.totalItems",
        "sortField": "sortBy",
        "sortOrder": "sortOrder",
        "searchParam": "search"
    },
    "columns": [
        { "title": "Serial", "serial": true },
        { "title": "Name", "dataIndex": "name", "sort": true },
        { "title": "Email", "dataIndex": "email", "sort": true },
        { "title": "City", "dataIndex": "address.city" },
        { "dataSrc": "data" }
    ],
    "rowsPerPage": 5,
    "searchDebounceMs": 300
}"#;

fn print_view(label: &str, table: &TableController, view: &ViewState) {
    println!("\n== {} ==", label);
    if let Some(error) = &view.error {
        println!("error: {}", error);
    }

    let visible: Vec<_> = table
        .columns()
        .all()
        .iter()
        .filter(|c| !c.collection_root)
        .collect();

    let titles: Vec<&str> = visible.iter().map(|c| c.title.as_str()).collect();
    println!("{}", titles.join(" | "));
    for (i, row) in view.rows.iter().enumerate() {
        let cells: Vec<String> = visible
            .iter()
            .map(|c| {
                if c.is_serial() {
                    view.serial(i).to_string()
                } else {
                    row.display(&c.title)
                }
            })
            .collect();
        println!("{}", cells.join(" | "));
    }
    println!(
        "Page {} of {} ({} items)",
        view.page, view.total_pages, view.total_items
    );
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let log_file = File::create("datatable-demo.log")?;
    WriteLogger::init(LevelFilter::Debug, Config::default(), log_file)?;

    let base_url =
        env::var("DATATABLE_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let transport = ReqwestTransport::builder()
        .base_url(&base_url)
        .timeout(Duration::from_secs(10))
        .build()?;

    let config = TableConfig::from_json(CONFIG)?;
    let table = TableController::with_tokio(config, Arc::new(transport))?;
    println!("Loading users from {}...", base_url);

    let view = table.load().await;
    print_view("first page", &table, &view);

    let view = table.next_page().await;
    print_view("next page", &table, &view);

    let view = table.activate_sort("Name").await;
    print_view("sorted by name", &table, &view);

    // Type "jo" one keystroke at a time; only the last one is committed.
    let mut updates = table.subscribe();
    for term in ["j", "jo"] {
        table.set_search_input(term).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    while updates.changed().await.is_ok() {
        let view = updates.borrow_and_update().clone();
        if !view.loading && view.search == "jo" {
            print_view("search 'jo'", &table, &view);
            break;
        }
    }

    table.teardown();
    Ok(())
}
