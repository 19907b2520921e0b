// Example: fetching through the facade with an in-memory backend
// Run with: cargo run --example basic_usage

use whereql::{
    Column, DataType, FetchRequest, MemoryBackend, QueryFacade, Record, Schema, Value,
};

fn main() -> anyhow::Result<()> {
    println!("=== whereql Basic Usage Example ===\n");

    let mut backend = MemoryBackend::new();
    backend.create_table(
        "products",
        Schema::new(vec![
            Column::new("id", DataType::Integer).primary_key(),
            Column::new("name", DataType::Text).not_null(),
            Column::new("price", DataType::Float),
            Column::new("stock", DataType::Integer),
        ]),
    )?;
    let mut db = QueryFacade::new(backend);

    println!("1. Inserting products...");
    let products = [
        (1, "Wood screw", 0.10, 500),
        (2, "Machine screw", 0.25, 120),
        (3, "Hex bolt", 0.80, 0),
        (4, "Wing nut", 0.15, 40),
    ];
    for (id, name, price, stock) in products {
        let mut record = Record::new();
        record.insert("id".into(), Value::from(id));
        record.insert("name".into(), Value::from(name));
        record.insert("price".into(), Value::from(price));
        record.insert("stock".into(), Value::from(stock));
        db.insert("products", &record)?;
    }
    println!();

    println!("2. Screws in stock, cheapest first...");
    let request = FetchRequest::new("products")
        .filter("name %% 'screw' && stock > $minStock")
        .variable("minStock", 0)
        .order_by("price ASC");
    println!("   WHERE {}", db.where_text(&request)?.unwrap_or_default());
    println!("{}\n", db.fetch(&request)?.format());

    println!("3. Products by id list...");
    let request = FetchRequest::new("products")
        .columns(["id", "name"])
        .filter("id IN (1, 3) || (price >= 0.5 && stock == 0)");
    println!("   WHERE {}", db.where_text(&request)?.unwrap_or_default());
    println!("{}\n", db.fetch(&request)?.format());

    println!("4. Restocking the hex bolt...");
    let mut change = Record::new();
    change.insert("stock".into(), Value::from(25));
    let updated = db.update("products", &change, &Value::from(3))?;
    println!("{} row(s) updated\n", updated);

    println!("5. Missing table with tolerance...");
    let rows = db.fetch(&FetchRequest::new("orders").tolerate_missing_table(true))?;
    println!("{}\n", rows.format());

    println!("=== Example Complete ===");
    Ok(())
}
