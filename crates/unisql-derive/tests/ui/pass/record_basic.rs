use unisql::{Record, Scan};

#[derive(Debug, Default, Record)]
#[record(table = "products")]
struct Product {
    id: i64,
    title: String,
    #[record(column = "in_stock")]
    available: bool,
    note: Option<String>,
    #[record(skip)]
    cached: Vec<u8>,
}

#[derive(Debug, Default, Record)]
#[record(table = "settings")]
struct Setting {
    key: String,
    r#type: String,
}

#[derive(Debug, Scan)]
struct Summary {
    total: i64,
    label: String,
}

fn main() {
    assert_eq!(Product::table(), "products");
    assert_eq!(Product::fields(), &["id", "title", "in_stock", "note"]);
    assert!(Product::has_id());
    assert_eq!(Product::default().values().len(), 4);

    assert_eq!(Setting::fields(), &["key", "type"]);
    assert!(!Setting::has_id());

    fn requires_scan<T: Scan>() {}
    requires_scan::<Product>();
    requires_scan::<Summary>();
}
