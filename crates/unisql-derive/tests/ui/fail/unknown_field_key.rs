#![allow(dead_code)]

#[derive(unisql::Record)]
#[record(table = "products")]
struct Product {
    id: i64,
    #[record(rename = "label")]
    title: String,
}

fn main() {}
