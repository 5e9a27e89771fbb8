#![allow(dead_code)]

#[derive(unisql::Record)]
#[record(tabel = "products")]
struct Product {
    id: i64,
}

fn main() {}
