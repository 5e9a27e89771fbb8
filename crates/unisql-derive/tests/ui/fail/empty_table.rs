#![allow(dead_code)]

#[derive(unisql::Record)]
#[record(table = "")]
struct Product {
    id: i64,
}

fn main() {}
