#![allow(dead_code)]

#[derive(unisql::Record)]
struct Product {
    id: i64,
}

fn main() {}
