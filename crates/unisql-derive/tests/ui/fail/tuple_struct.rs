#![allow(dead_code)]

#[derive(unisql::Record)]
#[record(table = "pairs")]
struct Pair(i64, String);

fn main() {}
