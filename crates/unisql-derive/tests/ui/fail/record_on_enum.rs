#![allow(dead_code)]

#[derive(unisql::Record)]
#[record(table = "colors")]
enum Color {
    Red,
    Green,
}

fn main() {}
