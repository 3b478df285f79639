#![allow(dead_code)]

use brushwork_table::{ColumnSchema, Table, Value};

pub fn sales() -> Table {
    Table::from_rows(
        vec![
            ColumnSchema::numeric("id"),
            ColumnSchema::categorical("region"),
            ColumnSchema::numeric("revenue"),
            ColumnSchema::numeric("price"),
            ColumnSchema::numeric("qty"),
        ],
        vec![
            vec![1.into(), "west".into(), 100.0.into(), 10.0.into(), 5.0.into()],
            vec![2.into(), "east".into(), 250.0.into(), 25.0.into(), 10.0.into()],
            vec![3.into(), "north".into(), 80.0.into(), 40.0.into(), 2.0.into()],
            vec![4.into(), "west".into(), 300.0.into(), 50.0.into(), 6.0.into()],
            vec![5.into(), "south".into(), Value::Null, 30.0.into(), 1.0.into()],
            vec![6.into(), "east".into(), 120.0.into(), 12.0.into(), 100.0.into()],
            vec![7.into(), "west".into(), 90.0.into(), 49.9.into(), 99.0.into()],
        ],
    )
    .unwrap()
}

pub fn ids(table: &Table) -> Vec<f64> {
    table
        .column_values("id")
        .unwrap()
        .filter_map(Value::as_f64)
        .collect()
}
