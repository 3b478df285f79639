#![allow(dead_code)]

use brushwork_bridge::{Bridge, BridgeConfig, MemoryTransport, OutboundMessage, RecordingHost};
use brushwork_table::{ColumnSchema, Table, Value};
use serde_json::Value as JsonValue;

pub type TestBridge = Bridge<MemoryTransport, RecordingHost>;

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

/// The `price` and `qty` columns of `table`.
pub fn price_qty(table: &Table) -> Table {
    let price = table.column_idx("price").unwrap();
    let qty = table.column_idx("qty").unwrap();
    Table::from_rows(
        vec![ColumnSchema::numeric("price"), ColumnSchema::numeric("qty")],
        table
            .rows()
            .iter()
            .map(|row| vec![row[price].clone(), row[qty].clone()]),
    )
    .unwrap()
}

pub struct Harness {
    pub bridge: TestBridge,
    pub transport: MemoryTransport,
    pub host: RecordingHost,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    pub fn with_config(config: BridgeConfig) -> Self {
        let transport = MemoryTransport::new();
        let host = RecordingHost::new();
        let bridge = Bridge::new(transport.clone(), host.clone(), config);
        Self {
            bridge,
            transport,
            host,
        }
    }

    /// Harness with `sales` registered and the start-up messages discarded.
    pub fn with_sales() -> Self {
        let mut harness = Self::new();
        harness.bridge.register_table("sales", sales()).unwrap();
        harness.transport.take();
        harness
    }

    pub fn take(&self) -> Vec<OutboundMessage> {
        self.transport.take()
    }
}

pub fn record_ids(records: &[JsonValue]) -> Vec<f64> {
    records
        .iter()
        .filter_map(|record| record["id"].as_f64())
        .collect()
}
