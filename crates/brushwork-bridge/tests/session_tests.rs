mod common;

use brushwork_bridge::session::serve;
use brushwork_bridge::{
    Bridge, BridgeConfig, ChannelTransport, NotificationStyle, OutboundMessage, RecordingHost,
};
use brushwork_engine::SelectionPredicate;
use common::{sales, Harness};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::mpsc;

#[tokio::test]
async fn serve_handles_messages_in_order_until_closed() {
    let mut harness = Harness::with_sales();
    harness
        .bridge
        .tick("sales", SelectionPredicate::categorical("region", ["north"]))
        .unwrap();
    harness.take();

    let (sender, receiver) = mpsc::unbounded_channel();
    sender
        .send(json!({"command": "add_selection", "df_name": "sales"}))
        .unwrap();
    sender.send(json!({"command": "unknown-xyz"})).unwrap();
    sender
        .send(json!({"command": "add_selection", "df_name": "sales"}))
        .unwrap();
    drop(sender);

    let handled = serve(&mut harness.bridge, receiver).await;
    assert_eq!(handled, 3);
    assert_eq!(
        harness.take(),
        vec![
            OutboundMessage::Custom {
                message_type: "add-selection".to_string(),
                value: "region_north_north".to_string(),
            },
            OutboundMessage::Notification {
                style: NotificationStyle::Debug,
                value: "Command unknown-xyz not handled!".to_string(),
            },
            OutboundMessage::Custom {
                message_type: "add-selection".to_string(),
                value: "region_north_north_1".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn channel_transport_forwards_outbound_messages() {
    let (sender, mut outbound) = mpsc::unbounded_channel();
    let config = BridgeConfig {
        instance_name: "brush".to_string(),
        ..BridgeConfig::default()
    };
    let mut bridge = Bridge::new(ChannelTransport::new(sender), RecordingHost::new(), config);
    bridge.register_table("sales", sales()).unwrap();

    let handshake = outbound.recv().await.unwrap();
    assert_eq!(
        handshake.to_json(),
        json!({"type": "midas_instance_name", "value": "brush"})
    );
    let profile = outbound.recv().await.unwrap();
    assert_eq!(profile.message_type(), "profiler");
}

#[tokio::test]
async fn selection_stream_follows_ticks_made_through_the_bridge() {
    let mut harness = Harness::with_sales();
    let mut stream = harness.bridge.selection_stream("sales").unwrap();
    harness
        .bridge
        .tick("sales", SelectionPredicate::range_1d("qty", 1.0, 10.0))
        .unwrap();

    let event = stream.next().await.unwrap();
    assert_eq!(event.index, 0);
    assert_eq!(event.predicate.columns(), vec!["qty"]);
    assert!(harness.bridge.unbind(stream.binding()));
}
