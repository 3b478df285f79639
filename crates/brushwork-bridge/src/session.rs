//! Async front for a [`Bridge`]: one ordered inbound queue, one handler at a time.

use crate::bridge::Bridge;
use crate::host::NotebookHost;
use crate::transport::Transport;
use serde_json::Value as JsonValue;
use tokio::sync::mpsc::UnboundedReceiver;

/// Handles inbound messages in receipt order until every sender is dropped.
///
/// Each message is handled to completion before the next one is read, so predicates for a
/// table are applied in the order the client sent them. Returns the number of messages handled.
pub async fn serve<T, H>(bridge: &mut Bridge<T, H>, mut inbound: UnboundedReceiver<JsonValue>) -> usize
where
    T: Transport,
    H: NotebookHost,
{
    let mut handled = 0;
    while let Some(message) = inbound.recv().await {
        bridge.handle_message(&message);
        handled += 1;
    }
    log::debug!("inbound channel closed after {handled} message(s)");
    handled
}
