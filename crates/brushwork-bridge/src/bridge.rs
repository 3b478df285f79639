use crate::chart::{table_records, ChartSynthesizer, FilterLabel, VegaLiteSynthesizer};
use crate::codegen::{
    annotate_cell, assignment_targets, distribution_query, show_invocation,
};
use crate::config::BridgeConfig;
use crate::encoding::{infer_encoding, EncodingSpec};
use crate::error::{BridgeError, BridgeResult};
use crate::host::NotebookHost;
use crate::protocol::{decode_inbound, InboundMessage, NotificationStyle, OutboundMessage};
use crate::selection::{interpret_selection, parse_raw_selection};
use crate::transport::Transport;
use brushwork_engine::{
    describe, BindingId, CancellationToken, CurrentSelection, Derivation, RegistryEvent,
    SelectionEngine, SelectionMode, SelectionPredicate, SelectionStream, ShelfEntry, TableHandle,
    TickContext, TickOutput, TickReport,
};
use brushwork_table::Table;
use chrono::Local;
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;

/// Owns the engine and keeps the client in sync with it.
///
/// Every public operation runs to completion before returning, sending whatever messages it
/// produces on the way. Message handling never fails: errors become notifications.
pub struct Bridge<T, H> {
    engine: SelectionEngine,
    transport: T,
    host: H,
    config: BridgeConfig,
    synthesizer: Box<dyn ChartSynthesizer + Send>,
    /// Encoding of every table that has a chart.
    vis_spec: HashMap<String, EncodingSpec>,
}

impl<T: Transport, H: NotebookHost> Bridge<T, H> {
    /// Creates the bridge and sends the instance-name handshake.
    pub fn new(transport: T, host: H, config: BridgeConfig) -> Self {
        let mut bridge = Self {
            engine: SelectionEngine::new(),
            transport,
            host,
            config,
            synthesizer: Box::new(VegaLiteSynthesizer),
            vis_spec: HashMap::new(),
        };
        bridge.send_instance_name();
        bridge
    }

    pub fn with_synthesizer(mut self, synthesizer: impl ChartSynthesizer + Send + 'static) -> Self {
        self.synthesizer = Box::new(synthesizer);
        self
    }

    pub fn engine(&self) -> &SelectionEngine {
        &self.engine
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Encoding of the chart last rendered for `table`.
    pub fn encoding(&self, table: &str) -> Option<&EncodingSpec> {
        self.vis_spec.get(table)
    }

    // ---- programmatic surface ----

    /// Registers a base table; the client receives its column profile.
    pub fn register_table(&mut self, name: &str, table: Table) -> BridgeResult<TableHandle> {
        let handle = self.engine.register_table(name, table)?;
        self.flush_events();
        Ok(handle)
    }

    /// Registers a derived table; the client receives a chart when one can be inferred.
    pub fn register_derived(&mut self, handle: TableHandle) -> BridgeResult<()> {
        self.engine.register_derived(handle)?;
        self.flush_events();
        Ok(())
    }

    /// Swaps the contents of a table, keeping its selection history.
    pub fn replace_table(&mut self, handle: TableHandle) -> BridgeResult<()> {
        self.engine.replace_handle(handle)?;
        self.flush_events();
        Ok(())
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.engine.has_table(name)
    }

    pub fn bind<F>(&mut self, table: &str, callback: F) -> BridgeResult<BindingId>
    where
        F: FnMut(&TickContext<'_>) -> anyhow::Result<TickOutput> + Send + 'static,
    {
        Ok(self.engine.bind(table, callback)?)
    }

    pub fn bind_derived(&mut self, target: &str, derivation: Derivation) -> BridgeResult<BindingId> {
        Ok(self.engine.bind_derived(target, derivation)?)
    }

    pub fn unbind(&mut self, id: BindingId) -> bool {
        self.engine.unbind(id)
    }

    pub fn current_selection(
        &self,
        table: &str,
        mode: SelectionMode,
    ) -> BridgeResult<Option<CurrentSelection>> {
        Ok(self.engine.current_selection(table, mode)?)
    }

    pub fn selection_stream(&mut self, table: &str) -> BridgeResult<SelectionStream> {
        Ok(self.engine.selection_stream(table)?)
    }

    pub fn tick(&mut self, table: &str, predicate: SelectionPredicate) -> BridgeResult<TickReport> {
        self.tick_with(table, predicate, &CancellationToken::new())
    }

    /// Runs one tick and mirrors its effects to the client.
    ///
    /// The filtered rows of `table` go out as `chart_update_data`, followed by the updates of
    /// every table the callbacks touched. A failed tick is reported as an error notification
    /// and returned; whatever the tick changed before failing is still mirrored.
    pub fn tick_with(
        &mut self,
        table: &str,
        predicate: SelectionPredicate,
        cancel: &CancellationToken,
    ) -> BridgeResult<TickReport> {
        match self.engine.tick_with(table, predicate, cancel) {
            Ok(report) => {
                self.send(OutboundMessage::ChartUpdateData {
                    df_name: table.to_string(),
                    new_data: table_records(&report.filtered, FilterLabel::Filtered),
                });
                self.flush_events();
                Ok(report)
            }
            Err(err) => {
                self.flush_events();
                self.send_user_error(&err.to_string());
                Err(err.into())
            }
        }
    }

    /// Entry point for selections made on a chart.
    ///
    /// `raw` is the JSON payload the chart reports. A cleared selection appends nothing, runs
    /// no callbacks, and resets the chart to the full table.
    pub fn add_selection(&mut self, table: &str, raw: &str) -> BridgeResult<()> {
        log::debug!("selection on {table}: {raw}");
        let encoding = self
            .vis_spec
            .get(table)
            .ok_or_else(|| BridgeError::MissingEncoding(table.to_string()))?;
        let raw = parse_raw_selection(raw)?;
        let predicates = interpret_selection(table, encoding, raw.as_ref())?;

        if predicates.is_empty() {
            let full = table_records(
                self.engine.table_state(table)?.handle().table(),
                FilterLabel::Filtered,
            );
            self.send(OutboundMessage::ChartUpdateData {
                df_name: table.to_string(),
                new_data: full,
            });
            return Ok(());
        }
        for predicate in predicates {
            self.tick(table, predicate)?;
        }
        Ok(())
    }

    pub fn rename_shelf_selection(&mut self, old_name: &str, new_name: &str) -> BridgeResult<()> {
        Ok(self
            .engine
            .registry_mut()
            .shelf_mut()
            .rename(old_name, new_name)?)
    }

    pub fn remove_shelf_selection(&mut self, name: &str) -> BridgeResult<ShelfEntry> {
        Ok(self.engine.registry_mut().shelf_mut().unpin(name)?)
    }

    pub fn navigate_to_chart(&mut self, table: &str) {
        self.send(OutboundMessage::NavigateToVis {
            value: table.to_string(),
        });
    }

    // ---- inbound messages ----

    /// Handles one raw message from the client.
    ///
    /// Unknown or malformed commands become debug notifications and leave all state untouched;
    /// failing commands become error notifications.
    pub fn handle_message(&mut self, raw: &JsonValue) {
        log::debug!("got message {raw}");
        let outcome = decode_inbound(raw).and_then(|message| self.dispatch(message));
        match outcome {
            Ok(()) => {}
            Err(err @ (BridgeError::UnhandledCommand(_) | BridgeError::MalformedMessage(_))) => {
                log::warn!("dropping message: {err}");
                self.send_debug_msg(&err.to_string());
            }
            Err(err) => {
                log::warn!("message failed: {err}");
                self.send_user_error(&err.to_string());
            }
        }
    }

    pub fn dispatch(&mut self, message: InboundMessage) -> BridgeResult<()> {
        match message {
            InboundMessage::RefreshComm => self.refresh(),
            InboundMessage::CellRan { code } => {
                self.cell_ran(&code);
                Ok(())
            }
            InboundMessage::GetCodeClipboard { df_name } => {
                self.get_code_clipboard(&df_name).map(|_| ())
            }
            InboundMessage::ColumnSelected { column, df_name } => {
                self.column_selected(&column, &df_name)
            }
            InboundMessage::AddSelection { df_name } => self.add_to_shelf(&df_name).map(|_| ()),
        }
    }

    /// Re-establishes the transport and repeats the handshake.
    pub fn refresh(&mut self) -> BridgeResult<()> {
        self.send_debug_msg("Refreshing comm");
        self.transport.reconnect()?;
        self.send_instance_name();
        Ok(())
    }

    /// Suggests a chart cell for every charted table the code assigned.
    pub fn cell_ran(&mut self, code: &str) {
        let lines: Vec<String> = assignment_targets(code)
            .into_iter()
            .filter_map(|name| {
                let Some(state) = self.engine.registry().get(&name) else {
                    log::debug!("{name} is not a registered table");
                    return None;
                };
                infer_encoding(state.handle().table())
                    .map(|encoding| show_invocation(&name, &encoding))
            })
            .collect();
        if !lines.is_empty() {
            self.create_cell_with_text(&lines.join("\n"));
        }
    }

    /// Code reproducing the current selection of `table`, also copied to the clipboard.
    ///
    /// Without a selection an error notification is sent and `None` returned.
    pub fn get_code_clipboard(&mut self, table: &str) -> BridgeResult<Option<String>> {
        let state = self.engine.table_state(table)?;
        let Some(predicate) = state.current_selection() else {
            self.send_user_error(&format!("no selection on {table} yet"));
            return Ok(None);
        };
        let code = describe(predicate, table);
        self.host.copy_to_clipboard(&code);
        Ok(Some(code))
    }

    pub fn column_selected(&mut self, column: &str, table: &str) -> BridgeResult<()> {
        let state = self.engine.table_state(table)?;
        let code = distribution_query(table, state.handle().table(), column, self.config.max_bins)?;
        self.create_cell_with_text(&code);
        Ok(())
    }

    /// Pins the current selection of `table` and tells the client its shelf name.
    pub fn add_to_shelf(&mut self, table: &str) -> BridgeResult<String> {
        let name = self.engine.registry_mut().pin_current(table)?;
        self.send(OutboundMessage::Custom {
            message_type: "add-selection".to_string(),
            value: name.clone(),
        });
        Ok(name)
    }

    // ---- outbound ----

    fn flush_events(&mut self) {
        for event in self.engine.drain_events() {
            match event {
                RegistryEvent::Registered {
                    name,
                    is_base: true,
                } => {
                    self.vis_spec.remove(&name);
                    self.create_profile(&name);
                }
                RegistryEvent::Registered {
                    name,
                    is_base: false,
                }
                | RegistryEvent::HandleReplaced { name } => self.visualize(&name),
                RegistryEvent::Removed { name } => {
                    self.vis_spec.remove(&name);
                }
            }
        }
    }

    fn create_profile(&mut self, name: &str) {
        let Some(state) = self.engine.registry().get(name) else {
            return;
        };
        let columns: Vec<JsonValue> = state
            .handle()
            .table()
            .columns()
            .iter()
            .map(|c| json!({ "columnName": c.name, "columnType": c.column_type }))
            .collect();
        let message = OutboundMessage::Profiler {
            df_name: name.to_string(),
            columns: JsonValue::Array(columns).to_string(),
        };
        self.send(message);
    }

    /// Renders a chart for `name` the first time, updates its data afterwards.
    fn visualize(&mut self, name: &str) {
        let Some(state) = self.engine.registry().get(name) else {
            return;
        };
        let table = state.handle().table();
        let message = if self.vis_spec.contains_key(name) {
            OutboundMessage::ChartUpdateData {
                df_name: name.to_string(),
                new_data: table_records(table, FilterLabel::Filtered),
            }
        } else {
            let Some(encoding) = infer_encoding(table) else {
                log::debug!("no chart for {name}");
                return;
            };
            let records = table_records(table, FilterLabel::Overview);
            let vega = self.synthesizer.synthesize(name, &encoding, records);
            self.vis_spec.insert(name.to_string(), encoding);
            OutboundMessage::ChartRender {
                df_name: name.to_string(),
                vega: vega.to_string(),
            }
        };
        self.send(message);
    }

    fn create_cell_with_text(&mut self, code: &str) {
        let code = if self.config.annotate_generated_cells {
            annotate_cell(code, Local::now())
        } else {
            code.to_string()
        };
        self.host.set_next_input(&code);
        if self.config.execute_generated_cells {
            self.send(OutboundMessage::ExecuteCurrentCell);
        }
    }

    fn send_instance_name(&mut self) {
        let value = self.config.instance_name.clone();
        self.send(OutboundMessage::InstanceName { value });
    }

    fn send_user_error(&mut self, message: &str) {
        self.notify(NotificationStyle::Error, message);
    }

    fn send_debug_msg(&mut self, message: &str) {
        self.notify(NotificationStyle::Debug, message);
    }

    fn notify(&mut self, style: NotificationStyle, message: &str) {
        self.send(OutboundMessage::Notification {
            style,
            value: message.to_string(),
        });
    }

    fn send(&mut self, message: OutboundMessage) {
        let kind = message.message_type().to_string();
        if let Err(err) = self.transport.send(message) {
            log::warn!("failed to send {kind}: {err}");
        }
    }
}
