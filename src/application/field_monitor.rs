//! Per-field validation state machine
//!
//! One `FieldMonitor` owns the lifecycle of a single barcode input: it
//! resets on every edit, dispatches the remote lookup, runs the resolved
//! item through the rule chain, and pushes the resulting status to the
//! info panel and the collector.
//!
//! Overlapping completions are handled with a per-field generation counter:
//! every edit bumps the generation and every lookup is tagged with the
//! generation at issue time. A completion mutates the field only while the
//! generations still match, so the response to a superseded lookup is
//! discarded instead of clobbering newer state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::application::collector::MonitorHandle;
use crate::domain::events::{FieldStatus, MonitorId, PanelUpdate};
use crate::domain::qcable::Qcable;
use crate::domain::rules::{FieldContext, RuleChain};
use crate::domain::template::TagTemplate;
use crate::infrastructure::lookup::{LookupClient, LookupError};

/// Sink for per-field display updates.
///
/// Render calls are synchronous, happen on every status change, and each
/// update fully replaces the previous display state. Implementations must
/// be cheap; they run inside the monitor's state critical section.
pub trait InfoPanel: Send + Sync {
    /// Replaces the panel's display state.
    fn render(&self, update: &PanelUpdate);
}

/// Panel implementation that writes updates to the log stream. Useful for
/// headless runs and the sanity binary.
#[derive(Debug, Clone, Default)]
pub struct TracingPanel {
    field: String,
}

impl TracingPanel {
    /// Creates a panel that tags every log line with the field label.
    #[must_use]
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl InfoPanel for TracingPanel {
    fn render(&self, update: &PanelUpdate) {
        match &update.alert {
            Some(alert) => tracing::info!(
                field = %self.field,
                status = %update.status,
                severity = ?alert.severity,
                "{}",
                alert.message
            ),
            None => tracing::debug!(field = %self.field, status = %update.status, "panel cleared"),
        }
    }
}

/// Point-in-time copy of a monitor's state.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MonitorSnapshot {
    /// Monitor identifier.
    pub id: MonitorId,
    /// Field label, as registered with the collector.
    pub label: String,
    /// Current status.
    pub status: FieldStatus,
    /// Current user-facing messages.
    pub messages: Vec<String>,
    /// Item resolved by the most recent completed lookup, if any.
    pub item: Option<Qcable>,
    /// Template resolved for that item; the unknown sentinel until a lookup
    /// resolves.
    pub template: TagTemplate,
}

struct MonitorState {
    generation: u64,
    status: FieldStatus,
    item: Option<Qcable>,
    template: TagTemplate,
    messages: Vec<String>,
}

impl MonitorState {
    fn new() -> Self {
        Self {
            generation: 0,
            status: FieldStatus::Idle,
            item: None,
            template: TagTemplate::unknown().clone(),
            messages: Vec::new(),
        }
    }
}

/// State machine for one barcode field.
///
/// States: `Idle` -> `Pending` -> {`Passed`, `Failed`}, and any state back
/// to `Idle` on edit. Status changes happen only through [`Self::on_edit`]
/// and the completion path it spawns; the rule chain and the collector never
/// mutate a monitor.
pub struct FieldMonitor {
    id: MonitorId,
    label: String,
    context: FieldContext,
    rules: Arc<RuleChain>,
    client: Arc<dyn LookupClient>,
    panel: Arc<dyn InfoPanel>,
    handle: MonitorHandle,
    lookup_timeout: Option<Duration>,
    state: RwLock<MonitorState>,
}

impl FieldMonitor {
    /// Creates a monitor wired to its collector slot, lookup client, and
    /// info panel. Created once per physical input field and kept for the
    /// session.
    #[must_use]
    pub fn new(
        label: impl Into<String>,
        context: FieldContext,
        rules: Arc<RuleChain>,
        client: Arc<dyn LookupClient>,
        panel: Arc<dyn InfoPanel>,
        handle: MonitorHandle,
    ) -> Self {
        Self {
            id: MonitorId::new(),
            label: label.into(),
            context,
            rules,
            client,
            panel,
            handle,
            lookup_timeout: None,
            state: RwLock::new(MonitorState::new()),
        }
    }

    /// Bounds each lookup awaited by this monitor. Without a bound a lookup
    /// that never resolves leaves the field `Pending` and the gate closed
    /// indefinitely. An elapsed bound is reported like a transport failure.
    #[must_use]
    pub fn with_lookup_timeout(mut self, bound: Duration) -> Self {
        self.lookup_timeout = Some(bound);
        self
    }

    /// Monitor identifier.
    #[must_use]
    pub fn id(&self) -> MonitorId {
        self.id
    }

    /// Field label, as registered with the collector.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the field must pass for the gate to open.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.context.required
    }

    /// Handles one edit of the underlying input value, driving the full
    /// reset / lookup / evaluate cycle.
    ///
    /// The reset and the transition out of `Idle` are applied atomically
    /// before the first suspension point, so the gate closes immediately on
    /// every edit. The lookup response is applied only if no further edit
    /// superseded it in the meantime.
    pub async fn on_edit(&self, new_value: &str) {
        let generation = {
            let mut state = self.state.write().await;
            state.generation += 1;
            state.status = FieldStatus::Idle;
            state.item = None;
            state.template = TagTemplate::unknown().clone();
            state.messages.clear();
            self.panel.render(&PanelUpdate::cleared());
            self.handle.update(FieldStatus::Idle);

            if new_value.is_empty() && !self.context.required {
                // Optional field with nothing scanned: vacuous pass, no
                // lookup is issued.
                state.status = FieldStatus::Passed;
                self.panel
                    .render(&PanelUpdate::project(FieldStatus::Passed, &[], None));
                self.handle.update(FieldStatus::Passed);
                tracing::debug!(field = %self.label, "empty optional field passed vacuously");
                return;
            }

            state.status = FieldStatus::Pending;
            self.panel
                .render(&PanelUpdate::project(FieldStatus::Pending, &[], None));
            self.handle.update(FieldStatus::Pending);
            state.generation
        };

        tracing::debug!(field = %self.label, barcode = new_value, generation, "dispatching lookup");
        let result = self.execute_lookup(new_value).await;
        self.apply_lookup(generation, result).await;
    }

    /// Current status of the field.
    pub async fn current_status(&self) -> FieldStatus {
        self.state.read().await.status
    }

    /// Current user-facing messages for the field.
    pub async fn last_messages(&self) -> Vec<String> {
        self.state.read().await.messages.clone()
    }

    /// Full point-in-time copy of the monitor's state.
    pub async fn snapshot(&self) -> MonitorSnapshot {
        let state = self.state.read().await;
        MonitorSnapshot {
            id: self.id,
            label: self.label.clone(),
            status: state.status,
            messages: state.messages.clone(),
            item: state.item.clone(),
            template: state.template.clone(),
        }
    }

    async fn execute_lookup(&self, barcode: &str) -> Result<Qcable, LookupError> {
        match self.lookup_timeout {
            Some(bound) => match tokio::time::timeout(bound, self.client.lookup(barcode)).await {
                Ok(result) => result,
                Err(_) => Err(LookupError::Timeout(bound)),
            },
            None => self.client.lookup(barcode).await,
        }
    }

    /// Applies a completed lookup, unless a newer edit superseded it.
    async fn apply_lookup(&self, generation: u64, result: Result<Qcable, LookupError>) {
        let mut state = self.state.write().await;
        if state.generation != generation {
            tracing::debug!(
                field = %self.label,
                issued = generation,
                current = state.generation,
                "discarding stale lookup response"
            );
            return;
        }

        match result {
            Ok(item) => {
                let template = self.context.catalog.resolve(&item.template_id).clone();
                let outcome = self.rules.evaluate(&item, &template, &self.context);

                let mut messages = Vec::with_capacity(outcome.messages.len() + 1);
                if outcome.valid {
                    messages.push(crate::domain::messages::suitable(&item.display_type));
                    state.status = FieldStatus::Passed;
                    tracing::info!(field = %self.label, barcode = %item.identifier, "✅ field passed validation");
                } else {
                    messages.push(crate::domain::messages::not_suitable(&item.display_type));
                    messages.extend(outcome.messages);
                    state.status = FieldStatus::Failed;
                    tracing::info!(
                        field = %self.label,
                        barcode = %item.identifier,
                        reasons = messages.len() - 1,
                        "❌ field failed validation"
                    );
                }
                state.messages = messages;
                state.item = Some(item);
                state.template = template;
            }
            Err(error) => {
                state.status = FieldStatus::Failed;
                state.messages = vec![error.user_message()];
                state.item = None;
                state.template = TagTemplate::unknown().clone();
                tracing::info!(field = %self.label, %error, "❌ lookup failed");
            }
        }

        self.panel.render(&PanelUpdate::project(
            state.status,
            &state.messages,
            state.item.as_ref(),
        ));
        self.handle.update(state.status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use crate::application::collector::{GateObserver, ValidationCollector};
    use crate::domain::events::{GateSummary, Severity};
    use crate::domain::messages;
    use crate::domain::qcable::QcableState;
    use crate::domain::template::TemplateCatalog;

    struct NullObserver;

    impl GateObserver for NullObserver {
        fn gate_ready(&self, _summary: &GateSummary) {}
        fn gate_blocked(&self, _summary: &GateSummary) {}
    }

    #[derive(Default)]
    struct RecordingPanel {
        updates: Mutex<Vec<PanelUpdate>>,
    }

    impl RecordingPanel {
        fn last(&self) -> PanelUpdate {
            self.updates.lock().unwrap().last().cloned().expect("no panel update")
        }

        fn statuses(&self) -> Vec<FieldStatus> {
            self.updates.lock().unwrap().iter().map(|u| u.status).collect()
        }
    }

    impl InfoPanel for RecordingPanel {
        fn render(&self, update: &PanelUpdate) {
            self.updates.lock().unwrap().push(update.clone());
        }
    }

    #[derive(Default)]
    struct ScriptedClient {
        responses: Mutex<HashMap<String, Result<Qcable, LookupError>>>,
        calls: AtomicUsize,
        hold: Mutex<Option<(String, Arc<Notify>)>>,
    }

    impl ScriptedClient {
        fn respond(self, barcode: &str, response: Result<Qcable, LookupError>) -> Self {
            self.responses.lock().unwrap().insert(barcode.to_string(), response);
            self
        }

        fn hold_barcode(self, barcode: &str) -> (Self, Arc<Notify>) {
            let release = Arc::new(Notify::new());
            *self.hold.lock().unwrap() = Some((barcode.to_string(), Arc::clone(&release)));
            (self, release)
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LookupClient for ScriptedClient {
        async fn lookup(&self, barcode: &str) -> Result<Qcable, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let gate = self
                .hold
                .lock()
                .unwrap()
                .as_ref()
                .filter(|(held, _)| held == barcode)
                .map(|(_, release)| Arc::clone(release));
            if let Some(gate) = gate {
                gate.notified().await;
            }
            self.responses
                .lock()
                .unwrap()
                .get(barcode)
                .cloned()
                .unwrap_or_else(|| Err(LookupError::Transport("no scripted response".to_string())))
        }
    }

    /// Client whose lookups never resolve.
    struct BlackHoleClient;

    #[async_trait]
    impl LookupClient for BlackHoleClient {
        async fn lookup(&self, _barcode: &str) -> Result<Qcable, LookupError> {
            futures::future::pending().await
        }
    }

    fn tag_plate(barcode: &str, state: &str, template_id: &str) -> Qcable {
        Qcable {
            identifier: barcode.to_string(),
            state: QcableState::from(state),
            template_id: template_id.to_string(),
            display_type: "Tag Plate".to_string(),
            lot_number: "LOT-7".to_string(),
            tag_layout_name: "Layout 96".to_string(),
            asset_id: Some("asset-1".to_string()),
        }
    }

    fn dual_catalog() -> Arc<TemplateCatalog> {
        Arc::new(TemplateCatalog::from_entries([TagTemplate::new(
            "T1", true, false, true,
        )]))
    }

    struct Harness {
        monitor: Arc<FieldMonitor>,
        collector: ValidationCollector,
        panel: Arc<RecordingPanel>,
        client: Arc<ScriptedClient>,
    }

    fn harness(
        required: bool,
        dual_index_expected: bool,
        catalog: Arc<TemplateCatalog>,
        client: ScriptedClient,
    ) -> Harness {
        let collector = ValidationCollector::new(Arc::new(NullObserver));
        let panel = Arc::new(RecordingPanel::default());
        let client = Arc::new(client);
        let monitor = Arc::new(FieldMonitor::new(
            "plate_a",
            FieldContext::new(required, dual_index_expected, catalog),
            Arc::new(RuleChain::tag_plate()),
            Arc::clone(&client) as Arc<dyn LookupClient>,
            Arc::clone(&panel) as Arc<dyn InfoPanel>,
            collector.register("plate_a"),
        ));
        Harness {
            monitor,
            collector,
            panel,
            client,
        }
    }

    #[tokio::test]
    async fn monitor_identity_is_stable_across_snapshots() {
        let h = harness(true, true, dual_catalog(), ScriptedClient::default());

        assert_eq!(h.monitor.label(), "plate_a");
        assert!(h.monitor.is_required());

        let snapshot = h.monitor.snapshot().await;
        assert_eq!(snapshot.id, h.monitor.id());
        assert_eq!(snapshot.status, FieldStatus::Idle);
        assert!(!snapshot.status.is_terminal());
    }

    #[tokio::test]
    async fn empty_optional_field_passes_without_lookup() {
        let h = harness(false, false, dual_catalog(), ScriptedClient::default());

        h.monitor.on_edit("").await;

        assert_eq!(h.monitor.current_status().await, FieldStatus::Passed);
        assert!(h.monitor.last_messages().await.is_empty());
        assert_eq!(h.client.calls(), 0);
        assert!(h.collector.is_ready());
    }

    #[tokio::test]
    async fn empty_required_field_never_passes() {
        let h = harness(true, false, dual_catalog(), ScriptedClient::default());

        h.monitor.on_edit("").await;

        assert_eq!(h.monitor.current_status().await, FieldStatus::Failed);
        assert_eq!(
            h.monitor.last_messages().await,
            vec![messages::BARCODE_NOT_FOUND]
        );
        assert_eq!(h.client.calls(), 1);
        assert!(!h.collector.is_ready());
    }

    #[tokio::test]
    async fn suitable_item_passes_with_affirmative_message() {
        let client = ScriptedClient::default()
            .respond("ABC-1", Ok(tag_plate("ABC-1", "available", "T1")));
        let h = harness(true, true, dual_catalog(), client);

        h.monitor.on_edit("ABC-1").await;

        assert_eq!(h.monitor.current_status().await, FieldStatus::Passed);
        assert_eq!(
            h.monitor.last_messages().await,
            vec!["The Tag Plate is suitable."]
        );
        assert!(h.collector.is_ready());

        let last = h.panel.last();
        assert_eq!(last.alert.as_ref().expect("alert").severity, Severity::Success);
        assert!(last.details.is_some());
    }

    #[tokio::test]
    async fn single_index_template_fails_a_dual_indexed_pool() {
        let catalog = Arc::new(TemplateCatalog::from_entries([TagTemplate::new(
            "T1", true, false, false,
        )]));
        let client = ScriptedClient::default()
            .respond("ABC-1", Ok(tag_plate("ABC-1", "available", "T1")));
        let h = harness(true, true, catalog, client);

        h.monitor.on_edit("ABC-1").await;

        assert_eq!(h.monitor.current_status().await, FieldStatus::Failed);
        let msgs = h.monitor.last_messages().await;
        assert_eq!(msgs[0], "The Tag Plate is not suitable.");
        assert!(msgs.contains(&messages::rule::DUAL_INDEX_REQUIRED.to_string()));
        assert!(!h.collector.is_ready());
    }

    #[tokio::test]
    async fn unknown_template_is_reported_as_rule_violations() {
        let client = ScriptedClient::default()
            .respond("ABC-1", Ok(tag_plate("ABC-1", "available", "T-missing")));
        let h = harness(true, false, dual_catalog(), client);

        h.monitor.on_edit("ABC-1").await;

        assert_eq!(h.monitor.current_status().await, FieldStatus::Failed);
        let msgs = h.monitor.last_messages().await;
        assert!(msgs.contains(&messages::rule::UNRECOGNISED_TEMPLATE.to_string()));
        // The resolved item is still shown to the operator.
        assert!(h.panel.last().details.is_some());
    }

    #[tokio::test]
    async fn domain_error_is_surfaced_verbatim() {
        let client = ScriptedClient::default().respond(
            "BAD-1",
            Err(LookupError::Rejected("Barcode BAD-1 belongs to another lab.".to_string())),
        );
        let h = harness(true, false, dual_catalog(), client);

        h.monitor.on_edit("BAD-1").await;

        assert_eq!(h.monitor.current_status().await, FieldStatus::Failed);
        assert_eq!(
            h.monitor.last_messages().await,
            vec!["Barcode BAD-1 belongs to another lab."]
        );
        let last = h.panel.last();
        assert_eq!(last.alert.as_ref().expect("alert").severity, Severity::Danger);
        assert!(last.details.is_none());
    }

    #[tokio::test]
    async fn unexpected_payload_points_at_support() {
        let client = ScriptedClient::default()
            .respond("ODD-1", Err(LookupError::UnexpectedPayload));
        let h = harness(true, false, dual_catalog(), client);

        h.monitor.on_edit("ODD-1").await;

        assert_eq!(
            h.monitor.last_messages().await,
            vec![messages::UNEXPECTED_RESPONSE]
        );
    }

    #[tokio::test]
    async fn transport_failure_collapses_to_not_found() {
        let client = ScriptedClient::default()
            .respond("NET-1", Err(LookupError::Transport("connection refused".to_string())));
        let h = harness(true, false, dual_catalog(), client);

        h.monitor.on_edit("NET-1").await;

        assert_eq!(h.monitor.current_status().await, FieldStatus::Failed);
        assert_eq!(
            h.monitor.last_messages().await,
            vec![messages::BARCODE_NOT_FOUND]
        );
    }

    #[tokio::test]
    async fn edit_resets_the_field_before_the_lookup_completes() {
        let (client, release) = ScriptedClient::default()
            .respond("ABC-1", Ok(tag_plate("ABC-1", "available", "T1")))
            .respond("ABC-2", Ok(tag_plate("ABC-2", "available", "T1")))
            .hold_barcode("ABC-2");
        let h = harness(true, true, dual_catalog(), client);

        h.monitor.on_edit("ABC-1").await;
        assert_eq!(h.monitor.current_status().await, FieldStatus::Passed);
        assert!(h.collector.is_ready());

        let monitor = Arc::clone(&h.monitor);
        let edit = tokio::spawn(async move { monitor.on_edit("ABC-2").await });
        tokio::task::yield_now().await;

        // The reset and the pending transition happened before the lookup
        // resolved; the gate is already closed again.
        assert_eq!(h.monitor.current_status().await, FieldStatus::Pending);
        assert!(!h.collector.is_ready());
        assert!(h.panel.statuses().contains(&FieldStatus::Idle));

        release.notify_one();
        edit.await.expect("edit task");
        assert_eq!(h.monitor.current_status().await, FieldStatus::Passed);
    }

    #[tokio::test]
    async fn superseded_lookup_response_is_discarded() {
        // The first lookup would fail the field; it is held until after a
        // second edit has already passed. Its late response must not win.
        let (client, release) = ScriptedClient::default()
            .respond(
                "OLD-1",
                Err(LookupError::Rejected("stale response applied".to_string())),
            )
            .respond("NEW-1", Ok(tag_plate("NEW-1", "available", "T1")))
            .hold_barcode("OLD-1");
        let h = harness(true, true, dual_catalog(), client);

        let monitor = Arc::clone(&h.monitor);
        let stale_edit = tokio::spawn(async move { monitor.on_edit("OLD-1").await });
        tokio::task::yield_now().await;
        assert_eq!(h.monitor.current_status().await, FieldStatus::Pending);

        h.monitor.on_edit("NEW-1").await;
        assert_eq!(h.monitor.current_status().await, FieldStatus::Passed);

        release.notify_one();
        stale_edit.await.expect("stale edit task");

        assert_eq!(h.monitor.current_status().await, FieldStatus::Passed);
        assert_eq!(
            h.monitor.last_messages().await,
            vec!["The Tag Plate is suitable."]
        );
        assert!(h.collector.is_ready());
        // The discarded response did not touch the panel either.
        assert_eq!(h.panel.last().alert.expect("alert").severity, Severity::Success);
    }

    #[tokio::test]
    async fn bounded_lookup_times_out_into_failure() {
        let collector = ValidationCollector::new(Arc::new(NullObserver));
        let panel = Arc::new(RecordingPanel::default());
        let monitor = FieldMonitor::new(
            "plate_a",
            FieldContext::new(true, false, dual_catalog()),
            Arc::new(RuleChain::tag_plate()),
            Arc::new(BlackHoleClient),
            Arc::clone(&panel) as Arc<dyn InfoPanel>,
            collector.register("plate_a"),
        )
        .with_lookup_timeout(Duration::from_millis(50));

        monitor.on_edit("GONE-1").await;

        assert_eq!(monitor.current_status().await, FieldStatus::Failed);
        assert_eq!(
            monitor.last_messages().await,
            vec![messages::BARCODE_NOT_FOUND]
        );
        assert!(!collector.is_ready());
    }

    #[tokio::test]
    async fn snapshot_reflects_the_resolved_item() {
        let client = ScriptedClient::default()
            .respond("ABC-1", Ok(tag_plate("ABC-1", "available", "T1")));
        let h = harness(true, true, dual_catalog(), client);

        h.monitor.on_edit("ABC-1").await;
        let snapshot = h.monitor.snapshot().await;

        assert_eq!(snapshot.label, "plate_a");
        assert_eq!(snapshot.status, FieldStatus::Passed);
        assert_eq!(snapshot.item.expect("item").identifier, "ABC-1");
        assert_eq!(snapshot.template.id, "T1");
    }
}
