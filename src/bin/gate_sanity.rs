//! Gate engine sanity runner exercising the full edit/lookup/gate cycle
//!
//! This binary wires two field monitors to a collector and replays a short
//! scan session: a concurrent pair of edits (passing barcode plus vacuous
//! optional field), a used item, an unknown barcode, and a recovery. By
//! default lookups are served from a canned in-process client; set
//! TAGGATE_LOOKUP_URL to point the run at a real tracking service instead.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio_stream::StreamExt;
use tracing::info;

use taggate::application::{
    FieldMonitor, GateEventChannel, InfoPanel, TracingPanel, ValidationCollector,
};
use taggate::domain::qcable::{Qcable, QcableState};
use taggate::domain::rules::{FieldContext, RuleChain};
use taggate::domain::template::{TagTemplate, TemplateCatalog};
use taggate::infrastructure::config::ConfigManager;
use taggate::infrastructure::lookup::{HttpLookupClient, LookupClient, LookupError};

/// In-process lookup client serving canned responses with a little latency.
struct CannedLookupClient {
    responses: HashMap<String, Result<Qcable, LookupError>>,
}

impl CannedLookupClient {
    fn new() -> Self {
        let mut responses = HashMap::new();
        responses.insert("TG-100".to_string(), Ok(plate("TG-100", "available", "T1")));
        responses.insert("TG-200".to_string(), Ok(plate("TG-200", "available", "T2")));
        responses.insert("TG-USED".to_string(), Ok(plate("TG-USED", "used", "T1")));
        Self { responses }
    }
}

#[async_trait::async_trait]
impl LookupClient for CannedLookupClient {
    async fn lookup(&self, barcode: &str) -> Result<Qcable, LookupError> {
        tokio::time::sleep(Duration::from_millis(25)).await;
        self.responses.get(barcode).cloned().unwrap_or_else(|| {
            Err(LookupError::Rejected(format!(
                "No QCable found with barcode {barcode}."
            )))
        })
    }
}

fn plate(barcode: &str, state: &str, template_id: &str) -> Qcable {
    Qcable {
        identifier: barcode.to_string(),
        state: QcableState::from(state),
        template_id: template_id.to_string(),
        display_type: "Tag Plate".to_string(),
        lot_number: "LOT-2208".to_string(),
        tag_layout_name: "Layout 96".to_string(),
        asset_id: None,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = taggate::infrastructure::logging::init_logging();
    taggate::infrastructure::logging::log_system_info();

    info!("🚀 Gate sanity runner starting");

    let manager = ConfigManager::new()?;
    let mut config = manager.load_config().await?;
    if let Ok(url) = std::env::var("TAGGATE_LOOKUP_URL") {
        config.lookup.base_url = url;
    }

    let client: Arc<dyn LookupClient> = if std::env::var("TAGGATE_LOOKUP_URL").is_ok() {
        info!("🌐 Using live lookup service at {}", config.lookup.base_url);
        Arc::new(HttpLookupClient::new(&config.lookup)?)
    } else {
        info!("Using canned in-process lookup responses");
        Arc::new(CannedLookupClient::new())
    };

    // Catalog: T1 is dual-index capable, T2 is single-index only.
    let catalog = Arc::new(TemplateCatalog::from_entries([
        TagTemplate::new("T1", true, false, true),
        TagTemplate::new("T2", true, false, false),
    ]));

    let (events, mut summaries) = GateEventChannel::unbounded();
    let collector = ValidationCollector::new(Arc::new(events));

    // Drain gate summaries concurrently, the way a UI layer would.
    tokio::spawn(async move {
        while let Some(summary) = summaries.next().await {
            info!(
                ready = summary.ready,
                blocking = ?summary.blocking,
                "🚦 {}",
                summary.summary
            );
        }
    });

    let rules = Arc::new(RuleChain::tag_plate());
    let mut plate_a = FieldMonitor::new(
        "plate_a",
        FieldContext::new(true, true, Arc::clone(&catalog)),
        Arc::clone(&rules),
        Arc::clone(&client),
        Arc::new(TracingPanel::new("plate_a")) as Arc<dyn InfoPanel>,
        collector.register("plate_a"),
    );
    let mut plate_b = FieldMonitor::new(
        "plate_b",
        FieldContext::new(false, true, Arc::clone(&catalog)),
        Arc::clone(&rules),
        Arc::clone(&client),
        Arc::new(TracingPanel::new("plate_b")) as Arc<dyn InfoPanel>,
        collector.register("plate_b"),
    );
    if let Some(seconds) = config.lookup.field_timeout_seconds {
        let bound = Duration::from_secs(seconds);
        plate_a = plate_a.with_lookup_timeout(bound);
        plate_b = plate_b.with_lookup_timeout(bound);
    }

    info!("📋 Scenario 1: both fields edited concurrently (scan + empty optional)");
    futures::future::join(plate_a.on_edit("TG-100"), plate_b.on_edit("")).await;
    info!(ready = collector.is_ready(), "gate after scenario 1");

    info!("📋 Scenario 2: already-used item closes the gate");
    plate_a.on_edit("TG-USED").await;
    info!(ready = collector.is_ready(), "gate after scenario 2");

    info!("📋 Scenario 3: unknown barcode is rejected by the service");
    plate_a.on_edit("TG-404").await;
    info!(ready = collector.is_ready(), "gate after scenario 3");

    info!("📋 Scenario 4: rescanning a suitable barcode reopens the gate");
    plate_a.on_edit("TG-100").await;

    let final_state = collector.gate_state();
    info!(
        ready = final_state.ready,
        blocking = ?final_state.blocking,
        "final gate state"
    );
    for snapshot in [plate_a.snapshot().await, plate_b.snapshot().await] {
        info!(
            field = %snapshot.label,
            status = %snapshot.status,
            messages = ?snapshot.messages,
            "final field state"
        );
    }

    // Give the summary drain a moment to flush.
    tokio::time::sleep(Duration::from_millis(50)).await;
    info!("🏁 Gate sanity run finished");
    Ok(())
}
