//! Device telemetry polling

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::sdm::client::DeviceApi;
use crate::sdm::lifecycle::{ClientCell, Readiness};
use crate::telemetry::devices::DeviceRegistry;
use crate::telemetry::metrics::Metrics;

/// Result of a single poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No client yet, nothing was done
    NotReady,

    /// Listing the devices failed
    ListFailed,

    /// Devices were listed and dispatched
    Polled { recorded: usize, skipped: usize },
}

/// Lists devices through the live client and records their telemetry
pub struct Poller<C> {
    project_id: String,
    cell: Arc<ClientCell<C>>,
    devices: DeviceRegistry,
    metrics: Arc<Metrics>,
}

impl<C: DeviceApi + 'static> Poller<C> {
    pub fn new(
        project_id: impl Into<String>,
        cell: Arc<ClientCell<C>>,
        devices: DeviceRegistry,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            cell,
            devices,
            metrics,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.cell.is_ready()
    }

    /// Poll every device once
    pub async fn tick(&self) -> TickOutcome {
        let Some(client) = self.cell.current() else {
            debug!("No authorized client yet, skipping poll");
            return TickOutcome::NotReady;
        };

        let devices = match client.list_devices(&self.project_id).await {
            Ok(devices) => devices,
            Err(e) => {
                error!("Unable to get devices: {}", e);
                return TickOutcome::ListFailed;
            }
        };

        let mut recorded = 0;
        let mut skipped = 0;

        for device in &devices {
            let Some(handler) = self.devices.get(&device.device_type) else {
                warn!("Unknown device type: {}", device.device_type);
                skipped += 1;
                continue;
            };

            match handler.record(device, &self.metrics) {
                Ok(()) => recorded += 1,
                Err(e) => {
                    error!("Unable to parse traits of device {}: {}", device.name, e);
                    skipped += 1;
                }
            }
        }

        debug!(
            "Polled {} devices ({} recorded, {} skipped)",
            devices.len(),
            recorded,
            skipped
        );
        TickOutcome::Polled { recorded, skipped }
    }
}
