//! Prometheus metric series
//!
//! All series live in an explicitly constructed registry owned by the
//! application and shared by reference with the poller and the `/metrics`
//! handler.

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

use crate::errors::ExporterError;

/// Metric namespace, prefixed to every series name
pub const NAMESPACE: &str = "sdm";

/// Label names identifying a device series
pub const DEVICE_LABELS: [&str; 4] = ["CustomName", "Name", "Room", "Type"];

/// Label values identifying a device series
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceLabels {
    pub custom_name: String,
    pub name: String,
    pub room: String,
    pub device_type: String,
}

impl DeviceLabels {
    /// Values in [`DEVICE_LABELS`] order
    pub fn values(&self) -> [&str; 4] {
        [&self.custom_name, &self.name, &self.room, &self.device_type]
    }
}

fn device_gauge(registry: &Registry, name: &str, help: &str) -> Result<GaugeVec, ExporterError> {
    let gauge = GaugeVec::new(Opts::new(name, help).namespace(NAMESPACE), &DEVICE_LABELS)?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

/// Thermostat gauges
pub struct ThermostatGauges {
    pub ambient_temperature: GaugeVec,
    pub heat_setpoint: GaugeVec,
    pub cool_setpoint: GaugeVec,
    pub humidity: GaugeVec,
    pub fan: GaugeVec,
    pub hvac: GaugeVec,
}

impl ThermostatGauges {
    fn register(registry: &Registry) -> Result<Self, ExporterError> {
        Ok(Self {
            ambient_temperature: device_gauge(
                registry,
                "thermostat_temperature_ambientTemperatureCelsius",
                "Temperature in degrees Celsius, measured at the device.",
            )?,
            heat_setpoint: device_gauge(
                registry,
                "thermostat_thermostatTemperatureSetpoint_heatCelsius",
                "Target temperature in Celsius for thermostat HEAT and HEATCOOL modes.",
            )?,
            cool_setpoint: device_gauge(
                registry,
                "thermostat_thermostatTemperatureSetpoint_coolCelsius",
                "Target temperature in Celsius for thermostat COOL and HEATCOOL modes.",
            )?,
            // https://developers.google.com/nest/device-access/traits/device/fan
            fan: device_gauge(
                registry,
                "thermostat_thermostatFan",
                "Thermostat fan status 0 (OFF) - 1 (ON)",
            )?,
            // https://developers.google.com/nest/device-access/traits/device/thermostat-hvac
            hvac: device_gauge(
                registry,
                "thermostat_thermostatHVAC",
                "Thermostat HVAC status -1 (COOLING) 0 (OFF) - 1 (HEATING)",
            )?,
            humidity: device_gauge(
                registry,
                "thermostat_humidity_ambientHumidityPercent",
                "Percent humidity, measured at the device.",
            )?,
        })
    }
}

/// Exporter metrics
pub struct Metrics {
    registry: Registry,
    pub thermostat: ThermostatGauges,
}

impl Metrics {
    pub fn new() -> Result<Self, ExporterError> {
        let registry = Registry::new();
        let thermostat = ThermostatGauges::register(&registry)?;
        Ok(Self {
            registry,
            thermostat,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Number of label sets recorded across all series
    pub fn series_count(&self) -> usize {
        self.registry
            .gather()
            .iter()
            .map(|family| family.get_metric().len())
            .sum()
    }

    /// Render the registry in the Prometheus text format
    pub fn encode(&self) -> Result<String, ExporterError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| ExporterError::Internal(e.to_string()))
    }
}
