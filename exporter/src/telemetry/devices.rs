//! Device type dispatch
//!
//! Each supported device type registers a handler that parses the device's
//! trait payload and updates its metric series. Adding a device type means
//! registering another handler; the poller does not change.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use crate::errors::ExporterError;
use crate::sdm::models::Device;
use crate::telemetry::metrics::{DeviceLabels, Metrics};
use crate::telemetry::traits::ThermostatTraits;

pub const THERMOSTAT_TYPE: &str = "sdm.devices.types.THERMOSTAT";

/// Parses and records one device type
pub trait DeviceHandler: Send + Sync {
    /// Type tag handled, e.g. [`THERMOSTAT_TYPE`]
    fn device_type(&self) -> &'static str;

    /// Parse the device traits and set its series
    fn record(&self, device: &Device, metrics: &Metrics) -> Result<(), ExporterError>;
}

/// Type tag to handler mapping
pub struct DeviceRegistry {
    handlers: HashMap<&'static str, Box<dyn DeviceHandler>>,
}

impl DeviceRegistry {
    /// A registry without any handlers
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register `handler`, replacing any handler for the same type
    pub fn register(&mut self, handler: impl DeviceHandler + 'static) {
        self.handlers
            .insert(handler.device_type(), Box::new(handler));
    }

    pub fn get(&self, device_type: &str) -> Option<&dyn DeviceHandler> {
        self.handlers.get(device_type).map(|handler| handler.as_ref())
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(ThermostatHandler);
        registry
    }
}

/// Current thermostat values as exported
#[derive(Debug, Clone, PartialEq)]
pub struct ThermostatReading {
    pub ambient_temperature_celsius: f64,
    pub heat_celsius: f64,
    pub cool_celsius: f64,
    pub humidity_percent: f64,
    pub fan: f64,
    pub hvac: f64,
}

impl From<&ThermostatTraits> for ThermostatReading {
    fn from(traits: &ThermostatTraits) -> Self {
        Self {
            ambient_temperature_celsius: traits.temperature.ambient_temperature_celsius,
            heat_celsius: traits.temperature_setpoint.heat_celsius,
            cool_celsius: traits.temperature_setpoint.cool_celsius,
            humidity_percent: traits.humidity.ambient_humidity_percent,
            fan: fan_status_value(&traits.fan.timer_mode),
            hvac: hvac_status_value(&traits.thermostat_hvac.status),
        }
    }
}

/// Fan timer mode: `ON` is 1, anything else 0
pub fn fan_status_value(timer_mode: &str) -> f64 {
    if timer_mode == "ON" {
        1.0
    } else {
        0.0
    }
}

/// HVAC status: `HEATING` is 1, `COOLING` is -1, anything else 0.
///
/// `OFF` and unrecognised statuses share 0.
pub fn hvac_status_value(status: &str) -> f64 {
    match status {
        "HEATING" => 1.0,
        "COOLING" => -1.0,
        "OFF" => 0.0,
        other => {
            debug!("Unrecognised HVAC status {:?}, exporting as OFF", other);
            0.0
        }
    }
}

/// Handler for `sdm.devices.types.THERMOSTAT`
pub struct ThermostatHandler;

impl ThermostatHandler {
    pub fn parse(device: &Device) -> Result<(DeviceLabels, ThermostatReading), ExporterError> {
        let traits = parse_traits(&device.traits)?;

        let labels = DeviceLabels {
            custom_name: traits.info.custom_name.clone(),
            name: device.name.clone(),
            room: device.room().to_string(),
            device_type: device.device_type.clone(),
        };

        Ok((labels, ThermostatReading::from(&traits)))
    }

    pub fn update(metrics: &Metrics, labels: &DeviceLabels, reading: &ThermostatReading) {
        let values = labels.values();
        let gauges = &metrics.thermostat;

        gauges
            .ambient_temperature
            .with_label_values(&values)
            .set(reading.ambient_temperature_celsius);
        gauges
            .heat_setpoint
            .with_label_values(&values)
            .set(reading.heat_celsius);
        gauges
            .cool_setpoint
            .with_label_values(&values)
            .set(reading.cool_celsius);
        gauges
            .humidity
            .with_label_values(&values)
            .set(reading.humidity_percent);
        gauges.fan.with_label_values(&values).set(reading.fan);
        gauges.hvac.with_label_values(&values).set(reading.hvac);
    }
}

impl DeviceHandler for ThermostatHandler {
    fn device_type(&self) -> &'static str {
        THERMOSTAT_TYPE
    }

    fn record(&self, device: &Device, metrics: &Metrics) -> Result<(), ExporterError> {
        let (labels, reading) = Self::parse(device)?;
        Self::update(metrics, &labels, &reading);
        Ok(())
    }
}

fn parse_traits(traits: &serde_json::Value) -> Result<ThermostatTraits, ExporterError> {
    if traits.is_null() {
        return Ok(ThermostatTraits::default());
    }
    Ok(ThermostatTraits::deserialize(traits)?)
}
