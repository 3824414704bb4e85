//! Thermostat trait payloads
//!
//! See https://developers.google.com/nest/device-access/traits. Every trait is
//! optional in the API response (a thermostat in OFF mode has no setpoint), so
//! missing traits decode to their default values.

use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThermostatTraits {
    #[serde(rename = "sdm.devices.traits.Info")]
    pub info: InfoTrait,

    #[serde(rename = "sdm.devices.traits.Humidity")]
    pub humidity: HumidityTrait,

    #[serde(rename = "sdm.devices.traits.Connectivity")]
    pub connectivity: ConnectivityTrait,

    #[serde(rename = "sdm.devices.traits.Fan")]
    pub fan: FanTrait,

    #[serde(rename = "sdm.devices.traits.ThermostatMode")]
    pub thermostat_mode: ThermostatModeTrait,

    #[serde(rename = "sdm.devices.traits.ThermostatEco")]
    pub thermostat_eco: ThermostatEcoTrait,

    #[serde(rename = "sdm.devices.traits.ThermostatHvac")]
    pub thermostat_hvac: ThermostatHvacTrait,

    #[serde(rename = "sdm.devices.traits.Settings")]
    pub settings: SettingsTrait,

    #[serde(rename = "sdm.devices.traits.ThermostatTemperatureSetpoint")]
    pub temperature_setpoint: TemperatureSetpointTrait,

    #[serde(rename = "sdm.devices.traits.Temperature")]
    pub temperature: TemperatureTrait,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InfoTrait {
    pub custom_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HumidityTrait {
    pub ambient_humidity_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConnectivityTrait {
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FanTrait {
    pub timer_mode: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThermostatModeTrait {
    pub mode: String,
    pub available_modes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThermostatEcoTrait {
    pub available_modes: Vec<String>,
    pub mode: String,
    pub heat_celsius: f64,
    pub cool_celsius: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThermostatHvacTrait {
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsTrait {
    pub temperature_scale: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TemperatureSetpointTrait {
    pub heat_celsius: f64,
    pub cool_celsius: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TemperatureTrait {
    pub ambient_temperature_celsius: f64,
}
