// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of user IO pads a pin slice may cover.
const IO_PADS: u32 = 38;

pub const SCHEMA_VERSION: &str = "1.0";

/// Default schema version for YAML configs
fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

fn default_name() -> String {
    "integration".to_string()
}

fn default_clock_period_ns() -> u64 {
    10
}

fn default_reset_settle_ns() -> u64 {
    100
}

fn default_ack_timeout_cycles() -> u32 {
    100
}

fn default_decode_window_cycles() -> u32 {
    10
}

/// Clock, reset and handshake bounds for a harness run.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TimingConfig {
    #[serde(default = "default_clock_period_ns")]
    pub clock_period_ns: u64,
    /// Applied twice: while reset is held and again after release.
    #[serde(default = "default_reset_settle_ns")]
    pub reset_settle_ns: u64,
    #[serde(default = "default_ack_timeout_cycles")]
    pub ack_timeout_cycles: u32,
    #[serde(default = "default_decode_window_cycles")]
    pub decode_window_cycles: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            clock_period_ns: default_clock_period_ns(),
            reset_settle_ns: default_reset_settle_ns(),
            ack_timeout_cycles: default_ack_timeout_cycles(),
            decode_window_cycles: default_decode_window_cycles(),
        }
    }
}

fn default_spi_base() -> u32 {
    0x3000_0000
}

fn default_spi_stride() -> String {
    "256B".to_string()
}

fn default_i3c_base() -> u32 {
    0x3000_1000
}

fn default_gpio_base() -> u32 {
    0x3000_2000
}

fn default_window() -> String {
    "4KiB".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AddressMapConfig {
    #[serde(default = "default_spi_base")]
    pub spi_base: u32,
    /// Distance between SPI instances; also the size of each SPI window.
    #[serde(default = "default_spi_stride")]
    pub spi_stride: String, // e.g. "256B"
    #[serde(default = "default_i3c_base")]
    pub i3c_base: u32,
    #[serde(default = "default_window")]
    pub i3c_size: String,
    #[serde(default = "default_gpio_base")]
    pub gpio_base: u32,
    #[serde(default = "default_window")]
    pub gpio_size: String,
}

impl Default for AddressMapConfig {
    fn default() -> Self {
        Self {
            spi_base: default_spi_base(),
            spi_stride: default_spi_stride(),
            i3c_base: default_i3c_base(),
            i3c_size: default_window(),
            gpio_base: default_gpio_base(),
            gpio_size: default_window(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum OpConfig {
    Write { register: String, value: u32 },
    Read { register: String },
}

/// One scenario step as written in a harness script.
///
/// Register names are plain strings here (`"spi0.cfg"`); they are resolved
/// against the address map when the scenario is built.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum StepConfig {
    Transactions {
        name: String,
        ops: Vec<OpConfig>,
    },
    DecodeProbe {
        name: String,
        address: u32,
        #[serde(default)]
        window_cycles: Option<u32>,
    },
    SampleIrq {
        name: String,
    },
    SamplePins {
        name: String,
        shift: u32,
        width: u32,
    },
}

impl StepConfig {
    pub fn name(&self) -> &str {
        match self {
            StepConfig::Transactions { name, .. }
            | StepConfig::DecodeProbe { name, .. }
            | StepConfig::SampleIrq { name }
            | StepConfig::SamplePins { name, .. } => name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub address_map: AddressMapConfig,
    /// Replaces the built-in scenario when present.
    #[serde(default)]
    pub scenario: Option<Vec<StepConfig>>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            name: default_name(),
            timing: TimingConfig::default(),
            address_map: AddressMapConfig::default(),
            scenario: None,
        }
    }
}

impl HarnessConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read harness config at {:?}", path.as_ref()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).context("Failed to parse Harness Config YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != SCHEMA_VERSION {
            anyhow::bail!(
                "Unsupported schema_version '{}'. Supported versions: '{}'",
                self.schema_version,
                SCHEMA_VERSION
            );
        }

        let timing = &self.timing;
        if timing.clock_period_ns == 0 {
            anyhow::bail!("Timing 'clock_period_ns' must be greater than zero");
        }
        if timing.ack_timeout_cycles == 0 {
            anyhow::bail!("Timing 'ack_timeout_cycles' must be greater than zero");
        }
        if timing.decode_window_cycles == 0
            || timing.decode_window_cycles >= timing.ack_timeout_cycles
        {
            anyhow::bail!(
                "Timing 'decode_window_cycles' ({}) must be non-zero and shorter than 'ack_timeout_cycles' ({})",
                timing.decode_window_cycles,
                timing.ack_timeout_cycles
            );
        }

        if let Some(steps) = &self.scenario {
            for step in steps {
                if step.name().trim().is_empty() {
                    anyhow::bail!("Scenario step names cannot be empty");
                }
                match step {
                    StepConfig::Transactions { name, ops } if ops.is_empty() => {
                        anyhow::bail!("Step '{}' has no transactions", name);
                    }
                    StepConfig::DecodeProbe {
                        name,
                        window_cycles: Some(window),
                        ..
                    } if *window == 0 || *window >= timing.ack_timeout_cycles => {
                        anyhow::bail!(
                            "Step '{}': window_cycles ({}) must be non-zero and shorter than 'ack_timeout_cycles' ({})",
                            name,
                            window,
                            timing.ack_timeout_cycles
                        );
                    }
                    StepConfig::SamplePins { name, shift, width }
                        if *width == 0
                            || *width > 32
                            || shift.checked_add(*width).map_or(true, |end| end > IO_PADS) =>
                    {
                        anyhow::bail!(
                            "Step '{}': pin slice [{}+:{}] does not fit the {} user IO pads",
                            name,
                            shift,
                            width,
                            IO_PADS
                        );
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }
}

pub fn parse_size(size_str: &str) -> Result<u64> {
    use human_size::{Byte, Size, SpecificSize};
    let s: Size = size_str
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid size format: {}", e))?;
    let bytes: SpecificSize<Byte> = s.into();
    Ok(bytes.value() as u64)
}
