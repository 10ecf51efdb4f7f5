// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use labwired_config::{HarnessConfig, OpConfig, StepConfig};

#[test]
fn test_full_document_parses() {
    let yaml = r#"
schema_version: "1.0"
name: "integration"
timing:
  clock_period_ns: 10
  reset_settle_ns: 100
  ack_timeout_cycles: 100
  decode_window_cycles: 10
address_map:
  spi_base: 0x30000000
  spi_stride: "256B"
  i3c_base: 0x30001000
  i3c_size: "4KiB"
  gpio_base: 0x30002000
  gpio_size: "4KiB"
scenario:
  - transactions:
      name: "SPI0 configuration"
      ops:
        - write: { register: "spi0.cfg", value: 0x00 }
        - write: { register: "spi0.ctrl", value: 0x02 }
        - read: { register: "spi0.status" }
  - decode_probe:
      name: "invalid address"
      address: 0x40000000
  - sample_irq:
      name: "interrupt lines"
  - sample_pins:
      name: "gpio pins"
      shift: 22
      width: 2
"#;
    let config = HarnessConfig::from_yaml(yaml).unwrap();
    assert_eq!(config.address_map.i3c_base, 0x3000_1000);

    let steps = config.scenario.unwrap();
    assert_eq!(steps.len(), 4);
    match &steps[0] {
        StepConfig::Transactions { name, ops } => {
            assert_eq!(name, "SPI0 configuration");
            assert_eq!(
                ops[1],
                OpConfig::Write {
                    register: "spi0.ctrl".to_string(),
                    value: 2
                }
            );
        }
        other => panic!("unexpected first step {:?}", other),
    }
    assert_eq!(
        steps[1],
        StepConfig::DecodeProbe {
            name: "invalid address".to_string(),
            address: 0x4000_0000,
            window_cycles: None,
        }
    );
    assert_eq!(steps[3].name(), "gpio pins");
}

#[test]
fn test_partial_timing_keeps_other_defaults() {
    let yaml = r#"
timing:
  ack_timeout_cycles: 20
"#;
    let config = HarnessConfig::from_yaml(yaml).unwrap();
    assert_eq!(config.timing.ack_timeout_cycles, 20);
    assert_eq!(config.timing.decode_window_cycles, 10);
    assert_eq!(config.timing.clock_period_ns, 10);
}

#[test]
fn test_probe_window_longer_than_bound_rejected() {
    let yaml = r#"
scenario:
  - decode_probe:
      name: "probe"
      address: 0x40000000
      window_cycles: 150
"#;
    let err = HarnessConfig::from_yaml(yaml).unwrap_err();
    assert!(format!("{:#}", err).contains("window_cycles"));
}

#[test]
fn test_unknown_step_kind_rejected() {
    let yaml = r#"
scenario:
  - poke_memory:
      name: "nope"
"#;
    assert!(HarnessConfig::from_yaml(yaml).is_err());
}

#[test]
fn test_from_file_reports_missing_path() {
    let err = HarnessConfig::from_file("/nonexistent/harness.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read harness config"));
}
