// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Scenario steps and the built-in integration scenarios.

use crate::catalog::{
    self, AddressMap, GpioIrq, GpioReg, I3cCtrl, I3cReg, Register, SpiCtrl, SpiInstance, SpiReg,
    UNMAPPED_PROBE_ADDR,
};
use crate::decode;
use crate::sampler;
use crate::wishbone::WishboneMaster;
use crate::{HarnessError, HarnessResult, SignalSurface};
use anyhow::Context;
use labwired_config::{OpConfig, StepConfig};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Write {
        register: Register,
        address: u32,
        value: u32,
    },
    Read {
        register: Register,
        address: u32,
    },
}

impl Op {
    pub fn write(map: &AddressMap, register: Register, value: u32) -> Self {
        Op::Write {
            register,
            address: map.resolve(register),
            value,
        }
    }

    pub fn read(map: &AddressMap, register: Register) -> Self {
        Op::Read {
            register,
            address: map.resolve(register),
        }
    }

    pub fn register(&self) -> Register {
        match self {
            Op::Write { register, .. } | Op::Read { register, .. } => *register,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    Transactions(Vec<Op>),
    /// `window_cycles` overrides the bench-wide decode window.
    DecodeProbe {
        address: u32,
        window_cycles: Option<u32>,
    },
    SampleIrq,
    SamplePins {
        shift: u32,
        width: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub name: String,
    pub kind: StepKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pass,
    Fail,
    Timeout,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Pass => f.write_str("PASS"),
            StepStatus::Fail => f.write_str("FAIL"),
            StepStatus::Timeout => f.write_str("TIMEOUT"),
        }
    }
}

impl From<&HarnessError> for StepStatus {
    fn from(err: &HarnessError) -> Self {
        match err {
            HarnessError::Timeout { .. } => StepStatus::Timeout,
            _ => StepStatus::Fail,
        }
    }
}

/// A value logged while a step ran. Never compared against an expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub label: String,
    pub value: u128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub name: String,
    pub status: StepStatus,
    pub observed: Vec<Observation>,
}

impl Step {
    pub fn transactions(name: &str, ops: Vec<Op>) -> Self {
        Self {
            name: name.to_string(),
            kind: StepKind::Transactions(ops),
        }
    }

    fn new(name: &str, kind: StepKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }

    /// Run the step. Observations made before a failure are kept in `observed`.
    pub fn execute<S: SignalSurface + ?Sized>(
        &self,
        surface: &mut S,
        master: &WishboneMaster,
        decode_window_cycles: u32,
        observed: &mut Vec<Observation>,
    ) -> HarnessResult<()> {
        match &self.kind {
            StepKind::Transactions(ops) => {
                for op in ops {
                    match *op {
                        Op::Write {
                            register,
                            address,
                            value,
                        } => {
                            tracing::debug!("{} <- {:#x}", register, value);
                            master.write(surface, address, value)?;
                        }
                        Op::Read { register, address } => {
                            let outcome = master.read(surface, address)?;
                            let value = outcome.data.unwrap_or_default();
                            match catalog::describe(register, value) {
                                Some(bits) => {
                                    tracing::info!("{} = {:#010x} {}", register, value, bits)
                                }
                                None => tracing::info!("{} = {:#010x}", register, value),
                            }
                            observed.push(Observation {
                                label: register.to_string(),
                                value: value as u128,
                            });
                        }
                    }
                }
            }
            StepKind::DecodeProbe {
                address,
                window_cycles,
            } => {
                let window = window_cycles.unwrap_or(decode_window_cycles);
                decode::check_unmapped(surface, *address, window)?;
            }
            StepKind::SampleIrq => {
                let irq = sampler::sample_irq(surface);
                observed.push(Observation {
                    label: "user_irq".to_string(),
                    value: irq.bits() as u128,
                });
            }
            StepKind::SamplePins { shift, width } => {
                let value = sampler::sample_pins(surface, *shift, *width);
                observed.push(Observation {
                    label: format!("io_out[{}:{}]", (shift + width).saturating_sub(1), shift),
                    value: value as u128,
                });
            }
        }
        Ok(())
    }
}

/// Built-in scenario selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    #[default]
    Reference,
    Smoke,
}

impl Profile {
    pub fn steps(self, map: &AddressMap) -> Vec<Step> {
        match self {
            Profile::Reference => reference(map),
            Profile::Smoke => smoke(map),
        }
    }
}

fn spi(n: SpiInstance, reg: SpiReg) -> Register {
    Register::Spi(n, reg)
}

/// The integration testbench sequence.
pub fn reference(map: &AddressMap) -> Vec<Step> {
    use SpiInstance::{Spi0, Spi1};

    let w = |reg, value| Op::write(map, reg, value);
    let r = |reg| Op::read(map, reg);

    vec![
        Step::transactions(
            "SPI0 configuration",
            vec![
                w(spi(Spi0, SpiReg::Cfg), 0x00),
                w(spi(Spi0, SpiReg::Ctrl), 0x02),
                r(spi(Spi0, SpiReg::Status)),
            ],
        ),
        Step::transactions(
            "SPI1 configuration",
            vec![
                w(spi(Spi1, SpiReg::Cfg), 0x03),
                w(spi(Spi1, SpiReg::Ctrl), 0x02),
            ],
        ),
        Step::transactions(
            "I3C controller",
            vec![
                w(Register::I3c(I3cReg::Ctrl), 0x01),
                w(Register::I3c(I3cReg::Addr), 0x50),
                w(Register::I3c(I3cReg::Data), 0xAA),
                r(Register::I3c(I3cReg::Status)),
            ],
        ),
        Step::transactions(
            "GPIO configuration",
            vec![
                w(Register::Gpio(GpioReg::Dir), 0x01),
                w(Register::Gpio(GpioReg::DataOut), 0x01),
            ],
        ),
        Step::new(
            "Invalid address",
            StepKind::DecodeProbe {
                address: UNMAPPED_PROBE_ADDR,
                window_cycles: None,
            },
        ),
        Step::new("Interrupt signals", StepKind::SampleIrq),
        Step::new("IO pin assignments", StepKind::SamplePins { shift: 22, width: 2 }),
    ]
}

/// Firmware smoke test expressed as bus transactions.
pub fn smoke(map: &AddressMap) -> Vec<Step> {
    let w = |reg, value| Op::write(map, reg, value);
    let r = |reg| Op::read(map, reg);
    let enabled = (SpiCtrl::ENABLE | SpiCtrl::RX_EN).bits();

    let mut steps: Vec<Step> = SpiInstance::ALL
        .into_iter()
        .zip([0xA5, 0x55, 0xAA, 0xFF])
        .map(|(n, byte)| {
            Step::transactions(
                &format!("SPI{} loopback", n.index()),
                vec![
                    w(spi(n, SpiReg::Prescaler), 10),
                    w(spi(n, SpiReg::Cfg), 0),
                    w(spi(n, SpiReg::Ctrl), enabled),
                    r(spi(n, SpiReg::Status)),
                    w(spi(n, SpiReg::TxData), byte),
                    w(spi(n, SpiReg::Ctrl), enabled | SpiCtrl::SS.bits()),
                    r(spi(n, SpiReg::Status)),
                    w(spi(n, SpiReg::Ctrl), enabled),
                    r(spi(n, SpiReg::Status)),
                    r(spi(n, SpiReg::RxData)),
                ],
            )
        })
        .collect();

    let i3c = Register::I3c;
    steps.push(Step::transactions(
        "I3C write and read back",
        vec![
            w(i3c(I3cReg::Ctrl), I3cCtrl::ENABLE.bits()),
            w(i3c(I3cReg::IrqEn), 1),
            r(i3c(I3cReg::Status)),
            w(i3c(I3cReg::Addr), 0x50),
            w(i3c(I3cReg::Data), 0x12),
            w(
                i3c(I3cReg::Ctrl),
                (I3cCtrl::ENABLE | I3cCtrl::WRITE_MODE | I3cCtrl::START).bits(),
            ),
            r(i3c(I3cReg::Status)),
            w(i3c(I3cReg::IrqClr), 1),
            w(i3c(I3cReg::Addr), 0x51),
            w(
                i3c(I3cReg::Ctrl),
                (I3cCtrl::ENABLE | I3cCtrl::READ_MODE | I3cCtrl::START).bits(),
            ),
            r(i3c(I3cReg::Status)),
            r(i3c(I3cReg::Data)),
            w(i3c(I3cReg::IrqClr), 1),
        ],
    ));

    let gpio = Register::Gpio;
    steps.push(Step::transactions(
        "GPIO pin 0 output",
        vec![
            w(gpio(GpioReg::Dir), 0),
            w(gpio(GpioReg::Ic), 0xFFFF_FFFF),
            w(gpio(GpioReg::Dir), 0b01),
            w(gpio(GpioReg::DataOut), 0b01),
            w(gpio(GpioReg::Im), (GpioIrq::P1PE | GpioIrq::P1NE).bits()),
            r(gpio(GpioReg::DataIn)),
            r(gpio(GpioReg::Ris)),
        ],
    ));

    steps.extend([
        Step::new(
            "Invalid address",
            StepKind::DecodeProbe {
                address: UNMAPPED_PROBE_ADDR,
                window_cycles: None,
            },
        ),
        Step::new("Interrupt signals", StepKind::SampleIrq),
        Step::new("IO pin assignments", StepKind::SamplePins { shift: 22, width: 2 }),
    ]);
    steps
}

/// Build steps from a scenario script, resolving names against `map`.
pub fn from_config(steps: &[StepConfig], map: &AddressMap) -> anyhow::Result<Vec<Step>> {
    steps
        .iter()
        .map(|step| {
            build_step(step, map).with_context(|| format!("Invalid scenario step '{}'", step.name()))
        })
        .collect()
}

fn build_step(step: &StepConfig, map: &AddressMap) -> anyhow::Result<Step> {
    let kind = match step {
        StepConfig::Transactions { ops, .. } => StepKind::Transactions(
            ops.iter()
                .map(|op| build_op(op, map))
                .collect::<anyhow::Result<Vec<_>>>()?,
        ),
        StepConfig::DecodeProbe {
            address,
            window_cycles,
            ..
        } => {
            if let Some((peripheral, offset)) = map.decode(*address) {
                anyhow::bail!(
                    "Probe address {:#010x} is mapped ({} + {:#x})",
                    address,
                    peripheral,
                    offset
                );
            }
            StepKind::DecodeProbe {
                address: *address,
                window_cycles: *window_cycles,
            }
        }
        StepConfig::SampleIrq { .. } => StepKind::SampleIrq,
        StepConfig::SamplePins { shift, width, .. } => StepKind::SamplePins {
            shift: *shift,
            width: *width,
        },
    };
    Ok(Step::new(step.name(), kind))
}

fn build_op(op: &OpConfig, map: &AddressMap) -> anyhow::Result<Op> {
    let name = match op {
        OpConfig::Write { register, .. } | OpConfig::Read { register } => register,
    };
    let register: Register = name.parse().map_err(anyhow::Error::msg)?;
    Ok(match op {
        OpConfig::Write { value, .. } => Op::write(map, register, *value),
        OpConfig::Read { .. } => Op::read(map, register),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ReferenceDut;

    #[test]
    fn test_reference_scenario_shape() {
        let steps = reference(&AddressMap::default());
        assert_eq!(steps.len(), 7);
        match &steps[0].kind {
            StepKind::Transactions(ops) => {
                assert_eq!(
                    ops[0],
                    Op::Write {
                        register: spi(SpiInstance::Spi0, SpiReg::Cfg),
                        address: 0x3000_0008,
                        value: 0,
                    }
                );
                assert_eq!(
                    ops[1],
                    Op::Write {
                        register: spi(SpiInstance::Spi0, SpiReg::Ctrl),
                        address: 0x3000_000C,
                        value: 2,
                    }
                );
            }
            other => panic!("unexpected step {:?}", other),
        }
        assert_eq!(
            steps[4].kind,
            StepKind::DecodeProbe {
                address: 0x4000_0000,
                window_cycles: None
            }
        );
        assert_eq!(steps[6].kind, StepKind::SamplePins { shift: 22, width: 2 });
    }

    #[test]
    fn test_transactions_record_reads() {
        let map = AddressMap::default();
        let mut dut = ReferenceDut::new();
        dut.release_reset();
        let step = Step::transactions(
            "status",
            vec![Op::read(&map, spi(SpiInstance::Spi0, SpiReg::Status))],
        );
        let mut observed = Vec::new();
        step.execute(&mut dut, &WishboneMaster::default(), 10, &mut observed)
            .unwrap();
        assert_eq!(
            observed,
            vec![Observation {
                label: "spi0.status".to_string(),
                value: 0b101,
            }]
        );
    }

    #[test]
    fn test_from_config_resolves_names() {
        let map = AddressMap::default();
        let cfg = vec![
            StepConfig::Transactions {
                name: "spi".to_string(),
                ops: vec![
                    OpConfig::Write {
                        register: "spi3.pr".to_string(),
                        value: 4,
                    },
                    OpConfig::Read {
                        register: "gpio.ris".to_string(),
                    },
                ],
            },
            StepConfig::SampleIrq {
                name: "irq".to_string(),
            },
        ];
        let steps = from_config(&cfg, &map).unwrap();
        assert_eq!(
            steps[0].kind,
            StepKind::Transactions(vec![
                Op::Write {
                    register: spi(SpiInstance::Spi3, SpiReg::Prescaler),
                    address: 0x3000_0310,
                    value: 4,
                },
                Op::Read {
                    register: Register::Gpio(GpioReg::Ris),
                    address: 0x3000_2F08,
                },
            ])
        );
        assert_eq!(steps[1].kind, StepKind::SampleIrq);
    }

    #[test]
    fn test_from_config_rejects_unknown_register() {
        let cfg = vec![StepConfig::Transactions {
            name: "bad".to_string(),
            ops: vec![OpConfig::Read {
                register: "spi9.status".to_string(),
            }],
        }];
        let err = from_config(&cfg, &AddressMap::default()).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("Invalid scenario step 'bad'"));
        assert!(msg.contains("unknown peripheral"));
    }

    #[test]
    fn test_from_config_rejects_mapped_probe() {
        let cfg = vec![StepConfig::DecodeProbe {
            name: "probe".to_string(),
            address: 0x3000_1004,
            window_cycles: None,
        }];
        let err = from_config(&cfg, &AddressMap::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("is mapped (i3c + 0x4)"));
    }

    #[test]
    fn test_timeout_maps_to_timeout_status() {
        let err = HarnessError::Timeout {
            address: 0,
            direction: crate::wishbone::Direction::Read,
            cycles: 100,
        };
        assert_eq!(StepStatus::from(&err), StepStatus::Timeout);
        let err = HarnessError::DecodeCollision { address: 0, cycle: 1 };
        assert_eq!(StepStatus::from(&err), StepStatus::Fail);
    }
}
