// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko

use labwired_core::catalog::{AddressMap, GpioReg, Register, UNMAPPED_PROBE_ADDR};
use labwired_core::decode::check_unmapped;
use labwired_core::scenario;
use labwired_core::sequencer::{BenchSettings, Sequencer, SequencerState};
use labwired_core::signals::{Input, Output};
use labwired_core::sim::{Faults, ReferenceDut};
use labwired_core::wishbone::{Direction, WishboneMaster};
use labwired_core::{HarnessError, HarnessResult, SignalSurface};

fn dut_with_latency(latency: u32) -> ReferenceDut {
    let mut dut = ReferenceDut::new().with_faults(Faults {
        ack_latency: latency,
        ..Default::default()
    });
    dut.release_reset();
    dut
}

#[test]
fn test_ack_on_bound_edge_is_success() -> anyhow::Result<()> {
    let dir = AddressMap::default().resolve(Register::Gpio(GpioReg::Dir));
    let mut dut = dut_with_latency(100);
    let outcome = WishboneMaster::default().write(&mut dut, dir, 1)?;
    assert!(outcome.acknowledged);
    assert_eq!(outcome.cycles, 100);
    Ok(())
}

#[test]
fn test_ack_after_bound_is_timeout() {
    let dir = AddressMap::default().resolve(Register::Gpio(GpioReg::Dir));
    let mut dut = dut_with_latency(101);
    let before = dut.edges();
    match WishboneMaster::default().read(&mut dut, dir) {
        Err(HarnessError::Timeout {
            address,
            direction,
            cycles,
        }) => {
            assert_eq!(address, dir);
            assert_eq!(direction, Direction::Read);
            assert_eq!(cycles, 100);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
    assert_eq!(dut.edges() - before, 100);
    assert_eq!(dut.driven(Input::Cyc), 0);
}

#[test]
fn test_same_write_twice_has_identical_timing() -> anyhow::Result<()> {
    let ctrl = AddressMap::default().resolve("spi0.ctrl".parse().map_err(anyhow::Error::msg)?);
    for latency in [1, 3, 17] {
        let mut dut = dut_with_latency(latency);
        let master = WishboneMaster::default();
        let first = master.write(&mut dut, ctrl, 0x2)?;
        let second = master.write(&mut dut, ctrl, 0x2)?;
        assert_eq!(first, second);
        assert_eq!(first.cycles, latency);
    }
    Ok(())
}

#[test]
fn test_unmapped_addresses_never_ack() -> anyhow::Result<()> {
    let map = AddressMap::default();
    let mut dut = ReferenceDut::new();
    dut.release_reset();
    let probes = [
        UNMAPPED_PROBE_ADDR,
        0x0000_0000,
        0x2FFF_FFFC,
        0x3000_0400,
        0x3000_3000,
        0xFFFF_FFFC,
    ];
    for address in probes {
        assert!(!map.is_mapped(address));
        let report = check_unmapped(&mut dut, address, 10)?;
        assert_eq!(report.cycles_observed, 10);
    }
    Ok(())
}

#[test]
fn test_collision_is_distinct_from_timeout() {
    let mut dut = ReferenceDut::new().with_faults(Faults {
        ack_unmapped: true,
        ..Default::default()
    });
    dut.release_reset();
    let err = check_unmapped(&mut dut, UNMAPPED_PROBE_ADDR, 10).unwrap_err();
    assert!(matches!(err, HarnessError::DecodeCollision { .. }));
    assert!(err.to_string().contains("0x40000000"));
}

/// Holds `wbs_ack_o` high regardless of the model.
struct StuckAck(ReferenceDut);

impl SignalSurface for StuckAck {
    fn drive(&mut self, line: Input, value: u128) {
        self.0.drive(line, value)
    }

    fn driven(&self, line: Input) -> u128 {
        self.0.driven(line)
    }

    fn sample(&self, line: Output) -> u128 {
        match line {
            Output::Ack => 1,
            other => self.0.sample(other),
        }
    }

    fn rising_edge(&mut self) -> HarnessResult<()> {
        self.0.rising_edge()
    }

    fn wait_ns(&mut self, ns: u64) -> HarnessResult<()> {
        self.0.wait_ns(ns)
    }

    fn time_ns(&self) -> u64 {
        self.0.time_ns()
    }
}

#[test]
fn test_bus_idle_checked_after_reset() {
    let mut surface = StuckAck(ReferenceDut::new());
    let seq = Sequencer::new(
        "stuck",
        BenchSettings::default(),
        scenario::reference(&AddressMap::default()),
    );
    let report = seq.run(&mut surface);
    assert_eq!(report.state, SequencerState::Failed);
    assert!(report.results.is_empty());
    assert!(matches!(
        report.failure,
        Some(HarnessError::BusNotIdle { line: "wbs_ack_o" })
    ));
}

#[test]
fn test_request_lines_idle_before_first_transaction() {
    let mut dut = ReferenceDut::new();
    let mut seq = Sequencer::new(
        "idle",
        BenchSettings::default(),
        scenario::reference(&AddressMap::default()),
    );
    while seq.state() != SequencerState::Running(0) {
        seq.advance(&mut dut);
    }
    assert_eq!(dut.driven(Input::Reset), 0);
    assert_eq!(dut.driven(Input::Cyc), 0);
    assert_eq!(dut.driven(Input::Stb), 0);
    assert_eq!(dut.sample(Output::Ack), 0);
}
