// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Single-master Wishbone classic cycles.

use crate::signals::{Input, Output};
use crate::{HarnessError, HarnessResult, SignalSurface};
use std::fmt;

/// Every transaction in this harness is a full-word access.
pub const BYTE_SELECT_ALL: u8 = 0xF;

pub const DEFAULT_ACK_TIMEOUT_CYCLES: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Read => f.write_str("read"),
            Direction::Write => f.write_str("write"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pub address: u32,
    pub data: u32,
    pub sel: u8,
    pub direction: Direction,
}

impl Request {
    pub fn write(address: u32, data: u32) -> Self {
        Self {
            address,
            data,
            sel: BYTE_SELECT_ALL,
            direction: Direction::Write,
        }
    }

    pub fn read(address: u32) -> Self {
        Self {
            address,
            data: 0,
            sel: BYTE_SELECT_ALL,
            direction: Direction::Read,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub acknowledged: bool,
    /// Captured `wbs_dat_o` for reads.
    pub data: Option<u32>,
    /// Clock edges between driving the request and seeing ACK.
    pub cycles: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    Satisfied(u32),
    Expired(u32),
}

/// Poll `predicate` now and after each rising edge, for at most `max_cycles` edges.
///
/// A condition that only becomes true on edge `max_cycles + 1` is reported as
/// `Expired`; the surface is never advanced past the bound.
pub fn await_condition<S, F>(surface: &mut S, max_cycles: u32, mut predicate: F) -> HarnessResult<Wait>
where
    S: SignalSurface + ?Sized,
    F: FnMut(&S) -> bool,
{
    let mut cycles = 0;
    loop {
        if predicate(&*surface) {
            return Ok(Wait::Satisfied(cycles));
        }
        if cycles >= max_cycles {
            return Ok(Wait::Expired(cycles));
        }
        surface.rising_edge()?;
        cycles += 1;
        tracing::trace!("edge {} of {} at {} ns", cycles, max_cycles, surface.time_ns());
    }
}

pub fn ack_asserted<S: SignalSurface + ?Sized>(surface: &S) -> bool {
    surface.sample(Output::Ack) & 1 == 1
}

/// The harness side of the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WishboneMaster {
    ack_timeout_cycles: u32,
}

impl Default for WishboneMaster {
    fn default() -> Self {
        Self::new(DEFAULT_ACK_TIMEOUT_CYCLES)
    }
}

impl WishboneMaster {
    pub fn new(ack_timeout_cycles: u32) -> Self {
        Self { ack_timeout_cycles }
    }

    pub fn ack_timeout_cycles(&self) -> u32 {
        self.ack_timeout_cycles
    }

    pub fn write<S: SignalSurface + ?Sized>(
        &self,
        surface: &mut S,
        address: u32,
        data: u32,
    ) -> HarnessResult<Outcome> {
        self.transact(surface, Request::write(address, data))
    }

    pub fn read<S: SignalSurface + ?Sized>(
        &self,
        surface: &mut S,
        address: u32,
    ) -> HarnessResult<Outcome> {
        self.transact(surface, Request::read(address))
    }

    /// Run one cycle to completion. Request lines are deasserted on every exit path.
    pub fn transact<S: SignalSurface + ?Sized>(
        &self,
        surface: &mut S,
        request: Request,
    ) -> HarnessResult<Outcome> {
        drive_request(surface, &request);

        let wait = match await_condition(surface, self.ack_timeout_cycles, |s| ack_asserted(s)) {
            Ok(wait) => wait,
            Err(e) => {
                deassert(surface);
                return Err(e);
            }
        };

        let cycles = match wait {
            Wait::Satisfied(cycles) => cycles,
            Wait::Expired(cycles) => {
                deassert(surface);
                tracing::error!(
                    "Wishbone {} at {:#010x} not acknowledged after {} cycles",
                    request.direction,
                    request.address,
                    cycles
                );
                return Err(HarnessError::Timeout {
                    address: request.address,
                    direction: request.direction,
                    cycles,
                });
            }
        };

        let data = match request.direction {
            Direction::Read => Some((surface.sample(Output::DatOut) & 0xFFFF_FFFF) as u32),
            Direction::Write => None,
        };

        release(surface)?;

        match data {
            Some(value) => tracing::debug!(
                "WB read  {:#010x} -> {:#010x} ({} cycles)",
                request.address,
                value,
                cycles
            ),
            None => tracing::debug!(
                "WB write {:#010x} <- {:#010x} ({} cycles)",
                request.address,
                request.data,
                cycles
            ),
        }

        Ok(Outcome {
            acknowledged: true,
            data,
            cycles,
        })
    }
}

pub(crate) fn drive_request<S: SignalSurface + ?Sized>(surface: &mut S, request: &Request) {
    surface.drive(Input::Adr, request.address as u128);
    if request.direction == Direction::Write {
        surface.drive(Input::DatIn, request.data as u128);
    }
    surface.drive(Input::Sel, request.sel as u128);
    surface.drive(Input::We, (request.direction == Direction::Write) as u128);
    surface.drive(Input::Cyc, 1);
    surface.drive(Input::Stb, 1);
}

pub(crate) fn deassert<S: SignalSurface + ?Sized>(surface: &mut S) {
    surface.drive(Input::Cyc, 0);
    surface.drive(Input::Stb, 0);
    surface.drive(Input::We, 0);
}

/// Drop the request and give the slave one edge to see the bus go idle.
pub(crate) fn release<S: SignalSurface + ?Sized>(surface: &mut S) -> HarnessResult<()> {
    deassert(surface);
    surface.rising_edge()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ReferenceDut;

    /// Acknowledges every request after a fixed number of edges and records
    /// what the master drove.
    #[derive(Debug, Default)]
    struct ScriptedSlave {
        inputs: [u128; 10],
        ack: bool,
        ack_after: u32,
        waited: u32,
        read_value: u32,
        edges: u64,
        fail_on_edge: Option<u64>,
    }

    impl SignalSurface for ScriptedSlave {
        fn drive(&mut self, line: Input, value: u128) {
            self.inputs[line.index()] = value & line.mask();
        }

        fn driven(&self, line: Input) -> u128 {
            self.inputs[line.index()]
        }

        fn sample(&self, line: Output) -> u128 {
            match line {
                Output::Ack => self.ack as u128,
                Output::DatOut => self.read_value as u128,
                _ => 0,
            }
        }

        fn rising_edge(&mut self) -> HarnessResult<()> {
            self.edges += 1;
            if Some(self.edges) == self.fail_on_edge {
                return Err(HarnessError::Surface("simulator went away".to_string()));
            }
            let active = self.driven(Input::Cyc) == 1 && self.driven(Input::Stb) == 1;
            if self.ack || !active {
                self.ack = false;
                self.waited = 0;
                return Ok(());
            }
            self.waited += 1;
            if self.waited >= self.ack_after {
                self.ack = true;
                self.waited = 0;
            }
            Ok(())
        }

        fn wait_ns(&mut self, _ns: u64) -> HarnessResult<()> {
            Ok(())
        }

        fn time_ns(&self) -> u64 {
            self.edges * 10
        }
    }

    fn slave(ack_after: u32) -> ScriptedSlave {
        ScriptedSlave {
            ack_after,
            read_value: 0xCAFE_F00D,
            ..Default::default()
        }
    }

    #[test]
    fn test_write_drives_full_word_request() {
        let mut dut = slave(1);
        let outcome = WishboneMaster::default()
            .write(&mut dut, 0x3000_0008, 0x1234)
            .unwrap();
        assert!(outcome.acknowledged);
        assert_eq!(outcome.cycles, 1);
        assert_eq!(outcome.data, None);
        assert_eq!(dut.driven(Input::Adr), 0x3000_0008);
        assert_eq!(dut.driven(Input::DatIn), 0x1234);
        assert_eq!(dut.driven(Input::Sel), BYTE_SELECT_ALL as u128);
    }

    #[test]
    fn test_request_lines_idle_after_transaction() {
        let mut dut = slave(3);
        WishboneMaster::default().write(&mut dut, 0x10, 1).unwrap();
        assert_eq!(dut.driven(Input::Cyc), 0);
        assert_eq!(dut.driven(Input::Stb), 0);
        assert_eq!(dut.driven(Input::We), 0);
        // The release edge let the slave drop ACK.
        assert!(!ack_asserted(&dut));
        // drive + 3 wait edges + 1 release edge
        assert_eq!(dut.edges, 4);
    }

    #[test]
    fn test_read_captures_data_out() {
        let mut dut = slave(2);
        let outcome = WishboneMaster::default().read(&mut dut, 0x3000_0014).unwrap();
        assert_eq!(outcome.data, Some(0xCAFE_F00D));
        assert_eq!(outcome.cycles, 2);
        assert_eq!(dut.driven(Input::We), 0);
    }

    #[test]
    fn test_ack_on_bound_edge_succeeds() {
        let mut dut = slave(100);
        let outcome = WishboneMaster::new(100).read(&mut dut, 0).unwrap();
        assert_eq!(outcome.cycles, 100);
    }

    #[test]
    fn test_ack_one_edge_after_bound_is_timeout() {
        let mut dut = slave(101);
        let err = WishboneMaster::new(100).read(&mut dut, 0x44).unwrap_err();
        match err {
            HarnessError::Timeout {
                address,
                direction,
                cycles,
            } => {
                assert_eq!(address, 0x44);
                assert_eq!(direction, Direction::Read);
                assert_eq!(cycles, 100);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        // Never sampled past the bound, and the request was withdrawn.
        assert_eq!(dut.edges, 100);
        assert_eq!(dut.driven(Input::Cyc), 0);
        assert_eq!(dut.driven(Input::Stb), 0);
    }

    #[test]
    fn test_surface_fault_propagates_unchanged() {
        let mut dut = ScriptedSlave {
            fail_on_edge: Some(2),
            ..slave(5)
        };
        let err = WishboneMaster::default().write(&mut dut, 0, 0).unwrap_err();
        assert!(matches!(err, HarnessError::Surface(_)));
        assert_eq!(dut.driven(Input::Cyc), 0);
    }

    #[test]
    fn test_await_condition_checks_before_first_edge() {
        let mut dut = slave(1);
        let wait = await_condition(&mut dut, 10, |_| true).unwrap();
        assert_eq!(wait, Wait::Satisfied(0));
        assert_eq!(dut.edges, 0);

        let wait = await_condition(&mut dut, 10, |_| false).unwrap();
        assert_eq!(wait, Wait::Expired(10));
        assert_eq!(dut.edges, 10);
    }

    #[test]
    fn test_repeated_write_has_identical_timing() {
        let mut dut = ReferenceDut::new();
        dut.release_reset();
        let master = WishboneMaster::default();
        let first = master.write(&mut dut, 0x3000_0008, 0x3).unwrap();
        let second = master.write(&mut dut, 0x3000_0008, 0x3).unwrap();
        assert!(first.acknowledged && second.acknowledged);
        assert_eq!(first, second);
    }
}
