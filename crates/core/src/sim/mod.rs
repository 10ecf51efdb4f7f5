// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! In-process behavioural model of the user project.
//!
//! `ReferenceDut` implements [`SignalSurface`] with a registered Wishbone
//! slave in front of an address-decoding interconnect. The peripheral models
//! are deliberately small; they only need to accept the harness scenarios.

pub mod gpio;
pub mod i3c;
pub mod spi;

use crate::catalog::{AddressMap, PeripheralId};
use crate::signals::{Input, Output};
use crate::{HarnessError, HarnessResult, SignalSurface};

/// User IO pad state shared between the peripherals and the harness boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pads {
    pub io_in: u64,
    pub io_out: u64,
    pub io_oeb: u64,
}

/// A word-addressed register block behind the interconnect.
pub trait Peripheral: std::fmt::Debug + Send {
    fn read(&mut self, offset: u32) -> u32;
    /// `mask` has the bytes selected by `wbs_sel_i` set.
    fn write(&mut self, offset: u32, value: u32, mask: u32);
    fn reset(&mut self);
    fn tick(&mut self, _pads: &mut Pads) {}
    fn irq(&self) -> bool {
        false
    }
}

pub(crate) fn merge(old: u32, value: u32, mask: u32) -> u32 {
    (old & !mask) | (value & mask)
}

pub fn byte_mask(sel: u8) -> u32 {
    (0..4)
        .filter(|b| sel & (1 << b) != 0)
        .fold(0, |m, b| m | (0xFF << (b * 8)))
}

#[derive(Debug)]
pub struct PeripheralEntry {
    pub id: PeripheralId,
    pub base: u32,
    pub size: u32,
    pub dev: Box<dyn Peripheral>,
}

/// Address decoder in front of the peripheral models.
#[derive(Debug)]
pub struct Interconnect {
    pub peripherals: Vec<PeripheralEntry>,
}

impl Interconnect {
    pub fn from_map(map: &AddressMap) -> Self {
        let peripherals = map
            .ranges()
            .into_iter()
            .map(|r| {
                let dev: Box<dyn Peripheral> = match r.peripheral {
                    PeripheralId::Spi(_) => Box::new(spi::Spi::new()),
                    PeripheralId::I3c => Box::new(i3c::I3c::new()),
                    PeripheralId::Gpio => Box::new(gpio::Gpio::new()),
                };
                PeripheralEntry {
                    id: r.peripheral,
                    base: r.base,
                    size: r.size,
                    dev,
                }
            })
            .collect();
        Self { peripherals }
    }

    fn find(&mut self, addr: u32) -> Option<(&mut PeripheralEntry, u32)> {
        self.peripherals
            .iter_mut()
            .find(|p| addr >= p.base && (addr as u64) < p.base as u64 + p.size as u64)
            .map(|p| {
                let offset = (addr - p.base) & !3;
                (p, offset)
            })
    }

    pub fn decodes(&self, addr: u32) -> bool {
        self.peripherals
            .iter()
            .any(|p| addr >= p.base && (addr as u64) < p.base as u64 + p.size as u64)
    }

    pub fn read(&mut self, addr: u32) -> Option<u32> {
        self.find(addr).map(|(p, offset)| p.dev.read(offset))
    }

    pub fn write(&mut self, addr: u32, value: u32, sel: u8) -> bool {
        match self.find(addr) {
            Some((p, offset)) => {
                p.dev.write(offset, value, byte_mask(sel));
                true
            }
            None => false,
        }
    }

    pub fn reset(&mut self) {
        for p in &mut self.peripherals {
            p.dev.reset();
        }
    }

    pub fn tick(&mut self, pads: &mut Pads) {
        for p in &mut self.peripherals {
            p.dev.tick(pads);
        }
    }

    /// `user_irq[0]` is any SPI, `[1]` the I3C controller, `[2]` GPIO.
    pub fn irq_lines(&self) -> u8 {
        self.peripherals
            .iter()
            .filter(|p| p.dev.irq())
            .fold(0, |lines, p| {
                lines
                    | match p.id {
                        PeripheralId::Spi(_) => 0b001,
                        PeripheralId::I3c => 0b010,
                        PeripheralId::Gpio => 0b100,
                    }
            })
    }
}

/// Misbehaviour to inject into the reference model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Faults {
    /// Edges between a request and its ACK; 0 and 1 both mean next edge.
    pub ack_latency: u32,
    /// Mapped addresses whose slave never answers.
    pub stalled: Vec<u32>,
    /// Decoder bug: acknowledge addresses outside every window.
    pub ack_unmapped: bool,
    /// Report a simulator fault on this edge number.
    pub fail_at_edge: Option<u64>,
}

#[derive(Debug)]
pub struct ReferenceDut {
    inputs: [u128; Input::ALL.len()],
    ack: bool,
    dat_o: u32,
    waited: u32,
    pads: Pads,
    interconnect: Interconnect,
    clock_period_ns: u64,
    time_ns: u64,
    edges: u64,
    faults: Faults,
}

impl Default for ReferenceDut {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceDut {
    pub fn new() -> Self {
        Self::with_map(&AddressMap::default(), 10)
    }

    pub fn with_map(map: &AddressMap, clock_period_ns: u64) -> Self {
        Self {
            inputs: [0; Input::ALL.len()],
            ack: false,
            dat_o: 0,
            waited: 0,
            pads: Pads::default(),
            interconnect: Interconnect::from_map(map),
            clock_period_ns: clock_period_ns.max(1),
            time_ns: 0,
            edges: 0,
            faults: Faults::default(),
        }
    }

    pub fn with_faults(mut self, faults: Faults) -> Self {
        self.faults = faults;
        self
    }

    pub fn faults_mut(&mut self) -> &mut Faults {
        &mut self.faults
    }

    pub fn edges(&self) -> u64 {
        self.edges
    }

    pub fn interconnect(&self) -> &Interconnect {
        &self.interconnect
    }

    /// Pulse reset for one edge, outside of any harness sequencing.
    pub fn release_reset(&mut self) {
        self.drive(Input::Reset, 1);
        self.clock();
        self.drive(Input::Reset, 0);
        self.clock();
    }

    fn input(&self, line: Input) -> u128 {
        self.inputs[line.index()]
    }

    /// Registered slave logic evaluated on every rising edge.
    fn clock(&mut self) {
        self.edges += 1;
        self.time_ns = (self.time_ns / self.clock_period_ns + 1) * self.clock_period_ns;
        self.pads.io_in = self.input(Input::IoIn) as u64;

        if self.input(Input::Reset) == 1 {
            self.interconnect.reset();
            self.ack = false;
            self.waited = 0;
            self.dat_o = 0;
            self.interconnect.tick(&mut self.pads);
            return;
        }

        self.interconnect.tick(&mut self.pads);

        // Single-cycle ACK: always dropped on the edge after it was raised.
        if self.ack {
            self.ack = false;
            self.waited = 0;
            return;
        }

        let active = self.input(Input::Cyc) == 1 && self.input(Input::Stb) == 1;
        if !active {
            self.waited = 0;
            return;
        }

        let addr = self.input(Input::Adr) as u32;
        if self.faults.stalled.contains(&addr) {
            return;
        }
        if !self.interconnect.decodes(addr) && !self.faults.ack_unmapped {
            return;
        }

        self.waited += 1;
        if self.waited < self.faults.ack_latency.max(1) {
            return;
        }
        self.waited = 0;
        self.ack = true;

        if self.input(Input::We) == 1 {
            let sel = self.input(Input::Sel) as u8;
            let data = self.input(Input::DatIn) as u32;
            if !self.interconnect.write(addr, data, sel) {
                tracing::trace!("model: write to unmapped {:#010x} dropped", addr);
            }
        } else {
            self.dat_o = self.interconnect.read(addr).unwrap_or(0);
        }
    }
}

impl SignalSurface for ReferenceDut {
    fn drive(&mut self, line: Input, value: u128) {
        self.inputs[line.index()] = value & line.mask();
    }

    fn driven(&self, line: Input) -> u128 {
        self.input(line)
    }

    fn sample(&self, line: Output) -> u128 {
        match line {
            Output::DatOut => self.dat_o as u128,
            Output::Ack => self.ack as u128,
            Output::IoOut => self.pads.io_out as u128 & line.mask(),
            Output::IoOeb => self.pads.io_oeb as u128 & line.mask(),
            Output::UserIrq => self.interconnect.irq_lines() as u128,
            // The user project does not drive the logic analyzer.
            Output::LaDataOut => 0,
        }
    }

    fn rising_edge(&mut self) -> HarnessResult<()> {
        if self.faults.fail_at_edge == Some(self.edges + 1) {
            return Err(HarnessError::Surface(format!(
                "model fault injected at edge {}",
                self.edges + 1
            )));
        }
        self.clock();
        Ok(())
    }

    fn wait_ns(&mut self, ns: u64) -> HarnessResult<()> {
        let target = self.time_ns + ns;
        loop {
            let next_edge = (self.time_ns / self.clock_period_ns + 1) * self.clock_period_ns;
            if next_edge > target {
                break;
            }
            self.rising_edge()?;
        }
        self.time_ns = target;
        Ok(())
    }

    fn time_ns(&self) -> u64 {
        self.time_ns
    }
}
