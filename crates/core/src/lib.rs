// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Wishbone bus-transaction harness.
//!
//! The harness drives a device under test through a [`SignalSurface`]: it
//! issues single-master Wishbone classic cycles, checks that unmapped
//! addresses never acknowledge, samples sideband lines, and runs a fixed
//! scenario behind a reset sequence.

pub mod catalog;
pub mod decode;
pub mod sampler;
pub mod scenario;
pub mod sequencer;
pub mod signals;
pub mod sim;
pub mod wishbone;

use signals::{Input, Output};
use wishbone::Direction;

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("Wishbone {direction} timeout at {address:#010x}: no ACK within {cycles} cycles")]
    Timeout {
        address: u32,
        direction: Direction,
        cycles: u32,
    },
    #[error("Decode collision: unmapped address {address:#010x} acknowledged after {cycle} cycles")]
    DecodeCollision { address: u32, cycle: u32 },
    #[error("Bus not idle after reset: {line} still asserted")]
    BusNotIdle { line: &'static str },
    #[error("Signal surface fault: {0}")]
    Surface(String),
}

pub type HarnessResult<T> = Result<T, HarnessError>;

/// The device under test as seen by the harness.
///
/// Implementations own the bus clock. The harness only ever suspends through
/// [`SignalSurface::rising_edge`] and [`SignalSurface::wait_ns`], so a surface
/// can be an in-process model, a bridge to an HDL simulator, or a test fake.
/// Values wider than a line are truncated to the line width.
pub trait SignalSurface {
    /// Drive a harness-owned input line.
    fn drive(&mut self, line: Input, value: u128);

    /// Read back the value currently driven on an input line.
    fn driven(&self, line: Input) -> u128;

    /// Sample a line driven by the device under test.
    fn sample(&self, line: Output) -> u128;

    /// Suspend until the next rising edge of the bus clock.
    fn rising_edge(&mut self) -> HarnessResult<()>;

    /// Let `ns` of simulated time elapse; the clock keeps running.
    fn wait_ns(&mut self, ns: u64) -> HarnessResult<()>;

    /// Current simulated time.
    fn time_ns(&self) -> u64;
}

impl<S: SignalSurface + ?Sized> SignalSurface for &mut S {
    fn drive(&mut self, line: Input, value: u128) {
        (**self).drive(line, value)
    }

    fn driven(&self, line: Input) -> u128 {
        (**self).driven(line)
    }

    fn sample(&self, line: Output) -> u128 {
        (**self).sample(line)
    }

    fn rising_edge(&mut self) -> HarnessResult<()> {
        (**self).rising_edge()
    }

    fn wait_ns(&mut self, ns: u64) -> HarnessResult<()> {
        (**self).wait_ns(ns)
    }

    fn time_ns(&self) -> u64 {
        (**self).time_ns()
    }
}
