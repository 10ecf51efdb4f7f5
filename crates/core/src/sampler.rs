// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Zero-time sampling of the sideband outputs.
//!
//! None of these functions advance the clock; they report whatever the device
//! under test is driving at the current time.

use crate::signals::{slice, DigitalLevel, Output};
use crate::SignalSurface;
use bitflags::bitflags;

bitflags! {
    /// `user_irq[2:0]`.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct UserIrq: u8 {
        const LINE0 = 1 << 0;
        const LINE1 = 1 << 1;
        const LINE2 = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PinSnapshot {
    pub io_out: u64,
    pub io_oeb: u64,
}

impl PinSnapshot {
    pub fn slice(&self, shift: u32, width: u32) -> u64 {
        slice(self.io_out as u128, shift, width) as u64
    }

    /// A pad is driven by the user project when its enable is low.
    pub fn is_output(&self, pad: u32) -> bool {
        slice(self.io_oeb as u128, pad, 1) == 0
    }
}

pub fn sample_irq<S: SignalSurface + ?Sized>(surface: &S) -> UserIrq {
    let raw = surface.sample(Output::UserIrq) as u8;
    let irq = UserIrq::from_bits_truncate(raw);
    tracing::info!("user_irq = {:#05b} at {} ns", irq.bits(), surface.time_ns());
    irq
}

/// `io_out[shift + width - 1 : shift]`.
pub fn sample_pins<S: SignalSurface + ?Sized>(surface: &S, shift: u32, width: u32) -> u64 {
    let value = slice(surface.sample(Output::IoOut), shift, width) as u64;
    tracing::info!(
        "io_out[{}:{}] = {:#b} at {} ns",
        shift + width.max(1) - 1,
        shift,
        value,
        surface.time_ns()
    );
    value
}

pub fn sample_pin<S: SignalSurface + ?Sized>(surface: &S, pad: u32) -> DigitalLevel {
    DigitalLevel::from(slice(surface.sample(Output::IoOut), pad, 1) == 1)
}

pub fn snapshot<S: SignalSurface + ?Sized>(surface: &S) -> PinSnapshot {
    PinSnapshot {
        io_out: surface.sample(Output::IoOut) as u64,
        io_oeb: surface.sample(Output::IoOeb) as u64,
    }
}
