// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Negative address-decode check.

use crate::wishbone::{self, ack_asserted, await_condition, Request, Wait};
use crate::{HarnessError, HarnessResult, SignalSurface};

pub const DEFAULT_DECODE_WINDOW_CYCLES: u32 = 10;

/// Result of a probe that did not collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeReport {
    pub address: u32,
    pub cycles_observed: u32,
}

/// Issue a read to `address` and require that ACK stays low for `window` edges.
///
/// The probe is withdrawn and the bus released before returning, whether the
/// address stayed silent or collided.
pub fn check_unmapped<S: SignalSurface + ?Sized>(
    surface: &mut S,
    address: u32,
    window: u32,
) -> HarnessResult<DecodeReport> {
    tracing::debug!("Probing unmapped address {:#010x} for {} cycles", address, window);
    wishbone::drive_request(surface, &Request::read(address));

    let wait = match await_condition(surface, window, |s| ack_asserted(s)) {
        Ok(wait) => wait,
        Err(e) => {
            tracing::error!("Decode probe at {:#010x} aborted: {}", address, e);
            wishbone::deassert(surface);
            return Err(e);
        }
    };

    wishbone::release(surface)?;

    match wait {
        Wait::Expired(cycles) => {
            tracing::info!("Unmapped address {:#010x} ignored for {} cycles", address, cycles);
            Ok(DecodeReport {
                address,
                cycles_observed: cycles,
            })
        }
        Wait::Satisfied(cycle) => {
            tracing::error!("Unmapped address {:#010x} acknowledged on cycle {}", address, cycle);
            Err(HarnessError::DecodeCollision { address, cycle })
        }
    }
}
