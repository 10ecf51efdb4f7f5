// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{merge, Peripheral};
use crate::catalog::{I3cCtrl, I3cStatus};

/// I3C controller with one single-byte target behind every 7-bit address.
#[derive(Debug)]
pub struct I3c {
    ctrl: I3cCtrl,
    status: I3cStatus,
    data: u32,
    addr: u32,
    irq_en: u32,
    irq_stat: u32,
    targets: [u8; 128],
}

impl Default for I3c {
    fn default() -> Self {
        Self::new()
    }
}

impl I3c {
    pub fn new() -> Self {
        Self {
            ctrl: I3cCtrl::empty(),
            status: I3cStatus::empty(),
            data: 0,
            addr: 0,
            irq_en: 0,
            irq_stat: 0,
            targets: [0; 128],
        }
    }

    fn read_reg(&self, offset: u32) -> u32 {
        match offset {
            0x00 => self.ctrl.bits(),
            0x04 => self.status.bits(),
            0x08 => self.data,
            0x0C => self.addr,
            0x10 => self.irq_en,
            0x14 => self.irq_stat,
            _ => 0,
        }
    }

    fn start(&mut self) {
        if !self.ctrl.contains(I3cCtrl::ENABLE) {
            self.status = I3cStatus::ERROR;
            return;
        }
        let target = ((self.addr >> 1) & 0x7F) as usize;
        if self.ctrl.contains(I3cCtrl::READ_MODE) {
            self.data = self.targets[target] as u32;
        } else {
            self.targets[target] = self.data as u8;
        }
        self.status = I3cStatus::DONE | I3cStatus::ACK_RECEIVED;
        self.irq_stat |= 1;
    }
}

impl Peripheral for I3c {
    fn read(&mut self, offset: u32) -> u32 {
        self.read_reg(offset)
    }

    fn write(&mut self, offset: u32, value: u32, mask: u32) {
        let value = merge(self.read_reg(offset), value, mask);
        match offset {
            0x00 => {
                let ctrl = I3cCtrl::from_bits_truncate(value);
                // START and STOP are strobes and never read back.
                self.ctrl = ctrl - I3cCtrl::START - I3cCtrl::STOP;
                if ctrl.contains(I3cCtrl::START) {
                    self.start();
                }
            }
            0x08 => self.data = value & 0xFF,
            0x0C => self.addr = value & 0xFF,
            0x10 => self.irq_en = value & 1,
            0x18 => self.irq_stat &= !value,
            _ => {}
        }
    }

    fn reset(&mut self) {
        *self = Self::new();
    }

    fn irq(&self) -> bool {
        self.irq_en & self.irq_stat != 0
    }
}
