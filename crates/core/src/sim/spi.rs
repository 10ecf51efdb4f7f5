// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{merge, Peripheral};
use crate::catalog::{SpiCtrl, SpiStatus};

/// SPI master with MOSI looped back to MISO.
#[derive(Debug, Default)]
pub struct Spi {
    rxdata: u32,
    txdata: u32,
    cfg: u32,
    ctrl: SpiCtrl,
    pr: u32,
    status: SpiStatus,
}

impl Spi {
    pub fn new() -> Self {
        Self {
            status: SpiStatus::TX_E | SpiStatus::RX_E,
            ..Default::default()
        }
    }

    fn read_reg(&self, offset: u32) -> u32 {
        match offset {
            0x00 => self.rxdata,
            0x04 => self.txdata,
            0x08 => self.cfg,
            0x0C => self.ctrl.bits(),
            0x10 => self.pr,
            0x14 => self.status.bits(),
            _ => 0,
        }
    }

    fn shift_out(&mut self) {
        if !self.ctrl.contains(SpiCtrl::ENABLE) {
            return;
        }
        // Transfers complete within the cycle; BUSY is never observable.
        if self.ctrl.contains(SpiCtrl::RX_EN) {
            self.rxdata = self.txdata;
            self.status.remove(SpiStatus::RX_E);
            self.status.insert(SpiStatus::RX_F);
        }
        self.status.insert(SpiStatus::DONE);
    }
}

impl Peripheral for Spi {
    fn read(&mut self, offset: u32) -> u32 {
        let value = self.read_reg(offset);
        if offset == 0x00 {
            self.status.remove(SpiStatus::RX_F);
            self.status.insert(SpiStatus::RX_E);
        }
        value
    }

    fn write(&mut self, offset: u32, value: u32, mask: u32) {
        let value = merge(self.read_reg(offset), value, mask);
        match offset {
            0x04 => {
                self.txdata = value & 0xFF;
                self.shift_out();
            }
            0x08 => self.cfg = value & 0x3,
            0x0C => self.ctrl = SpiCtrl::from_bits_truncate(value),
            0x10 => self.pr = value,
            // rxdata and status are read-only
            _ => {}
        }
    }

    fn reset(&mut self) {
        *self = Self::new();
    }

    fn irq(&self) -> bool {
        self.ctrl.contains(SpiCtrl::ENABLE) && self.status.contains(SpiStatus::DONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: u32 = 0xFFFF_FFFF;

    #[test]
    fn test_reset_status() {
        let mut spi = Spi::new();
        assert_eq!(spi.read(0x14), 0b101);
        assert!(!spi.irq());
    }

    #[test]
    fn test_loopback_when_enabled() {
        let mut spi = Spi::new();
        spi.write(0x0C, (SpiCtrl::ENABLE | SpiCtrl::RX_EN).bits(), ALL);
        spi.write(0x04, 0x1A5, ALL);
        let status = SpiStatus::from_bits_retain(spi.read(0x14));
        assert!(status.contains(SpiStatus::DONE | SpiStatus::RX_F));
        assert!(!status.contains(SpiStatus::RX_E));
        assert!(spi.irq());
        assert_eq!(spi.read(0x00), 0xA5);
        assert!(SpiStatus::from_bits_retain(spi.read(0x14)).contains(SpiStatus::RX_E));
    }

    #[test]
    fn test_disabled_master_does_not_shift() {
        let mut spi = Spi::new();
        spi.write(0x04, 0x55, ALL);
        assert_eq!(spi.read(0x14), 0b101);
        assert_eq!(spi.read(0x00), 0);
    }

    #[test]
    fn test_status_is_read_only() {
        let mut spi = Spi::new();
        spi.write(0x14, 0, ALL);
        assert_eq!(spi.read(0x14), 0b101);
        spi.write(0x08, 0xFF, ALL);
        assert_eq!(spi.read(0x08), 0x3);
    }
}
