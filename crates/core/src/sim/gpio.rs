// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{merge, Pads, Peripheral};
use crate::catalog::GpioIrq;

/// First user pad driven by the GPIO block.
pub const PAD_SHIFT: u32 = 22;
pub const PINS: u32 = 2;

const PIN_MASK: u32 = (1 << PINS) - 1;

/// Two-pin GPIO on `io[23:22]` with level and edge interrupt sources.
#[derive(Debug, Default)]
pub struct Gpio {
    datai: u32,
    datao: u32,
    dir: u32,
    im: GpioIrq,
    ris: GpioIrq,
}

impl Gpio {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_reg(&self, offset: u32) -> u32 {
        match offset {
            0x000 => self.datai,
            0x004 => self.datao,
            0x008 => self.dir,
            0xF00 => self.im.bits(),
            0xF04 => (self.ris & self.im).bits(),
            0xF08 => self.ris.bits(),
            _ => 0,
        }
    }

    fn latch_inputs(&mut self, levels: u32) {
        let rising = levels & !self.datai;
        let falling = !levels & self.datai & PIN_MASK;
        let low = !levels & PIN_MASK;
        let raw = levels | (low << 8) | (rising << 16) | (falling << 24);
        self.ris |= GpioIrq::from_bits_truncate(raw);
        self.datai = levels;
    }
}

impl Peripheral for Gpio {
    fn read(&mut self, offset: u32) -> u32 {
        self.read_reg(offset)
    }

    fn write(&mut self, offset: u32, value: u32, mask: u32) {
        let value = merge(self.read_reg(offset), value, mask);
        match offset {
            0x004 => self.datao = value & PIN_MASK,
            0x008 => self.dir = value & PIN_MASK,
            0xF00 => self.im = GpioIrq::from_bits_truncate(value),
            0xF0C => self.ris.remove(GpioIrq::from_bits_truncate(value)),
            _ => {}
        }
    }

    fn reset(&mut self) {
        *self = Self::new();
    }

    fn tick(&mut self, pads: &mut Pads) {
        let levels = ((pads.io_in >> PAD_SHIFT) as u32) & PIN_MASK;
        self.latch_inputs(levels);

        let field = (PIN_MASK as u64) << PAD_SHIFT;
        pads.io_out = (pads.io_out & !field) | (((self.datao & self.dir) as u64) << PAD_SHIFT);
        // Output enables are active low.
        pads.io_oeb = (pads.io_oeb & !field) | (((!self.dir & PIN_MASK) as u64) << PAD_SHIFT);
    }

    fn irq(&self) -> bool {
        self.ris.intersects(self.im)
    }
}
