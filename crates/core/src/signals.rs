// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::fmt;

/// Number of user IO pads on the harness boundary.
pub const IO_PADS: u32 = 38;

/// Represents a digital signal level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigitalLevel {
    #[default]
    Low,
    High,
}

impl From<bool> for DigitalLevel {
    fn from(b: bool) -> Self {
        if b {
            DigitalLevel::High
        } else {
            DigitalLevel::Low
        }
    }
}

impl From<DigitalLevel> for bool {
    fn from(level: DigitalLevel) -> Self {
        match level {
            DigitalLevel::High => true,
            DigitalLevel::Low => false,
        }
    }
}

/// Lines driven by the harness into the device under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Input {
    Reset,
    Adr,
    DatIn,
    Sel,
    We,
    Cyc,
    Stb,
    LaDataIn,
    LaOenb,
    IoIn,
}

impl Input {
    pub const ALL: [Input; 10] = [
        Input::Reset,
        Input::Adr,
        Input::DatIn,
        Input::Sel,
        Input::We,
        Input::Cyc,
        Input::Stb,
        Input::LaDataIn,
        Input::LaOenb,
        Input::IoIn,
    ];

    pub const fn width(self) -> u32 {
        match self {
            Input::Reset | Input::We | Input::Cyc | Input::Stb => 1,
            Input::Adr | Input::DatIn => 32,
            Input::Sel => 4,
            Input::LaDataIn | Input::LaOenb => 128,
            Input::IoIn => IO_PADS,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Input::Reset => "wb_rst_i",
            Input::Adr => "wbs_adr_i",
            Input::DatIn => "wbs_dat_i",
            Input::Sel => "wbs_sel_i",
            Input::We => "wbs_we_i",
            Input::Cyc => "wbs_cyc_i",
            Input::Stb => "wbs_stb_i",
            Input::LaDataIn => "la_data_in",
            Input::LaOenb => "la_oenb",
            Input::IoIn => "io_in",
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn mask(self) -> u128 {
        width_mask(self.width())
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lines driven by the device under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Output {
    DatOut,
    Ack,
    IoOut,
    IoOeb,
    UserIrq,
    LaDataOut,
}

impl Output {
    pub const ALL: [Output; 6] = [
        Output::DatOut,
        Output::Ack,
        Output::IoOut,
        Output::IoOeb,
        Output::UserIrq,
        Output::LaDataOut,
    ];

    pub const fn width(self) -> u32 {
        match self {
            Output::DatOut => 32,
            Output::Ack => 1,
            Output::IoOut | Output::IoOeb => IO_PADS,
            Output::UserIrq => 3,
            Output::LaDataOut => 128,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Output::DatOut => "wbs_dat_o",
            Output::Ack => "wbs_ack_o",
            Output::IoOut => "io_out",
            Output::IoOeb => "io_oeb",
            Output::UserIrq => "user_irq",
            Output::LaDataOut => "la_data_out",
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn mask(self) -> u128 {
        width_mask(self.width())
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub const fn width_mask(width: u32) -> u128 {
    if width >= 128 {
        u128::MAX
    } else {
        (1u128 << width) - 1
    }
}

/// Extract `width` bits starting at `shift`.
pub fn slice(value: u128, shift: u32, width: u32) -> u128 {
    if shift >= 128 {
        return 0;
    }
    (value >> shift) & width_mask(width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digital_level_conversions() {
        assert_eq!(DigitalLevel::default(), DigitalLevel::Low);
        assert_eq!(DigitalLevel::from(true), DigitalLevel::High);
        let b: bool = DigitalLevel::High.into();
        assert!(b);
    }

    #[test]
    fn test_line_masks() {
        assert_eq!(Input::Sel.mask(), 0xF);
        assert_eq!(Input::Adr.mask(), 0xFFFF_FFFF);
        assert_eq!(Input::LaOenb.mask(), u128::MAX);
        assert_eq!(Output::UserIrq.mask(), 0b111);
        assert_eq!(Output::IoOut.mask(), (1u128 << 38) - 1);
    }

    #[test]
    fn test_input_indices_are_dense() {
        for (i, line) in Input::ALL.iter().enumerate() {
            assert_eq!(line.index(), i);
        }
    }

    #[test]
    fn test_slice() {
        assert_eq!(slice(0b11 << 22, 22, 2), 0b11);
        assert_eq!(slice(0b10 << 22, 22, 2), 0b10);
        assert_eq!(slice(u128::MAX, 200, 4), 0);
    }
}
