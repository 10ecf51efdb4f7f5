// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Address map of the user project: four SPI masters at a fixed stride, one
//! I3C controller and one GPIO block.

use anyhow::Context;
use bitflags::bitflags;
use labwired_config::{parse_size, AddressMapConfig};
use std::fmt;
use std::str::FromStr;

pub const SPI_BASE: u32 = 0x3000_0000;
pub const SPI_STRIDE: u32 = 0x100;
pub const I3C_BASE: u32 = 0x3000_1000;
pub const I3C_SIZE: u32 = 0x1000;
pub const GPIO_BASE: u32 = 0x3000_2000;
pub const GPIO_SIZE: u32 = 0x1000;

/// Lies outside every decoded window of the reference map.
pub const UNMAPPED_PROBE_ADDR: u32 = 0x4000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpiInstance {
    Spi0,
    Spi1,
    Spi2,
    Spi3,
}

impl SpiInstance {
    pub const ALL: [SpiInstance; 4] = [
        SpiInstance::Spi0,
        SpiInstance::Spi1,
        SpiInstance::Spi2,
        SpiInstance::Spi3,
    ];

    pub const fn index(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpiReg {
    RxData,
    TxData,
    Cfg,
    Ctrl,
    Prescaler,
    Status,
}

impl SpiReg {
    pub const ALL: [SpiReg; 6] = [
        SpiReg::RxData,
        SpiReg::TxData,
        SpiReg::Cfg,
        SpiReg::Ctrl,
        SpiReg::Prescaler,
        SpiReg::Status,
    ];

    pub const fn offset(self) -> u32 {
        match self {
            SpiReg::RxData => 0x00,
            SpiReg::TxData => 0x04,
            SpiReg::Cfg => 0x08,
            SpiReg::Ctrl => 0x0C,
            SpiReg::Prescaler => 0x10,
            SpiReg::Status => 0x14,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            SpiReg::RxData => "rxdata",
            SpiReg::TxData => "txdata",
            SpiReg::Cfg => "cfg",
            SpiReg::Ctrl => "ctrl",
            SpiReg::Prescaler => "pr",
            SpiReg::Status => "status",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum I3cReg {
    Ctrl,
    Status,
    Data,
    Addr,
    IrqEn,
    IrqStat,
    IrqClr,
}

impl I3cReg {
    pub const ALL: [I3cReg; 7] = [
        I3cReg::Ctrl,
        I3cReg::Status,
        I3cReg::Data,
        I3cReg::Addr,
        I3cReg::IrqEn,
        I3cReg::IrqStat,
        I3cReg::IrqClr,
    ];

    pub const fn offset(self) -> u32 {
        match self {
            I3cReg::Ctrl => 0x00,
            I3cReg::Status => 0x04,
            I3cReg::Data => 0x08,
            I3cReg::Addr => 0x0C,
            I3cReg::IrqEn => 0x10,
            I3cReg::IrqStat => 0x14,
            I3cReg::IrqClr => 0x18,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            I3cReg::Ctrl => "ctrl",
            I3cReg::Status => "status",
            I3cReg::Data => "data",
            I3cReg::Addr => "addr",
            I3cReg::IrqEn => "irq_en",
            I3cReg::IrqStat => "irq_stat",
            I3cReg::IrqClr => "irq_clr",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpioReg {
    DataIn,
    DataOut,
    Dir,
    Im,
    Mis,
    Ris,
    Ic,
}

impl GpioReg {
    pub const ALL: [GpioReg; 7] = [
        GpioReg::DataIn,
        GpioReg::DataOut,
        GpioReg::Dir,
        GpioReg::Im,
        GpioReg::Mis,
        GpioReg::Ris,
        GpioReg::Ic,
    ];

    pub const fn offset(self) -> u32 {
        match self {
            GpioReg::DataIn => 0x00,
            GpioReg::DataOut => 0x04,
            GpioReg::Dir => 0x08,
            GpioReg::Im => 0xF00,
            GpioReg::Mis => 0xF04,
            GpioReg::Ris => 0xF08,
            GpioReg::Ic => 0xF0C,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            GpioReg::DataIn => "datai",
            GpioReg::DataOut => "datao",
            GpioReg::Dir => "dir",
            GpioReg::Im => "im",
            GpioReg::Mis => "mis",
            GpioReg::Ris => "ris",
            GpioReg::Ic => "ic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeripheralId {
    Spi(SpiInstance),
    I3c,
    Gpio,
}

impl PeripheralId {
    pub const ALL: [PeripheralId; 6] = [
        PeripheralId::Spi(SpiInstance::Spi0),
        PeripheralId::Spi(SpiInstance::Spi1),
        PeripheralId::Spi(SpiInstance::Spi2),
        PeripheralId::Spi(SpiInstance::Spi3),
        PeripheralId::I3c,
        PeripheralId::Gpio,
    ];

    /// End of the highest register in this peripheral's layout.
    fn register_span(self) -> u32 {
        match self {
            PeripheralId::Spi(_) => SpiReg::Status.offset() + 4,
            PeripheralId::I3c => I3cReg::IrqClr.offset() + 4,
            PeripheralId::Gpio => GpioReg::Ic.offset() + 4,
        }
    }
}

impl fmt::Display for PeripheralId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeripheralId::Spi(n) => write!(f, "spi{}", n.index()),
            PeripheralId::I3c => f.write_str("i3c"),
            PeripheralId::Gpio => f.write_str("gpio"),
        }
    }
}

impl FromStr for PeripheralId {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let v = value.trim().to_ascii_lowercase();
        PeripheralId::ALL
            .into_iter()
            .find(|p| p.to_string() == v)
            .ok_or_else(|| {
                format!(
                    "unknown peripheral '{}'; supported: spi0, spi1, spi2, spi3, i3c, gpio",
                    value
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    Spi(SpiInstance, SpiReg),
    I3c(I3cReg),
    Gpio(GpioReg),
}

impl Register {
    pub fn peripheral(self) -> PeripheralId {
        match self {
            Register::Spi(n, _) => PeripheralId::Spi(n),
            Register::I3c(_) => PeripheralId::I3c,
            Register::Gpio(_) => PeripheralId::Gpio,
        }
    }

    pub fn offset(self) -> u32 {
        match self {
            Register::Spi(_, r) => r.offset(),
            Register::I3c(r) => r.offset(),
            Register::Gpio(r) => r.offset(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Register::Spi(_, r) => r.name(),
            Register::I3c(r) => r.name(),
            Register::Gpio(r) => r.name(),
        }
    }

    /// Every register of every peripheral, in address order.
    pub fn all() -> Vec<Register> {
        let mut regs = Vec::new();
        for n in SpiInstance::ALL {
            regs.extend(SpiReg::ALL.iter().map(|r| Register::Spi(n, *r)));
        }
        regs.extend(I3cReg::ALL.iter().map(|r| Register::I3c(*r)));
        regs.extend(GpioReg::ALL.iter().map(|r| Register::Gpio(*r)));
        regs
    }

    fn find(peripheral: PeripheralId, name: &str) -> Option<Register> {
        match peripheral {
            PeripheralId::Spi(n) => SpiReg::ALL
                .into_iter()
                .find(|r| r.name() == name)
                .map(|r| Register::Spi(n, r)),
            PeripheralId::I3c => I3cReg::ALL
                .into_iter()
                .find(|r| r.name() == name)
                .map(Register::I3c),
            PeripheralId::Gpio => GpioReg::ALL
                .into_iter()
                .find(|r| r.name() == name)
                .map(Register::Gpio),
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.peripheral(), self.name())
    }
}

impl FromStr for Register {
    type Err = String;

    /// Parses `"<peripheral>.<register>"`, e.g. `"spi0.cfg"` or `"gpio.dir"`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (periph, reg) = value
            .trim()
            .split_once('.')
            .ok_or_else(|| format!("register '{}' must be written as <peripheral>.<register>", value))?;
        let peripheral: PeripheralId = periph.parse()?;
        let reg = reg.trim().to_ascii_lowercase();
        Register::find(peripheral, &reg)
            .ok_or_else(|| format!("peripheral '{}' has no register '{}'", peripheral, reg))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    pub peripheral: PeripheralId,
    pub base: u32,
    pub size: u32,
}

impl AddressRange {
    pub fn contains(&self, addr: u32) -> bool {
        addr >= self.base && (addr as u64) < self.base as u64 + self.size as u64
    }

    fn overlaps(&self, other: &AddressRange) -> bool {
        let (a0, a1) = (self.base as u64, self.base as u64 + self.size as u64);
        let (b0, b1) = (other.base as u64, other.base as u64 + other.size as u64);
        a0 < b1 && b0 < a1
    }
}

/// One resolved catalog row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub register: Register,
    pub base: u32,
    pub address: u32,
}

/// Immutable peripheral placement. Built once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressMap {
    spi_base: u32,
    spi_stride: u32,
    i3c_base: u32,
    i3c_size: u32,
    gpio_base: u32,
    gpio_size: u32,
}

impl Default for AddressMap {
    fn default() -> Self {
        Self {
            spi_base: SPI_BASE,
            spi_stride: SPI_STRIDE,
            i3c_base: I3C_BASE,
            i3c_size: I3C_SIZE,
            gpio_base: GPIO_BASE,
            gpio_size: GPIO_SIZE,
        }
    }
}

impl AddressMap {
    pub fn from_config(cfg: &AddressMapConfig) -> anyhow::Result<Self> {
        let size = |field: &str, value: &str| -> anyhow::Result<u32> {
            let bytes = parse_size(value)
                .with_context(|| format!("Invalid address_map.{} '{}'", field, value))?;
            u32::try_from(bytes)
                .map_err(|_| anyhow::anyhow!("address_map.{} '{}' exceeds the 32-bit bus", field, value))
        };

        let map = Self {
            spi_base: cfg.spi_base,
            spi_stride: size("spi_stride", &cfg.spi_stride)?,
            i3c_base: cfg.i3c_base,
            i3c_size: size("i3c_size", &cfg.i3c_size)?,
            gpio_base: cfg.gpio_base,
            gpio_size: size("gpio_size", &cfg.gpio_size)?,
        };
        map.validate()?;
        Ok(map)
    }

    fn validate(&self) -> anyhow::Result<()> {
        // Checked in u64 before any window base is computed in u32.
        let spi_span = SpiInstance::ALL.len() as u64 * self.spi_stride as u64;
        let spi_end = self.spi_base as u64 + spi_span;
        if spi_end > 1u64 << 32 {
            anyhow::bail!(
                "SPI windows at {:#010x} with stride {:#x} run past the end of the address space",
                self.spi_base,
                self.spi_stride
            );
        }

        let ranges = self.ranges();
        for r in &ranges {
            if r.size < r.peripheral.register_span() {
                anyhow::bail!(
                    "Window of {} ({:#x} bytes) is smaller than its register layout ({:#x} bytes)",
                    r.peripheral,
                    r.size,
                    r.peripheral.register_span()
                );
            }
            if r.base as u64 + r.size as u64 > 1u64 << 32 {
                anyhow::bail!("Window of {} runs past the end of the address space", r.peripheral);
            }
        }
        for (i, a) in ranges.iter().enumerate() {
            for b in &ranges[i + 1..] {
                if a.overlaps(b) {
                    anyhow::bail!(
                        "Address windows of {} ({:#010x}) and {} ({:#010x}) overlap",
                        a.peripheral,
                        a.base,
                        b.peripheral,
                        b.base
                    );
                }
            }
        }
        Ok(())
    }

    pub fn base(&self, peripheral: PeripheralId) -> u32 {
        match peripheral {
            PeripheralId::Spi(n) => self.spi_base + n.index() * self.spi_stride,
            PeripheralId::I3c => self.i3c_base,
            PeripheralId::Gpio => self.gpio_base,
        }
    }

    pub fn size(&self, peripheral: PeripheralId) -> u32 {
        match peripheral {
            PeripheralId::Spi(_) => self.spi_stride,
            PeripheralId::I3c => self.i3c_size,
            PeripheralId::Gpio => self.gpio_size,
        }
    }

    pub fn resolve(&self, register: Register) -> u32 {
        self.base(register.peripheral()) + register.offset()
    }

    pub fn ranges(&self) -> Vec<AddressRange> {
        PeripheralId::ALL
            .into_iter()
            .map(|peripheral| AddressRange {
                peripheral,
                base: self.base(peripheral),
                size: self.size(peripheral),
            })
            .collect()
    }

    /// Peripheral and window offset for `addr`, if any window decodes it.
    pub fn decode(&self, addr: u32) -> Option<(PeripheralId, u32)> {
        self.ranges()
            .into_iter()
            .find(|r| r.contains(addr))
            .map(|r| (r.peripheral, addr - r.base))
    }

    pub fn is_mapped(&self, addr: u32) -> bool {
        self.decode(addr).is_some()
    }

    pub fn entries(&self) -> Vec<CatalogEntry> {
        Register::all()
            .into_iter()
            .map(|register| CatalogEntry {
                register,
                base: self.base(register.peripheral()),
                address: self.resolve(register),
            })
            .collect()
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct SpiCfg: u32 {
        const CPOL = 1 << 0;
        const CPHA = 1 << 1;
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct SpiCtrl: u32 {
        const SS = 1 << 0;
        const ENABLE = 1 << 1;
        const RX_EN = 1 << 2;
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct SpiStatus: u32 {
        const TX_E = 1 << 0;
        const TX_F = 1 << 1;
        const RX_E = 1 << 2;
        const RX_F = 1 << 3;
        const TX_B = 1 << 4;
        const RX_A = 1 << 5;
        const BUSY = 1 << 6;
        const DONE = 1 << 7;
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct I3cCtrl: u32 {
        const ENABLE = 1 << 0;
        const START = 1 << 1;
        const STOP = 1 << 2;
        const READ_MODE = 1 << 3;
        const WRITE_MODE = 1 << 4;
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct I3cStatus: u32 {
        const BUSY = 1 << 0;
        const DONE = 1 << 1;
        const ACK_RECEIVED = 1 << 2;
        const ERROR = 1 << 3;
    }
}

bitflags! {
    /// GPIO interrupt sources, shared by IM/RIS/MIS/IC.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct GpioIrq: u32 {
        const P0HI = 1 << 0;
        const P1HI = 1 << 1;
        const P0LO = 1 << 8;
        const P1LO = 1 << 9;
        const P0PE = 1 << 16;
        const P1PE = 1 << 17;
        const P0NE = 1 << 24;
        const P1NE = 1 << 25;
    }
}

/// Human-readable decoding of a value read from `register`, for logs.
pub fn describe(register: Register, value: u32) -> Option<String> {
    match register {
        Register::Spi(_, SpiReg::Status) => Some(format!("{:?}", SpiStatus::from_bits_retain(value))),
        Register::Spi(_, SpiReg::Ctrl) => Some(format!("{:?}", SpiCtrl::from_bits_retain(value))),
        Register::Spi(_, SpiReg::Cfg) => Some(format!("{:?}", SpiCfg::from_bits_retain(value))),
        Register::I3c(I3cReg::Status) => Some(format!("{:?}", I3cStatus::from_bits_retain(value))),
        Register::I3c(I3cReg::Ctrl) => Some(format!("{:?}", I3cCtrl::from_bits_retain(value))),
        Register::Gpio(GpioReg::Im | GpioReg::Ris | GpioReg::Mis) => {
            Some(format!("{:?}", GpioIrq::from_bits_retain(value)))
        }
        _ => None,
    }
}
