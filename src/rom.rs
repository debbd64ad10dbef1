//! Cartridge (ROM) related functions and structures.

use core::fmt;
use std::fmt::{Display, Formatter};

use monoboy_common::{
    error::Error,
    util::{read_file, write_file},
};

use crate::{debugln, mmu::BusComponent, warnln};

pub const ROM_BANK_SIZE: usize = 16384;
pub const RAM_BANK_SIZE: usize = 8192;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RomType {
    RomOnly = 0x00,
    Mbc1 = 0x01,
    Mbc1Ram = 0x02,
    Mbc1RamBattery = 0x03,
    Unknown = 0xef,
}

impl RomType {
    pub fn description(&self) -> &'static str {
        match self {
            RomType::RomOnly => "ROM Only",
            RomType::Mbc1 => "MBC1",
            RomType::Mbc1Ram => "MBC1 + RAM",
            RomType::Mbc1RamBattery => "MBC1 + RAM + Battery",
            RomType::Unknown => "Unknown",
        }
    }
}

impl Display for RomType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RomSize {
    Size32K,
    Size64K,
    Size128K,
    Size256K,
    Size512K,
    Size1M,
    Size2M,
    Size4M,
    Size8M,
    SizeUnknown,
}

impl RomSize {
    pub fn description(&self) -> &'static str {
        match self {
            RomSize::Size32K => "32 KB",
            RomSize::Size64K => "64 KB",
            RomSize::Size128K => "128 KB",
            RomSize::Size256K => "256 KB",
            RomSize::Size512K => "512 KB",
            RomSize::Size1M => "1 MB",
            RomSize::Size2M => "2 MB",
            RomSize::Size4M => "4 MB",
            RomSize::Size8M => "8 MB",
            RomSize::SizeUnknown => "Unknown",
        }
    }

    pub fn rom_banks(&self) -> u16 {
        match self {
            RomSize::Size32K => 2,
            RomSize::Size64K => 4,
            RomSize::Size128K => 8,
            RomSize::Size256K => 16,
            RomSize::Size512K => 32,
            RomSize::Size1M => 64,
            RomSize::Size2M => 128,
            RomSize::Size4M => 256,
            RomSize::Size8M => 512,
            RomSize::SizeUnknown => 0,
        }
    }
}

impl Display for RomSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RamSize {
    NoRam,
    Unused,
    Size8K,
    Size32K,
    Size64K,
    Size128K,
    SizeUnknown,
}

impl RamSize {
    pub fn description(&self) -> &'static str {
        match self {
            RamSize::NoRam => "No RAM",
            RamSize::Unused => "Unused",
            RamSize::Size8K => "8 KB",
            RamSize::Size32K => "32 KB",
            RamSize::Size64K => "64 KB",
            RamSize::Size128K => "128 KB",
            RamSize::SizeUnknown => "Unknown",
        }
    }

    pub fn ram_banks(&self) -> u16 {
        match self {
            RamSize::NoRam => 0,
            RamSize::Unused => 0,
            RamSize::Size8K => 1,
            RamSize::Size32K => 4,
            RamSize::Size64K => 8,
            RamSize::Size128K => 16,
            RamSize::SizeUnknown => 0,
        }
    }
}

impl Display for RamSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Structure that defines the ROM and RAM contents of a Game Boy
/// cartridge, together with the banking state of its MBC (Memory
/// Bank Controller).
pub struct Cartridge {
    /// The complete data of the ROM cartridge, including the
    /// complete set of ROM banks.
    rom_data: Vec<u8>,

    /// The external RAM of the cartridge, concatenating all of
    /// the allocated 8 KiB banks in index order.
    ram_data: Vec<u8>,

    /// Path of the file the cartridge was loaded from, used to
    /// derive the path of the battery save file.
    path: Option<String>,

    /// The MBC implementation in charge of handling the memory
    /// access for the current cartridge.
    mbc: &'static Mbc,

    rom_bank_count: u16,
    ram_bank_count: u16,

    /// The offset of the ROM bank currently mapped in the
    /// switchable 0x4000-0x7FFF window.
    rom_offset: usize,

    /// The offset of the ROM bank mapped in the 0x0000-0x3FFF
    /// window, non zero only in MBC1 banking mode 1.
    rom_base_offset: usize,

    /// The offset of the external RAM bank currently mapped
    /// in the 0xA000-0xBFFF window.
    ram_offset: usize,

    /// If access to the external RAM is currently enabled,
    /// protecting its contents from stray writes.
    ram_enabled: bool,

    /// The 5 bit ROM bank number register (a written value of
    /// zero is interpreted as one).
    rom_bank_value: u8,

    /// The 2 bit secondary bank register, providing either the
    /// upper ROM bank bits or the RAM bank number.
    bank2: u8,

    /// The banking mode select register (0 = ROM banking,
    /// 1 = RAM banking).
    banking_mode: u8,

    /// If the cartridge carries a battery, making the external
    /// RAM contents persistent.
    battery: bool,

    /// Dirty flag, set whenever battery-backed RAM has been
    /// written and not yet persisted.
    need_save: bool,
}

impl Cartridge {
    pub fn new() -> Self {
        Self {
            rom_data: vec![],
            ram_data: vec![],
            path: None,
            mbc: &NO_MBC,
            rom_bank_count: 0,
            ram_bank_count: 0,
            rom_offset: ROM_BANK_SIZE,
            rom_base_offset: 0,
            ram_offset: 0,
            ram_enabled: false,
            rom_bank_value: 1,
            bank2: 0,
            banking_mode: 0,
            battery: false,
            need_save: false,
        }
    }

    pub fn from_data(data: &[u8]) -> Result<Self, Error> {
        let mut cartridge = Cartridge::new();
        cartridge.set_data(data)?;
        Ok(cartridge)
    }

    pub fn from_file(path: &str) -> Result<Self, Error> {
        let data = read_file(path)?;
        let mut cartridge = Self::from_data(&data)?;
        cartridge.path = Some(String::from(path));
        cartridge.load_battery();
        Ok(cartridge)
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            // 0x0000-0x7FFF: 16 KiB ROM bank 00 & 16 KiB ROM bank 01-NN
            0x0000..=0x7fff => (self.mbc.read_rom)(self, addr),
            // 0xA000-0xBFFF: 8 KiB external RAM
            0xa000..=0xbfff => (self.mbc.read_ram)(self, addr),
            _ => {
                debugln!("Reading from unknown Cartridge location 0x{:04x}", addr);
                0xff
            }
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            // 0x0000-0x7FFF: MBC control registers
            0x0000..=0x7fff => (self.mbc.write_rom)(self, addr, value),
            // 0xA000-0xBFFF: 8 KiB external RAM
            0xa000..=0xbfff => (self.mbc.write_ram)(self, addr, value),
            _ => debugln!("Writing to unknown Cartridge location 0x{:04x}", addr),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn set_data(&mut self, data: &[u8]) -> Result<(), Error> {
        self.ensure_data(data)?;
        self.rom_data = data.to_vec();
        self.mbc = self.mbc()?;
        self.rom_bank_count = self.rom_size().rom_banks();
        self.ram_bank_count = self.ram_size().ram_banks();
        self.battery = self.rom_type() == RomType::Mbc1RamBattery;
        self.need_save = false;
        self.allocate_ram();
        self.rom_bank_value = 1;
        self.bank2 = 0;
        self.banking_mode = 0;
        self.ram_enabled = false;
        self.update_offsets();
        Ok(())
    }

    /// Ensures that the data provided is of a valid Game Boy ROM,
    /// meaning that its size is within the expected range.
    fn ensure_data(&self, data: &[u8]) -> Result<(), Error> {
        if data.len() < 0x8000 {
            return Err(Error::RomSize);
        }
        if data.len() % ROM_BANK_SIZE != 0 {
            return Err(Error::RomSize);
        }
        Ok(())
    }

    fn mbc(&self) -> Result<&'static Mbc, Error> {
        Ok(match self.rom_type() {
            RomType::RomOnly => &NO_MBC,
            RomType::Mbc1 | RomType::Mbc1Ram | RomType::Mbc1RamBattery => &MBC1,
            RomType::Unknown => return Err(Error::RomType),
        })
    }

    fn allocate_ram(&mut self) {
        let ram_banks = self.ram_bank_count.max(1);
        self.ram_data = vec![0u8; ram_banks as usize * RAM_BANK_SIZE];
    }

    /// Recomputes the mapping offsets of both ROM windows and of the
    /// external RAM window from the current banking registers.
    fn update_offsets(&mut self) {
        let bank_mask = self.rom_bank_count.max(2) as usize - 1;

        let bank = (((self.bank2 as usize) << 5) | self.rom_bank_value as usize) & bank_mask;
        self.rom_offset = bank * ROM_BANK_SIZE;

        if self.banking_mode == 0x01 {
            self.rom_base_offset = (((self.bank2 as usize) << 5) & bank_mask) * ROM_BANK_SIZE;
            self.ram_offset = if self.ram_bank_count > 0 {
                (self.bank2 as usize % self.ram_bank_count as usize) * RAM_BANK_SIZE
            } else {
                0
            };
        } else {
            self.rom_base_offset = 0;
            self.ram_offset = 0;
        }
    }

    fn load_battery(&mut self) {
        if !self.battery {
            return;
        }
        let Some(path) = self.battery_path() else {
            return;
        };
        // a missing battery file just means that the game has
        // not been saved yet
        let Ok(data) = read_file(&path) else {
            return;
        };
        let count = data.len().min(self.ram_data.len());
        self.ram_data[..count].copy_from_slice(&data[..count]);
    }

    pub fn save_battery(&mut self) -> Result<(), Error> {
        if !self.battery {
            return Ok(());
        }
        let Some(path) = self.battery_path() else {
            return Ok(());
        };
        write_file(&path, &self.ram_data, None)?;
        self.need_save = false;
        Ok(())
    }

    /// Persists the battery-backed RAM in case there are pending
    /// changes, logging (and otherwise ignoring) I/O failures so
    /// that emulation is never interrupted by them.
    pub fn flush_battery(&mut self) {
        if !self.need_save {
            return;
        }
        if let Err(error) = self.save_battery() {
            warnln!("Failed to save battery file: {}", error);
        }
    }

    pub fn battery_path(&self) -> Option<String> {
        self.path.as_ref().map(|path| format!("{}.battery", path))
    }

    pub fn title(&self) -> String {
        let mut offset = 0;
        for byte in &self.rom_data[0x0134..=0x0143] {
            if *byte == 0u8 {
                break;
            }
            offset += 1;
        }
        String::from(
            std::str::from_utf8(&self.rom_data[0x0134..0x0134 + offset])
                .unwrap_or("")
                .trim(),
        )
    }

    pub fn rom_type(&self) -> RomType {
        if self.rom_data.len() < 0x0148 {
            return RomType::Unknown;
        }
        match self.rom_data[0x0147] {
            0x00 => RomType::RomOnly,
            0x01 => RomType::Mbc1,
            0x02 => RomType::Mbc1Ram,
            0x03 => RomType::Mbc1RamBattery,
            _ => RomType::Unknown,
        }
    }

    pub fn rom_size(&self) -> RomSize {
        if self.rom_data.len() < 0x0149 {
            return RomSize::SizeUnknown;
        }
        match self.rom_data[0x0148] {
            0x00 => RomSize::Size32K,
            0x01 => RomSize::Size64K,
            0x02 => RomSize::Size128K,
            0x03 => RomSize::Size256K,
            0x04 => RomSize::Size512K,
            0x05 => RomSize::Size1M,
            0x06 => RomSize::Size2M,
            0x07 => RomSize::Size4M,
            0x08 => RomSize::Size8M,
            _ => RomSize::SizeUnknown,
        }
    }

    pub fn ram_size(&self) -> RamSize {
        if self.rom_data.len() < 0x014a {
            return RamSize::SizeUnknown;
        }
        match self.rom_data[0x0149] {
            0x00 => RamSize::NoRam,
            0x01 => RamSize::Unused,
            0x02 => RamSize::Size8K,
            0x03 => RamSize::Size32K,
            0x04 => RamSize::Size128K,
            0x05 => RamSize::Size64K,
            _ => RamSize::SizeUnknown,
        }
    }

    pub fn has_battery(&self) -> bool {
        self.battery
    }

    /// Computes the header checksum over 0x0134-0x014C, matching
    /// the value stored at 0x014D for valid cartridges.
    pub fn checksum(&self) -> u8 {
        let mut sum: u8 = 0;
        for index in 0x0134..=0x014c {
            sum = sum.wrapping_sub(self.rom_data[index]).wrapping_sub(1);
        }
        sum
    }

    pub fn valid_checksum(&self) -> bool {
        self.rom_data[0x014d] == self.checksum()
    }

    #[inline(always)]
    pub fn ram_enabled(&self) -> bool {
        self.ram_enabled
    }

    #[inline(always)]
    pub fn need_save(&self) -> bool {
        self.need_save
    }

    pub fn rom_bank(&self) -> u16 {
        (self.rom_offset / ROM_BANK_SIZE) as u16
    }

    pub fn ram_bank(&self) -> u8 {
        (self.ram_offset / RAM_BANK_SIZE) as u8
    }

    pub fn rom_data(&self) -> &Vec<u8> {
        &self.rom_data
    }

    pub fn ram_data(&self) -> &Vec<u8> {
        &self.ram_data
    }

    pub fn set_ram_data(&mut self, data: &[u8]) {
        let count = data.len().min(self.ram_data.len());
        self.ram_data[..count].copy_from_slice(&data[..count]);
    }

    pub fn description(&self, column_length: usize) -> String {
        let title_l = format!("{:width$}", "Title", width = column_length);
        let type_l = format!("{:width$}", "Type", width = column_length);
        let rom_size_l = format!("{:width$}", "ROM Size", width = column_length);
        let ram_size_l = format!("{:width$}", "RAM Size", width = column_length);
        let checksum_l = format!("{:width$}", "Checksum", width = column_length);
        format!(
            "{}  {}\n{}  {}\n{}  {}\n{}  {}\n{}  {}",
            title_l,
            self.title(),
            type_l,
            self.rom_type(),
            rom_size_l,
            self.rom_size(),
            ram_size_l,
            self.ram_size(),
            checksum_l,
            if self.valid_checksum() {
                "PASSED"
            } else {
                "FAILED"
            }
        )
    }
}

impl BusComponent for Cartridge {
    fn read(&self, addr: u16) -> u8 {
        self.read(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.write(addr, value);
    }
}

impl Default for Cartridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Cartridge {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description(9))
    }
}

pub struct Mbc {
    pub name: &'static str,
    pub read_rom: fn(rom: &Cartridge, addr: u16) -> u8,
    pub write_rom: fn(rom: &mut Cartridge, addr: u16, value: u8),
    pub read_ram: fn(rom: &Cartridge, addr: u16) -> u8,
    pub write_ram: fn(rom: &mut Cartridge, addr: u16, value: u8),
}

pub static NO_MBC: Mbc = Mbc {
    name: "No MBC",
    read_rom: |rom: &Cartridge, addr: u16| -> u8 {
        *rom.rom_data.get(addr as usize).unwrap_or(&0xff)
    },
    write_rom: |_rom: &mut Cartridge, _addr: u16, _value: u8| {
        // some games write to MBC registers regardless of the
        // cartridge type, these writes are simply ignored
        debugln!("Ignoring write to Cartridge ROM location 0x{:04x}", _addr);
    },
    read_ram: |rom: &Cartridge, addr: u16| -> u8 {
        *rom.ram_data.get((addr - 0xa000) as usize).unwrap_or(&0xff)
    },
    write_ram: |rom: &mut Cartridge, addr: u16, value: u8| {
        let index = (addr - 0xa000) as usize;
        if index < rom.ram_data.len() {
            rom.ram_data[index] = value;
        }
    },
};

pub static MBC1: Mbc = Mbc {
    name: "MBC1",
    read_rom: |rom: &Cartridge, addr: u16| -> u8 {
        match addr {
            // 0x0000-0x3FFF - ROM bank 0, remappable in mode 1
            0x0000..=0x3fff => *rom
                .rom_data
                .get(rom.rom_base_offset + addr as usize)
                .unwrap_or(&0xff),
            // 0x4000-0x7FFF - ROM bank 01-7F
            0x4000..=0x7fff => *rom
                .rom_data
                .get(rom.rom_offset + (addr - 0x4000) as usize)
                .unwrap_or(&0xff),
            _ => {
                warnln!("Reading from unknown Cartridge ROM location 0x{:04x}", addr);
                0xff
            }
        }
    },
    write_rom: |rom: &mut Cartridge, addr: u16, value: u8| {
        match addr {
            // 0x0000-0x1FFF - RAM enable flag
            0x0000..=0x1fff => {
                rom.ram_enabled = (value & 0x0f) == 0x0a;
                if !rom.ram_enabled {
                    rom.flush_battery();
                }
            }
            // 0x2000-0x3FFF - ROM bank number, 5 lower bits
            0x2000..=0x3fff => {
                let mut bank = value & 0x1f;
                if bank == 0 {
                    bank = 1;
                }
                rom.rom_bank_value = bank;
                rom.update_offsets();
            }
            // 0x4000-0x5FFF - secondary bank number (upper ROM bank
            // bits or RAM bank, depending on the banking mode)
            0x4000..=0x5fff => {
                rom.bank2 = value & 0x03;
                rom.flush_battery();
                rom.update_offsets();
            }
            // 0x6000-0x7FFF - banking mode select
            0x6000..=0x7fff => {
                rom.banking_mode = value & 0x01;
                rom.flush_battery();
                rom.update_offsets();
            }
            _ => warnln!("Writing to unknown Cartridge ROM location 0x{:04x}", addr),
        }
    },
    read_ram: |rom: &Cartridge, addr: u16| -> u8 {
        if !rom.ram_enabled || rom.ram_bank_count == 0 {
            return 0xff;
        }
        rom.ram_data[rom.ram_offset + (addr - 0xa000) as usize]
    },
    write_ram: |rom: &mut Cartridge, addr: u16, value: u8| {
        if !rom.ram_enabled || rom.ram_bank_count == 0 {
            debugln!("Ignoring write to disabled Cartridge RAM");
            return;
        }
        rom.ram_data[rom.ram_offset + (addr - 0xa000) as usize] = value;
        if rom.battery {
            rom.need_save = true;
        }
    },
};

#[cfg(test)]
mod tests {
    use super::{Cartridge, RamSize, RomSize, RomType, RAM_BANK_SIZE, ROM_BANK_SIZE};

    fn build_rom(rom_type: u8, rom_size: u8, ram_size: u8) -> Vec<u8> {
        let banks = 2usize << rom_size;
        let mut data = vec![0x00; banks * ROM_BANK_SIZE];
        data[0x0147] = rom_type;
        data[0x0148] = rom_size;
        data[0x0149] = ram_size;
        // tag every ROM bank with its own index for mapping checks
        for bank in 0..banks {
            data[bank * ROM_BANK_SIZE + 0x2000] = bank as u8;
        }
        data
    }

    #[test]
    fn test_header() {
        let mut data = build_rom(0x03, 0x02, 0x03);
        data[0x0134..0x0139].copy_from_slice(b"TESTS");
        let rom = Cartridge::from_data(&data).unwrap();

        assert_eq!(rom.title(), "TESTS");
        assert_eq!(rom.rom_type(), RomType::Mbc1RamBattery);
        assert_eq!(rom.rom_size(), RomSize::Size128K);
        assert_eq!(rom.ram_size(), RamSize::Size32K);
        assert!(rom.has_battery());
    }

    #[test]
    fn test_checksum() {
        let mut data = build_rom(0x00, 0x00, 0x00);
        let mut sum: u8 = 0;
        for index in 0x0134..=0x014c {
            sum = sum.wrapping_sub(data[index]).wrapping_sub(1);
        }
        data[0x014d] = sum;

        let rom = Cartridge::from_data(&data).unwrap();
        assert_eq!(rom.checksum(), sum);
        assert!(rom.valid_checksum());
    }

    #[test]
    fn test_invalid_size() {
        assert!(Cartridge::from_data(&[0x00; 0x4000]).is_err());
        assert!(Cartridge::from_data(&vec![0x00; 0x8001]).is_err());
    }

    #[test]
    fn test_rom_only_read() {
        let mut data = build_rom(0x00, 0x00, 0x00);
        data[0x0100] = 0x42;
        data[0x4000] = 0x24;
        let rom = Cartridge::from_data(&data).unwrap();

        assert_eq!(rom.read(0x0100), 0x42);
        assert_eq!(rom.read(0x4000), 0x24);
    }

    #[test]
    fn test_mbc1_rom_banking() {
        let data = build_rom(0x01, 0x02, 0x00);
        let mut rom = Cartridge::from_data(&data).unwrap();

        // bank 0 is always visible in the lower window and the
        // switchable window starts out at bank 1
        assert_eq!(rom.read(0x2000), 0x00);
        assert_eq!(rom.read(0x6000), 0x01);

        rom.write(0x2000, 0x05);
        assert_eq!(rom.rom_bank(), 0x05);
        assert_eq!(rom.read(0x6000), 0x05);

        // a written value of zero selects bank 1
        rom.write(0x2000, 0x00);
        assert_eq!(rom.read(0x6000), 0x01);

        // bank numbers beyond the ROM size are masked
        rom.write(0x2000, 0x1f);
        assert_eq!(rom.read(0x6000), 0x07);
    }

    #[test]
    fn test_mbc1_ram_enable() {
        let data = build_rom(0x02, 0x00, 0x02);
        let mut rom = Cartridge::from_data(&data).unwrap();

        assert_eq!(rom.read(0xa000), 0xff);
        rom.write(0xa000, 0x12);

        rom.write(0x0000, 0x0a);
        assert!(rom.ram_enabled());
        assert_eq!(rom.read(0xa000), 0x00);

        rom.write(0xa000, 0x12);
        assert_eq!(rom.read(0xa000), 0x12);

        rom.write(0x0000, 0x00);
        assert!(!rom.ram_enabled());
        assert_eq!(rom.read(0xa000), 0xff);
    }

    #[test]
    fn test_mbc1_ram_banking() {
        let data = build_rom(0x03, 0x00, 0x03);
        let mut rom = Cartridge::from_data(&data).unwrap();
        rom.write(0x0000, 0x0a);

        rom.write(0xa000, 0x11);

        // mode 1 makes the secondary register select the RAM bank
        rom.write(0x6000, 0x01);
        rom.write(0x4000, 0x02);
        assert_eq!(rom.ram_bank(), 0x02);
        rom.write(0xa000, 0x22);

        rom.write(0x4000, 0x00);
        assert_eq!(rom.read(0xa000), 0x11);
        rom.write(0x4000, 0x02);
        assert_eq!(rom.read(0xa000), 0x22);

        // mode 0 maps RAM bank 0 regardless of the register
        rom.write(0x6000, 0x00);
        assert_eq!(rom.read(0xa000), 0x11);

        assert_eq!(rom.ram_data()[2 * RAM_BANK_SIZE], 0x22);
    }

    #[test]
    fn test_mbc1_large_rom_banking() {
        // 1 MB ROM, the secondary register provides bank bits 5-6
        let data = build_rom(0x01, 0x05, 0x00);
        let mut rom = Cartridge::from_data(&data).unwrap();

        rom.write(0x2000, 0x12);
        rom.write(0x4000, 0x01);
        assert_eq!(rom.rom_bank(), 0x32);
        assert_eq!(rom.read(0x6000), 0x32);

        // in mode 1 the lower window is remapped to bank 0x20
        rom.write(0x6000, 0x01);
        assert_eq!(rom.read(0x2000), 0x20);

        // and back to bank 0 in mode 0
        rom.write(0x6000, 0x00);
        assert_eq!(rom.read(0x2000), 0x00);
    }

    #[test]
    fn test_battery_persistence() {
        use std::{env::temp_dir, fs::remove_file};

        use monoboy_common::util::write_file;

        let path = temp_dir().join("monoboy_battery_test.gb");
        let path = path.to_str().unwrap();
        write_file(path, &build_rom(0x03, 0x00, 0x02), None).unwrap();

        let mut rom = Cartridge::from_file(path).unwrap();
        rom.write(0x0000, 0x0a);
        rom.write(0xa000, 0x99);
        assert!(rom.need_save());

        // disabling RAM access triggers the battery save
        rom.write(0x0000, 0x00);
        assert!(!rom.need_save());

        let mut reloaded = Cartridge::from_file(path).unwrap();
        reloaded.write(0x0000, 0x0a);
        assert_eq!(reloaded.read(0xa000), 0x99);

        remove_file(path).unwrap();
        remove_file(rom.battery_path().unwrap()).unwrap();
    }

    #[test]
    fn test_need_save() {
        let data = build_rom(0x03, 0x00, 0x02);
        let mut rom = Cartridge::from_data(&data).unwrap();
        rom.write(0x0000, 0x0a);

        assert!(!rom.need_save());
        rom.write(0xa000, 0x55);
        assert!(rom.need_save());
    }
}
