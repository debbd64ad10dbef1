//! MMU (Memory Management Unit) functions and structures.
//!
//! Routes every CPU (and DMA) memory access to the owning
//! component according to the system memory map.

use crate::{
    consts::{
        DMA_ADDR, IE_ADDR, IF_ADDR, INT_PAD, INT_SERIAL, INT_STAT, INT_TIMER, INT_VBLANK,
        JOYP_ADDR,
    },
    dma::Dma,
    gb::Components,
    pad::Pad,
    ppu::Ppu,
    ram::Ram,
    rom::Cartridge,
    serial::Serial,
    timer::Timer,
    warnln,
};

pub trait BusComponent {
    fn read(&self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, value: u8);

    fn read_many(&self, addr: u16, count: usize) -> Vec<u8> {
        (0..count)
            .map(|offset| self.read(addr + offset as u16))
            .collect()
    }

    fn write_many(&mut self, addr: u16, values: &[u8]) {
        for (offset, &value) in values.iter().enumerate() {
            self.write(addr + offset as u16, value);
        }
    }
}

pub struct Mmu {
    /// Register that controls the interrupts that are considered
    /// to be enabled and should be triggered.
    pub ie: u8,

    /// Reference to the PPU (Picture Processing Unit) that is
    /// going to be used both for VRAM and OAM access and for
    /// register reading/writing.
    ppu: Ppu,

    /// Reference to the DMA controller in charge of the OAM
    /// transfer operations.
    dma: Dma,

    /// Reference to the gamepad structure that controls the
    /// joypad register.
    pad: Pad,

    /// The timer controller, memory mapped in 0xFF04-0xFF07.
    timer: Timer,

    /// The serial transfer controller, memory mapped in
    /// 0xFF01-0xFF02.
    serial: Serial,

    /// The cartridge that is currently loaded into the system,
    /// used for both ROM and external RAM access.
    rom: Cartridge,

    /// The internal storage of the system, both WRAM and HRAM.
    ram: Ram,
}

impl Mmu {
    pub fn new(components: Components) -> Self {
        Self {
            ie: 0x0,
            ppu: components.ppu,
            dma: components.dma,
            pad: components.pad,
            timer: components.timer,
            serial: components.serial,
            rom: Cartridge::new(),
            ram: components.ram,
        }
    }

    pub fn reset(&mut self) {
        self.ie = 0x0;
        self.rom = Cartridge::new();
        self.ppu.reset();
        self.dma.reset();
        self.pad.reset();
        self.timer.reset();
        self.serial.reset();
        self.ram.reset();
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            // 0x0000-0x3FFF - Cartridge ROM bank 0
            // 0x4000-0x7FFF - Cartridge ROM bank N (MBC selected)
            0x0000..=0x7fff => self.rom.read(addr),

            // 0x8000-0x9FFF - Graphics: VRAM (8 KB)
            0x8000..=0x9fff => self.ppu.read(addr),

            // 0xA000-0xBFFF - Cartridge external RAM (8 KB)
            0xa000..=0xbfff => self.rom.read(addr),

            // 0xC000-0xDFFF - Working RAM (8 KB)
            0xc000..=0xdfff => self.ram.read_wram(addr),

            // 0xE000-0xFDFF - Working RAM echo
            0xe000..=0xfdff => self.ram.read_wram(addr),

            // 0xFE00-0xFE9F - Object attribute memory (OAM),
            // unreadable while an OAM DMA transfer is in flight
            0xfe00..=0xfe9f => {
                if self.dma.active() {
                    0xff
                } else {
                    self.ppu.read(addr)
                }
            }

            // 0xFEA0-0xFEFF - Not usable
            0xfea0..=0xfeff => 0xff,

            // 0xFF00 - Joypad input
            JOYP_ADDR => self.pad.read(addr),

            // 0xFF01-0xFF02 - Serial data transfer
            0xff01..=0xff02 => self.serial.read(addr),

            // 0xFF04-0xFF07 - Timer and divider
            0xff04..=0xff07 => self.timer.read(addr),

            // 0xFF0F — IF: Interrupt flag, composed from the
            // per-component interrupt lines
            IF_ADDR => {
                (if self.ppu.int_vblank() { INT_VBLANK } else { 0x00 }
                    | if self.ppu.int_stat() { INT_STAT } else { 0x00 }
                    | if self.timer.int_tima() { INT_TIMER } else { 0x00 }
                    | if self.serial.int_serial() { INT_SERIAL } else { 0x00 }
                    | if self.pad.int_pad() { INT_PAD } else { 0x00 }
                    | 0xe0)
            }

            // 0xFF10-0xFF3F — Audio registers, not implemented
            0xff10..=0xff3f => 0xff,

            // 0xFF40-0xFF45 - PPU registers
            // 0xFF47-0xFF4B - PPU registers
            0xff40..=0xff45 | 0xff47..=0xff4b => self.ppu.read(addr),

            // 0xFF46 — DMA: OAM DMA source address & start
            DMA_ADDR => self.dma.read(addr),

            // 0xFF80-0xFFFE - High RAM (HRAM)
            0xff80..=0xfffe => self.ram.read_hram(addr),

            // 0xFFFF — IE: Interrupt enable
            IE_ADDR => self.ie,

            addr => {
                warnln!("Reading from unknown location 0x{:04x}", addr);
                0xff
            }
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            // 0x0000-0x7FFF - Cartridge ROM, interpreted by the MBC
            0x0000..=0x7fff => self.rom.write(addr, value),

            // 0x8000-0x9FFF - Graphics: VRAM (8 KB)
            0x8000..=0x9fff => self.ppu.write(addr, value),

            // 0xA000-0xBFFF - Cartridge external RAM (8 KB)
            0xa000..=0xbfff => self.rom.write(addr, value),

            // 0xC000-0xDFFF - Working RAM (8 KB)
            0xc000..=0xdfff => self.ram.write_wram(addr, value),

            // 0xE000-0xFDFF - Working RAM echo
            0xe000..=0xfdff => self.ram.write_wram(addr, value),

            // 0xFE00-0xFE9F - Object attribute memory (OAM)
            0xfe00..=0xfe9f => self.ppu.write(addr, value),

            // 0xFEA0-0xFEFF - Not usable
            0xfea0..=0xfeff => {}

            // 0xFF00 - Joypad input
            JOYP_ADDR => self.pad.write(addr, value),

            // 0xFF01-0xFF02 - Serial data transfer
            0xff01..=0xff02 => self.serial.write(addr, value),

            // 0xFF04-0xFF07 - Timer and divider
            0xff04..=0xff07 => self.timer.write(addr, value),

            // 0xFF0F — IF: Interrupt flag
            IF_ADDR => {
                self.ppu.set_int_vblank(value & INT_VBLANK != 0);
                self.ppu.set_int_stat(value & INT_STAT != 0);
                self.timer.set_int_tima(value & INT_TIMER != 0);
                self.serial.set_int_serial(value & INT_SERIAL != 0);
                self.pad.set_int_pad(value & INT_PAD != 0);
            }

            // 0xFF10-0xFF3F — Audio registers, not implemented
            0xff10..=0xff3f => {}

            // 0xFF40-0xFF45 - PPU registers
            // 0xFF47-0xFF4B - PPU registers
            0xff40..=0xff45 | 0xff47..=0xff4b => self.ppu.write(addr, value),

            // 0xFF46 — DMA: OAM DMA source address & start
            DMA_ADDR => self.dma.write(addr, value),

            // 0xFF80-0xFFFE - High RAM (HRAM)
            0xff80..=0xfffe => self.ram.write_hram(addr, value),

            // 0xFFFF — IE: Interrupt enable
            IE_ADDR => self.ie = value,

            addr => warnln!("Writing to unknown location 0x{:04x}", addr),
        }
    }

    /// Reads a 16 bit value by composing two byte reads in
    /// little-endian order.
    pub fn read16(&self, addr: u16) -> u16 {
        self.read(addr) as u16 | (self.read(addr.wrapping_add(1)) as u16) << 8
    }

    /// Writes a 16 bit value as two byte writes in little-endian
    /// order.
    pub fn write16(&mut self, addr: u16, value: u16) {
        self.write(addr, value as u8);
        self.write(addr.wrapping_add(1), (value >> 8) as u8);
    }

    /// Clocks the OAM DMA engine, once per elapsed machine cycle.
    /// Each tick copies one byte from the source page into OAM,
    /// bypassing the OAM access restriction.
    pub fn clock_dma(&mut self, cycles: u16) {
        if !self.dma.active() {
            return;
        }
        for _ in 0..cycles / 4 {
            if let Some((source, offset)) = self.dma.tick() {
                let value = self.read(source);
                self.ppu.write_oam_dma(offset, value);
            }
        }
    }

    /// Acknowledges the given interrupt source, clearing the
    /// respective line on the owning component.
    pub fn ack_interrupt(&mut self, mask: u8) {
        match mask {
            INT_VBLANK => self.ppu.ack_vblank(),
            INT_STAT => self.ppu.ack_stat(),
            INT_TIMER => self.timer.ack_tima(),
            INT_SERIAL => self.serial.ack_serial(),
            INT_PAD => self.pad.ack_pad(),
            mask => warnln!("Acknowledging unknown interrupt 0x{:02x}", mask),
        }
    }

    pub fn ppu(&mut self) -> &mut Ppu {
        &mut self.ppu
    }

    pub fn ppu_i(&self) -> &Ppu {
        &self.ppu
    }

    pub fn dma(&mut self) -> &mut Dma {
        &mut self.dma
    }

    pub fn dma_i(&self) -> &Dma {
        &self.dma
    }

    pub fn pad(&mut self) -> &mut Pad {
        &mut self.pad
    }

    pub fn pad_i(&self) -> &Pad {
        &self.pad
    }

    pub fn timer(&mut self) -> &mut Timer {
        &mut self.timer
    }

    pub fn timer_i(&self) -> &Timer {
        &self.timer
    }

    pub fn serial(&mut self) -> &mut Serial {
        &mut self.serial
    }

    pub fn serial_i(&self) -> &Serial {
        &self.serial
    }

    pub fn rom(&mut self) -> &mut Cartridge {
        &mut self.rom
    }

    pub fn rom_i(&self) -> &Cartridge {
        &self.rom
    }

    pub fn set_rom(&mut self, rom: Cartridge) {
        self.rom = rom;
    }

    pub fn ram(&mut self) -> &mut Ram {
        &mut self.ram
    }

    pub fn ram_i(&self) -> &Ram {
        &self.ram
    }
}

impl Default for Mmu {
    fn default() -> Self {
        Mmu::new(Components::default())
    }
}

#[cfg(test)]
mod tests {
    use crate::consts::{DMA_ADDR, IE_ADDR, IF_ADDR};

    use super::Mmu;

    #[test]
    fn test_wram_echo() {
        let mut mmu = Mmu::default();
        mmu.write(0xc080, 0x42);
        assert_eq!(mmu.read(0xe080), 0x42);
    }

    #[test]
    fn test_unusable_region() {
        let mut mmu = Mmu::default();
        mmu.write(0xfea0, 0x42);
        assert_eq!(mmu.read(0xfea0), 0xff);
    }

    #[test]
    fn test_if_compose_decompose() {
        let mut mmu = Mmu::default();
        assert_eq!(mmu.read(IF_ADDR), 0xe0);

        mmu.write(IF_ADDR, 0x05);
        assert_eq!(mmu.read(IF_ADDR), 0xe5);
        assert!(mmu.ppu_i().int_vblank());
        assert!(mmu.timer_i().int_tima());

        mmu.write(IF_ADDR, 0x00);
        assert_eq!(mmu.read(IF_ADDR), 0xe0);
    }

    #[test]
    fn test_ie_register() {
        let mut mmu = Mmu::default();
        mmu.write(IE_ADDR, 0x1f);
        assert_eq!(mmu.read(IE_ADDR), 0x1f);
        assert_eq!(mmu.ie, 0x1f);
    }

    #[test]
    fn test_read16_write16() {
        let mut mmu = Mmu::default();
        mmu.write16(0xc000, 0x1234);
        assert_eq!(mmu.read(0xc000), 0x34);
        assert_eq!(mmu.read(0xc001), 0x12);
        assert_eq!(mmu.read16(0xc000), 0x1234);
    }

    #[test]
    fn test_dma_transfer() {
        let mut mmu = Mmu::default();
        for index in 0..0xa0u16 {
            mmu.write(0xc000 + index, index as u8);
        }

        mmu.write(DMA_ADDR, 0xc0);

        // OAM reads are blocked while the transfer is in flight
        assert_eq!(mmu.read(0xfe00), 0xff);

        // two machine cycles of start delay plus one per byte
        mmu.clock_dma(162 * 4);
        assert!(!mmu.dma_i().active());

        for index in 0..0xa0u16 {
            assert_eq!(mmu.read(0xfe00 + index), index as u8);
        }
    }
}
