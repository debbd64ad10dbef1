//! Game Boy emulation entrypoint and associated functions and structures.
//!
//! Most of the meaningful publicly available functions and structures to
//! build a working emulator are present here.
//!
//! # Examples
//!
//! Creates a simple [`GameBoy`] instance, loads an empty cartridge and
//! runs a couple of frames.
//!
//! ```rust
//! use monoboy::gb::GameBoy;
//! let mut game_boy = GameBoy::new();
//! game_boy.load_rom_empty().unwrap();
//! game_boy.boot();
//! let cycles = game_boy.next_frame().unwrap();
//! println!("Ran {} cycles", cycles);
//! ```

use std::fmt::{self, Display, Formatter};

use monoboy_common::error::Error;

use crate::{
    cpu::Cpu,
    devices::{buffer::BufferDevice, stdout::StdoutDevice},
    dma::Dma,
    info::Info,
    mmu::Mmu,
    pad::{Pad, PadKey},
    ppu::{Ppu, PpuMode, PpuRegisters, DISPLAY_HEIGHT, DISPLAY_SIZE, DISPLAY_WIDTH},
    ram::Ram,
    rom::Cartridge,
    serial::{NullDevice, Serial, SerialDevice},
    timer::Timer,
};

/// Aggregation structure allowing the bundling of all the
/// components of a Game Boy into a single element for easy
/// construction of the MMU.
pub struct Components {
    pub ppu: Ppu,
    pub dma: Dma,
    pub pad: Pad,
    pub timer: Timer,
    pub serial: Serial,
    pub ram: Ram,
}

impl Default for Components {
    fn default() -> Self {
        Self {
            ppu: Ppu::new(),
            dma: Dma::new(),
            pad: Pad::new(),
            timer: Timer::new(),
            serial: Serial::new(),
            ram: Ram::new(),
        }
    }
}

/// Snapshot of the CPU and PPU registers, to be used by
/// frontends and debuggers.
pub struct Registers {
    pub pc: u16,
    pub sp: u16,
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub scy: u8,
    pub scx: u8,
    pub wy: u8,
    pub wx: u8,
    pub ly: u8,
    pub lyc: u8,
}

/// Top level structure that abstracts the usage of the
/// Game Boy system under the Monoboy emulator.
///
/// Should serve as the main entry-point API.
pub struct GameBoy {
    /// If the PPU is enabled, it will be clocked.
    ppu_enabled: bool,

    /// If the timer is enabled, it will be clocked.
    timer_enabled: bool,

    /// If the DMA is enabled, it will be clocked.
    dma_enabled: bool,

    /// Reference to the Game Boy CPU component to be used as the
    /// main element of the system, when clocked, the amount of
    /// ticks from it drives the rest of the components.
    cpu: Cpu,

    /// The frame identifier last seen by the frame-boundary
    /// hooks, used to detect frame completion.
    frame_marker: u64,
}

impl GameBoy {
    pub fn new() -> Self {
        let mmu = Mmu::new(Components::default());
        let cpu = Cpu::new(mmu);

        Self {
            ppu_enabled: true,
            timer_enabled: true,
            dma_enabled: true,
            cpu,
            frame_marker: 0,
        }
    }

    /// Checks if the provided data represents a loadable ROM.
    pub fn verify_rom(data: &[u8]) -> bool {
        Cartridge::from_data(data).is_ok()
    }

    pub fn reset(&mut self) {
        self.cpu.mmu.reset();
        self.cpu.reset();
        self.frame_marker = 0;
    }

    /// Direct boot method that immediately jumps the machine to
    /// the post boot state, skipping the boot sequence and jumping
    /// to the cartridge execution.
    pub fn boot(&mut self) {
        self.cpu.boot();
    }

    pub fn load_cartridge(&mut self, rom: Cartridge) {
        self.cpu.mmu.set_rom(rom);
    }

    pub fn load_rom(&mut self, data: &[u8]) -> Result<(), Error> {
        let rom = Cartridge::from_data(data)?;
        self.load_cartridge(rom);
        Ok(())
    }

    pub fn load_rom_file(&mut self, path: &str) -> Result<(), Error> {
        let rom = Cartridge::from_file(path)?;
        self.load_cartridge(rom);
        Ok(())
    }

    /// Loads a zero filled cartridge, useful for testing and
    /// benchmarking purposes.
    pub fn load_rom_empty(&mut self) -> Result<(), Error> {
        self.load_rom(&vec![0x00; 0x8000])
    }

    /// Advances the machine by one step: runs one CPU instruction
    /// (or one halted/interrupt cycle) and clocks the remaining
    /// components by the elapsed time.
    ///
    /// Returns the number of T-cycles consumed by the step.
    pub fn clock(&mut self) -> Result<u16, Error> {
        let cycles = self.cpu.clock()? as u16;
        self.clock_devices(cycles);
        Ok(cycles)
    }

    /// Equivalent to `clock()` but allows the execution of
    /// multiple clock operations in a single call.
    pub fn clocks(&mut self, count: usize) -> Result<u64, Error> {
        let mut cycles = 0u64;
        for _ in 0..count {
            cycles += self.clock()? as u64;
        }
        Ok(cycles)
    }

    /// Clocks the emulator until the provided limit of cycles is
    /// reached, returning the effective amount clocked.
    pub fn clocks_cycles(&mut self, limit: usize) -> Result<u64, Error> {
        let mut cycles = 0u64;
        while cycles < limit as u64 {
            cycles += self.clock()? as u64;
        }
        Ok(cycles)
    }

    /// Runs the machine until the PPU finishes the current frame,
    /// returning the number of cycles taken. In case the LCD is
    /// disabled, runs (at most) one frame worth of cycles.
    pub fn next_frame(&mut self) -> Result<u32, Error> {
        let mut cycles = 0u32;
        let current_frame = self.ppu_frame();
        while self.ppu_frame() == current_frame {
            cycles += self.clock()? as u32;
            if cycles >= Self::LCD_CYCLES {
                break;
            }
        }
        Ok(cycles)
    }

    /// Function equivalent to `clock()` that stops short of
    /// clocking the devices when the PC reaches the given address.
    pub fn clock_step(&mut self, addr: u16) -> Result<u16, Error> {
        let cycles = self.cpu.clock()? as u16;
        if self.cpu.pc() != addr {
            self.clock_devices(cycles);
        }
        Ok(cycles)
    }

    /// Clocks the machine until the PC reaches the provided
    /// address, useful for test and debug scenarios.
    pub fn step_to(&mut self, addr: u16) -> Result<u32, Error> {
        let mut cycles = 0u32;
        while self.cpu.pc() != addr {
            cycles += self.clock_step(addr)? as u32;
        }
        Ok(cycles)
    }

    #[inline(always)]
    fn clock_devices(&mut self, cycles: u16) {
        if self.ppu_enabled {
            self.cpu.mmu.ppu().clock(cycles);
        }
        if self.timer_enabled {
            self.cpu.mmu.timer().clock(cycles);
        }
        if self.dma_enabled {
            self.cpu.mmu.clock_dma(cycles);
        }
        self.flush_frame();
    }

    /// Frame-boundary hook: whenever the PPU finishes a frame the
    /// battery-backed RAM is given a chance to be persisted.
    fn flush_frame(&mut self) {
        let frame_index = self.cpu.mmu.ppu_i().frame_index();
        if frame_index == self.frame_marker {
            return;
        }
        self.frame_marker = frame_index;
        self.cpu.mmu.rom().flush_battery();
    }

    pub fn key_press(&mut self, key: PadKey) {
        self.pad().key_press(key);
    }

    pub fn key_lift(&mut self, key: PadKey) {
        self.pad().key_lift(key);
    }

    pub fn frame_buffer(&self) -> &[u32; DISPLAY_SIZE] {
        self.ppu_i().frame_buffer()
    }

    pub fn ppu_ly(&self) -> u8 {
        self.ppu_i().ly()
    }

    pub fn ppu_mode(&self) -> PpuMode {
        self.ppu_i().mode()
    }

    pub fn ppu_frame(&self) -> u64 {
        self.ppu_i().frame_index()
    }

    /// Returns the content of the serial debug buffer, the
    /// standard output channel of test ROMs.
    pub fn serial_debug(&self) -> String {
        self.serial_i().debug()
    }

    pub fn attach_serial(&mut self, device: Box<dyn SerialDevice>) {
        self.serial().set_device(device);
    }

    pub fn attach_null_serial(&mut self) {
        self.attach_serial(Box::<NullDevice>::default());
    }

    pub fn attach_stdout_serial(&mut self) {
        self.attach_serial(Box::<StdoutDevice>::default());
    }

    pub fn attach_buffer_serial(&mut self) {
        self.attach_serial(Box::<BufferDevice>::default());
    }

    pub fn registers(&self) -> Registers {
        let PpuRegisters {
            scy,
            scx,
            wy,
            wx,
            ly,
            lyc,
        } = self.ppu_i().registers();
        Registers {
            pc: self.cpu.pc,
            sp: self.cpu.sp,
            a: self.cpu.a,
            b: self.cpu.b,
            c: self.cpu.c,
            d: self.cpu.d,
            e: self.cpu.e,
            h: self.cpu.h,
            l: self.cpu.l,
            scy,
            scx,
            wy,
            wx,
            ly,
            lyc,
        }
    }

    pub fn cpu(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn cpu_i(&self) -> &Cpu {
        &self.cpu
    }

    pub fn mmu(&mut self) -> &mut Mmu {
        self.cpu.mmu()
    }

    pub fn mmu_i(&self) -> &Mmu {
        self.cpu.mmu_i()
    }

    pub fn ppu(&mut self) -> &mut Ppu {
        self.cpu.mmu.ppu()
    }

    pub fn ppu_i(&self) -> &Ppu {
        self.cpu.mmu_i().ppu_i()
    }

    pub fn pad(&mut self) -> &mut Pad {
        self.cpu.mmu.pad()
    }

    pub fn pad_i(&self) -> &Pad {
        self.cpu.mmu_i().pad_i()
    }

    pub fn timer(&mut self) -> &mut Timer {
        self.cpu.mmu.timer()
    }

    pub fn timer_i(&self) -> &Timer {
        self.cpu.mmu_i().timer_i()
    }

    pub fn serial(&mut self) -> &mut Serial {
        self.cpu.mmu.serial()
    }

    pub fn serial_i(&self) -> &Serial {
        self.cpu.mmu_i().serial_i()
    }

    pub fn dma_i(&self) -> &Dma {
        self.cpu.mmu_i().dma_i()
    }

    pub fn rom(&mut self) -> &mut Cartridge {
        self.cpu.mmu.rom()
    }

    pub fn rom_i(&self) -> &Cartridge {
        self.cpu.mmu_i().rom_i()
    }

    pub fn ppu_enabled(&self) -> bool {
        self.ppu_enabled
    }

    pub fn set_ppu_enabled(&mut self, value: bool) {
        self.ppu_enabled = value;
    }

    pub fn timer_enabled(&self) -> bool {
        self.timer_enabled
    }

    pub fn set_timer_enabled(&mut self, value: bool) {
        self.timer_enabled = value;
    }

    pub fn dma_enabled(&self) -> bool {
        self.dma_enabled
    }

    pub fn set_dma_enabled(&mut self, value: bool) {
        self.dma_enabled = value;
    }

    pub fn set_all_enabled(&mut self, value: bool) {
        self.set_ppu_enabled(value);
        self.set_timer_enabled(value);
        self.set_dma_enabled(value);
    }

    pub fn display_width(&self) -> usize {
        DISPLAY_WIDTH
    }

    pub fn display_height(&self) -> usize {
        DISPLAY_HEIGHT
    }

    pub fn clock_freq_s(&self) -> String {
        format!("{:.02} Mhz", Self::CPU_FREQ as f32 / 1000.0 / 1000.0)
    }

    pub fn description(&self, column_length: usize) -> String {
        let version_l = format!("{:width$}", "Version", width = column_length);
        let clock_l = format!("{:width$}", "Clock", width = column_length);
        let serial_l = format!("{:width$}", "Serial", width = column_length);
        format!(
            "{}  {}\n{}  {}\n{}  {}",
            version_l,
            Info::version(),
            clock_l,
            self.clock_freq_s(),
            serial_l,
            self.serial_i().device().description(),
        )
    }
}

impl GameBoy {
    /// The logic frequency of the Game Boy CPU in Hz.
    pub const CPU_FREQ: u32 = 4194304;

    /// The visual frequency (refresh rate) of the Game Boy,
    /// close to 60 Hz.
    pub const VISUAL_FREQ: f32 = 59.7275;

    /// The number of T-cycles taken by a complete frame of the
    /// Game Boy's PPU (154 lines of 456 cycles).
    pub const LCD_CYCLES: u32 = 70224;
}

impl Default for GameBoy {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for GameBoy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description(9))
    }
}
