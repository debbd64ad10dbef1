//! Test harness helpers and system level scenarios.
//!
//! Provides reusable builders for machine instances and synthetic
//! cartridges, so that behaviour can be verified without real ROM
//! files on disk.

use monoboy_common::error::Error;

use crate::{devices::buffer::BufferDevice, gb::GameBoy};

#[derive(Default)]
pub struct TestOptions {
    pub ppu_enabled: Option<bool>,
    pub timer_enabled: Option<bool>,
    pub dma_enabled: Option<bool>,
}

/// Builds a machine instance for testing purposes, with a buffer
/// serial device attached for output capture.
pub fn build_test(options: TestOptions) -> Box<GameBoy> {
    let mut game_boy = Box::new(GameBoy::new());
    game_boy.set_ppu_enabled(options.ppu_enabled.unwrap_or(true));
    game_boy.set_timer_enabled(options.timer_enabled.unwrap_or(true));
    game_boy.set_dma_enabled(options.dma_enabled.unwrap_or(true));
    game_boy.attach_serial(Box::<BufferDevice>::default());
    game_boy
}

/// Builds the data of a 32 KiB ROM-only cartridge with the given
/// program placed at the entry address (0x0100) and a valid
/// header checksum.
pub fn rom_with_program(program: &[u8]) -> Vec<u8> {
    let mut data = vec![0x00; 0x8000];
    data[0x0100..0x0100 + program.len()].copy_from_slice(program);

    let mut checksum: u8 = 0;
    for index in 0x0134..=0x014c {
        checksum = checksum.wrapping_sub(data[index]).wrapping_sub(1);
    }
    data[0x014d] = checksum;

    data
}

/// Runs the given program from the post boot state for the
/// provided number of machine steps.
pub fn run_program(program: &[u8], steps: usize) -> Result<Box<GameBoy>, Error> {
    let mut game_boy = build_test(TestOptions::default());
    game_boy.load_rom(&rom_with_program(program))?;
    game_boy.boot();
    for _ in 0..steps {
        game_boy.clock()?;
    }
    Ok(game_boy)
}

#[cfg(test)]
mod tests {
    use crate::{
        consts::{
            BGP_ADDR, DIV_ADDR, DMA_ADDR, IF_ADDR, LCDC_ADDR, SB_ADDR, SC_ADDR, STAT_ADDR,
            TAC_ADDR, TIMA_ADDR, TMA_ADDR,
        },
        gb::GameBoy,
        ppu::PpuMode,
    };

    use super::{build_test, rom_with_program, run_program, TestOptions};

    #[test]
    fn test_boot_state() {
        let mut game_boy = build_test(TestOptions::default());
        game_boy.load_rom(&rom_with_program(&[])).unwrap();
        game_boy.boot();

        assert_eq!(game_boy.cpu_i().pc(), 0x0100);
        assert_eq!(game_boy.cpu_i().sp(), 0xfffe);
        assert_eq!(game_boy.cpu_i().af(), 0x01b0);
        assert_eq!(game_boy.cpu_i().bc(), 0x0013);
        assert_eq!(game_boy.cpu_i().de(), 0x00d8);
        assert_eq!(game_boy.cpu_i().hl(), 0x014d);
        assert!(!game_boy.cpu_i().ime());

        assert_eq!(game_boy.mmu_i().read(LCDC_ADDR), 0x91);
        assert_eq!(game_boy.mmu_i().read(STAT_ADDR), 0x86);
        assert_eq!(game_boy.mmu_i().read(BGP_ADDR), 0xfc);
        assert_eq!(game_boy.mmu_i().read(DIV_ADDR), 0xac);
        assert_eq!(game_boy.mmu_i().read(TAC_ADDR), 0xf8);
        assert_eq!(game_boy.mmu_i().read(IF_ADDR), 0xe0);
    }

    #[test]
    fn test_xor_a_clears_a() {
        let game_boy = run_program(&[0xaf], 1).unwrap();
        assert_eq!(game_boy.cpu_i().a, 0x00);
        assert_eq!(game_boy.cpu_i().f(), 0x80);
        assert_eq!(game_boy.cpu_i().pc(), 0x0101);
        assert_eq!(game_boy.cpu_i().clocks() % 4, 0);
    }

    #[test]
    fn test_immediate_load() {
        let game_boy = run_program(&[0x06, 0x42], 1).unwrap();
        assert_eq!(game_boy.cpu_i().b, 0x42);
        assert_eq!(game_boy.cpu_i().pc(), 0x0102);
    }

    #[test]
    fn test_stack_round_trip() {
        // LD BC, 0x1234; PUSH BC; LD BC, 0x0000; POP BC
        let game_boy =
            run_program(&[0x01, 0x34, 0x12, 0xc5, 0x01, 0x00, 0x00, 0xc1], 4).unwrap();
        assert_eq!(game_boy.cpu_i().bc(), 0x1234);
        assert_eq!(game_boy.cpu_i().sp(), 0xfffe);
    }

    #[test]
    fn test_relative_jump_condition() {
        // XOR A sets the zero flag, so JR NZ must not be taken
        let game_boy = run_program(&[0xaf, 0x20, 0xfd], 2).unwrap();
        assert_eq!(game_boy.cpu_i().pc(), 0x0103);
    }

    #[test]
    fn test_timer_overflow() {
        let mut game_boy = build_test(TestOptions::default());
        game_boy.load_rom(&rom_with_program(&[])).unwrap();
        game_boy.boot();

        game_boy.mmu().write(DIV_ADDR, 0x00);
        game_boy.mmu().write(TMA_ADDR, 0x00);
        game_boy.mmu().write(TIMA_ADDR, 0xff);
        game_boy.mmu().write(TAC_ADDR, 0x05);

        // four NOPs advance the machine by 16 T-cycles
        game_boy.clocks(4).unwrap();

        assert_eq!(game_boy.mmu_i().read(TIMA_ADDR), 0x00);
        assert_eq!(game_boy.mmu_i().read(IF_ADDR) & 0x04, 0x04);
    }

    #[test]
    fn test_oam_dma() {
        let mut game_boy = build_test(TestOptions {
            ppu_enabled: Some(false),
            ..Default::default()
        });
        game_boy.load_rom(&rom_with_program(&[])).unwrap();

        for index in 0..0xa0u16 {
            game_boy.mmu().write(0xc000 + index, 0xa0u8.wrapping_add(index as u8));
        }

        game_boy.mmu().write(DMA_ADDR, 0xc0);
        assert!(game_boy.dma_i().active());

        // two machine cycles of start delay plus 160 transfer
        // cycles, one byte each
        game_boy.clocks(162).unwrap();
        assert!(!game_boy.dma_i().active());

        for index in 0..0xa0u16 {
            assert_eq!(
                game_boy.mmu_i().read(0xfe00 + index),
                0xa0u8.wrapping_add(index as u8)
            );
        }
    }

    #[test]
    fn test_vblank_timing() {
        let mut game_boy = build_test(TestOptions::default());
        game_boy.load_rom(&rom_with_program(&[])).unwrap();
        game_boy.boot();

        // 144 lines of 456 T-cycles, in four cycle NOP steps
        game_boy.clocks(144 * 456 / 4).unwrap();
        assert_eq!(game_boy.ppu_ly(), 144);
        assert_eq!(game_boy.ppu_mode(), PpuMode::VBlank);
        assert_eq!(game_boy.mmu_i().read(IF_ADDR) & 0x01, 0x01);
        assert_eq!(game_boy.ppu_frame(), 0);

        // the remaining ten lines complete the frame
        game_boy.clocks(10 * 456 / 4).unwrap();
        assert_eq!(game_boy.ppu_ly(), 0);
        assert_eq!(game_boy.ppu_frame(), 1);
    }

    #[test]
    fn test_frame_cycle_total() {
        let mut game_boy = build_test(TestOptions::default());
        game_boy.load_rom(&rom_with_program(&[])).unwrap();
        game_boy.boot();

        let cycles = game_boy.next_frame().unwrap();
        assert_eq!(cycles, GameBoy::LCD_CYCLES);
        assert_eq!(game_boy.ppu_frame(), 1);
    }

    #[test]
    fn test_serial_debug_capture() {
        let mut game_boy = build_test(TestOptions::default());
        game_boy.load_rom(&rom_with_program(&[])).unwrap();
        game_boy.boot();

        game_boy.mmu().write(SB_ADDR, 0x41);
        game_boy.mmu().write(SC_ADDR, 0x81);

        assert_eq!(game_boy.serial_debug(), "A");
        assert_eq!(game_boy.mmu_i().read(SC_ADDR) & 0x80, 0x00);
        assert_eq!(game_boy.serial_i().device().state(), "A");
    }

    #[test]
    fn test_serial_program_output() {
        // LD A, 'H'; LDH [0xFF01], A; LD A, 0x81; LDH [0xFF02], A
        // LD A, 'I'; LDH [0xFF01], A; LD A, 0x81; LDH [0xFF02], A
        let program = [
            0x3e, 0x48, 0xe0, 0x01, 0x3e, 0x81, 0xe0, 0x02, 0x3e, 0x49, 0xe0, 0x01, 0x3e, 0x81,
            0xe0, 0x02,
        ];
        let game_boy = run_program(&program, 8).unwrap();
        assert_eq!(game_boy.serial_debug(), "HI");
        assert_eq!(game_boy.serial_i().device().state(), "HI");
    }

    #[test]
    fn test_halt_burns_cycles() {
        // HALT with no enabled interrupts keeps the machine
        // advancing one machine cycle at a time
        let game_boy = run_program(&[0x76], 10).unwrap();
        assert!(game_boy.cpu_i().halted());
        assert_eq!(game_boy.cpu_i().pc(), 0x0101);
    }

    #[test]
    fn test_unknown_opcode_fails() {
        let mut game_boy = build_test(TestOptions::default());
        game_boy.load_rom(&rom_with_program(&[0xd3])).unwrap();
        game_boy.boot();
        assert!(game_boy.clock().is_err());
    }

    #[test]
    fn test_vram_round_trip() {
        let mut game_boy = build_test(TestOptions::default());
        game_boy.load_rom(&rom_with_program(&[])).unwrap();

        // with the LCD disabled both VRAM and OAM behave as
        // plain storage
        game_boy.mmu().write(0x8000, 0x12);
        game_boy.mmu().write(0x9fff, 0x34);
        game_boy.mmu().write(0xfe9f, 0x56);
        assert_eq!(game_boy.mmu_i().read(0x8000), 0x12);
        assert_eq!(game_boy.mmu_i().read(0x9fff), 0x34);
        assert_eq!(game_boy.mmu_i().read(0xfe9f), 0x56);
    }
}
