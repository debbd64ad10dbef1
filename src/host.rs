//! Host integration surface.
//!
//! The core is single threaded and deterministic; everything the
//! host needs to drive it reduces to a small control word (run,
//! pause, quit and an observation tick counter), a pacing port
//! (wall-clock milliseconds for the 60 Hz limit) and a provider
//! for the state of the eight buttons. A frontend that runs the
//! core in its own thread shares the control word and reads the
//! frame buffer whenever the frame counter advances.

use std::{
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
    thread,
    time::{Duration, Instant},
};

use monoboy_common::error::Error;

use crate::{gb::GameBoy, pad::PadKey};

/// The target delay between two frames, in milliseconds.
pub const FRAME_DELAY: u64 = (1000.0 / GameBoy::VISUAL_FREQ) as u64;

/// Control word shared between the host and the emulation loop.
/// All fields are atomics so that the host may flip them from
/// another thread.
pub struct EmuControl {
    running: AtomicBool,
    paused: AtomicBool,
    die: AtomicBool,
    ticks: AtomicU64,
}

impl EmuControl {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            die: AtomicBool::new(false),
            ticks: AtomicU64::new(0),
        }
    }

    #[inline(always)]
    pub fn running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    #[inline(always)]
    pub fn set_running(&self, value: bool) {
        self.running.store(value, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn should_stop(&self) -> bool {
        self.die.load(Ordering::Relaxed)
    }

    /// Requests a shutdown of the emulation loop, the core will
    /// complete the current frame and return.
    pub fn stop(&self) {
        self.die.store(true, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    #[inline(always)]
    pub fn add_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for EmuControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Pacing port used for the 60 Hz frame limit, abstracting the
/// wall clock away so that the core stays deterministic and
/// testable without one.
pub trait PacingSource {
    /// Returns the number of milliseconds elapsed since an
    /// arbitrary (but fixed) origin.
    fn millis(&mut self) -> u64;

    /// Blocks for (at least) the given number of milliseconds.
    fn delay(&mut self, millis: u64);
}

/// Wall-clock backed pacing source for regular interactive use.
pub struct SystemPacing {
    origin: Instant,
}

impl SystemPacing {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl PacingSource for SystemPacing {
    fn millis(&mut self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn delay(&mut self, millis: u64) {
        thread::sleep(Duration::from_millis(millis));
    }
}

impl Default for SystemPacing {
    fn default() -> Self {
        Self::new()
    }
}

/// Provider of the pressed/released state of the eight logical
/// buttons, sampled once per frame.
pub trait InputSource {
    fn key_pressed(&mut self, key: PadKey) -> bool;
}

/// Input source with no keys ever pressed.
pub struct NullInput {}

impl InputSource for NullInput {
    fn key_pressed(&mut self, _key: PadKey) -> bool {
        false
    }
}

/// Runs the emulation loop until a shutdown is requested through
/// the control word: one frame per iteration, input applied at
/// frame boundaries and pacing limited to the visual frequency.
pub fn run(
    gb: &mut GameBoy,
    control: &EmuControl,
    pacing: &mut dyn PacingSource,
    input: &mut dyn InputSource,
) -> Result<(), Error> {
    control.set_running(true);

    while control.running() && !control.should_stop() {
        if control.paused() {
            pacing.delay(10);
            continue;
        }

        let frame_start = pacing.millis();

        apply_input(gb, input);
        gb.next_frame()?;
        control.add_tick();

        let frame_time = pacing.millis().saturating_sub(frame_start);
        if frame_time < FRAME_DELAY {
            pacing.delay(FRAME_DELAY - frame_time);
        }
    }

    control.set_running(false);
    Ok(())
}

fn apply_input(gb: &mut GameBoy, input: &mut dyn InputSource) {
    for key in PadKey::ALL {
        if input.key_pressed(key) {
            gb.key_press(key);
        } else {
            gb.key_lift(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        pad::PadKey,
        test::{build_test, rom_with_program, TestOptions},
    };

    use super::{run, EmuControl, InputSource, PacingSource};

    /// Pacing source backed by a virtual clock that requests a
    /// shutdown after a fixed number of frames.
    struct VirtualPacing {
        control: Arc<EmuControl>,
        now: u64,
        frames: u32,
        limit: u32,
    }

    impl PacingSource for VirtualPacing {
        fn millis(&mut self) -> u64 {
            self.now += 1;
            self.now
        }

        fn delay(&mut self, millis: u64) {
            self.now += millis;
            self.frames += 1;
            if self.frames >= self.limit {
                self.control.stop();
            }
        }
    }

    struct StartPressed {}

    impl InputSource for StartPressed {
        fn key_pressed(&mut self, key: PadKey) -> bool {
            key == PadKey::Start
        }
    }

    #[test]
    fn test_run_frames() {
        let mut gb = build_test(TestOptions::default());
        // a tight JR loop keeps the program spinning in place
        gb.load_rom(&rom_with_program(&[0x18, 0xfe])).unwrap();
        gb.boot();

        let control = Arc::new(EmuControl::new());
        let mut pacing = VirtualPacing {
            control: control.clone(),
            now: 0,
            frames: 0,
            limit: 2,
        };
        let mut input = StartPressed {};

        run(&mut gb, &control, &mut pacing, &mut input).unwrap();

        assert!(!control.running());
        assert!(control.ticks() >= 2);
        assert!(gb.ppu_frame() >= 2);
        assert!(gb.pad_i().key_state(PadKey::Start));
    }

    #[test]
    fn test_pause_skips_frames() {
        let mut gb = build_test(TestOptions::default());
        gb.load_rom(&rom_with_program(&[0x18, 0xfe])).unwrap();
        gb.boot();

        let control = Arc::new(EmuControl::new());
        control.pause();
        let mut pacing = VirtualPacing {
            control: control.clone(),
            now: 0,
            frames: 0,
            limit: 3,
        };
        let mut input = super::NullInput {};

        run(&mut gb, &control, &mut pacing, &mut input).unwrap();

        assert_eq!(control.ticks(), 0);
        assert_eq!(gb.ppu_frame(), 0);
    }
}
