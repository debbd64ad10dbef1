//! Gamepad (joypad) functions and structures.

use crate::{consts::JOYP_ADDR, mmu::BusComponent, panic_gb};

/// The eight logical buttons of the system, all of them
/// reported active-low through the joypad register.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum PadKey {
    Up,
    Down,
    Left,
    Right,
    Start,
    Select,
    A,
    B,
}

impl PadKey {
    pub const ALL: [PadKey; 8] = [
        PadKey::Up,
        PadKey::Down,
        PadKey::Left,
        PadKey::Right,
        PadKey::Start,
        PadKey::Select,
        PadKey::A,
        PadKey::B,
    ];
}

pub struct Pad {
    down: bool,
    up: bool,
    left: bool,
    right: bool,
    start: bool,
    select: bool,
    b: bool,
    a: bool,
    select_action: bool,
    select_direction: bool,
    int_pad: bool,
}

impl Pad {
    pub fn new() -> Self {
        Self {
            down: false,
            up: false,
            left: false,
            right: false,
            start: false,
            select: false,
            b: false,
            a: false,
            select_action: false,
            select_direction: false,
            int_pad: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            JOYP_ADDR => {
                let mut value = 0xc0
                    | if self.select_direction { 0x00 } else { 0x10 }
                    | if self.select_action { 0x00 } else { 0x20 };

                // the selected halves are reported in the low nibble,
                // pressed keys pull their line low, and selecting both
                // halves combines them
                let mut nibble = 0x0f;
                if self.select_direction {
                    nibble &= if self.right { 0x00 } else { 0x01 }
                        | if self.left { 0x00 } else { 0x02 }
                        | if self.up { 0x00 } else { 0x04 }
                        | if self.down { 0x00 } else { 0x08 };
                }
                if self.select_action {
                    nibble &= if self.a { 0x00 } else { 0x01 }
                        | if self.b { 0x00 } else { 0x02 }
                        | if self.select { 0x00 } else { 0x04 }
                        | if self.start { 0x00 } else { 0x08 };
                }

                value |= nibble;
                value
            }
            addr => panic_gb!("Reading from unknown Pad location 0x{:04x}", addr),
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            JOYP_ADDR => {
                self.select_direction = value & 0x10 == 0x00;
                self.select_action = value & 0x20 == 0x00;
            }
            addr => panic_gb!("Writing to unknown Pad location 0x{:04x}", addr),
        }
    }

    pub fn key_press(&mut self, key: PadKey) {
        if !self.key_state(key) {
            self.int_pad = true;
        }
        self.set_key(key, true);
    }

    pub fn key_lift(&mut self, key: PadKey) {
        self.set_key(key, false);
    }

    pub fn key_state(&self, key: PadKey) -> bool {
        match key {
            PadKey::Up => self.up,
            PadKey::Down => self.down,
            PadKey::Left => self.left,
            PadKey::Right => self.right,
            PadKey::Start => self.start,
            PadKey::Select => self.select,
            PadKey::A => self.a,
            PadKey::B => self.b,
        }
    }

    fn set_key(&mut self, key: PadKey, value: bool) {
        match key {
            PadKey::Up => self.up = value,
            PadKey::Down => self.down = value,
            PadKey::Left => self.left = value,
            PadKey::Right => self.right = value,
            PadKey::Start => self.start = value,
            PadKey::Select => self.select = value,
            PadKey::A => self.a = value,
            PadKey::B => self.b = value,
        }
    }

    #[inline(always)]
    pub fn int_pad(&self) -> bool {
        self.int_pad
    }

    #[inline(always)]
    pub fn set_int_pad(&mut self, value: bool) {
        self.int_pad = value;
    }

    #[inline(always)]
    pub fn ack_pad(&mut self) {
        self.set_int_pad(false);
    }
}

impl BusComponent for Pad {
    fn read(&self, addr: u16) -> u8 {
        self.read(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.write(addr, value);
    }
}

impl Default for Pad {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::consts::JOYP_ADDR;

    use super::{Pad, PadKey};

    #[test]
    fn test_no_selection() {
        let pad = Pad::new();
        assert_eq!(pad.read(JOYP_ADDR), 0xff);
    }

    #[test]
    fn test_action_selection() {
        let mut pad = Pad::new();
        pad.key_press(PadKey::A);
        pad.key_press(PadKey::Start);

        pad.write(JOYP_ADDR, 0x10);
        assert_eq!(pad.read(JOYP_ADDR), 0xd6);

        pad.key_lift(PadKey::A);
        assert_eq!(pad.read(JOYP_ADDR), 0xd7);
    }

    #[test]
    fn test_direction_selection() {
        let mut pad = Pad::new();
        pad.key_press(PadKey::Left);

        pad.write(JOYP_ADDR, 0x20);
        assert_eq!(pad.read(JOYP_ADDR), 0xed);
    }

    #[test]
    fn test_interrupt_on_press() {
        let mut pad = Pad::new();
        assert!(!pad.int_pad());
        pad.key_press(PadKey::B);
        assert!(pad.int_pad());

        pad.ack_pad();
        pad.key_press(PadKey::B);
        assert!(!pad.int_pad());
    }
}
