//! Logical button mapping.
//!
//! Twelve console buttons each map to one keyboard key and one gamepad button.
//! The mapper latches raw device state once per frame so that "held" and
//! "just pressed" queries are stable for the whole frame.

/// Number of logical buttons.
pub const BUTTON_COUNT: usize = 12;

/// Gamepads tracked by the mapper. Controller numbers are 1-based.
pub const MAX_CONTROLLERS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Start,
    Select,
    Up,
    Right,
    Down,
    Left,
    A,
    B,
    C,
    D,
    L,
    R,
}

/// Keyboard keys the console listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Space,
    Up,
    Right,
    Down,
    Left,
    Z,
    X,
    C,
    V,
    A,
    D,
}

/// Gamepad buttons, named by position (south = bottom face button).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PadButton {
    Start,
    Select,
    DPadUp,
    DPadRight,
    DPadDown,
    DPadLeft,
    South,
    East,
    North,
    West,
    LeftTrigger,
    RightTrigger,
}

impl Button {
    pub const ALL: [Button; BUTTON_COUNT] = [
        Button::Start,
        Button::Select,
        Button::Up,
        Button::Right,
        Button::Down,
        Button::Left,
        Button::A,
        Button::B,
        Button::C,
        Button::D,
        Button::L,
        Button::R,
    ];

    /// Zero-based index lookup.
    pub fn from_index(index: i64) -> Option<Button> {
        usize::try_from(index).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn from_name(name: &str) -> Option<Button> {
        Self::ALL.iter().copied().find(|b| b.name() == name)
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Button::Start => "Start",
            Button::Select => "Select",
            Button::Up => "Up",
            Button::Right => "Right",
            Button::Down => "Down",
            Button::Left => "Left",
            Button::A => "A",
            Button::B => "B",
            Button::C => "C",
            Button::D => "D",
            Button::L => "L",
            Button::R => "R",
        }
    }

    pub fn key(self) -> Key {
        match self {
            Button::Start => Key::Enter,
            Button::Select => Key::Space,
            Button::Up => Key::Up,
            Button::Right => Key::Right,
            Button::Down => Key::Down,
            Button::Left => Key::Left,
            Button::A => Key::Z,
            Button::B => Key::X,
            Button::C => Key::C,
            Button::D => Key::V,
            Button::L => Key::A,
            Button::R => Key::D,
        }
    }

    pub fn pad_button(self) -> PadButton {
        match self {
            Button::Start => PadButton::Start,
            Button::Select => PadButton::Select,
            Button::Up => PadButton::DPadUp,
            Button::Right => PadButton::DPadRight,
            Button::Down => PadButton::DPadDown,
            Button::Left => PadButton::DPadLeft,
            Button::A => PadButton::South,
            Button::B => PadButton::East,
            Button::C => PadButton::North,
            Button::D => PadButton::West,
            Button::L => PadButton::LeftTrigger,
            Button::R => PadButton::RightTrigger,
        }
    }

    fn bit(self) -> u16 {
        1 << self.index()
    }
}

/// Raw device state, implemented by every platform.
pub trait InputSource {
    fn key_down(&self, key: Key) -> bool;
    /// `pad` is zero-based.
    fn pad_button_down(&self, pad: usize, button: PadButton) -> bool;
}

/// Held/previous bitmasks for the keyboard and each gamepad.
#[derive(Debug, Clone, Default)]
pub struct InputMapper {
    keys: u16,
    last_keys: u16,
    pads: [u16; MAX_CONTROLLERS],
    last_pads: [u16; MAX_CONTROLLERS],
}

impl InputMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample the devices. Called once per frame by the scheduler.
    pub fn latch<S: InputSource + ?Sized>(&mut self, source: &S) {
        self.last_keys = self.keys;
        self.last_pads = self.pads;

        self.keys = 0;
        self.pads = [0; MAX_CONTROLLERS];
        for button in Button::ALL {
            if source.key_down(button.key()) {
                self.keys |= button.bit();
            }
            for (pad, mask) in self.pads.iter_mut().enumerate() {
                if source.pad_button_down(pad, button.pad_button()) {
                    *mask |= button.bit();
                }
            }
        }
    }

    /// True while the button is held on the keyboard or on the given
    /// (1-based) controller. Out-of-range buttons are never pressed.
    pub fn pressed(&self, button_index: i64, controller: i64) -> bool {
        match Button::from_index(button_index) {
            Some(button) => self.button_pressed(button, controller),
            None => false,
        }
    }

    /// True only on the frame the button went from released to held.
    pub fn tapped(&self, button_index: i64, controller: i64) -> bool {
        match Button::from_index(button_index) {
            Some(button) => self.button_tapped(button, controller),
            None => false,
        }
    }

    pub fn button_pressed(&self, button: Button, controller: i64) -> bool {
        let bit = button.bit();
        let pad = pad_slot(controller).map(|i| self.pads[i]).unwrap_or(0);
        (self.keys | pad) & bit != 0
    }

    pub fn button_tapped(&self, button: Button, controller: i64) -> bool {
        let bit = button.bit();
        let keys = self.keys & !self.last_keys;
        let pad = pad_slot(controller)
            .map(|i| self.pads[i] & !self.last_pads[i])
            .unwrap_or(0);
        (keys | pad) & bit != 0
    }

    /// Held state of every button, in [`Button::ALL`] order.
    pub fn grab(&self, controller: i64) -> [(Button, bool); BUTTON_COUNT] {
        Button::ALL.map(|b| (b, self.button_pressed(b, controller)))
    }
}

fn pad_slot(controller: i64) -> Option<usize> {
    let slot = usize::try_from(controller.checked_sub(1)?).ok()?;
    (slot < MAX_CONTROLLERS).then_some(slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[derive(Default)]
    struct FakeDevices {
        keys: HashSet<Key>,
        pads: HashSet<(usize, PadButton)>,
    }

    impl InputSource for FakeDevices {
        fn key_down(&self, key: Key) -> bool {
            self.keys.contains(&key)
        }

        fn pad_button_down(&self, pad: usize, button: PadButton) -> bool {
            self.pads.contains(&(pad, button))
        }
    }

    #[test]
    fn test_out_of_range_buttons_are_false() {
        let mut mapper = InputMapper::new();
        let mut devices = FakeDevices::default();
        devices.keys.extend([Key::Enter, Key::Z, Key::D]);
        mapper.latch(&devices);

        assert!(!mapper.pressed(99, 1));
        assert!(!mapper.tapped(-1, 1));
        assert!(!mapper.pressed(12, 1));
        assert!(!mapper.pressed(i64::MIN, 1));
    }

    #[test]
    fn test_keyboard_mapping() {
        let mut mapper = InputMapper::new();
        let mut devices = FakeDevices::default();
        devices.keys.insert(Key::X);
        mapper.latch(&devices);

        assert!(mapper.button_pressed(Button::B, 1));
        assert!(!mapper.button_pressed(Button::A, 1));
    }

    #[test]
    fn test_tapped_only_on_transition() {
        let mut mapper = InputMapper::new();
        let mut devices = FakeDevices::default();
        devices.keys.insert(Key::Space);

        mapper.latch(&devices);
        assert!(mapper.button_tapped(Button::Select, 1));
        assert!(mapper.button_pressed(Button::Select, 1));

        mapper.latch(&devices);
        assert!(!mapper.button_tapped(Button::Select, 1));
        assert!(mapper.button_pressed(Button::Select, 1));

        devices.keys.clear();
        mapper.latch(&devices);
        assert!(!mapper.button_pressed(Button::Select, 1));
    }

    #[test]
    fn test_gamepad_is_per_controller() {
        let mut mapper = InputMapper::new();
        let mut devices = FakeDevices::default();
        devices.pads.insert((1, PadButton::South));
        mapper.latch(&devices);

        assert!(mapper.button_pressed(Button::A, 2));
        assert!(!mapper.button_pressed(Button::A, 1));
        assert!(!mapper.button_pressed(Button::A, 9));
    }

    #[test]
    fn test_names_round_trip() {
        for (i, button) in Button::ALL.iter().enumerate() {
            assert_eq!(Button::from_name(button.name()), Some(*button));
            assert_eq!(Button::from_index(i as i64), Some(*button));
        }
        assert_eq!(Button::from_name("Turbo"), None);
    }

    #[test]
    fn test_grab_reports_all_buttons() {
        let mut mapper = InputMapper::new();
        let mut devices = FakeDevices::default();
        devices.keys.insert(Key::Up);
        mapper.latch(&devices);

        let state = mapper.grab(1);
        assert_eq!(state.len(), BUTTON_COUNT);
        assert!(state.iter().any(|&(b, held)| b == Button::Up && held));
        assert_eq!(state.iter().filter(|(_, held)| *held).count(), 1);
    }
}
