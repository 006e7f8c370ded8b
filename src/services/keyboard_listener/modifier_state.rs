use crate::events::{KeyState, ModifierKey, Modifiers, ShellEvent};
use crate::services::keycode_map::KeycodeMap;
use smallvec::SmallVec;

/// Удерживаемые клавиши-модификаторы. Левая и правая клавиши одного
/// модификатора учитываются отдельно.
#[derive(Debug, Default)]
pub struct ModifierState {
    held_codes: SmallVec<[u16; 4]>,
}

impl ModifierState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_modifiers(&self) -> Modifiers {
        self.held_codes
            .iter()
            .filter_map(|&code| KeycodeMap::modifier_for_code(code))
            .fold(Modifiers::new(), Modifiers::with)
    }

    pub fn update_key(&mut self, code: u16, pressed: bool) {
        let position = self.held_codes.iter().position(|&held| held == code);
        match (pressed, position) {
            (true, None) => self.held_codes.push(code),
            (false, Some(index)) => {
                self.held_codes.swap_remove(index);
            }
            _ => {}
        }
    }
}

/// Переводит поток клавиш в события переключения:
/// `<модификатор>+<клавиша>` - следующая активность, с обратным модификатором -
/// предыдущая, отпускание модификатора - завершение переключения.
#[derive(Debug)]
pub struct SwitchChord {
    modifier: ModifierKey,
    reverse: ModifierKey,
    switch_key: u16,
    state: ModifierState,
}

impl SwitchChord {
    pub fn new(modifier: ModifierKey, reverse: ModifierKey, switch_key: u16) -> Self {
        Self {
            modifier,
            reverse,
            switch_key,
            state: ModifierState::new(),
        }
    }

    pub fn feed(&mut self, code: u16, key_state: KeyState, event_time: u32) -> Option<ShellEvent> {
        if KeycodeMap::modifier_for_code(code).is_some() {
            if key_state == KeyState::Repeat {
                return None;
            }
            let was_held = self.state.to_modifiers().contains(self.modifier);
            self.state.update_key(code, key_state == KeyState::Pressed);
            let still_held = self.state.to_modifiers().contains(self.modifier);

            return (was_held && !still_held)
                .then_some(ShellEvent::ModifierReleased { event_time });
        }

        if code != self.switch_key || !key_state.is_down() {
            return None;
        }

        let held = self.state.to_modifiers();
        if !held.contains(self.modifier) {
            return None;
        }

        Some(if held.contains(self.reverse) {
            ShellEvent::PreviousActivity { event_time }
        } else {
            ShellEvent::NextActivity { event_time }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAB: u16 = 15;
    const LEFT_ALT: u16 = 56;
    const RIGHT_ALT: u16 = 100;
    const LEFT_SHIFT: u16 = 42;

    fn chord() -> SwitchChord {
        SwitchChord::new(ModifierKey::Alt, ModifierKey::Shift, TAB)
    }

    #[test]
    fn alt_tab_sequence() {
        let mut chord = chord();
        assert_eq!(chord.feed(LEFT_ALT, KeyState::Pressed, 1), None);
        assert_eq!(
            chord.feed(TAB, KeyState::Pressed, 2),
            Some(ShellEvent::NextActivity { event_time: 2 })
        );
        assert_eq!(
            chord.feed(TAB, KeyState::Repeat, 3),
            Some(ShellEvent::NextActivity { event_time: 3 })
        );
        assert_eq!(chord.feed(TAB, KeyState::Released, 4), None);
        assert_eq!(
            chord.feed(LEFT_ALT, KeyState::Released, 5),
            Some(ShellEvent::ModifierReleased { event_time: 5 })
        );
    }

    #[test]
    fn reverse_modifier_goes_back() {
        let mut chord = chord();
        chord.feed(LEFT_ALT, KeyState::Pressed, 1);
        chord.feed(LEFT_SHIFT, KeyState::Pressed, 2);
        assert_eq!(
            chord.feed(TAB, KeyState::Pressed, 3),
            Some(ShellEvent::PreviousActivity { event_time: 3 })
        );
        chord.feed(LEFT_SHIFT, KeyState::Released, 4);
        assert_eq!(
            chord.feed(TAB, KeyState::Pressed, 5),
            Some(ShellEvent::NextActivity { event_time: 5 })
        );
    }

    #[test]
    fn both_alt_keys_release_only_when_last_is_up() {
        let mut chord = chord();
        assert_eq!(chord.feed(LEFT_ALT, KeyState::Pressed, 1), None);
        assert_eq!(chord.feed(RIGHT_ALT, KeyState::Pressed, 2), None);
        assert_eq!(chord.feed(RIGHT_ALT, KeyState::Released, 3), None);
        assert_eq!(
            chord.feed(TAB, KeyState::Pressed, 4),
            Some(ShellEvent::NextActivity { event_time: 4 })
        );
        assert_eq!(
            chord.feed(LEFT_ALT, KeyState::Released, 5),
            Some(ShellEvent::ModifierReleased { event_time: 5 })
        );
        assert_eq!(chord.feed(TAB, KeyState::Pressed, 6), None);
    }

    #[test]
    fn modifier_state_counts_each_key() {
        let mut state = ModifierState::new();
        state.update_key(LEFT_SHIFT, true);
        state.update_key(54, true);
        state.update_key(LEFT_SHIFT, true);
        state.update_key(LEFT_SHIFT, false);
        assert!(state.to_modifiers().contains(ModifierKey::Shift));

        state.update_key(54, false);
        assert_eq!(state.to_modifiers(), Modifiers::new());
    }

    #[test]
    fn tab_without_modifier_is_ignored() {
        let mut chord = chord();
        assert_eq!(chord.feed(TAB, KeyState::Pressed, 1), None);
        assert_eq!(chord.feed(LEFT_SHIFT, KeyState::Released, 2), None);
        // Отпускание модификатора, который не был нажат
        assert_eq!(chord.feed(LEFT_ALT, KeyState::Released, 3), None);
    }
}
