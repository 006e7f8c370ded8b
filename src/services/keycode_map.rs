use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::events::ModifierKey;

/// Маппинг между именами клавиш переключения и кодами evdev
pub struct KeycodeMap;

// Клавиши, которые имеет смысл назначать на переключение
static KEY_NAME_TO_CODE: Lazy<HashMap<&'static str, u16>> = Lazy::new(|| {
    let mut map = HashMap::new();

    map.insert("tab", 15);        // KEY_TAB
    map.insert("grave", 41);      // KEY_GRAVE
    map.insert("escape", 1);      // KEY_ESC
    map.insert("space", 57);      // KEY_SPACE
    map.insert("backspace", 14);  // KEY_BACKSPACE

    // Функциональные клавиши
    map.insert("f1", 59);         // KEY_F1
    map.insert("f2", 60);         // KEY_F2
    map.insert("f3", 61);         // KEY_F3
    map.insert("f4", 62);         // KEY_F4

    // Стрелки
    map.insert("up", 103);        // KEY_UP
    map.insert("down", 108);      // KEY_DOWN
    map.insert("left", 105);      // KEY_LEFT
    map.insert("right", 106);     // KEY_RIGHT

    map
});

static CODE_TO_KEY_NAME: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| {
    KEY_NAME_TO_CODE.iter().map(|(&name, &code)| (code, name)).collect()
});

impl KeycodeMap {
    /// Получить код клавиши по её имени
    pub fn get_keycode(key_name: &str) -> Result<u16, String> {
        let normalized = key_name.to_lowercase();
        KEY_NAME_TO_CODE.get(normalized.as_str())
            .copied()
            .ok_or_else(|| format!("Unknown key: {}", key_name))
    }

    /// Получить имя клавиши по её коду
    pub fn get_key_name(keycode: u16) -> Option<&'static str> {
        CODE_TO_KEY_NAME.get(&keycode).copied()
    }

    /// Модификатор, которому соответствует код (левый или правый)
    pub fn modifier_for_code(keycode: u16) -> Option<ModifierKey> {
        match keycode {
            29 | 97 => Some(ModifierKey::Ctrl),     // KEY_LEFTCTRL, KEY_RIGHTCTRL
            56 | 100 => Some(ModifierKey::Alt),     // KEY_LEFTALT, KEY_RIGHTALT
            42 | 54 => Some(ModifierKey::Shift),    // KEY_LEFTSHIFT, KEY_RIGHTSHIFT
            125 | 126 => Some(ModifierKey::Super),  // KEY_LEFTMETA, KEY_RIGHTMETA
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_key_mapping() {
        assert_eq!(KeycodeMap::get_keycode("tab").unwrap(), 15);
        assert_eq!(KeycodeMap::get_keycode("TAB").unwrap(), 15);
        assert_eq!(KeycodeMap::get_keycode("grave").unwrap(), 41);
    }

    #[test]
    fn test_reverse_mapping() {
        assert_eq!(KeycodeMap::get_key_name(15), Some("tab"));
        assert_eq!(KeycodeMap::get_key_name(30), None);
    }

    #[test]
    fn test_invalid_key() {
        assert!(KeycodeMap::get_keycode("invalid_key").is_err());
    }

    #[test]
    fn test_modifier_detection() {
        assert_eq!(KeycodeMap::modifier_for_code(56), Some(ModifierKey::Alt));
        assert_eq!(KeycodeMap::modifier_for_code(100), Some(ModifierKey::Alt));
        assert_eq!(KeycodeMap::modifier_for_code(126), Some(ModifierKey::Super));
        assert_eq!(KeycodeMap::modifier_for_code(15), None);
    }
}
