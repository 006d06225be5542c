//! Specialized collection types

use slotmap::{new_key_type, Key, KeyData, SlotMap};

use crate::backend::UserSlot;

new_key_type! {
    /// Stable key of a window's callback record
    pub struct CallbackKey;
}

/// Slot map keyed by stable, versioned handles
pub type HandleMap<K, T> = SlotMap<K, T>;

impl CallbackKey {
    /// Encode the key for a native user-data slot
    pub fn to_user_slot(self) -> UserSlot {
        UserSlot(self.data().as_ffi())
    }

    /// Decode a key previously written with [`to_user_slot`](Self::to_user_slot)
    pub fn from_user_slot(slot: UserSlot) -> Self {
        KeyData::from_ffi(slot.0).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_slot_roundtrip() {
        let mut map: HandleMap<CallbackKey, u32> = HandleMap::with_key();
        let key = map.insert(5);
        let decoded = CallbackKey::from_user_slot(key.to_user_slot());
        assert_eq!(decoded, key);
        assert_eq!(map.get(decoded), Some(&5));
    }

    #[test]
    fn test_removed_key_stays_dead() {
        let mut map: HandleMap<CallbackKey, u32> = HandleMap::with_key();
        let first = map.insert(1);
        map.remove(first);
        let second = map.insert(2);
        assert_ne!(first, second);
        assert!(map.get(first).is_none());
    }
}
