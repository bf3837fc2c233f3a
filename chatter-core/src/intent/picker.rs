//! Response index sources.

use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Chooses which of a rule's responses to return.
pub trait ResponsePicker: Send + Sync {
    /// Index in `[0, len)`. `len` is never zero.
    fn pick(&self, len: usize) -> usize;
}

/// Uniform, non-cryptographic random choice.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPicker;

impl ResponsePicker for RandomPicker {
    fn pick(&self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        rand::thread_rng().gen_range(0..len)
    }
}

/// Always the same index, clamped into range.
#[derive(Debug, Clone, Copy)]
pub struct FixedPicker(pub usize);

impl ResponsePicker for FixedPicker {
    fn pick(&self, len: usize) -> usize {
        self.0.min(len.saturating_sub(1))
    }
}

/// Round robin: 0, 1, 2, ... wrapping at `len`.
#[derive(Debug, Default)]
pub struct SequencePicker {
    next: AtomicUsize,
}

impl SequencePicker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResponsePicker for SequencePicker {
    fn pick(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.next.fetch_add(1, Ordering::Relaxed) % len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fixed_picker_clamps() {
        assert_eq!(FixedPicker(0).pick(3), 0);
        assert_eq!(FixedPicker(2).pick(3), 2);
        assert_eq!(FixedPicker(9).pick(3), 2);
    }

    #[test]
    fn test_sequence_picker_wraps() {
        let picker = SequencePicker::new();
        let picks: Vec<usize> = (0..5).map(|_| picker.pick(2)).collect();
        assert_eq!(picks, vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn test_random_picker_varies() {
        let picker = RandomPicker;
        let distinct: std::collections::HashSet<usize> =
            (0..200).map(|_| picker.pick(4)).collect();
        assert!(distinct.len() > 1);
    }

    proptest! {
        #[test]
        fn prop_random_pick_in_range(len in 1usize..64) {
            prop_assert!(RandomPicker.pick(len) < len);
        }

        #[test]
        fn prop_fixed_pick_in_range(idx in 0usize..1000, len in 1usize..64) {
            prop_assert!(FixedPicker(idx).pick(len) < len);
        }
    }
}
