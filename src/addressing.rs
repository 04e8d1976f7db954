//! Deck and sampler addressing
//!
//! Pure translations between host group names, deck/sampler numbers and the
//! beat-loop effect slots.

/// Sampler slots on the surface
pub const SAMPLER_COUNT: u8 = 4;

/// Hotcue pads per deck
pub const HOTCUE_COUNT: u8 = 4;

/// Value the host reports for an unset loop or play position
pub const UNSET_POSITION: f64 = -1.0;

/// Host group for a deck, e.g. `[Channel1]`
pub fn deck_group(deck: u8) -> String {
    format!("[Channel{}]", deck)
}

/// Host group for a sampler slot, e.g. `[Sampler3]`
pub fn sampler_group(sampler: u8) -> String {
    format!("[Sampler{}]", sampler)
}

fn bracketed_index(group: &str, prefix: &str) -> Option<u8> {
    let digits = group.strip_prefix('[')?.strip_suffix(']')?.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Deck number from a `[Channel<N>]` group, `None` when malformed
pub fn group_to_deck(group: &str) -> Option<u8> {
    bracketed_index(group, "Channel")
}

/// Sampler number (1-4) from a `[Sampler<N>]` group
pub fn sampler_index_from_group(group: &str) -> Option<u8> {
    bracketed_index(group, "Sampler").filter(|n| (1..=SAMPLER_COUNT).contains(n))
}

/// Effect slot lit for a beat loop length
///
/// `log2(length)` for 2, 4, 8 and 16; a length of 1 counts as 16.
pub fn loop_length_to_slot(length: u32) -> Option<u8> {
    let length = if length == 1 { 16 } else { length };
    match length {
        2 | 4 | 8 | 16 => Some(length.trailing_zeros() as u8),
        _ => None,
    }
}

/// Interleaved stereo sample count covered by `beats` at `bpm`
pub fn beats_to_samples(beats: f64, bpm: f64, sample_rate: f64) -> f64 {
    beats * (60.0 / bpm) * sample_rate * 2.0
}

/// Host key names for a hotcue
pub fn hotcue_key(cue: u8, suffix: &str) -> String {
    format!("hotcue_{}_{}", cue, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_group_to_deck() {
        assert_eq!(group_to_deck("[Channel1]"), Some(1));
        assert_eq!(group_to_deck("[Channel2]"), Some(2));
        assert_eq!(group_to_deck("[Channel12]"), Some(12));
        assert_eq!(group_to_deck("Channel1"), None);
        assert_eq!(group_to_deck("[Channel]"), None);
        assert_eq!(group_to_deck("[Channel1"), None);
        assert_eq!(group_to_deck("[Channel+1]"), None);
        assert_eq!(group_to_deck("[Sampler1]"), None);
    }

    #[test]
    fn test_sampler_index_from_group() {
        assert_eq!(sampler_index_from_group("[Sampler1]"), Some(1));
        assert_eq!(sampler_index_from_group("[Sampler4]"), Some(4));
        assert_eq!(sampler_index_from_group("[Sampler5]"), None);
        assert_eq!(sampler_index_from_group("[Channel1]"), None);
    }

    #[test]
    fn test_loop_length_to_slot() {
        assert_eq!(loop_length_to_slot(2), Some(1));
        assert_eq!(loop_length_to_slot(4), Some(2));
        assert_eq!(loop_length_to_slot(8), Some(3));
        assert_eq!(loop_length_to_slot(16), Some(4));
        assert_eq!(loop_length_to_slot(1), loop_length_to_slot(16));
        assert_eq!(loop_length_to_slot(3), None);
        assert_eq!(loop_length_to_slot(32), None);
        assert_eq!(loop_length_to_slot(0), None);
    }

    #[test]
    fn test_beats_to_samples() {
        // Half a second of stereo audio at 44.1 kHz
        assert_eq!(beats_to_samples(1.0, 120.0, 44100.0), 44100.0);
    }

    proptest! {
        #[test]
        fn prop_deck_group_round_trip(deck in 1u8..=99) {
            prop_assert_eq!(group_to_deck(&deck_group(deck)), Some(deck));
        }

        #[test]
        fn prop_group_parsing_never_panics(group in ".*") {
            let _ = group_to_deck(&group);
            let _ = sampler_index_from_group(&group);
        }
    }
}
