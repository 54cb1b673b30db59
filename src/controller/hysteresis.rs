//! Threshold/fuzz decoding of analog axes and hat switches.
//!
//! Both decoders are pure: they take the raw value and the previous discrete
//! state and hand back the new state. The caller persists the result.

use super::event::hat_bits;

/// Discrete axis state codes, as stored in a mapping cell
pub const AXIS_NEUTRAL: u8 = 0;
pub const AXIS_POSITIVE: u8 = 1;
pub const AXIS_NEGATIVE: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AxisDirection {
    #[default]
    Neutral,
    Negative,
    Positive,
}

impl AxisDirection {
    pub fn from_code(code: u8) -> Self {
        match code {
            AXIS_POSITIVE => AxisDirection::Positive,
            AXIS_NEGATIVE => AxisDirection::Negative,
            _ => AxisDirection::Neutral,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            AxisDirection::Neutral => AXIS_NEUTRAL,
            AxisDirection::Positive => AXIS_POSITIVE,
            AxisDirection::Negative => AXIS_NEGATIVE,
        }
    }
}

/// Decode an axis value into a direction code.
///
/// Leaving neutral needs `threshold + fuzz`, returning to neutral needs the
/// value to fall inside `threshold - fuzz`. A value sitting exactly on the
/// effective boundary keeps the previous state.
pub fn decode_axis(raw_value: i16, previous: u8, threshold: u16, fuzz: u16) -> u8 {
    let threshold = i32::from(threshold);
    let fuzz = i32::from(fuzz);
    let effective = if previous == AXIS_NEUTRAL {
        threshold + fuzz
    } else {
        (threshold - fuzz).max(0)
    };

    let value = i32::from(raw_value);
    if value < -effective {
        AXIS_NEGATIVE
    } else if value > effective {
        AXIS_POSITIVE
    } else if value > -effective && value < effective {
        AXIS_NEUTRAL
    } else {
        previous
    }
}

/// Transitions on one hat axis. At most one direction is pressed and at
/// most one released per event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisChange {
    pub released: Option<u8>,
    pub pressed: Option<u8>,
}

impl AxisChange {
    pub fn is_empty(&self) -> bool {
        self.released.is_none() && self.pressed.is_none()
    }
}

/// Per-axis hat transitions, direction values are [`hat_bits`] constants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirectionChangeSet {
    pub vertical: AxisChange,
    pub horizontal: AxisChange,
}

impl DirectionChangeSet {
    pub fn is_empty(&self) -> bool {
        self.vertical.is_empty() && self.horizontal.is_empty()
    }
}

/// Diff two hat bit sets, each axis on its own.
pub fn decode_hat(raw_bits: u8, previous_bits: u8) -> DirectionChangeSet {
    DirectionChangeSet {
        vertical: decode_hat_axis(raw_bits, previous_bits, hat_bits::UP, hat_bits::DOWN),
        horizontal: decode_hat_axis(raw_bits, previous_bits, hat_bits::LEFT, hat_bits::RIGHT),
    }
}

fn decode_hat_axis(raw: u8, prev: u8, first: u8, second: u8) -> AxisChange {
    let newly = raw & !prev;
    let gone = prev & !raw;

    for (dir, opposite) in [(first, second), (second, first)] {
        if newly & dir != 0 {
            return AxisChange {
                released: (prev & opposite != 0).then_some(opposite),
                pressed: Some(dir),
            };
        }
    }

    // nothing new on this axis, report what was let go
    let released = if gone & first != 0 {
        Some(first)
    } else if gone & second != 0 {
        Some(second)
    } else {
        None
    };
    AxisChange {
        released,
        pressed: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const THRESHOLD: u16 = 10000;
    const FUZZ: u16 = 1000;

    #[test]
    fn leaving_neutral_needs_widened_threshold() {
        assert_eq!(decode_axis(10500, AXIS_NEUTRAL, THRESHOLD, FUZZ), AXIS_NEUTRAL);
        assert_eq!(decode_axis(11001, AXIS_NEUTRAL, THRESHOLD, FUZZ), AXIS_POSITIVE);
        assert_eq!(decode_axis(-11001, AXIS_NEUTRAL, THRESHOLD, FUZZ), AXIS_NEGATIVE);
    }

    #[test]
    fn returning_to_neutral_needs_narrowed_threshold() {
        assert_eq!(decode_axis(9500, AXIS_POSITIVE, THRESHOLD, FUZZ), AXIS_POSITIVE);
        assert_eq!(decode_axis(8999, AXIS_POSITIVE, THRESHOLD, FUZZ), AXIS_NEUTRAL);
    }

    #[test]
    fn boundary_keeps_previous_state() {
        assert_eq!(decode_axis(11000, AXIS_NEUTRAL, THRESHOLD, FUZZ), AXIS_NEUTRAL);
        assert_eq!(decode_axis(9000, AXIS_POSITIVE, THRESHOLD, FUZZ), AXIS_POSITIVE);
        assert_eq!(decode_axis(-9000, AXIS_NEGATIVE, THRESHOLD, FUZZ), AXIS_NEGATIVE);
    }

    #[test]
    fn flick_goes_straight_across() {
        assert_eq!(decode_axis(-32000, AXIS_POSITIVE, THRESHOLD, FUZZ), AXIS_NEGATIVE);
    }

    #[test]
    fn fuzz_larger_than_threshold_does_not_underflow() {
        assert_eq!(decode_axis(0, AXIS_POSITIVE, 100, 500), AXIS_POSITIVE);
        assert_eq!(decode_axis(1, AXIS_POSITIVE, 100, 500), AXIS_POSITIVE);
    }

    #[test]
    fn hat_press_from_center() {
        let set = decode_hat(hat_bits::UP, hat_bits::CENTERED);
        assert_eq!(set.vertical.pressed, Some(hat_bits::UP));
        assert_eq!(set.vertical.released, None);
        assert!(set.horizontal.is_empty());
    }

    #[test]
    fn hat_diagonal_counts_each_axis_once() {
        let set = decode_hat(hat_bits::UP | hat_bits::RIGHT, hat_bits::CENTERED);
        assert_eq!(set.vertical.pressed, Some(hat_bits::UP));
        assert_eq!(set.horizontal.pressed, Some(hat_bits::RIGHT));

        let set = decode_hat(hat_bits::UP, hat_bits::UP | hat_bits::RIGHT);
        assert!(set.vertical.is_empty());
        assert_eq!(set.horizontal.released, Some(hat_bits::RIGHT));
        assert_eq!(set.horizontal.pressed, None);
    }

    #[test]
    fn hat_reversal_releases_opposite_first() {
        let set = decode_hat(hat_bits::DOWN, hat_bits::UP);
        assert_eq!(set.vertical.released, Some(hat_bits::UP));
        assert_eq!(set.vertical.pressed, Some(hat_bits::DOWN));
    }

    #[test]
    fn direction_codes_round_trip() {
        for dir in [
            AxisDirection::Neutral,
            AxisDirection::Negative,
            AxisDirection::Positive,
        ] {
            assert_eq!(AxisDirection::from_code(dir.code()), dir);
        }
    }

    proptest! {
        #[test]
        fn stays_neutral_inside_narrow_band(
            threshold in 1000u16..20000,
            fuzz in 0u16..1000,
            values in proptest::collection::vec(any::<i16>(), 1..32),
        ) {
            let band = i32::from(threshold - fuzz);
            let mut state = AXIS_NEUTRAL;
            for v in values {
                let clamped = i32::from(v).clamp(-band, band) as i16;
                state = decode_axis(clamped, state, threshold, fuzz);
                prop_assert_eq!(state, AXIS_NEUTRAL);
            }
        }

        #[test]
        fn beyond_wide_threshold_reaches_direction_in_one_call(
            threshold in 0u16..20000,
            fuzz in 0u16..1000,
            previous in 0u8..3,
            extra in 1i32..5000,
            negative in any::<bool>(),
        ) {
            let magnitude = (i32::from(threshold) + i32::from(fuzz) + extra).min(32767);
            prop_assume!(magnitude > i32::from(threshold) + i32::from(fuzz));
            let (value, expected) = if negative {
                (-magnitude, AXIS_NEGATIVE)
            } else {
                (magnitude, AXIS_POSITIVE)
            };
            prop_assert_eq!(decode_axis(value as i16, previous, threshold, fuzz), expected);
        }

        #[test]
        fn hat_never_presses_and_releases_same_direction(raw in 0u8..16, prev in 0u8..16) {
            let set = decode_hat(raw, prev);
            for change in [set.vertical, set.horizontal] {
                if let (Some(r), Some(p)) = (change.released, change.pressed) {
                    prop_assert_ne!(r, p);
                }
            }
        }
    }
}
