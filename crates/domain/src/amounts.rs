// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Descending-price arithmetic for the dutch phase.

/// Computes the price for the next dutch round.
///
/// Each round drops the price by one percent of the auction's initial value,
/// independent of the current price. The result is rounded to two decimal
/// places, half away from zero.
#[must_use]
pub fn next_dutch_amount(initial_value: f64, current_value: f64) -> f64 {
    let step: f64 = initial_value / 100.0;
    round_half_up(current_value - step)
}

fn round_half_up(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_amount_from_descended_price() {
        let result = next_dutch_amount(500_000.0, 480_700.0);
        assert!((result - 475_700.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_next_amount_small_values() {
        let result = next_dutch_amount(20_000.0, 13_655.0);
        assert!((result - 13_455.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_first_step_from_initial_value() {
        let result = next_dutch_amount(26_000.0, 26_000.0);
        assert!((result - 25_740.0).abs() < f64::EPSILON);
    }
}
