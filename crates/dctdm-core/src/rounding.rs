//! "Round half away from zero", used by the scan encoder's quantization
//! step and by the DCTDM pair update. Banker's rounding would change
//! round-trip stability for differences that land exactly on a bin
//! boundary.

pub fn round_half_away_from_zero(x: f64) -> i32 {
    if x >= 0.0 {
        (x + 0.5).floor() as i32
    } else {
        (x - 0.5).ceil() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_away_from_zero_on_ties() {
        assert_eq!(round_half_away_from_zero(0.5), 1);
        assert_eq!(round_half_away_from_zero(-0.5), -1);
        assert_eq!(round_half_away_from_zero(2.5), 3);
        assert_eq!(round_half_away_from_zero(-2.5), -3);
    }

    #[test]
    fn rounds_ordinary_values() {
        assert_eq!(round_half_away_from_zero(2.4), 2);
        assert_eq!(round_half_away_from_zero(-2.4), -2);
        assert_eq!(round_half_away_from_zero(0.0), 0);
    }
}
