// Numeric classifier and mean formatting

use telemetry_rollup::rollup::numeric::{format_mean, is_numeric, numeric_mean};

#[test]
fn accepts_signed_and_unsigned_decimals() {
    for v in ["0", "5", "+5", "-3.2", "25.10", "007", "-0.000", "123456789.987654321"] {
        assert!(is_numeric(v), "{v:?} should be numeric");
    }
}

#[test]
fn rejects_everything_outside_the_grammar() {
    for v in [
        "", "5.", ".5", "+", "-", "abc", "5e3", "1E-2", " 5", "5 ", "1,000", "1.2.3", "+-5",
        "--5", "0x10", "NaN", "inf", "ON", "٣",
    ] {
        assert!(!is_numeric(v), "{v:?} should not be numeric");
    }
}

#[test]
fn numeric_mean_requires_every_value_numeric() {
    assert_eq!(numeric_mean(["1", "2", "3"]), Some(2.0));
    assert_eq!(numeric_mean(["1", "2", "five"]), None);
    assert_eq!(numeric_mean(["5."]), None);
}

#[test]
fn numeric_mean_of_nothing_is_none() {
    assert_eq!(numeric_mean(std::iter::empty::<&str>()), None);
}

#[test]
fn format_mean_always_two_fraction_digits() {
    assert_eq!(format_mean(25.0), "25.00");
    assert_eq!(format_mean(-3.2), "-3.20");
    assert_eq!(format_mean(1.0 / 3.0), "0.33");
    assert_eq!(format_mean(2.0 / 3.0), "0.67");
}

#[test]
fn format_mean_rounds_exact_ties_half_to_even() {
    // 0.125, 0.375 and 2.625 are exact in binary, so these are true ties.
    assert_eq!(format_mean(0.125), "0.12");
    assert_eq!(format_mean(0.375), "0.38");
    assert_eq!(format_mean(2.625), "2.62");
}

#[test]
fn format_mean_rounds_inexact_values_by_their_binary_value() {
    // 1.005 is stored as 1.00499999999999989..., so it rounds down.
    assert_eq!(format_mean(1.005), "1.00");
}

#[test]
fn mean_of_three_temperature_readings() {
    let mean = numeric_mean(["25.10", "25.30", "24.90"]).unwrap();
    assert_eq!(format_mean(mean), "25.10");
}
