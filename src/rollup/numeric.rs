// Numeric classification for the per-partition aggregation policy.

/// True iff `value` is a plain signed decimal: optional `+`/`-`, one or more
/// ASCII digits, optionally `.` followed by one or more digits.
///
/// No exponent, no thousands separators, no surrounding whitespace, no bare
/// trailing or leading dot. Leading zeros are allowed.
///
/// ```
/// use telemetry_rollup::rollup::numeric::is_numeric;
/// assert!(is_numeric("+5"));
/// assert!(is_numeric("-3.2"));
/// assert!(!is_numeric("5."));
/// assert!(!is_numeric("5e3"));
/// ```
pub fn is_numeric(value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    all_digits(int_part) && frac_part.is_none_or(all_digits)
}

/// Mean of `values` if every one is numeric, else `None`.
pub fn numeric_mean<'a, I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut sum = 0.0_f64;
    let mut count = 0_usize;
    for v in values {
        if !is_numeric(v) {
            return None;
        }
        sum += v.parse::<f64>().ok()?;
        count += 1;
    }
    (count > 0).then(|| sum / count as f64)
}

/// Two fractional digits. Rounds the exact binary value; exact ties go to the
/// even digit (`0.125` -> `"0.12"`, `0.375` -> `"0.38"`).
pub fn format_mean(mean: f64) -> String {
    format!("{:.2}", mean)
}
