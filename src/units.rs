//! Engineering-notation display of measurement results.

use std::fmt;

/// Keysight oscilloscopes answer 9.9E+37 for a measurement they could not
/// make (clipped signal, no edges on screen, ...).
pub const OVER_RANGE: f64 = 9.9e37;

/// What an over-range value displays as.
pub const OVER_RANGE_DISPLAY: &str = "------";

const DEFAULT_SIGNIFICANT_DIGITS: usize = 4;

const PREFIXES: [(i32, &str); 17] = [
    (-24, "y"),
    (-21, "z"),
    (-18, "a"),
    (-15, "f"),
    (-12, "p"),
    (-9, "n"),
    (-6, "u"),
    (-3, "m"),
    (0, ""),
    (3, "k"),
    (6, "M"),
    (9, "G"),
    (12, "T"),
    (15, "P"),
    (18, "E"),
    (21, "Z"),
    (24, "Y"),
];

const MIN_PREFIX_EXP: i32 = -24;
const MAX_PREFIX_EXP: i32 = 24;

fn prefix(exp: i32) -> &'static str {
    PREFIXES
        .iter()
        .find(|(e, _)| *e == exp)
        .map(|(_, p)| *p)
        .unwrap_or("")
}

/// A number with an optional unit, displayed with an SI prefix.
///
/// The formatter precision is the number of significant digits (4 when
/// unset); trailing zeros are dropped. Width and alignment are honored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: Option<&'static str>,
}

impl Quantity {
    pub fn new(value: f64, unit: Option<&'static str>) -> Self {
        Self { value, unit }
    }

    fn render(&self, significant: usize) -> String {
        if !self.value.is_finite() {
            return self.join(format!("{}", self.value), "");
        }
        let significant = significant.max(1);
        let (mantissa, mut exp) = scale(self.value);
        if exp < MIN_PREFIX_EXP || exp > MAX_PREFIX_EXP {
            return self.join(exponential(self.value, significant), "");
        }
        let mut text = round_to(mantissa, significant);
        // rounding can carry into the next prefix, 999.99 -> 1000
        if let Ok(rounded) = text.parse::<f64>() {
            if rounded.abs() >= 1000.0 {
                if exp == MAX_PREFIX_EXP {
                    return self.join(exponential(self.value, significant), "");
                }
                exp += 3;
                text = round_to(rounded / 1000.0, significant);
            }
        }
        self.join(text, prefix(exp))
    }

    fn join(&self, number: String, prefix: &str) -> String {
        match self.unit {
            Some(unit) => format!("{} {}{}", number, prefix, unit),
            None => format!("{}{}", number, prefix),
        }
    }
}

/// Mantissa and its power of ten, a multiple of 3.
fn scale(value: f64) -> (f64, i32) {
    if value == 0.0 {
        return (0.0, 0);
    }
    let exp = (value.abs().log10() / 3.0).floor() as i32 * 3;
    (value / 10f64.powi(exp), exp)
}

fn round_to(mantissa: f64, significant: usize) -> String {
    let int_digits = if mantissa == 0.0 {
        1
    } else {
        (mantissa.abs().log10().floor() as i64 + 1).max(1) as usize
    };
    if significant < int_digits {
        let step = 10f64.powi((int_digits - significant) as i32);
        return zero_unsigned(format!("{}", (mantissa / step).round() * step));
    }
    let decimals = significant - int_digits;
    zero_unsigned(trim_zeros(format!("{:.*}", decimals, mantissa)))
}

/// Scientific notation for magnitudes no prefix covers.
fn exponential(value: f64, significant: usize) -> String {
    let text = format!("{:.*e}", significant - 1, value);
    match text.split_once('e') {
        Some((mantissa, exp)) => format!("{}e{}", trim_zeros(mantissa.to_string()), exp),
        None => text,
    }
}

fn trim_zeros(mut text: String) -> String {
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
    text
}

fn zero_unsigned(text: String) -> String {
    if text == "-0" {
        "0".to_string()
    } else {
        text
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.render(f.precision().unwrap_or(DEFAULT_SIGNIFICANT_DIGITS));
        pad(f, &text)
    }
}

fn pad(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    match (f.width(), f.align()) {
        (Some(w), Some(fmt::Alignment::Left)) => write!(f, "{:<w$}", text, w = w),
        (Some(w), Some(fmt::Alignment::Center)) => write!(f, "{:^w$}", text, w = w),
        (Some(w), _) => write!(f, "{:>w$}", text, w = w),
        (None, _) => f.write_str(text),
    }
}

/// A measurement ready for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Polished {
    OverRange,
    Quantity(Quantity),
}

impl Polished {
    /// `value >= OVER_RANGE` becomes [`Polished::OverRange`].
    pub fn new(value: f64, unit: Option<&'static str>) -> Self {
        if value >= OVER_RANGE {
            Polished::OverRange
        } else {
            Polished::Quantity(Quantity::new(value, unit))
        }
    }

    pub fn is_over_range(&self) -> bool {
        matches!(self, Polished::OverRange)
    }
}

impl fmt::Display for Polished {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polished::OverRange => pad(f, OVER_RANGE_DISPLAY),
            Polished::Quantity(q) => q.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn si_prefixes() {
        assert_eq!(Quantity::new(0.0015, Some("s")).to_string(), "1.5 ms");
        assert_eq!(Quantity::new(2.5e6, Some("Hz")).to_string(), "2.5 MHz");
        assert_eq!(Quantity::new(12.0, Some("V")).to_string(), "12 V");
        assert_eq!(Quantity::new(-0.25, Some("V")).to_string(), "-250 mV");
        assert_eq!(Quantity::new(0.0, Some("V")).to_string(), "0 V");
        assert_eq!(Quantity::new(1500.0, None).to_string(), "1.5k");
    }

    #[test]
    fn precision_is_significant_digits() {
        let q = Quantity::new(1.23456789e-3, Some("V"));
        assert_eq!(q.to_string(), "1.235 mV");
        assert_eq!(format!("{:.6}", q), "1.23457 mV");
    }

    #[test]
    fn rounding_carries_into_next_prefix() {
        assert_eq!(Quantity::new(999.99996, Some("V")).to_string(), "1 kV");
        assert_eq!(format!("{:.2}", Quantity::new(996e-6, Some("s"))), "1 ms");
    }

    #[test]
    fn fewer_digits_than_the_integer_part() {
        assert_eq!(format!("{:.2}", Quantity::new(123.0, Some("V"))), "120 V");
        assert_eq!(format!("{:.1}", Quantity::new(-456e3, Some("Hz"))), "-500 kHz");
        assert_eq!(format!("{:.2}", Quantity::new(987.0, None)), "990");
    }

    #[test]
    fn beyond_the_prefix_table_uses_exponents() {
        assert_eq!(Quantity::new(1e-30, Some("V")).to_string(), "1e-30 V");
        assert_eq!(Quantity::new(-2.5e30, Some("Hz")).to_string(), "-2.5e30 Hz");
        assert_eq!(format!("{:.3}", Quantity::new(9.8e37, None)), "9.8e37");
        assert_eq!(Quantity::new(999.99996e24, Some("V")).to_string(), "1e27 V");
        assert_eq!(Quantity::new(1.5e-24, Some("s")).to_string(), "1.5 ys");
    }

    #[test]
    fn width_and_alignment() {
        let q = Quantity::new(3.0, Some("V"));
        assert_eq!(format!("{:>6}", q), "   3 V");
        assert_eq!(format!("{:<6}|", q), "3 V   |");
    }

    #[test]
    fn over_range_threshold_is_inclusive() {
        assert!(Polished::new(OVER_RANGE, Some("V")).is_over_range());
        assert!(Polished::new(1e38, None).is_over_range());
        let below = Polished::new(9.8e37, Some("V"));
        assert!(!below.is_over_range());
        assert_eq!(Polished::new(OVER_RANGE, None).to_string(), "------");
        assert_eq!(format!("{:>8}", Polished::OverRange), "  ------");
    }
}
