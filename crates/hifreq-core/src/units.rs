//! Dimensioned quantities.
//!
//! Configuration values that carry a physical dimension are written as a
//! number followed by an explicit unit symbol (`"10 kBq"`, `"1.5us"`,
//! `"609 keV"`). Parsing converts them to the workspace base units:
//! becquerel for activity, seconds for time and MeV for energy. A bare
//! number is rejected: the unit is never implied.

use std::fmt;

use crate::error::UnitError;

/// Physical dimension of a quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Activity,
    Time,
    Energy,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Activity => "activity",
            Self::Time => "time",
            Self::Energy => "energy",
        };
        f.write_str(label)
    }
}

/// Known unit symbols with their value in base units.
const UNITS: &[(&str, f64, Dimension)] = &[
    ("Bq", 1.0, Dimension::Activity),
    ("kBq", 1.0e3, Dimension::Activity),
    ("MBq", 1.0e6, Dimension::Activity),
    ("GBq", 1.0e9, Dimension::Activity),
    ("Ci", 3.7e10, Dimension::Activity),
    ("mCi", 3.7e7, Dimension::Activity),
    ("uCi", 3.7e4, Dimension::Activity),
    ("nCi", 3.7e1, Dimension::Activity),
    ("s", 1.0, Dimension::Time),
    ("ms", 1.0e-3, Dimension::Time),
    ("us", 1.0e-6, Dimension::Time),
    ("µs", 1.0e-6, Dimension::Time),
    ("ns", 1.0e-9, Dimension::Time),
    ("ps", 1.0e-12, Dimension::Time),
    ("min", 60.0, Dimension::Time),
    ("h", 3600.0, Dimension::Time),
    ("eV", 1.0e-6, Dimension::Energy),
    ("keV", 1.0e-3, Dimension::Energy),
    ("MeV", 1.0, Dimension::Energy),
    ("GeV", 1.0e3, Dimension::Energy),
];

/// Look up a unit symbol, returning its scale to base units and its dimension.
pub fn find_unit(symbol: &str) -> Option<(f64, Dimension)> {
    UNITS
        .iter()
        .find(|(s, _, _)| *s == symbol)
        .map(|&(_, scale, dim)| (scale, dim))
}

/// A value expressed in base units together with its dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub dimension: Dimension,
}

impl Quantity {
    /// Return the base-unit value if the dimension matches `expected`.
    pub fn expect(self, expected: Dimension) -> Result<f64, UnitError> {
        if self.dimension != expected {
            return Err(UnitError::WrongDimension {
                expected,
                got: self.dimension,
            });
        }
        Ok(self.value)
    }
}

/// Parse `"<number> <unit>"` (the space is optional).
pub fn parse_quantity(text: &str) -> Result<Quantity, UnitError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(UnitError::Empty);
    }

    let (number, symbol) = split_number(text)?;
    if symbol.is_empty() {
        return Err(UnitError::MissingUnit(text.to_string()));
    }
    let (scale, dimension) =
        find_unit(symbol).ok_or_else(|| UnitError::UnknownUnit(symbol.to_string()))?;

    Ok(Quantity {
        value: number * scale,
        dimension,
    })
}

/// Parse a quantity and check its dimension in one step.
pub fn parse_in(text: &str, expected: Dimension) -> Result<f64, UnitError> {
    parse_quantity(text)?.expect(expected)
}

/// Split the longest finite numeric prefix from the unit suffix.
fn split_number(text: &str) -> Result<(f64, &str), UnitError> {
    let boundaries = text
        .char_indices()
        .map(|(i, _)| i)
        .skip(1)
        .chain(std::iter::once(text.len()));
    let mut best = None;
    for end in boundaries {
        if let Ok(v) = text[..end].trim_end().parse::<f64>() {
            if v.is_finite() {
                best = Some((v, end));
            }
        }
    }
    match best {
        Some((v, end)) => Ok((v, text[end..].trim())),
        None => Err(UnitError::InvalidNumber(text.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * a.abs().max(b.abs())
    }

    #[test]
    fn parses_activity_with_space() {
        let q = parse_quantity("10 kBq").unwrap();
        assert_eq!(q.dimension, Dimension::Activity);
        assert!(close(q.value, 1.0e4));
    }

    #[test]
    fn parses_time_without_space() {
        let q = parse_quantity("1.5us").unwrap();
        assert_eq!(q.dimension, Dimension::Time);
        assert!(close(q.value, 1.5e-6));
    }

    #[test]
    fn parses_exponent_notation() {
        let q = parse_quantity("2e3 ns").unwrap();
        assert!(close(q.value, 2.0e-6));
    }

    #[test]
    fn parses_energy() {
        assert!(close(parse_in("609 keV", Dimension::Energy).unwrap(), 0.609));
    }

    #[test]
    fn curie_conversion() {
        assert!(close(parse_in("1 uCi", Dimension::Activity).unwrap(), 3.7e4));
    }

    #[test]
    fn bare_number_is_missing_unit() {
        assert_eq!(
            parse_quantity("10"),
            Err(UnitError::MissingUnit("10".into()))
        );
    }

    #[test]
    fn unknown_unit_rejected() {
        assert_eq!(
            parse_quantity("10 furlongs"),
            Err(UnitError::UnknownUnit("furlongs".into()))
        );
    }

    #[test]
    fn non_numeric_rejected() {
        assert!(matches!(
            parse_quantity("fast"),
            Err(UnitError::InvalidNumber(_))
        ));
        assert_eq!(parse_quantity("   "), Err(UnitError::Empty));
    }

    #[test]
    fn wrong_dimension_rejected() {
        assert_eq!(
            parse_in("1 s", Dimension::Activity),
            Err(UnitError::WrongDimension {
                expected: Dimension::Activity,
                got: Dimension::Time,
            })
        );
    }

    #[test]
    fn negative_values_parse() {
        // Sign checks belong to the consumer, not the parser.
        assert!(close(parse_in("-3 ms", Dimension::Time).unwrap(), -3.0e-3));
    }

    #[test]
    fn find_unit_known_and_unknown() {
        assert_eq!(find_unit("h"), Some((3600.0, Dimension::Time)));
        assert_eq!(find_unit("parsec"), None);
    }
}
