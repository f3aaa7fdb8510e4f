use super::{Polynomial1D, Polynomial2D};
use crate::math::space::{parse_rational, Rational, RationalParseError};

use num_traits::One;
use std::str::FromStr;
use thiserror::Error;

/// Reasons a polynomial literal can be rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolynomialParseError {
    #[error("polynomial literal is empty")]
    Empty,
    #[error("unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },
    #[error("malformed term '{0}'")]
    MalformedTerm(String),
    #[error("malformed coefficient in term '{term}'")]
    Coefficient {
        term: String,
        #[source]
        source: RationalParseError,
    },
    #[error("malformed exponent in term '{0}'")]
    Exponent(String),
}

impl FromStr for Polynomial1D {
    type Err = PolynomialParseError;

    /// Parse a sum of terms `[sign]coef[t[^deg]]`, e.g. `"-1/4t^21+t^3-t+5/7"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_terms(
            parse_terms(s, ['t'])?
                .into_iter()
                .map(|(coefficient, [d])| (d, coefficient)),
        ))
    }
}

impl FromStr for Polynomial2D {
    type Err = PolynomialParseError;

    /// Parse a sum of terms `[sign]coef[x[^deg]][y[^deg]]`, e.g. `"-5/7x^2y^9+xy-1"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_terms(
            parse_terms(s, ['x', 'y'])?
                .into_iter()
                .map(|(coefficient, degrees)| (degrees, coefficient)),
        ))
    }
}

/// Split a literal into coefficient/degree pairs over the given variable names.
///
/// Spaces are ignored; any character other than digits, `+-^/`, spaces and the variable names is rejected.
pub(crate) fn parse_terms<const N: usize>(
    literal: &str,
    variables: [char; N],
) -> Result<Vec<(Rational, [u32; N])>, PolynomialParseError> {
    if let Some((position, character)) = literal.chars().enumerate().find(|(_, c)| {
        !(c.is_ascii_digit() || "+-^/ ".contains(*c) || variables.contains(c))
    }) {
        return Err(PolynomialParseError::UnexpectedCharacter {
            character,
            position,
        });
    }

    let compact: String = literal.chars().filter(|c| *c != ' ').collect();
    if compact.is_empty() {
        return Err(PolynomialParseError::Empty);
    }

    split_terms(&compact)
        .iter()
        .map(|term| parse_term(term, &variables))
        .collect()
}

// split "-1/4t^21+t^3-t" into ["-1/4t^21", "+t^3", "-t"]
fn split_terms(compact: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let mut current = String::new();
    for c in compact.chars() {
        if (c == '+' || c == '-') && !current.is_empty() && !current.ends_with('^') {
            terms.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    terms.push(current);
    terms
}

fn parse_term<const N: usize>(
    term: &str,
    variables: &[char; N],
) -> Result<(Rational, [u32; N]), PolynomialParseError> {
    let malformed = || PolynomialParseError::MalformedTerm(term.to_string());

    let (negative, unsigned) = match term.chars().next() {
        Some('-') => (true, &term[1..]),
        Some('+') => (false, &term[1..]),
        _ => (false, term),
    };

    let coefficient_end = unsigned
        .find(|c: char| !(c.is_ascii_digit() || c == '/'))
        .unwrap_or(unsigned.len());
    let (coefficient_str, mut rest) = unsigned.split_at(coefficient_end);

    let mut coefficient = if coefficient_str.is_empty() {
        if rest.is_empty() {
            return Err(malformed());
        }
        Rational::one()
    } else {
        parse_rational(coefficient_str).map_err(|source| PolynomialParseError::Coefficient {
            term: term.to_string(),
            source,
        })?
    };
    if negative {
        coefficient = -coefficient;
    }

    let mut degrees = [0; N];
    while let Some(variable) = rest.chars().next() {
        let var_idx = variables
            .iter()
            .position(|v| *v == variable)
            .ok_or_else(malformed)?;
        rest = &rest[variable.len_utf8()..];

        let degree = if let Some(after_caret) = rest.strip_prefix('^') {
            let digits_end = after_caret
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after_caret.len());
            let (digits, remainder) = after_caret.split_at(digits_end);
            rest = remainder;
            digits
                .parse::<u32>()
                .map_err(|_| PolynomialParseError::Exponent(term.to_string()))?
        } else {
            1
        };

        degrees[var_idx] += degree;
    }

    Ok((coefficient, degrees))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::space::{frac, int};

    #[test]
    fn term_splitting() {
        assert_eq!(
            split_terms("-1/4t^21+t^3-t+t+5/7-0"),
            vec!["-1/4t^21", "+t^3", "-t", "+t", "+5/7", "-0"]
        );
        assert_eq!(split_terms("t"), vec!["t"]);
        assert_eq!(split_terms("0"), vec!["0"]);
    }

    #[test]
    fn single_terms() {
        let t = ['t'];
        assert_eq!(parse_term("-1/4t^21", &t).unwrap(), (frac(-1, 4), [21]));
        assert_eq!(parse_term("12/7t^9", &t).unwrap(), (frac(12, 7), [9]));
        assert_eq!(parse_term("-t^9", &t).unwrap(), (int(-1), [9]));
        assert_eq!(parse_term("t", &t).unwrap(), (int(1), [1]));
        assert_eq!(parse_term("4", &t).unwrap(), (int(4), [0]));
        assert_eq!(parse_term("-4", &t).unwrap(), (int(-4), [0]));
        assert_eq!(parse_term("0", &t).unwrap(), (int(0), [0]));

        let xy = ['x', 'y'];
        assert_eq!(
            parse_term("-5/7x^2024y^9", &xy).unwrap(),
            (frac(-5, 7), [2024, 9])
        );
        assert_eq!(parse_term("yx", &xy).unwrap(), (int(1), [1, 1]));
    }

    #[test]
    fn whole_polynomials() {
        let p: Polynomial1D = "-1/4t^2 + 1/4t - 1".parse().unwrap();
        assert_eq!(p.coefficient(2), frac(-1, 4));
        assert_eq!(p.coefficient(1), frac(1, 4));
        assert_eq!(p.coefficient(0), int(-1));

        let q: Polynomial2D = "x^2 - 2xy + y^2 - 0".parse().unwrap();
        assert_eq!(q.coefficient([1, 1]), int(-2));
        assert_eq!(q.terms().count(), 3);
    }

    #[test]
    fn malformed_literals() {
        assert!(matches!(
            "2z".parse::<Polynomial2D>(),
            Err(PolynomialParseError::UnexpectedCharacter {
                character: 'z',
                position: 1
            })
        ));
        assert!(matches!(
            "x".parse::<Polynomial1D>(),
            Err(PolynomialParseError::UnexpectedCharacter { .. })
        ));
        assert_eq!("".parse::<Polynomial1D>(), Err(PolynomialParseError::Empty));
        assert_eq!("   ".parse::<Polynomial2D>(), Err(PolynomialParseError::Empty));
        assert!(matches!(
            "x^".parse::<Polynomial2D>(),
            Err(PolynomialParseError::Exponent(_))
        ));
        assert!(matches!(
            "1+-x".parse::<Polynomial2D>(),
            Err(PolynomialParseError::MalformedTerm(_))
        ));
        assert!(matches!(
            "x2".parse::<Polynomial2D>(),
            Err(PolynomialParseError::MalformedTerm(_))
        ));
        assert!(matches!(
            "1/0x".parse::<Polynomial2D>(),
            Err(PolynomialParseError::Coefficient { .. })
        ));
    }
}
