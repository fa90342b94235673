//! Percentage calculator

use super::{ToolError, ToolResult};

fn finite(values: &[f64]) -> ToolResult<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ToolError::invalid_input("values must be finite numbers"))
    }
}

/// `p` percent of `n`
pub fn percent_of(p: f64, n: f64) -> ToolResult<f64> {
    finite(&[p, n])?;
    Ok(p / 100.0 * n)
}

/// What percent `part` is of `whole`
pub fn what_percent(part: f64, whole: f64) -> ToolResult<f64> {
    finite(&[part, whole])?;
    if whole == 0.0 {
        return Err(ToolError::DivisionByZero);
    }
    Ok(part / whole * 100.0)
}

/// Relative change from `from` to `to`, in percent
pub fn percent_change(from: f64, to: f64) -> ToolResult<f64> {
    finite(&[from, to])?;
    if from == 0.0 {
        return Err(ToolError::DivisionByZero);
    }
    Ok((to - from) / from.abs() * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(25.0, 200.0).unwrap(), 50.0);
        assert_eq!(percent_of(0.0, 200.0).unwrap(), 0.0);
    }

    #[test]
    fn test_what_percent() {
        assert_eq!(what_percent(50.0, 200.0).unwrap(), 25.0);
        assert_eq!(what_percent(1.0, 0.0), Err(ToolError::DivisionByZero));
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(100.0, 150.0).unwrap(), 50.0);
        assert_eq!(percent_change(200.0, 100.0).unwrap(), -50.0);
        // Negative starting values keep the sign of the movement
        assert_eq!(percent_change(-100.0, -50.0).unwrap(), 50.0);
        assert_eq!(percent_change(0.0, 10.0), Err(ToolError::DivisionByZero));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(matches!(percent_of(f64::NAN, 1.0), Err(ToolError::InvalidInput(_))));
        assert!(matches!(what_percent(1.0, f64::INFINITY), Err(ToolError::InvalidInput(_))));
    }

    proptest! {
        #[test]
        fn what_percent_inverts_percent_of(p in -1.0e4f64..1.0e4, n in -1.0e6f64..1.0e6) {
            prop_assume!(n.abs() > 1e-6);
            let part = percent_of(p, n).unwrap();
            let back = what_percent(part, n).unwrap();
            prop_assert!((back - p).abs() <= 1e-9 * p.abs().max(1.0), "{} vs {}", back, p);
        }
    }
}
