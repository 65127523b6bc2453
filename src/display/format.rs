//! Compact number rendering for reports and diagnostics.

use std::fmt;

/// Formats a float with three significant digits, dropping trailing zeros
/// (the `%.3g` convention engineers expect on schematic annotations).
///
/// `12.0` -> `12`, `0.41666` -> `0.417`, `1234.0` -> `1.23e+03`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sig(pub f64);

impl fmt::Display for Sig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        if v.is_nan() {
            return f.write_str("nan");
        }
        if v.is_infinite() {
            return f.write_str(if v > 0.0 { "inf" } else { "-inf" });
        }
        if v == 0.0 {
            return f.write_str("0");
        }

        // Round to 3 significant digits first; the exponent must come from the
        // rounded value (999.7 -> 1e+03).
        let sci = format!("{:.2e}", v);
        let (mantissa, exp) = match sci.split_once('e') {
            Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
            None => (sci.as_str(), 0),
        };

        if !(-4..3).contains(&exp) {
            let sign = if exp < 0 { '-' } else { '+' };
            write!(f, "{}e{}{:02}", trim_zeros(mantissa), sign, exp.abs())
        } else {
            let decimals = (2 - exp) as usize;
            let fixed = format!("{:.*}", decimals, v);
            f.write_str(trim_zeros(&fixed))
        }
    }
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
