//! Structured electrical diagnostics attached to stages.
use crate::display::format::Sig;
use crate::store::NodeId;
use std::fmt;

/// Hard violations mean the configuration cannot work as drawn; warnings flag
/// a value sitting inside the safety margin of a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Violation,
    Warning,
}

/// The specific rule that fired, with the numbers that made it fire.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
    /// A source's nominal output lies outside its configured band.
    SourceOutputOutOfRange { vout: f64, min: f64, max: f64 },
    /// An LDO needs `vin > vout + dropout`.
    InsufficientDropout { vin: f64, vout: f64 },
    /// Requested output current exceeds the IC's rating.
    CurrentCapabilityExceeded { limit: f64, requested: f64 },
    /// Input voltage outside the margin-narrowed band `[low, high]`.
    /// `min`/`max` are the raw configured limits.
    InputVoltageMargin { vin: f64, low: f64, high: f64, min: f64, max: f64 },
    /// Sum of the currents requested by a source's children exceeds its rating.
    SupplyOverload { total: f64, limit: f64 },
    SupplyNearLimit { total: f64, limit: f64 },
}

impl DiagnosticKind {
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::SupplyNearLimit { .. } => Severity::Warning,
            DiagnosticKind::InputVoltageMargin { vin, min, max, .. } => {
                if *min <= *vin && *vin <= *max {
                    Severity::Warning
                } else {
                    Severity::Violation
                }
            }
            _ => Severity::Violation,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DiagnosticKind::SourceOutputOutOfRange { vout, min, max } => write!(
                f, "Output {} V is outside source range ({}-{} V)", Sig(vout), Sig(min), Sig(max)
            ),
            DiagnosticKind::InsufficientDropout { vin, vout } => write!(
                f, "Vin {} V must be > Vout {} V for an LDO", Sig(vin), Sig(vout)
            ),
            DiagnosticKind::CurrentCapabilityExceeded { limit, requested } => write!(
                f, "IC max current {} A < requested Iout {} A", Sig(limit), Sig(requested)
            ),
            DiagnosticKind::InputVoltageMargin { vin, low, high, .. } => write!(
                f, "Vin {} V is close/outside Vin_min/Vin_max range ({};{} V)", Sig(vin), Sig(low), Sig(high)
            ),
            DiagnosticKind::SupplyOverload { total, limit } => write!(
                f, "Total load {} A > source Imax {} A", Sig(total), Sig(limit)
            ),
            DiagnosticKind::SupplyNearLimit { total, limit } => write!(
                f, "Total load {} A is close to source Imax {} A", Sig(total), Sig(limit)
            ),
        }
    }
}

/// A diagnostic bound to the stage that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub node_id: NodeId,
    /// Stage name at the time of the recompute, for rendering.
    pub node_name: String,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(node_id: NodeId, node_name: impl Into<String>, kind: DiagnosticKind) -> Self {
        Self { node_id, node_name: node_name.into(), kind }
    }

    pub fn severity(&self) -> Severity { self.kind.severity() }

    pub fn is_violation(&self) -> bool { self.severity() == Severity::Violation }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.node_name, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendering_matches_panel_format() {
        let d = Diagnostic::new(
            NodeId(4),
            "LDO_2",
            DiagnosticKind::CurrentCapabilityExceeded { limit: 1.0, requested: 3.0 },
        );
        assert_eq!(d.to_string(), "[LDO_2] IC max current 1 A < requested Iout 3 A");

        let s = Diagnostic::new(NodeId(0), "SOURCE_1", DiagnosticKind::SupplyNearLimit { total: 1.9, limit: 2.0 });
        assert_eq!(s.to_string(), "[SOURCE_1] Total load 1.9 A is close to source Imax 2 A");
    }

    #[test]
    fn test_margin_severity_depends_on_raw_band() {
        let inside = DiagnosticKind::InputVoltageMargin { vin: 4.9, low: 4.725, high: 4.75, min: 4.5, max: 5.0 };
        assert_eq!(inside.severity(), Severity::Warning);

        let outside = DiagnosticKind::InputVoltageMargin { vin: 24.0, low: 0.0, high: 19.0, min: 0.0, max: 20.0 };
        assert_eq!(outside.severity(), Severity::Violation);
    }

    #[test]
    fn test_infinite_context_renders() {
        let d = DiagnosticKind::CurrentCapabilityExceeded { limit: 1.0, requested: f64::INFINITY };
        assert_eq!(d.to_string(), "IC max current 1 A < requested Iout inf A");
    }
}
