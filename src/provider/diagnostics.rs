use std::fmt;

use tracing::{info, warn};

use super::tfplugin5;
use super::tfplugin5::attribute_path::step::Selector;
use super::tfplugin5::diagnostic::Severity as WireSeverity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    /// Severity unset or not recognized.
    Invalid,
}

/// A diagnostic reported by the provider, detached from the wire message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    /// Rendered attribute path, e.g. `ingress[0].port`.
    pub attribute: Option<String>,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
            Severity::Invalid => "Diagnostic",
        };
        write!(f, "{}: {}", level, self.summary)?;
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        if let Some(ref attr) = self.attribute {
            write!(f, " (at {})", attr)?;
        }
        Ok(())
    }
}

impl From<&tfplugin5::Diagnostic> for Diagnostic {
    fn from(d: &tfplugin5::Diagnostic) -> Self {
        let severity = match WireSeverity::try_from(d.severity) {
            Ok(WireSeverity::Error) => Severity::Error,
            Ok(WireSeverity::Warning) => Severity::Warning,
            Ok(WireSeverity::Invalid) | Err(_) => Severity::Invalid,
        };
        Diagnostic {
            severity,
            summary: d.summary.clone(),
            detail: d.detail.clone(),
            attribute: d
                .attribute
                .as_ref()
                .filter(|p| !p.steps.is_empty())
                .map(attribute_path_to_string),
        }
    }
}

/// Render an attribute path the way it would be written in configuration.
pub fn attribute_path_to_string(path: &tfplugin5::AttributePath) -> String {
    let mut out = String::new();
    for step in &path.steps {
        match &step.selector {
            Some(Selector::AttributeName(name)) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
            Some(Selector::ElementKeyString(key)) => {
                let quoted = serde_json::to_string(key).unwrap_or_else(|_| format!("\"{}\"", key));
                out.push('[');
                out.push_str(&quoted);
                out.push(']');
            }
            Some(Selector::ElementKeyInt(idx)) => out.push_str(&format!("[{}]", idx)),
            None => out.push_str(".?"),
        }
    }
    out
}

/// Convert wire diagnostics, logging each one.
pub(crate) fn collect(operation: &str, diagnostics: &[tfplugin5::Diagnostic]) -> Vec<Diagnostic> {
    diagnostics
        .iter()
        .map(Diagnostic::from)
        .inspect(|d| {
            if d.is_error() {
                info!("{} diagnostic error: {}", operation, d);
            } else {
                warn!("{} provider warning: {}", operation, d);
            }
        })
        .collect()
}
