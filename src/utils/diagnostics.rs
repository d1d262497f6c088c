//! Collects warnings about debug constructs we don't model. These are never fatal:
//! the walk continues around whatever was unrecognized.
use super::warn;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DiagnosticKind {
    /// A record tag that isn't expected inside its parent.
    UnknownEntry,

    /// An attribute name that isn't expected on its record (or whose payload
    /// couldn't be interpreted).
    UnknownAttribute,

    /// A location expression that doesn't match one of the folding patterns.
    UnrecognizedLocation,

    /// A line table entry whose address isn't inside any function.
    UnrecognizedLine,
}

/// Which warnings are reported and how many before the rest are suppressed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DiagnosticSettings {
    pub unknown_entries: bool,
    pub unknown_attributes: bool,
    pub unrecognized_locations: bool,
    pub unrecognized_lines: bool,

    /// None means no limit.
    pub max_warnings: Option<usize>,
}

impl Default for DiagnosticSettings {
    fn default() -> Self {
        DiagnosticSettings {
            unknown_entries: true,
            unknown_attributes: true,
            unrecognized_locations: true,
            unrecognized_lines: true,
            max_warnings: Some(100),
        }
    }
}

impl DiagnosticSettings {
    pub fn enabled(&self, kind: DiagnosticKind) -> bool {
        match kind {
            DiagnosticKind::UnknownEntry => self.unknown_entries,
            DiagnosticKind::UnknownAttribute => self.unknown_attributes,
            DiagnosticKind::UnrecognizedLocation => self.unrecognized_locations,
            DiagnosticKind::UnrecognizedLine => self.unrecognized_lines,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,

    /// Offset of the record (or line table entry address) the warning is about.
    pub offset: u32,
    pub message: String,
}

pub struct Diagnostics {
    settings: DiagnosticSettings,
    reported: Vec<Diagnostic>,
    suppressed: usize,
}

impl Diagnostics {
    pub fn new(settings: DiagnosticSettings) -> Diagnostics {
        Diagnostics {
            settings,
            reported: Vec::new(),
            suppressed: 0,
        }
    }

    pub fn report(&mut self, kind: DiagnosticKind, offset: u32, message: String) {
        if !self.settings.enabled(kind) {
            return;
        }
        match self.settings.max_warnings {
            Some(max) if self.reported.len() >= max => self.suppressed += 1,
            _ => self.reported.push(Diagnostic {
                kind,
                offset,
                message,
            }),
        }
    }

    pub fn reported(&self) -> &[Diagnostic] {
        &self.reported
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.reported.iter().filter(|d| d.kind == kind).count()
    }

    /// Number of warnings dropped because of max_warnings.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }

    /// Prints everything that was reported.
    pub fn flush(&self) {
        for d in self.reported.iter() {
            warn(&d.message);
        }
        if self.suppressed > 0 {
            warn(&format!("{} more warnings were suppressed", self.suppressed));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttles() {
        let settings = DiagnosticSettings {
            max_warnings: Some(2),
            ..Default::default()
        };
        let mut d = Diagnostics::new(settings);
        for i in 0..5 {
            d.report(DiagnosticKind::UnknownEntry, i, format!("entry {i}"));
        }
        assert_eq!(d.reported().len(), 2);
        assert_eq!(d.reported()[1].message, "entry 1");
        assert_eq!(d.suppressed(), 3);
    }

    #[test]
    fn disabled_kinds_are_dropped() {
        let settings = DiagnosticSettings {
            unrecognized_lines: false,
            ..Default::default()
        };
        let mut d = Diagnostics::new(settings);
        d.report(DiagnosticKind::UnrecognizedLine, 0x100, "line".to_string());
        d.report(DiagnosticKind::UnknownAttribute, 0x20, "attr".to_string());
        assert_eq!(d.count(DiagnosticKind::UnrecognizedLine), 0);
        assert_eq!(d.count(DiagnosticKind::UnknownAttribute), 1);
        assert_eq!(d.suppressed(), 0);
    }

    #[test]
    fn unlimited() {
        let settings = DiagnosticSettings {
            max_warnings: None,
            ..Default::default()
        };
        let mut d = Diagnostics::new(settings);
        for i in 0..500 {
            d.report(DiagnosticKind::UnrecognizedLocation, i, String::new());
        }
        assert_eq!(d.reported().len(), 500);
    }
}
