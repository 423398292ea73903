pub use super::model::{Diagnostic, ExtendedType, LineError};

pub trait TypeClassifier: Send + Sync {
    /// resolve a logged type label to its canonical type
    fn classify(&self, label: &str) -> Result<ExtendedType, LineError>;
}

/// Receives one diagnostic per anomaly. Never influences parsing.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic)
    }
}

impl<T: TypeClassifier + ?Sized> TypeClassifier for Box<T> {
    fn classify(&self, label: &str) -> Result<ExtendedType, LineError> {
        (**self).classify(label)
    }
}
