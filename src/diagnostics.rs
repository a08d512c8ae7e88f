//! Injected sink for warnings the core wants to surface without touching
//! stdio directly (soft input errors during solution loading, degenerate
//! placement notices, and the like).

use std::sync::Mutex;

/// Something the core can hand a warning string to.
///
/// The core is side-effect free with respect to standard streams: it never
/// calls `println!`/`eprintln!` itself, it calls `Diagnostics::warn`.
pub trait Diagnostics {
    fn warn(&self, message: &str);
}

/// Forwards straight to `eprintln!`, matching how the rest of this codebase
/// reports problems to the user.
pub struct EprintDiagnostics;

impl Diagnostics for EprintDiagnostics {
    fn warn(&self, message: &str) {
        eprintln!("Warning: {message}");
    }
}

/// Collects warnings in memory instead of printing them; used by tests that
/// want to assert on exactly which lines were skipped.
#[derive(Default)]
pub struct CollectingDiagnostics {
    messages: Mutex<Vec<String>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Diagnostics for CollectingDiagnostics {
    fn warn(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
