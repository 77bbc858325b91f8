//! Compile invocation state machine.
//!
//! ```text
//! Idle → Discovering → Transforming → Assembling → Written
//!   └──────────┴─────────────┴──────────────┴────→ Failed
//! ```

use std::fmt;

use crate::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Discovering,
    Transforming,
    Assembling,
    /// Terminal: every bundle was written.
    Written,
    /// Terminal: a fatal error stopped the invocation.
    Failed,
}

impl Phase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Discovering => "discovering",
            Self::Transforming => "transforming",
            Self::Assembling => "assembling",
            Self::Written => "written",
            Self::Failed => "failed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Written | Self::Failed)
    }

    /// Legal successor in the forward direction (`Failed` is reachable from
    /// any non-terminal phase).
    const fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Discovering),
            Self::Discovering => Some(Self::Transforming),
            Self::Transforming => Some(Self::Assembling),
            Self::Assembling => Some(Self::Written),
            Self::Written | Self::Failed => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the current phase and logs every transition.
#[derive(Debug)]
pub struct PhaseTracker {
    phase: Phase,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self { phase: Phase::Idle }
    }
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Move to the next phase. Out-of-order transitions are a logic error.
    pub fn advance(&mut self, to: Phase) {
        debug_assert_eq!(self.phase.next(), Some(to), "illegal transition {} → {to}", self.phase);
        debug!("pipeline"; "{} → {}", self.phase, to);
        self.phase = to;
    }

    /// Move to `Failed` unless already terminal.
    pub fn fail(&mut self) {
        if !self.phase.is_terminal() {
            debug!("pipeline"; "{} → {}", self.phase, Phase::Failed);
            self.phase = Phase::Failed;
        }
    }
}
