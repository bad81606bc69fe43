use uuid::Uuid;

/// Outcome counts for one scheduler cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleStats {
    pub run_id: Uuid,
    pub candidates: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub extraction_failures: usize,
    pub notified: usize,
    pub notify_failures: usize,
    pub stored: usize,
    pub store_failures: usize,
    /// The cycle did not run to completion: either the page agent failed or
    /// the cycle was skipped.
    pub aborted: bool,
    /// Another cycle was still running, so this one never opened a session.
    pub skipped: bool,
}

impl CycleStats {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            ..Default::default()
        }
    }
}

impl std::fmt::Display for CycleStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Cycle {} ===", self.run_id)?;
        if self.skipped {
            writeln!(f, "Skipped:            previous cycle still running")?;
        } else if self.aborted {
            writeln!(f, "Aborted:            page agent failure")?;
        }
        writeln!(f, "Listings seen:      {}", self.candidates)?;
        writeln!(f, "Accepted:           {}", self.accepted)?;
        writeln!(f, "Rejected:           {}", self.rejected)?;
        writeln!(f, "  extraction:       {}", self.extraction_failures)?;
        writeln!(
            f,
            "Notified:           {} ({} failed)",
            self.notified, self.notify_failures
        )?;
        write!(
            f,
            "Stored:             {} ({} failed)",
            self.stored, self.store_failures
        )
    }
}
