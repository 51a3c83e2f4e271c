/// Suppresses redundant acceptances of the same identity across
/// consecutive ticks.
///
/// Single-slot memory: an acceptance is admitted iff its subject differs
/// from the immediately previous admitted one. A returning identity after
/// an intervening different identity is admitted again.
#[derive(Debug, Default)]
pub struct DedupeGuard {
    last_accepted: Option<i64>,
}

impl DedupeGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit `student_id` unless it repeats the previous admission.
    /// Admitted ids replace the slot.
    pub fn admit(&mut self, student_id: i64) -> bool {
        if self.last_accepted == Some(student_id) {
            return false;
        }
        self.last_accepted = Some(student_id);
        true
    }

    /// Forget the previous admission (session start).
    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}
