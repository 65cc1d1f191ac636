use foundation::time::Time;

/// Coalesces redraw requests between ticks.
///
/// Any number of immediate requests collapse into a single draw on the next
/// tick. A deferred request fires on the first tick at or after its due
/// time; the earliest due time wins when several are pending.
#[derive(Debug, Default)]
pub struct RedrawScheduler {
    needs_redraw: bool,
    deferred: Option<Time>,
}

impl RedrawScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_redraw(&mut self) {
        self.needs_redraw = true;
    }

    pub fn request_redraw_at(&mut self, due: Time) {
        self.deferred = match self.deferred {
            Some(existing) if existing <= due => Some(existing),
            _ => Some(due),
        };
    }

    pub fn has_pending(&self) -> bool {
        self.needs_redraw || self.deferred.is_some()
    }

    /// Consumes a pending redraw if one is due at `now`.
    pub fn take_redraw(&mut self, now: Time) -> bool {
        let deferred_due = self.deferred.is_some_and(|due| due <= now);
        if deferred_due {
            self.deferred = None;
        }
        if self.needs_redraw || deferred_due {
            self.needs_redraw = false;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::RedrawScheduler;
    use foundation::time::Time;

    #[test]
    fn requests_coalesce_into_one_draw() {
        let mut r = RedrawScheduler::new();
        r.request_redraw();
        r.request_redraw();
        assert!(r.take_redraw(Time(0.0)));
        assert!(!r.take_redraw(Time(0.1)));
    }

    #[test]
    fn deferred_fires_only_when_due() {
        let mut r = RedrawScheduler::new();
        r.request_redraw_at(Time(5.0));
        assert!(!r.take_redraw(Time(4.9)));
        assert!(r.take_redraw(Time(5.0)));
        assert!(!r.take_redraw(Time(5.1)));
    }

    #[test]
    fn earliest_deferred_wins() {
        let mut r = RedrawScheduler::new();
        r.request_redraw_at(Time(5.0));
        r.request_redraw_at(Time(2.0));
        assert!(r.take_redraw(Time(2.0)));
        assert!(!r.take_redraw(Time(10.0)));
    }
}
