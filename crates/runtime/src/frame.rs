use foundation::time::Time;

/// Deterministic frame metadata.
///
/// This is the primary timebase for the viewer runtime. The embedder drives
/// it with wall-clock samples; everything downstream only ever sees the
/// recorded `time`, so a session can be replayed tick for tick.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based tick index.
    pub index: u64,
    /// Engine time at the start of the tick (seconds).
    pub time: Time,
}

impl Frame {
    pub fn first(time: Time) -> Self {
        Self { index: 0, time }
    }

    pub fn next(self, time: Time) -> Self {
        Self {
            index: self.index + 1,
            time,
        }
    }

    pub fn dt_since(self, earlier: Frame) -> f64 {
        self.time.seconds_since(earlier.time)
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;
    use foundation::time::Time;

    #[test]
    fn next_advances_index_and_records_time() {
        let f0 = Frame::first(Time(1.5));
        let f1 = f0.next(Time(1.6));
        assert_eq!(f1.index, 1);
        assert_eq!(f1.time, Time(1.6));
        assert!((f1.dt_since(f0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn frames_with_same_inputs_are_equal() {
        assert_eq!(Frame::first(Time(2.0)), Frame::first(Time(2.0)));
    }
}
