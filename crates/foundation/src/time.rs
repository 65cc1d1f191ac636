/// Engine time, seconds since an arbitrary epoch chosen by the embedder.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub struct Time(pub f64);

impl Time {
    pub const ZERO: Time = Time(0.0);

    pub fn seconds_since(self, earlier: Time) -> f64 {
        self.0 - earlier.0
    }

    pub fn plus_seconds(self, s: f64) -> Time {
        Time(self.0 + s)
    }
}
