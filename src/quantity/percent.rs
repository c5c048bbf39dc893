quantity!(Percent, suffix: "%", precision: 1);

impl Percent {
    pub const fn to_proportion(self) -> f64 {
        0.01 * self.0
    }
}
