//! File/code adapted from https://github.com/jamjamjon/usls

use std::time::Duration;

/// Accumulated per stage timings, indexed by stage.
#[derive(Debug, Default)]
pub struct TimeCalc {
    n: usize,
    duration: Vec<Duration>,
}

impl TimeCalc {
    pub fn total(&self) -> Duration {
        self.duration.iter().sum::<Duration>()
    }

    /// Number of complete rounds recorded.
    pub fn n(&self) -> usize {
        if self.duration.is_empty() {
            return 0;
        }
        self.n / self.duration.len()
    }

    pub fn avg(&self) -> Duration {
        match self.n() {
            0 => Duration::ZERO,
            n => self.total() / n as u32,
        }
    }

    pub fn avg_i(&self, i: usize) -> Option<Duration> {
        let n = self.n();
        if n == 0 {
            return None;
        }
        self.duration.get(i).map(|d| *d / n as u32)
    }

    pub fn add_or_push(&mut self, i: usize, x: Duration) {
        match self.duration.get_mut(i) {
            Some(elem) => *elem += x,
            None => {
                if i >= self.duration.len() {
                    self.duration.push(x)
                }
            }
        }
        self.n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_over_rounds() {
        let mut calc = TimeCalc::default();
        assert_eq!(calc.avg(), Duration::ZERO);
        assert_eq!(calc.avg_i(0), None);

        for _ in 0..2 {
            calc.add_or_push(0, Duration::from_millis(4));
            calc.add_or_push(1, Duration::from_millis(2));
        }
        assert_eq!(calc.n(), 2);
        assert_eq!(calc.total(), Duration::from_millis(12));
        assert_eq!(calc.avg(), Duration::from_millis(6));
        assert_eq!(calc.avg_i(1), Some(Duration::from_millis(2)));
    }
}
