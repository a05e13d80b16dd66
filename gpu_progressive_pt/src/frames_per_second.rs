use std::collections::VecDeque;
use std::time::Duration;

pub struct FramesPerSecond {
    time_history: VecDeque<f32>
}

impl FramesPerSecond {
    pub const RUNNING_AVG_LENGTH: usize = 30;

    pub fn new() -> Self {
        Self {
            time_history: VecDeque::<f32>::with_capacity(Self::RUNNING_AVG_LENGTH)
        }
    }

    pub fn update(&mut self, dt: Duration) {
        self.time_history.push_front(dt.as_secs_f32());
        if self.time_history.len() > Self::RUNNING_AVG_LENGTH {
            self.time_history.pop_back();
        }
    }

    pub fn get_avg_fps(&self) -> f32 {
        let sum: f32 = self.time_history.iter().sum();
        if sum <= 0.0 {
            return 0.0;
        }
        self.time_history.len() as f32 / sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_is_zero() {
        assert_eq!(FramesPerSecond::new().get_avg_fps(), 0.0);
    }

    #[test]
    fn averages_over_window() {
        let mut fps = FramesPerSecond::new();
        for _ in 0..FramesPerSecond::RUNNING_AVG_LENGTH {
            fps.update(Duration::from_millis(10));
        }
        assert!((fps.get_avg_fps() - 100.0).abs() < 0.01);

        let mut fps = FramesPerSecond::new();
        // the slow first frame falls out of the window
        fps.update(Duration::from_millis(1000));
        for _ in 0..FramesPerSecond::RUNNING_AVG_LENGTH {
            fps.update(Duration::from_millis(20));
        }
        assert!((fps.get_avg_fps() - 50.0).abs() < 0.01);
    }
}
