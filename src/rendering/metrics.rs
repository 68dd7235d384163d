use std::collections::VecDeque;
use std::time::Duration;
use tracing::warn;

const WINDOW: usize = 60;

/// Rolling frame timing for the preview loop
#[derive(Debug, Clone)]
pub struct FrameStats {
    frame_times: VecDeque<Duration>,
    slow_frame_budget: Duration,
    total_frames: u64,
    slow_frames: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameMetrics {
    pub avg_frame_time: Duration,
    pub min_frame_time: Duration,
    pub max_frame_time: Duration,
    pub fps: f32,
}

impl FrameStats {
    pub fn new(slow_frame_budget: Duration) -> Self {
        Self {
            frame_times: VecDeque::with_capacity(WINDOW),
            slow_frame_budget,
            total_frames: 0,
            slow_frames: 0,
        }
    }

    pub fn record(&mut self, frame_time: Duration) {
        self.total_frames += 1;
        if frame_time > self.slow_frame_budget {
            self.slow_frames += 1;
            warn!(
                "Slow preview frame: {:.2}ms (budget {}ms)",
                frame_time.as_secs_f64() * 1000.0,
                self.slow_frame_budget.as_millis()
            );
        }
        self.frame_times.push_back(frame_time);
        if self.frame_times.len() > WINDOW {
            self.frame_times.pop_front();
        }
    }

    pub fn metrics(&self) -> FrameMetrics {
        let (Some(min), Some(max)) = (self.frame_times.iter().min(), self.frame_times.iter().max()) else {
            return FrameMetrics::default();
        };
        let total: Duration = self.frame_times.iter().sum();
        let avg = total / self.frame_times.len() as u32;
        let fps = if avg.is_zero() { 0.0 } else { 1.0 / avg.as_secs_f32() };

        FrameMetrics {
            avg_frame_time: avg,
            min_frame_time: *min,
            max_frame_time: *max,
            fps,
        }
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn slow_frames(&self) -> u64 {
        self.slow_frames
    }

    pub fn reset(&mut self) {
        self.frame_times.clear();
        self.total_frames = 0;
        self.slow_frames = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_is_bounded() {
        let mut stats = FrameStats::new(Duration::from_millis(16));
        for _ in 0..100 {
            stats.record(Duration::from_millis(10));
        }
        assert_eq!(stats.total_frames(), 100);
        let metrics = stats.metrics();
        assert_eq!(metrics.avg_frame_time, Duration::from_millis(10));
        assert!((metrics.fps - 100.0).abs() < 0.5);
    }

    #[test]
    fn test_slow_frames_counted() {
        let mut stats = FrameStats::new(Duration::from_millis(16));
        stats.record(Duration::from_millis(5));
        stats.record(Duration::from_millis(40));
        assert_eq!(stats.slow_frames(), 1);
        assert_eq!(stats.metrics().max_frame_time, Duration::from_millis(40));
    }

    #[test]
    fn test_empty_metrics() {
        let stats = FrameStats::new(Duration::from_millis(16));
        assert_eq!(stats.metrics(), FrameMetrics::default());
    }
}
