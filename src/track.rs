use std::collections::VecDeque;

use crate::geo::GeoPoint;

/// Bounded history of visited positions. Oldest points fall off first.
#[derive(Clone, Debug)]
pub struct TrackHistory {
    points: VecDeque<GeoPoint>,
    capacity: usize,
}

impl TrackHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn push(&mut self, point: GeoPoint) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn last(&self) -> Option<&GeoPoint> {
        self.points.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeoPoint> {
        self.points.iter()
    }

    /// Snapshot in visiting order.
    pub fn to_vec(&self) -> Vec<GeoPoint> {
        self.points.iter().copied().collect()
    }
}

/// Moving average over the last `window` speed samples.
#[derive(Clone, Debug)]
pub struct SpeedAverager {
    samples: VecDeque<f64>,
    window: usize,
    sum: f64,
}

impl SpeedAverager {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            samples: VecDeque::with_capacity(window.min(1024)),
            window,
            sum: 0.0,
        }
    }

    pub fn push(&mut self, speed_knots: f64) {
        if !speed_knots.is_finite() || speed_knots < 0.0 {
            return;
        }
        if self.samples.len() == self.window
            && let Some(old) = self.samples.pop_front()
        {
            self.sum -= old;
        }
        self.samples.push_back(speed_knots);
        self.sum += speed_knots;
    }

    /// Average speed, `None` before the first sample.
    pub fn average(&self) -> Option<f64> {
        if self.samples.is_empty() {
            None
        } else {
            // guard against drift pushing a run of zeros slightly negative
            Some((self.sum / self.samples.len() as f64).max(0.0))
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.sum = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_track_keeps_order() {
        let mut track = TrackHistory::new(10);
        assert!(track.is_empty());
        for i in 0..3 {
            track.push(GeoPoint::new(i as f64, 0.0));
        }
        assert_eq!(track.len(), 3);
        assert_eq!(track.to_vec()[0], GeoPoint::new(0.0, 0.0));
        assert_eq!(track.last(), Some(&GeoPoint::new(2.0, 0.0)));
    }

    #[test]
    fn test_track_drops_oldest_when_full() {
        let mut track = TrackHistory::new(3);
        for i in 0..5 {
            track.push(GeoPoint::new(i as f64, 0.0));
        }
        assert_eq!(track.len(), 3);
        let lats: Vec<f64> = track.iter().map(|p| p.lat).collect();
        assert_eq!(lats, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_track_clear() {
        let mut track = TrackHistory::new(3);
        track.push(GeoPoint::default());
        track.clear();
        assert!(track.is_empty());
        assert_eq!(track.capacity(), 3);
    }

    #[test]
    fn test_speed_average_window() {
        let mut speed = SpeedAverager::new(3);
        assert_eq!(speed.average(), None);

        speed.push(3.0);
        assert_abs_diff_eq!(speed.average().unwrap(), 3.0, epsilon = 1e-12);

        speed.push(4.0);
        speed.push(5.0);
        assert_abs_diff_eq!(speed.average().unwrap(), 4.0, epsilon = 1e-12);

        // 3.0 falls out of the window
        speed.push(6.0);
        assert_abs_diff_eq!(speed.average().unwrap(), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_speed_huge_window() {
        let mut speed = SpeedAverager::new(usize::MAX);
        speed.push(2.0);
        speed.push(4.0);
        assert_abs_diff_eq!(speed.average().unwrap(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_speed_ignores_garbage() {
        let mut speed = SpeedAverager::new(2);
        speed.push(f64::NAN);
        speed.push(-1.0);
        assert_eq!(speed.average(), None);
        speed.push(2.0);
        speed.clear();
        assert_eq!(speed.average(), None);
    }
}
