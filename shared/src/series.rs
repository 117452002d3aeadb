use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub index: u64,
    pub value: f64,
}

/// Append-only list of plotted points. The index counter starts at 0 and moves once per
/// appended value; nothing is ever removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesBuffer {
    points: Vec<Point>,
    next_index: u64,
}

impl SeriesBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f64) -> Point {
        let point = Point {
            index: self.next_index,
            value,
        };
        self.next_index += 1;
        self.points.push(point);
        point
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// (min, max) over all values, or `None` while empty.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.points.iter().fold(None, |acc, p| match acc {
            None => Some((p.value, p.value)),
            Some((lo, hi)) => Some((lo.min(p.value), hi.max(p.value))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexes_follow_receipt_order() {
        let mut s = SeriesBuffer::new();
        let values = [3.0, 1.5, 9.0, 9.0, -2.0];
        for v in values {
            s.push(v);
        }

        let expected: Vec<Point> = values
            .iter()
            .enumerate()
            .map(|(i, v)| Point {
                index: i as u64,
                value: *v,
            })
            .collect();
        assert_eq!(s.points(), expected.as_slice());
        assert_eq!(s.push(0.0).index, 5);
    }

    #[test]
    fn value_range_tracks_extremes() {
        let mut s = SeriesBuffer::new();
        assert_eq!(s.value_range(), None);
        s.push(4.0);
        assert_eq!(s.value_range(), Some((4.0, 4.0)));
        s.push(-1.0);
        s.push(10.0);
        assert_eq!(s.value_range(), Some((-1.0, 10.0)));
    }
}
