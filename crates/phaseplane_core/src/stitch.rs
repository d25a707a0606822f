//! Reassembly of unordered segments into maximal open polylines.

use crate::geometry::{Point, Polyline, Segment};
use std::collections::{HashMap, VecDeque};
use tracing::trace;

/// Default endpoint matching quantum, in the segments' own units.
pub const DEFAULT_STITCH_TOLERANCE: f64 = 0.5;

type Key = (i64, i64);

fn quantize(p: Point, tolerance: f64) -> Key {
    (
        (p.x / tolerance).round() as i64,
        (p.y / tolerance).round() as i64,
    )
}

/// [`stitch_segments_with_tolerance`] with [`DEFAULT_STITCH_TOLERANCE`].
pub fn stitch_segments_to_polylines(segments: &[Segment]) -> Vec<Polyline> {
    stitch_segments_with_tolerance(segments, DEFAULT_STITCH_TOLERANCE)
}

/// Greedily chains segments whose endpoints quantize to the same key.
///
/// Each segment is used exactly once, so the output satisfies
/// `sum(len - 1) == segments.len()`. Closed contours come back as open chains
/// whose first and last points share a key.
pub fn stitch_segments_with_tolerance(segments: &[Segment], tolerance: f64) -> Vec<Polyline> {
    debug_assert!(tolerance > 0.0, "stitch tolerance must be positive");

    let keys: Vec<(Key, Key)> = segments
        .iter()
        .map(|s| (quantize(s.a, tolerance), quantize(s.b, tolerance)))
        .collect();

    let mut incident: HashMap<Key, Vec<usize>> = HashMap::new();
    for (idx, (ka, kb)) in keys.iter().enumerate() {
        incident.entry(*ka).or_default().push(idx);
        if kb != ka {
            incident.entry(*kb).or_default().push(idx);
        }
    }

    // Takes the first unused segment touching `key` and returns its far end.
    let mut used = vec![false; segments.len()];
    let take_next = |key: Key, used: &mut [bool]| -> Option<(Point, Key)> {
        let candidates = incident.get(&key)?;
        let idx = candidates.iter().copied().find(|&i| !used[i])?;
        used[idx] = true;
        let (ka, kb) = keys[idx];
        if ka == key {
            Some((segments[idx].b, kb))
        } else {
            Some((segments[idx].a, ka))
        }
    };

    let mut polylines = Vec::new();
    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let mut chain = VecDeque::from([segments[start].a, segments[start].b]);
        let (mut left_key, mut right_key) = keys[start];

        while let Some((point, key)) = take_next(right_key, &mut used) {
            chain.push_back(point);
            right_key = key;
        }
        while let Some((point, key)) = take_next(left_key, &mut used) {
            chain.push_front(point);
            left_key = key;
        }

        polylines.push(Vec::from(chain));
    }

    trace!(
        segments = segments.len(),
        polylines = polylines.len(),
        "segments stitched"
    );
    polylines
}
