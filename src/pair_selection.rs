//! Choosing an interferometric pair from one result set.
//!
//! Scenes are grouped by acquisition minute-of-day, a stand-in for "same relative orbit and
//! frame" since repeat passes over an area happen at nearly the same time of day. Within the
//! busiest group, scenes of unusual size (a different burst coverage) are dropped, and the pair
//! whose separation in whole days is closest to the requested temporal baseline wins.
use crate::date_range::DateRange;
use crate::scene::SceneRecord;
use chrono::{DateTime, NaiveTime, Timelike, Utc};
use std::collections::BTreeMap;

const MIN_SIZE_RATIO: f64 = 0.5;
const MAX_SIZE_RATIO: f64 = 1.5;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedPair {
    /// Earlier acquisition.
    pub reference: SceneRecord,
    /// Later acquisition.
    pub secondary: SceneRecord,
    /// Realized separation, in whole days.
    pub temporal_baseline_days: i64,
    pub frame_time: NaiveTime,
}

impl SelectedPair {
    pub fn scenes(self: &Self) -> Vec<SceneRecord> {
        vec![self.reference.clone(), self.secondary.clone()]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// The result set was empty.
    Empty,
    /// The busiest frame holds fewer than two scenes; they are returned for inspection.
    NoSuitableFrame {
        frame_time: NaiveTime,
        scenes: Vec<SceneRecord>,
    },
    /// The frame has candidates, but none of their pairs is admissible.
    NoMatchingPair {
        frame_time: NaiveTime,
        scenes: Vec<SceneRecord>,
    },
    Pair(SelectedPair),
}

impl Selection {
    /// Everything the selection returned, in acquisition order. Only a `Pair` has two entries
    /// that belong together, so check `pair()` before treating them as one.
    pub fn scenes(self: &Self) -> Vec<SceneRecord> {
        match self {
            Selection::Empty => vec![],
            Selection::NoSuitableFrame { scenes, .. } | Selection::NoMatchingPair { scenes, .. } => {
                scenes.clone()
            }
            Selection::Pair(pair) => pair.scenes(),
        }
    }

    pub fn len(self: &Self) -> usize {
        match self {
            Selection::Empty => 0,
            Selection::NoSuitableFrame { scenes, .. } | Selection::NoMatchingPair { scenes, .. } => {
                scenes.len()
            }
            Selection::Pair(_) => 2,
        }
    }

    pub fn is_empty(self: &Self) -> bool {
        self.len() == 0
    }

    pub fn pair(self: &Self) -> Option<&SelectedPair> {
        match self {
            Selection::Pair(pair) => Some(pair),
            _ => None,
        }
    }
}

/// Acquisition time-of-day, floored to the minute.
pub fn frame_time(acquired: &DateTime<Utc>) -> NaiveTime {
    let time = acquired.time();
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

/// The most populated minute-of-day group. Ties go to the earliest time of day. Members keep
/// their result-set order.
pub fn busiest_frame(scenes: &[SceneRecord]) -> Option<(NaiveTime, Vec<SceneRecord>)> {
    let mut groups: BTreeMap<NaiveTime, Vec<SceneRecord>> = BTreeMap::new();
    for scene in scenes {
        groups
            .entry(frame_time(&scene.acquired))
            .or_default()
            .push(scene.clone());
    }

    let mut busiest: Option<(NaiveTime, Vec<SceneRecord>)> = None;
    for (time, members) in groups {
        let larger = busiest
            .as_ref()
            .map_or(true, |(_, best)| members.len() > best.len());
        if larger {
            busiest = Some((time, members));
        }
    }
    busiest
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Keeps scenes within 50-150% of the group's median size. Falls back to the whole group when
/// fewer than two would survive.
pub fn size_homogeneous(frame: &[SceneRecord]) -> Vec<SceneRecord> {
    let sizes: Vec<f64> = frame.iter().map(|s| s.size_bytes as f64).collect();
    let Some(median_size) = median(&sizes) else {
        return vec![];
    };
    let min_size = median_size * MIN_SIZE_RATIO;
    let max_size = median_size * MAX_SIZE_RATIO;

    let filtered: Vec<SceneRecord> = frame
        .iter()
        .filter(|s| {
            let size = s.size_bytes as f64;
            size >= min_size && size <= max_size
        })
        .cloned()
        .collect();

    log::info!("Size filter: {} -> {}", frame.len(), filtered.len());
    log::info!(
        "Size range: {:.0} - {:.0} MB (median: {:.0} MB)",
        min_size / BYTES_PER_MB,
        max_size / BYTES_PER_MB,
        median_size / BYTES_PER_MB
    );

    if filtered.len() < 2 && frame.len() >= 2 {
        log::warn!("Not enough scenes of similar size, continuing without the size filter");
        return frame.to_vec();
    }
    filtered
}

/// Pair selection over the whole result set.
pub fn select_pair(scenes: &[SceneRecord], target_days: i64) -> Selection {
    select_pair_with(scenes, target_days, |_, _| true)
}

/// Pair selection where the reference must fall in `first` and the secondary in `second`.
pub fn select_cross_month_pair(
    scenes: &[SceneRecord],
    target_days: i64,
    first: &DateRange,
    second: &DateRange,
) -> Selection {
    select_pair_with(scenes, target_days, |reference, secondary| {
        first.contains(&reference.acquired) && second.contains(&secondary.acquired)
    })
}

/// Pair selection, considering only pairs `(earlier, later)` that `admissible` accepts.
pub fn select_pair_with<F>(scenes: &[SceneRecord], target_days: i64, admissible: F) -> Selection
where
    F: Fn(&SceneRecord, &SceneRecord) -> bool,
{
    log::info!("Searching for an InSAR pair (target baseline: {} days)", target_days);

    let Some((frame_time, mut frame)) = busiest_frame(scenes) else {
        log::warn!("No search results");
        return Selection::Empty;
    };
    log::info!("Busiest acquisition time: {}", frame_time);

    if frame.len() < 2 {
        log::warn!("Only {} scene(s) in the same frame", frame.len());
        return Selection::NoSuitableFrame {
            frame_time,
            scenes: frame,
        };
    }

    frame.sort_by_key(|s| s.acquired);
    let candidates = size_homogeneous(&frame);

    let mut best: Option<(usize, usize, i64)> = None;
    let mut min_diff = u64::MAX;
    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            if !admissible(&candidates[i], &candidates[j]) {
                continue;
            }
            let days = (candidates[j].acquired - candidates[i].acquired).num_days();
            let diff = days.abs_diff(target_days);
            if diff < min_diff {
                min_diff = diff;
                best = Some((i, j, days));
            }
        }
    }

    let Some((i, j, days)) = best else {
        log::warn!("No suitable pair found");
        return Selection::NoMatchingPair {
            frame_time,
            scenes: candidates,
        };
    };

    let pair = SelectedPair {
        reference: candidates[i].clone(),
        secondary: candidates[j].clone(),
        temporal_baseline_days: days,
        frame_time,
    };
    log::info!("Pair found");
    log::info!(
        "  Reference: {} ({:.0} MB)",
        pair.reference.acquired,
        pair.reference.size_mb()
    );
    log::info!(
        "  Secondary: {} ({:.0} MB)",
        pair.secondary.acquired,
        pair.secondary.size_mb()
    );
    log::info!("  Temporal baseline: {} days", days);
    log::info!("  Acquisition time: {}", frame_time);
    log::info!(
        "  Size difference: {:.0} MB",
        (pair.reference.size_mb() - pair.secondary.size_mb()).abs()
    );
    Selection::Pair(pair)
}
