use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Orbits in one Sentinel-1 repeat cycle.
pub const ORBITS_PER_CYCLE: u32 = 175;
pub const ARCHIVE_EXTENSION: &str = "zip";
const TITLE_DISPLAY_WIDTH: usize = 50;

static SCENE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?<mission>S1[A-D])_\w{2}_\w{3}\w?_\w{4}_(?<start>\d{8}T\d{6})_\d{8}T\d{6}_(?<orbit>\d{6})_",
    )
    .expect("Regex pattern should always compile")
});

/// One catalog hit. Built by the catalog client and never modified afterwards.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct SceneRecord {
    pub title: String,
    pub acquired: DateTime<Utc>,
    pub path: Option<u32>,
    pub track: Option<u32>,
    pub size_bytes: u64,
    pub url: String,
    pub handle: DownloadHandle,
}

/// What a `Downloader` needs to fetch a scene; callers treat it as opaque.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct DownloadHandle {
    title: String,
    url: String,
    size_bytes: u64,
}

impl DownloadHandle {
    pub fn new(title: &str, url: &str, size_bytes: u64) -> Self {
        Self {
            title: title.to_string(),
            url: url.to_string(),
            size_bytes,
        }
    }

    pub fn title(self: &Self) -> &str {
        &self.title
    }

    pub fn url(self: &Self) -> &str {
        &self.url
    }

    pub fn size_bytes(self: &Self) -> u64 {
        self.size_bytes
    }

    pub fn file_name(self: &Self) -> String {
        format!("{}.{}", self.title, ARCHIVE_EXTENSION)
    }
}

impl SceneRecord {
    pub fn new(
        title: &str,
        acquired: DateTime<Utc>,
        path: Option<u32>,
        absolute_orbit: Option<u32>,
        size_bytes: u64,
        url: &str,
    ) -> Self {
        Self {
            title: title.to_string(),
            acquired,
            path,
            track: absolute_orbit.map(relative_track),
            size_bytes,
            url: url.to_string(),
            handle: DownloadHandle::new(title, url, size_bytes),
        }
    }

    pub fn size_mb(self: &Self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Relative orbit (1..=175) for an absolute orbit number.
pub fn relative_track(absolute_orbit: u32) -> u32 {
    let cycle = u64::from(ORBITS_PER_CYCLE);
    ((u64::from(absolute_orbit) + cycle - 1) % cycle + 1) as u32
}

/// Absolute number of whole days between two acquisitions.
pub fn temporal_baseline_days(a: &DateTime<Utc>, b: &DateTime<Utc>) -> i64 {
    (*b - *a).num_days().abs()
}

/// Fields encoded in a Sentinel-1 product name, e.g.
/// `S1A_IW_SLC__1SDV_20230105T093012_20230105T093039_046645_059751_1A2B`.
#[derive(Debug, PartialEq)]
pub struct SceneName {
    pub mission: String,
    pub start: DateTime<Utc>,
    pub absolute_orbit: u32,
}

impl SceneName {
    pub fn parse(title: &str) -> Result<Self> {
        let captures = SCENE_NAME
            .captures(title)
            .ok_or(anyhow!("Not a Sentinel-1 product name: {}", title))?;

        let (_, [mission, start, orbit]) = captures.extract();

        let start = NaiveDateTime::parse_from_str(start, "%Y%m%dT%H%M%S")?;
        Ok(Self {
            mission: mission.to_string(),
            start: Utc.from_utc_datetime(&start),
            absolute_orbit: orbit.parse()?,
        })
    }
}

/// Catalog timestamps come either as RFC 3339 or as naive ISO 8601, which is taken as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Ok(t.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")?;
    Ok(Utc.from_utc_datetime(&naive))
}

pub fn format_file_size(size_bytes: u64) -> String {
    let mut size = size_bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} PB", size)
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() > TITLE_DISPLAY_WIDTH {
        let head: String = title.chars().take(TITLE_DISPLAY_WIDTH).collect();
        format!("{}...", head)
    } else {
        title.to_string()
    }
}

fn or_na(value: Option<u32>) -> String {
    value.map_or("N/A".to_string(), |v| v.to_string())
}

/// Plain-text result table, one row per scene.
pub fn render_table(title: &str, scenes: &[SceneRecord]) -> String {
    let header = ["No.", "Date", "Path", "Track", "Size (MB)", "Title"].map(String::from);
    let rows: Vec<[String; 6]> = scenes
        .iter()
        .enumerate()
        .map(|(i, s)| {
            [
                (i + 1).to_string(),
                s.acquired.format("%Y-%m-%d").to_string(),
                or_na(s.path),
                or_na(s.track),
                format!("{:.2}", s.size_mb()),
                truncate_title(&s.title),
            ]
        })
        .collect();

    let mut widths = header.clone().map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let format_row = |row: &[String; 6]| {
        row.iter()
            .zip(widths.iter())
            .map(|(cell, w)| format!("{:<w$}", cell, w = *w))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    let rule = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("-+-");

    let mut lines = vec![title.to_string(), format_row(&header), rule];
    lines.extend(rows.iter().map(format_row));
    lines.join("\n")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const TITLE: &str =
        "S1A_IW_SLC__1SDV_20230105T093012_20230105T093039_046645_059751_1A2B";

    pub(crate) fn scene(title: &str, acquired: &str, size_mb: f64) -> SceneRecord {
        let acquired = parse_timestamp(acquired).unwrap();
        let size_bytes = (size_mb * 1024.0 * 1024.0) as u64;
        let url = format!("https://datapool.asf.alaska.edu/SLC/SA/{}.zip", title);
        SceneRecord::new(title, acquired, Some(54), Some(46645), size_bytes, &url)
    }

    #[test]
    fn test_relative_track() {
        assert_eq!(relative_track(1), 1);
        assert_eq!(relative_track(175), 175);
        assert_eq!(relative_track(176), 1);
        assert_eq!(relative_track(46645), 95);
        assert_eq!(relative_track(0), 175);
        assert_eq!(relative_track(u32::MAX), 45);
    }

    #[test]
    fn test_scene_name() {
        let name = SceneName::parse(TITLE).unwrap();
        assert_eq!(name.mission, "S1A");
        assert_eq!(name.absolute_orbit, 46645);
        assert_eq!(name.start, parse_timestamp("2023-01-05T09:30:12Z").unwrap());
        assert_eq!(SceneName::parse("S2A_MSIL2A_20240504T195901").is_err(), true);
    }

    #[test]
    fn test_parse_timestamp() {
        let zoned = parse_timestamp("2023-01-05T09:30:12.000Z").unwrap();
        let naive = parse_timestamp("2023-01-05T09:30:12.000000").unwrap();
        assert_eq!(zoned, naive);
        assert_eq!(parse_timestamp("05/01/2023").is_err(), true);
    }

    #[test]
    fn test_temporal_baseline_days() {
        let a = parse_timestamp("2023-01-05T09:30:12Z").unwrap();
        let b = parse_timestamp("2023-01-17T09:30:40Z").unwrap();
        assert_eq!(temporal_baseline_days(&a, &b), 12);
        assert_eq!(temporal_baseline_days(&b, &a), 12);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(512), "512.00 B");
        assert_eq!(format_file_size(1536), "1.50 KB");
        assert_eq!(format_file_size(4 * 1024 * 1024 * 1024), "4.00 GB");
    }

    #[test]
    fn test_handle_file_name() {
        let s = scene(TITLE, "2023-01-05T09:30:12Z", 4200.0);
        assert_eq!(s.handle.file_name(), format!("{}.zip", TITLE));
        assert_eq!(s.track, Some(95));
    }

    #[test]
    fn test_render_table() {
        let s = scene(TITLE, "2023-01-05T09:30:12Z", 100.0);
        let table = render_table("Sentinel-1 search results", &[s]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1].starts_with("No."), true);
        assert_eq!(lines[3].contains("2023-01-05"), true);
        assert_eq!(lines[3].contains("100.00"), true);
        assert_eq!(lines[3].contains(&TITLE[..50]), true);
        assert_eq!(lines[3].ends_with("..."), true);
    }
}
