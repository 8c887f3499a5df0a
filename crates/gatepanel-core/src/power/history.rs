use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::{HistoryError, MAX_TIME_FRAME_MINS, PERSIST_EVERY};
use crate::graphics::FrameBuffer;

/// One wattage reading. Positive values are discharge, negative are charge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerSample {
    pub timestamp: DateTime<Utc>,
    pub wattage: f64,
}

/// On-disk layout of the history file.
#[derive(Debug, Serialize, Deserialize)]
struct HistoryDocument {
    samples: Vec<PowerSample>,
    #[serde(default = "default_time_frame")]
    time_frame_mins: u32,
}

fn default_time_frame() -> u32 {
    15
}

struct HistoryInner {
    /// Ordered by timestamp, oldest first
    samples: VecDeque<PowerSample>,
    time_frame_mins: u32,
    max_samples: usize,
    /// Samples recorded since start; drives the persistence cadence
    recorded: u64,
}

impl HistoryInner {
    fn insert(&mut self, sample: PowerSample) {
        match self.samples.back() {
            Some(last) if last.timestamp > sample.timestamp => {
                let at = self
                    .samples
                    .partition_point(|s| s.timestamp <= sample.timestamp);
                self.samples.insert(at, sample);
            }
            _ => self.samples.push_back(sample),
        }
    }

    fn evict(&mut self, now: DateTime<Utc>) {
        let window = TimeDelta::minutes(i64::from(self.time_frame_mins));
        while self
            .samples
            .front()
            .is_some_and(|oldest| now - oldest.timestamp > window)
        {
            self.samples.pop_front();
        }
        while self.samples.len() > self.max_samples {
            self.samples.pop_front();
        }
    }

    fn document(&self) -> HistoryDocument {
        HistoryDocument {
            samples: self.samples.iter().copied().collect(),
            time_frame_mins: self.time_frame_mins,
        }
    }
}

/// Time-windowed, count-capped wattage history.
///
/// All state sits behind one `RwLock`. Readers ([`snapshot`](Self::snapshot),
/// [`draw_graph`](Self::draw_graph)) copy the samples out before doing any
/// work, and file writes happen after the lock is released.
pub struct PowerHistory {
    inner: RwLock<HistoryInner>,
    path: Option<PathBuf>,
}

impl PowerHistory {
    /// Empty in-memory history.
    pub fn new(time_frame_mins: u32, max_samples: usize) -> Self {
        Self {
            inner: RwLock::new(HistoryInner {
                samples: VecDeque::with_capacity(max_samples.min(1024)),
                time_frame_mins: clamp_time_frame(time_frame_mins),
                max_samples,
                recorded: 0,
            }),
            path: None,
        }
    }

    /// Open the history persisted at `path`.
    ///
    /// A missing or corrupt file is not an error: the history starts empty
    /// with `time_frame_mins`. Stale samples are evicted against the current
    /// time.
    pub fn load(path: impl Into<PathBuf>, time_frame_mins: u32, max_samples: usize) -> Self {
        Self::load_at(path, time_frame_mins, max_samples, Utc::now())
    }

    pub fn load_at(
        path: impl Into<PathBuf>,
        time_frame_mins: u32,
        max_samples: usize,
        now: DateTime<Utc>,
    ) -> Self {
        let path = path.into();
        let mut history = Self::new(time_frame_mins, max_samples);

        match read_document(&path) {
            Ok(Some(doc)) => {
                let mut inner = history.write();
                inner.time_frame_mins = clamp_time_frame(doc.time_frame_mins);
                for sample in doc.samples {
                    if sample.wattage.is_finite() {
                        inner.insert(sample);
                    }
                }
                inner.evict(now);
                info!(
                    "Loaded {} power samples from {} ({} min window)",
                    inner.samples.len(),
                    path.display(),
                    inner.time_frame_mins
                );
            }
            Ok(None) => info!("No power history at {}, starting empty", path.display()),
            Err(e) => warn!("Ignoring power history at {}: {}", path.display(), e),
        }

        history.path = Some(path);
        history
    }

    fn read(&self) -> RwLockReadGuard<'_, HistoryInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HistoryInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Parse `raw` as watts and record it with the current time.
    ///
    /// Nothing is recorded when the reading does not parse.
    pub fn record_sample(&self, raw: &str) -> Result<(), HistoryError> {
        let wattage = parse_wattage(raw)?;
        self.record_at(wattage, Utc::now());
        Ok(())
    }

    /// Record a reading taken at `now`, evict, and persist on every
    /// [`PERSIST_EVERY`]th sample.
    pub fn record_at(&self, wattage: f64, now: DateTime<Utc>) {
        let pending = {
            let mut inner = self.write();
            inner.insert(PowerSample {
                timestamp: now,
                wattage,
            });
            inner.evict(now);
            inner.recorded += 1;

            (inner.recorded % PERSIST_EVERY == 0 && self.path.is_some())
                .then(|| inner.document())
        };

        if let Some(doc) = pending {
            if let Err(e) = self.save_document(&doc) {
                warn!("Failed to persist power history: {}", e);
            }
        }
    }

    /// Write the current samples to the history file now.
    pub fn persist(&self) -> Result<(), HistoryError> {
        let doc = self.read().document();
        self.save_document(&doc)
    }

    fn save_document(&self, doc: &HistoryDocument) -> Result<(), HistoryError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        let json = serde_json::to_vec(doc).map_err(|e| HistoryError::Format {
            message: e.to_string(),
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_error)?;
        fs::rename(&tmp, path).map_err(io_error)?;
        debug!("Persisted {} power samples", doc.samples.len());
        Ok(())
    }

    /// Copy of the retained samples, oldest first.
    pub fn snapshot(&self) -> Vec<PowerSample> {
        self.read().samples.iter().copied().collect()
    }

    /// Most recent sample, for the live readout.
    pub fn latest(&self) -> Option<PowerSample> {
        self.read().samples.back().copied()
    }

    pub fn len(&self) -> usize {
        self.read().samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().samples.is_empty()
    }

    pub fn time_frame_mins(&self) -> u32 {
        self.read().time_frame_mins
    }

    /// Change the sliding window, clamped to `1..=60` minutes.
    ///
    /// Takes effect at the next eviction pass. Returns the applied value.
    pub fn set_time_frame(&self, minutes: u32) -> u32 {
        let minutes = clamp_time_frame(minutes);
        self.write().time_frame_mins = minutes;
        minutes
    }

    /// Draw the graph of a snapshot into `fb` at `(x, y)`.
    pub fn draw_graph(&self, fb: &mut FrameBuffer, x: i32, y: i32, width: u32, height: u32) {
        let samples = self.snapshot();
        super::graph::draw_samples(fb, x, y, width, height, &samples);
    }
}

fn clamp_time_frame(minutes: u32) -> u32 {
    minutes.clamp(1, MAX_TIME_FRAME_MINS)
}

fn parse_wattage(raw: &str) -> Result<f64, HistoryError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|w| w.is_finite())
        .ok_or_else(|| HistoryError::InvalidWattage { raw: raw.into() })
}

fn io_error(e: std::io::Error) -> HistoryError {
    HistoryError::Io {
        message: e.to_string(),
    }
}

fn read_document(path: &Path) -> Result<Option<HistoryDocument>, HistoryError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| HistoryError::Format {
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn invalid_reading_records_nothing() {
        let history = PowerHistory::new(15, 900);
        history.record_sample("1.5").unwrap();
        let err = history.record_sample("invalid").unwrap_err();
        assert_eq!(
            err,
            HistoryError::InvalidWattage {
                raw: "invalid".into()
            }
        );
        assert!(history.record_sample("NaN").is_err());
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().unwrap().wattage, 1.5);
    }

    #[test]
    fn time_frame_is_clamped() {
        let history = PowerHistory::new(15, 900);
        assert_eq!(history.set_time_frame(0), 1);
        assert_eq!(history.time_frame_mins(), 1);
        assert_eq!(history.set_time_frame(100), 60);
        assert_eq!(history.set_time_frame(30), 30);
    }

    #[test]
    fn window_evicts_old_samples() {
        let history = PowerHistory::new(1, 900);
        history.record_at(1.0, at(0));
        history.record_at(2.0, at(30));
        history.record_at(3.0, at(61));

        let kept: Vec<f64> = history.snapshot().iter().map(|s| s.wattage).collect();
        assert_eq!(kept, vec![2.0, 3.0]);
    }

    #[test]
    fn count_cap_drops_oldest() {
        let history = PowerHistory::new(15, 3);
        for i in 0..5 {
            history.record_at(i as f64, at(i));
        }
        let kept: Vec<f64> = history.snapshot().iter().map(|s| s.wattage).collect();
        assert_eq!(kept, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn out_of_order_sample_is_sorted_in() {
        let history = PowerHistory::new(15, 900);
        history.record_at(1.0, at(10));
        history.record_at(3.0, at(30));
        history.record_at(2.0, at(20));
        let stamps: Vec<_> = history.snapshot().iter().map(|s| s.timestamp).collect();
        assert_eq!(stamps, vec![at(10), at(20), at(30)]);
    }

    #[test]
    fn persists_every_tenth_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("power.json");
        let history = PowerHistory::load_at(&path, 15, 900, at(0));

        for i in 0..9 {
            history.record_at(0.5, at(i));
        }
        assert!(!path.exists());

        history.record_at(-0.5, at(9));
        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["samples"].as_array().unwrap().len(), 10);
        assert_eq!(value["time_frame_mins"], 15);
    }

    #[test]
    fn load_applies_window_and_stored_time_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("power.json");
        std::fs::write(
            &path,
            r#"{"samples":[
                {"timestamp":"2023-11-14T22:00:00Z","wattage":1.0},
                {"timestamp":"2023-11-14T22:12:00Z","wattage":2.0}
            ],"time_frame_mins":5}"#,
        )
        .unwrap();

        let now = "2023-11-14T22:15:00Z".parse::<DateTime<Utc>>().unwrap();
        let history = PowerHistory::load_at(&path, 15, 900, now);
        assert_eq!(history.time_frame_mins(), 5);
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().unwrap().wattage, 2.0);
    }

    #[test]
    fn corrupt_or_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = PowerHistory::load(dir.path().join("none.json"), 15, 900);
        assert!(missing.is_empty());

        let corrupt_path = dir.path().join("bad.json");
        std::fs::write(&corrupt_path, b"{not json").unwrap();
        let corrupt = PowerHistory::load(&corrupt_path, 15, 900);
        assert!(corrupt.is_empty());
        assert_eq!(corrupt.time_frame_mins(), 15);
    }
}
