//! RR-interval side channel
//!
//! A separate beat tracker upstream may already know inter-beat intervals.
//! `RrIntervalData` carries them into the cardiac channel; it only ever holds
//! plausible values, oldest evicted first.

use alloc::vec::Vec;

use crate::buffer::CircularBuffer;
use crate::constants::buffers::RR_INTERVAL_CAPACITY;
use crate::constants::timing::{RR_DATA_MAX_MS, RR_DATA_MIN_MS};
use crate::errors::{ProcessingError, ProcessingResult};
use crate::time::Timestamp;

/// Bounded FIFO of inter-beat intervals in milliseconds
#[derive(Debug, Clone, Default)]
pub struct RrIntervalData {
    intervals: CircularBuffer<f32, RR_INTERVAL_CAPACITY>,
    last_peak_time: Option<Timestamp>,
}

impl RrIntervalData {
    /// Empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a slice, skipping implausible entries
    pub fn from_intervals(intervals: &[f32]) -> Self {
        let mut data = Self::new();
        for interval in intervals {
            let _ = data.push(*interval);
        }
        data
    }

    /// Append one interval, rejecting values outside 300-2000 ms
    pub fn push(&mut self, interval_ms: f32) -> ProcessingResult<()> {
        if !interval_ms.is_finite() {
            return Err(ProcessingError::InvalidValue);
        }
        if !(RR_DATA_MIN_MS..=RR_DATA_MAX_MS).contains(&interval_ms) {
            return Err(ProcessingError::OutOfPhysiologicalRange {
                value: interval_ms,
                min: RR_DATA_MIN_MS,
                max: RR_DATA_MAX_MS,
            });
        }
        self.intervals.push(interval_ms);
        Ok(())
    }

    /// Record when the last beat was seen
    pub fn set_last_peak_time(&mut self, time: Timestamp) {
        self.last_peak_time = Some(time);
    }

    /// Time of the last beat, if known
    pub fn last_peak_time(&self) -> Option<Timestamp> {
        self.last_peak_time
    }

    /// Intervals, oldest first
    pub fn intervals(&self) -> Vec<f32> {
        self.intervals.to_vec()
    }

    /// Number of stored intervals
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Whether no interval is stored
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.intervals.clear();
        self.last_peak_time = None;
    }
}
