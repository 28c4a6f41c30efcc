//! Aircraft registry: the shared, mutex-guarded map from identifier to
//! `AircraftRecord`, with 30-second expiry.
//!
//! `tokio::sync::Mutex` is used rather than a blocking lock since updates and
//! the periodic sweep both run in async tasks. A `BTreeMap` is used instead
//! of a `HashMap` so the periodic sweep iterates identifiers in sorted order
//! without a separate sort step.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

use crate::model::{AircraftRecord, DataType};

/// Records older than this are dropped on the next sweep.
pub const EXPIRY: Duration = Duration::from_secs(30);

#[derive(Default)]
pub struct Registry {
    inner: Mutex<BTreeMap<String, AircraftRecord>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `f` to the record for `identifier`, creating it with
    /// `datatype` if this is the first sighting, and always refreshing
    /// `last_seen`.
    pub async fn upsert<F>(&self, identifier: &str, datatype: DataType, now: Instant, f: F)
    where
        F: FnOnce(&mut AircraftRecord) -> Result<(), String>,
    {
        let mut guard = self.inner.lock().await;
        let rec = guard
            .entry(identifier.to_string())
            .or_insert_with(|| AircraftRecord::new(identifier.to_string(), datatype, now));
        rec.last_seen = now;
        if let Err(e) = f(rec) {
            debug!("registry update for {identifier} rejected: {e}");
        }
    }

    /// Snapshot clone of one record, for tests and ad-hoc inspection.
    pub async fn get(&self, identifier: &str, _now: Instant) -> Option<AircraftRecord> {
        self.inner.lock().await.get(identifier).cloned()
    }

    /// Number of tracked aircraft.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Runs `f` over a sorted snapshot of all current records that are not
    /// already past [`EXPIRY`], then drops any record whose age exceeds it.
    /// A record aged past expiry is skipped for emission in the very sweep
    /// that removes it.
    ///
    /// The snapshot is cloned out from under the lock so `f` (which may do
    /// network I/O via the FLARM generator's output channel) never holds
    /// the registry lock.
    pub async fn sweep_and_expire<F>(&self, now: Instant, mut f: F)
    where
        F: FnMut(&AircraftRecord),
    {
        let snapshot: Vec<AircraftRecord> = {
            let guard = self.inner.lock().await;
            guard.values().cloned().collect()
        };

        for rec in &snapshot {
            if rec.age(now) > EXPIRY {
                continue;
            }
            f(rec);
        }

        let mut guard = self.inner.lock().await;
        let before = guard.len();
        guard.retain(|_, rec| rec.age(now) <= EXPIRY);
        let dropped = before - guard.len();
        if dropped > 0 {
            debug!("expired {dropped} aircraft record(s)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_creates_then_updates_record() {
        let reg = Registry::new();
        let now = Instant::now();

        reg.upsert("ABC123", DataType::Adsb, now, |rec| {
            rec.callsign = Some("TEST1".into());
            Ok(())
        })
        .await;

        reg.upsert("ABC123", DataType::Adsb, now, |rec| {
            rec.altitude_ft = Some(3500.0);
            Ok(())
        })
        .await;

        let rec = reg.get("ABC123", now).await.unwrap();
        assert_eq!(rec.callsign.as_deref(), Some("TEST1"));
        assert_eq!(rec.altitude_ft, Some(3500.0));
        assert_eq!(reg.len().await, 1);
    }

    #[tokio::test]
    async fn sweep_visits_in_sorted_order() {
        let reg = Registry::new();
        let now = Instant::now();
        for id in ["ZZZ999", "AAA111", "MMM555"] {
            reg.upsert(id, DataType::Adsb, now, |_| Ok(())).await;
        }

        let mut visited = Vec::new();
        reg.sweep_and_expire(now, |rec| visited.push(rec.identifier.clone()))
            .await;

        assert_eq!(visited, vec!["AAA111", "MMM555", "ZZZ999"]);
    }

    #[tokio::test]
    async fn sweep_expires_stale_records() {
        let reg = Registry::new();
        let t0 = Instant::now();
        reg.upsert("ABC123", DataType::Adsb, t0, |_| Ok(())).await;

        let later = t0 + Duration::from_secs(31);
        reg.sweep_and_expire(later, |_| {}).await;

        assert!(reg.is_empty().await);
    }

    #[tokio::test]
    async fn sweep_does_not_visit_already_expired_records() {
        let reg = Registry::new();
        let t0 = Instant::now();
        reg.upsert("ABC123", DataType::Adsb, t0, |_| Ok(())).await;

        let later = t0 + Duration::from_secs(31);
        let mut visited = Vec::new();
        reg.sweep_and_expire(later, |rec| visited.push(rec.identifier.clone()))
            .await;

        assert!(visited.is_empty());
        assert!(reg.is_empty().await);
    }

    #[tokio::test]
    async fn sweep_keeps_fresh_records() {
        let reg = Registry::new();
        let t0 = Instant::now();
        reg.upsert("ABC123", DataType::Adsb, t0, |_| Ok(())).await;

        let later = t0 + Duration::from_secs(10);
        reg.sweep_and_expire(later, |_| {}).await;

        assert_eq!(reg.len().await, 1);
    }
}
