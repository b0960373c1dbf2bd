//! Append-only suspicious-activity log.
//!
//! Any authenticated account may record an observation (the campaign form
//! reports typed vs. pasted recipient digits); only admins may read the log.
//! Records are write-once: no update or delete paths exist.

use blastline_core::error::{CoreError, CoreResult};
use blastline_core::types::{Account, Role, SuspiciousActivityRecord};
use chrono::Utc;
use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

/// Client-reported observation. The reporter identity comes from the
/// resolved actor, not the payload.
#[derive(Debug, Clone)]
pub struct SuspiciousObservation {
    pub campaign_name: String,
    pub typed_numbers: String,
    pub pasted_numbers: String,
}

pub struct SuspiciousActivityLog {
    records: DashMap<Uuid, SuspiciousActivityRecord>,
    sequence: parking_lot::Mutex<u64>,
}

impl Default for SuspiciousActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

impl SuspiciousActivityLog {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            sequence: parking_lot::Mutex::new(0),
        }
    }

    /// Append an observation. Always succeeds for an authenticated reporter.
    pub fn record(
        &self,
        reporter: &Account,
        observation: SuspiciousObservation,
    ) -> SuspiciousActivityRecord {
        let sequence = {
            let mut seq = self.sequence.lock();
            *seq += 1;
            *seq
        };
        let record = SuspiciousActivityRecord {
            id: Uuid::new_v4(),
            sequence,
            campaign_name: observation.campaign_name,
            reporter_mobile: reporter.mobile_number.clone(),
            typed_numbers: observation.typed_numbers,
            pasted_numbers: observation.pasted_numbers,
            recorded_at: Utc::now(),
        };
        info!(
            record_id = %record.id,
            sequence,
            reporter_id = %reporter.id,
            "Suspicious activity recorded"
        );
        self.records.insert(record.id, record.clone());
        record
    }

    /// Full log in append order. Admin only.
    pub fn list(&self, actor: &Account) -> CoreResult<Vec<SuspiciousActivityRecord>> {
        if actor.role != Role::Admin {
            return Err(CoreError::denied(
                "only administrators may read the suspicious-activity log",
            ));
        }
        let mut records: Vec<SuspiciousActivityRecord> =
            self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by_key(|r| r.sequence);
        Ok(records)
    }
}
