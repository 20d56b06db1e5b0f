//! The admission controller.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Local, NaiveDate, Utc};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};
use uuid::Uuid;

use super::config::AdmissionConfig;
use super::types::{AdmissionTicket, BusyReason, InFlightJob, Rejection};
use crate::job::{JobPhase, RequesterId, SourceId};

/// A registered job together with the slot it occupies.
struct Entry {
    job: InFlightJob,
    _permit: OwnedSemaphorePermit,
}

#[derive(Default)]
struct DailyCount {
    day: Option<NaiveDate>,
    count: u32,
}

#[derive(Default)]
struct Tables {
    /// Source id -> admitted job.
    by_source: HashMap<SourceId, Entry>,
    /// Requester id -> the source id they have in flight.
    by_requester: HashMap<RequesterId, SourceId>,
    /// Requester id -> admitted requests for the current day.
    quota: HashMap<RequesterId, DailyCount>,
}

/// Decides whether a job may start and tracks what is in flight.
pub struct AdmissionController {
    config: AdmissionConfig,
    slots: Arc<Semaphore>,
    tables: Mutex<Tables>,
}

impl AdmissionController {
    pub fn new(config: AdmissionConfig) -> Self {
        let slots = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        Self {
            config,
            slots,
            tables: Mutex::new(Tables::default()),
        }
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Tries to admit a job, counting quota against today's local date.
    pub fn try_admit(
        &self,
        requester_id: RequesterId,
        source_id: SourceId,
    ) -> Result<AdmissionTicket, Rejection> {
        self.try_admit_on(requester_id, source_id, Local::now().date_naive())
    }

    /// Tries to admit a job, counting quota against `today`.
    ///
    /// Checks run in order: free slot, requester already in flight, source
    /// already in flight, daily quota. Nothing is recorded unless every
    /// check passes. Only admitted requests count towards the quota.
    pub fn try_admit_on(
        &self,
        requester_id: RequesterId,
        source_id: SourceId,
        today: NaiveDate,
    ) -> Result<AdmissionTicket, Rejection> {
        let mut tables = self.lock();

        let permit = Arc::clone(&self.slots).try_acquire_owned().map_err(|_| {
            Rejection::Busy {
                reason: BusyReason::NoFreeSlot {
                    capacity: self.config.max_concurrent_jobs,
                },
            }
        })?;

        if let Some(&in_flight) = tables.by_requester.get(&requester_id) {
            return Err(Rejection::Busy {
                reason: BusyReason::RequesterInFlight {
                    source_id: in_flight,
                },
            });
        }

        if tables.by_source.contains_key(&source_id) {
            return Err(Rejection::Duplicate { source_id });
        }

        let limit = self.config.max_requests_per_day;
        let daily = tables.quota.entry(requester_id).or_default();
        if daily.day != Some(today) {
            daily.day = Some(today);
            daily.count = 0;
        }
        if daily.count >= limit {
            return Err(Rejection::Quota { limit });
        }
        daily.count += 1;

        let now = Utc::now();
        let job = InFlightJob {
            job_id: Uuid::new_v4(),
            requester_id,
            source_id,
            phase: JobPhase::Pending,
            admitted_at: now,
        };
        let ticket = AdmissionTicket {
            job_id: job.job_id,
            requester_id,
            source_id,
            admitted_at: now,
        };

        tables.by_requester.insert(requester_id, source_id);
        tables.by_source.insert(
            source_id,
            Entry {
                job,
                _permit: permit,
            },
        );

        info!(
            requester_id,
            source_id,
            job_id = %ticket.job_id,
            "Job admitted"
        );
        Ok(ticket)
    }

    /// Removes a job from both registries and frees its slot.
    ///
    /// Returns true if anything was removed. The requester entry is only
    /// removed if it still points at `source_id`, and the source entry only
    /// if it belongs to `requester_id`, so a stale release cannot evict a
    /// newer job.
    pub fn release(&self, requester_id: RequesterId, source_id: SourceId) -> bool {
        let mut tables = self.lock();
        let mut removed = false;

        if tables.by_requester.get(&requester_id) == Some(&source_id) {
            tables.by_requester.remove(&requester_id);
            removed = true;
        }

        let owned = tables
            .by_source
            .get(&source_id)
            .map(|entry| entry.job.requester_id == requester_id)
            .unwrap_or(false);
        if owned {
            // Dropping the entry drops its permit.
            tables.by_source.remove(&source_id);
            removed = true;
        }

        if removed {
            debug!(requester_id, source_id, "Admission released");
        }
        removed
    }

    /// Records the phase of an admitted job. Unknown sources are ignored.
    pub fn set_phase(&self, source_id: SourceId, phase: JobPhase) {
        if let Some(entry) = self.lock().by_source.get_mut(&source_id) {
            entry.job.phase = phase;
        }
    }

    /// Source the requester currently has in flight, if any.
    pub fn in_flight_for(&self, requester_id: RequesterId) -> Option<SourceId> {
        self.lock().by_requester.get(&requester_id).copied()
    }

    pub fn is_source_in_flight(&self, source_id: SourceId) -> bool {
        self.lock().by_source.contains_key(&source_id)
    }

    /// Requests the requester has used today.
    pub fn used_today(&self, requester_id: RequesterId, today: NaiveDate) -> u32 {
        self.lock()
            .quota
            .get(&requester_id)
            .filter(|daily| daily.day == Some(today))
            .map(|daily| daily.count)
            .unwrap_or(0)
    }

    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    pub fn in_flight_count(&self) -> usize {
        self.lock().by_source.len()
    }

    /// All admitted jobs, oldest first.
    pub fn snapshot(&self) -> Vec<InFlightJob> {
        let mut jobs: Vec<InFlightJob> = self
            .lock()
            .by_source
            .values()
            .map(|entry| entry.job.clone())
            .collect();
        jobs.sort_by_key(|job| job.admitted_at);
        jobs
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
