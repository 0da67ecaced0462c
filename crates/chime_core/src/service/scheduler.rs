//! Scheduler engine: the per-minute decision and firing pass.
//!
//! # Responsibility
//! - Decide once per invocation which bells fire for the effective minute.
//! - Guarantee at-most-once firing per (bell, minute-slot) via the ledger.
//!
//! # Invariants
//! - Settings are snapshotted once at tick start and never re-read
//!   mid-tick.
//! - The ledger claim happens before playback is attempted; dispatch
//!   outcome never alters claim state.
//! - Collaborator failures are contained: a tick always runs to completion
//!   and returns a report, it never panics or propagates errors.

use crate::audio::AudioDispatch;
use crate::clock::TickInstant;
use crate::ledger::FiringLedger;
use crate::model::bell::BellId;
use crate::repo::bell_repo::{BellRepository, SqliteBellRepository};
use crate::repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
use crate::repo::settings_repo::{
    SettingsRepository, SqliteSettingsRepository, DEFAULT_AUDIO_OUTPUT, SETTING_AUDIO_OUTPUT,
};
use crate::repo::RepoResult;
use log::{debug, error, info, warn};
use rusqlite::Connection;
use std::path::PathBuf;
use uuid::Uuid;

/// Configuration snapshot taken once per tick.
///
/// Avoids ad-hoc settings reads mid-tick: every decision within one
/// invocation sees the same offset and output device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSettings {
    pub time_offset_secs: i64,
    pub audio_output: String,
}

impl TickSettings {
    /// Zero offset and the seeded default output device.
    pub fn defaults() -> Self {
        Self {
            time_offset_secs: 0,
            audio_output: DEFAULT_AUDIO_OUTPUT.to_string(),
        }
    }

    /// Reads the snapshot from settings storage.
    ///
    /// Any failure degrades to `defaults()` with a warning; the scheduler
    /// must still attempt the tick on raw system time rather than abort.
    pub fn load(conn: &Connection) -> Self {
        match Self::try_load(conn) {
            Ok(settings) => settings,
            Err(err) => {
                warn!(
                    "event=settings_unavailable module=scheduler status=error fallback=defaults error={}",
                    err
                );
                Self::defaults()
            }
        }
    }

    fn try_load(conn: &Connection) -> RepoResult<Self> {
        let repo = SqliteSettingsRepository::try_new(conn)?;
        Ok(Self {
            time_offset_secs: repo.time_offset_secs()?,
            audio_output: repo.get(SETTING_AUDIO_OUTPUT, DEFAULT_AUDIO_OUTPUT)?,
        })
    }
}

/// Per-tick outcome summary, one entry per decision point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Correlates every log line of this invocation.
    pub tick_id: Uuid,
    pub minute_slot: String,
    /// Candidate bells returned by the store for this minute.
    pub candidates: usize,
    /// Claimed and handed to audio dispatch successfully.
    pub fired: Vec<BellId>,
    /// Claimed, but the playback handoff reported failure.
    pub dispatch_failed: Vec<BellId>,
    /// Effective weekday not in the bell's weekday set.
    pub skipped_day: Vec<BellId>,
    /// Lost the claim race; already fired this minute.
    pub skipped_duplicate: Vec<BellId>,
    /// Ledger storage failed; bell withheld to protect at-most-once.
    pub ledger_failed: Vec<BellId>,
    /// A store read failed during this tick.
    pub store_error: bool,
}

impl TickReport {
    fn new(tick_id: Uuid, minute_slot: String) -> Self {
        Self {
            tick_id,
            minute_slot,
            candidates: 0,
            fired: Vec::new(),
            dispatch_failed: Vec::new(),
            skipped_day: Vec::new(),
            skipped_duplicate: Vec::new(),
            ledger_failed: Vec::new(),
            store_error: false,
        }
    }

    /// Bells that claimed a slot this tick, regardless of dispatch outcome.
    pub fn claimed(&self) -> usize {
        self.fired.len() + self.dispatch_failed.len()
    }
}

/// The decision-and-deduplication engine.
///
/// Designed for repeated independent invocations (one per minute, e.g.
/// from cron); concurrent invocations are safe because the ledger claim is
/// the sole serialization point.
pub struct SchedulerEngine<L, A> {
    ledger: L,
    dispatch: A,
    sound_dir: PathBuf,
}

impl<L: FiringLedger, A: AudioDispatch> SchedulerEngine<L, A> {
    pub fn new(ledger: L, dispatch: A, sound_dir: impl Into<PathBuf>) -> Self {
        Self {
            ledger,
            dispatch,
            sound_dir: sound_dir.into(),
        }
    }

    /// Runs one tick against the wall clock.
    ///
    /// Reads the settings snapshot (offset takes effect this tick, not the
    /// next), derives the effective instant and delegates to
    /// [`Self::run_tick_at`].
    pub fn run_tick(&self, conn: &mut Connection) -> TickReport {
        let settings = TickSettings::load(conn);
        let instant = TickInstant::effective_now(settings.time_offset_secs);
        self.run_tick_at(conn, instant, &settings)
    }

    /// Runs one tick at an explicit effective instant.
    ///
    /// Deterministic entry point: tests and replay tooling control the
    /// clock, production passes the instant built by [`Self::run_tick`].
    pub fn run_tick_at(
        &self,
        conn: &mut Connection,
        instant: TickInstant,
        settings: &TickSettings,
    ) -> TickReport {
        let tick_id = Uuid::new_v4();
        let slot = instant.minute_slot();
        let time_of_day = instant.time_of_day();
        let weekday = instant.weekday();
        let mut report = TickReport::new(tick_id, slot.clone());

        info!(
            "event=tick_start module=scheduler status=ok tick_id={} slot={} weekday={} time={} offset_s={}",
            tick_id, slot, weekday, time_of_day, settings.time_offset_secs
        );

        let profile = match SqliteProfileRepository::try_new(conn)
            .and_then(|mut repo| repo.active_profile())
        {
            Ok(profile) => profile,
            Err(err) => {
                error!(
                    "event=tick_aborted module=scheduler status=error tick_id={} reason=profile_unavailable error={}",
                    tick_id, err
                );
                report.store_error = true;
                return report;
            }
        };

        let candidates = match SqliteBellRepository::try_new(conn)
            .and_then(|repo| repo.candidates(time_of_day, profile.id))
        {
            Ok(bells) => bells,
            Err(err) => {
                // Degrade to an empty candidate set; next tick retries
                // naturally.
                error!(
                    "event=candidates_unavailable module=scheduler status=error tick_id={} profile_id={} error={}",
                    tick_id, profile.id, err
                );
                report.store_error = true;
                Vec::new()
            }
        };

        report.candidates = candidates.len();
        if candidates.is_empty() && !report.store_error {
            info!(
                "event=tick_idle module=scheduler status=ok tick_id={} slot={} detail=nothing_scheduled",
                tick_id, slot
            );
        }

        for bell in &candidates {
            if !bell.rings_on(weekday) {
                info!(
                    "event=bell_skipped module=scheduler status=ok tick_id={} bell_id={} reason=day_mismatch weekday={}",
                    tick_id, bell.id, weekday
                );
                report.skipped_day.push(bell.id);
                continue;
            }

            match self.ledger.claim(bell.id, &slot) {
                Ok(true) => {
                    let sound_path = self.sound_dir.join(&bell.sound_ref);
                    if self.dispatch.play(&sound_path, &settings.audio_output) {
                        info!(
                            "event=bell_fired module=scheduler status=ok tick_id={} bell_id={} slot={} sound={} device={}",
                            tick_id,
                            bell.id,
                            slot,
                            bell.sound_ref,
                            settings.audio_output
                        );
                        report.fired.push(bell.id);
                    } else {
                        // Claim stands: at-most-once outranks
                        // retry-on-failure. Next matching slot is the retry.
                        error!(
                            "event=bell_fired module=scheduler status=error tick_id={} bell_id={} slot={} reason=dispatch_failed sound={}",
                            tick_id, bell.id, slot, bell.sound_ref
                        );
                        report.dispatch_failed.push(bell.id);
                    }
                }
                Ok(false) => {
                    info!(
                        "event=bell_skipped module=scheduler status=ok tick_id={} bell_id={} reason=already_fired slot={}",
                        tick_id, bell.id, slot
                    );
                    report.skipped_duplicate.push(bell.id);
                }
                Err(err) => {
                    // Firing without a claim could double-ring; withhold the
                    // bell and keep processing the rest.
                    error!(
                        "event=claim_failed module=scheduler status=error tick_id={} bell_id={} slot={} error={}",
                        tick_id, bell.id, slot, err
                    );
                    report.ledger_failed.push(bell.id);
                }
            }
        }

        match self.ledger.sweep_expired(&slot) {
            Ok(0) => {}
            Ok(removed) => {
                debug!(
                    "event=ledger_swept module=scheduler status=ok tick_id={} removed={}",
                    tick_id, removed
                );
            }
            Err(err) => {
                warn!(
                    "event=ledger_sweep_failed module=scheduler status=error tick_id={} error={}",
                    tick_id, err
                );
            }
        }

        info!(
            "event=tick_end module=scheduler status=ok tick_id={} slot={} candidates={} fired={} dispatch_failed={} skipped_day={} duplicates={} ledger_failed={}",
            tick_id,
            slot,
            report.candidates,
            report.fired.len(),
            report.dispatch_failed.len(),
            report.skipped_day.len(),
            report.skipped_duplicate.len(),
            report.ledger_failed.len()
        );

        report
    }
}
