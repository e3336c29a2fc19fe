//! Ticket lifecycle generation.
//!
//! Tickets are emitted in creation order from a fixed start date up to "now".
//! Each ticket gets an assignment time, and closed tickets a closure time,
//! drawn from windows that shrink a little with every ticket so that response
//! and resolution times improve over the simulated period. Satisfaction
//! scores drift upwards by creation year in the same spirit.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::{GeneratorError, WeightedTable, random_uuid};
use crate::models::ticket::{self, TicketStatus};

/// Upper bound for any delay or gap, in hours (one century).
pub const MAX_WINDOW_HOURS: f64 = 24.0 * 365.0 * 100.0;

/// Tunables for [`TicketFactory`].
///
/// The defaults reproduce the reference data set: tickets every 30 to 300
/// minutes since 2023-02-12, first response within 24 hours and resolution
/// within 72 hours, both windows tightening per ticket.
#[derive(Debug, Clone)]
pub struct TicketOptions {
    /// Creation time the sequence starts from (the first ticket lands one gap later)
    pub start: DateTime<Utc>,
    pub min_gap_minutes: i64,
    pub max_gap_minutes: i64,
    /// Lower bound for both the assignment and the closure delay, in hours
    pub min_interval_hours: f64,
    pub initial_max_assign_hours: f64,
    pub assign_decay_hours: f64,
    pub initial_max_close_hours: f64,
    pub close_decay_hours: f64,
    /// Tickets created longer ago than this before "now" are always closed
    pub stale_after: Duration,
    pub active_probability: f64,
    pub needed_call_probability: f64,
    pub inactive_status_weights: Vec<(TicketStatus, f64)>,
}

impl Default for TicketOptions {
    fn default() -> Self {
        Self {
            start: Utc
                .with_ymd_and_hms(2023, 2, 12, 0, 0, 0)
                .single()
                .unwrap_or_default(),
            min_gap_minutes: 30,
            max_gap_minutes: 300,
            min_interval_hours: 0.5,
            initial_max_assign_hours: 24.0,
            assign_decay_hours: 0.002,
            initial_max_close_hours: 72.0,
            close_decay_hours: 0.004,
            stale_after: Duration::days(2),
            active_probability: 0.8,
            needed_call_probability: 0.3,
            inactive_status_weights: vec![
                (TicketStatus::Resolved, 0.70),
                (TicketStatus::Cancelled, 0.10),
                (TicketStatus::NeedDevelopment, 0.20),
            ],
        }
    }
}

impl TicketOptions {
    /// Same defaults with a different start date.
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            start,
            ..Self::default()
        }
    }

    /// Checks ranges, probabilities and the closed-status table.
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if self.min_gap_minutes <= 0 {
            return Err(GeneratorError::NonPositive {
                field: "min_gap_minutes",
                value: self.min_gap_minutes as f64,
            });
        }
        if self.min_gap_minutes > self.max_gap_minutes {
            return Err(GeneratorError::InvertedRange {
                field: "gap_minutes",
                min: self.min_gap_minutes,
                max: self.max_gap_minutes,
            });
        }
        if self.max_gap_minutes as f64 > MAX_WINDOW_HOURS * 60.0 {
            return Err(GeneratorError::OutOfRange {
                field: "max_gap_minutes",
                value: self.max_gap_minutes as f64,
                min: self.min_gap_minutes as f64,
                max: MAX_WINDOW_HOURS * 60.0,
            });
        }
        if !(self.min_interval_hours > 0.0) {
            return Err(GeneratorError::NonPositive {
                field: "min_interval_hours",
                value: self.min_interval_hours,
            });
        }
        // the floor bounds both windows from below, the century cap from above
        for (field, value) in [
            ("min_interval_hours", self.min_interval_hours),
            ("initial_max_assign_hours", self.initial_max_assign_hours),
            ("initial_max_close_hours", self.initial_max_close_hours),
        ] {
            if !(self.min_interval_hours..=MAX_WINDOW_HOURS).contains(&value) {
                return Err(GeneratorError::OutOfRange {
                    field,
                    value,
                    min: self.min_interval_hours,
                    max: MAX_WINDOW_HOURS,
                });
            }
        }
        for (field, value) in [
            ("assign_decay_hours", self.assign_decay_hours),
            ("close_decay_hours", self.close_decay_hours),
        ] {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(GeneratorError::Negative { field, value });
            }
        }
        for (field, value) in [
            ("active_probability", self.active_probability),
            ("needed_call_probability", self.needed_call_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(GeneratorError::InvalidProbability { field, value });
            }
        }
        if let Some(&(status, _)) = self
            .inactive_status_weights
            .iter()
            .find(|(status, _)| status.is_active())
        {
            return Err(GeneratorError::OpenStatusForClosedTicket { status });
        }
        Ok(())
    }
}

/// Produces a chronological sequence of tickets.
#[derive(Debug)]
pub struct TicketFactory<R = SmallRng> {
    rng: R,
    options: TicketOptions,
    inactive_statuses: WeightedTable<TicketStatus>,
}

impl TicketFactory<SmallRng> {
    /// Factory with default options and a reproducible random source.
    pub fn from_seed(seed: u64) -> Result<Self, GeneratorError> {
        Self::new(SmallRng::seed_from_u64(seed), TicketOptions::default())
    }

    /// Factory with default options seeded from the operating system.
    pub fn from_entropy() -> Result<Self, GeneratorError> {
        Self::new(SmallRng::from_entropy(), TicketOptions::default())
    }
}

impl<R: Rng> TicketFactory<R> {
    pub fn new(rng: R, options: TicketOptions) -> Result<Self, GeneratorError> {
        options.validate()?;
        let inactive_statuses = WeightedTable::new(options.inactive_status_weights.clone())?;
        Ok(Self {
            rng,
            options,
            inactive_statuses,
        })
    }

    pub fn options(&self) -> &TicketOptions {
        &self.options
    }

    /// Generates tickets up to the current wall-clock time.
    pub fn generate(&mut self) -> Vec<ticket::Model> {
        self.generate_until(Utc::now())
    }

    /// Generates tickets from the configured start until `now`.
    ///
    /// The bound is checked before advancing, so the last ticket is the first
    /// one created after `now`.
    pub fn generate_until(&mut self, now: DateTime<Utc>) -> Vec<ticket::Model> {
        let mut tickets = Vec::new();
        let mut time_created = self.options.start;
        let mut max_assign_hours = self.options.initial_max_assign_hours;
        let mut max_close_hours = self.options.initial_max_close_hours;

        while time_created <= now {
            let gap = self
                .rng
                .gen_range(self.options.min_gap_minutes..=self.options.max_gap_minutes);
            time_created += Duration::minutes(gap);

            tickets.push(self.create_ticket(time_created, now, max_assign_hours, max_close_hours));

            max_assign_hours -= self.options.assign_decay_hours;
            max_close_hours -= self.options.close_decay_hours;
        }

        debug!(
            count = tickets.len(),
            final_max_assign_hours = max_assign_hours,
            final_max_close_hours = max_close_hours,
            "generated ticket sequence"
        );
        tickets
    }

    fn create_ticket(
        &mut self,
        time_created: DateTime<Utc>,
        now: DateTime<Utc>,
        max_assign_hours: f64,
        max_close_hours: f64,
    ) -> ticket::Model {
        let time_assigned = time_created + self.random_delay(max_assign_hours);
        let active = self.is_active(time_created, now);
        let time_closed = (!active).then(|| time_assigned + self.random_delay(max_close_hours));
        let status = self.status(active);
        let success_rate = (!active).then(|| self.success_rate(time_created));
        let needed_call = status != TicketStatus::New
            && self.rng.gen_bool(self.options.needed_call_probability);

        ticket::Model {
            ticket_id: random_uuid(&mut self.rng),
            active,
            time_created: time_created.into(),
            time_assigned: time_assigned.into(),
            time_closed: time_closed.map(Into::into),
            status,
            success_rate,
            needed_call,
        }
    }

    /// Random delay between the minimum interval and `max_hours`, in whole minutes.
    ///
    /// `max_hours` decays per ticket; it is floored at the minimum interval so
    /// the window collapses to a fixed delay instead of becoming empty.
    fn random_delay(&mut self, max_hours: f64) -> Duration {
        let min_hours = self.options.min_interval_hours;
        let lower = hours_to_minutes(min_hours);
        let upper = hours_to_minutes(max_hours.max(min_hours));
        Duration::minutes(self.rng.gen_range(lower..=upper))
    }

    fn is_active(&mut self, time_created: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        if time_created < now - self.options.stale_after {
            false
        } else {
            self.rng.gen_bool(self.options.active_probability)
        }
    }

    fn status(&mut self, active: bool) -> TicketStatus {
        if active {
            let idx = self.rng.gen_range(0..TicketStatus::ACTIVE.len());
            TicketStatus::ACTIVE[idx]
        } else {
            self.inactive_statuses.sample(&mut self.rng)
        }
    }

    fn success_rate(&mut self, time_created: DateTime<Utc>) -> i32 {
        let range = success_rate_range(time_created.year());
        self.rng.gen_range(range)
    }
}

/// Inclusive satisfaction score range for tickets created in `year`.
pub fn success_rate_range(year: i32) -> std::ops::RangeInclusive<i32> {
    match year {
        2023 => 1..=5,
        2024 => 2..=5,
        _ => 3..=5,
    }
}

fn hours_to_minutes(hours: f64) -> i64 {
    (hours * 60.0) as i64
}
