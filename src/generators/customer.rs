//! Customer generation.

use chrono::{SubsecRound, Utc};
use fake::Fake;
use fake::faker::internet::raw::Username;
use fake::faker::name::raw::{FirstName, LastName};
use fake::locales::EN;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::random_uuid;
use crate::models::customer;

/// Probability that a generated customer is active.
pub const ACTIVE_PROBABILITY: f64 = 0.8;
/// Youngest generated age, inclusive.
pub const MIN_AGE: i32 = 18;
/// Oldest generated age, inclusive.
pub const MAX_AGE: i32 = 100;

/// Produces independent customer records.
#[derive(Debug)]
pub struct CustomerFactory<R = SmallRng> {
    rng: R,
}

impl CustomerFactory<SmallRng> {
    /// Factory with a reproducible random source.
    pub fn from_seed(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    /// Factory seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self::with_rng(SmallRng::from_entropy())
    }
}

impl<R: Rng> CustomerFactory<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Creates a single customer stamped with the current time.
    pub fn create_customer(&mut self) -> customer::Model {
        let rng = &mut self.rng;
        customer::Model {
            customer_id: random_uuid(rng),
            name: FirstName(EN).fake_with_rng(rng),
            surname: LastName(EN).fake_with_rng(rng),
            username: Username(EN).fake_with_rng(rng),
            is_active: rng.gen_bool(ACTIVE_PROBABILITY),
            // postgres keeps microseconds
            time_created: Utc::now().trunc_subsecs(6).into(),
            time_updated: None,
            age: rng.gen_range(MIN_AGE..=MAX_AGE),
        }
    }

    /// Creates `count` customers.
    pub fn create_customers(&mut self, count: usize) -> Vec<customer::Model> {
        (0..count).map(|_| self.create_customer()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn hundred_customers_have_unique_ids_and_names() {
        let mut factory = CustomerFactory::from_seed(1);
        let customers = factory.create_customers(100);

        assert_eq!(customers.len(), 100);
        let ids: HashSet<_> = customers.iter().map(|c| c.customer_id).collect();
        assert_eq!(ids.len(), 100);

        for c in &customers {
            assert!(!c.name.is_empty());
            assert!(!c.surname.is_empty());
            assert!(!c.username.is_empty());
            assert!((MIN_AGE..=MAX_AGE).contains(&c.age));
            assert!(c.time_updated.is_none());
            assert_eq!(c.customer_id.get_version_num(), 4);
        }
    }

    #[test]
    fn roughly_eighty_percent_are_active() {
        let mut factory = CustomerFactory::from_seed(99);
        let customers = factory.create_customers(5_000);
        let active = customers.iter().filter(|c| c.is_active).count();
        let share = active as f64 / customers.len() as f64;
        assert!((0.76..0.84).contains(&share), "active share was {share}");
    }

    #[test]
    fn same_seed_same_identities() {
        let a = CustomerFactory::from_seed(5).create_customers(10);
        let b = CustomerFactory::from_seed(5).create_customers(10);
        let key = |c: &customer::Model| (c.customer_id, c.username.clone(), c.age);
        assert_eq!(
            a.iter().map(key).collect::<Vec<_>>(),
            b.iter().map(key).collect::<Vec<_>>()
        );
    }

    #[test]
    fn zero_count_is_empty() {
        assert!(CustomerFactory::from_seed(0).create_customers(0).is_empty());
    }
}
