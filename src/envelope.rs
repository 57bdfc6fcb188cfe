use std::fmt;

use chrono::{DateTime, Local, Utc};
use clap::ValueEnum;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::amount::Amount;
use crate::error::GameError;

pub const DEFAULT_MESSAGE: &str = "恭喜发财，红包拿来！";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvelopeId(u64);

impl EnvelopeId {
    pub const fn new(raw: u64) -> Self {
        EnvelopeId(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EnvelopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a grab decides its payout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PayoutMode {
    /// Every grab is an independent draw from `(0, min(2 * average, total)]`.
    /// Payouts are not required to add up to the envelope total.
    #[default]
    IndependentDraw,
    /// Every grab takes a random slice of what is left; the last share takes the rest,
    /// so payouts add up to the total exactly.
    Partition,
}

impl PayoutMode {
    pub fn label(self) -> &'static str {
        match self {
            PayoutMode::IndependentDraw => "independent draw",
            PayoutMode::Partition => "partition",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope {
    id: EnvelopeId,
    total_amount: Amount,
    share_count: u32,
    remaining_shares: u32,
    remaining_amount: Amount,
    paid_out: Amount,
    creator: String,
    message: String,
    created_at: DateTime<Utc>,
}

impl Envelope {
    pub fn id(&self) -> EnvelopeId {
        self.id
    }

    pub fn total_amount(&self) -> Amount {
        self.total_amount
    }

    pub fn share_count(&self) -> u32 {
        self.share_count
    }

    pub fn remaining_shares(&self) -> u32 {
        self.remaining_shares
    }

    /// Undistributed part of the pot.
    pub fn remaining_amount(&self) -> Amount {
        self.remaining_amount
    }

    pub fn paid_out(&self) -> Amount {
        self.paid_out
    }

    pub fn creator(&self) -> &str {
        &self.creator
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn created_local(&self) -> DateTime<Local> {
        self.created_at.with_timezone(&Local)
    }

    pub fn grabbed_shares(&self) -> u32 {
        self.share_count - self.remaining_shares
    }

    pub fn average_share(&self) -> Amount {
        self.total_amount.per_share(self.share_count)
    }

    pub fn progress_ratio(&self) -> f64 {
        if self.share_count == 0 {
            return 0.0;
        }
        (f64::from(self.grabbed_shares()) / f64::from(self.share_count)).clamp(0.0, 1.0)
    }

    pub fn is_depleted(&self) -> bool {
        self.remaining_shares == 0
    }
}

/// Result of one successful grab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GrabOutcome {
    pub envelope_id: EnvelopeId,
    pub amount: Amount,
    pub remaining_shares: u32,
    pub share_count: u32,
    pub depleted: bool,
}

/// The active red packets, in creation order.
#[derive(Debug)]
pub struct EnvelopeStore {
    envelopes: Vec<Envelope>,
    next_id: u64,
    mode: PayoutMode,
}

impl Default for EnvelopeStore {
    fn default() -> Self {
        Self::new(PayoutMode::default())
    }
}

impl EnvelopeStore {
    pub fn new(mode: PayoutMode) -> Self {
        Self {
            envelopes: Vec::new(),
            next_id: 1,
            mode,
        }
    }

    pub fn mode(&self) -> PayoutMode {
        self.mode
    }

    pub fn active(&self) -> &[Envelope] {
        &self.envelopes
    }

    pub fn get(&self, id: EnvelopeId) -> Option<&Envelope> {
        self.envelopes.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.envelopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty()
    }

    pub fn create(
        &mut self,
        creator: &str,
        total_amount: Amount,
        share_count: u32,
        message: &str,
    ) -> Result<&Envelope, GameError> {
        if total_amount.is_zero() {
            return Err(GameError::validation("amount", "must be greater than zero"));
        }
        if share_count == 0 {
            return Err(GameError::validation("count", "must be at least 1"));
        }
        if self.mode == PayoutMode::Partition && total_amount.cents() < u64::from(share_count) {
            return Err(GameError::validation(
                "count",
                format!("{total_amount} cannot give every one of {share_count} shares a cent"),
            ));
        }

        let message = match message.trim() {
            "" => DEFAULT_MESSAGE.to_string(),
            text => text.to_string(),
        };
        let id = self.allocate_id();
        self.envelopes.push(Envelope {
            id,
            total_amount,
            share_count,
            remaining_shares: share_count,
            remaining_amount: total_amount,
            paid_out: Amount::ZERO,
            creator: creator.to_string(),
            message,
            created_at: Utc::now(),
        });
        info!(%id, %total_amount, share_count, creator, "red packet created");

        let idx = self.envelopes.len() - 1;
        Ok(&self.envelopes[idx])
    }

    /// Insert a partially grabbed envelope. Only used for mock data; an envelope with no
    /// shares left is never active, so those are skipped and `None` is returned.
    pub fn insert_seeded(
        &mut self,
        id: EnvelopeId,
        creator: &str,
        total_amount: Amount,
        share_count: u32,
        remaining_shares: u32,
    ) -> Option<&Envelope> {
        if share_count == 0 || remaining_shares == 0 || remaining_shares > share_count {
            return None;
        }
        if self.envelopes.iter().any(|e| e.id == id) {
            return None;
        }
        let remaining_amount = Amount::from_cents(
            total_amount.cents() * u64::from(remaining_shares) / u64::from(share_count),
        );
        self.envelopes.push(Envelope {
            id,
            total_amount,
            share_count,
            remaining_shares,
            remaining_amount,
            paid_out: total_amount.saturating_sub(remaining_amount),
            creator: creator.to_string(),
            message: DEFAULT_MESSAGE.to_string(),
            created_at: Utc::now(),
        });
        self.next_id = self.next_id.max(id.get() + 1);
        self.envelopes.last()
    }

    pub fn grab<R: Rng + ?Sized>(
        &mut self,
        id: EnvelopeId,
        rng: &mut R,
    ) -> Result<GrabOutcome, GameError> {
        let idx = self
            .envelopes
            .iter()
            .position(|e| e.id == id)
            .ok_or(GameError::NotFound { id })?;
        let envelope = &mut self.envelopes[idx];
        if envelope.is_depleted() {
            return Err(GameError::Depleted { id });
        }

        let amount = match self.mode {
            PayoutMode::IndependentDraw => {
                independent_payout(envelope.total_amount, envelope.share_count, rng)
            }
            PayoutMode::Partition => {
                partition_payout(envelope.remaining_amount, envelope.remaining_shares, rng)
            }
        };
        envelope.remaining_shares -= 1;
        envelope.remaining_amount = envelope.remaining_amount.saturating_sub(amount);
        envelope.paid_out += amount;

        let outcome = GrabOutcome {
            envelope_id: id,
            amount,
            remaining_shares: envelope.remaining_shares,
            share_count: envelope.share_count,
            depleted: envelope.is_depleted(),
        };
        if outcome.depleted {
            let envelope = self.envelopes.remove(idx);
            debug!(%id, paid_out = %envelope.paid_out, "red packet emptied");
        }
        Ok(outcome)
    }

    fn allocate_id(&mut self) -> EnvelopeId {
        let id = EnvelopeId(self.next_id);
        self.next_id += 1;
        id
    }
}

/// Uniform draw from `(0, min(2 * total / shares, total)]`, in whole cents, never below one cent.
pub fn independent_payout<R: Rng + ?Sized>(total: Amount, shares: u32, rng: &mut R) -> Amount {
    let total = total.cents();
    let cap = (total.saturating_mul(2) / u64::from(shares.max(1))).min(total);
    Amount::from_cents(rng.gen_range(1..=cap.max(1)))
}

/// Random slice of the remaining pot. Leaves at least a cent for each share after this one;
/// the last share takes everything that is left.
pub fn partition_payout<R: Rng + ?Sized>(
    pool: Amount,
    remaining_shares: u32,
    rng: &mut R,
) -> Amount {
    if remaining_shares <= 1 {
        return pool;
    }
    let pool = pool.cents();
    let reserve = u64::from(remaining_shares - 1);
    let ceiling = (pool.saturating_mul(2) / u64::from(remaining_shares))
        .min(pool.saturating_sub(reserve))
        .max(1);
    Amount::from_cents(rng.gen_range(1..=ceiling))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn create_fills_defaults() {
        let mut store = EnvelopeStore::default();
        let envelope = store
            .create("你", Amount::from_yuan(100), 10, "   ")
            .unwrap();
        assert_eq!(envelope.id(), EnvelopeId::new(1));
        assert_eq!(envelope.remaining_shares(), 10);
        assert_eq!(envelope.total_amount(), Amount::from_yuan(100));
        assert_eq!(envelope.message(), DEFAULT_MESSAGE);
        assert_eq!(envelope.average_share(), Amount::from_yuan(10));
        assert_eq!(envelope.progress_ratio(), 0.0);
    }

    #[test]
    fn create_rejects_empty_pot_and_zero_shares() {
        let mut store = EnvelopeStore::default();
        assert!(matches!(
            store.create("你", Amount::ZERO, 3, ""),
            Err(GameError::Validation { field: "amount", .. })
        ));
        assert!(matches!(
            store.create("你", Amount::from_yuan(1), 0, ""),
            Err(GameError::Validation { field: "count", .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn partition_requires_a_cent_per_share() {
        let mut store = EnvelopeStore::new(PayoutMode::Partition);
        assert!(store.create("你", Amount::from_cents(2), 3, "").is_err());
        assert!(store.create("你", Amount::from_cents(3), 3, "").is_ok());
    }

    #[test]
    fn grab_decrements_and_removes_on_last_share() {
        let mut store = EnvelopeStore::default();
        let id = store.create("你", Amount::from_yuan(10), 3, "").unwrap().id();
        let mut rng = rng();

        let first = store.grab(id, &mut rng).unwrap();
        assert_eq!(first.remaining_shares, 2);
        assert!(!first.depleted);
        assert_eq!(store.get(id).unwrap().remaining_shares(), 2);

        store.grab(id, &mut rng).unwrap();
        let last = store.grab(id, &mut rng).unwrap();
        assert!(last.depleted);
        assert!(store.get(id).is_none());
        assert_eq!(
            store.grab(id, &mut rng),
            Err(GameError::NotFound { id })
        );
    }

    #[test]
    fn depleted_envelope_is_refused() {
        let mut store = EnvelopeStore::default();
        let id = store.create("你", Amount::from_yuan(10), 1, "").unwrap().id();
        store.envelopes[0].remaining_shares = 0;
        assert_eq!(store.grab(id, &mut rng()), Err(GameError::Depleted { id }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut store = EnvelopeStore::default();
        let a = store.create("你", Amount::from_yuan(1), 1, "").unwrap().id();
        let b = store.create("你", Amount::from_yuan(1), 2, "").unwrap().id();
        store.grab(a, &mut rng()).unwrap();
        assert_eq!(store.len(), 1);
        let c = store.create("你", Amount::from_yuan(1), 1, "").unwrap().id();
        assert_ne!(c, a);
        assert_ne!(c, b);
        assert_eq!(c, EnvelopeId::new(3));
    }

    #[test]
    fn seeded_envelopes_advance_the_counter() {
        let mut store = EnvelopeStore::default();
        store
            .insert_seeded(EnvelopeId::new(3), "霓虹猎手", Amount::from_yuan(200), 20, 15)
            .unwrap();
        assert!(
            store
                .insert_seeded(EnvelopeId::new(4), "x", Amount::from_yuan(1), 5, 0)
                .is_none()
        );
        let seeded = store.get(EnvelopeId::new(3)).unwrap();
        assert_eq!(seeded.remaining_amount(), Amount::from_yuan(150));
        assert_eq!(seeded.progress_ratio(), 0.25);
        let fresh = store.create("你", Amount::from_yuan(5), 1, "").unwrap();
        assert_eq!(fresh.id(), EnvelopeId::new(4));
    }

    #[test]
    fn independent_payout_stays_under_cap() {
        let mut rng = rng();
        for _ in 0..500 {
            let p = independent_payout(Amount::from_yuan(100), 10, &mut rng);
            assert!(p >= Amount::CENT && p <= Amount::from_yuan(20));
        }
        // a single share may take up to the whole pot, never more
        for _ in 0..200 {
            let p = independent_payout(Amount::from_yuan(5), 1, &mut rng);
            assert!(p <= Amount::from_yuan(5));
        }
        // tiny pots still pay a cent
        assert_eq!(
            independent_payout(Amount::from_cents(1), 50, &mut rng),
            Amount::CENT
        );
    }

    #[test]
    fn partition_pays_out_the_whole_pot() {
        let mut store = EnvelopeStore::new(PayoutMode::Partition);
        let id = store.create("你", Amount::from_cents(1_003), 7, "").unwrap().id();
        let mut rng = rng();
        let mut paid = Vec::new();
        while store.get(id).is_some() {
            paid.push(store.grab(id, &mut rng).unwrap().amount);
        }
        assert_eq!(paid.len(), 7);
        assert!(paid.iter().all(|p| *p >= Amount::CENT));
        assert_eq!(paid.into_iter().sum::<Amount>(), Amount::from_cents(1_003));
    }
}
