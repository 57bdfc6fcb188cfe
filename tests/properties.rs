use hongbao::envelope::{independent_payout, partition_payout};
use hongbao::{Amount, EnvelopeStore, Leaderboard, PayoutMode};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

const NAMES: [&str; 6] = ["赛博玩家001", "未来战士", "霓虹猎手", "数字幽灵", "量子黑客", "你"];

fn board_from(wins: &[(usize, u64)]) -> Leaderboard {
    let mut board = Leaderboard::new();
    for &(who, cents) in wins {
        board.record_win(NAMES[who], Amount::from_cents(cents), "🎯");
    }
    board
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn create_keeps_total_and_fills_shares(cents in 1u64..=10_000_000, shares in 1u32..=500) {
        let mut store = EnvelopeStore::default();
        let envelope = store.create("你", Amount::from_cents(cents), shares, "").unwrap();
        prop_assert_eq!(envelope.remaining_shares(), shares);
        prop_assert_eq!(envelope.share_count(), shares);
        prop_assert_eq!(envelope.total_amount(), Amount::from_cents(cents));
    }

    #[test]
    fn grabs_count_down_and_remove_exactly_at_zero(
        cents in 1u64..=100_000,
        shares in 1u32..=40,
        seed in any::<u64>(),
        partition in any::<bool>(),
    ) {
        let mode = if partition { PayoutMode::Partition } else { PayoutMode::IndependentDraw };
        let cents = cents.max(u64::from(shares));
        let mut store = EnvelopeStore::new(mode);
        let id = store.create("你", Amount::from_cents(cents), shares, "").unwrap().id();
        let mut rng = StdRng::seed_from_u64(seed);

        for grabbed in 1..=shares {
            prop_assert!(store.get(id).is_some());
            let outcome = store.grab(id, &mut rng).unwrap();
            prop_assert_eq!(outcome.remaining_shares, shares - grabbed);
            prop_assert_eq!(outcome.depleted, grabbed == shares);
            if grabbed < shares {
                prop_assert_eq!(store.get(id).unwrap().remaining_shares(), shares - grabbed);
            }
        }
        prop_assert!(store.get(id).is_none());
        prop_assert!(store.grab(id, &mut rng).is_err());
    }

    #[test]
    fn independent_payout_is_bounded(
        cents in 1u64..=10_000_000,
        shares in 1u32..=1_000,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let payout = independent_payout(Amount::from_cents(cents), shares, &mut rng).cents();
        let cap = (2.0 * cents as f64 / f64::from(shares)).min(cents as f64).max(1.0);
        prop_assert!(payout >= 1);
        prop_assert!(payout as f64 <= cap + 1e-9, "payout {} over cap {}", payout, cap);
    }

    #[test]
    fn partition_pays_out_exactly_the_total(
        cents in 1u64..=1_000_000,
        shares in 1u32..=60,
        seed in any::<u64>(),
    ) {
        let cents = cents.max(u64::from(shares));
        let mut rng = StdRng::seed_from_u64(seed);
        let mut pool = Amount::from_cents(cents);
        let mut paid = Amount::ZERO;
        for left in (1..=shares).rev() {
            let payout = partition_payout(pool, left, &mut rng);
            prop_assert!(payout >= Amount::CENT);
            prop_assert!(payout <= pool);
            pool = pool.saturating_sub(payout);
            paid += payout;
        }
        prop_assert_eq!(paid, Amount::from_cents(cents));
        prop_assert!(pool.is_zero());
    }

    #[test]
    fn leaderboard_is_sorted_and_ranked(
        wins in prop::collection::vec((0usize..NAMES.len(), 0u64..50_000), 0..40),
    ) {
        let board = board_from(&wins);
        let entries = board.entries();
        for (idx, entry) in entries.iter().enumerate() {
            prop_assert_eq!(entry.rank, idx + 1);
        }
        for pair in entries.windows(2) {
            prop_assert!(pair[0].total_winnings >= pair[1].total_winnings);
        }
        let recorded: Amount = wins.iter().map(|&(_, c)| Amount::from_cents(c)).sum();
        let ranked: Amount = entries.iter().map(|e| e.total_winnings).sum();
        prop_assert_eq!(recorded, ranked);
    }

    #[test]
    fn zero_win_never_reorders(
        wins in prop::collection::vec((0usize..NAMES.len(), 0u64..50_000), 1..30),
        who in 0usize..NAMES.len(),
    ) {
        let mut board = board_from(&wins);
        let before: Vec<String> = board.entries().iter().map(|e| e.username.clone()).collect();
        board.record_win(NAMES[who], Amount::ZERO, "🎯");
        let after: Vec<String> = board
            .entries()
            .iter()
            .map(|e| e.username.clone())
            .filter(|name| before.contains(name))
            .collect();
        prop_assert_eq!(before, after);
    }
}
