//! The placeholder world every session starts in.

use crate::amount::Amount;
use crate::envelope::{EnvelopeId, EnvelopeStore};
use crate::leaderboard::Leaderboard;

/// Shown on the home screen; nothing tracks these.
pub const ONLINE_PLAYERS: &str = "1,234";
pub const TODAY_POOL: &str = "¥56,789";

struct SeedEnvelope {
    id: u64,
    yuan: u64,
    shares: u32,
    remaining: u32,
    creator: &'static str,
}

const ENVELOPES: &[SeedEnvelope] = &[
    SeedEnvelope {
        id: 1,
        yuan: 100,
        shares: 10,
        remaining: 7,
        creator: "赛博玩家001",
    },
    SeedEnvelope {
        id: 2,
        yuan: 50,
        shares: 5,
        remaining: 3,
        creator: "未来战士",
    },
    SeedEnvelope {
        id: 3,
        yuan: 200,
        shares: 20,
        remaining: 15,
        creator: "霓虹猎手",
    },
];

const PLAYERS: &[(&str, u64, &str)] = &[
    ("赛博玩家001", 888, "🤖"),
    ("未来战士", 666, "⚡"),
    ("霓虹猎手", 555, "🔥"),
    ("数字幽灵", 333, "👻"),
    ("量子黑客", 222, "💀"),
];

pub fn seed_envelopes(store: &mut EnvelopeStore) {
    for seed in ENVELOPES {
        store.insert_seeded(
            EnvelopeId::new(seed.id),
            seed.creator,
            Amount::from_yuan(seed.yuan),
            seed.shares,
            seed.remaining,
        );
    }
}

pub fn seed_leaderboard() -> Leaderboard {
    Leaderboard::from_seed(
        PLAYERS
            .iter()
            .map(|&(name, yuan, avatar)| (name, Amount::from_yuan(yuan), avatar)),
    )
}
