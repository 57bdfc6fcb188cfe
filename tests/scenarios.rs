use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use hongbao::{Amount, App, Config, EnvelopeStore, Leaderboard, Screen};
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn ten_grabs_empty_a_hundred_yuan_packet() {
    let mut store = EnvelopeStore::default();
    let mut board = Leaderboard::new();
    let mut rng = StdRng::seed_from_u64(2024);

    let envelope = store.create("你", Amount::from_yuan(100), 10, "").unwrap();
    assert_eq!(envelope.total_amount(), Amount::from_yuan(100));
    assert_eq!(envelope.share_count(), 10);
    assert_eq!(envelope.remaining_shares(), 10);
    let id = envelope.id();

    let mut payouts = Vec::new();
    for _ in 0..10 {
        let outcome = store.grab(id, &mut rng).unwrap();
        assert!(outcome.amount >= Amount::CENT);
        assert!(outcome.amount <= Amount::from_yuan(20));
        board.record_win("你", outcome.amount, "🎯");
        payouts.push(outcome.amount);
    }

    assert!(store.get(id).is_none());
    assert_eq!(board.len(), 1);
    let me = &board.entries()[0];
    assert_eq!(me.rank, 1);
    assert_eq!(me.total_winnings, payouts.into_iter().sum::<Amount>());
}

#[test]
fn two_players_are_ranked_by_winnings() {
    let mut store = EnvelopeStore::default();
    let mut board = Leaderboard::new();
    let mut rng = StdRng::seed_from_u64(5);
    let id = store.create("你", Amount::from_yuan(50), 5, "").unwrap().id();

    let alice = store.grab(id, &mut rng).unwrap().amount;
    board.record_win("alice", alice, "🤖");
    let bob = store.grab(id, &mut rng).unwrap().amount;
    board.record_win("bob", bob, "⚡");

    let entries = board.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!((entries[0].rank, entries[1].rank), (1, 2));
    assert!(entries[0].total_winnings >= entries[1].total_winnings);
    if alice >= bob {
        assert_eq!(entries[0].username, "alice");
    } else {
        assert_eq!(entries[0].username, "bob");
    }
    assert_eq!(store.get(id).unwrap().remaining_shares(), 3);
}

#[test]
fn tied_players_keep_the_first_recorded_on_top() {
    let mut board = Leaderboard::new();
    board.record_win("alice", Amount::from_cents(500), "🤖");
    board.record_win("bob", Amount::from_cents(500), "⚡");
    let names: Vec<&str> = board.entries().iter().map(|e| e.username.as_str()).collect();
    assert_eq!(names, ["alice", "bob"]);
}

fn press(app: &mut App, code: KeyCode) {
    app.on_key(KeyEvent::new(code, KeyModifiers::NONE));
}

fn tick(app: &mut App) {
    app.on_tick(Duration::from_millis(200));
}

#[test]
fn create_then_grab_everything_through_the_keyboard() {
    let mut app = App::new(Config {
        rng_seed: Some(11),
        create_delay_ms: 0,
        grab_delay_ms: 0,
        result_delay_ms: 0,
        mock_data: false,
        ..Config::default()
    })
    .unwrap();

    press(&mut app, KeyCode::Char('1'));
    for ch in "100".chars() {
        press(&mut app, KeyCode::Char(ch));
    }
    press(&mut app, KeyCode::Tab);
    for ch in "10".chars() {
        press(&mut app, KeyCode::Char(ch));
    }
    press(&mut app, KeyCode::Enter);
    tick(&mut app);
    assert_eq!(app.screen, Screen::Home);
    assert_eq!(app.envelopes.len(), 1);

    for round in 1..=10u32 {
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.screen, Screen::Grab);
        press(&mut app, KeyCode::Enter);
        tick(&mut app);
        assert!(app.reveal().is_some(), "round {round} produced no result");
        tick(&mut app);
        assert_eq!(app.screen, Screen::Leaderboard);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.screen, Screen::Home);
        if round < 10 {
            assert_eq!(app.envelopes.active()[0].remaining_shares(), 10 - round);
        }
    }

    assert!(app.envelopes.is_empty());
    assert_eq!(app.history.len(), 10);
    assert!(app.history[0].emptied);
    let me = app.leaderboard.get("你").unwrap();
    let grabbed: Amount = app.history.iter().map(|r| r.amount).sum();
    assert_eq!(me.total_winnings, grabbed);
    assert_eq!(app.leaderboard.len(), 1);
}
