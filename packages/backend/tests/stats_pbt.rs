//! Property-Based Tests for round accounting
//!
//! Tests the following invariants:
//! - Global sum: total_games == ai_wins + human_wins + ties after any rounds
//! - Session/global agreement: session counters add up to the global ones
//! - Sequence numbers: 1..=n with no gaps, in play order

use proptest::prelude::*;

use rps_algo::{judge, Move};
use rps_backend::game::{GlobalStats, PlayRequest, SessionStats, SessionStore};

mod common;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_move() -> impl Strategy<Value = Move> {
    prop_oneof![Just(Move::Rock), Just(Move::Paper), Just(Move::Scissors)]
}

fn arb_rounds() -> impl Strategy<Value = Vec<(Move, Move)>> {
    prop::collection::vec((arb_move(), arb_move()), 0..200)
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_counters_sum_to_total(rounds in arb_rounds()) {
        let global = GlobalStats::new();
        let mut session = SessionStats::default();
        for (human, ai) in &rounds {
            let outcome = judge(*human, *ai);
            global.record_round(outcome);
            session.record(outcome);
            prop_assert!(global.snapshot().is_consistent());
        }

        let snapshot = global.snapshot();
        prop_assert_eq!(snapshot.total_games, rounds.len() as u64);
        prop_assert_eq!(session.played, snapshot.total_games);
        prop_assert_eq!(session.ai_wins, snapshot.ai_wins);
        prop_assert_eq!(session.human_wins, snapshot.human_wins);
        prop_assert_eq!(session.ties, snapshot.ties);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_engine_accounting(
        first in prop::collection::vec(arb_move(), 0..30),
        second in prop::collection::vec(arb_move(), 0..30),
    ) {
        let (views, snapshot) = runtime().block_on(async {
            let engine = common::stub_engine(
                common::StubBackend::certain_rock(),
                common::test_config(),
                SessionStore::Memory,
            );
            let mut views = Vec::new();
            for (id, moves) in [("first", &first), ("second", &second)] {
                engine.create_session(Some(id.to_string())).await.unwrap();
                for (i, mv) in moves.iter().enumerate() {
                    let outcome = engine.play_round(id, PlayRequest::new(*mv)).await.unwrap();
                    assert_eq!(outcome.sequence_number, i as u64 + 1);
                    assert_eq!(outcome.outcome, judge(*mv, outcome.ai_move));
                }
                views.push(engine.session_view(id).await.unwrap());
            }
            (views, engine.global_stats())
        });

        prop_assert!(snapshot.is_consistent());
        prop_assert_eq!(snapshot.total_games, (first.len() + second.len()) as u64);
        prop_assert_eq!(snapshot.active_sessions, 2);

        let played: u64 = views.iter().map(|v| v.stats.played).sum();
        let ai_wins: u64 = views.iter().map(|v| v.stats.ai_wins).sum();
        prop_assert_eq!(played, snapshot.total_games);
        prop_assert_eq!(ai_wins, snapshot.ai_wins);
        prop_assert_eq!(views[0].history_length, first.len());
        prop_assert_eq!(views[1].history_length, second.len());
        prop_assert_eq!(views[0].training_cycles, (first.len() / 10) as u64);
    }
}
