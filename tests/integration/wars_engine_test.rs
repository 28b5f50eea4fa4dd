//! Word war engine integration tests
//!
//! Exercises the full engine against the in-memory store: lifecycle
//! scenarios, idempotency, monotonicity, wall-clock expiry, and the
//! reconciliation paths under simulated races.

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use common::{RacingWarStore, TestEngine};
use writeclub_common::Error;
use writeclub_wars::{InMemoryWarStore, WarStatus, WarStore};

fn racing_engine() -> (TestEngine, Arc<RacingWarStore>) {
    let inner = Arc::new(InMemoryWarStore::new());
    let racing = Arc::new(RacingWarStore::new(inner.clone()));
    let engine = TestEngine::with_store(racing.clone(), inner);
    (engine, racing)
}

// ============================================================================
// Lifecycle scenarios
// ============================================================================

/// Scenario A: create on an active event, start, two users join
#[tokio::test]
async fn test_full_round_setup() {
    let engine = TestEngine::new();
    let event_id = engine.events.insert_active_event();
    let host = Uuid::new_v4();

    let war_id = engine.service.create_war(event_id, host, 10).await.unwrap();
    let war = engine.store.find_war(war_id).await.unwrap().unwrap();
    assert_eq!(war.status, WarStatus::Waiting);
    assert!(war.starts_at.is_none());
    assert!(war.ends_at.is_none());

    engine.join_new_user(war_id).await;
    engine.join_new_user(war_id).await;

    let participants = engine.store.list_participants(war_id).await.unwrap();
    assert_eq!(participants.len(), 2);
    assert!(participants.iter().all(|p| p.words_in_round == 0));

    engine.service.start_war(war_id, host).await.unwrap();

    let war = engine.store.find_war(war_id).await.unwrap().unwrap();
    assert_eq!(war.status, WarStatus::Running);
    let starts_at = war.starts_at.unwrap();
    assert_eq!(war.ends_at.unwrap(), starts_at + Duration::minutes(10));
}

/// Scenario B: a lower checkpoint is rejected and the stored value stands
#[tokio::test]
async fn test_checkpoint_sequence_is_monotonic() {
    let engine = TestEngine::new();
    let (war_id, _, user_id) = engine.running_war_with_participant().await;

    assert!(engine.service.checkpoint(war_id, user_id, 10).await.unwrap());
    assert!(engine.service.checkpoint(war_id, user_id, 50).await.unwrap());

    let err = engine
        .service
        .checkpoint(war_id, user_id, 30)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RuleViolation(_)));

    let stored = engine
        .store
        .find_participant(war_id, user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.words_in_round, 50);
}

/// Scenario C: resubmitting the same value succeeds with zero extra writes
#[tokio::test]
async fn test_checkpoint_same_value_is_idempotent() {
    let engine = TestEngine::new();
    let (war_id, _, user_id) = engine.running_war_with_participant().await;

    engine.service.checkpoint(war_id, user_id, 50).await.unwrap();
    let writes = engine.store.word_write_count();

    assert!(engine.service.checkpoint(war_id, user_id, 50).await.unwrap());
    assert_eq!(engine.store.word_write_count(), writes);
}

#[tokio::test]
async fn test_join_and_leave_idempotence() {
    let engine = TestEngine::new();
    let (war_id, _) = engine.waiting_war().await;

    let user_id = Uuid::new_v4();
    let project_id = engine.projects.grant_new_project(user_id);

    assert!(engine
        .service
        .join_war(war_id, user_id, project_id)
        .await
        .unwrap());
    assert!(engine
        .service
        .join_war(war_id, user_id, project_id)
        .await
        .unwrap());
    assert_eq!(engine.store.list_participants(war_id).await.unwrap().len(), 1);

    assert!(engine.service.leave_war(war_id, user_id).await.unwrap());
    assert!(engine.service.leave_war(war_id, user_id).await.unwrap());
    assert!(engine
        .store
        .list_participants(war_id)
        .await
        .unwrap()
        .is_empty());
}

/// Forward-only: nothing moves a finished war back
#[tokio::test]
async fn test_finished_war_is_terminal() {
    let engine = TestEngine::new();
    let (war_id, host, user_id) = engine.running_war_with_participant().await;
    engine.service.finish_war(war_id).await.unwrap();

    let start_err = engine.service.start_war(war_id, host).await.unwrap_err();
    assert!(matches!(start_err, Error::RuleViolation(_)));

    let project_id = engine.projects.grant_new_project(user_id);
    let join_err = engine
        .service
        .join_war(war_id, user_id, project_id)
        .await
        .unwrap_err();
    assert!(matches!(join_err, Error::RuleViolation(_)));

    let leave_err = engine.service.leave_war(war_id, user_id).await.unwrap_err();
    assert!(matches!(leave_err, Error::RuleViolation(_)));

    let checkpoint_err = engine
        .service
        .checkpoint(war_id, user_id, 10)
        .await
        .unwrap_err();
    assert!(matches!(checkpoint_err, Error::RuleViolation(_)));

    let finish_err = engine.service.finish_war(war_id).await.unwrap_err();
    assert!(matches!(finish_err, Error::RuleViolation(_)));

    let war = engine.store.find_war(war_id).await.unwrap().unwrap();
    assert_eq!(war.status, WarStatus::Finished);
}

// ============================================================================
// Wall-clock expiry
// ============================================================================

/// Scenario E: a checkpoint after the round elapsed finishes the war and is
/// itself rejected
#[tokio::test]
async fn test_expired_checkpoint_auto_finishes() {
    let engine = TestEngine::new();
    let (war_id, _, user_id) = engine.running_war_with_participant().await;
    engine.service.checkpoint(war_id, user_id, 80).await.unwrap();

    // Move the round window into the past
    let now = Utc::now();
    engine
        .store
        .set_round_window(war_id, now - Duration::minutes(11), now - Duration::minutes(1));

    let err = engine
        .service
        .checkpoint(war_id, user_id, 100)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RuleViolation(_)));

    let war = engine.store.find_war(war_id).await.unwrap().unwrap();
    assert_eq!(war.status, WarStatus::Finished);
    assert!(war.finished_at.is_some());

    // Standings reflect the last count recorded before expiry
    let ranks = engine.store.list_final_ranks(war_id).await.unwrap();
    assert_eq!(ranks.len(), 1);
    assert_eq!(ranks[0].words_in_round, 80);
    assert_eq!(ranks[0].rank, 1);
}

/// The rejection holds even when a concurrent finish beat the time guard
#[tokio::test]
async fn test_expired_checkpoint_rejected_when_finish_race_lost() {
    let (engine, racing) = racing_engine();
    let (war_id, _, user_id) = engine.running_war_with_participant().await;

    let now = Utc::now();
    engine
        .store
        .set_round_window(war_id, now - Duration::minutes(11), now - Duration::minutes(1));
    racing.arm_rival_finish();

    let err = engine
        .service
        .checkpoint(war_id, user_id, 100)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RuleViolation(_)));

    let war = engine.store.find_war(war_id).await.unwrap().unwrap();
    assert_eq!(war.status, WarStatus::Finished);
    // Only the rival's transition took effect
    assert_eq!(engine.store.finish_transition_count(), 1);
}

// ============================================================================
// Concurrency: at-most-one-winner
// ============================================================================

#[tokio::test]
async fn test_concurrent_starts_have_one_winner() {
    let engine = TestEngine::new();
    let (war_id, host) = engine.waiting_war().await;

    let mut handles = Vec::new();
    for _ in 0..16 {
        let service = engine.service.clone();
        handles.push(tokio::spawn(
            async move { service.start_war(war_id, host).await },
        ));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => successes += 1,
            // A caller that read the war only after the winner's transition
            // is correctly told the war is no longer waiting
            Err(Error::RuleViolation(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert!(successes >= 1);
    assert_eq!(engine.store.start_transition_count(), 1);

    let war = engine.store.find_war(war_id).await.unwrap().unwrap();
    assert_eq!(war.status, WarStatus::Running);
    assert_eq!(
        war.ends_at.unwrap(),
        war.starts_at.unwrap() + Duration::minutes(10)
    );
}

/// Scenario D: concurrent finishes: one transition, standings persisted once
/// per finalizer run, every caller sees a lawful outcome
#[tokio::test]
async fn test_concurrent_finishes_have_one_winner() {
    let engine = TestEngine::new();
    let (war_id, _, user_id) = engine.running_war_with_participant().await;
    engine.service.checkpoint(war_id, user_id, 42).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..2 {
        let service = engine.service.clone();
        handles.push(tokio::spawn(async move { service.finish_war(war_id).await }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => successes += 1,
            Err(Error::RuleViolation(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert!(successes >= 1);
    assert_eq!(engine.store.finish_transition_count(), 1);

    let ranks = engine.store.list_final_ranks(war_id).await.unwrap();
    assert_eq!(ranks.len(), 1);
    assert_eq!(ranks[0].words_in_round, 42);
}

// ============================================================================
// Reconciliation after a lost conditional write
// ============================================================================

/// A start that loses the conditional write to a rival reconciles to success
/// without a second transition or timer reset
#[tokio::test]
async fn test_start_lost_race_reconciles_to_success() {
    let (engine, racing) = racing_engine();
    let (war_id, host) = engine.waiting_war().await;

    racing.arm_rival_start();
    engine.service.start_war(war_id, host).await.unwrap();

    assert_eq!(engine.store.start_transition_count(), 1);
    let war = engine.store.find_war(war_id).await.unwrap().unwrap();
    assert_eq!(war.status, WarStatus::Running);
}

/// A finish that loses the conditional write still returns success and still
/// leaves a standings snapshot behind
#[tokio::test]
async fn test_finish_lost_race_reconciles_to_success() {
    let (engine, racing) = racing_engine();
    let (war_id, _, user_id) = engine.running_war_with_participant().await;
    engine.service.checkpoint(war_id, user_id, 17).await.unwrap();

    racing.arm_rival_finish();
    engine.service.finish_war(war_id).await.unwrap();

    assert_eq!(engine.store.finish_transition_count(), 1);
    let ranks = engine.store.list_final_ranks(war_id).await.unwrap();
    assert_eq!(ranks.len(), 1);
    assert_eq!(ranks[0].words_in_round, 17);
}

/// A join whose insert loses to a concurrent join of the same user
/// reconciles to success with a single participant row
#[tokio::test]
async fn test_join_lost_race_reconciles_to_success() {
    let (engine, racing) = racing_engine();
    let (war_id, _) = engine.waiting_war().await;

    let user_id = Uuid::new_v4();
    let project_id = engine.projects.grant_new_project(user_id);

    racing.arm_rival_join();
    assert!(engine
        .service
        .join_war(war_id, user_id, project_id)
        .await
        .unwrap());
    assert_eq!(engine.store.list_participants(war_id).await.unwrap().len(), 1);
}

/// A leave whose delete loses to a concurrent leave reconciles to success
#[tokio::test]
async fn test_leave_lost_race_reconciles_to_success() {
    let (engine, racing) = racing_engine();
    let (war_id, _) = engine.waiting_war().await;
    let user_id = engine.join_new_user(war_id).await;

    racing.arm_rival_leave();
    assert!(engine.service.leave_war(war_id, user_id).await.unwrap());
    assert!(engine
        .store
        .list_participants(war_id)
        .await
        .unwrap()
        .is_empty());
}

/// A checkpoint that loses its guarded write to a higher concurrent
/// submission reconciles to success and never regresses the stored count
#[tokio::test]
async fn test_checkpoint_lost_race_keeps_highest_value() {
    let (engine, racing) = racing_engine();
    let (war_id, _, user_id) = engine.running_war_with_participant().await;

    // Rival lands 50 between our read (0) and our write of 40
    racing.arm_rival_words(50);
    assert!(engine.service.checkpoint(war_id, user_id, 40).await.unwrap());

    let stored = engine
        .store
        .find_participant(war_id, user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.words_in_round, 50);
}

// ============================================================================
// Ranking and scoreboard
// ============================================================================

#[tokio::test]
async fn test_final_ranking_orders_and_breaks_ties_by_join_order() {
    let engine = TestEngine::new();
    let (war_id, host) = engine.waiting_war().await;

    let first = engine.join_new_user(war_id).await;
    let second = engine.join_new_user(war_id).await;
    let third = engine.join_new_user(war_id).await;
    engine.service.start_war(war_id, host).await.unwrap();

    engine.service.checkpoint(war_id, first, 120).await.unwrap();
    engine.service.checkpoint(war_id, second, 300).await.unwrap();
    engine.service.checkpoint(war_id, third, 120).await.unwrap();

    engine.service.finish_war(war_id).await.unwrap();

    let board = engine.service.scoreboard(war_id).await.unwrap();
    assert_eq!(board.entries.len(), 3);
    assert_eq!(board.entries[0].user_id, second);
    assert_eq!(board.entries[0].rank, 1);
    assert_eq!(board.entries[1].user_id, first);
    assert_eq!(board.entries[1].rank, 2);
    assert_eq!(board.entries[2].user_id, third);
    assert_eq!(board.entries[2].rank, 3);
}

/// The snapshot is immutable once written: a refused second finish leaves it
/// untouched
#[tokio::test]
async fn test_refused_second_finish_leaves_snapshot_untouched() {
    let engine = TestEngine::new();
    let (war_id, _, user_id) = engine.running_war_with_participant().await;
    engine.service.checkpoint(war_id, user_id, 64).await.unwrap();

    engine.service.finish_war(war_id).await.unwrap();
    let first_snapshot = engine.store.list_final_ranks(war_id).await.unwrap();
    assert_eq!(engine.store.rank_snapshot_count(), 1);

    let err = engine.service.finish_war(war_id).await.unwrap_err();
    assert!(matches!(err, Error::RuleViolation(_)));

    let second_snapshot = engine.store.list_final_ranks(war_id).await.unwrap();
    assert_eq!(first_snapshot, second_snapshot);
    assert_eq!(engine.store.rank_snapshot_count(), 1);
}
