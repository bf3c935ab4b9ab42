//! Integration tests for the profile and forum reads used by the summary
//! aggregator.

use chrono::{Duration, Utc};
use herald_core::job_fair::JobFairStatus;
use herald_db::models::job_fair::CreateJobFair;
use herald_db::models::user::{CreateUser, UpdatePreferences};
use herald_db::repositories::{ChatRepo, CommunityRepo, JobFairRepo, UserRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_user(pool: &PgPool, username: &str, display_name: Option<&str>) {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            display_name: display_name.map(str::to_string),
        },
    )
    .await
    .unwrap();
}

// ---------------------------------------------------------------------------
// Test: preferences default and partial update
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_preferences_default_and_partial_update(pool: PgPool) {
    seed_user(&pool, "bob", None).await;
    let profile = UserRepo::find_by_username(&pool, "bob").await.unwrap().unwrap();
    let prefs = profile.preferences();
    assert!(prefs.enabled);
    assert!(!prefs.summarized);
    assert_eq!(prefs.summary_time, "09:00");

    let update = UpdatePreferences {
        summarized: Some(true),
        summary_time: Some("18:30".into()),
        ..Default::default()
    };
    let updated = UserRepo::update_preferences(&pool, "bob", &update)
        .await
        .unwrap()
        .unwrap();
    let prefs = updated.preferences();
    assert!(prefs.enabled, "untouched fields keep their value");
    assert!(prefs.summarized);
    assert_eq!(prefs.summary_time, "18:30");

    let missing = UserRepo::update_preferences(&pool, "nobody", &update).await.unwrap();
    assert!(missing.is_none());
}

// ---------------------------------------------------------------------------
// Test: digest subscribers exclude disabled and deleted users
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_list_digest_subscribers(pool: PgPool) {
    for name in ["alice", "bob", "carol", "dave"] {
        seed_user(&pool, name, None).await;
    }
    let digest = UpdatePreferences {
        summarized: Some(true),
        ..Default::default()
    };
    for name in ["alice", "bob", "carol"] {
        UserRepo::update_preferences(&pool, name, &digest).await.unwrap();
    }
    let off = UpdatePreferences {
        enabled: Some(false),
        ..Default::default()
    };
    UserRepo::update_preferences(&pool, "bob", &off).await.unwrap();
    assert!(UserRepo::soft_delete(&pool, "carol").await.unwrap());
    assert!(!UserRepo::soft_delete(&pool, "carol").await.unwrap());

    let subs = UserRepo::list_digest_subscribers(&pool).await.unwrap();
    let names: Vec<_> = subs.iter().map(|s| s.username.as_str()).collect();
    assert_eq!(names, vec!["alice"]);
}

// ---------------------------------------------------------------------------
// Test: chats are seen from the caller's side
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_chat_peers_and_message_window(pool: PgPool) {
    seed_user(&pool, "alice", Some("Alice A.")).await;
    seed_user(&pool, "bob", None).await;
    let chat = ChatRepo::create(&pool, "alice", "bob").await.unwrap();

    let t = Utc::now() - Duration::hours(2);
    ChatRepo::insert_message(&pool, chat, "alice", "before", t - Duration::seconds(1))
        .await
        .unwrap();
    ChatRepo::insert_message(&pool, chat, "alice", "at", t).await.unwrap();
    ChatRepo::insert_message(&pool, chat, "alice", "after", t + Duration::seconds(1))
        .await
        .unwrap();
    ChatRepo::insert_message(&pool, chat, "bob", "own", t + Duration::seconds(2))
        .await
        .unwrap();

    let peers = ChatRepo::list_for_participant(&pool, "bob").await.unwrap();
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].other_username, "alice");
    assert_eq!(peers[0].other_display_name, "Alice A.");
    assert!(!peers[0].other_deleted);

    let count = ChatRepo::count_messages_since(&pool, chat, "bob", t, Utc::now())
        .await
        .unwrap();
    assert_eq!(count, 1, "only alice's message strictly after t counts");

    UserRepo::soft_delete(&pool, "alice").await.unwrap();
    let peers = ChatRepo::list_for_participant(&pool, "bob").await.unwrap();
    assert!(peers[0].other_deleted);
    assert_eq!(peers[0].other_display_name, "Alice A.");
}

// ---------------------------------------------------------------------------
// Test: job fairs and community questions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_job_fairs_and_questions(pool: PgPool) {
    seed_user(&pool, "bob", None).await;
    let now = Utc::now();
    let fair = JobFairRepo::create(
        &pool,
        &CreateJobFair {
            name: "Spring Fair".into(),
            status: JobFairStatus::Upcoming,
            starts_at: now + Duration::hours(3),
            ends_at: now + Duration::hours(9),
        },
    )
    .await
    .unwrap();
    JobFairRepo::create(
        &pool,
        &CreateJobFair {
            name: "Other Fair".into(),
            status: JobFairStatus::Ended,
            starts_at: now - Duration::hours(9),
            ends_at: now - Duration::hours(3),
        },
    )
    .await
    .unwrap();
    JobFairRepo::add_participant(&pool, fair.id, "bob").await.unwrap();
    JobFairRepo::add_participant(&pool, fair.id, "bob").await.unwrap();

    let fairs = JobFairRepo::list_for_participant(&pool, "bob").await.unwrap();
    assert_eq!(fairs.len(), 1);
    assert_eq!(fairs[0].status, JobFairStatus::Upcoming);

    let rust = CommunityRepo::create(&pool, "Rust Fans").await.unwrap();
    CommunityRepo::create(&pool, "Go Fans").await.unwrap();
    let since = now - Duration::hours(1);
    CommunityRepo::insert_question(&pool, rust.id, "Lifetimes?", "alice", now)
        .await
        .unwrap();
    CommunityRepo::insert_question(&pool, rust.id, "Mine", "bob", now)
        .await
        .unwrap();

    let names: Vec<_> = CommunityRepo::list_all(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Go Fans", "Rust Fans"]);

    let questions = CommunityRepo::questions_since(&pool, rust.id, "bob", since, now)
        .await
        .unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].asked_by, "alice");
}
