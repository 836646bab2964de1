#![cfg(feature = "live-db-tests")]

//! End-to-end flows over HTTP against a served router.

mod helpers;

use barter_backend::client::{ApiClient, ClientError};
use barter_backend::models::*;
use barter_backend::workflow::{BarterKind, BarterStatus, Party, SessionStatus, TrackingStep};
use chrono::{NaiveDate, NaiveTime};
use helpers::*;
use sqlx::PgPool;
use uuid::Uuid;

async fn find_item(client: &ApiClient, owner: Uuid, item_id: Uuid) -> Item {
    client
        .items(&ListingFilter {
            user_id: Some(owner),
            ..Default::default()
        })
        .await
        .unwrap()
        .into_iter()
        .find(|item| item.id == item_id)
        .expect("item listing")
}

// ============================================================================
// Accounts
// ============================================================================

#[sqlx::test]
async fn test_register_login_logout(pool: PgPool) {
    let app = TestApp::spawn(pool).await;
    let (client, user) = app.register("maria_k").await;
    assert_eq!(user.points, 100);

    let me = client.me().await.unwrap();
    assert_eq!(me.id, user.id);

    // duplicate username
    let mut again = app.client();
    let err = again
        .register(&RegisterRequest {
            username: "maria_k".to_string(),
            email: "other@example.org".to_string(),
            password: TEST_PASSWORD.to_string(),
            display_name: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(409));

    let mut second = app.client();
    let err = second.login("maria_k", "not the password").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    second.login("maria_k@example.org", TEST_PASSWORD).await.unwrap();

    let revoked = client.token().unwrap().to_string();
    let mut client = client;
    client.logout().await.unwrap();
    assert!(client.token().is_none());

    let err = app.client().with_token(revoked).me().await.unwrap_err();
    assert_eq!(err.status(), Some(401));

    // other sessions of the same account survive
    assert_eq!(second.me().await.unwrap().id, user.id);
}

#[sqlx::test]
async fn test_requests_without_token_are_unauthorized(pool: PgPool) {
    let app = TestApp::spawn(pool).await;
    let err = app.client().me().await.unwrap_err();
    assert!(matches!(err, ClientError::MissingToken));

    let err = app
        .client()
        .with_token("not-a-real-token")
        .me()
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));
}

#[sqlx::test]
async fn test_profile_update_and_public_view(pool: PgPool) {
    let app = TestApp::spawn(pool).await;
    let (alice, alice_user) = app.register("alice").await;
    let (bob, _) = app.register("bob").await;

    alice
        .update_profile(&ProfileUpdate {
            display_name: Some("Alice W.".to_string()),
            bio: Some("Bakes bread, fixes bikes".to_string()),
            location: Some("Leeds".to_string()),
        })
        .await
        .unwrap();

    let profile = bob.profile(alice_user.id).await.unwrap();
    assert_eq!(profile.display_name.as_deref(), Some("Alice W."));
    assert_eq!(profile.location.as_deref(), Some("Leeds"));
}

// ============================================================================
// Item exchange
// ============================================================================

#[sqlx::test]
async fn test_item_exchange_lifecycle(pool: PgPool) {
    let app = TestApp::spawn(pool).await;
    let (alice, _) = app.register("alice").await;
    let (bob, bob_user) = app.register("bob").await;

    let drill = bob.create_item(&new_item("Cordless drill", "tools")).await.unwrap();
    let tent = alice.create_item(&new_item("Camping tent", "outdoors")).await.unwrap();

    let request = alice
        .create_request(&NewBarterRequest {
            request_type: BarterKind::Item,
            to_user_id: bob_user.id,
            from_skill_id: None,
            to_skill_id: None,
            from_item_id: Some(tent.id),
            to_item_id: Some(drill.id),
            message: Some("Weekend project".to_string()),
            barter_period: Some("1 week".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(request.status, "pending");

    // the requester cannot accept their own request
    let err = alice
        .update_status(request.id, BarterStatus::Accepted)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));

    let request = bob
        .update_status(request.id, BarterStatus::Accepted)
        .await
        .unwrap();
    assert_eq!(request.status, "accepted");

    // lent out
    assert!(!find_item(&bob, bob_user.id, drill.id).await.is_available);

    // item status moves only through tracking
    let err = bob
        .update_status(request.id, BarterStatus::Shipped)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));

    let view = alice.create_tracking(request.id).await.unwrap();
    assert_eq!(view.next_step, Some(TrackingStep::ItemPacked));
    assert!(view.steps.iter().all(|s| !s.completed && !s.can_update));
    let tracking_id = view.record.id;

    let err = alice.create_tracking(request.id).await.unwrap_err();
    assert_eq!(err.status(), Some(409));

    // the borrower cannot pack the owner's item
    let err = alice
        .complete_step(tracking_id, TrackingStep::ItemPacked)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));

    let view = bob
        .complete_step(tracking_id, TrackingStep::ItemPacked)
        .await
        .unwrap();
    assert!(view.steps[0].completed);
    assert!(view.steps[1].can_update);

    let err = bob
        .complete_step(tracking_id, TrackingStep::ItemPacked)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(409));

    for step in TrackingStep::ALL.into_iter().skip(1) {
        let client = match step.actor() {
            Party::Recipient => &bob,
            Party::Requester => &alice,
        };
        client.complete_step(tracking_id, step).await.unwrap();

        let status = alice.request_by_id(request.id).await.unwrap().status;
        let expected = match step {
            TrackingStep::PackageSent | TrackingStep::PackageDelivered => "shipped",
            TrackingStep::ExchangeCompleted => "completed",
            _ => "ongoing",
        };
        assert_eq!(status, expected, "after {}", step.as_str());
    }

    let view = alice.tracking(request.id).await.unwrap();
    assert!(view.next_step.is_none());

    // back on the shelf
    let drill_again = find_item(&alice, bob_user.id, drill.id).await;
    assert!(drill_again.is_available);

    let activity = bob.activity().await.unwrap();
    assert_eq!(activity.len(), 1);
    assert_eq!(activity[0].role, Party::Recipient);
    assert!(activity[0].available_statuses.is_empty());
}

fn item_request(to_user_id: Uuid, to_item_id: Uuid) -> NewBarterRequest {
    NewBarterRequest {
        request_type: BarterKind::Item,
        to_user_id,
        from_skill_id: None,
        to_skill_id: None,
        from_item_id: None,
        to_item_id: Some(to_item_id),
        message: None,
        barter_period: Some("2 weeks".to_string()),
    }
}

#[sqlx::test]
async fn test_item_is_lent_to_one_borrower_at_a_time(pool: PgPool) {
    let app = TestApp::spawn(pool).await;
    let (alice, _) = app.register("alice").await;
    let (carol, _) = app.register("carol").await;
    let (bob, bob_user) = app.register("bob").await;

    let drill = bob.create_item(&new_item("Cordless drill", "tools")).await.unwrap();
    let first = alice
        .create_request(&item_request(bob_user.id, drill.id))
        .await
        .unwrap();
    let second = carol
        .create_request(&item_request(bob_user.id, drill.id))
        .await
        .unwrap();

    bob.update_status(first.id, BarterStatus::Accepted).await.unwrap();

    let err = bob
        .update_status(second.id, BarterStatus::Accepted)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(409));
    assert_eq!(carol.request_by_id(second.id).await.unwrap().status, "pending");

    // no new requests while it is out
    let (dave, _) = app.register("dave").await;
    let err = dave
        .create_request(&item_request(bob_user.id, drill.id))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(409));

    // the waiting request can still be declined
    let declined = bob
        .update_status(second.id, BarterStatus::Declined)
        .await
        .unwrap();
    assert_eq!(declined.status, "declined");
    assert!(!find_item(&bob, bob_user.id, drill.id).await.is_available);
}

#[sqlx::test]
async fn test_listings_in_open_exchanges_cannot_be_deleted(pool: PgPool) {
    let app = TestApp::spawn(pool).await;
    let (alice, _) = app.register("alice").await;
    let (bob, bob_user) = app.register("bob").await;

    let drill = bob.create_item(&new_item("Cordless drill", "tools")).await.unwrap();
    let tent = alice.create_item(&new_item("Camping tent", "outdoors")).await.unwrap();
    let guitar = bob.create_skill(&new_skill("Guitar basics", "music")).await.unwrap();

    let mut request = item_request(bob_user.id, drill.id);
    request.from_item_id = Some(tent.id);
    let request = alice.create_request(&request).await.unwrap();
    bob.update_status(request.id, BarterStatus::Accepted).await.unwrap();

    // both sides of the accepted exchange stay put
    assert_eq!(bob.delete_item(drill.id).await.unwrap_err().status(), Some(409));
    assert_eq!(alice.delete_item(tent.id).await.unwrap_err().status(), Some(409));

    let lesson = alice
        .create_request(&NewBarterRequest {
            request_type: BarterKind::Skill,
            to_user_id: bob_user.id,
            from_skill_id: None,
            to_skill_id: Some(guitar.id),
            from_item_id: None,
            to_item_id: None,
            message: None,
            barter_period: None,
        })
        .await
        .unwrap();
    assert_eq!(bob.delete_skill(guitar.id).await.unwrap_err().status(), Some(409));

    // once the request ends the listing can go
    alice
        .update_status(lesson.id, BarterStatus::Cancelled)
        .await
        .unwrap();
    bob.delete_skill(guitar.id).await.unwrap();

    let unrelated = bob.create_item(&new_item("Ladder", "tools")).await.unwrap();
    bob.delete_item(unrelated.id).await.unwrap();
}

#[sqlx::test]
async fn test_outsiders_cannot_see_requests(pool: PgPool) {
    let app = TestApp::spawn(pool).await;
    let (alice, _) = app.register("alice").await;
    let (bob, bob_user) = app.register("bob").await;
    let (mallory, _) = app.register("mallory").await;

    let skill = bob.create_skill(&new_skill("Guitar basics", "music")).await.unwrap();
    let request = alice
        .create_request(&NewBarterRequest {
            request_type: BarterKind::Skill,
            to_user_id: bob_user.id,
            from_skill_id: None,
            to_skill_id: Some(skill.id),
            from_item_id: None,
            to_item_id: None,
            message: None,
            barter_period: None,
        })
        .await
        .unwrap();

    assert_eq!(
        mallory.request_by_id(request.id).await.unwrap_err().status(),
        Some(403)
    );
    assert_eq!(mallory.messages(request.id).await.unwrap_err().status(), Some(403));
    assert_eq!(
        mallory
            .post_message(request.id, "hello")
            .await
            .unwrap_err()
            .status(),
        Some(403)
    );

    let lists = bob.requests(Some(RequestDirection::Incoming)).await.unwrap();
    assert_eq!(lists.incoming.len(), 1);
    assert!(lists.outgoing.is_empty());

    // second pending request for the same skill
    let err = alice
        .create_request(&NewBarterRequest {
            request_type: BarterKind::Skill,
            to_user_id: bob_user.id,
            from_skill_id: None,
            to_skill_id: Some(skill.id),
            from_item_id: None,
            to_item_id: None,
            message: None,
            barter_period: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(409));
}

// ============================================================================
// Skill exchange
// ============================================================================

#[sqlx::test]
async fn test_skill_sessions(pool: PgPool) {
    let app = TestApp::spawn(pool).await;
    let (alice, alice_user) = app.register("alice").await;
    let (bob, bob_user) = app.register("bob").await;

    let skill = bob.create_skill(&new_skill("Guitar basics", "music")).await.unwrap();
    let request = alice
        .create_request(&NewBarterRequest {
            request_type: BarterKind::Skill,
            to_user_id: bob_user.id,
            from_skill_id: None,
            to_skill_id: Some(skill.id),
            from_item_id: None,
            to_item_id: None,
            message: None,
            barter_period: None,
        })
        .await
        .unwrap();

    let new_session = NewSession {
        barter_request_id: request.id,
        scheduled_date: NaiveDate::from_ymd_opt(2026, 11, 7).unwrap(),
        scheduled_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        duration_minutes: 90,
        notes: Some("Bring a capo".to_string()),
    };

    // not accepted yet
    assert_eq!(
        alice.create_session(&new_session).await.unwrap_err().status(),
        Some(409)
    );
    bob.update_status(request.id, BarterStatus::Accepted).await.unwrap();

    let session = alice.create_session(&new_session).await.unwrap();
    assert_eq!(session.created_by, alice_user.id);

    // the creator does not confirm their own session
    assert_eq!(
        alice.confirm_session(session.id).await.unwrap_err().status(),
        Some(403)
    );
    let session = bob.confirm_session(session.id).await.unwrap();
    assert_eq!(session.status_enum(), SessionStatus::Confirmed);
    assert_eq!(alice.request_by_id(request.id).await.unwrap().status, "ongoing");

    let later = NaiveDate::from_ymd_opt(2026, 11, 14).unwrap();
    let session = bob
        .request_reschedule(
            session.id,
            &RescheduleRequest {
                new_date: later,
                new_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
                reason: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(session.reschedule_requested_by, Some(bob_user.id));

    assert_eq!(
        bob.respond_reschedule(session.id, true).await.unwrap_err().status(),
        Some(403)
    );
    let session = alice.respond_reschedule(session.id, true).await.unwrap();
    assert_eq!(session.scheduled_date, later);
    assert_eq!(session.status_enum(), SessionStatus::Scheduled);

    let session = bob.confirm_session(session.id).await.unwrap();
    let session = alice.complete_session(session.id).await.unwrap();
    assert_eq!(session.status_enum(), SessionStatus::Completed);

    let request = alice
        .update_status(request.id, BarterStatus::Completed)
        .await
        .unwrap();
    assert_eq!(request.status, "completed");

    let sessions = bob.sessions(request.id).await.unwrap();
    assert_eq!(sessions.len(), 1);
}

#[sqlx::test]
async fn test_tracking_is_for_item_exchanges_only(pool: PgPool) {
    let app = TestApp::spawn(pool).await;
    let (alice, _) = app.register("alice").await;
    let (bob, bob_user) = app.register("bob").await;

    let skill = bob.create_skill(&new_skill("Knife sharpening", "cooking")).await.unwrap();
    let request = alice
        .create_request(&NewBarterRequest {
            request_type: BarterKind::Skill,
            to_user_id: bob_user.id,
            from_skill_id: None,
            to_skill_id: Some(skill.id),
            from_item_id: None,
            to_item_id: None,
            message: None,
            barter_period: None,
        })
        .await
        .unwrap();
    bob.update_status(request.id, BarterStatus::Accepted).await.unwrap();

    assert_eq!(
        alice.create_tracking(request.id).await.unwrap_err().status(),
        Some(409)
    );
}

// ============================================================================
// Polls and messages
// ============================================================================

#[sqlx::test]
async fn test_poll_economy(pool: PgPool) {
    let app = TestApp::spawn(pool).await;
    let (alice, _) = app.register("alice").await;
    let (bob, _) = app.register("bob").await;

    let poll = alice
        .create_poll(&NewPoll {
            question: "Which workshop next?".to_string(),
            options: vec!["Bread".to_string(), "Bikes".to_string(), "Knitting".to_string()],
        })
        .await
        .unwrap();
    assert_eq!(poll.votes, vec![0, 0, 0]);
    assert_eq!(alice.me().await.unwrap().points, 95);

    assert_eq!(alice.vote(poll.id, 0).await.unwrap_err().status(), Some(403));
    assert_eq!(bob.vote(poll.id, 7).await.unwrap_err().status(), Some(400));

    let view = bob.vote(poll.id, 1).await.unwrap();
    assert_eq!(view.votes, vec![0, 1, 0]);
    assert_eq!(view.total_votes, 1);
    assert_eq!(view.user_vote, Some(1));
    assert_eq!(bob.me().await.unwrap().points, 101);

    assert_eq!(bob.vote(poll.id, 2).await.unwrap_err().status(), Some(409));

    let polls = alice.polls().await.unwrap();
    assert_eq!(polls.len(), 1);
    assert!(!polls[0].user_voted);
    assert_eq!(polls[0].total_votes, polls[0].votes.iter().sum::<i64>());
}

#[sqlx::test]
async fn test_message_history(pool: PgPool) {
    let app = TestApp::spawn(pool).await;
    let (alice, _) = app.register("alice").await;
    let (bob, bob_user) = app.register("bob").await;

    let item = bob.create_item(&new_item("Sewing machine", "crafts")).await.unwrap();
    let request = alice
        .create_request(&NewBarterRequest {
            request_type: BarterKind::Item,
            to_user_id: bob_user.id,
            from_skill_id: None,
            to_skill_id: None,
            from_item_id: None,
            to_item_id: Some(item.id),
            message: None,
            barter_period: None,
        })
        .await
        .unwrap();

    alice.post_message(request.id, "Is it still free?").await.unwrap();
    bob.post_message(request.id, "Yes, from Monday").await.unwrap();
    assert_eq!(
        bob.post_message(request.id, "   ").await.unwrap_err().status(),
        Some(400)
    );

    let history = alice.messages(request.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "Is it still free?");
    assert_eq!(history[1].sender_id, bob_user.id);
}
