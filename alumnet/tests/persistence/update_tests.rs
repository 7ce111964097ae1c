use alumnet::{CommunityPatch, EventPatch, JobPatch, UserPatch};

use super::support::*;

#[tokio::test]
async fn user_update_round_trips() {
    let service = memory_service();
    let users = seed_users(&service).await;

    let updated = service
        .update_user(
            &users[1].id,
            UserPatch {
                company: Some(Some("Globex".into())),
                ..UserPatch::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.company.as_deref(), Some("Globex"));
    assert_eq!(updated.created_at, users[1].created_at);

    let fetched = service.fetch_user_by_id(&users[1].id).await.unwrap();
    assert_eq!(fetched, Some(updated));
}

#[tokio::test]
async fn cleared_fields_are_dropped_from_stored_document() {
    let service = memory_service();
    let users = seed_users(&service).await;
    assert_eq!(service.count::<User>(Some(&Filter::all().eq("company", "Acme"))).await.unwrap(), 1);

    let patch: UserPatch = serde_json::from_value(serde_json::json!({ "company": null })).unwrap();
    let updated = service.update_user(&users[0].id, patch).await.unwrap().unwrap();
    assert!(updated.company.is_none());
    assert_eq!(updated.skills, users[0].skills);

    let stored = service.fetch_user_by_id(&users[0].id).await.unwrap().unwrap();
    assert!(stored.company.is_none());
    assert_eq!(service.count::<User>(Some(&Filter::all().eq("company", "Acme"))).await.unwrap(), 0);
}

#[tokio::test]
async fn email_change_respects_uniqueness() {
    let service = memory_service();
    let users = seed_users(&service).await;

    let err = service
        .update_user(
            &users[1].id,
            UserPatch {
                email: Some(users[0].email.clone()),
                ..UserPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_duplicate_key());
    let unchanged = service.fetch_user_by_id(&users[1].id).await.unwrap().unwrap();
    assert_eq!(unchanged.email, users[1].email);

    // moving to a fresh address frees the old one
    service
        .update_user(
            &users[1].id,
            UserPatch {
                email: Some("ravi.kumar@alumni.kiit.ac.in".into()),
                ..UserPatch::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    service
        .create_user(NewUser::new("Ravi Two", users[1].email.clone()))
        .await
        .unwrap();
}

#[tokio::test]
async fn update_of_missing_record_is_none() {
    let service = memory_service();
    let outcome = service
        .update_event(&generate_entity_id(), EventPatch::default())
        .await
        .unwrap();
    assert!(outcome.is_none());
    assert!(service.update_job("bad", JobPatch::default()).await.unwrap_err().is_invalid_id());
}

#[tokio::test]
async fn invalid_patch_leaves_record_untouched() {
    let service = memory_service();
    let event = service
        .create_event(NewEvent::new("Annual Reunion", reunion_date()))
        .await
        .unwrap();
    let err = service
        .update_event(
            &event.id,
            EventPatch {
                attendee_count: Some(-5),
                ..EventPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(service.fetch_event_by_id(&event.id).await.unwrap(), Some(event));
}

#[tokio::test]
async fn delete_releases_email() {
    let service = memory_service();
    let users = seed_users(&service).await;

    assert!(service.delete_user(&users[0].id).await.unwrap());
    assert!(!service.delete_user(&users[0].id).await.unwrap());
    assert!(service.fetch_user_by_id(&users[0].id).await.unwrap().is_none());
    assert_eq!(service.count::<User>(None).await.unwrap(), 3);

    service
        .create_user(NewUser::new("Asha Again", users[0].email.clone()))
        .await
        .unwrap();
}

#[tokio::test]
async fn deleted_records_leave_order_of_the_rest() {
    let service = memory_service();
    let users = seed_users(&service).await;
    service.delete_user(&users[1].id).await.unwrap();
    let names: Vec<String> = service
        .fetch_users(None)
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.name)
        .collect();
    assert_eq!(names, ["Asha Rao", "Office Admin", "Meera Iyer"]);
}

#[tokio::test]
async fn message_status_can_be_toggled() {
    let service = memory_service();
    let message = service
        .create_message(NewMessage::new(generate_entity_id(), "Career Office"))
        .await
        .unwrap();

    let read = service
        .update_message_status(&message.id, MessageStatus::Read)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(read.status, MessageStatus::Read);
    assert_eq!(read.date, message.date);

    let unread = service
        .update_message_status(&message.id, MessageStatus::Unread)
        .await
        .unwrap()
        .unwrap();
    assert!(unread.is_unread());
}

#[tokio::test]
async fn community_membership_updates() {
    let service = memory_service();
    let community = service.create_community(NewCommunity::new("Robotics Club")).await.unwrap();
    let member = generate_entity_id();

    let joined = service
        .update_community(
            &community.id,
            CommunityPatch {
                add_members: vec![member.clone()],
                ..CommunityPatch::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(joined.members, 1);

    let members = service
        .fetch_communities(Some(&Filter::all().eq("membersList", member.as_str())))
        .await
        .unwrap();
    assert_eq!(members.len(), 1);
}

#[tokio::test]
async fn job_can_be_closed_and_deleted() {
    let service = memory_service();
    let job = service.create_job(NewJob::new("Backend Engineer", "Acme")).await.unwrap();
    let closed = service
        .update_job(
            &job.id,
            JobPatch {
                status: Some(JobStatus::Closed),
                ..JobPatch::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert!(!closed.is_open());
    assert_eq!(
        service.count::<Job>(Some(&Filter::all().eq("status", "Active"))).await.unwrap(),
        0
    );
    assert!(service.delete_job(&job.id).await.unwrap());
}
