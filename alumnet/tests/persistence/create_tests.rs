use super::support::*;

#[tokio::test]
async fn created_user_round_trips_through_lookup() {
    let service = memory_service();
    let created = service
        .create_user(NewUser {
            role: Some("Engineer".into()),
            skills: vec!["Rust".into()],
            ..NewUser::new("Asha Rao", "asha@kiit.ac.in")
        })
        .await
        .unwrap();

    assert_eq!(created.id.len(), alumnet::id::ENTITY_ID_LENGTH);
    assert_eq!(created.role.as_deref(), Some("Engineer"));
    assert!(!created.is_admin);

    let fetched = service.fetch_user_by_id(&created.id).await.unwrap();
    assert_eq!(fetched, Some(created));
}

#[tokio::test]
async fn duplicate_email_is_rejected_and_original_kept() {
    let service = memory_service();
    let original = service.create_user(NewUser::new("Asha Rao", "asha@kiit.ac.in")).await.unwrap();

    let err = service
        .create_user(NewUser::new("Impostor", "asha@kiit.ac.in"))
        .await
        .unwrap_err();
    match err {
        StoreError::DuplicateKey {
            collection,
            field,
            existing_id,
            ..
        } => {
            assert_eq!(collection, "users");
            assert_eq!(field, "email");
            assert_eq!(existing_id, original.id);
        }
        other => panic!("expected duplicate key, got {other:?}"),
    }

    let users = service.fetch_users(None).await.unwrap();
    assert_eq!(users, vec![original]);
}

#[tokio::test]
async fn validation_failures_write_nothing() {
    let service = memory_service();
    let err = service.create_user(NewUser::new("", "asha@kiit.ac.in")).await.unwrap_err();
    assert!(err.is_validation());
    let err = service.create_user(NewUser::new("Asha", "asha-at-kiit")).await.unwrap_err();
    assert!(err.is_validation());
    assert!(backing_store(&service).is_empty());
}

#[tokio::test]
async fn event_requires_date_and_defaults_attendee_count() {
    let service = memory_service();
    let err = service
        .create_event(NewEvent {
            title: Some("Annual Reunion".into()),
            ..NewEvent::default()
        })
        .await
        .unwrap_err();
    match err {
        StoreError::Validation(validation) => assert!(validation.has_field("date")),
        other => panic!("expected validation error, got {other:?}"),
    }

    let event = service
        .create_event(NewEvent::new("Annual Reunion", reunion_date()))
        .await
        .unwrap();
    assert_eq!(event.attendee_count, 0);
    assert_eq!(event.date, reunion_date());
    assert_eq!(service.count::<Event>(None).await.unwrap(), 1);
}

#[tokio::test]
async fn message_status_defaults_to_unread_and_explicit_read_is_kept() {
    let service = memory_service();
    let sender = generate_entity_id();

    let unread = service
        .create_message(NewMessage::new(sender.clone(), "All Alumni"))
        .await
        .unwrap();
    assert_eq!(unread.status, MessageStatus::Unread);

    let read = service
        .create_message(NewMessage {
            status: Some(MessageStatus::Read),
            ..NewMessage::new(sender, "Asha Rao")
        })
        .await
        .unwrap();
    assert_eq!(read.status, MessageStatus::Read);

    let stored = service.fetch_message_by_id(&read.id).await.unwrap().unwrap();
    assert_eq!(stored.status, MessageStatus::Read);
}

#[tokio::test]
async fn message_sender_must_be_a_record_id() {
    let service = memory_service();
    let err = service
        .create_message(NewMessage::new("not an id", "All Alumni"))
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn community_defaults() {
    let service = memory_service();
    let members = vec![generate_entity_id(), generate_entity_id(), generate_entity_id()];
    let community = service
        .create_community(NewCommunity {
            members_list: members.clone(),
            ..NewCommunity::new("Robotics Club")
        })
        .await
        .unwrap();
    assert_eq!(community.members, 3);
    assert_eq!(community.members_list, members);

    let fetched: Option<Community> = service.fetch_community_by_id(&community.id).await.unwrap();
    assert_eq!(fetched, Some(community));
}

#[tokio::test]
async fn job_is_persisted_with_defaults() {
    let service = memory_service();
    let before = Utc::now();
    let job = service
        .create_job(NewJob {
            job_type: Some("Full-time".into()),
            requirements: vec!["Rust".into(), "SQL".into()],
            apply_url: Some("https://acme.example/careers/42".into()),
            ..NewJob::new("Backend Engineer", "Acme")
        })
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Active);
    assert_eq!(job.applications, 0);
    assert!(job.posted_date >= before);

    let jobs: Vec<Job> = service.fetch_jobs(None).await.unwrap();
    assert_eq!(jobs, vec![job]);
}

#[tokio::test]
async fn job_contact_fields_are_checked() {
    let service = memory_service();
    let err = service
        .create_job(NewJob {
            contact_email: Some("hr-at-acme".into()),
            ..NewJob::new("Backend Engineer", "Acme")
        })
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(service.count::<Job>(None).await.unwrap(), 0);
}
