use super::support::*;

#[tokio::test]
async fn filter_on_admin_flag_returns_only_matching_users() {
    let service = memory_service();
    let users = seed_users(&service).await;

    let filter = Filter::all().eq("isAdmin", false);
    let alumni = service.fetch_users(Some(&filter)).await.unwrap();
    let expected: Vec<User> = users.iter().filter(|u| !u.is_admin).cloned().collect();

    assert_eq!(alumni.len(), 3);
    assert_eq!(alumni, expected);
    assert_eq!(service.count_users(Some(&filter)).await.unwrap(), 3);
}

#[tokio::test]
async fn reads_preserve_insertion_order() {
    let service = memory_service();
    let users = seed_users(&service).await;
    let fetched = service.fetch_users(None).await.unwrap();
    let ids: Vec<&str> = fetched.iter().map(|u| u.id.as_str()).collect();
    let expected: Vec<&str> = users.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn list_fields_match_contained_values() {
    let service = memory_service();
    seed_users(&service).await;

    let rustaceans = service
        .fetch_users(Some(&Filter::all().eq("skills", "Rust")))
        .await
        .unwrap();
    let names: Vec<&str> = rustaceans.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, ["Asha Rao", "Meera Iyer"]);

    let class_of_2018_rust = Filter::all().eq("skills", "Rust").eq("graduationYear", 2018);
    assert_eq!(service.count::<User>(Some(&class_of_2018_rust)).await.unwrap(), 2);
}

#[tokio::test]
async fn null_filter_matches_missing_field() {
    let service = memory_service();
    seed_users(&service).await;
    let without_company = service
        .fetch_users(Some(&Filter::all().eq("company", serde_json::Value::Null)))
        .await
        .unwrap();
    assert_eq!(without_company.len(), 3);
}

#[tokio::test]
async fn empty_collection_reads_as_empty_list() {
    let service = memory_service();
    assert!(service.fetch_events(None).await.unwrap().is_empty());
    assert!(service.fetch_messages(Some(&Filter::all().eq("status", "Read"))).await.unwrap().is_empty());
}

#[tokio::test]
async fn community_lookup_distinguishes_missing_from_malformed() {
    let service = memory_service();
    service.create_community(NewCommunity::new("Robotics Club")).await.unwrap();

    let missing = service.fetch_community_by_id(&generate_entity_id()).await.unwrap();
    assert!(missing.is_none());

    let err = service.fetch_community_by_id("not-a-valid-id!").await.unwrap_err();
    match err {
        StoreError::InvalidId { collection, id } => {
            assert_eq!(collection, "communities");
            assert_eq!(id, "not-a-valid-id!");
        }
        other => panic!("expected invalid id, got {other:?}"),
    }
}

#[tokio::test]
async fn snapshots_are_detached_from_the_store() {
    let service = memory_service();
    let users = seed_users(&service).await;

    let mut snapshot = service.fetch_user_by_id(&users[0].id).await.unwrap().unwrap();
    snapshot.name = "Changed locally".into();

    let fresh = service.fetch_user_by_id(&users[0].id).await.unwrap().unwrap();
    assert_eq!(fresh.name, "Asha Rao");
}

#[tokio::test]
async fn messages_filter_by_status() {
    let service = memory_service();
    let sender = generate_entity_id();
    for (recipient, status) in [("A", None), ("B", Some(MessageStatus::Read)), ("C", None)] {
        service
            .create_message(NewMessage {
                status,
                ..NewMessage::new(sender.clone(), recipient)
            })
            .await
            .unwrap();
    }
    let unread = service
        .fetch_messages(Some(&Filter::all().eq("status", "Unread")))
        .await
        .unwrap();
    let recipients: Vec<&str> = unread.iter().map(|m: &Message| m.recipient.as_str()).collect();
    assert_eq!(recipients, ["A", "C"]);
}
