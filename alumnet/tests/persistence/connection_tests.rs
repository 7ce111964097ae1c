use alumnet::ReconnectPolicy;
use std::sync::Arc;

use super::support::*;

#[tokio::test]
async fn concurrent_first_calls_share_one_attempt() {
    let connector = MemoryConnector::default().with_latency(Duration::from_millis(25));
    let service = PersistenceService::new(connector);

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .create_user(NewUser::new(format!("User {i}"), format!("user{i}@kiit.ac.in")))
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(service.connections().connector().attempts(), 1);
    assert_eq!(service.connections().attempts(), 1);
    assert_eq!(service.count::<User>(None).await.unwrap(), 16);
}

#[tokio::test]
async fn failed_attempt_is_cleared_and_retried() {
    let connector = MemoryConnector::default().with_latency(Duration::from_millis(10));
    connector.fail_next(1);
    let service = PersistenceService::new(connector);

    let (first, second) = tokio::join!(service.fetch_users(None), service.fetch_events(None));
    assert!(first.unwrap_err().is_connection());
    assert!(second.unwrap_err().is_connection());
    assert_eq!(service.connections().connector().attempts(), 1);

    assert!(service.fetch_users(None).await.unwrap().is_empty());
    assert_eq!(service.connections().connector().attempts(), 2);
}

#[tokio::test]
async fn connection_errors_are_distinguishable() {
    let connector = MemoryConnector::default();
    connector.fail_next(1);
    let service = PersistenceService::new(connector);
    let err = service
        .create_user(NewUser::new("Asha Rao", "asha@kiit.ac.in"))
        .await
        .unwrap_err();
    assert!(err.is_connection());
    assert!(!err.is_validation());
    assert!(!err.is_duplicate_key());
}

#[tokio::test(start_paused = true)]
async fn backoff_window_refuses_without_new_attempts() {
    let connector = MemoryConnector::default();
    connector.fail_next(1);
    let policy = ReconnectPolicy::exponential(Duration::from_millis(500), Duration::from_secs(5));
    let service = PersistenceService::with_manager(Arc::new(alumnet::ConnectionManager::with_policy(connector, policy)));

    assert!(service.fetch_jobs(None).await.unwrap_err().is_connection());
    assert!(service.fetch_jobs(None).await.unwrap_err().is_connection());
    assert_eq!(service.connections().connector().attempts(), 1);

    tokio::time::advance(Duration::from_millis(600)).await;
    assert!(service.fetch_jobs(None).await.unwrap().is_empty());
    assert_eq!(service.connections().connector().attempts(), 2);
}

#[tokio::test]
async fn services_sharing_a_store_see_each_others_writes() {
    let store = MemoryStore::new();
    let writer = PersistenceService::new(MemoryConnector::new(store.clone()));
    let reader = PersistenceService::new(MemoryConnector::new(store));

    let user = writer.create_user(NewUser::new("Asha Rao", "asha@kiit.ac.in")).await.unwrap();
    assert_eq!(reader.fetch_user_by_id(&user.id).await.unwrap(), Some(user));
}
