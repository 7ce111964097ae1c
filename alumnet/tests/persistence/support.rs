pub(crate) use alumnet::{
    Community, Event, Filter, Job, JobStatus, MemoryConnector, MemoryStore, Message, MessageStatus, NewCommunity,
    NewEvent, NewJob, NewMessage, NewUser, PersistenceService, StoreError, User, id::generate_entity_id,
};
pub(crate) use chrono::{DateTime, TimeZone, Utc};
pub(crate) use std::time::Duration;

pub(crate) type MemoryService = PersistenceService<MemoryConnector>;

pub(crate) fn memory_service() -> MemoryService {
    PersistenceService::new(MemoryConnector::default())
}

/// Backing store of a service built by [`memory_service`].
pub(crate) fn backing_store(service: &MemoryService) -> &MemoryStore {
    service.connections().connector().store()
}

pub(crate) fn reunion_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 12, 20, 18, 0, 0).unwrap()
}

/// Three alumni and one admin, created in this order.
pub(crate) async fn seed_users(service: &MemoryService) -> Vec<User> {
    let drafts = [
        NewUser {
            graduation_year: Some(2018),
            skills: vec!["Rust".into(), "Go".into()],
            company: Some("Acme".into()),
            ..NewUser::new("Asha Rao", "asha@kiit.ac.in")
        },
        NewUser {
            graduation_year: Some(2019),
            skills: vec!["Python".into()],
            ..NewUser::new("Ravi Kumar", "ravi@kiit.ac.in")
        },
        NewUser {
            is_admin: Some(true),
            ..NewUser::new("Office Admin", "admin@kiit.ac.in")
        },
        NewUser {
            graduation_year: Some(2018),
            skills: vec!["Rust".into()],
            ..NewUser::new("Meera Iyer", "meera@kiit.ac.in")
        },
    ];
    let mut users = Vec::new();
    for draft in drafts {
        users.push(service.create_user(draft).await.expect("seed user"));
    }
    users
}
