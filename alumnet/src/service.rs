//! Persistence service: the entry point used by the UI layer and the CLI.
//!
//! Every operation follows the same shape: ensure the shared connection,
//! run one repository call against it, return a detached snapshot. Failures
//! are logged with context and returned unchanged.
//!
//! ```ignore
//! let service = PersistenceService::from_config(&StoreConfig::load(None)?);
//! let user = service.create_user(NewUser::new("Asha", "asha@kiit.ac.in")).await?;
//! let admins = service.fetch_users(Some(&Filter::all().eq("isAdmin", true))).await?;
//! ```

use std::sync::Arc;

use log::{debug, error};

use crate::{
    config::StoreConfig,
    connection::ConnectionManager,
    errors::StoreError,
    filter::Filter,
    models::{
        Community, CommunityPatch, Draft, Entity, Event, EventPatch, Job, JobPatch, Message, MessagePatch,
        MessageStatus, NewCommunity, NewEvent, NewJob, NewMessage, NewUser, Patch, User, UserPatch,
    },
    repository::Repo,
    store::{Connector, RedisConnector, RedisStore},
};

pub struct PersistenceService<C: Connector> {
    connections: Arc<ConnectionManager<C>>,
}

impl<C: Connector> Clone for PersistenceService<C> {
    fn clone(&self) -> Self {
        Self {
            connections: Arc::clone(&self.connections),
        }
    }
}

impl PersistenceService<RedisConnector> {
    pub fn from_config(config: &StoreConfig) -> Self {
        let connector = RedisConnector::from_config(config);
        Self::with_manager(Arc::new(ConnectionManager::with_policy(connector, config.reconnect.clone())))
    }

    /// Connects and round-trips a `PING`.
    pub async fn ping(&self) -> Result<RedisStore, StoreError> {
        let store = self.connect().await?;
        store.ping().await.inspect_err(|err| error!("store ping failed: {err}"))?;
        Ok(store)
    }
}

impl<C: Connector> PersistenceService<C> {
    pub fn new(connector: C) -> Self {
        Self::with_manager(Arc::new(ConnectionManager::new(connector)))
    }

    pub fn with_manager(connections: Arc<ConnectionManager<C>>) -> Self {
        Self { connections }
    }

    pub fn connections(&self) -> &ConnectionManager<C> {
        &self.connections
    }

    /// Returns the shared handle, establishing it on first use.
    pub async fn connect(&self) -> Result<C::Handle, StoreError> {
        self.connections.connect().await
    }

    pub async fn find<T: Entity>(&self, filter: Option<&Filter>) -> Result<Vec<T>, StoreError> {
        let store = self.connect().await?;
        let records = Repo::<T>::new()
            .find(&store, filter)
            .await
            .map_err(|err| self.report(err, format_args!("error fetching {} records", T::LABEL)))?;
        debug!("fetched {} {} record(s)", records.len(), T::LABEL);
        Ok(records)
    }

    pub async fn find_by_id<T: Entity>(&self, id: &str) -> Result<Option<T>, StoreError> {
        let store = self.connect().await?;
        Repo::<T>::new()
            .find_by_id(&store, id)
            .await
            .map_err(|err| self.report(err, format_args!("error fetching {} {id}", T::LABEL)))
    }

    pub async fn count<T: Entity>(&self, filter: Option<&Filter>) -> Result<u64, StoreError> {
        let store = self.connect().await?;
        Repo::<T>::new()
            .count(&store, filter)
            .await
            .map_err(|err| self.report(err, format_args!("error counting {} records", T::LABEL)))
    }

    pub async fn create<D: Draft>(&self, draft: D) -> Result<D::Entity, StoreError> {
        let store = self.connect().await?;
        let created = Repo::<D::Entity>::new()
            .create(&store, draft)
            .await
            .map_err(|err| self.report(err, format_args!("error creating {}", <D::Entity as Entity>::LABEL)))?;
        debug!("created {} {}", <D::Entity as Entity>::LABEL, created.id());
        Ok(created)
    }

    pub async fn update<P: Patch>(&self, id: &str, patch: P) -> Result<Option<P::Entity>, StoreError> {
        let store = self.connect().await?;
        Repo::<P::Entity>::new()
            .update(&store, id, patch)
            .await
            .map_err(|err| self.report(err, format_args!("error updating {} {id}", <P::Entity as Entity>::LABEL)))
    }

    pub async fn delete<T: Entity>(&self, id: &str) -> Result<bool, StoreError> {
        let store = self.connect().await?;
        Repo::<T>::new()
            .delete(&store, id)
            .await
            .map_err(|err| self.report(err, format_args!("error deleting {} {id}", T::LABEL)))
    }

    pub async fn update_message_status(&self, id: &str, status: MessageStatus) -> Result<Option<Message>, StoreError> {
        self.update(id, MessagePatch::status(status)).await
    }

    fn report(&self, err: StoreError, context: std::fmt::Arguments<'_>) -> StoreError {
        error!("{context}: {err}");
        if err.is_connection() {
            self.connections.invalidate();
        }
        err
    }
}

macro_rules! entity_operations {
    ($entity:ty, $draft:ty, $patch:ty, $fetch:ident, $fetch_by_id:ident, $count:ident, $create:ident, $update:ident, $delete:ident) => {
        impl<C: Connector> PersistenceService<C> {
            pub async fn $fetch(&self, filter: Option<&Filter>) -> Result<Vec<$entity>, StoreError> {
                self.find::<$entity>(filter).await
            }

            pub async fn $fetch_by_id(&self, id: &str) -> Result<Option<$entity>, StoreError> {
                self.find_by_id::<$entity>(id).await
            }

            pub async fn $count(&self, filter: Option<&Filter>) -> Result<u64, StoreError> {
                self.count::<$entity>(filter).await
            }

            pub async fn $create(&self, draft: $draft) -> Result<$entity, StoreError> {
                self.create(draft).await
            }

            pub async fn $update(&self, id: &str, patch: $patch) -> Result<Option<$entity>, StoreError> {
                self.update(id, patch).await
            }

            pub async fn $delete(&self, id: &str) -> Result<bool, StoreError> {
                self.delete::<$entity>(id).await
            }
        }
    };
}

entity_operations!(
    User,
    NewUser,
    UserPatch,
    fetch_users,
    fetch_user_by_id,
    count_users,
    create_user,
    update_user,
    delete_user
);
entity_operations!(
    Event,
    NewEvent,
    EventPatch,
    fetch_events,
    fetch_event_by_id,
    count_events,
    create_event,
    update_event,
    delete_event
);
entity_operations!(
    Community,
    NewCommunity,
    CommunityPatch,
    fetch_communities,
    fetch_community_by_id,
    count_communities,
    create_community,
    update_community,
    delete_community
);
entity_operations!(
    Message,
    NewMessage,
    MessagePatch,
    fetch_messages,
    fetch_message_by_id,
    count_messages,
    create_message,
    update_message,
    delete_message
);
entity_operations!(Job, NewJob, JobPatch, fetch_jobs, fetch_job_by_id, count_jobs, create_job, update_job, delete_job);
