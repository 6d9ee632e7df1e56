// src/db/store.rs
// DOCUMENTATION: Persistence port shared by every handler
// PURPOSE: Lookups, population and atomic multi-record writes for places and users

use crate::models::{Place, User};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Faults raised by a store implementation
/// DOCUMENTATION: Never shown to HTTP callers, the service logs these and
/// answers with a generic message
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("user {0} does not exist")]
    UserMissing(Uuid),

    #[error("place {0} does not exist")]
    PlaceMissing(Uuid),

    /// Simulated failure raised by a test double
    #[error("injected fault: {0}")]
    Injected(String),
}

/// A user together with its resolved places
#[derive(Debug, Clone)]
pub struct UserWithPlaces {
    pub user: User,
    pub places: Vec<Place>,
}

/// A place together with its resolved creator
/// DOCUMENTATION: `creator` is None when the referenced user row is gone
#[derive(Debug, Clone)]
pub struct PlaceWithCreator {
    pub place: Place,
    pub creator: Option<User>,
}

/// Storage capability required by the place service
/// DOCUMENTATION: Implementations must make `insert_place_for_creator` and
/// `delete_place_for_creator` all-or-nothing across both records
#[async_trait]
pub trait PlaceStore: Send + Sync {
    async fn find_place(&self, id: Uuid) -> Result<Option<Place>, StoreError>;

    async fn find_place_with_creator(
        &self,
        id: Uuid,
    ) -> Result<Option<PlaceWithCreator>, StoreError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_user_with_places(&self, id: Uuid)
        -> Result<Option<UserWithPlaces>, StoreError>;

    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    /// Persist `place` and append its id to the creator's place list in one commit
    async fn insert_place_for_creator(&self, place: &Place) -> Result<(), StoreError>;

    /// Overwrite title and description of an existing place
    async fn update_place(&self, place: &Place) -> Result<(), StoreError>;

    /// Pull `place` from its creator's place list and delete it in one commit
    async fn delete_place_for_creator(&self, place: &Place) -> Result<(), StoreError>;
}
