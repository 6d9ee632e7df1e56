// src/db/memory.rs
// DOCUMENTATION: Process-local implementation of the place store
// PURPOSE: Development backend and test double with fault injection

use crate::db::store::{PlaceStore, PlaceWithCreator, StoreError, UserWithPlaces};
use crate::models::{Place, User};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Points at which a one-shot failure can be armed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    /// Any lookup
    Lookup,
    /// Between writing the place and appending it to the creator's list
    AfterPlaceInsert,
    /// Between pulling the place from the creator's list and deleting it
    AfterListPull,
    /// Saving an updated place
    Update,
}

#[derive(Debug, Default)]
struct State {
    places: HashMap<Uuid, Place>,
    users: HashMap<Uuid, User>,
}

/// In-memory store
/// DOCUMENTATION: A multi-record write stages its changes on copies while
/// holding the write lock and only swaps them in once every step succeeded
#[derive(Debug, Default)]
pub struct MemoryPlaceStore {
    state: RwLock<State>,
    faults: Mutex<HashSet<Fault>>,
}

impl MemoryPlaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next operation reaching `fault` fail
    pub async fn arm(&self, fault: Fault) {
        self.faults.lock().await.insert(fault);
    }

    async fn trip(&self, fault: Fault) -> Result<(), StoreError> {
        if self.faults.lock().await.remove(&fault) {
            log::debug!("Tripping injected fault {:?}", fault);
            return Err(StoreError::Injected(format!("{:?}", fault)));
        }
        Ok(())
    }

    pub async fn place_count(&self) -> usize {
        self.state.read().await.places.len()
    }
}

#[async_trait]
impl PlaceStore for MemoryPlaceStore {
    async fn find_place(&self, id: Uuid) -> Result<Option<Place>, StoreError> {
        self.trip(Fault::Lookup).await?;
        Ok(self.state.read().await.places.get(&id).cloned())
    }

    async fn find_place_with_creator(
        &self,
        id: Uuid,
    ) -> Result<Option<PlaceWithCreator>, StoreError> {
        self.trip(Fault::Lookup).await?;
        let state = self.state.read().await;

        Ok(state.places.get(&id).map(|place| PlaceWithCreator {
            place: place.clone(),
            creator: state.users.get(&place.creator).cloned(),
        }))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.trip(Fault::Lookup).await?;
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_with_places(
        &self,
        id: Uuid,
    ) -> Result<Option<UserWithPlaces>, StoreError> {
        self.trip(Fault::Lookup).await?;
        let state = self.state.read().await;

        Ok(state.users.get(&id).map(|user| UserWithPlaces {
            user: user.clone(),
            places: user
                .places
                .iter()
                .filter_map(|place_id| state.places.get(place_id).cloned())
                .collect(),
        }))
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.state
            .write()
            .await
            .users
            .insert(user.id, user.clone());
        Ok(())
    }

    async fn insert_place_for_creator(&self, place: &Place) -> Result<(), StoreError> {
        let mut state = self.state.write().await;

        let staged_place = place.clone();
        self.trip(Fault::AfterPlaceInsert).await?;

        let mut staged_user = state
            .users
            .get(&place.creator)
            .cloned()
            .ok_or(StoreError::UserMissing(place.creator))?;
        staged_user.places.push(place.id);
        staged_user.updated_at = Utc::now();

        state.places.insert(staged_place.id, staged_place);
        state.users.insert(staged_user.id, staged_user);
        Ok(())
    }

    async fn update_place(&self, place: &Place) -> Result<(), StoreError> {
        self.trip(Fault::Update).await?;
        let mut state = self.state.write().await;

        let stored = state
            .places
            .get_mut(&place.id)
            .ok_or(StoreError::PlaceMissing(place.id))?;
        stored.title = place.title.clone();
        stored.description = place.description.clone();
        stored.updated_at = place.updated_at;
        Ok(())
    }

    async fn delete_place_for_creator(&self, place: &Place) -> Result<(), StoreError> {
        let mut state = self.state.write().await;

        let staged_user = state.users.get(&place.creator).cloned().map(|mut user| {
            user.places.retain(|id| *id != place.id);
            user.updated_at = Utc::now();
            user
        });
        self.trip(Fault::AfterListPull).await?;

        if state.places.remove(&place.id).is_none() {
            return Err(StoreError::PlaceMissing(place.id));
        }
        if let Some(user) = staged_user {
            state.users.insert(user.id, user);
        }
        Ok(())
    }
}
