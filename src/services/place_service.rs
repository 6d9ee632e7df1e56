// src/services/place_service.rs
// DOCUMENTATION: Business logic for places
// PURPOSE: Existence and ownership rules between handlers and the store

use crate::auth::Caller;
use crate::db::{PlaceStore, StoreError};
use crate::errors::PlacesError;
use crate::models::{CreatePlaceRequest, Place, PlaceResponse, UpdatePlaceRequest};
use crate::services::{Geocoder, ImageStorage, UploadedImage};
use chrono::Utc;
use uuid::Uuid;

const PLACE_NOT_FOUND: &str = "Could not find a place for the provided id.";
const FIND_PLACE_FAILED: &str = "Something went wrong, could not find a place.";
const USER_PLACES_NOT_FOUND: &str = "Could not find places for the provided user id.";
const FETCH_PLACES_FAILED: &str = "Fetching places failed, please try again later.";
const USER_NOT_FOUND: &str = "Could not find user for provided id.";
const CREATE_FAILED: &str = "Creating place failed, please try again.";
const UPDATE_FAILED: &str = "Something went wrong, could not update place.";
const UPDATE_FORBIDDEN: &str = "You are not allowed to edit this place.";
const DELETE_NOT_FOUND: &str = "Could not find place for this id.";
const DELETE_FAILED: &str = "Something went wrong, could not delete place.";
const DELETE_FORBIDDEN: &str = "You are not allowed to delete this place.";
pub const DELETED_MESSAGE: &str = "Deleted place.";

/// Log the store fault and replace it with the caller-facing message
fn internal(message: &'static str) -> impl FnOnce(StoreError) -> PlacesError {
    move |e| {
        log::error!("{} ({})", message, e);
        PlacesError::Internal(message.to_string())
    }
}

/// Path ids that are not UUIDs cannot name a stored record
fn parse_id(raw: &str, not_found: &'static str) -> Result<Uuid, PlacesError> {
    Uuid::parse_str(raw).map_err(|_| {
        log::warn!("Rejected malformed id '{}'", raw);
        PlacesError::NotFound(not_found.to_string())
    })
}

pub struct PlaceService;

impl PlaceService {
    /// Get a place by id
    pub async fn get_place(
        store: &dyn PlaceStore,
        place_id: &str,
    ) -> Result<PlaceResponse, PlacesError> {
        let id = parse_id(place_id, PLACE_NOT_FOUND)?;

        let place = store
            .find_place(id)
            .await
            .map_err(internal(FIND_PLACE_FAILED))?
            .ok_or_else(|| {
                log::warn!("Place not found: {}", id);
                PlacesError::NotFound(PLACE_NOT_FOUND.to_string())
            })?;

        Ok(place.to_response())
    }

    /// Get all places owned by a user
    /// DOCUMENTATION: A user without places answers NotFound, same as an unknown user
    pub async fn get_places_by_user(
        store: &dyn PlaceStore,
        user_id: &str,
    ) -> Result<Vec<PlaceResponse>, PlacesError> {
        let id = parse_id(user_id, USER_PLACES_NOT_FOUND)?;

        let populated = store
            .find_user_with_places(id)
            .await
            .map_err(internal(FETCH_PLACES_FAILED))?;

        match populated {
            Some(found) if !found.places.is_empty() => {
                Ok(found.places.iter().map(Place::to_response).collect())
            }
            _ => {
                log::warn!("No places for user {}", id);
                Err(PlacesError::NotFound(USER_PLACES_NOT_FOUND.to_string()))
            }
        }
    }

    /// Create a place owned by the caller
    /// DOCUMENTATION: `req` must already be validated. The stored image is
    /// removed again if the place cannot be committed.
    pub async fn create_place(
        store: &dyn PlaceStore,
        geocoder: &dyn Geocoder,
        images: &ImageStorage,
        caller: Caller,
        req: CreatePlaceRequest,
        image: UploadedImage,
    ) -> Result<PlaceResponse, PlacesError> {
        if let Some(claimed) = req.creator.as_deref() {
            if claimed != caller.user_id.to_string() {
                log::warn!(
                    "Ignoring submitted creator {} in favour of caller {}",
                    claimed,
                    caller.user_id
                );
            }
        }

        let location = geocoder.locate(&req.address).await?;

        store
            .find_user(caller.user_id)
            .await
            .map_err(internal(CREATE_FAILED))?
            .ok_or_else(|| {
                log::warn!("Place creator {} does not exist", caller.user_id);
                PlacesError::NotFound(USER_NOT_FOUND.to_string())
            })?;

        // removed on drop until the place is committed
        let pending = images.store(&image).await?;

        let place = Place::new(
            req.title,
            req.description,
            req.address,
            location,
            pending.path_string(),
            caller.user_id,
        );

        store
            .insert_place_for_creator(&place)
            .await
            .map_err(internal(CREATE_FAILED))?;
        pending.keep();

        Ok(place.to_response())
    }

    /// Update title and description of a place owned by the caller
    pub async fn update_place(
        store: &dyn PlaceStore,
        caller: Caller,
        place_id: &str,
        req: UpdatePlaceRequest,
    ) -> Result<PlaceResponse, PlacesError> {
        let id = parse_id(place_id, PLACE_NOT_FOUND)?;

        let mut place = store
            .find_place(id)
            .await
            .map_err(internal(UPDATE_FAILED))?
            .ok_or_else(|| {
                log::warn!("Place not found for update: {}", id);
                PlacesError::NotFound(PLACE_NOT_FOUND.to_string())
            })?;

        if place.creator != caller.user_id {
            log::warn!("User {} may not edit place {}", caller.user_id, id);
            return Err(PlacesError::Unauthorized(UPDATE_FORBIDDEN.to_string()));
        }

        place.title = req.title;
        place.description = req.description;
        place.updated_at = Utc::now();

        store
            .update_place(&place)
            .await
            .map_err(internal(UPDATE_FAILED))?;

        Ok(place.to_response())
    }

    /// Delete a place owned by the caller and detach it from the caller's list
    /// DOCUMENTATION: Image removal runs after commit and never fails the request
    pub async fn delete_place(
        store: &dyn PlaceStore,
        images: &ImageStorage,
        caller: Caller,
        place_id: &str,
    ) -> Result<(), PlacesError> {
        let id = parse_id(place_id, DELETE_NOT_FOUND)?;

        let found = store
            .find_place_with_creator(id)
            .await
            .map_err(internal(DELETE_FAILED))?
            .ok_or_else(|| {
                log::warn!("Place not found for delete: {}", id);
                PlacesError::NotFound(DELETE_NOT_FOUND.to_string())
            })?;

        let creator = found.creator.ok_or_else(|| {
            log::error!("Place {} references missing user {}", id, found.place.creator);
            PlacesError::Internal(DELETE_FAILED.to_string())
        })?;

        if creator.id != caller.user_id {
            log::warn!("User {} may not delete place {}", caller.user_id, id);
            return Err(PlacesError::Unauthorized(DELETE_FORBIDDEN.to_string()));
        }

        store
            .delete_place_for_creator(&found.place)
            .await
            .map_err(internal(DELETE_FAILED))?;

        images.remove(&found.place.image).await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Fault, MemoryPlaceStore};
    use crate::models::{NewUser, User};
    use crate::services::{FixedGeocoder, STUB_LOCATION};
    use tempfile::TempDir;

    struct Fixture {
        store: MemoryPlaceStore,
        geocoder: FixedGeocoder,
        images: ImageStorage,
        owner: User,
        _dir: TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryPlaceStore::new();
        let owner = User::new(NewUser {
            name: "Max".into(),
            email: "max@example.com".into(),
            image: None,
        });
        store.insert_user(&owner).await.unwrap();

        Fixture {
            store,
            geocoder: FixedGeocoder::default(),
            images: ImageStorage::new(dir.path().join("images"), 1024),
            owner,
            _dir: dir,
        }
    }

    fn empire_state(creator: Option<String>) -> CreatePlaceRequest {
        CreatePlaceRequest {
            title: "Empire State".into(),
            description: "tall building".into(),
            address: "20 W 34th St".into(),
            creator,
        }
    }

    fn image() -> UploadedImage {
        UploadedImage {
            content_type: Some("image/png".into()),
            bytes: b"\x89PNG".to_vec(),
        }
    }

    async fn create(f: &Fixture) -> PlaceResponse {
        PlaceService::create_place(
            &f.store,
            &f.geocoder,
            &f.images,
            Caller {
                user_id: f.owner.id,
            },
            empire_state(None),
            image(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_uses_caller_and_stub_location() {
        let f = fixture().await;
        let someone_else = Uuid::new_v4().to_string();

        let created = PlaceService::create_place(
            &f.store,
            &f.geocoder,
            &f.images,
            Caller {
                user_id: f.owner.id,
            },
            empire_state(Some(someone_else)),
            image(),
        )
        .await
        .unwrap();

        assert_eq!(created.creator, f.owner.id);
        assert_eq!(created.location, STUB_LOCATION);
        assert!(tokio::fs::metadata(&created.image).await.is_ok());

        let fetched = PlaceService::get_place(&f.store, &created.id.to_string())
            .await
            .unwrap();
        assert_eq!(fetched, created);

        let owner = f.store.find_user(f.owner.id).await.unwrap().unwrap();
        assert_eq!(owner.places, vec![created.id]);
    }

    #[tokio::test]
    async fn test_create_for_unknown_user() {
        let f = fixture().await;

        let err = PlaceService::create_place(
            &f.store,
            &f.geocoder,
            &f.images,
            Caller {
                user_id: Uuid::new_v4(),
            },
            empire_state(None),
            image(),
        )
        .await
        .unwrap_err();

        assert_eq!(err, PlacesError::NotFound(USER_NOT_FOUND.to_string()));
        assert_eq!(f.store.place_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_is_atomic() {
        let f = fixture().await;
        f.store.arm(Fault::AfterPlaceInsert).await;

        let err = PlaceService::create_place(
            &f.store,
            &f.geocoder,
            &f.images,
            Caller {
                user_id: f.owner.id,
            },
            empire_state(None),
            image(),
        )
        .await
        .unwrap_err();

        assert_eq!(err, PlacesError::Internal(CREATE_FAILED.to_string()));
        assert_eq!(f.store.place_count().await, 0);
        let owner = f.store.find_user(f.owner.id).await.unwrap().unwrap();
        assert!(owner.places.is_empty());

        // the orphaned upload is cleaned up
        let mut entries = tokio::fs::read_dir(f._dir.path().join("images")).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    /// Store whose create transaction never finishes
    struct StalledStore(MemoryPlaceStore);

    #[async_trait::async_trait]
    impl PlaceStore for StalledStore {
        async fn find_place(&self, id: Uuid) -> Result<Option<Place>, StoreError> {
            self.0.find_place(id).await
        }

        async fn find_place_with_creator(
            &self,
            id: Uuid,
        ) -> Result<Option<crate::db::PlaceWithCreator>, StoreError> {
            self.0.find_place_with_creator(id).await
        }

        async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
            self.0.find_user(id).await
        }

        async fn find_user_with_places(
            &self,
            id: Uuid,
        ) -> Result<Option<crate::db::UserWithPlaces>, StoreError> {
            self.0.find_user_with_places(id).await
        }

        async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
            self.0.insert_user(user).await
        }

        async fn insert_place_for_creator(&self, _place: &Place) -> Result<(), StoreError> {
            std::future::pending().await
        }

        async fn update_place(&self, place: &Place) -> Result<(), StoreError> {
            self.0.update_place(place).await
        }

        async fn delete_place_for_creator(&self, place: &Place) -> Result<(), StoreError> {
            self.0.delete_place_for_creator(place).await
        }
    }

    #[tokio::test]
    async fn test_dropped_create_discards_image() {
        let f = fixture().await;
        let store = StalledStore(MemoryPlaceStore::new());
        store.insert_user(&f.owner).await.unwrap();

        // the client goes away while the transaction is in flight
        let dropped = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            PlaceService::create_place(
                &store,
                &f.geocoder,
                &f.images,
                Caller {
                    user_id: f.owner.id,
                },
                empire_state(None),
                image(),
            ),
        )
        .await;
        assert!(dropped.is_err());

        let mut entries = tokio::fs::read_dir(f._dir.path().join("images")).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_place_errors() {
        let f = fixture().await;

        let missing = PlaceService::get_place(&f.store, &Uuid::new_v4().to_string()).await;
        assert_eq!(
            missing.unwrap_err(),
            PlacesError::NotFound(PLACE_NOT_FOUND.to_string())
        );

        let malformed = PlaceService::get_place(&f.store, "p1").await;
        assert!(matches!(malformed, Err(PlacesError::NotFound(_))));

        f.store.arm(Fault::Lookup).await;
        let fault = PlaceService::get_place(&f.store, &Uuid::new_v4().to_string()).await;
        assert_eq!(
            fault.unwrap_err(),
            PlacesError::Internal(FIND_PLACE_FAILED.to_string())
        );
    }

    #[tokio::test]
    async fn test_places_by_user() {
        let f = fixture().await;
        let uid = f.owner.id.to_string();

        // no places yet counts as not found
        assert_eq!(
            PlaceService::get_places_by_user(&f.store, &uid).await.unwrap_err(),
            PlacesError::NotFound(USER_PLACES_NOT_FOUND.to_string())
        );

        let first = create(&f).await;
        let second = create(&f).await;

        let mut ids: Vec<Uuid> = PlaceService::get_places_by_user(&f.store, &uid)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        ids.sort();
        let mut expected = vec![first.id, second.id];
        expected.sort();
        assert_eq!(ids, expected);

        assert!(matches!(
            PlaceService::get_places_by_user(&f.store, &Uuid::new_v4().to_string()).await,
            Err(PlacesError::NotFound(_))
        ));

        f.store.arm(Fault::Lookup).await;
        assert_eq!(
            PlaceService::get_places_by_user(&f.store, &uid).await.unwrap_err(),
            PlacesError::Internal(FETCH_PLACES_FAILED.to_string())
        );
    }

    #[tokio::test]
    async fn test_update_by_creator() {
        let f = fixture().await;
        let created = create(&f).await;

        let updated = PlaceService::update_place(
            &f.store,
            Caller {
                user_id: f.owner.id,
            },
            &created.id.to_string(),
            UpdatePlaceRequest {
                title: "Chrysler".into(),
                description: "also tall".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.title, "Chrysler");

        let fetched = PlaceService::get_place(&f.store, &created.id.to_string())
            .await
            .unwrap();
        assert_eq!(fetched.title, "Chrysler");
        assert_eq!(fetched.description, "also tall");
    }

    #[tokio::test]
    async fn test_update_by_stranger_changes_nothing() {
        let f = fixture().await;
        let created = create(&f).await;

        let err = PlaceService::update_place(
            &f.store,
            Caller {
                user_id: Uuid::new_v4(),
            },
            &created.id.to_string(),
            UpdatePlaceRequest {
                title: "Hijacked".into(),
                description: "not mine".into(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err, PlacesError::Unauthorized(UPDATE_FORBIDDEN.to_string()));

        let fetched = PlaceService::get_place(&f.store, &created.id.to_string())
            .await
            .unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_update_missing_or_failing() {
        let f = fixture().await;
        let caller = Caller {
            user_id: f.owner.id,
        };
        let req = UpdatePlaceRequest {
            title: "x".into(),
            description: "xxxxx".into(),
        };

        let missing =
            PlaceService::update_place(&f.store, caller, &Uuid::new_v4().to_string(), req.clone())
                .await;
        assert!(matches!(missing, Err(PlacesError::NotFound(_))));

        let created = create(&f).await;
        f.store.arm(Fault::Update).await;
        let failed =
            PlaceService::update_place(&f.store, caller, &created.id.to_string(), req).await;
        assert_eq!(
            failed.unwrap_err(),
            PlacesError::Internal(UPDATE_FAILED.to_string())
        );
    }

    #[tokio::test]
    async fn test_delete_detaches_and_removes_image() {
        let f = fixture().await;
        let created = create(&f).await;
        let caller = Caller {
            user_id: f.owner.id,
        };

        PlaceService::delete_place(&f.store, &f.images, caller, &created.id.to_string())
            .await
            .unwrap();

        assert!(matches!(
            PlaceService::get_place(&f.store, &created.id.to_string()).await,
            Err(PlacesError::NotFound(_))
        ));
        let owner = f.store.find_user(f.owner.id).await.unwrap().unwrap();
        assert!(!owner.owns(created.id));
        assert!(tokio::fs::metadata(&created.image).await.is_err());

        // deleting again reports not found and leaves the list alone
        let again =
            PlaceService::delete_place(&f.store, &f.images, caller, &created.id.to_string()).await;
        assert_eq!(
            again.unwrap_err(),
            PlacesError::NotFound(DELETE_NOT_FOUND.to_string())
        );
        let owner = f.store.find_user(f.owner.id).await.unwrap().unwrap();
        assert!(owner.places.is_empty());
    }

    #[tokio::test]
    async fn test_delete_by_stranger_or_failing() {
        let f = fixture().await;
        let created = create(&f).await;

        let stranger = PlaceService::delete_place(
            &f.store,
            &f.images,
            Caller {
                user_id: Uuid::new_v4(),
            },
            &created.id.to_string(),
        )
        .await;
        assert_eq!(
            stranger.unwrap_err(),
            PlacesError::Unauthorized(DELETE_FORBIDDEN.to_string())
        );

        f.store.arm(Fault::AfterListPull).await;
        let failed = PlaceService::delete_place(
            &f.store,
            &f.images,
            Caller {
                user_id: f.owner.id,
            },
            &created.id.to_string(),
        )
        .await;
        assert_eq!(
            failed.unwrap_err(),
            PlacesError::Internal(DELETE_FAILED.to_string())
        );

        // nothing was committed and the image is still there
        let owner = f.store.find_user(f.owner.id).await.unwrap().unwrap();
        assert!(owner.owns(created.id));
        assert!(tokio::fs::metadata(&created.image).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_survives_missing_image() {
        let f = fixture().await;
        let created = create(&f).await;
        tokio::fs::remove_file(&created.image).await.unwrap();

        PlaceService::delete_place(
            &f.store,
            &f.images,
            Caller {
                user_id: f.owner.id,
            },
            &created.id.to_string(),
        )
        .await
        .unwrap();
        assert_eq!(f.store.place_count().await, 0);
    }
}
