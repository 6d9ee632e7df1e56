// src/db/repository.rs
// DOCUMENTATION: PostgreSQL implementation of the place store
// PURPOSE: All SQL queries; multi-record writes run inside one transaction

use crate::db::store::{PlaceStore, PlaceWithCreator, StoreError, UserWithPlaces};
use crate::models::{Location, Place, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Internal struct for mapping database rows to Place struct
/// DOCUMENTATION: Coordinates are stored as two columns
#[derive(Debug, FromRow)]
struct PlaceRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub image: String,
    pub creator: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlaceRow {
    fn into_place(self) -> Place {
        Place {
            id: self.id,
            title: self.title,
            description: self.description,
            address: self.address,
            location: Location {
                lat: self.lat,
                lng: self.lng,
            },
            image: self.image,
            creator: self.creator,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub places: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            image: self.image,
            places: self.places,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const PLACE_COLUMNS: &str =
    "id, title, description, address, lat, lng, image, creator, created_at, updated_at";
const USER_COLUMNS: &str = "id, name, email, image, places, created_at, updated_at";

/// PlaceRepository: All database operations for places and their owners
/// DOCUMENTATION: Uses query_as for type-safe SQL queries
#[derive(Clone)]
pub struct PlaceRepository {
    pool: PgPool,
}

impl PlaceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlaceStore for PlaceRepository {
    async fn find_place(&self, id: Uuid) -> Result<Option<Place>, StoreError> {
        let sql = format!("SELECT {} FROM places WHERE id = $1", PLACE_COLUMNS);
        let row = sqlx::query_as::<_, PlaceRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                log::error!("Database error fetching place {}: {}", id, e);
                StoreError::from(e)
            })?;

        Ok(row.map(PlaceRow::into_place))
    }

    async fn find_place_with_creator(
        &self,
        id: Uuid,
    ) -> Result<Option<PlaceWithCreator>, StoreError> {
        let Some(place) = self.find_place(id).await? else {
            return Ok(None);
        };
        let creator = self.find_user(place.creator).await?;

        Ok(Some(PlaceWithCreator { place, creator }))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                log::error!("Database error fetching user {}: {}", id, e);
                StoreError::from(e)
            })?;

        Ok(row.map(UserRow::into_user))
    }

    async fn find_user_with_places(
        &self,
        id: Uuid,
    ) -> Result<Option<UserWithPlaces>, StoreError> {
        let Some(user) = self.find_user(id).await? else {
            return Ok(None);
        };

        let sql = format!(
            "SELECT {} FROM places WHERE id = ANY($1) ORDER BY created_at ASC",
            PLACE_COLUMNS
        );
        let rows = sqlx::query_as::<_, PlaceRow>(&sql)
            .bind(&user.places)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                log::error!("Failed to populate places for user {}: {}", id, e);
                StoreError::from(e)
            })?;

        Ok(Some(UserWithPlaces {
            user,
            places: rows.into_iter().map(PlaceRow::into_place).collect(),
        }))
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, image, places, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.image)
        .bind(&user.places)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            log::error!("Failed to create user {}: {}", user.email, e);
            StoreError::from(e)
        })?;

        log::info!("Created user with id: {}", user.id);
        Ok(())
    }

    async fn insert_place_for_creator(&self, place: &Place) -> Result<(), StoreError> {
        // Dropping the transaction without commit rolls both writes back
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO places (
                id, title, description, address, lat, lng, image, creator,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(place.id)
        .bind(&place.title)
        .bind(&place.description)
        .bind(&place.address)
        .bind(place.location.lat)
        .bind(place.location.lng)
        .bind(&place.image)
        .bind(place.creator)
        .bind(place.created_at)
        .bind(place.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            log::error!("Failed to insert place {}: {}", place.id, e);
            StoreError::from(e)
        })?;

        let linked = sqlx::query(
            r#"
            UPDATE users
            SET places = array_append(places, $1),
                updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(place.id)
        .bind(place.creator)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            log::error!("Failed to link place {} to user {}: {}", place.id, place.creator, e);
            StoreError::from(e)
        })?
        .rows_affected();

        if linked == 0 {
            return Err(StoreError::UserMissing(place.creator));
        }

        tx.commit().await?;

        log::info!("Created place {} for user {}", place.id, place.creator);
        Ok(())
    }

    async fn update_place(&self, place: &Place) -> Result<(), StoreError> {
        let rows = sqlx::query(
            r#"
            UPDATE places
            SET title = $1,
                description = $2,
                updated_at = $3
            WHERE id = $4
            "#,
        )
        .bind(&place.title)
        .bind(&place.description)
        .bind(place.updated_at)
        .bind(place.id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            log::error!("Update failed for place {}: {}", place.id, e);
            StoreError::from(e)
        })?
        .rows_affected();

        if rows == 0 {
            return Err(StoreError::PlaceMissing(place.id));
        }

        log::info!("Updated place: {}", place.id);
        Ok(())
    }

    async fn delete_place_for_creator(&self, place: &Place) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE users
            SET places = array_remove(places, $1),
                updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(place.id)
        .bind(place.creator)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            log::error!("Failed to unlink place {} from user {}: {}", place.id, place.creator, e);
            StoreError::from(e)
        })?;

        let deleted = sqlx::query("DELETE FROM places WHERE id = $1")
            .bind(place.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                log::error!("Delete failed for place {}: {}", place.id, e);
                StoreError::from(e)
            })?
            .rows_affected();

        // Someone else deleted it between lookup and now
        if deleted == 0 {
            return Err(StoreError::PlaceMissing(place.id));
        }

        tx.commit().await?;

        log::info!("Deleted place: {}", place.id);
        Ok(())
    }
}
