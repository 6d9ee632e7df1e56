// src/handlers/places.rs
// DOCUMENTATION: HTTP handlers for place operations
// PURPOSE: Parse requests, call services, return responses

use crate::auth::Caller;
use crate::db::PlaceStore;
use crate::errors::PlacesError;
use crate::models::{
    CreatePlaceRequest, MessageResponse, PlaceEnvelope, PlaceListEnvelope, UpdatePlaceRequest,
};
use crate::services::{Geocoder, ImageStorage, PlaceService, UploadedImage, DELETED_MESSAGE};
use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse, Responder};
use futures_util::StreamExt;
use validator::{Validate, ValidationErrors};

const INVALID_INPUTS: &str = "Invalid inputs passed, please check your data.";

fn invalid_inputs(errors: ValidationErrors) -> PlacesError {
    log::warn!("Rejected place input: {}", errors);
    PlacesError::ValidationError(format!("{} {}", INVALID_INPUTS, errors))
}

fn malformed(e: impl std::fmt::Display) -> PlacesError {
    log::warn!("Malformed multipart body: {}", e);
    PlacesError::ValidationError(INVALID_INPUTS.to_string())
}

/// Multipart body of POST /api/places
#[derive(Debug, Default)]
struct PlaceForm {
    fields: CreatePlaceRequest,
    image: Option<UploadedImage>,
}

/// Drain a field into memory, refusing to buffer more than `limit` bytes
async fn read_field(field: &mut Field, limit: usize) -> Result<Vec<u8>, PlacesError> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(malformed)?;
        if buf.len() + chunk.len() > limit {
            return Err(PlacesError::ValidationError(format!(
                "Image exceeds the {} byte limit.",
                limit
            )));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

async fn read_text(field: &mut Field, limit: usize) -> Result<String, PlacesError> {
    let bytes = read_field(field, limit).await?;
    String::from_utf8(bytes).map_err(malformed)
}

async fn read_place_form(
    payload: &mut Multipart,
    max_image_bytes: usize,
) -> Result<PlaceForm, PlacesError> {
    // text fields share the image limit, they are only ever a few bytes
    let mut form = PlaceForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(malformed)?;
        let name = field.name().to_string();

        match name.as_str() {
            "title" => form.fields.title = read_text(&mut field, max_image_bytes).await?,
            "description" => {
                form.fields.description = read_text(&mut field, max_image_bytes).await?
            }
            "address" => form.fields.address = read_text(&mut field, max_image_bytes).await?,
            "creator" => {
                form.fields.creator = Some(read_text(&mut field, max_image_bytes).await?)
            }
            "image" => {
                let content_type = field.content_type().map(|m| m.essence_str().to_string());
                let bytes = read_field(&mut field, max_image_bytes).await?;
                form.image = Some(UploadedImage {
                    content_type,
                    bytes,
                });
            }
            other => {
                log::debug!("Skipping unknown form field '{}'", other);
                read_field(&mut field, max_image_bytes).await?;
            }
        }
    }

    Ok(form)
}

/// GET /api/places/{pid}
pub async fn get_place(
    store: web::Data<dyn PlaceStore>,
    path: web::Path<String>,
) -> Result<impl Responder, PlacesError> {
    let place = PlaceService::get_place(store.get_ref(), &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PlaceEnvelope { place }))
}

/// GET /api/places/user/{uid}
pub async fn get_places_by_user(
    store: web::Data<dyn PlaceStore>,
    path: web::Path<String>,
) -> Result<impl Responder, PlacesError> {
    let places = PlaceService::get_places_by_user(store.get_ref(), &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PlaceListEnvelope { places }))
}

/// POST /api/places
/// Multipart form: title, description, address, creator, image
pub async fn create_place(
    store: web::Data<dyn PlaceStore>,
    geocoder: web::Data<dyn Geocoder>,
    images: web::Data<ImageStorage>,
    caller: Caller,
    mut payload: Multipart,
) -> Result<impl Responder, PlacesError> {
    let form = read_place_form(&mut payload, images.max_bytes()).await?;

    form.fields.validate().map_err(invalid_inputs)?;
    let image = form.image.ok_or_else(|| {
        PlacesError::ValidationError(format!("{} image is required", INVALID_INPUTS))
    })?;

    let place = PlaceService::create_place(
        store.get_ref(),
        geocoder.get_ref(),
        images.get_ref(),
        caller,
        form.fields,
        image,
    )
    .await?;

    log::info!("User {} created place {}", caller.user_id, place.id);
    Ok(HttpResponse::Created().json(PlaceEnvelope { place }))
}

/// PATCH /api/places/{pid}
pub async fn update_place(
    store: web::Data<dyn PlaceStore>,
    caller: Caller,
    path: web::Path<String>,
    req: web::Json<UpdatePlaceRequest>,
) -> Result<impl Responder, PlacesError> {
    req.validate().map_err(invalid_inputs)?;

    let place =
        PlaceService::update_place(store.get_ref(), caller, &path.into_inner(), req.into_inner())
            .await?;
    Ok(HttpResponse::Ok().json(PlaceEnvelope { place }))
}

/// DELETE /api/places/{pid}
pub async fn delete_place(
    store: web::Data<dyn PlaceStore>,
    images: web::Data<ImageStorage>,
    caller: Caller,
    path: web::Path<String>,
) -> Result<impl Responder, PlacesError> {
    PlaceService::delete_place(store.get_ref(), images.get_ref(), caller, &path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: DELETED_MESSAGE.to_string(),
    }))
}

/// Malformed JSON bodies get the same 422 as failed validation
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| malformed(err).into())
}

/// Configuration for place routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/places")
            .app_data(json_config())
            .route("", web::post().to(create_place))
            .route("/user/{uid}", web::get().to(get_places_by_user))
            .route("/{pid}", web::get().to(get_place))
            .route("/{pid}", web::patch().to(update_place))
            .route("/{pid}", web::delete().to(delete_place)),
    );
}
