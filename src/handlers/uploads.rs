// src/handlers/uploads.rs
// DOCUMENTATION: Read-only access to stored place images
// PURPOSE: Serve files referenced by a place's image path

use crate::errors::PlacesError;
use crate::services::ImageStorage;
use actix_files::NamedFile;
use actix_web::web;

const IMAGE_NOT_FOUND: &str = "Could not find this image.";

/// GET /uploads/images/{file}
///
/// `NamedFile` supplies the content type, `ETag`/`Last-Modified` and range support.
pub async fn get_image(
    images: web::Data<ImageStorage>,
    path: web::Path<String>,
) -> Result<NamedFile, PlacesError> {
    let file_name = path.into_inner();
    let full_path = images
        .resolve(&file_name)
        .ok_or_else(|| PlacesError::NotFound(IMAGE_NOT_FOUND.to_string()))?;

    NamedFile::open_async(&full_path).await.map_err(|e| {
        log::debug!("Image {} unavailable: {}", full_path.display(), e);
        PlacesError::NotFound(IMAGE_NOT_FOUND.to_string())
    })
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/uploads/images/{file}", web::get().to(get_image));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::UploadedImage;
    use actix_web::{
        http::{header, StatusCode},
        test, App,
    };

    const BYTES: &[u8] = b"\x89PNG\r\n\x1a\nbody";

    async fn stored_png(images: &ImageStorage) -> String {
        let stored = images
            .store(&UploadedImage {
                content_type: Some("image/png".into()),
                bytes: BYTES.to_vec(),
            })
            .await
            .unwrap()
            .keep();
        std::path::Path::new(&stored)
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned()
    }

    #[actix_web::test]
    async fn test_serves_stored_image() {
        let dir = tempfile::tempdir().unwrap();
        let images = ImageStorage::new(dir.path(), 1024);
        let file_name = stored_png(&images).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(images))
                .configure(config),
        )
        .await;

        let uri = format!("/uploads/images/{}", file_name);
        let req = test::TestRequest::get().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
        assert!(resp.headers().contains_key(header::LAST_MODIFIED));
        let etag = resp.headers().get(header::ETAG).unwrap().clone();
        assert_eq!(test::read_body(resp).await.as_ref(), BYTES);

        // conditional request with the served validator
        let req = test::TestRequest::get()
            .uri(&uri)
            .insert_header((header::IF_NONE_MATCH, etag))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);

        let req = test::TestRequest::get()
            .uri(&uri)
            .insert_header((header::RANGE, "bytes=0-3"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(test::read_body(resp).await.as_ref(), &BYTES[..4]);
    }

    #[actix_web::test]
    async fn test_missing_or_unsafe_names_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), b"JWT_KEY=secret").unwrap();
        let images = ImageStorage::new(dir.path(), 1024);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(images))
                .configure(config),
        )
        .await;

        for uri in ["/uploads/images/missing.png", "/uploads/images/.env"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
        }
    }
}
