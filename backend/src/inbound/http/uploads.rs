//! Static serving of user uploads.

use std::io;
use std::path::Path;

use actix_files::Files;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use tracing::info;

/// URL prefix uploads are served under.
pub const UPLOADS_MOUNT: &str = "/uploads";

/// Create the upload directory and any missing parents.
///
/// # Errors
///
/// Propagates I/O errors from creating the directory.
pub fn ensure_upload_dir(path: &Path) -> io::Result<()> {
    Dir::create_ambient_dir_all(path, ambient_authority())?;
    info!(path = %path.display(), "upload directory ready");
    Ok(())
}

/// Service answering `GET /uploads/{file}` from `path`. Directory listings
/// are disabled.
pub fn uploads_service(path: &Path) -> Files {
    Files::new(UPLOADS_MOUNT, path)
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn nested_directories_are_created() {
        let root = tempfile::tempdir().expect("tempdir");
        let target = root.path().join("media/avatars");
        ensure_upload_dir(&target).expect("create");
        ensure_upload_dir(&target).expect("idempotent");
        assert!(target.is_dir());
    }

    #[rstest]
    #[actix_web::test]
    async fn stored_files_are_served() {
        let root = tempfile::tempdir().expect("tempdir");
        std::fs::write(root.path().join("avatar.txt"), b"hello").expect("write");
        let app = actix_test::init_service(App::new().service(uploads_service(root.path()))).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/uploads/avatar.txt").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(actix_test::read_body(res).await.as_ref(), b"hello");

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/uploads/missing.txt").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
