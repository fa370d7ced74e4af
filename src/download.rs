use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::core::{GeneratedImage, GenerationError, ImageReference};

/// Prefix of the staging file created next to the final download
const STAGING_PREFIX: &str = ".imagine-";

/// Fetch the raw bytes behind a reference
pub async fn fetch_bytes(client: &Client, reference: &ImageReference) -> Result<Vec<u8>, GenerationError> {
    match reference {
        ImageReference::Inline { data, .. } => Ok(data.to_vec()),
        ImageReference::Url { url } => {
            tracing::debug!("Fetching image from: {}", url);
            let response = client
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| GenerationError::Download(e.to_string()))?;
            let bytes = response
                .bytes()
                .await
                .map_err(|e| GenerationError::Download(e.to_string()))?;
            if bytes.is_empty() {
                return Err(GenerationError::Download(format!("{} returned no data", url)));
            }
            Ok(bytes.to_vec())
        }
    }
}

/// Save `image` into `output_dir` as `generated-image-<identity>.png`.
///
/// The bytes are staged in a temporary file inside `output_dir` which is
/// removed on every failure path and renamed into place on success.
pub async fn save(client: &Client, image: &GeneratedImage, output_dir: &Path) -> Result<PathBuf, GenerationError> {
    fs::create_dir_all(output_dir)
        .await
        .map_err(|e| GenerationError::Download(format!("{}: {}", output_dir.display(), e)))?;

    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(".part")
        .tempfile_in(output_dir)
        .map_err(|e| GenerationError::Download(e.to_string()))?;

    let bytes = fetch_bytes(client, &image.reference).await?;

    fs::write(staging.path(), &bytes)
        .await
        .map_err(|e| GenerationError::Download(e.to_string()))?;

    let target = output_dir.join(image.file_name());
    staging
        .persist(&target)
        .map_err(|e| GenerationError::Download(e.error.to_string()))?;

    tracing::info!("Saved image to: {}", target.display());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn inline_image_is_saved_under_conventional_name() {
        let dir = tempfile::tempdir().unwrap();
        let image = GeneratedImage::new(ImageReference::inline(vec![1u8, 2, 3], "image/png"), "mock");

        let saved = save(&Client::new(), &image, dir.path()).await.unwrap();

        assert_eq!(saved, dir.path().join(format!("generated-image-{}.png", image.identity)));
        assert_eq!(std::fs::read(&saved).unwrap(), vec![1, 2, 3]);
        assert_eq!(dir_entries(dir.path()).len(), 1);
    }

    #[tokio::test]
    async fn url_image_is_fetched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img.png"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"png-bytes".to_vec(), "image/png"))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let image = GeneratedImage::new(ImageReference::url(format!("{}/img.png", server.uri())), "mock");

        let saved = save(&Client::new(), &image, dir.path()).await.unwrap();
        assert_eq!(std::fs::read(saved).unwrap(), b"png-bytes");
    }

    #[tokio::test]
    async fn failed_fetch_leaves_no_staging_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let image = GeneratedImage::new(ImageReference::url(format!("{}/gone.png", server.uri())), "mock");

        let err = save(&Client::new(), &image, dir.path()).await.unwrap_err();

        assert!(matches!(err, GenerationError::Download(_)));
        assert!(dir_entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn failed_rename_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let image = GeneratedImage::new(ImageReference::inline(vec![9u8; 16], "image/png"), "mock");
        // A directory squatting on the target name makes the final rename fail
        std::fs::create_dir(dir.path().join(image.file_name())).unwrap();

        let err = save(&Client::new(), &image, dir.path()).await.unwrap_err();

        assert!(matches!(err, GenerationError::Download(_)));
        assert_eq!(dir_entries(dir.path()), vec![image.file_name()]);
    }
}
