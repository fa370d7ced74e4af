use reqwest::Client;

use crate::core::GeneratedImage;
use crate::download::fetch_bytes;

/// Display a generated image in the terminal using viuer.
///
/// Preview is best effort; failures are only logged.
pub async fn render(client: &Client, image: &GeneratedImage, width: u32, height: u32) {
    let bytes = match fetch_bytes(client, &image.reference).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!("Failed to fetch image for preview: {}", e);
            return;
        }
    };

    let decoded = match image::load_from_memory(&bytes) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::debug!("Failed to decode image for preview: {}", e);
            return;
        }
    };

    let conf = viuer::Config {
        width: Some(width),
        height: Some(height),
        absolute_offset: false,
        ..Default::default()
    };

    if let Err(e) = viuer::print(&decoded, &conf) {
        tracing::debug!("Failed to display image in terminal: {}", e);
    }
}
