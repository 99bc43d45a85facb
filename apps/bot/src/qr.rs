//! Attachment download and QR payload decoding.

use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(8);

/// Fetch an image attachment and decode the first QR code in it.
///
/// Any failure (download, image decode, no QR grid) logs at debug and
/// yields `None` — the attachment is simply skipped.
pub async fn decode_from_url(http: &reqwest::Client, url: &str) -> Option<String> {
    let response = match http.get(url).timeout(FETCH_TIMEOUT).send().await {
        Ok(r) => r,
        Err(err) => {
            tracing::debug!(url, error = %err, "attachment fetch failed");
            return None;
        }
    };
    let bytes = match response.bytes().await {
        Ok(b) => b,
        Err(err) => {
            tracing::debug!(url, error = %err, "attachment body read failed");
            return None;
        }
    };
    decode_qr(&bytes)
}

/// Decode the first QR code found in the given image bytes.
pub fn decode_qr(bytes: &[u8]) -> Option<String> {
    let image = match image::load_from_memory(bytes) {
        Ok(i) => i.to_luma8(),
        Err(err) => {
            tracing::debug!(error = %err, "not a decodable image");
            return None;
        }
    };

    let mut prepared = rqrr::PreparedImage::prepare(image);
    for grid in prepared.detect_grids() {
        match grid.decode() {
            Ok((_, content)) => return Some(content),
            Err(err) => tracing::debug!(error = %err, "QR grid decode failed"),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_are_skipped() {
        assert_eq!(decode_qr(b"definitely not an image"), None);
        assert_eq!(decode_qr(&[]), None);
    }

    #[test]
    fn image_without_qr_yields_none() {
        // A valid 1x1 grayscale PNG with no QR content.
        let mut png = Vec::new();
        let img = image::GrayImage::from_pixel(1, 1, image::Luma([128u8]));
        image::DynamicImage::ImageLuma8(img)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        assert_eq!(decode_qr(&png), None);
    }
}
