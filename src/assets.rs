// src/assets.rs

use image::RgbaImage;

use crate::error::AssetError;

const PRESS_BUTTON_PNG: &[u8] = include_bytes!("../assets/images/press-button.png");

/// Assets compiled into the binary, keyed by their path under `assets/`.
const EMBEDDED: &[(&str, &[u8])] = &[("images/press-button.png", PRESS_BUTTON_PNG)];

pub fn embedded(name: &str) -> Option<&'static [u8]> {
    EMBEDDED.iter().find(|(path, _)| *path == name).map(|(_, bytes)| *bytes)
}

pub fn decode_rgba(name: &str, bytes: &[u8]) -> Result<RgbaImage, AssetError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|source| AssetError::Decode { name: name.to_string(), source })
}

/// Decodes an embedded image into RGBA8, top row first.
pub fn load_image(name: &str) -> Result<RgbaImage, AssetError> {
    let bytes = embedded(name).ok_or_else(|| AssetError::NotFound(name.to_string()))?;
    decode_rgba(name, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo_scene::MODAL_TEXTURE;

    #[test]
    fn modal_texture_decodes() {
        let img = load_image(MODAL_TEXTURE).unwrap();
        assert_eq!(img.dimensions(), (512, 512));
        // Opaque card with a light frame.
        assert_eq!(img.get_pixel(0, 0).0[3], 255);
        assert!(img.get_pixel(2, 2).0[0] > 128);
        assert!(img.get_pixel(256, 40).0[0] < 64);
    }

    #[test]
    fn unknown_asset_is_reported() {
        assert!(matches!(load_image("images/missing.jpg"), Err(AssetError::NotFound(_))));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = decode_rgba("broken.png", b"not an image").unwrap_err();
        assert!(matches!(err, AssetError::Decode { .. }));
        assert!(err.to_string().contains("broken.png"));
    }
}
