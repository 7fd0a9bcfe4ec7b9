/**
 * This module contains all logic for loading textures from external files.
 */
use crate::{
    data_structures::{scene::TextureRequest, texture::Texture},
    error::CarouselError,
};

pub mod texture;

/// Fetches and decodes a requested image and uploads it with the requested
/// sampling settings. Any failure is reported as an asset load failure for
/// that path.
pub async fn load_texture(
    request: &TextureRequest,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Result<Texture, CarouselError> {
    let data = texture::load_binary(&request.path)
        .await
        .map_err(|err| CarouselError::asset_load_failure(&request.path, err))?;
    Texture::from_bytes(device, queue, &data, &request.path, request.settings)
        .map_err(|err| CarouselError::asset_load_failure(&request.path, err))
}
