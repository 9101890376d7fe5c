use wasm_bindgen::prelude::*;

pub mod engine;
pub mod error;
pub mod lighting;
pub mod math;

pub use engine::preview::PreviewScene;
pub use error::ShaderError;
pub use lighting::params::ShaderParams;
pub use lighting::{Shader, ShaderInput};

/// Initialize the WASM module (call once from JS).
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    // Fails only when a logger is already installed
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Render the scanlines assigned to this worker into an RGBA buffer.
///
/// `scene_json`: JSON `PreviewScene`; missing fields take defaults
/// `background_rgba`: optional RGBA8 panorama (empty slice for none)
/// `rgba_out`: Uint8Array view (width * height * 4 bytes)
/// `worker_id` / `worker_count`: interleaved scanline assignment
///
/// Returns `Float64Array [total_iterations, de_queries]` for this worker.
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn render_preview(
    scene_json: &str,
    background_rgba: &[u8],
    background_width: u32,
    width: u32,
    height: u32,
    rgba_out: &mut [u8],
    worker_id: u32,
    worker_count: u32,
) -> Result<js_sys::Float64Array, JsValue> {
    let scene = PreviewScene::from_json(scene_json).map_err(to_js)?;
    let textures = scene_textures(background_rgba, background_width).map_err(to_js)?;
    let stats = engine::preview::render_preview(&scene, &textures, width, height, rgba_out, worker_id, worker_count)
        .map_err(to_js)?;
    let out = [stats.total_iterations as f64, stats.de_queries as f64];
    Ok(js_sys::Float64Array::from(&out[..]))
}

/// Default shading parameters as JSON, for seeding the host UI.
#[wasm_bindgen]
pub fn shade_params_defaults() -> Result<String, JsValue> {
    serde_json::to_string(&ShaderParams::default()).map_err(|e| to_js(ShaderError::from(e)))
}

/// Validate a parameter document without rendering.
#[wasm_bindgen]
pub fn validate_shade_params(params_json: &str) -> Result<(), JsValue> {
    ShaderParams::from_json(params_json).map(|_| ()).map_err(to_js)
}

fn scene_textures(background_rgba: &[u8], background_width: u32) -> Result<lighting::SceneTextures, ShaderError> {
    let mut textures = lighting::SceneTextures::default();
    if !background_rgba.is_empty() && background_width > 0 {
        let width = background_width as usize;
        let height = background_rgba.len() / 4 / width;
        textures.background = Some(lighting::texture::Texture::from_rgba8(width, height, background_rgba)?);
    }
    Ok(textures)
}

fn to_js(e: ShaderError) -> JsValue {
    log::error!("{e}");
    JsValue::from_str(&e.to_string())
}

#[cfg(test)]
#[cfg(target_arch = "wasm32")]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_render_preview_reports_stats() {
        let mut rgba = vec![0u8; 8 * 8 * 4];
        let stats = render_preview("{}", &[], 0, 8, 8, &mut rgba, 0, 1).unwrap().to_vec();
        assert_eq!(stats.len(), 2);
        assert!(stats[1] > 0.0);
        assert!(rgba.chunks_exact(4).all(|p| p[3] == 255));
    }

    #[wasm_bindgen_test]
    fn test_rejects_bad_scene() {
        let mut rgba = vec![0u8; 4];
        assert!(render_preview("{\"params\":{\"quality\":{\"fov\":0}}}", &[], 0, 1, 1, &mut rgba, 0, 1).is_err());
        assert!(render_preview("{}", &[], 0, 8, 8, &mut rgba, 0, 1).is_err());
    }

    #[wasm_bindgen_test]
    fn test_defaults_validate() {
        let json = shade_params_defaults().unwrap();
        assert!(validate_shade_params(&json).is_ok());
    }
}
