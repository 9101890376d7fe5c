/// Texture storage, surface texture mapping, environment reflection, and
/// normal mapping.
///
/// Textures are read-only for the duration of a render pass. Sampling is
/// bilinear with wrap-around in both directions.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::engine::types::{Rgb, Vec3D};
use crate::error::ShaderError;
use crate::lighting::material::{Material, ObjectData};
use crate::lighting::ShaderInput;
use crate::math::{math3d, utils};

/// In-memory RGB image with f64 channels in [0, 1].
#[derive(Clone, Debug)]
pub struct Texture {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl Texture {
    pub fn new(width: usize, height: usize, pixels: Vec<Rgb>) -> Result<Self, ShaderError> {
        if width == 0 || height == 0 {
            return Err(ShaderError::invalid("texture", "dimensions must be non-zero"));
        }
        if pixels.len() != width * height {
            return Err(ShaderError::invalid(
                "texture",
                format!("expected {} pixels, got {}", width * height, pixels.len()),
            ));
        }
        Ok(Self { width, height, pixels })
    }

    /// Single-colour 1×1 texture.
    pub fn solid(colour: Rgb) -> Self {
        Self { width: 1, height: 1, pixels: vec![colour] }
    }

    /// Decode a packed RGBA8 buffer; alpha is ignored.
    pub fn from_rgba8(width: usize, height: usize, data: &[u8]) -> Result<Self, ShaderError> {
        let needed = width * height * 4;
        if data.len() < needed {
            return Err(ShaderError::BufferTooSmall { needed, got: data.len() });
        }
        let pixels = data[..needed]
            .chunks_exact(4)
            .map(|p| Rgb::new(utils::byte_to_float(p[0]), utils::byte_to_float(p[1]), utils::byte_to_float(p[2])))
            .collect();
        Self::new(width, height, pixels)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn texel(&self, x: i64, y: i64) -> Rgb {
        let xi = x.rem_euclid(self.width as i64) as usize;
        let yi = y.rem_euclid(self.height as i64) as usize;
        self.pixels[yi * self.width + xi]
    }

    /// Bilinear sample at pixel coordinates.
    pub fn pixel(&self, x: f64, y: f64) -> Rgb {
        if !x.is_finite() || !y.is_finite() {
            return self.texel(0, 0);
        }
        // Wrap before the integer conversion so huge coordinates stay in range
        let x = x.rem_euclid(self.width as f64);
        let y = y.rem_euclid(self.height as f64);
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (xi, yi) = (x0 as i64, y0 as i64);
        let top = self.texel(xi, yi).mix(&self.texel(xi + 1, yi), fx);
        let bottom = self.texel(xi, yi + 1).mix(&self.texel(xi + 1, yi + 1), fx);
        top.mix(&bottom, fy)
    }

    /// Bilinear sample at normalized coordinates, one period per unit.
    pub fn pixel_uv(&self, u: f64, v: f64) -> Rgb {
        self.pixel(u * self.width as f64, v * self.height as f64)
    }

    /// Decode a tangent-space normal; `bump` scales the in-plane components.
    pub fn normal_map(&self, u: f64, v: f64, bump: f64) -> Vec3D {
        let c = self.pixel_uv(u, v);
        let n = Vec3D::new(-(c.r * 2.0 - 1.0) * bump, -(c.g * 2.0 - 1.0) * bump, c.b);
        math3d::vec3d_normalized(&n)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureMappingType {
    #[default]
    Planar,
    Cylindrical,
    Spherical,
    Cubic,
}

/// Texture coordinates plus the in-plane basis rotated back to world space.
#[derive(Clone, Copy, Debug)]
pub struct TextureCoords {
    pub u: f64,
    pub v: f64,
    pub tex_x: Vec3D,
    pub tex_y: Vec3D,
}

/// Project a world point into the material's texture space.
pub fn texture_mapping(
    in_point: &Vec3D,
    normal: &Vec3D,
    object: &ObjectData,
    material: &Material,
) -> TextureCoords {
    let mut point = math3d::mat3_mul_vec(&object.rotation, &(*in_point - object.position));
    point = Vec3D::new(point.x / object.size.x, point.y / object.size.y, point.z / object.size.z);
    point = point - material.texture_center;
    point = math3d::mat3_mul_vec(&material.texture_rotation, &point);
    let scale = material.texture_scale;

    let (u, v, tex_x, tex_y) = match material.texture_mapping {
        TextureMappingType::Planar => (point.x / scale.x, point.y / scale.y, Vec3D::X, Vec3D::Y),
        TextureMappingType::Cylindrical => {
            let alpha = utils::wrap(-math3d::vec3d_alpha(&point) + 2.5 * PI, 2.0 * PI);
            let tex_y = Vec3D::new(0.0, 0.0, -1.0);
            let tex_x = math3d::vec3d_cross(&tex_y, &point);
            (alpha / (2.0 * PI) / scale.x, -point.z / scale.y, tex_x, tex_y)
        }
        TextureMappingType::Spherical => {
            let alpha = utils::wrap(-math3d::vec3d_alpha(&point) + 2.5 * PI, 2.0 * PI);
            let beta = -math3d::vec3d_beta(&point);
            let tex_x = math3d::vec3d_normalized(&math3d::vec3d_cross(&Vec3D::new(0.0, 0.0, -1.0), &point));
            let tex_y = math3d::vec3d_cross(&point, &tex_x);
            (alpha / (2.0 * PI) / scale.x, beta / PI / scale.y, tex_x, tex_y)
        }
        TextureMappingType::Cubic => {
            let p = Vec3D::new(point.x / scale.x, point.y / scale.y, point.z / scale.z);
            cubic_face(&p, normal)
        }
    };

    TextureCoords {
        u,
        v,
        tex_x: to_world(&tex_x, object, material),
        tex_y: to_world(&tex_y, object, material),
    }
}

/// Pick the face of the dominant normal axis and project the other two axes.
fn cubic_face(p: &Vec3D, n: &Vec3D) -> (f64, f64, Vec3D, Vec3D) {
    let (ax, ay, az) = (n.x.abs(), n.y.abs(), n.z.abs());
    let z_face = |p: &Vec3D| {
        if n.z > 0.0 {
            (p.x, p.y, Vec3D::X, Vec3D::Y)
        } else {
            (p.x, p.y, -Vec3D::X, -Vec3D::Y)
        }
    };
    if ax > ay {
        if ax > az {
            if n.x > 0.0 {
                (p.y, -p.z, -Vec3D::Y, Vec3D::Z)
            } else {
                (p.y, -p.z, Vec3D::Y, -Vec3D::Z)
            }
        } else {
            z_face(p)
        }
    } else if ay > az {
        if n.y > 0.0 {
            (p.x, -p.z, Vec3D::X, -Vec3D::Z)
        } else {
            (p.x, -p.z, -Vec3D::X, Vec3D::Z)
        }
    } else {
        z_face(p)
    }
}

fn to_world(v: &Vec3D, object: &ObjectData, material: &Material) -> Vec3D {
    let v = math3d::mat3_transpose_mul_vec(&object.rotation, v);
    math3d::mat3_transpose_mul_vec(&material.texture_rotation, &v)
}

/// Sample `texture` at the surface point's texture coordinates.
pub fn texture_shader(input: &ShaderInput, texture: &Texture) -> Rgb {
    let tc = texture_mapping(&input.point, &input.normal, input.object, input.material);
    texture.pixel_uv(tc.u + 0.5, tc.v + 0.5)
}

/// Reflect the view vector about the normal and look it up in an
/// equirectangular environment map.
pub fn env_mapping(input: &ShaderInput, env_map: &Texture) -> Rgb {
    let dot = -math3d::vec3d_dot(&input.view_vector, &input.normal);
    let reflect = input.normal * (2.0 * dot) + input.view_vector;

    let alpha = math3d::vec3d_alpha(&reflect) + PI;
    let mut beta = math3d::vec3d_beta(&reflect);
    let width = env_map.width() as f64;
    let height = env_map.height() as f64;

    if beta > 0.5 * PI {
        beta = 0.5 * PI - beta;
    }
    if beta < -0.5 * PI {
        beta = -0.5 * PI + beta;
    }

    let dtx = ((alpha / (2.0 * PI)) * width + width * 8.25) % width;
    let dty = ((beta / PI + 0.5) * height + height * 8.0) % height;
    env_map.pixel(dtx.max(0.0), dty.max(0.0))
}

/// Perturb the surface normal by the material's normal map.
pub fn normal_map_shader(input: &ShaderInput, normal_map: &Texture) -> Vec3D {
    let tc = texture_mapping(&input.point, &input.normal, input.object, input.material);
    let n = input.normal;
    let t = math3d::vec3d_normalized(&math3d::vec3d_cross(&n, &tc.tex_x));
    let b = math3d::vec3d_normalized(&math3d::vec3d_cross(&n, &tc.tex_y));
    let tex = normal_map.normal_map(tc.u + 0.5, tc.v + 0.5, input.material.normal_map_strength);

    // Columns of the basis are (b, t, n)
    let result = b * tex.x + t * tex.y + n * tex.z;
    math3d::vec3d_normalized(&result)
}
