use rand::Rng;

use crate::material::Material;
use crate::sphere::{Scene, Sphere};
use crate::vector::Vector3;

const GRID_EXTENT: i32 = 11;
const SMALL_RADIUS: f32 = 0.2;
const GLASS_INDEX: f32 = 1.5;

impl Scene {
    /// The demo scene: a jittered grid of small spheres on a checkered ground
    /// plus three large feature spheres (diffuse, glass, metal).
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let grid = (2 * GRID_EXTENT * 2 * GRID_EXTENT) as usize;
        let mut spheres = Vec::with_capacity(grid + 4);

        for x in -GRID_EXTENT..GRID_EXTENT {
            for z in -GRID_EXTENT..GRID_EXTENT {
                let choice: f32 = rng.gen();
                let material = if choice < 0.8 {
                    Material::solid_diffuse(random_color(rng))
                } else if choice < 0.95 {
                    Material::solid_metal(random_color(rng))
                } else {
                    Material::dielectric(GLASS_INDEX)
                };
                let center = Vector3::new(
                    x as f32 + rng.gen::<f32>() * 0.9,
                    SMALL_RADIUS,
                    z as f32 + rng.gen::<f32>() * 0.9,
                );
                spheres.push(Sphere::new(center, SMALL_RADIUS, material));
            }
        }

        spheres.push(Sphere::new(
            Vector3::new(0.0, -1000.0, 0.0),
            1000.0,
            Material::checkered_diffuse(
                Vector3::new(0.05, 0.05, 0.05),
                Vector3::new(0.95, 0.95, 0.95),
            ),
        ));
        spheres.push(Sphere::new(
            Vector3::new(-4.0, 1.0, 0.0),
            1.0,
            Material::solid_diffuse(Vector3::new(0.6, 0.3, 0.1)),
        ));
        spheres.push(Sphere::new(
            Vector3::new(0.0, 1.0, 0.0),
            1.0,
            Material::dielectric(GLASS_INDEX),
        ));
        spheres.push(Sphere::new(
            Vector3::new(4.0, 1.0, 0.0),
            1.0,
            Material::solid_metal(Vector3::new(0.7, 0.6, 0.5)),
        ));

        tracing::debug!(spheres = spheres.len(), "generated random scene");
        Scene::new(spheres)
    }
}

fn random_color<R: Rng + ?Sized>(rng: &mut R) -> Vector3 {
    hsv_to_rgb(rng.gen_range(0.0..360.0), 0.75, 0.45)
}

/// `hue` in degrees `[0, 360)`, saturation and value in `[0, 1]`.
pub fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> Vector3 {
    let h = hue / 60.0;
    let fraction = h - h.floor();

    let p = value * (1.0 - saturation);
    let q = value * (1.0 - saturation * fraction);
    let t = value * (1.0 - saturation * (1.0 - fraction));

    match h.floor() as i32 {
        0 => Vector3::new(value, t, p),
        1 => Vector3::new(q, value, p),
        2 => Vector3::new(p, value, t),
        3 => Vector3::new(p, q, value),
        4 => Vector3::new(t, p, value),
        5 => Vector3::new(value, p, q),
        _ => Vector3::ZERO,
    }
}
