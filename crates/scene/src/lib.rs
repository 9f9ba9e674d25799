//! Scene model and fixed-layout encoders for the sphere path tracer.
//!
//! ```text
//!   Scene ──▶ [Sphere; N] ──▶ N × 64 bytes   (storage buffer, uploaded once)
//!   RenderCallInfo ─────────▶ 20 bytes        (uniform, rewritten every pass)
//! ```
//!
//! The byte offsets live in [`layout`] and are shared by the encoders,
//! decoders and tests. The renderer's WGSL programs declare matching structs.

mod call_info;
mod error;
pub mod layout;
mod material;
mod random;
mod record;
mod sphere;
mod vector;

pub use call_info::{RenderCallInfo, RENDER_CALL_INFO_LAYOUT};
pub use error::DecodeError;
pub use material::{Material, Texture, MATERIAL_LAYOUT};
pub use random::hsv_to_rgb;
pub use sphere::{Scene, Sphere, SPHERE_LAYOUT};
pub use vector::Vector3;
