use bytemuck::Zeroable;

use crate::error::DecodeError;
use crate::layout::{Field, FieldKind, Layout};
use crate::record::{self, MaterialRecord};
use crate::vector::Vector3;

pub const MATERIAL_TYPE: Field = Field::new("materialType", FieldKind::U32, 0);
pub const TEXTURE_TYPE: Field = Field::new("textureType", FieldKind::U32, 4);
pub const REFRACTION_INDEX: Field = Field::new("refractionIndex", FieldKind::F32, 8);
// 12..16 is alignment padding: vec3<f32> is 16-byte aligned in WGSL.
pub const COLOR1: Field = Field::new("color1", FieldKind::Vec3, 16);
pub const COLOR2: Field = Field::new("color2", FieldKind::Vec3, 32);

pub const MATERIAL_LAYOUT: Layout = Layout {
    name: "Material",
    size: 44,
    fields: &[MATERIAL_TYPE, TEXTURE_TYPE, REFRACTION_INDEX, COLOR1, COLOR2],
};

const _: () = assert!(MATERIAL_LAYOUT.is_well_formed());

const MATERIAL_DIFFUSE: u32 = 0;
const MATERIAL_METAL: u32 = 1;
const MATERIAL_DIELECTRIC: u32 = 2;

const TEXTURE_SOLID: u32 = 0;
const TEXTURE_CHECKERED: u32 = 1;

/// Surface colouring shared by diffuse and metal materials.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Texture {
    Solid(Vector3),
    /// Alternating 3D checker of two colours.
    Checkered(Vector3, Vector3),
}

impl Texture {
    fn tag(&self) -> u32 {
        match self {
            Texture::Solid(_) => TEXTURE_SOLID,
            Texture::Checkered(..) => TEXTURE_CHECKERED,
        }
    }

    fn colors(&self) -> (Vector3, Vector3) {
        match *self {
            Texture::Solid(color) => (color, Vector3::ZERO),
            Texture::Checkered(first, second) => (first, second),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Material {
    Diffuse(Texture),
    Metal(Texture),
    Dielectric { refraction_index: f32 },
}

impl Material {
    pub fn solid_diffuse(color: Vector3) -> Self {
        Material::Diffuse(Texture::Solid(color))
    }

    pub fn checkered_diffuse(first: Vector3, second: Vector3) -> Self {
        Material::Diffuse(Texture::Checkered(first, second))
    }

    pub fn solid_metal(color: Vector3) -> Self {
        Material::Metal(Texture::Solid(color))
    }

    pub fn checkered_metal(first: Vector3, second: Vector3) -> Self {
        Material::Metal(Texture::Checkered(first, second))
    }

    pub fn dielectric(refraction_index: f32) -> Self {
        Material::Dielectric { refraction_index }
    }

    pub fn encode(&self) -> [u8; MATERIAL_LAYOUT.size] {
        record::to_array(&self.to_record())
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let record: MaterialRecord = bytemuck::pod_read_unaligned(MATERIAL_LAYOUT.record(bytes)?);
        Self::from_record(&record)
    }

    /// Unused fields and padding stay zero.
    pub(crate) fn to_record(&self) -> MaterialRecord {
        let (material_type, texture, refraction_index) = match self {
            Material::Diffuse(texture) => (MATERIAL_DIFFUSE, Some(texture), 0.0),
            Material::Metal(texture) => (MATERIAL_METAL, Some(texture), 0.0),
            Material::Dielectric { refraction_index } => {
                (MATERIAL_DIELECTRIC, None, *refraction_index)
            }
        };
        let (texture_type, (color1, color2)) = texture
            .map(|texture| (texture.tag(), texture.colors()))
            .unwrap_or((TEXTURE_SOLID, (Vector3::ZERO, Vector3::ZERO)));

        MaterialRecord {
            material_type,
            texture_type,
            refraction_index,
            color1,
            color2,
            ..MaterialRecord::zeroed()
        }
    }

    pub(crate) fn from_record(record: &MaterialRecord) -> Result<Self, DecodeError> {
        let texture = || match record.texture_type {
            TEXTURE_SOLID => Ok(Texture::Solid(record.color1)),
            TEXTURE_CHECKERED => Ok(Texture::Checkered(record.color1, record.color2)),
            value => Err(DecodeError::UnknownTag {
                field: TEXTURE_TYPE.name,
                value,
            }),
        };

        match record.material_type {
            MATERIAL_DIFFUSE => Ok(Material::Diffuse(texture()?)),
            MATERIAL_METAL => Ok(Material::Metal(texture()?)),
            MATERIAL_DIELECTRIC => Ok(Material::Dielectric {
                refraction_index: record.refraction_index,
            }),
            value => Err(DecodeError::UnknownTag {
                field: MATERIAL_TYPE.name,
                value,
            }),
        }
    }
}
