use crate::error::DecodeError;
use crate::layout::{Field, FieldKind, Layout};
use crate::material::{Material, MATERIAL_LAYOUT};
use crate::record::{self, SphereRecord};
use crate::vector::Vector3;

pub const CENTER: Field = Field::new("center", FieldKind::Vec3, 0);
pub const RADIUS: Field = Field::new("radius", FieldKind::F32, 12);
pub const MATERIAL: Field = Field::new("material", FieldKind::Struct(&MATERIAL_LAYOUT), 16);

/// One sphere record. The 4 trailing bytes pad the stride to 64 so the
/// program can index spheres directly.
pub const SPHERE_LAYOUT: Layout = Layout {
    name: "Sphere",
    size: 64,
    fields: &[CENTER, RADIUS, MATERIAL],
};

const _: () = assert!(SPHERE_LAYOUT.is_well_formed());
const _: () = assert!(MATERIAL.end() == 60);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    pub center: Vector3,
    pub radius: f32,
    pub material: Material,
}

impl Sphere {
    pub fn new(center: Vector3, radius: f32, material: Material) -> Self {
        Self {
            center,
            radius,
            material,
        }
    }

    pub fn encode(&self) -> [u8; SPHERE_LAYOUT.size] {
        record::to_array(&self.to_record())
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let record: SphereRecord = bytemuck::pod_read_unaligned(SPHERE_LAYOUT.record(bytes)?);
        Self::from_record(&record)
    }

    fn to_record(&self) -> SphereRecord {
        SphereRecord {
            center: self.center,
            radius: self.radius,
            material: self.material.to_record(),
            _pad: 0,
        }
    }

    fn from_record(record: &SphereRecord) -> Result<Self, DecodeError> {
        Ok(Self {
            center: record.center,
            radius: record.radius,
            material: Material::from_record(&record.material)?,
        })
    }
}

/// Ordered, immutable sphere list. Order is the intersection test order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    spheres: Vec<Sphere>,
}

impl Scene {
    pub fn new(spheres: Vec<Sphere>) -> Self {
        Self { spheres }
    }

    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    pub fn len(&self) -> usize {
        self.spheres.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty()
    }

    /// Packed storage buffer contents: sphere `i` occupies `i * 64 .. (i + 1) * 64`.
    pub fn encode(&self) -> Vec<u8> {
        let records: Vec<SphereRecord> = self.spheres.iter().map(Sphere::to_record).collect();
        bytemuck::cast_slice(&records).to_vec()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() % SPHERE_LAYOUT.size != 0 {
            return Err(DecodeError::Truncated {
                layout: SPHERE_LAYOUT.name,
                expected: bytes.len().next_multiple_of(SPHERE_LAYOUT.size),
                actual: bytes.len(),
            });
        }
        bytes
            .chunks_exact(SPHERE_LAYOUT.size)
            .map(Sphere::decode)
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }
}

impl FromIterator<Sphere> for Scene {
    fn from_iter<I: IntoIterator<Item = Sphere>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
