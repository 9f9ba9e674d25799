//! `#[repr(C)]` mirrors of the shader structs. Their sizes and offsets are
//! checked against the [`crate::layout`] schemas below, so the bytes
//! `bytemuck` hands out are the bytes the programs read.

use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};

use crate::call_info::{
    ALREADY_COMPUTED_SAMPLES, HEIGHT, MAX_RAY_TRACE_DEPTH, RENDER_CALL_INFO_LAYOUT,
    SAMPLES_PER_COMPUTE_PASS, WIDTH,
};
use crate::material::{
    COLOR1, COLOR2, MATERIAL_LAYOUT, MATERIAL_TYPE, REFRACTION_INDEX, TEXTURE_TYPE,
};
use crate::sphere::{CENTER, MATERIAL, RADIUS, SPHERE_LAYOUT};
use crate::vector::Vector3;

// Records are cast in host byte order; the buffers are little-endian.
const _: () = assert!(
    cfg!(target_endian = "little"),
    "GPU records assume a little-endian host"
);

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct MaterialRecord {
    pub material_type: u32,
    pub texture_type: u32,
    pub refraction_index: f32,
    pub _pad0: u32,
    pub color1: Vector3,
    pub _pad1: u32,
    pub color2: Vector3,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct SphereRecord {
    pub center: Vector3,
    pub radius: f32,
    pub material: MaterialRecord,
    pub _pad: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct CallInfoRecord {
    pub width: u32,
    pub height: u32,
    pub max_ray_trace_depth: u32,
    pub samples_per_compute_pass: u32,
    pub already_computed_samples: u32,
}

const _: () = {
    assert!(size_of::<MaterialRecord>() == MATERIAL_LAYOUT.size);
    assert!(offset_of!(MaterialRecord, material_type) == MATERIAL_TYPE.offset);
    assert!(offset_of!(MaterialRecord, texture_type) == TEXTURE_TYPE.offset);
    assert!(offset_of!(MaterialRecord, refraction_index) == REFRACTION_INDEX.offset);
    assert!(offset_of!(MaterialRecord, color1) == COLOR1.offset);
    assert!(offset_of!(MaterialRecord, color2) == COLOR2.offset);

    assert!(size_of::<SphereRecord>() == SPHERE_LAYOUT.size);
    assert!(offset_of!(SphereRecord, center) == CENTER.offset);
    assert!(offset_of!(SphereRecord, radius) == RADIUS.offset);
    assert!(offset_of!(SphereRecord, material) == MATERIAL.offset);

    assert!(size_of::<CallInfoRecord>() == RENDER_CALL_INFO_LAYOUT.size);
    assert!(offset_of!(CallInfoRecord, width) == WIDTH.offset);
    assert!(offset_of!(CallInfoRecord, height) == HEIGHT.offset);
    assert!(offset_of!(CallInfoRecord, max_ray_trace_depth) == MAX_RAY_TRACE_DEPTH.offset);
    assert!(
        offset_of!(CallInfoRecord, samples_per_compute_pass) == SAMPLES_PER_COMPUTE_PASS.offset
    );
    assert!(
        offset_of!(CallInfoRecord, already_computed_samples) == ALREADY_COMPUTED_SAMPLES.offset
    );
};

/// Copies a record into a fixed-size byte array.
pub(crate) fn to_array<R: Pod, const N: usize>(record: &R) -> [u8; N] {
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(bytemuck::bytes_of(record));
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;

    #[test]
    fn zeroed_sphere_record_keeps_padding_clear() {
        let record = SphereRecord {
            center: Vector3::new(1.0, 2.0, 3.0),
            radius: 0.5,
            material: Material::dielectric(1.5).to_record(),
            ..SphereRecord::zeroed()
        };
        let bytes: [u8; 64] = to_array(&record);
        assert_eq!(&bytes[12..16], &0.5f32.to_le_bytes());
        assert_eq!(&bytes[16..20], &2u32.to_le_bytes());
        assert_eq!(&bytes[24..28], &1.5f32.to_le_bytes());
        assert!(bytes[28..].iter().all(|byte| *byte == 0));
    }

    #[test]
    fn call_info_words_follow_declaration_order() {
        let record = CallInfoRecord {
            width: 3,
            height: 5,
            max_ray_trace_depth: 7,
            samples_per_compute_pass: 11,
            already_computed_samples: 13,
        };
        let bytes: [u8; 20] = to_array(&record);
        let words: [u32; 5] = bytemuck::pod_read_unaligned(&bytes);
        assert_eq!(words, [3, 5, 7, 11, 13]);
    }
}
