use crate::error::DecodeError;
use crate::layout::{Field, FieldKind, Layout};
use crate::record::{self, CallInfoRecord};

pub const WIDTH: Field = Field::new("width", FieldKind::U32, 0);
pub const HEIGHT: Field = Field::new("height", FieldKind::U32, 4);
pub const MAX_RAY_TRACE_DEPTH: Field = Field::new("maxRayTraceDepth", FieldKind::U32, 8);
pub const SAMPLES_PER_COMPUTE_PASS: Field =
    Field::new("samplesPerComputePass", FieldKind::U32, 12);
pub const ALREADY_COMPUTED_SAMPLES: Field =
    Field::new("alreadyComputedSamples", FieldKind::U32, 16);

pub const RENDER_CALL_INFO_LAYOUT: Layout = Layout {
    name: "RenderCallInfo",
    size: 20,
    fields: &[
        WIDTH,
        HEIGHT,
        MAX_RAY_TRACE_DEPTH,
        SAMPLES_PER_COMPUTE_PASS,
        ALREADY_COMPUTED_SAMPLES,
    ],
};

const _: () = assert!(RENDER_CALL_INFO_LAYOUT.is_well_formed());

/// Render-parameter uniform shared by the compute and display programs.
///
/// Everything except the accumulated sample counter is fixed at construction.
/// The counter only moves forward, one compute pass at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderCallInfo {
    width: u32,
    height: u32,
    max_ray_trace_depth: u32,
    samples_per_compute_pass: u32,
    already_computed_samples: u32,
}

impl RenderCallInfo {
    pub fn new(
        width: u32,
        height: u32,
        max_ray_trace_depth: u32,
        samples_per_compute_pass: u32,
    ) -> Self {
        Self {
            width,
            height,
            max_ray_trace_depth,
            samples_per_compute_pass,
            already_computed_samples: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn max_ray_trace_depth(&self) -> u32 {
        self.max_ray_trace_depth
    }

    pub fn samples_per_compute_pass(&self) -> u32 {
        self.samples_per_compute_pass
    }

    pub fn already_computed_samples(&self) -> u32 {
        self.already_computed_samples
    }

    /// Accounts for one completed compute dispatch.
    pub fn record_pass(&mut self) {
        self.already_computed_samples = self
            .already_computed_samples
            .saturating_add(self.samples_per_compute_pass);
    }

    /// Pure function of the current field values.
    pub fn encode(&self) -> [u8; RENDER_CALL_INFO_LAYOUT.size] {
        record::to_array(&CallInfoRecord {
            width: self.width,
            height: self.height,
            max_ray_trace_depth: self.max_ray_trace_depth,
            samples_per_compute_pass: self.samples_per_compute_pass,
            already_computed_samples: self.already_computed_samples,
        })
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let record: CallInfoRecord =
            bytemuck::pod_read_unaligned(RENDER_CALL_INFO_LAYOUT.record(bytes)?);
        Ok(Self {
            width: record.width,
            height: record.height,
            max_ray_trace_depth: record.max_ray_trace_depth,
            samples_per_compute_pass: record.samples_per_compute_pass,
            already_computed_samples: record.already_computed_samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_five_consecutive_words() {
        let info = RenderCallInfo::new(1920, 1080, 50, 4);
        let bytes = info.encode();
        assert_eq!(bytes.len(), 20);
        let words: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        assert_eq!(words, vec![1920, 1080, 50, 4, 0]);
    }

    #[test]
    fn counter_grows_by_pass_size_and_nothing_else_changes() {
        let mut info = RenderCallInfo::new(64, 32, 8, 3);
        for _ in 0..7 {
            info.record_pass();
            let _ = info.encode();
        }
        let decoded = RenderCallInfo::decode(&info.encode()).expect("decode");
        assert_eq!(decoded.already_computed_samples(), 21);
        assert_eq!(decoded.width(), 64);
        assert_eq!(decoded.height(), 32);
        assert_eq!(decoded.max_ray_trace_depth(), 8);
        assert_eq!(decoded.samples_per_compute_pass(), 3);
    }

    #[test]
    fn counter_saturates_instead_of_wrapping() {
        let mut info = RenderCallInfo::new(1, 1, 1, u32::MAX);
        info.record_pass();
        info.record_pass();
        assert_eq!(info.already_computed_samples(), u32::MAX);
    }
}
