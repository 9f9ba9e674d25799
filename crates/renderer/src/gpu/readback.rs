use image::RgbaImage;

use crate::error::GpuError;

use super::backend::DisplayTarget;
use super::context::GpuContext;

const BYTES_PER_PIXEL: u32 = 4;

/// Row pitch of the staging buffer. wgpu requires 256-byte aligned rows.
pub(crate) fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

pub(crate) fn strip_row_padding(data: &[u8], width: u32, height: u32, padded: u32) -> Vec<u8> {
    let row = (width * BYTES_PER_PIXEL) as usize;
    let mut pixels = Vec::with_capacity(row * height as usize);
    for chunk in data.chunks(padded as usize).take(height as usize) {
        pixels.extend_from_slice(&chunk[..row.min(chunk.len())]);
    }
    pixels
}

pub(crate) fn read_display_target(
    context: &GpuContext,
    target: &DisplayTarget,
) -> Result<RgbaImage, GpuError> {
    let readback_error = |message: String| GpuError::Readback {
        label: "display target".to_string(),
        message,
    };

    let (width, height) = target.size();
    let padded = padded_bytes_per_row(width);
    let size = u64::from(padded) * u64::from(height);
    let staging = context.scoped("readback buffer", |device| {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback buffer"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        })
    })?;

    let mut encoder = context
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("readback encoder"),
        });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: &target.texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    context.queue.submit(Some(encoder.finish()));

    let slice = staging.slice(..);
    let (sender, receiver) = crossbeam_channel::bounded(1);
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    context
        .device
        .poll(wgpu::PollType::Wait)
        .map_err(|err| readback_error(err.to_string()))?;
    receiver
        .recv()
        .map_err(|_| readback_error("map callback dropped".to_string()))?
        .map_err(|err| readback_error(err.to_string()))?;

    let pixels = {
        let mapped = slice.get_mapped_range();
        strip_row_padding(&mapped, width, height, padded)
    };
    staging.unmap();
    context.take_device_error()?;

    tracing::debug!(width, height, "read back display target");
    RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| readback_error("pixel buffer size mismatch".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(1920), 7680);
    }

    #[test]
    fn strips_padding_from_each_row() {
        let padded = padded_bytes_per_row(2);
        let mut data = vec![0xEE; (padded * 2) as usize];
        data[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let second = padded as usize;
        data[second..second + 8].copy_from_slice(&[9, 10, 11, 12, 13, 14, 15, 16]);

        let pixels = strip_row_padding(&data, 2, 2, padded);
        assert_eq!(pixels, (1..=16).collect::<Vec<u8>>());
    }
}
