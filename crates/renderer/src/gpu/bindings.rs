use std::collections::BTreeMap;

use super::backend::StorageTexture;

/// Resource kind expected at a binding index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Uniform,
    ReadOnlyStorage,
    Storage,
    StorageTexture {
        access: wgpu::StorageTextureAccess,
        format: wgpu::TextureFormat,
    },
}

impl BindingKind {
    fn takes_buffer(self) -> bool {
        !matches!(self, BindingKind::StorageTexture { .. })
    }

    fn to_wgpu(self) -> wgpu::BindingType {
        let buffer = |ty| wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        };
        match self {
            BindingKind::Uniform => buffer(wgpu::BufferBindingType::Uniform),
            BindingKind::ReadOnlyStorage => {
                buffer(wgpu::BufferBindingType::Storage { read_only: true })
            }
            BindingKind::Storage => buffer(wgpu::BufferBindingType::Storage { read_only: false }),
            BindingKind::StorageTexture { access, format } => wgpu::BindingType::StorageTexture {
                access,
                format,
                view_dimension: wgpu::TextureViewDimension::D2,
            },
        }
    }
}

/// Concrete resource attached to a binding.
pub enum BindingResource<'a, B, T> {
    Buffer(&'a B),
    Texture(&'a T),
}

impl<B, T> BindingResource<'_, B, T> {
    fn describe(&self) -> &'static str {
        match self {
            BindingResource::Buffer(_) => "buffer",
            BindingResource::Texture(_) => "texture",
        }
    }
}

impl<B, T> Clone for BindingResource<'_, B, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B, T> Copy for BindingResource<'_, B, T> {}

/// One `@binding(index)` slot: who sees it, what it is, and what backs it.
pub struct ShaderBinding<'a, B, T> {
    pub index: u32,
    pub visibility: wgpu::ShaderStages,
    pub kind: BindingKind,
    pub resource: BindingResource<'a, B, T>,
}

impl<B, T> Clone for ShaderBinding<'_, B, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B, T> Copy for ShaderBinding<'_, B, T> {}

impl<'a, B, T> ShaderBinding<'a, B, T> {
    pub fn uniform(index: u32, visibility: wgpu::ShaderStages, buffer: &'a B) -> Self {
        Self::buffer(index, visibility, BindingKind::Uniform, buffer)
    }

    pub fn read_only_storage(index: u32, visibility: wgpu::ShaderStages, buffer: &'a B) -> Self {
        Self::buffer(index, visibility, BindingKind::ReadOnlyStorage, buffer)
    }

    pub fn storage(index: u32, visibility: wgpu::ShaderStages, buffer: &'a B) -> Self {
        Self::buffer(index, visibility, BindingKind::Storage, buffer)
    }

    pub fn storage_texture(
        index: u32,
        visibility: wgpu::ShaderStages,
        access: wgpu::StorageTextureAccess,
        format: wgpu::TextureFormat,
        texture: &'a T,
    ) -> Self {
        Self {
            index,
            visibility,
            kind: BindingKind::StorageTexture { access, format },
            resource: BindingResource::Texture(texture),
        }
    }

    fn buffer(
        index: u32,
        visibility: wgpu::ShaderStages,
        kind: BindingKind,
        buffer: &'a B,
    ) -> Self {
        Self {
            index,
            visibility,
            kind,
            resource: BindingResource::Buffer(buffer),
        }
    }
}

/// Raised when a bind group does not describe the same slots as its layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("binding {index} is declared more than once")]
    DuplicateIndex { index: u32 },
    #[error("binding {index} is declared as {kind:?} but backed by a {resource}")]
    ResourceMismatch {
        index: u32,
        kind: BindingKind,
        resource: &'static str,
    },
    #[error("binding {index} is missing from the bind group")]
    Missing { index: u32 },
    #[error("binding {index} is not part of the layout")]
    Unexpected { index: u32 },
    #[error("binding {index} expects {expected:?} but the bind group supplies {actual:?}")]
    KindMismatch {
        index: u32,
        expected: BindingKind,
        actual: BindingKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSlot {
    pub index: u32,
    pub visibility: wgpu::ShaderStages,
    pub kind: BindingKind,
}

/// Index -> kind -> visibility table shared by a pipeline and every bind group
/// created for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingLayout {
    slots: Vec<LayoutSlot>,
}

impl BindingLayout {
    pub fn from_bindings<B, T>(bindings: &[ShaderBinding<'_, B, T>]) -> Result<Self, BindingError> {
        let indexed = index_bindings(bindings)?;
        let slots = indexed
            .values()
            .map(|binding| LayoutSlot {
                index: binding.index,
                visibility: binding.visibility,
                kind: binding.kind,
            })
            .collect();
        Ok(Self { slots })
    }

    /// Slots ordered by binding index.
    pub fn slots(&self) -> &[LayoutSlot] {
        &self.slots
    }

    /// Verifies that `bindings` fills exactly this layout's indices with the
    /// same kinds. Order does not matter.
    pub fn check<B, T>(&self, bindings: &[ShaderBinding<'_, B, T>]) -> Result<(), BindingError> {
        let mut indexed = index_bindings(bindings)?;
        for slot in &self.slots {
            let binding = indexed
                .remove(&slot.index)
                .ok_or(BindingError::Missing { index: slot.index })?;
            if binding.kind != slot.kind {
                return Err(BindingError::KindMismatch {
                    index: slot.index,
                    expected: slot.kind,
                    actual: binding.kind,
                });
            }
        }
        match indexed.keys().next() {
            Some(&index) => Err(BindingError::Unexpected { index }),
            None => Ok(()),
        }
    }

    pub fn layout_entries(&self) -> Vec<wgpu::BindGroupLayoutEntry> {
        self.slots
            .iter()
            .map(|slot| wgpu::BindGroupLayoutEntry {
                binding: slot.index,
                visibility: slot.visibility,
                ty: slot.kind.to_wgpu(),
                count: None,
            })
            .collect()
    }
}

fn index_bindings<'b, 'a, B, T>(
    bindings: &'b [ShaderBinding<'a, B, T>],
) -> Result<BTreeMap<u32, &'b ShaderBinding<'a, B, T>>, BindingError> {
    let mut indexed = BTreeMap::new();
    for binding in bindings {
        let resource_is_buffer = matches!(binding.resource, BindingResource::Buffer(_));
        if binding.kind.takes_buffer() != resource_is_buffer {
            return Err(BindingError::ResourceMismatch {
                index: binding.index,
                kind: binding.kind,
                resource: binding.resource.describe(),
            });
        }
        if indexed.insert(binding.index, binding).is_some() {
            return Err(BindingError::DuplicateIndex {
                index: binding.index,
            });
        }
    }
    Ok(indexed)
}

pub(crate) fn group_entries<'a>(
    bindings: &[ShaderBinding<'a, wgpu::Buffer, StorageTexture>],
) -> Vec<wgpu::BindGroupEntry<'a>> {
    bindings
        .iter()
        .map(|binding| wgpu::BindGroupEntry {
            binding: binding.index,
            resource: match binding.resource {
                BindingResource::Buffer(buffer) => buffer.as_entire_binding(),
                BindingResource::Texture(texture) => {
                    wgpu::BindingResource::TextureView(&texture.view)
                }
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use wgpu::ShaderStages;

    use super::*;

    type Binding<'a> = ShaderBinding<'a, &'static str, &'static str>;

    const UNIFORM: &str = "uniform";
    const SCENE: &str = "scene";
    const FIRST: &str = "accumulation 0";
    const SECOND: &str = "accumulation 1";

    fn compute_bindings<'a>(
        source: &'a &'static str,
        target: &'a &'static str,
    ) -> Vec<Binding<'a>> {
        vec![
            ShaderBinding::uniform(0, ShaderStages::COMPUTE, &UNIFORM),
            ShaderBinding::read_only_storage(1, ShaderStages::COMPUTE, &SCENE),
            ShaderBinding::read_only_storage(2, ShaderStages::COMPUTE, source),
            ShaderBinding::storage(3, ShaderStages::COMPUTE, target),
        ]
    }

    #[test]
    fn swapped_resources_share_one_layout() {
        let forward = compute_bindings(&FIRST, &SECOND);
        let backward = compute_bindings(&SECOND, &FIRST);
        let layout = BindingLayout::from_bindings(&forward).expect("layout");
        layout.check(&forward).expect("forward group");
        layout.check(&backward).expect("backward group");
        assert_eq!(layout.slots().len(), 4);
        assert_eq!(layout.slots()[3].kind, BindingKind::Storage);
    }

    #[test]
    fn layout_entries_follow_slot_kinds() {
        let layout =
            BindingLayout::from_bindings(&compute_bindings(&FIRST, &SECOND)).expect("layout");
        let entries = layout.layout_entries();
        let indices: Vec<u32> = entries.iter().map(|entry| entry.binding).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert!(matches!(
            entries[0].ty,
            wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                ..
            }
        ));
        assert!(matches!(
            entries[2].ty,
            wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                ..
            }
        ));
        assert!(matches!(
            entries[3].ty,
            wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: false },
                ..
            }
        ));
    }

    #[test]
    fn order_of_bindings_does_not_matter() {
        let mut bindings = compute_bindings(&FIRST, &SECOND);
        let layout = BindingLayout::from_bindings(&bindings).expect("layout");
        bindings.reverse();
        layout.check(&bindings).expect("reversed");
        assert_eq!(BindingLayout::from_bindings(&bindings).expect("layout"), layout);
    }

    #[test]
    fn rejects_duplicate_indices() {
        let bindings = vec![
            Binding::uniform(0, ShaderStages::COMPUTE, &UNIFORM),
            Binding::storage(0, ShaderStages::COMPUTE, &FIRST),
        ];
        assert_eq!(
            BindingLayout::from_bindings(&bindings),
            Err(BindingError::DuplicateIndex { index: 0 })
        );
    }

    #[test]
    fn rejects_kind_drift_between_layout_and_group() {
        let layout =
            BindingLayout::from_bindings(&compute_bindings(&FIRST, &SECOND)).expect("layout");
        let mut drifted = compute_bindings(&SECOND, &FIRST);
        drifted[3] = ShaderBinding::read_only_storage(3, ShaderStages::COMPUTE, &FIRST);
        assert_eq!(
            layout.check(&drifted),
            Err(BindingError::KindMismatch {
                index: 3,
                expected: BindingKind::Storage,
                actual: BindingKind::ReadOnlyStorage,
            })
        );
    }

    #[test]
    fn rejects_missing_and_extra_slots() {
        let layout =
            BindingLayout::from_bindings(&compute_bindings(&FIRST, &SECOND)).expect("layout");
        let mut short = compute_bindings(&FIRST, &SECOND);
        short.pop();
        assert_eq!(layout.check(&short), Err(BindingError::Missing { index: 3 }));

        let mut long = compute_bindings(&FIRST, &SECOND);
        long.push(ShaderBinding::storage(7, ShaderStages::COMPUTE, &FIRST));
        assert_eq!(layout.check(&long), Err(BindingError::Unexpected { index: 7 }));
    }

    #[test]
    fn storage_textures_need_texture_resources() {
        let image = "image";
        let texture = Binding::storage_texture(
            0,
            ShaderStages::COMPUTE,
            wgpu::StorageTextureAccess::WriteOnly,
            wgpu::TextureFormat::Rgba32Float,
            &image,
        );
        let layout = BindingLayout::from_bindings(&[texture]).expect("layout");
        assert!(matches!(
            layout.layout_entries()[0].ty,
            wgpu::BindingType::StorageTexture {
                access: wgpu::StorageTextureAccess::WriteOnly,
                format: wgpu::TextureFormat::Rgba32Float,
                view_dimension: wgpu::TextureViewDimension::D2,
            }
        ));

        let mismatched = ShaderBinding {
            resource: BindingResource::Buffer(&UNIFORM),
            ..texture
        };
        assert!(matches!(
            BindingLayout::from_bindings(&[mismatched]),
            Err(BindingError::ResourceMismatch {
                index: 0,
                resource: "buffer",
                ..
            })
        ));
    }
}
