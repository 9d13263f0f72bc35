// src/wgpu_utils/binding_types.rs
//! Bind group layout entries shared by every program of the wgpu backend

/// Group 0: the program's uniform block, addressed with a per-draw dynamic offset
pub fn uniform_block_entry() -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: true,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Binding of the texture view at `slot`; its sampler follows at `+ 1`
pub fn slot_binding(slot: usize) -> u32 {
    slot as u32 * 2
}

/// Group 1: one filterable 2D texture and one sampler per slot
pub fn texture_slot_entries(slots: usize) -> Vec<wgpu::BindGroupLayoutEntry> {
    (0..slots)
        .flat_map(|slot| {
            [
                wgpu::BindGroupLayoutEntry {
                    binding: slot_binding(slot),
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: slot_binding(slot) + 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_bindings_interleave_textures_and_samplers() {
        let entries = texture_slot_entries(3);
        let bindings: Vec<u32> = entries.iter().map(|entry| entry.binding).collect();
        assert_eq!(bindings, vec![0, 1, 2, 3, 4, 5]);
        assert!(matches!(entries[4].ty, wgpu::BindingType::Texture { .. }));
        assert!(matches!(entries[5].ty, wgpu::BindingType::Sampler(_)));
    }
}
