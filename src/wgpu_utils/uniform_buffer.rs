// src/wgpu_utils/uniform_buffer.rs
//! Growable uniform buffer holding one block per draw call

/// Uniform buffer packed with equally sized blocks, each addressed through a
/// dynamic offset. Grows (re-allocates) when a frame needs more blocks.
pub struct DynamicUniformBuffer {
    buffer: wgpu::Buffer,
    stride: u64,
    capacity: u64,
}

impl DynamicUniformBuffer {
    const INITIAL_CAPACITY: u64 = 64;

    pub fn new(device: &wgpu::Device, stride: u64) -> Self {
        let stride = Self::aligned_stride(device, stride);
        Self {
            buffer: Self::allocate(device, stride * Self::INITIAL_CAPACITY),
            stride,
            capacity: Self::INITIAL_CAPACITY,
        }
    }

    fn aligned_stride(device: &wgpu::Device, stride: u64) -> u64 {
        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        stride.max(1).div_ceil(alignment) * alignment
    }

    fn allocate(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("DynamicUniformBuffer"),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Uploads `blocks` back to back and returns the dynamic offset of each.
    ///
    /// Returns `true` in the second position when the buffer was re-allocated
    /// (bind groups referencing the old buffer must be rebuilt).
    pub fn write_blocks(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        blocks: &[Vec<u8>],
    ) -> (Vec<u32>, bool) {
        let largest = blocks.iter().map(Vec::len).max().unwrap_or(0) as u64;
        let stride = Self::aligned_stride(device, largest).max(self.stride);
        let needed = blocks.len() as u64;

        let grown = stride != self.stride || needed > self.capacity;
        if grown {
            self.capacity = needed.max(self.capacity).next_power_of_two();
            self.stride = stride;
            self.buffer = Self::allocate(device, self.stride * self.capacity);
            log::debug!(
                "uniform buffer grown to {} blocks of {} bytes",
                self.capacity,
                self.stride
            );
        }

        let mut offsets = Vec::with_capacity(blocks.len());
        for (index, block) in blocks.iter().enumerate() {
            let offset = index as u64 * self.stride;
            if !block.is_empty() {
                queue.write_buffer(&self.buffer, offset, block);
            }
            offsets.push(offset as u32);
        }

        (offsets, grown)
    }

    /// Binding covering one block
    pub fn binding_resource(&self) -> wgpu::BindingResource<'_> {
        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &self.buffer,
            offset: 0,
            size: wgpu::BufferSize::new(self.stride),
        })
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }
}
