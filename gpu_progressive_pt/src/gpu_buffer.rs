use wgpu::{BindGroupEntry, BindGroupLayoutEntry, BindingType, Buffer, BufferAddress, BufferBindingType, BufferUsages, Device, Queue, ShaderStages};

// a GPU buffer holding `count` records of `stride` bytes
pub struct GPUBuffer {
    name: Buffer,
    usage: BufferUsages,
    count: usize,
    stride: usize,
}

impl GPUBuffer {
    pub fn new(device: &Device, usage: BufferUsages, count: usize, stride: usize, label: Option<&str>)
               -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label,
            size: (count * stride) as BufferAddress,
            usage: usage | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            name: buffer,
            usage,
            count,
            stride,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn size(&self) -> BufferAddress {
        self.name.size()
    }

    pub fn queue_for_gpu(&self, queue: &Queue, data: &[u8]) {
        queue.write_buffer(&self.name, 0, data);
    }

    pub fn layout(&self, visibility: ShaderStages, binding: u32, read_only: bool) -> BindGroupLayoutEntry {
        let buffer_binding_type = if self.usage.contains(BufferUsages::UNIFORM) {
            BufferBindingType::Uniform
        } else {
            BufferBindingType::Storage { read_only }
        };
        BindGroupLayoutEntry {
            binding,
            visibility,
            ty: BindingType::Buffer {
                ty: buffer_binding_type,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }
    }

    pub fn binding(&self, binding: u32) -> BindGroupEntry<'_> {
        BindGroupEntry {
            binding,
            resource: self.name.as_entire_binding(),
        }
    }

    pub fn destroy(self) {
        self.name.destroy();
    }
}
