//! Double-buffered particle state.
//!
//! Each quantity (position, velocity) lives in two interchangeable storage
//! slots tagged READ and WRITE. The tag assignment is a single index; a
//! swap exchanges the tags in O(1) and never copies data. After `release()`
//! every accessor is a programming error: debug builds assert, release
//! builds are undefined.

use wgpu::util::DeviceExt;

use crate::simulation::init::InitialState;
use crate::simulation::types::Vec4;

/// Tag naming the two roles a slot can hold during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Read,
    Write,
}

/// Two storage slots plus the index of the one currently tagged READ.
#[derive(Debug)]
pub(crate) struct DoubleBuffer<B> {
    slots: [B; 2],
    read: usize,
}

impl<B> DoubleBuffer<B> {
    pub(crate) fn new(slots: [B; 2]) -> Self {
        Self { slots, read: 0 }
    }

    /// Index of the slot currently tagged READ (0 or 1).
    pub(crate) fn read_index(&self) -> usize {
        self.read
    }

    /// Untagged shared access by slot index, for building the per-slot
    /// render bind groups once at startup.
    pub(crate) fn slot(&self, index: usize) -> &B {
        &self.slots[index]
    }

    pub(crate) fn current(&self, slot: Slot) -> &B {
        match slot {
            Slot::Read => &self.slots[self.read],
            Slot::Write => &self.slots[1 - self.read],
        }
    }

    /// READ slot shared, WRITE slot exclusive, for one kernel dispatch.
    pub(crate) fn pair_mut(&mut self) -> (&B, &mut B) {
        let (lo, hi) = self.slots.split_at_mut(1);
        if self.read == 0 {
            (&lo[0], &mut hi[0])
        } else {
            (&hi[0], &mut lo[0])
        }
    }

    /// Exchanges the READ/WRITE tags. Index flip only, no data moves.
    pub(crate) fn swap(&mut self) {
        self.read = 1 - self.read;
    }
}

/// Full simulation state: ping-pong buffers for positions and velocities.
///
/// Both quantities swap together so the kernel's read pair and write pair
/// always come from the same generation.
#[derive(Debug)]
pub(crate) struct ParticleState<B> {
    positions: DoubleBuffer<B>,
    velocities: DoubleBuffer<B>,
    released: bool,
}

/// The four buffer bindings handed to the kernel for one tick.
pub(crate) struct FrameBuffers<'a, B> {
    pub(crate) read_pos: &'a B,
    pub(crate) write_pos: &'a mut B,
    pub(crate) read_vel: &'a B,
    pub(crate) write_vel: &'a mut B,
}

impl<B> ParticleState<B> {
    pub(crate) fn new(positions: DoubleBuffer<B>, velocities: DoubleBuffer<B>) -> Self {
        Self {
            positions,
            velocities,
            released: false,
        }
    }

    fn assert_live(&self) {
        debug_assert!(!self.released, "particle state accessed after release");
    }

    pub(crate) fn positions(&self) -> &DoubleBuffer<B> {
        self.assert_live();
        &self.positions
    }

    pub(crate) fn velocities(&self) -> &DoubleBuffer<B> {
        self.assert_live();
        &self.velocities
    }

    /// Index of the READ slot; both quantities always agree.
    pub(crate) fn read_index(&self) -> usize {
        self.assert_live();
        self.positions.read_index()
    }

    /// Borrows all four bindings for one dispatch.
    pub(crate) fn frame_mut(&mut self) -> FrameBuffers<'_, B> {
        self.assert_live();
        let (read_pos, write_pos) = self.positions.pair_mut();
        let (read_vel, write_vel) = self.velocities.pair_mut();
        FrameBuffers {
            read_pos,
            write_pos,
            read_vel,
            write_vel,
        }
    }

    /// Swaps both quantities after a dispatch has been issued.
    pub(crate) fn swap(&mut self) {
        self.assert_live();
        self.positions.swap();
        self.velocities.swap();
    }

    fn mark_released(&mut self) {
        self.released = true;
    }
}

impl ParticleState<wgpu::Buffer> {
    /// Allocates the four GPU storage buffers and seeds READ and WRITE
    /// slots of both quantities with identical generator output, so the
    /// first tick has a well-defined prior state in both slots.
    pub(crate) fn create(device: &wgpu::Device, init: &InitialState) -> Self {
        let storage = |label: &str, contents: &[Vec4]| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(contents),
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            })
        };

        let positions = DoubleBuffer::new([
            storage("Position Buffer 0", &init.positions),
            storage("Position Buffer 1", &init.positions),
        ]);
        let velocities = DoubleBuffer::new([
            storage("Velocity Buffer 0", &init.velocities),
            storage("Velocity Buffer 1", &init.velocities),
        ]);

        Self::new(positions, velocities)
    }

    /// Rewrites both slots of both quantities with fresh generator output
    /// (runtime policy switch / reseed). Host writes are enqueued before
    /// any later dispatch touching the buffers, so ordering holds.
    pub(crate) fn reseed(&self, queue: &wgpu::Queue, init: &InitialState) {
        self.assert_live();
        for slot in [Slot::Read, Slot::Write] {
            queue.write_buffer(
                self.positions.current(slot),
                0,
                bytemuck::cast_slice(&init.positions),
            );
            queue.write_buffer(
                self.velocities.current(slot),
                0,
                bytemuck::cast_slice(&init.velocities),
            );
        }
    }

    /// Frees the GPU memory. Terminal: no accessor may be called after
    /// this. The caller must not have a dispatch referencing these buffers
    /// enqueued after the release.
    pub(crate) fn release(&mut self) {
        self.assert_live();
        for slot in [Slot::Read, Slot::Write] {
            self.positions.current(slot).destroy();
            self.velocities.current(slot).destroy();
        }
        self.mark_released();
    }
}

#[cfg(test)]
impl ParticleState<Vec<Vec4>> {
    /// Host-side state with both slots cloned from the generator output.
    /// Substrate for kernel stand-ins in tests.
    pub(crate) fn from_initial(init: &InitialState) -> Self {
        Self::new(
            DoubleBuffer::new([init.positions.clone(), init.positions.clone()]),
            DoubleBuffer::new([init.velocities.clone(), init.velocities.clone()]),
        )
    }

    /// Same contract as the GPU release.
    pub(crate) fn release(&mut self) {
        self.assert_live();
        self.mark_released();
    }
}
