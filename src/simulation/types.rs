use bytemuck::{Pod, Zeroable};

use crate::config::SimConfig;

/// One particle quantity record: xyz payload, w fixed at 1.0 (homogeneous
/// padding expected by the kernel, no physical meaning).
pub(crate) type Vec4 = [f32; 4];

/// Scalar parameter block handed to the integration kernel each tick.
/// Layout matches the uniform block in `integrate_bodies.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct IntegrateParams {
    pub(crate) delta_time: f32,
    pub(crate) damping: f32,
    pub(crate) softening_squared: f32,
    pub(crate) num_bodies: u32,
    /// (p, q, 1, 0)
    pub(crate) thread_dim: [u32; 4],
    /// (num_bodies / p, 1, 1, 0)
    pub(crate) group_dim: [u32; 4],
}

impl IntegrateParams {
    /// Builds the per-tick parameter block. `delta_time` is the wall-clock
    /// frame delta; the configured `speed` factor is applied here.
    pub(crate) fn for_tick(cfg: &SimConfig, delta_time: f32) -> Self {
        Self {
            delta_time: delta_time * cfg.speed,
            damping: cfg.damping,
            softening_squared: cfg.softening_squared,
            num_bodies: cfg.num_bodies,
            thread_dim: [cfg.tile.p, cfg.tile.q, 1, 0],
            group_dim: [cfg.group_count(), 1, 1, 0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_time_is_scaled_by_speed() {
        let cfg = SimConfig {
            speed: 4.0,
            num_bodies: 512,
            ..SimConfig::default()
        }
        .normalize();
        let params = IntegrateParams::for_tick(&cfg, 0.25);
        assert_eq!(params.delta_time, 1.0);
        assert_eq!(params.num_bodies, 512);
        assert_eq!(params.thread_dim, [64, 4, 1, 0]);
        assert_eq!(params.group_dim, [8, 1, 1, 0]);
    }
}
