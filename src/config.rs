//! Simulation configuration surface.
//!
//! A `SimConfig` is chosen once, normalized once, and stays fixed for the
//! lifetime of the simulation.

/// Initial-condition policy for seeding the particle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Policy {
    /// Uncorrelated positions and velocities inside the unit ball.
    Random,
    /// Positions on a thick spherical shell with tangential velocities.
    Shell,
    /// Radial velocity field: each body moves along its own position vector.
    Expand,
}

impl Policy {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Policy::Random => "Random",
            Policy::Shell => "Shell",
            Policy::Expand => "Expand",
        }
    }
}

/// GPU dispatch tile: `p` threads cooperate per body group, `q` bodies per
/// group. `p` must match the workgroup width compiled into the integration
/// shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TileShape {
    pub(crate) p: u32,
    pub(crate) q: u32,
}

/// Workgroup width of `integrate_bodies.wgsl`. `TileShape.p` has to agree
/// with this value for the dispatch arithmetic to line up.
pub(crate) const TILE_WIDTH: u32 = 64;

/// Body count the position-scale heuristic is normalized against.
pub(crate) const DEFAULT_NUM_BODIES: u32 = 65536;

#[derive(Debug, Clone, Copy)]
pub(crate) struct SimConfig {
    pub(crate) seed: u64,
    pub(crate) policy: Policy,
    pub(crate) num_bodies: u32,
    pub(crate) position_scale: f32,
    pub(crate) velocity_scale: f32,
    pub(crate) damping: f32,
    pub(crate) softening_squared: f32,
    pub(crate) speed: f32,
    pub(crate) tile: TileShape,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            policy: Policy::Expand,
            num_bodies: DEFAULT_NUM_BODIES,
            position_scale: 16.0,
            velocity_scale: 1.0,
            damping: 0.96,
            softening_squared: 0.1,
            speed: 1.0,
            tile: TileShape { p: TILE_WIDTH, q: 4 },
        }
    }
}

impl SimConfig {
    /// Validates and corrects the configuration before any buffer is sized.
    ///
    /// The body count is rounded up to the next multiple of 256 (kernel
    /// tiling requirement) and the correction is logged. An oversized tile
    /// (`p * q > 256`) is only logged: the simulation proceeds and the GPU
    /// results are undefined. The asymmetry is intentional.
    pub(crate) fn normalize(mut self) -> Self {
        if self.num_bodies % 256 != 0 {
            let corrected = self.num_bodies.div_ceil(256) * 256;
            log::warn!(
                "num_bodies must be a multiple of 256, rounding {} up to {}",
                self.num_bodies,
                corrected
            );
            self.num_bodies = corrected;
        }

        if self.tile.p * self.tile.q > 256 {
            log::error!(
                "tile shape {}x{} exceeds the 256-thread limit; simulation will have errors",
                self.tile.p,
                self.tile.q
            );
        }

        self
    }

    /// Number of thread-groups dispatched along the first axis each tick.
    pub(crate) fn group_count(&self) -> u32 {
        self.num_bodies / self.tile.p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_body_count_up_to_multiple_of_256() {
        let cfg = SimConfig {
            num_bodies: 300,
            ..SimConfig::default()
        }
        .normalize();
        assert_eq!(cfg.num_bodies, 512);
    }

    #[test]
    fn aligned_body_count_is_untouched() {
        let cfg = SimConfig {
            num_bodies: 1024,
            ..SimConfig::default()
        }
        .normalize();
        assert_eq!(cfg.num_bodies, 1024);
    }

    #[test]
    fn oversized_tile_is_accepted_unchanged() {
        let cfg = SimConfig {
            tile: TileShape { p: 64, q: 8 },
            ..SimConfig::default()
        }
        .normalize();
        // Logged but not corrected.
        assert_eq!(cfg.tile, TileShape { p: 64, q: 8 });
    }

    #[test]
    fn group_count_covers_all_bodies() {
        let cfg = SimConfig {
            num_bodies: 512,
            ..SimConfig::default()
        }
        .normalize();
        assert_eq!(cfg.group_count() * cfg.tile.p, 512);
    }
}
