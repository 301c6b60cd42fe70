//! Tick protocol: one kernel dispatch, one buffer swap.
//!
//! A `Stepper` is the Running half of the lifecycle: constructing it takes
//! ownership of an allocated, seeded particle state; `release()` is the
//! terminal transition back to Idle. Ticks are strictly sequential: each
//! call fully enqueues its dispatch before the next one starts, and the
//! swap happens only after the dispatch is issued, so the new READ slot is
//! exactly the slot the kernel just wrote.

use crate::config::SimConfig;
use crate::simulation::buffers::ParticleState;
use crate::simulation::kernel::IntegrateKernel;
use crate::simulation::types::IntegrateParams;

pub(crate) struct Stepper<K: IntegrateKernel> {
    kernel: K,
    state: ParticleState<K::Buffer>,
    cfg: SimConfig,
    tick: u64,
}

impl<K: IntegrateKernel> Stepper<K> {
    /// Idle -> Running. `cfg` must already be normalized.
    pub(crate) fn new(kernel: K, state: ParticleState<K::Buffer>, cfg: SimConfig) -> Self {
        log::info!(
            "simulation running: {} bodies, policy {}, {} groups per tick",
            cfg.num_bodies,
            cfg.policy.name(),
            cfg.group_count()
        );
        Self {
            kernel,
            state,
            cfg,
            tick: 0,
        }
    }

    /// Advances the simulation by one tick of `delta_time` wall-clock
    /// seconds (scaled by the configured speed).
    pub(crate) fn step(&mut self, delta_time: f32) {
        let params = IntegrateParams::for_tick(&self.cfg, delta_time);
        let group_count = self.cfg.group_count();

        self.kernel
            .dispatch(&params, self.state.frame_mut(), group_count);

        // The kernel's output slot becomes READ; the old READ goes stale
        // until the next tick overwrites it.
        self.state.swap();
        self.tick += 1;
    }

    pub(crate) fn ticks(&self) -> u64 {
        self.tick
    }

    pub(crate) fn config(&self) -> &SimConfig {
        &self.cfg
    }

    /// Mutable access for the runtime-tunable parts of the configuration
    /// (policy and seed). Buffer-sizing fields must stay untouched while
    /// running.
    pub(crate) fn config_mut(&mut self) -> &mut SimConfig {
        &mut self.cfg
    }

    pub(crate) fn state(&self) -> &ParticleState<K::Buffer> {
        &self.state
    }

    /// Running -> Idle (terminal). Consumes the stepper and hands the
    /// state back so the caller can release it after the last enqueued
    /// dispatch: resource lifetime must outlive the last use.
    pub(crate) fn into_state(self) -> ParticleState<K::Buffer> {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Policy;
    use crate::simulation::buffers::{FrameBuffers, Slot};
    use crate::simulation::init::generate;
    use crate::simulation::types::Vec4;

    /// Copies input to output unchanged. Under this kernel the READ slot
    /// after any number of ticks must equal the generator output exactly.
    struct IdentityKernel;

    impl IntegrateKernel for IdentityKernel {
        type Buffer = Vec<Vec4>;

        fn dispatch(
            &mut self,
            _params: &IntegrateParams,
            frame: FrameBuffers<'_, Vec<Vec4>>,
            _group_count: u32,
        ) {
            frame.write_pos.copy_from_slice(frame.read_pos);
            frame.write_vel.copy_from_slice(frame.read_vel);
        }
    }

    /// Tags every record's x component with a monotonically increasing
    /// tick counter: output = input + 1. Makes buffer generations visible.
    struct CountingKernel {
        dispatches: u32,
        last_params: Option<IntegrateParams>,
        last_group_count: u32,
    }

    impl CountingKernel {
        fn new() -> Self {
            Self {
                dispatches: 0,
                last_params: None,
                last_group_count: 0,
            }
        }
    }

    impl IntegrateKernel for CountingKernel {
        type Buffer = Vec<Vec4>;

        fn dispatch(
            &mut self,
            params: &IntegrateParams,
            frame: FrameBuffers<'_, Vec<Vec4>>,
            group_count: u32,
        ) {
            for (dst, src) in frame.write_pos.iter_mut().zip(frame.read_pos.iter()) {
                *dst = [src[0] + 1.0, src[1], src[2], src[3]];
            }
            for (dst, src) in frame.write_vel.iter_mut().zip(frame.read_vel.iter()) {
                *dst = [src[0] + 1.0, src[1], src[2], src[3]];
            }
            self.dispatches += 1;
            self.last_params = Some(*params);
            self.last_group_count = group_count;
        }
    }

    fn test_config() -> SimConfig {
        SimConfig {
            num_bodies: 256,
            policy: Policy::Random,
            seed: 17,
            ..SimConfig::default()
        }
        .normalize()
    }

    fn seeded_stepper<K: IntegrateKernel<Buffer = Vec<Vec4>>>(
        kernel: K,
    ) -> (crate::simulation::init::InitialState, Stepper<K>) {
        let cfg = test_config();
        let init = generate(
            cfg.policy,
            cfg.num_bodies,
            cfg.seed,
            cfg.position_scale,
            cfg.velocity_scale,
        );
        let state = ParticleState::from_initial(&init);
        (init, Stepper::new(kernel, state, cfg))
    }

    #[test]
    fn identity_kernel_preserves_generator_output_across_ticks() {
        let (init, mut stepper) = seeded_stepper(IdentityKernel);
        for _ in 0..5 {
            stepper.step(0.016);
        }
        assert_eq!(stepper.ticks(), 5);
        assert_eq!(
            stepper.state().positions().current(Slot::Read),
            &init.positions
        );
        assert_eq!(
            stepper.state().velocities().current(Slot::Read),
            &init.velocities
        );
    }

    #[test]
    fn read_slot_holds_tick_k_and_write_slot_tick_k_minus_one() {
        let (init, mut stepper) = seeded_stepper(CountingKernel::new());
        let k = 4;
        for _ in 0..k {
            stepper.step(0.016);
        }

        let base = init.positions[0][0];
        let read = stepper.state().positions().current(Slot::Read);
        let write = stepper.state().positions().current(Slot::Write);
        assert_eq!(read[0][0], base + k as f32);
        assert_eq!(write[0][0], base + (k - 1) as f32);
    }

    #[test]
    fn swap_alternates_the_read_index_every_tick() {
        let (_, mut stepper) = seeded_stepper(IdentityKernel);
        assert_eq!(stepper.state().read_index(), 0);
        stepper.step(0.016);
        assert_eq!(stepper.state().read_index(), 1);
        stepper.step(0.016);
        assert_eq!(stepper.state().read_index(), 0);
    }

    #[test]
    fn dispatch_covers_n_over_p_groups_with_scaled_time() {
        let (_, mut stepper) = seeded_stepper(CountingKernel::new());
        stepper.step(0.5);

        let cfg = *stepper.config();
        let kernel = &stepper.kernel;
        assert_eq!(kernel.dispatches, 1);
        assert_eq!(kernel.last_group_count, cfg.num_bodies / cfg.tile.p);
        let params = kernel.last_params.expect("dispatch recorded params");
        assert_eq!(params.delta_time, 0.5 * cfg.speed);
        assert_eq!(params.group_dim[0], cfg.group_count());
    }

    #[test]
    fn teardown_returns_state_for_release() {
        let (_, mut stepper) = seeded_stepper(IdentityKernel);
        stepper.step(0.016);
        let mut state = stepper.into_state();
        state.release();
    }
}
