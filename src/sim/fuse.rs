//! Fuse / activation state machine
//!
//! Flying -> Armed -> Activated -> Expired. Transitions only ever move forward
//! and each one is latched, so repeated triggers are harmless.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FuseState {
    /// In the air, fuse not yet counting (arm-on-collision only)
    Flying,
    /// Fuse counting down
    Armed,
    /// Effect spawned, motion stopped
    Activated,
    /// Done; the host may despawn the projectile
    Expired,
}

/// Fuse timer with optional arm-on-collision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fuse {
    state: FuseState,
    /// Seconds counted since arming
    elapsed: f32,
    /// Seconds from arming to activation
    duration: f32,
    arm_on_collision: bool,
    /// Arm anyway after this long in the air (arm-on-collision only)
    arm_timeout: Option<f32>,
    /// Seconds spent in the air before arming
    airborne: f32,
}

impl Fuse {
    pub fn new(duration: f32, arm_on_collision: bool) -> Self {
        Self {
            state: if arm_on_collision {
                FuseState::Flying
            } else {
                FuseState::Armed
            },
            elapsed: 0.0,
            duration: duration.max(0.0),
            arm_on_collision,
            arm_timeout: None,
            airborne: 0.0,
        }
    }

    pub fn with_arm_timeout(mut self, timeout: Option<f32>) -> Self {
        self.arm_timeout = timeout.map(|t| t.max(0.0));
        self
    }

    #[inline]
    pub fn state(&self) -> FuseState {
        self.state
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[inline]
    pub fn arm_on_collision(&self) -> bool {
        self.arm_on_collision
    }

    /// Seconds left before activation (full duration while unarmed)
    pub fn remaining(&self) -> f32 {
        (self.duration - self.elapsed).max(0.0)
    }

    /// Report a physical collision. Returns true if this armed the fuse.
    pub fn on_collision(&mut self) -> bool {
        if self.state == FuseState::Flying {
            self.state = FuseState::Armed;
            true
        } else {
            false
        }
    }

    /// Advance the fuse. Returns true on the tick the fuse runs out.
    ///
    /// Running out does not activate by itself; the owner calls
    /// [`Fuse::activate`] so the effect is spawned exactly once.
    pub fn tick(&mut self, dt: f32) -> bool {
        if dt.is_nan() || dt <= 0.0 {
            return false;
        }
        match self.state {
            FuseState::Flying => {
                self.airborne += dt;
                if let Some(timeout) = self.arm_timeout
                    && self.airborne >= timeout
                {
                    log::debug!("Fuse armed by timeout after {:.2}s", self.airborne);
                    self.state = FuseState::Armed;
                }
                false
            }
            FuseState::Armed => {
                self.elapsed += dt;
                self.is_due()
            }
            FuseState::Activated | FuseState::Expired => false,
        }
    }

    /// Armed and the countdown has completed
    pub fn is_due(&self) -> bool {
        self.state == FuseState::Armed && self.elapsed >= self.duration
    }

    /// Latch into Activated. Returns false if already activated or expired.
    ///
    /// Activation is allowed from Flying or Armed so a host can force early
    /// detonation (e.g. a direct hit).
    pub fn activate(&mut self) -> bool {
        match self.state {
            FuseState::Flying | FuseState::Armed => {
                self.state = FuseState::Activated;
                true
            }
            FuseState::Activated | FuseState::Expired => false,
        }
    }

    /// Latch into Expired. Returns false if already expired.
    pub fn expire(&mut self) -> bool {
        if self.state == FuseState::Expired {
            return false;
        }
        self.state = FuseState::Expired;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_timed_fuse_armed_from_launch() {
        let mut fuse = Fuse::new(1.0, false);
        assert_eq!(fuse.state(), FuseState::Armed);
        assert!(!fuse.tick(0.5));
        assert!(fuse.tick(0.5));
        assert!(fuse.is_due());
    }

    #[test]
    fn test_collision_fuse_waits_for_contact() {
        let mut fuse = Fuse::new(0.5, true);
        for _ in 0..100 {
            assert!(!fuse.tick(0.1));
        }
        assert_eq!(fuse.state(), FuseState::Flying);
        assert_eq!(fuse.elapsed(), 0.0);

        assert!(fuse.on_collision());
        assert!(!fuse.on_collision());
        assert_eq!(fuse.state(), FuseState::Armed);
        assert!(!fuse.tick(0.25));
        assert!(fuse.tick(0.25));
    }

    #[test]
    fn test_arm_timeout() {
        let mut fuse = Fuse::new(1.0, true).with_arm_timeout(Some(1.95));
        for _ in 0..19 {
            fuse.tick(0.1);
        }
        assert_eq!(fuse.state(), FuseState::Flying);
        fuse.tick(0.1);
        assert_eq!(fuse.state(), FuseState::Armed);
    }

    #[test]
    fn test_activation_latch() {
        let mut fuse = Fuse::new(0.0, false);
        assert!(fuse.tick(0.016));
        assert!(fuse.activate());
        assert!(!fuse.activate());
        assert!(!fuse.tick(1.0));
        assert!(!fuse.on_collision());
        assert_eq!(fuse.state(), FuseState::Activated);

        assert!(fuse.expire());
        assert!(!fuse.expire());
        assert!(!fuse.activate());
        assert_eq!(fuse.state(), FuseState::Expired);
    }

    #[test]
    fn test_non_positive_dt_ignored() {
        let mut fuse = Fuse::new(1.0, false);
        fuse.tick(0.0);
        fuse.tick(-1.0);
        fuse.tick(f32::NAN);
        assert_eq!(fuse.elapsed(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_fuse_monotonic(
            steps in proptest::collection::vec((0.001f32..0.2, any::<bool>(), any::<bool>()), 1..200),
            arm_on_collision in any::<bool>(),
        ) {
            let mut fuse = Fuse::new(1.0, arm_on_collision);
            let mut last_state = fuse.state();
            let mut last_elapsed = fuse.elapsed();
            let mut activations = 0;

            for (dt, collide, try_activate) in steps {
                if collide {
                    fuse.on_collision();
                }
                if fuse.tick(dt) || try_activate && fuse.is_due() {
                    if fuse.activate() {
                        activations += 1;
                    }
                }
                prop_assert!(fuse.elapsed() >= last_elapsed);
                prop_assert!(fuse.state() >= last_state);
                last_state = fuse.state();
                last_elapsed = fuse.elapsed();
            }
            prop_assert!(activations <= 1);
        }
    }
}
