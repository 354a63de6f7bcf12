//! Valid-position finder
//!
//! Picks a random ground point in an annulus around an origin. Each candidate
//! is probed straight down from above and must land on solid, non-trigger,
//! walkable ground with a clear sphere above it. When sampling fails, a fixed
//! ring of 8 points close to the origin is tried, and failing that the origin
//! itself (lifted slightly) is returned. The finder never fails.

use glam::Vec3;
use rand::Rng;

use super::host::Host;
use crate::consts::*;
use crate::yaw_direction;

/// Parameters for a placement search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementQuery {
    pub origin: Vec3,
    pub min_distance: f32,
    pub max_distance: f32,
    pub attempts: u32,
    /// Radius of the sphere that must be free above the landing point
    pub clearance: f32,
    /// How far above the candidate the downward probe starts
    pub probe_height: f32,
}

impl PlacementQuery {
    pub fn new(origin: Vec3, min_distance: f32, max_distance: f32) -> Self {
        Self {
            origin,
            min_distance,
            max_distance,
            attempts: PLACEMENT_ATTEMPTS,
            clearance: PLACEMENT_CLEARANCE,
            probe_height: PLACEMENT_PROBE_HEIGHT,
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }
}

/// Which stage of the search produced a point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementSource {
    Sampled { attempt: u32 },
    FallbackRing,
    Origin,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub point: Vec3,
    pub source: PlacementSource,
}

/// Find a valid point in `[min_distance, max_distance]` around `origin`
pub fn find_position<H, R>(
    host: &H,
    rng: &mut R,
    origin: Vec3,
    min_distance: f32,
    max_distance: f32,
    attempts: u32,
) -> Vec3
where
    H: Host + ?Sized,
    R: Rng + ?Sized,
{
    let query = PlacementQuery::new(origin, min_distance, max_distance).with_attempts(attempts);
    place(host, rng, &query).point
}

/// Run a full placement search, reporting which stage succeeded
pub fn place<H, R>(host: &H, rng: &mut R, query: &PlacementQuery) -> Placement
where
    H: Host + ?Sized,
    R: Rng + ?Sized,
{
    let origin = if query.origin.is_finite() {
        query.origin
    } else {
        log::warn!("Placement origin {:?} is not finite, using world origin", query.origin);
        Vec3::ZERO
    };
    // random_range panics on a non-finite span
    let min_distance = if query.min_distance.is_finite() {
        query.min_distance.max(0.0)
    } else {
        0.0
    };
    let max_distance = if query.max_distance.is_finite() {
        query.max_distance.max(min_distance)
    } else {
        min_distance
    };

    for attempt in 0..query.attempts {
        let yaw = rng.random_range(0.0..std::f32::consts::TAU);
        let distance = rng.random_range(min_distance..=max_distance);
        let candidate = origin + yaw_direction(yaw) * distance;

        if let Some(point) = probe(host, candidate, query, true) {
            log::debug!("Placement found on attempt {}: {:?}", attempt + 1, point);
            return Placement {
                point,
                source: PlacementSource::Sampled { attempt },
            };
        }
    }

    for k in 0..8 {
        let yaw = k as f32 * std::f32::consts::FRAC_PI_4;
        let candidate = origin + yaw_direction(yaw) * FALLBACK_RING_RADIUS;
        if let Some(point) = probe(host, candidate, query, false) {
            log::warn!(
                "Placement sampling failed after {} attempts, using fallback ring point {:?}",
                query.attempts,
                point
            );
            return Placement {
                point,
                source: PlacementSource::FallbackRing,
            };
        }
    }

    log::warn!("No valid placement near {:?}, staying at origin", origin);
    Placement {
        point: origin + Vec3::Y * ORIGIN_LIFT,
        source: PlacementSource::Origin,
    }
}

/// Probe one candidate; returns the snapped surface point if it passes
fn probe<H>(host: &H, candidate: Vec3, query: &PlacementQuery, require_walkable: bool) -> Option<Vec3>
where
    H: Host + ?Sized,
{
    if !candidate.is_finite() {
        return None;
    }

    let start = candidate + Vec3::Y * query.probe_height;
    let hit = host.raycast_down(start, query.probe_height * 2.0)?;
    if hit.is_trigger || !hit.point.is_finite() {
        return None;
    }

    let clearance_center = hit.point + Vec3::Y * (query.clearance + 0.05);
    if host.is_sphere_blocked(clearance_center, query.clearance) {
        return None;
    }

    if require_walkable && !host.is_walkable(hit.point) {
        return None;
    }

    Some(hit.point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::sandbox::{Pillar, Sandbox, Zone};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_finds_point_in_annulus_on_flat_ground() {
        let host = Sandbox::flat();
        let mut rng = Pcg32::seed_from_u64(1);
        let origin = Vec3::new(3.0, 0.0, -2.0);
        let query = PlacementQuery::new(origin, 5.0, 10.0);

        for _ in 0..20 {
            let placement = place(&host, &mut rng, &query);
            assert!(matches!(placement.source, PlacementSource::Sampled { attempt: 0 }));
            let d = crate::horizontal_distance(origin, placement.point);
            assert!((5.0 - 1e-3..=10.0 + 1e-3).contains(&d), "distance {d}");
            assert!(placement.point.y.abs() < 1e-5);
        }
    }

    #[test]
    fn test_rejects_pits_and_unwalkable_zones() {
        let mut host = Sandbox::flat();
        // Everything except a narrow wedge near +X is unusable
        host.pits.push(Zone::new(Vec3::new(0.0, 0.0, 10.0), 9.0));
        host.pits.push(Zone::new(Vec3::new(0.0, 0.0, -10.0), 9.0));
        host.unwalkable.push(Zone::new(Vec3::new(-10.0, 0.0, 0.0), 9.0));

        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..10 {
            let p = find_position(&host, &mut rng, Vec3::ZERO, 4.0, 8.0, 50);
            assert!(host.ground_at(p).is_some());
            assert!(host.is_walkable(p));
        }
    }

    #[test]
    fn test_unwalkable_everywhere_uses_fallback_ring() {
        let mut host = Sandbox::flat();
        host.walkable_override = Some(false);
        let mut rng = Pcg32::seed_from_u64(3);

        let placement = place(&host, &mut rng, &PlacementQuery::new(Vec3::ZERO, 5.0, 10.0));
        assert_eq!(placement.source, PlacementSource::FallbackRing);
        assert!((crate::horizontal_distance(Vec3::ZERO, placement.point) - FALLBACK_RING_RADIUS).abs() < 1e-4);
    }

    #[test]
    fn test_ring_skips_blocked_points() {
        let mut host = Sandbox::flat();
        host.walkable_override = Some(false);
        // Thin post beside the first ring point (+X) crowds its clearance sphere
        host.pillars.push(Pillar::new(Vec3::new(FALLBACK_RING_RADIUS + 0.5, 0.0, 0.0), 0.3, 3.0));
        let mut rng = Pcg32::seed_from_u64(3);

        let placement = place(&host, &mut rng, &PlacementQuery::new(Vec3::ZERO, 5.0, 10.0));
        assert_eq!(placement.source, PlacementSource::FallbackRing);
        assert!(placement.point.x < FALLBACK_RING_RADIUS - 0.1);
    }

    #[test]
    fn test_no_ground_falls_back_to_origin() {
        let mut host = Sandbox::flat();
        host.ground = None;
        let mut rng = Pcg32::seed_from_u64(9);
        let origin = Vec3::new(1.0, 4.0, 2.0);

        let placement = place(&host, &mut rng, &PlacementQuery::new(origin, 5.0, 10.0));
        assert_eq!(placement.source, PlacementSource::Origin);
        assert_eq!(placement.point, origin + Vec3::Y * ORIGIN_LIFT);
    }

    #[test]
    fn test_trigger_surfaces_rejected() {
        let mut host = Sandbox::flat();
        host.triggers.push(Zone::new(Vec3::ZERO, 100.0).with_top(2.0));
        let mut rng = Pcg32::seed_from_u64(11);

        let placement = place(&host, &mut rng, &PlacementQuery::new(Vec3::ZERO, 1.0, 5.0));
        assert_eq!(placement.source, PlacementSource::Origin);
    }

    #[test]
    fn test_non_finite_origin() {
        let host = Sandbox::flat();
        let mut rng = Pcg32::seed_from_u64(5);
        let p = find_position(&host, &mut rng, Vec3::splat(f32::NAN), 1.0, 2.0, 10);
        assert!(p.is_finite());
    }

    #[test]
    fn test_non_finite_annulus_is_clamped() {
        let host = Sandbox::flat();
        let mut rng = Pcg32::seed_from_u64(13);

        let p = find_position(&host, &mut rng, Vec3::ZERO, 1.0, f32::INFINITY, 50);
        assert!(p.is_finite());
        assert!((crate::horizontal_distance(Vec3::ZERO, p) - 1.0).abs() < 1e-4);

        let p = find_position(&host, &mut rng, Vec3::ZERO, f32::NAN, f32::NAN, 50);
        assert!(p.is_finite());
        assert!(crate::horizontal_distance(Vec3::ZERO, p) < 1e-4);

        let p = find_position(&host, &mut rng, Vec3::ZERO, f32::NEG_INFINITY, 3.0, 50);
        assert!(crate::horizontal_distance(Vec3::ZERO, p) <= 3.0 + 1e-4);
    }

    proptest! {
        #[test]
        fn prop_always_finite(
            seed in any::<u64>(),
            ox in -100.0f32..100.0, oy in -10.0f32..10.0, oz in -100.0f32..100.0,
            min in -5.0f32..20.0, max in -5.0f32..40.0,
            has_ground in any::<bool>(),
            walkable in any::<bool>(),
        ) {
            let mut host = Sandbox::flat();
            if !has_ground {
                host.ground = None;
            }
            host.walkable_override = Some(walkable);
            let mut rng = Pcg32::seed_from_u64(seed);
            let p = find_position(&host, &mut rng, Vec3::new(ox, oy, oz), min, max, 50);
            prop_assert!(p.is_finite());
        }
    }
}
