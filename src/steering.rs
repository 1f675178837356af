//! Steering behaviours.
//!
//! Every function here is pure: it reads the agent's kinematic state and a
//! neighbor snapshot and returns one force contribution. Only [`wander`]
//! carries state, through the `wander_angle` it is handed.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;

use crate::config::{SteeringConfig, WorldBox};
use crate::math::{limit_magnitude, normalize_or_zero, rand_range};
use crate::spatial::AgentId;

/// The part of an agent that steering reads.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Kinematics {
    pub position: Vec3,
    pub direction: Vec3,
    pub radius: f32,
}

/// Snapshot of another agent taken when the neighbor list was gathered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub id: AgentId,
    pub position: Vec3,
    pub direction: Vec3,
    pub radius: f32,
}

/// Pull toward `target` that ramps quadratically beyond the near distance and
/// never drops below the configured floor.
pub fn seek(cfg: &SteeringConfig, me: &Kinematics, target: Vec3) -> Vec3 {
    let to_target = target - me.position;
    let factor = ((to_target.length() - cfg.seek_near_distance) / cfg.seek_ramp).max(0.0);
    let distance_factor = factor * factor;

    normalize_or_zero(to_target) * (cfg.seek_force * distance_factor).max(cfg.seek_min_force)
}

pub fn wander<R: Rng + ?Sized>(
    cfg: &SteeringConfig,
    me: &Kinematics,
    wander_angle: &mut f32,
    rng: &mut R,
) -> Vec3 {
    *wander_angle += cfg.wander_step * rand_range(rng, -TAU, TAU);

    let on_circle = Vec3::new(wander_angle.cos(), 0.0, wander_angle.sin());
    let ahead = me.direction * cfg.wander_lead + on_circle;
    normalize_or_zero(ahead) * cfg.wander_force
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HeightBand {
    BelowGround,
    Cruising,
    AboveCeiling,
}

impl HeightBand {
    fn classify(cfg: &SteeringConfig, y: f32) -> Self {
        if y < cfg.ground_level {
            Self::BelowGround
        } else if y > cfg.ceiling_level {
            Self::AboveCeiling
        } else {
            Self::Cruising
        }
    }
}

/// Hook for keeping the school between ground and ceiling. No band pushes
/// yet, so the result is always zero.
pub fn ground_avoidance(cfg: &SteeringConfig, me: &Kinematics) -> Vec3 {
    let push = match HeightBand::classify(cfg, me.position.y) {
        HeightBand::BelowGround => Vec3::ZERO,
        HeightBand::AboveCeiling => Vec3::ZERO,
        HeightBand::Cruising => Vec3::ZERO,
    };
    push * cfg.separation_force
}

/// Repulsion from every neighbor, falling off with the gap beyond
/// `spacing * (r1 + r2)`. Gaps at or inside that band use the floor.
pub fn separation(cfg: &SteeringConfig, me: &Kinematics, neighbors: &[Neighbor]) -> Vec3 {
    if neighbors.is_empty() {
        return Vec3::ZERO;
    }

    let mut force = Vec3::ZERO;
    for other in neighbors {
        let combined = me.radius + other.radius;
        let gap = me.position.distance(other.position) - cfg.separation_spacing * combined;
        let multiplier = cfg.separation_force / gap.max(cfg.separation_floor) * combined;
        force += normalize_or_zero(me.position - other.position) * multiplier;
    }
    force
}

pub fn alignment(cfg: &SteeringConfig, neighbors: &[Neighbor]) -> Vec3 {
    let heading: Vec3 = neighbors.iter().map(|n| n.direction).sum();
    normalize_or_zero(heading) * cfg.alignment_force
}

pub fn cohesion(cfg: &SteeringConfig, me: &Kinematics, neighbors: &[Neighbor]) -> Vec3 {
    if neighbors.is_empty() {
        return Vec3::ZERO;
    }

    let centroid = neighbors.iter().map(|n| n.position).sum::<Vec3>() / neighbors.len() as f32;
    normalize_or_zero(centroid - me.position) * cfg.cohesion_force
}

/// Per-axis push back inside `bounds`, proportional to the penetration depth.
pub fn containment(cfg: &SteeringConfig, position: Vec3, bounds: &WorldBox) -> Vec3 {
    let axis = |p: f32, min: f32, max: f32| {
        if p < min {
            (min - p) * cfg.boundary_gain
        } else if p > max {
            (max - p) * cfg.boundary_gain
        } else {
            0.0
        }
    };

    Vec3::new(
        axis(position.x, bounds.min.x, bounds.max.x),
        axis(position.y, bounds.min.y, bounds.max.y),
        axis(position.z, bounds.min.z, bounds.max.z),
    )
}

/// Whether `other` is close enough in size to flock with an agent of `radius`.
pub fn is_similar_size(cfg: &SteeringConfig, radius: f32, other: &Neighbor) -> bool {
    let ratio = radius / other.radius;
    (cfg.similar_ratio_min..=cfg.similar_ratio_max).contains(&ratio)
}

/// Per-agent limits applied when composing forces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SteeringLimits {
    pub acceleration: f32,
    pub max_steering_force: f32,
}

/// Sum all active behaviours and turn them into a velocity change for a
/// step of `dt` seconds.
#[allow(clippy::too_many_arguments)]
pub fn compose<R: Rng + ?Sized>(
    cfg: &SteeringConfig,
    me: &Kinematics,
    limits: SteeringLimits,
    wander_angle: &mut f32,
    target: Vec3,
    neighbors: &[Neighbor],
    similar: &mut Vec<Neighbor>,
    dt: f32,
    rng: &mut R,
) -> Vec3 {
    let mut force = seek(cfg, me, target)
        + wander(cfg, me, wander_angle, rng)
        + ground_avoidance(cfg, me)
        + separation(cfg, me, neighbors);

    if me.radius < cfg.small_radius {
        similar.clear();
        similar.extend(
            neighbors
                .iter()
                .copied()
                .filter(|n| is_similar_size(cfg, me.radius, n)),
        );

        let similar = similar.as_slice();
        force += alignment(cfg, similar) + cohesion(cfg, me, similar) + separation(cfg, me, similar);
    }

    force *= limits.acceleration * dt;
    force.y *= cfg.vertical_scale;
    limit_magnitude(force, limits.max_steering_force)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn agent_at(position: Vec3, radius: f32) -> Kinematics {
        Kinematics {
            position,
            direction: Vec3::X,
            radius,
        }
    }

    fn neighbor_at(id: u32, position: Vec3, radius: f32) -> Neighbor {
        Neighbor {
            id: AgentId(id),
            position,
            direction: Vec3::Z,
            radius,
        }
    }

    #[test]
    fn separation_falls_off_with_gap_outside_band() {
        let cfg = SteeringConfig::default();
        let me = agent_at(Vec3::ZERO, 2.0);
        // band = 1.5 * (2 + 2) = 6, multiplier = 5 / max(d - 6, 0.001) * 4
        for (d, expected) in [(5.0, 20000.0), (5.9, 20000.0), (6.5, 40.0), (7.0, 20.0), (10.0, 5.0)] {
            let other = [neighbor_at(1, Vec3::new(d, 0.0, 0.0), 2.0)];
            let push = separation(&cfg, &me, &other);
            assert!(push.x < 0.0, "d = {d}: {push:?}");
            assert!(push.y.abs() < 1.0e-6 && push.z.abs() < 1.0e-6);
            assert!((push.length() - expected).abs() < expected * 1.0e-3, "d = {d}: {push:?}");
        }

        let closer = separation(&cfg, &me, &[neighbor_at(1, Vec3::new(8.0, 0.0, 0.0), 2.0)]);
        let farther = separation(&cfg, &me, &[neighbor_at(1, Vec3::new(12.0, 0.0, 0.0), 2.0)]);
        assert!((closer.length() / farther.length() - 3.0).abs() < 1.0e-3);
    }

    #[test]
    fn coincident_neighbor_gives_finite_separation() {
        let cfg = SteeringConfig::default();
        let me = agent_at(Vec3::ONE, 2.0);
        let same = [neighbor_at(1, Vec3::ONE, 2.0)];
        let push = separation(&cfg, &me, &same);
        assert!(push.is_finite());
    }

    #[test]
    fn empty_neighbor_lists_give_zero() {
        let cfg = SteeringConfig::default();
        let me = agent_at(Vec3::ZERO, 2.0);
        assert_eq!(separation(&cfg, &me, &[]), Vec3::ZERO);
        assert_eq!(alignment(&cfg, &[]), Vec3::ZERO);
        assert_eq!(cohesion(&cfg, &me, &[]), Vec3::ZERO);
    }

    #[test]
    fn alignment_follows_average_heading() {
        let cfg = SteeringConfig::default();
        let flock = [
            neighbor_at(1, Vec3::ZERO, 2.0),
            neighbor_at(2, Vec3::ONE, 2.0),
        ];
        let force = alignment(&cfg, &flock);
        assert!((force - Vec3::Z * 30.0).length() < 1.0e-4);
    }

    #[test]
    fn cohesion_points_at_centroid() {
        let cfg = SteeringConfig::default();
        let me = agent_at(Vec3::ZERO, 2.0);
        let flock = [
            neighbor_at(1, Vec3::new(4.0, 2.0, 0.0), 2.0),
            neighbor_at(2, Vec3::new(4.0, -2.0, 0.0), 2.0),
        ];
        let force = cohesion(&cfg, &me, &flock);
        assert!((force - Vec3::X * 100.0).length() < 1.0e-3);
    }

    #[test]
    fn seek_has_floor_and_grows_with_distance() {
        let cfg = SteeringConfig::default();
        let mut previous = 0.0;
        for d in [1.0, 40.0, 60.0, 200.0, 500.0, 1000.0, 2000.0] {
            let me = agent_at(Vec3::new(d, 0.0, 0.0), 2.0);
            let magnitude = seek(&cfg, &me, Vec3::ZERO).length();
            assert!(magnitude >= cfg.seek_min_force - 1.0e-3, "d = {d}");
            assert!(magnitude >= previous - 1.0e-3, "d = {d}");
            previous = magnitude;
        }

        let far = agent_at(Vec3::new(2050.0, 0.0, 0.0), 2.0);
        let pull = seek(&cfg, &far, Vec3::ZERO);
        // ((2050 - 50) / 250)^2 * 8 = 512
        assert!((pull.length() - 512.0).abs() < 0.1);
        assert!(pull.x < 0.0);
    }

    #[test]
    fn seek_at_target_is_zero_not_nan() {
        let cfg = SteeringConfig::default();
        let me = agent_at(Vec3::ONE, 2.0);
        assert_eq!(seek(&cfg, &me, Vec3::ONE), Vec3::ZERO);
    }

    #[test]
    fn ground_avoidance_is_always_zero() {
        let cfg = SteeringConfig::default();
        for y in [-100.0, 0.0, 20.0, 100.0] {
            let me = agent_at(Vec3::new(0.0, y, 0.0), 2.0);
            assert_eq!(ground_avoidance(&cfg, &me), Vec3::ZERO);
        }
    }

    #[test]
    fn wander_is_bounded_and_advances_angle() {
        let cfg = SteeringConfig::default();
        let me = agent_at(Vec3::ZERO, 2.0);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut angle = 0.0;
        let force = wander(&cfg, &me, &mut angle, &mut rng);

        assert!((force.length() - cfg.wander_force).abs() < 1.0e-4);
        assert!(force.y.abs() < 1.0e-6);
        assert!(angle.abs() <= cfg.wander_step * TAU);
    }

    #[test]
    fn containment_opposes_penetration() {
        let cfg = SteeringConfig::default();
        let bounds = WorldBox::default();
        let push = containment(&cfg, Vec3::new(60.0, -80.0, 0.0), &bounds);
        assert!((push.x + 1.0).abs() < 1.0e-5);
        assert!((push.y - 1.0).abs() < 1.0e-5);
        assert_eq!(push.z, 0.0);
        assert_eq!(containment(&cfg, Vec3::ZERO, &bounds), Vec3::ZERO);
    }

    #[test]
    fn similar_size_filter_uses_ratio_band() {
        let cfg = SteeringConfig::default();
        assert!(is_similar_size(&cfg, 2.0, &neighbor_at(1, Vec3::ZERO, 2.0)));
        assert!(is_similar_size(&cfg, 2.0, &neighbor_at(1, Vec3::ZERO, 1.5)));
        assert!(!is_similar_size(&cfg, 2.0, &neighbor_at(1, Vec3::ZERO, 3.0)));
        assert!(!is_similar_size(&cfg, 2.0, &neighbor_at(1, Vec3::ZERO, 1.4)));
    }

    #[test]
    fn composed_force_is_clamped_and_flattened() {
        let cfg = SteeringConfig::default();
        let me = agent_at(Vec3::new(0.0, -500.0, 0.0), 2.0);
        let limits = SteeringLimits {
            acceleration: 35.0,
            max_steering_force: 7.0,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut angle = 0.0;
        let mut scratch = Vec::new();

        let dv = compose(
            &cfg,
            &me,
            limits,
            &mut angle,
            Vec3::ZERO,
            &[],
            &mut scratch,
            0.1,
            &mut rng,
        );
        assert!(dv.length() <= limits.max_steering_force + 1.0e-4);
        assert!(dv.y > 0.0);
    }

    #[test]
    fn small_boids_add_flocking_terms_over_similar_neighbors() {
        let cfg = SteeringConfig {
            wander_force: 0.0,
            ..SteeringConfig::default()
        };
        let limits = SteeringLimits {
            acceleration: 1.0,
            max_steering_force: 1.0e9,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let similar = neighbor_at(1, Vec3::new(0.0, 0.0, 12.0), 2.0);
        let dissimilar = neighbor_at(2, Vec3::new(12.0, 0.0, 0.0), 4.0);
        let neighbors = [similar, dissimilar];

        // Seeking the own position contributes nothing, leaving only neighbor terms.
        let small = agent_at(Vec3::ZERO, 2.0);
        let mut scratch = Vec::new();
        let mut angle = 0.0;
        let dv = compose(
            &cfg,
            &small,
            limits,
            &mut angle,
            small.position,
            &neighbors,
            &mut scratch,
            1.0,
            &mut rng,
        );
        assert_eq!(scratch, vec![similar]);

        // general separation: dissimilar 5 / 3 * 6 = 10 along -x, similar 5 / 6 * 4 along -z;
        // filtered pass: alignment 30 z + cohesion 100 z + similar separation again.
        let expected = Vec3::new(-10.0, 0.0, 130.0 - 2.0 * 20.0 / 6.0);
        assert!((dv - expected).length() < 1.0e-2, "{dv:?}");

        let large = agent_at(Vec3::ZERO, 6.0);
        let mut scratch = Vec::new();
        let dv = compose(
            &cfg,
            &large,
            limits,
            &mut angle,
            large.position,
            &neighbors,
            &mut scratch,
            1.0,
            &mut rng,
        );
        assert!(scratch.is_empty());
        let only_separation = separation(&cfg, &large, &neighbors);
        assert!((dv - only_separation).length() < only_separation.length() * 1.0e-5);
    }
}
