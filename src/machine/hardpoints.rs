//! Aiming, cooling and firing a machine's hardpoints together.

use crate::blueprint::{Blueprint, HardpointShooter, HardpointShot, in_angle_range, relative_angle_to_target};
use crate::fixed_angle::{FixedAngle, PI, TWO_PI};
use crate::hex::{HexCoord, step_distance_between};
use crate::rng::BoardRng;

/// One hardpoint as mounted: its arc and current aim are relative to the
/// machine's facing.
#[derive(Debug, Clone)]
pub(crate) struct TurningHardpoint {
    shooter: HardpointShooter,
    min_angle: FixedAngle,
    max_angle: FixedAngle,
    current_angle: FixedAngle,
    cooldown: u16,
}

impl TurningHardpoint {
    fn new(mount_angle: FixedAngle, shooter: HardpointShooter) -> Self {
        Self {
            min_angle: (mount_angle + shooter.min_angle()).rem_euclid(TWO_PI),
            max_angle: (mount_angle + shooter.max_angle()).rem_euclid(TWO_PI),
            current_angle: (mount_angle + shooter.get_mid_angle()).rem_euclid(TWO_PI),
            cooldown: 0,
            shooter,
        }
    }

    fn in_range(&self, distance: u16) -> bool {
        self.shooter.min_range() <= distance && distance <= self.shooter.max_range()
    }

    fn ready_to_fire(&self, angle: FixedAngle, cap: u16, distance: u16) -> bool {
        self.cooldown == 0
            && self.current_angle == angle
            && self.shooter.firing_cap_cost() <= cap
            && self.in_range(distance)
    }

    fn turn_towards(&mut self, target: FixedAngle) -> bool {
        if target == self.current_angle || !in_angle_range(target, self.min_angle, self.max_angle) {
            return false;
        }
        let speed = self.shooter.rotation_speed();
        let diff = (target - self.current_angle).abs();
        if diff <= speed {
            self.current_angle = target;
            return false;
        }
        let mut delta = if target > self.current_angle { speed } else { -speed };
        // The other way round is shorter.
        if diff > PI {
            delta = -delta;
        }
        self.current_angle = (self.current_angle + TWO_PI + delta).rem_euclid(TWO_PI);
        true
    }

    #[allow(dead_code)]
    pub(crate) const fn current_angle(&self) -> FixedAngle {
        self.current_angle
    }
}

/// Every hardpoint of one machine.
///
/// Hardpoints are fired cheapest first so a short capacitor still gets the
/// most shots off.
#[derive(Debug, Clone, Default)]
pub(crate) struct HardpointCollective {
    hardpoints: Vec<TurningHardpoint>,
    by_cap_cost: Vec<usize>,
    target_angle: FixedAngle,
    facing_angle: FixedAngle,
    location: HexCoord,
    target: HexCoord,
    min_range: u16,
    max_range: u16,
    aiming: bool,
    cooling: bool,
}

impl HardpointCollective {
    pub(crate) fn new(bp: &Blueprint) -> Self {
        let hardpoints: Vec<_> = (0..bp.hardpoint_count())
            .filter_map(|i| {
                let shooter = bp.hardpoint_at(i)?.shooter().clone();
                let mount = bp.hardpoint_angle(i)?;
                Some(TurningHardpoint::new(mount, shooter))
            })
            .collect();
        let min_range = hardpoints.iter().map(|h| h.shooter.min_range()).min().unwrap_or(u16::MAX);
        let max_range = hardpoints.iter().map(|h| h.shooter.max_range()).max().unwrap_or(0);
        let mut by_cap_cost: Vec<usize> = (0..hardpoints.len()).collect();
        by_cap_cost.sort_by_key(|&i| hardpoints[i].shooter.firing_cap_cost());
        Self {
            hardpoints,
            by_cap_cost,
            target_angle: 0,
            facing_angle: 0,
            location: HexCoord::invalid(),
            target: HexCoord::invalid(),
            min_range,
            max_range,
            aiming: false,
            cooling: false,
        }
    }

    #[allow(dead_code)]
    pub(crate) fn len(&self) -> usize {
        self.hardpoints.len()
    }

    #[allow(dead_code)]
    pub(crate) fn hardpoints(&self) -> &[TurningHardpoint] {
        &self.hardpoints
    }

    #[allow(dead_code)]
    pub(crate) const fn max_range(&self) -> u16 {
        self.max_range
    }

    #[allow(dead_code)]
    pub(crate) const fn is_aiming(&self) -> bool {
        self.aiming
    }

    fn in_collective_range(&self, distance: u16) -> bool {
        distance > 0 && distance >= self.min_range && distance <= self.max_range
    }

    pub(crate) fn tick(&mut self) {
        if self.aiming {
            self.tick_aim();
        }
        if self.cooling {
            self.tick_cooldown();
        }
    }

    fn tick_aim(&mut self) {
        let target = self.target_angle;
        let still_turning = self
            .hardpoints
            .iter_mut()
            .fold(0, |n, hp| n + usize::from(hp.turn_towards(target)));
        self.aiming = still_turning > 0;
    }

    fn tick_cooldown(&mut self) {
        let mut cooling = 0;
        for hp in &mut self.hardpoints {
            if hp.cooldown > 0 {
                hp.cooldown -= 1;
                cooling += usize::from(hp.cooldown > 0);
            }
        }
        self.cooling = cooling > 0;
    }

    /// True if any hardpoint could be brought to bear on `xy` from here.
    pub(crate) fn can_aim_at(&self, xy: HexCoord) -> bool {
        let d = step_distance_between(self.location, xy);
        if !self.in_collective_range(d) {
            return false;
        }
        let a = relative_angle_to_target(self.facing_angle, self.location, xy);
        self.hardpoints
            .iter()
            .any(|hp| in_angle_range(a, hp.min_angle, hp.max_angle) && hp.in_range(d))
    }

    /// Start turning every hardpoint that can face `xy` towards it.
    pub(crate) fn aim_at(&mut self, xy: HexCoord) {
        let d = step_distance_between(self.location, xy);
        self.aiming = self.in_collective_range(d);
        if self.aiming {
            self.target_angle = relative_angle_to_target(self.facing_angle, self.location, xy);
            self.target = xy;
        }
    }

    /// Number of hardpoints that would fire at `xy` with `cap` available.
    pub(crate) fn can_fire_at(&self, cap: u16, xy: HexCoord) -> usize {
        let d = step_distance_between(self.location, xy);
        if !self.in_collective_range(d) {
            return 0;
        }
        let a = relative_angle_to_target(self.facing_angle, self.location, xy);
        self.hardpoints.iter().filter(|hp| hp.ready_to_fire(a, cap, d)).count()
    }

    /// Fire every ready hardpoint at `xy`, cheapest first, paying from `cap`.
    pub(crate) fn fire_at(&mut self, rng: &mut BoardRng, cap: &mut u16, xy: HexCoord) -> Vec<HardpointShot> {
        let mut shots = Vec::new();
        let d = step_distance_between(self.location, xy);
        if !self.in_collective_range(d) {
            return shots;
        }
        let a = relative_angle_to_target(self.facing_angle, self.location, xy);
        for &i in &self.by_cap_cost {
            let hp = &mut self.hardpoints[i];
            if hp.ready_to_fire(a, *cap, d) {
                hp.cooldown = hp.shooter.firing_cooldown();
                *cap -= hp.shooter.firing_cap_cost();
                shots.push(hp.shooter.make_a_shot(rng));
            }
        }
        self.cooling = !shots.is_empty();
        shots
    }

    /// Effect multiplier of hardpoint `i` at `range`; zero for an unknown index.
    pub(crate) fn falloff_at(&self, i: usize, range: u16) -> f32 {
        self.hardpoints.get(i).map_or(0.0, |hp| hp.shooter.falloff_at(range))
    }

    pub(crate) fn change_location(&mut self, xy: HexCoord) {
        self.location = xy;
        self.retarget();
    }

    pub(crate) fn change_orientation(&mut self, facing_angle: FixedAngle) {
        self.facing_angle = facing_angle;
        self.retarget();
    }

    // The target angle is relative to the machine, so it moves when the
    // machine does.
    fn retarget(&mut self) {
        if self.aiming {
            self.target_angle = relative_angle_to_target(self.facing_angle, self.location, self.target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::ShotEffect;
    use crate::blueprint::tests::create_test_blueprint;
    use crate::fixed_angle::fixed_angle_from_facing;
    use crate::hex::HexFacing;

    fn create_test_collective(facing: HexFacing) -> HardpointCollective {
        let mut c = HardpointCollective::new(&create_test_blueprint());
        c.change_location(HexCoord::new(20, 20));
        c.change_orientation(fixed_angle_from_facing(facing));
        c
    }

    fn aim_until_still(c: &mut HardpointCollective) {
        let mut ticks = 0;
        while c.is_aiming() {
            c.tick();
            ticks += 1;
            assert!(ticks < 100_000, "never finished aiming");
        }
    }

    fn first_target_in_arc(c: &HardpointCollective) -> Option<HexCoord> {
        (0..40)
            .flat_map(|x| (0..40).map(move |y| HexCoord::new(x, y)))
            .find(|&xy| c.can_aim_at(xy))
    }

    #[test]
    fn test_ranges_come_from_shooters() {
        let c = create_test_collective(HexFacing::Tile0);
        assert_eq!(c.len(), 1);
        assert_eq!(c.min_range, 15);
        assert_eq!(c.max_range(), 23);
    }

    #[test]
    fn test_too_close_cannot_be_aimed_at() {
        let mut c = create_test_collective(HexFacing::Tile0);
        assert!(!c.can_aim_at(HexCoord::new(20, 20)));
        assert!(!c.can_aim_at(HexCoord::new(21, 20)));
        c.aim_at(HexCoord::new(21, 20));
        assert!(!c.is_aiming());
    }

    #[test]
    fn test_aim_then_fire() {
        let mut c = create_test_collective(HexFacing::Tile0);
        let target = first_target_in_arc(&c).unwrap();
        assert_eq!(c.can_fire_at(1000, target), 0);

        c.aim_at(target);
        assert!(c.is_aiming());
        aim_until_still(&mut c);
        assert_eq!(c.can_fire_at(1000, target), 1);
        assert_eq!(c.can_fire_at(11, target), 0);

        let mut rng = BoardRng::new(1);
        let mut cap = 100;
        let shots = c.fire_at(&mut rng, &mut cap, target);
        assert_eq!(shots.len(), 1);
        assert_eq!(cap, 88);
        assert!(matches!(shots[0].effect, ShotEffect::CapDrain(v) if v > 0 && v <= 40));

        // Cooling down.
        assert_eq!(c.can_fire_at(1000, target), 0);
        for _ in 0..3 {
            c.tick();
        }
        assert_eq!(c.can_fire_at(1000, target), 1);
    }

    #[test]
    fn test_turning_the_machine_moves_the_target() {
        let mut c = create_test_collective(HexFacing::Tile0);
        let target = first_target_in_arc(&c).unwrap();
        c.aim_at(target);
        aim_until_still(&mut c);
        c.aim_at(target);
        c.change_orientation(fixed_angle_from_facing(HexFacing::Tile1));
        assert_eq!(c.can_fire_at(1000, target), 0);
    }

    #[test]
    fn test_empty_collective() {
        let mut c = HardpointCollective::default();
        c.change_location(HexCoord::new(1, 1));
        assert!(!c.can_aim_at(HexCoord::new(2, 2)));
        let mut cap = 10;
        assert!(c.fire_at(&mut BoardRng::new(0), &mut cap, HexCoord::new(2, 2)).is_empty());
        assert_eq!(cap, 10);
        assert!((c.falloff_at(3, 1) - 0.0).abs() < f32::EPSILON);
    }
}
