//! Resolution of machine events.
//!
//! Handlers never resolve another machine event directly. Anything that
//! follows from an event is a secondary event, a delayed event or a notice.

#![allow(clippy::cast_possible_truncation)]

use tracing::{debug, trace, warn};

use super::BoardState;
use super::hits::HitByLine;
use crate::blueprint::{HardpointShot, HardpointType, ShotEffect};
use crate::combat::{explosion_damages, explosion_falloff};
use crate::hex::flags::{ASTEROID, BOT};
use crate::hex::{HexCoord, HexTile, step_distance_between};
use crate::machine::{MachineEvent, MachineEventKind, MachineId, SecondaryEvent, ShotOutcome};
use crate::tradables::TradableType;

// An effect scaled by falloff, as whole points.
fn scaled(v: u16, falloff: f32) -> i32 {
    (f32::from(v) * falloff).clamp(0.0, f32::from(u16::MAX)) as i32
}

impl BoardState {
    pub(super) fn handle_event(&mut self, e: &MachineEvent) {
        match e.kind {
            MachineEventKind::Fired { firer, target, shot } => self.handle_shot(e.machine, firer, target, shot),
            MachineEventKind::Broadcasted { xy, code_id, range } => self.handle_broadcast(e.machine, xy, code_id, range),
            MachineEventKind::Transmitted { code_id, to } => {
                if let Some(code) = self.machine_mut(e.machine).and_then(|m| m.pop_code(code_id)) {
                    self.send_instructions_to_board(to, code);
                }
            }
            MachineEventKind::InitiatedSelfDestruct { countdown } => self.handle_self_destruct(e, countdown),
            MachineEventKind::CompletedBuild { site, blueprint, code_id } => {
                self.handle_completed_build(e.machine, site, blueprint, code_id);
            }
            MachineEventKind::CargoTransferred { from, to, tradable, units } => {
                self.handle_cargo_transfer(from, to, tradable, units);
            }
            MachineEventKind::TransferCash { to, amount } => self.handle_cash_transfer(e.machine, to, amount),
            MachineEventKind::ReceivedDamage { damage } => {
                if let Some(m) = self.machine_mut(e.machine) {
                    m.apply_damage(&damage);
                }
            }
            MachineEventKind::ReceivedRepairs { repairs } => {
                if let Some(m) = self.machine_mut(e.machine) {
                    m.apply_armour_repairs(repairs);
                }
            }
            MachineEventKind::CapAltered { delta } => {
                if let Some(m) = self.machine_mut(e.machine) {
                    m.apply_cap_alteration(delta);
                }
            }
            MachineEventKind::AddedToBoard { .. }
            | MachineEventKind::PositionalUpdate { .. }
            | MachineEventKind::ChangedTile { .. }
            | MachineEventKind::Sensed { .. }
            | MachineEventKind::Exploded { .. }
            | MachineEventKind::Text { .. }
            | MachineEventKind::PrintInstruction { .. }
            | MachineEventKind::Error { .. }
            | MachineEventKind::Asserted { .. }
            | MachineEventKind::StartedBuild { .. } => {}
        }
    }

    fn schedule_now(&mut self, machine: MachineId, kind: MachineEventKind) {
        self.delayed.push(self.frame_number, MachineEvent { machine, kind });
    }

    fn handle_shot(&mut self, firer_id: MachineId, firer: HexCoord, target: HexCoord, shot: HardpointShot) {
        let kind = shot.effect.hardpoint_type();
        let Some(HexTile { coord: hit, contents }) = self.grid.find_first_hit_by_line(firer, target, shot.max_range)
        else {
            self.secondary_events.push(SecondaryEvent::shot(kind, ShotOutcome::Missed, firer, target, HexCoord::invalid()));
            return;
        };
        let Some(shooter) = self.machine(firer_id) else {
            return;
        };
        let falloff = shooter.falloff_at(usize::from(shot.hardpoint_index), step_distance_between(firer, hit));
        trace!(machine = %firer_id, %hit, falloff, "shot landed");

        if let ShotEffect::Mining(volume) = shot.effect {
            if contents & ASTEROID != 0 {
                self.mine(firer_id, firer, target, hit, scaled(volume, falloff));
            } else if contents & BOT != 0 {
                self.secondary_events.push(SecondaryEvent::shot(kind, ShotOutcome::HitMachine, firer, target, hit));
            }
            return;
        }

        let outcome = if contents & BOT != 0 { ShotOutcome::HitMachine } else { ShotOutcome::HitAsteroid };
        if let Some(victim) = self.machine_id_at(hit).filter(|_| contents & BOT != 0) {
            let effect = match shot.effect {
                ShotEffect::Weapon(damage) => Some(MachineEventKind::ReceivedDamage { damage: damage * falloff }),
                ShotEffect::CapDrain(v) => Some(scaled(v, falloff))
                    .filter(|&v| v > 0)
                    .map(|v| MachineEventKind::CapAltered { delta: -v }),
                ShotEffect::CapXfer(v) => Some(scaled(v, falloff))
                    .filter(|&v| v > 0)
                    .map(|delta| MachineEventKind::CapAltered { delta }),
                ShotEffect::ArmourRepair(v) => Some(scaled(v, falloff))
                    .filter(|&v| v > 0)
                    .map(|repairs| MachineEventKind::ReceivedRepairs { repairs }),
                ShotEffect::Mining(_) => None,
            };
            if let Some(effect) = effect {
                self.schedule_now(victim, effect);
            }
        }
        self.secondary_events.push(SecondaryEvent::shot(kind, outcome, firer, target, hit));
    }

    // Ore goes straight into the miner's hold; whatever does not fit stays
    // in the asteroid.
    fn mine(&mut self, miner: MachineId, firer: HexCoord, target: HexCoord, hit: HexCoord, volume: i32) {
        let free = self.machine(miner).map_or(0, |m| m.cargo().free_volume());
        let Some(asteroid) = self.asteroid_at_mut(hit) else {
            return;
        };
        if asteroid.volume() == 0 {
            return;
        }
        let wanted = u16::try_from(volume).unwrap_or(u16::MAX).min(free);
        let ore = asteroid.try_extract_ore_volume(wanted);
        let depleted = asteroid.volume() == 0;
        if !ore.is_empty() {
            if let Some(m) = self.machine_mut(miner) {
                if !m.cargo_mut().try_add_cargo(&ore) {
                    warn!(machine = %miner, "mined ore did not fit in the cargohold");
                }
            }
        }
        if depleted {
            debug!(xy = %hit, "asteroid depleted");
            self.secondary_events.push(SecondaryEvent::AsteroidDepleted { xy: hit });
        }
        self.secondary_events.push(SecondaryEvent::shot(HardpointType::Miner, ShotOutcome::HitAsteroid, firer, target, hit));
    }

    // The sender always collects its stored code, even when nobody hears it.
    fn handle_broadcast(&mut self, sender: MachineId, xy: HexCoord, code_id: u16, range: u16) {
        let Some(code) = self.machine_mut(sender).and_then(|m| m.pop_code(code_id)) else {
            return;
        };
        let mut tiles = Vec::new();
        self.grid.get_sorted_circle_contents(xy, range, BOT, &mut tiles);
        trace!(machine = %sender, receivers = tiles.len(), "broadcast");
        for tile in tiles {
            self.send_instructions_to_board(tile.coord, std::sync::Arc::clone(&code));
        }
    }

    fn handle_self_destruct(&mut self, e: &MachineEvent, countdown: u16) {
        if !self.machine(e.machine).is_some_and(|m| m.is_alive()) {
            return;
        }
        if countdown == 0 {
            debug!(machine = %e.machine, "self destruct");
            if let Some(m) = self.machine_mut(e.machine) {
                m.kill();
            }
            self.explode_machine(e.machine);
        } else {
            let due = self.frame_number + u64::from(countdown);
            self.delayed.push(
                due,
                MachineEvent { machine: e.machine, kind: MachineEventKind::InitiatedSelfDestruct { countdown: 0 } },
            );
        }
    }

    /// Damage everything around a destroyed machine and report the blast.
    pub(super) fn explode_machine(&mut self, id: MachineId) {
        let Some(boom) = self.machine(id).map(crate::machine::Machine::get_explosion) else {
            return;
        };
        let damage = explosion_damages(&boom);
        let mut tiles = Vec::new();
        self.grid.get_sorted_circle_contents(boom.xy, boom.range, BOT, &mut tiles);
        for tile in tiles.iter().filter(|t| t.coord != boom.xy) {
            if let Some(victim) = self.machine_id_at(tile.coord) {
                let falloff = explosion_falloff(step_distance_between(boom.xy, tile.coord));
                self.schedule_now(victim, MachineEventKind::ReceivedDamage { damage: damage * falloff });
            }
        }
        self.machine_events.push(MachineEvent { machine: id, kind: MachineEventKind::Exploded { explosion: boom } });
    }

    fn handle_completed_build(&mut self, builder: MachineId, site: HexCoord, blueprint: u16, code_id: u16) {
        let Some(m) = self.machine_mut(builder) else {
            return;
        };
        let facing = m.facing();
        let child = m.build_machine(blueprint, code_id);
        if self.grid.is_tile_reserved(site) {
            self.grid.unreserve_empty_tile(site);
        }
        match child.and_then(|c| self.add_machine_to_board(site, facing, c)) {
            Ok(id) => debug!(machine = %builder, child = %id, %site, "machine built"),
            Err(e) => warn!(machine = %builder, %site, error = %e, "build failed"),
        }
    }

    fn handle_cargo_transfer(&mut self, from: HexCoord, to: HexCoord, tradable: u16, units: u16) {
        let (Some(giver), Some(receiver), Some(t)) =
            (self.machine_id_at(from), self.machine_id_at(to), TradableType::from_index(tradable))
        else {
            return;
        };
        if let Some((g, r)) = self.machine_pair_mut(giver, receiver) {
            if g.is_alive() && r.is_alive() && !g.try_transfer_cargo_to(r, t, units) {
                trace!(from = %from, to = %to, units, "cargo transfer refused");
            }
        }
    }

    fn handle_cash_transfer(&mut self, payer: MachineId, to: HexCoord, amount: u16) {
        if amount == 0 {
            return;
        }
        let Some(payee) = self.machine_id_at(to) else {
            return;
        };
        let paid = self.machine_pair_mut(payer, payee).and_then(|(p, r)| {
            let from = p.board_xy();
            p.try_transfer_credits_to(r, amount).then_some(from)
        });
        if let Some(from) = paid {
            self.secondary_events.push(SecondaryEvent::CashTransferred { from, to, amount });
        }
    }
}
