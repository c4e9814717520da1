//! Property-based tests for hex geometry.
//!
//! Run with: cargo test --release prop_hex

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use blue::hex::{
    HexCoord, HexFacing, calculate_coord, calculate_neighbour_coord, calculate_xy, count_of_hexagons_inside_ring,
    facing_neighbour_coord, neighbours_facing, step_distance_between,
};

fn coord() -> impl Strategy<Value = HexCoord> {
    (0i8..100, 0i8..100).prop_map(|(x, y)| HexCoord::new(x, y))
}

/// Far enough from the origin that nothing walks into negative columns.
fn inner_coord() -> impl Strategy<Value = HexCoord> {
    (25i8..75, 25i8..75).prop_map(|(x, y)| HexCoord::new(x, y))
}

fn facing() -> impl Strategy<Value = HexFacing> {
    (0usize..6).prop_map(|i| HexFacing::ALL[i])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// Packing into a word loses nothing.
    #[test]
    fn prop_packing_roundtrip(c in coord()) {
        prop_assert_eq!(HexCoord::from_u16(c.to_u16()), c);
    }

    /// Axial coordinates describe the same tile.
    #[test]
    fn prop_axial_roundtrip(c in coord()) {
        let (q, r) = c.to_axial();
        prop_assert_eq!(HexCoord::from_axial(q, r), c);
    }

    /// The nearest tile to a tile's centre is that tile.
    #[test]
    fn prop_world_centre_roundtrip(c in coord()) {
        let [x, y] = calculate_xy(c);
        prop_assert_eq!(calculate_coord(x, y), c);
    }

    /// Step distance is a metric.
    #[test]
    fn prop_step_distance_is_a_metric(a in coord(), b in coord(), c in coord()) {
        prop_assert_eq!(step_distance_between(a, b), step_distance_between(b, a));
        prop_assert_eq!(step_distance_between(a, b) == 0, a == b);
        prop_assert!(step_distance_between(a, c) <= step_distance_between(a, b) + step_distance_between(b, c));
    }

    /// The neighbour in a facing is one step away and faced that way.
    #[test]
    fn prop_neighbour_is_one_step_away(c in inner_coord(), f in facing()) {
        let n = facing_neighbour_coord(c, f);
        prop_assert_eq!(step_distance_between(c, n), 1);
        prop_assert_eq!(neighbours_facing(c, n), Some(f));
        prop_assert_eq!(facing_neighbour_coord(n, f.opposite()), c);
    }

    /// Walking `n` tiles in a straight line ends `n` steps away.
    #[test]
    fn prop_straight_walk_distance(c in inner_coord(), f in facing(), n in 0i32..20) {
        let end = calculate_neighbour_coord(c, f, n);
        prop_assert_eq!(i32::from(step_distance_between(c, end)), n);
    }

    /// The hexagon count formula agrees with counting tiles by distance.
    #[test]
    fn prop_ring_count_matches_distance(r in 0u32..8) {
        let centre = HexCoord::new(50, 50);
        let mut inside = 0;
        for x in 40i8..=60 {
            for y in 40i8..=60 {
                if u32::from(step_distance_between(centre, HexCoord::new(x, y))) <= r {
                    inside += 1;
                }
            }
        }
        prop_assert_eq!(inside, count_of_hexagons_inside_ring(r));
    }
}
