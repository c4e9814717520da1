//! Walking the tiles crossed by a straight line.
//!
//! This is the hexagonal line-of-sight walk described by zvold, which works
//! with rows and columns transposed relative to the board; the public entry
//! point swaps them on the way in and out.

const X_DIRS: [[[i32; 3]; 2]; 2] = [
    [[-1, -1, 0], [-1, 1, 0]],
    [[0, -1, 1], [0, 1, 1]],
];

const Y_DIRS: [[[i32; 3]; 2]; 2] = [
    [[-1, 0, -1], [1, 0, 1]],
    [[-1, 0, -1], [1, 0, 1]],
];

#[allow(clippy::cast_sign_loss)]
fn step(i: i32, j: i32, parity: i32) -> (i32, i32) {
    let i = (i + 1) as usize;
    let j = usize::from(j >= 0);
    let k = (parity & 1) as usize;
    (X_DIRS[k][j][i], Y_DIRS[k][j][i])
}

/// Calls `visit(x, y)` for each tile under the line from `start` to `end`,
/// excluding `start` and ending with `end`, until `visit` returns false.
///
/// Does nothing when the two points are the same tile.
pub(crate) fn hex_steps_under_line<F>(start: (i32, i32), end: (i32, i32), mut visit: F)
where
    F: FnMut(i32, i32) -> bool,
{
    // Transposed: the walk's x axis is the board's y axis.
    let (start_x, start_y) = (start.1, start.0);
    let (end_x, end_y) = (end.1, end.0);

    if start_x == end_x && start_y == end_y {
        return;
    }

    let old_2x = 2 * (end_x - start_x) + (end_y & 1) - (start_y & 1);
    let old_x = end_x - start_x;
    let sign_x = if start_y & 1 == 1 {
        if old_x <= 0 { -1 } else { 1 }
    } else if old_x < 0 {
        -1
    } else {
        1
    };
    let dx = old_2x.abs();

    let old_y = end_y - start_y;
    let sign_y = if old_y < 0 { -1 } else { 1 };
    let dy = old_y.abs();

    let mut cx = start_x;
    let mut cy = start_y;
    let mut e = -2 * dx;

    loop {
        let (sx, sy) = if e >= 0 {
            e -= 3 * (dy + dx);
            step(-sign_x, sign_y, cy)
        } else {
            e += 3 * dy;
            if e > -dx {
                e -= 3 * dx;
                step(sign_x, sign_y, cy)
            } else if e < -3 * dx {
                e += 3 * dx;
                step(sign_x, -sign_y, cy)
            } else {
                e += 3 * dy;
                step(0, sign_x, cy)
            }
        };
        cx += sx;
        cy += sy;

        if !visit(cy, cx) || (cx == end_x && cy == end_y) {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::{HexCoord, step_distance_between};

    fn walk(a: (i32, i32), b: (i32, i32)) -> Vec<(i32, i32)> {
        let mut tiles = Vec::new();
        hex_steps_under_line(a, b, |x, y| {
            tiles.push((x, y));
            tiles.len() < 32
        });
        tiles
    }

    #[test]
    fn test_same_point_yields_nothing() {
        assert!(walk((3, 3), (3, 3)).is_empty());
    }

    #[test]
    fn test_neighbours_are_reached_in_one_step() {
        for b in [(2, 3), (3, 3), (3, 4), (2, 5), (1, 4), (1, 3)] {
            assert_eq!(walk((2, 4), b).last(), Some(&b));
        }
    }

    #[test]
    fn test_ring_two_ends_on_target() {
        let targets = [
            (2, 2),
            (3, 2),
            (4, 3),
            (4, 4),
            (4, 5),
            (3, 5),
            (2, 6),
            (1, 5),
            (0, 5),
            (0, 4),
            (0, 3),
            (1, 2),
        ];
        for b in targets {
            let tiles = walk((2, 4), b);
            assert_eq!(tiles.last(), Some(&b), "line to {b:?} was {tiles:?}");
        }
    }

    #[test]
    fn test_each_step_moves_to_a_neighbour() {
        let tiles = walk((1, 1), (8, 6));
        let mut prev = HexCoord::new(1, 1);
        for (x, y) in tiles {
            let c = HexCoord::new(i8::try_from(x).unwrap(), i8::try_from(y).unwrap());
            assert_eq!(step_distance_between(prev, c), 1);
            prev = c;
        }
        assert_eq!(prev, HexCoord::new(8, 6));
    }
}
