use super::config::{PROBE_RADIUS, PROBE_STEP, TILE_SIZE};
use super::geometry::{TilePos, WorldPos};
use super::room::Room;

/// Ray-marched line of sight from `observer` to `target`.
///
/// A probe walks toward the target in `PROBE_STEP` increments. Sight
/// succeeds once the probe is strictly within `PROBE_RADIUS` of the target
/// on both axes, and fails on the first opaque (or off-map) tile. The
/// result is direction-sensitive: the probe samples different tiles going
/// the other way.
pub fn can_see(observer: WorldPos, target: WorldPos, room: &Room) -> bool {
    if observer == target {
        return true;
    }

    let dx = (target.x - observer.x) as f64;
    let dy = (target.y - observer.y) as f64;
    let dist = dx.hypot(dy);
    let (ux, uy) = (dx / dist, dy / dist);
    let (tx, ty) = (target.x as f64, target.y as f64);
    let max_steps = (dist / PROBE_STEP).ceil() as usize + 1;

    let mut px = observer.x as f64;
    let mut py = observer.y as f64;
    for _ in 0..max_steps {
        px += ux * PROBE_STEP;
        py += uy * PROBE_STEP;

        if (px - tx).abs() < PROBE_RADIUS && (py - ty).abs() < PROBE_RADIUS {
            return true;
        }

        let tile = TilePos::new(
            (px / TILE_SIZE as f64).floor() as i32,
            (py / TILE_SIZE as f64).floor() as i32,
        );
        if room.is_opaque(tile) {
            return false;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::room::TileLayer;

    const WALL: u32 = 9;

    /// A `w` x `h` room whose collision layer holds walls at `walls`.
    fn room_with_walls(w: usize, h: usize, walls: &[(usize, usize)]) -> Room {
        let mut room = Room::new("sight", w, h);
        let mut data = vec![0; w * h];
        for &(x, y) in walls {
            data[y * w + x] = WALL;
        }
        room.layers = vec![
            TileLayer {
                name: "Floor".into(),
                data: vec![1; w * h],
            },
            TileLayer {
                name: "Walls".into(),
                data,
            },
        ];
        room.sprites.opaque.insert(WALL);
        room.sprites.solid.insert(WALL);
        room
    }

    fn w(tx: i32, ty: i32) -> WorldPos {
        TilePos::new(tx, ty).to_world()
    }

    #[test]
    fn test_co_located() {
        let room = room_with_walls(3, 3, &[(1, 1)]);
        assert!(can_see(w(1, 1), w(1, 1), &room));
    }

    #[test]
    fn test_clear_line() {
        let room = room_with_walls(10, 10, &[]);
        assert!(can_see(w(0, 0), w(8, 0), &room));
        assert!(can_see(w(8, 5), w(1, 2), &room));
        assert!(can_see(w(0, 1), w(1, 1), &room));
    }

    #[test]
    fn test_wall_blocks_both_ways() {
        let room = room_with_walls(10, 3, &[(4, 1)]);
        assert!(!can_see(w(1, 1), w(8, 1), &room));
        assert!(!can_see(w(8, 1), w(1, 1), &room));
    }

    #[test]
    fn test_wall_off_the_line() {
        let room = room_with_walls(10, 5, &[(4, 3)]);
        assert!(can_see(w(1, 1), w(8, 1), &room));
    }

    #[test]
    fn test_opaque_counts_only_when_marked() {
        let mut room = room_with_walls(10, 3, &[(4, 1)]);
        room.sprites.opaque.clear();
        assert!(can_see(w(1, 1), w(8, 1), &room));
    }
}
