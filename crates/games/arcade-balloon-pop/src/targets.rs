use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Smallest target diameter.
pub const MIN_SIZE: u32 = 30;
/// Largest target diameter.
pub const MAX_SIZE: u32 = 80;

/// Balloon colors.
pub const PALETTE: [&str; 12] = [
    "#FF5252", "#FF4081", "#E040FB", "#7C4DFF", "#536DFE", "#448AFF", "#40C4FF", "#18FFFF",
    "#64FFDA", "#69F0AE", "#B2FF59", "#EEFF41",
];

/// Size of the play area targets are placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayArea {
    pub width: u32,
    pub height: u32,
}

impl Default for PlayArea {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

/// A live balloon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: u64,
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    pub size: u32,
    pub color: String,
    /// Game clock time the target appeared.
    pub spawned_at: Duration,
}

/// Build a target with a uniformly random size, color, and position. The
/// whole target stays inside `area`; an area smaller than the target pins
/// it to the top-left corner.
pub fn random_target<R: Rng>(
    rng: &mut R,
    area: PlayArea,
    id: u64,
    now: Duration,
) -> Target {
    let size = rng.random_range(MIN_SIZE..=MAX_SIZE);
    let x = rng.random_range(0..=area.width.saturating_sub(size));
    let y = rng.random_range(0..=area.height.saturating_sub(size));
    let color = PALETTE[rng.random_range(0..PALETTE.len())].to_string();
    Target {
        id,
        x,
        y,
        size,
        color,
        spawned_at: now,
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn tiny_area_pins_to_origin() {
        let mut rng = StdRng::seed_from_u64(3);
        let area = PlayArea {
            width: 10,
            height: 10,
        };
        for id in 0..50 {
            let t = random_target(&mut rng, area, id, Duration::ZERO);
            assert_eq!((t.x, t.y), (0, 0));
        }
    }

    #[test]
    fn records_spawn_time_and_id() {
        let mut rng = StdRng::seed_from_u64(1);
        let t = random_target(&mut rng, PlayArea::default(), 9, Duration::from_secs(4));
        assert_eq!(t.id, 9);
        assert_eq!(t.spawned_at, Duration::from_secs(4));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn targets_stay_inside_area(
                seed in 0u64..1000,
                width in 80u32..2000,
                height in 80u32..2000,
            ) {
                let mut rng = StdRng::seed_from_u64(seed);
                let area = PlayArea { width, height };
                for id in 0..20 {
                    let t = random_target(&mut rng, area, id, Duration::ZERO);
                    prop_assert!((MIN_SIZE..=MAX_SIZE).contains(&t.size));
                    prop_assert!(t.x + t.size <= width);
                    prop_assert!(t.y + t.size <= height);
                    prop_assert!(PALETTE.contains(&t.color.as_str()));
                }
            }
        }
    }
}
