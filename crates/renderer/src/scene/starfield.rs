use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sceneconfig::StarfieldSettings;

use super::PointCloud;

/// Scatters `count` points uniformly inside an axis-aligned cube of edge
/// `extent` centred on the origin.
pub fn scatter<R: Rng>(count: u32, extent: f32, rng: &mut R) -> Vec<[f32; 3]> {
    let half = extent * 0.5;
    (0..count)
        .map(|_| {
            [
                rng.gen_range(-half..half),
                rng.gen_range(-half..half),
                rng.gen_range(-half..half),
            ]
        })
        .collect()
}

pub fn build(settings: &StarfieldSettings, seed: u64) -> PointCloud {
    let mut rng = StdRng::seed_from_u64(seed);
    PointCloud {
        positions: scatter(settings.count, settings.extent, &mut rng),
        color: settings.color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stars_fill_the_requested_cube() {
        let settings = StarfieldSettings::default();
        let stars = build(&settings, 42);
        assert_eq!(stars.positions.len(), 10_000);
        for star in &stars.positions {
            assert!(star.iter().all(|c| (-1000.0..1000.0).contains(c)));
        }
    }

    #[test]
    fn same_seed_same_sky() {
        let settings = StarfieldSettings {
            count: 64,
            ..StarfieldSettings::default()
        };
        assert_eq!(build(&settings, 7), build(&settings, 7));
        assert_ne!(build(&settings, 7), build(&settings, 8));
    }

    #[test]
    fn zero_count_is_empty() {
        let settings = StarfieldSettings {
            count: 0,
            ..StarfieldSettings::default()
        };
        assert!(build(&settings, 1).positions.is_empty());
    }
}
