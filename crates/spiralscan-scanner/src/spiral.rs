//! Square spiral of sample coordinates around an origin.
//!
//! The walk alternates between the latitude axis and the longitude axis. Each
//! full revolution flips the walking direction and lengthens the leg by one,
//! so the visited offsets are `(1,0) (1,1) (0,1) (-1,1) (-1,0) (-1,-1) ...`.
//! Only the sub-cell jitter added to each point is random.

use rand::Rng;
use spiralscan_core::Coordinate;

/// Default upper bound of the random offset added to each point, in degrees.
pub const DEFAULT_JITTER_DEGREES: f64 = 0.0005;

/// Random offset added to both axes of every generated point except the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Jitter {
    /// Emit the exact lattice positions.
    None,
    /// Add an independent offset drawn from `[0, max)` to each axis.
    Uniform {
        /// Exclusive upper bound in degrees
        max: f64,
    },
}

impl Jitter {
    fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> f64 {
        match self {
            Self::Uniform { max } if max > 0.0 => rng.gen_range(0.0..max),
            _ => 0.0,
        }
    }
}

impl Default for Jitter {
    fn default() -> Self {
        Self::Uniform {
            max: DEFAULT_JITTER_DEGREES,
        }
    }
}

/// Internal walk state; discarded once the sequence is built.
#[derive(Debug)]
struct SpiralState {
    steps_taken: usize,
    x: i64,
    y: i64,
    direction: i64,
    leg_length: i64,
}

/// Generates the spiral for a given step size and step limit.
#[derive(Debug, Clone, Copy)]
pub struct SpiralGenerator {
    step_size: f64,
    step_limit: usize,
    jitter: Jitter,
}

impl SpiralGenerator {
    /// Create a generator producing `step_limit` points after the origin,
    /// `step_size` degrees apart, with the default jitter.
    #[must_use]
    pub fn new(step_size: f64, step_limit: usize) -> Self {
        Self {
            step_size,
            step_limit,
            jitter: Jitter::default(),
        }
    }

    /// Replace the jitter applied to generated points.
    #[must_use]
    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Number of coordinates `generate` returns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.step_limit + 1
    }

    /// Always false: the origin is part of every spiral.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Integer lattice offsets in visiting order, origin first.
    #[must_use]
    pub fn offsets(&self) -> Vec<(i64, i64)> {
        let mut offsets = Vec::with_capacity(self.len());
        offsets.push((0, 0));

        let mut state = SpiralState {
            steps_taken: 0,
            x: 0,
            y: 0,
            direction: 1,
            leg_length: 1,
        };

        while state.steps_taken < self.step_limit {
            while 2 * state.x * state.direction < state.leg_length
                && state.steps_taken < self.step_limit
            {
                state.x += state.direction;
                state.steps_taken += 1;
                offsets.push((state.x, state.y));
            }
            while 2 * state.y * state.direction < state.leg_length
                && state.steps_taken < self.step_limit
            {
                state.y += state.direction;
                state.steps_taken += 1;
                offsets.push((state.x, state.y));
            }

            state.direction = -state.direction;
            state.leg_length += 1;
        }

        offsets
    }

    /// Generate the spiral around `origin` using the thread-local RNG for jitter.
    #[must_use]
    pub fn generate(&self, origin: Coordinate) -> Vec<Coordinate> {
        self.generate_with_rng(origin, &mut rand::thread_rng())
    }

    /// Generate the spiral around `origin`, drawing jitter from `rng`.
    ///
    /// The first element is always the origin itself.
    #[allow(clippy::cast_precision_loss)]
    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        origin: Coordinate,
        rng: &mut R,
    ) -> Vec<Coordinate> {
        self.offsets()
            .into_iter()
            .enumerate()
            .map(|(index, (x, y))| {
                if index == 0 {
                    return origin;
                }
                let lat = origin.lat + x as f64 * self.step_size + self.jitter.sample(rng);
                let lng = origin.lng + y as f64 * self.step_size + self.jitter.sample(rng);
                Coordinate::new(lat, lng)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn assert_close(actual: Coordinate, expected: (f64, f64)) {
        assert!(
            (actual.lat - expected.0).abs() < 1e-9 && (actual.lng - expected.1).abs() < 1e-9,
            "expected {expected:?}, got {actual}"
        );
    }

    #[test]
    fn test_spiral_walk_order() {
        let coords = SpiralGenerator::new(0.001, 8)
            .with_jitter(Jitter::None)
            .generate(Coordinate::new(10.0, 20.0));

        let expected = [
            (10.0, 20.0),
            (10.001, 20.0),
            (10.001, 20.001),
            (10.0, 20.001),
            (9.999, 20.001),
            (9.999, 20.0),
            (9.999, 19.999),
            (10.0, 19.999),
            (10.001, 19.999),
        ];
        assert_eq!(coords.len(), expected.len());
        for (coord, expected) in coords.into_iter().zip(expected) {
            assert_close(coord, expected);
        }
    }

    #[test]
    fn test_spiral_length_includes_origin() {
        for step_limit in [0, 1, 2, 7, 50, 3000] {
            let generator = SpiralGenerator::new(0.0015, step_limit);
            let coords = generator.generate(Coordinate::new(1.0, 2.0));
            assert_eq!(coords.len(), step_limit + 1);
            assert_eq!(coords.len(), generator.len());
            assert_eq!(coords[0], Coordinate::new(1.0, 2.0));
        }
    }

    #[test]
    fn test_zero_step_limit_is_origin_only() {
        let coords = SpiralGenerator::new(0.001, 0).generate(Coordinate::new(-33.9, 151.2));
        assert_eq!(coords, vec![Coordinate::new(-33.9, 151.2)]);
    }

    #[test]
    fn test_zero_step_size_collapses_onto_origin() {
        let mut rng = StdRng::seed_from_u64(7);
        let origin = Coordinate::new(48.85, 2.35);
        let coords = SpiralGenerator::new(0.0, 20).generate_with_rng(origin, &mut rng);
        for coord in coords {
            assert!((0.0..DEFAULT_JITTER_DEGREES).contains(&(coord.lat - origin.lat)));
            assert!((0.0..DEFAULT_JITTER_DEGREES).contains(&(coord.lng - origin.lng)));
        }
    }

    #[test]
    fn test_offsets_visit_each_position_once() {
        let offsets = SpiralGenerator::new(1.0, 24).offsets();
        let unique: std::collections::HashSet<_> = offsets.iter().collect();
        assert_eq!(unique.len(), offsets.len());
        // 25 points fill the 5x5 square around the origin.
        assert!(offsets.iter().all(|(x, y)| x.abs() <= 2 && y.abs() <= 2));
    }

    #[test]
    fn test_skeleton_is_translation_invariant() {
        let generator = SpiralGenerator::new(0.002, 40).with_jitter(Jitter::None);
        let base = generator.generate(Coordinate::new(0.0, 0.0));
        let shifted = generator.generate(Coordinate::new(12.5, -7.25));

        for (a, b) in base.iter().zip(&shifted) {
            assert_close(*b, (a.lat + 12.5, a.lng - 7.25));
        }
    }

    #[test]
    fn test_seeded_jitter_is_reproducible_and_bounded() {
        let generator = SpiralGenerator::new(0.0015, 30);
        let origin = Coordinate::new(10.0, 20.0);

        let first = generator.generate_with_rng(origin, &mut StdRng::seed_from_u64(42));
        let second = generator.generate_with_rng(origin, &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);

        let skeleton = generator.with_jitter(Jitter::None).generate(origin);
        for (jittered, exact) in first.iter().zip(&skeleton).skip(1) {
            let d_lat = jittered.lat - exact.lat;
            let d_lng = jittered.lng - exact.lng;
            assert!((0.0..DEFAULT_JITTER_DEGREES + 1e-12).contains(&d_lat));
            assert!((0.0..DEFAULT_JITTER_DEGREES + 1e-12).contains(&d_lng));
        }
    }
}
