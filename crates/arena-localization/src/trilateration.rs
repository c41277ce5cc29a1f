//! Absolute pose estimation from beacon range and bearing measurements.
//!
//! Every pair of observed beacons yields two candidate robot positions, mirror
//! images across the line through both beacons. The candidates of the first two
//! pairs that agree best seed the estimate; each further pair contributes the
//! candidate closest to the running mean. The heading follows from the map
//! bearing of the first beacon and its measured relative bearing.

use arena_kinematics::geometry::{bearing, centroid, project, triangle_side};
use arena_kinematics::{Point, Pose};

use crate::beacon::BeaconObservation;

/// Minimum number of observations needed for a fix.
pub const MIN_BEACONS: usize = 3;

const MIN_BASELINE: f64 = 1e-9;

/// The two mirror-image robot positions consistent with one pair of observations.
///
/// Returns `None` when the measured baseline between the beacons collapses.
fn candidates(first: &BeaconObservation, second: &BeaconObservation) -> Option<[Point; 2]> {
    let (d1, d2) = (first.distance, second.distance);
    let angle = (second.bearing - first.bearing).abs();
    let angle = if angle > 180.0 { 360.0 - angle } else { angle };

    let a = triangle_side(d1, d2, angle);
    if a < MIN_BASELINE {
        return None;
    }

    let along = (a * a + d1 * d1 - d2 * d2) / (2.0 * a);
    let across = (d1 * d1 - along * along).max(0.0).sqrt();

    let baseline = bearing(first.beacon, second.beacon);
    let foot = project(first.beacon, baseline, along);
    Some([
        project(foot, baseline + 90.0, across),
        project(foot, baseline - 90.0, across),
    ])
}

fn nearest(options: &[Point; 2], target: Point) -> Point {
    if options[0].distance(target) <= options[1].distance(target) {
        options[0]
    } else {
        options[1]
    }
}

/// Estimates the robot pose from beacon observations.
///
/// Returns `None` with fewer than three observations or when fewer than two
/// beacon pairs have usable geometry.
pub fn trilaterate(observations: &[BeaconObservation]) -> Option<Pose> {
    if observations.len() < MIN_BEACONS {
        return None;
    }

    let pairs: Vec<[Point; 2]> = observations
        .iter()
        .enumerate()
        .flat_map(|(i, first)| {
            observations[i + 1..]
                .iter()
                .filter_map(move |second| candidates(first, second))
        })
        .collect();

    let (seed, rest) = pairs.split_first()?;
    let (second, rest) = rest.split_first()?;

    let mut best = (f64::INFINITY, seed[0], second[0]);
    for a in seed {
        for b in second {
            let d = a.distance(*b);
            if d < best.0 {
                best = (d, *a, *b);
            }
        }
    }

    let mut believed = vec![best.1, best.2];
    for options in rest {
        let mean = centroid(&believed)?;
        believed.push(nearest(options, mean));
    }

    let position = centroid(&believed)?;
    let reference = &observations[0];
    let theta = bearing(position, reference.beacon) - reference.bearing;
    Some(Pose::normalized(position.x, position.y, theta))
}
