//! Sensor mounting orientation
//!
//! Each channel carries a signed 3×3 mounting matrix that maps raw
//! sensor-frame axes into the device body frame. Matrices are read once from
//! the device (or the compass collaborator) at initialization and never
//! change for the lifetime of a driver instance.

use serde::{Deserialize, Serialize};

/// Signed 3×3 mounting matrix, row-major
///
/// Entries are typically in {-1, 0, 1} (axis permutations with sign flips)
/// but arbitrary integers are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountingMatrix(pub [i32; 9]);

impl MountingMatrix {
    /// Identity mounting (sensor frame == body frame)
    pub const IDENTITY: MountingMatrix = MountingMatrix([1, 0, 0, 0, 1, 0, 0, 0, 1]);

    /// Transform a raw 3-axis sample into the body frame
    ///
    /// `out[i] = Σ_j raw[j] * m[i*3 + j]`
    pub fn apply(&self, raw: [i32; 3]) -> [i32; 3] {
        let m = &self.0;
        let mut out = [0i32; 3];
        for i in 0..3 {
            out[i] = raw[0]
                .wrapping_mul(m[i * 3])
                .wrapping_add(raw[1].wrapping_mul(m[i * 3 + 1]))
                .wrapping_add(raw[2].wrapping_mul(m[i * 3 + 2]));
        }
        out
    }
}

impl Default for MountingMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}
