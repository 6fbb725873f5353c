//! Depth/visibility gate.
//!
//! Smaller stored values are nearer. A fragment wins a pixel only when its
//! depth lies in the normalized [0, 1] range and is strictly nearer than what
//! the buffer already holds; ties keep the fragment written first.

/// Value the depth buffer is reset to at the start of every frame.
pub const DEPTH_CLEAR: f32 = f32::MAX;

/// Returns true when `depth` is inside the normalized depth range.
/// NaN is outside every range.
#[inline(always)]
pub fn in_depth_range(depth: f32) -> bool {
    (0.0..=1.0).contains(&depth)
}

/// Test `depth` against a single depth buffer cell and write it on success.
#[inline(always)]
pub fn depth_test_and_write(stored: &mut f32, depth: f32) -> bool {
    if !in_depth_range(depth) || depth >= *stored {
        return false;
    }
    *stored = depth;
    true
}
