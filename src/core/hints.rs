/*!
 * Compiler Optimization Hints
 * Branch layout hints for queue hot paths
 */

/// Marker call that the optimizer treats as a cold edge
#[cold]
#[inline(never)]
fn cold_path() {}

/// Hint to the compiler that this branch is unlikely to be taken
///
/// Use for error paths such as a saturated channel.
#[inline(always)]
#[must_use]
pub fn unlikely(b: bool) -> bool {
    if b {
        cold_path();
    }
    b
}
