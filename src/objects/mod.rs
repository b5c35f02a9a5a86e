pub mod rigid_body;

pub use rigid_body::{BodyDesc, BodyHandle, RigidBody};

/// Mutable references to two distinct bodies of a slice.
/// Returns `None` when the handles are equal or out of range.
pub(crate) fn body_pair_mut(
    bodies: &mut [RigidBody],
    a: BodyHandle,
    b: BodyHandle,
) -> Option<(&mut RigidBody, &mut RigidBody)> {
    let (ia, ib) = (a.index(), b.index());
    if ia == ib || ia >= bodies.len() || ib >= bodies.len() {
        return None;
    }
    if ia < ib {
        let (low, high) = bodies.split_at_mut(ib);
        Some((&mut low[ia], &mut high[0]))
    } else {
        let (low, high) = bodies.split_at_mut(ia);
        Some((&mut high[0], &mut low[ib]))
    }
}
