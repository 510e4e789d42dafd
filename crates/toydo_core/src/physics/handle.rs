//! Typed handles over rapier's generational handles.
//!
//! Rapier already bumps a generation when a slot is reused, so a handle kept
//! past removal never resolves to a later body.

use rapier2d::prelude::{ImpulseJointHandle, RigidBodyHandle};

/// Handle to a body owned by a [`PhysicsWorld`](super::PhysicsWorld).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub(crate) RigidBodyHandle);

impl BodyHandle {
    pub fn from_raw_parts(index: u32, generation: u32) -> Self {
        Self(RigidBodyHandle::from_raw_parts(index, generation))
    }

    /// `(index, generation)`, stable for the life of the body.
    pub fn into_raw_parts(self) -> (u32, u32) {
        self.0.into_raw_parts()
    }
}

/// Handle to a drag spring owned by a [`PhysicsWorld`](super::PhysicsWorld).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ConstraintHandle(pub(crate) ImpulseJointHandle);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_parts_round_trip() {
        let handle = BodyHandle::from_raw_parts(7, 3);
        assert_eq!(handle.into_raw_parts(), (7, 3));
        assert_ne!(handle, BodyHandle::from_raw_parts(7, 4));
    }
}
