//! ToyDo Services Layer
//!
//! Everything around the canvas core that a host wires up: pointer input,
//! task intents, the in-memory task store and settings.

pub mod input;
pub mod intent;
pub mod settings;
pub mod store;

pub use input::{Gesture, InteractionLayer, PointerEvent, PointerId, PointerKind, PointerPhase};
pub use intent::TaskIntent;
pub use settings::{CanvasSettings, Settings, SettingsError};
pub use store::{StoreError, TaskStore};
