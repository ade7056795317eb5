//! Input mapping: held keys become a [`MoveInput`] each frame, key presses
//! become discrete [`Action`]s.
//!
//! # Invariants
//! - Independent of the windowing library; the desktop app translates its
//!   key codes into [`Key`].

pub mod action;

pub use action::{Action, InputState, Key, MoveInput};
