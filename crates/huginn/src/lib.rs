//! # Huginn — Behavior-Component Game Object Runtime
//!
//! A small runtime for composing game objects out of independent behavior
//! units. An entity is nothing but the set of components attached to it;
//! each component implements update/render hooks, and a [`World`](ecs::World)
//! owns everything and drives the per-frame cycle: sweep the dead, update
//! the survivors, render the lot.
//!
//! Rendering backends, input, assets, and audio are deliberately out of
//! scope; the world is generic over whatever render target the driver
//! supplies, and delta time comes in as a plain scalar.
//!
//! Start with `use huginn::prelude::*` and a [`World`](ecs::World).

pub mod ecs;
pub mod prelude;
pub mod time;
