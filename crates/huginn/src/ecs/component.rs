//! # Component — The Behavior Contract
//!
//! A component is a unit of behavior and state attached to an entity: a
//! counter, a moving shape, a kill condition. The framework knows nothing
//! about what a component does; it only promises to call the three hooks at
//! the right moments and to keep the component alive exactly as long as its
//! entity.
//!
//! ## Hooks
//!
//! - [`on_attach`](Component::on_attach) fires exactly once, right after the
//!   component is fully installed (slot recorded, capability bit set) and
//!   before its first update. Use it to check for or initialize against
//!   sibling components via the [`EntityContext`].
//! - [`on_update`](Component::on_update) fires once per frame with the frame's
//!   delta time in seconds.
//! - [`on_render`](Component::on_render) fires once per frame with the
//!   externally supplied render target.
//!
//! All three default to no-ops; concrete kinds override any subset.
//!
//! ## The render target parameter
//!
//! The framework assumes no contract at all about what rendering means, so
//! the target is a plain type parameter `R` threaded through
//! [`Component`], [`Entity`](super::entity::Entity), and
//! [`World`](super::world::World). A game picks one concrete target type
//! (a window, a draw list, a test buffer) and everything dispatches
//! statically against it.
//!
//! ## Comparison
//!
//! - **hecs / bevy_ecs**: components are plain data and behavior lives in
//!   systems. Here the component *is* the behavior, the classic
//!   object-style composition pattern.
//! - Storage is `Box<dyn Component<R>>` per component, reaching `Any`
//!   through the [`AsAny`] supertrait for typed retrieval. Each component
//!   is heap-allocated and downcast at runtime, trading cache locality for
//!   zero unsafe code.

use std::any::Any;

use super::entity::EntityContext;

/// Upcast helper so `dyn Component<R>` can be downcast to its concrete type.
///
/// Blanket-implemented for every `'static` type; component implementors never
/// touch it directly.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A behavior unit attachable to an entity. `R` is the render target type
/// the owning [`World`](super::world::World) draws to.
///
/// # Example
///
/// ```
/// use huginn::prelude::*;
///
/// struct Frame; // whatever the game draws to
///
/// #[derive(Default)]
/// struct Lifetime {
///     seconds: f32,
/// }
///
/// impl Component<Frame> for Lifetime {
///     fn on_update(&mut self, dt: f32, _ctx: &mut EntityContext<'_, Frame>) {
///         self.seconds += dt;
///     }
/// }
/// ```
pub trait Component<R>: AsAny {
    /// Called exactly once, after installation and before the first update.
    fn on_attach(&mut self, _ctx: &mut EntityContext<'_, R>) {}

    /// Called once per [`tick`](super::world::World::tick) with the frame's
    /// delta time in seconds.
    fn on_update(&mut self, _dt: f32, _ctx: &mut EntityContext<'_, R>) {}

    /// Called once per [`render`](super::world::World::render) pass.
    fn on_render(&mut self, _target: &mut R) {}
}
