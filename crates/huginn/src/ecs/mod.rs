//! Behavior-component runtime: entities, components, groups, and the
//! tick/render frame cycle.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │ World<R>                                               │
//! │                                                        │
//! │  TypeRegistry: component kind -> ComponentId (0..32)   │
//! │                                                        │
//! │  entities: Vec<Entity<R>>          (insertion order)   │
//! │    Entity: components + capability/group masks         │
//! │            + alive flag + 32-slot kind table           │
//! │                                                        │
//! │  groups: [Vec<EntityId>; 32]     (lazily swept lists)  │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! Start at [`World`]; the [`Component`] trait is what game code implements.

pub mod component;
pub mod entity;
pub mod mask;
pub mod registry;
pub mod world;

pub use component::{AsAny, Component};
pub use entity::{Entity, EntityContext, EntityId};
pub use mask::Mask;
pub use registry::{ComponentId, GroupId, MAX_COMPONENT_KINDS, MAX_GROUPS, TypeRegistry};
pub use world::World;
