//! Convenience re-exports — `use huginn::prelude::*` for the common items.

pub use crate::ecs::{
    Component, ComponentId, Entity, EntityContext, EntityId, GroupId, MAX_COMPONENT_KINDS,
    MAX_GROUPS, Mask, TypeRegistry, World,
};
pub use crate::time::{FixedStep, Time};
