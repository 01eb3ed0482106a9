//! # Registry — Stable Small Ids for Component Kinds
//!
//! Every distinct component kind gets a small integer [`ComponentId`],
//! assigned lazily the first time the kind is registered and memorized for
//! the lifetime of the owning [`World`](super::world::World). Ids index into
//! the fixed 32-slot capability tables each entity carries, so the kind space
//! is hard-capped at [`MAX_COMPONENT_KINDS`]. Running out of slots is a
//! wiring error in the game, not a runtime condition, and panics.
//!
//! ## Design
//!
//! The registry is an explicit object owned by the `World` rather than a
//! process-wide static. A hidden global counter would work, but it makes two
//! worlds in one test binary step on each other and hides mutable state.
//! Keying by [`TypeId`] gives one-id-per-kind semantics without any macro or
//! manual enumeration on the user's side.
//!
//! ## Comparison
//!
//! - **bevy_ecs**: `ComponentId` assigned by a world-owned registry, same idea
//!   but unbounded.
//! - **EnTT (C++)**: a per-kind static counter, i.e. the global variant this
//!   design deliberately avoids.

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::fmt;

/// Capacity of the component kind space. Capability masks and per-entity
/// lookup tables are sized to exactly this many slots.
pub const MAX_COMPONENT_KINDS: usize = 32;

/// Capacity of the group space. Group masks and the per-world group index
/// are sized to exactly this many slots.
pub const MAX_GROUPS: usize = 32;

/// Stable identifier for a component kind, unique within one registry.
///
/// Ids are dense: the first kind registered gets index 0, the next 1, and so
/// on. The same kind always resolves to the same id for the registry's
/// lifetime.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentId(u8);

impl ComponentId {
    /// The id's slot index, in `[0, MAX_COMPONENT_KINDS)`.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

/// Identifier for a group, a named partition entities can join for fast bulk
/// retrieval. Plain indices chosen by the caller, typically as constants:
///
/// ```
/// use huginn::ecs::GroupId;
///
/// const ENEMIES: GroupId = GroupId::new(0);
/// const BULLETS: GroupId = GroupId::new(1);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupId(u8);

impl GroupId {
    /// Wrap a raw group index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside `[0, MAX_GROUPS)`. Group ids are part of
    /// the game's wiring, so an out-of-range one is a configuration error.
    pub const fn new(index: usize) -> Self {
        assert!(index < MAX_GROUPS, "group index out of range: the group space holds 32 slots");
        GroupId(index as u8)
    }

    /// The group's slot index, in `[0, MAX_GROUPS)`.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupId({})", self.0)
    }
}

/// Assigns and memorizes a [`ComponentId`] per distinct component kind.
///
/// Owned by the [`World`](super::world::World); intended to be driven only
/// from the single frame-processing thread.
pub struct TypeRegistry {
    ids: HashMap<TypeId, ComponentId>,
    /// Kind names, indexed by id. Doubles as the "next free id" counter.
    names: Vec<&'static str>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            ids: HashMap::new(),
            names: Vec::new(),
        }
    }

    /// Return the id for kind `T`, reserving the next unused slot on the
    /// first call and returning the memorized id on every later one.
    ///
    /// # Panics
    ///
    /// Panics when a 33rd distinct kind is registered.
    pub fn register<T: 'static>(&mut self) -> ComponentId {
        if let Some(&id) = self.ids.get(&TypeId::of::<T>()) {
            return id;
        }
        let next = self.names.len();
        if next >= MAX_COMPONENT_KINDS {
            panic!(
                "component kind capacity ({MAX_COMPONENT_KINDS}) exhausted: cannot register `{}`",
                type_name::<T>()
            );
        }
        let id = ComponentId(next as u8);
        self.ids.insert(TypeId::of::<T>(), id);
        self.names.push(type_name::<T>());
        id
    }

    /// Look up the id for kind `T` without registering it. Returns `None`
    /// if `T` has never been registered.
    pub fn lookup<T: 'static>(&self) -> Option<ComponentId> {
        self.ids.get(&TypeId::of::<T>()).copied()
    }

    /// Human-readable name of a registered kind. For diagnostics.
    pub fn name(&self, id: ComponentId) -> &'static str {
        self.names[id.index()]
    }

    /// Number of kinds registered so far.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Position;
    struct Velocity;
    struct Kind<const N: usize>;

    macro_rules! register_kinds {
        ($reg:expr, $($n:literal),+ $(,)?) => {
            $( $reg.register::<Kind<$n>>(); )+
        };
    }

    fn fill_registry(reg: &mut TypeRegistry) {
        register_kinds!(
            reg, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21,
            22, 23, 24, 25, 26, 27, 28, 29, 30, 31
        );
    }

    #[test]
    fn same_kind_same_id() {
        let mut reg = TypeRegistry::new();
        let a = reg.register::<Position>();
        let b = reg.register::<Position>();
        let c = reg.register::<Position>();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn distinct_kinds_get_sequential_ids() {
        let mut reg = TypeRegistry::new();
        let p = reg.register::<Position>();
        let v = reg.register::<Velocity>();
        assert_ne!(p, v);
        assert_eq!(p.index(), 0);
        assert_eq!(v.index(), 1);
    }

    #[test]
    fn lookup_does_not_register() {
        let mut reg = TypeRegistry::new();
        assert!(reg.lookup::<Position>().is_none());
        assert_eq!(reg.len(), 0);

        let id = reg.register::<Position>();
        assert_eq!(reg.lookup::<Position>(), Some(id));
    }

    #[test]
    fn name_reports_the_kind() {
        let mut reg = TypeRegistry::new();
        let id = reg.register::<Position>();
        assert!(reg.name(id).contains("Position"));
    }

    #[test]
    fn thirty_two_kinds_fit() {
        let mut reg = TypeRegistry::new();
        fill_registry(&mut reg);
        assert_eq!(reg.len(), MAX_COMPONENT_KINDS);
    }

    #[test]
    #[should_panic(expected = "kind capacity")]
    fn thirty_third_kind_panics() {
        let mut reg = TypeRegistry::new();
        fill_registry(&mut reg);
        reg.register::<Kind<32>>();
    }

    #[test]
    #[should_panic(expected = "group index out of range")]
    fn out_of_range_group_panics() {
        let _ = GroupId::new(MAX_GROUPS);
    }
}
