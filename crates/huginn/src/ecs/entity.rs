//! # Entity — Ownership, Capability Bits, and Handles
//!
//! An [`Entity`] exclusively owns its components: an insertion-ordered `Vec`
//! of boxed behaviors, plus a fixed 32-slot table mapping each
//! [`ComponentId`] to its position in that `Vec` for O(1) typed retrieval.
//! Alongside the components it carries two bit masks (which kinds are
//! attached, which groups it belongs to) and its alive flag.
//!
//! ## Design: Generational Handles
//!
//! Code outside the [`World`](super::world::World) never holds a reference to
//! an entity across frames; it holds an [`EntityId`], an index paired with a
//! generation counter. When the sweep destroys an entity its slot is recycled
//! with a bumped generation, so a stale handle is *detected* rather than
//! silently pointing at the wrong object:
//!
//! ```text
//! EntityId { index: 5, generation: 0 }   <- spawned, later swept
//! EntityId { index: 5, generation: 1 }   <- a new entity reusing slot 5
//! ```
//!
//! The old handle still says generation 0, so every lookup with it fails
//! closed. The same handle replaces the raw owner back-pointer a component
//! would otherwise hold: hooks receive an [`EntityContext`] view of their
//! entity instead of a pointer that could dangle across a sweep.
//!
//! ## Comparison
//!
//! - **hecs / bevy_ecs**: same index-plus-generation scheme for entity ids.
//! - **EnTT (C++)**: packs both into one integer; we keep two `u32` fields
//!   for readability.

use std::any::type_name;
use std::fmt;

use super::component::Component;
use super::mask::Mask;
use super::registry::{ComponentId, GroupId, MAX_COMPONENT_KINDS, TypeRegistry};
use super::world::GroupIndex;

// ── EntityId ─────────────────────────────────────────────────────────────

/// A generation-checked handle to an entity in a [`World`](super::world::World).
///
/// Valid only for the world that issued it, and only until the sweep that
/// destroys the entity; after that every lookup with the handle fails closed.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl EntityId {
    /// The raw slot index. For diagnostics.
    pub fn index(self) -> u32 {
        self.index
    }

    /// The slot generation this handle was issued under. For diagnostics.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

// ── IdAllocator ──────────────────────────────────────────────────────────

/// Hands out [`EntityId`]s and recycles slots with bumped generations.
///
/// Allocation pops from the free list when possible and grows otherwise;
/// release bumps the slot's generation so every outstanding handle to the
/// destroyed entity turns stale.
pub(crate) struct IdAllocator {
    /// Current generation of every slot ever allocated.
    generations: Vec<u32>,
    /// Slots released by the sweep, available for reuse.
    free: Vec<u32>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn allocate(&mut self) -> EntityId {
        if let Some(index) = self.free.pop() {
            EntityId {
                index,
                generation: self.generations[index as usize],
            }
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            EntityId {
                index,
                generation: 0,
            }
        }
    }

    pub fn release(&mut self, id: EntityId) {
        let slot = id.index as usize;
        debug_assert_eq!(
            self.generations[slot], id.generation,
            "released a handle that was already stale"
        );
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free.push(id.index);
    }
}

// ── Entity ───────────────────────────────────────────────────────────────

/// A game object: an exclusive owner of components, identified by the set of
/// kinds currently attached to it.
///
/// Entities are created through [`World::spawn`](super::world::World::spawn)
/// and destroyed by the world's sweep; user code addresses them by
/// [`EntityId`] and reaches this struct read-only through
/// [`World::entity`](super::world::World::entity).
pub struct Entity<R: 'static> {
    id: EntityId,
    alive: bool,
    capabilities: Mask,
    groups: Mask,
    /// Kind slot -> position in `components`. At most one component per kind.
    table: [Option<u8>; MAX_COMPONENT_KINDS],
    /// Insertion-ordered. An entry is `None` only while that component's own
    /// hook is running.
    components: Vec<Option<Box<dyn Component<R>>>>,
}

impl<R: 'static> Entity<R> {
    pub(crate) fn new(id: EntityId) -> Self {
        Self {
            id,
            alive: true,
            capabilities: Mask::empty(),
            groups: Mask::empty(),
            table: [None; MAX_COMPONENT_KINDS],
            components: Vec::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// `false` once the entity has been marked dead. The entity stays in the
    /// world's containers until the next sweep regardless.
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// O(1) bit test for a component kind.
    pub fn has(&self, kind: ComponentId) -> bool {
        self.capabilities.test(kind.index())
    }

    /// O(1) bit test for group membership.
    pub fn in_group(&self, group: GroupId) -> bool {
        self.groups.test(group.index())
    }

    /// The capability mask: bit *i* set means a component of the kind with
    /// id *i* is attached.
    pub fn capabilities(&self) -> Mask {
        self.capabilities
    }

    /// The group membership mask.
    pub fn groups(&self) -> Mask {
        self.groups
    }

    /// Number of components currently attached.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub(crate) fn mark_dead(&mut self) {
        self.alive = false;
    }

    pub(crate) fn set_group(&mut self, group: GroupId) {
        self.groups.set(group.index());
    }

    pub(crate) fn clear_group(&mut self, group: GroupId) {
        self.groups.clear(group.index());
    }

    /// Append a component, record its slot, and set its capability bit.
    /// The duplicate check happens in the world, where the kind's name is
    /// still known for the panic message.
    pub(crate) fn install(&mut self, kind: ComponentId, component: Box<dyn Component<R>>) {
        debug_assert!(!self.has(kind), "install called for a kind already present");
        let position = self.components.len() as u8;
        self.components.push(Some(component));
        self.table[kind.index()] = Some(position);
        self.capabilities.set(kind.index());
    }

    /// Fire `on_attach` for the component in `kind`'s slot. Runs after
    /// [`install`](Self::install) so the hook already sees the capability bit
    /// and can resolve siblings through the context.
    pub(crate) fn dispatch_attach(
        &mut self,
        kind: ComponentId,
        registry: &TypeRegistry,
        groups: &mut GroupIndex,
    ) {
        let position = self.table[kind.index()].unwrap() as usize;
        let mut component = self.components[position].take().unwrap();
        let mut ctx = EntityContext {
            entity: self,
            registry,
            groups,
        };
        component.on_attach(&mut ctx);
        self.components[position] = Some(component);
    }

    /// Forward `on_update` to every component in insertion order.
    ///
    /// Each component is lifted out of its slot for the duration of its hook
    /// so the hook can borrow the rest of the entity mutably through the
    /// context.
    pub(crate) fn update(&mut self, dt: f32, registry: &TypeRegistry, groups: &mut GroupIndex) {
        for position in 0..self.components.len() {
            let mut component = self.components[position].take().unwrap();
            let mut ctx = EntityContext {
                entity: self,
                registry,
                groups,
            };
            component.on_update(dt, &mut ctx);
            self.components[position] = Some(component);
        }
    }

    /// Forward `on_render` to every component in insertion order.
    pub(crate) fn render(&mut self, target: &mut R) {
        for slot in &mut self.components {
            slot.as_mut().unwrap().on_render(target);
        }
    }

    pub(crate) fn component_ref<C: Component<R>>(&self, kind: ComponentId) -> &C {
        let position = match self.table[kind.index()] {
            Some(position) => position as usize,
            None => missing_component::<C>(self.id),
        };
        self.components[position]
            .as_ref()
            .unwrap_or_else(|| hook_reentry::<C>(self.id))
            .as_any()
            .downcast_ref::<C>()
            .unwrap_or_else(|| kind_table_mismatch::<C>(self.id))
    }

    pub(crate) fn component_mut<C: Component<R>>(&mut self, kind: ComponentId) -> &mut C {
        let id = self.id;
        let position = match self.table[kind.index()] {
            Some(position) => position as usize,
            None => missing_component::<C>(id),
        };
        self.components[position]
            .as_mut()
            .unwrap_or_else(|| hook_reentry::<C>(id))
            .as_any_mut()
            .downcast_mut::<C>()
            .unwrap_or_else(|| kind_table_mismatch::<C>(id))
    }
}

pub(crate) fn missing_component<C>(id: EntityId) -> ! {
    panic!(
        "entity {id} has no `{}` component. Did you forget to attach it?",
        type_name::<C>()
    )
}

fn hook_reentry<C>(id: EntityId) -> ! {
    panic!(
        "`{}` on entity {id} cannot be fetched while its own hook is running",
        type_name::<C>()
    )
}

fn kind_table_mismatch<C>(id: EntityId) -> ! {
    panic!(
        "kind table corrupt: entity {id} maps `{}` to a component of another type",
        type_name::<C>()
    )
}

// ── EntityContext ────────────────────────────────────────────────────────

/// The view of an entity handed to component hooks.
///
/// Replaces the owner back-pointer of the classic object-composition design:
/// a hook can read and mutate sibling components, retire its entity, and
/// change group membership, all without holding a reference that could
/// outlive a sweep.
pub struct EntityContext<'a, R: 'static> {
    pub(crate) entity: &'a mut Entity<R>,
    pub(crate) registry: &'a TypeRegistry,
    pub(crate) groups: &'a mut GroupIndex,
}

impl<'a, R: 'static> EntityContext<'a, R> {
    /// Handle of the entity this hook runs on.
    pub fn id(&self) -> EntityId {
        self.entity.id
    }

    pub fn is_alive(&self) -> bool {
        self.entity.alive
    }

    /// Retire the entity. Idempotent; physical removal happens at the
    /// world's next sweep.
    pub fn mark_dead(&mut self) {
        self.entity.alive = false;
    }

    /// Whether a sibling component of kind `C` is attached.
    pub fn has<C: Component<R>>(&self) -> bool {
        self.registry
            .lookup::<C>()
            .is_some_and(|kind| self.entity.has(kind))
    }

    /// Borrow the sibling component of kind `C`.
    ///
    /// # Panics
    ///
    /// Panics if no such sibling is attached, or if `C` is the component the
    /// running hook belongs to.
    pub fn get<C: Component<R>>(&self) -> &C {
        let kind = self
            .registry
            .lookup::<C>()
            .unwrap_or_else(|| missing_component::<C>(self.entity.id));
        self.entity.component_ref::<C>(kind)
    }

    /// Mutably borrow the sibling component of kind `C`.
    ///
    /// # Panics
    ///
    /// Same conditions as [`get`](Self::get).
    pub fn get_mut<C: Component<R>>(&mut self) -> &mut C {
        let kind = self
            .registry
            .lookup::<C>()
            .unwrap_or_else(|| missing_component::<C>(self.entity.id));
        self.entity.component_mut::<C>(kind)
    }

    /// Set the group bit and append this entity to the world's list for the
    /// group. Joining twice without an intervening sweep duplicates the list
    /// entry; see the module notes in
    /// [`world`](super::world#group-index-staleness).
    pub fn join_group(&mut self, group: GroupId) {
        self.entity.set_group(group);
        self.groups.register(group, self.entity.id);
    }

    /// Clear the group bit. The world's list entry is purged lazily at the
    /// next sweep.
    pub fn leave_group(&mut self, group: GroupId) {
        self.entity.clear_group(group);
    }

    pub fn in_group(&self, group: GroupId) -> bool {
        self.entity.in_group(group)
    }
}
