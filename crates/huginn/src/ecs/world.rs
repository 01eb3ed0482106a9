//! # World — Entity Ownership and the Frame Cycle
//!
//! The [`World`] owns every entity (and, transitively, every component),
//! the [`TypeRegistry`](super::registry::TypeRegistry) that names component
//! kinds, and one membership list per group. It drives the per-frame cycle:
//!
//! ```text
//! external loop                World
//! ─────────────                ──────────────────────────────────────────
//! dt = clock.update()   ──►    tick(dt)
//!                                1. group cleanup  (drop dead/departed entries)
//!                                2. entity cleanup (destroy marked-dead entities)
//!                                3. update         (on_update, sequence order)
//! frame.begin()         ──►    render(&mut frame)  (on_render, sequence order)
//! present frame
//! ```
//!
//! The phase order inside `tick` is load-bearing: group cleanup reads each
//! entry's alive flag and membership bit, so it must run before entity
//! cleanup destroys the entities behind those entries.
//!
//! ## Ownership
//!
//! Entities live in an insertion-stable `Vec`; handles resolve through a
//! slot-index map (`positions`) that is rebuilt whenever a sweep compacts
//! the sequence. Group lists and user code hold only [`EntityId`]s, never
//! references, so destruction is a plain `Vec::retain` with no aliasing to
//! worry about.
//!
//! ## Group index staleness
//!
//! Group membership is tracked twice: a bit on the entity (authoritative)
//! and an entry in the world's per-group list (an index, cleaned lazily).
//! Between a death or [`leave_group`](World::leave_group) and the next
//! sweep, [`group`](World::group) can therefore return entries whose entity
//! is dead or departed; callers acting on a retained view must re-validate
//! with [`is_alive`](World::is_alive) / [`in_group`](World::in_group).
//! Re-joining a group before the sweep has purged the old entry leaves two
//! entries for the same entity, matching the lazy-cleanup contract rather
//! than silently deduplicating.

use std::any::type_name;
use std::collections::HashMap;

use log::{debug, trace};

use super::component::Component;
use super::entity::{Entity, EntityId, IdAllocator, missing_component};
use super::registry::{GroupId, MAX_GROUPS, TypeRegistry};

// ── GroupIndex ───────────────────────────────────────────────────────────

/// One membership list per group. Entries are appended on join and purged
/// in bulk by the sweep.
pub(crate) struct GroupIndex {
    lists: [Vec<EntityId>; MAX_GROUPS],
}

impl GroupIndex {
    fn new() -> Self {
        Self {
            lists: std::array::from_fn(|_| Vec::new()),
        }
    }

    pub(crate) fn register(&mut self, group: GroupId, member: EntityId) {
        self.lists[group.index()].push(member);
    }

    fn members(&self, group: GroupId) -> &[EntityId] {
        &self.lists[group.index()]
    }
}

// ── World ────────────────────────────────────────────────────────────────

/// Owns all entities and drives the tick/render cycle. `R` is the render
/// target type components draw to.
///
/// # Example
///
/// ```
/// use huginn::prelude::*;
///
/// #[derive(Default)]
/// struct Frame {
///     rects: Vec<(f32, f32)>,
/// }
///
/// struct Square {
///     x: f32,
///     y: f32,
/// }
///
/// impl Component<Frame> for Square {
///     fn on_update(&mut self, dt: f32, _ctx: &mut EntityContext<'_, Frame>) {
///         self.y += 100.0 * dt;
///     }
///
///     fn on_render(&mut self, target: &mut Frame) {
///         target.rects.push((self.x, self.y));
///     }
/// }
///
/// let mut world: World<Frame> = World::new();
/// let square = world.spawn();
/// world.add_component(square, Square { x: 10.0, y: 0.0 });
///
/// let mut frame = Frame::default();
/// world.tick(1.0 / 60.0);
/// world.render(&mut frame);
/// assert_eq!(frame.rects.len(), 1);
/// ```
pub struct World<R: 'static> {
    registry: TypeRegistry,
    allocator: IdAllocator,
    /// Insertion-stable entity sequence. Dead entities stay in place until
    /// the sweep.
    entities: Vec<Entity<R>>,
    /// Handle slot index -> position in `entities`. Rebuilt after each sweep.
    positions: HashMap<u32, usize>,
    groups: GroupIndex,
}

impl<R: 'static> World<R> {
    pub fn new() -> Self {
        Self {
            registry: TypeRegistry::new(),
            allocator: IdAllocator::new(),
            entities: Vec::new(),
            positions: HashMap::new(),
            groups: GroupIndex::new(),
        }
    }

    // ── Spawning and handle resolution ───────────────────────────────

    /// Create a new alive entity with no components and no group
    /// memberships. The returned handle stays valid until a future sweep
    /// destroys the entity.
    pub fn spawn(&mut self) -> EntityId {
        let id = self.allocator.allocate();
        self.positions.insert(id.index(), self.entities.len());
        self.entities.push(Entity::new(id));
        trace!("spawned entity {id}");
        id
    }

    /// Resolve a handle to its position in the sequence. `None` when the
    /// handle's generation no longer matches, i.e. the entity was destroyed.
    fn position(&self, id: EntityId) -> Option<usize> {
        let &position = self.positions.get(&id.index())?;
        (self.entities[position].id() == id).then_some(position)
    }

    fn position_or_panic(&self, id: EntityId) -> usize {
        self.position(id)
            .unwrap_or_else(|| panic!("entity {id} has already been destroyed (stale handle)"))
    }

    /// `true` while the entity exists and has not been marked dead. A
    /// handle retained across a [`tick`](Self::tick) must be re-checked
    /// here before acting on it.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.position(id)
            .is_some_and(|position| self.entities[position].is_alive())
    }

    /// Read access to an entity.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn entity(&self, id: EntityId) -> &Entity<R> {
        &self.entities[self.position_or_panic(id)]
    }

    /// Number of entities physically present, including those marked dead
    /// but not yet swept.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// The kind registry. Read-only; kinds register themselves through
    /// [`add_component`](Self::add_component).
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    // ── Components ───────────────────────────────────────────────────

    /// Attach a component to an entity and return a reference to the
    /// installed instance, valid until the next mutation of the world.
    ///
    /// The component is appended after any existing siblings (insertion
    /// order is update/render order), its kind is recorded for O(1)
    /// retrieval, and `on_attach` fires before this returns.
    ///
    /// # Panics
    ///
    /// Panics if the entity already has a component of this kind, if the
    /// entity is dead or destroyed, or if this is the 33rd distinct kind
    /// registered in this world.
    pub fn add_component<C: Component<R>>(&mut self, id: EntityId, component: C) -> &mut C {
        let kind = self.registry.register::<C>();
        let position = self.position_or_panic(id);
        let Self {
            entities,
            registry,
            groups,
            ..
        } = self;
        let entity = &mut entities[position];
        assert!(
            entity.is_alive(),
            "cannot attach `{}` to dead entity {id}",
            type_name::<C>()
        );
        assert!(
            !entity.has(kind),
            "duplicate capability: entity {id} already has `{}`",
            type_name::<C>()
        );
        entity.install(kind, Box::new(component));
        entity.dispatch_attach(kind, registry, groups);
        entity.component_mut::<C>(kind)
    }

    /// Whether the entity currently has a component of kind `C`. `false`
    /// for destroyed handles and for kinds never registered.
    pub fn has<C: Component<R>>(&self, id: EntityId) -> bool {
        match (self.position(id), self.registry.lookup::<C>()) {
            (Some(position), Some(kind)) => self.entities[position].has(kind),
            _ => false,
        }
    }

    /// Borrow the component of kind `C` on an entity.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the entity has no such component.
    pub fn get<C: Component<R>>(&self, id: EntityId) -> &C {
        let position = self.position_or_panic(id);
        let kind = self
            .registry
            .lookup::<C>()
            .unwrap_or_else(|| missing_component::<C>(id));
        self.entities[position].component_ref::<C>(kind)
    }

    /// Mutably borrow the component of kind `C` on an entity.
    ///
    /// # Panics
    ///
    /// Same conditions as [`get`](Self::get).
    pub fn get_mut<C: Component<R>>(&mut self, id: EntityId) -> &mut C {
        let position = self.position_or_panic(id);
        let kind = self
            .registry
            .lookup::<C>()
            .unwrap_or_else(|| missing_component::<C>(id));
        self.entities[position].component_mut::<C>(kind)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Mark an entity dead. Idempotent, and a no-op on stale handles. The
    /// entity stays in the sequence and in every group list until the next
    /// [`tick`](Self::tick) sweeps it.
    pub fn mark_dead(&mut self, id: EntityId) {
        if let Some(position) = self.position(id) {
            self.entities[position].mark_dead();
        }
    }

    // ── Groups ───────────────────────────────────────────────────────

    /// Set the entity's membership bit for `group` and append it to the
    /// group's list. Joining again before a sweep has purged an earlier
    /// entry duplicates the entry (see the module notes).
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn join_group(&mut self, id: EntityId, group: GroupId) {
        let position = self.position_or_panic(id);
        self.entities[position].set_group(group);
        self.groups.register(group, id);
    }

    /// Clear the entity's membership bit for `group`. The group list entry
    /// is purged lazily by the next sweep.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn leave_group(&mut self, id: EntityId, group: GroupId) {
        let position = self.position_or_panic(id);
        self.entities[position].clear_group(group);
    }

    /// Whether the entity's membership bit for `group` is set. `false` for
    /// destroyed handles.
    pub fn in_group(&self, id: EntityId, group: GroupId) -> bool {
        self.position(id)
            .is_some_and(|position| self.entities[position].in_group(group))
    }

    /// The group's current member list. A live view: between a death or a
    /// leave and the next sweep it can contain entries whose entity is dead
    /// or departed, so callers must re-validate before acting on them.
    pub fn group(&self, group: GroupId) -> &[EntityId] {
        self.groups.members(group)
    }

    /// Number of entries in the group's list, stale entries included.
    pub fn group_len(&self, group: GroupId) -> usize {
        self.groups.members(group).len()
    }

    // ── Frame cycle ──────────────────────────────────────────────────

    /// Advance one frame: sweep, then update survivors.
    ///
    /// Three ordered phases:
    ///
    /// 1. *Group cleanup*: drop every list entry whose entity is dead or no
    ///    longer has that group's bit set. Both conditions matter; an alive
    ///    entity that left a group is purged here too.
    /// 2. *Entity cleanup*: destroy marked-dead entities. Their components
    ///    drop, their id slots are recycled with a bumped generation, and
    ///    the position map is rebuilt over the survivors.
    /// 3. *Update*: `on_update(dt)` on every surviving entity in sequence
    ///    order, each entity forwarding to its components in insertion
    ///    order.
    ///
    /// `dt` is the frame's delta time in seconds, computed by the external
    /// driver.
    pub fn tick(&mut self, dt: f32) {
        let Self {
            allocator,
            entities,
            positions,
            groups,
            registry,
        } = self;

        // Phase 1: group cleanup. Reads alive/membership flags, so it must
        // run while the entities behind the entries still exist.
        for (group, list) in groups.lists.iter_mut().enumerate() {
            list.retain(|&member| {
                positions.get(&member.index()).is_some_and(|&position| {
                    let entity = &entities[position];
                    entity.id() == member && entity.is_alive() && entity.groups().test(group)
                })
            });
        }

        // Phase 2: entity cleanup.
        let before = entities.len();
        entities.retain(|entity| {
            if entity.is_alive() {
                true
            } else {
                allocator.release(entity.id());
                false
            }
        });
        let swept = before - entities.len();
        if swept > 0 {
            positions.clear();
            for (position, entity) in entities.iter().enumerate() {
                positions.insert(entity.id().index(), position);
            }
            debug!("swept {swept} dead entities, {} remain", entities.len());
        }

        // Phase 3: update survivors in sequence order.
        for position in 0..entities.len() {
            entities[position].update(dt, registry, groups);
        }
        trace!("tick complete: {} entities", entities.len());
    }

    /// Render every entity currently in the sequence, in sequence order,
    /// with no liveness filtering beyond what the previous tick's sweep
    /// already removed. Entities marked dead this frame still draw.
    pub fn render(&mut self, target: &mut R) {
        for entity in &mut self.entities {
            entity.render(target);
        }
    }
}

impl<R: 'static> Default for World<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::entity::EntityContext;

    const RED: GroupId = GroupId::new(0);
    const BLUE: GroupId = GroupId::new(1);

    /// Stand-in render target: records what each component drew.
    #[derive(Default)]
    struct Frame {
        ops: Vec<String>,
    }

    #[derive(Default)]
    struct Lifetime {
        seconds: f32,
    }

    impl Component<Frame> for Lifetime {
        fn on_update(&mut self, dt: f32, _ctx: &mut EntityContext<'_, Frame>) {
            self.seconds += dt;
        }
    }

    /// Retires its entity once the sibling `Lifetime` passes a threshold.
    struct Reaper {
        after: f32,
    }

    impl Component<Frame> for Reaper {
        fn on_update(&mut self, _dt: f32, ctx: &mut EntityContext<'_, Frame>) {
            if ctx.get::<Lifetime>().seconds >= self.after {
                ctx.mark_dead();
            }
        }
    }

    struct Sprite {
        label: &'static str,
    }

    impl Component<Frame> for Sprite {
        fn on_render(&mut self, target: &mut Frame) {
            target.ops.push(self.label.to_string());
        }
    }

    #[derive(Default)]
    struct AttachProbe {
        attach_calls: u32,
        update_calls: u32,
        saw_sibling: bool,
    }

    impl Component<Frame> for AttachProbe {
        fn on_attach(&mut self, ctx: &mut EntityContext<'_, Frame>) {
            assert_eq!(self.update_calls, 0, "attach must precede the first update");
            self.attach_calls += 1;
            self.saw_sibling = ctx.has::<Lifetime>();
        }

        fn on_update(&mut self, _dt: f32, _ctx: &mut EntityContext<'_, Frame>) {
            self.update_calls += 1;
        }
    }

    /// Joins a group from inside its update hook, once.
    struct Recruiter {
        group: GroupId,
        done: bool,
    }

    impl Component<Frame> for Recruiter {
        fn on_update(&mut self, _dt: f32, ctx: &mut EntityContext<'_, Frame>) {
            if !self.done {
                ctx.join_group(self.group);
                self.done = true;
            }
        }
    }

    fn world() -> World<Frame> {
        World::new()
    }

    // ── Spawning and components ──────────────────────────────────────

    #[test]
    fn spawned_entity_is_alive_and_empty() {
        let mut world = world();
        let e = world.spawn();
        assert!(world.is_alive(e));
        assert_eq!(world.entity_count(), 1);
        assert_eq!(world.entity(e).component_count(), 0);
        assert!(world.entity(e).capabilities().is_empty());
        assert!(world.entity(e).groups().is_empty());
    }

    #[test]
    fn add_then_has() {
        let mut world = world();
        let e = world.spawn();
        assert!(!world.has::<Lifetime>(e));
        world.add_component(e, Lifetime::default());
        assert!(world.has::<Lifetime>(e));
    }

    #[test]
    fn add_returns_the_installed_instance() {
        let mut world = world();
        let e = world.spawn();
        let lifetime = world.add_component(e, Lifetime::default());
        lifetime.seconds = 7.5;
        assert_eq!(world.get::<Lifetime>(e).seconds, 7.5);
    }

    #[test]
    fn get_mut_reaches_the_same_component() {
        let mut world = world();
        let e = world.spawn();
        world.add_component(e, Lifetime::default());
        world.get_mut::<Lifetime>(e).seconds = 2.0;
        assert_eq!(world.get::<Lifetime>(e).seconds, 2.0);
    }

    #[test]
    #[should_panic(expected = "duplicate capability")]
    fn duplicate_capability_panics() {
        let mut world = world();
        let e = world.spawn();
        world.add_component(e, Lifetime::default());
        world.add_component(e, Lifetime::default());
    }

    #[test]
    #[should_panic(expected = "has no")]
    fn missing_capability_panics() {
        let mut world = world();
        let e = world.spawn();
        world.add_component(e, Lifetime::default());
        world.get::<Sprite>(e);
    }

    #[test]
    #[should_panic(expected = "dead entity")]
    fn attach_to_dead_entity_panics() {
        let mut world = world();
        let e = world.spawn();
        world.mark_dead(e);
        world.add_component(e, Lifetime::default());
    }

    #[test]
    fn on_attach_fires_once_before_first_update_and_sees_siblings() {
        let mut world = world();
        let e = world.spawn();
        world.add_component(e, Lifetime::default());
        world.add_component(e, AttachProbe::default());

        let probe = world.get::<AttachProbe>(e);
        assert_eq!(probe.attach_calls, 1);
        assert_eq!(probe.update_calls, 0);
        assert!(probe.saw_sibling);

        world.tick(0.016);
        world.tick(0.016);
        let probe = world.get::<AttachProbe>(e);
        assert_eq!(probe.attach_calls, 1);
        assert_eq!(probe.update_calls, 2);
    }

    // ── Lifecycle and the sweep ──────────────────────────────────────

    #[test]
    fn mark_dead_is_deferred_and_idempotent() {
        let mut world = world();
        let e = world.spawn();
        world.mark_dead(e);
        world.mark_dead(e);
        assert!(!world.is_alive(e));
        // Still physically present until the sweep.
        assert_eq!(world.entity_count(), 1);

        world.tick(0.016);
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn counter_and_reaper_retire_the_entity() {
        let mut world = world();
        let e = world.spawn();
        world.add_component(e, Lifetime::default());
        world.add_component(e, Reaper { after: 3.0 });

        world.tick(1.0);
        world.tick(1.0);
        assert!(world.is_alive(e));

        // Lifetime updates before Reaper (insertion order), so the third
        // tick is the one that crosses the threshold.
        world.tick(1.0);
        assert!(!world.is_alive(e));
        assert_eq!(world.entity_count(), 1);

        world.tick(1.0);
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn stale_handles_fail_closed_after_recycling() {
        let mut world = world();
        let old = world.spawn();
        world.add_component(old, Lifetime::default());
        world.mark_dead(old);
        world.tick(0.016);

        let fresh = world.spawn();
        assert_eq!(fresh.index(), old.index());
        assert_eq!(fresh.generation(), old.generation() + 1);

        assert!(!world.is_alive(old));
        assert!(!world.has::<Lifetime>(old));
        assert!(world.is_alive(fresh));
    }

    #[test]
    #[should_panic(expected = "stale handle")]
    fn get_through_destroyed_handle_panics() {
        let mut world = world();
        let e = world.spawn();
        world.add_component(e, Lifetime::default());
        world.mark_dead(e);
        world.tick(0.016);
        world.get::<Lifetime>(e);
    }

    #[test]
    fn sweep_preserves_sequence_order_of_survivors() {
        let mut world = world();
        let a = world.spawn();
        let b = world.spawn();
        let c = world.spawn();
        world.add_component(a, Sprite { label: "a" });
        world.add_component(b, Sprite { label: "b" });
        world.add_component(c, Sprite { label: "c" });

        world.mark_dead(b);
        world.tick(0.016);

        let mut frame = Frame::default();
        world.render(&mut frame);
        assert_eq!(frame.ops, vec!["a", "c"]);
    }

    // ── Groups ───────────────────────────────────────────────────────

    #[test]
    fn join_then_query_contains_the_entity() {
        let mut world = world();
        let e = world.spawn();
        world.join_group(e, RED);
        assert!(world.in_group(e, RED));
        assert!(!world.in_group(e, BLUE));
        assert!(world.group(RED).contains(&e));
    }

    #[test]
    fn groups_hold_exactly_their_members() {
        let mut world = world();
        let mut reds = Vec::new();
        let mut blues = Vec::new();
        // Interleave spawns so membership cannot depend on spawn order.
        for n in 0..8 {
            let e = world.spawn();
            if n % 3 == 1 {
                world.join_group(e, BLUE);
                blues.push(e);
            } else {
                world.join_group(e, RED);
                reds.push(e);
            }
        }
        assert_eq!(world.group_len(RED), 5);
        assert_eq!(world.group_len(BLUE), 3);
        for e in &reds {
            assert!(world.group(RED).contains(e));
        }
        for e in &blues {
            assert!(world.group(BLUE).contains(e));
        }
    }

    #[test]
    fn dead_members_are_swept_from_groups() {
        let mut world = world();
        let e = world.spawn();
        world.join_group(e, RED);
        world.mark_dead(e);

        // Stale entry stays visible until the sweep.
        assert_eq!(world.group_len(RED), 1);
        assert!(!world.is_alive(e));

        world.tick(0.016);
        assert_eq!(world.group_len(RED), 0);
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn leaving_a_group_is_lazy_but_alive_entities_are_purged_too() {
        let mut world = world();
        let e = world.spawn();
        world.join_group(e, RED);
        world.leave_group(e, RED);

        assert!(!world.in_group(e, RED));
        assert_eq!(world.group_len(RED), 1);

        world.tick(0.016);
        assert!(world.is_alive(e));
        assert_eq!(world.group_len(RED), 0);
    }

    #[test]
    fn rejoin_before_sweep_duplicates_the_entry() {
        let mut world = world();
        let e = world.spawn();
        world.join_group(e, RED);
        world.leave_group(e, RED);
        world.join_group(e, RED);

        // Lazy cleanup means both entries survive the sweep while the
        // membership bit is set; no silent deduplication.
        assert_eq!(world.group_len(RED), 2);
        world.tick(0.016);
        assert_eq!(world.group_len(RED), 2);
    }

    #[test]
    fn hooks_can_join_groups() {
        let mut world = world();
        let e = world.spawn();
        world.add_component(
            e,
            Recruiter {
                group: BLUE,
                done: false,
            },
        );
        assert_eq!(world.group_len(BLUE), 0);

        world.tick(0.016);
        assert_eq!(world.group_len(BLUE), 1);
        assert!(world.in_group(e, BLUE));
    }

    // ── Rendering ────────────────────────────────────────────────────

    #[test]
    fn render_walks_entities_in_sequence_order() {
        let mut world = world();
        let a = world.spawn();
        let b = world.spawn();
        world.add_component(a, Sprite { label: "a" });
        world.add_component(b, Sprite { label: "b" });

        let mut frame = Frame::default();
        world.render(&mut frame);
        assert_eq!(frame.ops, vec!["a", "b"]);
    }

    #[test]
    fn dead_entities_render_until_swept() {
        let mut world = world();
        let a = world.spawn();
        let b = world.spawn();
        world.add_component(a, Sprite { label: "a" });
        world.add_component(b, Sprite { label: "b" });
        world.mark_dead(a);

        // Marked dead but not yet swept: still drawn.
        let mut frame = Frame::default();
        world.render(&mut frame);
        assert_eq!(frame.ops, vec!["a", "b"]);

        world.tick(0.016);
        let mut frame = Frame::default();
        world.render(&mut frame);
        assert_eq!(frame.ops, vec!["b"]);
    }
}
