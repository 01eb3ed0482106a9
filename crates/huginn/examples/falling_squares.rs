//! Headless rendition of the classic falling-squares demo: batches of
//! colored squares spawn on a timer, fall for three seconds, then retire
//! themselves. A fixed 120 Hz simulation driven by wall-clock deltas,
//! "rendering" into a draw list instead of a window.
//!
//! Run with logging on to watch the sweep work:
//! `RUST_LOG=debug cargo run --example falling_squares`

use glam::Vec2;
use huginn::prelude::*;

const SQUARES: GroupId = GroupId::new(0);

const STEP_HZ: f32 = 120.0;
const SPAWN_EVERY: f32 = 1.0;
const BATCH: usize = 5;
const RUN_FOR_SECS: f32 = 6.0;

/// The demo's render target: a per-frame list of colored rectangles.
#[derive(Default)]
struct DrawList {
    rects: Vec<(Vec2, [u8; 3])>,
}

impl DrawList {
    fn begin(&mut self) {
        self.rects.clear();
    }

    fn rect(&mut self, position: Vec2, color: [u8; 3]) {
        self.rects.push((position, color));
    }
}

/// Seconds since the owning entity spawned.
#[derive(Default)]
struct Age {
    seconds: f32,
}

impl Component<DrawList> for Age {
    fn on_update(&mut self, dt: f32, _ctx: &mut EntityContext<'_, DrawList>) {
        self.seconds += dt;
    }
}

/// A falling colored square.
struct Square {
    position: Vec2,
    velocity: Vec2,
    color: [u8; 3],
}

impl Component<DrawList> for Square {
    fn on_update(&mut self, dt: f32, _ctx: &mut EntityContext<'_, DrawList>) {
        self.position += self.velocity * dt;
    }

    fn on_render(&mut self, target: &mut DrawList) {
        target.rect(self.position, self.color);
    }
}

/// Retires the entity once its `Age` passes the threshold.
struct Reaper {
    after: f32,
}

impl Component<DrawList> for Reaper {
    fn on_update(&mut self, _dt: f32, ctx: &mut EntityContext<'_, DrawList>) {
        if ctx.get::<Age>().seconds >= self.after {
            ctx.mark_dead();
        }
    }
}

/// Tiny xorshift generator; enough scatter for a demo, no crate needed.
struct Rng(u32);

impl Rng {
    fn next_f32(&mut self) -> f32 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 17;
        self.0 ^= self.0 << 5;
        (self.0 >> 8) as f32 / (1 << 24) as f32
    }

    fn next_u8(&mut self) -> u8 {
        (self.next_f32() * 255.0) as u8
    }
}

fn spawn_batch(world: &mut World<DrawList>, rng: &mut Rng) {
    for _ in 0..BATCH {
        let e = world.spawn();
        world.add_component(e, Age::default());
        world.add_component(
            e,
            Square {
                position: Vec2::new(rng.next_f32() * 500.0, rng.next_f32() * 500.0),
                velocity: Vec2::new(0.0, 100.0),
                color: [rng.next_u8(), rng.next_u8(), rng.next_u8()],
            },
        );
        world.add_component(e, Reaper { after: 3.0 });
        world.join_group(e, SQUARES);
    }
}

fn main() {
    env_logger::init();

    let mut world: World<DrawList> = World::new();
    let mut frame = DrawList::default();
    let mut time = Time::new();
    let mut stepper = FixedStep::from_hz(STEP_HZ);
    let mut rng = Rng(0x9E37_79B9);
    let mut spawn_clock = SPAWN_EVERY; // so the first step spawns a batch

    let mut frames = 0u64;
    while time.elapsed_secs() < RUN_FOR_SECS {
        let dt = time.update();
        for _ in 0..stepper.advance(dt) {
            spawn_clock += stepper.step();
            if spawn_clock >= SPAWN_EVERY {
                spawn_clock = 0.0;
                spawn_batch(&mut world, &mut rng);
            }
            world.tick(stepper.step());
        }

        frame.begin();
        world.render(&mut frame);
        frames += 1;

        std::thread::sleep(std::time::Duration::from_millis(4));
    }

    println!(
        "ran {frames} frames in {:.1}s: {} squares in flight, {} drawn last frame",
        time.elapsed_secs(),
        world.group_len(SQUARES),
        frame.rects.len()
    );
}
