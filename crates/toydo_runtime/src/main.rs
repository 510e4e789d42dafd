//! ToyDo Runtime
//!
//! Headless canvas session: loads settings, seeds a task list and drives the
//! scene through the frame loop with a scripted set of taps, drags and app
//! state changes, logging what happens.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use toydo_core::config::LayoutMode;
use toydo_core::driver::{AppState, FrameEvent, FrameLoop, HeadlessScheduler};
use toydo_core::math::Vec2;
use toydo_core::scene::{EntityKey, EntityKind, Scene};
use toydo_core::task::{TaskId, TaskRecord};
use toydo_metrics::FrameCounter;
use toydo_services::{Gesture, InteractionLayer, Settings, TaskIntent, TaskStore};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Bubble,
    Block,
}

impl From<ModeArg> for LayoutMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Bubble => LayoutMode::Bubble,
            ModeArg::Block => LayoutMode::Block,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "toydo", version, about = "Headless ToyDo canvas session")]
struct Args {
    /// Settings file (JSON). Defaults are used when absent.
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Frames to run.
    #[arg(short, long, default_value_t = 600)]
    frames: u32,

    /// Layout mode, overriding the settings file.
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Simulation seed, overriding the settings file.
    #[arg(long)]
    seed: Option<u64>,
}

fn load_settings(args: &Args) -> Result<Settings> {
    let mut settings = match &args.settings {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(mode) = args.mode {
        settings.mode = mode.into();
    }
    if let Some(seed) = args.seed {
        settings.tuning.seed = seed;
    }
    Ok(settings)
}

fn demo_tasks() -> Result<TaskStore> {
    let tasks = [
        ("1", false, "Draft next week's project plan", "💻"),
        ("2", true, "Buy milk, eggs and bread", "🍼"),
        ("3", false, "Go for a 30 minute run", "🏃"),
        ("4", false, "Read chapter 3 of the React Native book", "📚"),
        ("5", true, "Reply to the important email", "📧"),
        ("6", false, "Book a dental checkup", "🦷"),
        ("7", false, "Meet at the cafe at 7pm", "☕"),
        ("8", false, "Review the team's PR", "🔍"),
        ("9", false, "Prepare slides for tomorrow's meeting", "📊"),
        ("10", false, "Clean the kitchen and bathroom", "🧹"),
    ];
    let records = tasks
        .into_iter()
        .map(|(id, completed, content, emoji)| {
            TaskRecord::new(id, completed)
                .with_content(content)
                .with_emoji(emoji)
        })
        .collect();
    TaskStore::from_tasks(records).context("demo task list is invalid")
}

/// Position of the first rendered task, if any.
fn first_task(scene: &Scene) -> Option<(TaskId, Vec2)> {
    scene.views().into_iter().find_map(|view| match view.key {
        EntityKey::Task(id) => Some((id, view.position)),
        EntityKey::Wall(_) => None,
    })
}

struct Session {
    scene: Scene,
    store: TaskStore,
    input: InteractionLayer,
    synced_revision: u64,
}

impl Session {
    fn sync_if_changed(&mut self) -> Result<()> {
        if self.store.revision() == self.synced_revision {
            return Ok(());
        }
        let report = self.scene.sync(self.store.tasks()).context("scene sync failed")?;
        self.synced_revision = self.store.revision();
        info!(
            added = report.added.len(),
            removed = report.removed.len(),
            kept = report.kept,
            unplaced = report.unplaced.len(),
            capacity = report.capacity,
            "scene synced"
        );
        Ok(())
    }

    /// Tap the first task and press "complete" in its detail view.
    fn tap_first(&mut self, now_ms: f64) -> Result<()> {
        let Some((id, at)) = first_task(&self.scene) else {
            warn!("nothing to tap");
            return Ok(());
        };
        self.input.press(&mut self.scene, 0, at, now_ms);
        match self.input.release(&mut self.scene, 0, at, now_ms + 80.0) {
            Some(gesture) => {
                info!(?gesture, "tap");
                if let Some(task) = gesture.detail_target() {
                    let intent = TaskIntent::ToggleComplete { id: task.clone() };
                    self.store.apply(&intent).context("store rejected intent")?;
                }
            }
            None => warn!(%id, "tap missed"),
        }
        self.sync_if_changed()
    }

    /// Grab the first task and pull it toward the canvas centre.
    fn grab_first(&mut self, now_ms: f64) -> Option<TaskId> {
        let (id, at) = first_task(&self.scene)?;
        let centre = self.scene.bounds().center();
        self.input.press(&mut self.scene, 1, at, now_ms);
        self.input.move_to(&mut self.scene, 1, centre);
        info!(%id, "dragging toward the centre");
        Some(id)
    }

    fn drop_grab(&mut self, now_ms: f64) {
        let centre = self.scene.bounds().center();
        if let Some(Gesture::DragEnd { task, displacement }) = self.input.release(&mut self.scene, 1, centre, now_ms) {
            info!(%task, dx = displacement.x, dy = displacement.y, "drag released");
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let settings = load_settings(&args)?;
    info!("ToyDo v{}", toydo_core::VERSION);
    info!(mode = ?settings.mode, width = settings.canvas.width, height = settings.canvas.height, "starting session");

    let scene = Scene::new(settings.canvas.bounds(), settings.mode, &settings.tuning)
        .context("failed to create scene")?;
    let mut session = Session {
        scene,
        store: demo_tasks()?,
        input: InteractionLayer::new(&settings.tuning),
        synced_revision: u64::MAX,
    };
    session.sync_if_changed()?;

    let mut frame_loop = FrameLoop::from_tuning(HeadlessScheduler::new(), &settings.tuning);
    frame_loop.subscribe(|event| {
        if let FrameEvent::Paused(paused) = event {
            info!(paused, "frame loop pause state changed");
        }
    });
    frame_loop.start();

    let interval = settings.tuning.frame_interval_ms();
    let frames = args.frames;
    let mut now = 0.0;
    for frame in 0..frames {
        if frame == frames / 4 {
            session.tap_first(now)?;
        }
        if frame == frames / 3 {
            frame_loop.set_app_state(AppState::Background);
            now += 5_000.0;
            frame_loop.set_app_state(AppState::Active);
        }
        if frame == frames / 2 {
            if settings.mode.is_draggable() {
                session.grab_first(now);
            } else {
                let report = session.scene.refresh().context("refresh failed")?;
                info!(placed = report.added.len(), "bubbles reshuffled");
            }
        }
        if frame == frames * 3 / 4 {
            session.drop_grab(now);
        }

        let Some(token) = frame_loop.scheduler_mut().fire() else {
            warn!(frame, state = ?frame_loop.state(), "no frame pending, stopping");
            break;
        };
        if let Some(report) = frame_loop.on_frame(token, now, &mut session.scene) {
            if !report.frozen.is_empty() {
                warn!(frozen = report.frozen.len(), "bodies frozen");
            }
        }
        now += interval;
    }

    info!(
        frames = frame_loop.frames(),
        fps = frame_loop.timer().fps(),
        frame_ms = frame_loop.timer().frame_time_ms(),
        "session finished"
    );
    for counter in FrameCounter::ALL {
        info!(counter = counter.name(), value = frame_loop.counters().get(counter), "frame counter");
    }
    for view in session.scene.views() {
        if let (EntityKey::Task(id), kind) = (&view.key, view.kind) {
            let settled = match kind {
                EntityKind::Point { target } => Some(view.position.distance(target)),
                _ => None,
            };
            info!(%id, x = view.position.x, y = view.position.y, angle = view.angle, ?settled, "entity");
        }
    }

    frame_loop.teardown();
    Ok(())
}
