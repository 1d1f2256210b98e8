use std::time::{Duration, Instant};

use plaza_engine::{Camera2D, InputSnapshot, Scene, SceneCommand, SceneFrame, Vec2, Viewport};
use tracing::{info, warn};

mod chat;
mod clips;
mod command;
mod compose;
mod context;
mod intents;
mod local;
mod model;
mod remote;
mod zone;

pub(crate) use local::LocalPlayer;
pub(crate) use model::Facing;

use self::compose::compose_world;
use self::context::SimulationContext;
use crate::app::net::NetSync;
use crate::app::store::{Identity, LocalStore, SavedPosition};

pub(crate) const WORLD_SIZE: Vec2 = Vec2::new(720.0, 480.0);
const DEREGISTER_TIMEOUT: Duration = Duration::from_secs(2);

/// The shared plaza: local avatar, everyone else, the ready zone.
pub(crate) struct WorldScene {
    context: SimulationContext,
    camera: Camera2D,
    viewport: Viewport,
    net: Option<NetSync>,
    store: Option<LocalStore>,
    last_saved: Option<SavedPosition>,
}

impl WorldScene {
    pub(crate) fn new(local: LocalPlayer, viewport: Viewport) -> Self {
        Self {
            context: SimulationContext::new(local),
            camera: Camera2D::default(),
            viewport,
            net: None,
            store: None,
            last_saved: None,
        }
    }

    pub(crate) fn with_network(mut self, net: NetSync) -> Self {
        self.net = Some(net);
        self
    }

    pub(crate) fn with_store(mut self, store: LocalStore) -> Self {
        self.store = Some(store);
        self
    }

    fn sync_network(&mut self, outgoing_chat: Vec<String>) -> bool {
        let Some(net) = self.net.as_mut() else {
            return false;
        };
        let context = &mut self.context;
        for line in outgoing_chat {
            net.send_chat(&context.local.name, line);
        }

        let now = Instant::now();
        let pushed = net.maybe_push(now, |now_ms| context.local_row(now_ms)).is_some();
        net.maybe_poll_chat(now);
        for completion in net.drain() {
            context.apply_completion(completion);
        }
        pushed
    }

    /// Saves after a push, but only once the rounded position has moved.
    fn persist_if_moved(&mut self) {
        let position = SavedPosition::from_world(self.context.local.position);
        if self.last_saved != Some(position) {
            self.persist();
        }
    }

    fn persist(&mut self) {
        let Some(store) = &self.store else {
            return;
        };
        let local = &self.context.local;
        let identity = Identity {
            id: local.id.clone(),
            name: local.name.clone(),
            position: local.position,
        };
        match store.save(&identity.to_persisted()) {
            Ok(()) => self.last_saved = Some(SavedPosition::from_world(local.position)),
            Err(error) => warn!(error = %error, "state_save_failed"),
        }
    }
}

impl Scene for WorldScene {
    fn load(&mut self) {
        let local = &self.context.local;
        self.camera.follow(local.position, self.viewport, WORLD_SIZE);
        info!(
            player_id = %local.id,
            name = %local.name,
            x = local.position.x,
            y = local.position.y,
            online = self.net.is_some(),
            "world_loaded"
        );
    }

    fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        let output = self.context.tick(fixed_dt_seconds, input);
        if self.sync_network(output.outgoing_chat) {
            self.persist_if_moved();
        }
        self.camera
            .follow(self.context.local.position, self.viewport, WORLD_SIZE);

        if output.quit_requested {
            SceneCommand::Quit
        } else {
            SceneCommand::None
        }
    }

    fn compose(&mut self, frame: &mut SceneFrame) {
        compose_world(&self.context, &self.camera, frame);
    }

    fn unload(&mut self) {
        self.persist();
        if let Some(net) = &self.net {
            net.deregister(DEREGISTER_TIMEOUT);
        }
        info!("world_unloaded");
    }

    fn debug_title(&self) -> Option<String> {
        Some(format!(
            "Plaza | {} | {} online | ready {}",
            self.context.local.name,
            self.context.roster.len() + 1,
            self.context.zone.occupants()
        ))
    }
}
