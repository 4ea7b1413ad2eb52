// Game state: wires input, prediction, the session and the world cache
use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use protocol::{Color, Player};

use crate::camera::Camera;
use crate::error::ClientError;
use crate::input::InputState;
use crate::join::{JoinFlow, NameCheckOutcome};
use crate::motion::{FrameClock, MotionPredictor};
use crate::network::{Session, SessionEvent};
use crate::render::{LocalView, Renderer, Surface};
use crate::world::WorldCache;

/// Changes the presentation layer should reflect, in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Connectivity(bool),
    JoinError(ClientError),
    Joined(Player),
    Stats { name: String, score: u32, radius: f32 },
}

/// The client-side game.
///
/// Holds exactly one locally-predicted copy of the local player. That copy
/// owns its position; everything else about it (name, color, radius, score)
/// is refreshed from each snapshot.
pub struct Game {
    session: Session,
    input: Rc<RefCell<InputState>>,
    predictor: MotionPredictor,
    clock: FrameClock,
    world: WorldCache,
    join: JoinFlow,
    local: Option<Player>,
    notices: Vec<Notice>,
}

impl Game {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            input: Rc::new(RefCell::new(InputState::new())),
            predictor: MotionPredictor::new(),
            clock: FrameClock::new(),
            world: WorldCache::new(),
            join: JoinFlow::new(),
            local: None,
            notices: Vec::new(),
        }
    }

    /// Shared with the keyboard listeners.
    pub fn input_state(&self) -> Rc<RefCell<InputState>> {
        Rc::clone(&self.input)
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    pub fn is_joined(&self) -> bool {
        self.local.is_some()
    }

    pub fn local_player(&self) -> Option<&Player> {
        self.local.as_ref()
    }

    pub fn world(&self) -> &WorldCache {
        &self.world
    }

    /// Drain pending notices for the UI.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Join screen submit. Failures are returned and also queued as a
    /// `Notice::JoinError` for inline display.
    pub fn submit_join(&mut self, name: &str, color: Color) -> Result<(), ClientError> {
        match self.join.submit(&mut self.session, name, color) {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::debug!("join rejected: {e}");
                self.notices.push(Notice::JoinError(e.clone()));
                Err(e)
            }
        }
    }

    /// Motion loop body: apply network traffic, then move the local player.
    pub fn tick(&mut self, timestamp_ms: f64) {
        let dt = self.clock.tick(timestamp_ms);
        for event in self.session.poll() {
            self.handle_event(event, timestamp_ms);
        }
        self.advance(dt);
    }

    fn handle_event(&mut self, event: SessionEvent, now_ms: f64) {
        match event {
            SessionEvent::Connected => {
                self.notices.push(Notice::Connectivity(true));
            }
            SessionEvent::Disconnected => {
                // The joined view keeps running on what it has.
                if self.join.is_pending() {
                    tracing::debug!("abandoning join attempt in flight");
                    self.join.cancel();
                }
                self.notices.push(Notice::Connectivity(false));
            }
            SessionEvent::Joined(player) => {
                tracing::info!(
                    "joined as #{} {:?} at ({}, {})",
                    player.id,
                    player.name,
                    player.position.x,
                    player.position.y
                );
                self.notices.push(Notice::Joined(player.clone()));
                self.notices.push(Notice::Stats {
                    name: player.name.clone(),
                    score: player.score,
                    radius: player.radius,
                });
                self.local = Some(player);
            }
            SessionEvent::WorldUpdated(snapshot) => {
                self.world.replace(snapshot, now_ms);
                self.reconcile_local();
            }
            SessionEvent::NameChecked { request, available } => {
                match self.join.on_name_checked(&self.session, request, available) {
                    Ok(NameCheckOutcome::JoinSent { name, color }) => {
                        tracing::debug!("name {name:?} is free, join sent with {color}");
                    }
                    Ok(NameCheckOutcome::Ignored) => {}
                    Err(e) => {
                        tracing::debug!("join rejected: {e}");
                        self.notices.push(Notice::JoinError(e));
                    }
                }
            }
        }
    }

    /// Take server-owned fields of the local player from the snapshot,
    /// keeping the predicted position.
    fn reconcile_local(&mut self) {
        let Some(local) = self.local.as_mut() else {
            return;
        };
        let Some(server) = self.world.player(local.id) else {
            return;
        };
        let stats_changed = local.score != server.score
            || local.radius != server.radius
            || local.name != server.name;
        local.name.clone_from(&server.name);
        local.color = server.color;
        local.radius = server.radius;
        local.score = server.score;
        if stats_changed {
            self.notices.push(Notice::Stats {
                name: local.name.clone(),
                score: local.score,
                radius: local.radius,
            });
        }
    }

    /// Integrate one frame of local movement. Returns the new position if
    /// the player moved. Movement is reported to the server while connected;
    /// while disconnected the prediction continues silently.
    pub fn advance(&mut self, dt: f32) -> Option<Vec2> {
        let local = self.local.as_mut()?;
        let axis = self.input.borrow().axis();
        let next = self.predictor.step(local.position, axis, dt)?;
        local.position = next;

        if self.session.is_connected() {
            if let Err(e) = self.session.report_move(next.x, next.y) {
                tracing::debug!("move not sent: {e}");
            }
        }
        Some(next)
    }

    /// Render loop body. Nothing is drawn before the local player is known.
    pub fn draw<S: Surface>(&self, renderer: &Renderer, surface: &mut S) -> Option<Camera> {
        let local = self.local.as_ref()?;
        let view = LocalView {
            id: local.id,
            position: local.position,
        };
        Some(renderer.draw_frame(surface, view, self.world.players(), self.world.foods()))
    }

    /// Close the session. Used on teardown.
    pub fn shutdown(&mut self) {
        self.join.cancel();
        self.session.shutdown();
        self.input.borrow_mut().release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::SPEED;
    use crate::network::tests::{FakeTransport, connected_session};
    use crate::network::{Inbound, Inbox};
    use crate::render::tests::RecordingSurface;
    use protocol::packets::{ClientMessage, ServerMessage};
    use protocol::{Food, Snapshot};

    const BLUE: Color = Color::new(0x60, 0xa5, 0xfa);

    fn me() -> Player {
        Player {
            id: 7,
            name: "amy".into(),
            color: BLUE,
            position: Vec2::new(500.0, 500.0),
            radius: 20.0,
            score: 0,
        }
    }

    fn other(id: u32, x: f32, y: f32) -> Player {
        Player {
            id,
            name: format!("p{id}"),
            color: Color::new(1, 2, 3),
            position: Vec2::new(x, y),
            radius: 25.0,
            score: 3,
        }
    }

    fn deliver(inbox: &Inbox, message: ServerMessage) {
        inbox
            .borrow_mut()
            .push_back(Inbound::Frame(message.encode().to_vec()));
    }

    fn joined_game() -> (Game, FakeTransport, Inbox) {
        let (session, transport, inbox) = connected_session();
        let mut game = Game::new(session);
        deliver(&inbox, ServerMessage::Joined(me()));
        game.tick(0.0);
        transport.sent.borrow_mut().clear();
        game.take_notices();
        (game, transport, inbox)
    }

    fn moves(transport: &FakeTransport) -> Vec<Vec2> {
        transport
            .messages()
            .into_iter()
            .filter_map(|m| match m {
                ClientMessage::Move { x, y } => Some(Vec2::new(x, y)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_full_join_flow() {
        let (session, transport, inbox) = connected_session();
        let mut game = Game::new(session);

        game.submit_join("  amy ", BLUE).unwrap();
        let request = match transport.messages().as_slice() {
            [ClientMessage::CheckName { request, name }] => {
                assert_eq!(name, "amy");
                *request
            }
            other => panic!("unexpected traffic: {other:?}"),
        };

        deliver(&inbox, ServerMessage::NameStatus { request, available: true });
        game.tick(0.0);
        assert_eq!(
            transport.messages().last(),
            Some(&ClientMessage::Join { name: "amy".into(), color: BLUE })
        );
        assert!(!game.is_joined());

        deliver(&inbox, ServerMessage::Joined(me()));
        game.tick(16.0);
        assert!(game.is_joined());
        assert!(game.take_notices().contains(&Notice::Joined(me())));
    }

    #[test]
    fn test_blank_name_surfaces_error_without_traffic() {
        let (session, transport, _inbox) = connected_session();
        let mut game = Game::new(session);
        assert_eq!(game.submit_join("   ", BLUE), Err(ClientError::EmptyName));
        assert_eq!(game.take_notices(), vec![Notice::JoinError(ClientError::EmptyName)]);
        assert!(transport.sent.borrow().is_empty());
    }

    #[test]
    fn test_taken_name_surfaces_inline_error() {
        let (session, transport, inbox) = connected_session();
        let mut game = Game::new(session);
        game.submit_join("amy", BLUE).unwrap();
        let request = match transport.messages()[0] {
            ClientMessage::CheckName { request, .. } => request,
            ref other => panic!("unexpected {other:?}"),
        };
        deliver(&inbox, ServerMessage::NameStatus { request, available: false });
        game.tick(0.0);

        assert_eq!(game.take_notices(), vec![Notice::JoinError(ClientError::NameTaken)]);
        assert_eq!(transport.messages().len(), 1);
    }

    #[test]
    fn test_disconnect_abandons_join_in_flight() {
        let (session, transport, inbox) = connected_session();
        let mut game = Game::new(session);
        game.submit_join("amy", BLUE).unwrap();
        let request = match transport.messages()[0] {
            ClientMessage::CheckName { request, .. } => request,
            ref other => panic!("unexpected {other:?}"),
        };

        inbox.borrow_mut().push_back(Inbound::Closed);
        deliver(&inbox, ServerMessage::NameStatus { request, available: false });
        game.tick(0.0);

        assert_eq!(game.take_notices(), vec![Notice::Connectivity(false)]);
        assert_eq!(transport.messages().len(), 1);
    }

    #[test]
    fn test_held_key_moves_and_reports_every_frame() {
        let (mut game, transport, _inbox) = joined_game();
        game.input_state().borrow_mut().on_key_down("d");

        game.tick(100.0);
        game.tick(200.0);

        let expected_step = SPEED * 0.1;
        let sent = moves(&transport);
        assert_eq!(sent.len(), 2);
        assert!((sent[0].x - (500.0 + expected_step)).abs() < 1e-3);
        assert!((sent[1].x - (500.0 + 2.0 * expected_step)).abs() < 1e-3);
        assert_eq!(game.local_player().unwrap().position, sent[1]);
    }

    #[test]
    fn test_opposing_keys_send_nothing() {
        let (mut game, transport, _inbox) = joined_game();
        {
            let input = game.input_state();
            let mut input = input.borrow_mut();
            input.on_key_down("a");
            input.on_key_down("ArrowRight");
        }
        game.tick(100.0);
        assert!(moves(&transport).is_empty());
        assert_eq!(game.local_player().unwrap().position, Vec2::new(500.0, 500.0));
    }

    #[test]
    fn test_zero_dt_sends_nothing() {
        let (mut game, transport, _inbox) = joined_game();
        game.input_state().borrow_mut().on_key_down("w");
        // Same timestamp as the join tick.
        game.tick(0.0);
        assert!(moves(&transport).is_empty());
    }

    #[test]
    fn test_diagonal_is_not_faster() {
        let (mut game, _transport, _inbox) = joined_game();
        game.input_state().borrow_mut().on_key_down("w");
        game.input_state().borrow_mut().on_key_down("d");
        let start = game.local_player().unwrap().position;
        let next = game.advance(0.5).unwrap();
        assert!(((next - start).length() - SPEED * 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_snapshot_keeps_predicted_position_but_takes_stats() {
        let (mut game, _transport, inbox) = joined_game();
        game.input_state().borrow_mut().on_key_down("s");
        game.tick(100.0);
        let predicted = game.local_player().unwrap().position;

        let mut echoed = me();
        echoed.position = Vec2::new(0.0, 0.0);
        echoed.score = 12;
        echoed.radius = 26.0;
        deliver(
            &inbox,
            ServerMessage::StateUpdate(Snapshot {
                players: vec![echoed, other(2, 10.0, 10.0)],
                foods: vec![],
            }),
        );
        game.input_state().borrow_mut().on_key_up("s");
        game.tick(200.0);

        let local = game.local_player().unwrap();
        assert_eq!(local.position, predicted);
        assert_eq!(local.score, 12);
        assert_eq!(local.radius, 26.0);
        assert_eq!(game.world().players().len(), 2);
        assert!(game.take_notices().contains(&Notice::Stats {
            name: "amy".into(),
            score: 12,
            radius: 26.0,
        }));
    }

    #[test]
    fn test_frame_draws_every_entity_relative_to_camera() {
        let (mut game, _transport, inbox) = joined_game();
        let players = vec![me(), other(2, 600.0, 450.0), other(3, 100.0, 100.0)];
        let foods: Vec<Food> = (0..4)
            .map(|i| Food {
                position: Vec2::new(150.0 + i as f32, 250.0),
                radius: 4.0,
                color: Color::new(9, 9, 9),
            })
            .collect();
        deliver(
            &inbox,
            ServerMessage::StateUpdate(Snapshot {
                players: players.clone(),
                foods,
            }),
        );
        game.tick(16.0);

        let mut surface = RecordingSurface::new(800.0, 600.0);
        let camera = game.draw(&Renderer::new(), &mut surface).unwrap();
        assert_eq!(camera.offset(), Vec2::new(100.0, 200.0));

        let circles = surface.circles();
        assert_eq!(circles.len(), 4 + 3);
        assert_eq!(circles[0].0, Vec2::new(50.0, 50.0));
        assert_eq!(surface.labels().len(), 3);
        // Player 2 at (600, 450) -> (500, 250)
        assert_eq!(circles[4 + 1].0, Vec2::new(500.0, 250.0));
    }

    #[test]
    fn test_nothing_drawn_before_join() {
        let (session, _transport, _inbox) = connected_session();
        let game = Game::new(session);
        let mut surface = RecordingSurface::new(800.0, 600.0);
        assert!(game.draw(&Renderer::new(), &mut surface).is_none());
        assert!(surface.ops.is_empty());
    }

    #[test]
    fn test_disconnect_while_joined_keeps_running() {
        let (mut game, transport, inbox) = joined_game();
        inbox.borrow_mut().push_back(Inbound::Closed);
        game.input_state().borrow_mut().on_key_down("a");
        game.tick(100.0);

        assert_eq!(game.take_notices(), vec![Notice::Connectivity(false)]);
        assert!(!game.is_connected());
        // Still moving locally, nothing sent.
        assert!(game.local_player().unwrap().position.x < 500.0);
        assert!(moves(&transport).is_empty());

        let mut surface = RecordingSurface::new(800.0, 600.0);
        assert!(game.draw(&Renderer::new(), &mut surface).is_some());
        assert_eq!(game.submit_join("amy", BLUE), Err(ClientError::Disconnected));
    }

    #[test]
    fn test_shutdown_closes_session_and_releases_keys() {
        let (mut game, transport, _inbox) = joined_game();
        game.input_state().borrow_mut().on_key_down("w");
        game.shutdown();
        assert!(transport.closed.get());
        assert!(game.input_state().borrow().axis().is_idle());
    }
}
