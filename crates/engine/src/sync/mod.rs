mod protocol;
mod transport;

use tracing::{debug, info, warn};

use crate::app::{EventSender, SceneState};

pub use protocol::{parse_server_message, ClientMessage, ServerMessage, WireAgent};
pub use transport::{
    ConnectionId, Connector, Transport, TransportError, TransportEvent, WsConnector,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Reads `Disconnected` until the transport reports open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connected,
}

impl ConnectionStatus {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connected => "connected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageEffect {
    None,
    Redraw,
    FetchEnvironment(String),
}

pub struct SyncClient {
    connector: Box<dyn Connector>,
    transport: Option<Box<dyn Transport>>,
    active: Option<ConnectionId>,
    next_connection: u64,
    state: ConnectionState,
    status: ConnectionStatus,
    endpoint: Option<String>,
}

impl SyncClient {
    pub fn new(connector: Box<dyn Connector>) -> Self {
        Self {
            connector,
            transport: None,
            active: None,
            next_connection: 1,
            state: ConnectionState::Disconnected,
            status: ConnectionStatus::Disconnected,
            endpoint: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn active_connection(&self) -> Option<ConnectionId> {
        self.active
    }

    pub fn connect(&mut self, url: &str, events: &EventSender) -> ConnectionId {
        self.close_transport();

        let connection = ConnectionId(self.next_connection);
        self.next_connection = self.next_connection.wrapping_add(1);
        info!(url, connection = connection.0, "sync_connecting");

        self.transport = Some(self.connector.open(url, connection, events.clone()));
        self.active = Some(connection);
        self.state = ConnectionState::Connecting;
        self.status = ConnectionStatus::Disconnected;
        self.endpoint = Some(url.to_string());
        connection
    }

    pub fn disconnect(&mut self) {
        if self.transport.is_none() && self.state == ConnectionState::Disconnected {
            return;
        }
        self.close_transport();
        self.mark_disconnected();
        info!("sync_disconnected");
    }

    pub fn handle_transport_event(
        &mut self,
        connection: ConnectionId,
        event: TransportEvent,
        agent_count: usize,
    ) -> Option<ServerMessage> {
        if self.active != Some(connection) {
            debug!(connection = connection.0, event = ?event, "sync_stale_event_dropped");
            return None;
        }

        match event {
            TransportEvent::Opened => {
                self.state = ConnectionState::Connected;
                self.status = ConnectionStatus::Connected;
                info!(connection = connection.0, "sync_connected");
                self.send_hello(agent_count);
                None
            }
            TransportEvent::Text(text) => match parse_server_message(&text) {
                Ok(message) => Some(message),
                Err(error) => {
                    warn!(error = %error, "sync_message_unparseable");
                    None
                }
            },
            TransportEvent::Closed => {
                info!(connection = connection.0, "sync_connection_closed");
                self.transport = None;
                self.mark_disconnected();
                None
            }
            TransportEvent::Failed(reason) => {
                warn!(
                    connection = connection.0,
                    reason = reason.as_str(),
                    "sync_connection_failed"
                );
                self.transport = None;
                self.mark_disconnected();
                None
            }
        }
    }

    fn send_hello(&mut self, agent_count: usize) {
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        match (ClientMessage::Hello { agent_count }).to_json() {
            Ok(text) => {
                debug!(agent_count, "sync_hello_sent");
                transport.send_text(text);
            }
            Err(error) => warn!(error = %error, "sync_hello_encode_failed"),
        }
    }

    fn close_transport(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
    }

    fn mark_disconnected(&mut self) {
        self.active = None;
        self.state = ConnectionState::Disconnected;
        self.status = ConnectionStatus::Disconnected;
    }
}

impl Drop for SyncClient {
    fn drop(&mut self) {
        self.close_transport();
    }
}

pub fn apply_server_message(scene: &mut SceneState, message: ServerMessage) -> MessageEffect {
    match message {
        ServerMessage::State { agents } => {
            debug!(agent_count = agents.len(), "sync_state_applied");
            scene.replace_agents(agents);
            MessageEffect::Redraw
        }
        ServerMessage::Reset { agents } => {
            info!(agent_count = agents.len(), "sync_reset_applied");
            scene.replace_agents(agents);
            scene.reset_tick();
            MessageEffect::Redraw
        }
        ServerMessage::Env { url } => {
            info!(url = url.as_str(), "sync_environment_pushed");
            MessageEffect::FetchEnvironment(url)
        }
        ServerMessage::Unrecognized { message_type } => {
            debug!(message_type = ?message_type, "sync_message_ignored");
            MessageEffect::None
        }
        ServerMessage::Malformed {
            message_type,
            detail,
        } => {
            debug!(
                message_type = message_type.as_str(),
                detail = detail.as_str(),
                "sync_message_malformed"
            );
            MessageEffect::None
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Debug, Default)]
    pub(crate) struct FakeWire {
        pub(crate) opened: Vec<(String, ConnectionId)>,
        pub(crate) sent: Vec<(ConnectionId, String)>,
        pub(crate) closed: Vec<ConnectionId>,
    }

    #[derive(Debug, Clone, Default)]
    pub(crate) struct FakeConnector {
        pub(crate) wire: Rc<RefCell<FakeWire>>,
    }

    struct FakeTransport {
        connection: ConnectionId,
        wire: Rc<RefCell<FakeWire>>,
    }

    impl Transport for FakeTransport {
        fn send_text(&mut self, text: String) {
            self.wire.borrow_mut().sent.push((self.connection, text));
        }

        fn close(&mut self) {
            self.wire.borrow_mut().closed.push(self.connection);
        }
    }

    impl Connector for FakeConnector {
        fn open(
            &mut self,
            url: &str,
            connection: ConnectionId,
            _events: EventSender,
        ) -> Box<dyn Transport> {
            self.wire
                .borrow_mut()
                .opened
                .push((url.to_string(), connection));
            Box::new(FakeTransport {
                connection,
                wire: Rc::clone(&self.wire),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::FakeConnector;
    use super::*;
    use crate::app::{Agent, EventQueue, Vec2};
    use crate::environment::EnvironmentBitmap;

    fn client() -> (SyncClient, FakeConnector, EventQueue) {
        let connector = FakeConnector::default();
        let client = SyncClient::new(Box::new(connector.clone()));
        (client, connector, EventQueue::new())
    }

    fn agents(ids: &[i64]) -> Vec<Agent> {
        ids.iter()
            .map(|id| Agent {
                id: *id,
                position: Vec2 {
                    x: *id as f32,
                    y: 0.0,
                },
            })
            .collect()
    }

    #[test]
    fn connect_enters_connecting_with_indicator_off() {
        let (mut client, connector, queue) = client();
        let connection = client.connect("ws://host:1", &queue.sender());

        assert_eq!(client.state(), ConnectionState::Connecting);
        assert_eq!(client.status(), ConnectionStatus::Disconnected);
        assert_eq!(client.endpoint(), Some("ws://host:1"));
        assert_eq!(
            connector.wire.borrow().opened,
            vec![("ws://host:1".to_string(), connection)]
        );
    }

    #[test]
    fn open_sends_hello_with_agent_count() {
        let (mut client, connector, queue) = client();
        let connection = client.connect("ws://host:1", &queue.sender());
        assert!(client
            .handle_transport_event(connection, TransportEvent::Opened, 7)
            .is_none());

        assert_eq!(client.state(), ConnectionState::Connected);
        assert_eq!(client.status(), ConnectionStatus::Connected);
        let wire = connector.wire.borrow();
        assert_eq!(wire.sent.len(), 1);
        let hello: serde_json::Value = serde_json::from_str(&wire.sent[0].1).expect("json");
        assert_eq!(hello, serde_json::json!({"type": "hello", "agentCount": 7}));
    }

    #[test]
    fn reconnect_closes_previous_transport_and_drops_its_events() {
        let (mut client, connector, queue) = client();
        let first = client.connect("ws://a", &queue.sender());
        let second = client.connect("ws://b", &queue.sender());
        assert_ne!(first, second);
        assert_eq!(connector.wire.borrow().closed, vec![first]);

        client.handle_transport_event(first, TransportEvent::Opened, 5);
        assert_eq!(client.state(), ConnectionState::Connecting);
        assert!(connector.wire.borrow().sent.is_empty());

        let stale = client.handle_transport_event(
            first,
            TransportEvent::Text(r#"{"type":"reset","agents":[]}"#.to_string()),
            5,
        );
        assert!(stale.is_none());
    }

    #[test]
    fn close_and_failure_return_to_disconnected() {
        for terminal in [
            TransportEvent::Closed,
            TransportEvent::Failed("refused".to_string()),
        ] {
            let (mut client, _connector, queue) = client();
            let connection = client.connect("ws://host", &queue.sender());
            client.handle_transport_event(connection, TransportEvent::Opened, 1);
            client.handle_transport_event(connection, terminal, 1);

            assert_eq!(client.state(), ConnectionState::Disconnected);
            assert_eq!(client.status(), ConnectionStatus::Disconnected);
            assert_eq!(client.active_connection(), None);
        }
    }

    #[test]
    fn disconnect_is_immediate_and_ignores_late_events() {
        let (mut client, connector, queue) = client();
        let connection = client.connect("ws://host", &queue.sender());
        client.handle_transport_event(connection, TransportEvent::Opened, 1);
        client.disconnect();

        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert_eq!(connector.wire.borrow().closed, vec![connection]);
        assert!(client
            .handle_transport_event(
                connection,
                TransportEvent::Text(r#"{"type":"state","agents":[]}"#.to_string()),
                1,
            )
            .is_none());
        // Disconnecting twice does not close anything again.
        client.disconnect();
        assert_eq!(connector.wire.borrow().closed.len(), 1);
    }

    #[test]
    fn unparseable_text_yields_nothing() {
        let (mut client, _connector, queue) = client();
        let connection = client.connect("ws://host", &queue.sender());
        client.handle_transport_event(connection, TransportEvent::Opened, 1);
        let message =
            client.handle_transport_event(connection, TransportEvent::Text("{oops".to_string()), 1);
        assert!(message.is_none());
        assert_eq!(client.state(), ConnectionState::Connected);
    }

    #[test]
    fn state_replaces_agents_and_keeps_tick() {
        let mut scene = SceneState::new();
        scene.advance_tick();
        scene.advance_tick();
        let effect = apply_server_message(
            &mut scene,
            ServerMessage::State {
                agents: agents(&[9, 4]),
            },
        );
        assert_eq!(effect, MessageEffect::Redraw);
        assert_eq!(scene.agents(), agents(&[9, 4]).as_slice());
        assert_eq!(scene.tick(), 2);
    }

    #[test]
    fn reset_replaces_agents_and_zeroes_tick() {
        let mut scene = SceneState::new();
        scene.advance_tick();
        let effect = apply_server_message(
            &mut scene,
            ServerMessage::Reset {
                agents: agents(&[1]),
            },
        );
        assert_eq!(effect, MessageEffect::Redraw);
        assert_eq!(scene.tick(), 0);
        assert_eq!(scene.agents().len(), 1);
    }

    #[test]
    fn env_requests_a_fetch_without_touching_scene() {
        let mut scene = SceneState::new();
        let effect = apply_server_message(
            &mut scene,
            ServerMessage::Env {
                url: "http://host/e.png".to_string(),
            },
        );
        assert_eq!(
            effect,
            MessageEffect::FetchEnvironment("http://host/e.png".to_string())
        );
        assert!(scene.environment().is_none());
    }

    #[test]
    fn ignorable_messages_change_nothing() {
        let mut scene = SceneState::new();
        scene.set_environment(EnvironmentBitmap::filled(2, 2, [1, 1, 1, 255]), "demo-grid");
        scene.replace_agents(agents(&[1, 2]));
        scene.advance_tick();

        for message in [
            ServerMessage::Unrecognized {
                message_type: Some("bogus".to_string()),
            },
            ServerMessage::Malformed {
                message_type: "state".to_string(),
                detail: "agents: invalid type".to_string(),
            },
        ] {
            assert_eq!(apply_server_message(&mut scene, message), MessageEffect::None);
        }
        assert_eq!(scene.agents(), agents(&[1, 2]).as_slice());
        assert_eq!(scene.tick(), 1);
        assert_eq!(scene.environment().map(|bitmap| bitmap.width()), Some(2));
    }
}
