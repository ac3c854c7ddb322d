use lobby_core::ConnectionBridge;
use service_clients::AuthServiceClient;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) bridge: ConnectionBridge,
    pub(crate) auth: Option<AuthServiceClient>,
}
