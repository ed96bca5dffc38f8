//! UseCase 層
//!
//! ドメイン層の Repository / MessagePusher を組み合わせて、
//! 接続・切断・受信イベントの処理を実装します。

pub mod connect_client;
pub mod disconnect_client;
pub mod dispatch_event;
pub mod error;
pub mod get_stream_status;
pub mod list_recordings;
mod notify;
pub mod send_message;
pub mod stream_lifecycle;
pub mod sweep_stale_state;
pub mod viewer_relay;

#[cfg(test)]
pub(crate) mod test_support;

pub use connect_client::ConnectClientUseCase;
pub use disconnect_client::DisconnectClientUseCase;
pub use dispatch_event::{DispatchEventUseCase, DispatchOutcome};
pub use error::{ConnectError, DisconnectError, ListRecordingsError};
pub use get_stream_status::GetStreamStatusUseCase;
pub use list_recordings::ListRecordingsUseCase;
pub use send_message::SendMessageUseCase;
pub use stream_lifecycle::StreamLifecycleUseCase;
pub use sweep_stale_state::SweepStaleStateUseCase;
pub use viewer_relay::ViewerRelayUseCase;
