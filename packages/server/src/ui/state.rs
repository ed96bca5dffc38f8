//! Shared application state.

use std::sync::Arc;

use crate::{
    domain::PrincipalResolver,
    usecase::{
        ConnectClientUseCase, DisconnectClientUseCase, DispatchEventUseCase,
        GetStreamStatusUseCase, ListRecordingsUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// トークンから Principal を解決する
    pub principal_resolver: Arc<dyn PrincipalResolver>,
    /// ConnectClientUseCase（接続のユースケース）
    pub connect_client_usecase: Arc<ConnectClientUseCase>,
    /// DisconnectClientUseCase（切断のユースケース）
    pub disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    /// DispatchEventUseCase（受信イベント処理のユースケース）
    pub dispatch_event_usecase: Arc<DispatchEventUseCase>,
    /// GetStreamStatusUseCase（配信状態取得のユースケース）
    pub get_stream_status_usecase: Arc<GetStreamStatusUseCase>,
    /// ListRecordingsUseCase（録画一覧取得のユースケース）
    pub list_recordings_usecase: Arc<ListRecordingsUseCase>,
}
