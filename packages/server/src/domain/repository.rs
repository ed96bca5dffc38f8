//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;
use serde_json::Value;

use super::{
    Admission, CatalogError, Command, Connection, ConnectionId, ConnectionState,
    DisconnectOutcome, EndedSession, EventKind, FinishedRecording, LectureId, Principal,
    RateDecision, ReadyOutcome, SessionId, SignalingError, StartedRecording, StartedSession,
    StoppedRecording, StreamStatus, SweepReport, Timestamp, ViewerArrival, ViewerDeparture,
};

/// Signaling Repository trait
///
/// コーディネーターの共有状態（接続・配信セッション・レート制限・保留キュー）への
/// インターフェース。各メソッドは 1 つのクリティカルセクションとして原子的に実行される。
#[async_trait]
pub trait SignalingRepository: Send + Sync {
    /// 接続を `connecting` 状態で登録（ID が重複していれば false）
    async fn register_connection(
        &self,
        id: ConnectionId,
        principal: Option<Principal>,
        now: Timestamp,
    ) -> bool;

    /// 接続を `connected` に遷移し、保留中のコマンドを取り出す
    async fn mark_ready(
        &self,
        id: &ConnectionId,
        now: Timestamp,
    ) -> Result<ReadyOutcome, SignalingError>;

    /// コマンドを即時実行するか保留するかを決める
    async fn admit(
        &self,
        id: &ConnectionId,
        command: Command,
        now: Timestamp,
    ) -> Result<Admission, SignalingError>;

    /// レート制限を 1 件分消費する
    async fn check_rate(&self, id: &ConnectionId, kind: EventKind, now: Timestamp)
    -> RateDecision;

    /// 最終アクティビティ時刻を更新
    async fn touch(&self, id: &ConnectionId, now: Timestamp);

    /// 接続とそれに紐づく全ての状態を削除
    async fn remove_connection(
        &self,
        id: &ConnectionId,
        terminal: ConnectionState,
        now: Timestamp,
    ) -> Option<DisconnectOutcome>;

    async fn start_stream(
        &self,
        id: &ConnectionId,
        session_id: SessionId,
        now: Timestamp,
    ) -> Result<StartedSession, SignalingError>;

    async fn stop_stream(
        &self,
        id: &ConnectionId,
        now: Timestamp,
    ) -> Result<EndedSession, SignalingError>;

    async fn start_recording(
        &self,
        id: &ConnectionId,
        lecture_id: LectureId,
        now: Timestamp,
    ) -> Result<StartedRecording, SignalingError>;

    async fn stop_recording(
        &self,
        id: &ConnectionId,
        now: Timestamp,
    ) -> Result<StoppedRecording, SignalingError>;

    async fn join_stream(
        &self,
        id: &ConnectionId,
        viewer_info: Option<Value>,
        now: Timestamp,
    ) -> Result<ViewerArrival, SignalingError>;

    async fn leave_stream(&self, id: &ConnectionId) -> Option<ViewerDeparture>;

    async fn route_offer(
        &self,
        from: &ConnectionId,
        target: &ConnectionId,
    ) -> Result<ConnectionId, SignalingError>;

    async fn route_answer(&self, from: &ConnectionId) -> Result<ConnectionId, SignalingError>;

    async fn route_ice_candidate(
        &self,
        from: &ConnectionId,
        target: Option<&ConnectionId>,
    ) -> Result<ConnectionId, SignalingError>;

    async fn route_mic_request(&self, from: &ConnectionId)
    -> Result<ConnectionId, SignalingError>;

    /// 接続情報を取得
    async fn get_connection(&self, id: &ConnectionId) -> Option<Connection>;

    /// 登録中の全ての接続 ID を取得
    async fn get_all_connection_ids(&self) -> Vec<ConnectionId>;

    /// 配信状態のスナップショットを取得
    async fn get_stream_status(&self) -> StreamStatus;

    /// 古くなった状態を掃除する
    async fn sweep(&self, now: Timestamp, stale_after_ms: i64) -> SweepReport;
}

/// Lecture catalog trait
///
/// 終了した録画を講義に紐づけて保存する外部コラボレーター。
#[async_trait]
pub trait LectureCatalog: Send + Sync {
    /// 録画を講義に紐づける
    async fn tag_recording(&self, recording: FinishedRecording) -> Result<(), CatalogError>;

    /// 紐づけ済みの録画一覧を取得（古い順）
    async fn list_recordings(&self) -> Result<Vec<FinishedRecording>, CatalogError>;
}
