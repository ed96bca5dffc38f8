//! Best-effort delivery helpers shared by the use cases.
//!
//! Delivery failures are logged and never abort the operation that produced
//! the notification.

use crate::domain::{
    ConnectionId, EndedSession, FinishedRecording, LectureCatalog, MessagePusher, Notification,
    StopReason, ViewerDeparture,
};

pub(crate) async fn push_or_log(
    pusher: &dyn MessagePusher,
    target: &ConnectionId,
    notification: &Notification,
) {
    if let Err(e) = pusher.push_to(target, notification).await {
        tracing::warn!("Failed to notify connection '{}': {}", target, e);
    }
}

pub(crate) async fn broadcast_or_log(
    pusher: &dyn MessagePusher,
    targets: Vec<ConnectionId>,
    notification: &Notification,
) {
    if let Err(e) = pusher.broadcast(targets, notification).await {
        tracing::warn!("Failed to broadcast notification: {}", e);
    }
}

pub(crate) async fn tag_or_log(catalog: &dyn LectureCatalog, recording: FinishedRecording) {
    let lecture_id = recording.lecture_id.clone();
    if let Err(e) = catalog.tag_recording(recording).await {
        tracing::error!("Failed to tag recording of lecture '{}': {}", lecture_id, e);
    }
}

/// Tell everyone a session ended, finalising its recording first
pub(crate) async fn announce_session_end(
    pusher: &dyn MessagePusher,
    catalog: &dyn LectureCatalog,
    ended: &EndedSession,
    reason: StopReason,
) {
    if let Some(recording) = &ended.recording {
        broadcast_or_log(
            pusher,
            ended.audience.clone(),
            &Notification::RecordingStopped(recording.clone()),
        )
        .await;
        tag_or_log(catalog, recording.clone()).await;
    }

    broadcast_or_log(
        pusher,
        ended.audience.clone(),
        &Notification::StreamStopped {
            session_id: ended.session_id.clone(),
            reason,
        },
    )
    .await;
}

/// Tell the owner a viewer left and everyone the new count
pub(crate) async fn announce_departure(
    pusher: &dyn MessagePusher,
    viewer: &ConnectionId,
    departure: &ViewerDeparture,
) {
    if let Some(admin) = &departure.admin {
        push_or_log(
            pusher,
            admin,
            &Notification::ViewerLeft {
                connection_id: viewer.clone(),
                count: departure.count,
            },
        )
        .await;
    }

    broadcast_or_log(
        pusher,
        departure.audience.clone(),
        &Notification::ViewerCountUpdated {
            count: departure.count,
        },
    )
    .await;
}
