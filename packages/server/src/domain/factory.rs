//! Domain factories for generating identifiers.

use super::{ConnectionId, SessionId, Timestamp, error::ValueObjectError};

/// Number of uuid hex characters appended to a session id
const SESSION_SUFFIX_LEN: usize = 12;

/// Factory for generating ConnectionId instances.
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    /// Generate a new ConnectionId with a random UUID v4.
    ///
    /// # Errors
    ///
    /// This method should not fail in practice, but returns Result for consistency
    /// with the domain error handling pattern.
    pub fn generate() -> Result<ConnectionId, ValueObjectError> {
        ConnectionId::new(uuid::Uuid::new_v4().to_string())
    }
}

/// Factory for generating SessionId instances.
///
/// Session ids combine the creation time with a random suffix
/// (`stream_<millis>_<hex>`), so two sessions started within the same
/// millisecond still get distinct ids.
pub struct SessionIdFactory;

impl SessionIdFactory {
    /// Generate a new SessionId for a session created at `now`.
    pub fn generate(now: Timestamp) -> Result<SessionId, ValueObjectError> {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        SessionId::new(format!(
            "stream_{}_{}",
            now.value(),
            &suffix[..SESSION_SUFFIX_LEN]
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_factory_generate() {
        // テスト項目: ConnectionIdFactory::generate() で UUID v4 形式の ID を生成できる
        // when (操作):
        let id1 = ConnectionIdFactory::generate().unwrap();
        let id2 = ConnectionIdFactory::generate().unwrap();

        // then (期待する結果):
        assert_eq!(id1.as_str().len(), 36);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_session_id_factory_embeds_timestamp() {
        // テスト項目: SessionId は作成時刻とランダムな接尾辞を含む
        // given (前提条件):
        let now = Timestamp::new(1_700_000_000_000);

        // when (操作):
        let session_id = SessionIdFactory::generate(now).unwrap();

        // then (期待する結果):
        let id = session_id.as_str();
        assert!(id.starts_with("stream_1700000000000_"));
        assert_eq!(id.len(), "stream_1700000000000_".len() + SESSION_SUFFIX_LEN);
    }

    #[test]
    fn test_session_id_factory_same_millisecond_is_unique() {
        // テスト項目: 同一ミリ秒に生成しても SessionId が衝突しない
        // given (前提条件):
        let now = Timestamp::new(42);

        // when (操作):
        let id1 = SessionIdFactory::generate(now).unwrap();
        let id2 = SessionIdFactory::generate(now).unwrap();

        // then (期待する結果):
        assert_ne!(id1, id2);
    }
}
