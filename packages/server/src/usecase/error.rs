//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::CatalogError;

/// 接続処理のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("Connection ID '{0}' is already registered")]
    DuplicateConnectionId(String),
}

/// 切断処理のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DisconnectError {
    #[error("Connection '{0}' not found")]
    ConnectionNotFound(String),
}

/// 録画一覧取得のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListRecordingsError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
