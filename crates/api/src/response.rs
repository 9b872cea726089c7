//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope. List endpoints that
//! report counts or filters add a `meta` object via [`DataWithMeta`].

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(DataResponse { data: items }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "data": T, "meta": M }` envelope for listings.
#[derive(Debug, Serialize)]
pub struct DataWithMeta<T: Serialize, M: Serialize> {
    pub data: T,
    pub meta: M,
}

/// One-shot user-facing messages that accompany a response.
#[derive(Debug, Default, Serialize)]
pub struct Flash {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `{ "data": T, "flash": {...} }` envelope.
#[derive(Debug, Serialize)]
pub struct FlashResponse<T: Serialize> {
    pub data: T,
    pub flash: Flash,
}
