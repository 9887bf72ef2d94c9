//! Body and query extractors that reject with the API error envelope.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::Error;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ValidJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct ValidQuery<T>(pub T);
