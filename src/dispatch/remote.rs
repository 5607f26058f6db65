// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fabula-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fabula and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Optional remote layout service seam.
//!
//! The dispatcher only knows this request/response contract; transports live
//! with the embedding application. Futures are boxed so the service can be
//! held as a trait object.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::model::{Card, CardId, Choice, GraphId, PositionMap};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteLayoutRequest {
    pub graph_id: GraphId,
    pub cards: Vec<Card>,
    pub choices: Vec<Choice>,
    pub root_card_id: Option<CardId>,
    pub collapsed: Vec<CardId>,
    /// Echoed back in the response so the caller can reject replies for a
    /// structure that has since changed.
    pub structural_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteLayoutResponse {
    pub positions: PositionMap,
    /// Whether the service answered from its own cache.
    pub cached: bool,
    pub structural_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub message: String,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "remote layout service error: {}", self.message)
    }
}

impl std::error::Error for RemoteError {}

pub trait RemoteLayoutService: Send + Sync {
    fn compute(
        &self,
        request: RemoteLayoutRequest,
    ) -> BoxFuture<'_, Result<RemoteLayoutResponse, RemoteError>>;

    fn invalidate(&self, graph_id: &GraphId) -> BoxFuture<'_, Result<(), RemoteError>>;
}
