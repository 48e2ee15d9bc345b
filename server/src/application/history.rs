// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0

use std::sync::Arc;

use crate::domain::error::CoreError;
use crate::domain::operation::{OperationFilter, OperationRecord};
use crate::domain::repository::OperationRepository;

/// Read-only audit trail of custody operations, newest first.
pub struct HistoryService {
    operations: Arc<dyn OperationRepository>,
}

impl HistoryService {
    pub fn new(operations: Arc<dyn OperationRepository>) -> Self {
        Self { operations }
    }

    pub async fn list_operations(
        &self,
        filter: &OperationFilter,
    ) -> Result<Vec<OperationRecord>, CoreError> {
        self.operations.list(filter).await
    }
}
