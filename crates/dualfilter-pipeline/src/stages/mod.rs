// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The three concurrently running stages

pub mod collection;
pub mod distribution;
pub mod score_a;

pub use collection::{CollectionReport, CollectionStage};
pub use distribution::{DistributionReport, DistributionStage, DEFAULT_SETTLE_DELAY};
pub use score_a::{BackendFactory, ScoreStageA, StageAReport};
