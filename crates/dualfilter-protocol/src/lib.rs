// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # dualfilter-protocol
//!
//! Wire format between the pipeline and the worker pool.
//!
//! | Frame    | Direction          | Bytes | Layout (little-endian)        |
//! |----------|--------------------|-------|-------------------------------|
//! | Record   | pipeline → workers | 12    | id i32 @0, load f32 @4, uptime i32 @8 |
//! | Result   | workers → pipeline | 8     | id i32 @0, metric f32 @4      |
//! | Sentinel | both               | 1     | `0xFF`                        |
//!
//! ```
//! use dualfilter_protocol::{InboundFrame, ResultFrame};
//!
//! let bytes = ResultFrame::new(2, 71.5).encode();
//! assert!(matches!(InboundFrame::classify(&bytes), InboundFrame::Result(f) if f.id == 2));
//! assert_eq!(InboundFrame::classify(&[0xFF]), InboundFrame::Sentinel);
//! ```

pub mod error;
pub mod frame;

pub use error::{FrameError, FrameResult};
pub use frame::{
    is_sentinel, InboundFrame, OutboundFrame, RecordFrame, ResultFrame, RECORD_FRAME_LEN,
    RESULT_FRAME_LEN, SENTINEL, SENTINEL_FRAME,
};
