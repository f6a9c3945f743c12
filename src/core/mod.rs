// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Concurrency primitives the pool, loader and orchestrator run on.
//!
//! ```text
//!              core
//!               |
//!        +------+------+
//!        v             v
//!       job         progress
//!        |             |
//!   Job::start    ProgressTracker
//!   is_finished   Severity, Message
//!   error         ProgressSpan
//! ```

pub mod job;
pub mod progress;
