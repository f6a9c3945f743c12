// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Library root.
//!
//! # Crate Architecture
//!
//! ```text
//!                        main.rs
//!                           |
//!                +----------+----------+
//!                v                     v
//!             cli (clap)          cmd (handlers)
//!                |         scan / load / reload
//!                +----------+----------+
//!                           v
//!              ,---------------------------,
//!              |          config           |
//!              |   TOML, layered settings  |
//!              '-------------+-------------'
//!                            v
//!                        lifecycle
//!          HostContext, LifecycleOrchestrator, leaks
//!                            |
//!                 +----------+----------+
//!                 v                     v
//!               pool                 loader
//!        read, conflicts      patch / load / init
//!                 |                     |
//!          +------+------+       +------+------+
//!          v             v       v             v
//!       storage       module   patch          host
//!      bundles    image, kind, hooks     HostRuntime,
//!                  descriptor            CatalogHost
//!
//!   +-----------------------------------------+
//!   |  core   job, progress                   |
//!   +-----------------------------------------+
//!   |  foundation   error, logging            |
//!   +-----------------------------------------+
//! ```

pub mod cli;
pub mod cmd;
pub mod config;
pub mod core;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod loader;
pub mod logging;
pub mod module;
pub mod patch;
pub mod pool;
pub mod storage;
