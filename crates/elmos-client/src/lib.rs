//! Client core for the ELMOS kernel development backend.
//!
//! The [`Client`] facade issues build, clone and QEMU requests over a
//! [`Transport`], consumes their event streams through the [`session`]
//! layer and republishes everything as [`Notification`]s. [`QemuConsole`]
//! turns QEMU notifications into styled console text.

pub mod client;
pub mod config;
pub mod console;
pub mod events;
pub mod proto;
pub mod session;
pub mod transport;

pub use client::{BuildOptions, Client, QemuRunOptions};
pub use config::ClientConfig;
pub use console::QemuConsole;
pub use events::{EventBus, Notification};
pub use transport::{Address, ChannelState, GrpcTransport, Transport};
