//! Data models for the Zendesk Support and Sunshine Conversations APIs.
//!
//! Only the shapes the services read or build are modelled; every entity keeps
//! the fields it does not name in an `extra` map so nothing returned by the
//! API is lost.

mod audit;
pub(crate) mod common;
mod custom_object;
mod sunshine;
mod template;
mod ticket;
mod user;
mod workspace;
mod zis;

pub use audit::*;
pub use common::*;
pub use custom_object::*;
pub use sunshine::*;
pub use template::*;
pub use ticket::*;
pub use user::*;
pub use workspace::*;
pub use zis::*;
