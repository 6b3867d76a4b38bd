//! Rofi blocks-mode client: process supervision, line decoding, and the
//! interaction stream.

mod channel;
mod client;
mod decode;
mod interaction;
mod process;
mod reader;
mod update;

pub use channel::*;
pub use client::*;
pub use decode::*;
pub use interaction::*;
pub use process::*;
pub use reader::*;
pub use update::*;
