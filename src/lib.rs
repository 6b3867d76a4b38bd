//! Rofi Blocks - drive rofi's blocks mode over line-delimited JSON.

pub mod blocks;
pub mod config;
pub mod display;
