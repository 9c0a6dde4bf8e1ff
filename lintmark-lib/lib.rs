use smartstring::{LazyCompact, SmartString};

pub mod aggregate;
pub mod analyzer;
pub mod buffer;
pub mod check;
pub mod command;
pub mod config;
pub mod diagnostic;
pub mod document;
pub mod engine;
pub mod format;
pub mod group;
pub mod history;
pub mod locate;
pub mod search;

pub type Tendril = SmartString<LazyCompact>;
