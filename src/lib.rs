#![allow(clippy::pedantic, clippy::module_inception)]

pub mod config;
pub mod event_processor;
pub mod keycode;
pub mod persist;
pub mod timer;
