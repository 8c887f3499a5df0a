//! Hardware-independent core library for gatepanel
//!
//! This crate contains all platform-agnostic logic for the gatepanel router
//! LCD: region compositing and page transitions, the idle/backlight state
//! machine, message pagination, the power history engine, the declarative
//! page model and configuration types.
//!
//! Devices are reached only through narrow capability traits
//! ([`display::DisplaySink`], [`backlight::BacklightSink`],
//! [`messages::MessageSource`]) so everything here runs and tests on a
//! desktop host.

pub mod backlight;
pub mod config;
pub mod display;
pub mod font;
pub mod graphics;
pub mod messages;
pub mod power;
