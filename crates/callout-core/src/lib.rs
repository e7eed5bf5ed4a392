//! Core types and definitions for the CALLOUT freeplay simulation.
//!
//! This crate defines the vocabulary shared across all other crates:
//! identifiers, state enums, components, commands, notices, and constants.
//! It has no dependency on the ECS or any runtime framework.

pub mod commands;
pub mod components;
pub mod constants;
pub mod enums;
pub mod notices;
pub mod types;
