//! # class-autoload
//!
//! Resolves namespaced class identifiers (`App\Models\User`) to source files
//! and includes each file at most once.
//!
//! ## Architecture
//!
//! - **resolver**: class identifier to file path (class map, primary root, fallback dirs)
//! - **registry**: ordered chain of autoloader hooks with the loaded class set
//! - **include**: include-once store for resolved and eagerly included files
//! - **lookup**: class map and eager-include list loading
//! - **bootstrap**: host environment check and startup sequence
//! - **probe**: filesystem existence checks
//! - **scan**: class map generation by walking a search root

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod include;
pub mod lookup;
pub mod probe;
pub mod registry;
pub mod resolver;
pub mod scan;
