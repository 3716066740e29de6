//! Typeahead / combobox field
//!
//! - `config.rs`: option source and create strategy
//! - `state.rs`: pure state machine, returns effects to run
//! - `component.rs`: Leptos component executing those effects
//! - `api.rs`: option fetch and create calls

pub mod api;
pub mod component;
pub mod config;
pub mod error;
pub mod scroll;
pub mod state;

pub use component::SelectTypeInput;
pub use config::{CreateStrategy, OptionFilters, OptionSource, RemoteSource, SelectConfig};
pub use error::SelectError;
