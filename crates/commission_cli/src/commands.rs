//! Command modules for the commission admin CLI.
//!
//! Each submodule handles a specific command category:
//!
//! - `config_cmd`: Creating and inspecting the CLI configuration file
//! - `context`: Wiring of the configuration, data file and commission service
//! - `global_cmd`: Reading and replacing the global commissions
//! - `user_cmd`: Per-user overrides and user registration

pub mod config_cmd;
pub mod context;
pub mod global_cmd;
pub mod user_cmd;

#[cfg(test)]
pub(crate) mod test_support;
