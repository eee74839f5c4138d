//! CLI command implementations.
//!
//! | Module   | Commands handled      |
//! |----------|-----------------------|
//! | `run`    | `Revert`, `Cleanup`   |
//! | `status` | `Status`              |

pub mod run;
pub mod status;

pub use run::{cmd_cleanup, cmd_revert};
pub use status::cmd_status;
