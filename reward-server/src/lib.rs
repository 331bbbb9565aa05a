//! Reward Server - cart milestone rewards backend
//!
//! # Architecture overview
//!
//! This crate is the REST backend behind a "cart milestone rewards" feature:
//! shoppers unlock free delivery, free products or discounts as their cart
//! value crosses merchant-configured thresholds.
//!
//! - **Database** (`db`): embedded SurrealDB storage, one repository per table
//! - **Rewards** (`rewards`): the milestone evaluator and session use cases
//! - **HTTP API** (`api`): RESTful admin + storefront endpoints
//!
//! # Module structure
//!
//! ```text
//! reward-server/src/
//! ├── core/          # Config, state, server
//! ├── api/           # HTTP routes and handlers
//! ├── rewards/       # milestone evaluation + cart session use cases
//! ├── db/            # database layer (models + repositories)
//! └── utils/         # errors, logging, validation helpers
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod rewards;
pub mod utils;

// Re-export common types
pub use core::{Config, Server, ServerState};
pub use rewards::{EvaluationResult, RewardService};
pub use utils::{AppError, AppResponse, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
    ____                               __
   / __ \___ _      ______ __________/ /____
  / /_/ / _ \ | /| / / __ `/ ___/ __  / ___/
 / _, _/  __/ |/ |/ / /_/ / /  / /_/ (__  )
/_/ |_|\___/|__/|__/\__,_/_/   \__,_/____/
    "#
    );
}
