//! Session User Model
//!
//! Purely client-local session state; never synchronized across
//! terminals. The role only gates which views a terminal shows.

use serde::{Deserialize, Serialize};

/// Terminal role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Waiter,
    Kitchen,
    Cashier,
    Admin,
}

/// Session user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
}
