// ABOUTME: Output formatting helpers for twinforge-cli
// ABOUTME: Pretty JSON for full results and a short table for the action queue
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 TwinForge Contributors

use anyhow::Result;
use serde::Serialize;
use twinforge_core::models::DashboardAction;

/// Print `value` as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print live actions, highest priority first
pub fn print_actions(actions: &[DashboardAction]) {
    if actions.is_empty() {
        println!("No live actions");
        return;
    }

    println!("{}", "=".repeat(80));
    println!("{:<4} {:<9} {:<10} {:<48}", "PRIO", "SOURCE", "EXPIRES", "TITLE");
    println!("{}", "=".repeat(80));
    for action in actions {
        println!(
            "{:<4} {:<9} {:<10} {:<48}",
            action.priority_score,
            action.source.as_str(),
            action.expires_at.format("%m-%d %H:%M"),
            action.title
        );
        println!("     id: {}", action.id);
    }
}
