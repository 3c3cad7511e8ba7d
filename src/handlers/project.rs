// src/handlers/project.rs
use warp::{Rejection, Reply};

use crate::models::ProjectStep;

/// The fixed installation timeline shown on the tracking screen.
pub fn timeline() -> Vec<ProjectStep> {
    let steps = [
        ("Solar Proposal Finalised", "completed"),
        ("Work Order Signed", "completed"),
        ("Load Extension Received", "completed"),
        ("Technical Feasibility Report Received", "completed"),
        ("Sanction Letter Received", "completed"),
        ("Installation Start", "completed"),
        ("Installation Complete", "pending"),
        ("Testing and Commissioning Done", "pending"),
    ];
    steps
        .into_iter()
        .enumerate()
        .map(|(i, (title, status))| ProjectStep {
            step: i as u32 + 1,
            title,
            status,
        })
        .collect()
}

pub async fn get_project_status() -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&timeline()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeline_has_eight_ordered_steps() {
        let steps = timeline();
        assert_eq!(steps.len(), 8);
        assert_eq!(steps.first().unwrap().step, 1);
        assert_eq!(steps.last().unwrap().step, 8);
        assert_eq!(steps.last().unwrap().status, "pending");
    }
}
