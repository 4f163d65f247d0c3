// src/models/mod.rs

pub mod tenant;
pub mod user;
pub mod session;
pub mod project;
pub mod user_watching;
pub mod user_notification;
pub mod cost;
pub mod keyword;
pub mod risk_impact;
pub mod wbs;
pub mod task;
pub mod workflow_flowchart;
pub mod workflow_event_log;
