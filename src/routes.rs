// src/routes.rs
//
// HTTP surface: one directory per area with its handlers and request/response
// models, wired together in `routes::routes`.

pub mod common_models;
pub mod routes;

pub mod admin {
    pub mod admin_handlers;
}
pub mod cost {
    pub mod cost_handlers;
    pub mod cost_models;
}
pub mod keyword {
    pub mod keyword_handlers;
    pub mod keyword_models;
}
pub mod project {
    pub mod project_handlers;
    pub mod project_models;
}
pub mod risk_impact {
    pub mod risk_impact_handlers;
    pub mod risk_impact_models;
}
pub mod session {
    pub mod session_handlers;
    pub mod session_models;
}
pub mod task {
    pub mod task_handlers;
    pub mod task_models;
}
pub mod user {
    pub mod user_handlers;
    pub mod user_models;
}
pub mod user_notification {
    pub mod user_notification_handlers;
    pub mod user_notification_models;
}
pub mod user_watching {
    pub mod user_watching_handlers;
    pub mod user_watching_models;
}
pub mod wbs {
    pub mod wbs_handlers;
    pub mod wbs_models;
}
pub mod workflow_event_log {
    pub mod workflow_event_log_handlers;
    pub mod workflow_event_log_models;
}
pub mod workflow_flowchart {
    pub mod workflow_flowchart_handlers;
    pub mod workflow_flowchart_models;
}
