//! Orchestration that spans more than one collaborator.

pub mod onboarding;
