use super::job::{Job, RemovalMethod};
use super::settings::Settings;

#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub dpi: u32,
    pub threshold: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    pub scale_steps: u32,
    pub method: RemovalMethod,
}

impl MergedConfig {
    /// Job values override settings values where present.
    pub fn new(settings: &Settings, job: &Job) -> Self {
        MergedConfig {
            dpi: job.dpi.unwrap_or(settings.dpi),
            threshold: job.threshold.unwrap_or(settings.threshold),
            min_scale: job.min_scale.unwrap_or(settings.min_scale),
            max_scale: job.max_scale.unwrap_or(settings.max_scale),
            scale_steps: job.scale_steps.unwrap_or(settings.scale_steps),
            method: job.method.unwrap_or(settings.method),
        }
    }
}
