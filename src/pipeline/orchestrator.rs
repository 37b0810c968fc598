use tracing::{error, info};

use crate::pipeline::job_runner::{JobConfig, JobResult, run_job};

/// Run a batch of jobs in order, collecting per-job results. One job's
/// failure never prevents the remaining jobs from running.
pub fn run_all_jobs(jobs: &[JobConfig]) -> Vec<crate::error::Result<JobResult>> {
    jobs.iter()
        .enumerate()
        .map(|(i, job)| {
            info!(
                job = i + 1,
                total = jobs.len(),
                input = %job.input_path.display(),
                "starting job"
            );
            let result = run_job(job);
            if let Err(e) = &result {
                error!(job = i + 1, error = %e, "job failed");
            }
            result
        })
        .collect()
}
