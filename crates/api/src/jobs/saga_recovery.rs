//! Startup pass over onboarding sagas left `in_progress` by a crash.
//!
//! Runs once before the listener binds, so no live request can own one of
//! the sagas it resumes.

use domain::services::{Onboarding, OnboardingError, RecoveryReport};
use tracing::{info, warn};

use crate::middleware::record_onboarding_outcome;

pub async fn recover_interrupted_sagas(
    onboarding: &Onboarding<'_>,
) -> Result<RecoveryReport, OnboardingError> {
    let report = match onboarding.recover_interrupted().await {
        Ok(report) => report,
        Err(e) => {
            record_onboarding_outcome("recover_sagas", "error");
            return Err(e);
        }
    };

    if report.resumed == 0 {
        info!("No interrupted onboarding sagas");
    } else if report.failed > 0 {
        warn!(
            resumed = report.resumed,
            completed = report.completed,
            compensated = report.compensated,
            failed = report.failed,
            "Some interrupted sagas need manual follow-up"
        );
    } else {
        info!(
            resumed = report.resumed,
            completed = report.completed,
            compensated = report.compensated,
            "Interrupted sagas resolved"
        );
    }
    record_onboarding_outcome(
        "recover_sagas",
        if report.failed > 0 { "partial" } else { "success" },
    );

    Ok(report)
}
