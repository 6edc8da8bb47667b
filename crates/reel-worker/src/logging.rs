//! Structured episode logging.

use tracing::{error, info, warn, Span};

/// Lifecycle logger carrying the episode id and current stage on every line.
#[derive(Debug, Clone)]
pub struct EpisodeLogger {
    episode_id: String,
    stage: String,
}

impl EpisodeLogger {
    pub fn new(episode_id: &str, stage: &str) -> Self {
        Self {
            episode_id: episode_id.to_string(),
            stage: stage.to_string(),
        }
    }

    /// Same episode, different stage.
    pub fn for_stage(&self, stage: &str) -> Self {
        Self::new(&self.episode_id, stage)
    }

    pub fn log_start(&self, message: &str) {
        info!(
            episode_id = %self.episode_id,
            stage = %self.stage,
            "Episode started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            episode_id = %self.episode_id,
            stage = %self.stage,
            "Episode progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            episode_id = %self.episode_id,
            stage = %self.stage,
            "Episode warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            episode_id = %self.episode_id,
            stage = %self.stage,
            "Episode error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            episode_id = %self.episode_id,
            stage = %self.stage,
            "Episode completed: {}", message
        );
    }

    pub fn episode_id(&self) -> &str {
        &self.episode_id
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "episode",
            episode_id = %self.episode_id,
            stage = %self.stage
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_stages() {
        let logger = EpisodeLogger::new("ep-1", "route");
        assert_eq!(logger.episode_id(), "ep-1");
        assert_eq!(logger.stage(), "route");

        let budget = logger.for_stage("budget");
        assert_eq!(budget.episode_id(), "ep-1");
        assert_eq!(budget.stage(), "budget");
    }

    #[test]
    fn test_log_methods_do_not_panic() {
        let logger = EpisodeLogger::new("ep-2", "assemble");
        logger.log_start("start");
        logger.log_progress("halfway");
        logger.log_warning("careful");
        logger.log_error("oops");
        logger.log_completion("done");
        let _span = logger.create_span();
    }
}
