use chrono::Duration;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use super::generator::{GenerationRequest, Generator};
use super::navigation::{NavigationController, NavigationEvent, NavigationOutcome};
use super::project::ProjectRepository;
use super::quota::{GenerationGate, QuotaTracker};
use super::storage::{Persisted, StateStorage};
use super::validation::{self, ImageFile};
use crate::error::{AppError, AppResult};
use crate::models::{
    AppConfig, Destination, GenerationResult, Project, ProjectStatus, StyleParameters, UserQuota,
};
use crate::utils::Clock;

/// Prompt recorded for image uploads without a description
pub const DEFAULT_IMAGE_PROMPT: &str = "User uploaded images";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaLevel {
    Normal,
    Warning,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuotaStatus {
    pub used_today: u32,
    pub daily_limit: u32,
    pub remaining: u32,
    pub usage_fraction: f64,
    pub level: QuotaLevel,
    pub resets_in: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerateOutcome {
    Completed(GenerationResult),
    /// Allowance spent; nothing was generated or consumed
    QuotaExceeded,
}

/// Session context owning quota, navigation, projects and the generator
pub struct AppCoordinator {
    config: AppConfig,
    quota: QuotaTracker,
    navigation: NavigationController,
    projects: ProjectRepository,
    generator: Arc<dyn Generator>,
    current_project: Option<Uuid>,
    quota_exceeded: Arc<AtomicBool>,
}

impl AppCoordinator {
    pub fn new(
        config: AppConfig,
        storage: StateStorage,
        clock: Arc<dyn Clock>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        let quota = QuotaTracker::load(storage.clone(), clock, config.daily_generation_limit);
        let mut navigation = NavigationController::load(storage.clone());
        let projects = ProjectRepository::load(storage);

        let quota_exceeded = Arc::new(AtomicBool::new(false));
        let flag = quota_exceeded.clone();
        navigation.subscribe(move |event| {
            if let NavigationEvent::QuotaExceeded { .. } = event {
                flag.store(true, Ordering::SeqCst);
            }
        });

        Self {
            config,
            quota,
            navigation,
            projects,
            generator,
            current_project: None,
            quota_exceeded,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn quota(&self) -> &UserQuota {
        self.quota.quota()
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.navigation
    }

    pub fn navigation_mut(&mut self) -> &mut NavigationController {
        &mut self.navigation
    }

    pub fn navigate(&mut self, destination: Destination) -> Persisted<NavigationOutcome> {
        self.navigation.navigate(destination, &mut self.quota)
    }

    pub fn back(&mut self) -> Persisted<Option<Destination>> {
        self.navigation.back()
    }

    pub fn navigate_to_dashboard(&mut self) -> Persisted<()> {
        self.navigation.reset()
    }

    pub fn current(&self) -> Destination {
        self.navigation.current()
    }

    pub fn history(&self, limit: usize) -> Vec<Destination> {
        self.navigation.history(limit)
    }

    pub fn is_quota_exceeded(&self) -> bool {
        self.quota_exceeded.load(Ordering::SeqCst)
    }

    pub fn dismiss_quota_exceeded_alert(&mut self) {
        self.quota_exceeded.store(false, Ordering::SeqCst);
    }

    /// Raise the daily allowance, clearing any pending upgrade prompt
    pub fn upgrade(&mut self, daily_limit: u32) -> Persisted<()> {
        self.dismiss_quota_exceeded_alert();
        self.quota.set_daily_limit(daily_limit)
    }

    pub fn quota_status(&mut self) -> QuotaStatus {
        self.quota.reset_if_needed();
        let quota = self.quota.quota();
        let usage_fraction = quota.usage_fraction();
        let level = if !quota.can_generate() {
            QuotaLevel::Exhausted
        } else if usage_fraction > self.config.usage_warning_threshold {
            QuotaLevel::Warning
        } else {
            QuotaLevel::Normal
        };
        QuotaStatus {
            used_today: quota.used_today,
            daily_limit: quota.daily_limit,
            remaining: quota.remaining(),
            usage_fraction,
            level,
            resets_in: self.quota.time_until_reset(),
        }
    }

    /// One-line summary of the remaining allowance
    pub fn announce_quota_status(&mut self) -> String {
        let status = self.quota_status();
        let minutes = status.resets_in.num_minutes();
        let mut line = format!(
            "{} of {} generations left today, resets in {}h {:02}m",
            status.remaining,
            status.daily_limit,
            minutes / 60,
            minutes % 60
        );
        match status.level {
            QuotaLevel::Warning => line.push_str(" (running low)"),
            QuotaLevel::Exhausted => line.push_str(" (upgrade to keep creating)"),
            QuotaLevel::Normal => {}
        }
        line
    }

    pub fn projects(&self) -> &[Project] {
        self.projects.fetch_projects()
    }

    pub fn current_project(&self) -> Option<&Project> {
        self.current_project.and_then(|id| self.projects.project(id))
    }

    pub fn create_project(&mut self, name: &str) -> Persisted<Uuid> {
        let saved = self.projects.save_project(Project::new(name));
        self.current_project = Some(saved.value);
        saved
    }

    pub fn select_project(&mut self, id: Uuid) -> AppResult<()> {
        if self.projects.project(id).is_none() {
            return Err(AppError::Project(format!("Project does not exist: {}", id)));
        }
        self.current_project = Some(id);
        Ok(())
    }

    pub async fn generate_text(
        &mut self,
        prompt: &str,
        params: StyleParameters,
    ) -> AppResult<Persisted<GenerateOutcome>> {
        validation::validate_prompt(prompt, &self.config)?;
        let request = GenerationRequest::Text {
            prompt: prompt.to_string(),
            params,
        };
        self.run_generation(prompt.to_string(), request).await
    }

    /// Generate from uploads; a blank description falls back to a generic prompt
    pub async fn generate_images(
        &mut self,
        files: Vec<ImageFile>,
        description: &str,
        params: StyleParameters,
    ) -> AppResult<Persisted<GenerateOutcome>> {
        validation::validate_description(description, &self.config)?;
        validation::validate_images(&files, &self.config)?;
        let prompt = match description.trim() {
            "" => DEFAULT_IMAGE_PROMPT.to_string(),
            trimmed => trimmed.to_string(),
        };
        let request = GenerationRequest::Image { files, params };
        self.run_generation(prompt, request).await
    }

    /// Gate, generate, then consume one unit and file the result under the current project.
    ///
    /// `saved` carries the first failed write among quota, project and navigation state.
    async fn run_generation(
        &mut self,
        prompt: String,
        request: GenerationRequest,
    ) -> AppResult<Persisted<GenerateOutcome>> {
        if !self.quota.can_generate() {
            tracing::info!("Generation refused, daily quota exhausted");
            self.quota_exceeded.store(true, Ordering::SeqCst);
            return Ok(Persisted::new(GenerateOutcome::QuotaExceeded, Ok(())));
        }

        let kind = request.kind();
        let style = request.params().clone();
        let output = match self.generator.generate(request).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("Generation failed: {}", e);
                self.mark_current_project_failed();
                return Err(e.into());
            }
        };

        // Only a finished generation counts against the allowance
        let consumed = self.quota.consume();

        let mut result = GenerationResult::new(prompt, kind, style);
        result.texts = output.texts;
        result.images = output.images;

        let selected = self
            .current_project
            .filter(|id| self.projects.project(*id).is_some());
        let (project_id, created) = match selected {
            Some(id) => (id, Ok(())),
            None => {
                let name = format!("Untitled {}", result.created_at.format("%Y-%m-%d %H:%M"));
                let project = self.create_project(&name);
                (project.value, project.saved)
            }
        };
        let recorded = self
            .projects
            .save_generation_result(project_id, result.clone())?;
        tracing::info!("Generation {} saved to project {}", result.id, project_id);

        let navigated = self.navigation.navigate(Destination::Results, &mut self.quota);

        let saved = consumed
            .saved
            .and(created)
            .and(recorded.saved)
            .and(navigated.saved);
        Ok(Persisted::new(GenerateOutcome::Completed(result), saved))
    }

    fn mark_current_project_failed(&mut self) {
        let Some(id) = self.current_project else {
            return;
        };
        if self.projects.project(id).is_none() {
            return;
        }
        // Save failures are logged by the repository
        let _ = self.projects.set_status(id, ProjectStatus::Failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::modules::generator::{GenerationOutput, MockGenerator};
    use crate::modules::storage::tests::BrokenStore;
    use crate::modules::validation::tests::{jpeg, png};
    use crate::utils::ManualClock;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::AtomicUsize;

    struct CountingGenerator {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Generator for CountingGenerator {
        async fn generate(
            &self,
            _request: GenerationRequest,
        ) -> Result<GenerationOutput, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GenerationError::ServiceUnavailable("offline".to_string()));
            }
            Ok(GenerationOutput {
                texts: vec!["Generated text".to_string()],
                images: Vec::new(),
            })
        }
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 10, 8, 9, 0, 0).unwrap(),
        ))
    }

    fn coordinator(limit: u32, generator: Arc<dyn Generator>) -> AppCoordinator {
        let config = AppConfig {
            daily_generation_limit: limit,
            ..AppConfig::default()
        };
        AppCoordinator::new(config, StateStorage::in_memory(), clock(), generator)
    }

    #[test]
    fn test_exhausted_quota_redirects_image_upload() {
        let mut app = coordinator(2, Arc::new(MockGenerator::new()));
        assert!(app.quota.consume().value);
        assert!(app.quota.consume().value);
        assert_eq!(app.quota().used_today, 2);
        assert!(!app.quota.can_generate());

        let outcome = app.navigate(Destination::ImageUpload).into_inner();
        assert!(outcome.is_redirected());
        assert_eq!(app.current(), Destination::UpgradeRequired);
        assert_eq!(
            app.navigation().stack().entries(),
            &[Destination::Dashboard, Destination::UpgradeRequired]
        );
        assert!(app.is_quota_exceeded());

        app.dismiss_quota_exceeded_alert();
        assert!(!app.is_quota_exceeded());
    }

    #[tokio::test]
    async fn test_generate_text_consumes_and_records() {
        let mut app = coordinator(5, Arc::new(MockGenerator::new()));
        app.navigate(Destination::TextGeneration).into_inner();

        let outcome = app
            .generate_text("Launch copy for our brand", StyleParameters::default())
            .await
            .unwrap();
        assert!(outcome.is_saved());
        let GenerateOutcome::Completed(result) = outcome.into_inner() else {
            panic!("expected a completed generation");
        };

        assert_eq!(app.quota().used_today, 1);
        assert_eq!(app.current(), Destination::Results);
        let project = app.current_project().unwrap();
        assert_eq!(project.results.len(), 1);
        assert_eq!(project.results[0].id, result.id);
        assert!(!result.texts.is_empty());
    }

    #[tokio::test]
    async fn test_generate_when_exhausted_skips_generator() {
        let generator = Arc::new(CountingGenerator {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let mut app = coordinator(1, generator.clone());

        let first = app.generate_text("one", StyleParameters::default()).await.unwrap();
        assert!(matches!(first.value, GenerateOutcome::Completed(_)));

        let second = app.generate_text("two", StyleParameters::default()).await.unwrap();
        assert_eq!(second.into_inner(), GenerateOutcome::QuotaExceeded);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(app.quota().used_today, 1);
        assert!(app.is_quota_exceeded());
    }

    #[tokio::test]
    async fn test_failed_generation_does_not_consume() {
        let mut app = coordinator(
            3,
            Arc::new(CountingGenerator {
                calls: AtomicUsize::new(0),
                fail: true,
            }),
        );
        let err = app
            .generate_text("prompt", StyleParameters::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Generation(GenerationError::ServiceUnavailable(_))
        ));
        assert_eq!(app.quota().used_today, 0);
        assert!(app.projects().is_empty());
    }

    #[tokio::test]
    async fn test_failed_generation_marks_selected_project() {
        let mut app = coordinator(
            3,
            Arc::new(CountingGenerator {
                calls: AtomicUsize::new(0),
                fail: true,
            }),
        );
        let id = app.create_project("Launch").into_inner();
        assert!(app.generate_text("prompt", StyleParameters::default()).await.is_err());
        assert_eq!(app.projects.project(id).unwrap().status, ProjectStatus::Failed);
    }

    #[tokio::test]
    async fn test_generation_reports_save_failure() {
        let config = AppConfig {
            daily_generation_limit: 3,
            ..AppConfig::default()
        };
        let mut app = AppCoordinator::new(
            config,
            StateStorage::new(Arc::new(BrokenStore)),
            clock(),
            Arc::new(MockGenerator::new()),
        );

        let outcome = app
            .generate_text("hello", StyleParameters::default())
            .await
            .unwrap();
        assert!(!outcome.is_saved());
        assert!(matches!(outcome.saved, Err(AppError::Storage(_))));
        assert!(matches!(outcome.value, GenerateOutcome::Completed(_)));

        // In-memory state still moved forward
        assert_eq!(app.quota().used_today, 1);
        assert_eq!(app.current(), Destination::Results);
        assert_eq!(app.projects().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_prompt_does_not_consume() {
        let mut app = coordinator(3, Arc::new(MockGenerator::new()));
        let err = app
            .generate_text(&"x".repeat(501), StyleParameters::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Generation(GenerationError::PromptTooLong { .. })
        ));
        assert_eq!(app.quota().used_today, 0);
    }

    #[tokio::test]
    async fn test_generate_images_into_selected_project() {
        let mut app = coordinator(3, Arc::new(MockGenerator::new()));
        let id = app.create_project("Moodboard").into_inner();

        let outcome = app
            .generate_images(
                vec![jpeg("a.jpg"), png("b.png")],
                "  Autumn moodboard ",
                StyleParameters::default(),
            )
            .await
            .unwrap();
        let GenerateOutcome::Completed(result) = outcome.into_inner() else {
            panic!("expected a completed generation");
        };
        assert_eq!(result.images, vec![jpeg("a.jpg").bytes, png("b.png").bytes]);
        assert_eq!(result.prompt, "Autumn moodboard");
        assert_eq!(app.current_project().unwrap().id, id);
        assert_eq!(app.projects().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_description_uses_default_prompt() {
        let mut app = coordinator(3, Arc::new(MockGenerator::new()));
        let outcome = app
            .generate_images(vec![jpeg("a.jpg")], "   ", StyleParameters::default())
            .await
            .unwrap();
        let GenerateOutcome::Completed(result) = outcome.into_inner() else {
            panic!("expected a completed generation");
        };
        assert_eq!(result.prompt, DEFAULT_IMAGE_PROMPT);
    }

    #[tokio::test]
    async fn test_long_description_rejected_before_generation() {
        let mut app = coordinator(3, Arc::new(MockGenerator::new()));
        let err = app
            .generate_images(vec![jpeg("a.jpg")], &"d".repeat(201), StyleParameters::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Generation(GenerationError::DescriptionTooLong {
                length: 201,
                limit: 200
            })
        ));
        assert_eq!(app.quota().used_today, 0);
    }

    #[test]
    fn test_quota_status_levels() {
        let mut app = coordinator(10, Arc::new(MockGenerator::new()));
        assert_eq!(app.quota_status().level, QuotaLevel::Normal);

        for _ in 0..9 {
            app.quota.consume().into_inner();
        }
        let status = app.quota_status();
        assert_eq!(status.level, QuotaLevel::Warning);
        assert_eq!(status.remaining, 1);
        assert!(app.announce_quota_status().starts_with("1 of 10 generations left today"));

        app.quota.consume().into_inner();
        assert_eq!(app.quota_status().level, QuotaLevel::Exhausted);

        assert!(app.upgrade(20).is_saved());
        assert_eq!(app.quota_status().remaining, 10);
    }

    #[test]
    fn test_announce_reset_time() {
        let mut app = coordinator(50, Arc::new(MockGenerator::new()));
        // Fresh quota resets 24 hours after creation
        assert_eq!(
            app.announce_quota_status(),
            "50 of 50 generations left today, resets in 24h 00m"
        );
    }

    #[test]
    fn test_select_unknown_project() {
        let mut app = coordinator(5, Arc::new(MockGenerator::new()));
        assert!(app.select_project(Uuid::new_v4()).is_err());
    }
}
