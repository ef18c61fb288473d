use uuid::Uuid;

use super::storage::{Persisted, StateStorage};
use crate::error::{AppError, AppResult};
use crate::models::{GenerationResult, Project, ProjectStatus};

/// Projects and their generation results, persisted as one list
pub struct ProjectRepository {
    projects: Vec<Project>,
    storage: StateStorage,
}

impl ProjectRepository {
    pub fn load(storage: StateStorage) -> Self {
        let projects = storage.load_projects().unwrap_or_default();
        tracing::debug!("Loaded {} projects", projects.len());
        Self { projects, storage }
    }

    pub fn fetch_projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, id: Uuid) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Insert, or replace the project with the same id
    pub fn save_project(&mut self, project: Project) -> Persisted<Uuid> {
        let id = project.id;
        match self.projects.iter_mut().find(|p| p.id == id) {
            Some(existing) => *existing = project,
            None => self.projects.push(project),
        }
        Persisted::new(id, self.save())
    }

    pub fn save_generation_result(
        &mut self,
        project_id: Uuid,
        result: GenerationResult,
    ) -> AppResult<Persisted<()>> {
        let project = self.project_mut(project_id)?;
        project.results.push(result);
        project.status = ProjectStatus::Completed;
        Ok(Persisted::new((), self.save()))
    }

    pub fn fetch_generation_results(&self, project_id: Uuid) -> AppResult<&[GenerationResult]> {
        self.project(project_id)
            .map(|p| p.results.as_slice())
            .ok_or_else(|| AppError::Project(format!("Project does not exist: {}", project_id)))
    }

    pub fn set_status(&mut self, project_id: Uuid, status: ProjectStatus) -> AppResult<Persisted<()>> {
        self.project_mut(project_id)?.status = status;
        Ok(Persisted::new((), self.save()))
    }

    fn project_mut(&mut self, id: Uuid) -> AppResult<&mut Project> {
        self.projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::Project(format!("Project does not exist: {}", id)))
    }

    fn save(&self) -> AppResult<()> {
        let saved = self.storage.save_projects(&self.projects);
        if let Err(e) = &saved {
            tracing::warn!("Failed to persist projects: {}", e);
        }
        saved
    }
}
