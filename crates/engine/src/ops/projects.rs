use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    EngineError, Project, ProjectStatus, ResultEngine, projects,
    ranking::{Direction, Ranking},
    util::{
        normalize_currency, normalize_optional_text, normalize_required_name, now_timestamp,
        validate_amount,
    },
};

use super::{
    Engine,
    savings::{account_balance, require_account},
    with_tx,
};

#[derive(Clone, Debug, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub target_amount: f64,
    #[serde(default)]
    pub status: ProjectStatus,
    pub savings_account_id: Option<i32>,
    pub currency: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub target_amount: Option<f64>,
    pub status: Option<ProjectStatus>,
    pub savings_account_id: Option<i32>,
    pub currency: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    pub savings_account_id: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProjectProgress {
    pub project_id: i32,
    pub target_amount: f64,
    /// Balance of the linked account, contributions included.
    pub current_balance: f64,
    /// `0..=100`.
    pub progress_percentage: f64,
    pub status: String,
}

/// Insert a project at the end of the global ranking.
pub(crate) async fn append_project<C: ConnectionTrait>(
    db: &C,
    mut model: projects::ActiveModel,
) -> ResultEngine<Project> {
    let priority = Ranking::projects().max(db).await? + 1;
    model.priority_order = ActiveValue::Set(priority);
    Ok(model.insert(db).await?)
}

impl Engine {
    /// Projects in priority order.
    pub async fn projects(&self, filter: ProjectFilter) -> ResultEngine<Vec<Project>> {
        let mut query = projects::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(projects::Column::Status.eq(status.as_str()));
        }
        if let Some(account_id) = filter.savings_account_id {
            query = query.filter(projects::Column::SavingsAccountId.eq(account_id));
        }
        Ok(query
            .order_by_asc(projects::Column::PriorityOrder)
            .all(&self.database)
            .await?)
    }

    pub async fn project(&self, id: i32) -> ResultEngine<Option<Project>> {
        Ok(projects::Entity::find_by_id(id)
            .one(&self.database)
            .await?)
    }

    pub async fn create_project(&self, project: NewProject) -> ResultEngine<Project> {
        let name = normalize_required_name(&project.name, "project name")?;
        let target_amount = validate_amount(project.target_amount, "Project target_amount")?;
        let currency = normalize_currency(project.currency.as_deref())?;
        with_tx!(self, |db_tx| {
            if let Some(account_id) = project.savings_account_id {
                require_account(&db_tx, account_id).await?;
            }
            let model = projects::ActiveModel {
                name: ActiveValue::Set(name),
                description: ActiveValue::Set(normalize_optional_text(
                    project.description.as_deref(),
                )),
                target_amount: ActiveValue::Set(target_amount),
                status: ActiveValue::Set(project.status.as_str().to_string()),
                savings_account_id: ActiveValue::Set(project.savings_account_id),
                currency: ActiveValue::Set(currency),
                created_at: ActiveValue::Set(now_timestamp()),
                updated_at: ActiveValue::Set(None),
                ..Default::default()
            };
            append_project(&db_tx, model).await
        })
    }

    pub async fn update_project(
        &self,
        id: i32,
        patch: ProjectPatch,
    ) -> ResultEngine<Option<Project>> {
        let name = patch
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "project name"))
            .transpose()?;
        let target_amount = patch
            .target_amount
            .map(|amount| validate_amount(amount, "Project target_amount"))
            .transpose()?;
        let currency = patch
            .currency
            .as_deref()
            .map(|currency| normalize_currency(Some(currency)))
            .transpose()?;
        with_tx!(self, |db_tx| {
            let Some(existing) = projects::Entity::find_by_id(id).one(&db_tx).await? else {
                return Ok(None);
            };
            let mut model: projects::ActiveModel = existing.into();
            if let Some(account_id) = patch.savings_account_id {
                require_account(&db_tx, account_id).await?;
                model.savings_account_id = ActiveValue::Set(Some(account_id));
            }
            if let Some(name) = name {
                model.name = ActiveValue::Set(name);
            }
            if let Some(description) = patch.description.as_deref() {
                model.description = ActiveValue::Set(normalize_optional_text(Some(description)));
            }
            if let Some(target_amount) = target_amount {
                model.target_amount = ActiveValue::Set(target_amount);
            }
            if let Some(status) = patch.status {
                model.status = ActiveValue::Set(status.as_str().to_string());
            }
            if let Some(currency) = currency {
                model.currency = ActiveValue::Set(currency);
            }
            model.updated_at = ActiveValue::Set(Some(now_timestamp()));
            Ok(Some(model.update(&db_tx).await?))
        })
    }

    /// Remaining projects are renumbered to `1..=n`.
    pub async fn delete_project(&self, id: i32) -> ResultEngine<bool> {
        with_tx!(self, |db_tx| {
            let deleted = projects::Entity::delete_by_id(id).exec(&db_tx).await?;
            if deleted.rows_affected == 0 {
                return Ok(false);
            }
            Ranking::projects().compact(&db_tx).await?;
            Ok(true)
        })
    }

    /// Move a project to `priority`, sliding the ones in between by one.
    /// Priorities past the end are clamped to the last slot.
    pub async fn reorder_project(&self, id: i32, priority: i32) -> ResultEngine<Option<Project>> {
        if priority < 1 {
            return Err(EngineError::Validation(
                "priority_order must be at least 1".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let Some(existing) = projects::Entity::find_by_id(id).one(&db_tx).await? else {
                return Ok(None);
            };
            let ranking = Ranking::projects();
            let target = priority.min(ranking.len(&db_tx).await?);
            ranking
                .move_to(&db_tx, id, existing.priority_order, target)
                .await?;
            Ok(projects::Entity::find_by_id(id).one(&db_tx).await?)
        })
    }

    /// Trade places with the neighbouring project.
    pub async fn swap_project_priority(
        &self,
        id: i32,
        direction: Direction,
    ) -> ResultEngine<Option<Project>> {
        with_tx!(self, |db_tx| {
            let Some(existing) = projects::Entity::find_by_id(id).one(&db_tx).await? else {
                return Ok(None);
            };
            Ranking::projects()
                .swap(&db_tx, id, existing.priority_order, direction)
                .await?;
            Ok(projects::Entity::find_by_id(id).one(&db_tx).await?)
        })
    }

    /// How far the linked account is towards the project's target.
    pub async fn calculate_project_progress(&self, id: i32) -> ResultEngine<ProjectProgress> {
        let project = self
            .project(id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("project {id}")))?;

        let account = match project.savings_account_id {
            Some(account_id) => self.savings_account(account_id).await?,
            None => None,
        };
        let current_balance = match account {
            Some(account) => account_balance(&self.database, &account).await?,
            None => 0.0,
        };
        let progress_percentage = if project.target_amount > 0.0 {
            (current_balance / project.target_amount * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        Ok(ProjectProgress {
            project_id: project.id,
            target_amount: project.target_amount,
            current_balance,
            progress_percentage,
            status: project.status,
        })
    }
}
