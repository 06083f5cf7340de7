// src/services/user_service.rs

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{
        user_repo::{NewUser, UserChanges},
        UserRepository,
    },
    models::{
        audit::{AuditAction, NewAuditEntry},
        auth::AuthContext,
        user::{
            CreateUserPayload, Role, SuperiorCandidates, UpdateUserPayload, User, UserProfile,
            UserStatus, UserSummary,
        },
    },
    services::{
        access::{AccessGate, Action, Resource},
        auth::{hash_password, temporary_password},
        hierarchy::{reselect_superior, HierarchyTree, SuperiorSelection},
        load_tree, AuditService,
    },
};

const RESOURCE: &str = "USER";

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    audit: AuditService,
    pool: PgPool,
}

impl UserService {
    pub fn new(user_repo: UserRepository, audit: AuditService, pool: PgPool) -> Self {
        Self { user_repo, audit, pool }
    }

    async fn find(&self, id: Uuid) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Usuário"))
    }

    pub async fn list(&self, ctx: &AuthContext) -> Result<Vec<User>, AppError> {
        let tree = load_tree(&self.user_repo, &self.pool).await?;
        let visible = AccessGate::new(&tree).visible_users(ctx);
        self.user_repo.list(&self.pool, visible.user_ids()).await
    }

    pub async fn get(&self, ctx: &AuthContext, id: Uuid) -> Result<User, AppError> {
        let tree = load_tree(&self.user_repo, &self.pool).await?;
        AccessGate::new(&tree).ensure_view(ctx, Resource::User { id })?;
        self.find(id).await
    }

    pub async fn create(&self, ctx: &AuthContext, payload: CreateUserPayload) -> Result<User, AppError> {
        payload.validate()?;

        let tree = load_tree(&self.user_repo, &self.pool).await?;
        let gate = AccessGate::new(&tree);

        // Sem superior informado, quem cadastra assume o papel (exceto Global criando Global).
        let superior_user_id = match payload.superior_user_id {
            Some(id) => Some(id),
            None if payload.role == Role::Global => None,
            None if ctx.role.outranks(payload.role) => Some(ctx.user_id),
            None => None,
        };

        gate.ensure(ctx, Action::CreateUser { role: payload.role, superior_user_id })?;
        tree.validate_superior(payload.role, superior_user_id, None)?;

        let password = match payload.password.as_deref() {
            Some(password) => password.to_string(),
            None => temporary_password(&payload.email),
        };
        let password_hash = hash_password(&password).await?;

        let user = self
            .user_repo
            .create(
                &self.pool,
                &NewUser {
                    full_name: payload.full_name.trim(),
                    email: payload.email.trim(),
                    role: payload.role,
                    superior_user_id,
                    password_hash: &password_hash,
                    cpf_cnpj: payload.cpf_cnpj.as_deref(),
                    phone: payload.phone.as_deref(),
                    company_name: payload.company_name.as_deref(),
                    pix: payload.pix.as_deref(),
                    pix_key_type: payload.pix_key_type.as_deref(),
                },
            )
            .await?;

        tracing::info!("✅ Usuário {} ({}) criado por {}", user.email, user.role, ctx.user_id);
        self.audit
            .record(
                NewAuditEntry::new(ctx.user_id, AuditAction::Create, RESOURCE, "Usuário criado")
                    .resource(user.id, user.full_name.clone())
                    .new_values(serde_json::to_value(&user).unwrap_or_default()),
            )
            .await;

        Ok(user)
    }

    pub async fn update(&self, ctx: &AuthContext, id: Uuid, payload: UpdateUserPayload) -> Result<User, AppError> {
        payload.validate()?;

        let current = self.find(id).await?;
        let tree = load_tree(&self.user_repo, &self.pool).await?;
        let gate = AccessGate::new(&tree);
        gate.ensure(ctx, Action::UpdateUser { target: id })?;

        let new_role = payload.role.unwrap_or(current.role);
        let new_status = payload.status.unwrap_or(current.status);
        let role_changed = new_role != current.role;

        if ctx.user_id == id && (role_changed || new_status != current.status || payload.superior_user_id.is_some()) {
            return Err(AppError::denied("Você não pode alterar a própria role, status ou superior."));
        }
        if role_changed {
            gate.ensure(ctx, Action::ChangeUserRole { target: id, new_role })?;
            ensure_subordinates_fit(&tree, id, new_role)?;
        }

        let superior_user_id = match payload.superior_user_id {
            Some(explicit) => explicit,
            None if role_changed => {
                let current_superior = current.superior_user_id.and_then(|sid| tree.get(sid));
                let candidates = tree.superior_candidates(new_role, Some(id));
                match reselect_superior(new_role, current_superior, &candidates) {
                    SuperiorSelection::NeedsManualSelection => {
                        return Err(AppError::rule(format!(
                            "O superior atual não é válido para a role {}. Selecione um novo superior.",
                            new_role
                        )));
                    }
                    selection => {
                        if let SuperiorSelection::AutoSelected(sid) = selection {
                            tracing::info!("🔄 Superior {} selecionado automaticamente para {}", sid, id);
                        }
                        selection.superior_id()
                    }
                }
            }
            None => current.superior_user_id,
        };

        if superior_user_id != current.superior_user_id {
            if let Some(sid) = superior_user_id {
                gate.ensure_view(ctx, Resource::User { id: sid })?;
            }
        }
        tree.validate_superior(new_role, superior_user_id, Some(id))?;

        let changes = UserChanges {
            full_name: payload.full_name.map(|n| n.trim().to_string()).unwrap_or_else(|| current.full_name.clone()),
            role: new_role,
            superior_user_id,
            status: new_status,
            phone: payload.phone.or_else(|| current.phone.clone()),
            company_name: payload.company_name.or_else(|| current.company_name.clone()),
            pix: payload.pix.or_else(|| current.pix.clone()),
            pix_key_type: payload.pix_key_type.or_else(|| current.pix_key_type.clone()),
        };

        let updated = self.user_repo.update(&self.pool, id, &changes).await?;

        tracing::info!("✅ Usuário {} atualizado por {}", id, ctx.user_id);
        self.audit
            .record(
                NewAuditEntry::new(ctx.user_id, AuditAction::Update, RESOURCE, "Usuário atualizado")
                    .resource(updated.id, updated.full_name.clone())
                    .old_values(serde_json::to_value(&current).unwrap_or_default())
                    .new_values(serde_json::to_value(&updated).unwrap_or_default()),
            )
            .await;

        Ok(updated)
    }

    /// Padrão: desativa (status = inactive). `hard` remove a linha quando não
    /// há subordinados nem vínculos.
    pub async fn delete(&self, ctx: &AuthContext, id: Uuid, hard: bool) -> Result<(), AppError> {
        let current = self.find(id).await?;
        let tree = load_tree(&self.user_repo, &self.pool).await?;
        AccessGate::new(&tree).ensure(ctx, Action::DeleteUser { target: id })?;

        if hard {
            if !tree.direct_subordinates(id).is_empty() {
                return Err(AppError::Conflict(
                    "O usuário possui subordinados. Reatribua-os antes de excluir.".into(),
                ));
            }
            self.user_repo.delete(&self.pool, id).await?;
        } else {
            self.user_repo.set_status(&self.pool, id, UserStatus::Inactive).await?;
        }

        let description = if hard { "Usuário excluído" } else { "Usuário desativado" };
        tracing::info!("🗑️ {} {} por {}", description, id, ctx.user_id);
        self.audit
            .record(
                NewAuditEntry::new(ctx.user_id, AuditAction::Delete, RESOURCE, description)
                    .resource(current.id, current.full_name.clone())
                    .old_values(serde_json::to_value(&current).unwrap_or_default()),
            )
            .await;

        Ok(())
    }

    /// Perfil do chamador com a cadeia de superiores resolvida.
    pub async fn profile(&self, ctx: &AuthContext) -> Result<UserProfile, AppError> {
        let user = self.find(ctx.user_id).await?;
        let tree = load_tree(&self.user_repo, &self.pool).await?;

        let chain: Vec<Uuid> = tree
            .resolve_superior_chain(user.id)?
            .iter()
            .map(|node| node.id)
            .collect();
        let superiors = self.ordered_summaries(&chain).await?;

        Ok(UserProfile {
            direct_subordinates: tree.direct_subordinates(user.id).len(),
            total_subordinates: tree.resolve_descendants(user.id).len(),
            superiors,
            user,
        })
    }

    async fn ordered_summaries(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>, AppError> {
        let mut by_id: HashMap<Uuid, UserSummary> = self
            .user_repo
            .summaries(&self.pool, ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// Candidatos a superior de `user_id` caso ele passe a ter `role`.
    pub async fn superior_candidates(
        &self,
        ctx: &AuthContext,
        user_id: Uuid,
        role: Role,
    ) -> Result<SuperiorCandidates, AppError> {
        let tree = load_tree(&self.user_repo, &self.pool).await?;
        let gate = AccessGate::new(&tree);
        gate.ensure_view(ctx, Resource::User { id: user_id })?;

        let visible = gate.visible_users(ctx);
        let ids: Vec<Uuid> = tree
            .superior_candidates(role, Some(user_id))
            .into_iter()
            .filter(|node| visible.allows(node.id))
            .map(|node| node.id)
            .collect();

        let candidates = self.ordered_summaries(&ids).await?;
        let auto_selected = match candidates.as_slice() {
            [only] => Some(only.id),
            _ => None,
        };

        Ok(SuperiorCandidates { role, candidates, auto_selected })
    }
}

/// Ao mudar a role, os subordinados diretos precisam continuar abaixo dela.
fn ensure_subordinates_fit(tree: &HierarchyTree, user_id: Uuid, new_role: Role) -> Result<(), AppError> {
    let blocked = tree
        .direct_subordinates(user_id)
        .iter()
        .filter_map(|id| tree.get(*id))
        .filter(|node| !new_role.outranks(node.role))
        .count();

    if blocked > 0 {
        return Err(AppError::rule(format!(
            "{} subordinado(s) direto(s) não podem responder a um {}. Reatribua-os antes.",
            blocked, new_role
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::hierarchy::tests::fixture;

    #[test]
    fn demoting_a_user_with_incompatible_subordinates_is_blocked() {
        let f = fixture();
        // O Escritório tem dois Assessores; virar Assessor deixaria ambos inválidos.
        assert!(ensure_subordinates_fit(&f.tree, f.escritorio, Role::Assessor).is_err());
        assert!(ensure_subordinates_fit(&f.tree, f.escritorio, Role::Master).is_ok());
        assert!(ensure_subordinates_fit(&f.tree, f.investidor, Role::Assessor).is_ok());
    }
}
