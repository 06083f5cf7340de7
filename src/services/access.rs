// src/services/access.rs
//
// Quem pode ver ou alterar o quê, a partir da posição na árvore.
// Global vê tudo; os demais veem a própria subárvore (e a si mesmos).

use std::collections::HashSet;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{auth::AuthContext, user::Role},
    services::hierarchy::HierarchyTree,
};

/// Registro sobre o qual se pergunta "posso ver?".
#[derive(Debug, Clone, Copy)]
pub enum Resource {
    User { id: Uuid },
    Investment { investor_user_id: Uuid, assessor_user_id: Uuid },
    /// Comissão ou remuneração: o dono é o beneficiário.
    Payment { owner_user_id: Uuid },
    Catalog,
}

#[derive(Debug, Clone, Copy)]
pub enum Action {
    CreateUser { role: Role, superior_user_id: Option<Uuid> },
    UpdateUser { target: Uuid },
    ChangeUserRole { target: Uuid, new_role: Role },
    DeleteUser { target: Uuid },
    CreateInvestment { investor_user_id: Uuid },
    ManageInvestment,
    ManageCatalog,
    UpdatePaymentStatus,
    ImportPayments,
}

/// Conjunto de usuários cujos registros o chamador enxerga.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    All,
    Only(HashSet<Uuid>),
}

impl Visibility {
    pub fn allows(&self, user_id: Uuid) -> bool {
        match self {
            Visibility::All => true,
            Visibility::Only(ids) => ids.contains(&user_id),
        }
    }

    /// Lista para filtros `= ANY($n)` no SQL. `None` significa sem filtro.
    pub fn user_ids(&self) -> Option<Vec<Uuid>> {
        match self {
            Visibility::All => None,
            Visibility::Only(ids) => Some(ids.iter().copied().collect()),
        }
    }
}

pub struct AccessGate<'a> {
    tree: &'a HierarchyTree,
}

impl<'a> AccessGate<'a> {
    pub fn new(tree: &'a HierarchyTree) -> Self {
        Self { tree }
    }

    fn in_subtree(&self, caller: &AuthContext, user_id: Uuid) -> bool {
        caller.user_id == user_id || self.tree.is_descendant(caller.user_id, user_id)
    }

    fn strictly_below(&self, caller: &AuthContext, user_id: Uuid) -> bool {
        caller.user_id != user_id && self.tree.is_descendant(caller.user_id, user_id)
    }

    pub fn visible_users(&self, caller: &AuthContext) -> Visibility {
        if caller.is_global() {
            return Visibility::All;
        }
        let mut ids = self.tree.resolve_descendants(caller.user_id);
        ids.insert(caller.user_id);
        Visibility::Only(ids)
    }

    pub fn can_view(&self, caller: &AuthContext, resource: Resource) -> bool {
        if caller.is_global() {
            return true;
        }
        match resource {
            Resource::Catalog => true,
            Resource::User { id } => self.in_subtree(caller, id),
            Resource::Investment { investor_user_id, assessor_user_id } => {
                assessor_user_id == caller.user_id || self.in_subtree(caller, investor_user_id)
            }
            Resource::Payment { owner_user_id } => self.in_subtree(caller, owner_user_id),
        }
    }

    /// Roles que o chamador pode atribuir ao criar ou editar usuários.
    pub fn can_assign_role(&self, caller: &AuthContext, role: Role) -> bool {
        match caller.role {
            Role::Global => true,
            Role::Master | Role::Escritorio => caller.role.outranks(role),
            Role::Assessor => role == Role::Investidor,
            Role::Investidor => false,
        }
    }

    pub fn can_mutate(&self, caller: &AuthContext, action: Action) -> bool {
        match action {
            Action::CreateUser { role, superior_user_id } => {
                if !self.can_assign_role(caller, role) {
                    return false;
                }
                caller.is_global()
                    || superior_user_id.is_some_and(|superior| self.in_subtree(caller, superior))
            }
            Action::UpdateUser { target } => caller.is_global() || self.in_subtree(caller, target),
            Action::ChangeUserRole { target, new_role } => {
                caller.is_global()
                    || (self.strictly_below(caller, target) && self.can_assign_role(caller, new_role))
            }
            Action::DeleteUser { target } => {
                caller.user_id != target
                    && (caller.is_global()
                        || (caller.role != Role::Investidor && self.strictly_below(caller, target)))
            }
            Action::CreateInvestment { investor_user_id } => {
                caller.role != Role::Investidor
                    && (caller.is_global() || self.strictly_below(caller, investor_user_id))
            }
            Action::ManageInvestment
            | Action::ManageCatalog
            | Action::UpdatePaymentStatus
            | Action::ImportPayments => caller.is_global(),
        }
    }

    pub fn ensure_view(&self, caller: &AuthContext, resource: Resource) -> Result<(), AppError> {
        if self.can_view(caller, resource) {
            Ok(())
        } else {
            Err(AppError::denied("Você não tem permissão para visualizar este registro."))
        }
    }

    pub fn ensure(&self, caller: &AuthContext, action: Action) -> Result<(), AppError> {
        if self.can_mutate(caller, action) {
            return Ok(());
        }
        let message = match action {
            Action::CreateUser { role, .. } => {
                format!("Usuários {} não podem criar usuários {}.", caller.role, role)
            }
            Action::UpdateUser { .. } => "Usuário fora da sua hierarquia.".to_string(),
            Action::ChangeUserRole { new_role, .. } => {
                format!("Você não pode atribuir a role {}.", new_role)
            }
            Action::DeleteUser { .. } => "Você não pode excluir este usuário.".to_string(),
            Action::CreateInvestment { .. } => {
                "Investimentos só podem ser criados para investidores da sua hierarquia.".to_string()
            }
            Action::ManageInvestment => {
                "Apenas usuários Global podem alterar investimentos.".to_string()
            }
            Action::ManageCatalog => {
                "Apenas usuários Global podem gerenciar debêntures e séries.".to_string()
            }
            Action::UpdatePaymentStatus | Action::ImportPayments => {
                "Apenas usuários Global podem atualizar pagamentos.".to_string()
            }
        };
        Err(AppError::denied(message))
    }
}

/// Ações exclusivas do Global não dependem da posição na árvore.
pub fn require_global(caller: &AuthContext, action: Action) -> Result<(), AppError> {
    AccessGate::new(&HierarchyTree::default()).ensure(caller, action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::hierarchy::tests::fixture;

    fn ctx(id: Uuid, role: Role) -> AuthContext {
        AuthContext::new(id, role)
    }

    #[test]
    fn investidor_cannot_view_another_investidor() {
        let f = fixture();
        let gate = AccessGate::new(&f.tree);
        let caller = ctx(f.investidor, Role::Investidor);

        assert!(!gate.can_view(&caller, Resource::User { id: f.outro_investidor }));
        assert!(gate.can_view(&caller, Resource::User { id: f.investidor }));
        assert!(gate.ensure_view(&caller, Resource::User { id: f.outro_investidor }).is_err());
    }

    #[test]
    fn subtree_visibility_per_role() {
        let f = fixture();
        let gate = AccessGate::new(&f.tree);

        let assessor = ctx(f.assessor, Role::Assessor);
        assert!(gate.can_view(&assessor, Resource::User { id: f.investidor }));
        assert!(!gate.can_view(&assessor, Resource::User { id: f.outro_investidor }));
        assert!(!gate.can_view(&assessor, Resource::User { id: f.escritorio }));

        let escritorio = ctx(f.escritorio, Role::Escritorio);
        assert!(gate.can_view(&escritorio, Resource::Payment { owner_user_id: f.outro_investidor }));
        assert!(!gate.can_view(&escritorio, Resource::Payment { owner_user_id: f.master }));

        let global = ctx(f.global, Role::Global);
        assert_eq!(gate.visible_users(&global), Visibility::All);
        match gate.visible_users(&assessor) {
            Visibility::Only(ids) => {
                assert_eq!(ids, HashSet::from([f.assessor, f.investidor]));
            }
            Visibility::All => panic!("assessor não deveria ver tudo"),
        }
    }

    #[test]
    fn investment_assessor_always_sees_it() {
        let f = fixture();
        let gate = AccessGate::new(&f.tree);
        // Investidor de outra subárvore, mas o assessor do investimento é o chamador.
        let resource = Resource::Investment {
            investor_user_id: f.outro_investidor,
            assessor_user_id: f.assessor,
        };
        assert!(gate.can_view(&ctx(f.assessor, Role::Assessor), resource));
        assert!(!gate.can_view(&ctx(f.investidor, Role::Investidor), resource));
    }

    #[test]
    fn user_creation_follows_role_table() {
        let f = fixture();
        let gate = AccessGate::new(&f.tree);

        let assessor = ctx(f.assessor, Role::Assessor);
        assert!(gate.can_mutate(
            &assessor,
            Action::CreateUser { role: Role::Investidor, superior_user_id: Some(f.assessor) }
        ));
        assert!(!gate.can_mutate(
            &assessor,
            Action::CreateUser { role: Role::Assessor, superior_user_id: Some(f.assessor) }
        ));

        let master = ctx(f.master, Role::Master);
        assert!(gate.can_mutate(
            &master,
            Action::CreateUser { role: Role::Escritorio, superior_user_id: Some(f.master) }
        ));
        assert!(!gate.can_mutate(
            &master,
            Action::CreateUser { role: Role::Master, superior_user_id: Some(f.global) }
        ));

        let investidor = ctx(f.investidor, Role::Investidor);
        assert!(!gate.can_mutate(
            &investidor,
            Action::CreateUser { role: Role::Investidor, superior_user_id: Some(f.investidor) }
        ));

        let global = ctx(f.global, Role::Global);
        assert!(gate.can_mutate(&global, Action::CreateUser { role: Role::Master, superior_user_id: None }));
    }

    #[test]
    fn catalog_and_payment_changes_are_global_only() {
        let f = fixture();
        let gate = AccessGate::new(&f.tree);
        let master = ctx(f.master, Role::Master);

        let err = gate.ensure(&master, Action::ManageCatalog).unwrap_err();
        assert_eq!(err.code(), "ACCESS_DENIED");
        assert!(!gate.can_mutate(&master, Action::ImportPayments));
        assert!(gate.can_mutate(&ctx(f.global, Role::Global), Action::UpdatePaymentStatus));
    }

    #[test]
    fn investments_only_for_investors_below_the_caller() {
        let f = fixture();
        let gate = AccessGate::new(&f.tree);

        let assessor = ctx(f.assessor, Role::Assessor);
        assert!(gate.can_mutate(&assessor, Action::CreateInvestment { investor_user_id: f.investidor }));
        assert!(!gate.can_mutate(
            &assessor,
            Action::CreateInvestment { investor_user_id: f.outro_investidor }
        ));
        assert!(!gate.can_mutate(
            &ctx(f.investidor, Role::Investidor),
            Action::CreateInvestment { investor_user_id: f.investidor }
        ));
    }

    #[test]
    fn nobody_deletes_themselves() {
        let f = fixture();
        let gate = AccessGate::new(&f.tree);
        assert!(!gate.can_mutate(&ctx(f.global, Role::Global), Action::DeleteUser { target: f.global }));
        assert!(gate.can_mutate(&ctx(f.escritorio, Role::Escritorio), Action::DeleteUser { target: f.investidor }));
        assert!(!gate.can_mutate(&ctx(f.assessor, Role::Assessor), Action::DeleteUser { target: f.escritorio }));
    }
}
