// src/services/hierarchy.rs
//
// Resolução da hierarquia Global → Master → Escritório → Assessor → Investidor.
// A árvore é montada em memória a partir de `UserNode` (id, role, superior),
// então as regras aqui são puras e testáveis sem banco.

use std::collections::{HashMap, HashSet, VecDeque};

use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::user::{Role, UserNode, UserStatus},
};

/// A hierarquia tem 5 níveis fixos: no máximo 4 saltos até o Global.
pub const MAX_CHAIN_HOPS: usize = 4;

/// Roles aceitas como superior direto de `role`.
pub fn valid_superior_roles(role: Role) -> Vec<Role> {
    Role::ALL
        .into_iter()
        .filter(|candidate| candidate.outranks(role))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct HierarchyTree {
    nodes: HashMap<Uuid, UserNode>,
    children: HashMap<Uuid, Vec<Uuid>>,
}

impl HierarchyTree {
    pub fn from_nodes(nodes: impl IntoIterator<Item = UserNode>) -> Self {
        let mut tree = Self::default();
        for node in nodes {
            if let Some(superior) = node.superior_user_id {
                tree.children.entry(superior).or_default().push(node.id);
            }
            tree.nodes.insert(node.id, node);
        }
        tree
    }

    pub fn get(&self, user_id: Uuid) -> Option<&UserNode> {
        self.nodes.get(&user_id)
    }

    pub fn direct_subordinates(&self, user_id: Uuid) -> &[Uuid] {
        self.children.get(&user_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ancestrais de `user_id`, do superior direto até a raiz.
    ///
    /// Para dados corrompidos (ciclo ou cadeia maior que a hierarquia permite)
    /// devolve erro em vez de entrar em loop. Um ponteiro para usuário
    /// inexistente encerra a cadeia.
    pub fn resolve_superior_chain(&self, user_id: Uuid) -> Result<Vec<&UserNode>, AppError> {
        let start = self
            .get(user_id)
            .ok_or_else(|| AppError::not_found(format!("Usuário {}", user_id)))?;

        let mut visited = HashSet::from([user_id]);
        let mut chain = Vec::new();
        let mut next = start.superior_user_id;

        while let Some(superior_id) = next {
            if !visited.insert(superior_id) {
                return Err(AppError::InternalServerError(anyhow::anyhow!(
                    "Ciclo na hierarquia a partir do usuário {}",
                    user_id
                )));
            }
            if chain.len() == MAX_CHAIN_HOPS {
                return Err(AppError::InternalServerError(anyhow::anyhow!(
                    "Cadeia hierárquica do usuário {} excede {} níveis",
                    user_id,
                    MAX_CHAIN_HOPS
                )));
            }
            let Some(superior) = self.get(superior_id) else {
                tracing::warn!("⚠️ Superior {} do usuário {} não existe", superior_id, user_id);
                break;
            };
            chain.push(superior);
            next = superior.superior_user_id;
        }

        Ok(chain)
    }

    /// Todos os usuários cuja cadeia de superiores contém `user_id`.
    pub fn resolve_descendants(&self, user_id: Uuid) -> HashSet<Uuid> {
        let mut found = HashSet::new();
        let mut queue: VecDeque<Uuid> = self.direct_subordinates(user_id).iter().copied().collect();

        while let Some(current) = queue.pop_front() {
            if current == user_id || !found.insert(current) {
                continue;
            }
            queue.extend(self.direct_subordinates(current).iter().copied());
        }

        found
    }

    pub fn is_descendant(&self, ancestor_id: Uuid, user_id: Uuid) -> bool {
        self.resolve_superior_chain(user_id)
            .map(|chain| chain.iter().any(|node| node.id == ancestor_id))
            .unwrap_or(false)
    }

    /// Superior mais próximo de cada role na cadeia de `user_id`. Usado para
    /// denormalizar assessor/escritório/master/global no investimento.
    pub fn superiors_by_role(&self, user_id: Uuid) -> Result<HashMap<Role, Uuid>, AppError> {
        let mut by_role = HashMap::new();
        for node in self.resolve_superior_chain(user_id)? {
            by_role.entry(node.role).or_insert(node.id);
        }
        Ok(by_role)
    }

    /// Usuários ativos que podem ser superior de alguém com `role`. Quando
    /// `for_user` é informado, exclui o próprio usuário e seus descendentes.
    pub fn superior_candidates(&self, role: Role, for_user: Option<Uuid>) -> Vec<&UserNode> {
        let allowed = valid_superior_roles(role);
        let excluded = for_user
            .map(|id| {
                let mut set = self.resolve_descendants(id);
                set.insert(id);
                set
            })
            .unwrap_or_default();

        let mut candidates: Vec<&UserNode> = self
            .nodes
            .values()
            .filter(|node| node.status == UserStatus::Active)
            .filter(|node| allowed.contains(&node.role))
            .filter(|node| !excluded.contains(&node.id))
            .collect();
        candidates.sort_by_key(|node| (node.role, node.id));
        candidates
    }

    /// Valida o superior escolhido para um usuário com `role`.
    ///
    /// Sem superior para uma role não-Global é aceito (com aviso), como no
    /// cadastro original.
    pub fn validate_superior(
        &self,
        role: Role,
        superior_id: Option<Uuid>,
        for_user: Option<Uuid>,
    ) -> Result<(), AppError> {
        let Some(superior_id) = superior_id else {
            if role != Role::Global {
                tracing::warn!("⚠️ Usuário {} sem superior definido", role);
            }
            return Ok(());
        };

        if role == Role::Global {
            return Err(AppError::rule("Usuários Global não possuem superior."));
        }
        if for_user == Some(superior_id) {
            return Err(AppError::rule("Um usuário não pode ser o próprio superior."));
        }

        let superior = self
            .get(superior_id)
            .ok_or_else(|| AppError::not_found("Superior"))?;

        if superior.status != UserStatus::Active {
            return Err(AppError::rule("O superior selecionado está inativo."));
        }
        if !valid_superior_roles(role).contains(&superior.role) {
            return Err(AppError::rule(format!(
                "Um {} não pode ser superior de um {}.",
                superior.role, role
            )));
        }
        if let Some(user_id) = for_user {
            if self.is_descendant(user_id, superior_id) {
                return Err(AppError::rule(
                    "O superior selecionado é subordinado deste usuário.",
                ));
            }
        }
        Ok(())
    }
}

/// Resultado da troca de role: o que fazer com o superior atual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuperiorSelection {
    /// O superior atual continua válido.
    Keep(Uuid),
    /// Havia exatamente um candidato; selecionado automaticamente.
    AutoSelected(Uuid),
    /// Seleção limpa; o chamador precisa escolher manualmente.
    NeedsManualSelection,
    /// Role Global: não tem superior.
    NoSuperior,
}

impl SuperiorSelection {
    pub fn superior_id(self) -> Option<Uuid> {
        match self {
            SuperiorSelection::Keep(id) | SuperiorSelection::AutoSelected(id) => Some(id),
            SuperiorSelection::NeedsManualSelection | SuperiorSelection::NoSuperior => None,
        }
    }
}

pub fn reselect_superior(
    new_role: Role,
    current_superior: Option<&UserNode>,
    candidates: &[&UserNode],
) -> SuperiorSelection {
    if new_role == Role::Global {
        return SuperiorSelection::NoSuperior;
    }

    if let Some(current) = current_superior {
        if valid_superior_roles(new_role).contains(&current.role) {
            return SuperiorSelection::Keep(current.id);
        }
    }

    match candidates {
        [only] => SuperiorSelection::AutoSelected(only.id),
        _ => SuperiorSelection::NeedsManualSelection,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn node(role: Role, superior: Option<Uuid>) -> UserNode {
        UserNode {
            id: Uuid::new_v4(),
            role,
            superior_user_id: superior,
            status: UserStatus::Active,
        }
    }

    /// Global → Master → Escritório → Assessor → Investidor, mais um segundo
    /// investidor e um segundo assessor sem subordinados.
    pub(crate) struct Fixture {
        pub tree: HierarchyTree,
        pub global: Uuid,
        pub master: Uuid,
        pub escritorio: Uuid,
        pub assessor: Uuid,
        pub investidor: Uuid,
        pub outro_investidor: Uuid,
        pub outro_assessor: Uuid,
    }

    pub(crate) fn fixture() -> Fixture {
        let global = node(Role::Global, None);
        let master = node(Role::Master, Some(global.id));
        let escritorio = node(Role::Escritorio, Some(master.id));
        let assessor = node(Role::Assessor, Some(escritorio.id));
        let investidor = node(Role::Investidor, Some(assessor.id));
        let outro_assessor = node(Role::Assessor, Some(escritorio.id));
        let outro_investidor = node(Role::Investidor, Some(outro_assessor.id));

        Fixture {
            global: global.id,
            master: master.id,
            escritorio: escritorio.id,
            assessor: assessor.id,
            investidor: investidor.id,
            outro_investidor: outro_investidor.id,
            outro_assessor: outro_assessor.id,
            tree: HierarchyTree::from_nodes([
                global,
                master,
                escritorio,
                assessor,
                investidor,
                outro_assessor,
                outro_investidor,
            ]),
        }
    }

    #[test]
    fn valid_superiors_are_every_role_above() {
        assert!(valid_superior_roles(Role::Global).is_empty());
        assert_eq!(valid_superior_roles(Role::Master), vec![Role::Global]);
        assert_eq!(
            valid_superior_roles(Role::Investidor),
            vec![Role::Global, Role::Master, Role::Escritorio, Role::Assessor]
        );
    }

    #[test]
    fn superior_chain_walks_up_to_global_within_four_hops() {
        let f = fixture();
        let chain: Vec<Uuid> = f
            .tree
            .resolve_superior_chain(f.investidor)
            .unwrap()
            .iter()
            .map(|n| n.id)
            .collect();

        assert_eq!(chain, vec![f.assessor, f.escritorio, f.master, f.global]);
        assert!(chain.len() <= MAX_CHAIN_HOPS);
        assert!(f.tree.resolve_superior_chain(f.global).unwrap().is_empty());
    }

    #[test]
    fn superior_chain_detects_cycles() {
        let mut a = node(Role::Assessor, None);
        let b = node(Role::Escritorio, Some(a.id));
        a.superior_user_id = Some(b.id);
        let (a_id, b_id) = (a.id, b.id);
        let tree = HierarchyTree::from_nodes([a, b]);

        assert!(tree.resolve_superior_chain(a_id).is_err());
        // A busca descendente também termina.
        let descendants = tree.resolve_descendants(b_id);
        assert!(descendants.contains(&a_id));
        assert!(!descendants.contains(&b_id));
    }

    #[test]
    fn descendants_cover_the_whole_subtree() {
        let f = fixture();
        let below_escritorio = f.tree.resolve_descendants(f.escritorio);
        assert_eq!(below_escritorio.len(), 4);
        assert!(below_escritorio.contains(&f.outro_investidor));
        assert!(!below_escritorio.contains(&f.master));

        assert!(f.tree.resolve_descendants(f.investidor).is_empty());
        assert_eq!(f.tree.resolve_descendants(f.global).len(), 6);
    }

    #[test]
    fn superiors_by_role_picks_nearest_of_each_role() {
        let f = fixture();
        let by_role = f.tree.superiors_by_role(f.investidor).unwrap();
        assert_eq!(by_role.get(&Role::Assessor), Some(&f.assessor));
        assert_eq!(by_role.get(&Role::Escritorio), Some(&f.escritorio));
        assert_eq!(by_role.get(&Role::Master), Some(&f.master));
        assert_eq!(by_role.get(&Role::Global), Some(&f.global));
    }

    #[test]
    fn validate_superior_enforces_role_table_and_cycles() {
        let f = fixture();
        assert!(f.tree.validate_superior(Role::Investidor, Some(f.assessor), None).is_ok());
        assert!(f.tree.validate_superior(Role::Master, Some(f.escritorio), None).is_err());
        assert!(f.tree.validate_superior(Role::Global, Some(f.master), None).is_err());
        assert!(f.tree.validate_superior(Role::Assessor, None, None).is_ok());
        // Escritório não pode passar a responder ao próprio assessor.
        assert!(f
            .tree
            .validate_superior(Role::Escritorio, Some(f.assessor), Some(f.escritorio))
            .is_err());
    }

    #[test]
    fn role_change_keeps_valid_superior() {
        let f = fixture();
        let current = f.tree.get(f.escritorio);
        let selection = reselect_superior(Role::Assessor, current, &[]);
        assert_eq!(selection, SuperiorSelection::Keep(f.escritorio));
    }

    #[test]
    fn role_change_auto_selects_single_candidate_or_clears() {
        let f = fixture();
        // Assessor promovido a Master: o Escritório deixa de ser válido.
        let current = f.tree.get(f.escritorio);
        let candidates = f.tree.superior_candidates(Role::Master, Some(f.assessor));
        assert_eq!(candidates.len(), 1);
        assert_eq!(
            reselect_superior(Role::Master, current, &candidates),
            SuperiorSelection::AutoSelected(f.global)
        );

        let many = f.tree.superior_candidates(Role::Escritorio, Some(f.assessor));
        assert_eq!(many.len(), 2);
        assert_eq!(
            reselect_superior(Role::Escritorio, f.tree.get(f.assessor), &many),
            SuperiorSelection::NeedsManualSelection
        );
        assert_eq!(
            reselect_superior(Role::Global, current, &candidates),
            SuperiorSelection::NoSuperior
        );
    }

    #[test]
    fn candidates_exclude_own_subtree() {
        let f = fixture();
        let candidates = f.tree.superior_candidates(Role::Investidor, Some(f.escritorio));
        let ids: HashSet<Uuid> = candidates.iter().map(|n| n.id).collect();
        assert!(ids.contains(&f.global));
        assert!(ids.contains(&f.master));
        assert!(!ids.contains(&f.escritorio));
        assert!(!ids.contains(&f.assessor));
    }
}
