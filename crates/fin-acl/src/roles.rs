//! Agent roles and site administration.

use fin_client::{Method, Store};
use fin_core::ResourcePath;
use fin_graph::{Graph, Term, vocab};

use crate::error::Step;
use crate::model::{AgentRoles, Grantee, MembershipChange, Mode};
use crate::mutation::{CreateGroup, ModifyGroupMembers};
use crate::service::{AclService, expect_success};
use crate::{Error, Result};

/// Label written on the root ACL container.
pub const ROOT_ACL_LABEL: &str = "Site level access controls";
/// Name of the record granting the admin group access to the root.
pub const ADMIN_RECORD: &str = "admin";

impl<S: Store> AclService<S> {
    /// Groups under `acl`'s records that list `agent`, and the records that
    /// apply to it directly, publicly, or through one of those groups.
    pub async fn agent_roles(&self, acl: &ResourcePath, agent: &str) -> Result<AgentRoles> {
        let Some(records) = self.records(acl).await? else {
            return Ok(AgentRoles::default());
        };
        let members = self.group_members(&records).await?;

        let groups: Vec<ResourcePath> = members
            .iter()
            .filter(|(_, ids)| ids.iter().any(|id| id == agent))
            .map(|(group, _)| group.clone())
            .collect();
        let authorizations = records
            .into_iter()
            .filter(|record| {
                record.names_agent(agent) || record.agent_classes.iter().any(|g| groups.contains(g))
            })
            .collect();

        Ok(AgentRoles {
            groups,
            authorizations,
        })
    }

    /// Make `username` a site administrator.
    ///
    /// Ensures, in order: the admin group exists and lists the user, the root
    /// ACL container exists, its admin record grants the group Read and Write
    /// on the root, and the root advertises the container. Satisfied steps are
    /// skipped, so reruns converge. Returns the steps that changed something.
    pub async fn add_admin(&self, username: &str) -> Result<Vec<Step>> {
        if username.trim().is_empty() {
            return Err(Error::invalid_argument("username must not be empty"));
        }
        let mut completed = Vec::new();
        match self.bootstrap_admin(username, &mut completed).await {
            Ok(()) => {
                tracing::info!(username, steps = completed.len(), "Admin access ensured");
                Ok(completed)
            }
            Err(e) => Err(Error::partial("add admin", completed, e)),
        }
    }

    /// Take `username` out of the admin group.
    pub async fn remove_admin(&self, username: &str) -> Result<MembershipChange> {
        let group = self.config.admin_group_path()?;
        self.modify_group_members(ModifyGroupMembers::remove(group, vec![username.to_string()]))
            .await
    }

    async fn bootstrap_admin(&self, username: &str, completed: &mut Vec<Step>) -> Result<()> {
        let root = ResourcePath::root();
        let group = self.config.admin_group_path()?;

        if self.exists("check admin group", &group).await? {
            let change = self
                .modify_group_members(ModifyGroupMembers::add(
                    group.clone(),
                    vec![username.to_string()],
                ))
                .await?;
            if !change.is_noop() {
                completed.push(Step::Patched { path: group.clone() });
            }
        } else {
            let (parent, name) = match (group.parent(), group.name()) {
                (Some(parent), Some(name)) => (parent, name.to_string()),
                _ => return Err(Error::invalid_argument("admin group cannot be the root")),
            };
            self.create_group(
                CreateGroup::new(parent, name, vec![username.to_string()])
                    .with_label("Site administrators"),
            )
            .await?;
            completed.push(Step::Created { path: group.clone() });
        }

        let acl = root.join(&self.config.container_name)?;
        if !self.exists("check root acl", &acl).await? {
            let mut body = Graph::new();
            body.insert(Term::iri(""), vocab::rdfs::LABEL, Term::literal(ROOT_ACL_LABEL));
            self.create_at_root("create root acl", &acl, &body).await?;
            completed.push(Step::Created { path: acl.clone() });
        }

        let record = acl.join(ADMIN_RECORD)?;
        if !self.exists("check admin record", &record).await? {
            let body = self.authorization_graph(&root, &Grantee::Group(group), &Mode::ALL.into());
            let response = self.store.post(&acl, ADMIN_RECORD, &body).await?;
            expect_success("create admin record", Method::Post, &acl, response)?;
            completed.push(Step::Created { path: record });
        }

        if self.link_acl(&root, &acl).await? {
            completed.push(Step::Linked {
                target: root,
                acl,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fin_client::MemoryStore;

    use super::*;

    fn p(s: &str) -> ResourcePath {
        ResourcePath::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_add_admin_bootstraps_everything() {
        let service = AclService::new(MemoryStore::new());
        let steps = service.add_admin("root-user").await.unwrap();
        assert_eq!(steps.len(), 4);

        let group = service.get_group(&p("/.groups/admins")).await.unwrap();
        assert_eq!(group.members, vec!["root-user"]);
        assert_eq!(service.locate_acl(&ResourcePath::root()).await.unwrap(), vec![p("/.acl")]);

        service.store().insert(&p("/anything/below"), Graph::new());
        let result = service.authorizations(&p("/anything/below")).await.unwrap();
        assert!(result.allows(Some("root-user"), Mode::Write));
        assert!(result.allows(Some("root-user"), Mode::Read));
    }

    #[tokio::test]
    async fn test_add_admin_converges() {
        let service = AclService::new(MemoryStore::new());
        service.add_admin("a").await.unwrap();

        assert!(service.add_admin("a").await.unwrap().is_empty());
        let steps = service.add_admin("b").await.unwrap();
        assert_eq!(
            steps,
            vec![Step::Patched {
                path: p("/.groups/admins")
            }]
        );
    }

    #[tokio::test]
    async fn test_add_admin_partial_failure_reports_steps() {
        let service = AclService::new(MemoryStore::new());
        service
            .store()
            .fail_next(Method::Patch, &ResourcePath::root(), 500);

        let err = service.add_admin("a").await.unwrap_err();
        assert_eq!(err.completed_steps().len(), 3);
        assert!(err.is_retryable());

        let steps = service.add_admin("a").await.unwrap();
        assert_eq!(
            steps,
            vec![Step::Linked {
                target: ResourcePath::root(),
                acl: p("/.acl")
            }]
        );
    }

    #[tokio::test]
    async fn test_remove_admin() {
        let service = AclService::new(MemoryStore::new());
        service.add_admin("a").await.unwrap();
        service.add_admin("b").await.unwrap();

        let change = service.remove_admin("a").await.unwrap();
        assert_eq!(change.removed, vec!["a"]);
        service.store().insert(&p("/x"), Graph::new());
        let result = service.authorizations(&p("/x")).await.unwrap();
        assert!(!result.allows(Some("a"), Mode::Read));
        assert!(result.allows(Some("b"), Mode::Read));
    }

    #[tokio::test]
    async fn test_agent_roles() {
        let service = AclService::new(MemoryStore::new());
        service.add_admin("a").await.unwrap();

        let roles = service.agent_roles(&p("/.acl"), "a").await.unwrap();
        assert_eq!(roles.groups, vec![p("/.groups/admins")]);
        assert_eq!(roles.authorizations.len(), 1);
        assert_eq!(roles.authorizations[0].path, p("/.acl/admin"));

        let none = service.agent_roles(&p("/.acl"), "stranger").await.unwrap();
        assert!(none.groups.is_empty());
        assert!(none.authorizations.is_empty());

        let missing = service.agent_roles(&p("/nope/.acl"), "a").await.unwrap();
        assert_eq!(missing, AgentRoles::default());
    }
}
