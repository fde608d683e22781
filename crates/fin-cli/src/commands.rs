//! Command dispatch.
//!
//! Every repository command runs against an [`AclService`] and renders its
//! result as JSON. The store is chosen from configuration: a plain
//! [`HttpStore`], or one wrapped in a [`CachingStore`] when `[cache] enabled`.

use serde_json::{Value, json};

use fin_acl::{
    AclService, AddAuthorization, CreateAcl, CreateGroup, Grantee, Mode, ModifyGroupMembers,
};
use fin_client::{CachingStore, HttpStore, Store};
use fin_core::{ConfigManager, FinConfig};

use crate::cli::{AclAction, AdminAction, Cli, Command, GranteeArgs, GroupAction};
use crate::config_handlers::handle_config_command;
use crate::{Error, Result};

// ============================================================================
// Entry point
// ============================================================================

/// Run a parsed command line, printing its result to stdout.
pub async fn run(cli: Cli) -> Result<()> {
    let command = match cli.command {
        Command::Config { action } => {
            return Ok(handle_config_command(cli.config.as_deref(), action)?);
        }
        command => command,
    };

    let config = load_config(cli.config.as_deref(), cli.host)?;
    tracing::debug!(host = %config.host, cache = config.cache.enabled, "Connecting");

    let acl_config = config.acl.clone();
    let cache = config.cache.clone();
    let http = HttpStore::new(config)?;
    let output = if cache.enabled {
        let store = CachingStore::from_config(http, &cache);
        execute(&AclService::with_config(store, acl_config), command).await?
    } else {
        execute(&AclService::with_config(http, acl_config), command).await?
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Load configuration and apply a `--host` override.
pub fn load_config(config_path: Option<&str>, host: Option<String>) -> Result<FinConfig> {
    let mut config = FinConfig::load(config_path)?;
    if let Some(host) = host {
        config.host = host;
    }
    config.validate()?;
    Ok(config)
}

/// Execute a repository command and return its JSON output.
pub async fn execute<S: Store>(service: &AclService<S>, command: Command) -> Result<Value> {
    match command {
        Command::Acl { action } => acl_command(service, action).await,
        Command::Group { action } => group_command(service, action).await,
        Command::Admin { action } => admin_command(service, action).await,
        Command::Config { .. } => Err(Error::invalid_argument(
            "config commands do not talk to the repository",
        )),
    }
}

// ============================================================================
// ACL commands
// ============================================================================

async fn acl_command<S: Store>(service: &AclService<S>, action: AclAction) -> Result<Value> {
    let output = match action {
        AclAction::Locate { path } => {
            let acls = service.locate_acl(&path).await?;
            json!({ "path": path, "acls": acls })
        }
        AclAction::Show { paths, agent } => {
            let mut results = service.authorizations_for(&paths).await?;
            match (&agent, paths.as_slice()) {
                (Some(agent), _) => {
                    let modes: serde_json::Map<String, Value> = results
                        .iter()
                        .map(|(path, effective)| {
                            let held: Vec<Mode> = Mode::ALL
                                .into_iter()
                                .filter(|mode| effective.allows(Some(agent), *mode))
                                .collect();
                            (path.to_string(), json!(held))
                        })
                        .collect();
                    json!({ "agent": agent, "modes": modes })
                }
                (None, [single]) => serde_json::to_value(results.remove(single))?,
                (None, _) => serde_json::to_value(&results)?,
            }
        }
        AclAction::Index { acl } => serde_json::to_value(service.build_index(&acl).await?)?,
        AclAction::Root { acl } => {
            let root = service.find_root(&acl, &acl).await?;
            json!({ "acl": acl, "root": root })
        }
        AclAction::Create {
            target,
            label,
            name,
        } => {
            let mut options = CreateAcl::new(target.clone());
            if let Some(label) = label {
                options = options.with_label(label);
            }
            if let Some(name) = name {
                options = options.with_container_name(name);
            }
            let acl = service.create_acl(options).await?;
            json!({ "target": target, "acl": acl })
        }
        AclAction::Link { target, acl } => {
            let linked = service.link_acl(&target, &acl).await?;
            json!({ "target": target, "acl": acl, "linked": linked })
        }
        AclAction::Grant {
            target,
            grantee,
            modes,
            acl,
        } => {
            let mut options = AddAuthorization::new(target, grantee_from(grantee)?, modes);
            if let Some(acl) = acl {
                options = options.in_acl(acl);
            }
            let record = service.add_authorization(options).await?;
            json!({ "record": record })
        }
        AclAction::Revoke { record } => {
            service.remove_authorization(&record).await?;
            json!({ "removed": record })
        }
        AclAction::Roles { acl, agent } => {
            serde_json::to_value(service.agent_roles(&acl, &agent).await?)?
        }
    };
    Ok(output)
}

fn grantee_from(args: GranteeArgs) -> Result<Grantee> {
    match (args.user, args.group, args.public) {
        (Some(user), None, false) => Ok(Grantee::User(user)),
        (None, Some(group), false) => Ok(Grantee::Group(group)),
        (None, None, true) => Ok(Grantee::Public),
        _ => Err(Error::invalid_argument(
            "exactly one of --user, --group or --public is required",
        )),
    }
}

// ============================================================================
// Group and admin commands
// ============================================================================

async fn group_command<S: Store>(service: &AclService<S>, action: GroupAction) -> Result<Value> {
    let output = match action {
        GroupAction::Create {
            group,
            label,
            members,
        } => {
            let (Some(parent), Some(name)) = (group.parent(), group.name()) else {
                return Err(Error::invalid_argument("a group cannot be the root"));
            };
            let mut options = CreateGroup::new(parent, name, members);
            if let Some(label) = label {
                options = options.with_label(label);
            }
            json!({ "group": service.create_group(options).await? })
        }
        GroupAction::Show { group } => serde_json::to_value(service.get_group(&group).await?)?,
        GroupAction::Add { group, members } => serde_json::to_value(
            service
                .modify_group_members(ModifyGroupMembers::add(group, members))
                .await?,
        )?,
        GroupAction::Remove { group, members } => serde_json::to_value(
            service
                .modify_group_members(ModifyGroupMembers::remove(group, members))
                .await?,
        )?,
    };
    Ok(output)
}

async fn admin_command<S: Store>(service: &AclService<S>, action: AdminAction) -> Result<Value> {
    let output = match action {
        AdminAction::Add { username } => {
            let steps = service.add_admin(&username).await?;
            json!({ "username": username, "steps": steps })
        }
        AdminAction::Remove { username } => {
            serde_json::to_value(service.remove_admin(&username).await?)?
        }
    };
    Ok(output)
}

// ============================================================================
// Tests
// ============================================================================
