//! Command-line definitions.

use clap::{Args, Parser, Subcommand};

use fin_acl::Mode;
use fin_core::ResourcePath;

/// Access-control administration for Fedora-style LDP repositories.
#[derive(Parser, Debug)]
#[command(name = "fin", author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Repository host, overriding the configuration
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect and edit ACLs
    Acl {
        #[command(subcommand)]
        action: AclAction,
    },
    /// Manage groups
    Group {
        #[command(subcommand)]
        action: GroupAction,
    },
    /// Manage site administrators
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// `fin acl` subcommands.
#[derive(Subcommand, Debug)]
pub enum AclAction {
    /// List the ACL containers linked to a resource
    Locate {
        /// Resource path
        #[arg(value_parser = parse_path)]
        path: ResourcePath,
    },
    /// Show effective authorizations for one or more resources
    Show {
        /// Resource paths
        #[arg(required = true, value_parser = parse_path)]
        paths: Vec<ResourcePath>,
        /// Only report which modes this agent holds
        #[arg(long)]
        agent: Option<String>,
    },
    /// Show the per-target index of an ACL container
    Index {
        /// ACL container path
        #[arg(value_parser = parse_path)]
        acl: ResourcePath,
    },
    /// Find the resource an ACL container is attached at
    Root {
        /// ACL container path
        #[arg(value_parser = parse_path)]
        acl: ResourcePath,
    },
    /// Create an ACL container for a resource and link it
    Create {
        /// Target resource path
        #[arg(value_parser = parse_path)]
        target: ResourcePath,
        /// Label for the container
        #[arg(long)]
        label: Option<String>,
        /// Container name, overriding the configuration
        #[arg(long)]
        name: Option<String>,
    },
    /// Link a resource to an existing ACL container
    Link {
        /// Target resource path
        #[arg(value_parser = parse_path)]
        target: ResourcePath,
        /// ACL container path
        #[arg(value_parser = parse_path)]
        acl: ResourcePath,
    },
    /// Grant access modes on a resource
    Grant {
        /// Target resource path
        #[arg(value_parser = parse_path)]
        target: ResourcePath,
        #[command(flatten)]
        grantee: GranteeArgs,
        /// Modes to grant (read, write)
        #[arg(short, long = "mode", required = true, value_parser = parse_mode)]
        modes: Vec<Mode>,
        /// ACL container to write into; defaults to the first linked one
        #[arg(long, value_parser = parse_path)]
        acl: Option<ResourcePath>,
    },
    /// Delete an authorization record
    Revoke {
        /// Authorization record path
        #[arg(value_parser = parse_path)]
        record: ResourcePath,
    },
    /// Show an agent's groups and records under an ACL container
    Roles {
        /// ACL container path
        #[arg(value_parser = parse_path)]
        acl: ResourcePath,
        /// Agent id
        agent: String,
    },
}

/// Who a grant is for. Exactly one must be given.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct GranteeArgs {
    /// A user id
    #[arg(long)]
    pub user: Option<String>,
    /// A group path
    #[arg(long, value_parser = parse_path)]
    pub group: Option<ResourcePath>,
    /// Everyone, including unauthenticated requests
    #[arg(long)]
    pub public: bool,
}

/// `fin group` subcommands.
#[derive(Subcommand, Debug)]
pub enum GroupAction {
    /// Create a group
    Create {
        /// Group path
        #[arg(value_parser = parse_path)]
        group: ResourcePath,
        /// Group label
        #[arg(long)]
        label: Option<String>,
        /// Initial members
        #[arg(short, long = "member")]
        members: Vec<String>,
    },
    /// Show a group's members
    Show {
        /// Group path
        #[arg(value_parser = parse_path)]
        group: ResourcePath,
    },
    /// Add members to a group
    Add {
        /// Group path
        #[arg(value_parser = parse_path)]
        group: ResourcePath,
        /// Member ids
        #[arg(required = true)]
        members: Vec<String>,
    },
    /// Remove members from a group
    Remove {
        /// Group path
        #[arg(value_parser = parse_path)]
        group: ResourcePath,
        /// Member ids
        #[arg(required = true)]
        members: Vec<String>,
    },
}

/// `fin admin` subcommands.
#[derive(Subcommand, Debug)]
pub enum AdminAction {
    /// Make a user a site administrator
    Add {
        /// User id
        username: String,
    },
    /// Remove a user from the site administrators
    Remove {
        /// User id
        username: String,
    },
}

/// `fin config` subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path
    Path,
    /// Print a value by dotted key
    Get {
        /// Dotted key, e.g. `acl.container_name`
        key: String,
    },
    /// Set a value by dotted key
    Set {
        /// Dotted key
        key: String,
        /// New value; booleans and numbers are detected
        value: String,
    },
    /// Write a default config file
    Init {
        /// Where to write it instead of the default location
        #[arg(long)]
        file: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration as environment variables
    Export {
        /// Format as `--env KEY=value` for docker
        #[arg(long)]
        docker_env: bool,
    },
}

fn parse_path(s: &str) -> Result<ResourcePath, String> {
    ResourcePath::new(s).map_err(|e| e.to_string())
}

fn parse_mode(s: &str) -> Result<Mode, String> {
    s.parse().map_err(|e: fin_acl::Error| e.to_string())
}
