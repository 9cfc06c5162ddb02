use std::fmt;

/// Raised by [`super::AdapterRegistry::get`] / [`super::new_node`] when a
/// node is constructed against an adapter name that was never registered
/// (§9 "optional backends" design note; §7 `configuration` kind).
#[derive(Debug)]
pub enum ConfigError {
    UnregisteredAdapter(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnregisteredAdapter(name) => {
                write!(f, "no adapter registered under the name \"{name}\"")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Raised by [`super::Node::add_child`] (§4.5, §7 `cycle` kind).
#[derive(Debug)]
pub enum CycleError {
    /// Attaching `child` under `parent` would make `parent` reachable from
    /// itself.
    WouldCycle { parent: String, child: String },
    /// `child` already has a parent; a node may have at most one (§3).
    AlreadyHasParent {
        child: String,
        existing_parent: String,
    },
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleError::WouldCycle { parent, child } => write!(
                f,
                "attaching \"{child}\" under \"{parent}\" would create a cycle"
            ),
            CycleError::AlreadyHasParent {
                child,
                existing_parent,
            } => write!(
                f,
                "\"{child}\" already has a parent (\"{existing_parent}\"); a node may have at most one"
            ),
        }
    }
}

impl std::error::Error for CycleError {}
