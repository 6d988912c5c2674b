//! Forum and membership commands.

use super::secret::{determine_secret_source, read_secret};
use super::session::Session;
use concord::identity::{Address, ForumId, RegistryId};
use std::path::{Path, PathBuf};

pub fn create(
    config_path: &Path,
    caller: Address,
    name: String,
    description: String,
    secret_file: Option<PathBuf>,
    now: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open(config_path)?;
    let secret = read_secret(
        determine_secret_source(secret_file),
        Some("New forum secret: "),
    )?;

    let forum_id =
        session
            .ledger_mut()
            .create_forum(caller, &name, &description, secret.as_bytes(), now)?;
    session.save()?;

    println!("{}", forum_id);
    Ok(())
}

pub fn init_registry(
    config_path: &Path,
    caller: Address,
    forum: ForumId,
    now: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open(config_path)?;

    let registry_id = session.ledger_mut().init_member_registry(caller, forum, now)?;
    session.save()?;

    println!("{}", registry_id);
    Ok(())
}

/// Resolve an explicit registry, or the one linked to `forum`.
pub fn member_registry_of(
    session: &Session,
    forum: ForumId,
    registry: Option<RegistryId>,
) -> Result<RegistryId, Box<dyn std::error::Error>> {
    match registry {
        Some(id) => Ok(id),
        None => session
            .ledger()
            .member_registry_for(forum)
            .map(|r| r.id())
            .ok_or_else(|| {
                format!(
                    "Forum {} has no member registry (run `concord init-registry`)",
                    forum
                )
                .into()
            }),
    }
}

pub fn join(
    config_path: &Path,
    caller: Address,
    forum: ForumId,
    registry: Option<RegistryId>,
    secret_file: Option<PathBuf>,
    now: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open(config_path)?;
    let registry_id = member_registry_of(&session, forum, registry)?;
    let secret = read_secret(determine_secret_source(secret_file), None)?;

    let membership_id =
        session
            .ledger_mut()
            .join_forum(caller, forum, registry_id, secret.as_bytes(), now)?;
    session.save()?;

    println!("{}", membership_id);
    Ok(())
}
