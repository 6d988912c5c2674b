//! Poll and ballot commands.

use super::forum::member_registry_of;
use super::session::Session;
use concord::governance::{ProposalDraft, VoteChoice};
use concord::identity::{Address, ForumId, PollId, RegistryId};
use std::path::Path;
use std::time::Duration;

/// Proposal fields as collected from the command line
pub struct ProposalArgs {
    pub title: String,
    pub description: String,
    pub new_name: String,
    pub new_description: String,
    pub duration: Duration,
}

pub fn propose(
    config_path: &Path,
    caller: Address,
    forum: ForumId,
    registry: Option<RegistryId>,
    args: ProposalArgs,
    now: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open(config_path)?;
    let registry_id = member_registry_of(&session, forum, registry)?;

    let duration = u64::try_from(args.duration.as_millis())
        .map_err(|_| format!("Duration too long: {:?}", args.duration))?;
    let draft = ProposalDraft {
        title: args.title,
        description: args.description,
        proposed_name: args.new_name,
        proposed_description: args.new_description,
        duration,
    };

    let poll_id = session
        .ledger_mut()
        .create_poll(caller, forum, registry_id, draft, now)?;
    session.save()?;

    println!("{}", poll_id);
    Ok(())
}

pub fn init_votes(
    config_path: &Path,
    caller: Address,
    poll: PollId,
    now: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open(config_path)?;

    let registry_id = session.ledger_mut().init_vote_registry(caller, poll, now)?;
    session.save()?;

    println!("{}", registry_id);
    Ok(())
}

pub fn vote(
    config_path: &Path,
    caller: Address,
    poll: PollId,
    choice: VoteChoice,
    votes: Option<RegistryId>,
    registry: Option<RegistryId>,
    now: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open(config_path)?;

    let forum = session
        .ledger()
        .poll(poll)
        .map(|p| p.forum_id())
        .ok_or_else(|| format!("Poll {} not found", poll))?;
    let member_registry_id = member_registry_of(&session, forum, registry)?;
    let vote_registry_id = match votes {
        Some(id) => id,
        None => session
            .ledger()
            .vote_registry_for(poll)
            .map(|r| r.id())
            .ok_or_else(|| {
                format!(
                    "Poll {} has no vote registry (run `concord init-votes`)",
                    poll
                )
            })?,
    };

    let ballot_id = session.ledger_mut().vote(
        caller,
        poll,
        vote_registry_id,
        member_registry_id,
        choice,
        now,
    )?;
    session.save()?;

    println!("{}", ballot_id);
    Ok(())
}

pub fn execute(
    config_path: &Path,
    caller: Address,
    poll: PollId,
    forum: Option<ForumId>,
    now: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open(config_path)?;

    let forum = match forum {
        Some(id) => id,
        None => session
            .ledger()
            .poll(poll)
            .map(|p| p.forum_id())
            .ok_or_else(|| format!("Poll {} not found", poll))?,
    };

    let outcome = session.ledger_mut().execute_poll(caller, forum, poll, now)?;
    session.save()?;

    println!(
        "{} yes={} no={} participants={}",
        if outcome.passed { "passed" } else { "rejected" },
        outcome.yes_votes,
        outcome.no_votes,
        outcome.total_participants
    );
    Ok(())
}
