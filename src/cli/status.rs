use super::session::Session;
use concord::governance::PollStatus;
use concord::identity::ForumId;
use concord::ledger::Ledger;
use std::path::Path;

/// Show ledger contents
///
/// Without `--forum`, one line per forum. With it, the forum's metadata,
/// registry and every poll with its tallies and status at `now`.
pub fn execute(
    config_path: &Path,
    forum: Option<ForumId>,
    now: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(config_path)?;
    let ledger = session.ledger();

    match forum {
        None => print_overview(ledger),
        Some(forum_id) => print_forum(ledger, forum_id, now)?,
    }

    Ok(())
}

fn print_overview(ledger: &Ledger) {
    println!("Commits: {}", ledger.nonce());
    let mut any = false;
    for forum in ledger.forums() {
        any = true;
        println!(
            "{}  {}  members={}{}",
            forum.id(),
            forum.name(),
            forum.member_count(),
            if forum.active_poll().is_some() {
                "  (poll open)"
            } else {
                ""
            }
        );
    }
    if !any {
        println!("No forums");
    }
}

fn print_forum(
    ledger: &Ledger,
    forum_id: ForumId,
    now: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let forum = ledger
        .forum(forum_id)
        .ok_or_else(|| format!("Forum {} not found", forum_id))?;

    println!("Forum:       {}", forum.id());
    println!("Name:        {}", forum.name());
    println!("Description: {}", forum.description());
    println!("Creator:     {}", forum.creator());
    println!("Members:     {}", forum.member_count());
    match ledger.member_registry_for(forum_id) {
        Some(registry) => println!("Registry:    {}", registry.id()),
        None => println!("Registry:    (none)"),
    }

    for poll in ledger.polls_for(forum_id) {
        let status = match poll.status(now) {
            PollStatus::Active => "active",
            PollStatus::Ended => "ended",
            PollStatus::Executed => "executed",
        };
        println!();
        println!("Poll {}  [{}]", poll.id(), status);
        println!("  {}", poll.title());
        println!(
            "  proposes: {} / {}",
            poll.proposed_name(),
            poll.proposed_description()
        );
        println!(
            "  yes={} no={} turnout={:.0}%",
            poll.yes_votes(),
            poll.no_votes(),
            poll.participation_rate() * 100.0
        );
        if let Some(votes) = ledger.vote_registry_for(poll.id()) {
            println!("  votes registry: {}", votes.id());
        }
    }

    Ok(())
}
