//! Filter engine that runs rules over a mailbox in order.

use std::collections::HashSet;

use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::email::mailbox::{Mailbox, IMPORTANT_LABEL, STARRED_LABEL};
use crate::email::{EmailError, MessageRecord};

use super::rule::{FilterRule, Scope};

/// What happened to a single rule during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleOutcome {
    /// Rule name.
    pub name: String,
    /// Size of the candidate pool when the rule ran.
    pub candidates: usize,
    /// UIDs the rule matched.
    pub matched: Vec<u32>,
    /// True when the rule had no candidates to look at.
    pub skipped: bool,
    /// Actions that the mailbox rejected.
    pub failed_actions: Vec<String>,
}

/// Summary of one engine run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Per-rule outcomes, in rule order.
    pub outcomes: Vec<RuleOutcome>,
    /// Number of scoped fetches performed.
    pub fetches: usize,
    /// UIDs dropped because they could not be parsed.
    pub parse_failures: Vec<u32>,
    /// UIDs left in the pool after the last rule.
    pub untouched: Vec<u32>,
}

impl RunReport {
    /// Total number of messages matched across all rules.
    pub fn total_matched(&self) -> usize {
        self.outcomes.iter().map(|o| o.matched.len()).sum()
    }

    /// Outcome of the rule called `name`, if it ran.
    pub fn outcome(&self, name: &str) -> Option<&RuleOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }
}

/// Result of running one rule's actions.
struct ActionResult {
    /// The batched move was attempted and rejected; the batch is still in place.
    move_failed: bool,
    failed: Vec<String>,
}

/// Applies an ordered rule list to a mailbox, first match wins per message.
pub struct FilterEngine<M: Mailbox> {
    mailbox: M,
    rules: Vec<FilterRule>,
    dry_run: bool,
}

impl<M: Mailbox> FilterEngine<M> {
    /// Creates an engine that owns `mailbox` for the duration of the run.
    pub fn new(mailbox: M, rules: Vec<FilterRule>) -> Self {
        Self {
            mailbox,
            rules,
            dry_run: false,
        }
    }

    /// In dry-run mode folders are examined read-only and no actions are sent.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    pub fn mailbox(&self) -> &M {
        &self.mailbox
    }

    /// Gives the mailbox back, e.g. to log out.
    pub fn into_mailbox(self) -> M {
        self.mailbox
    }

    /// Runs every rule once, in order.
    ///
    /// The candidate pool is re-fetched only when a rule's scope differs from
    /// the previous rule's. Matched messages leave the pool before the next
    /// rule runs. Mailbox failures are logged and never abort the run.
    pub async fn run(&mut self) -> RunReport {
        let Self {
            mailbox,
            rules,
            dry_run,
        } = self;
        let dry_run = *dry_run;

        let span = info_span!("filter_run", rules = rules.len(), dry_run);
        async move {
            let mut report = RunReport::default();
            let mut previous_scope: Option<&Scope> = None;
            let mut pool: Vec<MessageRecord> = Vec::new();

            for rule in rules.iter() {
                if previous_scope != Some(&rule.scope) {
                    pool = fetch_pool(mailbox, &rule.scope, dry_run, &mut report).await;
                    previous_scope = Some(&rule.scope);
                }

                let outcome = apply_rule(mailbox, rule, &mut pool, dry_run)
                    .instrument(info_span!("rule", name = %rule.name))
                    .await;
                report.outcomes.push(outcome);
            }

            report.untouched = pool.iter().map(MessageRecord::id).collect();
            info!(
                "Run complete: {} matched, {} untouched, {} unparsable",
                report.total_matched(),
                report.untouched.len(),
                report.parse_failures.len()
            );
            report
        }
        .instrument(span)
        .await
    }
}

/// Selects and searches `scope`, then parses whatever the server returns.
async fn fetch_pool<M: Mailbox>(
    mailbox: &mut M,
    scope: &Scope,
    dry_run: bool,
    report: &mut RunReport,
) -> Vec<MessageRecord> {
    report.fetches += 1;
    info!("Fetching candidates from {}", scope);

    if let Err(e) = mailbox.select_folder(&scope.folder, dry_run).await {
        error!("Cannot open folder '{}': {}", scope.folder, e);
        return Vec::new();
    }

    let ids = match mailbox.search(&scope.query).await {
        Ok(ids) => ids,
        Err(e) => {
            error!("Search in {} failed: {}", scope, e);
            return Vec::new();
        }
    };

    if ids.is_empty() {
        info!("No messages in {}", scope);
        return Vec::new();
    }

    let raw = match mailbox.fetch_raw(&ids).await {
        Ok(raw) => raw,
        Err(e) => {
            error!("Fetch from {} failed: {}", scope, e);
            return Vec::new();
        }
    };

    // Walk the search results so the pool keeps mailbox order
    let mut records = Vec::with_capacity(raw.len());
    for id in ids {
        let Some(bytes) = raw.get(&id) else {
            debug!("No data returned for UID {}", id);
            continue;
        };
        match MessageRecord::from_raw(id, bytes) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!("Dropping message from pool: {}", e);
                report.parse_failures.push(id);
            }
        }
    }

    info!("Fetched {} candidates from {}", records.len(), scope);
    records
}

async fn apply_rule<M: Mailbox>(
    mailbox: &mut M,
    rule: &FilterRule,
    pool: &mut Vec<MessageRecord>,
    dry_run: bool,
) -> RuleOutcome {
    let mut outcome = RuleOutcome {
        name: rule.name.clone(),
        candidates: pool.len(),
        ..Default::default()
    };

    if pool.is_empty() {
        info!("No candidates left, skipping");
        outcome.skipped = true;
        return outcome;
    }

    for message in pool.iter().filter(|m| rule.compare(m)) {
        debug!("Matched {}", message);
        outcome.matched.push(message.id());
    }

    info!(
        "Matched {} of {} candidates",
        outcome.matched.len(),
        outcome.candidates
    );

    if outcome.matched.is_empty() {
        return outcome;
    }

    let result = execute_actions(mailbox, rule, &outcome.matched, dry_run).await;
    outcome.failed_actions = result.failed;

    if result.move_failed {
        // The batch never left the folder, so later rules may still claim it
        warn!(
            "Keeping {} messages eligible after failed move",
            outcome.matched.len()
        );
    } else {
        let consumed: HashSet<u32> = outcome.matched.iter().copied().collect();
        pool.retain(|m| !consumed.contains(&m.id()));
    }

    outcome
}

/// One batched mailbox operation.
#[derive(Debug, Clone, Copy)]
enum BatchAction<'a> {
    Move(&'a str),
    Star,
    MarkImportant,
}

impl std::fmt::Display for BatchAction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchAction::Move(destination) => write!(f, "move to '{}'", destination),
            BatchAction::Star => f.write_str("star"),
            BatchAction::MarkImportant => f.write_str("mark important"),
        }
    }
}

/// Runs move, star and mark, in that order, each as one batched call.
async fn execute_actions<M: Mailbox>(
    mailbox: &mut M,
    rule: &FilterRule,
    ids: &[u32],
    dry_run: bool,
) -> ActionResult {
    let actions = rule.actions();
    let mut result = ActionResult {
        move_failed: false,
        failed: Vec::new(),
    };

    if actions.is_empty() {
        debug!("Rule has no actions");
        return result;
    }

    let mut batch = Vec::with_capacity(3);
    if let Some(destination) = &actions.move_to {
        batch.push(BatchAction::Move(destination.as_str()));
    }
    if actions.star {
        batch.push(BatchAction::Star);
    }
    if actions.mark_important {
        batch.push(BatchAction::MarkImportant);
    }

    for action in batch {
        if let Err(e) = run_action(mailbox, action, ids, dry_run).await {
            error!("Action '{}' failed: {}", action, e);
            if matches!(action, BatchAction::Move(_)) {
                result.move_failed = true;
            }
            result.failed.push(action.to_string());
        }
    }

    result
}

async fn run_action<M: Mailbox>(
    mailbox: &mut M,
    action: BatchAction<'_>,
    ids: &[u32],
    dry_run: bool,
) -> Result<(), EmailError> {
    if dry_run {
        info!("[dry-run] would {} UIDs {:?}", action, ids);
        return Ok(());
    }

    info!("{} UIDs {:?}", action, ids);
    match action {
        BatchAction::Move(destination) => mailbox.move_messages(ids, destination).await,
        BatchAction::Star => mailbox.add_label(ids, STARRED_LABEL).await,
        BatchAction::MarkImportant => mailbox.add_label(ids, IMPORTANT_LABEL).await,
    }
}

/// Moves every message in `from` to `to`, returning how many were moved.
///
/// Used to put a mailbox back into its pre-filter state between test runs.
pub async fn restore_folder<M: Mailbox>(
    mailbox: &mut M,
    from: &str,
    to: &str,
) -> Result<usize, EmailError> {
    mailbox.select_folder(from, false).await?;
    let ids = mailbox.search(&["ALL".to_string()]).await?;

    if ids.is_empty() {
        info!("No messages in '{}' to move", from);
        return Ok(0);
    }

    info!("Moving {} messages from '{}' to '{}'", ids.len(), from, to);
    mailbox.move_messages(&ids, to).await?;
    Ok(ids.len())
}
