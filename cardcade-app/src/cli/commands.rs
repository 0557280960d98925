use crate::cli::opts::*;

use anyhow::{anyhow, bail, Context, Result};
use cardcade_core::{
    due_cards, rank_failure_candidates, sort_by_priority, submit_review, Card, Rating,
    Repository, Scheduler, SchedulerParams,
};
use cardcade_json::paths::default_params_file;
use cardcade_json::JsonStore;
use chrono::{DateTime, Utc};
use std::io::{stdin, stdout, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

pub async fn run_cli(args: Cli) -> Result<()> {
    let scheduler = load_scheduler(args.params.as_deref())?;
    let store = args.store_file;
    match args.cmd {
        Command::Params => {
            println!("{}", serde_json::to_string_pretty(scheduler.params())?);
            Ok(())
        }
        Command::Card(cmd) => card_cmd(&open_repo(store).await?, cmd).await,
        Command::Due(cmd) => due_cmd(&open_repo(store).await?, cmd).await,
        Command::Boss(cmd) => boss_cmd(&open_repo(store).await?, cmd).await,
        Command::Review(cmd) => review_cmd(&open_repo(store).await?, &scheduler, cmd).await,
        Command::Session(cmd) => session_cmd(&open_repo(store).await?, &scheduler, cmd).await,
        Command::Preview { card } => {
            preview_cmd(&open_repo(store).await?, &scheduler, &card).await
        }
    }
}

pub async fn open_repo(store_file: Option<PathBuf>) -> Result<JsonStore> {
    let store = match store_file {
        Some(p) => JsonStore::open_file(p).await?,
        None => JsonStore::open_default().await?,
    };
    info!(path = %store.path().display(), "using store");
    Ok(store)
}

/// Explicit `--params` must exist; the default config file is optional.
fn load_scheduler(explicit: Option<&Path>) -> Result<Scheduler> {
    let params = match explicit {
        Some(p) => read_params(p)?,
        None => {
            let p = default_params_file();
            if p.exists() {
                read_params(&p)?
            } else {
                debug!("no params file, using defaults");
                SchedulerParams::default()
            }
        }
    };
    Ok(Scheduler::new(params)?)
}

fn read_params(path: &Path) -> Result<SchedulerParams> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading params from {}", path.display()))?;
    let params = SchedulerParams::from_json(&raw)
        .with_context(|| format!("loading params from {}", path.display()))?;
    info!(path = %path.display(), "loaded scheduler params");
    Ok(params)
}

async fn card_cmd<R: Repository + ?Sized>(repo: &R, cmd: CardCmd) -> Result<()> {
    match cmd {
        CardCmd::Add(a) => {
            let c = repo.add_card(&a.front, &a.back).await?;
            println!("{}", c.id);
        }
        CardCmd::List => {
            let mut cards = repo.list_cards().await?;
            cards.sort_by_key(|c| c.created_at);
            for c in cards {
                println!("{}\t{}\t{}\t{}", c.id, c.front, c.state, due_label(&c));
            }
        }
        CardCmd::Rm { card } => {
            let c = resolve_card(repo, &card).await?;
            repo.delete_card(c.id).await?;
            println!("ok");
        }
    }
    Ok(())
}

async fn due_cmd<R: Repository + ?Sized>(repo: &R, cmd: DueCmd) -> Result<()> {
    let now = Utc::now();
    let queue = due_queue(repo, now, cmd.max.unwrap_or(usize::MAX)).await?;
    if queue.is_empty() {
        println!("no cards due");
        return Ok(());
    }
    for c in queue {
        println!("{}\t{}\t{}\t{}", c.id, c.front, c.state, due_label(&c));
    }
    Ok(())
}

async fn boss_cmd<R: Repository + ?Sized>(repo: &R, cmd: BossCmd) -> Result<()> {
    let now = Utc::now();
    let cards = repo.list_cards().await?;
    let logs = repo.list_reviews().await?;
    let ranked = rank_failure_candidates(&logs, &cards, now, cmd.limit);
    if ranked.is_empty() {
        println!("no boss candidates");
        return Ok(());
    }
    for c in ranked {
        println!("{}\t{}\tlapses={}", c.id, c.front, c.lapses);
    }
    Ok(())
}

async fn review_cmd<R: Repository + ?Sized>(
    repo: &R,
    scheduler: &Scheduler,
    cmd: ReviewCmd,
) -> Result<()> {
    let card = resolve_card(repo, &cmd.card).await?;
    let rating: Rating = cmd.rating.parse()?;
    let out = submit_review(repo, scheduler, card.id, rating, Utc::now()).await?;
    info!(card = %card.id, %rating, state = %out.card.state, "review recorded");
    println!(
        "{}\t{}\tnext due in {} day(s)",
        out.card.id, out.card.state, out.card.scheduled_days
    );
    Ok(())
}

async fn session_cmd<R: Repository + ?Sized>(
    repo: &R,
    scheduler: &Scheduler,
    cmd: SessionCmd,
) -> Result<()> {
    let pool = due_queue(repo, Utc::now(), cmd.max).await?;
    if pool.is_empty() {
        println!("no cards due");
        return Ok(());
    }

    let reviewed = run_session(repo, scheduler, pool, &mut stdin().lock()).await?;
    println!("\nreviewed {}", reviewed);
    Ok(())
}

/// Walks `pool` reading answers from `input`; returns how many reviews were recorded.
/// End of input quits like `q`.
async fn run_session<R: Repository + ?Sized, B: BufRead>(
    repo: &R,
    scheduler: &Scheduler,
    pool: Vec<Card>,
    input: &mut B,
) -> Result<usize> {
    let total = pool.len();
    let mut reviewed = 0usize;
    for (i, card) in pool.into_iter().enumerate() {
        println!("\n[{}/{}] {}", i + 1, total, card.id);
        println!("Q: {}", card.front);
        if read_line(input, "[enter=show]")?.is_none() {
            break;
        }
        println!("A: {}", card.back);
        println!("[1=Again, 2=Hard, 3=Good, 4=Easy, s=skip, q=quit]");
        let rating = loop {
            let Some(line) = read_line(input, "rating> ")? else {
                return Ok(reviewed);
            };
            match line.trim().to_lowercase().as_str() {
                "s" | "skip" => break None,
                "q" | "quit" => return Ok(reviewed),
                other => match other.parse::<Rating>() {
                    Ok(r) => break Some(r),
                    Err(_) => println!("enter 1-4, s, or q"),
                },
            }
        };

        if let Some(rating) = rating {
            let out = submit_review(repo, scheduler, card.id, rating, Utc::now()).await?;
            reviewed += 1;
            println!("→ next due in {} day(s)", out.card.scheduled_days);
        }
    }
    Ok(reviewed)
}

async fn preview_cmd<R: Repository + ?Sized>(
    repo: &R,
    scheduler: &Scheduler,
    sel: &str,
) -> Result<()> {
    let card = resolve_card(repo, sel).await?;
    let now = Utc::now();
    println!("retrievability\t{:.3}", scheduler.retrievability(&card, now)?);
    for (rating, patch) in scheduler.preview(&card, now)? {
        println!(
            "{}\t{}\t{}d\tstability={:.2}\tdifficulty={:.2}",
            rating, patch.state, patch.scheduled_days, patch.stability, patch.difficulty
        );
    }
    Ok(())
}

// ===== Helpers =====
async fn due_queue<R: Repository + ?Sized>(
    repo: &R,
    now: DateTime<Utc>,
    max: usize,
) -> Result<Vec<Card>> {
    let cards = repo.list_cards().await?;
    let mut queue = sort_by_priority(&due_cards(&cards, now), now);
    queue.truncate(max);
    Ok(queue)
}

async fn resolve_card<R: Repository + ?Sized>(repo: &R, sel: &str) -> Result<Card> {
    if let Ok(id) = Uuid::parse_str(sel) {
        return Ok(repo.get_card(id).await?);
    }
    let sel = sel.trim().to_lowercase();
    if sel.is_empty() {
        bail!("empty card id");
    }
    let mut matches: Vec<Card> = repo
        .list_cards()
        .await?
        .into_iter()
        .filter(|c| c.id.to_string().starts_with(&sel))
        .collect();
    match matches.len() {
        0 => Err(anyhow!("card not found: {}", sel)),
        1 => Ok(matches.remove(0)),
        n => bail!("{} cards match prefix {}", n, sel),
    }
}

fn due_label(c: &Card) -> String {
    match c.next_review_at {
        Some(t) if !c.is_new() => t.format("%Y-%m-%d %H:%M").to_string(),
        _ => "now".to_string(),
    }
}

/// `None` at end of input.
fn read_line<B: BufRead>(input: &mut B, prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    stdout().flush().ok();
    let mut s = String::new();
    if input.read_line(&mut s)? == 0 {
        return Ok(None);
    }
    Ok(Some(s))
}
