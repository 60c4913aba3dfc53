#![deny(warnings)]

//! Headless driver: runs a seeded game on autopilot and prints KPIs.

use std::path::PathBuf;

use anyhow::{Context, Result};
use fund_core::{
    minimum_salary_for_skill, AlphaId, Event, EventEffect, GameConfig, InfraKind, Position,
    ResetDecision, StaffKind,
};
use fund_engine::{GameOutcome, Session, WeekReport};
use minigames::{MiniGameInput, MiniGameKind};
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

const STYLES: [&str; 4] = ["Trend", "Value", "Carry", "Momentum"];
const MAX_TEAM: usize = 3;
const HIRE_SKILL: i32 = 55;
/// Cash kept aside before approving infra asks or hiring.
const CASH_BUFFER: f64 = 250_000.0;
/// Weeks between autopilot purchases of the focus infrastructure track.
const INFRA_UPGRADE_EVERY: u32 = 13;

struct Args {
    config: Option<PathBuf>,
    seed: Option<u64>,
    weeks: u32,
    save: Option<String>,
    load: Option<String>,
    save_dir: PathBuf,
    /// Answer to the rival fund's reset offer.
    reset_policy: ResetDecision,
    /// Track bought every quarter when cash allows.
    infra_focus: Option<InfraKind>,
    /// Staff let go before the run, as `kind:name`.
    fire: Vec<(StaffKind, String)>,
}

fn parse_fire(spec: &str) -> Result<(StaffKind, String)> {
    let (kind, name) = spec
        .split_once(':')
        .with_context(|| format!("--fire expects kind:name, got {spec:?}"))?;
    Ok((kind.parse()?, name.to_string()))
}

fn parse_args(argv: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut args = Args {
        config: None,
        seed: None,
        weeks: 52,
        save: None,
        load: None,
        save_dir: PathBuf::from("saves"),
        reset_policy: ResetDecision::Accept,
        infra_focus: None,
        fire: Vec::new(),
    };
    let mut it = argv.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = it.next().map(PathBuf::from),
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            "--weeks" => {
                if let Some(w) = it.next().and_then(|s| s.parse().ok()) {
                    args.weeks = w;
                }
            }
            "--save" => args.save = it.next(),
            "--load" => args.load = it.next(),
            "--save-dir" => {
                if let Some(dir) = it.next() {
                    args.save_dir = PathBuf::from(dir);
                }
            }
            "--reset" => {
                let value = it.next().context("--reset needs accept or decline")?;
                args.reset_policy = value.parse()?;
            }
            "--infra-focus" => {
                let value = it.next().context("--infra-focus needs a track name")?;
                args.infra_focus = Some(value.parse()?);
            }
            "--fire" => {
                let value = it.next().context("--fire needs kind:name")?;
                args.fire.push(parse_fire(&value)?);
            }
            other => warn!(arg = other, "ignoring unknown argument"),
        }
    }
    Ok(args)
}

fn load_config(args: &Args) -> Result<GameConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.rng_seed = seed;
    }
    config.validate()?;
    Ok(config)
}

fn open_session(args: &Args, config: GameConfig) -> Result<Session> {
    if let Some(name) = &args.load {
        match persistence::load(&args.save_dir, name)? {
            Some(snapshot) => {
                let session = Session::restore(snapshot, config)?;
                info!(name = %name, week = session.week, year = session.year, "resuming saved game");
                return Ok(session);
            }
            None => info!(name = %name, "no save found, starting fresh"),
        }
    }
    Ok(Session::begin(config))
}

/// Hire up to a small desk, keep one research project running and put every
/// finished alpha in an equal-weight book.
fn autopilot(session: &mut Session, args: &Args) -> Result<()> {
    let desk = session.team.len() + session.pending_hires.len();
    if desk < MAX_TEAM && session.player.cash > CASH_BUFFER * 2.0 {
        let name = format!("Quant Y{}W{}", session.year, session.week);
        let salary = minimum_salary_for_skill(HIRE_SKILL) + 10_000.0;
        if let Err(e) = session.hire_quant(&name, HIRE_SKILL, salary) {
            warn!(error = %e, "autopilot hire skipped");
        }
    }

    if let Some(kind) = args.infra_focus {
        if session.week % INFRA_UPGRADE_EVERY == 0 && session.player.cash > CASH_BUFFER * 4.0 {
            if let Err(e) = session.upgrade_infra(kind) {
                warn!(error = %e, %kind, "autopilot upgrade skipped");
            }
        }
    }

    if !session.team.is_empty() && session.alphas.in_research.is_empty() {
        let style = STYLES[(session.week as usize) % STYLES.len()];
        session.start_research(style, 4)?;
    }

    if !session.alphas.stored_for_ensemble.is_empty() {
        let ids: Vec<AlphaId> = session
            .alphas
            .live
            .iter()
            .chain(&session.alphas.stored_for_ensemble)
            .map(|a| a.id.clone())
            .collect();
        let weight = 1.0 / ids.len() as f64;
        session.update_portfolio(ids.into_iter().map(|id| Position::new(id, weight)).collect())?;
    }
    Ok(())
}

fn pick_choice(event: &Event, cash: f64, reset_policy: ResetDecision) -> Option<usize> {
    event.choices.iter().position(|c| match c.effect {
        EventEffect::ApproveInfra { .. } => cash > CASH_BUFFER,
        EventEffect::DelayInfra { .. } => true,
        EventEffect::ResetOffer { decision } => decision == reset_policy,
        EventEffect::Continue => true,
        _ => false,
    })
}

/// Drain the event queue. Stops at a restart-only event and returns false.
fn handle_events(session: &mut Session, reset_policy: ResetDecision) -> Result<bool> {
    while let Some(event) = session.head_event() {
        let title = event.title.clone();
        if !event.is_decision() {
            session.clear_event();
            continue;
        }
        let Some(choice) = pick_choice(event, session.player.cash, reset_policy) else {
            info!(%title, "autopilot stops at terminal event");
            return Ok(false);
        };
        let outcome = session.resolve_event(choice)?;
        info!(%title, %outcome, "event resolved");
    }
    Ok(true)
}

/// One Guess the Sharpe session at the start of each year.
fn play_minigame(session: &mut Session) -> Result<()> {
    session.start_minigame(MiniGameKind::GuessSharpe)?;
    for _ in 0..20 {
        let result = session.submit_minigame(MiniGameInput::Guess(1.0))?;
        if result.game_over {
            info!(xp = result.xp_award, "guess the sharpe finished");
            break;
        }
    }
    Ok(())
}

fn print_kpis(session: &Session, weeks_run: u32, last: Option<&WeekReport>) -> Result<()> {
    let p = &session.player;
    println!(
        "KPI | weeks: {} | now: Y{} W{} | AUM: ${:.0} | cash: ${:.0} | sharpe: {:.2} | max DD: {:.1}% | team: {} | live alphas: {} | invested: {:.0}% | level: {}",
        weeks_run,
        session.year,
        session.week,
        p.aum,
        p.cash,
        p.rolling_sharpe,
        p.max_drawdown * 100.0,
        session.team.len(),
        session.alphas.live.len(),
        session.portfolio.total_weight() * 100.0,
        p.level
    );
    if let Some(report) = last {
        println!("last week: {}", serde_json::to_string(report)?);
    }
    Ok(())
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    info!(git = env!("GIT_SHA"), weeks = args.weeks, seed = ?args.seed, "starting alpha-desk");

    let config = load_config(&args)?;
    let mut session = open_session(&args, config)?;
    for (kind, name) in &args.fire {
        match session.fire_staff(*kind, name) {
            Ok(msg) => info!(%kind, name = %name, %msg, "staff released before run"),
            Err(e) => warn!(error = %e, %kind, name = %name, "could not fire"),
        }
    }

    let mut weeks_run = 0;
    let mut last = None;
    for _ in 0..args.weeks {
        if session.week == 1 {
            play_minigame(&mut session)?;
        }
        autopilot(&mut session, &args)?;
        let report = session.advance_week();
        weeks_run += 1;
        let outcome = report.outcome;
        last = Some(report);
        if !handle_events(&mut session, args.reset_policy)? {
            break;
        }
        if matches!(outcome, Some(GameOutcome::Fired | GameOutcome::ShutDown)) {
            break;
        }
    }

    session
        .check_invariants()
        .context("final state failed validation")?;
    print_kpis(&session, weeks_run, last.as_ref())?;

    if let Some(name) = &args.save {
        let path = persistence::save(&args.save_dir, name, &session.snapshot())?;
        println!("saved to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_named_inputs() {
        let a = args(&[
            "--reset",
            "decline",
            "--infra-focus",
            "risk_tools_level",
            "--fire",
            "infra:Ivy",
            "--weeks",
            "10",
        ])
        .unwrap();
        assert_eq!(a.reset_policy, ResetDecision::Decline);
        assert_eq!(a.infra_focus, Some(InfraKind::RiskTools));
        assert_eq!(a.fire, vec![(StaffKind::Infra, "Ivy".to_string())]);
        assert_eq!(a.weeks, 10);
    }

    #[test]
    fn rejects_unknown_names() {
        assert!(args(&["--reset", "maybe"]).is_err());
        assert!(args(&["--infra-focus", "quantum"]).is_err());
        assert!(args(&["--fire", "intern:Bob"]).is_err());
        assert!(args(&["--fire", "Bob"]).is_err());
    }

    #[test]
    fn reset_policy_picks_matching_choice() {
        let event = Event::with_choices(
            "Competing Hedge Fund Call",
            "offer",
            vec![
                fund_core::EventChoice::new(
                    "Take it",
                    EventEffect::ResetOffer {
                        decision: ResetDecision::Accept,
                    },
                ),
                fund_core::EventChoice::new(
                    "Stay",
                    EventEffect::ResetOffer {
                        decision: ResetDecision::Decline,
                    },
                ),
            ],
        );
        assert_eq!(pick_choice(&event, 0.0, ResetDecision::Accept), Some(0));
        assert_eq!(pick_choice(&event, 0.0, ResetDecision::Decline), Some(1));
    }
}
