use std::time::Duration;

use anyhow::Result;
use pizzeria::{
    command::Command, now_millis, stats::GameRunSubmission, AddOutcome, GameConfig, GameMode,
    Millis, Rejection, Session, SessionEvent, Status,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, instrument};

use crate::{view, StatsClient};

const TICK: Duration = Duration::from_millis(100);

pub enum Reply {
    Say(String),
    Quit,
}

fn describe_add(order_id: u32, outcome: AddOutcome) -> String {
    match outcome {
        AddOutcome::Added => format!("Added to order #{}.", order_id),
        AddOutcome::ReadyToComplete => format!(
            "Order #{} has everything. Type `complete` when it's ready.",
            order_id
        ),
        AddOutcome::Completed(_) => format!("Order #{} is done!", order_id),
    }
}

// In the WIP game the selected order is the default target
fn target(session: &Session, order_id: Option<u32>) -> Result<u32, Rejection> {
    if session.status() != Status::Running {
        return Err(Rejection::NotRunning);
    }
    match order_id.or_else(|| session.store().selected()) {
        Some(id) => Ok(id),
        None if session.mode().requires_selection() => Err(Rejection::NoSelection),
        None => session
            .store()
            .oldest_open()
            .ok_or(Rejection::NoOpenOrder),
    }
}

/// Runs one player command against the session.
pub fn apply(session: &mut Session, command: Command, now: Millis) -> Reply {
    let text = match command {
        Command::Quit => return Reply::Quit,
        Command::Start => {
            session.start(now);
            format!("Game started!\n{}", view::render_orders(session, now))
        }
        Command::Reset => {
            session.reset();
            "Game reset. Type `start` to play again.".into()
        }
        Command::Status => match session.status() {
            Status::Idle => "Type `start` to begin.".into(),
            _ => view::render_orders(session, now),
        },
        Command::Menu => view::render_menu(),
        Command::Select(id) => match session.select(id) {
            Ok(()) => format!("Working on order #{}.", id),
            Err(e) => e.to_string(),
        },
        Command::Add {
            ingredient,
            order_id,
        } => match target(session, order_id)
            .and_then(|id| session.add_ingredient(id, ingredient, now).map(|o| (id, o)))
        {
            Ok((id, outcome)) => describe_add(id, outcome),
            Err(e) => e.to_string(),
        },
        Command::Complete(order_id) => {
            match target(session, order_id).and_then(|id| session.complete(id, now).map(|_| id)) {
                Ok(id) => format!("Order #{} is done!", id),
                Err(e) => e.to_string(),
            }
        }
    };
    Reply::Say(text)
}

fn describe_event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::Spawned(id) => Some(format!("New order #{} came in!", id)),
        SessionEvent::Unlocked(id) => Some(format!("Order #{} is unlocked.", id)),
        SessionEvent::Sampled(_) => None,
    }
}

async fn submit(client: &StatsClient, submission: &GameRunSubmission) {
    match client.submit(submission).await {
        Ok(reply) => {
            info!("Saved game run {}", reply.document_id);
            println!("Results saved ({}).", reply.document_id);
        }
        Err(e) => {
            error!("Could not save the game run: {}", e);
            println!("Could not save your results: {}", e);
        }
    }
}

#[instrument(name = "Playing", skip(config, client))]
pub async fn play(mode: GameMode, config: GameConfig, client: Option<StatsClient>) -> Result<()> {
    let mut session = Session::new(mode, config);
    println!("Pizza {} game. Type `start` to begin, `menu` for ingredients, `quit` to leave.", mode);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(TICK);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for event in session.advance(now_millis()) {
                    if let Some(text) = describe_event(&event) {
                        println!("{}", text);
                    }
                }
            }
            line = lines.next_line() => {
                let line = match line? {
                    Some(line) => line,
                    None => break,
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(command) => match apply(&mut session, command, now_millis()) {
                        Reply::Say(text) => println!("{}", text),
                        Reply::Quit => break,
                    },
                    Err(e) => println!("{}", e),
                }
            }
        }
        // Only the first check after finishing gets a submission
        if let Some(submission) = session.take_submission() {
            if let Some(results) = session.results() {
                println!("{}", view::render_results(results));
            }
            if let Some(client) = &client {
                submit(client, &submission).await;
            }
            println!("Type `start` to play again or `quit` to leave.");
        }
    }
    Ok(())
}
