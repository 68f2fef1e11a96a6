use anyhow::Result;

use verbcard_lib::mastery::MasteryState;
use verbcard_lib::practice::PracticeSession;

use crate::app::App;
use crate::commands::prompt;
use crate::render::terminal::{paint, render_back, render_front, render_session_stats, Color};

/// Flashcard practice: flip, then mark yourself right or wrong
pub async fn run(app: &App, tenses: Option<&str>, use_color: bool) -> Result<()> {
    let mode = app.practice_mode(tenses)?;
    let store = app.open_store(&mode)?;
    let source = app.dataset_source(&mode)?;

    let mut session = PracticeSession::start(store, &source, mode, app.tracker()).await?;
    if let Some(outcome) = session.sync_outcome() {
        println!("{}", paint(&outcome.status_message(), Color::GRAY, use_color));
    }
    println!("{} mode, {} items\n", session.mode(), session.items().len());

    let mut rng = rand::thread_rng();
    loop {
        let Some(card) = session.next_card(&mut rng) else {
            println!("{}", paint(&session.status_line(), Color::YELLOW, use_color));
            match prompt("[r] reset  [q] quit > ")?.as_deref() {
                Some("r") => {
                    session.reset_progress()?;
                    continue;
                }
                _ => break,
            }
        };

        println!("{}", paint(&session.status_line(), Color::GRAY, use_color));
        println!("{}", render_front(&card, use_color));
        match prompt("Enter to flip, q to quit > ")?.as_deref() {
            None | Some("q") => break,
            _ => {}
        }
        println!("{}", render_back(&card, use_color));

        let correct = loop {
            match prompt("[y] got it  [n] missed  [r] reset  [q] quit > ")?.as_deref() {
                Some("y") | Some("") => break Some(true),
                Some("n") => break Some(false),
                Some("r") => {
                    session.reset_progress()?;
                    println!("Progress reset.");
                    break None;
                }
                None | Some("q") => {
                    finish(&session, use_color);
                    return Ok(());
                }
                _ => continue,
            }
        };

        if let Some(correct) = correct {
            let report = session.answer(correct)?;
            if report.state == MasteryState::Mastered {
                println!("{}", paint("Mastered!", Color::GREEN, use_color));
            }
        }
        println!();
    }

    finish(&session, use_color);
    Ok(())
}

fn finish(session: &PracticeSession, use_color: bool) {
    println!(
        "\n{}",
        paint(&render_session_stats(session.session_stats()), Color::BOLD, use_color)
    );
}
